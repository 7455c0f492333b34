//! Catalog and page tree access on lopdf documents

use crate::{PdfError, Result};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId};

/// PDF version written by [`new_document`]
const PDF_VERSION: &str = "1.4";

/// Create an empty document with a catalog and an empty page tree
///
/// # Example
/// ```ignore
/// let mut doc = pdfa_core::new_document();
/// assert_eq!(doc.get_pages().len(), 0);
/// ```
pub fn new_document() -> Document {
    let mut doc = Document::with_version(PDF_VERSION);

    let pages_id = doc.add_object(dictionary! {
        "Type" => "Pages",
        "Kids" => Vec::<Object>::new(),
        "Count" => 0,
    });
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    doc
}

/// Object id of a page by its 1-indexed number
pub fn page_id(doc: &Document, page: usize) -> Result<ObjectId> {
    let pages = doc.get_pages();
    pages
        .get(&(page as u32))
        .copied()
        .ok_or(PdfError::InvalidPage(page, pages.len()))
}

/// Object id of the document catalog
pub(crate) fn catalog_id(doc: &Document) -> Result<ObjectId> {
    doc.trailer
        .get(b"Root")
        .map_err(|_| PdfError::ParseError("Document trailer missing Root entry".to_string()))?
        .as_reference()
        .map_err(|_| PdfError::ParseError("Root is not a reference".to_string()))
}

pub(crate) fn catalog(doc: &Document) -> Result<&Dictionary> {
    let id = catalog_id(doc)?;
    doc.get_object(id)?
        .as_dict()
        .map_err(|_| PdfError::ParseError("Catalog is not a dictionary".to_string()))
}

pub(crate) fn catalog_mut(doc: &mut Document) -> Result<&mut Dictionary> {
    let id = catalog_id(doc)?;
    doc.get_object_mut(id)?
        .as_dict_mut()
        .map_err(|_| PdfError::ParseError("Catalog is not a dictionary".to_string()))
}

/// Object id of the root Pages node
pub(crate) fn pages_id(doc: &Document) -> Result<ObjectId> {
    catalog(doc)?
        .get(b"Pages")
        .map_err(|_| PdfError::ParseError("Catalog missing Pages entry".to_string()))?
        .as_reference()
        .map_err(|_| PdfError::ParseError("Pages is not a reference".to_string()))
}

/// Append an existing page object to the root Pages node
pub(crate) fn append_page(doc: &mut Document, page_id: ObjectId) -> Result<()> {
    let pages_id = pages_id(doc)?;
    let pages_dict = doc
        .get_object_mut(pages_id)?
        .as_dict_mut()
        .map_err(|_| PdfError::ParseError("Pages object is not a dictionary".to_string()))?;

    let count = match pages_dict.get(b"Count") {
        Ok(count) => count
            .as_i64()
            .map_err(|_| PdfError::ParseError("Count is not an integer".to_string()))?,
        Err(_) => 0,
    };

    if pages_dict.has(b"Kids") {
        match pages_dict.get_mut(b"Kids")? {
            Object::Array(kids) => kids.push(Object::Reference(page_id)),
            _ => return Err(PdfError::ParseError("Kids is not an array".to_string())),
        }
    } else {
        pages_dict.set("Kids", vec![Object::Reference(page_id)]);
    }
    pages_dict.set("Count", count + 1);

    Ok(())
}

/// Resolve a possibly indirect object
pub(crate) fn resolve<'a>(doc: &'a Document, object: &'a Object) -> Result<&'a Object> {
    match object {
        Object::Reference(id) => Ok(doc.get_object(*id)?),
        other => Ok(other),
    }
}
