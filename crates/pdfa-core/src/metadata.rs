//! PDF/A identification metadata

use crate::conformance::SubLevel;
use crate::document::{catalog, catalog_mut, resolve};
use crate::xmp::XmpPacket;
use crate::{PdfError, ProcessingError, CREATORS};
use lopdf::{dictionary, Dictionary, Document, Object, StringFormat, Stream};
use tracing::{debug, info, instrument};

/// Add XMP metadata to a document
///
/// Sets the information dictionary title, then builds an XMP packet holding
/// the title, the fixed [`CREATORS`], and the PDF/A part and conformance
/// level, and installs it as the catalog's `/Metadata` stream. Any previous
/// metadata entry is replaced.
///
/// # Arguments
/// * `doc` - The document to modify
/// * `title` - Document title
/// * `level` - PDF/A part (1, 2, 3, ...)
/// * `sub_level` - PDF/A conformance level
///
/// # Errors
/// Returns [`ProcessingError`] if the packet cannot be serialized or the
/// document has no catalog.
///
/// # Example
/// ```ignore
/// add_metadata(&mut doc, "Briefwechsel 1802", 1, SubLevel::Basic)?;
/// ```
#[instrument(skip(doc))]
pub fn add_metadata(
    doc: &mut Document,
    title: &str,
    level: u32,
    sub_level: SubLevel,
) -> Result<(), ProcessingError> {
    // nothing is written unless the catalog can take the packet
    catalog(doc)?;

    let mut xmp = XmpPacket::new();
    let dc = xmp.create_and_add_dublin_core();
    dc.set_title(title);
    for creator in CREATORS {
        dc.add_creator(creator);
    }

    let id = xmp.create_and_add_pdfa_identification();
    id.set_part(level);
    if let Err(err) = id.set_conformance(sub_level.as_str()) {
        // every SubLevel letter is a valid conformance value
        panic!("illegal PDF/A identification: {err}");
    }

    let bytes = xmp.to_bytes()?;
    debug!(bytes = bytes.len(), "Serialized XMP packet");

    set_info_title(doc, title)?;

    // PDF/A forbids filters on the metadata stream
    let stream = Stream::new(
        dictionary! {
            "Type" => "Metadata",
            "Subtype" => "XML",
        },
        bytes,
    )
    .with_compression(false);
    let metadata_id = doc.add_object(stream);
    catalog_mut(doc)?.set("Metadata", metadata_id);

    info!(?metadata_id, part = level, conformance = %sub_level, "Installed PDF/A metadata");
    Ok(())
}

/// Read back the catalog's XMP packet
///
/// Returns `Ok(None)` when the catalog has no `/Metadata` entry.
pub fn read_metadata(doc: &Document) -> Result<Option<XmpPacket>, ProcessingError> {
    let catalog = catalog(doc)?;
    let Ok(entry) = catalog.get(b"Metadata") else {
        return Ok(None);
    };
    let stream = resolve(doc, entry)?
        .as_stream()
        .map_err(|_| PdfError::ParseError("Metadata is not a stream".to_string()))?;

    let content = if stream.dict.has(b"Filter") {
        stream.decompressed_content()?
    } else {
        stream.content.clone()
    };

    XmpPacket::parse(&content).map(Some)
}

/// Title from the document information dictionary, if present
pub fn info_title(doc: &Document) -> Result<Option<String>, PdfError> {
    let Ok(info) = doc.trailer.get(b"Info") else {
        return Ok(None);
    };
    let info = resolve(doc, info)?
        .as_dict()
        .map_err(|_| PdfError::ParseError("Info is not a dictionary".to_string()))?;

    match info.get(b"Title") {
        Ok(Object::String(bytes, _)) => Ok(Some(decode_text_string(bytes))),
        Ok(_) => Err(PdfError::ParseError("Title is not a string".to_string())),
        Err(_) => Ok(None),
    }
}

fn set_info_title(doc: &mut Document, title: &str) -> Result<(), PdfError> {
    let info_id = match doc.trailer.get_mut(b"Info") {
        Ok(Object::Dictionary(info)) => {
            info.set("Title", text_string(title));
            return Ok(());
        }
        Ok(Object::Reference(id)) => *id,
        Ok(_) => return Err(PdfError::ParseError("Info is not a dictionary".to_string())),
        Err(_) => {
            let id = doc.add_object(Dictionary::new());
            doc.trailer.set("Info", id);
            id
        }
    };

    doc.get_object_mut(info_id)?
        .as_dict_mut()
        .map_err(|_| PdfError::ParseError("Info is not a dictionary".to_string()))?
        .set("Title", text_string(title));
    Ok(())
}

/// Encode a PDF text string: literal when ASCII, UTF-16BE with BOM otherwise
pub(crate) fn text_string(text: &str) -> Object {
    if text.is_ascii() {
        return Object::string_literal(text);
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

/// Decode a PDF text string: UTF-16BE when it starts with a BOM, PDFDocEncoding otherwise
pub(crate) fn decode_text_string(bytes: &[u8]) -> String {
    match bytes {
        [0xFE, 0xFF, rest @ ..] => {
            let units: Vec<u16> = rest
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16_lossy(&units)
        }
        _ => bytes.iter().map(|&b| pdf_doc_char(b)).collect(),
    }
}

/// Code points 0x18..=0x1F of PDFDocEncoding
const PDF_DOC_LOW: [char; 8] = [
    '\u{02D8}', '\u{02C7}', '\u{02C6}', '\u{02D9}', '\u{02DD}', '\u{02DB}', '\u{02DA}', '\u{02DC}',
];

/// Code points 0x80..=0xA0 of PDFDocEncoding; 0x9F is undefined
const PDF_DOC_HIGH: [char; 33] = [
    '\u{2022}', '\u{2020}', '\u{2021}', '\u{2026}', '\u{2014}', '\u{2013}', '\u{0192}', '\u{2044}',
    '\u{2039}', '\u{203A}', '\u{2212}', '\u{2030}', '\u{201E}', '\u{201C}', '\u{201D}', '\u{2018}',
    '\u{2019}', '\u{201A}', '\u{2122}', '\u{FB01}', '\u{FB02}', '\u{0141}', '\u{0152}', '\u{0160}',
    '\u{0178}', '\u{017D}', '\u{0131}', '\u{0142}', '\u{0153}', '\u{0161}', '\u{017E}', '\u{FFFD}',
    '\u{20AC}',
];

fn pdf_doc_char(byte: u8) -> char {
    match byte {
        0x18..=0x1F => PDF_DOC_LOW[usize::from(byte - 0x18)],
        0x80..=0xA0 => PDF_DOC_HIGH[usize::from(byte - 0x80)],
        0x7F | 0xAD => char::REPLACEMENT_CHARACTER,
        _ => char::from(byte),
    }
}
