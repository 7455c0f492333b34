//! Page creation and drawing surfaces

use crate::document::{append_page, pages_id};
use crate::{PdfError, Result};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use std::io::Write;
use tracing::{debug, instrument, warn};

/// Parent levels searched for inherited page attributes
const MAX_INHERITANCE_DEPTH: usize = 10;

/// RGB Color (values 0.0 - 1.0)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    /// Create a new RGB color (values 0.0 - 1.0)
    pub fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Create color from RGB values (0-255)
    pub fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
        }
    }

    pub fn black() -> Self {
        Self::rgb(0.0, 0.0, 0.0)
    }

    pub fn white() -> Self {
        Self::rgb(1.0, 1.0, 1.0)
    }

    fn operands(self) -> Vec<Object> {
        vec![self.r.into(), self.g.into(), self.b.into()]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::black()
    }
}

/// A rectangle in page units, stored as PDF does: lower-left then upper-right
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rectangle {
    pub lower_left_x: f32,
    pub lower_left_y: f32,
    pub upper_right_x: f32,
    pub upper_right_y: f32,
}

impl Rectangle {
    /// A `width` x `height` rectangle anchored at the origin
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            lower_left_x: 0.0,
            lower_left_y: 0.0,
            upper_right_x: width,
            upper_right_y: height,
        }
    }

    pub fn from_corners(
        lower_left_x: f32,
        lower_left_y: f32,
        upper_right_x: f32,
        upper_right_y: f32,
    ) -> Self {
        Self {
            lower_left_x,
            lower_left_y,
            upper_right_x,
            upper_right_y,
        }
    }

    pub fn width(&self) -> f32 {
        self.upper_right_x - self.lower_left_x
    }

    pub fn height(&self) -> f32 {
        self.upper_right_y - self.lower_left_y
    }

    /// PDF rectangle array `[llx lly urx ury]`
    pub fn to_object(&self) -> Object {
        Object::Array(vec![
            self.lower_left_x.into(),
            self.lower_left_y.into(),
            self.upper_right_x.into(),
            self.upper_right_y.into(),
        ])
    }

    /// Parse a PDF rectangle array
    pub fn from_array(array: &[Object]) -> Result<Self> {
        if array.len() < 4 {
            return Err(PdfError::ParseError("Invalid rectangle format".to_string()));
        }
        let coord = |i: usize| -> Result<f32> {
            array[i]
                .as_f32()
                .ok()
                .or_else(|| array[i].as_i64().ok().map(|v| v as f32))
                .ok_or_else(|| PdfError::ParseError(format!("Invalid rectangle coordinate {i}")))
        };
        Ok(Self::from_corners(coord(0)?, coord(1)?, coord(2)?, coord(3)?))
    }
}

/// Add a new page to the document
///
/// # Arguments
/// * `doc` - The document
/// * `width` - Page width in points
/// * `height` - Page height in points
///
/// # Returns
/// The drawing surface of the new page. The page is already part of the
/// page tree; drawn operations are written when the surface is finished.
///
/// # Example
/// ```ignore
/// let mut page = new_page(&mut doc, 595.0, 842.0)?;
/// page.set_fill_color(Color::black());
/// page.rectangle(Rectangle::new(100.0, 100.0));
/// page.fill();
/// page.finish()?;
/// ```
#[instrument(skip(doc))]
pub fn new_page(doc: &mut Document, width: f32, height: f32) -> Result<PageContent<'_>> {
    let page_id = create_page(doc, Rectangle::new(width, height), None)?;
    open_page_content(doc, page_id)
}

/// Add a new page with a crop box to the document
///
/// The crop box is taken as given; it is not checked against the page size.
///
/// # Arguments
/// * `doc` - The document
/// * `width` - Page width in points
/// * `height` - Page height in points
/// * `crop_upper_x` - Upper right x coordinate of the crop box
/// * `crop_upper_y` - Upper right y coordinate of the crop box
/// * `crop_lower_x` - Lower left x coordinate of the crop box
/// * `crop_lower_y` - Lower left y coordinate of the crop box
#[instrument(skip(doc))]
pub fn new_page_with_crop_box(
    doc: &mut Document,
    width: f32,
    height: f32,
    crop_upper_x: f32,
    crop_upper_y: f32,
    crop_lower_x: f32,
    crop_lower_y: f32,
) -> Result<PageContent<'_>> {
    let crop_box = Rectangle::from_corners(crop_lower_x, crop_lower_y, crop_upper_x, crop_upper_y);
    let page_id = create_page(doc, Rectangle::new(width, height), Some(crop_box))?;
    open_page_content(doc, page_id)
}

/// Open a drawing surface on an existing page
///
/// New operations are appended after the page's current contents. Existing
/// contents are wrapped in `q`/`Q` so the new operations start from the
/// default graphics state.
pub fn open_page_content(doc: &mut Document, page_id: ObjectId) -> Result<PageContent<'_>> {
    doc.get_object(page_id)?
        .as_dict()
        .map_err(|_| PdfError::ParseError("Page object is not a dictionary".to_string()))?;

    Ok(PageContent {
        doc,
        page_id,
        operations: Vec::new(),
        next_xobject: 1,
    })
}

/// Media box of a page, following `/Parent` inheritance
///
/// Pages without any media box are treated as A4.
pub fn page_media_box(doc: &Document, page_id: ObjectId) -> Result<Rectangle> {
    match inherited_rectangle(doc, page_id, b"MediaBox")? {
        Some(media_box) => Ok(media_box),
        None => {
            debug!(?page_id, "No MediaBox found, assuming A4");
            Ok(Rectangle::new(595.28, 841.89))
        }
    }
}

/// Crop box of a page, defaulting to the media box
pub fn page_crop_box(doc: &Document, page_id: ObjectId) -> Result<Rectangle> {
    match inherited_rectangle(doc, page_id, b"CropBox")? {
        Some(crop_box) => Ok(crop_box),
        None => page_media_box(doc, page_id),
    }
}

fn create_page(doc: &mut Document, media_box: Rectangle, crop_box: Option<Rectangle>) -> Result<ObjectId> {
    let parent = pages_id(doc)?;

    let mut page = dictionary! {
        "Type" => "Page",
        "Parent" => parent,
        "MediaBox" => media_box.to_object(),
        "Resources" => Dictionary::new(),
    };
    if let Some(crop_box) = crop_box {
        page.set("CropBox", crop_box.to_object());
    }

    let page_id = doc.add_object(page);
    append_page(doc, page_id)?;
    debug!(?page_id, "Appended page");

    Ok(page_id)
}

fn inherited_rectangle(doc: &Document, page_id: ObjectId, key: &[u8]) -> Result<Option<Rectangle>> {
    let mut current_id = page_id;

    for _ in 0..MAX_INHERITANCE_DEPTH {
        let dict = doc
            .get_object(current_id)?
            .as_dict()
            .map_err(|_| PdfError::ParseError("Object is not a dictionary".to_string()))?;

        if let Ok(value) = dict.get(key) {
            let array = match value {
                Object::Array(arr) => arr,
                Object::Reference(ref_id) => doc.get_object(*ref_id)?.as_array().map_err(|_| {
                    PdfError::ParseError("Box reference is not an array".to_string())
                })?,
                _ => return Err(PdfError::ParseError("Box is not an array".to_string())),
            };
            return Rectangle::from_array(array).map(Some);
        }

        match dict.get(b"Parent") {
            Ok(Object::Reference(parent_id)) => current_id = *parent_id,
            _ => break,
        }
    }

    Ok(None)
}

/// Drawing surface bound to one page
///
/// Operations are collected in memory and written as a single compressed
/// content stream by [`PageContent::finish`].
pub struct PageContent<'a> {
    doc: &'a mut Document,
    page_id: ObjectId,
    operations: Vec<Operation>,
    next_xobject: u32,
}

impl<'a> PageContent<'a> {
    /// Object id of the page this surface draws on
    pub fn page_id(&self) -> ObjectId {
        self.page_id
    }

    /// Operations pushed so far
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Append a raw content stream operation
    pub fn push(&mut self, operation: Operation) -> &mut Self {
        self.operations.push(operation);
        self
    }

    pub fn save_state(&mut self) -> &mut Self {
        self.push(Operation::new("q", vec![]))
    }

    pub fn restore_state(&mut self) -> &mut Self {
        self.push(Operation::new("Q", vec![]))
    }

    pub fn set_fill_color(&mut self, color: Color) -> &mut Self {
        self.push(Operation::new("rg", color.operands()))
    }

    pub fn set_stroke_color(&mut self, color: Color) -> &mut Self {
        self.push(Operation::new("RG", color.operands()))
    }

    pub fn set_line_width(&mut self, width: f32) -> &mut Self {
        self.push(Operation::new("w", vec![width.into()]))
    }

    pub fn rectangle(&mut self, rect: Rectangle) -> &mut Self {
        self.push(Operation::new(
            "re",
            vec![
                rect.lower_left_x.into(),
                rect.lower_left_y.into(),
                rect.width().into(),
                rect.height().into(),
            ],
        ))
    }

    pub fn fill(&mut self) -> &mut Self {
        self.push(Operation::new("f", vec![]))
    }

    pub fn stroke(&mut self) -> &mut Self {
        self.push(Operation::new("S", vec![]))
    }

    /// Paint an image or form XObject into `area`
    ///
    /// Registers the XObject in the page's resources and returns the
    /// resource name used (e.g. "Im1").
    pub fn draw_xobject(&mut self, xobject_id: ObjectId, area: Rectangle) -> Result<String> {
        let name = format!("Im{}", self.next_xobject);
        self.next_xobject += 1;
        self.register_xobject(&name, xobject_id)?;

        self.save_state();
        self.push(Operation::new(
            "cm",
            vec![
                area.width().into(),
                0.into(),
                0.into(),
                area.height().into(),
                area.lower_left_x.into(),
                area.lower_left_y.into(),
            ],
        ));
        self.push(Operation::new("Do", vec![Object::Name(name.as_bytes().to_vec())]));
        self.restore_state();

        Ok(name)
    }

    /// Write the collected operations to the page
    ///
    /// # Returns
    /// Object id of the new content stream
    pub fn finish(mut self) -> Result<ObjectId> {
        let operations = std::mem::take(&mut self.operations);
        let count = operations.len();
        let encoded = Content { operations }.encode()?;

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&encoded)?;
        let compressed = encoder.finish()?;

        let doc = &mut *self.doc;
        let stream_id = doc.add_object(
            Stream::new(dictionary! { "Filter" => "FlateDecode" }, compressed)
                .with_compression(false),
        );

        let existing = existing_contents(doc, self.page_id)?;
        let mut contents = Vec::with_capacity(existing.len() + 3);
        if !existing.is_empty() {
            let save = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
            let restore = doc.add_object(Stream::new(Dictionary::new(), b"\nQ\n".to_vec()));
            contents.push(Object::Reference(save));
            contents.extend(existing);
            contents.push(Object::Reference(restore));
        }
        contents.push(Object::Reference(stream_id));

        page_dict_mut(doc, self.page_id)?.set("Contents", Object::Array(contents));
        debug!(page_id = ?self.page_id, ?stream_id, operations = count, "Wrote page content");

        Ok(stream_id)
    }

    fn register_xobject(&mut self, name: &str, xobject_id: ObjectId) -> Result<()> {
        let resources_ref = match page_dict(self.doc, self.page_id)?.get(b"Resources") {
            Ok(Object::Reference(id)) => Some(*id),
            _ => None,
        };

        let resources = match resources_ref {
            Some(id) => self.doc.get_object_mut(id)?.as_dict_mut().map_err(|_| {
                PdfError::ParseError("Resources is not a dictionary".to_string())
            })?,
            None => {
                let page = page_dict_mut(self.doc, self.page_id)?;
                if !matches!(page.get(b"Resources"), Ok(Object::Dictionary(_))) {
                    page.set("Resources", Dictionary::new());
                }
                page.get_mut(b"Resources")?.as_dict_mut()?
            }
        };

        if !matches!(resources.get(b"XObject"), Ok(Object::Dictionary(_))) {
            resources.set("XObject", Dictionary::new());
        }
        resources
            .get_mut(b"XObject")?
            .as_dict_mut()?
            .set(name, Object::Reference(xobject_id));

        Ok(())
    }
}

impl Drop for PageContent<'_> {
    fn drop(&mut self) {
        if !self.operations.is_empty() {
            warn!(
                page_id = ?self.page_id,
                operations = self.operations.len(),
                "Page content dropped without finish(); operations discarded"
            );
        }
    }
}

fn page_dict(doc: &Document, page_id: ObjectId) -> Result<&Dictionary> {
    doc.get_object(page_id)?
        .as_dict()
        .map_err(|_| PdfError::ParseError("Page object is not a dictionary".to_string()))
}

fn page_dict_mut(doc: &mut Document, page_id: ObjectId) -> Result<&mut Dictionary> {
    doc.get_object_mut(page_id)?
        .as_dict_mut()
        .map_err(|_| PdfError::ParseError("Page object is not a dictionary".to_string()))
}

/// Current `/Contents` of a page as a list of stream references
fn existing_contents(doc: &mut Document, page_id: ObjectId) -> Result<Vec<Object>> {
    let contents = match page_dict(doc, page_id)?.get(b"Contents") {
        Ok(contents) => contents.clone(),
        Err(_) => return Ok(Vec::new()),
    };

    match contents {
        Object::Reference(id) => match doc.get_object(id)? {
            Object::Array(items) => Ok(items.clone()),
            _ => Ok(vec![Object::Reference(id)]),
        },
        Object::Array(items) => Ok(items),
        Object::Stream(stream) => {
            let id = doc.add_object(stream);
            Ok(vec![Object::Reference(id)])
        }
        _ => Err(PdfError::ParseError("Contents is not a stream".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::new_document;
    use pretty_assertions::assert_eq;

    fn decoded_contents(doc: &Document, page_id: ObjectId) -> Vec<u8> {
        let page = page_dict(doc, page_id).unwrap();
        let mut out = Vec::new();
        for item in page.get(b"Contents").unwrap().as_array().unwrap() {
            let stream = doc
                .get_object(item.as_reference().unwrap())
                .unwrap()
                .as_stream()
                .unwrap();
            let data = if stream.dict.has(b"Filter") {
                stream.decompressed_content().unwrap()
            } else {
                stream.content.clone()
            };
            out.extend(data);
        }
        out
    }

    #[test]
    fn test_rectangle_dimensions() {
        let rect = Rectangle::from_corners(50.0, 50.0, 500.0, 700.0);
        assert_eq!(rect.width(), 450.0);
        assert_eq!(rect.height(), 650.0);
    }

    #[test]
    fn test_rectangle_from_mixed_array() {
        let array = vec![Object::Integer(0), Object::Integer(0), Object::Real(595.5), 842.into()];
        assert_eq!(
            Rectangle::from_array(&array).unwrap(),
            Rectangle::from_corners(0.0, 0.0, 595.5, 842.0)
        );
        assert!(Rectangle::from_array(&array[..3]).is_err());
    }

    #[test]
    fn test_new_page_is_in_tree_before_finish() {
        let mut doc = new_document();
        let page = new_page(&mut doc, 595.0, 842.0).unwrap();
        let page_id = page.page_id();
        drop(page);

        assert_eq!(doc.get_pages().len(), 1);
        assert_eq!(doc.get_pages()[&1], page_id);
    }

    #[test]
    fn test_finish_writes_compressed_stream() {
        let mut doc = new_document();
        let mut page = new_page(&mut doc, 200.0, 100.0).unwrap();
        page.set_fill_color(Color::from_rgb(255, 0, 0))
            .rectangle(Rectangle::new(10.0, 10.0))
            .fill();
        let page_id = page.page_id();
        let stream_id = page.finish().unwrap();

        let stream = doc.get_object(stream_id).unwrap().as_stream().unwrap();
        assert_eq!(stream.dict.get(b"Filter").unwrap().as_name().unwrap(), b"FlateDecode");

        let content = Content::decode(&decoded_contents(&doc, page_id)).unwrap();
        let operators: Vec<&str> = content.operations.iter().map(|op| op.operator.as_str()).collect();
        assert_eq!(operators, vec!["rg", "re", "f"]);
    }

    #[test]
    fn test_append_brackets_existing_content() {
        let mut doc = new_document();
        let mut first = new_page(&mut doc, 200.0, 100.0).unwrap();
        first.set_line_width(2.0);
        let page_id = first.page_id();
        first.finish().unwrap();

        let mut second = open_page_content(&mut doc, page_id).unwrap();
        second.stroke();
        second.finish().unwrap();

        let content = Content::decode(&decoded_contents(&doc, page_id)).unwrap();
        let operators: Vec<&str> = content.operations.iter().map(|op| op.operator.as_str()).collect();
        assert_eq!(operators, vec!["q", "w", "Q", "S"]);
    }

    #[test]
    fn test_draw_xobject_registers_resource() {
        let mut doc = new_document();
        let image = doc.add_object(Stream::new(
            dictionary! { "Type" => "XObject", "Subtype" => "Image" },
            vec![],
        ));
        let mut page = new_page(&mut doc, 200.0, 100.0).unwrap();
        let name = page
            .draw_xobject(image, Rectangle::from_corners(10.0, 10.0, 110.0, 60.0))
            .unwrap();
        let page_id = page.page_id();
        page.finish().unwrap();

        assert_eq!(name, "Im1");
        let resources = page_dict(&doc, page_id)
            .unwrap()
            .get(b"Resources")
            .unwrap()
            .as_dict()
            .unwrap();
        let xobjects = resources.get(b"XObject").unwrap().as_dict().unwrap();
        assert_eq!(xobjects.get(b"Im1").unwrap().as_reference().unwrap(), image);
    }

    #[test]
    fn test_media_box_inherited_from_parent() {
        let mut doc = new_document();
        let pages = pages_id(&doc).unwrap();
        doc.get_object_mut(pages)
            .unwrap()
            .as_dict_mut()
            .unwrap()
            .set("MediaBox", Rectangle::new(300.0, 400.0).to_object());
        let page_id = doc.add_object(dictionary! { "Type" => "Page", "Parent" => pages });
        append_page(&mut doc, page_id).unwrap();

        assert_eq!(page_media_box(&doc, page_id).unwrap(), Rectangle::new(300.0, 400.0));
        assert_eq!(page_crop_box(&doc, page_id).unwrap(), Rectangle::new(300.0, 400.0));
    }
}
