//! PDFA Core - PDF/A helpers for lopdf documents
//!
//! This crate provides functionality for:
//! - Embedding PDF/A identification and Dublin Core metadata as an XMP packet
//! - Attaching an sRGB output intent backed by a bundled ICC profile
//! - Creating pages (optionally cropped) and drawing onto them
//! - Converting pixel measurements into page units ("grid" values)
//!
//! # Example
//!
//! ```ignore
//! use pdfa_core::{add_metadata, add_srgb_output_intent, new_document, new_page, SubLevel};
//!
//! let mut doc = new_document();
//! add_metadata(&mut doc, "Facsimile", 2, SubLevel::Basic)?;
//! add_srgb_output_intent(&mut doc)?;
//! let page = new_page(&mut doc, 595.0, 842.0)?;
//! page.finish()?;
//! doc.save("facsimile.pdf")?;
//! ```

mod conformance;
mod document;
mod grid;
mod icc;
mod metadata;
mod output_intent;
mod page;
mod settings;
mod xmp;

pub use conformance::{PdfaConformance, SubLevel};
pub use document::{new_document, page_id};
pub use grid::{
    make_grid_rectangle, make_grid_rectangle_default, pixels_to_grid, to_grid_value,
    to_grid_value_default,
};
pub use icc::{srgb_profile, IccProfile};
pub use metadata::{add_metadata, info_title, read_metadata};
pub use output_intent::{add_srgb_output_intent, output_intents, OutputIntent};
pub use page::{
    new_page, new_page_with_crop_box, open_page_content, page_crop_box, page_media_box, Color,
    PageContent, Rectangle,
};
pub use settings::PdfaSettings;
pub use xmp::{BadFieldValue, DublinCore, PdfaIdentification, XmpPacket};

use thiserror::Error;

/// Errors that can occur while manipulating the PDF object graph
#[derive(Debug, Error)]
pub enum PdfError {
    #[error("Invalid page number: {0} (document has {1} pages)")]
    InvalidPage(usize, usize),

    #[error("PDF parsing error: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Lopdf error: {0}")]
    LopdfError(#[from] lopdf::Error),
}

/// Result type for PDF operations
pub type Result<T> = std::result::Result<T, PdfError>;

/// Error raised when metadata cannot be produced or installed
///
/// Field values rejected by the XMP model are not reported through this type:
/// they can only come from a bug in this crate and abort instead.
#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error("{0}")]
    Message(String),

    #[error("{message}: {source}")]
    Wrapped {
        message: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    #[error("metadata I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("XMP serialization failed: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error(transparent)]
    Pdf(#[from] PdfError),
}

impl ProcessingError {
    /// A processing error with a message only
    pub fn new(message: impl Into<String>) -> Self {
        ProcessingError::Message(message.into())
    }

    /// A processing error that wraps another error and a message
    pub fn with_cause<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        ProcessingError::Wrapped {
            message: message.into(),
            source: Box::new(source),
        }
    }
}

impl From<lopdf::Error> for ProcessingError {
    fn from(err: lopdf::Error) -> Self {
        ProcessingError::Pdf(PdfError::LopdfError(err))
    }
}

/// Default JPEG quality for page images
pub const JPEG_QUALITY: f32 = 0.92;

/// Resolution (dots per inch) assumed when none is given
pub const DEFAULT_RESOLUTION: u32 = 240;

/// Page units per inch
pub const GRID_PER_INCH: f32 = 72.0;

/// Registry named in the sRGB output intent
pub const COLOR_REGISTRY: &str = "http://www.color.org";

/// Name of the bundled color profile, used for all output intent labels
pub const SRGB_PROFILE: &str = "sRGB IEC61966-2.1";

/// Creators written into every metadata packet, in this order
pub const CREATORS: [&str; 2] = [
    "Universität Duisburg-Essen, Arbeitsstelle für Edition und Editionstechnik",
    "Leibniz-Institut für Deutsche Sprache",
];

/// XMP namespaces for image properties carried alongside page scans
pub mod namespaces {
    /// TIFF properties in EXIV2 XMPs (as yet unused)
    pub const TIFF: &str = "http://ns.adobe.com/tiff/1.0/";
    /// Camera raw settings
    pub const CRS: &str = "http://ns.adobe.com/camera-raw-settings/1.0/";
}
