//! PDF/A settings as kept in project configuration files

use crate::conformance::{PdfaConformance, SubLevel};
use crate::metadata::add_metadata;
use crate::output_intent::add_srgb_output_intent;
use crate::ProcessingError;
use lopdf::Document;
use serde::{Deserialize, Serialize};

fn default_part() -> u32 {
    1
}

/// Title and conformance target for a document
///
/// # Example
/// ```ignore
/// let settings = PdfaSettings::from_json(r#"{ "title": "Nachlass", "part": 2, "conformance": "U" }"#)?;
/// settings.apply(&mut doc)?;
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PdfaSettings {
    pub title: String,
    #[serde(default = "default_part")]
    pub part: u32,
    #[serde(default)]
    pub conformance: SubLevel,
}

impl PdfaSettings {
    pub fn new(title: impl Into<String>, part: u32, conformance: SubLevel) -> Self {
        Self {
            title: title.into(),
            part,
            conformance,
        }
    }

    /// Parse settings from JSON
    pub fn from_json(json: &str) -> Result<Self, ProcessingError> {
        serde_json::from_str(json)
            .map_err(|e| ProcessingError::with_cause("invalid PDF/A settings", e))
    }

    pub fn conformance(&self) -> PdfaConformance {
        PdfaConformance::new(self.part, self.conformance)
    }

    /// Add the metadata packet and the sRGB output intent to `doc`
    pub fn apply(&self, doc: &mut Document) -> Result<(), ProcessingError> {
        add_metadata(doc, &self.title, self.part, self.conformance)?;
        add_srgb_output_intent(doc)?;
        tracing::info!(title = %self.title, target = %self.conformance(), "Applied PDF/A settings");
        Ok(())
    }
}
