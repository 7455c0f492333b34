//! PDF/A part and conformance level

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// PDF/A conformance sub-level
///
/// Serialized (and written to `pdfaid:conformance`) as the single letter the
/// PDF/A standard uses for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SubLevel {
    /// Level A: tagged, accessible structure
    #[serde(rename = "A")]
    Accessible,
    /// Level B: visual appearance preserved
    #[default]
    #[serde(rename = "B")]
    Basic,
    /// Level U: all text maps to Unicode
    #[serde(rename = "U")]
    Unicode,
}

impl SubLevel {
    /// All sub-levels, in declaration order
    pub const ALL: [SubLevel; 3] = [SubLevel::Accessible, SubLevel::Basic, SubLevel::Unicode];

    /// Canonical string form used in XMP
    pub fn as_str(self) -> &'static str {
        match self {
            SubLevel::Accessible => "A",
            SubLevel::Basic => "B",
            SubLevel::Unicode => "U",
        }
    }
}

impl fmt::Display for SubLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubLevel {
    type Err = String;

    /// Accepts the letter or the variant name, ignoring case
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "a" | "accessible" => Ok(SubLevel::Accessible),
            "b" | "basic" => Ok(SubLevel::Basic),
            "u" | "unicode" => Ok(SubLevel::Unicode),
            other => Err(format!("unknown PDF/A conformance level: {other}")),
        }
    }
}

/// A PDF/A part number together with its conformance sub-level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PdfaConformance {
    pub part: u32,
    pub sub_level: SubLevel,
}

impl PdfaConformance {
    pub fn new(part: u32, sub_level: SubLevel) -> Self {
        Self { part, sub_level }
    }
}

impl fmt::Display for PdfaConformance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PDF/A-{}{}", self.part, self.sub_level)
    }
}
