//! Bundled sRGB ICC profile
//!
//! The profile is compiled into the binary and parsed on first use. A profile
//! that does not parse is a packaging defect, so loading panics instead of
//! returning an error.

use once_cell::sync::Lazy;
use std::fmt;

static SRGB_ICC: &[u8] = include_bytes!("../resources/sRGB.icc");

static SRGB: Lazy<IccProfile> = Lazy::new(|| match IccProfile::parse(SRGB_ICC) {
    Ok(profile) => {
        tracing::debug!(
            size = profile.len(),
            description = %profile.description(),
            "Loaded bundled sRGB profile"
        );
        profile
    }
    Err(err) => panic!("bundled sRGB.icc is not a valid ICC profile: {err}"),
});

const HEADER_LEN: usize = 128;
const TAG_ENTRY_LEN: usize = 12;

/// The process-wide sRGB profile
pub fn srgb_profile() -> &'static IccProfile {
    &SRGB
}

/// Why a byte blob was rejected as an ICC profile
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum IccParseError {
    Truncated(usize),
    SizeMismatch { declared: usize, actual: usize },
    MissingSignature,
    TagOutOfBounds([u8; 4]),
    MissingDescription,
}

impl fmt::Display for IccParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IccParseError::Truncated(len) => write!(f, "profile truncated at {len} bytes"),
            IccParseError::SizeMismatch { declared, actual } => {
                write!(f, "header declares {declared} bytes but profile has {actual}")
            }
            IccParseError::MissingSignature => f.write_str("missing 'acsp' signature"),
            IccParseError::TagOutOfBounds(sig) => {
                write!(f, "tag '{}' points outside the profile", String::from_utf8_lossy(sig))
            }
            IccParseError::MissingDescription => f.write_str("no readable 'desc' tag"),
        }
    }
}

/// A parsed, read-only ICC profile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IccProfile {
    data: &'static [u8],
    version: (u8, u8),
    device_class: [u8; 4],
    color_space: [u8; 4],
    connection_space: [u8; 4],
    description: String,
}

impl IccProfile {
    pub(crate) fn parse(data: &'static [u8]) -> Result<Self, IccParseError> {
        if data.len() < HEADER_LEN + 4 {
            return Err(IccParseError::Truncated(data.len()));
        }
        let declared = read_u32(data, 0) as usize;
        if declared != data.len() {
            return Err(IccParseError::SizeMismatch {
                declared,
                actual: data.len(),
            });
        }
        if &data[36..40] != b"acsp" {
            return Err(IccParseError::MissingSignature);
        }

        let tag_count = read_u32(data, HEADER_LEN) as usize;
        let table_end = HEADER_LEN + 4 + tag_count * TAG_ENTRY_LEN;
        if table_end > data.len() {
            return Err(IccParseError::Truncated(data.len()));
        }

        let mut description = None;
        for i in 0..tag_count {
            let entry = HEADER_LEN + 4 + i * TAG_ENTRY_LEN;
            let sig = read_sig(data, entry);
            let offset = read_u32(data, entry + 4) as usize;
            let size = read_u32(data, entry + 8) as usize;
            let tag = offset
                .checked_add(size)
                .and_then(|end| data.get(offset..end))
                .ok_or(IccParseError::TagOutOfBounds(sig))?;
            if &sig == b"desc" {
                description = read_text_description(tag);
            }
        }

        Ok(Self {
            data,
            version: (data[8], data[9] >> 4),
            device_class: read_sig(data, 12),
            color_space: read_sig(data, 16),
            connection_space: read_sig(data, 20),
            description: description.ok_or(IccParseError::MissingDescription)?,
        })
    }

    /// Raw profile bytes
    pub fn bytes(&self) -> &'static [u8] {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Major and minor version from the header
    pub fn version(&self) -> (u8, u8) {
        self.version
    }

    /// Device class signature, e.g. `mntr`
    pub fn device_class(&self) -> &str {
        std::str::from_utf8(&self.device_class).unwrap_or("????")
    }

    /// Data color space signature, e.g. `RGB `
    pub fn color_space(&self) -> &str {
        std::str::from_utf8(&self.color_space).unwrap_or("????")
    }

    /// Profile connection space signature, `XYZ ` or `Lab `
    pub fn connection_space(&self) -> &str {
        std::str::from_utf8(&self.connection_space).unwrap_or("????")
    }

    /// Number of color components, the `/N` of an ICCBased stream
    pub fn components(&self) -> i64 {
        match &self.color_space {
            b"GRAY" => 1,
            b"CMYK" => 4,
            _ => 3,
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

fn read_u32(data: &[u8], at: usize) -> u32 {
    u32::from_be_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]])
}

fn read_sig(data: &[u8], at: usize) -> [u8; 4] {
    [data[at], data[at + 1], data[at + 2], data[at + 3]]
}

/// ASCII part of a v2 `desc` tag, or the first record of a v4 `mluc` tag
fn read_text_description(tag: &[u8]) -> Option<String> {
    if tag.len() < 12 {
        return None;
    }
    match &tag[0..4] {
        b"desc" => {
            let count = read_u32(tag, 8) as usize;
            let ascii = tag.get(12..12 + count)?;
            let text = ascii.split(|&b| b == 0).next().unwrap_or_default();
            Some(String::from_utf8_lossy(text).into_owned())
        }
        b"mluc" => {
            let records = read_u32(tag, 8) as usize;
            if records == 0 || tag.len() < 28 {
                return None;
            }
            let len = read_u32(tag, 20) as usize;
            let offset = read_u32(tag, 24) as usize;
            let utf16: Vec<u16> = tag
                .get(offset..offset + len)?
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
            Some(String::from_utf16_lossy(&utf16))
        }
        _ => None,
    }
}
