//! sRGB output intent

use crate::document::{catalog, catalog_mut, resolve};
use crate::icc::srgb_profile;
use crate::metadata::decode_text_string;
use crate::{PdfError, Result, COLOR_REGISTRY, SRGB_PROFILE};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use std::io::Cursor;
use tracing::{debug, info, instrument};

/// Output intent subtype for PDF/A
const GTS_PDFA1: &str = "GTS_PDFA1";

/// An entry of the catalog's `/OutputIntents` array
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputIntent {
    /// Intent subtype (`/S`), e.g. `GTS_PDFA1`
    pub subtype: String,
    pub info: Option<String>,
    pub output_condition: Option<String>,
    pub output_condition_identifier: Option<String>,
    pub registry_name: Option<String>,
    /// The embedded ICC stream, when the intent carries one
    pub dest_output_profile: Option<ObjectId>,
}

impl OutputIntent {
    /// Decoded bytes of the destination profile
    pub fn profile_data(&self, doc: &Document) -> Result<Option<Vec<u8>>> {
        let Some(id) = self.dest_output_profile else {
            return Ok(None);
        };
        let stream = doc
            .get_object(id)?
            .as_stream()
            .map_err(|_| PdfError::ParseError("DestOutputProfile is not a stream".to_string()))?;
        let data = if stream.dict.has(b"Filter") {
            stream.decompressed_content()?
        } else {
            stream.content.clone()
        };
        Ok(Some(data))
    }

    fn from_dict(dict: &Dictionary) -> Result<Self> {
        let subtype = dict
            .get(b"S")
            .and_then(Object::as_name)
            .map_err(|_| PdfError::ParseError("OutputIntent missing /S".to_string()))?;

        Ok(Self {
            subtype: String::from_utf8_lossy(subtype).into_owned(),
            info: text_entry(dict, b"Info"),
            output_condition: text_entry(dict, b"OutputCondition"),
            output_condition_identifier: text_entry(dict, b"OutputConditionIdentifier"),
            registry_name: text_entry(dict, b"RegistryName"),
            dest_output_profile: dict
                .get(b"DestOutputProfile")
                .and_then(Object::as_reference)
                .ok(),
        })
    }
}

/// Add an sRGB output intent to make PDF/A checkers happy
///
/// Embeds the bundled sRGB profile as a Flate-compressed ICC stream and
/// appends an intent naming it to the catalog's `/OutputIntents`. Existing
/// intents are left alone, so calling this twice yields two entries.
///
/// # Returns
/// Object id of the new output intent dictionary
#[instrument(skip(doc))]
pub fn add_srgb_output_intent(doc: &mut Document) -> Result<ObjectId> {
    let profile = srgb_profile();

    let mut source = Cursor::new(profile.bytes());
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    std::io::copy(&mut source, &mut encoder)?;
    let compressed = encoder.finish()?;
    debug!(
        raw = profile.len(),
        compressed = compressed.len(),
        "Compressed ICC profile"
    );

    let icc_stream = Stream::new(
        dictionary! {
            "N" => profile.components(),
            "Filter" => "FlateDecode",
        },
        compressed,
    )
    .with_compression(false);
    let icc_id = doc.add_object(icc_stream);

    let intent_id = doc.add_object(dictionary! {
        "Type" => "OutputIntent",
        "S" => GTS_PDFA1,
        "Info" => Object::string_literal(SRGB_PROFILE),
        "OutputCondition" => Object::string_literal(SRGB_PROFILE),
        "OutputConditionIdentifier" => Object::string_literal(SRGB_PROFILE),
        "RegistryName" => Object::string_literal(COLOR_REGISTRY),
        "DestOutputProfile" => icc_id,
    });

    push_output_intent(doc, intent_id)?;

    info!(?intent_id, ?icc_id, "Added sRGB output intent");
    Ok(intent_id)
}

/// All output intents declared by the catalog, in order
pub fn output_intents(doc: &Document) -> Result<Vec<OutputIntent>> {
    let Ok(entry) = catalog(doc)?.get(b"OutputIntents") else {
        return Ok(Vec::new());
    };
    let entries = resolve(doc, entry)?
        .as_array()
        .map_err(|_| PdfError::ParseError("OutputIntents is not an array".to_string()))?;

    entries
        .iter()
        .map(|entry| {
            let dict = resolve(doc, entry)?.as_dict().map_err(|_| {
                PdfError::ParseError("OutputIntent is not a dictionary".to_string())
            })?;
            OutputIntent::from_dict(dict)
        })
        .collect()
}

fn push_output_intent(doc: &mut Document, intent_id: ObjectId) -> Result<()> {
    if !catalog(doc)?.has(b"OutputIntents") {
        catalog_mut(doc)?.set("OutputIntents", Vec::<Object>::new());
    }

    let existing = match catalog(doc)?.get(b"OutputIntents")? {
        Object::Reference(id) => Some(*id),
        _ => None,
    };

    let intents = match existing {
        Some(array_id) => doc.get_object_mut(array_id)?,
        None => catalog_mut(doc)?.get_mut(b"OutputIntents")?,
    };
    intents
        .as_array_mut()
        .map_err(|_| PdfError::ParseError("OutputIntents is not an array".to_string()))?
        .push(Object::Reference(intent_id));

    Ok(())
}

fn text_entry(dict: &Dictionary, key: &[u8]) -> Option<String> {
    match dict.get(key) {
        Ok(Object::String(bytes, _)) => Some(decode_text_string(bytes)),
        _ => None,
    }
}
