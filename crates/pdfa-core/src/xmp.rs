//! XMP packet model covering the Dublin Core and PDF/A identification schemas
//!
//! Only the properties needed for PDF/A identification are modelled. Each
//! schema is written as its own `rdf:Description`, wrapped in an `xpacket`
//! header and trailer.

use crate::conformance::SubLevel;
use crate::ProcessingError;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::io::Write;
use thiserror::Error;

const NS_X: &str = "adobe:ns:meta/";
const NS_RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
const NS_DC: &str = "http://purl.org/dc/elements/1.1/";
const NS_PDFAID: &str = "http://www.aiim.org/pdfa/ns/id/";

const XPACKET_BEGIN: &str = "<?xpacket begin=\"\u{FEFF}\" id=\"W5M0MpCehiHzreSzNTczkc9d\"?>";
const XPACKET_END: &str = "<?xpacket end=\"w\"?>";

/// A property value rejected by a schema
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("bad value {value:?} for field {field}")]
pub struct BadFieldValue {
    pub field: &'static str,
    pub value: String,
}

/// Dublin Core properties (`dc:` namespace)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DublinCore {
    title: Option<String>,
    creators: Vec<String>,
}

impl DublinCore {
    /// Set the default-language title
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    /// Append a creator; order is preserved in the serialized `rdf:Seq`
    pub fn add_creator(&mut self, creator: impl Into<String>) {
        self.creators.push(creator.into());
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn creators(&self) -> &[String] {
        &self.creators
    }
}

/// PDF/A identification properties (`pdfaid:` namespace)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PdfaIdentification {
    part: Option<u32>,
    conformance: Option<String>,
}

impl PdfaIdentification {
    pub fn set_part(&mut self, part: u32) {
        self.part = Some(part);
    }

    /// Set the conformance level letter
    ///
    /// Only `A`, `B` and `U` are accepted.
    pub fn set_conformance(&mut self, conformance: &str) -> Result<(), BadFieldValue> {
        match conformance.parse::<SubLevel>() {
            Ok(level) if level.as_str() == conformance => {
                self.conformance = Some(conformance.to_string());
                Ok(())
            }
            _ => Err(BadFieldValue {
                field: "pdfaid:conformance",
                value: conformance.to_string(),
            }),
        }
    }

    pub fn part(&self) -> Option<u32> {
        self.part
    }

    pub fn conformance(&self) -> Option<&str> {
        self.conformance.as_deref()
    }

    /// The conformance as a typed sub-level, if set
    pub fn sub_level(&self) -> Option<SubLevel> {
        self.conformance.as_deref().and_then(|c| c.parse().ok())
    }
}

/// An XMP metadata packet
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmpPacket {
    dublin_core: Option<DublinCore>,
    pdfa_identification: Option<PdfaIdentification>,
}

impl XmpPacket {
    /// Create an empty packet
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a Dublin Core schema, replacing any existing one
    pub fn create_and_add_dublin_core(&mut self) -> &mut DublinCore {
        self.dublin_core.insert(DublinCore::default())
    }

    /// Add a PDF/A identification schema, replacing any existing one
    pub fn create_and_add_pdfa_identification(&mut self) -> &mut PdfaIdentification {
        self.pdfa_identification.insert(PdfaIdentification::default())
    }

    pub fn dublin_core(&self) -> Option<&DublinCore> {
        self.dublin_core.as_ref()
    }

    pub fn pdfa_identification(&self) -> Option<&PdfaIdentification> {
        self.pdfa_identification.as_ref()
    }

    /// Serialize the packet, including the `xpacket` wrapper, into `out`
    pub fn serialize<W: Write>(&self, out: W) -> Result<W, ProcessingError> {
        let mut writer = Writer::new_with_indent(out, b' ', 1);
        writer.get_mut().write_all(XPACKET_BEGIN.as_bytes())?;
        writer.get_mut().write_all(b"\n")?;

        writer.write_event(Event::Start(
            BytesStart::new("x:xmpmeta").with_attributes([("xmlns:x", NS_X)]),
        ))?;
        writer.write_event(Event::Start(
            BytesStart::new("rdf:RDF").with_attributes([("xmlns:rdf", NS_RDF)]),
        ))?;

        if let Some(dc) = &self.dublin_core {
            write_dublin_core(&mut writer, dc)?;
        }
        if let Some(id) = &self.pdfa_identification {
            write_pdfa_identification(&mut writer, id)?;
        }

        writer.write_event(Event::End(BytesEnd::new("rdf:RDF")))?;
        writer.write_event(Event::End(BytesEnd::new("x:xmpmeta")))?;

        let mut out = writer.into_inner();
        out.write_all(b"\n")?;
        out.write_all(XPACKET_END.as_bytes())?;
        Ok(out)
    }

    /// Serialize the packet into a byte buffer
    pub fn to_bytes(&self) -> Result<Vec<u8>, ProcessingError> {
        self.serialize(Vec::new())
    }

    /// Parse the properties this module models out of an XMP packet
    ///
    /// Unknown schemas and properties are skipped. Both element form
    /// (`<pdfaid:part>1</pdfaid:part>`) and attribute form
    /// (`pdfaid:part="1"` on `rdf:Description`) are understood.
    pub fn parse(data: &[u8]) -> Result<Self, ProcessingError> {
        // text is kept verbatim; only leaf elements carry property values
        let mut reader = Reader::from_reader(data);

        let mut packet = XmpPacket::new();
        let mut stack: Vec<Vec<u8>> = Vec::new();
        let mut text = String::new();
        let mut leaf = false;
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) => {
                    if e.name().as_ref() == b"rdf:Description" {
                        read_description_attributes(&e, &mut packet)?;
                    }
                    stack.push(e.name().as_ref().to_vec());
                    text.clear();
                    leaf = true;
                }
                Event::Empty(e) => {
                    if e.name().as_ref() == b"rdf:Description" {
                        read_description_attributes(&e, &mut packet)?;
                    }
                }
                Event::Text(e) => text.push_str(&e.unescape()?),
                Event::CData(e) => text.push_str(&String::from_utf8_lossy(&e)),
                Event::End(_) => {
                    let value = std::mem::take(&mut text);
                    if leaf {
                        apply_property(&mut packet, &stack, value)?;
                    }
                    leaf = false;
                    stack.pop();
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(packet)
    }
}

fn write_dublin_core<W: Write>(
    writer: &mut Writer<W>,
    dc: &DublinCore,
) -> Result<(), ProcessingError> {
    writer.write_event(Event::Start(
        BytesStart::new("rdf:Description").with_attributes([("rdf:about", ""), ("xmlns:dc", NS_DC)]),
    ))?;

    if let Some(title) = &dc.title {
        writer.write_event(Event::Start(BytesStart::new("dc:title")))?;
        writer.write_event(Event::Start(BytesStart::new("rdf:Alt")))?;
        writer.write_event(Event::Start(
            BytesStart::new("rdf:li").with_attributes([("xml:lang", "x-default")]),
        ))?;
        writer.write_event(Event::Text(BytesText::new(title)))?;
        writer.write_event(Event::End(BytesEnd::new("rdf:li")))?;
        writer.write_event(Event::End(BytesEnd::new("rdf:Alt")))?;
        writer.write_event(Event::End(BytesEnd::new("dc:title")))?;
    }

    if !dc.creators.is_empty() {
        writer.write_event(Event::Start(BytesStart::new("dc:creator")))?;
        writer.write_event(Event::Start(BytesStart::new("rdf:Seq")))?;
        for creator in &dc.creators {
            writer.write_event(Event::Start(BytesStart::new("rdf:li")))?;
            writer.write_event(Event::Text(BytesText::new(creator)))?;
            writer.write_event(Event::End(BytesEnd::new("rdf:li")))?;
        }
        writer.write_event(Event::End(BytesEnd::new("rdf:Seq")))?;
        writer.write_event(Event::End(BytesEnd::new("dc:creator")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("rdf:Description")))?;
    Ok(())
}

fn write_pdfa_identification<W: Write>(
    writer: &mut Writer<W>,
    id: &PdfaIdentification,
) -> Result<(), ProcessingError> {
    writer.write_event(Event::Start(
        BytesStart::new("rdf:Description")
            .with_attributes([("rdf:about", ""), ("xmlns:pdfaid", NS_PDFAID)]),
    ))?;

    if let Some(part) = id.part {
        let part = part.to_string();
        writer.write_event(Event::Start(BytesStart::new("pdfaid:part")))?;
        writer.write_event(Event::Text(BytesText::new(&part)))?;
        writer.write_event(Event::End(BytesEnd::new("pdfaid:part")))?;
    }
    if let Some(conformance) = &id.conformance {
        writer.write_event(Event::Start(BytesStart::new("pdfaid:conformance")))?;
        writer.write_event(Event::Text(BytesText::new(conformance)))?;
        writer.write_event(Event::End(BytesEnd::new("pdfaid:conformance")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("rdf:Description")))?;
    Ok(())
}

fn read_description_attributes(
    element: &BytesStart<'_>,
    packet: &mut XmpPacket,
) -> Result<(), ProcessingError> {
    for attr in element.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        match attr.key.as_ref() {
            b"pdfaid:part" => {
                let value = attr.unescape_value()?;
                set_part_from_text(packet, &value)?;
            }
            b"pdfaid:conformance" => {
                let value = attr.unescape_value()?;
                set_conformance_from_text(packet, &value)?;
            }
            _ => {}
        }
    }
    Ok(())
}

/// Store a closed element's text if its path names a modelled property
fn apply_property(
    packet: &mut XmpPacket,
    stack: &[Vec<u8>],
    value: String,
) -> Result<(), ProcessingError> {
    let path: Vec<&[u8]> = stack.iter().rev().take(3).map(Vec::as_slice).collect();
    match path.as_slice() {
        [b"rdf:li", b"rdf:Alt", b"dc:title", ..] => {
            let dc = packet.dublin_core.get_or_insert_with(DublinCore::default);
            // first alternative wins, which is x-default for packets written here
            if dc.title.is_none() {
                dc.title = Some(value);
            }
        }
        [b"rdf:li", b"rdf:Seq", b"dc:creator", ..] => {
            packet
                .dublin_core
                .get_or_insert_with(DublinCore::default)
                .creators
                .push(value);
        }
        [b"pdfaid:part", ..] => set_part_from_text(packet, &value)?,
        [b"pdfaid:conformance", ..] => set_conformance_from_text(packet, &value)?,
        _ => {}
    }
    Ok(())
}

fn set_part_from_text(packet: &mut XmpPacket, value: &str) -> Result<(), ProcessingError> {
    let part = value.trim().parse::<u32>().map_err(|e| {
        ProcessingError::with_cause(format!("invalid pdfaid:part value {value:?}"), e)
    })?;
    packet
        .pdfa_identification
        .get_or_insert_with(PdfaIdentification::default)
        .set_part(part);
    Ok(())
}

fn set_conformance_from_text(packet: &mut XmpPacket, value: &str) -> Result<(), ProcessingError> {
    packet
        .pdfa_identification
        .get_or_insert_with(PdfaIdentification::default)
        .set_conformance(value.trim())
        .map_err(|e| ProcessingError::with_cause("invalid PDF/A identification in XMP", e))
}
