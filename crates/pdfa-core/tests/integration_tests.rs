//! Integration tests for pdfa-core
//!
//! These tests build documents in memory, round-trip them through lopdf's
//! writer and parser, and check what a PDF/A validator would look at.

use lopdf::dictionary;
use pdfa_core::{
    add_metadata, add_srgb_output_intent, info_title, make_grid_rectangle_default, new_document,
    new_page, new_page_with_crop_box, open_page_content, output_intents, page_crop_box, page_id,
    page_media_box, read_metadata, srgb_profile, to_grid_value, to_grid_value_default, Color,
    PdfError, PdfaSettings, Rectangle, SubLevel, COLOR_REGISTRY, CREATORS, SRGB_PROFILE,
};
use pretty_assertions::assert_eq;

/// Create a minimal valid PDF for testing
///
/// This creates a simple one-page PDF with A4 dimensions and some content.
fn create_test_pdf() -> Vec<u8> {
    let mut doc = lopdf::Document::with_version("1.4");

    let pages_id = doc.new_object_id();

    let contents_id = doc.add_object(lopdf::Stream::new(
        lopdf::dictionary! {},
        b"0 0 1 rg\n0 0 100 100 re\nf\n".to_vec(),
    ));

    let page_id = doc.add_object(lopdf::dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), 595.28.into(), 841.89.into()],
        "Resources" => lopdf::dictionary! {},
        "Contents" => contents_id,
    });

    doc.objects.insert(
        pages_id,
        lopdf::Object::Dictionary(lopdf::dictionary! {
            "Type" => "Pages",
            "Count" => 1,
            "Kids" => vec![page_id.into()],
        }),
    );

    let catalog_id = doc.add_object(lopdf::dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

/// Save and reload a document
fn roundtrip(doc: &mut lopdf::Document) -> lopdf::Document {
    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    lopdf::Document::load_mem(&buffer).unwrap()
}

fn last_page(doc: &lopdf::Document) -> lopdf::ObjectId {
    page_id(doc, doc.get_pages().len()).unwrap()
}

// ============================================================================
// Metadata
// ============================================================================

#[test]
fn test_metadata_reads_back_for_all_levels() {
    for part in 1..=3 {
        for sub_level in [SubLevel::Accessible, SubLevel::Basic, SubLevel::Unicode] {
            let title = format!("Edition {part}{sub_level}");
            let mut doc = new_document();
            add_metadata(&mut doc, &title, part, sub_level).unwrap();

            let doc = roundtrip(&mut doc);
            let packet = read_metadata(&doc).unwrap().expect("metadata present");

            let dc = packet.dublin_core().unwrap();
            assert_eq!(dc.title(), Some(title.as_str()));
            assert_eq!(dc.creators(), CREATORS.map(String::from).as_slice());

            let id = packet.pdfa_identification().unwrap();
            assert_eq!(id.part(), Some(part));
            assert_eq!(id.conformance(), Some(sub_level.as_str()));
        }
    }
}

#[test]
fn test_metadata_with_markup_and_umlauts() {
    let title = "Briefe & Tagebücher <1800–1810>";
    let mut doc = new_document();
    add_metadata(&mut doc, title, 2, SubLevel::Unicode).unwrap();

    let doc = roundtrip(&mut doc);
    let packet = read_metadata(&doc).unwrap().unwrap();
    assert_eq!(packet.dublin_core().unwrap().title(), Some(title));
    assert_eq!(info_title(&doc).unwrap().as_deref(), Some(title));
}

#[test]
fn test_metadata_keeps_surrounding_whitespace() {
    let title = "  Padded title  ";
    let mut doc = new_document();
    add_metadata(&mut doc, title, 1, SubLevel::Basic).unwrap();

    let doc = roundtrip(&mut doc);
    let packet = read_metadata(&doc).unwrap().unwrap();
    assert_eq!(packet.dublin_core().unwrap().title(), Some(title));
    assert_eq!(info_title(&doc).unwrap().as_deref(), Some(title));
}

#[test]
fn test_metadata_on_existing_pdf() {
    let mut doc = lopdf::Document::load_mem(&create_test_pdf()).unwrap();
    assert!(read_metadata(&doc).unwrap().is_none());

    add_metadata(&mut doc, "Loaded", 1, SubLevel::Basic).unwrap();

    let doc = roundtrip(&mut doc);
    assert_eq!(doc.get_pages().len(), 1);
    let packet = read_metadata(&doc).unwrap().unwrap();
    assert_eq!(packet.dublin_core().unwrap().title(), Some("Loaded"));
}

// ============================================================================
// Output intents
// ============================================================================

#[test]
fn test_output_intent_twice_gives_two_identical_entries() {
    let mut doc = new_document();
    add_srgb_output_intent(&mut doc).unwrap();
    add_srgb_output_intent(&mut doc).unwrap();

    let doc = roundtrip(&mut doc);
    let intents = output_intents(&doc).unwrap();
    assert_eq!(intents.len(), 2);

    for intent in &intents {
        assert_eq!(intent.info.as_deref(), Some(SRGB_PROFILE));
        assert_eq!(intent.output_condition.as_deref(), Some(SRGB_PROFILE));
        assert_eq!(intent.output_condition_identifier.as_deref(), Some(SRGB_PROFILE));
        assert_eq!(intent.registry_name.as_deref(), Some(COLOR_REGISTRY));
        assert_eq!(
            intent.profile_data(&doc).unwrap().unwrap(),
            srgb_profile().bytes()
        );
    }
}

#[test]
fn test_output_intent_keeps_existing_entries() {
    let mut doc = new_document();
    let foreign = doc.add_object(dictionary! {
        "Type" => "OutputIntent",
        "S" => "GTS_PDFX",
        "OutputConditionIdentifier" => lopdf::Object::string_literal("FOGRA39"),
    });
    let root = doc.trailer.get(b"Root").unwrap().as_reference().unwrap();
    doc.get_object_mut(root)
        .unwrap()
        .as_dict_mut()
        .unwrap()
        .set("OutputIntents", vec![lopdf::Object::Reference(foreign)]);

    add_srgb_output_intent(&mut doc).unwrap();

    let intents = output_intents(&doc).unwrap();
    assert_eq!(intents.len(), 2);
    assert_eq!(intents[0].subtype, "GTS_PDFX");
    assert_eq!(intents[0].output_condition_identifier.as_deref(), Some("FOGRA39"));
    assert_eq!(intents[1].subtype, "GTS_PDFA1");
}

#[test]
fn test_profile_constant_across_reads() {
    let first = srgb_profile().bytes();
    let second = srgb_profile().bytes();
    assert!(!first.is_empty());
    assert_eq!(first, second);
}

// ============================================================================
// Pages
// ============================================================================

#[test]
fn test_a4_page_without_crop_box() {
    let mut doc = new_document();
    new_page(&mut doc, 595.0, 842.0).unwrap().finish().unwrap();

    let doc = roundtrip(&mut doc);
    let page = last_page(&doc);
    let media_box = page_media_box(&doc, page).unwrap();
    assert_eq!(media_box, Rectangle::new(595.0, 842.0));
    assert_eq!(page_crop_box(&doc, page).unwrap(), media_box);
}

#[test]
fn test_page_with_crop_box() {
    let mut doc = new_document();
    new_page_with_crop_box(&mut doc, 595.0, 842.0, 500.0, 700.0, 50.0, 50.0)
        .unwrap()
        .finish()
        .unwrap();

    let doc = roundtrip(&mut doc);
    let crop_box = page_crop_box(&doc, last_page(&doc)).unwrap();
    assert_eq!(crop_box.upper_right_x, 500.0);
    assert_eq!(crop_box.upper_right_y, 700.0);
    assert_eq!(crop_box.lower_left_x, 50.0);
    assert_eq!(crop_box.lower_left_y, 50.0);
}

#[test]
fn test_new_page_appends_after_existing_pages() {
    let mut doc = lopdf::Document::load_mem(&create_test_pdf()).unwrap();
    let first = page_id(&doc, 1).unwrap();

    let mut page = new_page(&mut doc, 300.0, 200.0).unwrap();
    page.set_fill_color(Color::white())
        .rectangle(Rectangle::new(300.0, 200.0))
        .fill();
    let new_id = page.page_id();
    page.finish().unwrap();

    let doc = roundtrip(&mut doc);
    assert_eq!(doc.get_pages().len(), 2);
    assert_eq!(page_id(&doc, 1).unwrap(), first);
    assert_eq!(page_id(&doc, 2).unwrap(), new_id);
    assert_eq!(
        page_media_box(&doc, new_id).unwrap(),
        Rectangle::new(300.0, 200.0)
    );
}

#[test]
fn test_drawing_on_existing_page_preserves_content() {
    let mut doc = lopdf::Document::load_mem(&create_test_pdf()).unwrap();
    let first = page_id(&doc, 1).unwrap();

    let mut page = open_page_content(&mut doc, first).unwrap();
    page.set_stroke_color(Color::black()).stroke();
    page.finish().unwrap();

    let doc = roundtrip(&mut doc);
    let content = doc.get_and_decode_page_content(first).unwrap();
    let operators: Vec<&str> = content
        .operations
        .iter()
        .map(|op| op.operator.as_str())
        .collect();
    assert_eq!(operators, vec!["q", "rg", "re", "f", "Q", "RG", "S"]);
}

#[test]
fn test_invalid_page_number() {
    let doc = new_document();
    assert!(matches!(page_id(&doc, 3), Err(PdfError::InvalidPage(3, 0))));
}

// ============================================================================
// Grid values
// ============================================================================

#[test]
fn test_grid_value_formula() {
    let cases = [(100.0_f32, 300.0_f32), (2480.0, 240.0), (7.0, 96.0)];
    for (value, resolution) in cases {
        let expected = value * 72.0 / resolution;
        assert!((to_grid_value(value, resolution) - expected).abs() < 1e-3);
    }
    assert_eq!(to_grid_value_default(1234.0), to_grid_value(1234.0, 240.0));
}

#[test]
fn test_page_sized_from_scan() {
    let mut doc = new_document();
    let size = make_grid_rectangle_default(2480, 3508);
    new_page(&mut doc, size.width(), size.height())
        .unwrap()
        .finish()
        .unwrap();

    let media_box = page_media_box(&doc, last_page(&doc)).unwrap();
    assert!((media_box.width() - 744.0).abs() < 1e-3);
    assert!((media_box.height() - 1052.4).abs() < 1e-3);
}

// ============================================================================
// Complete PDF/A document
// ============================================================================

#[test]
fn test_settings_produce_complete_pdfa_document() {
    let settings = PdfaSettings::from_json(
        r#"{ "title": "Gesammelte Werke", "part": 2, "conformance": "B" }"#,
    )
    .unwrap();

    let mut doc = new_document();
    settings.apply(&mut doc).unwrap();
    new_page(&mut doc, 595.0, 842.0).unwrap().finish().unwrap();

    let doc = roundtrip(&mut doc);
    assert_eq!(doc.get_pages().len(), 1);
    assert_eq!(output_intents(&doc).unwrap().len(), 1);
    let packet = read_metadata(&doc).unwrap().unwrap();
    assert_eq!(
        packet.pdfa_identification().unwrap().sub_level(),
        Some(SubLevel::Basic)
    );
}
