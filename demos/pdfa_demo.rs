//! Write a one-page PDF/A-2B document
//!
//! Usage: cargo run --example pdfa_demo -- [output.pdf] [title]
//!
//! Set `RUST_LOG=debug` to see what gets added to the document.

use pdfa_core::{
    add_metadata, add_srgb_output_intent, make_grid_rectangle_default, new_document,
    new_page_with_crop_box, Color, Rectangle, SubLevel,
};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let output = args.next().unwrap_or_else(|| "pdfa_demo.pdf".to_string());
    let title = args.next().unwrap_or_else(|| "PDF/A demo".to_string());

    let mut doc = new_document();
    add_metadata(&mut doc, &title, 2, SubLevel::Basic)?;
    add_srgb_output_intent(&mut doc)?;

    // an A4 scan at 240 dpi, cropped by a 10 mm margin
    let size = make_grid_rectangle_default(1984, 2806);
    let margin = 28.35;
    let mut page = new_page_with_crop_box(
        &mut doc,
        size.width(),
        size.height(),
        size.width() - margin,
        size.height() - margin,
        margin,
        margin,
    )?;
    page.set_fill_color(Color::from_rgb(240, 236, 226))
        .rectangle(Rectangle::new(size.width(), size.height()))
        .fill()
        .set_stroke_color(Color::black())
        .set_line_width(0.5)
        .rectangle(Rectangle::from_corners(
            margin,
            margin,
            size.width() - margin,
            size.height() - margin,
        ))
        .stroke();
    page.finish()?;

    doc.save(&output)?;
    println!("Wrote {output} ({} x {} pt)", size.width(), size.height());
    Ok(())
}
