//! Serialises a composed `Document` with printpdf's built-in Helvetica faces.

use std::io::BufWriter;

use anyhow::{anyhow, Result};
use printpdf::{
    path::PaintMode, BuiltinFont, Color, IndirectFontRef, Line, Mm, PdfDocument,
    PdfLayerReference, Point, Pt, Rect, Rgb as PdfRgb,
};

use super::font_metrics::FontWeight;
use super::page::{Document, DrawOp, Rgb};

const LAYER: &str = "Layer 1";

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

impl Fonts {
    fn get(&self, weight: FontWeight) -> &IndirectFontRef {
        match weight {
            FontWeight::Regular => &self.regular,
            FontWeight::Bold => &self.bold,
        }
    }
}

fn mm(pt: f32) -> Mm {
    Mm::from(Pt(pt))
}

fn color(c: Rgb) -> Color {
    Color::Rgb(PdfRgb::new(c.r, c.g, c.b, None))
}

/// Writes every page of `doc` in order and returns the PDF bytes.
pub fn write_pdf(doc: &Document) -> Result<Vec<u8>> {
    let (width, height) = (mm(doc.geometry.width), mm(doc.geometry.height));
    let (pdf, first_page, first_layer) = PdfDocument::new(&doc.title, width, height, LAYER);

    let fonts = Fonts {
        regular: pdf
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| anyhow!("PDF font error: {e}"))?,
        bold: pdf
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| anyhow!("PDF font error: {e}"))?,
    };

    for (idx, page) in doc.pages.iter().enumerate() {
        let layer = if idx == 0 {
            pdf.get_page(first_page).get_layer(first_layer)
        } else {
            let (p, l) = pdf.add_page(width, height, LAYER);
            pdf.get_page(p).get_layer(l)
        };
        for op in &page.ops {
            draw(&layer, &fonts, op);
        }
    }

    let mut buf = BufWriter::new(Vec::new());
    pdf.save(&mut buf)
        .map_err(|e| anyhow!("PDF save error: {e}"))?;
    buf.into_inner()
        .map_err(|e| anyhow!("PDF buffer error: {e}"))
}

fn draw(layer: &PdfLayerReference, fonts: &Fonts, op: &DrawOp) {
    match op {
        DrawOp::Text {
            x,
            y,
            size,
            weight,
            color: c,
            text,
        } => {
            layer.set_fill_color(color(*c));
            layer.use_text(text.as_str(), *size, mm(*x), mm(*y), fonts.get(*weight));
        }
        DrawOp::Line {
            from,
            to,
            thickness,
            color: c,
        } => {
            layer.set_outline_color(color(*c));
            layer.set_outline_thickness(*thickness);
            layer.add_line(Line {
                points: vec![
                    (Point::new(mm(from.0), mm(from.1)), false),
                    (Point::new(mm(to.0), mm(to.1)), false),
                ],
                is_closed: false,
            });
        }
        DrawOp::Rect {
            x,
            y,
            width,
            height,
            fill,
            stroke,
            thickness,
        } => {
            let mode = match (fill, stroke) {
                (Some(_), Some(_)) => PaintMode::FillStroke,
                (Some(_), None) => PaintMode::Fill,
                (None, _) => PaintMode::Stroke,
            };
            if let Some(f) = fill {
                layer.set_fill_color(color(*f));
            }
            layer.set_outline_color(color(stroke.unwrap_or(Rgb::BLACK)));
            layer.set_outline_thickness(*thickness);
            layer.add_rect(
                Rect::new(mm(*x), mm(*y), mm(x + width), mm(y + height)).with_mode(mode),
            );
        }
    }
}
