//! Page geometry and the display list the composer produces.
//!
//! Coordinates are PDF points with the origin at the bottom-left corner of the page.
#![allow(dead_code)]

use super::font_metrics::FontWeight;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    /// Uniform margin on all four sides.
    pub margin: f32,
}

impl PageGeometry {
    /// A4 portrait with a 48pt margin.
    pub const A4: PageGeometry = PageGeometry {
        width: 595.28,
        height: 841.89,
        margin: 48.0,
    };

    pub fn content_width(&self) -> f32 {
        self.width - 2.0 * self.margin
    }

    pub fn top(&self) -> f32 {
        self.height - self.margin
    }

    pub fn left(&self) -> f32 {
        self.margin
    }

    pub fn right(&self) -> f32 {
        self.width - self.margin
    }

    pub fn bottom(&self) -> f32 {
        self.margin
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Rgb { r, g, b }
    }

    pub const BLACK: Rgb = Rgb::new(0.0, 0.0, 0.0);
    pub const WHITE: Rgb = Rgb::new(1.0, 1.0, 1.0);
    pub const GRAY: Rgb = Rgb::new(0.35, 0.35, 0.35);
    pub const LIGHT: Rgb = Rgb::new(0.95, 0.95, 0.95);
    pub const OK_FILL: Rgb = Rgb::new(0.92, 1.0, 0.92);
    pub const OK_STROKE: Rgb = Rgb::new(0.0, 0.5, 0.0);
    pub const WARN_FILL: Rgb = Rgb::new(1.0, 0.98, 0.86);
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    /// `y` is the text baseline.
    Text {
        x: f32,
        y: f32,
        size: f32,
        weight: FontWeight,
        color: Rgb,
        text: String,
    },
    Line {
        from: (f32, f32),
        to: (f32, f32),
        thickness: f32,
        color: Rgb,
    },
    /// `(x, y)` is the lower-left corner.
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        fill: Option<Rgb>,
        stroke: Option<Rgb>,
        thickness: f32,
    },
}

impl DrawOp {
    /// Lowest point the op can mark, descenders included.
    pub fn lowest_y(&self) -> f32 {
        match self {
            DrawOp::Text { y, size, .. } => y - 0.25 * size,
            DrawOp::Line { from, to, thickness, .. } => from.1.min(to.1) - thickness / 2.0,
            DrawOp::Rect { y, thickness, .. } => y - thickness / 2.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub ops: Vec<DrawOp>,
}

impl Page {
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

/// A composed document, ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub title: String,
    pub geometry: PageGeometry,
    pub pages: Vec<Page>,
}

impl Document {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Every text run in drawing order, across all pages.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.pages.iter().flat_map(Page::texts)
    }
}
