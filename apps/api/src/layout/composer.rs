//! Cursor-based page composer.
//!
//! One `Composer` owns the page list and a forward-only vertical cursor. Every drawing
//! helper reserves its worst-case height with `ensure_space` before it draws, which is the
//! only place a page break can happen. Nothing is ever drawn below the bottom margin;
//! `place` checks that in debug builds.
//!
//! Atomic primitives (`draw_*`) take positions relative to the cursor (`dy` is the distance
//! below it) and never break pages. Block helpers (`paragraph`, `bulleted_list`, `tag_row`,
//! ...) reserve space, draw, and advance.
#![allow(dead_code)]

use super::font_metrics::{get_metrics, FontWeight};
use super::page::{Document, DrawOp, Page, PageGeometry, Rgb};
use super::wrap::wrap_with;

pub const H1: f32 = 18.0;
pub const H2: f32 = 12.5;
pub const BODY: f32 = 10.5;
pub const SMALL: f32 = 9.0;

/// Indent of list text after its marker.
pub const MARKER_INDENT: f32 = 16.0;
const ITEM_GAP: f32 = 2.0;
const CHIP_PAD_X: f32 = 8.0;
const CHIP_PAD_Y: f32 = 5.0;
const CHIP_GAP: f32 = 10.0;
const SEPARATOR_SPACE: f32 = 18.0;
const FOOTER_BASELINE: f32 = 24.0;
const ELLIPSIS: &str = "...";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub size: f32,
    pub weight: FontWeight,
    pub color: Rgb,
}

impl TextStyle {
    pub const fn regular(size: f32) -> Self {
        TextStyle {
            size,
            weight: FontWeight::Regular,
            color: Rgb::BLACK,
        }
    }

    pub const fn bold(size: f32) -> Self {
        TextStyle {
            size,
            weight: FontWeight::Bold,
            color: Rgb::BLACK,
        }
    }

    pub const fn colored(self, color: Rgb) -> Self {
        TextStyle { color, ..self }
    }

    /// Baseline-to-baseline distance.
    pub fn line_height(&self) -> f32 {
        self.size * 4.0 / 3.0
    }

    pub fn width_of(&self, text: &str) -> f32 {
        get_metrics(self.weight).width_at(text, self.size)
    }

    pub fn wrap(&self, text: &str, max_width: f32) -> Vec<String> {
        wrap_with(get_metrics(self.weight), text, max_width, self.size)
    }
}

#[derive(Debug, Clone, Copy)]
struct Cursor {
    page: usize,
    y: f32,
}

pub struct Composer {
    geometry: PageGeometry,
    pages: Vec<Page>,
    cursor: Cursor,
}

impl Composer {
    pub fn new(geometry: PageGeometry) -> Self {
        Composer {
            geometry,
            pages: vec![Page::default()],
            cursor: Cursor {
                page: 0,
                y: geometry.top(),
            },
        }
    }

    pub fn geometry(&self) -> PageGeometry {
        self.geometry
    }

    pub fn y(&self) -> f32 {
        self.cursor.y
    }

    pub fn page_index(&self) -> usize {
        self.cursor.page
    }

    /// Vertical space left above the bottom margin.
    pub fn remaining(&self) -> f32 {
        self.cursor.y - self.geometry.bottom()
    }

    // ────────────────────────────────────────────────────────────────────────
    // Cursor control
    // ────────────────────────────────────────────────────────────────────────

    /// Starts a new page if fewer than `height` points remain. Returns whether it broke.
    pub fn ensure_space(&mut self, height: f32) -> bool {
        if self.remaining() < height {
            self.new_page();
            true
        } else {
            false
        }
    }

    pub fn new_page(&mut self) {
        self.pages.push(Page::default());
        self.cursor = Cursor {
            page: self.pages.len() - 1,
            y: self.geometry.top(),
        };
    }

    pub fn advance(&mut self, dy: f32) {
        self.cursor.y -= dy;
    }

    fn place(&mut self, op: DrawOp) {
        debug_assert!(
            op.lowest_y() >= self.geometry.bottom() - 0.01,
            "op drawn below the bottom margin on page {}: {op:?}",
            self.cursor.page + 1
        );
        self.pages[self.cursor.page].ops.push(op);
    }

    // ────────────────────────────────────────────────────────────────────────
    // Atomic primitives
    // ────────────────────────────────────────────────────────────────────────

    /// Draws one line of text with its baseline `dy` below the cursor.
    pub fn draw_text(&mut self, x: f32, dy: f32, text: &str, style: TextStyle) {
        self.place(DrawOp::Text {
            x,
            y: self.cursor.y - dy,
            size: style.size,
            weight: style.weight,
            color: style.color,
            text: text.to_string(),
        });
    }

    pub fn draw_line(&mut self, from: (f32, f32), to: (f32, f32), thickness: f32, color: Rgb) {
        let y = self.cursor.y;
        self.place(DrawOp::Line {
            from: (from.0, y - from.1),
            to: (to.0, y - to.1),
            thickness,
            color,
        });
    }

    /// Bordered card whose top edge sits `dy` below the cursor.
    pub fn draw_rect(
        &mut self,
        x: f32,
        dy: f32,
        width: f32,
        height: f32,
        fill: Option<Rgb>,
        stroke: Option<Rgb>,
    ) {
        self.place(DrawOp::Rect {
            x,
            y: self.cursor.y - dy - height,
            width,
            height,
            fill,
            stroke,
            thickness: 1.0,
        });
    }

    /// Green tick in a square box; the box top sits `dy` below the cursor.
    pub fn draw_check_glyph(&mut self, x: f32, dy: f32, size: f32) {
        self.draw_rect(x, dy, size, size, Some(Rgb::OK_FILL), Some(Rgb::BLACK));
        let mid = (x + 0.3 * size, dy + size - 3.0);
        self.draw_line((x + 2.0, dy + size / 2.0), mid, 1.6, Rgb::OK_STROKE);
        self.draw_line(mid, (x + size - 2.0, dy + 2.0), 1.6, Rgb::OK_STROKE);
    }

    /// Warning triangle with an exclamation mark; same footprint as the check glyph.
    pub fn draw_warn_glyph(&mut self, x: f32, dy: f32, size: f32) {
        self.draw_rect(x, dy, size, size, Some(Rgb::WARN_FILL), None);
        let top = (x + size / 2.0, dy + 1.0);
        let left = (x + 1.0, dy + size - 1.0);
        let right = (x + size - 1.0, dy + size - 1.0);
        self.draw_line(top, left, 1.2, Rgb::BLACK);
        self.draw_line(top, right, 1.2, Rgb::BLACK);
        self.draw_line(left, right, 1.2, Rgb::BLACK);
        self.draw_line(
            (x + size / 2.0, dy + 4.0),
            (x + size / 2.0, dy + size - 5.0),
            1.4,
            Rgb::BLACK,
        );
        self.draw_rect(x + size / 2.0 - 0.7, dy + size - 3.8, 1.4, 1.4, Some(Rgb::BLACK), None);
    }

    // ────────────────────────────────────────────────────────────────────────
    // Blocks
    // ────────────────────────────────────────────────────────────────────────

    /// One unwrapped line at `indent` from the left margin.
    pub fn text_line(&mut self, indent: f32, text: &str, style: TextStyle) {
        let lh = style.line_height();
        self.ensure_space(lh);
        self.draw_text(self.geometry.left() + indent, style.size, text, style);
        self.advance(lh);
    }

    /// Wrapped text at `indent`, one line-height per line.
    pub fn paragraph(&mut self, indent: f32, text: &str, style: TextStyle) {
        for line in style.wrap(text, self.geometry.content_width() - indent) {
            self.text_line(indent, &line, style);
        }
    }

    /// Wraps `text` and keeps at most `max_lines`, ending the last kept line with "...".
    pub fn clip_lines(&self, text: &str, max_width: f32, style: TextStyle, max_lines: usize) -> Vec<String> {
        let mut lines = style.wrap(text, max_width);
        if lines.len() > max_lines {
            lines.truncate(max_lines.max(1));
            if let Some(last) = lines.last_mut() {
                while !last.is_empty() && style.width_of(&format!("{last}{ELLIPSIS}")) > max_width {
                    last.pop();
                }
                last.push_str(ELLIPSIS);
            }
        }
        lines
    }

    /// Heading followed by a separator rule. Keeps room for one body line after it.
    pub fn section_title(&mut self, title: &str) {
        let style = TextStyle::bold(H2);
        self.ensure_space(style.line_height() + 14.0 + TextStyle::regular(BODY).line_height());
        self.draw_text(self.geometry.left(), style.size, title, style);
        self.advance(style.line_height());
        let (left, right) = (self.geometry.left(), self.geometry.right());
        self.draw_line((left, 2.0), (right, 2.0), 1.0, Rgb::BLACK);
        self.advance(14.0);
    }

    /// A thin rule between blocks. Omitted when the page is about to end anyway.
    pub fn separator(&mut self, thickness: f32) {
        if self.ensure_space(SEPARATOR_SPACE) {
            return;
        }
        let (left, right) = (self.geometry.left(), self.geometry.right());
        self.draw_line((left, 6.0), (right, 6.0), thickness, Rgb::BLACK);
        self.advance(SEPARATOR_SPACE);
    }

    pub fn bulleted_list(&mut self, items: &[String], style: TextStyle) {
        self.marked_list(items, style, |_| "•".to_string());
    }

    pub fn numbered_list(&mut self, items: &[String], style: TextStyle) {
        self.marked_list(items, style, |i| format!("{}.", i + 1));
    }

    /// Blank items are skipped; numbering counts only the items drawn.
    fn marked_list(&mut self, items: &[String], style: TextStyle, marker: impl Fn(usize) -> String) {
        let left = self.geometry.left();
        let width = self.geometry.content_width() - MARKER_INDENT;
        let marker_style = TextStyle::bold(style.size).colored(style.color);

        for (n, item) in items.iter().filter(|i| !i.trim().is_empty()).enumerate() {
            for (i, line) in style.wrap(item, width).iter().enumerate() {
                self.ensure_space(style.line_height());
                if i == 0 {
                    self.draw_text(left, style.size, &marker(n), marker_style);
                }
                self.draw_text(left + MARKER_INDENT, style.size, line, style);
                self.advance(style.line_height());
            }
            self.advance(ITEM_GAP);
        }
    }

    /// Short label chips laid out left to right, wrapping to new rows.
    pub fn tag_row(&mut self, items: &[String]) {
        let style = TextStyle::regular(SMALL);
        let chip_height = SMALL + 2.0 * CHIP_PAD_Y;
        let left = self.geometry.left();
        let right = self.geometry.right();
        let max_label = self.geometry.content_width() - 2.0 * CHIP_PAD_X;

        let mut x = left;
        let mut drew_any = false;

        for item in items {
            let label = item.trim();
            if label.is_empty() {
                continue;
            }
            let label = self
                .clip_lines(label, max_label, style, 1)
                .pop()
                .unwrap_or_default();
            let chip_width = style.width_of(&label) + 2.0 * CHIP_PAD_X;

            if !drew_any {
                self.ensure_space(chip_height + 1.0);
            } else if x + chip_width > right {
                // Row wrap: next row starts below this one, back at the left margin.
                self.advance(chip_height + CHIP_GAP);
                self.ensure_space(chip_height + 1.0);
                x = left;
            }

            self.draw_rect(x, 0.0, chip_width, chip_height, Some(Rgb::LIGHT), Some(Rgb::BLACK));
            self.draw_text(x + CHIP_PAD_X, CHIP_PAD_Y + SMALL * 0.8, &label, style);
            x += chip_width + CHIP_GAP;
            drew_any = true;
        }

        if drew_any {
            self.advance(chip_height + 14.0);
        }
    }

    // ────────────────────────────────────────────────────────────────────────
    // Finalisation
    // ────────────────────────────────────────────────────────────────────────

    /// Stamps `footer(page_number, total)` into the bottom margin of every page.
    pub fn finish(mut self, title: &str, footer: impl Fn(usize, usize) -> String) -> Document {
        let total = self.pages.len();
        for (idx, page) in self.pages.iter_mut().enumerate() {
            page.ops.push(DrawOp::Text {
                x: self.geometry.left(),
                y: FOOTER_BASELINE,
                size: SMALL,
                weight: FontWeight::Regular,
                color: Rgb::GRAY,
                text: footer(idx + 1, total),
            });
        }
        Document {
            title: title.to_string(),
            geometry: self.geometry,
            pages: self.pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn content_ops(doc: &Document) -> impl Iterator<Item = &DrawOp> {
        // The footer is the last op of each page.
        doc.pages
            .iter()
            .flat_map(|p| p.ops.iter().take(p.ops.len().saturating_sub(1)))
    }

    #[test]
    fn test_ensure_space_breaks_only_when_needed() {
        let mut c = Composer::new(PageGeometry::A4);
        assert!(!c.ensure_space(100.0));
        assert_eq!(c.page_index(), 0);

        c.advance(c.remaining() - 10.0);
        assert!(c.ensure_space(20.0));
        assert_eq!(c.page_index(), 1);
        assert_eq!(c.y(), PageGeometry::A4.top());
    }

    #[test]
    fn test_long_paragraphs_flow_onto_new_pages_within_margins() {
        let mut c = Composer::new(PageGeometry::A4);
        let text = "Designed and shipped a resilient ingestion pipeline. ".repeat(40);
        for _ in 0..8 {
            c.paragraph(0.0, &text, TextStyle::regular(BODY));
        }
        let doc = c.finish("t", |n, total| format!("{n}/{total}"));

        assert!(doc.page_count() > 1);
        let bottom = doc.geometry.bottom();
        for op in content_ops(&doc) {
            assert!(op.lowest_y() >= bottom - 0.01, "{op:?}");
        }
    }

    #[test]
    fn test_bulleted_list_skips_blank_items() {
        let mut c = Composer::new(PageGeometry::A4);
        c.bulleted_list(&strings(&["first", "", "   ", "second"]), TextStyle::regular(BODY));
        let doc = c.finish("t", |_, _| String::new());
        let texts: Vec<&str> = doc.texts().collect();
        assert_eq!(texts, vec!["•", "first", "•", "second", ""]);
    }

    #[test]
    fn test_numbered_list_counts_drawn_items() {
        let mut c = Composer::new(PageGeometry::A4);
        c.numbered_list(&strings(&["Header", "", "Skills"]), TextStyle::regular(BODY));
        let doc = c.finish("t", |_, _| String::new());
        let texts: Vec<&str> = doc.texts().collect();
        assert_eq!(texts, vec!["1.", "Header", "2.", "Skills", ""]);
    }

    #[test]
    fn test_tag_row_wraps_to_left_margin() {
        let mut c = Composer::new(PageGeometry::A4);
        let start_y = c.y();
        let tags: Vec<String> = (0..30).map(|i| format!("Keyword number {i}")).collect();
        c.tag_row(&tags);
        let geometry = c.geometry();
        let doc = c.finish("t", |_, _| String::new());

        let rects: Vec<(f32, f32, f32)> = doc.pages[0]
            .ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Rect { x, y, width, .. } => Some((*x, *y, *width)),
                _ => None,
            })
            .collect();
        assert_eq!(rects.len(), 30);

        let rows: std::collections::BTreeSet<i64> = rects.iter().map(|r| r.1.round() as i64).collect();
        assert!(rows.len() > 1, "chips should wrap onto several rows");
        for (x, _, width) in &rects {
            assert!(x + width <= geometry.right() + 0.01);
        }
        // First chip of every row starts at the left margin.
        let mut by_row: std::collections::BTreeMap<i64, f32> = Default::default();
        for (x, y, _) in &rects {
            let e = by_row.entry(y.round() as i64).or_insert(f32::MAX);
            *e = e.min(*x);
        }
        assert!(by_row.values().all(|x| (*x - geometry.left()).abs() < 0.01));
        assert!(rects[0].1 < start_y);
    }

    #[test]
    fn test_tag_row_with_no_labels_draws_nothing() {
        let mut c = Composer::new(PageGeometry::A4);
        let y = c.y();
        c.tag_row(&strings(&["", "  "]));
        assert_eq!(c.y(), y);
    }

    #[test]
    fn test_separator_is_skipped_at_page_end() {
        let mut c = Composer::new(PageGeometry::A4);
        c.advance(c.remaining() - 5.0);
        c.separator(0.5);
        assert_eq!(c.page_index(), 1);
        assert_eq!(c.y(), PageGeometry::A4.top());
        let doc = c.finish("t", |_, _| String::new());
        assert!(doc.pages[0].ops.iter().all(|op| !matches!(op, DrawOp::Line { .. })));
    }

    #[test]
    fn test_section_title_never_orphaned_at_page_bottom() {
        let mut c = Composer::new(PageGeometry::A4);
        c.advance(c.remaining() - 30.0);
        c.section_title("Checklist");
        assert_eq!(c.page_index(), 1);
    }

    #[test]
    fn test_glyphs_stay_inside_their_box() {
        let mut c = Composer::new(PageGeometry::A4);
        c.draw_check_glyph(100.0, 0.0, 12.0);
        c.draw_warn_glyph(200.0, 0.0, 12.0);
        let top = c.y();
        let doc = c.finish("t", |_, _| String::new());
        for op in content_ops(&doc) {
            assert!(op.lowest_y() >= top - 12.0 - 1.0);
        }
    }

    #[test]
    fn test_clip_lines_appends_ellipsis() {
        let c = Composer::new(PageGeometry::A4);
        let style = TextStyle::regular(BODY);
        let text = "word ".repeat(200);
        let lines = c.clip_lines(&text, 200.0, style, 2);
        assert_eq!(lines.len(), 2);
        assert!(lines[1].ends_with("..."));
        assert!(style.width_of(&lines[1]) <= 200.0);
        assert_eq!(c.clip_lines("short", 200.0, style, 2), vec!["short"]);
    }

    #[test]
    fn test_footer_pass_numbers_every_page() {
        let mut c = Composer::new(PageGeometry::A4);
        c.new_page();
        c.new_page();
        let doc = c.finish("Report", |n, total| format!("brand • Page {n}/{total}"));
        assert_eq!(doc.page_count(), 3);
        let footers: Vec<&str> = doc.pages.iter().filter_map(|p| p.texts().last()).collect();
        assert_eq!(
            footers,
            vec!["brand • Page 1/3", "brand • Page 2/3", "brand • Page 3/3"]
        );
    }
}
