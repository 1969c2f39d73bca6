//! Document Renderer: maps one `Report` onto layout calls in a fixed section order.
//!
//! Order: header → score card → role matches → executive summary → top fixes →
//! checklist → keyword chips → rewritten bullets → outline → footer pass.
//!
//! Every section is truncated to its schema maximum before drawing, so layout time and
//! page count stay bounded even for a report that never went through the decoder.

pub mod labels;

use anyhow::Result;
use chrono::NaiveDate;

use crate::layout::composer::{BODY, H1, H2, MARKER_INDENT, SMALL};
use crate::layout::{pdf::write_pdf, Composer, Document, PageGeometry, Rgb, TextStyle};
use crate::models::{CheckStatus, Language, Report, RoleMatch};
use crate::schema::{
    Bounds, BEST_MATCHES, CHECKLIST, MISSING_KEYWORDS, RECOMMENDED_CHANGES, REWRITTEN_BULLETS,
    SUGGESTED_KEYWORDS, SUMMARY, TEMPLATE_OUTLINE, TOP_FIXES, WHY_FIT,
};
use labels::{labels, Labels};

/// Summary bullets shown inside the score card.
const CARD_SUMMARY_ITEMS: usize = 5;
const CARD_PAD: f32 = 14.0;
const SCORE_SIZE: f32 = 26.0;
const GLYPH_SIZE: f32 = 11.0;
const GLYPH_INDENT: f32 = 18.0;

#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    pub language: Language,
    /// Printed in the header. Passed in so output is a pure function of its inputs.
    pub generated_on: NaiveDate,
    pub geometry: PageGeometry,
}

/// Renders and serialises to PDF bytes.
pub fn render_pdf(report: &Report, options: &RenderOptions) -> Result<Vec<u8>> {
    write_pdf(&render_document(report, options))
}

pub fn render_document(report: &Report, options: &RenderOptions) -> Document {
    let l = labels(options.language);
    let mut c = Composer::new(options.geometry);

    header(&mut c, l, options.generated_on);
    score_card(&mut c, l, report);
    role_matches(&mut c, l, capped(&report.best_matches, BEST_MATCHES));

    c.section_title(l.summary);
    c.bulleted_list(capped(&report.summary, SUMMARY), TextStyle::regular(BODY));

    top_fixes(&mut c, l, report);
    checklist(&mut c, l, report);

    c.section_title(l.suggested_keywords);
    c.tag_row(capped(&report.suggested_keywords, SUGGESTED_KEYWORDS));

    rewritten_bullets(&mut c, l, report);

    c.section_title(l.outline);
    c.numbered_list(capped(&report.template_outline, TEMPLATE_OUTLINE), TextStyle::regular(BODY));

    c.finish(l.title, |n, total| {
        format!("{} • {} {n}/{total}", l.brand, l.page)
    })
}

fn capped<T>(items: &[T], bounds: Bounds) -> &[T] {
    &items[..items.len().min(bounds.max)]
}

/// Small gray caption, kept on the same page as the line that follows it.
fn caption(c: &mut Composer, text: &str) {
    let style = TextStyle::bold(SMALL).colored(Rgb::GRAY);
    c.ensure_space(style.line_height() + TextStyle::regular(BODY).line_height());
    c.text_line(0.0, text, style);
}

// ────────────────────────────────────────────────────────────────────────────
// Sections
// ────────────────────────────────────────────────────────────────────────────

fn header(c: &mut Composer, l: &Labels, generated_on: NaiveDate) {
    c.text_line(0.0, l.title, TextStyle::bold(H1));
    let date = generated_on.format(l.date_format).to_string();
    c.text_line(
        0.0,
        &format!("{}: {date}", l.generated),
        TextStyle::regular(SMALL).colored(Rgb::GRAY),
    );
    c.advance(10.0);
}

fn score_card(c: &mut Composer, l: &Labels, report: &Report) {
    let g = c.geometry();
    let left = g.left() + CARD_PAD;
    let inner = g.content_width() - 2.0 * CARD_PAD;

    let title_style = TextStyle::bold(H2);
    let score_style = TextStyle::bold(SCORE_SIZE);
    let diag_style = TextStyle::regular(BODY).colored(Rgb::GRAY);
    let bullet_style = TextStyle::regular(SMALL);

    let score_text = format!("{}/100", report.score);
    let score_width = score_style.width_of(&score_text);
    let diag_lines = c.clip_lines(
        l.diagnosis(report.score),
        inner - score_width - CARD_PAD,
        diag_style,
        2,
    );
    let bullets: Vec<Vec<String>> = report
        .summary
        .iter()
        .filter(|s| !s.trim().is_empty())
        .take(CARD_SUMMARY_ITEMS)
        .map(|s| c.clip_lines(s, inner - MARKER_INDENT, bullet_style, 2))
        .collect();

    let diag_top = CARD_PAD + title_style.line_height();
    let bullets_top = diag_top
        + (diag_lines.len() as f32).max(2.0) * diag_style.line_height()
        + 4.0;
    let bullet_lines: usize = bullets.iter().map(Vec::len).sum();
    let height = bullets_top + bullet_lines as f32 * bullet_style.line_height() + CARD_PAD - 4.0;

    c.ensure_space(height + 1.0);
    c.draw_rect(g.left(), 0.0, g.content_width(), height, Some(Rgb::WHITE), Some(Rgb::BLACK));
    c.draw_text(left, CARD_PAD + H2, l.ats_score, title_style);
    c.draw_text(
        g.right() - CARD_PAD - score_width,
        CARD_PAD + SCORE_SIZE + 4.0,
        &score_text,
        score_style,
    );
    for (i, line) in diag_lines.iter().enumerate() {
        let dy = diag_top + i as f32 * diag_style.line_height() + BODY;
        c.draw_text(left, dy, line, diag_style);
    }

    let mut dy = bullets_top;
    for lines in &bullets {
        for (i, line) in lines.iter().enumerate() {
            if i == 0 {
                c.draw_text(left, dy + SMALL, "•", TextStyle::bold(SMALL));
            }
            c.draw_text(left + MARKER_INDENT, dy + SMALL, line, bullet_style);
            dy += bullet_style.line_height();
        }
    }

    c.advance(height + 20.0);
}

fn role_matches(c: &mut Composer, l: &Labels, matches: &[RoleMatch]) {
    if matches.is_empty() {
        return;
    }
    c.section_title(l.top_roles);

    let body = TextStyle::regular(BODY);
    let strong = TextStyle::bold(BODY);
    for (i, m) in matches.iter().enumerate() {
        let g = c.geometry();
        let score = format!("{}/100", m.match_score);
        let score_width = strong.width_of(&score);
        let role = c
            .clip_lines(
                &format!("{}. {}", i + 1, m.role),
                g.content_width() - score_width - 12.0,
                strong,
                1,
            )
            .pop()
            .unwrap_or_default();

        c.ensure_space(strong.line_height() * 3.0);
        c.draw_text(g.left(), BODY, &role, strong);
        c.draw_text(g.right() - score_width, BODY, &score, strong);
        c.advance(strong.line_height());

        caption(c, l.why_fit);
        c.bulleted_list(capped(&m.why_fit, WHY_FIT), body);
        c.advance(4.0);

        caption(c, l.missing_keywords);
        c.tag_row(capped(&m.missing_keywords, MISSING_KEYWORDS));

        caption(c, l.recommended_changes);
        c.bulleted_list(capped(&m.recommended_changes, RECOMMENDED_CHANGES), body);

        c.separator(0.6);
    }
}

fn top_fixes(c: &mut Composer, l: &Labels, report: &Report) {
    c.section_title(l.top_fixes);

    let small = TextStyle::regular(SMALL);
    for (i, fix) in capped(&report.top_fixes, TOP_FIXES).iter().enumerate() {
        c.ensure_space(TextStyle::bold(BODY).line_height() + 2.0 * small.line_height());
        c.paragraph(0.0, &format!("{}. {}", i + 1, fix.title), TextStyle::bold(BODY));
        c.paragraph(0.0, &fix.rationale, small.colored(Rgb::GRAY));
        c.paragraph(0.0, &format!("{}: {}", l.example, fix.example_text), small);
        c.separator(0.5);
    }
}

fn checklist(c: &mut Composer, l: &Labels, report: &Report) {
    c.section_title(l.checklist);

    let label_style = TextStyle::bold(BODY);
    let note_style = TextStyle::regular(SMALL).colored(Rgb::GRAY);
    let width = c.geometry().content_width() - GLYPH_INDENT;

    for item in capped(&report.checklist, CHECKLIST) {
        let lines = label_style.wrap(&item.label, width);
        c.ensure_space(label_style.line_height() + note_style.line_height());

        let left = c.geometry().left();
        match item.status {
            CheckStatus::Ok => c.draw_check_glyph(left, 1.0, GLYPH_SIZE),
            CheckStatus::Warn => c.draw_warn_glyph(left, 1.0, GLYPH_SIZE),
        }
        for line in &lines {
            c.text_line(GLYPH_INDENT, line, label_style);
        }

        let note = if item.note.trim().is_empty() {
            l.no_note
        } else {
            item.note.as_str()
        };
        c.paragraph(GLYPH_INDENT, note, note_style);
        c.advance(6.0);
    }
}

fn rewritten_bullets(c: &mut Composer, l: &Labels, report: &Report) {
    c.section_title(l.rewritten_bullets);

    let body = TextStyle::regular(BODY);
    for (i, pair) in capped(&report.rewritten_bullets, REWRITTEN_BULLETS)
        .iter()
        .enumerate()
    {
        c.ensure_space(TextStyle::bold(SMALL).line_height() * 2.0 + body.line_height());
        c.text_line(0.0, &format!("#{}", i + 1), TextStyle::bold(SMALL).colored(Rgb::GRAY));

        caption(c, l.original);
        let original = pair.original.trim();
        if original.is_empty() {
            c.paragraph(0.0, l.not_detected, body.colored(Rgb::GRAY));
        } else {
            c.paragraph(0.0, &format!("• {original}"), body);
        }
        c.advance(4.0);

        caption(c, l.improved);
        c.paragraph(0.0, &format!("• {}", pair.improved.trim()), body);
        c.separator(0.5);
    }
}
