//! Greedy word-wrap against the Helvetica metric tables.
#![allow(dead_code)]

use super::font_metrics::{get_metrics, FontMetricTable, FontWeight};

/// Wraps `text` in regular weight so that no line exceeds `max_width` points at `font_size`.
///
/// Whitespace runs collapse to a single space. Blank input yields exactly one empty line.
pub fn wrap_text(text: &str, max_width: f32, font_size: f32) -> Vec<String> {
    wrap_with(get_metrics(FontWeight::Regular), text, max_width, font_size)
}

pub fn wrap_with(
    metrics: &FontMetricTable,
    text: &str,
    max_width: f32,
    font_size: f32,
) -> Vec<String> {
    let fits = |s: &str| metrics.width_at(s, font_size) <= max_width;
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.is_empty() {
            current = word.to_string();
        } else {
            let candidate = format!("{current} {word}");
            if fits(&candidate) {
                current = candidate;
                continue;
            }
            lines.push(std::mem::take(&mut current));
            current = word.to_string();
        }

        // A single word wider than the line is split at character boundaries.
        if !fits(&current) {
            let mut pieces = split_long_word(&current, &fits);
            current = pieces.pop().unwrap_or_default();
            lines.extend(pieces);
        }
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

fn split_long_word(word: &str, fits: &impl Fn(&str) -> bool) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut piece = String::new();
    for c in word.chars() {
        piece.push(c);
        if !fits(&piece) && piece.chars().count() > 1 {
            piece.pop();
            pieces.push(std::mem::take(&mut piece));
            piece.push(c);
        }
    }
    pieces.push(piece);
    pieces
}
