use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::types::ReferenceEntry;

/// First references-style header followed by whitespace. "References Cited"
/// is listed ahead of "References" so the longer form is consumed whole.
static HEADER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:references\s+cited|works\s+cited|references|bibliography)\s").unwrap()
});

/// Entry delimiters: `[12]`, a line-leading `12.`, or `[Smith et al]`.
/// The bare-number form needs trailing whitespace/EOL so decimals like
/// "0.5" at line start don't split.
static ENTRY_MARKER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)\[\d+\]|^[ \t]*\d+\.(?:\s|$)|\[\w+\s+et\s+al\.?\]").unwrap()
});

static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(?\b(\d{4})\b\)?").unwrap());

/// Parse the bibliography of `text` into entries. Text without a
/// references header yields no entries.
pub fn find_references(text: &str) -> Vec<ReferenceEntry> {
    let Some(block) = locate_block(text) else {
        debug!("no references header found");
        return Vec::new();
    };
    let entries: Vec<ReferenceEntry> = split_entries(block)
        .into_iter()
        .enumerate()
        .map(|(i, fragment)| parse_entry(i + 1, fragment))
        .collect();
    debug!(count = entries.len(), "parsed reference entries");
    entries
}

/// Everything after the first references header.
pub fn locate_block(text: &str) -> Option<&str> {
    HEADER_RE.find(text).map(|m| &text[m.end()..])
}

/// Split on entry markers in document order, dropping blank fragments.
pub fn split_entries(block: &str) -> Vec<&str> {
    ENTRY_MARKER_RE
        .split(block)
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .collect()
}

/// Derive year, authors, title and venue from one fragment.
///
/// The first 4-digit year (optionally parenthesized) is recorded and cut out
/// before the remainder is split on `,` and `.`. With two or more parts the
/// first is the author string, the second the title and the third (if any)
/// the venue; a single part is the title.
pub fn parse_entry(index: usize, fragment: &str) -> ReferenceEntry {
    let raw_text = fragment.trim();

    let (year, remainder) = match YEAR_RE.captures(raw_text) {
        Some(caps) => {
            let whole = caps.get(0).map_or(0..0, |m| m.range());
            let stripped = format!("{}{}", &raw_text[..whole.start], &raw_text[whole.end..]);
            (Some(caps[1].to_string()), stripped)
        }
        None => (None, raw_text.to_string()),
    };

    let parts = split_fields(&remainder);
    let (authors, title, venue) = match parts.as_slice() {
        [] => (None, None, None),
        [only] => (None, Some(*only), None),
        [first, second, rest @ ..] => (Some(*first), Some(*second), rest.first().copied()),
    };

    ReferenceEntry {
        index,
        raw_text: raw_text.to_string(),
        year,
        title: title.map(str::to_string),
        authors: authors.map(str::to_string),
        venue: venue.map(str::to_string),
    }
}

/// Split on `,` and `.` into trimmed, non-empty parts, keeping author
/// initials attached: "Smith, J. Title" gives ["Smith, J", "Title"].
fn split_fields(text: &str) -> Vec<&str> {
    let mut fields: Vec<(usize, usize)> = Vec::new();
    let mut leading: Option<(usize, usize)> = None;

    for (start, end) in delimited_spans(text) {
        if is_initial_token(&text[start..end]) {
            if let Some(last) = fields.last_mut() {
                last.1 = end;
            } else {
                let span = leading.get_or_insert((start, end));
                span.1 = end;
            }
            continue;
        }
        let start = leading.take().map_or(start, |(s, _)| s);
        fields.push((start, end));
    }
    if let Some(span) = leading {
        fields.push(span);
    }
    fields.into_iter().map(|(s, e)| &text[s..e]).collect()
}

/// Byte ranges of the trimmed, non-empty pieces between delimiters.
fn delimited_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start = 0;
    let bounds = text
        .match_indices([',', '.'])
        .map(|(i, d)| (i, i + d.len()))
        .chain(std::iter::once((text.len(), text.len())));
    for (delim_start, delim_end) in bounds {
        let piece = &text[start..delim_start];
        let trimmed = piece.trim();
        if !trimmed.is_empty() {
            let lead = piece.len() - piece.trim_start().len();
            spans.push((start + lead, start + lead + trimmed.len()));
        }
        start = delim_end;
    }
    spans
}

/// Check if a piece looks like an author initial: "J", "F-K", etc.
fn is_initial_token(token: &str) -> bool {
    !token.is_empty()
        && token.split('-').all(|part| {
            let mut chars = part.chars();
            matches!((chars.next(), chars.next()), (Some(c), None) if c.is_uppercase())
        })
}
