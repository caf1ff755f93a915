//! Section extraction from 10-K documents.
//!
//! A 10-K names each item twice: once in the table of contents and once
//! above the body. Every heading line is treated as a candidate start and the
//! longest span up to the next closing heading wins, so the table of contents
//! entry loses to the real section.

use disclosure_core::{
    DisclosureError, FilingSections, ITEM_1C_MARKER, Result, SectionKind,
    cybersecurity_item_expected,
};
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

use crate::normalize::word_count;

/// Bodies shorter than this are table-of-contents stubs or cross references.
pub const MIN_SECTION_WORDS: usize = 20;

/// Column width used when rendering HTML; wide enough that paragraphs stay on one line.
const RENDER_WIDTH: usize = 1_000;

fn heading(item: &str) -> Regex {
    Regex::new(&format!(r"(?i)^[^\w]*item\s*{item}\b")).expect("valid heading pattern")
}

static ITEM_1A: LazyLock<Regex> = LazyLock::new(|| heading("1a"));
static ITEM_1B: LazyLock<Regex> = LazyLock::new(|| heading("1b"));
static ITEM_1C: LazyLock<Regex> = LazyLock::new(|| heading("1c"));
static ITEM_2: LazyLock<Regex> = LazyLock::new(|| heading("2"));

static BLANK_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n[ \t]*(\n[ \t]*)+").expect("valid blank line pattern"));

/// Converts a filing's HTML document into plain text.
pub fn html_to_text(html: &str) -> Result<String> {
    let text = html2text::from_read(html.as_bytes(), RENDER_WIDTH)
        .map_err(|e| DisclosureError::Parse(format!("Failed to render HTML: {e}")))?;
    Ok(BLANK_RUNS.replace_all(&text, "\n\n").trim().to_string())
}

fn start_pattern(kind: SectionKind) -> &'static Regex {
    match kind {
        SectionKind::RiskFactors => &ITEM_1A,
        SectionKind::Cybersecurity => &ITEM_1C,
    }
}

fn end_patterns(kind: SectionKind) -> Vec<&'static Regex> {
    match kind {
        SectionKind::RiskFactors => vec![&*ITEM_1B, &*ITEM_1C, &*ITEM_2],
        SectionKind::Cybersecurity => vec![&*ITEM_2],
    }
}

/// Lines of `text` with the byte offset each one starts at.
fn lines_with_offsets(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.split_inclusive('\n').scan(0, |offset, line| {
        let start = *offset;
        *offset += line.len();
        Some((start, line))
    })
}

/// Extracts the body of one item from plain filing text.
///
/// Returns `None` when no heading leads to a body of at least
/// [`MIN_SECTION_WORDS`] words.
#[must_use]
pub fn extract_section(text: &str, kind: SectionKind) -> Option<String> {
    let lines: Vec<(usize, &str)> = lines_with_offsets(text).collect();
    let start = start_pattern(kind);
    let ends = end_patterns(kind);

    let mut best: Option<(usize, &str)> = None;
    for (i, (_, line)) in lines.iter().enumerate() {
        if !start.is_match(line) {
            continue;
        }
        let body_start = lines
            .get(i + 1)
            .map_or(text.len(), |(offset, _)| *offset);
        let body_end = lines[i + 1..]
            .iter()
            .find(|(_, l)| ends.iter().any(|re| re.is_match(l)))
            .map_or(text.len(), |(offset, _)| *offset);

        let body = text[body_start..body_end].trim();
        let words = word_count(body);
        if best.is_none_or(|(best_words, _)| words > best_words) {
            best = Some((words, body));
        }
    }

    match best {
        Some((words, body)) if words >= MIN_SECTION_WORDS => Some(body.to_string()),
        Some((words, _)) => {
            debug!(item = %kind, words, "Discarding section stub");
            None
        }
        None => None,
    }
}

/// Extracts Item 1A and, for fiscal years that require it, Item 1C.
#[must_use]
pub fn extract_sections(text: &str, year: i32) -> FilingSections {
    let risk_factors = extract_section(text, SectionKind::RiskFactors);
    let cybersecurity = if cybersecurity_item_expected(year) {
        extract_section(text, SectionKind::Cybersecurity)
    } else {
        None
    };
    FilingSections::new(risk_factors, cybersecurity)
}

/// Splits a combined text back into its sections.
///
/// Only splits on the first marker and only when `has_1c` is set; otherwise
/// the whole text is Item 1A.
#[must_use]
pub fn split_combined(text: &str, has_1c: bool) -> FilingSections {
    match text.split_once(ITEM_1C_MARKER) {
        Some((risk, cyber)) if has_1c => FilingSections::new(
            Some(risk.trim().to_string()),
            Some(cyber.trim().to_string()),
        ),
        _ => FilingSections::new(Some(text.trim().to_string()), None),
    }
}
