//! Per-section word counts.

use disclosure_core::ITEM_1C_MARKER;
use serde::{Deserialize, Serialize};

use crate::normalize::word_count;

/// Word counts of a combined filing text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionLengths {
    /// Words in Item 1A.
    pub len_1a: usize,
    /// Words in Item 1C.
    pub len_1c: usize,
    /// `len_1a + len_1c`.
    pub len_combined: usize,
}

/// Computes section lengths from a combined text.
///
/// The text is only split when `has_1c` is set and the marker is present;
/// otherwise every word is attributed to Item 1A. Words after a second marker
/// are not counted.
#[must_use]
pub fn section_lengths(combined_text: Option<&str>, has_1c: bool) -> SectionLengths {
    let Some(text) = combined_text.filter(|t| !t.is_empty()) else {
        return SectionLengths::default();
    };

    let (len_1a, len_1c) = if has_1c && text.contains(ITEM_1C_MARKER) {
        let mut parts = text.split(ITEM_1C_MARKER);
        let risk = parts.next().map_or(0, word_count);
        let cyber = parts.next().map_or(0, word_count);
        (risk, cyber)
    } else {
        (word_count(text), 0)
    };

    SectionLengths {
        len_1a,
        len_1c,
        len_combined: len_1a + len_1c,
    }
}
