//! Text normalization helpers.

/// Lowercases and collapses all whitespace runs to single spaces.
#[must_use]
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Lowercases, replaces punctuation with spaces and collapses whitespace.
///
/// Used for word counting; every character that is neither alphanumeric nor
/// whitespace becomes a separator.
#[must_use]
pub fn preprocess(text: &str) -> String {
    let replaced: String = text
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();
    replaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Number of whitespace-separated tokens.
#[must_use]
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  We  CANNOT\n\tGuarantee "), "we cannot guarantee");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_preprocess_splits_punctuation() {
        assert_eq!(
            preprocess("Third-party vendors (e.g., AWS) may fail."),
            "third party vendors e g aws may fail"
        );
    }

    #[test]
    fn test_word_count() {
        assert_eq!(word_count("one two\nthree\t four"), 4);
        assert_eq!(word_count("   "), 0);
        assert_eq!(word_count(&preprocess("state-of-the-art")), 4);
    }
}
