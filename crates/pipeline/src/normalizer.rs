//! Text normalizer with Chinese support.
//!
//! Unicode NFC + whitespace collapse, simplified/traditional conversion
//! via the `character_converter` mapping tables, and toneless pinyin
//! romanization.

use pinyin::ToPinyin;
use unicode_normalization::UnicodeNormalization;

/// Normalize Unicode characters to NFC form.
pub fn normalize_unicode(text: &str) -> String {
    text.nfc().collect()
}

/// Collapse every run of Unicode whitespace to a single space and trim.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Convert Traditional Chinese to Simplified.
pub fn to_simplified(text: &str) -> String {
    character_converter::traditional_to_simplified(text).to_string()
}

/// Convert Simplified Chinese to Traditional.
pub fn to_traditional(text: &str) -> String {
    character_converter::simplified_to_traditional(text).to_string()
}

/// Romanize Chinese text as space-joined toneless pinyin syllables.
///
/// Han characters become one syllable each; runs of other characters are
/// kept as their own tokens.
pub fn to_pinyin(text: &str) -> String {
    let mut tokens: Vec<String> = Vec::new();
    let mut run = String::new();

    for (ch, syllable) in text.chars().zip(text.to_pinyin()) {
        match syllable {
            Some(p) => {
                if !run.trim().is_empty() {
                    tokens.push(run.trim().to_string());
                }
                run.clear();
                tokens.push(p.plain().to_string());
            }
            None => run.push(ch),
        }
    }
    if !run.trim().is_empty() {
        tokens.push(run.trim().to_string());
    }

    tokens.join(" ")
}

/// Apply the full normalization pipeline.
pub fn normalize(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    normalize_whitespace(&normalize_unicode(text))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_unicode_composes_nfc() {
        // "e" + combining acute accent composes to a single code point.
        let decomposed = "cafe\u{0301}";
        assert_eq!(normalize_unicode(decomposed), "caf\u{e9}");
    }

    #[test]
    fn normalize_whitespace_collapses_runs() {
        assert_eq!(
            normalize_whitespace("hello   world\n\ttest"),
            "hello world test"
        );
        assert_eq!(normalize_whitespace("  padded  "), "padded");
    }

    #[test]
    fn simplified_conversion() {
        assert_eq!(to_simplified("電腦"), "电脑");
    }

    #[test]
    fn traditional_conversion() {
        assert_eq!(to_traditional("电脑"), "電腦");
    }

    #[test]
    fn pinyin_conversion() {
        assert_eq!(to_pinyin("你好"), "ni hao");
    }

    #[test]
    fn pinyin_keeps_non_han_runs() {
        assert_eq!(to_pinyin("rust你好"), "rust ni hao");
    }

    #[test]
    fn normalize_empty_is_empty() {
        assert_eq!(normalize(""), "");
    }
}
