//! Marketplace content filter
//!
//! Softens risky claims in generated descriptions. The safe pass rewrites phrases through a
//! fixed table; the strict pass additionally removes absolutist wording and drops sentences
//! that still make absolute claims afterwards.

use regex::Regex;

use crate::core::text::{capitalize_first, collapse_whitespace};

pub struct ContentFilter {
    /// Risky phrase → softer phrase
    safe_rewrites: Vec<(Regex, &'static str)>,
    /// Absolutist wording removed in strict mode
    strict_rewrites: Vec<(Regex, &'static str)>,
    /// Anything still matching after the rewrites drops the sentence
    absolute_claims: Regex,
    safe: bool,
    strict: bool,
}

impl ContentFilter {
    pub fn new(safe: bool, strict: bool) -> Self {
        Self {
            safe_rewrites: Self::build_safe_rewrites(),
            strict_rewrites: Self::build_strict_rewrites(),
            absolute_claims: Regex::new(
                r"(?i)\b(?:всегда|никогда|навсегда|вечн\w*|абсолютн\w*|самы[ейх]|самая|самое|лучш\w*)\b|№\s*1",
            )
            .unwrap(),
            safe,
            strict,
        }
    }

    fn build_safe_rewrites() -> Vec<(Regex, &'static str)> {
        vec![
            (Regex::new(r"(?i)\bгарантированно\b").unwrap(), "заметно"),
            (Regex::new(r"(?i)\bгарантируют\b").unwrap(), "обеспечивают"),
            (Regex::new(r"(?i)\bгарантирует\b").unwrap(), "обеспечивает"),
            (Regex::new(r"\b100\s*%\s*").unwrap(), ""),
            (Regex::new(r"(?i)\bполностью\s+").unwrap(), ""),
            (Regex::new(r"идеальн").unwrap(), "удачн"),
            (Regex::new(r"Идеальн").unwrap(), "Удачн"),
            (Regex::new(r"(?i)\bоригинальн(ые|ый|ая|ое)\b").unwrap(), "фирменн$1"),
            (Regex::new(r"(?i)\bлечебн\w*\s+").unwrap(), ""),
        ]
    }

    fn build_strict_rewrites() -> Vec<(Regex, &'static str)> {
        vec![
            (Regex::new(r"(?i)\bсамы[ейх]\s+|\bсамая\s+|\bсамое\s+").unwrap(), ""),
            (Regex::new(r"(?i)\bабсолютно\s+").unwrap(), ""),
            (Regex::new(r"№\s*1\s*").unwrap(), ""),
            (Regex::new(r"(?i)\bлучшие\b").unwrap(), "удачные"),
            (Regex::new(r"(?i)\bлучший\b").unwrap(), "удачный"),
        ]
    }

    fn is_active(&self) -> bool {
        self.safe || self.strict
    }

    pub fn apply(&self, text: &str) -> String {
        if !self.is_active() {
            return text.to_string();
        }

        let mut kept: Vec<String> = Vec::new();
        for (idx, sentence) in split_sentences(text).into_iter().enumerate() {
            let mut s = sentence;
            for (re, replacement) in &self.safe_rewrites {
                s = re.replace_all(&s, *replacement).to_string();
            }
            if self.strict {
                for (re, replacement) in &self.strict_rewrites {
                    s = re.replace_all(&s, *replacement).to_string();
                }
                // the opening sentence carries the brand, keep it
                if idx > 0 && self.absolute_claims.is_match(&s) {
                    log::debug!("Strict filter dropped sentence: {}", s);
                    continue;
                }
            }
            let s = capitalize_first(&collapse_whitespace(&s));
            if !s.is_empty() {
                kept.push(s);
            }
        }
        kept.join(" ")
    }
}

/// Splits prose into sentences, keeping the terminating punctuation.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        current.push(c);
        if matches!(c, '.' | '!' | '?') && chars.peek().map_or(true, |n| n.is_whitespace()) {
            let s = current.trim().to_string();
            if !s.is_empty() {
                out.push(s);
            }
            current.clear();
        }
    }
    let tail = current.trim();
    if !tail.is_empty() {
        out.push(tail.to_string());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inactive_filter_is_identity() {
        let text = "Линзы гарантируют 100% защиту. Самые лучшие очки.";
        assert!(!ContentFilter::new(false, false).is_active());
        assert!(ContentFilter::new(false, true).is_active());
        assert_eq!(ContentFilter::new(false, false).apply(text), text);
    }

    #[test]
    fn safe_mode_softens_guarantees() {
        let filter = ContentFilter::new(true, false);
        let out = filter.apply("Очки Dior. Линзы UV400 гарантируют 100% защиту глаз от солнца.");
        assert_eq!(out, "Очки Dior. Линзы UV400 обеспечивают защиту глаз от солнца.");
        let out = filter.apply("Идеальные очки. Смотрятся идеально.");
        assert_eq!(out, "Удачные очки. Смотрятся удачно.");
    }

    #[test]
    fn strict_mode_rewrites_then_drops_absolute_claims() {
        let filter = ContentFilter::new(true, true);
        let out = filter.apply(
            "Модные очки. Освежают даже самый простой образ. Всегда пригодятся в дороге. Футляр может отличаться.",
        );
        assert_eq!(out, "Модные очки. Освежают даже простой образ. Футляр может отличаться.");
    }

    #[test]
    fn strict_mode_keeps_the_opening_sentence() {
        let filter = ContentFilter::new(false, true);
        let out = filter.apply("Всегда модные очки. Никогда не подведут.");
        assert_eq!(out, "Всегда модные очки.");
    }

    #[test]
    fn splits_sentences_but_not_decimals() {
        let parts = split_sentences("Линзы 1.5 мм. Оправа лёгкая! Подойдут? да");
        assert_eq!(parts, vec!["Линзы 1.5 мм.", "Оправа лёгкая!", "Подойдут?", "да"]);
    }
}
