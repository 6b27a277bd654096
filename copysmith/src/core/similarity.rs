use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};

use crate::core::text::normalize_plain;

/// Words that carry no signal for near-duplicate detection.
static STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "и", "в", "во", "на", "а", "но", "что", "это", "как", "для", "по", "из", "к", "с", "со",
        "при", "от", "до", "у", "же", "не", "без", "над", "под", "про", "или", "то", "ли", "та",
        "те", "этот", "эта", "эти", "все", "всё", "так", "также", "чтобы", "они", "его", "её",
        "the", "and", "for", "with",
    ]
    .into_iter()
    .collect()
});

const SIGNATURE_PREFIX_TOKENS: usize = 22;
const SIGNATURE_TOP_WORDS: usize = 6;
const PREFIX_TOKENS: usize = 12;

const MIN_STRENGTH: u8 = 60;
const MAX_STRENGTH: u8 = 95;
const LOOSEST_THRESHOLD: f64 = 0.60;
const STRICTEST_THRESHOLD: f64 = 0.32;

pub type TokenSet = HashSet<String>;

pub fn is_stopword(word: &str) -> bool {
    STOPWORDS.contains(word)
}

pub fn tokenize(text: &str) -> TokenSet {
    normalize_plain(text)
        .split_whitespace()
        .filter(|w| w.chars().count() >= 3 && !is_stopword(w))
        .map(str::to_string)
        .collect()
}

pub fn jaccard_sets(a: &TokenSet, b: &TokenSet) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.union(b).count();
    intersection as f64 / union.max(1) as f64
}

/// Lexical similarity of two texts in `[0, 1]`. Zero when either side has no tokens.
pub fn jaccard(a: &str, b: &str) -> f64 {
    jaccard_sets(&tokenize(a), &tokenize(b))
}

/// First words of the normalized text, used to reject descriptions that open identically.
pub fn prefix(text: &str) -> String {
    normalize_plain(text)
        .split_whitespace()
        .take(PREFIX_TOKENS)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Near-duplicate key: the normalized prefix plus the most frequent content words.
///
/// Frequency ties are broken lexicographically so equal texts always produce equal keys.
pub fn signature(text: &str) -> String {
    let normalized = normalize_plain(text);
    let words: Vec<&str> = normalized.split_whitespace().collect();
    let head = words
        .iter()
        .take(SIGNATURE_PREFIX_TOKENS)
        .copied()
        .collect::<Vec<_>>()
        .join(" ");

    let mut freq: HashMap<&str, usize> = HashMap::new();
    for w in &words {
        if w.chars().count() < 4 || is_stopword(w) {
            continue;
        }
        *freq.entry(w).or_insert(0) += 1;
    }
    let mut ranked: Vec<(&str, usize)> = freq.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    let top = ranked
        .iter()
        .take(SIGNATURE_TOP_WORDS)
        .map(|(w, _)| *w)
        .collect::<Vec<_>>()
        .join(" ");

    format!("{} | {}", head, top).trim().to_string()
}

/// Maximum Jaccard similarity a new description may have against any accepted one.
///
/// Strength is clamped to 60..=95 and mapped linearly from 0.60 down to 0.32.
pub fn uniqueness_threshold(strength: u8) -> f64 {
    let s = strength.clamp(MIN_STRENGTH, MAX_STRENGTH) as f64;
    let span = (MAX_STRENGTH - MIN_STRENGTH) as f64;
    let t = (s - MIN_STRENGTH as f64) / span;
    LOOSEST_THRESHOLD - t * (LOOSEST_THRESHOLD - STRICTEST_THRESHOLD)
}

/// Mean Jaccard similarity over all unordered pairs. Zero for fewer than two texts.
pub fn average_pairwise(texts: &[String]) -> f64 {
    let sets: Vec<TokenSet> = texts.iter().map(|t| tokenize(t)).collect();
    let mut total = 0.0;
    let mut pairs = 0usize;
    for i in 0..sets.len() {
        for j in (i + 1)..sets.len() {
            total += jaccard_sets(&sets[i], &sets[j]);
            pairs += 1;
        }
    }
    if pairs == 0 {
        0.0
    } else {
        total / pairs as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_drops_short_words_and_stopwords() {
        let tokens = tokenize("Очки для города и отдыха, UV400");
        assert!(tokens.contains("очки"));
        assert!(tokens.contains("города"));
        assert!(tokens.contains("uv400"));
        assert!(!tokens.contains("для"));
        assert!(!tokens.contains("и"));
    }

    #[test]
    fn jaccard_bounds() {
        assert_eq!(jaccard("", "очки для города"), 0.0);
        assert_eq!(jaccard("стильные очки авиаторы", "стильные очки авиаторы"), 1.0);
        let sim = jaccard("стильные очки авиаторы", "модные очки вайфареры");
        assert!(sim > 0.0 && sim < 1.0);
    }

    #[test]
    fn jaccard_is_symmetric() {
        let a = "Лёгкие очки для пляжа и города";
        let b = "Очки для вождения и прогулок по городу";
        assert_eq!(jaccard(a, b), jaccard(b, a));
    }

    #[test]
    fn signature_matches_for_equal_texts_and_ignores_punctuation() {
        let a = "Модные очки Ray-Ban. Подходят для города!";
        let b = "модные очки ray-ban подходят для города";
        assert_eq!(signature(a), signature(b));
        assert_ne!(signature(a), signature("Совсем другой текст про линзы"));
    }

    #[test]
    fn signature_orders_top_words_by_frequency() {
        let sig = signature("линзы линзы оправа оправа оправа город");
        let top = sig.split(" | ").nth(1).unwrap();
        assert_eq!(top, "оправа линзы город");
    }

    #[test]
    fn threshold_is_decreasing_and_bounded() {
        let mut prev = f64::MAX;
        for s in 0..=100u8 {
            let t = uniqueness_threshold(s);
            assert!(t <= prev);
            assert!((0.3..=0.6).contains(&t));
            prev = t;
        }
        assert!(uniqueness_threshold(95) < uniqueness_threshold(60));
        assert_eq!(uniqueness_threshold(10), uniqueness_threshold(60));
    }

    #[test]
    fn average_pairwise_of_identical_texts_is_one() {
        let texts = vec!["очки для города".to_string(), "очки для города".to_string()];
        assert_eq!(average_pairwise(&texts), 1.0);
        assert_eq!(average_pairwise(&texts[..1]), 0.0);
    }
}
