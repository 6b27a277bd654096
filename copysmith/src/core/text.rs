use once_cell::sync::Lazy;
use regex::Regex;

// Structural labels that turn prose into a labeled form. Marketplaces flag these.
static FORBIDDEN_LABELS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:Коллекция|Сценарии|Сценарий|Линзы|Линза|Форма|Ключевые\s*слова|Характеристики|Keywords|Scenarios?|Collection|Shape|Lens)\s*:\s*",
    )
    .unwrap()
});

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\p{L}\p{N}\s\-]").unwrap());

pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}

/// Shortens `text` to at most `max_chars` characters without cutting a word.
///
/// Text that already fits is returned unchanged. A single word longer than the limit is the
/// only case where a hard cut happens.
pub fn clamp(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let cut_at = text
        .char_indices()
        .nth(max_chars)
        .map(|(idx, _)| idx)
        .unwrap_or(text.len());
    let (head, tail) = text.split_at(cut_at);

    let kept = if tail.starts_with(char::is_whitespace) {
        head
    } else {
        match head.rfind(char::is_whitespace) {
            Some(idx) => &head[..idx],
            None => return head.to_string(),
        }
    };

    kept.trim_end_matches(|c: char| c.is_whitespace() || matches!(c, ',' | ';' | ':' | '—' | '–' | '-'))
        .to_string()
}

fn is_leading_noise(c: char) -> bool {
    c.is_whitespace() || matches!(c, '-' | '–' | '—' | '•' | '·' | '.' | ',' | ';' | ':' | '!' | '?')
}

/// Drops leading punctuation and upper-cases the first letter.
pub fn capitalize_first(text: &str) -> String {
    let trimmed = text.trim_start_matches(is_leading_noise).trim_end();
    let mut chars = trimmed.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() => first.to_uppercase().chain(chars).collect(),
        _ => trimmed.to_string(),
    }
}

pub fn strip_forbidden_labels(text: &str) -> String {
    collapse_whitespace(&FORBIDDEN_LABELS.replace_all(text, ""))
}

pub fn has_forbidden_label(text: &str) -> bool {
    FORBIDDEN_LABELS.is_match(text)
}

/// Lower-cased, label-free text with punctuation turned into spaces. Hyphens survive so
/// that `ray-ban` stays one token.
pub fn normalize_plain(text: &str) -> String {
    let lowered = text.to_lowercase();
    let unlabeled = FORBIDDEN_LABELS.replace_all(&lowered, "");
    let words_only = NON_WORD.replace_all(&unlabeled, " ");
    collapse_whitespace(&words_only)
}
