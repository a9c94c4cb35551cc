// Text Processing Service
// Word/sentence decomposition shared by the indicators and the section scorer

use regex::Regex;
use std::sync::OnceLock;

fn sentence_split_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[.!?]+").expect("sentence split regex"))
}

fn horizontal_space_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[ \t\x0C\x0B\u{00A0}\u{202F}\u{2009}]+").expect("space regex"))
}

fn blank_lines_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n{3,}").expect("blank lines regex"))
}

/// Normalize punctuation and spacing of extracted documents (French typography)
pub fn normalize_punctuation(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let mut s = text
        .replace('\u{2018}', "'")
        .replace('\u{2019}', "'")
        .replace('\u{201c}', "\"")
        .replace('\u{201d}', "\"")
        .replace('\u{2014}', "-")
        .replace('\u{2013}', "-")
        .replace('\u{2026}', "...");

    s = s.replace("\r\n", "\n").replace('\r', "\n");

    // Non-breaking and thin spaces (before ; : ! ? in French) collapse with regular blanks
    s = horizontal_space_re().replace_all(&s, " ").to_string();

    s = s.lines().map(|ln| ln.trim()).collect::<Vec<_>>().join("\n");
    s = blank_lines_re().replace_all(&s, "\n\n").to_string();

    s.trim().to_string()
}

/// Lower-cased view used for keyword matching; typographic apostrophes fold to `'`.
pub fn fold_for_matching(text: &str) -> String {
    text.to_lowercase().replace(['\u{2019}', '\u{2018}'], "'")
}

/// Whitespace tokenization, empty pieces dropped
pub fn split_words(text: &str) -> Vec<&str> {
    text.split_whitespace().collect()
}

/// Split on runs of `.`, `!`, `?`; pieces are returned untrimmed, blank ones dropped
pub fn split_sentences(text: &str) -> Vec<&str> {
    sentence_split_re()
        .split(text)
        .filter(|piece| !piece.trim().is_empty())
        .collect()
}

/// Number of raw split pieces, blank ones included (never zero)
pub fn segment_count(text: &str) -> usize {
    sentence_split_re().split(text).count().max(1)
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// One decomposition per analysis run; every indicator reads from it
#[derive(Debug, Clone)]
pub struct TextDecomposition<'a> {
    pub text: &'a str,
    pub words: Vec<&'a str>,
    pub sentences: Vec<&'a str>,
    pub segment_count: usize,
    /// Lower-cased, apostrophe-folded copy of `text`. Never used for offsets.
    pub folded: String,
}

impl<'a> TextDecomposition<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            words: split_words(text),
            sentences: split_sentences(text),
            segment_count: segment_count(text),
            folded: fold_for_matching(text),
        }
    }
}
