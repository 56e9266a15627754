//! Text normalisation and tokenisation for statement descriptions

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref NON_ALPHANUMERIC: Regex = Regex::new(r"[^\p{L}\p{N}\s]").unwrap();
    static ref SIX_DIGIT_NUMBER: Regex = Regex::new(r"\b[0-9]{6}\b").unwrap();
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
    static ref TOKEN: Regex = Regex::new(r"\b\w\w+\b").unwrap();
}

const FULLWIDTH_START: u32 = 0xFF01;
const FULLWIDTH_END: u32 = 0xFF5E;
const FULLWIDTH_OFFSET: u32 = 0xFEE0;
const IDEOGRAPHIC_SPACE: char = '\u{3000}';

fn to_halfwidth(c: char) -> char {
    let code = c as u32;
    if c == IDEOGRAPHIC_SPACE {
        ' '
    } else if (FULLWIDTH_START..=FULLWIDTH_END).contains(&code) {
        char::from_u32(code - FULLWIDTH_OFFSET).unwrap_or(c)
    } else {
        c
    }
}

/// Normalise a description for matching and classification
///
/// Full-width ASCII becomes half-width, punctuation becomes spaces,
/// standalone six-digit numbers (transaction numbers) are dropped and the
/// result is lower-cased with single spaces.
pub fn normalize(text: &str) -> String {
    if text.trim().is_empty() {
        return String::new();
    }

    let halfwidth: String = text.chars().map(to_halfwidth).collect();
    let cleaned = NON_ALPHANUMERIC.replace_all(&halfwidth, " ");
    let cleaned = SIX_DIGIT_NUMBER.replace_all(&cleaned, " ");
    let collapsed = WHITESPACE.replace_all(&cleaned, " ");
    collapsed.trim().to_lowercase()
}

/// Build the classifier input from a row's description, memo and direction
pub fn combined_text(description: &str, memo: &str, direction: &str) -> String {
    let mut combined = String::new();
    for part in [normalize(description), normalize(memo)] {
        if !part.is_empty() {
            combined.push_str(&part);
            combined.push(' ');
        }
    }
    combined.push_str(direction);
    combined.trim().to_string()
}

/// Unigram and bigram terms of a text (tokens of two or more word characters)
pub fn terms(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let tokens: Vec<&str> = TOKEN.find_iter(&lowered).map(|m| m.as_str()).collect();

    let mut terms: Vec<String> = tokens.iter().map(|t| t.to_string()).collect();
    terms.extend(tokens.windows(2).map(|pair| format!("{} {}", pair[0], pair[1])));
    terms
}
