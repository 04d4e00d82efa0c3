//! Submission-time foul-language gate. Complaints containing abusive
//! language are rejected before annotation or persistence. Detection
//! normalizes common evasions: leetspeak substitutions, masking characters
//! between letters ("f*ck"), and stretched repeats ("fuuuuck").

use std::collections::HashSet;
use std::sync::OnceLock;

const ENGLISH: &[&str] = &[
    "fuck", "fucking", "fucked", "fucker", "fck", "fcking", "shit", "shitty", "bullshit",
    "bitch", "bitches", "asshole", "bastard", "dammit", "goddamn", "dickhead", "pissed",
    "whore", "slut", "moron", "idiot", "idiots", "stupid", "retard", "retarded", "wtf",
    "stfu", "douchebag",
];

// Transliterated Tamil / Hinglish entries the deployment sees most.
const TRANSLITERATED: &[&str] = &[
    "thevidiya", "punda", "pundai", "soothu", "otha", "koothi", "mayiru", "thayoli", "naaye",
    "chutiya", "chutiye", "madarchod", "behenchod", "bhosdike", "gaandu", "gandu", "harami",
    "haramzada", "kamina", "kamine", "bakchod", "bakchodi", "bewakoof", "bsdk",
];

fn word_list() -> &'static HashSet<&'static str> {
    static WORDS: OnceLock<HashSet<&'static str>> = OnceLock::new();
    WORDS.get_or_init(|| ENGLISH.iter().chain(TRANSLITERATED).copied().collect())
}

fn substitute(ch: char) -> char {
    match ch {
        '@' | '4' => 'a',
        '8' => 'b',
        '(' | '<' => 'c',
        '3' => 'e',
        '6' => 'g',
        '!' | '1' | '|' => 'i',
        '0' => 'o',
        '$' | '5' => 's',
        '+' | '7' => 't',
        _ => ch,
    }
}

fn is_mask(ch: char) -> bool {
    matches!(ch, '*' | '#' | '.' | '_' | '-' | '^' | '&' | '%')
}

/// Lowercases, maps leetspeak symbols back to letters and drops masking
/// punctuation sandwiched between letters.
fn normalize(text: &str) -> String {
    let lowered: Vec<char> = text.to_lowercase().chars().map(substitute).collect();

    let mut out = String::with_capacity(lowered.len());
    for (index, &ch) in lowered.iter().enumerate() {
        if is_mask(ch) {
            let prev_alpha = index
                .checked_sub(1)
                .and_then(|i| lowered.get(i))
                .is_some_and(|c| c.is_alphabetic());
            let next_alpha = lowered
                .iter()
                .skip(index + 1)
                .find(|c| !is_mask(**c))
                .is_some_and(|c| c.is_alphabetic());
            if prev_alpha && next_alpha {
                continue;
            }
        }
        out.push(ch);
    }
    out
}

/// Collapses runs of repeated characters down to `max` occurrences.
fn squeeze(text: &str, max: usize) -> String {
    let mut out = String::with_capacity(text.len());
    let mut run_char = '\0';
    let mut run_len = 0usize;
    for ch in text.chars() {
        if ch == run_char {
            run_len += 1;
        } else {
            run_char = ch;
            run_len = 1;
        }
        if run_len <= max {
            out.push(ch);
        }
    }
    out
}

fn has_listed_word(text: &str) -> bool {
    let words = word_list();
    for word in text.split(|ch: char| !ch.is_alphanumeric()) {
        if word.is_empty() {
            continue;
        }
        if words.contains(word) {
            return true;
        }
        let stripped = word.trim_matches(|ch: char| ch.is_ascii_digit());
        if !stripped.is_empty() && words.contains(stripped) {
            return true;
        }
    }
    false
}

/// True when the text contains a listed term. Words are checked both as
/// written (doubled letters intact, so "bullshit" survives) and with runs
/// collapsed to a single character (so "fuuuuck" is caught).
pub fn contains_profanity(text: &str) -> bool {
    if text.trim().is_empty() {
        return false;
    }

    let normalized = normalize(text);
    if has_listed_word(&normalized) {
        return true;
    }

    let tight = squeeze(&normalized, 1);
    if tight != normalized && has_listed_word(&tight) {
        return true;
    }

    false
}
