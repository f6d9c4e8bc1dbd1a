use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Ordering used for score columns that have no fixed position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collation {
    /// Vietnamese alphabet order: `ă`, `â`, `đ`, `ê`, `ô`, `ơ`, `ư` are letters of
    /// their own, tone marks and other diacritics differ at the second level and
    /// case at the third. Symbols sort before digits, digits before letters.
    #[default]
    Vietnamese,
    /// Plain code point order.
    Ordinal,
}

impl Collation {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "vi" | "vi-vn" | "vi_vn" | "vietnamese" => Some(Self::Vietnamese),
            "ordinal" | "codepoint" | "binary" => Some(Self::Ordinal),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vietnamese => "vi",
            Self::Ordinal => "ordinal",
        }
    }

    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        match self {
            Self::Vietnamese => compare_vietnamese(a, b),
            Self::Ordinal => a.cmp(b),
        }
    }
}

// Primary groups: whitespace, punctuation and symbols sort before digits, digits
// before letters.
const GROUP_OTHER: u8 = 0;
const GROUP_DIGIT: u8 = 1;
const GROUP_LETTER: u8 = 2;

// Combining tone marks in tone order: grave, hook above, tilde, acute, dot below.
// A syllable without one has the level tone (secondary 0).
const TONE_MARKS: [char; 5] = ['\u{300}', '\u{309}', '\u{303}', '\u{301}', '\u{323}'];

// Marks foreign to Vietnamese rank after every tone.
const FOREIGN_MARK: u32 = 16;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Weight {
    group: u8,
    primary: u32,
    secondary: u32,
    tertiary: u8,
}

impl Weight {
    fn letter(base: char, variant: u32, upper: bool) -> Self {
        Self {
            group: GROUP_LETTER,
            primary: (base as u32) * 4 + variant,
            secondary: 0,
            tertiary: u8::from(upper),
        }
    }

    /// The unmodified base letter, if this is a letter without a vowel variant.
    fn plain_letter(&self) -> Option<char> {
        if self.group != GROUP_LETTER || self.primary % 4 != 0 {
            return None;
        }
        char::from_u32(self.primary / 4)
    }
}

fn base_weight(c: char) -> Weight {
    match c {
        'đ' => Weight::letter('d', 1, false),
        'Đ' => Weight::letter('d', 1, true),
        _ if c.is_alphabetic() => {
            let folded = c.to_lowercase().next().unwrap_or(c);
            Weight::letter(folded, 0, c.is_uppercase())
        }
        _ => Weight {
            group: if c.is_numeric() { GROUP_DIGIT } else { GROUP_OTHER },
            primary: c as u32,
            secondary: 0,
            tertiary: 0,
        },
    }
}

/// `ă â ê ô ơ ư` become letters of their own; tone marks and any other
/// diacritic stay on their base letter as a secondary difference.
fn apply_mark(prev: &mut Weight, mark: char) {
    if let Some(tone) = TONE_MARKS.iter().position(|t| *t == mark) {
        prev.secondary = tone as u32 + 1;
        return;
    }
    let variant = match (prev.plain_letter(), mark) {
        (Some(b @ 'a'), '\u{306}') => Some((b, 1)),
        (Some(b @ 'a'), '\u{302}') => Some((b, 2)),
        (Some(b @ 'e'), '\u{302}') => Some((b, 1)),
        (Some(b @ 'o'), '\u{302}') => Some((b, 1)),
        (Some(b @ 'o'), '\u{31b}') => Some((b, 2)),
        (Some(b @ 'u'), '\u{31b}') => Some((b, 1)),
        _ => None,
    };
    match variant {
        Some((base, variant)) => prev.primary = (base as u32) * 4 + variant,
        None => prev.secondary = prev.secondary.max(FOREIGN_MARK + mark as u32),
    }
}

/// Input is decomposed first, so precomposed and decomposed spellings share a
/// key and `ö`, `ç`, `ñ` sort next to their base letter.
fn sort_key(s: &str) -> Vec<Weight> {
    let mut key: Vec<Weight> = Vec::with_capacity(s.len());
    for c in s.nfd() {
        if is_combining_mark(c) {
            if let Some(prev) = key.last_mut() {
                apply_mark(prev, c);
                continue;
            }
        }
        key.push(base_weight(c));
    }
    key
}

fn compare_vietnamese(a: &str, b: &str) -> Ordering {
    let ka = sort_key(a);
    let kb = sort_key(b);
    ka.iter()
        .map(|w| (w.group, w.primary))
        .cmp(kb.iter().map(|w| (w.group, w.primary)))
        .then_with(|| {
            ka.iter()
                .map(|w| w.secondary)
                .cmp(kb.iter().map(|w| w.secondary))
        })
        .then_with(|| {
            ka.iter()
                .map(|w| w.tertiary)
                .cmp(kb.iter().map(|w| w.tertiary))
        })
        .then_with(|| a.cmp(b))
}
