//! Semitone transposition for chord symbols. Only the root (and an optional
//! slash bass) moves; quality suffixes like `m7` or `sus4` are carried over
//! untouched. Results always use sharp spellings.

use crate::chordpro::find_chord;

/// The twelve pitch classes starting at C, sharp spellings only.
pub const CHROMATIC: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Words a chord quality may contain, longest first so `major` wins over `maj`.
const QUALITY_WORDS: [&str; 9] = ["major", "minor", "maj", "min", "dim", "aug", "sus", "add", "no"];
/// Single characters a chord quality may contain.
const QUALITY_SYMBOLS: &str = "mM0123456789#b+-()\u{b0}\u{f8}\u{394}^ ";

/// Semitone index of an uppercase note letter.
fn letter_index(letter: char) -> Option<i32> {
    let index = match letter {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => return None,
    };
    Some(index)
}

/// Split a note name off the front of `text`, returning its pitch class and
/// the number of bytes consumed.
fn parse_root(text: &str) -> Option<(i32, usize)> {
    let mut chars = text.chars();
    let letter = chars.next()?;
    let base = letter_index(letter)?;
    match chars.next() {
        Some('#') => Some(((base + 1).rem_euclid(12), 2)),
        Some('b') => Some(((base - 1).rem_euclid(12), 2)),
        _ => Some((base, 1)),
    }
}

/// Whether `text` reads as a chord quality (`m7`, `sus4`, `maj7(#11)`), so
/// that words such as `Chorus` or `am` are not mistaken for chords.
fn is_quality(mut text: &str) -> bool {
    while !text.is_empty() {
        if let Some(word) = QUALITY_WORDS.iter().find(|word| text.starts_with(**word)) {
            text = &text[word.len()..];
            continue;
        }
        let mut chars = text.chars();
        match chars.next() {
            Some(ch) if QUALITY_SYMBOLS.contains(ch) => text = chars.as_str(),
            _ => return false,
        }
    }
    true
}

/// Move a pitch class by `offset` semitones around the chromatic circle.
fn shift(index: i32, offset: i32) -> &'static str {
    let offset = offset % 120;
    CHROMATIC[((index + offset + 120) % 12) as usize]
}

/// Transpose a key or chord symbol. Input that is not a chord (no uppercase
/// root, or a suffix that is not a chord quality) is returned unchanged.
pub fn transpose_key(key: &str, offset: i32) -> String {
    let trimmed = key.trim();
    if offset % 12 == 0 {
        return trimmed.to_string();
    }
    let Some((root, consumed)) = parse_root(trimmed) else {
        return trimmed.to_string();
    };

    let rest = &trimmed[consumed..];
    let quality = rest.split_once('/').map_or(rest, |(quality, _)| quality);
    if !is_quality(quality) {
        return trimmed.to_string();
    }
    let mut out = String::with_capacity(trimmed.len() + 2);
    out.push_str(shift(root, offset));

    match rest.split_once('/') {
        Some((quality, bass)) => match parse_root(bass) {
            Some((bass_root, bass_len)) => {
                out.push_str(quality);
                out.push('/');
                out.push_str(shift(bass_root, offset));
                out.push_str(&bass[bass_len..]);
            }
            None => out.push_str(rest),
        },
        None => out.push_str(rest),
    }
    out
}

/// Transpose every `[chord]` token inside ChordPro lyrics, leaving all other
/// text byte-for-byte identical.
pub fn transpose_lyrics(text: &str, offset: i32) -> String {
    if offset % 12 == 0 {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some((token, chord)) = find_chord(rest) {
        out.push_str(&rest[..token.start]);
        out.push('[');
        out.push_str(&transpose_key(&rest[chord], offset));
        out.push(']');
        rest = &rest[token.end..];
    }
    out.push_str(rest);
    out
}

/// Transpose a free-form chord list such as `G - C - D7` or `G C Em D`.
pub fn transpose_chord_list(text: &str, offset: i32) -> String {
    if offset % 12 == 0 {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut token = String::new();
    for ch in text.chars() {
        if ch.is_whitespace() || ch == ',' || ch == '|' {
            if !token.is_empty() {
                out.push_str(&transpose_key(&token, offset));
                token.clear();
            }
            out.push(ch);
        } else {
            token.push(ch);
        }
    }
    if !token.is_empty() {
        out.push_str(&transpose_key(&token, offset));
    }
    out
}
