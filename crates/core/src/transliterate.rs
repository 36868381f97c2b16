//! Romanization of display names.

use pinyin::ToPinyin;

/// Converts a display name into a Latin-alphabet string.
///
/// Implementations must be deterministic and total: any input, including an
/// empty or already-Latin string, yields a string.
pub trait Transliterator {
    fn convert(&self, text: &str) -> String;
}

/// Tone-less pinyin, syllables concatenated without separators.
///
/// Characters without a pinyin reading (Latin letters, digits, punctuation)
/// are kept verbatim, so `"张三 Jr."` becomes `"zhangsan Jr."`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PinyinTransliterator;

impl Transliterator for PinyinTransliterator {
    fn convert(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len() * 2);
        for c in text.chars() {
            match c.to_pinyin() {
                Some(p) => out.push_str(p.plain()),
                None => out.push(c),
            }
        }
        out
    }
}
