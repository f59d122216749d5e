//! Text preparation for pain.008 fields: SEPA character set and length limits.

use tracing::warn;

/// Characters allowed by the SEPA Latin character set besides letters and digits.
const SEPA_PUNCTUATION: &[char] = &['/', '-', '?', ':', '(', ')', '.', ',', '\'', '+', ' '];

/// Transliterate `text` into the SEPA Latin character set.
///
/// Umlauts and accented letters are spelled out, anything else outside the
/// set becomes a space.
pub fn to_sepa_charset(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_ascii_alphanumeric() || SEPA_PUNCTUATION.contains(&c) {
            out.push(c);
            continue;
        }
        let replacement = match c {
            'ä' => "ae",
            'ö' => "oe",
            'ü' => "ue",
            'Ä' => "Ae",
            'Ö' => "Oe",
            'Ü' => "Ue",
            'ß' => "ss",
            'à' | 'á' | 'â' | 'ã' | 'å' => "a",
            'À' | 'Á' | 'Â' | 'Ã' | 'Å' => "A",
            'æ' => "ae",
            'Æ' => "AE",
            'ç' => "c",
            'Ç' => "C",
            'è' | 'é' | 'ê' | 'ë' => "e",
            'È' | 'É' | 'Ê' | 'Ë' => "E",
            'ì' | 'í' | 'î' | 'ï' => "i",
            'Ì' | 'Í' | 'Î' | 'Ï' => "I",
            'ñ' => "n",
            'Ñ' => "N",
            'ò' | 'ó' | 'ô' | 'õ' | 'ø' => "o",
            'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ø' => "O",
            'œ' => "oe",
            'Œ' => "OE",
            'ù' | 'ú' | 'û' => "u",
            'Ù' | 'Ú' | 'Û' => "U",
            'ý' | 'ÿ' => "y",
            'Ý' => "Y",
            '&' => "+",
            '_' => "-",
            _ => " ",
        };
        out.push_str(replacement);
    }
    out
}

/// True when `text` only uses the SEPA Latin character set.
///
/// Identifiers are never transliterated, so restricted documents reject
/// them instead.
pub fn is_sepa_charset(text: &str) -> bool {
    text.chars()
        .all(|c| c.is_ascii_alphanumeric() || SEPA_PUNCTUATION.contains(&c))
}

/// Cut `text` to at most `max` characters.
pub fn clip(field: &str, text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    warn!(field, max, "value truncated to fit pain.008 field length");
    text.chars().take(max).collect()
}

/// How free text is prepared for one document.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TextPolicy {
    pub restricted: bool,
}

impl TextPolicy {
    /// Trim, transliterate if restricted, and clip to `max` characters.
    pub fn prepare(&self, field: &str, text: &str, max: usize) -> String {
        let text = text.trim();
        if self.restricted {
            clip(field, &to_sepa_charset(text), max)
        } else {
            clip(field, text, max)
        }
    }
}
