//! Character reference decoding for text and attribute values.
//!
//! Handles named references (`&amp;`, `&nbsp;`, ...) and numeric ones
//! (`&#169;`, `&#xA9;`). Unknown or malformed references are left as
//! written.

use memchr::memchr;
use std::borrow::Cow;

/// Longest reference body we look for a `;` in.
const MAX_REFERENCE_LEN: usize = 32;

/// Decode character references in `raw`.
///
/// Borrows when there is nothing to decode.
pub fn decode_character_references(raw: &str) -> Cow<'_, str> {
    let bytes = raw.as_bytes();
    if memchr(b'&', bytes).is_none() {
        return Cow::Borrowed(raw);
    }

    let mut result = String::with_capacity(raw.len());
    let mut pos = 0;

    while let Some(amp) = memchr(b'&', &bytes[pos..]) {
        let amp = pos + amp;
        result.push_str(&raw[pos..amp]);

        let window = &bytes[amp + 1..bytes.len().min(amp + 1 + MAX_REFERENCE_LEN)];
        let decoded = memchr(b';', window).and_then(|semi| {
            let body = &raw[amp + 1..amp + 1 + semi];
            decode_reference(body).map(|c| (c, semi))
        });

        match decoded {
            Some((c, semi)) => {
                result.push(c);
                pos = amp + semi + 2;
            }
            None => {
                result.push('&');
                pos = amp + 1;
            }
        }
    }

    result.push_str(&raw[pos..]);
    Cow::Owned(result)
}

/// Decode the text between `&` and `;`.
fn decode_reference(body: &str) -> Option<char> {
    match body.strip_prefix('#') {
        Some(numeric) => decode_numeric(numeric),
        None => decode_named(body),
    }
}

fn decode_numeric(numeric: &str) -> Option<char> {
    let code = match numeric.strip_prefix(['x', 'X']) {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => numeric.parse::<u32>().ok()?,
    };

    // NUL, surrogates and out-of-range points become U+FFFD
    Some(match code {
        0 => char::REPLACEMENT_CHARACTER,
        _ => char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER),
    })
}

fn decode_named(name: &str) -> Option<char> {
    let c = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{a0}',
        "copy" => '©',
        "reg" => '®',
        "trade" => '™',
        "hellip" => '…',
        "mdash" => '—',
        "ndash" => '–',
        "lsquo" => '‘',
        "rsquo" => '’',
        "ldquo" => '“',
        "rdquo" => '”',
        "laquo" => '«',
        "raquo" => '»',
        "bull" => '•',
        "middot" => '·',
        "times" => '×',
        "divide" => '÷',
        "deg" => '°',
        "plusmn" => '±',
        "para" => '¶',
        "sect" => '§',
        "cent" => '¢',
        "pound" => '£',
        "yen" => '¥',
        "euro" => '€',
        _ => return None,
    };
    Some(c)
}
