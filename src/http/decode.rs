//! # Decodificación de URLs
//! src/http/decode.rs
//!
//! Decodificador `key=value` usado para query strings, bodies
//! `application/x-www-form-urlencoded` y cookies.
//!
//! El percent-decoding es deliberadamente parcial: solo se decodifican las
//! secuencias `%XX` cuyo byte es un alfanumérico ASCII, whitespace ASCII o
//! puntuación ASCII. Cualquier otra secuencia (por ejemplo bytes UTF-8
//! multibyte como `%C3%A9`) se deja tal cual.

use super::FieldMap;

/// Decodifica las secuencias `%XX` permitidas
///
/// ```
/// use frask::http::decode::unquote;
///
/// assert_eq!(unquote("Hello%20world"), "Hello world");
/// assert_eq!(unquote("caf%C3%A9"), "caf%C3%A9");
/// ```
pub fn unquote(encoded: &str) -> String {
    let bytes = encoded.as_bytes();
    let mut out = String::with_capacity(encoded.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let Some(decoded) = decode_pair(bytes[i + 1], bytes[i + 2]) {
                out.push(decoded as char);
                i += 3;
                continue;
            }
        }
        // `encoded` es UTF-8 válido; copiamos el carácter completo
        let ch_len = utf8_len(bytes[i]);
        out.push_str(&encoded[i..i + ch_len]);
        i += ch_len;
    }

    out
}

/// Decodifica `key=value` separados por `separator`
///
/// Las claves repetidas conservan el último valor. Un segmento sin `=`
/// produce un valor vacío; un segmento vacío se ignora.
///
/// ```
/// use frask::http::decode::url_decode;
///
/// let params = url_decode("a=1&b=2", "&");
/// assert_eq!(params.get("a"), Some("1"));
/// assert_eq!(params.get("b"), Some("2"));
/// ```
pub fn url_decode(encoded: &str, separator: &str) -> FieldMap {
    let mut params = FieldMap::new();

    for pair in encoded.split(separator) {
        if pair.is_empty() {
            continue;
        }
        let mut parts = pair.split('=');
        let key = parts.next().unwrap_or_default();
        // "a=1=2" conserva solo el primer valor
        let value = parts.next().unwrap_or_default();
        params.insert(unquote(key), unquote(value));
    }

    params
}

fn decode_pair(hi: u8, lo: u8) -> Option<u8> {
    let hi = (hi as char).to_digit(16)?;
    let lo = (lo as char).to_digit(16)?;
    let byte = (hi * 16 + lo) as u8;
    let allowed =
        byte.is_ascii_alphanumeric() || byte.is_ascii_punctuation() || is_python_space(byte);
    allowed.then_some(byte)
}

// Espacio, \t, \n, \x0b, \x0c, \r
fn is_python_space(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\n' | 0x0b | 0x0c | b'\r')
}

fn utf8_len(first: u8) -> usize {
    match first {
        0x00..=0x7f => 1,
        0xc0..=0xdf => 2,
        0xe0..=0xef => 3,
        _ => 4,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unquote_space_and_punctuation() {
        assert_eq!(unquote("a%20b%21%3F"), "a b!?");
        assert_eq!(unquote("%2Fetc%2fpasswd"), "/etc/passwd");
    }

    #[test]
    fn test_unquote_leaves_disallowed_sequences() {
        assert_eq!(unquote("%00"), "%00");
        assert_eq!(unquote("%7F"), "%7F");
        assert_eq!(unquote("%ZZ"), "%ZZ");
    }

    #[test]
    fn test_unquote_truncated_sequence() {
        assert_eq!(unquote("abc%2"), "abc%2");
        assert_eq!(unquote("%"), "%");
    }

    #[test]
    fn test_unquote_keeps_non_ascii_text() {
        assert_eq!(unquote("año%20nuevo"), "año nuevo");
    }

    #[test]
    fn test_unquote_is_single_pass() {
        // "%2541" -> "%41", no se vuelve a decodificar
        assert_eq!(unquote("%2541"), "%41");
    }

    #[test]
    fn test_url_decode_without_escapes_is_identity() {
        let params = url_decode("a=1&b=2", "&");
        assert_eq!(params.len(), 2);
        assert_eq!(params.get("a"), Some("1"));
        assert_eq!(params.get("b"), Some("2"));
    }

    #[test]
    fn test_url_decode_duplicates_and_missing_values() {
        let params = url_decode("a=1&flag&a=2&&", "&");
        assert_eq!(params.get("a"), Some("2"));
        assert_eq!(params.get("flag"), Some(""));
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_url_decode_cookie_separator() {
        let cookies = url_decode("session=abc123; theme=dark", "; ");
        assert_eq!(cookies.get("session"), Some("abc123"));
        assert_eq!(cookies.get("theme"), Some("dark"));
    }

    #[test]
    fn test_url_decode_extra_equals() {
        let params = url_decode("a=1=2", "&");
        assert_eq!(params.get("a"), Some("1"));
    }
}
