//! Base64 codec for text travelling to and from the engine.
use base64::{engine::general_purpose::STANDARD, Engine as _};

pub fn encode(text: &str) -> String {
    STANDARD.encode(text.as_bytes())
}

/// Decodes an engine-provided field.
///
/// Whitespace (the engine wraps long payloads) is ignored. Malformed input is
/// returned as-is instead of failing; absent or empty input decodes to "".
pub fn decode_lenient(encoded: Option<&str>) -> String {
    let raw = match encoded {
        Some(s) if !s.trim().is_empty() => s,
        _ => return String::new(),
    };
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    match STANDARD.decode(compact.as_bytes()) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(_) => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_wrapped_payload() {
        let enc = encode("Hello, World!\n");
        let wrapped = format!("  {}\n{}\n", &enc[..8], &enc[8..]);
        assert_eq!(decode_lenient(Some(&wrapped)), "Hello, World!\n");
    }

    #[test]
    fn falls_back_to_raw_text() {
        assert_eq!(decode_lenient(Some("not base64!")), "not base64!");
        assert_eq!(decode_lenient(None), "");
        assert_eq!(decode_lenient(Some("   ")), "");
    }
}
