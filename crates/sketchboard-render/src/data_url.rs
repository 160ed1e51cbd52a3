//! `data:` URL decoding shared by the image cache and the PDF exporter.

use base64::{Engine, engine::general_purpose::STANDARD};

/// A decoded `data:<mime>;base64,<payload>` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// Decode a base64 `data:` URL. Returns `None` for anything else, including
/// percent-encoded (non-base64) data URLs.
pub fn decode_data_url(url: &str) -> Option<DataUrl> {
    let rest = url.trim().strip_prefix("data:")?;
    let (header, payload) = rest.split_once(',')?;
    let mime = header.strip_suffix(";base64")?;
    let payload: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = STANDARD.decode(payload).ok()?;
    Some(DataUrl {
        mime: mime.to_string(),
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_base64_payload() {
        let url = decode_data_url("data:image/png;base64,aGVsbG8=").unwrap();
        assert_eq!(url.mime, "image/png");
        assert_eq!(url.bytes, b"hello");
    }

    #[test]
    fn test_rejects_non_base64_and_garbage() {
        assert!(decode_data_url("data:text/plain,hello").is_none());
        assert!(decode_data_url("data:image/png;base64,@@@").is_none());
        assert!(decode_data_url("https://example.com/a.png").is_none());
        assert!(decode_data_url("data:image/png;base64").is_none());
    }
}
