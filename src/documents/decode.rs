//! Text decoding for uploaded files.

/// Encoding an upload was decoded with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceEncoding {
    /// Bytes were valid UTF-8.
    Utf8,
    /// Bytes were not UTF-8 and were read as ISO-8859-1.
    Latin1,
}

/// Decode uploaded bytes as UTF-8, falling back to Latin-1.
///
/// Latin-1 maps every byte to the code point of the same value, so this never fails.
pub fn decode_text(bytes: &[u8]) -> (String, SourceEncoding) {
    match std::str::from_utf8(bytes) {
        Ok(text) => (text.to_owned(), SourceEncoding::Utf8),
        Err(_) => (
            encoding_rs::mem::decode_latin1(bytes).into_owned(),
            SourceEncoding::Latin1,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utf8_is_preferred() {
        let (text, encoding) = decode_text("naïve café".as_bytes());
        assert_eq!(text, "naïve café");
        assert_eq!(encoding, SourceEncoding::Utf8);
    }

    #[test]
    fn invalid_utf8_falls_back_to_latin1() {
        let (text, encoding) = decode_text(b"caf\xE9 cr\xE8me");
        assert_eq!(text, "café crème");
        assert_eq!(encoding, SourceEncoding::Latin1);
    }

    #[test]
    fn latin1_maps_c1_bytes_to_same_code_points() {
        let (text, encoding) = decode_text(&[0x80, 0x9F, 0xFF]);
        assert_eq!(encoding, SourceEncoding::Latin1);
        assert_eq!(text.chars().map(u32::from).collect::<Vec<_>>(), vec![0x80, 0x9F, 0xFF]);
    }

    #[test]
    fn empty_upload_decodes_to_empty_text() {
        assert_eq!(decode_text(b""), (String::new(), SourceEncoding::Utf8));
    }
}
