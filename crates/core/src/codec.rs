use crate::CoreError;

/// Key used by the shipped save format.
pub const SAVE_KEY: &[u8] = b"GameData";

/// XOR `data` against `key` repeated cyclically.
///
/// The transform is its own inverse for a given key, so one routine
/// serves both encode and decode. This is obfuscation, not encryption:
/// it hides the plaintext from a casual hex dump and nothing more.
pub fn apply_keystream(data: &[u8], key: &[u8]) -> Result<Vec<u8>, CoreError> {
    if key.is_empty() {
        return Err(CoreError::EmptyKey);
    }
    Ok(data
        .iter()
        .zip(key.iter().cycle())
        .map(|(byte, k)| byte ^ k)
        .collect())
}

/// Decode on-disk save bytes into the document text.
pub fn decode(bytes: &[u8], key: &[u8]) -> Result<String, CoreError> {
    let plain = apply_keystream(bytes, key)?;
    Ok(String::from_utf8(plain)?)
}

/// Encode document text into on-disk save bytes.
pub fn encode(text: &str, key: &[u8]) -> Result<Vec<u8>, CoreError> {
    apply_keystream(text.as_bytes(), key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_identity() {
        let texts = [
            "",
            "{}",
            r#"{"PlayerInfo":{"m_Gold":1234}}"#,
            "unicode: 日本語 ok",
        ];
        for text in texts {
            let bytes = encode(text, SAVE_KEY).unwrap();
            let back = decode(&bytes, SAVE_KEY).unwrap();
            assert_eq!(back, text, "roundtrip failed for {text:?}");
        }
    }

    #[test]
    fn keystream_is_self_inverse() {
        let data = b"the quick brown fox";
        let once = apply_keystream(data, b"k3y").unwrap();
        assert_ne!(once.as_slice(), data.as_slice());
        let twice = apply_keystream(&once, b"k3y").unwrap();
        assert_eq!(twice.as_slice(), data.as_slice());
    }

    #[test]
    fn key_shorter_and_longer_than_data() {
        let data = b"abcdef";
        for key in [b"z".as_slice(), b"a much longer key than the data".as_slice()] {
            let enc = apply_keystream(data, key).unwrap();
            let dec = apply_keystream(&enc, key).unwrap();
            assert_eq!(dec.as_slice(), data.as_slice());
        }
    }

    #[test]
    fn empty_key_rejected() {
        let result = apply_keystream(b"data", b"");
        assert!(matches!(result, Err(CoreError::EmptyKey)));
    }

    #[test]
    fn decode_rejects_non_utf8() {
        // Decoding restores 0xFF 0xFE 0xFD, which is not valid UTF-8.
        let bytes = apply_keystream(&[0xFF, 0xFE, 0xFD], SAVE_KEY).unwrap();
        let result = decode(&bytes, SAVE_KEY);
        assert!(matches!(result, Err(CoreError::NotUtf8(_))));
    }
}
