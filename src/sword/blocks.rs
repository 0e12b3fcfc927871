//! Compressed-block decoding (decryption + inflation).

use std::io::Read;

use flate2::read::ZlibDecoder;
use log::trace;

use super::cipher::SapphireCipher;
use super::error::{Result, SwordError};

/// Decode one compressed block: decrypt with the Sapphire cipher when a
/// non-empty cipher key is configured, then inflate the zlib stream.
///
/// Each block is decrypted from a freshly keyed cipher; state never leaks
/// between blocks.
pub fn decode_block(compressed: &[u8], cipher_key: Option<&str>) -> Result<Vec<u8>> {
    let plain_compressed;
    let payload: &[u8] = match cipher_key {
        Some(key) if !key.is_empty() => {
            trace!("Decrypting {} bytes before inflation", compressed.len());
            plain_compressed = SapphireCipher::new(key.as_bytes()).decrypt(compressed);
            &plain_compressed
        }
        _ => compressed,
    };

    let mut decoder = ZlibDecoder::new(payload);
    let mut output = Vec::new();
    decoder
        .read_to_end(&mut output)
        .map_err(|e| SwordError::Decompression(e.to_string()))?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use flate2::write::ZlibEncoder;
    use flate2::Compression;

    use super::*;

    fn deflate(bytes: &[u8]) -> Vec<u8> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(bytes).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn inflates_a_plain_block() {
        let decoded = decode_block(&deflate(b"some verse text"), None).unwrap();
        assert_eq!(decoded, b"some verse text");
    }

    #[test]
    fn decrypts_before_inflating() {
        let enciphered = SapphireCipher::new(b"mykey").encrypt(&deflate(b"hidden text"));
        let decoded = decode_block(&enciphered, Some("mykey")).unwrap();
        assert_eq!(decoded, b"hidden text");
    }

    #[test]
    fn empty_cipher_key_means_no_decryption() {
        let decoded = decode_block(&deflate(b"text"), Some("")).unwrap();
        assert_eq!(decoded, b"text");
    }

    #[test]
    fn garbage_fails_as_decompression_error() {
        let err = decode_block(b"\x00\x01\x02\x03", None).unwrap_err();
        assert!(matches!(err, SwordError::Decompression(_)));
    }
}
