use crate::decoder::Decoder;
use crate::encoder::Encoder;
use crate::error::{Error, Result};

/// Signature tagging a metadata bundle.
pub const SIG_METADATA: [u8; 2] = *b"MD";
/// Signature tagging a summary bundle.
pub const SIG_SUMMARY: [u8; 2] = *b"SU";
/// Signature tagging an index dump bundle.
pub const SIG_INDEX_DUMP: [u8; 2] = *b"!D";

/// A decoded bundle header plus its payload slice.
#[derive(Debug, Clone, Copy)]
pub struct Bundle<'a> {
    pub signature: [u8; 2],
    pub version: u16,
    pub payload: &'a [u8],
}

/// Writes a bundle: 2-byte signature · 2-byte big-endian version ·
/// 4-byte big-endian length · payload.
pub fn encode_bundle(enc: &mut Encoder, signature: [u8; 2], version: u16, payload: &[u8]) {
    enc.put_bytes(&signature);
    enc.put_uint(version as u64, 2);
    enc.put_uint(payload.len() as u64, 4);
    enc.put_bytes(payload);
}

/// Reads one bundle. A short read exactly at a bundle boundary (zero bytes
/// remaining) is reported by the caller as clean EOF by checking
/// `dec.is_empty()` before calling this; any other short read is an error.
pub fn decode_bundle<'a>(dec: &mut Decoder<'a>) -> Result<Bundle<'a>> {
    let sig_bytes = dec.take("bundle signature", 2)?;
    let signature = [sig_bytes[0], sig_bytes[1]];
    let version = dec.take_uint("bundle version", 2)? as u16;
    let len = dec.take_uint("bundle length", 4)? as usize;
    let payload = dec.take("bundle payload", len)?;
    Ok(Bundle {
        signature,
        version,
        payload,
    })
}

pub fn signature_name(sig: [u8; 2]) -> &'static str {
    match sig {
        SIG_METADATA => "metadata",
        SIG_SUMMARY => "summary",
        SIG_INDEX_DUMP => "index dump",
        _ => "unknown",
    }
}

/// Validates that `sig` is one of the known bundle signatures.
pub fn check_signature(sig: [u8; 2]) -> Result<()> {
    match sig {
        SIG_METADATA | SIG_SUMMARY | SIG_INDEX_DUMP => Ok(()),
        other => Err(Error::invalid(
            "bundle",
            format!(
                "unrecognised signature {:?}",
                String::from_utf8_lossy(&other)
            ),
        )),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn round_trips() {
        let mut enc = Encoder::new();
        encode_bundle(&mut enc, SIG_METADATA, 1, &[1, 2, 3, 4]);
        let bytes = enc.into_vec();

        let mut dec = Decoder::new(&bytes);
        let bundle = decode_bundle(&mut dec).unwrap();
        assert_eq!(bundle.signature, SIG_METADATA);
        assert_eq!(bundle.version, 1);
        assert_eq!(bundle.payload, &[1, 2, 3, 4]);
        assert!(dec.is_empty());
    }

    #[test]
    fn clean_eof_at_boundary() {
        let dec = Decoder::new(&[]);
        assert!(dec.is_empty());
    }

    #[test]
    fn short_mid_bundle_is_error() {
        let mut enc = Encoder::new();
        encode_bundle(&mut enc, SIG_SUMMARY, 3, &[1, 2, 3]);
        let mut bytes = enc.into_vec();
        bytes.truncate(bytes.len() - 1);
        let mut dec = Decoder::new(&bytes);
        let err = decode_bundle(&mut dec).unwrap_err();
        assert!(err.is_insufficient_size());
    }
}
