//! Binary primitives shared by every arkimet wire format: big-endian
//! integers, protobuf-style varints, the type envelope used to frame a
//! single metadata attribute, and the bundle framing used to frame a whole
//! metadata or summary record.

mod bundle;
mod decoder;
mod encoder;
mod envelope;
mod error;

pub use bundle::{
    check_signature, decode_bundle, encode_bundle, signature_name, Bundle, SIG_INDEX_DUMP,
    SIG_METADATA, SIG_SUMMARY,
};
pub use decoder::Decoder;
pub use encoder::Encoder;
pub use envelope::{decode_envelope, encode_envelope};
pub use error::{Error, Result};

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn varint_round_trip() {
        for v in [0u64, 1, 127, 128, 300, u32::MAX as u64, u64::MAX] {
            let mut enc = Encoder::new();
            enc.put_varint(v);
            let bytes = enc.into_vec();
            let mut dec = Decoder::new(&bytes);
            assert_eq!(dec.take_varint("v").unwrap(), v);
            assert!(dec.is_empty());
        }
    }

    #[test]
    fn invalid_varint_too_wide() {
        // 11 bytes, all continuation bits set: exceeds the width we accept.
        let bytes = vec![0xff; 11];
        let mut dec = Decoder::new(&bytes);
        let err = dec.take_varint("x").unwrap_err();
        assert!(matches!(err, Error::InvalidVarint { .. }));
    }

    #[test]
    fn signed_int_round_trip() {
        for width in 1..=8usize {
            let max = if width == 8 {
                i64::MAX
            } else {
                (1i64 << (width * 8 - 1)) - 1
            };
            let min = if width == 8 {
                i64::MIN
            } else {
                -(1i64 << (width * 8 - 1))
            };
            for v in [0, 1, -1, max, min] {
                let mut enc = Encoder::new();
                enc.put_int(v, width);
                let bytes = enc.into_vec();
                let mut dec = Decoder::new(&bytes);
                assert_eq!(dec.take_int("v", width).unwrap(), v);
            }
        }
    }
}
