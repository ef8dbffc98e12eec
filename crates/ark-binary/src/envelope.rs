use crate::decoder::Decoder;
use crate::encoder::Encoder;
use crate::error::Result;

/// Writes a type envelope: `varint(code) · varint(inner_size) · inner_bytes`.
pub fn encode_envelope(enc: &mut Encoder, code: u16, inner: &[u8]) {
    enc.put_varint(code as u64);
    enc.put_varint_usize(inner.len());
    enc.put_bytes(inner);
}

/// Reads one type envelope, returning `(code, inner_bytes)`.
///
/// Never reads past the declared `inner_size`, so an unrecognised code can
/// be skipped by the caller without understanding its payload.
pub fn decode_envelope<'a>(dec: &mut Decoder<'a>) -> Result<(u16, &'a [u8])> {
    let code = dec.take_varint("type envelope code")?;
    let code = u16::try_from(code)
        .map_err(|_| crate::Error::invalid("type envelope code", "code too large"))?;
    let size = dec.take_varint_usize("type envelope size")?;
    let inner = dec.take("type envelope body", size)?;
    Ok((code, inner))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn round_trips() {
        let mut enc = Encoder::new();
        encode_envelope(&mut enc, 1, &[0x01, 0x02, 0x03]);
        let bytes = enc.into_vec();
        // varint(1), varint(3), 0x01, 0x02, 0x03
        assert_eq!(bytes, vec![1, 3, 1, 2, 3]);

        let mut dec = Decoder::new(&bytes);
        let (code, inner) = decode_envelope(&mut dec).unwrap();
        assert_eq!(code, 1);
        assert_eq!(inner, &[0x01, 0x02, 0x03]);
        assert!(dec.is_empty());
    }

    #[test]
    fn short_body_is_insufficient_size() {
        let bytes = vec![1, 5, 1, 2, 3];
        let mut dec = Decoder::new(&bytes);
        let err = decode_envelope(&mut dec).unwrap_err();
        assert!(err.is_insufficient_size());
    }
}
