use crate::error::{Error, Result};
use crate::keys::Keys;
use crate::structured::{get_str, get_u64};
use ark_binary::{Decoder, Encoder};
use serde_json::{json, Value as Json};
use std::cmp::Ordering;

/// The Source metadata attribute: where to find the data payload for a
/// record (spec §4.3). Unlike the other styled types this is carried
/// alongside a Metadata rather than inside its ItemSet (spec §4.4), but
/// uses the same style/codec shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Blob {
        format: String,
        basedir: String,
        filename: String,
        offset: u64,
        size: u64,
    },
    Inline {
        format: String,
        size: u64,
    },
    Url {
        format: String,
        url: String,
    },
}

impl Source {
    pub fn style_byte(&self) -> u8 {
        match self {
            Source::Blob { .. } => 1,
            Source::Url { .. } => 2,
            Source::Inline { .. } => 3,
        }
    }

    pub fn style_name(&self) -> &'static str {
        match self {
            Source::Blob { .. } => "BLOB",
            Source::Url { .. } => "URL",
            Source::Inline { .. } => "INLINE",
        }
    }

    pub fn format(&self) -> &str {
        match self {
            Source::Blob { format, .. } | Source::Inline { format, .. } | Source::Url { format, .. } => format,
        }
    }

    pub fn encode_payload(&self, enc: &mut Encoder) {
        enc.put_u8(self.style_byte());
        match self {
            Source::Blob {
                format,
                basedir,
                filename,
                offset,
                size,
            } => {
                put_str(enc, format);
                put_str(enc, basedir);
                put_str(enc, filename);
                enc.put_varint(*offset);
                enc.put_varint(*size);
            }
            Source::Url { format, url } => {
                put_str(enc, format);
                enc.put_bytes(url.as_bytes());
            }
            Source::Inline { format, size } => {
                put_str(enc, format);
                enc.put_varint(*size);
            }
        }
    }

    pub fn decode(dec: &mut Decoder) -> Result<Source> {
        let style = dec.take_u8("Source style")?;
        Ok(match style {
            1 => Source::Blob {
                format: get_str(dec, "Source.BLOB format")?,
                basedir: get_str(dec, "Source.BLOB basedir")?,
                filename: get_str(dec, "Source.BLOB filename")?,
                offset: dec.take_varint("Source.BLOB offset")?,
                size: dec.take_varint("Source.BLOB size")?,
            },
            2 => {
                let format = get_str(dec, "Source.URL format")?;
                let url_bytes = dec.rest();
                let url = std::str::from_utf8(url_bytes)
                    .map_err(|_| Error::invalid("Source.URL url", "not valid UTF-8"))?
                    .to_string();
                Source::Url { format, url }
            }
            3 => Source::Inline {
                format: get_str(dec, "Source.INLINE format")?,
                size: dec.take_varint("Source.INLINE size")?,
            },
            other => return Err(Error::invalid("Source style", format!("unknown style {}", other))),
        })
    }

    pub fn write_text(&self, out: &mut String) {
        match self {
            Source::Blob {
                format,
                basedir,
                filename,
                offset,
                size,
            } => out.push_str(&format!("BLOB({},{}:{}+{})", format, pathjoin(basedir, filename), offset, size)),
            Source::Url { format, url } => out.push_str(&format!("URL({},{})", format, url)),
            Source::Inline { format, size } => out.push_str(&format!("INLINE({},{})", format, size)),
        }
    }

    pub fn parse_text(s: &str) -> Result<Source> {
        let s = s.trim();
        let (style, rest) = s
            .split_once('(')
            .ok_or_else(|| Error::invalid("Source", "missing '('"))?;
        let rest = rest
            .strip_suffix(')')
            .ok_or_else(|| Error::invalid("Source", "missing ')'"))?;
        match style.to_ascii_uppercase().as_str() {
            "BLOB" => {
                let (format, rest) = rest
                    .split_once(',')
                    .ok_or_else(|| Error::invalid("Source.BLOB", "missing format"))?;
                let (path, rest) = rest
                    .split_once(':')
                    .ok_or_else(|| Error::invalid("Source.BLOB", "missing ':'"))?;
                let (offset, size) = rest
                    .split_once('+')
                    .ok_or_else(|| Error::invalid("Source.BLOB", "missing '+'"))?;
                let (basedir, filename) = split_path(path);
                Ok(Source::Blob {
                    format: format.trim().to_string(),
                    basedir,
                    filename,
                    offset: offset.trim().parse().map_err(|_| Error::invalid("Source.BLOB", "invalid offset"))?,
                    size: size.trim().parse().map_err(|_| Error::invalid("Source.BLOB", "invalid size"))?,
                })
            }
            "URL" => {
                let (format, url) = rest
                    .split_once(',')
                    .ok_or_else(|| Error::invalid("Source.URL", "missing format"))?;
                Ok(Source::Url {
                    format: format.trim().to_string(),
                    url: url.trim().to_string(),
                })
            }
            "INLINE" => {
                let (format, size) = rest
                    .split_once(',')
                    .ok_or_else(|| Error::invalid("Source.INLINE", "missing format"))?;
                Ok(Source::Inline {
                    format: format.trim().to_string(),
                    size: size.trim().parse().map_err(|_| Error::invalid("Source.INLINE", "invalid size"))?,
                })
            }
            other => Err(Error::invalid("Source style", format!("unknown style '{}'", other))),
        }
    }

    pub fn exact_query(&self) -> String {
        let mut args = String::new();
        self.write_text(&mut args);
        format!("source:{}", args.replacen('(', ",", 1).trim_end_matches(')'))
    }

    pub fn serialise(&self, keys: &Keys) -> Json {
        match self {
            Source::Blob {
                format,
                basedir,
                filename,
                offset,
                size,
            } => json!({
                keys.type_style: self.style_name(),
                keys.source_format: format,
                keys.source_basedir: basedir,
                keys.source_file: filename,
                keys.source_offset: offset,
                keys.source_size: size,
            }),
            Source::Inline { format, size } => json!({
                keys.type_style: self.style_name(),
                keys.source_format: format,
                keys.source_size: size,
            }),
            Source::Url { format, url } => json!({
                keys.type_style: self.style_name(),
                keys.source_format: format,
                keys.source_url: url,
            }),
        }
    }

    pub fn decode_structure(keys: &Keys, v: &Json) -> Result<Source> {
        let style = get_str("Source", v, keys.type_style)?;
        Ok(match style.to_ascii_uppercase().as_str() {
            "BLOB" => Source::Blob {
                format: get_str("Source.BLOB", v, keys.source_format)?.to_string(),
                basedir: get_str("Source.BLOB", v, keys.source_basedir)?.to_string(),
                filename: get_str("Source.BLOB", v, keys.source_file)?.to_string(),
                offset: get_u64("Source.BLOB", v, keys.source_offset)?,
                size: get_u64("Source.BLOB", v, keys.source_size)?,
            },
            "INLINE" => Source::Inline {
                format: get_str("Source.INLINE", v, keys.source_format)?.to_string(),
                size: get_u64("Source.INLINE", v, keys.source_size)?,
            },
            "URL" => Source::Url {
                format: get_str("Source.URL", v, keys.source_format)?.to_string(),
                url: get_str("Source.URL", v, keys.source_url)?.to_string(),
            },
            other => return Err(Error::invalid("Source style", format!("unknown style '{}'", other))),
        })
    }
}

fn pathjoin(basedir: &str, filename: &str) -> String {
    if basedir.is_empty() {
        filename.to_string()
    } else {
        format!("{}/{}", basedir.trim_end_matches('/'), filename)
    }
}

fn split_path(path: &str) -> (String, String) {
    match path.rsplit_once('/') {
        Some((dir, file)) => (dir.to_string(), file.to_string()),
        None => (String::new(), path.to_string()),
    }
}

fn put_str(enc: &mut Encoder, s: &str) {
    enc.put_varint_usize(s.len());
    enc.put_bytes(s.as_bytes());
}

fn get_str(dec: &mut Decoder, what: &str) -> Result<String> {
    let len = dec.take_varint_usize(what)?;
    let bytes = dec.take(what, len)?;
    Ok(std::str::from_utf8(bytes)
        .map_err(|_| Error::invalid(what, "not valid UTF-8"))?
        .to_string())
}

impl PartialOrd for Source {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Source {
    fn cmp(&self, other: &Self) -> Ordering {
        self.style_byte().cmp(&other.style_byte()).then_with(|| match (self, other) {
            (
                Source::Blob { basedir: bd1, filename: f1, offset: o1, .. },
                Source::Blob { basedir: bd2, filename: f2, offset: o2, .. },
            ) => (bd1, f1, o1).cmp(&(bd2, f2, o2)),
            (Source::Url { url: u1, .. }, Source::Url { url: u2, .. }) => u1.cmp(u2),
            (Source::Inline { size: s1, .. }, Source::Inline { size: s2, .. }) => s1.cmp(s2),
            _ => Ordering::Equal,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn round_trip_structured() {
        let src = Source::Blob {
            format: "grib".to_string(),
            basedir: "/data".to_string(),
            filename: "a.grib".to_string(),
            offset: 10,
            size: 20,
        };
        let j = src.serialise(&crate::keys::KEYS_JSON);
        assert_eq!(Source::decode_structure(&crate::keys::KEYS_JSON, &j).unwrap(), src);
    }

    #[test]
    fn blob_round_trip_binary() {
        let s = Source::Blob {
            format: "grib".to_string(),
            basedir: "/data".to_string(),
            filename: "2020.grib".to_string(),
            offset: 100,
            size: 50,
        };
        let mut enc = Encoder::new();
        s.encode_payload(&mut enc);
        let mut dec = Decoder::new(enc.as_slice());
        assert_eq!(Source::decode(&mut dec).unwrap(), s);
    }

    #[test]
    fn blob_text_round_trip() {
        let s = Source::Blob {
            format: "grib".to_string(),
            basedir: "/data".to_string(),
            filename: "2020.grib".to_string(),
            offset: 100,
            size: 50,
        };
        let mut out = String::new();
        s.write_text(&mut out);
        assert_eq!(out, "BLOB(grib,/data/2020.grib:100+50)");
        assert_eq!(Source::parse_text(&out).unwrap(), s);
    }
}
