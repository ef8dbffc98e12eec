use crate::error::{Error, Result};
use crate::itemset::ItemSet;
use ark_binary::{bundle, decode_envelope, encode_envelope, Decoder, Encoder};
use ark_types::types::{Note, Source};
use ark_types::{Item, Keys, TypeCode};
use serde_json::{json, Value as Json};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Wire version of the Metadata bundle format this crate reads and writes.
pub const METADATA_VERSION: u16 = 0;

/// Resolution context for a Metadata's Source (spec §4.4): the directory
/// Blob filenames are relative to, and the size threshold above which
/// `stream_data` avoids fully materializing the payload.
#[derive(Debug, Clone)]
pub struct DataContext {
    pub basedir: PathBuf,
    pub streaming_threshold: u64,
}

impl Default for DataContext {
    fn default() -> Self {
        DataContext {
            basedir: PathBuf::new(),
            streaming_threshold: 1 << 20,
        }
    }
}

impl DataContext {
    pub fn new(basedir: impl Into<PathBuf>) -> DataContext {
        DataContext {
            basedir: basedir.into(),
            ..Default::default()
        }
    }

    fn resolve(&self, basedir: &str, filename: &str) -> PathBuf {
        let filename_path = Path::new(filename);
        if filename_path.is_absolute() {
            return filename_path.to_path_buf();
        }
        let relative_base = Path::new(basedir);
        let full_base = if relative_base.is_absolute() {
            relative_base.to_path_buf()
        } else {
            self.basedir.join(relative_base)
        };
        full_base.join(filename_path)
    }
}

/// A single arkimet record: an [`ItemSet`] of attributes, a [`Source`]
/// saying where the data payload lives, and an ordered list of [`Note`]s
/// (spec §4.4). Produced by a scanner, sealed when written, reconstructed
/// by readers from the wire form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    items: ItemSet,
    source: Source,
    notes: Vec<Note>,
    inline_data: Option<Vec<u8>>,
}

impl Metadata {
    pub fn new(source: Source) -> Metadata {
        Metadata {
            items: ItemSet::new(),
            source,
            notes: Vec::new(),
            inline_data: None,
        }
    }

    /// Builds an Inline-sourced Metadata, carrying its own payload.
    pub fn inline(format: impl Into<String>, data: Vec<u8>) -> Metadata {
        let size = data.len() as u64;
        let mut md = Metadata::new(Source::Inline {
            format: format.into(),
            size,
        });
        md.inline_data = Some(data);
        md
    }

    pub fn items(&self) -> &ItemSet {
        &self.items
    }

    pub fn items_mut(&mut self) -> &mut ItemSet {
        &mut self.items
    }

    pub fn get(&self, code: TypeCode) -> Option<&Item> {
        self.items.get(code)
    }

    pub fn set(&mut self, item: Item) {
        self.items.set(item);
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    pub fn set_source(&mut self, source: Source) {
        self.source = source;
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    /// The size in bytes of the data payload this record describes, used by
    /// the summary's per-leaf `Stats` (spec §4.7 `add(metadata)`). A `Url`
    /// source carries no size of its own and contributes zero.
    pub fn data_size(&self) -> u64 {
        match &self.source {
            Source::Blob { size, .. } => *size,
            Source::Inline { size, .. } => *size,
            Source::Url { .. } => 0,
        }
    }

    pub fn add_note(&mut self, note: Note) {
        self.notes.push(note);
    }

    /// The data payload, as described by `source` (spec §4.4 "Data access").
    pub fn get_data(&self, ctx: &DataContext) -> Result<Vec<u8>> {
        match &self.source {
            Source::Blob {
                basedir,
                filename,
                offset,
                size,
                ..
            } => {
                let path = ctx.resolve(basedir, filename);
                let mut file = std::fs::File::open(&path)
                    .map_err(|e| Error::invalid("Metadata.get_data", format!("{}: {}", path.display(), e)))?;
                file.seek(SeekFrom::Start(*offset))
                    .map_err(|e| Error::invalid("Metadata.get_data", e.to_string()))?;
                let mut buf = vec![0u8; *size as usize];
                file.read_exact(&mut buf)
                    .map_err(|e| Error::invalid("Metadata.get_data", e.to_string()))?;
                Ok(buf)
            }
            Source::Inline { .. } => self.inline_data.clone().ok_or_else(|| Error::DataUnavailable {
                what: "inline payload not attached to this Metadata".to_string(),
            }),
            Source::Url { url, .. } => Err(Error::DataUnavailable {
                what: format!("no network resolution layer configured for {}", url),
            }),
        }
    }

    /// Copies the data payload to `out`. For Blob sources at or above the
    /// context's streaming threshold, copies directly from the file
    /// without materializing the whole buffer in memory.
    pub fn stream_data(&self, ctx: &DataContext, out: &mut dyn Write) -> Result<()> {
        if let Source::Blob {
            basedir,
            filename,
            offset,
            size,
            ..
        } = &self.source
        {
            if *size >= ctx.streaming_threshold {
                tracing::debug!(filename, offset, size, "streaming blob payload directly from file");
                let path = ctx.resolve(basedir, filename);
                let mut file = std::fs::File::open(&path)
                    .map_err(|e| Error::invalid("Metadata.stream_data", format!("{}: {}", path.display(), e)))?;
                file.seek(SeekFrom::Start(*offset))
                    .map_err(|e| Error::invalid("Metadata.stream_data", e.to_string()))?;
                let mut limited = file.take(*size);
                std::io::copy(&mut limited, out).map_err(|e| Error::invalid("Metadata.stream_data", e.to_string()))?;
                return Ok(());
            }
        }
        let data = self.get_data(ctx)?;
        out.write_all(&data)
            .map_err(|e| Error::invalid("Metadata.stream_data", e.to_string()))
    }

    /// Encodes the Metadata bundle (spec §4.4): attribute envelopes, then
    /// one Notes envelope, then one Source envelope.
    pub fn encode(&self, enc: &mut Encoder) {
        let mut payload = Encoder::new();
        self.items.encode(&mut payload);

        let mut notes_body = Encoder::new();
        for note in &self.notes {
            let mut np = Encoder::new();
            note.encode_payload(&mut np);
            notes_body.put_varint_usize(np.len());
            notes_body.put_bytes(np.as_slice());
        }
        encode_envelope(&mut payload, TypeCode::Note.wire_code(), notes_body.as_slice());

        let mut source_payload = Encoder::new();
        self.source.encode_payload(&mut source_payload);
        encode_envelope(&mut payload, TypeCode::Source.wire_code(), source_payload.as_slice());

        bundle::encode_bundle(enc, bundle::SIG_METADATA, METADATA_VERSION, payload.as_slice());
    }

    /// Decodes one Metadata bundle. If the source turns out to be Inline,
    /// the caller is responsible for supplying the following `size` bytes
    /// of payload via [`Metadata::attach_inline_data`].
    pub fn decode(dec: &mut Decoder) -> Result<Metadata> {
        let b = bundle::decode_bundle(dec)?;
        bundle::check_signature(b.signature)?;
        if b.signature != bundle::SIG_METADATA {
            return Err(Error::invalid(
                "Metadata",
                format!("expected a metadata bundle, got {}", bundle::signature_name(b.signature)),
            ));
        }
        let mut body = Decoder::new(b.payload);

        let mut items = ItemSet::new();
        let mut notes = Vec::new();
        let mut source = None;

        while !body.is_empty() {
            let (code, inner) = decode_envelope(&mut body)?;
            let code = TypeCode::from_wire_code(code)?;
            match code {
                TypeCode::Note => {
                    let mut ndec = Decoder::new(inner);
                    while !ndec.is_empty() {
                        let len = ndec.take_varint_usize("Metadata Notes entry length")?;
                        let note_bytes = ndec.take("Metadata Notes entry", len)?;
                        let mut one = Decoder::new(note_bytes);
                        notes.push(Note::decode(&mut one)?);
                    }
                }
                TypeCode::Source => {
                    let mut sdec = Decoder::new(inner);
                    source = Some(Source::decode(&mut sdec)?);
                }
                other => {
                    let mut idec = Decoder::new(inner);
                    items.set(Item::decode_payload(other, &mut idec)?);
                }
            }
        }

        let source = source.ok_or_else(|| Error::invalid("Metadata", "bundle has no Source envelope"))?;
        tracing::trace!(items = items.len(), notes = notes.len(), "decoded metadata bundle");
        Ok(Metadata {
            items,
            source,
            notes,
            inline_data: None,
        })
    }

    pub fn attach_inline_data(&mut self, data: Vec<u8>) {
        self.inline_data = Some(data);
    }

    /// The textual (YAML-like) dump of this record (spec §6): one `Key:
    /// value` line per attribute, then a `Note:` line per note, then the
    /// `Source:` line.
    pub fn write_yaml(&self, out: &mut String) {
        for item in self.items.iter() {
            out.push_str(&capitalize(item.code().name()));
            out.push_str(": ");
            out.push_str(&item.to_text());
            out.push('\n');
        }
        for note in &self.notes {
            out.push_str("Note: ");
            out.push_str(&note.to_text());
            out.push('\n');
        }
        out.push_str("Source: ");
        self.source.write_text(out);
        out.push('\n');
    }

    pub fn to_yaml(&self) -> String {
        let mut s = String::new();
        self.write_yaml(&mut s);
        s
    }

    /// Structured (JSON-like) form (spec §6): the ItemSet under
    /// `keys.metadata_items`, the notes under `keys.metadata_notes`, and the
    /// Source merged in under its own style mapping.
    pub fn serialise(&self, keys: &Keys) -> Json {
        let mut v = json!({
            keys.metadata_items: self.items.serialise(keys),
            keys.metadata_notes: self.notes.iter().map(|n| n.serialise(keys)).collect::<Vec<_>>(),
        });
        if let Some(map) = v.as_object_mut() {
            if let Some(src) = self.source.serialise(keys).as_object() {
                for (k, v) in src {
                    map.insert(k.clone(), v.clone());
                }
            }
        }
        v
    }

    pub fn decode_structure(keys: &Keys, v: &Json) -> Result<Metadata> {
        let items = ItemSet::decode_structure(
            keys,
            v.get(keys.metadata_items)
                .ok_or_else(|| Error::invalid("Metadata", "missing items"))?,
        )?;
        let notes = v
            .get(keys.metadata_notes)
            .and_then(|n| n.as_array())
            .ok_or_else(|| Error::invalid("Metadata", "missing notes"))?
            .iter()
            .map(|n| Ok(Note::decode_structure(keys, n)?))
            .collect::<Result<Vec<_>>>()?;
        let source = Source::decode_structure(keys, v)?;
        Ok(Metadata {
            items,
            source,
            notes,
            inline_data: None,
        })
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use ark_types::types::Origin;

    fn blob_source() -> Source {
        Source::Blob {
            format: "grib".to_string(),
            basedir: String::new(),
            filename: "test.grib".to_string(),
            offset: 0,
            size: 4,
        }
    }

    #[test]
    fn round_trips_binary() {
        let mut md = Metadata::new(blob_source());
        md.set(Item::Origin(Origin::Grib1 {
            centre: 1,
            subcentre: 2,
            process: 3,
        }));
        md.add_note(Note::new(ark_time::Time::new(2020, 1, 1, 0, 0, 0), "scanned"));

        let mut enc = Encoder::new();
        md.encode(&mut enc);
        let mut dec = Decoder::new(enc.as_slice());
        let back = Metadata::decode(&mut dec).unwrap();

        assert_eq!(back.source(), md.source());
        assert_eq!(back.notes(), md.notes());
        assert_eq!(back.get(TypeCode::Origin), md.get(TypeCode::Origin));
    }

    #[test]
    fn inline_data_is_not_available_until_attached() {
        let md = Metadata::inline("grib", vec![1, 2, 3]);
        assert_eq!(md.get_data(&DataContext::default()).unwrap(), vec![1, 2, 3]);

        let mut decoded = Metadata::new(Source::Inline {
            format: "grib".to_string(),
            size: 3,
        });
        assert!(decoded.get_data(&DataContext::default()).is_err());
        decoded.attach_inline_data(vec![1, 2, 3]);
        assert_eq!(decoded.get_data(&DataContext::default()).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn yaml_dump_has_one_line_per_attribute() {
        let mut md = Metadata::new(blob_source());
        md.set(Item::Origin(Origin::Grib1 {
            centre: 1,
            subcentre: 2,
            process: 3,
        }));
        md.add_note(Note::new(ark_time::Time::new(2020, 1, 1, 0, 0, 0), "scanned"));
        let yaml = md.to_yaml();
        assert!(yaml.contains("Origin: GRIB1(1, 2, 3)\n"));
        assert!(yaml.contains("Note: "));
        assert!(yaml.contains("Source: BLOB(grib,test.grib:0+4)\n"));
    }

    #[test]
    fn round_trips_structured() {
        let mut md = Metadata::new(blob_source());
        md.set(Item::Origin(Origin::Grib1 {
            centre: 1,
            subcentre: 2,
            process: 3,
        }));
        md.add_note(Note::new(ark_time::Time::new(2020, 1, 1, 0, 0, 0), "scanned"));

        let j = md.serialise(&ark_types::KEYS_JSON);
        let back = Metadata::decode_structure(&ark_types::KEYS_JSON, &j).unwrap();
        assert_eq!(back.source(), md.source());
        assert_eq!(back.notes(), md.notes());
        assert_eq!(back.get(TypeCode::Origin), md.get(TypeCode::Origin));
    }

    #[test]
    fn url_source_has_no_data() {
        let md = Metadata::new(Source::Url {
            format: "grib".to_string(),
            url: "http://example.org/x.grib".to_string(),
        });
        assert!(md.get_data(&DataContext::default()).is_err());
    }
}
