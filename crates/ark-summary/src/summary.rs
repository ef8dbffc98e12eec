use crate::error::{Error, Result};
use crate::intern::TypeIntern;
use crate::node::{Node, Slot};
use crate::stats::Stats;
use ark_binary::{bundle, Decoder, Encoder};
use ark_matcher::Matcher;
use ark_metadata::{ItemSet, Metadata};
use ark_types::{Item, TypeCode, MSO};

pub const SUMMARY_VERSION: u16 = 3;

/// How many combinations [`Summary::resolve_matcher`] will materialize
/// before giving up and reporting `truncated` — a pathological matcher
/// (or an unconstrained one over a huge archive) shouldn't be able to
/// make a query allocate without bound.
pub const RESOLVE_MATCHER_CAP: usize = 100_000;

/// The result of resolving a matcher down to the set of aggregate
/// combinations it could match (spec §4.7 `resolveMatcher`).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResolveMatcherResult {
    pub combinations: Vec<ItemSet>,
    pub truncated: bool,
}

/// A prefix-compressed rollup of every distinct MSO combination seen
/// across a set of metadata records, plus per-combination stats (spec
/// §4.7). Cheaper than the records themselves to carry around, transmit,
/// or merge.
pub struct Summary {
    root: Node,
    intern: TypeIntern,
}

impl Summary {
    pub fn new() -> Summary {
        Summary {
            root: Node::empty(),
            intern: TypeIntern::new(),
        }
    }

    pub fn stats(&self) -> &Stats {
        self.root.stats()
    }

    pub fn count(&self) -> u64 {
        self.root.stats().count
    }

    /// Folds one record into this summary (spec §4.7 `add(metadata)`).
    pub fn add(&mut self, md: &Metadata) {
        let v = rtrim(mso_vector(md.items(), &self.intern));
        let reftime = match md.items().get(TypeCode::Reftime) {
            Some(Item::Reftime(rt)) => Some(rt.clone()),
            _ => None,
        };
        let stats = Stats::singleton(md.data_size(), reftime.as_ref());
        self.root.merge_record(&v, &stats);
    }

    /// Folds every combination of `other` into this summary (spec §4.7
    /// `add(summary)`), without re-deriving them from individual records.
    pub fn add_summary(&mut self, other: &Summary) {
        other.visit(None, |tuple, stats| {
            self.root.merge_record(tuple, stats);
            true
        });
    }

    /// Depth-first traversal over every combination this summary holds
    /// (spec §4.7 `visit`). `filter`, if given, prunes any subtree whose
    /// ancestry can't satisfy it; `callback` runs once per surviving leaf
    /// and can stop the traversal early by returning `false`.
    pub fn visit<F: FnMut(&[Slot], &Stats) -> bool>(&self, filter: Option<&Matcher>, callback: F) -> bool {
        self.root.visit_all(filter, callback)
    }

    /// Materializes every MSO combination matching `matcher` (spec §4.7
    /// `resolveMatcher`), capped at [`RESOLVE_MATCHER_CAP`] results.
    pub fn resolve_matcher(&self, matcher: &Matcher) -> ResolveMatcherResult {
        let mut combinations = Vec::new();
        let mut truncated = false;
        self.visit(Some(matcher), |tuple, _stats| {
            let mut items = ItemSet::new();
            for slot in tuple {
                if let Some(item) = slot {
                    items.set((**item).clone());
                }
            }
            combinations.push(items);
            if combinations.len() >= RESOLVE_MATCHER_CAP {
                truncated = true;
                return false;
            }
            true
        });
        if truncated {
            tracing::warn!(cap = RESOLVE_MATCHER_CAP, "resolve_matcher truncated its result set");
        }
        ResolveMatcherResult { combinations, truncated }
    }

    /// Encodes this summary as a signed, versioned bundle (spec §4.7
    /// binary format v3).
    pub fn encode(&self) -> Vec<u8> {
        let mut payload = Encoder::new();
        payload.put_varint_usize(MSO.len());
        for _ in MSO.iter() {
            payload.put_varint_usize(0);
        }
        self.root.encode_into(&mut payload, 0);

        let mut enc = Encoder::new();
        bundle::encode_bundle(&mut enc, bundle::SIG_SUMMARY, SUMMARY_VERSION, payload.as_slice());
        enc.into_vec()
    }

    pub fn decode(dec: &mut Decoder) -> Result<Summary> {
        let b = bundle::decode_bundle(dec)?;
        bundle::check_signature(b.signature)?;
        if b.signature != bundle::SIG_SUMMARY {
            return Err(Error::invalid(
                "Summary",
                format!("expected a summary bundle, got {}", bundle::signature_name(b.signature)),
            ));
        }
        if b.version != SUMMARY_VERSION {
            return Err(Error::invalid("Summary", format!("unsupported summary version {}", b.version)));
        }

        let mut body = Decoder::new(b.payload);
        let mso_len = body.take_varint_usize("summary MSO table length")?;
        for _ in 0..mso_len {
            body.take_varint_usize("summary MSO size hint")?;
        }
        let intern = TypeIntern::new();
        let root = Node::decode_from(&mut body, &intern)?;
        Ok(Summary { root, intern })
    }
}

impl Default for Summary {
    fn default() -> Summary {
        Summary::new()
    }
}

fn mso_vector(items: &ItemSet, intern: &TypeIntern) -> Vec<Slot> {
    MSO.iter()
        .map(|&code| items.get(code).map(|item| intern.intern(item.clone())))
        .collect()
}

fn rtrim(mut v: Vec<Slot>) -> Vec<Slot> {
    while v.last().map(|s| s.is_none()).unwrap_or(false) {
        v.pop();
    }
    v
}

#[cfg(test)]
mod test {
    use super::*;
    use ark_matcher::AliasDatabase;
    use ark_metadata::DataContext;
    use ark_time::Time;
    use ark_types::types::{Level, Origin, Reftime, Source};

    fn record(centre: u8, level: i32, size: u64, reftime: Time) -> Metadata {
        let mut md = Metadata::new(Source::Blob {
            format: "grib".to_string(),
            basedir: String::new(),
            filename: "x.grib".to_string(),
            offset: 0,
            size,
        });
        md.set(Item::Origin(Origin::Grib1 {
            centre,
            subcentre: 0,
            process: 0,
        }));
        md.set(Item::Level(Level::Grib1 { ltype: 1, l1: level, l2: 0 }));
        md.set(Item::Reftime(Reftime::Position(reftime)));
        md
    }

    #[test]
    fn add_rolls_up_count_and_size() {
        let mut s = Summary::new();
        s.add(&record(1, 1, 100, Time::new(2020, 1, 1, 0, 0, 0)));
        s.add(&record(1, 1, 200, Time::new(2020, 1, 2, 0, 0, 0)));
        assert_eq!(s.count(), 2);
        assert_eq!(s.stats().size, 300);
    }

    #[test]
    fn distinct_combinations_stay_distinct() {
        let mut s = Summary::new();
        s.add(&record(1, 1, 100, Time::new(2020, 1, 1, 0, 0, 0)));
        s.add(&record(2, 2, 100, Time::new(2020, 1, 1, 0, 0, 0)));

        let mut leaves = 0;
        s.visit(None, |_, _| {
            leaves += 1;
            true
        });
        assert_eq!(leaves, 2);
    }

    #[test]
    fn add_summary_merges_another_summary_wholesale() {
        let mut a = Summary::new();
        a.add(&record(1, 1, 100, Time::new(2020, 1, 1, 0, 0, 0)));
        let mut b = Summary::new();
        b.add(&record(1, 1, 50, Time::new(2020, 2, 1, 0, 0, 0)));
        b.add(&record(2, 2, 50, Time::new(2020, 2, 1, 0, 0, 0)));

        a.add_summary(&b);
        assert_eq!(a.count(), 3);
        assert_eq!(a.stats().size, 200);
    }

    #[test]
    fn resolve_matcher_returns_matching_combinations_only() {
        let mut s = Summary::new();
        s.add(&record(1, 1, 100, Time::new(2020, 1, 1, 0, 0, 0)));
        s.add(&record(2, 2, 100, Time::new(2020, 1, 1, 0, 0, 0)));

        let db = AliasDatabase::new();
        let matcher = Matcher::parse("origin:GRIB1,1", &db, Time::now()).unwrap();
        let result = s.resolve_matcher(&matcher);
        assert!(!result.truncated);
        assert_eq!(result.combinations.len(), 1);
        assert_eq!(
            result.combinations[0].get(TypeCode::Origin),
            Some(&Item::Origin(Origin::Grib1 {
                centre: 1,
                subcentre: 0,
                process: 0
            }))
        );
    }

    #[test]
    fn resolve_matcher_prunes_on_reftime_envelope() {
        let mut s = Summary::new();
        s.add(&record(1, 1, 100, Time::new(2020, 1, 1, 0, 0, 0)));

        let db = AliasDatabase::new();
        let matcher = Matcher::parse("reftime:>=2021-01-01", &db, Time::now()).unwrap();
        let result = s.resolve_matcher(&matcher);
        assert!(result.combinations.is_empty());
    }

    #[test]
    fn binary_round_trips_through_bundle() {
        let mut s = Summary::new();
        s.add(&record(1, 1, 100, Time::new(2020, 1, 1, 0, 0, 0)));
        s.add(&record(2, 2, 200, Time::new(2020, 6, 1, 0, 0, 0)));

        let bytes = s.encode();
        let mut dec = Decoder::new(&bytes);
        let back = Summary::decode(&mut dec).unwrap();
        assert_eq!(back.count(), 2);
        assert_eq!(back.stats().size, 300);

        let mut leaves = 0;
        back.visit(None, |_, _| {
            leaves += 1;
            true
        });
        assert_eq!(leaves, 2);
    }

    #[test]
    fn data_size_is_carried_through_without_materializing_payload() {
        let md = record(1, 1, 123, Time::new(2020, 1, 1, 0, 0, 0));
        assert_eq!(md.data_size(), 123);
        let _ = DataContext::default();
    }
}
