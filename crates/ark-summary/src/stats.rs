use crate::error::Result;
use ark_binary::{Decoder, Encoder};
use ark_time::Time;
use ark_types::types::Reftime;

/// The reftime envelope and byte-size/record-count rollup carried by every
/// trie node (spec §4.7 `Stats`): how many records fall under this node,
/// how many bytes of data they describe, and the [begin, end] span of
/// their reftimes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stats {
    pub count: u64,
    pub size: u64,
    pub begin: Time,
    pub end: Time,
}

impl Stats {
    pub fn empty() -> Stats {
        Stats {
            count: 0,
            size: 0,
            begin: Time::unset(),
            end: Time::unset(),
        }
    }

    /// The stats contributed by a single record.
    pub fn singleton(size: u64, reftime: Option<&Reftime>) -> Stats {
        let (begin, end) = match reftime {
            Some(rt) => (rt.period_begin(), rt.period_end()),
            None => (Time::unset(), Time::unset()),
        };
        Stats {
            count: 1,
            size,
            begin,
            end,
        }
    }

    /// Widens `self` to also cover `other` (spec §4.7 `add` merge: counts
    /// and sizes sum, the reftime envelope widens to the union span).
    pub fn merge(&mut self, other: &Stats) {
        self.count += other.count;
        self.size += other.size;
        if other.begin.is_set() && (!self.begin.is_set() || other.begin < self.begin) {
            self.begin = other.begin;
        }
        if other.end.is_set() && (!self.end.is_set() || other.end > self.end) {
            self.end = other.end;
        }
    }

    /// The reftime envelope as a matchable interval, or `None` if this
    /// node's subtree carries no reftime information at all.
    pub fn envelope_reftime(&self) -> Option<Reftime> {
        if self.begin.is_set() && self.end.is_set() {
            Some(Reftime::Period(self.begin, self.end))
        } else {
            None
        }
    }

    pub fn encode(&self, enc: &mut Encoder) {
        enc.put_varint(self.count);
        enc.put_varint(self.size);
        enc.put_int(pack_minutes(&self.begin), 5);
        enc.put_int(pack_minutes(&self.end), 5);
    }

    pub fn decode(dec: &mut Decoder) -> Result<Stats> {
        let count = dec.take_varint("summary stats count")?;
        let size = dec.take_varint("summary stats size")?;
        let begin = unpack_minutes(dec.take_int("summary stats reftime begin", 5)?);
        let end = unpack_minutes(dec.take_int("summary stats reftime end", 5)?);
        Ok(Stats { count, size, begin, end })
    }
}

/// Sentinel packed value for an unset `Time`: the most negative value a
/// 40-bit signed minute count can hold, far outside any date arkimet
/// archives actually see.
const UNSET_MINUTES: i64 = -(1i64 << 39);

/// Packs a `Time` into whole minutes since the epoch (seconds are
/// dropped) so the stats envelope costs 5 bytes instead of a full
/// 6-field `Time` per bound.
fn pack_minutes(t: &Time) -> i64 {
    if !t.is_set() {
        return UNSET_MINUTES;
    }
    t.days_since_epoch() * 1440 + t.ho as i64 * 60 + t.mi as i64
}

fn unpack_minutes(v: i64) -> Time {
    if v == UNSET_MINUTES {
        return Time::unset();
    }
    let days = v.div_euclid(1440);
    let rem = v.rem_euclid(1440);
    Time::from_days(days, (rem / 60) as i32, (rem % 60) as i32, 0)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn merge_sums_counts_and_widens_envelope() {
        let mut a = Stats::singleton(10, Some(&Reftime::Position(Time::new(2020, 1, 1, 0, 0, 0))));
        let b = Stats::singleton(20, Some(&Reftime::Position(Time::new(2020, 6, 1, 0, 0, 0))));
        a.merge(&b);
        assert_eq!(a.count, 2);
        assert_eq!(a.size, 30);
        assert_eq!(a.begin, Time::new(2020, 1, 1, 0, 0, 0));
        assert_eq!(a.end, Time::new(2020, 6, 1, 0, 0, 0));
    }

    #[test]
    fn empty_stats_has_no_envelope() {
        assert_eq!(Stats::empty().envelope_reftime(), None);
    }

    #[test]
    fn reftime_round_trips_through_minute_packing() {
        for t in [
            Time::new(1970, 1, 1, 0, 0, 0),
            Time::new(2023, 11, 14, 22, 13, 0),
            Time::new(1812, 6, 23, 5, 9, 0),
        ] {
            assert_eq!(unpack_minutes(pack_minutes(&t)), t);
        }
    }

    #[test]
    fn encode_decode_round_trips() {
        let stats = Stats::singleton(42, Some(&Reftime::Period(Time::new(2007, 1, 2, 3, 4, 5), Time::new(2007, 1, 2, 3, 4, 59))));
        let mut enc = Encoder::new();
        stats.encode(&mut enc);
        let mut dec = Decoder::new(enc.as_slice());
        let back = Stats::decode(&mut dec).unwrap();
        assert_eq!(back.count, stats.count);
        assert_eq!(back.size, stats.size);
        // seconds are dropped by the compact packing
        assert_eq!(back.begin, Time::new(2007, 1, 2, 3, 4, 0));
        assert_eq!(back.end, Time::new(2007, 1, 2, 3, 4, 0));
    }
}
