//! Matcher engine: the grammar for `code:expr; code:expr` predicates, a
//! compiled AND-of-OR AST over the metadata type system, an alias
//! database, and reftime interval/time-of-day reasoning (spec §4.5).

mod alias;
mod ast;
mod error;
pub mod leaf;
pub mod reftime;
mod relative;

pub use alias::AliasDatabase;
pub use ast::{Matcher, Or};
pub use error::{Error, Result};
pub use leaf::Leaf;
pub use reftime::DTMatch;

#[cfg(test)]
mod test {
    use super::*;
    use ark_metadata::ItemSet;
    use ark_time::Time;
    use ark_types::types::{Origin, Reftime, Timerange};
    use ark_types::Item;

    /// spec §8 scenario E: a period reftime matches various comparisons.
    #[test]
    fn reftime_period_matching_scenario_e() {
        let db = AliasDatabase::new();
        let period = Reftime::Period(Time::new(2007, 1, 2, 3, 4, 5), Time::new(2007, 2, 3, 4, 5, 6));
        let items: ItemSet = vec![Item::Reftime(period.clone())].into_iter().collect();

        for expr in [
            "reftime:==2007-01",
            "reftime:==2007-02",
            "reftime:>=2007-01-02 03:04:05",
            "reftime:<=2007-02-03 04:05:06",
            "reftime:>2007-01-02 03:04:04",
        ] {
            let m = Matcher::parse(expr, &db, Time::now()).unwrap();
            assert!(m.matches_item_set(&items), "expected '{}' to match", expr);
        }

        let m = Matcher::parse("reftime:>2007-02-03 04:05:06", &db, Time::now()).unwrap();
        assert!(!m.matches_item_set(&items));
    }

    /// spec §8 scenario B: GRIB1 forecast-at-+2h canonicalization.
    #[test]
    fn timerange_grib1_canonicalization_scenario_b() {
        let db = AliasDatabase::new();
        let tr = Timerange::Grib1 { ttype: 0, unit: 1, p1: 2, p2: 3 };
        let items: ItemSet = vec![Item::Timerange(tr)].into_iter().collect();

        let matches = Matcher::parse("timerange:Timedef,+2h", &db, Time::now()).unwrap();
        assert!(matches.matches_item_set(&items));

        let rejects = Matcher::parse("timerange:Timedef,+2h,1", &db, Time::now()).unwrap();
        assert!(!rejects.matches_item_set(&items));
    }

    /// spec §8 scenario D: alias expansion round-trips raw and expanded text.
    #[test]
    fn alias_expansion_scenario_d() {
        let mut db = AliasDatabase::new();
        db.insert(ark_types::TypeCode::Origin, "t1", "GRIB1,200");
        let m = Matcher::parse("origin:t1", &db, Time::now()).unwrap();

        let items: ItemSet = vec![Item::Origin(Origin::Grib1 { centre: 200, subcentre: 0, process: 0 })]
            .into_iter()
            .collect();
        assert!(m.matches_item_set(&items));
        assert_eq!(m.to_string_raw(), "origin:t1");
        assert_eq!(m.to_string_expanded(), "origin:GRIB1,200");
    }
}
