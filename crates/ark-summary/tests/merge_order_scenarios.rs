//! Cross-crate scenario coverage for [`ark_summary::Summary`], exercising
//! the whole metadata -> summary pipeline rather than the trie in
//! isolation (mirrors `ark-matcher`'s `tests/compound_query_scenarios.rs`).

use ark_metadata::Metadata;
use ark_summary::Summary;
use ark_time::Time;
use ark_types::types::{Origin, Product, Reftime, Source, Timerange};
use ark_types::Item;

fn grib_record(centre: u8, subcentre: u8, process: u8, size: u64, reftime: Time) -> Metadata {
    let mut md = Metadata::new(Source::Blob {
        format: "grib".to_string(),
        basedir: String::new(),
        filename: "scenario.grib".to_string(),
        offset: 0,
        size,
    });
    md.set(Item::Origin(Origin::Grib1 { centre, subcentre, process }));
    md.set(Item::Product(Product::Grib1 {
        origin: 1,
        table: 2,
        product: 3,
    }));
    md.set(Item::Timerange(Timerange::Grib1 { ttype: 1, unit: 254, p1: 0, p2: 0 }));
    md.set(Item::Reftime(Reftime::Position(reftime)));
    md
}

// Two records differing only in Origin and Reftime, merged in either order,
// roll up into the same two-leaf summary with a widened count/size/reftime
// envelope.
#[test]
fn merging_two_records_in_either_order_yields_the_same_summary() {
    let a = grib_record(1, 2, 3, 10, Time::new(2007, 1, 2, 3, 4, 5));
    let b = grib_record(3, 4, 5, 20, Time::new(2006, 5, 4, 3, 2, 1));

    let mut forward = Summary::new();
    forward.add(&a);
    forward.add(&b);

    let mut backward = Summary::new();
    backward.add(&b);
    backward.add(&a);

    for summary in [&forward, &backward] {
        assert_eq!(summary.count(), 2);
        assert_eq!(summary.stats().size, 30);
        assert_eq!(summary.stats().begin, Time::new(2006, 5, 4, 3, 2, 1));
        assert_eq!(summary.stats().end, Time::new(2007, 1, 2, 3, 4, 5));

        let mut leaves = 0;
        summary.visit(None, |_, _| {
            leaves += 1;
            true
        });
        assert_eq!(leaves, 2);
    }
}

// add_summary folds two single-record summaries together and must agree
// with adding both records directly to one summary.
#[test]
fn add_summary_of_two_singletons_matches_direct_add() {
    let a = grib_record(1, 2, 3, 10, Time::new(2007, 1, 2, 3, 4, 5));
    let b = grib_record(3, 4, 5, 20, Time::new(2006, 5, 4, 3, 2, 1));

    let mut direct = Summary::new();
    direct.add(&a);
    direct.add(&b);

    let mut sa = Summary::new();
    sa.add(&a);
    let mut sb = Summary::new();
    sb.add(&b);
    sa.add_summary(&sb);

    assert_eq!(sa.count(), direct.count());
    assert_eq!(sa.stats().size, direct.stats().size);
    assert_eq!(sa.stats().begin, direct.stats().begin);
    assert_eq!(sa.stats().end, direct.stats().end);
}
