//! Cross-clause scenarios: a single textual matcher expression naming several
//! codes at once, checked against metadata that should and shouldn't match.

use ark_matcher::{AliasDatabase, Matcher};
use ark_metadata::ItemSet;
use ark_time::Time;
use ark_types::types::{Origin, Product, Reftime, Timerange};
use ark_types::Item;

fn grib_record(centre: u8, table: u8, product: u8, reftime: Time) -> ItemSet {
    vec![
        Item::Origin(Origin::Grib1 {
            centre,
            subcentre: 0,
            process: 0,
        }),
        Item::Product(Product::Grib1 {
            origin: centre,
            table,
            product,
        }),
        Item::Timerange(Timerange::Grib1 { ttype: 0, unit: 1, p1: 2, p2: 3 }),
        Item::Reftime(Reftime::Position(reftime)),
    ]
    .into_iter()
    .collect()
}

#[test]
fn compound_and_of_clauses_matches_only_the_full_combination() {
    let db = AliasDatabase::new();
    let m = Matcher::parse(
        "origin:GRIB1,1; product:GRIB1,1,2,3; reftime:>=2020-01-01",
        &db,
        Time::now(),
    )
    .unwrap();

    let matching = grib_record(1, 2, 3, Time::new(2020, 6, 1, 0, 0, 0));
    assert!(m.matches_item_set(&matching));

    // Wrong product, same everything else.
    let wrong_product = grib_record(1, 9, 9, Time::new(2020, 6, 1, 0, 0, 0));
    assert!(!m.matches_item_set(&wrong_product));

    // Right origin and product, reftime too old.
    let too_old = grib_record(1, 2, 3, Time::new(2019, 1, 1, 0, 0, 0));
    assert!(!m.matches_item_set(&too_old));
}

#[test]
fn alias_inside_a_compound_expression_expands_per_clause() {
    let mut db = AliasDatabase::new();
    db.insert(ark_types::TypeCode::Origin, "ecmwf", "GRIB1,1");
    let m = Matcher::parse("origin:ecmwf; product:GRIB1,1,2,3", &db, Time::now()).unwrap();

    let matching = grib_record(1, 2, 3, Time::new(2020, 6, 1, 0, 0, 0));
    assert!(m.matches_item_set(&matching));
    assert_eq!(m.to_string_raw(), "origin:ecmwf; product:GRIB1,1,2,3");
    assert!(m.to_string_expanded().contains("GRIB1,1"));

    let other_origin = grib_record(2, 2, 3, Time::new(2020, 6, 1, 0, 0, 0));
    assert!(!m.matches_item_set(&other_origin));
}

#[test]
fn a_clause_for_a_code_absent_from_the_record_never_matches() {
    let db = AliasDatabase::new();
    let m = Matcher::parse("level:GRIB1,1,1,0", &db, Time::now()).unwrap();
    let no_level: ItemSet = vec![Item::Origin(Origin::Grib1 {
        centre: 1,
        subcentre: 0,
        process: 0,
    })]
    .into_iter()
    .collect();
    assert!(!m.matches_item_set(&no_level));
}
