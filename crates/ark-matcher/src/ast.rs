use crate::alias::AliasDatabase;
use crate::error::{Error, Result};
use crate::leaf::Leaf;
use ark_metadata::ItemSet;
use ark_time::Time;
use ark_types::TypeCode;
use std::collections::BTreeMap;

fn is_bare_word(s: &str) -> bool {
    let s = s.trim();
    !s.is_empty()
        && s.chars().next().map(|c| c.is_alphabetic() || c == '_').unwrap_or(false)
        && s.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '.')
}

/// One code's predicate: a disjunction ("or") of style-specific [`Leaf`]
/// matchers, plus the raw and alias-expanded text for round-trip (spec
/// §4.5 "An `OR` may carry its raw text").
#[derive(Debug, Clone, PartialEq)]
pub struct Or {
    code: TypeCode,
    raw_text: String,
    leaves: Vec<Leaf>,
    expanded_text: String,
}

impl Or {
    pub fn code(&self) -> TypeCode {
        self.code
    }

    pub fn leaves(&self) -> &[Leaf] {
        &self.leaves
    }

    /// Parses `subexpr (' or ' subexpr)*` for one code (spec §4.5 grammar).
    /// A subexpr that fails to parse directly and looks like a bare
    /// identifier is tried against the alias database (single-level
    /// expansion only, per spec §4.5 "Circular aliases are not handled").
    pub fn parse(code: TypeCode, text: &str, db: &AliasDatabase, now: Time) -> Result<Or> {
        let raw_text = text.trim().to_string();
        let mut leaves = Vec::new();
        let mut expanded_parts = Vec::new();

        for part in raw_text.split(" or ") {
            let part = part.trim();
            match Leaf::parse(code, part, now) {
                Ok(leaf) => {
                    leaves.push(leaf);
                    expanded_parts.push(part.to_string());
                }
                Err(direct_err) => {
                    if is_bare_word(part) {
                        match db.lookup(code, part) {
                            Some(expansion) => {
                                let expansion = expansion.to_string();
                                let leaf = Leaf::parse(code, &expansion, now)?;
                                leaves.push(leaf);
                                expanded_parts.push(expansion);
                            }
                            None => {
                                tracing::debug!(code = %code, alias = part, "matcher alias not found");
                                return Err(Error::UnknownAlias(format!("{}.{}", code.name(), part)));
                            }
                        }
                    } else {
                        tracing::debug!(code = %code, part, error = %direct_err, "matcher subexpr failed to parse");
                        return Err(direct_err);
                    }
                }
            }
        }

        Ok(Or {
            code,
            raw_text,
            leaves,
            expanded_text: expanded_parts.join(" or "),
        })
    }

    pub fn matches_item(&self, item: &ark_types::Item) -> bool {
        self.leaves.iter().any(|leaf| leaf.matches(item))
    }

    pub fn to_string_raw(&self) -> String {
        format!("{}:{}", self.code.name(), self.raw_text)
    }

    pub fn to_string_expanded(&self) -> String {
        format!("{}:{}", self.code.name(), self.expanded_text)
    }
}

/// A parsed matcher expression: a map from code to that code's [`Or`]
/// (spec §4.5 "`AND` is a map from code to `OR`"). Codes absent from the
/// map are unconstrained.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Matcher {
    clauses: BTreeMap<TypeCode, Or>,
}

impl Matcher {
    pub fn empty() -> Matcher {
        Matcher::default()
    }

    pub fn parse(text: &str, db: &AliasDatabase, now: Time) -> Result<Matcher> {
        let mut clauses = BTreeMap::new();
        for clause in text.split(';') {
            let clause = clause.trim();
            if clause.is_empty() {
                continue;
            }
            let (code_name, orlist) = clause
                .split_once(':')
                .ok_or_else(|| Error::invalid("matcher clause", format!("'{}' is missing ':'", clause)))?;
            let code = TypeCode::from_name(code_name.trim())?;
            let or = Or::parse(code, orlist, db, now)?;
            if clauses.insert(code, or).is_some() {
                return Err(Error::invalid("matcher", format!("duplicate clause for code '{}'", code_name.trim())));
            }
        }
        Ok(Matcher { clauses })
    }

    pub fn clause(&self, code: TypeCode) -> Option<&Or> {
        self.clauses.get(&code)
    }

    pub fn clauses(&self) -> impl Iterator<Item = &Or> {
        self.clauses.values()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// `matchItemSet` (spec §4.5): true iff every code present in the
    /// matcher has a matching item in `items`; absence fails the match.
    pub fn matches_item_set(&self, items: &ItemSet) -> bool {
        self.clauses.values().all(|or| match items.get(or.code()) {
            Some(item) => or.matches_item(item),
            None => false,
        })
    }

    pub fn to_string_raw(&self) -> String {
        self.clauses.values().map(Or::to_string_raw).collect::<Vec<_>>().join("; ")
    }

    pub fn to_string_expanded(&self) -> String {
        self.clauses
            .values()
            .map(Or::to_string_expanded)
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use ark_types::types::{Origin, Timerange};
    use ark_types::Item;

    fn set(items: Vec<Item>) -> ItemSet {
        items.into_iter().collect()
    }

    #[test]
    fn and_requires_every_clause_present() {
        let db = AliasDatabase::new();
        let m = Matcher::parse("origin:GRIB1,200; timerange:Timedef,+2h", &db, Time::now()).unwrap();
        let items = set(vec![Item::Origin(Origin::Grib1 { centre: 200, subcentre: 0, process: 0 })]);
        assert!(!m.matches_item_set(&items));

        let items = set(vec![
            Item::Origin(Origin::Grib1 { centre: 200, subcentre: 0, process: 0 }),
            Item::Timerange(Timerange::Grib1 { ttype: 0, unit: 1, p1: 2, p2: 0 }),
        ]);
        assert!(m.matches_item_set(&items));
    }

    #[test]
    fn alias_expands_single_level() {
        let mut db = AliasDatabase::new();
        db.insert(TypeCode::Origin, "t1", "GRIB1,200");
        let m = Matcher::parse("origin:t1", &db, Time::now()).unwrap();
        let or = m.clause(TypeCode::Origin).unwrap();
        assert_eq!(or.to_string_raw(), "origin:t1");
        assert_eq!(or.to_string_expanded(), "origin:GRIB1,200");

        let items = set(vec![Item::Origin(Origin::Grib1 { centre: 200, subcentre: 0, process: 0 })]);
        assert!(m.matches_item_set(&items));
    }

    #[test]
    fn unknown_alias_errors() {
        let db = AliasDatabase::new();
        assert!(Matcher::parse("origin:nosuchalias", &db, Time::now()).is_err());
    }

    #[test]
    fn or_matches_if_any_leaf_matches() {
        let db = AliasDatabase::new();
        let m = Matcher::parse("origin:GRIB1,1 or GRIB1,2", &db, Time::now()).unwrap();
        let items = set(vec![Item::Origin(Origin::Grib1 { centre: 2, subcentre: 0, process: 0 })]);
        assert!(m.matches_item_set(&items));
    }
}
