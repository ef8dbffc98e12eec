use ark_types::TypeCode;
use std::collections::HashMap;

/// Process-wide(-shaped) alias table: `(code, name) -> raw OR-expression
/// text` (spec §4.5 "Alias expansion", §5 "Shared resources"). Modeled as
/// a context object passed into parsing rather than true global state, per
/// spec.md §9's redesign note; a scope stack gives the save/restore
/// pattern the spec describes for tests.
#[derive(Debug, Clone, Default)]
pub struct AliasDatabase {
    scopes: Vec<HashMap<(TypeCode, String), String>>,
}

impl AliasDatabase {
    pub fn new() -> AliasDatabase {
        AliasDatabase {
            scopes: vec![HashMap::new()],
        }
    }

    /// Registers `code.name = expr` in the current (innermost) scope.
    pub fn insert(&mut self, code: TypeCode, name: impl Into<String>, expr: impl Into<String>) {
        self.scopes
            .last_mut()
            .expect("AliasDatabase always has at least one scope")
            .insert((code, name.into()), expr.into());
    }

    /// Looks up an alias, innermost scope first.
    pub fn lookup(&self, code: TypeCode, name: &str) -> Option<&str> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(&(code, name.to_string())))
            .map(|s| s.as_str())
    }

    /// Runs `f` against a fresh overlay scope, restoring the prior state
    /// once `f` returns (spec §5 "scoped-override wrapper for tests").
    pub fn scoped<R>(&mut self, f: impl FnOnce(&mut AliasDatabase) -> R) -> R {
        self.scopes.push(HashMap::new());
        let result = f(self);
        self.scopes.pop();
        result
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn lookup_finds_inserted_alias() {
        let mut db = AliasDatabase::new();
        db.insert(TypeCode::Origin, "t1", "GRIB1,200");
        assert_eq!(db.lookup(TypeCode::Origin, "t1"), Some("GRIB1,200"));
        assert_eq!(db.lookup(TypeCode::Origin, "t2"), None);
    }

    #[test]
    fn scoped_override_restores_afterwards() {
        let mut db = AliasDatabase::new();
        db.insert(TypeCode::Origin, "t1", "GRIB1,200");
        db.scoped(|inner| {
            inner.insert(TypeCode::Origin, "t1", "GRIB1,1");
            assert_eq!(inner.lookup(TypeCode::Origin, "t1"), Some("GRIB1,1"));
        });
        assert_eq!(db.lookup(TypeCode::Origin, "t1"), Some("GRIB1,200"));
    }
}
