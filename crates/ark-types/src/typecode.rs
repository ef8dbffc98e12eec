use crate::error::{Error, Result};
use std::fmt;

/// The closed enumeration of metadata attribute kinds, with fixed integer
/// codes for wire compatibility (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TypeCode {
    Origin,
    Product,
    Level,
    Timerange,
    Reftime,
    Area,
    Proddef,
    Source,
    Note,
    AssignedDataset,
    Run,
    BBox,
    Quantity,
    Task,
    Value,
}

impl TypeCode {
    pub const ALL: [TypeCode; 15] = [
        TypeCode::Origin,
        TypeCode::Product,
        TypeCode::Level,
        TypeCode::Timerange,
        TypeCode::Reftime,
        TypeCode::Area,
        TypeCode::Proddef,
        TypeCode::Source,
        TypeCode::Note,
        TypeCode::AssignedDataset,
        TypeCode::Run,
        TypeCode::BBox,
        TypeCode::Quantity,
        TypeCode::Task,
        TypeCode::Value,
    ];

    pub fn wire_code(self) -> u16 {
        match self {
            TypeCode::Origin => 1,
            TypeCode::Product => 2,
            TypeCode::Level => 3,
            TypeCode::Timerange => 4,
            TypeCode::Reftime => 5,
            TypeCode::Area => 6,
            TypeCode::Proddef => 7,
            TypeCode::Source => 8,
            TypeCode::Note => 9,
            TypeCode::AssignedDataset => 10,
            TypeCode::Run => 11,
            TypeCode::BBox => 12,
            TypeCode::Quantity => 13,
            TypeCode::Task => 14,
            TypeCode::Value => 15,
        }
    }

    pub fn from_wire_code(code: u16) -> Result<TypeCode> {
        Ok(match code {
            1 => TypeCode::Origin,
            2 => TypeCode::Product,
            3 => TypeCode::Level,
            4 => TypeCode::Timerange,
            5 => TypeCode::Reftime,
            6 => TypeCode::Area,
            7 => TypeCode::Proddef,
            8 => TypeCode::Source,
            9 => TypeCode::Note,
            10 => TypeCode::AssignedDataset,
            11 => TypeCode::Run,
            12 => TypeCode::BBox,
            13 => TypeCode::Quantity,
            14 => TypeCode::Task,
            15 => TypeCode::Value,
            other => return Err(Error::invalid("type code", format!("unknown wire code {}", other))),
        })
    }

    /// The lowercase name used in the matcher grammar and textual form
    /// (`origin:`, `Origin:` in YAML, …).
    pub fn name(self) -> &'static str {
        match self {
            TypeCode::Origin => "origin",
            TypeCode::Product => "product",
            TypeCode::Level => "level",
            TypeCode::Timerange => "timerange",
            TypeCode::Reftime => "reftime",
            TypeCode::Area => "area",
            TypeCode::Proddef => "proddef",
            TypeCode::Source => "source",
            TypeCode::Note => "note",
            TypeCode::AssignedDataset => "assigneddataset",
            TypeCode::Run => "run",
            TypeCode::BBox => "bbox",
            TypeCode::Quantity => "quantity",
            TypeCode::Task => "task",
            TypeCode::Value => "value",
        }
    }

    pub fn from_name(name: &str) -> Result<TypeCode> {
        TypeCode::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| Error::invalid("type code", format!("unknown code name '{}'", name)))
    }
}

/// Metadata Scan Order: the fixed ordering of attribute codes used to key
/// the summary trie (spec §4.7, §GLOSSARY "MSO").
pub const MSO: [TypeCode; 10] = [
    TypeCode::Origin,
    TypeCode::Product,
    TypeCode::Level,
    TypeCode::Timerange,
    TypeCode::Area,
    TypeCode::Proddef,
    TypeCode::BBox,
    TypeCode::Run,
    TypeCode::Quantity,
    TypeCode::Task,
];

impl TypeCode {
    /// This code's position in `MSO`, if it participates in the summary scan order.
    pub fn mso_index(self) -> Option<usize> {
        MSO.iter().position(|&c| c == self)
    }
}

impl fmt::Display for TypeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn round_trips_wire_code() {
        for code in TypeCode::ALL {
            assert_eq!(TypeCode::from_wire_code(code.wire_code()).unwrap(), code);
        }
    }

    #[test]
    fn round_trips_name() {
        for code in TypeCode::ALL {
            assert_eq!(TypeCode::from_name(code.name()).unwrap(), code);
        }
    }
}
