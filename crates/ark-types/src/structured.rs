//! Shared helpers for the structured (JSON-like) serialization form (spec
//! §4.3 `serialise`/`decode_structure`, §6 "Structured form"). Each concrete
//! type builds its own `serde_json::Map` from these primitives; [`Item`]
//! adds the `t`/`type` discriminant on top (see `item.rs`).

use crate::error::{Error, Result};
use ark_time::Time;
use ark_value::{Value, ValueBag};
use serde_json::{Map, Value as Json};

/// Times are serialised as a 6-element integer list (spec §6.2).
pub fn time_to_json(t: &Time) -> Json {
    Json::Array(vec![
        Json::from(t.ye),
        Json::from(t.mo),
        Json::from(t.da),
        Json::from(t.ho),
        Json::from(t.mi),
        Json::from(t.se),
    ])
}

pub fn time_from_json(what: &str, v: &Json) -> Result<Time> {
    let arr = v.as_array().ok_or_else(|| Error::invalid(what, "expected a 6-element time array"))?;
    if arr.len() != 6 {
        return Err(Error::invalid(what, "expected a 6-element time array"));
    }
    let mut fields = [0i32; 6];
    for (i, elem) in arr.iter().enumerate() {
        fields[i] = elem
            .as_i64()
            .ok_or_else(|| Error::invalid(what, "time array element is not an integer"))? as i32;
    }
    Ok(Time::new(fields[0], fields[1], fields[2], fields[3], fields[4], fields[5]))
}

/// A ValueBag serialises as a plain JSON object, one key per entry (spec
/// §6.2's structured form has no dedicated ValueBag shape; this mirrors the
/// textual `key=val, key=val` form one-for-one).
pub fn valuebag_to_json(bag: &ValueBag) -> Json {
    let mut map = Map::new();
    for (key, value) in bag.iter() {
        let v = match value.as_int() {
            Some(i) => Json::from(i),
            None => Json::from(value.as_str().unwrap_or_default()),
        };
        map.insert(key.to_string(), v);
    }
    Json::Object(map)
}

pub fn valuebag_from_json(what: &str, v: &Json) -> Result<ValueBag> {
    let map = v.as_object().ok_or_else(|| Error::invalid(what, "expected a JSON object"))?;
    let mut bag = ValueBag::new();
    for (key, value) in map {
        let v = match value {
            Json::Number(n) if n.is_i64() => Value::int(n.as_i64().unwrap()),
            Json::Number(n) => Value::int(n.as_f64().unwrap_or(0.0) as i64),
            Json::String(s) => Value::str(s.clone()),
            other => return Err(Error::invalid(what, format!("unsupported value {}", other))),
        };
        bag.insert(key.clone(), v);
    }
    Ok(bag)
}

pub fn get_field<'a>(what: &str, v: &'a Json, key: &str) -> Result<&'a Json> {
    v.get(key).ok_or_else(|| Error::invalid(what, format!("missing field '{}'", key)))
}

pub fn get_str<'a>(what: &str, v: &'a Json, key: &str) -> Result<&'a str> {
    get_field(what, v, key)?
        .as_str()
        .ok_or_else(|| Error::invalid(what, format!("field '{}' is not a string", key)))
}

pub fn get_i64(what: &str, v: &Json, key: &str) -> Result<i64> {
    get_field(what, v, key)?
        .as_i64()
        .ok_or_else(|| Error::invalid(what, format!("field '{}' is not an integer", key)))
}

pub fn get_u64(what: &str, v: &Json, key: &str) -> Result<u64> {
    get_field(what, v, key)?
        .as_u64()
        .ok_or_else(|| Error::invalid(what, format!("field '{}' is not an unsigned integer", key)))
}

pub fn get_style<'a>(what: &str, v: &'a Json, style_key: &str) -> Result<&'a str> {
    get_str(what, v, style_key)
}
