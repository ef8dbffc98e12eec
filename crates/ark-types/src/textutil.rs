use crate::error::{Error, Result};

/// Splits `Style(a, b, c)` or `Style,a,b,c` into `(style, args)`. Both forms
/// are accepted so the same parser serves textual round-trip (`(...)` form)
/// and matcher subexpressions (`,` form, spec §4.5 grammar).
pub fn split_style_args(s: &str) -> Result<(&str, Vec<&str>)> {
    let s = s.trim();
    if let Some(open) = s.find('(') {
        let style = s[..open].trim();
        let rest = s[open + 1..]
            .strip_suffix(')')
            .ok_or_else(|| Error::invalid("styled value", format!("'{}' missing closing ')'", s)))?;
        Ok((style, split_args(rest)))
    } else if let Some((style, rest)) = s.split_once(',') {
        Ok((style.trim(), split_args(rest)))
    } else {
        Ok((s, Vec::new()))
    }
}

fn split_args(s: &str) -> Vec<&str> {
    if s.trim().is_empty() {
        return Vec::new();
    }
    s.split(',').map(|a| a.trim()).collect()
}

pub fn format_args(style: &str, args: &[String]) -> String {
    format!("{}({})", style, args.join(", "))
}

/// Parses an integer argument, treating `-` as the GRIB2-style missing
/// sentinel (caller supplies the sentinel value to substitute).
pub fn parse_int_or_missing(s: &str, missing: i64) -> Result<i64> {
    let s = s.trim();
    if s == "-" {
        return Ok(missing);
    }
    s.parse()
        .map_err(|_| Error::invalid("styled value argument", format!("'{}' is not an integer", s)))
}

pub fn format_int_or_missing(v: i64, missing: i64) -> String {
    if v == missing {
        "-".to_string()
    } else {
        v.to_string()
    }
}

pub fn parse_int(s: &str) -> Result<i64> {
    s.trim()
        .parse()
        .map_err(|_| Error::invalid("styled value argument", format!("'{}' is not an integer", s)))
}
