use crate::error::{Error, Result};
use crate::reftime::precision_interval;
use ark_time::{Interval, Time};

/// Resolves a reftime operand that may be a literal date, a relative
/// keyword (`today`, `yesterday`, `tomorrow`, `now`, `easter YEAR`,
/// `processione san luca YEAR`), or a keyword/date shifted by a duration
/// (`3 days after tomorrow 12:00`, `a week ago`). `now` is the reference
/// instant captured once when the enclosing matcher was parsed.
pub fn parse(s: &str, now: Time) -> Result<Interval> {
    let s = s.trim();
    let lower = s.to_ascii_lowercase();

    let (duration_text, direction, base_text): (&str, Direction, &str) = if let Some(stripped) = lower.strip_suffix(" ago") {
        (&s[..stripped.len()], Direction::Before, "now")
    } else if let Some(idx) = lower.find(" before ") {
        (&s[..idx], Direction::Before, &s[idx + " before ".len()..])
    } else if let Some(idx) = lower.find(" after ") {
        (&s[..idx], Direction::After, &s[idx + " after ".len()..])
    } else {
        ("", Direction::None, s)
    };

    let mut base = resolve_base(base_text.trim(), now)?;

    if direction != Direction::None || !duration_text.trim().is_empty() {
        let (months, seconds) = parse_duration(duration_text.trim())?;
        let sign = if direction == Direction::Before { -1 } else { 1 };
        base.begin = shift(base.begin, months * sign, seconds * sign);
        base.end = shift(base.end, months * sign, seconds * sign);
    }

    Ok(base)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    None,
    Before,
    After,
}

/// Resolves the keyword/date part alone (no duration shift yet).
fn resolve_base(s: &str, now: Time) -> Result<Interval> {
    let lower = s.to_ascii_lowercase();

    if lower == "now" {
        return Ok(point_interval(now));
    }

    for (keyword, offset_days) in [("today", 0), ("yesterday", -1), ("tomorrow", 1)] {
        if lower == keyword {
            let date = shift(now, 0, offset_days * 86400).start_of_day();
            return Ok(whole_day(date));
        }
        if let Some(rest) = lower.strip_prefix(keyword) {
            let rest = rest.trim();
            if !rest.is_empty() {
                let date = shift(now, 0, offset_days * 86400).start_of_day();
                let tod = parse_clock(rest)?;
                return Ok(point_interval(add_seconds(date, tod)));
            }
        }
    }

    if let Some(rest) = lower.strip_prefix("easter") {
        return parse_named_day(rest.trim(), s, Time::easter);
    }

    if let Some(rest) = lower.strip_prefix("processione san luca") {
        return parse_named_day(rest.trim(), s, |year| {
            Time::easter(year).start_of_day().normalised()
        })
        .map(|iv| {
            let shift_days = 5 * 7 - 1;
            Interval::new(
                shift(iv.begin, 0, shift_days * 86400),
                shift(iv.end, 0, shift_days * 86400),
            )
        });
    }

    precision_interval(s)
}

fn parse_named_day(rest: &str, original: &str, f: impl Fn(i32) -> Time) -> Result<Interval> {
    let mut parts = rest.splitn(2, ' ');
    let year: i32 = parts
        .next()
        .filter(|p| !p.is_empty())
        .ok_or_else(|| Error::invalid("relative reftime", format!("'{}' is missing a year", original)))?
        .parse()
        .map_err(|_| Error::invalid("relative reftime", format!("'{}' has an invalid year", original)))?;
    let date = f(year).start_of_day();
    match parts.next().map(str::trim).filter(|s| !s.is_empty()) {
        Some(clock) => Ok(point_interval(add_seconds(date, parse_clock(clock)?))),
        None => Ok(whole_day(date)),
    }
}

fn point_interval(t: Time) -> Interval {
    Interval::new(t, t.next_instant())
}

fn whole_day(t: Time) -> Interval {
    let begin = t.start_of_day();
    Interval::new(begin, add_seconds(begin, 86400))
}

fn add_seconds(t: Time, seconds: i64) -> Time {
    let mut t = t;
    t.se += seconds as i32;
    t.normalise();
    t
}

fn parse_clock(s: &str) -> Result<i64> {
    let mut parts = s.trim().splitn(3, ':');
    let ho: i64 = parts
        .next()
        .unwrap_or("0")
        .trim()
        .parse()
        .map_err(|_| Error::invalid("relative reftime", format!("'{}' has an invalid hour", s)))?;
    let mi: i64 = match parts.next() {
        Some(p) => p.trim().parse().map_err(|_| Error::invalid("relative reftime", format!("'{}' has an invalid minute", s)))?,
        None => 0,
    };
    let se: i64 = match parts.next() {
        Some(p) => p.trim().parse().map_err(|_| Error::invalid("relative reftime", format!("'{}' has an invalid second", s)))?,
        None => 0,
    };
    Ok(ho * 3600 + mi * 60 + se)
}

/// Sums a chain of `<n> <unit>` terms (`2 months a week 3 days 5 hours and
/// 3 minutes`) into calendar months and fixed seconds, since month/year
/// lengths vary but day/hour/minute/second do not.
fn parse_duration(s: &str) -> Result<(i64, i64)> {
    let mut months = 0i64;
    let mut seconds = 0i64;
    let words: Vec<&str> = s
        .split_whitespace()
        .filter(|w| !w.eq_ignore_ascii_case("and"))
        .map(|w| w.trim_end_matches(','))
        .filter(|w| !w.is_empty())
        .collect();

    let mut i = 0;
    while i < words.len() {
        let word = words[i];
        let (count, consumed) = if word.eq_ignore_ascii_case("a") || word.eq_ignore_ascii_case("an") {
            (1i64, 1)
        } else {
            let n: i64 = word
                .parse()
                .map_err(|_| Error::invalid("relative reftime duration", format!("'{}' expected a number", word)))?;
            (n, 1)
        };
        i += consumed;
        let unit = words
            .get(i)
            .ok_or_else(|| Error::invalid("relative reftime duration", format!("'{}' is missing a unit", s)))?;
        i += 1;
        let unit = unit.trim_end_matches('s').to_ascii_lowercase();
        match unit.as_str() {
            "second" => seconds += count,
            "minute" => seconds += count * 60,
            "hour" => seconds += count * 3600,
            "day" => seconds += count * 86400,
            "week" => seconds += count * 86400 * 7,
            "month" => months += count,
            "year" => months += count * 12,
            other => return Err(Error::invalid("relative reftime duration", format!("unknown unit '{}'", other))),
        }
    }
    Ok((months, seconds))
}

fn shift(t: Time, months: i64, seconds: i64) -> Time {
    let mut t = t;
    let total_months = t.mo as i64 - 1 + months;
    t.ye += total_months.div_euclid(12) as i32;
    t.mo = (total_months.rem_euclid(12) + 1) as i32;
    t.normalise();
    t.se += seconds as i32;
    t.normalise();
    t
}

trait StartOfDay {
    fn start_of_day(&self) -> Time;
}

impl StartOfDay for Time {
    fn start_of_day(&self) -> Time {
        Time::new(self.ye, self.mo, self.da, 0, 0, 0)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn now() -> Time {
        Time::new(2020, 6, 15, 10, 0, 0)
    }

    #[test]
    fn today_spans_the_whole_day() {
        let iv = parse("today", now()).unwrap();
        assert_eq!(iv, Interval::new(Time::new(2020, 6, 15, 0, 0, 0), Time::new(2020, 6, 16, 0, 0, 0)));
    }

    #[test]
    fn tomorrow_with_clock_is_a_point() {
        let iv = parse("tomorrow 12:00", now()).unwrap();
        assert_eq!(iv.begin, Time::new(2020, 6, 16, 12, 0, 0));
    }

    #[test]
    fn three_days_after_tomorrow_noon() {
        let iv = parse("3 days after tomorrow 12:00", now()).unwrap();
        assert_eq!(iv.begin, Time::new(2020, 6, 19, 12, 0, 0));
    }

    #[test]
    fn a_week_ago() {
        let iv = parse("a week ago", now()).unwrap();
        assert_eq!(iv.begin, Time::new(2020, 6, 8, 10, 0, 0));
    }

    #[test]
    fn compound_duration_before_tomorrow() {
        let iv = parse("2 months a week 3 days 5 hours and 3 minutes before tomorrow 12:00", now()).unwrap();
        // base: 2020-06-16T12:00:00, shift back by 2 months, 1 week 3 days, 5h3m
        assert_eq!(iv.begin, Time::new(2020, 4, 6, 6, 57, 0));
    }

    #[test]
    fn easter_with_year() {
        let iv = parse("easter 2024", now()).unwrap();
        assert_eq!(iv.begin, Time::new(2024, 3, 31, 0, 0, 0));
    }

    #[test]
    fn processione_san_luca_is_easter_plus_five_weeks_minus_one_day() {
        let iv = parse("processione san luca 2024", now()).unwrap();
        assert_eq!(iv.begin, Time::new(2024, 5, 4, 0, 0, 0));
    }

    #[test]
    fn falls_back_to_literal_date() {
        let iv = parse("2007-04-01", now()).unwrap();
        assert_eq!(iv.begin, Time::new(2007, 4, 1, 0, 0, 0));
    }
}
