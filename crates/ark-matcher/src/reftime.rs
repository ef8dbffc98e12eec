use crate::error::{Error, Result};
use ark_time::{Interval, Time};
use ark_types::types::Reftime as ReftimeItem;

/// One parsed `reftime:` subexpression (spec §4.5). All six relational
/// operators reduce to a half-open [`Interval`] computed once at parse
/// time; equality and the relational forms only differ in how that
/// interval is built. Time-of-day and stepped predicates operate on
/// seconds-since-midnight instead and are kept as their own variants.
#[derive(Debug, Clone, PartialEq)]
pub enum DTMatch {
    /// `=T`, `==T`, `>T`, `>=T`, `<T`, `<=T`: matches instants inside (or
    /// periods intersecting) this interval.
    Range(Interval),
    /// `>HH:MM`, `>=HH:MM`, `<HH:MM`, `<=HH:MM`: time-of-day comparison,
    /// applied existentially to every instant of a period.
    TimeOfDay { op: TodOp, seconds: i64 },
    /// `==HH:MM%Nh`: matches instants whose time-of-day lies in
    /// `{base + k*step mod 86400 : k in Z}`.
    Stepped { base_seconds: i64, step_seconds: i64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TodOp {
    Lt,
    Le,
    Gt,
    Ge,
}

fn seconds_of_day(t: &Time) -> i64 {
    t.ho as i64 * 3600 + t.mi as i64 * 60 + t.se as i64
}

fn overlaps(a0: i64, a1: i64, b0: i64, b1: i64) -> bool {
    a0 < b1 && b0 < a1
}

impl DTMatch {
    pub fn match_instant(&self, t: &Time) -> bool {
        match self {
            DTMatch::Range(iv) => iv.contains_instant(t),
            DTMatch::TimeOfDay { op, seconds } => {
                let s = seconds_of_day(t);
                match op {
                    TodOp::Lt => s < *seconds,
                    TodOp::Le => s <= *seconds,
                    TodOp::Gt => s > *seconds,
                    TodOp::Ge => s >= *seconds,
                }
            }
            DTMatch::Stepped { base_seconds, step_seconds } => {
                if *step_seconds <= 0 {
                    return seconds_of_day(t) == *base_seconds;
                }
                (seconds_of_day(t) - base_seconds).rem_euclid(*step_seconds) == 0
            }
        }
    }

    pub fn match_period(&self, begin: &Time, end: &Time) -> bool {
        match self {
            DTMatch::Range(iv) => iv.intersects(&Interval::new(*begin, *end)),
            DTMatch::TimeOfDay { op, seconds } => {
                let dur = Time::duration(begin, end);
                if dur >= 86400 {
                    return true;
                }
                let b = seconds_of_day(begin);
                let e = b + dur.max(0);
                let (t0, t1) = match op {
                    TodOp::Ge => (*seconds, i64::MAX / 2),
                    TodOp::Gt => (*seconds + 1, i64::MAX / 2),
                    TodOp::Le => (i64::MIN / 2, *seconds + 1),
                    TodOp::Lt => (i64::MIN / 2, *seconds),
                };
                overlaps(b, e, t0, t1) || overlaps(b, e, t0 + 86400, t1.saturating_add(86400)) || overlaps(b, e, t0 - 86400, t1.saturating_sub(86400))
            }
            DTMatch::Stepped { base_seconds, step_seconds } => {
                let dur = Time::duration(begin, end);
                if *step_seconds <= 0 || dur >= *step_seconds {
                    return true;
                }
                let b = seconds_of_day(begin);
                let e = b + dur.max(0);
                let mut k = (b - base_seconds).div_euclid(*step_seconds) - 1;
                loop {
                    let candidate = base_seconds + k * step_seconds;
                    if candidate > e + step_seconds {
                        break false;
                    }
                    if candidate >= b && candidate < e {
                        break true;
                    }
                    k += 1;
                }
            }
        }
    }

    pub fn matches_reftime(&self, r: &ReftimeItem) -> bool {
        match r {
            ReftimeItem::Position(t) => self.match_instant(t),
            ReftimeItem::Period(b, e) => self.match_period(b, e),
        }
    }

    /// Narrows `[begin, end]` to the intersection with this predicate's
    /// range. Only [`DTMatch::Range`] constrains date extremes; the other
    /// variants leave the range untouched (spec §4.5).
    pub fn restrict_date_range(&self, interval: &mut Interval) -> bool {
        match self {
            DTMatch::Range(iv) => interval.intersect(iv),
            _ => true,
        }
    }
}

/// Parses the field-precision fragment of an ISO-ish timestamp, returning
/// `-1` for any field not present (year is mandatory).
fn parse_partial(s: &str) -> Result<(i32, i32, i32, i32, i32, i32)> {
    let s = s.trim();
    let (date, time) = match s.find(|c| c == 'T' || c == ' ') {
        Some(i) => (&s[..i], Some(s[i + 1..].trim_end_matches('Z'))),
        None => (s, None),
    };
    let mut fields = [-1i32; 6];
    for (i, part) in date.splitn(3, '-').enumerate() {
        if part.is_empty() {
            break;
        }
        fields[i] = part
            .parse()
            .map_err(|_| Error::invalid("reftime date", format!("'{}' is not numeric", part)))?;
    }
    if let Some(time) = time {
        for (i, part) in time.splitn(3, ':').enumerate() {
            if part.is_empty() {
                break;
            }
            fields[3 + i] = part
                .parse()
                .map_err(|_| Error::invalid("reftime time", format!("'{}' is not numeric", part)))?;
        }
    }
    if fields[0] == -1 {
        return Err(Error::invalid("reftime", format!("'{}' has no year", s)));
    }
    Ok((fields[0], fields[1], fields[2], fields[3], fields[4], fields[5]))
}

pub(crate) fn precision_interval(s: &str) -> Result<Interval> {
    let (ye, mo, da, ho, mi, se) = parse_partial(s)?;
    let begin = Time::lowerbound(ye, mo, da, ho, mi, se);
    let end = Time::upperbound(ye, mo, da, ho, mi, se).next_instant();
    Ok(Interval::new(begin, end))
}

fn parse_time_of_day(s: &str) -> Result<i64> {
    let mut parts = s.trim().splitn(3, ':');
    let ho: i64 = parts
        .next()
        .ok_or_else(|| Error::invalid("time of day", format!("'{}' is empty", s)))?
        .trim()
        .parse()
        .map_err(|_| Error::invalid("time of day", format!("'{}' has invalid hour", s)))?;
    let mi: i64 = match parts.next() {
        Some(p) => p.trim().parse().map_err(|_| Error::invalid("time of day", format!("'{}' has invalid minute", s)))?,
        None => 0,
    };
    let se: i64 = match parts.next() {
        Some(p) => p.trim().parse().map_err(|_| Error::invalid("time of day", format!("'{}' has invalid second", s)))?,
        None => 0,
    };
    Ok(ho * 3600 + mi * 60 + se)
}

/// Parses one comparison subexpression: `=T`, `==T`, `>=T`, `>T`, `<=T`,
/// `<T`, optionally with an `HH:MM` time-of-day operand and an optional
/// `%Nh` step suffix on equality.
fn parse_comparison(s: &str, now: Time) -> Result<DTMatch> {
    let s = s.trim();
    let (op, rest) = if let Some(r) = s.strip_prefix(">=") {
        (">=", r)
    } else if let Some(r) = s.strip_prefix("<=") {
        ("<=", r)
    } else if let Some(r) = s.strip_prefix("==") {
        ("==", r)
    } else if let Some(r) = s.strip_prefix('=') {
        ("=", r)
    } else if let Some(r) = s.strip_prefix('>') {
        (">", r)
    } else if let Some(r) = s.strip_prefix('<') {
        ("<", r)
    } else {
        return crate::relative::parse(s, now).map(DTMatch::Range);
    };
    let rest = rest.trim();

    if (op == "=" || op == "==") && rest.contains('%') {
        let (base, step) = rest
            .split_once('%')
            .ok_or_else(|| Error::invalid("reftime step", format!("'{}' missing '%'", rest)))?;
        let step = step.trim().trim_end_matches(|c: char| !c.is_ascii_digit());
        let step_hours: i64 = step
            .parse()
            .map_err(|_| Error::invalid("reftime step", format!("'{}' is not an hour count", step)))?;
        let base_seconds = parse_time_of_day(base)?;
        return Ok(DTMatch::Stepped {
            base_seconds,
            step_seconds: step_hours * 3600,
        });
    }

    if rest.contains(':') && !rest.contains('-') {
        let seconds = parse_time_of_day(rest)?;
        let tod_op = match op {
            ">" => TodOp::Gt,
            ">=" => TodOp::Ge,
            "<" => TodOp::Lt,
            "<=" => TodOp::Le,
            _ => return Err(Error::invalid("reftime", format!("'{}=' cannot be used with a bare time of day", op))),
        };
        return Ok(DTMatch::TimeOfDay { op: tod_op, seconds });
    }

    let target = crate::relative::parse(rest, now)?;

    let interval = match op {
        "=" | "==" => target,
        ">=" => Interval::new(target.begin, Time::unset()),
        ">" => Interval::new(target.end, Time::unset()),
        "<" => Interval::new(Time::unset(), target.begin),
        "<=" => Interval::new(Time::unset(), target.end),
        _ => unreachable!(),
    };
    Ok(DTMatch::Range(interval))
}

/// Parses one `or`-separated list of reftime subexpressions into the
/// leaves of an [`crate::ast::Or`].
pub fn parse_all(pattern: &str, now: Time) -> Result<Vec<DTMatch>> {
    pattern.split(" or ").map(|part| parse_comparison(part.trim(), now)).collect()
}

/// Parses a single reftime subexpression (one side of an `or`), used by
/// [`crate::ast::Or::parse`] which does its own `or`-splitting uniformly
/// across every code.
pub fn parse_one(s: &str, now: Time) -> Result<DTMatch> {
    parse_comparison(s, now)
}

#[cfg(test)]
mod test {
    use super::*;

    fn t(ye: i32, mo: i32, da: i32, ho: i32, mi: i32, se: i32) -> Time {
        Time::new(ye, mo, da, ho, mi, se)
    }

    #[test]
    fn equality_on_bare_year_spans_whole_year() {
        let m = parse_comparison("=2007", Time::now()).unwrap();
        assert!(m.match_instant(&t(2007, 6, 15, 0, 0, 0)));
        assert!(!m.match_instant(&t(2008, 1, 1, 0, 0, 0)));
    }

    #[test]
    fn greater_equal_excludes_earlier_instants() {
        let m = parse_comparison(">=2007-04-01", Time::now()).unwrap();
        assert!(m.match_instant(&t(2007, 4, 1, 0, 0, 0)));
        assert!(!m.match_instant(&t(2007, 3, 31, 23, 59, 59)));
    }

    #[test]
    fn less_than_excludes_the_boundary_day() {
        let m = parse_comparison("<2007-04-01", Time::now()).unwrap();
        assert!(!m.match_instant(&t(2007, 4, 1, 0, 0, 0)));
        assert!(m.match_instant(&t(2007, 3, 31, 23, 59, 59)));
    }

    #[test]
    fn time_of_day_long_period_is_trivially_true() {
        let m = parse_comparison(">12:00", Time::now()).unwrap();
        assert!(m.match_period(&t(2007, 1, 1, 0, 0, 0), &t(2007, 1, 3, 0, 0, 0)));
    }

    #[test]
    fn time_of_day_short_period_checks_overlap() {
        let m = parse_comparison(">12:00", Time::now()).unwrap();
        assert!(m.match_period(&t(2007, 1, 1, 11, 0, 0), &t(2007, 1, 1, 13, 0, 0)));
        assert!(!m.match_period(&t(2007, 1, 1, 1, 0, 0), &t(2007, 1, 1, 2, 0, 0)));
    }

    #[test]
    fn stepped_equality_matches_every_step() {
        let m = parse_comparison("==00:00%12h", Time::now()).unwrap();
        assert!(m.match_instant(&t(2007, 1, 1, 0, 0, 0)));
        assert!(m.match_instant(&t(2007, 1, 1, 12, 0, 0)));
        assert!(!m.match_instant(&t(2007, 1, 1, 6, 0, 0)));
    }
}
