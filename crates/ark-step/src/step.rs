use crate::error::{Error, Result};
use ark_matcher::DTMatch;
use ark_time::{Interval, Time};

/// How a dataset partitions its segments by reference time (spec §4.8).
/// The `Sub*` variants have no year in their formatted path: they're only
/// ever produced by [`crate::ShardStep::substep`] for a shard that has
/// already pinned the year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Yearly,
    Monthly,
    Biweekly,
    Weekly,
    Daily,
    SubMonthly { year: i32 },
    SubWeekly { year: i32 },
    SubDaily { year: i32 },
}

impl Step {
    pub fn create(name: &str) -> Result<Step> {
        match name {
            "yearly" => Ok(Step::Yearly),
            "monthly" => Ok(Step::Monthly),
            "biweekly" => Ok(Step::Biweekly),
            "weekly" => Ok(Step::Weekly),
            "daily" => Ok(Step::Daily),
            other => Err(Error::UnknownStep(other.to_string())),
        }
    }

    pub fn list() -> Vec<&'static str> {
        vec!["daily", "weekly", "biweekly", "monthly", "yearly"]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Step::Yearly => "yearly",
            Step::Monthly | Step::SubMonthly { .. } => "monthly",
            Step::Biweekly => "biweekly",
            Step::Weekly | Step::SubWeekly { .. } => "weekly",
            Step::Daily | Step::SubDaily { .. } => "daily",
        }
    }

    /// Formats `time` as a relative path under this step.
    pub fn path(&self, time: &Time) -> String {
        match self {
            Step::Yearly => format!("{:02}/{:04}", time.ye / 100, time.ye),
            Step::Monthly => format!("{:04}/{:02}", time.ye, time.mo),
            Step::SubMonthly { .. } => format!("{:02}", time.mo),
            Step::Biweekly => format!("{:04}/{:02}-{}", time.ye, time.mo, biweek_of(time.da)),
            Step::Weekly => format!("{:04}/{:02}-{}", time.ye, time.mo, week_of(time.da)),
            Step::SubWeekly { .. } => format!("{:02}-{}", time.mo, week_of(time.da)),
            Step::Daily => format!("{:04}/{:02}-{:02}", time.ye, time.mo, time.da),
            Step::SubDaily { .. } => format!("{:02}-{:02}", time.mo, time.da),
        }
    }

    /// Inverse of [`Step::path`]: the half-open interval of instants the
    /// path represents.
    pub fn path_timespan(&self, path: &str) -> Result<Interval> {
        let bad = || Error::UnparseablePath { step: self.name(), path: path.to_string() };
        match self {
            Step::Yearly => {
                let (_, ye) = path.split_once('/').ok_or_else(bad)?;
                let ye: i32 = ye.parse().map_err(|_| bad())?;
                Ok(span(ye, -1, -1))
            }
            Step::Monthly => {
                let (ye, mo) = path.split_once('/').ok_or_else(bad)?;
                Ok(span(ye.parse().map_err(|_| bad())?, mo.parse().map_err(|_| bad())?, -1))
            }
            Step::SubMonthly { year } => {
                let mo: i32 = path.trim().parse().map_err(|_| bad())?;
                Ok(span(*year, mo, -1))
            }
            Step::Biweekly => {
                let (ye, rest) = path.split_once('/').ok_or_else(bad)?;
                let (mo, half) = rest.split_once('-').ok_or_else(bad)?;
                let ye: i32 = ye.parse().map_err(|_| bad())?;
                let mo: i32 = mo.parse().map_err(|_| bad())?;
                let half: i32 = half.parse().map_err(|_| bad())?;
                let (min_da, max_da) = match half {
                    1 => (1, 14),
                    _ => (15, -1),
                };
                Ok(bounded_span(ye, mo, min_da, max_da))
            }
            Step::Weekly => {
                let (ye, rest) = path.split_once('/').ok_or_else(bad)?;
                let (mo, week) = rest.split_once('-').ok_or_else(bad)?;
                week_span(ye.parse().map_err(|_| bad())?, mo.parse().map_err(|_| bad())?, week.parse().map_err(|_| bad())?)
            }
            Step::SubWeekly { year } => {
                let (mo, week) = path.split_once('-').ok_or_else(bad)?;
                week_span(*year, mo.parse().map_err(|_| bad())?, week.parse().map_err(|_| bad())?)
            }
            Step::Daily => {
                let (ye, rest) = path.split_once('/').ok_or_else(bad)?;
                let (mo, da) = rest.split_once('-').ok_or_else(bad)?;
                Ok(span(
                    ye.parse().map_err(|_| bad())?,
                    mo.parse().map_err(|_| bad())?,
                    da.parse().map_err(|_| bad())?,
                ))
            }
            Step::SubDaily { year } => {
                let (mo, da) = path.split_once('-').ok_or_else(bad)?;
                Ok(span(*year, mo.parse().map_err(|_| bad())?, da.parse().map_err(|_| bad())?))
            }
        }
    }

    /// True iff `m` (a reftime predicate) intersects the path's span.
    pub fn path_matches(&self, path: &str, m: &DTMatch) -> Result<bool> {
        let span = self.path_timespan(path)?;
        Ok(m.match_period(&span.begin, &span.end.prev_instant()))
    }
}

fn biweek_of(da: i32) -> i32 {
    if da <= 14 {
        1
    } else {
        2
    }
}

fn week_of(da: i32) -> i32 {
    (da - 1) / 7 + 1
}

/// Half-open span for a bare `(ye, mo, da)` precision, trailing `-1` fields
/// meaning "not given" (per [`ark_time::Time::lowerbound`]/`upperbound`).
fn span(ye: i32, mo: i32, da: i32) -> Interval {
    Interval::new(Time::lowerbound(ye, mo, da, -1, -1, -1), Time::upperbound(ye, mo, da, -1, -1, -1).next_instant())
}

/// Half-open span with an explicit day range (used by biweekly/weekly,
/// where `max_da == -1` means "to the end of the month").
fn bounded_span(ye: i32, mo: i32, min_da: i32, max_da: i32) -> Interval {
    let begin = Time::lowerbound(ye, mo, min_da, -1, -1, -1);
    let end = Time::upperbound(ye, mo, max_da, -1, -1, -1).next_instant();
    Interval::new(begin, end)
}

fn week_span(ye: i32, mo: i32, week: i32) -> Result<Interval> {
    let min_da = (week - 1) * 7 + 1;
    let max_da = min_da + 6;
    Ok(bounded_span(ye, mo, min_da, max_da))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn yearly_path_and_back() {
        let s = Step::Yearly;
        let t = Time::new(2007, 3, 15, 0, 0, 0);
        assert_eq!(s.path(&t), "20/2007");
        let span = s.path_timespan("20/2007").unwrap();
        assert_eq!(span.begin, Time::new(2007, 1, 1, 0, 0, 0));
        assert_eq!(span.end, Time::new(2008, 1, 1, 0, 0, 0));
    }

    #[test]
    fn monthly_path_and_back() {
        let s = Step::Monthly;
        let t = Time::new(2007, 2, 1, 0, 0, 0);
        assert_eq!(s.path(&t), "2007/02");
        let span = s.path_timespan("2007/02").unwrap();
        assert_eq!(span.begin, Time::new(2007, 2, 1, 0, 0, 0));
        assert_eq!(span.end, Time::new(2007, 3, 1, 0, 0, 0));
    }

    #[test]
    fn biweekly_splits_month_at_day_fifteen() {
        let s = Step::Biweekly;
        assert_eq!(s.path(&Time::new(2007, 2, 10, 0, 0, 0)), "2007/02-1");
        assert_eq!(s.path(&Time::new(2007, 2, 20, 0, 0, 0)), "2007/02-2");
        let first = s.path_timespan("2007/02-1").unwrap();
        assert_eq!(first.begin, Time::new(2007, 2, 1, 0, 0, 0));
        assert_eq!(first.end, Time::new(2007, 2, 15, 0, 0, 0));
        let second = s.path_timespan("2007/02-2").unwrap();
        assert_eq!(second.begin, Time::new(2007, 2, 15, 0, 0, 0));
        assert_eq!(second.end, Time::new(2007, 3, 1, 0, 0, 0));
    }

    #[test]
    fn weekly_path_and_back() {
        let s = Step::Weekly;
        assert_eq!(s.path(&Time::new(2007, 2, 8, 0, 0, 0)), "2007/02-2");
        let span = s.path_timespan("2007/02-2").unwrap();
        assert_eq!(span.begin, Time::new(2007, 2, 8, 0, 0, 0));
        assert_eq!(span.end, Time::new(2007, 2, 15, 0, 0, 0));
    }

    #[test]
    fn daily_path_and_back() {
        let s = Step::Daily;
        let t = Time::new(2007, 6, 5, 0, 0, 0);
        assert_eq!(s.path(&t), "2007/06-05");
        let span = s.path_timespan("2007/06-05").unwrap();
        assert_eq!(span.begin, Time::new(2007, 6, 5, 0, 0, 0));
        assert_eq!(span.end, Time::new(2007, 6, 6, 0, 0, 0));
    }

    #[test]
    fn submonthly_uses_fixed_year() {
        let s = Step::SubMonthly { year: 2007 };
        assert_eq!(s.path(&Time::new(2007, 4, 1, 0, 0, 0)), "04");
        let span = s.path_timespan("04").unwrap();
        assert_eq!(span.begin, Time::new(2007, 4, 1, 0, 0, 0));
        assert_eq!(span.end, Time::new(2007, 5, 1, 0, 0, 0));
    }

    #[test]
    fn unknown_step_name_errors() {
        assert!(Step::create("fortnightly").is_err());
    }

    #[test]
    fn path_matches_reftime_range() {
        let s = Step::Monthly;
        let db = ark_matcher::AliasDatabase::new();
        let m = ark_matcher::Matcher::parse("reftime:==2007-02", &db, Time::now()).unwrap();
        let leaf = &m.clause(ark_types::TypeCode::Reftime).unwrap().leaves()[0];
        let ark_matcher::Leaf::Reftime(dt) = leaf else { panic!("expected Leaf::Reftime") };
        assert!(s.path_matches("2007/02", dt).unwrap());
        assert!(!s.path_matches("2007/03", dt).unwrap());
    }
}
