use crate::time::Time;

/// A pair of [`Time`] endpoints with open-ended (unset) ends allowed.
/// `begin` is inclusive, `end` is exclusive, matching arkimet's half-open
/// interval convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub begin: Time,
    pub end: Time,
}

impl Interval {
    pub fn new(begin: Time, end: Time) -> Interval {
        Interval { begin, end }
    }

    pub fn unbounded() -> Interval {
        Interval::new(Time::unset(), Time::unset())
    }

    pub fn is_unbounded(&self) -> bool {
        !self.begin.is_set() && !self.end.is_set()
    }

    pub fn contains_instant(&self, time: &Time) -> bool {
        if self.begin.is_set() && *time < self.begin {
            return false;
        }
        if self.end.is_set() && *time >= self.end {
            return false;
        }
        true
    }

    pub fn contains(&self, other: &Interval) -> bool {
        if !self.begin.is_set() {
            if !self.end.is_set() {
                return true;
            }
            if other.begin.is_set() && other.begin >= self.end {
                return false;
            }
            return other.end.is_set() && other.end <= self.end;
        }

        if !self.end.is_set() {
            if other.end.is_set() && other.end <= self.begin {
                return false;
            }
            return other.begin.is_set() && other.begin >= self.begin;
        }

        if !other.begin.is_set() || !other.end.is_set() {
            return false;
        }

        other.begin >= self.begin
            && other.begin < self.end
            && other.end > self.begin
            && other.end <= self.end
    }

    pub fn intersects(&self, other: &Interval) -> bool {
        if !self.begin.is_set() {
            if !self.end.is_set() {
                return true;
            }
            return !other.begin.is_set() || other.begin < self.end;
        }

        if !self.end.is_set() {
            return !other.end.is_set() || other.end > self.begin;
        }

        if !other.begin.is_set() {
            return !other.end.is_set() || other.end > self.begin;
        }
        if !other.end.is_set() {
            return other.begin < self.end;
        }

        !(other.end <= self.begin) && !(other.begin >= self.end)
    }

    /// Narrows `self` to its intersection with `other` in place. Returns
    /// `true` unless the two are disjoint (in which case `self` is left
    /// unchanged and the caller should treat the match as empty).
    pub fn intersect(&mut self, other: &Interval) -> bool {
        if self.begin.is_set() && other.end.is_set() && other.end <= self.begin {
            return false;
        }
        if self.end.is_set() && other.begin.is_set() && self.end <= other.begin {
            return false;
        }

        if !other.begin.is_set() {
            if !other.end.is_set() {
                return true;
            }
            if !self.end.is_set() || self.end > other.end {
                self.end = other.end;
            }
            return true;
        }

        if !other.end.is_set() {
            if !self.begin.is_set() || self.begin < other.begin {
                self.begin = other.begin;
            }
            return true;
        }

        if !self.end.is_set() || self.end > other.end {
            self.end = other.end;
        }
        if !self.begin.is_set() || self.begin < other.begin {
            self.begin = other.begin;
        }
        true
    }

    /// Widens `self` to cover `other` as well.
    pub fn extend(&mut self, other: &Interval) {
        if self.begin.is_set() && (!other.begin.is_set() || other.begin < self.begin) {
            self.begin = other.begin;
        }
        if self.end.is_set() && (!other.end.is_set() || other.end > self.end) {
            self.end = other.end;
        }
    }

    pub fn spans_one_whole_month(&self) -> bool {
        if !self.begin.is_set() || !self.end.is_set() {
            return true;
        }
        if self.begin.is_start_of_month() {
            self.end >= self.begin.start_of_next_month()
        } else {
            self.end >= self.begin.start_of_next_month().start_of_next_month()
        }
    }

    /// Invokes `f` once per calendar month overlapped by this interval.
    /// `f` returning `false` stops the iteration early (cooperative
    /// cancellation, per the core's cancellation model).
    pub fn iter_months<F: FnMut(Interval) -> bool>(&self, mut f: F) {
        let mut pos = self.begin;
        loop {
            let next = pos.start_of_next_month();
            if next >= self.end {
                f(Interval::new(pos, self.end));
                break;
            } else {
                if !f(Interval::new(pos, next)) {
                    break;
                }
                pos = next;
            }
        }
    }

    pub fn to_display_string(&self) -> String {
        let mut res = String::new();
        if self.begin.is_set() {
            res.push_str(&self.begin.to_iso8601());
        }
        res.push('…');
        if self.end.is_set() {
            res.push_str(&self.end.to_iso8601());
        }
        res
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn t(ye: i32, mo: i32, da: i32) -> Time {
        Time::new(ye, mo, da, 0, 0, 0)
    }

    #[test]
    fn intersects_basic() {
        let a = Interval::new(t(2007, 1, 1), t(2007, 6, 1));
        let b = Interval::new(t(2007, 3, 1), t(2007, 9, 1));
        assert!(a.intersects(&b));
        let c = Interval::new(t(2008, 1, 1), t(2008, 6, 1));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn intersect_narrows() {
        let mut a = Interval::new(t(2007, 1, 1), t(2007, 6, 1));
        let b = Interval::new(t(2007, 3, 1), t(2007, 9, 1));
        assert!(a.intersect(&b));
        assert_eq!(a, Interval::new(t(2007, 3, 1), t(2007, 6, 1)));
    }

    #[test]
    fn unbounded_contains_everything() {
        let u = Interval::unbounded();
        assert!(u.contains_instant(&t(1900, 1, 1)));
        assert!(u.contains_instant(&t(2100, 1, 1)));
    }
}
