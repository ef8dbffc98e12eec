use crate::error::{Error, Result};
use crate::step::Step;
use ark_time::Time;

/// Which calendar unit a shard boundary falls on (spec §4.8 "Optional
/// ShardStep").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardStep {
    shard_type: ShardKind,
    sub_type: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShardKind {
    Yearly,
    Monthly,
    Weekly,
}

impl ShardStep {
    pub fn create(shard_type: &str, sub_type: &str) -> Result<ShardStep> {
        let shard_type = match shard_type {
            "yearly" => ShardKind::Yearly,
            "monthly" => ShardKind::Monthly,
            "weekly" => ShardKind::Weekly,
            other => return Err(Error::UnknownShardStep(other.to_string())),
        };
        Ok(ShardStep { shard_type, sub_type: sub_type.to_string() })
    }

    /// The shard-level path component, which never includes the substep.
    pub fn shard_path(&self, time: &Time) -> String {
        match self.shard_type {
            ShardKind::Yearly => format!("{:04}", time.ye),
            ShardKind::Monthly => format!("{:04}-{:02}", time.ye, time.mo),
            ShardKind::Weekly => format!("{:04}-{:02}-{}", time.ye, time.mo, (time.da - 1) / 7 + 1),
        }
    }

    /// The per-shard step for `time`'s year, used to place records inside
    /// the shard once it is known (paths under it omit the year).
    pub fn substep(&self, time: &Time) -> Result<Step> {
        let year = time.ye;
        match self.sub_type.as_str() {
            "daily" => Ok(Step::SubDaily { year }),
            "weekly" => Ok(Step::SubWeekly { year }),
            "monthly" => Ok(Step::SubMonthly { year }),
            "yearly" => Ok(Step::Yearly),
            other => Err(Error::UnknownStep(other.to_string())),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn yearly_shard_path() {
        let s = ShardStep::create("yearly", "monthly").unwrap();
        assert_eq!(s.shard_path(&Time::new(2007, 3, 1, 0, 0, 0)), "2007");
        let sub = s.substep(&Time::new(2007, 3, 1, 0, 0, 0)).unwrap();
        assert_eq!(sub.path(&Time::new(2007, 3, 15, 0, 0, 0)), "03");
    }

    #[test]
    fn weekly_shard_path() {
        let s = ShardStep::create("weekly", "daily").unwrap();
        assert_eq!(s.shard_path(&Time::new(2007, 3, 8, 0, 0, 0)), "2007-03-2");
    }

    #[test]
    fn unknown_shard_kind_errors() {
        assert!(ShardStep::create("fortnightly", "daily").is_err());
    }
}
