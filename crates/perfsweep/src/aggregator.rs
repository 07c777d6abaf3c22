//! Aggregation of repeated trials.
//!
//! Reduces a [`ProfileSet`] to a per-counter mean ([`AggregateSummary`]) and
//! keeps the raw per-trial values alongside it ([`DetailReport`]) as the
//! audit trail behind every mean.

use crate::collector::ProfileSet;
use crate::result::{HarnessError, HarnessResult};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Per-counter floor mean across all trials
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateSummary {
    means: Vec<(String, i64)>,
    trials: usize,
}

impl AggregateSummary {
    /// Ordered `(key, mean)` pairs
    #[must_use]
    pub fn means(&self) -> &[(String, i64)] {
        &self.means
    }

    /// Mean for one counter
    #[must_use]
    pub fn get(&self, key: &str) -> Option<i64> {
        self.means.iter().find(|(k, _)| k == key).map(|(_, v)| *v)
    }

    /// Keys in first-trial order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.means.iter().map(|(k, _)| k.as_str())
    }

    /// Number of trials behind the means
    #[must_use]
    pub const fn trials(&self) -> usize {
        self.trials
    }
}

/// Raw per-trial values for every counter, index-aligned with trial order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailReport {
    series: Vec<(String, Vec<i64>)>,
}

impl DetailReport {
    /// Ordered `(key, values)` pairs
    #[must_use]
    pub fn series(&self) -> &[(String, Vec<i64>)] {
        &self.series
    }

    /// Values recorded for one counter
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&[i64]> {
        self.series
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_slice())
    }

    /// Number of counters
    #[must_use]
    pub fn len(&self) -> usize {
        self.series.len()
    }

    /// True when the report has no counters
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

impl Serialize for DetailReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.series.len()))?;
        for (key, values) in &self.series {
            map.serialize_entry(key, values)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for DetailReport {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct DetailVisitor;

        impl<'de> Visitor<'de> for DetailVisitor {
            type Value = DetailReport;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of counter names to integer arrays")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut series = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, values)) = access.next_entry::<String, Vec<i64>>()? {
                    series.push((key, values));
                }
                Ok(DetailReport { series })
            }
        }

        deserializer.deserialize_map(DetailVisitor)
    }
}

/// Reduce the collected trials.
///
/// Keys come from the first trial. Each mean is `floor(sum / N)`; counters
/// are whole-number event counts so the fractional part is dropped.
pub fn aggregate(accumulator: &ProfileSet) -> HarnessResult<(AggregateSummary, DetailReport)> {
    let Some(first) = accumulator.first() else {
        return Err(HarnessError::precondition(
            "cannot aggregate zero trials",
        ));
    };
    let count = accumulator.len();

    let mut means = Vec::with_capacity(first.len());
    let mut series = Vec::with_capacity(first.len());

    for key in first.keys() {
        let mut values = Vec::with_capacity(count);
        for (idx, trial) in accumulator.trials().iter().enumerate() {
            let value = trial.get(key).ok_or_else(|| {
                HarnessError::format(
                    "<trial profile>",
                    format!("trial {} is missing counter `{key}`", idx + 1),
                )
            })?;
            values.push(value);
        }

        let sum: i128 = values.iter().map(|v| i128::from(*v)).sum();
        let mean = sum.div_euclid(count as i128) as i64;

        means.push((key.to_string(), mean));
        series.push((key.to_string(), values));
    }

    Ok((
        AggregateSummary {
            means,
            trials: count,
        },
        DetailReport { series },
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::profile::Profile;
    use crate::ErrorKind;
    use proptest::prelude::*;

    fn set_of(trials: &[&[(&str, i64)]]) -> ProfileSet {
        let mut set = ProfileSet::new();
        for trial in trials {
            set.push(Profile::from_counters(trial.iter().copied())).unwrap();
        }
        set
    }

    #[test]
    fn test_three_trial_mean() {
        let set = set_of(&[&[("hits", 10)], &[("hits", 20)], &[("hits", 30)]]);
        let (summary, detail) = aggregate(&set).unwrap();

        assert_eq!(summary.get("hits"), Some(20));
        assert_eq!(summary.trials(), 3);
        assert_eq!(detail.get("hits"), Some(&[10, 20, 30][..]));
    }

    #[test]
    fn test_mean_truncates() {
        let set = set_of(&[&[("hits", 1)], &[("hits", 2)]]);
        let (summary, _) = aggregate(&set).unwrap();
        assert_eq!(summary.get("hits"), Some(1));
    }

    #[test]
    fn test_mean_floors_negative_sums() {
        let set = set_of(&[&[("delta", -1)], &[("delta", -2)]]);
        let (summary, _) = aggregate(&set).unwrap();
        assert_eq!(summary.get("delta"), Some(-2));
    }

    #[test]
    fn test_keys_follow_first_trial() {
        let set = set_of(&[&[("b", 1), ("a", 2)], &[("a", 4), ("b", 3)]]);
        let (summary, detail) = aggregate(&set).unwrap();
        assert_eq!(summary.keys().collect::<Vec<_>>(), ["b", "a"]);
        assert_eq!(detail.get("a"), Some(&[2, 4][..]));
    }

    #[test]
    fn test_single_trial_is_identity() {
        let set = set_of(&[&[("hits", 7), ("misses", 3)]]);
        let (summary, _) = aggregate(&set).unwrap();
        assert_eq!(summary.get("hits"), Some(7));
        assert_eq!(summary.get("misses"), Some(3));
    }

    #[test]
    fn test_empty_set_is_precondition_error() {
        let err = aggregate(&ProfileSet::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Precondition);
    }

    #[test]
    fn test_large_values_do_not_overflow() {
        let set = set_of(&[&[("big", i64::MAX)], &[("big", i64::MAX)]]);
        let (summary, _) = aggregate(&set).unwrap();
        assert_eq!(summary.get("big"), Some(i64::MAX));
    }

    proptest! {
        #[test]
        fn prop_summary_is_floor_mean(
            rows in prop::collection::vec(
                prop::collection::vec(-1_000_000i64..1_000_000, 3),
                1..12,
            )
        ) {
            let keys = ["alpha", "beta", "gamma"];
            let mut set = ProfileSet::new();
            for row in &rows {
                set.push(Profile::from_counters(keys.iter().copied().zip(row.iter().copied())))
                    .unwrap();
            }

            let (summary, detail) = aggregate(&set).unwrap();
            prop_assert_eq!(summary.keys().collect::<Vec<_>>(), keys.to_vec());

            for (col, key) in keys.iter().enumerate() {
                let column: Vec<i64> = rows.iter().map(|r| r[col]).collect();
                let sum: i64 = column.iter().sum();
                let expected = sum.div_euclid(rows.len() as i64);
                prop_assert_eq!(summary.get(key), Some(expected));
                prop_assert_eq!(detail.get(key), Some(column.as_slice()));
            }
        }
    }
}
