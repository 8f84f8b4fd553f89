//! Aligning fetched slot records with generated local slots

use crate::slots::{Granularity, Slot, canonical_utc_key};
use crate::snapshot::SlotRecord;
use crate::status::{Status, classify};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// How a slot without any record is drawn. Applied to every chart alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoDataPolicy {
    /// Missing data is drawn as full uptime
    #[default]
    AssumeOperational,
    /// Missing data is drawn in the neutral "No Data" colour
    Unknown,
}

impl NoDataPolicy {
    pub fn status(&self) -> Status {
        match self {
            NoDataPolicy::AssumeOperational => Status::Operational,
            NoDataPolicy::Unknown => Status::Unknown,
        }
    }
}

impl std::str::FromStr for NoDataPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "operational" | "assume_operational" => Ok(NoDataPolicy::AssumeOperational),
            "unknown" | "no_data" => Ok(NoDataPolicy::Unknown),
            other => Err(format!("unknown no-data policy '{}'", other)),
        }
    }
}

/// The content of one generated slot after reconciliation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SlotCell<'a> {
    Observed(&'a SlotRecord),
    NoData,
}

impl<'a> SlotCell<'a> {
    pub fn record(&self) -> Option<&'a SlotRecord> {
        match *self {
            SlotCell::Observed(record) => Some(record),
            SlotCell::NoData => None,
        }
    }

    pub fn status(&self, policy: NoDataPolicy) -> Status {
        match *self {
            SlotCell::Observed(record) => classify(record.uptime),
            SlotCell::NoData => policy.status(),
        }
    }
}

/// Produce one cell per generated slot, in slot order.
///
/// UTC-keyed records are matched against each slot's UTC key, so two slots
/// sharing a local key across a DST fall-back keep their own records.
/// Records whose key cannot be parsed are ignored.
pub fn reconcile<'a>(records: &'a [SlotRecord], slots: &[Slot], granularity: Granularity) -> Vec<SlotCell<'a>> {
    let mut by_key: HashMap<String, &'a SlotRecord> = HashMap::with_capacity(records.len());

    for record in records {
        let key = if granularity.is_utc_keyed() {
            match canonical_utc_key(&record.date) {
                Some(key) => key,
                None => {
                    debug!("Skipping slot record with unparseable key: {}", record.date);
                    continue;
                }
            }
        } else {
            record.date.trim().to_string()
        };
        by_key.insert(key, record);
    }

    slots
        .iter()
        .map(|slot| match by_key.get(slot.lookup_key()) {
            Some(&record) => SlotCell::Observed(record),
            None => SlotCell::NoData,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slots::generate_slots;
    use chrono::{DateTime, FixedOffset, TimeZone};
    use chrono_tz::America::New_York;

    fn now(rfc3339: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(rfc3339).unwrap()
    }

    #[test]
    fn test_present_keys_map_to_records() {
        let now = now("2026-02-27T12:00:00+00:00");
        let slots = generate_slots(Granularity::Daily, 3, &now);
        let records = vec![
            SlotRecord::new("2026-02-25", 99.0, 1),
            SlotRecord::new("2026-02-27", 42.0, 17),
        ];

        let cells = reconcile(&records, &slots, Granularity::Daily);

        assert_eq!(cells.len(), 3);
        assert_eq!(cells[0], SlotCell::Observed(&records[0]));
        assert_eq!(cells[1], SlotCell::NoData);
        assert_eq!(cells[2], SlotCell::Observed(&records[1]));
    }

    #[test]
    fn test_records_outside_window_are_ignored() {
        let now = now("2026-02-27T12:00:00+00:00");
        let slots = generate_slots(Granularity::Daily, 2, &now);
        let records = vec![SlotRecord::new("2025-01-01", 10.0, 3)];

        let cells = reconcile(&records, &slots, Granularity::Daily);
        assert!(cells.iter().all(|c| *c == SlotCell::NoData));
    }

    #[test]
    fn test_empty_records_yield_no_data() {
        let now = now("2026-02-27T12:00:00+00:00");
        let slots = generate_slots(Granularity::Hourly, 1, &now);

        let cells = reconcile(&[], &slots, Granularity::Hourly);
        assert_eq!(cells.len(), 24);
        assert!(cells.iter().all(|c| c.record().is_none()));
    }

    #[test]
    fn test_quarter_records_converted_from_utc() {
        // UTC-5: 02:15 UTC on March 1st is 21:15 local on February 28th
        let now = now("2026-02-28T21:20:00-05:00");
        let slots = generate_slots(Granularity::Quarter, 1, &now);
        let records = vec![
            SlotRecord::new("2026-03-01T02:15", 70.0, 4),
            SlotRecord::new("garbage", 0.0, 0),
        ];

        let cells = reconcile(&records, &slots, Granularity::Quarter);

        assert_eq!(slots.last().unwrap().key, "2026-02-28T21:15");
        assert_eq!(*cells.last().unwrap(), SlotCell::Observed(&records[0]));
        assert_eq!(cells.iter().filter(|c| c.record().is_some()).count(), 1);
    }

    #[test]
    fn test_quarter_records_kept_apart_across_fall_back() {
        let now = New_York.with_ymd_and_hms(2026, 11, 1, 3, 0, 0).unwrap();
        let slots = generate_slots(Granularity::Quarter, 1, &now);
        let records = vec![
            SlotRecord::new("2026-11-01T05:15", 10.0, 90),
            SlotRecord::new("2026-11-01T06:15", 100.0, 0),
        ];

        let cells = reconcile(&records, &slots, Granularity::Quarter);

        let matched: Vec<(&str, f64)> = slots
            .iter()
            .zip(&cells)
            .filter_map(|(slot, cell)| cell.record().map(|r| (slot.key.as_str(), r.uptime)))
            .collect();
        assert_eq!(matched, vec![("2026-11-01T01:15", 10.0), ("2026-11-01T01:15", 100.0)]);
        assert_eq!(cells.iter().filter(|c| c.status(NoDataPolicy::Unknown) == Status::MajorOutage).count(), 1);
    }

    #[test]
    fn test_cell_status_uses_policy_for_gaps() {
        let record = SlotRecord::new("2026-02-27", 85.0, 0);

        assert_eq!(SlotCell::Observed(&record).status(NoDataPolicy::Unknown), Status::Degraded);
        assert_eq!(SlotCell::NoData.status(NoDataPolicy::AssumeOperational), Status::Operational);
        assert_eq!(SlotCell::NoData.status(NoDataPolicy::Unknown), Status::Unknown);
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("operational".parse::<NoDataPolicy>(), Ok(NoDataPolicy::AssumeOperational));
        assert_eq!("UNKNOWN".parse::<NoDataPolicy>(), Ok(NoDataPolicy::Unknown));
        assert!("green".parse::<NoDataPolicy>().is_err());
    }
}
