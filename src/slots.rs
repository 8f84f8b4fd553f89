//! Time slot generation and slot key conversion
//!
//! Slots are the x-axis of every uptime chart. Daily and hourly slot keys are
//! local wall-clock keys; the sub-hour and multi-hour buckets produced by the
//! status generator are keyed in UTC on epoch-aligned boundaries and must be
//! converted before they can be matched against local slots.

use chrono::{DateTime, Days, DurationRound, NaiveDateTime, NaiveTime, TimeDelta, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

const DAY_KEY_FORMAT: &str = "%Y-%m-%d";
const HOUR_KEY_FORMAT: &str = "%Y-%m-%dT%H:00";
const MINUTE_KEY_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Width of the slots a snapshot was bucketed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum Granularity {
    #[default]
    #[serde(rename = "daily")]
    Daily,
    #[serde(rename = "hourly")]
    Hourly,
    #[serde(rename = "quarter")]
    Quarter,
    #[serde(rename = "2hour")]
    TwoHour,
    #[serde(rename = "8hour")]
    EightHour,
}

impl From<&str> for Granularity {
    fn from(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "hourly" | "hour" => Granularity::Hourly,
            "quarter" | "15min" => Granularity::Quarter,
            "2hour" => Granularity::TwoHour,
            "8hour" => Granularity::EightHour,
            _ => Granularity::Daily,
        }
    }
}

impl From<String> for Granularity {
    fn from(s: String) -> Self {
        Granularity::from(s.as_str())
    }
}

impl Granularity {
    /// Number of slots shown for this granularity. Only daily charts depend
    /// on the requested day count.
    pub fn slot_count(&self, days: u32) -> usize {
        match self {
            Granularity::Daily => days.max(1) as usize,
            Granularity::Hourly => 24,
            Granularity::Quarter => 96,
            Granularity::TwoHour => 84,
            Granularity::EightHour => 90,
        }
    }

    /// Width of a sub-day bucket. Daily slots are calendar days, not a fixed
    /// duration.
    pub fn bucket(&self) -> Option<TimeDelta> {
        match self {
            Granularity::Daily => None,
            Granularity::Hourly => Some(TimeDelta::hours(1)),
            Granularity::Quarter => Some(TimeDelta::minutes(15)),
            Granularity::TwoHour => Some(TimeDelta::hours(2)),
            Granularity::EightHour => Some(TimeDelta::hours(8)),
        }
    }

    /// Whether source records for this granularity are keyed in UTC.
    pub fn is_utc_keyed(&self) -> bool {
        matches!(self, Granularity::Quarter | Granularity::TwoHour | Granularity::EightHour)
    }

    pub fn key_format(&self) -> &'static str {
        match self {
            Granularity::Daily => DAY_KEY_FORMAT,
            Granularity::Hourly => HOUR_KEY_FORMAT,
            _ => MINUTE_KEY_FORMAT,
        }
    }
}

/// One generated slot: its local key, the local wall-clock time it starts
/// at and, for UTC-keyed granularities, the key records carry for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    pub key: String,
    pub start: NaiveDateTime,
    pub utc_key: Option<String>,
}

impl Slot {
    /// Short label used in tooltips and axis captions, e.g. `Feb 27` or
    /// `Feb 27, 14:15`.
    pub fn label(&self, granularity: Granularity) -> String {
        match granularity {
            Granularity::Daily => self.start.format("%b %-d").to_string(),
            _ => self.start.format("%b %-d, %H:%M").to_string(),
        }
    }
}

/// Produce the ordered slots (oldest first) of the trailing window ending at
/// `now`.
pub fn generate_slots<Tz>(granularity: Granularity, days: u32, now: &DateTime<Tz>) -> Vec<Slot>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let count = granularity.slot_count(days);

    let Some(bucket) = granularity.bucket() else {
        return daily_slots(count, now);
    };

    let tz = now.timezone();
    let anchor = if granularity.is_utc_keyed() {
        // Generator buckets are aligned on UTC epoch boundaries.
        let utc = now.with_timezone(&Utc);
        utc.duration_trunc(bucket).unwrap_or(utc).with_timezone(&tz)
    } else {
        now.clone().duration_trunc(bucket).unwrap_or_else(|_| now.clone())
    };

    (0..count)
        .rev()
        .filter_map(|steps| {
            let offset = bucket.checked_mul(steps as i32)?;
            anchor.clone().checked_sub_signed(offset)
        })
        .map(|start| Slot {
            key: start.format(granularity.key_format()).to_string(),
            start: start.naive_local(),
            utc_key: granularity
                .is_utc_keyed()
                .then(|| start.with_timezone(&Utc).format(MINUTE_KEY_FORMAT).to_string()),
        })
        .collect()
}

fn daily_slots<Tz: TimeZone>(count: usize, now: &DateTime<Tz>) -> Vec<Slot> {
    let today = now.date_naive();

    (0..count)
        .rev()
        .filter_map(|back| today.checked_sub_days(Days::new(back as u64)))
        .map(|date| Slot {
            key: date.format(DAY_KEY_FORMAT).to_string(),
            start: date.and_time(NaiveTime::MIN),
            utc_key: None,
        })
        .collect()
}

impl Slot {
    /// Key a source record must carry to land in this slot.
    pub fn lookup_key(&self) -> &str {
        self.utc_key.as_deref().unwrap_or(&self.key)
    }
}

/// Normalise a UTC minute key as written by the generator.
/// Returns `None` for keys that do not parse.
pub fn canonical_utc_key(key: &str) -> Option<String> {
    let naive = NaiveDateTime::parse_from_str(key.trim(), MINUTE_KEY_FORMAT).ok()?;
    Some(naive.format(MINUTE_KEY_FORMAT).to_string())
}

/// Convert a UTC minute key (`YYYY-MM-DDTHH:MM`) into the same instant's
/// local key in `tz`. Returns `None` for keys that do not parse.
pub fn utc_key_to_local<Tz>(key: &str, tz: &Tz) -> Option<String>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let naive = NaiveDateTime::parse_from_str(key.trim(), MINUTE_KEY_FORMAT).ok()?;
    let local = naive.and_utc().with_timezone(tz);
    Some(local.format(MINUTE_KEY_FORMAT).to_string())
}

/// Inverse of [`utc_key_to_local`]. Local times that do not exist (spring
/// forward gap) yield `None`; ambiguous ones resolve to the earlier instant.
pub fn local_key_to_utc<Tz: TimeZone>(key: &str, tz: &Tz) -> Option<String> {
    let naive = NaiveDateTime::parse_from_str(key.trim(), MINUTE_KEY_FORMAT).ok()?;
    let local = tz.from_local_datetime(&naive).earliest()?;
    Some(local.with_timezone(&Utc).format(MINUTE_KEY_FORMAT).to_string())
}
