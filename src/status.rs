//! Status categories, uptime classification and their display styles

use serde::{Deserialize, Serialize};

/// Uptime at or above this is operational.
pub const OPERATIONAL_THRESHOLD: f64 = 95.0;
/// Uptime at or above this (and below operational) is degraded.
pub const DEGRADED_THRESHOLD: f64 = 80.0;
/// Uptime at or above this (and below degraded) is a partial outage.
pub const PARTIAL_OUTAGE_THRESHOLD: f64 = 50.0;

/// Severity of a service or of a single time slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum Status {
    Operational,
    Degraded,
    PartialOutage,
    MajorOutage,
    /// Display default for a service or slot with no data at all
    #[default]
    Unknown,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Operational => "operational",
            Status::Degraded => "degraded",
            Status::PartialOutage => "partial_outage",
            Status::MajorOutage => "major_outage",
            Status::Unknown => "unknown",
        }
    }

    /// Human readable label shown next to status dots and in legends.
    pub fn label(&self) -> &'static str {
        match self {
            Status::Operational => "Operational",
            Status::Degraded => "Degraded",
            Status::PartialOutage => "Partial Outage",
            Status::MajorOutage => "Major Outage",
            Status::Unknown => "No Data",
        }
    }

    /// Ordering used when several slots are summarised by one.
    pub fn severity(&self) -> u8 {
        match self {
            Status::Operational => 0,
            Status::Unknown => 1,
            Status::Degraded => 2,
            Status::PartialOutage => 3,
            Status::MajorOutage => 4,
        }
    }

    /// CSS modifier used for bars, dots and label text.
    pub fn css_class(&self) -> &'static str {
        match self {
            Status::Operational => "operational",
            Status::Degraded => "degraded",
            Status::PartialOutage => "partial-outage",
            Status::MajorOutage => "major-outage",
            Status::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Status {
    fn from(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "operational" => Status::Operational,
            "degraded" => Status::Degraded,
            "partial_outage" => Status::PartialOutage,
            "major_outage" => Status::MajorOutage,
            _ => Status::Unknown,
        }
    }
}

impl From<String> for Status {
    fn from(s: String) -> Self {
        Status::from(s.as_str())
    }
}

/// Map an uptime percentage onto one of the four severity tiers.
///
/// Never returns [`Status::Unknown`]; that category only exists for slots
/// without any data.
pub fn classify(uptime: f64) -> Status {
    if uptime >= OPERATIONAL_THRESHOLD {
        Status::Operational
    } else if uptime >= DEGRADED_THRESHOLD {
        Status::Degraded
    } else if uptime >= PARTIAL_OUTAGE_THRESHOLD {
        Status::PartialOutage
    } else {
        Status::MajorOutage
    }
}

/// The four overall states the banner knows how to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverallStatus {
    AllOperational,
    MinorDisruption,
    PartialOutage,
    MajorOutage,
}

/// Text used when a snapshot has no services to judge.
pub const NO_DATA_TEXT: &str = "No Data";

impl OverallStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OverallStatus::AllOperational => "All Systems Operational",
            OverallStatus::MinorDisruption => "Minor Service Disruption",
            OverallStatus::PartialOutage => "Partial System Outage",
            OverallStatus::MajorOutage => "Major System Outage",
        }
    }

    /// Recognise one of the four banner texts. Anything else is `None`.
    pub fn from_text(text: &str) -> Option<Self> {
        match text.trim() {
            "All Systems Operational" => Some(OverallStatus::AllOperational),
            "Minor Service Disruption" => Some(OverallStatus::MinorDisruption),
            "Partial System Outage" => Some(OverallStatus::PartialOutage),
            "Major System Outage" => Some(OverallStatus::MajorOutage),
            _ => None,
        }
    }

    /// Derive the overall state from the current state of every service.
    ///
    /// Returns `None` when there is nothing to judge.
    pub fn derive<I>(statuses: I) -> Option<Self>
    where
        I: IntoIterator<Item = Status>,
    {
        let (mut total, mut major, mut partial, mut degraded) = (0usize, 0usize, 0usize, 0usize);
        for status in statuses {
            total += 1;
            match status {
                Status::MajorOutage => major += 1,
                Status::PartialOutage => partial += 1,
                Status::Degraded => degraded += 1,
                Status::Operational | Status::Unknown => {}
            }
        }

        if total == 0 {
            return None;
        }

        // At least two services, and never less than a fifth of the fleet.
        let widespread = |count: usize| count as f64 >= f64::max(2.0, total as f64 * 0.2);

        let overall = if widespread(major) {
            OverallStatus::MajorOutage
        } else if major >= 1 || widespread(partial) {
            OverallStatus::PartialOutage
        } else if partial >= 1 || degraded >= 1 {
            OverallStatus::MinorDisruption
        } else {
            OverallStatus::AllOperational
        };

        Some(overall)
    }

    pub fn banner(&self) -> BannerStyle {
        match self {
            OverallStatus::AllOperational => BannerStyle { icon: "\u{2713}", css_class: "operational" },
            OverallStatus::MinorDisruption => BannerStyle { icon: "!", css_class: "degraded" },
            OverallStatus::PartialOutage => BannerStyle { icon: "!", css_class: "partial-outage" },
            OverallStatus::MajorOutage => BannerStyle { icon: "\u{2715}", css_class: "major-outage" },
        }
    }
}

/// Visual preset for the overall banner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BannerStyle {
    pub icon: &'static str,
    pub css_class: &'static str,
}

impl BannerStyle {
    /// Style for an arbitrary banner text; unrecognised texts get the
    /// all-operational preset.
    pub fn for_text(text: &str) -> Self {
        OverallStatus::from_text(text)
            .unwrap_or(OverallStatus::AllOperational)
            .banner()
    }
}
