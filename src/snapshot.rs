//! Status document data structures

use crate::slots::Granularity;
use crate::status::{NO_DATA_TEXT, OverallStatus, Status};
use serde::{Deserialize, Deserializer, Serialize};

/// One fetched status document. Replaced wholesale on every refresh.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct StatusSnapshot {
    #[serde(default, deserialize_with = "null_as_default")]
    pub overall_status: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub granularity: Granularity,
    #[serde(default, deserialize_with = "null_as_default")]
    pub services: Vec<ServiceStatus>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct ServiceStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub service_alias: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub service_title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub current_status: Status,
    #[serde(default, deserialize_with = "null_as_default")]
    pub uptime_90d: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_requests_90d: Option<u64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub daily: Vec<SlotRecord>,
}

/// Measurements for one time bucket of one service
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct SlotRecord {
    #[serde(default, deserialize_with = "null_as_default")]
    pub date: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub uptime: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub server_error_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_requests: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_error_count: Option<u64>,
}

impl StatusSnapshot {
    /// Decode a status document, tolerating missing and `null` members.
    pub fn from_json(body: &[u8]) -> crate::Result<Self> {
        Ok(serde_json::from_slice(body)?)
    }

    /// Banner text: the document's own text, or one derived from the
    /// service states when the document carries none.
    pub fn overall_text(&self) -> String {
        if !self.overall_status.trim().is_empty() {
            return self.overall_status.clone();
        }

        OverallStatus::derive(self.services.iter().map(|s| s.current_status))
            .map(|overall| overall.as_str().to_string())
            .unwrap_or_else(|| NO_DATA_TEXT.to_string())
    }

    /// Services ordered by alias, ascending.
    pub fn sorted_services(&self) -> Vec<&ServiceStatus> {
        let mut services: Vec<&ServiceStatus> = self.services.iter().collect();
        services.sort_by(|a, b| a.service_alias.cmp(&b.service_alias));
        services
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

impl SlotRecord {
    pub fn new(date: impl Into<String>, uptime: f64, server_error_count: u64) -> Self {
        Self {
            date: date.into(),
            uptime,
            server_error_count,
            ..Default::default()
        }
    }

    pub fn with_requests(mut self, total_requests: u64) -> Self {
        self.total_requests = Some(total_requests);
        self
    }
}

impl ServiceStatus {
    pub fn new(alias: impl Into<String>, title: impl Into<String>, current_status: Status, uptime_90d: f64) -> Self {
        Self {
            service_alias: alias.into(),
            service_title: title.into(),
            current_status,
            uptime_90d,
            ..Default::default()
        }
    }

    pub fn with_slot(mut self, record: SlotRecord) -> Self {
        self.daily.push(record);
        self
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
