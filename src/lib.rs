//! Status Page Renderer Library
//!
//! Fetches service status documents for a selectable day range and renders
//! them as a status dashboard: an overall banner plus one card per service
//! with a per-slot uptime bar chart.

pub mod config;
pub mod controller;
pub mod errors;
pub mod reconcile;
pub mod render;
pub mod server;
pub mod slots;
pub mod snapshot;
pub mod source;
pub mod status;
pub mod theme;

pub use config::Config;
pub use controller::{DashboardController, RefreshOutcome, ViewState};
pub use errors::{Result, StatusPageError};
pub use reconcile::{NoDataPolicy, SlotCell};
pub use render::{RenderOptions, Renderer};
pub use slots::{Granularity, Slot};
pub use snapshot::{ServiceStatus, SlotRecord, StatusSnapshot};
pub use source::{FileSource, HttpSource, StatusSource};
pub use status::{OverallStatus, Status};
pub use theme::{Theme, ThemeChoice, ThemeController};
