#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! View state for the dashboard's widgets.
//!
//! Each widget owns its state outright; nothing is shared between them.
//! Fetch results are applied through `apply_*` methods that log failures
//! with `log::error!` and keep the previous value, so one broken endpoint
//! never blanks another chart.

mod analyzer;
mod detail;
mod overview;

pub use analyzer::AnalyzerState;
pub use detail::{DetailSession, DetailSummary, SessionId};
pub use overview::OverviewState;
