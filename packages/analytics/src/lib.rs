#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Pure transforms from backend payloads to chart-ready series.
//!
//! Everything here is a single pass over already-aggregated data:
//!
//! * [`histogram`] merges the observed and predicted speed-change
//!   distributions into one aligned, numerically ordered bar series.
//! * [`trend`] pairs observed/predicted speed snapshots, averages them per
//!   clock time, and extracts the series for one selected sensor.
//! * [`proximity`] narrows snapshots to sensors within a radius of the
//!   collision.

pub mod histogram;
pub mod proximity;
pub mod trend;

pub use histogram::{label_buckets, parse_lower_bound, reconcile, reconcile_histogram};
pub use proximity::{distance_km, filter_by_radius};
pub use trend::{
    aggregate_by_time, compare_averages, compare_location, filter_by_location, pair_snapshots,
};
