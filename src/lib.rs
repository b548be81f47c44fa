//! Punch-clock time tracking through a terminal. Records sign-in/sign-out
//! sessions, aggregates them into calendar totals and trend series, and renders
//! the results as dashboards and SVG charts.
//!

pub mod aggregate;
pub mod cli;
pub mod geometry;
pub mod metrics;
pub mod punch;
pub mod store;
pub mod utils;
