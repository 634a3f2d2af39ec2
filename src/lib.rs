//! Dashboard data and view-state controller for cognitive-health
//! assessments.
//!
//! Resolves which records a view should show from navigation parameters,
//! drives the independent profile/assessment/explanation fetchers, derives
//! display metrics, schedules auto-refresh, and runs export/share side
//! effects. The controller itself is a pure reducer; everything effectful
//! lives behind traits.

pub mod config;
pub mod controller;
pub mod error;
pub mod export;
pub mod logging;
pub mod metrics;
pub mod query;
pub mod records;
pub mod service;
