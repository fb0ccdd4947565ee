//! The aggregation pipeline.
//!
//! Each chart is described by a [`recipes::Recipe`]: rows are grouped and
//! reduced, ordered, optionally cut to the top ten, and normalized to
//! percentages when the dashboard is in percentage mode.

pub mod aggregate;
pub mod analyzer;
pub mod normalize;
pub mod rank;
pub mod recipes;
pub mod types;
pub mod utility;
