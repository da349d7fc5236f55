//! Timing helpers for the planner and the tick systems.
//!
//! Only active with the `perf_stats` feature; otherwise they expand to nothing.

pub use gridwalk_macros::profile;
