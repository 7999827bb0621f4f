//! Core foundation layer.
//!
//! Bottom layer of the console engine with no internal dependencies.
//!
//! # Contents
//!
//! - [`types`]: Points, planar poses and rigid transforms
//! - [`math`]: Gesture heading helper

pub mod math;
pub mod types;
