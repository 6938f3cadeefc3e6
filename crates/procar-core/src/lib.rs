//! PROCAR band-structure analysis: parsing, projection weights, fatband
//! grouping and energy-window statistics.

pub mod common;
pub mod domain;
pub mod modules;
pub mod numerics;
