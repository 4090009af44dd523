//! CLI command implementations.

pub mod common;
pub mod energy;
pub mod kernels;
pub mod run;
pub mod transform;
