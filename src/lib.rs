//! Dense `f32` matrix multiplication benchmarked two ways: a serial triple
//! loop on the host and a compute kernel with one invocation per output
//! element on a wgpu device.

pub mod bench;
pub mod config;
pub mod cpu;
pub mod error;
pub mod gpu;
pub mod matrix;
pub mod timing;
pub mod verify;

pub use error::{Error, Result};
pub use matrix::{Matrix, Pattern};
