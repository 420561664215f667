//! # parsum
//!
//! Partitioned parallel reduction: a fixed world of workers splits an
//! iteration space, each sums its slice, and one coordinator receives and
//! publishes the combined result.
//!
//! ## Usage
//!
//! ```bash
//! parsum -n 2 [-i iterations] [-w workers] [--coordinator rank] [-c parsum.toml]
//! ```
//!
//! ## Modules
//!
//! - `reduction` - Partitioner, worker kernel, collective reducer and the run engine
//! - `term` - Per-index term functions, including the zeta series term
//! - `sink` - Result sink and the tagged `HDF5:` result line format
//! - `quadrature` - Sparse-grid quadrature run through the same engine
//! - `config` - Layered run configuration (defaults, TOML, environment, CLI)
//! - `cli` - Command line front end
//! - `error` - Unified error type with codes and exit statuses
//! - `testing` - Test doubles for the result sink
pub mod cli;
pub mod config;
pub mod error;
pub mod quadrature;
pub mod reduction;
pub mod sink;
pub mod term;

pub mod testing;

pub use error::{ParsumError, Result};
