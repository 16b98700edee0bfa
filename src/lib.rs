//! Snowflake growth on a hexagonal lattice.
//!
//! [`lattice::HexLattice`] runs the diffusion-limited growth automaton over a
//! hexagonal disc addressed by [`coord::Cube`] coordinates. [`render`] turns
//! the resulting water field into a colored hexagon mosaic and [`app`] wires
//! both into the `snowflake` binary.

pub mod app;
pub mod config;
pub mod coord;
pub mod error;
pub mod lattice;
pub mod render;

pub use coord::Cube;
pub use error::{ConfigError, LatticeError};
pub use lattice::{Cell, HexLattice, Params, Snapshot, StepReport};
