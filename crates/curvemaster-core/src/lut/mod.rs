//! 3D color lookup tables built from tone curves.
//!
//! A [`Lut3D`] maps every vertex of an `S x S x S` grid over the RGB unit
//! cube to an output triple. Builds are `O(S^3)` and happen only when curves
//! change; sampling is trilinear and allocation-free.
//!
//! # Module Structure
//!
//! - `lut3d` - Grid storage and construction from [`ChannelCurves`]
//! - `trilinear` - Sampling between grid vertices
//! - `tetrahedral` - Tetrahedral sampling and [`LutInterpolation`]
//! - [`cube`] - Adobe/Resolve `.cube` text format

pub mod cube;
mod lut3d;
mod tetrahedral;
mod trilinear;

pub use lut3d::{
    Channel, ChannelCurves, Lut3D, DEFAULT_RESOLUTION, MAX_RESOLUTION, MIN_RESOLUTION,
};
pub use tetrahedral::LutInterpolation;

use thiserror::Error;

/// Errors from LUT construction and `.cube` I/O.
#[derive(Debug, Error)]
pub enum LutError {
    /// Grid resolution outside the supported range.
    #[error("Invalid LUT resolution {0} (expected {min}-{max})", min = MIN_RESOLUTION, max = MAX_RESOLUTION)]
    InvalidResolution(usize),

    /// Entry count does not match `resolution^3`.
    #[error("LUT data has {got} entries, expected {expected}")]
    DataLength { expected: usize, got: usize },

    /// Malformed `.cube` content.
    #[error("Parse error on line {line}: {message}")]
    Parse { line: usize, message: String },

    /// `.cube` file without a `LUT_3D_SIZE` header.
    #[error("Missing LUT_3D_SIZE header")]
    MissingSize,

    /// Valid `.cube` content this crate does not handle.
    #[error("Unsupported LUT: {0}")]
    Unsupported(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for LUT operations.
pub type LutResult<T> = Result<T, LutError>;
