//! Error taxonomy for the rendering pipeline.

use thiserror::Error;

/// All failures the library can report. Draw calls surface errors before
/// any pixel is written, so a failed call leaves the canvas unchanged.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// A segment operation (`line_to`, `curve_to`, ...) was issued before
    /// any `move_to` established a current point.
    #[error("path operation requires a current point (call move_to first)")]
    NoCurrentPoint,

    /// An operation was issued in a state that cannot accept it.
    #[error("invalid state: {0}")]
    InvalidState(&'static str),

    /// A matrix inverse was requested but the matrix is not invertible.
    #[error("matrix is singular and cannot be inverted")]
    SingularMatrix,

    /// A buffer allocation failed.
    #[error("out of memory")]
    OutOfMemory,

    /// No registered codec matches the data, or a pixel layout is not
    /// supported by the requested operation.
    #[error("unsupported format")]
    UnsupportedFormat,
}

pub type Result<T> = std::result::Result<T, Error>;
