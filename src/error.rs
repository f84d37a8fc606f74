//! Error types for the RCCSD solver.
//!
//! Only inconsistent inputs are fatal. Non-convergence, small denominators and
//! singular DIIS systems are reported as [`CCSDDiagnostic`](crate::structs::CCSDDiagnostic)
//! values on the result instead.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RCCSDError {
    /// A tensor does not have the shape implied by the occupied/virtual dimensions.
    #[error("Dimension mismatch for {name}: expected {expected:?}, got {actual:?}")]
    DimensionMismatch { name: String, expected: Vec<usize>, actual: Vec<usize> },

    /// Prior-solve amplitudes do not fit into the top-left block of the current space.
    #[error("Guess amplitudes ({guess_nocc} occ, {guess_nvir} vir) do not fit into ({nocc} occ, {nvir} vir)")]
    GuessTooLarge { guess_nocc: usize, guess_nvir: usize, nocc: usize, nvir: usize },

    /// Frozen orbital counts leave an empty occupied or virtual space.
    #[error("Cannot freeze {frozen} orbitals out of {total} in the {space} space")]
    FrozenTooMany { space: &'static str, frozen: usize, total: usize },

    /// Invalid solver configuration
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read npy file {path}: {message}")]
    Npy { path: String, message: String },
}

/// Result type for RCCSD operations
pub type Result<T> = std::result::Result<T, RCCSDError>;
