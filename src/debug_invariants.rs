//! Structural invariant checks for the adjacency and classification arenas.
//!
//! Checks run in debug builds, or in release builds with the
//! `check-invariants` / `strict-invariants` features.

use crate::mesh_error::MeshHaloError;

/// Trait for validating data structure invariants.
pub trait DebugInvariants {
    /// Assert invariants when invariant checking is enabled.
    fn debug_assert_invariants(&self);
    /// Validate invariants and return the first violation encountered.
    fn validate_invariants(&self) -> Result<(), MeshHaloError>;
}

/// Return [`MeshHaloError::InvariantViolation`] from the enclosing function
/// unless `cond` holds.
#[macro_export]
macro_rules! ensure_invariant {
    ($cond:expr, $($fmt:tt)+) => {
        if !$cond {
            return Err($crate::mesh_error::MeshHaloError::InvariantViolation(format!($($fmt)+)));
        }
    };
}

/// Run a fallible check and panic on error when invariant checking is enabled.
#[macro_export]
macro_rules! debug_invariants {
    ($expr:expr, $ctx:expr) => {
        #[cfg(any(debug_assertions, feature = "strict-invariants", feature = "check-invariants"))]
        if let Err(e) = $expr {
            panic!("[invariants] {}: {}", $ctx, e);
        }
    };
}
