//! Shared utilities.
//!
//! Filesystem helpers used by the preparer, plus test doubles for the
//! engine seam.

pub mod fs;

#[cfg(test)]
pub mod testutil;
