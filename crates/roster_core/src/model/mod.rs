//! Entity model for members, teams and their read-side projections.
//!
//! # Responsibility
//! - Define the persisted records (`Member`, `Team`) and their audit metadata.
//! - Define the non-persistent `MemberDto` projection.
//!
//! # Invariants
//! - Identity is `None` until first persistence and assigned exactly once by a
//!   repository.
//! - Persisted entities compare by identity only.

use std::fmt::Display;
use thiserror::Error;

pub mod audit;
pub mod dto;
pub mod member;
pub mod team;

/// Common surface of persisted records.
pub trait Entity {
    /// Surrogate key type assigned by storage.
    type Id: Copy + Display;

    /// Short table-style name used in errors and log events.
    const NAME: &'static str;

    /// Returns the identity, or `None` for a transient entity.
    fn id(&self) -> Option<Self::Id>;

    /// Returns whether the next save must insert.
    fn is_new(&self) -> bool {
        self.id().is_none()
    }
}

/// Write-path validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("member username must not be blank")]
    BlankUsername,
    #[error("team name must not be blank")]
    BlankTeamName,
}
