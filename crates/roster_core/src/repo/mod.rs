//! Repository layer: CRUD contract, query specifications and SQLite
//! implementations.
//!
//! # Responsibility
//! - Define the generic `CrudRepository` contract shared by every entity.
//! - Isolate SQL details from callers.
//! - Classify storage failures into semantic errors once, at this boundary.
//!
//! # Invariants
//! - Write paths validate the entity before any SQL mutation.
//! - Lookup misses are `Ok(None)`; `NotFound` is reserved for writes and
//!   deletes that target a missing identity.

use crate::db::DbError;
use crate::model::{Entity, ValidationError};
use crate::paging::PagingError;
use rusqlite::ErrorCode;
use thiserror::Error;

pub mod member_custom;
pub mod member_repo;
pub mod query;
mod schema;
pub mod team_repo;

pub type RepoResult<T> = Result<T, RepoError>;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: i64 },
    #[error("{0} has no identity yet; save it first")]
    TransientEntity(&'static str),
    #[error("member was assigned a team that had no identity yet; save the team, then assign it")]
    TransientReference,
    #[error("expected at most {expected} result(s), got {actual}")]
    NonUniqueResult { expected: usize, actual: usize },
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),
    #[error("storage unavailable: {0}")]
    ConnectionFailure(String),
    #[error(transparent)]
    Paging(#[from] PagingError),
    #[error("invalid persisted data: {0}")]
    InvalidData(String),
    #[error("repository requires schema version {expected_version}, got {actual_version}")]
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    #[error("repository requires table `{0}`")]
    MissingRequiredTable(&'static str),
    #[error("repository requires column `{column}` in table `{table}`")]
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    #[error(transparent)]
    Db(DbError),
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        match value.sqlite_error_code() {
            Some(ErrorCode::ConstraintViolation) => Self::ConstraintViolation(value.to_string()),
            Some(ErrorCode::CannotOpen | ErrorCode::NotADatabase | ErrorCode::SystemIoFailure) => {
                Self::ConnectionFailure(value.to_string())
            }
            _ => Self::Db(DbError::Sqlite(value)),
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        match value {
            DbError::Sqlite(err) => Self::from(err),
            other => Self::Db(other),
        }
    }
}

/// Generic persistence contract for one entity type.
pub trait CrudRepository {
    type Entity: Entity;

    /// Inserts a transient entity or updates a persisted one.
    ///
    /// On insert the generated identity is written back into `entity`.
    ///
    /// # Errors
    /// - `Validation` when the entity is rejected before SQL runs.
    /// - `NotFound` when updating an identity that no longer exists.
    /// - `ConstraintViolation` / `ConnectionFailure` from storage.
    fn save(&self, entity: &mut Self::Entity) -> RepoResult<<Self::Entity as Entity>::Id>;

    fn find_by_id(&self, id: <Self::Entity as Entity>::Id) -> RepoResult<Option<Self::Entity>>;

    /// All rows in storage order (ascending identity).
    fn find_all(&self) -> RepoResult<Vec<Self::Entity>>;

    /// Removes by identity. Deleting an absent row is `NotFound`.
    fn delete_by_id(&self, id: <Self::Entity as Entity>::Id) -> RepoResult<()>;

    fn count(&self) -> RepoResult<u64>;

    /// Removes the entity by its identity.
    ///
    /// # Errors
    /// - `TransientEntity` when the entity was never saved.
    /// - `NotFound` when it was already removed.
    fn delete(&self, entity: &Self::Entity) -> RepoResult<()> {
        let id = entity
            .id()
            .ok_or(RepoError::TransientEntity(<Self::Entity as Entity>::NAME))?;
        self.delete_by_id(id)
    }

    fn exists_by_id(&self, id: <Self::Entity as Entity>::Id) -> RepoResult<bool> {
        Ok(self.find_by_id(id)?.is_some())
    }
}

pub(crate) fn count_to_u64(value: i64) -> RepoResult<u64> {
    u64::try_from(value).map_err(|_| RepoError::InvalidData(format!("negative row count {value}")))
}
