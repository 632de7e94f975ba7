//! Core persistence layer for roster: members, teams and their repositories.
//!
//! Entities map onto SQLite rows through explicit repositories; filtering is
//! expressed as `MemberQuery` values, paging through `PageRequest`/`Page`, and
//! audit metadata is stamped by an explicit `Auditor` on every save.

pub mod db;
pub mod logging;
pub mod model;
pub mod paging;
pub mod repo;

pub use logging::{default_log_level, init_logging, logging_status, LoggingConfig, LoggingError};
pub use model::audit::{AuditFields, Auditor, Clock, ManualClock, SystemClock};
pub use model::dto::MemberDto;
pub use model::member::{Member, MemberId, TeamRef};
pub use model::team::{Team, TeamId};
pub use model::{Entity, ValidationError};
pub use paging::{Direction, Order, Page, PageRequest, PagingError, Sort, SortField, MAX_PAGE_SIZE};
pub use repo::member_custom::MemberRepositoryCustom;
pub use repo::member_repo::{MemberRepository, SqliteMemberRepository};
pub use repo::query::{MemberField, MemberQuery, UnknownField};
pub use repo::team_repo::{SqliteTeamRepository, TeamRepository};
pub use repo::{CrudRepository, RepoError, RepoResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
