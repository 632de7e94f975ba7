//! Team repository contract and SQLite implementation.
//!
//! # Invariants
//! - Team names are unique in storage; a duplicate is `ConstraintViolation`.
//! - Deleting a team still referenced by members is `ConstraintViolation`;
//!   deletes never cascade to members.

use super::schema::{ensure_connection_ready, TEAM_COLUMNS};
use super::{count_to_u64, CrudRepository, RepoError, RepoResult};
use crate::model::team::{Team, TeamId};
use crate::model::Entity;
use log::debug;
use rusqlite::{params, Connection, OptionalExtension, Row};

const TEAM_SELECT_SQL: &str = "SELECT id, name FROM team";

/// Team-specific finders on top of the CRUD contract.
pub trait TeamRepository: CrudRepository<Entity = Team> {
    fn find_by_name(&self, name: &str) -> RepoResult<Option<Team>>;
}

/// SQLite-backed team repository.
pub struct SqliteTeamRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTeamRepository<'conn> {
    /// Creates a repository from a migrated connection or transaction.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &[("team", TEAM_COLUMNS)])?;
        Ok(Self { conn })
    }
}

impl CrudRepository for SqliteTeamRepository<'_> {
    type Entity = Team;

    fn save(&self, team: &mut Team) -> RepoResult<TeamId> {
        team.validate()?;

        match team.id() {
            None => {
                self.conn
                    .execute("INSERT INTO team (name) VALUES (?1);", [team.name.as_str()])?;
                let id = self.conn.last_insert_rowid();
                team.assign_id(id);
                debug!("event=team_save module=repo status=ok op=insert team_id={id}");
                Ok(id)
            }
            Some(id) => {
                let changed = self.conn.execute(
                    "UPDATE team SET name = ?1 WHERE id = ?2;",
                    params![team.name.as_str(), id],
                )?;
                if changed == 0 {
                    return Err(RepoError::NotFound {
                        entity: Team::NAME,
                        id,
                    });
                }
                debug!("event=team_save module=repo status=ok op=update team_id={id}");
                Ok(id)
            }
        }
    }

    fn find_by_id(&self, id: TeamId) -> RepoResult<Option<Team>> {
        let team = self
            .conn
            .query_row(
                &format!("{TEAM_SELECT_SQL} WHERE id = ?1;"),
                [id],
                parse_team_row,
            )
            .optional()?;
        Ok(team)
    }

    fn find_all(&self) -> RepoResult<Vec<Team>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TEAM_SELECT_SQL} ORDER BY id ASC;"))?;
        let teams = stmt
            .query_map([], parse_team_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(teams)
    }

    fn delete_by_id(&self, id: TeamId) -> RepoResult<()> {
        let changed = self.conn.execute("DELETE FROM team WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: Team::NAME,
                id,
            });
        }
        debug!("event=team_delete module=repo status=ok team_id={id}");
        Ok(())
    }

    fn count(&self) -> RepoResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM team;", [], |row| row.get(0))?;
        count_to_u64(count)
    }
}

impl TeamRepository for SqliteTeamRepository<'_> {
    fn find_by_name(&self, name: &str) -> RepoResult<Option<Team>> {
        let team = self
            .conn
            .query_row(
                &format!("{TEAM_SELECT_SQL} WHERE name = ?1;"),
                [name],
                parse_team_row,
            )
            .optional()?;
        Ok(team)
    }
}

fn parse_team_row(row: &Row<'_>) -> rusqlite::Result<Team> {
    Ok(Team::restore(row.get("id")?, row.get("name")?))
}
