//! Member repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Map `Member` to and from `member` rows, including the team association.
//! - Execute `MemberQuery` specifications, pages and named queries.
//! - Invoke the audit hook exactly once per save.
//!
//! # Invariants
//! - The team row is only read when a query asked for it (`with_team`), in the
//!   same statement as the member row.
//! - Page content and total count are computed from the same filter.
//! - Updates never rewrite `created_at`/`created_by`.

use super::query::{MemberField, MemberQuery};
use super::schema::{ensure_connection_ready, MEMBER_COLUMNS, TEAM_COLUMNS};
use super::{count_to_u64, CrudRepository, RepoError, RepoResult};
use crate::model::audit::{AuditFields, Auditor};
use crate::model::dto::MemberDto;
use crate::model::member::{Member, MemberId, TeamRef};
use crate::model::team::{Team, TeamId};
use crate::model::Entity;
use crate::paging::{resolve_total, Page, PageRequest, Sort};
use log::debug;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

const MEMBER_COLUMNS_SQL: &str = "SELECT
    m.id AS id,
    m.username AS username,
    m.age AS age,
    m.team_id AS team_id,
    m.created_at AS created_at,
    m.created_by AS created_by,
    m.modified_at AS modified_at,
    m.modified_by AS modified_by";

const TEAM_NAME_COLUMN_SQL: &str = ",
    t.name AS team_name";

const FIND_MEMBER_SQL: &str = "SELECT
    m.id AS id,
    m.username AS username,
    m.age AS age,
    m.team_id AS team_id,
    m.created_at AS created_at,
    m.created_by AS created_by,
    m.modified_at AS modified_at,
    m.modified_by AS modified_by
FROM member m
WHERE m.username = ?1
  AND m.age = ?2
ORDER BY m.id ASC;";

const FIND_USERNAME_LIST_SQL: &str = "SELECT username FROM member ORDER BY id ASC;";

const FIND_MEMBER_DTO_SQL: &str = "SELECT
    m.username AS username,
    m.age AS age,
    t.id AS team_id,
    t.name AS team_name
FROM member m
INNER JOIN team t ON t.id = m.team_id
ORDER BY m.id ASC;";

const BULK_AGE_PLUS_SQL: &str = "UPDATE member SET age = age + 1 WHERE age >= ?1;";

/// Member finders on top of the CRUD contract.
///
/// Required methods touch SQL; provided methods are fixed `MemberQuery`
/// specifications.
pub trait MemberRepository: CrudRepository<Entity = Member> {
    /// Members matching `query`, ordered by its sort then identity.
    fn find(&self, query: &MemberQuery) -> RepoResult<Vec<Member>>;

    /// Number of members matching `query`. Sort and team loading are ignored.
    fn count_matching(&self, query: &MemberQuery) -> RepoResult<u64>;

    /// One page of members matching `query`.
    ///
    /// The request's sort wins over the query's sort when it is not empty.
    fn find_page(
        &self,
        query: &MemberQuery,
        request: &PageRequest<MemberField>,
    ) -> RepoResult<Page<Member>>;

    /// Named query: exact username and age.
    fn find_member(&self, username: &str, age: i32) -> RepoResult<Vec<Member>>;

    /// Named query: every username, storage order.
    fn find_username_list(&self) -> RepoResult<Vec<String>>;

    /// Projection query: members that belong to a team, as DTOs.
    fn find_member_dto(&self) -> RepoResult<Vec<MemberDto>>;

    /// Adds one year to every member at least `min_age` old.
    ///
    /// Runs as one statement; audit hooks do not fire for bulk updates.
    fn bulk_age_plus(&self, min_age: i32) -> RepoResult<usize>;

    fn find_by_username_and_age_greater_than(
        &self,
        username: &str,
        age: i32,
    ) -> RepoResult<Vec<Member>> {
        self.find(&MemberQuery::new().username_eq(username).age_gt(age))
    }

    /// Members whose username is in `names`, storage order.
    fn find_by_names<S: AsRef<str>>(&self, names: &[S]) -> RepoResult<Vec<Member>> {
        self.find(&MemberQuery::new().username_in(names.iter().map(|name| name.as_ref())))
    }

    /// Inverse side of the member-team association.
    fn find_by_team(&self, team_id: TeamId) -> RepoResult<Vec<Member>> {
        self.find(&MemberQuery::new().team_id_eq(team_id))
    }

    fn find_list_by_username(&self, username: &str) -> RepoResult<Vec<Member>> {
        self.find(&MemberQuery::new().username_eq(username))
    }

    /// Single optional result.
    ///
    /// # Errors
    /// - `NonUniqueResult` when more than one member has `username`.
    fn find_optional_by_username(&self, username: &str) -> RepoResult<Option<Member>> {
        let mut members = self.find_list_by_username(username)?;
        if members.len() > 1 {
            return Err(RepoError::NonUniqueResult {
                expected: 1,
                actual: members.len(),
            });
        }
        Ok(members.pop())
    }

    fn find_by_age(
        &self,
        age: i32,
        request: &PageRequest<MemberField>,
    ) -> RepoResult<Page<Member>> {
        self.find_page(&MemberQuery::new().age_eq(age), request)
    }

    /// Members with their team fetched in the same statement.
    fn find_all_with_team(&self) -> RepoResult<Vec<Member>> {
        self.find(&MemberQuery::new().with_team())
    }

    fn find_by_id_with_team(&self, id: MemberId) -> RepoResult<Option<Member>> {
        let mut members = self.find(&MemberQuery::new().with_team().id_eq(id))?;
        Ok(members.pop())
    }
}

/// SQLite-backed member repository.
pub struct SqliteMemberRepository<'conn> {
    pub(super) conn: &'conn Connection,
    auditor: Auditor,
}

impl<'conn> SqliteMemberRepository<'conn> {
    /// Creates a repository from a migrated connection or transaction.
    ///
    /// Saves are stamped by [`Auditor::system`] until another auditor is set.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &[("team", TEAM_COLUMNS), ("member", MEMBER_COLUMNS)])?;
        Ok(Self {
            conn,
            auditor: Auditor::system(),
        })
    }

    pub fn with_auditor(mut self, auditor: Auditor) -> Self {
        self.auditor = auditor;
        self
    }

    pub fn auditor(&self) -> &Auditor {
        &self.auditor
    }

    fn insert(
        &self,
        member: &Member,
        team_id: Option<TeamId>,
        audit: &AuditFields,
    ) -> RepoResult<MemberId> {
        self.conn.execute(
            "INSERT INTO member (
                username,
                age,
                team_id,
                created_at,
                created_by,
                modified_at,
                modified_by
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                member.username.as_str(),
                member.age,
                team_id,
                audit.created_at,
                audit.created_by.as_deref(),
                audit.modified_at,
                audit.modified_by.as_deref(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn update(
        &self,
        id: MemberId,
        member: &Member,
        team_id: Option<TeamId>,
        audit: &AuditFields,
    ) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE member
             SET
                username = ?1,
                age = ?2,
                team_id = ?3,
                modified_at = ?4,
                modified_by = ?5
             WHERE id = ?6;",
            params![
                member.username.as_str(),
                member.age,
                team_id,
                audit.modified_at,
                audit.modified_by.as_deref(),
                id,
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: Member::NAME,
                id,
            });
        }
        Ok(())
    }
}

impl CrudRepository for SqliteMemberRepository<'_> {
    type Entity = Member;

    fn save(&self, member: &mut Member) -> RepoResult<MemberId> {
        member.validate()?;
        let team_id = match member.team_ref() {
            Some(team) => Some(team.id().ok_or(RepoError::TransientReference)?),
            None => None,
        };

        let is_new = member.is_new();
        let mut audit = member.audit().clone();
        self.auditor.stamp(&mut audit, is_new);

        let id = match member.id() {
            None => {
                let id = self.insert(member, team_id, &audit)?;
                member.assign_id(id);
                id
            }
            Some(id) => {
                self.update(id, member, team_id, &audit)?;
                id
            }
        };
        *member.audit_mut() = audit;

        debug!(
            "event=member_save module=repo status=ok op={} member_id={id}",
            if is_new { "insert" } else { "update" }
        );
        Ok(id)
    }

    fn find_by_id(&self, id: MemberId) -> RepoResult<Option<Member>> {
        let mut members = self.find(&MemberQuery::new().id_eq(id))?;
        Ok(members.pop())
    }

    fn find_all(&self) -> RepoResult<Vec<Member>> {
        self.find(&MemberQuery::new())
    }

    fn delete_by_id(&self, id: MemberId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM member WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: Member::NAME,
                id,
            });
        }
        debug!("event=member_delete module=repo status=ok member_id={id}");
        Ok(())
    }

    fn count(&self) -> RepoResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM member;", [], |row| row.get(0))?;
        count_to_u64(count)
    }

    fn exists_by_id(&self, id: MemberId) -> RepoResult<bool> {
        let exists = self
            .conn
            .query_row("SELECT 1 FROM member WHERE id = ?1;", [id], |_| Ok(()))
            .optional()?;
        Ok(exists.is_some())
    }
}

impl MemberRepository for SqliteMemberRepository<'_> {
    fn find(&self, query: &MemberQuery) -> RepoResult<Vec<Member>> {
        if query.matches_nothing() {
            return Ok(Vec::new());
        }
        self.select(query, query.sort(), None)
    }

    fn count_matching(&self, query: &MemberQuery) -> RepoResult<u64> {
        if query.matches_nothing() {
            return Ok(0);
        }
        let filter = query.render_filter();
        let sql = format!("SELECT COUNT(*){}{};", filter.from, filter.where_clause);
        let count: i64 = self
            .conn
            .query_row(&sql, params_from_iter(filter.binds), |row| row.get(0))?;
        count_to_u64(count)
    }

    fn find_page(
        &self,
        query: &MemberQuery,
        request: &PageRequest<MemberField>,
    ) -> RepoResult<Page<Member>> {
        if query.matches_nothing() {
            return Ok(Page::empty(request));
        }

        let sort = if request.sort().is_unsorted() {
            query.sort()
        } else {
            request.sort()
        };
        let content = self.select(query, sort, Some(request))?;
        let total = resolve_total(request.offset(), request.size(), content.len(), || {
            self.count_matching(query)
        })?;

        debug!(
            "event=member_page module=repo status=ok page={} size={} returned={} total={total}",
            request.page(),
            request.size(),
            content.len()
        );
        Ok(Page::new(content, request.page(), request.size(), total))
    }

    fn find_member(&self, username: &str, age: i32) -> RepoResult<Vec<Member>> {
        let mut stmt = self.conn.prepare(FIND_MEMBER_SQL)?;
        let mut rows = stmt.query(params![username, age])?;
        let mut members = Vec::new();
        while let Some(row) = rows.next()? {
            members.push(parse_member_row(row, false)?);
        }
        Ok(members)
    }

    fn find_username_list(&self) -> RepoResult<Vec<String>> {
        let mut stmt = self.conn.prepare(FIND_USERNAME_LIST_SQL)?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(names)
    }

    fn find_member_dto(&self) -> RepoResult<Vec<MemberDto>> {
        let mut stmt = self.conn.prepare(FIND_MEMBER_DTO_SQL)?;
        let dtos = stmt
            .query_map([], |row| {
                let team = Team::restore(row.get("team_id")?, row.get("team_name")?);
                Ok(MemberDto::new(
                    row.get::<_, String>("username")?,
                    row.get("age")?,
                    Some(team),
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(dtos)
    }

    fn bulk_age_plus(&self, min_age: i32) -> RepoResult<usize> {
        let changed = self.conn.execute(BULK_AGE_PLUS_SQL, [min_age])?;
        debug!("event=member_bulk_update module=repo status=ok min_age={min_age} changed={changed}");
        Ok(changed)
    }
}

impl SqliteMemberRepository<'_> {
    fn select(
        &self,
        query: &MemberQuery,
        sort: &Sort<MemberField>,
        page: Option<&PageRequest<MemberField>>,
    ) -> RepoResult<Vec<Member>> {
        let with_team = query.loads_team();
        let filter = query.render_filter();
        let mut binds = filter.binds;

        let mut sql = String::from(MEMBER_COLUMNS_SQL);
        if with_team {
            sql.push_str(TEAM_NAME_COLUMN_SQL);
        }
        sql.push_str(&filter.from);
        sql.push_str(&filter.where_clause);
        sql.push_str(&sort.to_order_by_sql());

        if let Some(request) = page {
            let offset = i64::try_from(request.offset()).map_err(|_| {
                RepoError::InvalidData(format!("page offset {} out of range", request.offset()))
            })?;
            sql.push_str(" LIMIT ? OFFSET ?");
            binds.push(Value::Integer(i64::from(request.size())));
            binds.push(Value::Integer(offset));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(binds))?;
        let mut members = Vec::new();
        while let Some(row) = rows.next()? {
            members.push(parse_member_row(row, with_team)?);
        }
        Ok(members)
    }
}

pub(super) fn parse_member_row(row: &Row<'_>, with_team: bool) -> RepoResult<Member> {
    let id: MemberId = row.get("id")?;
    let team_id: Option<TeamId> = row.get("team_id")?;

    let team = match team_id {
        None => None,
        Some(team_id) if with_team => {
            let name: Option<String> = row.get("team_name")?;
            let name = name.ok_or_else(|| {
                RepoError::InvalidData(format!(
                    "member {id} references missing team {team_id} in member.team_id"
                ))
            })?;
            Some(TeamRef::Loaded(Team::restore(team_id, name)))
        }
        Some(team_id) => Some(TeamRef::Unloaded(team_id)),
    };

    let audit = AuditFields {
        created_at: Some(row.get("created_at")?),
        created_by: row.get("created_by")?,
        modified_at: row.get("modified_at")?,
        modified_by: row.get("modified_by")?,
    };

    Ok(Member::restore(
        id,
        row.get("username")?,
        row.get("age")?,
        team,
        audit,
    ))
}
