//! Hand-written member queries kept apart from the `MemberQuery` finders.

use super::member_repo::{parse_member_row, SqliteMemberRepository};
use super::RepoResult;
use crate::model::member::Member;

const FIND_MEMBER_CUSTOM_SQL: &str = "SELECT
    id,
    username,
    age,
    team_id,
    created_at,
    created_by,
    modified_at,
    modified_by
FROM member
ORDER BY id ASC;";

/// Custom member queries that bypass `MemberQuery`.
pub trait MemberRepositoryCustom {
    fn find_member_custom(&self) -> RepoResult<Vec<Member>>;
}

impl MemberRepositoryCustom for SqliteMemberRepository<'_> {
    fn find_member_custom(&self) -> RepoResult<Vec<Member>> {
        let mut stmt = self.conn.prepare(FIND_MEMBER_CUSTOM_SQL)?;
        let mut rows = stmt.query([])?;
        let mut members = Vec::new();
        while let Some(row) = rows.next()? {
            members.push(parse_member_row(row, false)?);
        }
        Ok(members)
    }
}
