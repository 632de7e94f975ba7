//! Statically declared member query specifications.
//!
//! # Responsibility
//! - Express member filters as values instead of encoded method names.
//! - Render those values into parameterized SQL fragments.
//!
//! # Invariants
//! - Conditions are conjunctive (`AND`).
//! - User-provided values are always bound, never spliced into SQL.
//! - The team table is joined only when a condition needs it or the caller
//!   asked for the team to be loaded.

use crate::model::member::MemberId;
use crate::model::team::TeamId;
use crate::paging::{Sort, SortField};
use rusqlite::types::Value;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use thiserror::Error;

/// Member columns selectable for filtering and sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberField {
    Id,
    Username,
    Age,
    TeamId,
    CreatedAt,
    ModifiedAt,
}

impl MemberField {
    pub fn name(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Username => "username",
            Self::Age => "age",
            Self::TeamId => "team_id",
            Self::CreatedAt => "created_at",
            Self::ModifiedAt => "modified_at",
        }
    }
}

impl SortField for MemberField {
    fn column(self) -> &'static str {
        match self {
            Self::Id => "m.id",
            Self::Username => "m.username",
            Self::Age => "m.age",
            Self::TeamId => "m.team_id",
            Self::CreatedAt => "m.created_at",
            Self::ModifiedAt => "m.modified_at",
        }
    }

    fn identity() -> Self {
        Self::Id
    }
}

impl Display for MemberField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown member field `{0}`")]
pub struct UnknownField(pub String);

impl FromStr for MemberField {
    type Err = UnknownField;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "id" => Ok(Self::Id),
            "username" => Ok(Self::Username),
            "age" => Ok(Self::Age),
            "team_id" => Ok(Self::TeamId),
            "created_at" => Ok(Self::CreatedAt),
            "modified_at" => Ok(Self::ModifiedAt),
            other => Err(UnknownField(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Comparison {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl Comparison {
    fn as_sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Lt => "<",
            Self::Lte => "<=",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Condition {
    IdEq(MemberId),
    UsernameEq(String),
    UsernameIn(Vec<String>),
    Age(Comparison, i32),
    TeamIdEq(TeamId),
    TeamNameEq(String),
    WithoutTeam,
}

/// Conjunctive member filter with optional ordering and team fetch.
///
/// ```
/// use roster_core::{Direction, MemberField, MemberQuery, Sort};
///
/// let query = MemberQuery::new()
///     .username_eq("member1")
///     .age_gt(10)
///     .sorted_by(Sort::by(Direction::Desc, MemberField::Age))
///     .with_team();
/// assert!(query.loads_team());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberQuery {
    conditions: Vec<Condition>,
    sort: Sort<MemberField>,
    with_team: bool,
}

/// Rendered `FROM`/`WHERE` clause with its bind values.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SqlFilter {
    pub from: String,
    pub where_clause: String,
    pub binds: Vec<Value>,
}

impl MemberQuery {
    /// Matches every member.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id_eq(self, id: MemberId) -> Self {
        self.push(Condition::IdEq(id))
    }

    pub fn username_eq(self, username: impl Into<String>) -> Self {
        self.push(Condition::UsernameEq(username.into()))
    }

    /// Username in `names`. An empty set matches nothing.
    pub fn username_in<I, S>(self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push(Condition::UsernameIn(
            names.into_iter().map(Into::into).collect(),
        ))
    }

    pub fn age_eq(self, age: i32) -> Self {
        self.push(Condition::Age(Comparison::Eq, age))
    }

    pub fn age_gt(self, age: i32) -> Self {
        self.push(Condition::Age(Comparison::Gt, age))
    }

    pub fn age_gte(self, age: i32) -> Self {
        self.push(Condition::Age(Comparison::Gte, age))
    }

    pub fn age_lt(self, age: i32) -> Self {
        self.push(Condition::Age(Comparison::Lt, age))
    }

    pub fn age_lte(self, age: i32) -> Self {
        self.push(Condition::Age(Comparison::Lte, age))
    }

    pub fn team_id_eq(self, team_id: TeamId) -> Self {
        self.push(Condition::TeamIdEq(team_id))
    }

    pub fn team_name_eq(self, name: impl Into<String>) -> Self {
        self.push(Condition::TeamNameEq(name.into()))
    }

    pub fn without_team(self) -> Self {
        self.push(Condition::WithoutTeam)
    }

    pub fn sorted_by(mut self, sort: Sort<MemberField>) -> Self {
        self.sort = sort;
        self
    }

    /// Fetches the team row in the same statement (`TeamRef::Loaded`).
    pub fn with_team(mut self) -> Self {
        self.with_team = true;
        self
    }

    pub fn loads_team(&self) -> bool {
        self.with_team
    }

    pub fn sort(&self) -> &Sort<MemberField> {
        &self.sort
    }

    /// True when the filter can be answered without touching storage.
    pub fn matches_nothing(&self) -> bool {
        self.conditions
            .iter()
            .any(|condition| matches!(condition, Condition::UsernameIn(names) if names.is_empty()))
    }

    fn push(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    fn needs_team_join(&self) -> bool {
        self.with_team
            || self
                .conditions
                .iter()
                .any(|condition| matches!(condition, Condition::TeamNameEq(_)))
    }

    pub(crate) fn render_filter(&self) -> SqlFilter {
        let from = if self.needs_team_join() {
            " FROM member m LEFT JOIN team t ON t.id = m.team_id".to_string()
        } else {
            " FROM member m".to_string()
        };

        let mut terms = Vec::with_capacity(self.conditions.len());
        let mut binds = Vec::new();
        for condition in &self.conditions {
            match condition {
                Condition::IdEq(id) => {
                    terms.push("m.id = ?".to_string());
                    binds.push(Value::Integer(*id));
                }
                Condition::UsernameEq(username) => {
                    terms.push("m.username = ?".to_string());
                    binds.push(Value::Text(username.clone()));
                }
                Condition::UsernameIn(names) => {
                    let placeholders = vec!["?"; names.len()].join(", ");
                    terms.push(format!("m.username IN ({placeholders})"));
                    binds.extend(names.iter().cloned().map(Value::Text));
                }
                Condition::Age(comparison, age) => {
                    terms.push(format!("m.age {} ?", comparison.as_sql()));
                    binds.push(Value::Integer(i64::from(*age)));
                }
                Condition::TeamIdEq(team_id) => {
                    terms.push("m.team_id = ?".to_string());
                    binds.push(Value::Integer(*team_id));
                }
                Condition::TeamNameEq(name) => {
                    terms.push("t.name = ?".to_string());
                    binds.push(Value::Text(name.clone()));
                }
                Condition::WithoutTeam => terms.push("m.team_id IS NULL".to_string()),
            }
        }

        let where_clause = if terms.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", terms.join(" AND "))
        };

        SqlFilter {
            from,
            where_clause,
            binds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{MemberField, MemberQuery};
    use crate::paging::{Direction, Sort};
    use rusqlite::types::Value;

    #[test]
    fn empty_query_renders_bare_from() {
        let filter = MemberQuery::new().render_filter();
        assert_eq!(filter.from, " FROM member m");
        assert_eq!(filter.where_clause, "");
        assert!(filter.binds.is_empty());
    }

    #[test]
    fn username_and_age_greater_than_renders_conjunction() {
        let filter = MemberQuery::new()
            .username_eq("member1")
            .age_gt(99)
            .render_filter();
        assert_eq!(filter.where_clause, " WHERE m.username = ? AND m.age > ?");
        assert_eq!(
            filter.binds,
            vec![Value::Text("member1".to_string()), Value::Integer(99)]
        );
    }

    #[test]
    fn username_in_binds_each_name() {
        let filter = MemberQuery::new()
            .username_in(["a", "b", "c"])
            .render_filter();
        assert_eq!(filter.where_clause, " WHERE m.username IN (?, ?, ?)");
        assert_eq!(filter.binds.len(), 3);
    }

    #[test]
    fn empty_username_set_matches_nothing() {
        let query = MemberQuery::new().username_in(Vec::<String>::new());
        assert!(query.matches_nothing());
        assert!(!MemberQuery::new().age_eq(1).matches_nothing());
    }

    #[test]
    fn team_join_only_when_needed() {
        assert!(MemberQuery::new()
            .with_team()
            .render_filter()
            .from
            .contains("LEFT JOIN team t"));
        let filter = MemberQuery::new().team_name_eq("teamA").render_filter();
        assert!(filter.from.contains("LEFT JOIN team t"));
        assert_eq!(filter.where_clause, " WHERE t.name = ?");
        assert!(!MemberQuery::new()
            .team_id_eq(1)
            .render_filter()
            .from
            .contains("JOIN"));
    }

    #[test]
    fn field_parses_from_name_and_rejects_unknown() {
        assert_eq!("username".parse::<MemberField>(), Ok(MemberField::Username));
        assert_eq!(" age ".parse::<MemberField>(), Ok(MemberField::Age));
        let err = "username; DROP TABLE member".parse::<MemberField>().unwrap_err();
        assert!(err.to_string().contains("unknown member field"));
    }

    #[test]
    fn sort_is_kept_on_query() {
        let query =
            MemberQuery::new().sorted_by(Sort::by(Direction::Desc, MemberField::Username));
        assert_eq!(
            query.sort().to_order_by_sql(),
            " ORDER BY m.username DESC, m.id ASC"
        );
    }
}
