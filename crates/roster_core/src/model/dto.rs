//! Read-side projections.

use super::member::Member;
use super::team::Team;
use serde::{Deserialize, Serialize};

/// Transfer shape for member listings. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberDto {
    pub username: String,
    pub age: i32,
    pub team: Option<Team>,
}

impl MemberDto {
    pub fn new(username: impl Into<String>, age: i32, team: Option<Team>) -> Self {
        Self {
            username: username.into(),
            age,
            team,
        }
    }

    pub fn team_name(&self) -> Option<&str> {
        self.team.as_ref().map(|team| team.name.as_str())
    }
}

/// Copies the member's fields. The team is only carried over when it was
/// loaded with the member; an unloaded reference maps to `None`.
impl From<&Member> for MemberDto {
    fn from(member: &Member) -> Self {
        Self::new(member.username.clone(), member.age, member.team().cloned())
    }
}
