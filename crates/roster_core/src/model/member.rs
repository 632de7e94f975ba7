//! Member entity and its association to a team.
//!
//! # Invariants
//! - `id` is assigned once, by the repository, on first save.
//! - `team` never triggers I/O: it holds either the loaded team row or just
//!   the foreign key, depending on how the member was queried.
//! - `audit` is only written through an [`Auditor`](super::audit::Auditor).

use super::audit::AuditFields;
use super::team::{Team, TeamId};
use super::{Entity, ValidationError};
use serde::{Deserialize, Serialize};

/// Storage-assigned member key.
pub type MemberId = i64;

/// Many-to-one link from a member to its team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeamRef {
    /// Only the foreign key was read.
    Unloaded(TeamId),
    /// The team row was fetched in the same statement.
    Loaded(Team),
}

impl TeamRef {
    /// Foreign key value. `None` only for a loaded team that was never saved.
    pub fn id(&self) -> Option<TeamId> {
        match self {
            Self::Unloaded(id) => Some(*id),
            Self::Loaded(team) => team.id(),
        }
    }

    pub fn loaded(&self) -> Option<&Team> {
        match self {
            Self::Unloaded(_) => None,
            Self::Loaded(team) => Some(team),
        }
    }
}

/// A persisted person, optionally on a team.
///
/// Decoding from serde never restores identity or audit metadata; a decoded
/// member is always transient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    #[serde(skip_deserializing)]
    id: Option<MemberId>,
    pub username: String,
    pub age: i32,
    team: Option<TeamRef>,
    #[serde(skip_deserializing)]
    audit: AuditFields,
}

impl Member {
    /// Creates a transient member with age 0 and no team.
    pub fn new(username: impl Into<String>) -> Self {
        Self::with_age(username, 0)
    }

    pub fn with_age(username: impl Into<String>, age: i32) -> Self {
        Self {
            id: None,
            username: username.into(),
            age,
            team: None,
            audit: AuditFields::default(),
        }
    }

    /// Creates a transient member already assigned to `team`.
    ///
    /// Same rule as [`Member::change_team`]: pass a saved team.
    pub fn with_team(username: impl Into<String>, age: i32, team: &Team) -> Self {
        let mut member = Self::with_age(username, age);
        member.change_team(team);
        member
    }

    pub(crate) fn restore(
        id: MemberId,
        username: String,
        age: i32,
        team: Option<TeamRef>,
        audit: AuditFields,
    ) -> Self {
        Self {
            id: Some(id),
            username,
            age,
            team,
            audit,
        }
    }

    pub(crate) fn assign_id(&mut self, id: MemberId) {
        debug_assert!(self.id.is_none(), "member identity is assigned once");
        self.id = Some(id);
    }

    pub(crate) fn audit_mut(&mut self) -> &mut AuditFields {
        &mut self.audit
    }

    pub fn audit(&self) -> &AuditFields {
        &self.audit
    }

    /// Moves this member to `team`, capturing the team as it is now.
    ///
    /// The team must already be persisted when this is called: saving the
    /// team afterwards does not update the captured copy, and the member's
    /// save fails with `RepoError::TransientReference`.
    pub fn change_team(&mut self, team: &Team) {
        self.team = Some(TeamRef::Loaded(team.clone()));
    }

    pub fn clear_team(&mut self) {
        self.team = None;
    }

    pub fn team_ref(&self) -> Option<&TeamRef> {
        self.team.as_ref()
    }

    pub fn team_id(&self) -> Option<TeamId> {
        self.team.as_ref().and_then(TeamRef::id)
    }

    /// The associated team, when it was loaded together with the member.
    pub fn team(&self) -> Option<&Team> {
        self.team.as_ref().and_then(TeamRef::loaded)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.username.trim().is_empty() {
            return Err(ValidationError::BlankUsername);
        }
        Ok(())
    }
}

impl Entity for Member {
    type Id = MemberId;
    const NAME: &'static str = "member";

    fn id(&self) -> Option<MemberId> {
        self.id
    }
}

impl PartialEq for Member {
    fn eq(&self, other: &Self) -> bool {
        match (self.id, other.id) {
            (Some(left), Some(right)) => left == right,
            (None, None) => {
                self.username == other.username
                    && self.age == other.age
                    && self.team == other.team
                    && self.audit == other.audit
            }
            _ => false,
        }
    }
}

impl Eq for Member {}

#[cfg(test)]
mod tests {
    use super::{Member, TeamRef};
    use crate::model::team::Team;
    use crate::model::{Entity, ValidationError};

    #[test]
    fn new_member_is_transient_with_default_age() {
        let member = Member::new("member1");
        assert!(member.is_new());
        assert_eq!(member.age, 0);
        assert!(member.team_ref().is_none());
        assert_eq!(member.audit().created_at, None);
    }

    #[test]
    fn persisted_members_compare_by_identity() {
        let mut left = Member::with_age("member1", 10);
        let mut right = Member::with_age("renamed", 99);
        assert_ne!(left, right);

        left.assign_id(7);
        right.assign_id(7);
        assert_eq!(left, right);

        let transient = Member::with_age("member1", 10);
        assert_ne!(left, transient);
    }

    #[test]
    fn team_accessors_distinguish_loaded_and_unloaded() {
        let team = Team::restore(3, "teamA".to_string());
        let loaded = Member::with_team("member1", 10, &team);
        assert_eq!(loaded.team_id(), Some(3));
        assert_eq!(loaded.team().map(|t| t.name.as_str()), Some("teamA"));

        let unloaded = Member::restore(
            1,
            "member2".to_string(),
            20,
            Some(TeamRef::Unloaded(3)),
            Default::default(),
        );
        assert_eq!(unloaded.team_id(), Some(3));
        assert!(unloaded.team().is_none());
    }

    #[test]
    fn validate_rejects_blank_username() {
        let member = Member::new("   ");
        assert_eq!(member.validate(), Err(ValidationError::BlankUsername));
    }
}
