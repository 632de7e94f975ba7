//! Team entity.

use super::{Entity, ValidationError};
use serde::{Deserialize, Serialize};

/// Storage-assigned team key.
pub type TeamId = i64;

/// A named group members can belong to.
///
/// Members of a team are reached through the member repository
/// (`find_by_team`); the team itself holds no member collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    #[serde(skip_deserializing)]
    id: Option<TeamId>,
    pub name: String,
}

impl Team {
    /// Creates a transient team.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
        }
    }

    pub(crate) fn restore(id: TeamId, name: String) -> Self {
        Self { id: Some(id), name }
    }

    pub(crate) fn assign_id(&mut self, id: TeamId) {
        debug_assert!(self.id.is_none(), "team identity is assigned once");
        self.id = Some(id);
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::BlankTeamName);
        }
        Ok(())
    }
}

impl Entity for Team {
    type Id = TeamId;
    const NAME: &'static str = "team";

    fn id(&self) -> Option<TeamId> {
        self.id
    }
}

impl PartialEq for Team {
    fn eq(&self, other: &Self) -> bool {
        match (self.id, other.id) {
            (Some(left), Some(right)) => left == right,
            (None, None) => self.name == other.name,
            _ => false,
        }
    }
}

impl Eq for Team {}
