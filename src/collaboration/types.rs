use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Identifier of a participating organization.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct OrganizationId(pub u64);

impl fmt::Display for OrganizationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for OrganizationId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

/// Identifier binding a task to a dataset/session context.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of a running node process.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The set of organizations and sessions a task queue serves.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Collaboration {
    pub organizations: BTreeSet<OrganizationId>,
    pub sessions: BTreeSet<SessionId>,
}

impl Collaboration {
    pub fn new(
        organizations: impl IntoIterator<Item = OrganizationId>,
        sessions: impl IntoIterator<Item = SessionId>,
    ) -> Self {
        Self {
            organizations: organizations.into_iter().collect(),
            sessions: sessions.into_iter().collect(),
        }
    }

    pub fn has_organization(&self, organization: &OrganizationId) -> bool {
        self.organizations.contains(organization)
    }

    pub fn has_session(&self, session: &SessionId) -> bool {
        self.sessions.contains(session)
    }

    /// Returns the first target that is not part of this collaboration, if any.
    pub fn first_unknown<'a>(
        &self,
        targets: impl IntoIterator<Item = &'a OrganizationId>,
    ) -> Option<OrganizationId> {
        targets
            .into_iter()
            .find(|target| !self.has_organization(target))
            .copied()
    }
}
