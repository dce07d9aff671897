use serde::{Deserialize, Serialize};
use std::fmt;

/// User identifiers are assigned by the external identity collaborator.
pub type UserId = i64;

/// The four parties of the approval workflow.
///
/// Every mutating call carries an authenticated actor with one of these
/// roles; credential verification happens outside the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Drafts requisitions and submits them for quoting.
    Requester,
    /// Quotes, issues purchase orders, and records deliveries.
    Administration,
    /// Approves or rejects quoted prices. May never edit content.
    Validator,
    /// Supervisory role: may perform any stage owner's transition, cancel
    /// from any non-terminal state, and edit or delete anything.
    Supervisor,
}

impl Role {
    pub const ALL: [Role; 4] = [
        Role::Requester,
        Role::Administration,
        Role::Validator,
        Role::Supervisor,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Requester => "REQUESTER",
            Role::Administration => "ADMINISTRATION",
            Role::Validator => "VALIDATOR",
            Role::Supervisor => "SUPERVISOR",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The authenticated identity behind a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: UserId,
    pub role: Role,
}

impl Actor {
    pub fn new(id: UserId, role: Role) -> Self {
        Self { id, role }
    }
}
