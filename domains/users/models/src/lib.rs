use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Status assigned to users created without one.
pub const DEFAULT_USER_STATUS: &str = "active";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub status: String,
}

/// Body of a create or update request. The id always comes from the
/// store (create) or the path (update), never from the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserPayload {
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl UserPayload {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            status: None,
        }
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// The status to persist: the given one, or the default when absent
    /// or blank.
    pub fn status_or_default(&self) -> &str {
        match self.status.as_deref() {
            Some(status) if !status.trim().is_empty() => status,
            _ => DEFAULT_USER_STATUS,
        }
    }

    pub fn into_user(self, id: i64) -> User {
        let status = self.status_or_default().to_string();
        User {
            id,
            name: self.name,
            email: self.email,
            status,
        }
    }
}
