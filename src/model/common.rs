use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Store-assigned row identifier
pub type Id = i64;

pub type Timestamp = DateTime<Utc>;

pub const MAX_NAME_LENGTH: usize = 255;
pub const MAX_IMAGE_URL_LENGTH: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    User,
    Session,
    Photo,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::User => "User",
            EntityKind::Session => "Session",
            EntityKind::Photo => "Photo",
        };
        f.write_str(name)
    }
}

/// Row counts removed by a cascading delete
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CascadeReport {
    pub users: u64,
    pub sessions: u64,
    pub photos: u64,
}

impl CascadeReport {
    pub fn total(&self) -> u64 {
        self.users + self.sessions + self.photos
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: &str) -> Self {
        Self {
            error: message.to_string(),
        }
    }
}

/// Reject ids that can never have been assigned by the store
pub fn require_positive_id(field: &str, id: Id) -> Result<(), String> {
    if id <= 0 {
        return Err(format!("{} must be a positive number", field));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_kind_display() {
        assert_eq!(EntityKind::User.to_string(), "User");
        assert_eq!(EntityKind::Session.to_string(), "Session");
        assert_eq!(EntityKind::Photo.to_string(), "Photo");
    }

    #[test]
    fn test_require_positive_id() {
        assert!(require_positive_id("userId", 1).is_ok());
        assert_eq!(
            require_positive_id("userId", 0).unwrap_err(),
            "userId must be a positive number"
        );
        assert!(require_positive_id("sessionId", -4).is_err());
    }
}
