use serde::{Deserialize, Serialize};

use crate::model::{Id, Timestamp, MAX_NAME_LENGTH};

/// Stored user row
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct User {
    pub id: Id,
    pub name: String,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
}

impl CreateUserRequest {
    pub fn validate(&self) -> Result<(), String> {
        validate_user_name(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Id,
    pub name: String,
    pub created_at: Timestamp,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            created_at: user.created_at,
        }
    }
}

pub fn validate_user_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("Name is required".to_string());
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(format!(
            "Name must be between 1 and {} characters",
            MAX_NAME_LENGTH
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_name_validation() {
        assert!(validate_user_name("Ava").is_ok());
        assert!(validate_user_name("").is_err());
        assert!(validate_user_name("   ").is_err());
        assert!(validate_user_name(&"a".repeat(255)).is_ok());
        assert!(validate_user_name(&"a".repeat(256)).is_err());
        // Length is counted in characters, not bytes
        assert!(validate_user_name(&"é".repeat(255)).is_ok());
    }

    #[test]
    fn test_user_response_uses_camel_case() {
        let response = UserResponse {
            id: 1,
            name: "Ava".to_string(),
            created_at: chrono::Utc::now(),
        };
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("createdAt").is_some());
        assert!(json.get("created_at").is_none());
    }
}
