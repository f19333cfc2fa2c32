use serde::{Deserialize, Serialize};

use crate::model::{require_positive_id, Id, Photo, PhotoResponse, Timestamp, User};

/// Stored session row; the owner is referenced by id only
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Session {
    pub id: Id,
    pub user_id: Id,
    pub created_at: Timestamp,
}

/// A session read together with its owner and photos from one snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct SessionDetails {
    pub session: Session,
    pub user: User,
    pub photos: Vec<Photo>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub user_id: Id,
}

impl CreateSessionRequest {
    pub fn validate(&self) -> Result<(), String> {
        require_positive_id("User ID", self.user_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub id: Id,
    pub user_id: Id,
    pub created_at: Timestamp,
    /// Only present on the detailed view
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub photos: Option<Vec<PhotoResponse>>,
}

impl From<Session> for SessionResponse {
    fn from(session: Session) -> Self {
        Self {
            id: session.id,
            user_id: session.user_id,
            created_at: session.created_at,
            photos: None,
        }
    }
}

impl From<SessionDetails> for SessionResponse {
    fn from(details: SessionDetails) -> Self {
        let photos = details
            .photos
            .into_iter()
            .map(PhotoResponse::from)
            .collect();

        Self {
            id: details.session.id,
            user_id: details.session.user_id,
            created_at: details.session.created_at,
            photos: Some(photos),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_session_response_omits_photos() {
        let session = Session {
            id: 3,
            user_id: 1,
            created_at: chrono::Utc::now(),
        };
        let json = serde_json::to_value(SessionResponse::from(session)).unwrap();
        assert_eq!(json["id"], 3);
        assert_eq!(json["userId"], 1);
        assert!(json.get("photos").is_none());
    }

    #[test]
    fn test_detailed_session_response_embeds_photos() {
        let now = chrono::Utc::now();
        let details = SessionDetails {
            session: Session {
                id: 1,
                user_id: 1,
                created_at: now,
            },
            user: User {
                id: 1,
                name: "Ava".to_string(),
                created_at: now,
            },
            photos: vec![Photo {
                id: 1,
                session_id: 1,
                image_url: "https://x/a.jpg".to_string(),
                created_at: now,
            }],
        };

        let json = serde_json::to_value(SessionResponse::from(details)).unwrap();
        assert_eq!(json["photos"][0]["sessionId"], 1);
        assert_eq!(json["photos"][0]["imageUrl"], "https://x/a.jpg");
    }

    #[test]
    fn test_create_session_request_requires_positive_user() {
        let request: CreateSessionRequest = serde_json::from_str(r#"{"userId": 0}"#).unwrap();
        assert!(request.validate().is_err());
        let request: CreateSessionRequest = serde_json::from_str(r#"{"userId": 7}"#).unwrap();
        assert!(request.validate().is_ok());
    }
}
