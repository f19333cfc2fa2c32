use serde::{Deserialize, Serialize};

use crate::model::{require_positive_id, Id, Timestamp, MAX_IMAGE_URL_LENGTH};

/// Stored photo row; the owning session is referenced by id only
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Photo {
    pub id: Id,
    pub session_id: Id,
    pub image_url: String,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePhotoRequest {
    pub session_id: Id,
    pub image_url: String,
}

impl CreatePhotoRequest {
    pub fn validate(&self) -> Result<(), String> {
        require_positive_id("Session ID", self.session_id)?;
        validate_image_url(&self.image_url)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoQuery {
    pub session_id: Option<Id>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoResponse {
    pub id: Id,
    pub session_id: Id,
    pub image_url: String,
    pub created_at: Timestamp,
}

impl From<Photo> for PhotoResponse {
    fn from(photo: Photo) -> Self {
        Self {
            id: photo.id,
            session_id: photo.session_id,
            image_url: photo.image_url,
            created_at: photo.created_at,
        }
    }
}

pub fn validate_image_url(image_url: &str) -> Result<(), String> {
    if image_url.trim().is_empty() {
        return Err("Image URL is required".to_string());
    }
    if image_url.chars().count() > MAX_IMAGE_URL_LENGTH {
        return Err(format!(
            "Image URL must not exceed {} characters",
            MAX_IMAGE_URL_LENGTH
        ));
    }
    Ok(())
}
