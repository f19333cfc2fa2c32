use axum::{
    extract::{
        multipart::{Multipart, MultipartRejection},
        rejection::JsonRejection,
        State,
    },
    http::StatusCode,
    response::Json,
};

use crate::api::context::AppState;
use crate::api::handlers::status_for;
use crate::logic::UploadError;
use crate::model::{Base64UploadRequest, Id, UploadResponse};
use crate::store::traits::Store;

pub type UploadResult = Result<(StatusCode, Json<UploadResponse>), (StatusCode, Json<UploadResponse>)>;

fn rejected(status: StatusCode, message: String) -> (StatusCode, Json<UploadResponse>) {
    (status, Json(UploadResponse::failed(message)))
}

fn upload_error(err: UploadError) -> (StatusCode, Json<UploadResponse>) {
    match err {
        UploadError::InvalidInput(message) => rejected(StatusCode::BAD_REQUEST, message),
        UploadError::StorageFault(ref io_err) => {
            log::error!("Upload could not be written: {}", io_err);
            rejected(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
        UploadError::Link {
            ref image_url,
            ref filename,
            ref source,
        } => {
            let response = UploadResponse {
                success: false,
                image_url: Some(image_url.clone()),
                filename: Some(filename.clone()),
                photo_id: None,
                error: Some(err.to_string()),
            };
            (status_for(source), Json(response))
        }
    }
}

/// POST /api/v1/upload/base64
pub async fn upload_base64<S: Store>(
    State(ctx): State<AppState<S>>,
    payload: Result<Json<Base64UploadRequest>, JsonRejection>,
) -> UploadResult {
    let Json(request) = payload.map_err(|rejection| {
        rejected(
            StatusCode::BAD_REQUEST,
            format!("Invalid request body: {}", rejection.body_text()),
        )
    })?;

    let stored = ctx
        .uploads
        .ingest_base64(
            &request.image_data,
            request.extension.as_deref(),
            request.session_id,
        )
        .await
        .map_err(upload_error)?;

    log::info!("Stored base64 upload {}", stored.filename);
    Ok((StatusCode::CREATED, Json(stored.into())))
}

/// POST /api/v1/upload/file
///
/// Reads a `file` part and an optional `sessionId` part. Parts with other
/// names are skipped.
pub async fn upload_file<S: Store>(
    State(ctx): State<AppState<S>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> UploadResult {
    let mut multipart = multipart
        .map_err(|rejection| rejected(StatusCode::BAD_REQUEST, rejection.body_text()))?;

    let mut file: Option<(Option<String>, Vec<u8>)> = None;
    let mut session_id: Option<Id> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| rejected(e.status(), e.body_text()))?
    {
        match field.name() {
            Some("file") => {
                let original_filename = field.file_name().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| rejected(e.status(), e.body_text()))?;
                file = Some((original_filename, bytes.to_vec()));
            }
            Some("sessionId") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| rejected(e.status(), e.body_text()))?;
                session_id = parse_session_id(&text)
                    .map_err(|message| rejected(StatusCode::BAD_REQUEST, message))?;
            }
            _ => {}
        }
    }

    let (original_filename, bytes) = file.ok_or_else(|| {
        rejected(StatusCode::BAD_REQUEST, "File is empty".to_string())
    })?;

    let stored = ctx
        .uploads
        .ingest_file(&bytes, original_filename.as_deref(), session_id)
        .await
        .map_err(upload_error)?;

    log::info!(
        "Stored multipart upload {} ({} bytes)",
        stored.filename,
        bytes.len()
    );
    Ok((StatusCode::CREATED, Json(stored.into())))
}

/// Blank means "no session"; anything else must be an integer
fn parse_session_id(text: &str) -> Result<Option<Id>, String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<Id>()
        .map(Some)
        .map_err(|_| format!("Invalid session id: {}", trimmed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::ServiceError;
    use crate::model::EntityKind;

    #[test]
    fn test_parse_session_id() {
        assert_eq!(parse_session_id(""), Ok(None));
        assert_eq!(parse_session_id("  "), Ok(None));
        assert_eq!(parse_session_id("42"), Ok(Some(42)));
        assert!(parse_session_id("forty-two").is_err());
    }

    #[test]
    fn test_link_failure_keeps_file_reference() {
        let (status, Json(body)) = upload_error(UploadError::Link {
            image_url: "/uploads/photos/a.png".to_string(),
            filename: "a.png".to_string(),
            source: ServiceError::not_found(EntityKind::Session, 99),
        });

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(!body.success);
        assert_eq!(body.image_url.as_deref(), Some("/uploads/photos/a.png"));
        assert_eq!(body.filename.as_deref(), Some("a.png"));
        assert_eq!(
            body.error.as_deref(),
            Some(
                "File saved as /uploads/photos/a.png but the photo record could not be created: \
                 Session not found with id: 99"
            )
        );
    }

    #[test]
    fn test_invalid_input_is_bad_request() {
        let (status, Json(body)) =
            upload_error(UploadError::InvalidInput("File is empty".to_string()));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, UploadResponse::failed("File is empty".to_string()));
    }
}
