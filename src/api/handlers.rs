use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{Html, Json},
};
use serde::Serialize;

use crate::api::context::AppState;
use crate::logic::ServiceError;
use crate::model::{
    CreatePhotoRequest, CreateSessionRequest, CreateUserRequest, ErrorResponse, Id, PhotoQuery,
    PhotoResponse, SessionResponse, UserResponse,
};
use crate::store::traits::Store;

pub type ApiError = (StatusCode, Json<ErrorResponse>);
pub type ApiResult<T> = Result<T, ApiError>;

/// Simple health check endpoint
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

pub fn status_for(err: &ServiceError) -> StatusCode {
    match err {
        ServiceError::NotFound { .. } => StatusCode::NOT_FOUND,
        ServiceError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        ServiceError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn service_error(err: ServiceError) -> ApiError {
    let status = status_for(&err);
    if status.is_server_error() {
        log::error!("Request failed: {:#}", err);
    }
    (status, Json(ErrorResponse::new(&err.to_string())))
}

pub fn bad_request(message: String) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(&message)))
}

/// Malformed or incomplete JSON bodies are client errors
pub fn parse_body<T>(payload: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| bad_request(format!("Invalid request body: {}", rejection.body_text())))
}

// Users

pub async fn create_user<S: Store>(
    State(ctx): State<AppState<S>>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    let request = parse_body(payload)?;
    request.validate().map_err(bad_request)?;

    let user = ctx
        .users
        .create_user(&request.name)
        .await
        .map_err(service_error)?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn list_users<S: Store>(
    State(ctx): State<AppState<S>>,
) -> ApiResult<Json<Vec<UserResponse>>> {
    let users = ctx.users.list_users().await.map_err(service_error)?;
    Ok(Json(users))
}

pub async fn get_user<S: Store>(
    State(ctx): State<AppState<S>>,
    Path(id): Path<Id>,
) -> ApiResult<Json<UserResponse>> {
    let user = ctx.users.get_user(id).await.map_err(service_error)?;
    Ok(Json(user))
}

pub async fn list_user_sessions<S: Store>(
    State(ctx): State<AppState<S>>,
    Path(id): Path<Id>,
) -> ApiResult<Json<Vec<SessionResponse>>> {
    let sessions = ctx
        .sessions
        .list_sessions_for_user(id)
        .await
        .map_err(service_error)?;
    Ok(Json(sessions))
}

pub async fn delete_user<S: Store>(
    State(ctx): State<AppState<S>>,
    Path(id): Path<Id>,
) -> ApiResult<StatusCode> {
    ctx.users.delete_user(id).await.map_err(service_error)?;
    Ok(StatusCode::NO_CONTENT)
}

// Sessions

pub async fn create_session<S: Store>(
    State(ctx): State<AppState<S>>,
    payload: Result<Json<CreateSessionRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<SessionResponse>)> {
    let request = parse_body(payload)?;
    request.validate().map_err(bad_request)?;

    let session = ctx
        .sessions
        .create_session(request.user_id)
        .await
        .map_err(service_error)?;
    Ok((StatusCode::CREATED, Json(session)))
}

pub async fn get_session<S: Store>(
    State(ctx): State<AppState<S>>,
    Path(id): Path<Id>,
) -> ApiResult<Json<SessionResponse>> {
    let session = ctx
        .sessions
        .get_session_detailed(id)
        .await
        .map_err(service_error)?;
    Ok(Json(session))
}

pub async fn delete_session<S: Store>(
    State(ctx): State<AppState<S>>,
    Path(id): Path<Id>,
) -> ApiResult<StatusCode> {
    ctx.sessions.delete_session(id).await.map_err(service_error)?;
    Ok(StatusCode::NO_CONTENT)
}

// Photos

pub async fn create_photo<S: Store>(
    State(ctx): State<AppState<S>>,
    payload: Result<Json<CreatePhotoRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<PhotoResponse>)> {
    let request = parse_body(payload)?;
    request.validate().map_err(bad_request)?;

    let photo = ctx
        .photos
        .create_photo(request.session_id, &request.image_url)
        .await
        .map_err(service_error)?;
    Ok((StatusCode::CREATED, Json(photo)))
}

pub async fn list_photos<S: Store>(
    State(ctx): State<AppState<S>>,
    Query(query): Query<PhotoQuery>,
) -> ApiResult<Json<Vec<PhotoResponse>>> {
    let photos = ctx
        .photos
        .list_photos(query.session_id)
        .await
        .map_err(service_error)?;
    Ok(Json(photos))
}

pub async fn get_photo<S: Store>(
    State(ctx): State<AppState<S>>,
    Path(id): Path<Id>,
) -> ApiResult<Json<PhotoResponse>> {
    let photo = ctx.photos.get_photo(id).await.map_err(service_error)?;
    Ok(Json(photo))
}

pub async fn delete_photo<S: Store>(
    State(ctx): State<AppState<S>>,
    Path(id): Path<Id>,
) -> ApiResult<StatusCode> {
    ctx.photos.delete_photo(id).await.map_err(service_error)?;
    Ok(StatusCode::NO_CONTENT)
}

// API Documentation handlers
pub async fn get_api_docs() -> Html<String> {
    let html = r#"
<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Photobooth API Documentation</title>
    <link rel="stylesheet" type="text/css" href="https://unpkg.com/swagger-ui-dist@5.9.0/swagger-ui.css" />
    <style>
        body {
            margin: 0;
            background: #fafafa;
        }
    </style>
</head>
<body>
    <div id="swagger-ui"></div>
    <script src="https://unpkg.com/swagger-ui-dist@5.9.0/swagger-ui-bundle.js"></script>
    <script>
        window.onload = function() {
            SwaggerUIBundle({
                url: '/docs/openapi.json',
                dom_id: '#swagger-ui',
                deepLinking: true
            });
        };
    </script>
</body>
</html>
"#;
    Html(html.to_string())
}

pub async fn get_openapi_spec() -> Json<serde_json::Value> {
    let id_param = |description: &str| {
        serde_json::json!({
            "name": "id",
            "in": "path",
            "required": true,
            "description": description,
            "schema": { "type": "integer", "format": "int64" }
        })
    };

    let spec = serde_json::json!({
        "openapi": "3.0.3",
        "info": {
            "title": "Photobooth API",
            "version": "1.0.0",
            "description": "Users, photo booth sessions and their photos, plus image upload."
        },
        "servers": [{ "url": "/", "description": "Current server" }],
        "tags": [
            { "name": "Users", "description": "User management" },
            { "name": "Sessions", "description": "Photo booth sessions owned by a user" },
            { "name": "Photos", "description": "Photos attached to a session" },
            { "name": "Upload", "description": "File upload endpoints" }
        ],
        "paths": {
            "/api/v1/users": {
                "get": { "tags": ["Users"], "summary": "List users, newest first", "responses": { "200": { "description": "Users" } } },
                "post": {
                    "tags": ["Users"],
                    "summary": "Create a user",
                    "requestBody": { "required": true, "content": { "application/json": { "schema": { "$ref": "#/components/schemas/CreateUserRequest" } } } },
                    "responses": { "201": { "description": "Created" }, "400": { "description": "Invalid input data" } }
                }
            },
            "/api/v1/users/{id}": {
                "parameters": [id_param("User ID")],
                "get": { "tags": ["Users"], "summary": "Get a user", "responses": { "200": { "description": "User" }, "404": { "description": "User not found" } } },
                "delete": { "tags": ["Users"], "summary": "Delete a user with all sessions and photos", "responses": { "204": { "description": "Deleted" }, "404": { "description": "User not found" } } }
            },
            "/api/v1/users/{id}/sessions": {
                "parameters": [id_param("User ID")],
                "get": { "tags": ["Sessions"], "summary": "List a user's sessions, newest first", "responses": { "200": { "description": "Sessions" }, "404": { "description": "User not found" } } }
            },
            "/api/v1/sessions": {
                "post": {
                    "tags": ["Sessions"],
                    "summary": "Create a session",
                    "requestBody": { "required": true, "content": { "application/json": { "schema": { "$ref": "#/components/schemas/CreateSessionRequest" } } } },
                    "responses": { "201": { "description": "Created" }, "400": { "description": "Invalid input data" }, "404": { "description": "User not found" } }
                }
            },
            "/api/v1/sessions/{id}": {
                "parameters": [id_param("Session ID")],
                "get": { "tags": ["Sessions"], "summary": "Get a session with its photos", "responses": { "200": { "description": "Session" }, "404": { "description": "Session not found" } } },
                "delete": { "tags": ["Sessions"], "summary": "Delete a session and its photos", "responses": { "204": { "description": "Deleted" }, "404": { "description": "Session not found" } } }
            },
            "/api/v1/photos": {
                "get": {
                    "tags": ["Photos"],
                    "summary": "List photos, newest first",
                    "parameters": [{ "name": "sessionId", "in": "query", "required": false, "schema": { "type": "integer", "format": "int64" } }],
                    "responses": { "200": { "description": "Photos" }, "404": { "description": "Session not found" } }
                },
                "post": {
                    "tags": ["Photos"],
                    "summary": "Create a photo by URL",
                    "requestBody": { "required": true, "content": { "application/json": { "schema": { "$ref": "#/components/schemas/CreatePhotoRequest" } } } },
                    "responses": { "201": { "description": "Created" }, "400": { "description": "Invalid input data" }, "404": { "description": "Session not found" } }
                }
            },
            "/api/v1/photos/{id}": {
                "parameters": [id_param("Photo ID")],
                "get": { "tags": ["Photos"], "summary": "Get a photo", "responses": { "200": { "description": "Photo" }, "404": { "description": "Photo not found" } } },
                "delete": { "tags": ["Photos"], "summary": "Delete a photo", "responses": { "204": { "description": "Deleted" }, "404": { "description": "Photo not found" } } }
            },
            "/api/v1/upload/base64": {
                "post": {
                    "tags": ["Upload"],
                    "summary": "Upload photo as base64",
                    "requestBody": { "required": true, "content": { "application/json": { "schema": { "$ref": "#/components/schemas/Base64UploadRequest" } } } },
                    "responses": { "201": { "description": "Photo uploaded successfully" }, "400": { "description": "Invalid base64 data" }, "500": { "description": "Failed to save file" } }
                }
            },
            "/api/v1/upload/file": {
                "post": {
                    "tags": ["Upload"],
                    "summary": "Upload photo as multipart file",
                    "requestBody": {
                        "required": true,
                        "content": {
                            "multipart/form-data": {
                                "schema": {
                                    "type": "object",
                                    "required": ["file"],
                                    "properties": {
                                        "file": { "type": "string", "format": "binary" },
                                        "sessionId": { "type": "integer", "format": "int64" }
                                    }
                                }
                            }
                        }
                    },
                    "responses": { "201": { "description": "Photo uploaded successfully" }, "400": { "description": "Invalid file" }, "500": { "description": "Failed to save file" } }
                }
            }
        },
        "components": {
            "schemas": {
                "CreateUserRequest": {
                    "type": "object",
                    "required": ["name"],
                    "properties": { "name": { "type": "string", "minLength": 1, "maxLength": 255, "example": "John Doe" } }
                },
                "CreateSessionRequest": {
                    "type": "object",
                    "required": ["userId"],
                    "properties": { "userId": { "type": "integer", "format": "int64", "minimum": 1 } }
                },
                "CreatePhotoRequest": {
                    "type": "object",
                    "required": ["sessionId", "imageUrl"],
                    "properties": {
                        "sessionId": { "type": "integer", "format": "int64", "minimum": 1 },
                        "imageUrl": { "type": "string", "maxLength": 500, "example": "https://example.com/photos/photo1.jpg" }
                    }
                },
                "Base64UploadRequest": {
                    "type": "object",
                    "required": ["imageData"],
                    "properties": {
                        "imageData": { "type": "string", "description": "Base64 image, optionally with a data URL prefix" },
                        "sessionId": { "type": "integer", "format": "int64" },
                        "extension": { "type": "string", "default": "png" }
                    }
                }
            }
        }
    });

    Json(spec)
}
