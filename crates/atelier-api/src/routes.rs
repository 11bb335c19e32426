//! Router and request handlers.

use atelier_core::{AppState, ConfigProvider, FileRecord, NewProject, Project, StagedUpload};
use axum::body::Body;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{DefaultBodyLimit, Multipart, Path, Query, State};
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::{StreamExt, stream};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio_util::io::ReaderStream;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::{ApiError, ApiResult};

/// Transport settings that do not belong to the core.
#[derive(Debug, Clone)]
pub struct ApiOptions {
    /// Origins allowed by CORS. `*` allows any origin.
    pub allowed_origins: Vec<String>,
    /// Largest accepted request body, in bytes.
    pub max_body_bytes: usize,
}

impl Default for ApiOptions {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["http://localhost:5173".to_string()],
            max_body_bytes: 100 * 1024 * 1024,
        }
    }
}

/// Build the full application router.
pub fn router<C: ConfigProvider>(state: AppState<C>, options: &ApiOptions) -> Router {
    let api = Router::new()
        .route(
            "/projects",
            post(create_project::<C>).get(list_projects::<C>),
        )
        .route(
            "/projects/{id}",
            get(get_project::<C>).delete(delete_project::<C>),
        )
        .route("/files", get(list_files::<C>))
        .route("/files/content", get(file_content::<C>))
        .route("/files/upload", post(upload_file::<C>));

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&options.allowed_origins))
                .layer(DefaultBodyLimit::max(options.max_body_bytes)),
        )
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::from(Any)
    } else {
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|o| match HeaderValue::from_str(o) {
                Ok(value) => Some(value),
                Err(e) => {
                    tracing::warn!(origin = %o, "ignoring invalid CORS origin: {e}");
                    None
                }
            })
            .collect();
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

// ============================================================================
// Projects
// ============================================================================

async fn health() -> &'static str {
    "OK"
}

async fn create_project<C: ConfigProvider>(
    State(state): State<AppState<C>>,
    body: Result<Json<NewProject>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Project>)> {
    let Json(request) = body?;
    let project = state.service().create_project(request).await?;
    Ok((StatusCode::CREATED, Json(project)))
}

async fn list_projects<C: ConfigProvider>(State(state): State<AppState<C>>) -> Json<Vec<Project>> {
    let mut projects = state.service().list_projects().await;
    projects.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
    Json(projects)
}

async fn get_project<C: ConfigProvider>(
    State(state): State<AppState<C>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Project>> {
    Ok(Json(state.service().get_project(&id).await?))
}

async fn delete_project<C: ConfigProvider>(
    State(state): State<AppState<C>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    state.service().delete_project(&id).await?;
    Ok(Json(json!({ "message": "project deleted successfully" })))
}

// ============================================================================
// Files
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FilesQuery {
    project_id: Option<String>,
    path: Option<String>,
}

impl FilesQuery {
    fn project_id(&self) -> ApiResult<&str> {
        self.project_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ApiError::bad_request("projectId is required"))
    }
}

async fn list_files<C: ConfigProvider>(
    State(state): State<AppState<C>>,
    query: Result<Query<FilesQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<FileRecord>>> {
    let Query(query) = query?;
    let files = state.service().list_files(query.project_id()?).await?;
    Ok(Json(files))
}

async fn file_content<C: ConfigProvider>(
    State(state): State<AppState<C>>,
    query: Result<Query<FilesQuery>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    let Query(query) = query?;
    let project_id = query.project_id()?;
    let path = query
        .path
        .as_deref()
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::bad_request("projectId and path are required"))?;

    let download = state.service().open_file(project_id, path).await?;

    let headers = [
        (
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/octet-stream"),
        ),
        (header::CONTENT_LENGTH, HeaderValue::from(download.len)),
        (
            header::CONTENT_DISPOSITION,
            content_disposition(&download.name),
        ),
    ];
    Ok((headers, Body::from_stream(ReaderStream::new(download.file))))
}

/// `attachment; filename="..."` with anything outside printable ASCII replaced.
fn content_disposition(file_name: &str) -> HeaderValue {
    let safe: String = file_name
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();
    HeaderValue::from_str(&format!("attachment; filename=\"{safe}\""))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}

#[derive(Debug, Serialize)]
struct UploadResponse {
    message: &'static str,
    file: FileRecord,
}

/// Multipart upload: `projectId`, optional `path`, and `file`.
///
/// Fields may come in any order. The file is staged as soon as the project
/// is known (buffered in memory until then) and only moved into place once
/// the whole form has been read, so a `path` after `file` still applies.
async fn upload_file<C: ConfigProvider>(
    State(state): State<AppState<C>>,
    mut multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    let service = state.service();
    let mut project_id: Option<String> = None;
    let mut subdir: Option<String> = None;
    let mut pending: Option<(String, axum::body::Bytes)> = None;
    let mut staged: Option<StagedUpload> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "projectId" => project_id = Some(field.text().await?),
            "path" => subdir = Some(field.text().await?),
            "file" => {
                if staged.is_some() || pending.is_some() {
                    return Err(ApiError::bad_request("only one file per upload"));
                }
                let file_name = field.file_name().unwrap_or_default().to_string();
                match project_id.as_deref().filter(|id| !id.is_empty()) {
                    Some(id) => {
                        let chunks = field.map(|chunk| chunk.map_err(std::io::Error::other));
                        staged = Some(service.stage_file(id, &file_name, Box::pin(chunks)).await?);
                    }
                    None => pending = Some((file_name, field.bytes().await?)),
                }
            }
            other => tracing::debug!(field = other, "ignoring unknown upload field"),
        }
    }

    let project_id = project_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::bad_request("projectId is required"))?;

    let staged = match (staged, pending) {
        (Some(staged), _) => staged,
        (None, Some((file_name, bytes))) => {
            let chunks = stream::iter([Ok::<_, std::io::Error>(bytes)]);
            service.stage_file(&project_id, &file_name, chunks).await?
        }
        (None, None) => return Err(ApiError::bad_request("file is required")),
    };
    let file = service.commit_file(staged, subdir.as_deref()).await?;

    Ok(Json(UploadResponse {
        message: "file uploaded successfully",
        file,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_disposition_plain() {
        let value = content_disposition("report.pdf");
        assert_eq!(value, "attachment; filename=\"report.pdf\"");
    }

    #[test]
    fn test_content_disposition_sanitizes() {
        let value = content_disposition("na\"ïve\nname.txt");
        assert_eq!(value, "attachment; filename=\"na__ve_name.txt\"");
    }

    #[test]
    fn test_files_query_requires_project_id() {
        let query = FilesQuery {
            project_id: Some(String::new()),
            path: None,
        };
        assert!(query.project_id().is_err());
    }

    #[test]
    fn test_api_options_default() {
        let options = ApiOptions::default();
        assert_eq!(options.allowed_origins, vec!["http://localhost:5173"]);
        assert_eq!(options.max_body_bytes, 100 * 1024 * 1024);
    }
}
