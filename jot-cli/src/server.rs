//! HTTP API over the task store and the inference passes.

use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{Context, Result};
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::{NaiveDate, Utc};
use jot_core::{
    analyze, explain, extract_with, recommendation, validate, ImportanceAnalysis,
    PriorityModel, PriorityRecommendation, TaskDraft, TaskInput, TaskStatus,
};
use jot_store::{Task, TaskPatch, TaskStats, TaskStore};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::limits::{check_description, check_patch_fields, check_priority, check_title};
use crate::llm::build_model;

pub struct AppState {
    store: Mutex<TaskStore>,
    model: Arc<dyn PriorityModel>,
    timezone: String,
}

impl AppState {
    pub fn new(store: TaskStore, model: Arc<dyn PriorityModel>, timezone: impl Into<String>) -> Self {
        Self {
            store: Mutex::new(store),
            model,
            timezone: timezone.into(),
        }
    }

    fn store(&self) -> Result<MutexGuard<'_, TaskStore>, ApiError> {
        self.store
            .lock()
            .map_err(|_| ApiError::internal("task store lock poisoned"))
    }

    fn today(&self) -> Result<NaiveDate, ApiError> {
        jot_core::today_in(&self.timezone).map_err(ApiError::from)
    }

    fn find(&self, id: i64) -> Result<Task, ApiError> {
        self.store()?
            .get(id)?
            .ok_or_else(|| ApiError::not_found(id))
    }
}

/// `(status, message)`, rendered as `{"detail": message}`.
#[derive(Debug)]
pub struct ApiError(StatusCode, String);

impl ApiError {
    fn not_found(id: i64) -> Self {
        Self(StatusCode::NOT_FOUND, format!("task {id} not found"))
    }

    fn bad_request(msg: impl Into<String>) -> Self {
        Self(StatusCode::BAD_REQUEST, msg.into())
    }

    fn unprocessable(msg: impl Into<String>) -> Self {
        Self(StatusCode::UNPROCESSABLE_ENTITY, msg.into())
    }

    fn internal(msg: impl Into<String>) -> Self {
        Self(StatusCode::INTERNAL_SERVER_ERROR, msg.into())
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        tracing::error!("request failed: {e:#}");
        Self::internal(format!("{e:#}"))
    }
}

// Extractor rejections keep their status but use the same body shape.
impl From<JsonRejection> for ApiError {
    fn from(r: JsonRejection) -> Self {
        Self(r.status(), r.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(r: QueryRejection) -> Self {
        Self(r.status(), r.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(r: PathRejection) -> Self {
        Self(r.status(), r.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.0, Json(json!({ "detail": self.1 }))).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Debug, Deserialize)]
pub struct TaskCreate {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default = "default_priority")]
    pub priority: u8,
}

fn default_priority() -> u8 {
    jot_core::DEFAULT_PRIORITY
}

impl TaskCreate {
    fn into_draft(self) -> Result<TaskDraft, ApiError> {
        check_title(&self.title).map_err(ApiError::unprocessable)?;
        check_description(&self.description).map_err(ApiError::unprocessable)?;
        check_priority(self.priority).map_err(ApiError::unprocessable)?;
        let mut draft = TaskDraft::new(self.title)
            .with_description(self.description)
            .with_status(self.status)
            .with_priority(self.priority);
        draft.due_date = self.due_date;
        Ok(draft)
    }
}

fn check_patch(patch: &TaskPatch) -> Result<(), ApiError> {
    if patch.is_empty() {
        return Err(ApiError::bad_request("no update data provided"));
    }
    check_patch_fields(patch).map_err(ApiError::unprocessable)
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<TaskStatus>,
}

#[derive(Debug, Deserialize)]
pub struct TextRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct ParseResponse {
    pub success: bool,
    pub result: TaskDraft,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub result: TaskDraft,
    pub analysis: ImportanceAnalysis,
    pub reason: String,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
    pub task_id: i64,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/api/tasks", get(list_tasks).post(create_task))
        .route(
            "/api/tasks/{id}",
            get(get_task).put(update_task).delete(delete_task),
        )
        .route(
            "/api/tasks/{id}/priority-recommendation",
            get(priority_recommendation),
        )
        .route("/api/tasks/{id}/importance", get(task_importance))
        .route("/api/tasks/{id}/auto-prioritize", put(auto_prioritize))
        .route("/api/ai/parse", post(ai_parse))
        .route("/api/ai/create", post(ai_create))
        .route("/api/ai/analyze", post(ai_analyze))
        .route("/api/stats", get(stats))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Open the configured store and serve until the process is stopped.
pub async fn serve(cfg: &Config) -> Result<()> {
    // Fail on a bad timezone before accepting requests.
    cfg.today()?;

    let db = cfg.database_path()?;
    let store = TaskStore::open(&db)?;
    let model = build_model(&cfg.inference)?;
    let state = Arc::new(AppState::new(store, model, cfg.parser.timezone.clone()));

    let addr = format!("{}:{}", cfg.server.host, cfg.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("bind {addr}"))?;
    tracing::info!(%addr, db = %db.display(), "jot server listening");

    axum::serve(listener, router(state))
        .await
        .context("http server")?;
    Ok(())
}

async fn root() -> Json<Value> {
    Json(json!({
        "service": "jot",
        "version": env!("CARGO_PKG_VERSION"),
        "build": env!("JOT_BUILD_SHA"),
        "endpoints": {
            "tasks": "/api/tasks",
            "ai_parse": "/api/ai/parse",
            "ai_create": "/api/ai/create",
            "ai_analyze": "/api/ai/analyze",
            "stats": "/api/stats",
            "priority_recommendation": "/api/tasks/{id}/priority-recommendation",
            "importance": "/api/tasks/{id}/importance",
            "auto_prioritize": "/api/tasks/{id}/auto-prioritize",
            "health": "/health",
        },
    }))
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
        "service": "jot",
    }))
}

async fn list_tasks(
    State(state): State<Arc<AppState>>,
    q: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult<Vec<Task>> {
    let Query(q) = q?;
    Ok(Json(state.store()?.list(q.status)?))
}

async fn get_task(
    State(state): State<Arc<AppState>>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Task> {
    let Path(id) = id?;
    Ok(Json(state.find(id)?))
}

async fn create_task(
    State(state): State<Arc<AppState>>,
    body: Result<Json<TaskCreate>, JsonRejection>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let Json(body) = body?;
    let draft = body.into_draft()?;
    let task = state.store()?.create(&draft)?;
    Ok((StatusCode::CREATED, Json(task)))
}

async fn update_task(
    State(state): State<Arc<AppState>>,
    id: Result<Path<i64>, PathRejection>,
    patch: Result<Json<TaskPatch>, JsonRejection>,
) -> ApiResult<Task> {
    let Path(id) = id?;
    let Json(patch) = patch?;
    check_patch(&patch)?;
    state
        .store()?
        .update(id, &patch)?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(id))
}

async fn delete_task(
    State(state): State<Arc<AppState>>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<DeleteResponse> {
    let Path(id) = id?;
    if !state.store()?.delete(id)? {
        return Err(ApiError::not_found(id));
    }
    Ok(Json(DeleteResponse {
        success: true,
        message: "task deleted".to_string(),
        task_id: id,
    }))
}

fn parse_text(state: &AppState, text: &str) -> Result<TaskDraft, ApiError> {
    let today = state.today()?;
    let draft = extract_with(text, today, state.model.as_ref());
    Ok(validate(draft.to_input()))
}

async fn ai_parse(
    State(state): State<Arc<AppState>>,
    req: Result<Json<TextRequest>, JsonRejection>,
) -> ApiResult<ParseResponse> {
    let Json(req) = req?;
    let result = parse_text(&state, &req.text)?;
    Ok(Json(ParseResponse {
        success: true,
        result,
        message: format!("parsed with {} model", state.model.name()),
    }))
}

async fn ai_create(
    State(state): State<Arc<AppState>>,
    req: Result<Json<TextRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let Json(req) = req?;
    let draft = parse_text(&state, &req.text)?;
    let task = state.store()?.create(&draft)?;
    Ok((StatusCode::CREATED, Json(task)))
}

async fn ai_analyze(
    State(state): State<Arc<AppState>>,
    req: Result<Json<TextRequest>, JsonRejection>,
) -> ApiResult<AnalyzeResponse> {
    let Json(req) = req?;
    let today = state.today()?;
    let result = parse_text(&state, &req.text)?;
    let input = result.to_input();
    Ok(Json(AnalyzeResponse {
        analysis: analyze(&input, today),
        reason: explain(&req.text, &input, today),
        result,
    }))
}

async fn stats(State(state): State<Arc<AppState>>) -> ApiResult<TaskStats> {
    let today = state.today()?;
    Ok(Json(state.store()?.stats(today)?))
}

async fn priority_recommendation(
    State(state): State<Arc<AppState>>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<PriorityRecommendation> {
    let Path(id) = id?;
    let task = state.find(id)?;
    let today = state.today()?;
    Ok(Json(recommendation(
        &TaskInput::from(&task),
        state.model.as_ref(),
        today,
    )))
}

async fn task_importance(
    State(state): State<Arc<AppState>>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<ImportanceAnalysis> {
    let Path(id) = id?;
    let task = state.find(id)?;
    let today = state.today()?;
    Ok(Json(analyze(&TaskInput::from(&task), today)))
}

async fn auto_prioritize(
    State(state): State<Arc<AppState>>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Task> {
    let Path(id) = id?;
    let task = state.find(id)?;
    let today = state.today()?;
    // Model call happens outside the store lock.
    let priority = state.model.recommend(&TaskInput::from(&task), today);
    tracing::info!(id, from = task.priority, to = priority, "auto-prioritize");
    state
        .store()?
        .update(id, &TaskPatch::priority(priority))?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use chrono::Duration;
    use jot_core::RuleModel;
    use tower::ServiceExt;

    fn app() -> Router {
        let store = TaskStore::open_in_memory().unwrap();
        router(Arc::new(AppState::new(store, Arc::new(RuleModel), "UTC")))
    }

    fn today() -> NaiveDate {
        jot_core::today_in("UTC").unwrap()
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let req = match body {
            Some(b) => builder
                .header("content-type", "application/json")
                .body(Body::from(b.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), 1_000_000)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    #[tokio::test]
    async fn test_health_and_root() {
        let app = app();
        let (status, body) = send(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["service"], "jot");

        let (status, body) = send(&app, "GET", "/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["endpoints"]["tasks"], "/api/tasks");
        assert!(body["build"].as_str().is_some_and(|b| !b.is_empty()));
    }

    #[tokio::test]
    async fn test_create_get_list() {
        let app = app();
        let (status, created) = send(
            &app,
            "POST",
            "/api/tasks",
            Some(json!({ "title": "Pay rent", "priority": 2, "due_date": "2026-03-01" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["title"], "Pay rent");
        assert_eq!(created["status"], "pending");
        assert_eq!(created["due_date"], "2026-03-01");
        let id = created["id"].as_i64().unwrap();

        let (status, fetched) = send(&app, "GET", &format!("/api/tasks/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched, created);

        send(
            &app,
            "POST",
            "/api/tasks",
            Some(json!({ "title": "Old thing", "status": "completed" })),
        )
        .await;

        let (_, all) = send(&app, "GET", "/api/tasks", None).await;
        assert_eq!(all.as_array().unwrap().len(), 2);
        let (_, pending) = send(&app, "GET", "/api/tasks?status=pending", None).await;
        let pending = pending.as_array().unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0]["id"], id);
    }

    #[tokio::test]
    async fn test_create_rejects_bad_fields() {
        let app = app();
        for body in [
            json!({ "title": "" }),
            json!({ "title": "x".repeat(201) }),
            json!({ "title": "ok", "priority": 6 }),
            json!({ "title": "ok", "priority": 0 }),
            json!({ "title": "ok", "description": "d".repeat(1001) }),
        ] {
            let (status, err) = send(&app, "POST", "/api/tasks", Some(body.clone())).await;
            assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{body}");
            assert!(err["detail"].is_string());
        }
    }

    #[tokio::test]
    async fn test_malformed_requests_use_detail_body() {
        let app = app();
        let cases = [
            (
                "POST",
                "/api/tasks",
                Some(json!({ "title": "x", "priority": -1 })),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                "POST",
                "/api/tasks",
                Some(json!({ "title": "x", "status": "blocked" })),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            ("GET", "/api/tasks?status=blocked", None, StatusCode::BAD_REQUEST),
            ("GET", "/api/tasks/abc", None, StatusCode::BAD_REQUEST),
            (
                "PUT",
                "/api/tasks/abc",
                Some(json!({ "priority": 1 })),
                StatusCode::BAD_REQUEST,
            ),
            ("POST", "/api/ai/parse", Some(json!({})), StatusCode::UNPROCESSABLE_ENTITY),
            (
                "POST",
                "/api/ai/create",
                Some(json!({ "txt": "typo" })),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
        ];
        for (method, uri, body, expected) in cases {
            let (status, err) = send(&app, method, uri, body).await;
            assert_eq!(status, expected, "{method} {uri}");
            assert!(
                err["detail"].as_str().is_some_and(|d| !d.is_empty()),
                "{method} {uri} → {err}"
            );
        }
    }

    #[tokio::test]
    async fn test_missing_content_type_uses_detail_body() {
        let app = app();
        let req = Request::builder()
            .method("POST")
            .uri("/api/ai/parse")
            .body(Body::from(r#"{"text":"hi"}"#))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        let bytes = axum::body::to_bytes(resp.into_body(), 10_000).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert!(body["detail"].is_string());
    }

    #[tokio::test]
    async fn test_missing_task_is_404() {
        let app = app();
        for (method, uri) in [
            ("GET", "/api/tasks/99"),
            ("DELETE", "/api/tasks/99"),
            ("GET", "/api/tasks/99/priority-recommendation"),
            ("GET", "/api/tasks/99/importance"),
            ("PUT", "/api/tasks/99/auto-prioritize"),
        ] {
            let (status, err) = send(&app, method, uri, None).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{method} {uri}");
            assert_eq!(err["detail"], "task 99 not found");
        }

        let (status, _) = send(&app, "PUT", "/api/tasks/99", Some(json!({ "priority": 1 }))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let app = app();
        let (_, created) = send(&app, "POST", "/api/tasks", Some(json!({ "title": "Draft" }))).await;
        let id = created["id"].as_i64().unwrap();
        let uri = format!("/api/tasks/{id}");

        let (status, err) = send(&app, "PUT", &uri, Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["detail"], "no update data provided");

        let (status, updated) = send(
            &app,
            "PUT",
            &uri,
            Some(json!({ "status": "in_progress", "priority": 1 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["title"], "Draft");
        assert_eq!(updated["status"], "in_progress");
        assert_eq!(updated["priority"], 1);

        let (status, body) = send(&app, "DELETE", &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["task_id"], id);

        let (status, _) = send(&app, "GET", &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_ai_parse() {
        let app = app();
        let (status, body) = send(
            &app,
            "POST",
            "/api/ai/parse",
            Some(json!({ "text": "Urgent! Must finish report today" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "parsed with rules model");
        assert_eq!(body["result"]["priority"], 1);
        assert_eq!(body["result"]["due_date"], today().to_string());

        // Nothing stored.
        let (_, all) = send(&app, "GET", "/api/tasks", None).await;
        assert!(all.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ai_parse_empty_text() {
        let app = app();
        let (status, body) = send(&app, "POST", "/api/ai/parse", Some(json!({ "text": "" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["result"]["title"], "Untitled Task");
        assert_eq!(body["result"]["priority"], 3);
        assert_eq!(body["result"]["status"], "pending");
    }

    #[tokio::test]
    async fn test_ai_create_and_analyze() {
        let app = app();
        let text = "Meeting tomorrow at 3pm to discuss progress, this is important";
        let (status, task) = send(&app, "POST", "/api/ai/create", Some(json!({ "text": text }))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(task["priority"], 2);
        assert_eq!(task["due_date"], (today() + Duration::days(1)).to_string());
        assert!(task["description"].as_str().unwrap().contains("(time: 15:00)"));

        let (status, body) = send(&app, "POST", "/api/ai/analyze", Some(json!({ "text": text }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["result"]["priority"], 2);
        assert_eq!(body["analysis"]["importance"], "high");
        assert!(body["reason"].as_str().unwrap().contains("Important"));
    }

    #[tokio::test]
    async fn test_recommendation_importance_and_auto_prioritize() {
        let app = app();
        let (_, created) = send(
            &app,
            "POST",
            "/api/tasks",
            Some(json!({ "title": "urgent: renew visa", "priority": 5 })),
        )
        .await;
        let id = created["id"].as_i64().unwrap();

        let (status, rec) =
            send(&app, "GET", &format!("/api/tasks/{id}/priority-recommendation"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(rec["current_priority"], 5);
        assert_eq!(rec["recommended_priority"], 1);
        assert!(rec["confidence"].as_f64().unwrap() <= 1.0);

        let (status, imp) = send(&app, "GET", &format!("/api/tasks/{id}/importance"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert!((1..=5).contains(&imp["priority"].as_i64().unwrap()));

        let (status, task) =
            send(&app, "PUT", &format!("/api/tasks/{id}/auto-prioritize"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(task["priority"], 1);
    }

    #[tokio::test]
    async fn test_stats() {
        let app = app();
        send(&app, "POST", "/api/tasks", Some(json!({ "title": "a", "priority": 1 }))).await;
        send(
            &app,
            "POST",
            "/api/tasks",
            Some(json!({ "title": "b", "status": "completed" })),
        )
        .await;

        let (status, s) = send(&app, "GET", "/api/stats", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(s["total"], 2);
        assert_eq!(s["completed"], 1);
        assert_eq!(s["completion_rate"], 50.0);
        assert_eq!(s["high_priority_tasks"], 1);
        assert_eq!(s["priority_distribution"]["priority_1"], 1);
    }
}
