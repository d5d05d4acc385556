mod acl;
pub mod auth;
pub mod config;
pub mod reconcile;

use axum::http::{HeaderName, HeaderValue};
use axum::middleware;
use axum::response::Response as AxumResponse;
use axum::{
    Json, Router,
    extract::{Extension, Path, Query, State},
    http::{Method, StatusCode, header},
    routing::{get, post},
};
use bcrypt::verify;
use chorewheel_shared::api;
use chorewheel_shared::domain::{ChoreStatus, RewardKind};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{Span, info_span};
use uuid::Uuid;

pub use config::{AppConfig, ConfigError, FamilyConfig, UserConfig};

use crate::lifecycle::{Engine, LifecycleError, SubmitRequest, timer};
use crate::server::auth::AuthCtx;
use crate::storage::models::{Chore, CompletedTask, Submission, User};
use crate::storage::{ChoreDraft, Store};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub store: Store,
    pub engine: Engine,
    shutdown: CancellationToken,
}

impl AppState {
    pub fn new(config: AppConfig, store: Store) -> Self {
        let engine = Engine::new(store.clone());
        Self {
            config,
            store,
            engine,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }
}

#[derive(Clone, Debug)]
struct ReqId(pub String);

pub fn router(state: AppState) -> Router {
    let private = Router::new()
        .route(
            "/api/v1/family/{family_id}/chores",
            get(api_list_chores).post(api_create_chore),
        )
        .route(
            "/api/v1/family/{family_id}/chores/{chore_id}",
            get(api_get_chore),
        )
        .route(
            "/api/v1/family/{family_id}/chores/{chore_id}/assign",
            post(api_assign_chore),
        )
        .route(
            "/api/v1/family/{family_id}/chores/{chore_id}/accept",
            post(api_accept_chore),
        )
        .route(
            "/api/v1/family/{family_id}/chores/{chore_id}/decline",
            post(api_decline_chore),
        )
        .route(
            "/api/v1/family/{family_id}/chores/{chore_id}/submit",
            post(api_submit_chore),
        )
        .route(
            "/api/v1/family/{family_id}/chores/{chore_id}/submissions/{submission_id}/approve",
            post(api_approve_submission),
        )
        .route(
            "/api/v1/family/{family_id}/chores/{chore_id}/submissions/{submission_id}/reject",
            post(api_reject_submission),
        )
        .route("/api/v1/family/{family_id}/children", get(api_list_children))
        .route(
            "/api/v1/family/{family_id}/children/{child_id}/earnings",
            get(api_child_earnings),
        )
        .with_state(state.clone())
        // Layers run outside-in: bearer auth first, then ACL, then span
        // enrichment once an identity is attached.
        .layer(middleware::from_fn(set_auth_span_fields))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            acl::enforce_acl,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_bearer,
        ));

    // Trace with request context (method, path, request_id)
    let trace = TraceLayer::new_for_http().make_span_with(|req: &axum::http::Request<_>| {
        let request_id = req
            .extensions()
            .get::<ReqId>()
            .map(|r| r.0.clone())
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        info_span!(
            "request",
            method = %req.method(),
            path = %req.uri().path(),
            request_id = %request_id,
            username = tracing::field::Empty,
            role = tracing::field::Empty,
            family_id = tracing::field::Empty
        )
    });

    let app = Router::new()
        .route("/healthz", get(health))
        .route("/api/v1/auth/login", post(api_auth_login))
        .merge(private)
        .with_state(state.clone())
        .layer(trace)
        .layer(middleware::from_fn(add_request_id));

    // Optionally add CORS for dev if configured
    if let Some(origin) = &state.config.dev_cors_origin {
        let hv = header::HeaderValue::from_str(origin)
            .unwrap_or(header::HeaderValue::from_static("http://localhost:5173"));
        let cors = CorsLayer::new()
            .allow_origin(hv)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);
        app.layer(cors)
    } else {
        app
    }
}

async fn health() -> &'static str {
    "ok"
}

async fn add_request_id(
    mut req: axum::http::Request<axum::body::Body>,
    next: axum::middleware::Next,
) -> Result<AxumResponse, AppError> {
    let hdr = HeaderName::from_static("x-request-id");
    // Use provided x-request-id if present, else generate
    let rid = req
        .headers()
        .get(&hdr)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    req.extensions_mut().insert(ReqId(rid.clone()));
    let mut resp = next.run(req).await;
    if let Ok(hv) = HeaderValue::from_str(&rid) {
        resp.headers_mut().insert(hdr, hv);
    }
    Ok(resp)
}

async fn set_auth_span_fields(
    req: axum::http::Request<axum::body::Body>,
    next: axum::middleware::Next,
) -> Result<AxumResponse, AppError> {
    if let Some(auth) = req.extensions().get::<AuthCtx>() {
        let span = Span::current();
        span.record("username", tracing::field::display(&auth.claims.sub));
        span.record("role", tracing::field::debug(auth.claims.role));
        span.record("family_id", tracing::field::display(auth.claims.family_id));
    }
    Ok(next.run(req).await)
}

async fn api_auth_login(
    State(state): State<AppState>,
    Json(body): Json<api::AuthReq>,
) -> Result<Json<api::AuthResp>, AppError> {
    let user = state
        .store
        .get_user_by_username(&body.username)
        .await
        .map_err(AppError::internal)?
        .ok_or_else(|| {
            tracing::warn!(username=%body.username, "login: unknown username");
            AppError::unauthorized()
        })?;
    if !verify(&body.password, &user.password_hash).map_err(|e| {
        tracing::error!(username=%body.username, error=%e, "login: bcrypt verify failed");
        AppError::internal(e)
    })? {
        tracing::warn!(username=%body.username, "login: invalid password");
        return Err(AppError::unauthorized());
    }
    let token = auth::issue_jwt_for_user(&state, &user)?;
    Ok(Json(api::AuthResp { token }))
}

#[derive(Deserialize)]
struct ChorePath {
    family_id: i32,
    chore_id: i32,
}

#[derive(Deserialize)]
struct SubmissionPath {
    family_id: i32,
    chore_id: i32,
    submission_id: i32,
}

#[derive(Deserialize)]
struct ChildPath {
    family_id: i32,
    child_id: i32,
}

#[derive(Deserialize)]
struct ListChoresOpts {
    status: Option<String>,
    assignee: Option<i32>,
}

async fn api_list_chores(
    State(state): State<AppState>,
    Extension(_auth): Extension<AuthCtx>,
    Path(family_id): Path<i32>,
    Query(opts): Query<ListChoresOpts>,
) -> Result<Json<Vec<api::ChoreDto>>, AppError> {
    let status = match opts.status.as_deref() {
        Some(s) => Some(
            s.parse::<ChoreStatus>()
                .map_err(|e| AppError::bad_request(e.to_string()))?,
        ),
        None => None,
    };
    let rows = state
        .store
        .list_chores(family_id, status, opts.assignee)
        .await
        .map_err(AppError::internal)?;
    let items = rows
        .iter()
        .map(chore_dto)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(items))
}

async fn api_create_chore(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
    Path(family_id): Path<i32>,
    Json(body): Json<api::CreateChoreReq>,
) -> Result<(StatusCode, Json<api::ChoreDto>), AppError> {
    let draft = validate_chore_draft(body)?;
    let chore = state
        .store
        .create_chore(family_id, auth.claims.user_id, draft)
        .await
        .map_err(AppError::internal)?;
    Ok((StatusCode::CREATED, Json(chore_dto(&chore)?)))
}

async fn api_get_chore(
    State(state): State<AppState>,
    Extension(_auth): Extension<AuthCtx>,
    Path(p): Path<ChorePath>,
) -> Result<Json<api::ChoreDetailDto>, AppError> {
    let chore = state
        .store
        .get_chore(p.family_id, p.chore_id)
        .await
        .map_err(AppError::internal)?
        .ok_or_else(|| AppError::not_found("chore not found"))?;
    let submissions = state
        .store
        .list_submissions_for_chore(chore.id)
        .await
        .map_err(AppError::internal)?;
    let completions = state
        .store
        .list_completions_for_chore(chore.id)
        .await
        .map_err(AppError::internal)?;
    Ok(Json(api::ChoreDetailDto {
        chore: chore_dto(&chore)?,
        submissions: submissions
            .iter()
            .map(submission_dto)
            .collect::<Result<Vec<_>, _>>()?,
        completions: completions
            .iter()
            .map(completed_task_dto)
            .collect::<Result<Vec<_>, _>>()?,
    }))
}

async fn api_assign_chore(
    State(state): State<AppState>,
    Extension(_auth): Extension<AuthCtx>,
    Path(p): Path<ChorePath>,
) -> Result<Json<api::ChoreDto>, AppError> {
    let chore = state.engine.assign(p.family_id, p.chore_id).await?;
    Ok(Json(chore_dto(&chore)?))
}

async fn api_accept_chore(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
    Path(p): Path<ChorePath>,
) -> Result<Json<api::ChoreDto>, AppError> {
    let chore = state
        .engine
        .accept(p.family_id, p.chore_id, auth.claims.user_id)
        .await?;
    Ok(Json(chore_dto(&chore)?))
}

async fn api_decline_chore(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
    Path(p): Path<ChorePath>,
) -> Result<Json<api::ChoreDto>, AppError> {
    let chore = state
        .engine
        .decline(p.family_id, p.chore_id, auth.claims.user_id)
        .await?;
    Ok(Json(chore_dto(&chore)?))
}

async fn api_submit_chore(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
    Path(p): Path<ChorePath>,
    Json(body): Json<api::SubmitChoreReq>,
) -> Result<Json<api::SubmissionDto>, AppError> {
    let submission = state
        .engine
        .submit(
            p.family_id,
            p.chore_id,
            auth.claims.user_id,
            SubmitRequest {
                notes: body.notes,
                photo_url: body.photo_url,
            },
        )
        .await?;
    Ok(Json(submission_dto(&submission)?))
}

async fn api_approve_submission(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
    Path(p): Path<SubmissionPath>,
) -> Result<Json<api::ApproveRespDto>, AppError> {
    let ledger = state
        .engine
        .approve(p.family_id, p.chore_id, p.submission_id, auth.claims.user_id)
        .await?;
    Ok(Json(api::ApproveRespDto {
        chore_id: ledger.chore_id,
        child_id: ledger.user_id,
        reward_kind: ledger
            .reward_kind
            .parse::<RewardKind>()
            .map_err(AppError::internal)?,
        reward_earned: ledger.reward_earned,
    }))
}

async fn api_reject_submission(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
    Path(p): Path<SubmissionPath>,
    Json(body): Json<api::RejectSubmissionReq>,
) -> Result<Json<api::SubmissionDto>, AppError> {
    let submission = state
        .engine
        .reject(
            p.family_id,
            p.chore_id,
            p.submission_id,
            auth.claims.user_id,
            body.reason,
        )
        .await?;
    Ok(Json(submission_dto(&submission)?))
}

async fn api_list_children(
    State(state): State<AppState>,
    Extension(_auth): Extension<AuthCtx>,
    Path(family_id): Path<i32>,
) -> Result<Json<Vec<api::ChildDto>>, AppError> {
    let rows = state
        .store
        .list_children(family_id)
        .await
        .map_err(AppError::internal)?;
    let items = rows
        .into_iter()
        .map(|u| api::ChildDto {
            id: u.id,
            display_name: u.display_name,
        })
        .collect();
    Ok(Json(items))
}

async fn api_child_earnings(
    State(state): State<AppState>,
    Extension(_auth): Extension<AuthCtx>,
    Path(p): Path<ChildPath>,
) -> Result<Json<api::EarningsDto>, AppError> {
    let child: User = state
        .store
        .get_child(p.family_id, p.child_id)
        .await
        .map_err(AppError::internal)?
        .ok_or_else(|| AppError::not_found(format!("child not found: {}", p.child_id)))?;
    let completions = state
        .store
        .list_completions_for_user(child.id)
        .await
        .map_err(AppError::internal)?;
    Ok(Json(api::EarningsDto {
        child_id: child.id,
        display_name: child.display_name,
        money_balance: child.money_balance,
        screen_time_balance: child.screen_time_balance,
        completions: completions
            .iter()
            .map(completed_task_dto)
            .collect::<Result<Vec<_>, _>>()?,
    }))
}

fn validate_chore_draft(req: api::CreateChoreReq) -> Result<ChoreDraft, AppError> {
    let title = req.title.trim().to_string();
    if title.len() < 2 {
        return Err(AppError::bad_request("title must be at least 2 characters"));
    }
    if req.reward_amount <= 0 {
        return Err(AppError::bad_request("reward amount must be positive"));
    }
    let acceptance_timer = req.acceptance_timer.unwrap_or(5);
    if !(1..=60).contains(&acceptance_timer) {
        return Err(AppError::bad_request("acceptance timer must be 1-60 minutes"));
    }
    let completion_timer_duration = req.completion_timer_duration.unwrap_or(0);
    if req.completion_timer_enabled && completion_timer_duration < 1 {
        return Err(AppError::bad_request("completion timer must be positive"));
    }
    let completion_timer_penalty = req.completion_timer_penalty.unwrap_or(0);
    if completion_timer_penalty < 0 {
        return Err(AppError::bad_request("penalty must be non-negative"));
    }
    let reduction_amount = req.reduction_amount.unwrap_or(0);
    if reduction_amount < 0 {
        return Err(AppError::bad_request("reduction amount must be non-negative"));
    }
    Ok(ChoreDraft {
        title,
        description: req
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty()),
        reward_kind: req.reward_kind,
        reward_amount: req.reward_amount,
        requires_photo: req.requires_photo,
        acceptance_timer,
        completion_timer_enabled: req.completion_timer_enabled,
        completion_timer_duration,
        completion_timer_penalty,
        reduction_enabled: req.reduction_enabled,
        reduction_amount,
    })
}

fn rfc3339(dt: NaiveDateTime) -> String {
    chrono::DateTime::<chrono::Utc>::from_naive_utc_and_offset(dt, chrono::Utc).to_rfc3339()
}

fn chore_dto(c: &Chore) -> Result<api::ChoreDto, AppError> {
    Ok(api::ChoreDto {
        id: c.id,
        family_id: c.family_id,
        title: c.title.clone(),
        description: c.description.clone(),
        reward_kind: c.reward_kind().map_err(AppError::internal)?,
        original_reward: c.original_reward,
        current_reward: c.current_reward,
        requires_photo: c.requires_photo,
        status: c.status().map_err(AppError::internal)?,
        current_assignee: c.current_assignee,
        first_assignee_id: c.first_assignee_id,
        acceptance_timer: c.acceptance_timer,
        completion_timer_enabled: c.completion_timer_enabled,
        completion_timer_duration: c.completion_timer_duration,
        completion_timer_penalty: c.completion_timer_penalty,
        reduction_enabled: c.reduction_enabled,
        reduction_amount: c.reduction_amount,
        created_by: c.created_by,
        created_at: rfc3339(c.created_at),
        acceptance_deadline: timer::chore_acceptance_deadline(c).map(rfc3339),
        completion_deadline: timer::chore_completion_deadline(c).map(rfc3339),
    })
}

fn submission_dto(s: &Submission) -> Result<api::SubmissionDto, AppError> {
    Ok(api::SubmissionDto {
        id: s.id,
        chore_id: s.chore_id,
        user_id: s.user_id,
        assignment_id: s.assignment_id,
        photo_url: s.photo_url.clone(),
        notes: s.notes.clone(),
        status: s.status().map_err(AppError::internal)?,
        submitted_at: rfc3339(s.submitted_at),
        reviewed_by: s.reviewed_by,
        reviewed_at: s.reviewed_at.map(rfc3339),
        rejection_reason: s.rejection_reason.clone(),
    })
}

fn completed_task_dto(t: &CompletedTask) -> Result<api::CompletedTaskDto, AppError> {
    Ok(api::CompletedTaskDto {
        id: t.id,
        chore_id: t.chore_id,
        user_id: t.user_id,
        assignment_id: t.assignment_id,
        submission_id: t.submission_id,
        reward_kind: t
            .reward_kind
            .parse::<RewardKind>()
            .map_err(AppError::internal)?,
        reward_earned: t.reward_earned,
        approved_by: t.approved_by,
        completed_at: rfc3339(t.completed_at),
    })
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    Unauthorized,
    Forbidden,
    NotFound(String),
    PreconditionFailed(String),
    Conflict,
    NoEligibleAssignee,
    StoreUnavailable(String),
    Internal(String),
}

impl AppError {
    fn bad_request<T: Into<String>>(msg: T) -> Self {
        Self::BadRequest(msg.into())
    }
    fn unauthorized() -> Self {
        Self::Unauthorized
    }
    fn forbidden() -> Self {
        Self::Forbidden
    }
    fn not_found<T: Into<String>>(msg: T) -> Self {
        Self::NotFound(msg.into())
    }
    fn internal<E: std::fmt::Display>(e: E) -> Self {
        Self::Internal(e.to_string())
    }
}

impl From<LifecycleError> for AppError {
    fn from(e: LifecycleError) -> Self {
        match e {
            LifecycleError::NotFound(m) => AppError::NotFound(m.to_string()),
            LifecycleError::PreconditionFailed(m) => AppError::PreconditionFailed(m.to_string()),
            LifecycleError::Conflict => AppError::Conflict,
            LifecycleError::Validation(m) => AppError::BadRequest(m.to_string()),
            LifecycleError::NoEligibleAssignee => AppError::NoEligibleAssignee,
            LifecycleError::StoreUnavailable(e) => AppError::StoreUnavailable(e.to_string()),
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        // Stable kind strings; `conflict` and `store_unavailable` are safe to
        // retry, the rest are not.
        let (status, kind, msg, detail) = match self {
            AppError::BadRequest(m) => (StatusCode::BAD_REQUEST, "validation", m, None),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "unauthorized".into(),
                None,
            ),
            AppError::Forbidden => {
                (StatusCode::FORBIDDEN, "forbidden", "forbidden".into(), None)
            }
            AppError::NotFound(m) => (StatusCode::NOT_FOUND, "not_found", m, None),
            AppError::PreconditionFailed(m) => {
                (StatusCode::CONFLICT, "precondition_failed", m, None)
            }
            AppError::Conflict => (
                StatusCode::CONFLICT,
                "conflict",
                "chore was modified concurrently; retry".into(),
                None,
            ),
            AppError::NoEligibleAssignee => (
                StatusCode::CONFLICT,
                "no_eligible_assignee",
                "no active children available for assignment".into(),
                None,
            ),
            // Do not leak store/internal error details to clients, but log them
            AppError::StoreUnavailable(m) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "store_unavailable",
                "storage temporarily unavailable; retry with backoff".into(),
                Some(m),
            ),
            AppError::Internal(m) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal",
                "internal server error".into(),
                Some(m),
            ),
        };
        if let Some(detail) = detail {
            tracing::error!(status = %status, kind = kind, message = %msg, detail = %detail, "request failed");
        } else {
            tracing::error!(status = %status, kind = kind, message = %msg, "request failed");
        }
        let body = axum::Json(ErrorBody {
            error: kind,
            message: msg,
        });
        (status, body).into_response()
    }
}
