//! API Routes
//!
//! HTTP endpoint definitions.

use axum::{
    extract::{Extension, State},
    http::StatusCode,
    middleware,
    routing::{get, post, put},
    Json, Router,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::auth::SignedToken;
use crate::domain::{
    DomainError, Identity, OperationContext, Page, PageRequest, Release, ReleaseFilter,
    ReleaseStatus, ReleaseType, User,
};
use crate::error::{AppError, AppResult};
use crate::handlers::{RegisterUserCommand, ReleaseCommand};

use super::extract::{FormBody, JsonBody, PathParam, QueryParams};
use super::middleware::auth_middleware;
use super::AppState;

pub const UNABLE_TO_QUERY: &str = "unable to perform the query";
pub const PASSWORD_GRANT: &str = "password";

const DEFAULT_PAGE_SIZE: i64 = 10;

// =========================================================================
// Request/Response types
// =========================================================================

#[derive(Debug, Deserialize)]
pub struct RegisterUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub roles: Vec<String>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            roles: user.roles,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AuthenticateRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub email: String,
}

/// Password grant form
#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub grant_type: String,
    pub username: String,
    pub password: String,
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub user_id: i64,
    pub balance: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct ExtractQuery {
    #[serde(rename = "releaseType")]
    pub release_type: ReleaseType,
}

#[derive(Debug, Serialize)]
pub struct ExtractResponse {
    pub user_id: i64,
    pub release_type: ReleaseType,
    pub extract: Decimal,
}

/// Release search. `mes` and `ano` are the month and year.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseSearchQuery {
    pub description: Option<String>,
    pub mes: Option<i32>,
    pub ano: Option<i32>,
    pub user_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct PaginationQuery {
    #[serde(default)]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub size: i64,
}

fn default_page_size() -> i64 {
    DEFAULT_PAGE_SIZE
}

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub status: ReleaseStatus,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseRequest {
    pub id: Option<i64>,
    pub description: Option<String>,
    pub month: Option<i32>,
    pub year: Option<i32>,
    pub value: Option<Decimal>,
    pub user_id: Option<i64>,
    #[serde(rename = "type")]
    pub release_type: Option<ReleaseType>,
    pub status: Option<ReleaseStatus>,
    pub release_date: Option<NaiveDate>,
}

impl From<ReleaseRequest> for ReleaseCommand {
    fn from(request: ReleaseRequest) -> Self {
        Self {
            id: request.id,
            description: request.description,
            month: request.month,
            year: request.year,
            value: request.value,
            user_id: request.user_id,
            release_type: request.release_type,
            status: request.status,
            release_date: request.release_date,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseResponse {
    pub id: Option<i64>,
    pub description: String,
    pub month: Option<i32>,
    pub year: Option<i32>,
    pub value: Option<Decimal>,
    pub user_id: Option<i64>,
    #[serde(rename = "type")]
    pub release_type: Option<ReleaseType>,
    pub status: Option<ReleaseStatus>,
    pub release_date: Option<NaiveDate>,
    pub created_at: Option<NaiveDate>,
}

impl From<Release> for ReleaseResponse {
    fn from(release: Release) -> Self {
        Self {
            id: release.id,
            description: release.description,
            month: release.month,
            year: release.year,
            value: release.value,
            user_id: release.user_id,
            release_type: release.release_type,
            status: release.status,
            release_date: release.release_date,
            created_at: release.created_at,
        }
    }
}

fn to_responses(releases: Vec<Release>) -> Vec<ReleaseResponse> {
    releases.into_iter().map(ReleaseResponse::from).collect()
}

// =========================================================================
// API Router
// =========================================================================

/// Create the API router. Everything except registration, login, identity
/// search and the token endpoint requires a bearer token.
pub fn create_router(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/users", post(register_user))
        .route("/users/auth", post(authenticate_user))
        .route("/users/search", get(search_user))
        .route("/oauth/token", post(issue_token));

    let protected = Router::new()
        .route("/users/:id/balance", get(get_balance))
        .route("/users/:id/extract", get(get_extract))
        .route("/releases", get(find_releases).put(update_release))
        .route("/releases/create-release", post(create_release))
        .route("/releases/last-releases/:id", get(last_releases))
        .route("/releases/:id", get(get_release).delete(delete_release))
        .route("/releases/:id/releases-paginated", get(releases_paginated))
        .route("/releases/:id/update-status", put(update_status))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    public.merge(protected)
}

/// Callers may only act on their own user
fn ensure_owner(identity: &Identity, user_id: i64) -> AppResult<()> {
    if identity.id != user_id {
        return Err(DomainError::Forbidden(format!(
            "user {} may not access data of user {}",
            identity.id, user_id
        ))
        .into());
    }
    Ok(())
}

/// Existence first (404), then ownership (403)
async fn ensure_existing_owner(state: &AppState, identity: &Identity, user_id: i64) -> AppResult<()> {
    if state.users.get_by_id(user_id).await?.is_none() {
        return Err(DomainError::UserNotFound(user_id).into());
    }
    ensure_owner(identity, user_id)
}

/// Load a release the caller owns. A missing release is `ReleaseNotFound`.
async fn owned_release(state: &AppState, identity: &Identity, id: i64) -> AppResult<Release> {
    let release = state
        .releases
        .find_by_id(id)
        .await?
        .ok_or(DomainError::ReleaseNotFound(id))?;

    if release.user_id != Some(identity.id) {
        return Err(DomainError::Forbidden(format!("release {} belongs to another user", id)).into());
    }
    Ok(release)
}

// =========================================================================
// Users
// =========================================================================

/// POST /users
async fn register_user(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<RegisterUserRequest>,
) -> AppResult<(StatusCode, Json<UserResponse>)> {
    let command = RegisterUserCommand::new(request.name, request.email, request.password);
    let user = state.users.register_user(command).await?;

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// POST /users/auth
async fn authenticate_user(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<AuthenticateRequest>,
) -> AppResult<Json<Identity>> {
    let identity = state
        .users
        .verify_credentials(&request.email, &request.password)
        .await?;
    Ok(Json(identity))
}

/// GET /users/search?email=
async fn search_user(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<SearchQuery>,
) -> AppResult<Json<Identity>> {
    Ok(Json(state.users.find_by_email(&query.email).await?))
}

/// POST /oauth/token
async fn issue_token(
    State(state): State<AppState>,
    FormBody(request): FormBody<TokenRequest>,
) -> AppResult<Json<SignedToken>> {
    if request.grant_type != PASSWORD_GRANT {
        return Err(AppError::UnsupportedGrantType(request.grant_type));
    }
    if !state
        .tokens
        .verify_client(&request.client_id, &request.client_secret)
    {
        tracing::warn!(client_id = %request.client_id, "Rejected token request from unknown client");
        return Err(AppError::Unauthorized("Invalid client credentials".to_string()));
    }

    let user = state
        .users
        .authenticate(&request.username, &request.password)
        .await
        .map_err(|e| match e {
            AppError::Domain(DomainError::Authentication(msg)) => AppError::Unauthorized(msg),
            other => other,
        })?;

    Ok(Json(state.tokens.issue_token(&user)?))
}

/// GET /users/:id/balance
async fn get_balance(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    PathParam(user_id): PathParam<i64>,
) -> AppResult<Json<BalanceResponse>> {
    ensure_existing_owner(&state, &identity, user_id).await?;
    let balance = state.projection.get_balance_by_user(user_id).await?;

    Ok(Json(BalanceResponse { user_id, balance }))
}

/// GET /users/:id/extract?releaseType=
async fn get_extract(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    PathParam(user_id): PathParam<i64>,
    QueryParams(query): QueryParams<ExtractQuery>,
) -> AppResult<Json<ExtractResponse>> {
    ensure_existing_owner(&state, &identity, user_id).await?;
    let extract = state
        .projection
        .get_extract_by_release_type(user_id, query.release_type)
        .await?;

    Ok(Json(ExtractResponse {
        user_id,
        release_type: query.release_type,
        extract,
    }))
}

// =========================================================================
// Releases
// =========================================================================

/// GET /releases?description=&mes=&ano=&userId=
///
/// Without `userId` the search is scoped to the caller.
async fn find_releases(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    QueryParams(query): QueryParams<ReleaseSearchQuery>,
) -> AppResult<Json<Vec<ReleaseResponse>>> {
    let user_id = query.user_id.unwrap_or(identity.id);
    if state.users.get_by_id(user_id).await?.is_none() {
        return Err(AppError::InvalidRequest(UNABLE_TO_QUERY.to_string()));
    }
    ensure_owner(&identity, user_id)?;

    let mut filter = ReleaseFilter::new().with_user(user_id);
    if let Some(description) = query.description {
        filter = filter.with_description(description);
    }
    if let Some(month) = query.mes {
        filter = filter.with_month(month);
    }
    if let Some(year) = query.ano {
        filter = filter.with_year(year);
    }

    let releases = state.releases.find(&filter).await?;
    Ok(Json(to_responses(releases)))
}

/// GET /releases/:id
async fn get_release(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    PathParam(id): PathParam<i64>,
) -> AppResult<Json<ReleaseResponse>> {
    let release = state
        .releases
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Release {} not found", id)))?;

    if release.user_id != Some(identity.id) {
        return Err(DomainError::Forbidden(format!("release {} belongs to another user", id)).into());
    }

    Ok(Json(release.into()))
}

/// GET /releases/last-releases/:id
async fn last_releases(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    PathParam(user_id): PathParam<i64>,
) -> AppResult<Json<Vec<ReleaseResponse>>> {
    ensure_owner(&identity, user_id)?;
    let releases = state.projection.last_releases(user_id).await?;
    Ok(Json(to_responses(releases)))
}

/// GET /releases/:id/releases-paginated?page=&size=
async fn releases_paginated(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    PathParam(user_id): PathParam<i64>,
    QueryParams(query): QueryParams<PaginationQuery>,
) -> AppResult<Json<Page<ReleaseResponse>>> {
    ensure_owner(&identity, user_id)?;
    let request = PageRequest::new(query.page, query.size)?.capped(state.config.max_page_size);

    let page = state
        .projection
        .get_releases_paginated(user_id, request)
        .await?;
    Ok(Json(page.map(ReleaseResponse::from)))
}

/// POST /releases/create-release
async fn create_release(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Extension(context): Extension<OperationContext>,
    JsonBody(request): JsonBody<ReleaseRequest>,
) -> AppResult<(StatusCode, Json<ReleaseResponse>)> {
    if let Some(user_id) = request.user_id {
        ensure_owner(&identity, user_id)?;
    }

    let release = state.releases.create(request.into()).await?;

    tracing::debug!(
        correlation_id = %context.correlation_id,
        release_id = ?release.id,
        "Release stored"
    );

    Ok((StatusCode::CREATED, Json(release.into())))
}

/// PUT /releases
async fn update_release(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    JsonBody(request): JsonBody<ReleaseRequest>,
) -> AppResult<Json<ReleaseResponse>> {
    if let Some(id) = request.id {
        owned_release(&state, &identity, id).await?;
    }
    if let Some(user_id) = request.user_id {
        ensure_owner(&identity, user_id)?;
    }

    let release = state.releases.update_from_command(request.into()).await?;
    Ok(Json(release.into()))
}

/// PUT /releases/:id/update-status?status=
async fn update_status(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    PathParam(id): PathParam<i64>,
    QueryParams(query): QueryParams<StatusQuery>,
) -> AppResult<Json<ReleaseResponse>> {
    let release = owned_release(&state, &identity, id).await?;
    let updated = state.releases.update_status(release, query.status).await?;
    Ok(Json(updated.into()))
}

/// DELETE /releases/:id
async fn delete_release(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    PathParam(id): PathParam<i64>,
) -> AppResult<StatusCode> {
    let release = owned_release(&state, &identity, id).await?;
    state.releases.delete(&release).await?;
    Ok(StatusCode::NO_CONTENT)
}
