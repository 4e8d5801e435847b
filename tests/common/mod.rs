//! Common test utilities

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, Response, StatusCode},
    Router,
};
use chrono::NaiveDate;
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tower::util::ServiceExt;

use finances::api::{self, AppState};
use finances::auth::LocalIdentityLookup;
use finances::domain::{
    NewUser, Page, PageRequest, Release, ReleaseFilter, ReleaseStatus, ReleaseType, User,
};
use finances::projection::Window;
use finances::repository::{ReleaseRepository, RepositoryError, UserRepository};
use finances::Config;

pub const CLIENT_ID: &str = "finances-web";
pub const CLIENT_SECRET: &str = "client-secret";

/// Credential store kept in memory
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Mutex<Vec<User>>,
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn insert(&self, user: &NewUser) -> Result<User, RepositoryError> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email == user.email) {
            return Err(RepositoryError::Conflict("users_email_key".to_string()));
        }

        let stored = User {
            id: users.len() as i64 + 1,
            name: user.name.clone(),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            roles: user.roles.clone(),
        };
        users.push(stored.clone());
        Ok(stored)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, RepositoryError> {
        Ok(self.users.lock().unwrap().iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, RepositoryError> {
        Ok(self.users.lock().unwrap().iter().any(|u| u.email == email))
    }
}

/// Release store kept in memory
#[derive(Default)]
pub struct InMemoryReleaseRepository {
    releases: Mutex<Vec<Release>>,
    next_id: Mutex<i64>,
}

impl InMemoryReleaseRepository {
    /// Overwrite the creation date of a stored release
    pub fn backdate(&self, id: i64, created_at: NaiveDate) {
        let mut releases = self.releases.lock().unwrap();
        if let Some(release) = releases.iter_mut().find(|r| r.id == Some(id)) {
            release.created_at = Some(created_at);
        }
    }
}

#[async_trait]
impl ReleaseRepository for InMemoryReleaseRepository {
    async fn insert(&self, release: &Release) -> Result<Release, RepositoryError> {
        let mut next_id = self.next_id.lock().unwrap();
        *next_id += 1;

        let stored = Release {
            id: Some(*next_id),
            ..release.clone()
        };
        self.releases.lock().unwrap().push(stored.clone());
        Ok(stored)
    }

    async fn update(&self, release: &Release) -> Result<Option<Release>, RepositoryError> {
        let mut releases = self.releases.lock().unwrap();
        match releases.iter_mut().find(|r| r.id == release.id) {
            Some(stored) => {
                let created_at = stored.created_at;
                *stored = Release {
                    created_at,
                    ..release.clone()
                };
                Ok(Some(stored.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, id: i64) -> Result<bool, RepositoryError> {
        let mut releases = self.releases.lock().unwrap();
        let before = releases.len();
        releases.retain(|r| r.id != Some(id));
        Ok(releases.len() != before)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Release>, RepositoryError> {
        Ok(self
            .releases
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == Some(id))
            .cloned())
    }

    async fn find(&self, filter: &ReleaseFilter) -> Result<Vec<Release>, RepositoryError> {
        let mut found: Vec<Release> = self
            .releases
            .lock()
            .unwrap()
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        found.sort_by(|a, b| (b.release_date, b.id).cmp(&(a.release_date, a.id)));
        Ok(found)
    }

    async fn sum_values(
        &self,
        user_id: i64,
        release_type: ReleaseType,
        status: ReleaseStatus,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Option<Decimal>, RepositoryError> {
        let window = Window { start, end };
        let values: Vec<Decimal> = self
            .releases
            .lock()
            .unwrap()
            .iter()
            .filter(|r| {
                r.user_id == Some(user_id)
                    && r.release_type == Some(release_type)
                    && r.status == Some(status)
                    && r.created_at.is_some_and(|d| window.contains(d))
            })
            .filter_map(|r| r.value)
            .collect();

        if values.is_empty() {
            Ok(None)
        } else {
            Ok(Some(values.into_iter().sum()))
        }
    }

    async fn find_created_between(
        &self,
        user_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Release>, RepositoryError> {
        let window = Window { start, end };
        let mut found: Vec<Release> = self
            .releases
            .lock()
            .unwrap()
            .iter()
            .filter(|r| {
                r.user_id == Some(user_id) && r.created_at.is_some_and(|d| window.contains(d))
            })
            .cloned()
            .collect();
        found.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(found)
    }

    async fn find_page(
        &self,
        user_id: i64,
        page: PageRequest,
    ) -> Result<Page<Release>, RepositoryError> {
        let all = self
            .find(&ReleaseFilter::new().with_user(user_id))
            .await?;
        let total = all.len() as i64;
        let items = all
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.size() as usize)
            .collect();
        Ok(Page::new(items, total))
    }
}

pub fn test_config() -> Config {
    Config {
        database_url: "postgres://unused".to_string(),
        database_max_connections: 1,
        host: "127.0.0.1".to_string(),
        port: 0,
        environment: "test".to_string(),
        token_signing_key: "integration-signing-key".to_string(),
        token_validity_seconds: 3600,
        oauth_client_id: CLIENT_ID.to_string(),
        oauth_client_secret: CLIENT_SECRET.to_string(),
        identity_service_url: None,
        identity_lookup_timeout: Duration::from_secs(2),
        max_page_size: 50,
    }
}

/// Application wired over in-memory storage
pub struct TestApp {
    pub router: Router,
    pub releases: Arc<InMemoryReleaseRepository>,
}

pub fn test_app() -> TestApp {
    let users = Arc::new(InMemoryUserRepository::default());
    let releases = Arc::new(InMemoryReleaseRepository::default());
    let identity = Arc::new(LocalIdentityLookup::new(users.clone()));

    let state = AppState::new(Arc::new(test_config()), users, releases.clone(), identity);

    TestApp {
        router: api::build_router(state),
        releases,
    }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn json(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self.send(builder.body(body).unwrap()).await;
        let status = response.status();
        (status, read_json(response).await)
    }

    /// Register a user and return its id
    pub async fn register(&self, name: &str, email: &str, password: &str) -> i64 {
        let (status, body) = self
            .json(
                "POST",
                "/api/users",
                None,
                Some(serde_json::json!({"name": name, "email": email, "password": password})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "registration failed: {body}");
        body["id"].as_i64().unwrap()
    }

    pub async fn token_response(&self, form: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri("/api/oauth/token")
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from(form.to_string()))
            .unwrap();
        let response = self.send(request).await;
        let status = response.status();
        (status, read_json(response).await)
    }

    /// Password grant for a registered user
    pub async fn login(&self, email: &str, password: &str) -> String {
        let form = format!(
            "grant_type=password&username={}&password={}&client_id={}&client_secret={}",
            email, password, CLIENT_ID, CLIENT_SECRET
        );
        let (status, body) = self.token_response(&form).await;
        assert_eq!(status, StatusCode::OK, "token request failed: {body}");
        body["access_token"].as_str().unwrap().to_string()
    }
}

pub async fn read_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    }
}

/// Connect to the database named by DATABASE_URL and apply the schema.
/// Returns `None` when no database is configured.
pub async fn setup_test_db() -> Option<PgPool> {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL").ok()?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to DB");

    sqlx::Executor::execute(
        &pool,
        include_str!("../../migrations/0001_create_users_and_releases.sql"),
    )
    .await
    .expect("Failed to apply migrations");

    Some(pool)
}
