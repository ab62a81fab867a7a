use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use directory::{
    contract::{client::DirectoryApi, error::DirectoryError, model::UserProfile},
    domain::service::{Service, ServiceConfig},
    gateways::local::DirectoryLocalClient,
    domain::error::DomainError,
    infra::storage::{entity, migrations::Migrator},
};
use modkit::SecurityCtx;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

/// Fresh in-memory database; one connection so every query sees the same schema.
async fn create_test_db() -> DatabaseConnection {
    let mut opts = ConnectOptions::new("sqlite::memory:");
    opts.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(opts)
        .await
        .expect("Failed to connect to test database");
    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");
    db
}

async fn create_test_service() -> Arc<Service> {
    Arc::new(Service::new(create_test_db().await, ServiceConfig::default()))
}

async fn create_test_client() -> Arc<dyn DirectoryApi> {
    Arc::new(DirectoryLocalClient::new(create_test_service().await))
}

struct NoopOpenApiRegistry;

impl modkit::OpenApiRegistry for NoopOpenApiRegistry {
    fn register_doc(&self, _module: &str, _doc: utoipa::openapi::OpenApi) {}

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

fn profile(email: &str, name: &str) -> UserProfile {
    UserProfile {
        email: email.to_string(),
        full_name: name.to_string(),
        profile_pic: None,
    }
}

#[tokio::test]
async fn upsert_creates_then_updates() -> Result<()> {
    let svc = create_test_service().await;
    let id = Uuid::new_v4();

    let created = svc.upsert_profile(id, profile("Ana@Example.com", " Ana ")).await?;
    assert_eq!(created.email, "ana@example.com");
    assert_eq!(created.full_name, "Ana");
    assert!(created.profile_pic.starts_with("https://avatar.iran.liara.run/public/"));
    assert!(created.profile_pic.ends_with(".png"));

    let updated = svc
        .upsert_profile(
            id,
            UserProfile {
                email: "ana@example.com".into(),
                full_name: "Ana Lima".into(),
                profile_pic: None,
            },
        )
        .await?;
    assert_eq!(updated.full_name, "Ana Lima");
    assert_eq!(updated.profile_pic, created.profile_pic);
    assert_eq!(updated.created_at, created.created_at);
    assert!(updated.updated_at >= created.updated_at);
    Ok(())
}

#[tokio::test]
async fn email_must_be_unique_across_users() -> Result<()> {
    let client = create_test_client().await;
    client
        .upsert_profile(Uuid::new_v4(), profile("dup@example.com", "First"))
        .await?;

    let err = client
        .upsert_profile(Uuid::new_v4(), profile("DUP@example.com", "Second"))
        .await
        .unwrap_err();
    assert_eq!(
        err.downcast_ref::<DirectoryError>(),
        Some(&DirectoryError::conflict("dup@example.com"))
    );
    Ok(())
}

#[tokio::test]
async fn losing_a_concurrent_email_claim_is_a_conflict() -> Result<()> {
    let db = create_test_db().await;
    let row = |email: &str| entity::NewUserEntity {
        id: Uuid::new_v4(),
        email: email.to_string(),
        full_name: "Racer".to_string(),
        profile_pic: String::new(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };

    // The second write skips the lookup, as a racing upsert would.
    entity::create(&db, row("race@example.com")).await?;
    let db_err = entity::create(&db, row("race@example.com"))
        .await
        .unwrap_err();

    let err = DomainError::from_profile_write(db_err, "race@example.com");
    assert!(
        matches!(&err, DomainError::EmailAlreadyExists { email } if email == "race@example.com"),
        "{err:?}"
    );

    let other = DomainError::from_profile_write(
        sea_orm::DbErr::Custom("disk full".into()),
        "race@example.com",
    );
    assert!(matches!(other, DomainError::Database { .. }));
    Ok(())
}

#[tokio::test]
async fn invalid_profile_is_a_validation_error() {
    let client = create_test_client().await;
    for (email, name) in [("not-an-email", "Ana"), ("ana@example.com", "   ")] {
        let err = client
            .upsert_profile(Uuid::new_v4(), profile(email, name))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DirectoryError>(),
            Some(DirectoryError::Validation { .. })
        ));
    }
}

#[tokio::test]
async fn find_many_skips_unknown_and_duplicate_ids() -> Result<()> {
    let client = create_test_client().await;
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();
    client.upsert_profile(a, profile("a@example.com", "A")).await?;
    client.upsert_profile(b, profile("b@example.com", "B")).await?;

    let found = client
        .find_many_by_ids(&[a, Uuid::new_v4(), b, a])
        .await?;
    let mut ids: Vec<Uuid> = found.iter().map(|u| u.id).collect();
    ids.sort();
    let mut expected = vec![a, b];
    expected.sort();
    assert_eq!(ids, expected);

    assert!(client.find_many_by_ids(&[]).await?.is_empty());
    assert!(client.exists_by_id(a).await?);
    assert!(!client.exists_by_id(Uuid::new_v4()).await?);
    assert!(client.find_by_id(Uuid::new_v4()).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn search_is_case_insensitive_substring() -> Result<()> {
    let client = create_test_client().await;
    client
        .upsert_profile(Uuid::new_v4(), profile("maria@acme.io", "Maria"))
        .await?;
    client
        .upsert_profile(Uuid::new_v4(), profile("mario@acme.io", "Mario"))
        .await?;
    client
        .upsert_profile(Uuid::new_v4(), profile("zoe@other.org", "Zoe"))
        .await?;

    let hits = client.search_by_email("MAR").await?;
    assert_eq!(hits.len(), 2);
    assert!(client.search_by_email("100%").await?.is_empty());

    let err = client.search_by_email("  ").await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<DirectoryError>(),
        Some(DirectoryError::Validation { .. })
    ));
    Ok(())
}

async fn create_test_router() -> (Router, Arc<Service>) {
    let service = create_test_service().await;
    let router = directory::api::rest::routes::register_routes(
        Router::new(),
        &NoopOpenApiRegistry,
        service.clone(),
    )
    .expect("Failed to register routes");
    (router, service)
}

async fn call(router: Router, method: &str, uri: &str, user: Uuid, body: Option<Value>) -> (StatusCode, Value) {
    let mut req = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body.map_or_else(Body::empty, |b| Body::from(b.to_string())))
        .unwrap();
    req.extensions_mut().insert(SecurityCtx::new(user));

    let resp = router.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn rest_profile_lifecycle() {
    let (router, _) = create_test_router().await;
    let me = Uuid::new_v4();

    let (status, body) = call(router.clone(), "GET", "/users/me", me, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "DIRECTORY_USER_NOT_FOUND");

    let (status, body) = call(
        router.clone(),
        "PUT",
        "/users/me",
        me,
        Some(json!({ "email": "me@example.com", "fullName": "Me", "profilePic": "https://pics/me.png" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["fullName"], "Me");
    assert_eq!(body["profilePic"], "https://pics/me.png");

    let (status, body) = call(router.clone(), "GET", &format!("/users/{me}"), Uuid::new_v4(), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "me@example.com");

    let (status, body) = call(router, "GET", "/users/search?keyword=ME@", Uuid::new_v4(), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn rest_rejects_bad_email_with_problem() {
    let (router, _) = create_test_router().await;
    let (status, body) = call(
        router,
        "PUT",
        "/users/me",
        Uuid::new_v4(),
        Some(json!({ "email": "nope", "fullName": "X" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "DIRECTORY_VALIDATION");
    assert_eq!(body["instance"], "/users/me");
}

#[tokio::test]
async fn rest_requires_security_context() {
    let (router, _) = create_test_router().await;
    let req = Request::builder().uri("/users/me").body(Body::empty()).unwrap();
    let resp = router.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}
