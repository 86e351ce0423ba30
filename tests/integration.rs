//! Integration tests against a real PostgreSQL database.
//!
//! Set `TEST_DATABASE_URL` to run them; migrations are applied on startup.
//! Without it the database-backed tests return early.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, HeaderMap, Request, StatusCode};
use axum::Router;
use bandmate::db::DbPool;
use bandmate::repositories::LocalImageStore;
use bandmate::{auth::JwtSecret, create_app, db, AppState};
use chrono::Duration;
use serde_json::{json, Value};
use tower::util::ServiceExt;
use uuid::Uuid;

async fn test_pool() -> Option<DbPool> {
    let database_url = match std::env::var("TEST_DATABASE_URL") {
        Ok(u) => u,
        Err(_) => {
            eprintln!("Skip integration test: set TEST_DATABASE_URL");
            return None;
        }
    };
    let db_pool = match db::create_pool(&database_url).await {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Skip integration test: {}", e);
            return None;
        }
    };
    db::run_migrations(&db_pool).await.expect("migrations");
    Some(db_pool)
}

fn app_for(db_pool: DbPool) -> Router {
    let jwt_secret = JwtSecret::new(
        "test-jwt-secret-min-32-chars!!!!".to_string(),
        Duration::minutes(30),
        Duration::days(7),
    );
    let store = LocalImageStore::new(
        std::env::temp_dir().join("bandmate-test-uploads"),
        "http://localhost:8000/uploads".to_string(),
    );
    let state = AppState::new(db_pool, jwt_secret, Arc::new(store), 5 * 1024 * 1024, false);
    create_app(state)
}

async fn test_app() -> Option<Router> {
    test_pool().await.map(app_for)
}

struct Reply {
    status: StatusCode,
    headers: HeaderMap,
    json: Value,
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Reply {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let req = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let headers = res.headers().clone();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    Reply {
        status,
        headers,
        json,
    }
}

async fn login(app: &Router, email: &str, password: &str) -> Reply {
    let req = Request::builder()
        .method("POST")
        .uri("/api/v1/auth/token")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(format!("username={}&password={}", email, password)))
        .unwrap();
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let headers = res.headers().clone();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    Reply {
        status,
        headers,
        json: serde_json::from_slice(&bytes).unwrap_or(Value::Null),
    }
}

/// Registers a fresh account and returns `(user_id, access_token)`.
async fn new_user(app: &Router) -> (String, String) {
    let tag = Uuid::new_v4().simple().to_string();
    register(app, &format!("u{}", &tag[..12])).await
}

async fn register(app: &Router, nickname: &str) -> (String, String) {
    let tag = Uuid::new_v4().simple().to_string();
    let email = format!("{}@example.com", &tag[..16]);
    let res = send(
        app,
        "POST",
        "/api/v1/users",
        None,
        Some(json!({ "email": email, "password": "password123", "nickname": nickname })),
    )
    .await;
    assert_eq!(res.status, StatusCode::CREATED, "register: {}", res.json);
    let user_id = res.json["id"].as_str().unwrap().to_string();

    let res = login(app, &email, "password123").await;
    assert_eq!(res.status, StatusCode::OK);
    let token = res.json["access_token"].as_str().unwrap().to_string();
    (user_id, token)
}

async fn new_post(app: &Router, token: &str) -> String {
    let common = send(app, "GET", "/api/v1/common", None, None).await;
    let orientation_id = common.json["orientations"][0]["id"].clone();
    let recruitment_type_id = common.json["recruitment_types"][0]["id"].clone();
    let position_id = common.json["positions"][0]["id"].clone();
    let level_id = common.json["experience_levels"][0]["id"].clone();
    let res = send(
        app,
        "POST",
        "/api/v1/recruiting-posts",
        Some(token),
        Some(json!({
            "title": "Looking for a drummer",
            "content": "Weekly practice in Hongdae",
            "orientation_id": orientation_id,
            "recruitment_type_id": recruitment_type_id,
            "positions": [{ "position_id": position_id, "experienced_level_id": level_id }],
        })),
    )
    .await;
    assert_eq!(res.status, StatusCode::CREATED, "create post: {}", res.json);
    res.json["id"].as_str().unwrap().to_string()
}

/// Follow `next_cursor` from `base` (which already has a query string) and
/// collect the `key` array of every page.
async fn walk_pages(app: &Router, base: &str, key: &str, token: Option<&str>) -> Vec<Vec<Value>> {
    let mut pages = Vec::new();
    let mut cursor: Option<String> = None;
    loop {
        let uri = match &cursor {
            Some(c) => format!("{}&cursor={}", base, c),
            None => base.to_string(),
        };
        let res = send(app, "GET", &uri, token, None).await;
        assert_eq!(res.status, StatusCode::OK, "{}: {}", uri, res.json);
        pages.push(res.json[key].as_array().cloned().unwrap_or_default());
        match res.json["next_cursor"].as_str() {
            Some(next) => cursor = Some(next.to_string()),
            None => break,
        }
        assert!(pages.len() < 50, "pagination did not terminate");
    }
    pages
}

fn ids_of(pages: &[Vec<Value>], id_key: &str) -> Vec<String> {
    pages
        .iter()
        .flatten()
        .map(|v| v[id_key].as_str().unwrap().to_string())
        .collect()
}

fn refresh_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("refresh_token="))
        .map(String::from)
}

#[tokio::test]
async fn health_returns_ok() {
    let Some(app) = test_app().await else { return };
    let res = send(&app, "GET", "/api/v1/health", None, None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json["status"], "ok");
    assert_eq!(res.json["service"], "bandmate");
}

#[tokio::test]
async fn register_login_refresh_and_me() {
    let Some(app) = test_app().await else { return };
    let tag = Uuid::new_v4().simple().to_string();
    let email = format!("{}@example.com", &tag[..16]);
    let nickname = format!("n{}", &tag[..12]);
    let body = json!({ "email": email, "password": "password123", "nickname": nickname });

    let res = send(&app, "POST", "/api/v1/users", None, Some(body.clone())).await;
    assert_eq!(res.status, StatusCode::CREATED);
    let res = send(&app, "POST", "/api/v1/users", None, Some(body)).await;
    assert_eq!(res.status, StatusCode::CONFLICT);

    let res = login(&app, &email, "wrong-password").await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        res.headers.get(header::WWW_AUTHENTICATE).and_then(|v| v.to_str().ok()),
        Some("Bearer")
    );
    let res = login(&app, "nobody-here@example.com", "password123").await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);

    let res = login(&app, &email, "password123").await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json["token_type"], "bearer");
    let cookie = refresh_cookie(&res.headers).expect("refresh cookie");
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));
    let access = res.json["access_token"].as_str().unwrap().to_string();

    let res = send(&app, "GET", "/api/v1/users/me", Some(&access), None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json["nickname"], nickname.as_str());
    assert!(res.json["profile"].is_null());

    let res = send(&app, "GET", "/api/v1/users/me", None, None).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);

    // Rotation: the first refresh succeeds, replaying the same cookie fails.
    let cookie_pair = cookie.split(';').next().unwrap().to_string();
    let refresh = |cookie: String| {
        let app = app.clone();
        async move {
            let req = Request::builder()
                .method("POST")
                .uri("/api/v1/auth/token/refresh")
                .header(header::COOKIE, cookie)
                .body(Body::empty())
                .unwrap();
            app.oneshot(req).await.unwrap().status()
        }
    };
    assert_eq!(refresh(cookie_pair.clone()).await, StatusCode::OK);
    assert_eq!(refresh(cookie_pair).await, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn profile_update_and_privacy() {
    let Some(app) = test_app().await else { return };
    let (owner_id, owner_token) = new_user(&app).await;
    let (_, other_token) = new_user(&app).await;

    let common = send(&app, "GET", "/api/v1/common", None, None).await;
    let region_id = common.json["regions"][0]["id"].clone();
    let res = send(
        &app,
        "PATCH",
        "/api/v1/users/me/profile",
        Some(&owner_token),
        Some(json!({ "is_public": false, "region_ids": [region_id] })),
    )
    .await;
    assert_eq!(res.status, StatusCode::OK, "{}", res.json);
    assert_eq!(res.json["regions"].as_array().unwrap().len(), 1);

    let uri = format!("/api/v1/profiles/{}", owner_id);
    let res = send(&app, "GET", &uri, Some(&other_token), None).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
    let res = send(&app, "GET", &uri, Some(&owner_token), None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json["views_count"], 0);

    let res = send(
        &app,
        "PATCH",
        "/api/v1/users/me/profile",
        Some(&owner_token),
        Some(json!({ "region_ids": [Uuid::new_v4()] })),
    )
    .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn post_detail_reports_owner() {
    let Some(app) = test_app().await else { return };
    let (_, owner) = new_user(&app).await;
    let (_, other) = new_user(&app).await;
    let post_id = new_post(&app, &owner).await;
    let uri = format!("/api/v1/recruiting-posts/{}", post_id);

    let res = send(&app, "GET", &uri, Some(&owner), None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json["is_owner"], true);
    assert_eq!(res.json["positions"].as_array().unwrap().len(), 1);

    let res = send(&app, "GET", &uri, None, None).await;
    assert_eq!(res.json["is_owner"], false);
    assert_eq!(res.json["views_count"], 2);

    let res = send(&app, "PATCH", &uri, Some(&other), Some(json!({ "title": "mine" }))).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    let res = send(
        &app,
        "PATCH",
        &uri,
        Some(&owner),
        Some(json!({ "title": "Drummer found?", "band_name": null })),
    )
    .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json["title"], "Drummer found?");
    assert!(res.json["band_name"].is_null());

    let res = send(
        &app,
        "PATCH",
        &format!("{}/status?is_closed=true", uri),
        Some(&owner),
        None,
    )
    .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json["is_closed"], true);

    let res = send(&app, "GET", "/api/v1/recruiting-posts?author=me", Some(&owner), None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json["posts"][0]["id"], post_id.as_str());

    let res = send(&app, "GET", "/api/v1/recruiting-posts?author=me", None, None).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);

    let res = send(&app, "DELETE", &uri, Some(&owner), None).await;
    assert_eq!(res.status, StatusCode::NO_CONTENT);
    let res = send(&app, "GET", &uri, None, None).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn duplicate_post_bookmark_conflicts() {
    let Some(app) = test_app().await else { return };
    let (_, owner) = new_user(&app).await;
    let (_, fan) = new_user(&app).await;
    let post_id = new_post(&app, &owner).await;
    let uri = format!("/api/v1/recruiting-posts/{}/bookmark", post_id);

    let res = send(&app, "POST", &uri, Some(&fan), None).await;
    assert_eq!(res.status, StatusCode::CREATED);
    let res = send(&app, "POST", &uri, Some(&fan), None).await;
    assert_eq!(res.status, StatusCode::CONFLICT);

    let detail = format!("/api/v1/recruiting-posts/{}", post_id);
    let res = send(&app, "GET", &detail, Some(&fan), None).await;
    assert_eq!(res.json["bookmarks_count"], 1);
    assert_eq!(res.json["is_bookmarked"], true);

    let res = send(&app, "DELETE", &uri, Some(&fan), None).await;
    assert_eq!(res.status, StatusCode::NO_CONTENT);
    let res = send(&app, "DELETE", &uri, Some(&fan), None).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn user_bookmarks_track_count() {
    let Some(app) = test_app().await else { return };
    let (me, fan) = new_user(&app).await;
    let (target, _) = new_user(&app).await;

    let res = send(&app, "POST", &format!("/api/v1/users/{}/bookmark", me), Some(&fan), None).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let uri = format!("/api/v1/users/{}/bookmark", target);
    let res = send(&app, "POST", &uri, Some(&fan), None).await;
    assert_eq!(res.status, StatusCode::CREATED);
    let res = send(&app, "POST", &uri, Some(&fan), None).await;
    assert_eq!(res.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn deleting_comment_with_replies_adjusts_count() {
    let Some(app) = test_app().await else { return };
    let (_, author) = new_user(&app).await;
    let post_id = new_post(&app, &author).await;
    let comments_uri = format!("/api/v1/recruiting-posts/{}/comments", post_id);

    let res = send(&app, "POST", &comments_uri, Some(&author), Some(json!({ "content": "top" }))).await;
    assert_eq!(res.status, StatusCode::CREATED);
    let top_id = res.json["id"].as_str().unwrap().to_string();
    let mut reply_id = String::new();
    for content in ["first reply", "second reply"] {
        let res = send(
            &app,
            "POST",
            &comments_uri,
            Some(&author),
            Some(json!({ "content": content, "parent_comment_id": top_id })),
        )
        .await;
        assert_eq!(res.status, StatusCode::CREATED);
        reply_id = res.json["id"].as_str().unwrap().to_string();
    }

    // Replies cannot nest further.
    let res = send(
        &app,
        "POST",
        &comments_uri,
        Some(&author),
        Some(json!({ "content": "too deep", "parent_comment_id": reply_id })),
    )
    .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let post_uri = format!("/api/v1/recruiting-posts/{}", post_id);
    let res = send(&app, "GET", &post_uri, None, None).await;
    assert_eq!(res.json["comments_count"], 3);

    let list = format!("/api/v1/comments?post_id={}", post_id);
    let res = send(&app, "GET", &list, Some(&author), None).await;
    assert_eq!(res.status, StatusCode::OK);
    let comments = res.json["comments"].as_array().unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0]["is_owner"], true);
    let children: Vec<_> = comments[0]["children"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["content"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(children, ["first reply", "second reply"]);

    let res = send(&app, "GET", "/api/v1/comments", None, None).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = send(&app, "DELETE", &format!("/api/v1/comments/{}", top_id), Some(&author), None).await;
    assert_eq!(res.status, StatusCode::NO_CONTENT);
    let res = send(&app, "GET", &post_uri, None, None).await;
    assert_eq!(res.json["comments_count"], 0);
}

#[tokio::test]
async fn master_data_lists_seeded_values() {
    let Some(app) = test_app().await else { return };
    let res = send(&app, "GET", "/api/v1/common", None, None).await;
    assert_eq!(res.status, StatusCode::OK);
    let len = |key: &str| res.json[key].as_array().map(Vec::len).unwrap_or(0);
    assert_eq!(len("regions"), 19);
    assert_eq!(len("positions"), 7);
    assert_eq!(len("genres"), 7);
    assert_eq!(len("experience_levels"), 6);
    assert_eq!(len("orientations"), 3);
    assert_eq!(len("recruitment_types"), 2);
}

#[tokio::test]
async fn malformed_requests_get_json_errors() {
    // Extractor rejections happen before any query runs, so a lazy pool suffices.
    let pool = sqlx::postgres::PgPoolOptions::new()
        .connect_lazy("postgres://localhost/bandmate_unused")
        .unwrap();
    let app = app_for(pool);

    for uri in [
        "/api/v1/recruiting-posts?limit=abc",
        "/api/v1/recruiting-posts?limit=0",
        "/api/v1/recruiting-posts?sort_by=oldest",
        "/api/v1/recruiting-posts?cursor=nope",
        "/api/v1/profiles?order_by=sideways",
        "/api/v1/profiles/not-a-uuid",
        "/api/v1/comments?post_id=bad",
    ] {
        let res = send(&app, "GET", uri, None, None).await;
        assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY, "{}", uri);
        assert!(res.json["error"].is_string(), "{}: {}", uri, res.json);
    }

    let res = send(&app, "POST", "/api/v1/users", None, Some(json!({ "email": "a@b.c" }))).await;
    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(res.json["error"].as_str().unwrap().contains("password"));

    let req = Request::builder()
        .method("POST")
        .uri("/api/v1/auth/token")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("username=a@b.c"))
        .unwrap();
    let res = app.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn recruiting_pages_cover_every_post_once() {
    let Some(app) = test_app().await else { return };
    let (author, token) = new_user(&app).await;
    let mut created = Vec::new();
    for _ in 0..12 {
        created.push(new_post(&app, &token).await);
    }
    created.reverse();

    let base = format!("/api/v1/recruiting-posts?author={}&limit=5", author);
    let pages = walk_pages(&app, &base, "posts", None).await;
    let sizes: Vec<usize> = pages.iter().map(Vec::len).collect();
    assert_eq!(sizes, [5, 5, 2]);
    assert_eq!(ids_of(&pages, "id"), created);

    let res = send(&app, "GET", "/api/v1/recruiting-posts?limit=11", None, None).await;
    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
    let uri = format!("/api/v1/recruiting-posts?cursor={}", Uuid::new_v4());
    let res = send(&app, "GET", &uri, None, None).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn recruiting_sorts_by_counters_across_pages() {
    let Some(app) = test_app().await else { return };
    let (author, token) = new_user(&app).await;
    let mut posts = Vec::new();
    for _ in 0..4 {
        posts.push(new_post(&app, &token).await);
    }
    // Post i gets i views and 3 - i comments.
    for (i, post_id) in posts.iter().enumerate() {
        for _ in 0..i {
            send(&app, "GET", &format!("/api/v1/recruiting-posts/{}", post_id), None, None).await;
        }
        let uri = format!("/api/v1/recruiting-posts/{}/comments", post_id);
        for _ in 0..(3 - i) {
            let res = send(&app, "POST", &uri, Some(&token), Some(json!({ "content": "hi" }))).await;
            assert_eq!(res.status, StatusCode::CREATED);
        }
    }

    let base = format!("/api/v1/recruiting-posts?author={}&limit=3&sort_by=views", author);
    let by_views = ids_of(&walk_pages(&app, &base, "posts", None).await, "id");
    let expected: Vec<String> = posts.iter().rev().cloned().collect();
    assert_eq!(by_views, expected);

    let base = format!("/api/v1/recruiting-posts?author={}&limit=3&sort_by=comments", author);
    let pages = walk_pages(&app, &base, "posts", None).await;
    let counts: Vec<i64> = pages
        .iter()
        .flatten()
        .map(|p| p["comments_count"].as_i64().unwrap())
        .collect();
    assert_eq!(counts, [3, 2, 1, 0]);
    assert_eq!(ids_of(&pages, "id"), posts);
}

#[tokio::test]
async fn profile_pages_ascending_by_creation() {
    let Some(app) = test_app().await else { return };
    let tag = &Uuid::new_v4().simple().to_string()[..10];
    let mut users = Vec::new();
    for i in 0..5 {
        let (id, token) = register(&app, &format!("p{}{}", tag, i)).await;
        let res = send(
            &app,
            "PATCH",
            "/api/v1/users/me/profile",
            Some(&token),
            Some(json!({ "is_public": true })),
        )
        .await;
        assert_eq!(res.status, StatusCode::OK);
        users.push(id);
    }

    let base = format!("/api/v1/profiles?nickname={}&order_by=asc&limit=2", tag);
    let pages = walk_pages(&app, &base, "profiles", None).await;
    assert_eq!(pages.iter().map(Vec::len).collect::<Vec<_>>(), [2, 2, 1]);
    assert_eq!(ids_of(&pages, "user_id"), users);

    let base = format!("/api/v1/profiles?nickname={}&limit=4", tag);
    let newest_first = ids_of(&walk_pages(&app, &base, "profiles", None).await, "user_id");
    let expected: Vec<String> = users.iter().rev().cloned().collect();
    assert_eq!(newest_first, expected);

    let uri = format!("/api/v1/profiles?cursor={}", Uuid::new_v4());
    let res = send(&app, "GET", &uri, None, None).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn comment_pages_follow_cursor() {
    let Some(app) = test_app().await else { return };
    let (_, token) = new_user(&app).await;
    let post_id = new_post(&app, &token).await;
    let uri = format!("/api/v1/recruiting-posts/{}/comments", post_id);
    let mut created = Vec::new();
    for i in 0..7 {
        let res = send(&app, "POST", &uri, Some(&token), Some(json!({ "content": format!("c{}", i) }))).await;
        assert_eq!(res.status, StatusCode::CREATED);
        created.push(res.json["id"].as_str().unwrap().to_string());
    }
    created.reverse();

    let base = format!("/api/v1/comments?post_id={}&limit=3", post_id);
    let pages = walk_pages(&app, &base, "comments", None).await;
    assert_eq!(pages.iter().map(Vec::len).collect::<Vec<_>>(), [3, 3, 1]);
    assert_eq!(ids_of(&pages, "id"), created);

    let uri = format!("{}&cursor={}", base, Uuid::new_v4());
    let res = send(&app, "GET", &uri, None, None).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleting_account_releases_counters() {
    let Some(app) = test_app().await else { return };
    let (_, leaver) = new_user(&app).await;
    let (bandmate_id, bandmate) = new_user(&app).await;
    let (_, owner) = new_user(&app).await;
    let (_, fan) = new_user(&app).await;

    let res = send(
        &app,
        "PATCH",
        "/api/v1/users/me/profile",
        Some(&bandmate),
        Some(json!({ "is_public": true })),
    )
    .await;
    assert_eq!(res.status, StatusCode::OK);
    let uri = format!("/api/v1/users/{}/bookmark", bandmate_id);
    assert_eq!(send(&app, "POST", &uri, Some(&leaver), None).await.status, StatusCode::CREATED);

    let post_id = new_post(&app, &owner).await;
    let uri = format!("/api/v1/recruiting-posts/{}/bookmark", post_id);
    for token in [&leaver, &fan] {
        assert_eq!(send(&app, "POST", &uri, Some(token), None).await.status, StatusCode::CREATED);
    }

    // leaver: one top-level comment that gets a reply, plus a reply under owner's comment.
    let comments = format!("/api/v1/recruiting-posts/{}/comments", post_id);
    let comment = |token: String, parent: Option<String>| {
        let app = app.clone();
        let comments = comments.clone();
        async move {
            let body = json!({ "content": "hello", "parent_comment_id": parent });
            let res = send(&app, "POST", &comments, Some(&token), Some(body)).await;
            assert_eq!(res.status, StatusCode::CREATED, "{}", res.json);
            res.json["id"].as_str().unwrap().to_string()
        }
    };
    let leaver_top = comment(leaver.clone(), None).await;
    comment(owner.clone(), Some(leaver_top)).await;
    let owner_top = comment(owner.clone(), None).await;
    comment(leaver.clone(), Some(owner_top)).await;

    let post_uri = format!("/api/v1/recruiting-posts/{}", post_id);
    let res = send(&app, "GET", &post_uri, None, None).await;
    assert_eq!(res.json["comments_count"], 4);
    assert_eq!(res.json["bookmarks_count"], 2);
    let profile_uri = format!("/api/v1/profiles/{}", bandmate_id);
    let res = send(&app, "GET", &profile_uri, Some(&bandmate), None).await;
    assert_eq!(res.json["bookmark_count"], 1);

    let res = send(&app, "DELETE", "/api/v1/users/me", Some(&leaver), None).await;
    assert_eq!(res.status, StatusCode::NO_CONTENT);
    let res = send(&app, "GET", "/api/v1/users/me", Some(&leaver), None).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);

    let res = send(&app, "GET", &post_uri, None, None).await;
    assert_eq!(res.json["comments_count"], 1);
    assert_eq!(res.json["bookmarks_count"], 1);
    let res = send(&app, "GET", &profile_uri, Some(&bandmate), None).await;
    assert_eq!(res.json["bookmark_count"], 0);

    let list = format!("/api/v1/comments?post_id={}", post_id);
    let res = send(&app, "GET", &list, None, None).await;
    let remaining = res.json["comments"].as_array().unwrap();
    assert_eq!(remaining.len(), 1);
    assert!(remaining[0]["children"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn failed_rotation_keeps_old_refresh_token() {
    let Some(pool) = test_pool().await else { return };
    let app = app_for(pool.clone());
    let (user_id, _) = new_user(&app).await;
    let user_id: Uuid = user_id.parse().unwrap();
    let expires = chrono::Utc::now() + Duration::days(1);

    let old_jti = Uuid::new_v4();
    let taken_jti = Uuid::new_v4();
    let mut conn = pool.acquire().await.unwrap();
    db::refresh_token_store(&mut *conn, user_id, old_jti, expires).await.unwrap();
    db::refresh_token_store(&mut *conn, user_id, taken_jti, expires).await.unwrap();
    drop(conn);

    // The new jti collides, so the insert fails and the revoke must roll back.
    assert!(db::refresh_token_rotate(&pool, user_id, old_jti, taken_jti, expires)
        .await
        .is_err());
    let old = db::refresh_token_find(&pool, old_jti).await.unwrap().unwrap();
    assert!(old.is_usable(chrono::Utc::now()));

    let fresh_jti = Uuid::new_v4();
    assert!(db::refresh_token_rotate(&pool, user_id, old_jti, fresh_jti, expires)
        .await
        .unwrap());
    let old = db::refresh_token_find(&pool, old_jti).await.unwrap().unwrap();
    assert!(old.is_revoked);
    assert!(!db::refresh_token_rotate(&pool, user_id, old_jti, Uuid::new_v4(), expires)
        .await
        .unwrap());
}
