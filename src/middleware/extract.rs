//! Json, query, form and path extractors whose rejections render through
//! `AppError`, so malformed input gets the same `{"error": ...}` body as
//! every other failure.

use axum::extract::{FromRequest, FromRequestParts};

use crate::error::AppError;

#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

#[derive(Debug, FromRequest)]
#[from_request(via(axum::Form), rejection(AppError))]
pub struct ApiForm<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use axum::routing::{get, post};
    use axum::Router;
    use serde::Deserialize;
    use tower::util::ServiceExt;
    use uuid::Uuid;

    #[derive(Deserialize)]
    struct Page {
        #[allow(dead_code)]
        limit: Option<i64>,
    }

    #[derive(Deserialize)]
    struct Named {
        #[allow(dead_code)]
        name: String,
    }

    fn router() -> Router {
        Router::new()
            .route("/page", get(|ApiQuery(_): ApiQuery<Page>| async { "ok" }))
            .route("/items/:id", get(|ApiPath(_): ApiPath<Uuid>| async { "ok" }))
            .route("/json", post(|ApiJson(_): ApiJson<Named>| async { "ok" }))
            .route("/form", post(|ApiForm(_): ApiForm<Named>| async { "ok" }))
    }

    async fn call(req: Request<Body>) -> (StatusCode, serde_json::Value) {
        let res = router().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null))
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn well_formed_input_passes_through() {
        let res = router().oneshot(get_req("/page?limit=5")).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn bad_query_value_is_unprocessable_json() {
        let (status, body) = call(get_req("/page?limit=abc")).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn bad_path_segment_is_unprocessable_json() {
        let (status, body) = call(get_req("/items/not-a-uuid")).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn json_missing_field_is_unprocessable_json() {
        let req = Request::builder()
            .method("POST")
            .uri("/json")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{}"))
            .unwrap();
        let (status, body) = call(req).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"].as_str().unwrap().contains("name"));
    }

    #[tokio::test]
    async fn form_missing_field_is_unprocessable_json() {
        let req = Request::builder()
            .method("POST")
            .uri("/form")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("other=1"))
            .unwrap();
        let (status, body) = call(req).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"].is_string());
    }
}
