//! HTTP API for the fragment storage service.
//!
//! A thin layer over [`frag_model::FragmentService`]: it authenticates the
//! caller, turns the principal into an owner id, and maps service outcomes
//! onto status codes. Every storage and conversion decision is made below
//! this crate.
//!
//! # Routes
//!
//! | Method | Path                      | Purpose                         |
//! |--------|---------------------------|---------------------------------|
//! | GET    | `/`                       | health (no auth)                |
//! | GET    | `/v1/fragments`           | list ids, or records with `?expand=1` |
//! | POST   | `/v1/fragments`           | create from body + Content-Type |
//! | GET    | `/v1/fragments/:id[.ext]` | raw or converted data           |
//! | GET    | `/v1/fragments/:id/info`  | metadata                        |
//! | PUT    | `/v1/fragments/:id`       | replace data (same base type)   |
//! | DELETE | `/v1/fragments/:id`       | delete metadata and data        |

pub mod auth;
pub mod config;
pub mod error;
pub mod handler;
pub mod response;
pub mod router;
pub mod server;
pub mod state;

pub use auth::{AuthProvider, BasicAuth, Credentials, Identity, NoAuth};
pub use config::{AuthConfig, ServerConfig};
pub use error::{ServerError, ServerResult};
pub use server::FragmentServer;
pub use state::AppState;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use axum::response::Response;
    use axum::Router;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use frag_model::FragmentService;
    use serde_json::Value;
    use std::collections::BTreeMap;
    use tower::util::ServiceExt;

    const USER: &str = "user1@email.com";
    const PASSWORD: &str = "password1";

    fn app() -> Router {
        let config = ServerConfig {
            api_url: "http://fragments.test/".into(),
            auth: AuthConfig::Basic {
                users: BTreeMap::from([
                    (USER.to_string(), PASSWORD.to_string()),
                    ("user2@email.com".to_string(), "password2".to_string()),
                ]),
            },
            ..ServerConfig::default()
        };
        FragmentServer::with_service(config, FragmentService::memory()).router()
    }

    fn basic(user: &str, pass: &str) -> String {
        format!("Basic {}", STANDARD.encode(format!("{user}:{pass}")))
    }

    fn request(method: &str, uri: &str) -> axum::http::request::Builder {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, basic(USER, PASSWORD))
    }

    async fn send(app: &Router, req: Request<Body>) -> Response {
        app.clone().oneshot(req).await.unwrap()
    }

    async fn body_bytes(response: Response) -> Vec<u8> {
        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec()
    }

    async fn body_json(response: Response) -> Value {
        serde_json::from_slice(&body_bytes(response).await).unwrap()
    }

    /// POST a fragment and return its id.
    async fn post(app: &Router, content_type: &str, data: &'static [u8]) -> String {
        let response = send(
            app,
            request("POST", "/v1/fragments")
                .header(header::CONTENT_TYPE, content_type)
                .body(Body::from(data))
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let json = body_json(response).await;
        json["fragment"]["id"].as_str().unwrap().to_string()
    }

    // -----------------------------------------------------------------------
    // Health and auth
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn health_endpoint() {
        let response = send(&app(), Request::get("/").body(Body::empty()).unwrap()).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CACHE_CONTROL], "no-cache");
        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn unauthenticated_requests_are_denied() {
        let app = app();
        let response = send(&app, Request::get("/v1/fragments").body(Body::empty()).unwrap()).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let json = body_json(response).await;
        assert_eq!(json["status"], "error");
        assert_eq!(json["error"]["code"], 401);

        let response = send(
            &app,
            Request::get("/v1/fragments")
                .header(header::AUTHORIZATION, basic(USER, "wrong"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    // -----------------------------------------------------------------------
    // Create
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn post_returns_location_and_record() {
        let app = app();
        let response = send(
            &app,
            request("POST", "/v1/fragments")
                .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
                .body(Body::from("hello"))
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let location = response.headers()[header::LOCATION].to_str().unwrap().to_string();
        let json = body_json(response).await;
        let id = json["fragment"]["id"].as_str().unwrap();

        assert_eq!(json["status"], "ok");
        assert_eq!(location, format!("http://fragments.test/v1/fragments/{id}"));
        assert_eq!(json["fragment"]["type"], "text/plain; charset=utf-8");
        assert_eq!(json["fragment"]["size"], 5);
        assert_eq!(
            json["fragment"]["ownerId"],
            frag_types::OwnerId::from_principal(USER).as_str()
        );
    }

    #[tokio::test]
    async fn post_unsupported_type_is_415() {
        let response = send(
            &app(),
            request("POST", "/v1/fragments")
                .header(header::CONTENT_TYPE, "abc/defg")
                .body(Body::from("x"))
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[tokio::test]
    async fn post_empty_body_is_400() {
        let app = app();
        let response = send(
            &app,
            request("POST", "/v1/fragments")
                .header(header::CONTENT_TYPE, "text/plain")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let list = send(&app, request("GET", "/v1/fragments").body(Body::empty()).unwrap()).await;
        assert_eq!(body_json(list).await["fragments"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn post_over_body_limit_is_rejected() {
        let config = ServerConfig {
            max_body_bytes: 4,
            ..ServerConfig::default()
        };
        let app = FragmentServer::with_service(config, FragmentService::memory()).router();
        let response = send(
            &app,
            Request::post("/v1/fragments")
                .header(header::CONTENT_TYPE, "text/plain")
                .body(Body::from("too large"))
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    // -----------------------------------------------------------------------
    // Read
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn get_round_trips_bytes() {
        let app = app();
        let id = post(&app, "application/json", br#"{"a":1}"#).await;
        let response = send(
            &app,
            request("GET", &format!("/v1/fragments/{id}")).body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
        assert_eq!(body_bytes(response).await, br#"{"a":1}"#);
    }

    #[tokio::test]
    async fn get_markdown_as_html() {
        let app = app();
        let id = post(&app, "text/markdown", b"# Title").await;
        let response = send(
            &app,
            request("GET", &format!("/v1/fragments/{id}.html")).body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/html"));
        let html = String::from_utf8(body_bytes(response).await).unwrap();
        assert!(html.contains("<h1>Title</h1>"));
    }

    #[tokio::test]
    async fn get_text_as_png_is_415() {
        let app = app();
        let id = post(&app, "text/plain", b"plain").await;
        let response = send(
            &app,
            request("GET", &format!("/v1/fragments/{id}.png")).body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[tokio::test]
    async fn get_unknown_id_is_404() {
        let response = send(
            &app(),
            request("GET", "/v1/fragments/nope").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["error"]["code"], 404);
    }

    #[tokio::test]
    async fn info_returns_metadata() {
        let app = app();
        let id = post(&app, "text/plain", b"abc").await;
        let response = send(
            &app,
            request("GET", &format!("/v1/fragments/{id}/info")).body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["fragment"]["id"], id.as_str());
        assert_eq!(json["fragment"]["size"], 3);
    }

    #[tokio::test]
    async fn list_ids_and_expanded() {
        let app = app();
        let a = post(&app, "text/plain", b"a").await;
        let b = post(&app, "text/plain", b"bb").await;

        let ids = send(&app, request("GET", "/v1/fragments").body(Body::empty()).unwrap()).await;
        let ids = body_json(ids).await;
        let mut listed: Vec<&str> = ids["fragments"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        listed.sort();
        let mut expected = vec![a.as_str(), b.as_str()];
        expected.sort();
        assert_eq!(listed, expected);

        let full = send(
            &app,
            request("GET", "/v1/fragments?expand=1").body(Body::empty()).unwrap(),
        )
        .await;
        let full = body_json(full).await;
        assert_eq!(full["fragments"].as_array().unwrap().len(), 2);
        assert!(full["fragments"][0]["type"].is_string());
    }

    #[tokio::test]
    async fn owners_are_isolated() {
        let app = app();
        let id = post(&app, "text/plain", b"mine").await;
        let response = send(
            &app,
            Request::get(format!("/v1/fragments/{id}"))
                .header(header::AUTHORIZATION, basic("user2@email.com", "password2"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    // -----------------------------------------------------------------------
    // Update and delete
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn put_replaces_data() {
        let app = app();
        let id = post(&app, "text/plain", b"old").await;
        let response = send(
            &app,
            request("PUT", &format!("/v1/fragments/{id}"))
                .header(header::CONTENT_TYPE, "text/plain")
                .body(Body::from("newer"))
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["fragment"]["size"], 5);

        let data = send(
            &app,
            request("GET", &format!("/v1/fragments/{id}")).body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(body_bytes(data).await, b"newer");
    }

    #[tokio::test]
    async fn put_with_different_type_is_400() {
        let app = app();
        let id = post(&app, "text/plain", b"old").await;
        let response = send(
            &app,
            request("PUT", &format!("/v1/fragments/{id}"))
                .header(header::CONTENT_TYPE, "text/markdown")
                .body(Body::from("# new"))
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn put_unknown_id_is_404() {
        let response = send(
            &app(),
            request("PUT", "/v1/fragments/missing")
                .header(header::CONTENT_TYPE, "text/plain")
                .body(Body::from("x"))
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_then_get_is_404() {
        let app = app();
        let id = post(&app, "text/plain", b"bye").await;
        let response = send(
            &app,
            request("DELETE", &format!("/v1/fragments/{id}")).body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, serde_json::json!({"status": "ok"}));

        let response = send(
            &app,
            request("GET", &format!("/v1/fragments/{id}")).body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = send(
            &app,
            request("DELETE", &format!("/v1/fragments/{id}")).body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
