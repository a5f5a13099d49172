// Web dashboard.
// Serves the dashboard page and the JSON API over the same analysis and cleanup operations as the CLI.

pub mod api;
pub mod dashboard;
pub mod error;
pub mod state;

use std::sync::Arc;

use poem::listener::TcpListener;
use poem::middleware::Tracing;
use poem::{Endpoint, EndpointExt, Route, Server, get, post};
use tracing::info;

use crate::error::Result;

pub use error::ApiError;
pub use state::AppState;

pub fn app(state: Arc<AppState>) -> impl Endpoint {
    Route::new()
        .at("/", get(dashboard::index))
        .at("/api/status", get(api::get_status))
        .at("/api/analyze", get(api::get_analyze))
        .at("/api/cleanup", post(api::post_cleanup))
        .at("/api/cache/stats", get(api::get_cache_stats))
        .at("/api/cache/clear", post(api::post_cache_clear))
        .data(state)
        .with(Tracing)
}

pub async fn run(host: &str, port: u16, state: AppState) -> Result<()> {
    info!(host, port, "starting dashboard");
    Server::new(TcpListener::bind(format!("{}:{}", host, port)))
        .run(app(Arc::new(state)))
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheStore, MemoryCache};
    use crate::config::Settings;
    use crate::context::Limits;
    use crate::github::testing::{BASE, ScriptedTransport, logins_json, ok, response};
    use poem::http::StatusCode;
    use poem::test::{TestClient, TestResponse};
    use pretty_assertions::assert_eq;
    use reqwest::Method;
    use serde_json::{Value, json};

    fn settings() -> Settings {
        Settings {
            username: Some("me".to_string()),
            ..Settings::default()
        }
    }

    fn graph() -> ScriptedTransport {
        ScriptedTransport::new()
            .get(
                &format!("{}/users/me/followers?per_page=100", BASE),
                vec![ok(&logins_json(&["a", "c"]))],
            )
            .get(
                &format!("{}/users/me/following?per_page=100", BASE),
                vec![ok(&logins_json(&["a", "d"]))],
            )
    }

    fn state(settings: Settings, transport: Arc<ScriptedTransport>) -> Arc<AppState> {
        Arc::new(AppState::new(settings, Arc::new(MemoryCache::new())).with_transport(transport))
    }

    async fn body_json(response: TestResponse) -> Value {
        let body = response.0.into_body().into_string().await.unwrap();
        serde_json::from_str(&body).unwrap()
    }

    #[tokio::test]
    async fn test_dashboard_page() {
        let cli = TestClient::new(app(state(settings(), Arc::new(graph()))));

        let resp = cli.get("/").send().await;
        resp.assert_status_is_ok();
        let body = resp.0.into_body().into_string().await.unwrap();
        assert!(body.contains("<title>Follow-Fellow Dashboard</title>"));
        assert!(body.contains("/api/analyze"));
    }

    #[tokio::test]
    async fn test_analyze() {
        let cli = TestClient::new(app(state(settings(), Arc::new(graph()))));

        let resp = cli.get("/api/analyze").send().await;
        resp.assert_status_is_ok();
        let report = body_json(resp).await;

        assert_eq!(report["user"], "me");
        assert_eq!(report["stats"]["mutual_follows"], 1);
        assert_eq!(report["stats"]["one_sided_follows"], 1);
        assert_eq!(report["one_sided"][0]["username"], "d");
        assert_eq!(report["not_following_back"][0]["username"], "c");
        assert_eq!(report["mutual"], json!(["a"]));
    }

    #[tokio::test]
    async fn test_missing_token() {
        let state = Arc::new(AppState::new(Settings::default(), Arc::new(MemoryCache::new())));
        let cli = TestClient::new(app(state));

        let resp = cli.get("/api/analyze").send().await;
        resp.assert_status(StatusCode::BAD_REQUEST);
        let body = body_json(resp).await;
        assert!(body["error"].as_str().unwrap().contains("GITHUB_TOKEN"));
    }

    #[tokio::test]
    async fn test_unauthorized() {
        let transport = ScriptedTransport::new().get(
            &format!("{}/users/me/followers?per_page=100", BASE),
            vec![response(401, r#"{"message":"Bad credentials"}"#, &[])],
        );
        let cli = TestClient::new(app(state(settings(), Arc::new(transport))));

        cli.get("/api/analyze")
            .send()
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_request_limit() {
        let limited = Settings {
            limits: Limits {
                max_requests: 0,
                ..Limits::default()
            },
            ..settings()
        };
        let cli = TestClient::new(app(state(limited, Arc::new(graph()))));

        cli.get("/api/analyze")
            .send()
            .await
            .assert_status(StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn test_upstream_failure() {
        let cli = TestClient::new(app(state(settings(), Arc::new(ScriptedTransport::new()))));

        cli.get("/api/analyze")
            .send()
            .await
            .assert_status(StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_cleanup_defaults_to_dry_run() {
        let transport = Arc::new(graph());
        let cli = TestClient::new(app(state(settings(), transport.clone())));

        let resp = cli.post("/api/cleanup").send().await;
        resp.assert_status_is_ok();
        let outcome = body_json(resp).await;

        assert_eq!(outcome["dry_run"], true);
        assert_eq!(outcome["processed"], 1);
        assert_eq!(outcome["users"], json!(["d"]));
        assert_eq!(transport.count_method(&Method::DELETE), 0);
    }

    #[tokio::test]
    async fn test_cleanup() {
        let transport = Arc::new(graph().route(
            Method::DELETE,
            &format!("{}/user/following/d", BASE),
            vec![response(204, "", &[])],
        ));
        let cli = TestClient::new(app(state(settings(), transport.clone())));

        let resp = cli
            .post("/api/cleanup")
            .body_json(&json!({ "dry_run": false }))
            .send()
            .await;
        resp.assert_status_is_ok();
        let outcome = body_json(resp).await;

        assert_eq!(outcome["dry_run"], false);
        assert_eq!(outcome["unfollowed"], json!(["d"]));
        assert_eq!(transport.count_method(&Method::DELETE), 1);
    }

    #[tokio::test]
    async fn test_cleanup_partial() {
        let transport = ScriptedTransport::new()
            .get(
                &format!("{}/users/me/followers?per_page=100", BASE),
                vec![ok("[]")],
            )
            .get(
                &format!("{}/users/me/following?per_page=100", BASE),
                vec![ok(&logins_json(&["x", "y"]))],
            );
        let strict = Settings {
            limits: Limits {
                max_errors: 0,
                ..Limits::default()
            },
            ..settings()
        };
        let cli = TestClient::new(app(state(strict, Arc::new(transport))));

        let resp = cli
            .post("/api/cleanup")
            .body_json(&json!({ "dry_run": false }))
            .send()
            .await;
        resp.assert_status(StatusCode::TOO_MANY_REQUESTS);
        let body = body_json(resp).await;

        assert!(body["error"].as_str().unwrap().contains("Error budget exceeded"));
        assert_eq!(body["outcome"]["failed"], json!(["x"]));
        assert_eq!(body["outcome"]["skipped"], json!(["y"]));
        assert_eq!(body["outcome"]["partial"], true);
    }

    #[tokio::test]
    async fn test_status() {
        let transport = ScriptedTransport::new().get(
            &format!("{}/rate_limit", BASE),
            vec![ok(
                r#"{"resources":{"core":{"limit":5000,"remaining":4321,"reset":1700000000}}}"#,
            )],
        );
        let cli = TestClient::new(app(state(settings(), Arc::new(transport))));

        let resp = cli.get("/api/status").send().await;
        resp.assert_status_is_ok();
        let body = body_json(resp).await;

        assert_eq!(body["rate_limit"]["remaining"], 4321);
        assert_eq!(body["request_status"]["current_requests"], 1);
    }

    #[tokio::test]
    async fn test_cache_endpoints() {
        let cache = Arc::new(MemoryCache::new());
        let state = Arc::new(
            AppState::new(settings(), cache.clone()).with_transport(Arc::new(graph())),
        );
        let cli = TestClient::new(app(state));

        cli.get("/api/analyze").send().await.assert_status_is_ok();

        let resp = cli.get("/api/cache/stats").send().await;
        resp.assert_status_is_ok();
        let stats = body_json(resp).await;
        assert_eq!(stats["entries"], 2);
        assert_eq!(stats["location"], "memory");

        let resp = cli.post("/api/cache/clear").send().await;
        resp.assert_status_is_ok();
        assert_eq!(body_json(resp).await["cleared"], 2);
        assert!(cache.is_empty());
        assert_eq!(cache.stats(settings().cache_ttl).unwrap().entries, 0);
    }
}
