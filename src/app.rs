use axum::{routing::get, Router};
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use crate::{auth, bookmarks, users};

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .merge(auth::router())
        .merge(users::router())
        .merge(bookmarks::router())
        .route("/health", get(|| async { "ok" }))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     _latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, "response");
                        } else {
                            tracing::info!(%status, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: Router) -> anyhow::Result<()> {
    let addr: SocketAddr = format!(
        "{}:{}",
        std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
        std::env::var("APP_PORT").unwrap_or_else(|_| "8080".into())
    )
    .parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}


// Flows that need real persistence (unique constraint, ownership rows).
// Run with a reachable database: `DATABASE_URL=... cargo test -- --ignored`.
#[cfg(test)]
mod live_tests {
    use super::*;
    use crate::config::{AppConfig, JwtConfig};
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;
    use uuid::Uuid;

    async fn live_app() -> Router {
        let database_url =
            std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for live tests");
        let db = sqlx::postgres::PgPoolOptions::new()
            .max_connections(5)
            .connect(&database_url)
            .await
            .expect("connect to database");
        sqlx::migrate!("./migrations")
            .run(&db)
            .await
            .expect("run migrations");
        let config = Arc::new(AppConfig {
            database_url,
            jwt: JwtConfig {
                secret: "live-test-secret".into(),
                ttl_minutes: 15,
            },
        });
        build_app(AppState { db, config })
    }

    fn unique_email(tag: &str) -> String {
        format!("{tag}-{}@example.com", Uuid::new_v4().simple())
    }

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, String) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    async fn signup(app: &Router, email: &str, password: &str) -> (StatusCode, String) {
        send(
            app,
            "POST",
            "/auth/signup",
            None,
            Some(json!({"email": email, "password": password})),
        )
        .await
    }

    fn token_of(body: &str) -> String {
        serde_json::from_str::<Value>(body).unwrap()["access_token"]
            .as_str()
            .expect("access_token in body")
            .to_string()
    }

    #[tokio::test]
    #[ignore]
    async fn signup_twice_with_same_email_conflicts() {
        let app = live_app().await;
        let email = unique_email("dup");

        let (status, _) = signup(&app, &email, "pw").await;
        assert_eq!(status, StatusCode::CREATED);

        // A different password makes no difference.
        let (status, body) = signup(&app, &email, "other-pw").await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body, "Credentials already exist");
    }

    #[tokio::test]
    #[ignore]
    async fn login_failures_are_indistinguishable() {
        let app = live_app().await;
        let email = unique_email("enum-resistant");
        signup(&app, &email, "right-pw").await;

        let wrong_password = send(
            &app,
            "POST",
            "/auth/login",
            None,
            Some(json!({"email": email, "password": "wrong-pw"})),
        )
        .await;
        let unknown_email = send(
            &app,
            "POST",
            "/auth/login",
            None,
            Some(json!({"email": unique_email("never-signed-up"), "password": "wrong-pw"})),
        )
        .await;

        assert_eq!(wrong_password.0, StatusCode::UNAUTHORIZED);
        assert_eq!(wrong_password, unknown_email);
        assert_eq!(wrong_password.1, "Credentials incorrect");
    }

    #[tokio::test]
    #[ignore]
    async fn cross_user_bookmark_access_is_denied() {
        let app = live_app().await;

        let (_, body) = signup(&app, &unique_email("owner"), "pw").await;
        let owner_token = token_of(&body);
        let (_, body) = signup(&app, &unique_email("intruder"), "pw").await;
        let intruder_token = token_of(&body);

        let (status, body) = send(
            &app,
            "POST",
            "/bookmarks",
            Some(&owner_token),
            Some(json!({"title": "Google", "url": "https://google.com"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = serde_json::from_str::<Value>(&body).unwrap()["bookmark"]["id"]
            .as_str()
            .unwrap()
            .to_string();
        let uri = format!("/bookmarks/{id}");

        for (method, payload) in [
            ("GET", None),
            ("PATCH", Some(json!({"title": "hijacked"}))),
            ("DELETE", None),
        ] {
            let (status, body) = send(&app, method, &uri, Some(&intruder_token), payload).await;
            assert_eq!(status, StatusCode::FORBIDDEN, "{method} should be denied");
            assert_eq!(body, "Access to resource denied");
        }

        // The owner is unaffected.
        let (status, _) = send(&app, "GET", &uri, Some(&owner_token), None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    #[ignore]
    async fn bookmark_lifecycle_end_to_end() {
        let app = live_app().await;
        let email = unique_email("e2e");

        let (status, _) = signup(&app, &email, "pw").await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = send(
            &app,
            "POST",
            "/auth/login",
            None,
            Some(json!({"email": email, "password": "pw"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let token = token_of(&body);

        let (status, body) = send(&app, "GET", "/users/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        let my_id = serde_json::from_str::<Value>(&body).unwrap()["user"]["id"]
            .as_str()
            .unwrap()
            .to_string();

        let (status, body) = send(
            &app,
            "POST",
            "/bookmarks",
            Some(&token),
            Some(json!({"title": "Google", "url": "https://google.com"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let created: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(created["bookmark"]["user_id"].as_str().unwrap(), my_id);
        let id = created["bookmark"]["id"].as_str().unwrap().to_string();

        let (status, body) = send(&app, "GET", "/bookmarks", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        let listed = serde_json::from_str::<Value>(&body).unwrap()["bookmarks"]
            .as_array()
            .unwrap()
            .len();
        assert_eq!(listed, 1);

        let (status, _) = send(&app, "DELETE", &format!("/bookmarks/{id}"), Some(&token), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, body) = send(&app, "GET", "/bookmarks", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(serde_json::from_str::<Value>(&body).unwrap()["bookmarks"]
            .as_array()
            .unwrap()
            .is_empty());
    }
}
