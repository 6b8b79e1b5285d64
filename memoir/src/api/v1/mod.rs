pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod response;
pub mod router;

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::json;
    use tempfile::TempDir;
    use tower::ServiceExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::api::routes::create_router;
    use crate::api::state::AppState;
    use crate::config::{Config, EmbeddingsConfig, LlmConfig};

    struct TestApp {
        state: AppState,
        _dir: TempDir,
        _embeddings: MockServer,
    }

    async fn test_app(api_keys: Vec<String>) -> TestApp {
        let embeddings_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{ "index": 0, "embedding": [0.1, 0.2, 0.3, 0.4] }]
            })))
            .mount(&embeddings_server)
            .await;

        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.server.api_keys = api_keys;
        config.database.url = format!("file:{}", dir.path().join("diary.db").display());
        config.database.auth_token = None;
        config.database.local_path = None;
        config.embeddings = EmbeddingsConfig {
            model: "openai/text-embedding-3-small".to_string(),
            dimensions: 4,
            batch_size: 8,
            api_key: Some("test-embedding-key".to_string()),
            base_url: Some(embeddings_server.uri()),
            timeout_secs: 5,
            max_retries: 0,
        };
        config.llm = LlmConfig {
            model: "openai/gpt-4o-mini".to_string(),
            api_key: None,
            ..LlmConfig::default()
        };

        let embeddings = crate::embeddings::EmbeddingProvider::new_async(&config.embeddings)
            .await
            .unwrap();
        let raw_db = crate::db::Database::new(&config.database, embeddings.dimensions())
            .await
            .unwrap();
        let db: std::sync::Arc<dyn crate::db::DatabaseBackend> =
            std::sync::Arc::new(crate::db::LibSqlBackend::new(raw_db));
        let llm = crate::llm::LlmProvider::new(&config.llm);

        TestApp {
            state: AppState::new(config, db, embeddings, llm),
            _dir: dir,
            _embeddings: embeddings_server,
        }
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn send(
        state: &AppState,
        method: &str,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> axum::response::Response {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        create_router(state.clone()).oneshot(request).await.unwrap()
    }

    async fn create_session(state: &AppState) -> String {
        let response = send(state, "POST", "/api/v1/sessions", None).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let json = body_json(response).await;
        json["data"]["sessionId"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn protected_route_requires_auth() {
        let app = test_app(vec!["test-key".to_string()]).await;

        let response = send(
            &app.state,
            "POST",
            "/api/v1/memories:search",
            Some(json!({ "q": "hello" })),
        )
        .await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "unauthorized");
        assert!(json.get("data").is_none());
    }

    #[tokio::test]
    async fn valid_bearer_token_is_accepted() {
        let app = test_app(vec!["test-key".to_string()]).await;

        let response = create_router(app.state.clone())
            .oneshot(
                Request::builder()
                    .uri("/api/v1/profile")
                    .header("authorization", "Bearer test-key")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_bearer_token_is_rejected() {
        let app = test_app(vec!["test-key".to_string()]).await;

        let response = create_router(app.state.clone())
            .oneshot(
                Request::builder()
                    .uri("/api/v1/profile")
                    .header("authorization", "Bearer other-key")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let json = body_json(response).await;
        assert_eq!(json["error"]["message"], "Invalid API key");
    }

    #[tokio::test]
    async fn health_is_public() {
        let app = test_app(vec!["secret".to_string()]).await;

        let response = send(&app.state, "GET", "/api/v1/health", None).await;

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["data"]["status"], "ok");
        assert_eq!(json["data"]["embeddings"]["dimensions"], 4);
        assert_eq!(json["data"]["llm"]["status"], "unavailable");
        assert!(json.get("error").is_none());
    }

    #[tokio::test]
    async fn openapi_json_is_public_and_valid() {
        let app = test_app(vec!["secret".to_string()]).await;

        let response = send(&app.state, "GET", "/api/v1/openapi.json", None).await;

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        let version = json["openapi"]
            .as_str()
            .expect("openapi field should be a string");
        assert!(
            version.starts_with('3'),
            "OpenAPI version should start with 3, got: {version}"
        );
        assert!(json["paths"]
            .get("/api/v1/sessions/{sessionId}/journal")
            .is_some());
    }

    #[tokio::test]
    async fn open_diary_needs_no_token() {
        let app = test_app(Vec::new()).await;

        let response = send(&app.state, "GET", "/api/v1/knowledge", None).await;

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["data"]["summary"], "No memories recorded yet.");
        assert_eq!(json["data"]["entryCount"], 0);
    }

    #[tokio::test]
    async fn search_on_empty_diary_returns_sentinel() {
        let app = test_app(Vec::new()).await;

        let response = send(
            &app.state,
            "POST",
            "/api/v1/memories:search",
            Some(json!({ "q": "Who is Mia?" })),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["data"]["status"], "no_related_memories");
        assert_eq!(json["data"]["text"], crate::services::NO_RELATED_MEMORIES);
        assert_eq!(json["data"]["results"], json!([]));
    }

    #[tokio::test]
    async fn malformed_json_is_invalid_request() {
        let app = test_app(Vec::new()).await;

        let response = create_router(app.state.clone())
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri("/api/v1/profile")
                    .header("content-type", "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "invalid_request");
    }

    #[tokio::test]
    async fn missing_field_names_the_field() {
        let app = test_app(Vec::new()).await;

        let response = send(&app.state, "PUT", "/api/v1/profile", Some(json!({}))).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"]["message"], "Missing required field: values");
    }

    #[tokio::test]
    async fn new_session_starts_in_onboarding() {
        let app = test_app(Vec::new()).await;

        let response = send(&app.state, "POST", "/api/v1/sessions", None).await;

        assert_eq!(response.status(), StatusCode::CREATED);
        let json = body_json(response).await;
        assert_eq!(json["data"]["phase"], "onboarding");
        assert_eq!(json["data"]["consent"], false);
    }

    #[tokio::test]
    async fn unknown_session_is_not_found() {
        let app = test_app(Vec::new()).await;

        let uri = format!("/api/v1/sessions/{}", uuid::Uuid::new_v4());
        let response = send(&app.state, "GET", &uri, None).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "not_found");
    }

    #[tokio::test]
    async fn journaling_during_onboarding_is_a_conflict() {
        let app = test_app(Vec::new()).await;
        let id = create_session(&app.state).await;

        let response = send(
            &app.state,
            "POST",
            &format!("/api/v1/sessions/{id}/journal"),
            Some(json!({ "content": "Got a new job", "apiKey": "request-key" })),
        )
        .await;

        assert_eq!(response.status(), StatusCode::CONFLICT);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "conflict");
    }

    #[tokio::test]
    async fn onboarding_flow_reaches_journaling() {
        let app = test_app(Vec::new()).await;
        let id = create_session(&app.state).await;

        let early = send(
            &app.state,
            "POST",
            &format!("/api/v1/sessions/{id}/onboarding"),
            Some(json!({ "answer": "Sam, starting a new job" })),
        )
        .await;
        assert_eq!(early.status(), StatusCode::CONFLICT);

        let consent = send(
            &app.state,
            "POST",
            &format!("/api/v1/sessions/{id}/consent"),
            None,
        )
        .await;
        assert_eq!(consent.status(), StatusCode::OK);
        let json = body_json(consent).await;
        assert_eq!(json["data"]["onboardingQuestion"]["step"], 1);

        let answers = [
            "Sam, starting a new job",
            "Moving abroad at sixteen",
            "Warm and a bit sarcastic",
        ];
        let mut last = serde_json::Value::Null;
        for answer in answers {
            let response = send(
                &app.state,
                "POST",
                &format!("/api/v1/sessions/{id}/onboarding"),
                Some(json!({ "answer": answer })),
            )
            .await;
            assert_eq!(response.status(), StatusCode::OK);
            last = body_json(response).await;
        }

        assert_eq!(last["data"]["complete"], true);
        assert_eq!(last["data"]["session"]["phase"], "journaling");

        let profile = body_json(send(&app.state, "GET", "/api/v1/profile", None).await).await;
        assert_eq!(profile["data"]["complete"], true);
        assert_eq!(
            profile["data"]["values"]["linguistic_style"],
            "Warm and a bit sarcastic"
        );
    }

    #[tokio::test]
    async fn past_self_needs_an_entry() {
        let app = test_app(Vec::new()).await;
        let update = send(
            &app.state,
            "PUT",
            "/api/v1/profile",
            Some(json!({ "values": { "consent": "true", "onboarding_complete": "true" } })),
        )
        .await;
        assert_eq!(update.status(), StatusCode::OK);

        let id = create_session(&app.state).await;
        let response = send(
            &app.state,
            "POST",
            &format!("/api/v1/sessions/{id}/mode"),
            Some(json!({ "mode": "past_self" })),
        )
        .await;

        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn journaling_without_model_key_is_invalid_request() {
        let app = test_app(Vec::new()).await;
        send(
            &app.state,
            "PUT",
            "/api/v1/profile",
            Some(json!({ "values": { "onboarding_complete": "true" } })),
        )
        .await;
        let id = create_session(&app.state).await;

        let response = send(
            &app.state,
            "POST",
            &format!("/api/v1/sessions/{id}/journal"),
            Some(json!({ "content": "Got a new job" })),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "invalid_request");
        assert!(json["error"]["message"]
            .as_str()
            .unwrap()
            .contains("No LLM API key configured"));
    }

    #[tokio::test]
    async fn reversed_year_range_is_rejected() {
        let app = test_app(Vec::new()).await;

        let response = send(
            &app.state,
            "GET",
            "/api/v1/entries?yearStart=2024&yearEnd=2020",
            None,
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn entries_list_is_empty_with_total() {
        let app = test_app(Vec::new()).await;

        let response = send(&app.state, "GET", "/api/v1/entries", None).await;

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["data"]["entries"], json!([]));
        assert_eq!(json["meta"]["total"], 0);
    }
}
