//! Application state and the HTTP router.

use crate::api;
use crate::config::Config;
use crate::telemetry;
use crate::AppState;
use anyhow::Context;
use axum::extract::MatchedPath;
use axum::http::Request;
use axum::middleware;
use axum::Router;
use larder_core::catalog::CatalogData;
use larder_core::engine::RecipeSynthesizer;
use larder_core::error::SynthesisError;
use larder_core::store::{
    load_catalog, seed_catalog, DiskStore, DocumentStore, MemoryStore, RetryingStore,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::Span;
use utoipa_swagger_ui::SwaggerUi;

/// Everything a handler needs: the generator and the document store.
pub struct Services {
    pub synthesizer: RecipeSynthesizer,
    pub store: Arc<dyn DocumentStore>,
    pub store_calls_header: bool,
}

impl Services {
    /// Open the store, seed it if asked, and load the catalog snapshot.
    ///
    /// Fails with [`SynthesisError::CatalogUnavailable`] when the catalog cannot be
    /// loaded; the server must not start in that case.
    pub async fn build(config: &Config) -> anyhow::Result<AppState> {
        let inner: Arc<dyn DocumentStore> = match &config.data_dir {
            Some(dir) => {
                tracing::info!("Using on-disk document store at {}", dir.display());
                Arc::new(DiskStore::new(dir.clone()))
            }
            None => {
                tracing::info!("LARDER_DATA_DIR not set, using in-memory document store");
                Arc::new(MemoryStore::new())
            }
        };
        let store: Arc<dyn DocumentStore> =
            Arc::new(RetryingStore::new(inner).with_timeout(config.store_timeout));

        if config.seed_catalog {
            let builtin = CatalogData::builtin().context("Built-in catalog is invalid")?;
            seed_catalog(store.as_ref(), &builtin)
                .await
                .context("Failed to seed catalog")?;
        }

        let snapshot = load_catalog(store.as_ref())
            .await
            .map_err(|e| SynthesisError::CatalogUnavailable(e.to_string()))?;

        Ok(Arc::new(Services {
            synthesizer: RecipeSynthesizer::from_snapshot(snapshot),
            store,
            store_calls_header: config.store_calls_header,
        }))
    }
}

pub fn router(state: AppState) -> Router {
    let swagger_ui = SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api::openapi());

    let store_calls_header = state.store_calls_header;
    let mut app = Router::new()
        .merge(api::generate::router())
        .merge(api::catalog::router())
        .nest("/api/test", api::testing::router())
        .nest("/api/recipes", api::recipes::router())
        .nest("/api/users", api::users::router())
        .nest("/api/ingredients", api::ingredients::router())
        .nest("/api/cuisines", api::cuisines::router())
        .merge(swagger_ui)
        .with_state(state);
    if store_calls_header {
        app = app.layer(middleware::from_fn(telemetry::store_calls_header));
    }

    app.layer(
        TraceLayer::new_for_http()
            .make_span_with(|request: &Request<_>| {
                let matched_path = request
                    .extensions()
                    .get::<MatchedPath>()
                    .map(MatchedPath::as_str)
                    .unwrap_or(request.uri().path());

                // Don't create a span at all for noisy endpoints
                if matched_path == "/api/test/ping" {
                    tracing::trace_span!("http_request")
                } else {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %matched_path,
                    )
                }
            })
            .on_request(|_request: &Request<_>, _span: &Span| {})
            .on_response(
                |response: &axum::http::Response<_>,
                 latency: std::time::Duration,
                 span: &Span| {
                    // Skip logging for noisy endpoints (trace-level spans)
                    if span.metadata().map(|m| m.level()) == Some(&tracing::Level::TRACE) {
                        return;
                    }
                    let status = response.status().as_u16();
                    let calls = telemetry::current_store_calls().unwrap_or_default();
                    if status >= 500 {
                        tracing::error!(
                            status = %status,
                            latency_ms = %latency.as_millis(),
                            store_calls = calls.total(),
                            store_retries = calls.retries,
                            "request failed with server error"
                        );
                    } else {
                        tracing::info!(
                            status = %status,
                            latency_ms = %latency.as_millis(),
                            store_calls = calls.total(),
                            store_retries = calls.retries,
                            "request completed"
                        );
                    }
                },
            )
            .on_failure(
                |error: tower_http::classify::ServerErrorsFailureClass,
                 latency: std::time::Duration,
                 _span: &Span| {
                    tracing::error!(
                        error = %error,
                        latency_ms = %latency.as_millis(),
                        "request failed"
                    );
                },
            ),
    )
    .layer(middleware::from_fn(telemetry::store_call_scope))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Method, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn test_app() -> Router {
        let state = Services::build(&Config::default()).await.unwrap();
        router(state)
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        user: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header("X-User-Id", user);
        }
        let request = match body {
            Some(body) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, value)
    }

    fn chicken_rice_tomato() -> Value {
        json!({
            "ingredients": ["chicken", "rice", "tomato"],
            "cuisine": "italian",
            "servings": 4
        })
    }

    #[tokio::test]
    async fn test_ping() {
        let app = test_app().await;
        let (status, body) = send(&app, Method::GET, "/api/test/ping", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "ping");
    }

    #[tokio::test]
    async fn test_startup_fails_without_catalog() {
        let config = Config {
            seed_catalog: false,
            ..Config::default()
        };
        let err = Services::build(&config).await.err().unwrap();
        assert!(matches!(
            err.downcast_ref::<SynthesisError>(),
            Some(SynthesisError::CatalogUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_generate_recipe() {
        let app = test_app().await;
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/generate-recipe",
            None,
            Some(chicken_rice_tomato()),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Italian Chicken Risotto");
        assert_eq!(body["servings"], 4);
        assert_eq!(body["cooking_time_minutes"], 50);
        assert_eq!(body["difficulty"], "Hard");
        assert_eq!(body["ingredient_lines"].as_array().unwrap().len(), 6);
    }

    #[tokio::test]
    async fn test_generate_accepts_camel_case_preferences() {
        let app = test_app().await;
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/generate-recipe",
            None,
            Some(json!({
                "ingredients": ["chickpeas", "spinach", "onion"],
                "cuisine": "indian",
                "dietaryPreferences": ["vegan"]
            })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Indian Chickpeas Curry (Vegan)");
        assert_eq!(body["dietary_preferences"], json!(["Vegan"]));
    }

    #[tokio::test]
    async fn test_generate_rejects_empty_ingredients() {
        let app = test_app().await;
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/generate-recipe",
            None,
            Some(json!({"ingredients": []})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "empty ingredients"}));
    }

    #[tokio::test]
    async fn test_generate_rejects_oversized_ingredient() {
        let app = test_app().await;
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/generate-recipe",
            None,
            Some(json!({"ingredients": ["x".repeat(200_000), "rice"]})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            json!({"error": "ingredient longer than 200 characters"})
        );
    }

    #[tokio::test]
    async fn test_generate_rejects_bad_requests() {
        let app = test_app().await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/generate-recipe",
            None,
            Some(json!({"ingredients": ["chicken"], "dietary_preferences": ["Carnivore"]})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("Carnivore"));

        // Missing the ingredients field entirely.
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/generate-recipe",
            None,
            Some(json!({"cuisine": "italian"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_generate_reports_no_feasible_recipe() {
        let app = test_app().await;
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/generate-recipe",
            None,
            Some(json!({
                "ingredients": ["tofu"],
                "cuisine": "italian",
                "dietary_preferences": ["Vegan"]
            })),
        )
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "no feasible recipe");
        assert_eq!(body["cuisine"], "italian");
        let excluded = body["constraints"]["excluded_categories"].as_array().unwrap();
        assert!(excluded.contains(&json!("dairy")));
        let rejections = body["rejections"].as_array().unwrap();
        assert_eq!(rejections.len(), 2);
        assert!(rejections.iter().all(|r| r["role"] == "protein"));
    }

    #[tokio::test]
    async fn test_recipes_are_owner_scoped() {
        let app = test_app().await;
        let (_, recipe) = send(
            &app,
            Method::POST,
            "/api/generate-recipe",
            None,
            Some(chicken_rice_tomato()),
        )
        .await;

        // No caller identity.
        let (status, _) = send(&app, Method::POST, "/api/recipes", None, Some(recipe.clone())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, saved) = send(
            &app,
            Method::POST,
            "/api/recipes",
            Some("alice"),
            Some(recipe.clone()),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(saved["user_id"], "alice");
        assert_eq!(saved["name"], "Italian Chicken Risotto");
        let id = saved["id"].as_str().unwrap().to_string();
        let uri = format!("/api/recipes/{id}");

        let (status, list) = send(&app, Method::GET, "/api/recipes", Some("alice"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list["recipes"].as_array().unwrap().len(), 1);

        let (_, list) = send(&app, Method::GET, "/api/recipes", Some("bob"), None).await;
        assert!(list["recipes"].as_array().unwrap().is_empty());

        let (status, _) = send(&app, Method::GET, &uri, Some("bob"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&app, Method::DELETE, &uri, Some("bob"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let mut renamed = recipe.clone();
        renamed["name"] = json!("Sunday Risotto");
        let (status, updated) = send(&app, Method::PUT, &uri, Some("alice"), Some(renamed)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["name"], "Sunday Risotto");
        assert_eq!(updated["created_at"], saved["created_at"]);

        let (status, _) = send(&app, Method::DELETE, &uri, Some("alice"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&app, Method::GET, &uri, Some("alice"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_recipe_validation() {
        let app = test_app().await;
        let (_, mut recipe) = send(
            &app,
            Method::POST,
            "/api/generate-recipe",
            None,
            Some(chicken_rice_tomato()),
        )
        .await;
        recipe["servings"] = json!(0);

        let (status, body) =
            send(&app, Method::POST, "/api/recipes", Some("alice"), Some(recipe)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Servings must be at least 1");
    }

    #[tokio::test]
    async fn test_store_calls_header() {
        use tracing_subscriber::layer::SubscriberExt;

        let _guard = tracing::subscriber::set_default(
            tracing_subscriber::registry().with(telemetry::StoreCallLayer),
        );
        let config = Config {
            store_calls_header: true,
            ..Config::default()
        };
        let app = router(Services::build(&config).await.unwrap());

        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/users")
            .header("Content-Type", "application/json")
            .body(Body::from(
                json!({"name": "Ada", "email": "ada@example.com"}).to_string(),
            ))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        // Email uniqueness check, then the write.
        assert_eq!(
            response.headers()[telemetry::STORE_CALLS_HEADER],
            "reads=1; writes=1; retries=0"
        );

        let request = Request::builder()
            .uri("/api/test/ping")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(
            response.headers()[telemetry::STORE_CALLS_HEADER],
            "reads=0; writes=0; retries=0"
        );
    }

    #[tokio::test]
    async fn test_store_calls_header_off_by_default() {
        let app = test_app().await;
        let request = Request::builder()
            .uri("/api/test/ping")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert!(response.headers().get(telemetry::STORE_CALLS_HEADER).is_none());
    }

    #[tokio::test]
    async fn test_users_crud() {
        let app = test_app().await;
        let ada = json!({
            "name": "Ada",
            "email": "Ada@Example.com",
            "dietary_preferences": ["Vegetarian"]
        });

        let (status, created) = send(&app, Method::POST, "/api/users", None, Some(ada.clone())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["email"], "ada@example.com");
        let uri = format!("/api/users/{}", created["id"].as_str().unwrap());

        // Same address, different case.
        let duplicate = json!({"name": "Imposter", "email": "ADA@example.com"});
        let (status, _) = send(&app, Method::POST, "/api/users", None, Some(duplicate)).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/users",
            None,
            Some(json!({"name": "", "email": "x@y.z"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Name cannot be empty");

        // Keeping your own email on update is not a conflict.
        let (status, updated) = send(
            &app,
            Method::PUT,
            &uri,
            None,
            Some(json!({"name": "Ada L.", "email": "ada@example.com", "phone": "555-0100"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["name"], "Ada L.");
        assert_eq!(updated["phone"], "555-0100");

        let (status, list) = send(&app, Method::GET, "/api/users", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list["users"].as_array().unwrap().len(), 1);

        let (status, _) = send(&app, Method::DELETE, &uri, None, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&app, Method::GET, &uri, None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_ingredient_category_filter() {
        let app = test_app().await;
        let (status, body) = send(
            &app,
            Method::GET,
            "/api/ingredients?category=poultry",
            None,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let ids: Vec<&str> = body["ingredients"]
            .as_array()
            .unwrap()
            .iter()
            .map(|i| i["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["chicken", "chicken_broth"]);

        let (status, _) = send(
            &app,
            Method::GET,
            "/api/ingredients?category=plankton",
            None,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_ingredient_writes_and_reload() {
        let app = test_app().await;
        let (_, before) = send(&app, Method::GET, "/api/catalog", None, None).await;

        let tofu = json!({
            "id": "tofu",
            "canonical_name": "tofu",
            "category": "legume",
            "roles": ["protein"],
            "nutrition_per_unit": {"calories": 76, "protein_g": 8, "carbs_g": 1.9, "fat_g": 4.8},
            "default_unit": "g",
            "base_unit_size": 100,
            "serving_quantity": 125
        });
        let (status, _) = send(&app, Method::POST, "/api/ingredients", None, Some(tofu.clone())).await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, _) = send(&app, Method::POST, "/api/ingredients", None, Some(tofu)).await;
        assert_eq!(status, StatusCode::CONFLICT);

        // Not a catalog document.
        let (status, _) = send(
            &app,
            Method::POST,
            "/api/ingredients",
            None,
            Some(json!({"id": "mystery"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        // Writes are invisible until a reload.
        let (_, unchanged) = send(&app, Method::GET, "/api/catalog", None, None).await;
        assert_eq!(unchanged["ingredients"], before["ingredients"]);

        let (status, reloaded) = send(&app, Method::POST, "/api/catalog/reload", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            reloaded["ingredients"].as_u64().unwrap(),
            before["ingredients"].as_u64().unwrap() + 1
        );
    }

    #[tokio::test]
    async fn test_failed_reload_keeps_old_catalog() {
        let app = test_app().await;

        let (status, mut italian) = send(&app, Method::GET, "/api/cuisines/italian", None, None).await;
        assert_eq!(status, StatusCode::OK);
        italian["affinity_ingredient_ids"]
            .as_array_mut()
            .unwrap()
            .push(json!("unobtainium"));
        let (status, _) = send(
            &app,
            Method::PUT,
            "/api/cuisines/italian",
            None,
            Some(italian),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&app, Method::POST, "/api/catalog/reload", None, None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"].as_str().unwrap().contains("unobtainium"));

        // Generation still runs against the previous snapshot.
        let (status, recipe) = send(
            &app,
            Method::POST,
            "/api/generate-recipe",
            None,
            Some(chicken_rice_tomato()),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(recipe["name"], "Italian Chicken Risotto");
    }

    #[tokio::test]
    async fn test_cuisine_id_must_match_path() {
        let app = test_app().await;
        let (_, italian) = send(&app, Method::GET, "/api/cuisines/italian", None, None).await;
        let (status, body) = send(
            &app,
            Method::PUT,
            "/api/cuisines/indian",
            None,
            Some(italian),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Cuisine id does not match path");
    }

    #[test]
    fn test_openapi_lists_every_route() {
        let spec = api::openapi();
        for path in [
            "/api/generate-recipe",
            "/api/catalog",
            "/api/catalog/reload",
            "/api/recipes",
            "/api/recipes/{id}",
            "/api/users",
            "/api/users/{id}",
            "/api/ingredients",
            "/api/ingredients/{id}",
            "/api/cuisines",
            "/api/cuisines/{id}",
            "/api/test/ping",
        ] {
            assert!(spec.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
