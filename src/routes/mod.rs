pub mod api;
pub mod relay;

use axum::{http::HeaderValue, Router};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{config::Config, docs::ApiDoc, AppState};
pub use api::create_api_routes;
pub use relay::create_relay_routes;

/// Assemble the full application router. Swagger UI is left out in production.
pub fn create_app(app_state: Arc<AppState>, config: &Config) -> Router {
    let mut app = Router::new()
        .merge(create_relay_routes())
        // Mount API routes
        .nest("/api", create_api_routes())
        .with_state(app_state);

    if !config.is_production() {
        // Mount Swagger UI
        app = app.merge(
            SwaggerUi::new("/swagger").url("/api-docs/openapi.json", ApiDoc::openapi()),
        );
    }

    app.layer(cors_layer(config))
        // Add tracing layer
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(config: &Config) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    match config.allowed_origins() {
        None => layer.allow_origin(Any),
        Some(origins) => {
            let values: Vec<HeaderValue> = origins
                .iter()
                .filter_map(|origin| match HeaderValue::from_str(origin) {
                    Ok(value) => Some(value),
                    Err(_) => {
                        warn!("Ignoring invalid CORS origin '{}'", origin);
                        None
                    }
                })
                .collect();
            layer.allow_origin(AllowOrigin::list(values))
        }
    }
}
