use async_trait::async_trait;
use axum::{routing::get, Json, Router};
use serde_json::json;
use shelf_kernel::{InitCtx, Module};

pub const WELCOME_MESSAGE: &str = "Welcome to the Book Library App";

/// Serves the landing route at `/`
pub struct HomeModule;

#[async_trait]
impl Module for HomeModule {
    fn name(&self) -> &'static str {
        "home"
    }

    fn routes(&self, _ctx: &InitCtx<'_>) -> Router {
        Router::new().route("/", get(welcome))
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "Welcome message",
                        "responses": {
                            "200": {
                                "description": "OK",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "object",
                                            "properties": {
                                                "message": { "type": "string" }
                                            }
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }))
    }
}

async fn welcome() -> Json<serde_json::Value> {
    Json(json!({ "message": WELCOME_MESSAGE }))
}

pub fn create_module() -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(HomeModule)
}
