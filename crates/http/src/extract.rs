//! Request extractors that report rejections in the standard error format.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        FromRequest, FromRequestParts, Path, Query, Request,
    },
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::error::AppError;

/// JSON body extractor whose rejections render as [`AppError`].
///
/// Well-formed JSON that does not match the target type (missing field,
/// unknown enum value, wrong type) is a 422 validation error; syntax errors
/// and a missing `content-type` are 400.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(rejection_to_error(rejection)),
        }
    }
}

fn rejection_to_error(rejection: JsonRejection) -> AppError {
    match rejection {
        JsonRejection::JsonDataError(err) => AppError::validation(
            vec![json!({ "field": "body", "message": err.body_text() })],
            "request body does not match the expected schema",
        ),
        other => AppError::bad_request(other.body_text()),
    }
}

/// Path parameter extractor; a segment that does not parse is a 422 on `path`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiPath<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(Self(value)),
            Err(PathRejection::FailedToDeserializePathParams(err)) => Err(AppError::validation(
                vec![json!({ "field": "path", "message": err.body_text() })],
                "path parameters are invalid",
            )),
            Err(other) => Err(AppError::Internal(anyhow::anyhow!(other.body_text()))),
        }
    }
}

/// Query string extractor; a parameter that does not parse is a 422 on `query`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(Self(value)),
            Err(rejection) => Err(query_rejection_to_error(rejection)),
        }
    }
}

fn query_rejection_to_error(rejection: QueryRejection) -> AppError {
    AppError::validation(
        vec![json!({ "field": "query", "message": rejection.body_text() })],
        "query parameters are invalid",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http, http::StatusCode, response::IntoResponse};
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Payload {
        #[allow(dead_code)]
        name: String,
    }

    async fn extract(content_type: Option<&str>, body: &'static str) -> Result<Payload, AppError> {
        let mut builder = http::Request::builder().method("POST").uri("/");
        if let Some(content_type) = content_type {
            builder = builder.header("content-type", content_type);
        }
        let req = builder.body(Body::from(body)).unwrap();
        ApiJson::<Payload>::from_request(req, &())
            .await
            .map(|ApiJson(payload)| payload)
    }

    #[tokio::test]
    async fn accepts_matching_body() {
        assert!(extract(Some("application/json"), r#"{"name":"x"}"#)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn schema_mismatch_is_validation_error() {
        let err = extract(Some("application/json"), r#"{"other":1}"#)
            .await
            .unwrap_err();
        assert_eq!(
            err.into_response().status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[tokio::test]
    async fn syntax_error_is_bad_request() {
        let err = extract(Some("application/json"), "{not json")
            .await
            .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn missing_content_type_is_bad_request() {
        let err = extract(None, r#"{"name":"x"}"#).await.unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[derive(Debug, Deserialize)]
    struct Page {
        skip: u32,
    }

    async fn extract_query(uri: &str) -> Result<Page, AppError> {
        let req = http::Request::builder().uri(uri).body(()).unwrap();
        let (mut parts, ()) = req.into_parts();
        ApiQuery::<Page>::from_request_parts(&mut parts, &())
            .await
            .map(|ApiQuery(page)| page)
    }

    #[tokio::test]
    async fn query_parses_matching_params() {
        assert_eq!(extract_query("/?skip=3").await.unwrap().skip, 3);
    }

    #[tokio::test]
    async fn unparsable_query_is_validation_error() {
        match extract_query("/?skip=-1").await.unwrap_err() {
            AppError::Validation { details, code, .. } => {
                assert_eq!(code, "validation_error");
                assert_eq!(details[0]["field"], "query");
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
