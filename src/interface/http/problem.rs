use axum::{
    Json,
    extract::Request,
    http::{HeaderValue, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::error;

use crate::domain::errors::StoreError;

pub type ApiResult<T> = Result<T, ApiError>;

/// Failure kinds the API reports to clients. Only the status code is sent;
/// store details stay server-side unless developer error pages are enabled.
#[derive(Debug)]
pub enum ApiError {
    BadRequest,
    NotFound,
    Store(StoreError),
}

impl From<StoreError> for ApiError {
    fn from(error: StoreError) -> Self {
        Self::Store(error)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Failure description attached to 5xx responses as a response extension.
#[derive(Debug, Clone)]
pub struct ErrorDetail {
    pub title: &'static str,
    pub detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut response = status.into_response();

        if let Self::Store(store_error) = self {
            error!(error = %store_error, "unhandled store failure");
            response.extensions_mut().insert(ErrorDetail {
                title: "Storage error",
                detail: store_error.to_string(),
            });
        }

        response
    }
}

#[derive(Debug, Serialize)]
struct ProblemDetails {
    status: u16,
    title: &'static str,
    detail: String,
}

/// Middleware installed in development mode: replaces the empty body of a
/// failed response with the recorded [`ErrorDetail`].
pub async fn developer_error_details(request: Request, next: Next) -> Response {
    let response = next.run(request).await;
    let Some(detail) = response.extensions().get::<ErrorDetail>().cloned() else {
        return response;
    };

    let status = response.status();
    let payload = ProblemDetails {
        status: status.as_u16(),
        title: detail.title,
        detail: detail.detail,
    };

    let mut response = (status, Json(payload)).into_response();
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/problem+json"),
    );
    response
}
