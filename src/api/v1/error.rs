use crate::api::v1::handler::ApiResponse;
use crate::application_port::*;
use serde::Serialize;
use std::convert::Infallible;
use std::fmt;
use tracing::warn;
use warp::http::StatusCode;
use warp::{Rejection, reject};

pub async fn recover_error(err: Rejection) -> Result<impl warp::Reply, Infallible> {
    let error = if let Some(e) = err.find::<ApiError>() {
        e.clone()
    } else if err.is_not_found() {
        ApiError::new(ApiErrorCode::NotFound, "Not found")
    } else if let Some(e) = err.find::<warp::body::BodyDeserializeError>() {
        ApiError::new(ApiErrorCode::ValidationFailed, e.to_string())
    } else if err.find::<warp::reject::InvalidQuery>().is_some() {
        ApiError::new(ApiErrorCode::ValidationFailed, "Invalid query string")
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        ApiError::new(ApiErrorCode::ValidationFailed, "Request body too large")
    } else if err.find::<warp::reject::UnsupportedMediaType>().is_some() {
        ApiError::new(ApiErrorCode::ValidationFailed, "Expected a JSON body")
    } else if err.find::<warp::reject::LengthRequired>().is_some() {
        ApiError::new(ApiErrorCode::ValidationFailed, "Content-Length is required")
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        ApiError::new(ApiErrorCode::MethodNotAllowed, "Method not allowed")
    } else {
        ApiError::internal(format!("unhandled rejection: {:?}", err))
    };

    let status = error.code.status();
    let json = warp::reply::json(&ApiResponse::<()>::err(error));
    Ok(warp::reply::with_status(json, status))
}

/// Wire form of a failure: a stable kind plus a human readable message.
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorCode {
    ValidationFailed,
    InvalidCredentials,
    UserExists,
    Unauthenticated,
    Forbidden,
    MissingSession,
    SessionNotFound,
    NotFound,
    MethodNotAllowed,
    InternalError,
}

impl ApiErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiErrorCode::ValidationFailed => StatusCode::BAD_REQUEST,
            ApiErrorCode::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiErrorCode::UserExists => StatusCode::CONFLICT,
            ApiErrorCode::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ApiErrorCode::MissingSession => StatusCode::BAD_REQUEST,
            ApiErrorCode::SessionNotFound => StatusCode::UNAUTHORIZED,
            ApiErrorCode::NotFound => StatusCode::NOT_FOUND,
            ApiErrorCode::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ApiError {
    pub fn new(code: ApiErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Logs the detail and returns a generic error.
    pub fn internal<E: fmt::Display>(error: E) -> ApiError {
        warn!("Internal error: {}", error);
        ApiError::new(ApiErrorCode::InternalError, "Internal error")
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl reject::Reject for ApiError {}

impl From<AuthError> for ApiError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::Validation(msg) => ApiError::new(ApiErrorCode::ValidationFailed, msg),
            AuthError::InvalidCredentials => {
                ApiError::new(ApiErrorCode::InvalidCredentials, "Invalid login or password")
            }
            AuthError::UserExists => ApiError::new(
                ApiErrorCode::UserExists,
                "A user with that login already exists",
            ),
            AuthError::Unauthenticated => {
                ApiError::new(ApiErrorCode::Unauthenticated, "You are not logged in")
            }
            AuthError::Forbidden => ApiError::new(
                ApiErrorCode::Forbidden,
                "You are not allowed to perform this action",
            ),
            AuthError::MissingSession => ApiError::new(
                ApiErrorCode::MissingSession,
                "session_id cookie is missing or empty",
            ),
            AuthError::SessionNotFound => ApiError::new(
                ApiErrorCode::SessionNotFound,
                "Session expired or revoked, please sign in again",
            ),
            e @ (AuthError::Store(_) | AuthError::Hashing(_) | AuthError::Issue(_)) => {
                ApiError::internal(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_failures_hide_details() {
        let api: ApiError = AuthError::Store("redis at 10.0.0.3 refused".into()).into();
        assert_eq!(api.code, ApiErrorCode::InternalError);
        assert!(!api.message.contains("10.0.0.3"));
        assert_eq!(api.code.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn caller_faults_map_to_client_statuses() {
        let cases = [
            (AuthError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (AuthError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (AuthError::UserExists, StatusCode::CONFLICT),
            (AuthError::Unauthenticated, StatusCode::UNAUTHORIZED),
            (AuthError::Forbidden, StatusCode::FORBIDDEN),
            (AuthError::MissingSession, StatusCode::BAD_REQUEST),
            (AuthError::SessionNotFound, StatusCode::UNAUTHORIZED),
        ];
        for (error, status) in cases {
            assert_eq!(ApiError::from(error).code.status(), status);
        }
    }

    #[test]
    fn codes_serialize_snake_case() {
        let json = serde_json::to_string(&ApiErrorCode::SessionNotFound).unwrap();
        assert_eq!(json, "\"session_not_found\"");
    }
}
