use super::cookie::*;
use super::error::*;
use crate::application_port::*;
use crate::domain_model::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use warp::http::StatusCode;
use warp::reply::Response;
use warp::{self, reject};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(error: ApiError) -> Self {
        ApiResponse {
            success: false,
            data: None,
            error: Some(error),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SignUpRequest {
    pub name: String,
    #[serde(alias = "email")]
    pub login: String,
    pub password: String,
    #[serde(alias = "passwordConfirm")]
    pub password_confirm: String,
}

pub async fn sign_up(
    body: SignUpRequest,
    auth_service: Arc<dyn AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let signup_input = SignupInput {
        name: body.name,
        login: body.login,
        password: body.password,
        password_confirm: body.password_confirm,
    };
    let profile = auth_service
        .sign_up(signup_input)
        .await
        .map_err(ApiError::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::with_status(
        warp::reply::json(&ApiResponse::ok(profile)),
        StatusCode::CREATED,
    ))
}

#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    #[serde(alias = "email")]
    pub login: String,
    pub password: String,
}

/// Tokens go in the body and in cookies; the session id only in a cookie.
fn session_reply(issued: IssuedSession, cookies: &CookiePolicy) -> Result<Response, warp::Rejection> {
    let set_cookies = vec![
        cookies.access_cookie(&issued.tokens.access_token),
        cookies.session_cookie(&issued.session_id),
    ];
    with_cookies(
        warp::reply::json(&ApiResponse::ok(issued.tokens)),
        set_cookies,
    )
    .map_err(reject::custom)
}

pub async fn sign_in(
    body: SignInRequest,
    auth_service: Arc<dyn AuthService>,
    cookies: CookiePolicy,
) -> Result<Response, warp::Rejection> {
    let login_input = LoginInput {
        login: body.login,
        password: body.password,
    };
    let issued = auth_service
        .sign_in(login_input)
        .await
        .map_err(ApiError::from)
        .map_err(reject::custom)?;

    session_reply(issued, &cookies)
}

pub async fn refresh(
    user: UserRecord,
    session_cookie: Option<String>,
    auth_service: Arc<dyn AuthService>,
    cookies: CookiePolicy,
) -> Result<Response, warp::Rejection> {
    let issued = auth_service
        .refresh(SessionId::from_presented(session_cookie), user.user_id)
        .await
        .map_err(ApiError::from)
        .map_err(reject::custom)?;

    session_reply(issued, &cookies)
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {}

pub async fn log_out(
    session_cookie: Option<String>,
    auth_service: Arc<dyn AuthService>,
    cookies: CookiePolicy,
) -> Result<Response, warp::Rejection> {
    auth_service
        .log_out(SessionId::from_presented(session_cookie))
        .await;

    with_cookies(
        warp::reply::json(&ApiResponse::ok(LogoutResponse {})),
        vec![
            cookies.expired(ACCESS_TOKEN_COOKIE),
            cookies.expired(SESSION_ID_COOKIE),
        ],
    )
    .map_err(reject::custom)
}

pub async fn me(user: UserRecord) -> Result<impl warp::Reply, warp::Rejection> {
    Ok(warp::reply::json(&ApiResponse::ok(UserProfile::from(&user))))
}

#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub results: usize,
    pub users: Vec<UserProfile>,
}

pub async fn list_users(
    _caller: UserRecord,
    query: PageQuery,
    user_service: Arc<dyn UserService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let users = user_service
        .list_users(query)
        .await
        .map_err(ApiError::from)
        .map_err(reject::custom)?;

    let response = UserListResponse {
        results: users.len(),
        users,
    };
    Ok(warp::reply::json(&ApiResponse::ok(response)))
}
