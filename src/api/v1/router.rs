use super::cookie::{ACCESS_TOKEN_COOKIE, CookiePolicy, SESSION_ID_COOKIE};
use super::error::*;
use super::handler;
use crate::application_impl::{AccessGuard, authorize};
use crate::application_port::AuthError;
use crate::domain_model::{PageQuery, Role, UserRecord};
use crate::server::*;
use serde::de::DeserializeOwned;
use std::convert::Infallible;
use std::sync::Arc;
use warp::{Filter, reject};

const MAX_BODY_BYTES: u64 = 16 * 1024;

static STAFF: [Role; 2] = [Role::Admin, Role::Moderator];

pub fn routes(
    server: Arc<Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let sign_up = warp::path("sign-up")
        .and(warp::path::end())
        .and(warp::post())
        .and(json_body())
        .and(with(server.auth_service.clone()))
        .and_then(handler::sign_up);

    let sign_in = warp::path("sign-in")
        .and(warp::path::end())
        .and(warp::post())
        .and(json_body())
        .and(with(server.auth_service.clone()))
        .and(with_cookie_policy(server.cookie_policy.clone()))
        .and_then(handler::sign_in);

    let refresh = warp::path("refresh")
        .and(warp::path::end())
        .and(warp::post())
        .and(with_authentication(server.access_guard.clone()))
        .and(warp::cookie::optional::<String>(SESSION_ID_COOKIE))
        .and(with(server.auth_service.clone()))
        .and(with_cookie_policy(server.cookie_policy.clone()))
        .and_then(handler::refresh);

    let log_out = warp::path("logout")
        .and(warp::path::end())
        .and(warp::get())
        .and(warp::cookie::optional::<String>(SESSION_ID_COOKIE))
        .and(with(server.auth_service.clone()))
        .and(with_cookie_policy(server.cookie_policy.clone()))
        .and_then(handler::log_out);

    let me = warp::path("users")
        .and(warp::path("me"))
        .and(warp::path::end())
        .and(warp::get())
        .and(with_authentication(server.access_guard.clone()))
        .and_then(handler::me);

    let users = warp::path("users")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_roles(server.access_guard.clone(), &STAFF))
        .and(warp::query::<PageQuery>())
        .and(with(server.user_service.clone()))
        .and_then(handler::list_users);

    sign_up
        .or(sign_in)
        .or(refresh)
        .or(log_out)
        .or(me)
        .or(users)
}

fn json_body<T: DeserializeOwned + Send>()
-> impl Filter<Extract = (T,), Error = warp::Rejection> + Clone {
    warp::body::content_length_limit(MAX_BODY_BYTES).and(warp::body::json())
}

fn with<ServiceType>(
    service: Arc<ServiceType>,
) -> impl Filter<Extract = (Arc<ServiceType>,), Error = Infallible> + Clone
where
    ServiceType: Send + Sync + ?Sized,
{
    warp::any().map(move || service.clone())
}

fn with_cookie_policy(
    policy: CookiePolicy,
) -> impl Filter<Extract = (CookiePolicy,), Error = Infallible> + Clone {
    warp::any().map(move || policy.clone())
}

/// Bearer header first, then the `access_token` cookie.
fn presented_token(header: Option<String>, cookie: Option<String>) -> Option<String> {
    header
        .as_deref()
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .or(cookie.filter(|c| !c.is_empty()))
}

fn with_authentication(
    access_guard: Arc<AccessGuard>,
) -> impl Filter<Extract = (UserRecord,), Error = warp::Rejection> + Clone {
    warp::header::optional::<String>("authorization")
        .and(warp::cookie::optional::<String>(ACCESS_TOKEN_COOKIE))
        .and_then(move |header: Option<String>, cookie: Option<String>| {
            let access_guard = access_guard.clone();
            async move {
                let token = presented_token(header, cookie)
                    .ok_or_else(|| reject::custom(ApiError::from(AuthError::Unauthenticated)))?;
                let user = access_guard
                    .authenticate(&token)
                    .await
                    .map_err(ApiError::from)
                    .map_err(reject::custom)?;
                Ok::<UserRecord, warp::Rejection>(user)
            }
        })
}

fn with_roles(
    access_guard: Arc<AccessGuard>,
    allowed: &'static [Role],
) -> impl Filter<Extract = (UserRecord,), Error = warp::Rejection> + Clone {
    with_authentication(access_guard).and_then(move |user: UserRecord| async move {
        authorize(&user, allowed)
            .map_err(ApiError::from)
            .map_err(reject::custom)?;
        Ok::<UserRecord, warp::Rejection>(user)
    })
}
