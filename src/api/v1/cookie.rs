use crate::api::v1::error::ApiError;
use crate::domain_model::{AccessToken, SessionId};
use std::time::Duration;
use warp::http::HeaderValue;
use warp::http::header::SET_COOKIE;
use warp::reply::Response;
use warp::Reply;

pub const ACCESS_TOKEN_COOKIE: &str = "access_token";
pub const SESSION_ID_COOKIE: &str = "session_id";

/// Attributes of the cookies handed out on sign-in and refresh.
#[derive(Debug, Clone)]
pub struct CookiePolicy {
    pub access_max_age: Duration,
    /// Matches the session store TTL.
    pub session_max_age: Duration,
    pub secure: bool,
}

impl CookiePolicy {
    pub fn access_cookie(&self, token: &AccessToken) -> String {
        self.cookie(ACCESS_TOKEN_COOKIE, &token.0, self.access_max_age.as_secs())
    }

    pub fn session_cookie(&self, session_id: &SessionId) -> String {
        self.cookie(
            SESSION_ID_COOKIE,
            session_id.as_str(),
            self.session_max_age.as_secs(),
        )
    }

    /// Replacement that makes the browser drop `name` right away.
    pub fn expired(&self, name: &str) -> String {
        let mut cookie = self.cookie(name, "", 0);
        cookie.push_str("; Expires=Thu, 01 Jan 1970 00:00:00 GMT");
        cookie
    }

    fn cookie(&self, name: &str, value: &str, max_age: u64) -> String {
        let mut cookie = format!("{name}={value}; Path=/; Max-Age={max_age}; HttpOnly; SameSite=Lax");
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }
}

/// Append one `Set-Cookie` header per cookie.
pub fn with_cookies(reply: impl Reply, cookies: Vec<String>) -> Result<Response, ApiError> {
    let mut response = reply.into_response();
    for cookie in cookies {
        let value = HeaderValue::from_str(&cookie).map_err(ApiError::internal)?;
        response.headers_mut().append(SET_COOKIE, value);
    }
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(secure: bool) -> CookiePolicy {
        CookiePolicy {
            access_max_age: Duration::from_secs(15 * 60),
            session_max_age: Duration::from_secs(24 * 60 * 60),
            secure,
        }
    }

    #[test]
    fn session_cookie_lives_as_long_as_the_refresh_token() {
        let cookie = policy(false).session_cookie(&SessionId("abc".to_string()));
        assert_eq!(
            cookie,
            "session_id=abc; Path=/; Max-Age=86400; HttpOnly; SameSite=Lax"
        );
    }

    #[test]
    fn access_cookie_is_secure_when_asked() {
        let cookie = policy(true).access_cookie(&AccessToken("t".to_string()));
        assert!(cookie.starts_with("access_token=t; Path=/; Max-Age=900; HttpOnly"));
        assert!(cookie.ends_with("; Secure"));
    }

    #[test]
    fn expired_cookie_clears_value() {
        let cookie = policy(false).expired(SESSION_ID_COOKIE);
        assert!(cookie.starts_with("session_id=; Path=/; Max-Age=0;"));
        assert!(cookie.contains("Expires=Thu, 01 Jan 1970"));
    }

    #[test]
    fn appends_every_cookie() {
        let response = with_cookies(
            warp::reply(),
            vec!["a=1".to_string(), "b=2".to_string()],
        )
        .unwrap();
        let values: Vec<_> = response.headers().get_all(SET_COOKIE).iter().collect();
        assert_eq!(values.len(), 2);
    }
}
