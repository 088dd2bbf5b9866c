mod cookie;
mod error;
mod handler;
mod router;

pub use cookie::{ACCESS_TOKEN_COOKIE, CookiePolicy, SESSION_ID_COOKIE};
pub use error::{ApiError, ApiErrorCode, recover_error};
pub use router::routes;
