mod access_guard;
mod auth_service_impl;
mod password_hasher;
mod token_codec;
mod user_service_impl;

pub use access_guard::*;
pub use auth_service_impl::*;
pub use password_hasher::*;
pub use token_codec::*;
pub use user_service_impl::*;
