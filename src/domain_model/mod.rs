mod session;
mod unit;
mod user;

pub use session::*;
pub use unit::*;
pub use user::*;
