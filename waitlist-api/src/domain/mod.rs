mod email;
mod user;

pub use email::*;
pub use user::*;
