//! Authentication and authorization: password hashing, token codec,
//! session resolution and role guards.

pub mod password;
pub mod session;
pub mod token;

pub use password::PasswordHasher;
pub use session::{require_admin, require_authenticated, Identity, SessionResolver};
pub use token::{Claims, TokenCodec};
