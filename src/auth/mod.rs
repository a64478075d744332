pub mod claims;
pub mod context;
pub mod keys;
pub mod middleware;

pub use claims::Claims;
pub use context::AuthContext;
pub use keys::{KeyCache, VerifyError};
pub use middleware::RequireAuth;
