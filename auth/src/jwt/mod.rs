pub mod claims;
pub mod errors;
pub mod handler;

pub use claims::SessionClaims;
pub use claims::SESSION_LIFETIME_HOURS;
pub use errors::JwtError;
pub use handler::JwtHandler;
