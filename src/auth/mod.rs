// Authentication helpers

pub mod jwt;

pub use jwt::{authenticate, bearer_token, create_token, verify_token, AuthError, Claims};
