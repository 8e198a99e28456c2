use db::models::user::Role;
use serde::{Deserialize, Serialize};

/// JWT payload carried by every authenticated request.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// User ID.
    pub sub: i64,
    /// Expiry as a unix timestamp.
    pub exp: usize,
    /// System-wide role, checked by the route guards.
    pub role: Role,
}

#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);
