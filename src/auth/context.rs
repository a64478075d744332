use super::Claims;

/// Verified identity extracted from a bearer token
///
/// Attached to the request by the `RequireAuth` extractor after successful
/// verification.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// Identity-provider user id (JWT sub claim)
    pub uid: String,

    /// User email if present in the token
    pub email: Option<String>,

    /// Whether the provider has verified the email address
    pub email_verified: bool,

    /// Display name if present in the token
    pub name: String,

    /// Profile photo URL if present in the token
    pub picture: String,
}

impl From<&Claims> for AuthContext {
    fn from(claims: &Claims) -> Self {
        Self {
            uid: claims.sub.clone(),
            email: claims.email.clone(),
            email_verified: claims.email_verified,
            name: claims.name.clone().unwrap_or_default(),
            picture: claims.picture.clone().unwrap_or_default(),
        }
    }
}
