use serde::{Deserialize, Serialize};

/// Claims carried by an identity-provider ID token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (the provider-assigned user id)
    pub sub: String,

    /// Audience (the project id)
    pub aud: String,

    /// Issuer
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,

    /// Time of the original sign-in - optional
    #[serde(default)]
    pub auth_time: Option<i64>,

    /// User email - optional
    #[serde(default)]
    pub email: Option<String>,

    /// Whether the email address has been verified
    #[serde(default)]
    pub email_verified: bool,

    /// Display name - optional
    #[serde(default)]
    pub name: Option<String>,

    /// Profile photo URL - optional
    #[serde(default)]
    pub picture: Option<String>,
}
