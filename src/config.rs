use anyhow::{Context, Result};
use std::env;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Dev,
    Staging,
    Prod,
}

impl Environment {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "prod" | "production" => Self::Prod,
            "staging" => Self::Staging,
            _ => Self::Dev,
        }
    }

    pub fn is_dev(&self) -> bool {
        matches!(self, Self::Dev)
    }

    #[allow(dead_code)]
    pub fn is_prod(&self) -> bool {
        matches!(self, Self::Prod)
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub env: Environment,
    pub server_addr: String,

    // Database
    pub mongodb_uri: String,
    pub mongodb_database: String,

    // CORS
    pub cors_allow_origins: Vec<String>,

    // Identity provider (Firebase-style secure-token verification)
    pub auth_jwks_url: String,
    pub auth_issuer: String,
    pub auth_audience: String,
    pub auth_keys_cache_ttl_seconds: u64,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        let env = Environment::from_str(&env::var("ENV").unwrap_or_else(|_| "dev".to_string()));
        let server_addr = env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:5000".to_string());

        // Database
        let mongodb_uri = env::var("MONGODB_URI").context("MONGODB_URI must be set")?;
        let mongodb_database =
            env::var("MONGODB_DATABASE").unwrap_or_else(|_| "homehero".to_string());

        // CORS
        let cors_allow_origins = env::var("CORS_ALLOW_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        // Identity provider. The audience of a Firebase ID token is the
        // project id and the issuer is the secure-token URL for that project.
        let auth_project_id =
            env::var("AUTH_PROJECT_ID").context("AUTH_PROJECT_ID must be set")?;
        let auth_jwks_url = env::var("AUTH_JWKS_URL").unwrap_or_else(|_| {
            "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com"
                .to_string()
        });
        let auth_issuer = env::var("AUTH_ISSUER")
            .unwrap_or_else(|_| format!("https://securetoken.google.com/{auth_project_id}"));
        let auth_audience = env::var("AUTH_AUDIENCE").unwrap_or(auth_project_id);
        let auth_keys_cache_ttl_seconds = env::var("AUTH_KEYS_CACHE_TTL_SECONDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(1800); // 30 minutes default

        Ok(Settings {
            env,
            server_addr,
            mongodb_uri,
            mongodb_database,
            cors_allow_origins,
            auth_jwks_url,
            auth_issuer,
            auth_audience,
            auth_keys_cache_ttl_seconds,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_parsing() {
        assert_eq!(Environment::from_str("production"), Environment::Prod);
        assert_eq!(Environment::from_str("PROD"), Environment::Prod);
        assert_eq!(Environment::from_str("staging"), Environment::Staging);
        assert_eq!(Environment::from_str("anything-else"), Environment::Dev);
    }
}
