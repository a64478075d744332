//! User profiles
//!
//! Identity lives with the external provider; a user document links the
//! provider uid to profile data kept here. Email and uid are unique.

use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    Customer,
    Provider,
    Both,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

fn default_true() -> bool {
    true
}

fn default_language() -> String {
    "en".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationPreferences {
    #[serde(default = "default_true")]
    pub email: bool,
    #[serde(default)]
    pub sms: bool,
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            email: true,
            sms: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default)]
    pub notifications: NotificationPreferences,
    #[serde(default = "default_language")]
    pub language: String,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            notifications: NotificationPreferences::default(),
            language: default_language(),
        }
    }
}

/// User document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    /// Identity-provider uid
    pub external_uid: String,
    pub email: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub preferences: Preferences,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

/// Request body for first registration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub external_uid: String,
    pub email: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub role: Option<UserRole>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<Address>,
}

impl CreateUserRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.external_uid.trim().is_empty() {
            return Err("External uid is required".to_string());
        }
        if !self.email.contains('@') {
            return Err("A valid email is required".to_string());
        }
        Ok(())
    }

    pub fn into_user(self, now: DateTime<Utc>) -> User {
        User {
            id: None,
            external_uid: self.external_uid,
            email: self.email.trim().to_lowercase(),
            display_name: self.display_name.unwrap_or_default(),
            photo_url: self.photo_url,
            role: self.role.unwrap_or_default(),
            phone: self.phone,
            address: self.address,
            is_verified: false,
            is_active: true,
            preferences: Preferences::default(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Request body for profile updates; all fields optional
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub role: Option<UserRole>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<Address>,
    #[serde(default)]
    pub is_verified: Option<bool>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub preferences: Option<Preferences>,
}

/// User as returned over the wire
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub external_uid: String,
    pub email: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    pub role: UserRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    pub is_verified: bool,
    pub is_active: bool,
    pub preferences: Preferences,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id.unwrap_or_default().to_hex(),
            external_uid: u.external_uid,
            email: u.email,
            display_name: u.display_name,
            photo_url: u.photo_url,
            role: u.role,
            phone: u.phone,
            address: u.address,
            is_verified: u.is_verified,
            is_active: u.is_active,
            preferences: u.preferences,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_is_normalized_on_registration() {
        let req = CreateUserRequest {
            external_uid: "uid-1".to_string(),
            email: "  Ada@Example.COM ".to_string(),
            display_name: Some("Ada".to_string()),
            photo_url: None,
            role: None,
            phone: None,
            address: None,
        };
        let user = req.into_user(Utc::now());
        assert_eq!(user.email, "ada@example.com");
        assert_eq!(user.role, UserRole::Customer);
        assert!(user.is_active);
        assert!(!user.is_verified);
        assert!(user.preferences.notifications.email);
        assert!(!user.preferences.notifications.sms);
        assert_eq!(user.preferences.language, "en");
    }

    #[test]
    fn registration_requires_uid_and_plausible_email() {
        let req = CreateUserRequest {
            external_uid: " ".to_string(),
            email: "a@b.c".to_string(),
            display_name: None,
            photo_url: None,
            role: None,
            phone: None,
            address: None,
        };
        assert!(req.validate().is_err());

        let req = CreateUserRequest {
            external_uid: "uid".to_string(),
            email: "not-an-email".to_string(),
            display_name: None,
            photo_url: None,
            role: None,
            phone: None,
            address: None,
        };
        assert!(req.validate().is_err());
    }
}
