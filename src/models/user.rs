//! User model
//!
//! Accounts hold credentials and the flags that gate authentication. Every
//! user owns exactly one [`Profile`](super::Profile); the pair is exposed as
//! an [`Account`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Profile;

/// A registered account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: i64,
    /// Email address (unique)
    pub email: String,
    /// Username (unique)
    pub username: String,
    /// Password hash (argon2)
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Inactive accounts cannot authenticate
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new active, unprivileged user.
    ///
    /// The password must already be hashed with `services::password::hash_password()`.
    pub fn new(email: String, username: String, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: 0, // Will be set by the database
            email,
            username,
            password_hash,
            is_active: true,
            is_staff: false,
            is_superuser: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Grant staff and superuser flags
    pub fn into_superuser(mut self) -> Self {
        self.is_staff = true;
        self.is_superuser = true;
        self
    }
}

/// A user together with the profile it owns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub user: User,
    pub profile: Profile,
}

/// Fields a user may change on their own account. `None` leaves a field as is.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateAccountInput {
    pub email: Option<String>,
    pub username: Option<String>,
    /// Plaintext password (will be hashed)
    pub password: Option<String>,
    pub bio: Option<String>,
    /// An empty string clears the image
    pub image: Option<String>,
}

impl UpdateAccountInput {
    pub fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.username.is_none()
            && self.password.is_none()
            && self.bio.is_none()
            && self.image.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_user_is_active_and_unprivileged() {
        let user = User::new(
            "jake@jake.jake".to_string(),
            "jake".to_string(),
            "$argon2id$hash".to_string(),
        );

        assert_eq!(user.id, 0);
        assert!(user.is_active);
        assert!(!user.is_staff);
        assert!(!user.is_superuser);
    }

    #[test]
    fn test_into_superuser_sets_both_flags() {
        let user = User::new("root@x.io".into(), "root".into(), "h".into()).into_superuser();
        assert!(user.is_staff);
        assert!(user.is_superuser);
        assert!(user.is_active);
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let user = User::new("a@b.c".into(), "a".into(), "secret-hash".into());
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("secret-hash"));
        assert!(!json.contains("password_hash"));
    }

    #[test]
    fn test_update_input_is_empty() {
        assert!(UpdateAccountInput::default().is_empty());
        let input = UpdateAccountInput {
            bio: Some(String::new()),
            ..Default::default()
        };
        assert!(!input.is_empty());
    }
}
