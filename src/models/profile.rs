//! Profile model
//!
//! The public face of an account: bio, avatar and the follow / favorite
//! relations. Articles and comments are authored by profiles, not users.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Profile entity. `username` is joined in from the owning user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Profile {
    pub id: i64,
    pub user_id: i64,
    pub username: String,
    pub bio: String,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// Render this profile as seen by a viewer who does or does not follow it
    pub fn view(&self, following: bool) -> ProfileView {
        ProfileView {
            username: self.username.clone(),
            bio: self.bio.clone(),
            image: self.image.clone(),
            following,
        }
    }
}

/// Profile as presented to a particular viewer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProfileView {
    pub username: String,
    pub bio: String,
    pub image: Option<String>,
    pub following: bool,
}
