//! Profile service
//!
//! Public profiles and the follow relation between them.

use crate::db::repositories::ProfileRepository;
use crate::models::{Profile, ProfileView};
use crate::services::error::{ServiceError, ServiceResult};
use crate::services::permission::Principal;
use anyhow::Context;
use std::sync::Arc;

const PROFILE_NOT_FOUND: &str = "A profile with this username does not exist.";

pub struct ProfileService {
    repo: Arc<dyn ProfileRepository>,
}

impl ProfileService {
    pub fn new(repo: Arc<dyn ProfileRepository>) -> Self {
        Self { repo }
    }

    /// Look up a profile by username, as seen by `viewer`
    pub async fn get(&self, username: &str, viewer: Option<&Principal>) -> ServiceResult<ProfileView> {
        let profile = self.find_by_username(username).await?;
        self.view(&profile, viewer).await
    }

    /// Follow a profile. Following twice is a no-op.
    pub async fn follow(&self, principal: &Principal, username: &str) -> ServiceResult<ProfileView> {
        let target = self.find_by_username(username).await?;
        if target.id == principal.profile_id {
            return Err(ServiceError::validation("You cannot follow yourself."));
        }

        self.repo
            .follow(principal.profile_id, target.id)
            .await
            .context("Failed to follow profile")?;
        tracing::debug!("{} follows {}", principal.username, target.username);

        Ok(target.view(true))
    }

    /// Stop following a profile. Unfollowing a profile that is not followed
    /// is a no-op.
    pub async fn unfollow(&self, principal: &Principal, username: &str) -> ServiceResult<ProfileView> {
        let target = self.find_by_username(username).await?;

        self.repo
            .unfollow(principal.profile_id, target.id)
            .await
            .context("Failed to unfollow profile")?;

        Ok(target.view(false))
    }

    /// Render a profile for a viewer; anonymous viewers follow nobody
    pub async fn view(&self, profile: &Profile, viewer: Option<&Principal>) -> ServiceResult<ProfileView> {
        let following = match viewer {
            Some(viewer) => self
                .repo
                .is_following(viewer.profile_id, profile.id)
                .await
                .context("Failed to check follow")?,
            None => false,
        };
        Ok(profile.view(following))
    }

    async fn find_by_username(&self, username: &str) -> ServiceResult<Profile> {
        self.repo
            .get_by_username(username)
            .await
            .context("Failed to get profile")?
            .ok_or_else(|| ServiceError::not_found(PROFILE_NOT_FOUND))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxProfileRepository, SqlxUserRepository, UserRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::models::User;

    struct Fixture {
        service: ProfileService,
        jake: Principal,
        anna: Principal,
    }

    async fn principal(users: &SqlxUserRepository, name: &str) -> Principal {
        let account = users
            .create_with_profile(&User::new(
                format!("{}@conduit.io", name),
                name.to_string(),
                "hash".to_string(),
            ))
            .await
            .expect("Failed to create account");
        Principal {
            user_id: account.user.id,
            profile_id: account.profile.id,
            username: account.user.username,
        }
    }

    async fn setup_test_service() -> Fixture {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let users = SqlxUserRepository::new(pool.clone());
        let jake = principal(&users, "jake").await;
        let anna = principal(&users, "anna").await;

        Fixture {
            service: ProfileService::new(SqlxProfileRepository::boxed(pool)),
            jake,
            anna,
        }
    }

    #[tokio::test]
    async fn test_get_profile_anonymous() {
        let fx = setup_test_service().await;

        let view = fx.service.get("anna", None).await.unwrap();

        assert_eq!(view.username, "anna");
        assert_eq!(view.bio, "");
        assert!(view.image.is_none());
        assert!(!view.following);
    }

    #[tokio::test]
    async fn test_get_missing_profile() {
        let fx = setup_test_service().await;

        let result = fx.service.get("nobody", Some(&fx.jake)).await;
        assert!(matches!(result, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_follow_and_unfollow() {
        let fx = setup_test_service().await;

        let view = fx.service.follow(&fx.jake, "anna").await.unwrap();
        assert!(view.following);
        assert!(fx.service.get("anna", Some(&fx.jake)).await.unwrap().following);
        // Directed: anna does not follow jake
        assert!(!fx.service.get("jake", Some(&fx.anna)).await.unwrap().following);

        let view = fx.service.unfollow(&fx.jake, "anna").await.unwrap();
        assert!(!view.following);
        assert!(!fx.service.get("anna", Some(&fx.jake)).await.unwrap().following);
    }

    #[tokio::test]
    async fn test_follow_self_rejected() {
        let fx = setup_test_service().await;

        let result = fx.service.follow(&fx.jake, "jake").await;
        assert!(matches!(result, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn test_follow_missing_profile() {
        let fx = setup_test_service().await;

        let result = fx.service.follow(&fx.jake, "nobody").await;
        assert!(matches!(result, Err(ServiceError::NotFound(_))));
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use crate::db::repositories::{SqlxProfileRepository, SqlxUserRepository, UserRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::models::User;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(20))]

        /// Any sequence of follow/unfollow calls leaves the relation equal
        /// to the last call, however many times each was repeated.
        #[test]
        fn follow_state_matches_last_operation(ops in proptest::collection::vec(any::<bool>(), 1..12)) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let result: Result<(), TestCaseError> = rt.block_on(async {
                let pool = create_test_pool().await.unwrap();
                migrations::run_migrations(&pool).await.unwrap();
                let users = SqlxUserRepository::new(pool.clone());
                let mut principals = Vec::new();
                for name in ["jake", "anna"] {
                    let account = users
                        .create_with_profile(&User::new(
                            format!("{}@conduit.io", name),
                            name.to_string(),
                            "hash".to_string(),
                        ))
                        .await
                        .unwrap();
                    principals.push(Principal {
                        user_id: account.user.id,
                        profile_id: account.profile.id,
                        username: account.user.username,
                    });
                }
                let service = ProfileService::new(SqlxProfileRepository::boxed(pool));

                for follow in &ops {
                    if *follow {
                        service.follow(&principals[0], "anna").await.unwrap();
                    } else {
                        service.unfollow(&principals[0], "anna").await.unwrap();
                    }
                }

                let view = service.get("anna", Some(&principals[0])).await.unwrap();
                prop_assert_eq!(view.following, *ops.last().unwrap());
                Ok(())
            });
            result?;
        }
    }
}
