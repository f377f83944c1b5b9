//! Tag service
//!
//! Tags are created on first use and shared by every article that names
//! them. Two names with the same slug are the same tag.

use crate::db::repositories::{is_unique_violation, TagRepository};
use crate::models::Tag;
use crate::services::error::{ServiceError, ServiceResult};
use anyhow::Context;
use std::sync::Arc;

pub struct TagService {
    repo: Arc<dyn TagRepository>,
}

impl TagService {
    pub fn new(repo: Arc<dyn TagRepository>) -> Self {
        Self { repo }
    }

    /// All tag names, alphabetical
    pub async fn list(&self) -> ServiceResult<Vec<String>> {
        let tags = self.repo.list().await.context("Failed to list tags")?;
        Ok(tags.into_iter().map(|t| t.name).collect())
    }

    /// Reuse the tag whose slug matches `name`, or create it.
    ///
    /// # Errors
    ///
    /// - `Validation` if the name has nothing to build a slug from
    pub async fn get_or_create(&self, name: &str) -> ServiceResult<Tag> {
        let name = name.trim();
        let slug = checked_tag_slug(name)?;

        if let Some(existing) = self.find(&slug).await? {
            return Ok(existing);
        }

        match self.repo.create(&Tag::new(name.to_string(), slug.clone())).await {
            Ok(tag) => {
                tracing::debug!("Created tag {}", tag.slug);
                Ok(tag)
            }
            // Lost a race with a concurrent insert of the same slug
            Err(e) if is_unique_violation(&e) => self
                .find(&slug)
                .await?
                .ok_or_else(|| ServiceError::Internal(e)),
            Err(e) => Err(ServiceError::Internal(e.context("Failed to create tag"))),
        }
    }

    /// Get-or-create each name and link it to the article. Duplicate names
    /// are linked once.
    pub async fn attach(&self, article_id: i64, names: &[String]) -> ServiceResult<()> {
        for name in names {
            let tag = self.get_or_create(name).await?;
            self.repo
                .add_to_article(article_id, tag.id)
                .await
                .context("Failed to link tag")?;
        }
        Ok(())
    }

    /// Tag names of one article, alphabetical
    pub async fn for_article(&self, article_id: i64) -> ServiceResult<Vec<String>> {
        let tags = self
            .repo
            .get_by_article_id(article_id)
            .await
            .context("Failed to get article tags")?;
        Ok(tags.into_iter().map(|t| t.name).collect())
    }

    async fn find(&self, slug: &str) -> ServiceResult<Option<Tag>> {
        Ok(self
            .repo
            .get_by_slug(slug)
            .await
            .context("Failed to get tag")?)
    }
}

/// URL-friendly slug for a tag name
pub fn generate_tag_slug(name: &str) -> String {
    slug::slugify(name.trim())
}

/// Reject any name that has nothing to build a slug from
pub fn validate_tag_names(names: &[String]) -> ServiceResult<()> {
    names.iter().try_for_each(|name| checked_tag_slug(name).map(|_| ()))
}

fn checked_tag_slug(name: &str) -> ServiceResult<String> {
    let slug = generate_tag_slug(name);
    if slug.is_empty() {
        return Err(ServiceError::validation(format!(
            "Invalid tag name '{}'",
            name.trim()
        )));
    }
    Ok(slug)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::SqlxTagRepository;
    use crate::db::{create_test_pool, migrations};

    async fn setup_test_service() -> TagService {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        TagService::new(SqlxTagRepository::boxed(pool))
    }

    #[test]
    fn test_generate_tag_slug() {
        assert_eq!(generate_tag_slug("Rust Lang"), "rust-lang");
        assert_eq!(generate_tag_slug("  dragons "), "dragons");
        assert_eq!(generate_tag_slug("!!!"), "");
    }

    #[test]
    fn test_validate_tag_names() {
        assert!(validate_tag_names(&[]).is_ok());
        assert!(validate_tag_names(&["rust".into(), "Dragons ".into()]).is_ok());

        let err = validate_tag_names(&["rust".into(), "!!!".into()]).unwrap_err();
        assert!(matches!(err, ServiceError::Validation(ref msg) if msg.contains("!!!")));
    }

    #[tokio::test]
    async fn test_get_or_create_reuses_by_slug() {
        let service = setup_test_service().await;

        let first = service.get_or_create("Dragons").await.unwrap();
        let second = service.get_or_create("dragons").await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.name, "Dragons");
        assert_eq!(service.list().await.unwrap(), vec!["Dragons"]);
    }

    #[tokio::test]
    async fn test_get_or_create_rejects_unsluggable_name() {
        let service = setup_test_service().await;

        let result = service.get_or_create("   ").await;
        assert!(matches!(result, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn test_list_is_alphabetical() {
        let service = setup_test_service().await;
        for name in ["training", "dragons", "angular"] {
            service.get_or_create(name).await.unwrap();
        }

        assert_eq!(
            service.list().await.unwrap(),
            vec!["angular", "dragons", "training"]
        );
    }
}
