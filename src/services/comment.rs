//! Comment service

use std::sync::Arc;

use anyhow::Context;

use crate::db::repositories::{ArticleRepository, CommentRepository, ProfileRepository};
use crate::models::{Comment, CommentView};
use crate::services::article::{author_view, find_article};
use crate::services::error::{ServiceError, ServiceResult};
use crate::services::permission::{authorize, Action, Principal, Resource};

pub const COMMENT_NOT_FOUND: &str = "A comment with this ID does not exist.";

/// Comment service
pub struct CommentService {
    comments: Arc<dyn CommentRepository>,
    articles: Arc<dyn ArticleRepository>,
    profiles: Arc<dyn ProfileRepository>,
}

impl CommentService {
    pub fn new(
        comments: Arc<dyn CommentRepository>,
        articles: Arc<dyn ArticleRepository>,
        profiles: Arc<dyn ProfileRepository>,
    ) -> Self {
        Self {
            comments,
            articles,
            profiles,
        }
    }

    /// Comments on an article, oldest first
    pub async fn list(&self, slug: &str, viewer: Option<&Principal>) -> ServiceResult<Vec<CommentView>> {
        let article = find_article(self.articles.as_ref(), slug).await?;
        let comments = self
            .comments
            .list_by_article(article.id)
            .await
            .context("Failed to list comments")?;

        let mut views = Vec::with_capacity(comments.len());
        for comment in comments {
            views.push(self.view(comment, viewer).await?);
        }
        Ok(views)
    }

    /// Comment on an article as the principal
    pub async fn create(&self, principal: &Principal, slug: &str, body: &str) -> ServiceResult<CommentView> {
        if body.trim().is_empty() {
            return Err(ServiceError::validation("Comment body cannot be empty"));
        }
        let article = find_article(self.articles.as_ref(), slug).await?;

        let comment = self
            .comments
            .create(article.id, principal.profile_id, body)
            .await
            .context("Failed to create comment")?;
        tracing::debug!("{} commented on {}", principal.username, article.slug);

        self.view(comment, Some(principal)).await
    }

    /// Delete one of the principal's comments.
    ///
    /// A comment that belongs to a different article counts as missing.
    pub async fn delete(&self, principal: &Principal, slug: &str, id: i64) -> ServiceResult<()> {
        let article = find_article(self.articles.as_ref(), slug).await?;
        let comment = self
            .comments
            .get_by_id(id)
            .await
            .context("Failed to get comment")?
            .filter(|c| c.article_id == article.id)
            .ok_or_else(|| ServiceError::not_found(COMMENT_NOT_FOUND))?;

        authorize(Some(principal), Action::Delete, Resource::Comment(&comment))?;

        self.comments
            .delete(comment.id)
            .await
            .context("Failed to delete comment")?;
        Ok(())
    }

    async fn view(&self, comment: Comment, viewer: Option<&Principal>) -> ServiceResult<CommentView> {
        let author = author_view(self.profiles.as_ref(), comment.author_id, viewer).await?;
        Ok(CommentView { comment, author })
    }
}
