//! Article service
//!
//! Implements business logic for articles:
//! - Creation with a unique, immutable slug and get-or-create tags
//! - Viewer-specific projections (following, favorited, favorites count)
//! - Filtered listing and the personal feed
//! - Author-only editing and deletion
//! - Favorites

use crate::db::repositories::{is_unique_violation, ArticleRepository, ProfileRepository};
use crate::models::{
    Article, ArticleFilter, ArticleView, CreateArticleInput, ListParams, NewArticle, PagedResult,
    ProfileView, UpdateArticleInput, MAX_SLUG_LENGTH,
};
use crate::services::error::{ServiceError, ServiceResult};
use crate::services::permission::{authorize, Action, Principal, Resource};
use crate::services::tag::{validate_tag_names, TagService};
use anyhow::Context;
use rand::Rng;
use std::sync::Arc;

/// Length of the random slug suffix
const SLUG_SUFFIX_LENGTH: usize = 6;
const SLUG_SUFFIX_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// How many fresh slugs to try before giving up
const MAX_SLUG_ATTEMPTS: usize = 5;

pub const ARTICLE_NOT_FOUND: &str = "An article with this slug does not exist.";

/// Article service for managing articles and favorites
pub struct ArticleService {
    articles: Arc<dyn ArticleRepository>,
    profiles: Arc<dyn ProfileRepository>,
    tags: Arc<TagService>,
}

impl ArticleService {
    pub fn new(
        articles: Arc<dyn ArticleRepository>,
        profiles: Arc<dyn ProfileRepository>,
        tags: Arc<TagService>,
    ) -> Self {
        Self {
            articles,
            profiles,
            tags,
        }
    }

    /// Publish a new article authored by the principal.
    ///
    /// # Errors
    ///
    /// - `Validation` if title, description or body is blank, or a tag name
    ///   has nothing to build a slug from
    /// - `Conflict` if no unique slug could be generated
    ///
    /// Nothing is kept when tagging fails after the insert.
    pub async fn create(
        &self,
        principal: &Principal,
        input: CreateArticleInput,
    ) -> ServiceResult<ArticleView> {
        validate_required("title", &input.title)?;
        validate_required("description", &input.description)?;
        validate_required("body", &input.body)?;
        validate_title_length(&input.title)?;
        validate_tag_names(&input.tag_list)?;

        let mut created = None;
        for attempt in 1..=MAX_SLUG_ATTEMPTS {
            let slug = generate_slug(&input.title);
            if self
                .articles
                .exists_by_slug(&slug)
                .await
                .context("Failed to check slug")?
            {
                tracing::debug!("Slug {} taken (attempt {})", slug, attempt);
                continue;
            }

            let new_article = NewArticle {
                slug,
                title: input.title.clone(),
                description: input.description.clone(),
                body: input.body.clone(),
                author_id: principal.profile_id,
            };
            match self.articles.create(&new_article).await {
                Ok(article) => {
                    created = Some(article);
                    break;
                }
                Err(e) if is_unique_violation(&e) => {
                    tracing::debug!("Slug {} raced (attempt {})", new_article.slug, attempt);
                }
                Err(e) => return Err(ServiceError::Internal(e.context("Failed to create article"))),
            }
        }

        let article = created.ok_or_else(|| {
            ServiceError::conflict("Could not generate a unique slug for this title.")
        })?;

        if let Err(e) = self.tags.attach(article.id, &input.tag_list).await {
            self.articles
                .delete(article.id)
                .await
                .context("Failed to discard untagged article")?;
            return Err(e);
        }
        tracing::info!("{} published {}", principal.username, article.slug);

        self.view(article, Some(principal)).await
    }

    /// Look up an article by slug
    pub async fn find_by_slug(&self, slug: &str) -> ServiceResult<Article> {
        find_article(self.articles.as_ref(), slug).await
    }

    /// One article as seen by `viewer`
    pub async fn get(&self, slug: &str, viewer: Option<&Principal>) -> ServiceResult<ArticleView> {
        let article = self.find_by_slug(slug).await?;
        authorize(viewer, Action::Read, Resource::Article(&article))?;
        self.view(article, viewer).await
    }

    /// Filtered listing, newest first. Filters combine with AND.
    pub async fn list(
        &self,
        filter: &ArticleFilter,
        params: &ListParams,
        viewer: Option<&Principal>,
    ) -> ServiceResult<PagedResult<ArticleView>> {
        let (articles, total) = self
            .articles
            .list(filter, params)
            .await
            .context("Failed to list articles")?;
        self.views(articles, total, viewer).await
    }

    /// Articles by authors the principal follows, newest first
    pub async fn feed(
        &self,
        principal: &Principal,
        params: &ListParams,
    ) -> ServiceResult<PagedResult<ArticleView>> {
        let (articles, total) = self
            .articles
            .feed(principal.profile_id, params)
            .await
            .context("Failed to load feed")?;
        self.views(articles, total, Some(principal)).await
    }

    /// Edit title, description or body. The slug never changes.
    pub async fn update(
        &self,
        principal: &Principal,
        slug: &str,
        input: UpdateArticleInput,
    ) -> ServiceResult<ArticleView> {
        let article = self.find_by_slug(slug).await?;
        authorize(Some(principal), Action::Update, Resource::Article(&article))?;

        if let Some(title) = &input.title {
            validate_required("title", title)?;
            validate_title_length(title)?;
        }
        if let Some(description) = &input.description {
            validate_required("description", description)?;
        }
        if let Some(body) = &input.body {
            validate_required("body", body)?;
        }

        let updated = self
            .articles
            .update(article.id, &input)
            .await
            .context("Failed to update article")?;

        self.view(updated, Some(principal)).await
    }

    /// Delete an article with its comments, favorites and tag links
    pub async fn delete(&self, principal: &Principal, slug: &str) -> ServiceResult<()> {
        let article = self.find_by_slug(slug).await?;
        authorize(Some(principal), Action::Delete, Resource::Article(&article))?;

        self.articles
            .delete(article.id)
            .await
            .context("Failed to delete article")?;
        tracing::info!("{} deleted {}", principal.username, article.slug);
        Ok(())
    }

    /// Favorite an article. Favoriting twice is a no-op.
    pub async fn favorite(&self, principal: &Principal, slug: &str) -> ServiceResult<ArticleView> {
        let article = self.find_by_slug(slug).await?;
        self.profiles
            .favorite(principal.profile_id, article.id)
            .await
            .context("Failed to favorite article")?;
        self.view(article, Some(principal)).await
    }

    /// Remove a favorite. Removing a missing favorite is a no-op.
    pub async fn unfavorite(&self, principal: &Principal, slug: &str) -> ServiceResult<ArticleView> {
        let article = self.find_by_slug(slug).await?;
        self.profiles
            .unfavorite(principal.profile_id, article.id)
            .await
            .context("Failed to unfavorite article")?;
        self.view(article, Some(principal)).await
    }

    async fn views(
        &self,
        articles: Vec<Article>,
        total: i64,
        viewer: Option<&Principal>,
    ) -> ServiceResult<PagedResult<ArticleView>> {
        let mut items = Vec::with_capacity(articles.len());
        for article in articles {
            items.push(self.view(article, viewer).await?);
        }
        Ok(PagedResult::new(items, total))
    }

    async fn view(&self, article: Article, viewer: Option<&Principal>) -> ServiceResult<ArticleView> {
        let author = author_view(self.profiles.as_ref(), article.author_id, viewer).await?;
        let tag_list = self.tags.for_article(article.id).await?;

        let favorited = match viewer {
            Some(viewer) => self
                .profiles
                .has_favorited(viewer.profile_id, article.id)
                .await
                .context("Failed to check favorite")?,
            None => false,
        };
        let favorites_count = self
            .articles
            .favorites_count(article.id)
            .await
            .context("Failed to count favorites")?;

        Ok(ArticleView {
            article,
            author,
            tag_list,
            favorited,
            favorites_count,
        })
    }
}

/// Article by slug, or `NotFound`
pub(crate) async fn find_article(repo: &dyn ArticleRepository, slug: &str) -> ServiceResult<Article> {
    repo.get_by_slug(slug)
        .await
        .context("Failed to get article")?
        .ok_or_else(|| ServiceError::not_found(ARTICLE_NOT_FOUND))
}

/// Author profile of an article or comment, as seen by `viewer`
pub(crate) async fn author_view(
    profiles: &dyn ProfileRepository,
    author_id: i64,
    viewer: Option<&Principal>,
) -> ServiceResult<ProfileView> {
    let author = profiles
        .get_by_id(author_id)
        .await
        .context("Failed to get author")?
        .ok_or_else(|| anyhow::anyhow!("Author profile {} is missing", author_id))?;

    let following = match viewer {
        Some(viewer) => profiles
            .is_following(viewer.profile_id, author.id)
            .await
            .context("Failed to check follow")?,
        None => false,
    };
    Ok(author.view(following))
}

fn validate_required(field: &str, value: &str) -> ServiceResult<()> {
    if value.trim().is_empty() {
        return Err(ServiceError::validation(format!("Article {} cannot be empty", field)));
    }
    Ok(())
}

fn validate_title_length(title: &str) -> ServiceResult<()> {
    if title.chars().count() > MAX_SLUG_LENGTH {
        return Err(ServiceError::validation(format!(
            "Article title cannot be longer than {} characters",
            MAX_SLUG_LENGTH
        )));
    }
    Ok(())
}

/// Generate a slug for a title: the slugified title plus a random
/// `[a-z0-9]{6}` suffix, at most [`MAX_SLUG_LENGTH`] characters long.
///
/// Long titles lose whole trailing words; a single over-long word is cut.
pub fn generate_slug(title: &str) -> String {
    let suffix = random_suffix();
    let base = slug::slugify(title);
    let base = truncate_slug(&base, MAX_SLUG_LENGTH - SLUG_SUFFIX_LENGTH - 1);

    if base.is_empty() {
        suffix
    } else {
        format!("{}-{}", base, suffix)
    }
}

/// Shorten a slugified (ASCII) string to at most `max` bytes
fn truncate_slug(slug: &str, max: usize) -> &str {
    if slug.len() <= max {
        return slug;
    }
    match slug[..=max].rfind('-') {
        Some(pos) if pos > 0 => slug[..pos].trim_end_matches('-'),
        _ => &slug[..max],
    }
}

fn random_suffix() -> String {
    let mut rng = rand::thread_rng();
    (0..SLUG_SUFFIX_LENGTH)
        .map(|_| SLUG_SUFFIX_CHARSET[rng.gen_range(0..SLUG_SUFFIX_CHARSET.len())] as char)
        .collect()
}
