//! Shared API response types
//!
//! JSON envelopes in the shape Conduit clients expect: every payload is
//! wrapped in a named root (`user`, `profile`, `article`, ...) and fields are
//! camelCase.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{ArticleView, CommentView, ProfileView, PagedResult};
use crate::services::AuthenticatedAccount;

/// Timestamps are rendered as RFC 3339 with milliseconds, in UTC
fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

// ============================================================================
// Users and profiles
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub email: String,
    pub username: String,
    pub bio: String,
    pub image: Option<String>,
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserBody {
    pub user: UserResponse,
}

impl From<AuthenticatedAccount> for UserBody {
    fn from(signed_in: AuthenticatedAccount) -> Self {
        let AuthenticatedAccount { account, token } = signed_in;
        Self {
            user: UserResponse {
                email: account.user.email,
                username: account.user.username,
                bio: account.profile.bio,
                image: account.profile.image,
                token,
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub username: String,
    pub bio: String,
    pub image: Option<String>,
    pub following: bool,
}

impl From<ProfileView> for ProfileResponse {
    fn from(view: ProfileView) -> Self {
        Self {
            username: view.username,
            bio: view.bio,
            image: view.image,
            following: view.following,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProfileBody {
    pub profile: ProfileResponse,
}

impl From<ProfileView> for ProfileBody {
    fn from(view: ProfileView) -> Self {
        Self {
            profile: view.into(),
        }
    }
}

// ============================================================================
// Articles
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleResponse {
    pub slug: String,
    pub title: String,
    pub description: String,
    pub body: String,
    pub tag_list: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
    pub favorited: bool,
    pub favorites_count: i64,
    pub author: ProfileResponse,
}

impl From<ArticleView> for ArticleResponse {
    fn from(view: ArticleView) -> Self {
        let article = view.article;
        Self {
            slug: article.slug,
            title: article.title,
            description: article.description,
            body: article.body,
            tag_list: view.tag_list,
            created_at: timestamp(article.created_at),
            updated_at: timestamp(article.updated_at),
            favorited: view.favorited,
            favorites_count: view.favorites_count,
            author: view.author.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ArticleBody {
    pub article: ArticleResponse,
}

impl From<ArticleView> for ArticleBody {
    fn from(view: ArticleView) -> Self {
        Self {
            article: view.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticlesBody {
    pub articles: Vec<ArticleResponse>,
    pub articles_count: i64,
}

impl From<PagedResult<ArticleView>> for ArticlesBody {
    fn from(page: PagedResult<ArticleView>) -> Self {
        let page = page.map(ArticleResponse::from);
        Self {
            articles: page.items,
            articles_count: page.total,
        }
    }
}

// ============================================================================
// Comments and tags
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: i64,
    pub body: String,
    pub created_at: String,
    pub updated_at: String,
    pub author: ProfileResponse,
}

impl From<CommentView> for CommentResponse {
    fn from(view: CommentView) -> Self {
        Self {
            id: view.comment.id,
            body: view.comment.body,
            created_at: timestamp(view.comment.created_at),
            updated_at: timestamp(view.comment.updated_at),
            author: view.author.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CommentBody {
    pub comment: CommentResponse,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CommentsBody {
    pub comments: Vec<CommentResponse>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TagsBody {
    pub tags: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Article;
    use chrono::TimeZone;

    fn view() -> ArticleView {
        let at = Utc.with_ymd_and_hms(2016, 2, 18, 3, 22, 56).unwrap();
        ArticleView {
            article: Article {
                id: 1,
                slug: "how-to-train-your-dragon-abc123".into(),
                title: "How to train your dragon".into(),
                description: "Ever wonder how?".into(),
                body: "It takes a Jacobian".into(),
                author_id: 1,
                created_at: at,
                updated_at: at,
            },
            author: ProfileView {
                username: "jake".into(),
                bio: String::new(),
                image: None,
                following: false,
            },
            tag_list: vec!["dragons".into()],
            favorited: false,
            favorites_count: 0,
        }
    }

    #[test]
    fn test_article_json_is_camel_case() {
        let json = serde_json::to_value(ArticleBody::from(view())).unwrap();
        let article = &json["article"];

        assert_eq!(article["tagList"], serde_json::json!(["dragons"]));
        assert_eq!(article["favoritesCount"], 0);
        assert_eq!(article["createdAt"], "2016-02-18T03:22:56.000Z");
        assert_eq!(article["author"]["username"], "jake");
        assert!(article["author"]["image"].is_null());
        assert!(article.get("id").is_none());
    }

    #[test]
    fn test_articles_body_count() {
        let page = PagedResult::new(vec![view()], 7);
        let json = serde_json::to_value(ArticlesBody::from(page)).unwrap();
        assert_eq!(json["articlesCount"], 7);
        assert_eq!(json["articles"].as_array().unwrap().len(), 1);
    }
}
