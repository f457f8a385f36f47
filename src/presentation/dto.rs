use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::post::{Post, PostWithAuthor};
use crate::domain::user::PublicProfile;

// ======================= AUTH =======================

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub repassword: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: String, // "Bearer"
    pub expires_in: i64,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub detail: String,
}

// ======================= POSTS =======================

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePostRequest {
    pub title: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct PostResponse {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub author: PublicProfile,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PostResponse {
    pub fn from_parts(post: Post, author: PublicProfile) -> Self {
        Self {
            id: post.id,
            title: post.title,
            content: post.content,
            author,
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

impl From<PostWithAuthor> for PostResponse {
    fn from(found: PostWithAuthor) -> Self {
        Self::from_parts(found.post, found.author)
    }
}

#[derive(Debug, Serialize)]
pub struct PostListResponse {
    pub posts: Vec<PostResponse>,
    pub total: i64,
    pub limit: usize,
    pub offset: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn post_response_never_carries_credentials() {
        let author = PublicProfile {
            id: Uuid::new_v4(),
            username: "ada".into(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "ada@example.com".into(),
        };
        let post = Post {
            id: 1,
            author_id: author.id,
            title: "Hello".into(),
            content: "body".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let value =
            serde_json::to_value(PostResponse::from_parts(post, author)).unwrap();

        assert_eq!(value["author"]["username"], "ada");
        assert!(value["author"].get("password").is_none());
        assert!(value["author"].get("password_hash").is_none());
    }
}
