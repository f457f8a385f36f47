//! In-memory repository doubles backing the service tests.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::data::post_repository::PostRepository;
use crate::data::user_repository::UserRepository;
use crate::domain::error::DomainError;
use crate::domain::post::{NewPost, Post, PostPatch, PostWithAuthor};
use crate::domain::user::{PublicProfile, User};

#[derive(Default)]
pub struct MemoryUserRepository {
    users: Mutex<Vec<User>>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn profile_of(&self, id: Uuid) -> Option<PublicProfile> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == id)
            .map(User::profile)
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn create(&self, user: User) -> Result<User, DomainError> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.username == user.username) {
            return Err(DomainError::UsernameTaken(user.username));
        }
        users.push(user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DomainError> {
        Ok(self.users.lock().unwrap().iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DomainError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.username == username)
            .cloned())
    }
}

pub struct MemoryPostRepository {
    users: Arc<MemoryUserRepository>,
    posts: Mutex<Vec<Post>>,
    next_id: AtomicI64,
}

impl MemoryPostRepository {
    pub fn new(users: Arc<MemoryUserRepository>) -> Self {
        Self {
            users,
            posts: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(1),
        }
    }

    fn with_author(&self, post: Post) -> Result<PostWithAuthor, DomainError> {
        let author = self
            .users
            .profile_of(post.author_id)
            .ok_or(DomainError::UserNotFound(post.author_id))?;
        Ok(PostWithAuthor { post, author })
    }

    fn sorted(posts: &[Post]) -> Vec<Post> {
        let mut posts = posts.to_vec();
        posts.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        posts
    }
}

#[async_trait]
impl PostRepository for MemoryPostRepository {
    async fn create(&self, new: NewPost) -> Result<Post, DomainError> {
        let now = Utc::now();
        let post = Post {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            author_id: new.author_id,
            title: new.title,
            content: new.content,
            created_at: now,
            updated_at: now,
        };
        self.posts.lock().unwrap().push(post.clone());
        Ok(post)
    }

    async fn find_with_author(&self, id: i64) -> Result<Option<PostWithAuthor>, DomainError> {
        let post = self.posts.lock().unwrap().iter().find(|p| p.id == id).cloned();
        match post {
            Some(post) => Ok(Some(self.with_author(post)?)),
            None => Ok(None),
        }
    }

    async fn update(&self, id: i64, patch: PostPatch) -> Result<Option<Post>, DomainError> {
        let mut posts = self.posts.lock().unwrap();
        match posts.iter_mut().find(|p| p.id == id) {
            Some(post) => {
                if let Some(title) = patch.title {
                    post.title = title;
                }
                if let Some(content) = patch.content {
                    post.content = content;
                }
                post.updated_at = Utc::now();
                Ok(Some(post.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, id: i64) -> Result<bool, DomainError> {
        let mut posts = self.posts.lock().unwrap();
        let before = posts.len();
        posts.retain(|p| p.id != id);
        Ok(posts.len() < before)
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<PostWithAuthor>, DomainError> {
        let posts = Self::sorted(&self.posts.lock().unwrap());
        posts
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .map(|p| self.with_author(p))
            .collect()
    }

    async fn list_by_author(
        &self,
        author_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PostWithAuthor>, DomainError> {
        let posts: Vec<Post> = Self::sorted(&self.posts.lock().unwrap())
            .into_iter()
            .filter(|p| p.author_id == author_id)
            .collect();
        posts
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .map(|p| self.with_author(p))
            .collect()
    }

    async fn count(&self) -> Result<i64, DomainError> {
        Ok(self.posts.lock().unwrap().len() as i64)
    }

    async fn count_by_author(&self, author_id: Uuid) -> Result<i64, DomainError> {
        Ok(self
            .posts
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.author_id == author_id)
            .count() as i64)
    }
}
