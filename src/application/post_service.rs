use std::sync::Arc;

use tracing::instrument;

use crate::data::post_repository::PostRepository;
use crate::domain::identity::Identity;
use crate::domain::ownership::ensure_can_mutate;
use crate::domain::{
    error::DomainError,
    post::{NewPost, Post, PostPatch, PostWithAuthor},
};

const DEFAULT_PAGE_SIZE: usize = 10;
const MAX_PAGE_SIZE: usize = 100;

#[derive(Debug, Clone)]
pub struct Page {
    pub posts: Vec<PostWithAuthor>,
    pub total: i64,
    pub limit: usize,
    pub offset: usize,
}

#[derive(Clone)]
pub struct PostService<R: PostRepository + 'static> {
    repo: Arc<R>,
}

impl<R> PostService<R>
where
    R: PostRepository + 'static,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    fn page_bounds(limit: Option<usize>, offset: Option<usize>) -> (usize, usize) {
        (
            limit.unwrap_or(DEFAULT_PAGE_SIZE).min(MAX_PAGE_SIZE),
            offset.unwrap_or(0),
        )
    }

    pub async fn list(
        &self,
        limit: Option<usize>,
        offset: Option<usize>,
    ) -> Result<Page, DomainError> {
        let (limit, offset) = Self::page_bounds(limit, offset);
        let posts = self.repo.list(limit as i64, offset as i64).await?;
        let total = self.repo.count().await?;
        Ok(Page {
            posts,
            total,
            limit,
            offset,
        })
    }

    pub async fn my_posts(
        &self,
        identity: &Identity,
        limit: Option<usize>,
        offset: Option<usize>,
    ) -> Result<Page, DomainError> {
        let author_id = identity.user_id().ok_or(DomainError::Unauthorized)?;
        let (limit, offset) = Self::page_bounds(limit, offset);
        let posts = self
            .repo
            .list_by_author(author_id, limit as i64, offset as i64)
            .await?;
        let total = self.repo.count_by_author(author_id).await?;
        Ok(Page {
            posts,
            total,
            limit,
            offset,
        })
    }

    pub async fn get(&self, id: i64) -> Result<PostWithAuthor, DomainError> {
        self.repo
            .find_with_author(id)
            .await?
            .ok_or(DomainError::PostNotFound(id))
    }

    /// Load a post and apply the ownership policy. Every mutation path and
    /// every owner-only page goes through here.
    pub async fn get_owned(
        &self,
        identity: &Identity,
        id: i64,
    ) -> Result<PostWithAuthor, DomainError> {
        let found = self.get(id).await?;
        ensure_can_mutate(identity, &found.post)?;
        Ok(found)
    }

    #[instrument(skip(self, identity, content))]
    pub async fn create(
        &self,
        identity: &Identity,
        title: String,
        content: String,
    ) -> Result<Post, DomainError> {
        let author_id = identity.user_id().ok_or(DomainError::Unauthorized)?;
        let post = NewPost {
            author_id,
            title,
            content,
        };
        self.repo.create(post).await
    }

    #[instrument(skip(self, identity, patch))]
    pub async fn update(
        &self,
        identity: &Identity,
        id: i64,
        patch: PostPatch,
    ) -> Result<Post, DomainError> {
        self.get_owned(identity, id).await?;
        self.repo
            .update(id, patch)
            .await?
            .ok_or(DomainError::PostNotFound(id))
    }

    #[instrument(skip(self, identity))]
    pub async fn delete(&self, identity: &Identity, id: i64) -> Result<(), DomainError> {
        self.get_owned(identity, id).await?;
        let deleted = self.repo.delete(id).await?;
        if !deleted {
            return Err(DomainError::PostNotFound(id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::memory::{MemoryPostRepository, MemoryUserRepository};
    use crate::domain::user::{NewAccount, User};

    struct Fixture {
        users: Arc<MemoryUserRepository>,
        service: PostService<MemoryPostRepository>,
    }

    impl Fixture {
        fn new() -> Self {
            let users = Arc::new(MemoryUserRepository::new());
            let service = PostService::new(Arc::new(MemoryPostRepository::new(Arc::clone(&users))));
            Self { users, service }
        }

        async fn user(&self, username: &str) -> Identity {
            let account = NewAccount {
                username: username.into(),
                first_name: String::new(),
                last_name: String::new(),
                email: format!("{username}@example.com"),
                password: "irrelevant".into(),
            };
            let user = User::new(account, "hash".into());
            let user = crate::data::user_repository::UserRepository::create(
                self.users.as_ref(),
                user,
            )
            .await
            .unwrap();
            Identity::User(user.profile())
        }
    }

    #[tokio::test]
    async fn create_forces_author_to_acting_identity() {
        let fx = Fixture::new();
        let alice = fx.user("alice").await;

        let post = fx
            .service
            .create(&alice, "Hello".into(), "first post".into())
            .await
            .unwrap();

        assert_eq!(Some(post.author_id), alice.user_id());
    }

    #[tokio::test]
    async fn anonymous_cannot_create() {
        let fx = Fixture::new();
        let err = fx
            .service
            .create(&Identity::Anonymous, "Hello".into(), "body".into())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Unauthorized));
    }

    #[tokio::test]
    async fn listing_is_newest_first() {
        let fx = Fixture::new();
        let alice = fx.user("alice").await;

        for title in ["first", "second", "third"] {
            fx.service
                .create(&alice, title.into(), "body".into())
                .await
                .unwrap();
        }

        let page = fx.service.list(None, None).await.unwrap();
        let titles: Vec<&str> = page.posts.iter().map(|p| p.post.title.as_str()).collect();
        assert_eq!(titles, vec!["third", "second", "first"]);
        assert_eq!(page.total, 3);
    }

    #[tokio::test]
    async fn page_size_is_clamped() {
        let fx = Fixture::new();
        let page = fx.service.list(Some(10_000), None).await.unwrap();
        assert_eq!(page.limit, MAX_PAGE_SIZE);

        let page = fx.service.list(None, None).await.unwrap();
        assert_eq!(page.limit, DEFAULT_PAGE_SIZE);
    }

    #[tokio::test]
    async fn non_owner_cannot_update() {
        let fx = Fixture::new();
        let alice = fx.user("alice").await;
        let bob = fx.user("bob").await;

        let post = fx
            .service
            .create(&alice, "Hello".into(), "body".into())
            .await
            .unwrap();

        let patch = PostPatch {
            title: Some("Hijacked".into()),
            content: None,
        };
        let err = fx.service.update(&bob, post.id, patch).await.unwrap_err();
        assert!(matches!(err, DomainError::Forbidden));

        // refused mutation must not partially apply
        let unchanged = fx.service.get(post.id).await.unwrap();
        assert_eq!(unchanged.post.title, "Hello");
    }

    #[tokio::test]
    async fn owner_update_keeps_author_and_advances_updated_at() {
        let fx = Fixture::new();
        let alice = fx.user("alice").await;

        let post = fx
            .service
            .create(&alice, "Hello".into(), "body".into())
            .await
            .unwrap();

        let patch = PostPatch {
            title: Some("Hello again".into()),
            content: None,
        };
        let updated = fx.service.update(&alice, post.id, patch).await.unwrap();

        assert_eq!(updated.title, "Hello again");
        assert_eq!(updated.content, "body");
        assert_eq!(updated.author_id, post.author_id);
        assert_eq!(updated.created_at, post.created_at);
        assert!(updated.updated_at >= post.updated_at);
    }

    #[tokio::test]
    async fn non_owner_cannot_delete() {
        let fx = Fixture::new();
        let alice = fx.user("alice").await;
        let bob = fx.user("bob").await;

        let post = fx
            .service
            .create(&alice, "Hello".into(), "body".into())
            .await
            .unwrap();

        let err = fx.service.delete(&bob, post.id).await.unwrap_err();
        assert!(matches!(err, DomainError::Forbidden));
        assert!(fx.service.get(post.id).await.is_ok());
    }

    #[tokio::test]
    async fn anonymous_mutation_is_forbidden() {
        let fx = Fixture::new();
        let alice = fx.user("alice").await;
        let post = fx
            .service
            .create(&alice, "Hello".into(), "body".into())
            .await
            .unwrap();

        let err = fx
            .service
            .delete(&Identity::Anonymous, post.id)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden));
    }

    #[tokio::test]
    async fn owner_delete_removes_from_all_listings() {
        let fx = Fixture::new();
        let alice = fx.user("alice").await;

        let post = fx
            .service
            .create(&alice, "Hello".into(), "body".into())
            .await
            .unwrap();

        fx.service.delete(&alice, post.id).await.unwrap();

        assert!(matches!(
            fx.service.get(post.id).await,
            Err(DomainError::PostNotFound(_))
        ));
        assert!(fx.service.list(None, None).await.unwrap().posts.is_empty());
        assert!(
            fx.service
                .my_posts(&alice, None, None)
                .await
                .unwrap()
                .posts
                .is_empty()
        );
    }

    #[tokio::test]
    async fn missing_post_is_not_found_not_forbidden() {
        let fx = Fixture::new();
        let alice = fx.user("alice").await;

        let err = fx.service.delete(&alice, 404).await.unwrap_err();
        assert!(matches!(err, DomainError::PostNotFound(404)));
    }

    #[tokio::test]
    async fn my_posts_scoped_to_acting_identity() {
        let fx = Fixture::new();
        let alice = fx.user("alice").await;
        let bob = fx.user("bob").await;

        fx.service
            .create(&alice, "mine".into(), "body".into())
            .await
            .unwrap();
        fx.service
            .create(&bob, "theirs".into(), "body".into())
            .await
            .unwrap();

        let page = fx.service.my_posts(&alice, None, None).await.unwrap();
        assert_eq!(page.posts.len(), 1);
        assert_eq!(page.posts[0].post.title, "mine");
        assert_eq!(page.total, 1);

        let err = fx
            .service
            .my_posts(&Identity::Anonymous, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Unauthorized));
    }
}
