use crate::domain::error::DomainError;
use crate::domain::identity::Identity;
use crate::domain::post::Post;

/// Whether the acting identity may update or delete the post: authenticated
/// and equal to the post's author. Anonymous identities never match.
pub fn can_mutate(identity: &Identity, post: &Post) -> bool {
    matches!(identity.user_id(), Some(id) if id == post.author_id)
}

pub fn ensure_can_mutate(identity: &Identity, post: &Post) -> Result<(), DomainError> {
    if can_mutate(identity, post) {
        Ok(())
    } else {
        Err(DomainError::Forbidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::user::PublicProfile;
    use chrono::Utc;
    use uuid::Uuid;

    fn profile(id: Uuid) -> PublicProfile {
        PublicProfile {
            id,
            username: "author".into(),
            first_name: String::new(),
            last_name: String::new(),
            email: "author@example.com".into(),
        }
    }

    fn post_by(author_id: Uuid) -> Post {
        Post {
            id: 1,
            author_id,
            title: "title".into(),
            content: "content".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn owner_may_mutate() {
        let id = Uuid::new_v4();
        let identity = Identity::User(profile(id));
        assert!(can_mutate(&identity, &post_by(id)));
        assert!(ensure_can_mutate(&identity, &post_by(id)).is_ok());
    }

    #[test]
    fn other_user_may_not_mutate() {
        let identity = Identity::User(profile(Uuid::new_v4()));
        let post = post_by(Uuid::new_v4());
        assert!(!can_mutate(&identity, &post));
        assert!(matches!(
            ensure_can_mutate(&identity, &post),
            Err(DomainError::Forbidden)
        ));
    }

    #[test]
    fn anonymous_may_never_mutate() {
        let post = post_by(Uuid::new_v4());
        assert!(!can_mutate(&Identity::Anonymous, &post));
        assert!(matches!(
            ensure_can_mutate(&Identity::Anonymous, &post),
            Err(DomainError::Forbidden)
        ));
    }
}
