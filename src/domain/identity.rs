use uuid::Uuid;

use crate::domain::user::PublicProfile;

/// The identity attached to the current request. Resolved once per request
/// by the identity middleware and passed explicitly into every policy and
/// service call.
#[derive(Debug, Clone)]
pub enum Identity {
    Anonymous,
    User(PublicProfile),
}

impl Identity {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Identity::User(_))
    }

    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            Identity::Anonymous => None,
            Identity::User(profile) => Some(profile.id),
        }
    }

    pub fn profile(&self) -> Option<&PublicProfile> {
        match self {
            Identity::Anonymous => None,
            Identity::User(profile) => Some(profile),
        }
    }
}
