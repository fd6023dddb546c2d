//! In-memory user directory.

use async_trait::async_trait;
use shadowdark_domain::{ActorId, UserId};
use tokio::sync::RwLock;

use crate::infrastructure::ports::{RepoError, UserRecord, UserRepo};

#[derive(Default)]
pub struct InMemoryUsers {
    users: RwLock<Vec<UserRecord>>,
}

impl InMemoryUsers {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add(&self, user: UserRecord) {
        self.users.write().await.push(user);
    }

    /// Add an active, non-GM user playing `character`.
    pub async fn add_player(&self, name: impl Into<String>, character: ActorId) -> UserId {
        let id = UserId::new();
        self.add(UserRecord {
            id,
            name: name.into(),
            is_gm: false,
            active: true,
            character: Some(character),
        })
        .await;
        id
    }

    pub async fn set_active(&self, id: UserId, active: bool) -> Result<(), RepoError> {
        let mut users = self.users.write().await;
        let user = users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| RepoError::not_found("User", id))?;
        user.active = active;
        Ok(())
    }
}

#[async_trait]
impl UserRepo for InMemoryUsers {
    async fn list_users(&self) -> Result<Vec<UserRecord>, RepoError> {
        Ok(self.users.read().await.clone())
    }

    async fn get_user(&self, id: UserId) -> Result<Option<UserRecord>, RepoError> {
        Ok(self.users.read().await.iter().find(|u| u.id == id).cloned())
    }
}
