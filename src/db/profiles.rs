use std::collections::HashMap;
use std::sync::Mutex;

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppResult;

/// Looks up the marketplace role recorded for a user.
#[axum::async_trait]
pub trait ProfileStore: Send + Sync {
    /// Raw role string, or `None` when the user has no profile row.
    async fn role_of(&self, user_id: Uuid) -> AppResult<Option<String>>;
}

#[derive(Clone)]
pub struct PgProfileStore {
    pool: PgPool,
}

impl PgProfileStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[axum::async_trait]
impl ProfileStore for PgProfileStore {
    async fn role_of(&self, user_id: Uuid) -> AppResult<Option<String>> {
        let role = sqlx::query_scalar::<_, String>("SELECT role FROM profiles WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(role)
    }
}

#[derive(Debug, Default)]
pub struct MemoryProfileStore {
    roles: Mutex<HashMap<Uuid, String>>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_role(&self, user_id: Uuid, role: impl Into<String>) {
        self.roles
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(user_id, role.into());
    }
}

#[axum::async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn role_of(&self, user_id: Uuid) -> AppResult<Option<String>> {
        Ok(self
            .roles
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&user_id)
            .cloned())
    }
}
