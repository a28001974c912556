//! Cache Manager Module
//!
//! Maps a mutated portal entity to the cache keys and prefixes that depend on it.
//! Relationships between entities are fixed, so the fan-out is a static table
//! rather than a dependency graph. Lists are never patched in place: any
//! mutation drops every cached list of that kind.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::cache::{keys, CacheStore};

/// Cache store shared between handlers, tasks and the manager.
pub type SharedCache<V> = Arc<RwLock<CacheStore<V>>>;

// == Entity ==
/// A portal entity whose mutation invalidates cached data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "entity", rename_all = "snake_case")]
pub enum Entity {
    User { id: String },
    /// Training group. Invalidating a group cascades to its sessions and to
    /// every attendance view.
    Group { id: String },
    Session { group_id: String, id: String },
    Attendance { session_id: String },
    /// Doctor profile. Cascades to the doctor's computed availability.
    Doctor { id: String },
    Appointment { doctor_id: String, id: String },
}

// == Invalidation Plan ==
/// Exact keys and key prefixes to purge for one entity mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvalidationPlan {
    pub keys: Vec<String>,
    pub prefixes: Vec<String>,
}

impl Entity {
    /// Returns the fixed fan-out for this entity.
    pub fn plan(&self) -> InvalidationPlan {
        match self {
            Entity::User { id } => InvalidationPlan {
                keys: vec![keys::user(id), keys::user_details(id)],
                prefixes: vec![keys::USERS_LIST_PREFIX.to_string()],
            },
            Entity::Group { id } => InvalidationPlan {
                keys: vec![keys::group(id), keys::group_details(id)],
                prefixes: vec![
                    keys::GROUPS_LIST_PREFIX.to_string(),
                    keys::sessions_prefix(id),
                    keys::ATTENDANCE_PREFIX.to_string(),
                ],
            },
            Entity::Session { group_id, id } => InvalidationPlan {
                keys: vec![keys::session(id), keys::session_details(id)],
                prefixes: vec![keys::sessions_prefix(group_id), keys::attendance_prefix(id)],
            },
            Entity::Attendance { session_id } => InvalidationPlan {
                keys: Vec::new(),
                prefixes: vec![keys::attendance_prefix(session_id)],
            },
            Entity::Doctor { id } => InvalidationPlan {
                keys: vec![keys::doctor(id), keys::doctor_details(id)],
                prefixes: vec![
                    keys::DOCTORS_LIST_PREFIX.to_string(),
                    keys::availability_prefix(id),
                ],
            },
            Entity::Appointment { doctor_id, id } => InvalidationPlan {
                keys: vec![keys::appointment(id), keys::appointment_details(id)],
                prefixes: vec![
                    keys::APPOINTMENTS_LIST_PREFIX.to_string(),
                    keys::availability_prefix(doctor_id),
                ],
            },
        }
    }
}

impl InvalidationPlan {
    /// Applies the plan to a store. Returns the number of entries removed.
    pub fn apply<V: Clone>(&self, store: &mut CacheStore<V>) -> usize {
        let direct = self.keys.iter().filter(|key| store.delete(key)).count();
        let by_prefix: usize = self
            .prefixes
            .iter()
            .map(|prefix| store.delete_by_prefix(prefix))
            .sum();
        direct + by_prefix
    }
}

// == Cache Manager ==
/// Domain-aware façade over a shared cache store.
///
/// Holds no state besides the store handle; cloning it is cheap.
#[derive(Debug)]
pub struct CacheManager<V> {
    cache: SharedCache<V>,
}

impl<V> Clone for CacheManager<V> {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
        }
    }
}

impl<V: Clone> CacheManager<V> {
    pub fn new(cache: SharedCache<V>) -> Self {
        Self { cache }
    }

    /// The underlying store handle.
    pub fn cache(&self) -> &SharedCache<V> {
        &self.cache
    }

    // == Pass-through ==
    pub async fn get(&self, key: &str) -> Option<V> {
        self.cache.write().await.get(key)
    }

    pub async fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        self.cache.write().await.set(key, value, ttl);
    }

    pub async fn delete(&self, key: &str) -> bool {
        self.cache.write().await.delete(key)
    }

    pub async fn delete_by_prefix(&self, prefix: &str) -> usize {
        self.cache.write().await.delete_by_prefix(prefix)
    }

    // == Read Through ==
    /// Returns the cached value for `key`, or runs `loader` and caches its result.
    ///
    /// Loader errors propagate and leave the cache untouched. The lock is not
    /// held while the loader runs.
    pub async fn get_or_load<F, Fut, E>(&self, key: &str, ttl: Duration, loader: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let cached = self.cache.write().await.get(key);
        if let Some(value) = cached {
            return Ok(value);
        }

        debug!(key, "Cache miss, loading");
        let value = loader().await?;
        self.cache.write().await.set(key, value.clone(), ttl);
        Ok(value)
    }

    // == Invalidation ==
    /// Purges everything that depends on `entity`. Returns the number of entries removed.
    pub async fn invalidate(&self, entity: &Entity) -> usize {
        let plan = entity.plan();
        let removed = {
            let mut store = self.cache.write().await;
            plan.apply(&mut store)
        };
        debug!(?entity, removed, "Invalidated cache entries");
        removed
    }

    pub async fn invalidate_user(&self, id: &str) -> usize {
        self.invalidate(&Entity::User { id: id.to_string() }).await
    }

    pub async fn invalidate_group(&self, id: &str) -> usize {
        self.invalidate(&Entity::Group { id: id.to_string() }).await
    }

    pub async fn invalidate_session(&self, group_id: &str, id: &str) -> usize {
        self.invalidate(&Entity::Session {
            group_id: group_id.to_string(),
            id: id.to_string(),
        })
        .await
    }

    pub async fn invalidate_attendance(&self, session_id: &str) -> usize {
        self.invalidate(&Entity::Attendance {
            session_id: session_id.to_string(),
        })
        .await
    }

    pub async fn invalidate_doctor(&self, id: &str) -> usize {
        self.invalidate(&Entity::Doctor { id: id.to_string() }).await
    }

    pub async fn invalidate_appointment(&self, doctor_id: &str, id: &str) -> usize {
        self.invalidate(&Entity::Appointment {
            doctor_id: doctor_id.to_string(),
            id: id.to_string(),
        })
        .await
    }

    /// Clears the whole store. Reserved for broad mutations.
    pub async fn invalidate_all(&self) -> usize {
        let removed = self.cache.write().await.clear();
        info!("Cleared entire cache ({} entries)", removed);
        removed
    }
}
