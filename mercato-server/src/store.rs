//! Persistence gateway for saved profiles, recommendations and portfolios.
//!
//! The hosted store is reached only through [`PersistenceGateway`]; the server
//! ships [`MemoryStore`] as its default implementation. Payloads travel as JSON
//! so one gateway serves every [`Collection`]; typed validation happens in the
//! handlers before anything is stored.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use mercato_core::{Collection, MercatoError, Record};
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Which records an operation targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// Every record owned by a user.
    User(String),
    /// A single record.
    Record(Uuid),
}

/// Storage operations over the three record collections.
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    /// Store a new record for `user_id`.
    async fn save(
        &self,
        collection: Collection,
        user_id: &str,
        data: Value,
    ) -> Result<Record<Value>, MercatoError>;

    /// Records in scope, oldest first.
    ///
    /// # Errors
    /// `NotFound` when a [`Scope::Record`] id does not exist. A user without
    /// records yields an empty list.
    async fn get(
        &self,
        collection: Collection,
        scope: &Scope,
    ) -> Result<Vec<Record<Value>>, MercatoError>;

    /// Replace a record's payload; `id`, owner and creation time are kept.
    async fn update(
        &self,
        collection: Collection,
        id: Uuid,
        data: Value,
    ) -> Result<Record<Value>, MercatoError>;

    /// Remove records in scope and return how many were removed.
    ///
    /// # Errors
    /// `NotFound` when a [`Scope::Record`] id does not exist.
    async fn delete(&self, collection: Collection, scope: &Scope) -> Result<usize, MercatoError>;
}

type Table = HashMap<Uuid, Record<Value>>;

/// In-process store guarded by a tokio `RwLock`.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<Collection, Table>>,
}

impl MemoryStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn missing(collection: Collection, id: Uuid) -> MercatoError {
    MercatoError::not_found(format!("{} record {id}", collection.as_str()))
}

#[async_trait]
impl PersistenceGateway for MemoryStore {
    async fn save(
        &self,
        collection: Collection,
        user_id: &str,
        data: Value,
    ) -> Result<Record<Value>, MercatoError> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(MercatoError::InvalidArg("userId is required".into()));
        }
        let now = Utc::now();
        let record = Record {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            created_at: now,
            updated_at: now,
            data,
        };
        self.tables
            .write()
            .await
            .entry(collection)
            .or_default()
            .insert(record.id, record.clone());
        Ok(record)
    }

    async fn get(
        &self,
        collection: Collection,
        scope: &Scope,
    ) -> Result<Vec<Record<Value>>, MercatoError> {
        let tables = self.tables.read().await;
        let table = tables.get(&collection);
        match scope {
            Scope::Record(id) => table
                .and_then(|t| t.get(id))
                .map(|r| vec![r.clone()])
                .ok_or_else(|| missing(collection, *id)),
            Scope::User(user) => {
                let mut out: Vec<Record<Value>> = table
                    .into_iter()
                    .flat_map(HashMap::values)
                    .filter(|r| &r.user_id == user)
                    .cloned()
                    .collect();
                out.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
                Ok(out)
            }
        }
    }

    async fn update(
        &self,
        collection: Collection,
        id: Uuid,
        data: Value,
    ) -> Result<Record<Value>, MercatoError> {
        let mut tables = self.tables.write().await;
        let record = tables
            .get_mut(&collection)
            .and_then(|t| t.get_mut(&id))
            .ok_or_else(|| missing(collection, id))?;
        record.data = data;
        record.updated_at = Utc::now();
        Ok(record.clone())
    }

    async fn delete(&self, collection: Collection, scope: &Scope) -> Result<usize, MercatoError> {
        let mut tables = self.tables.write().await;
        let Some(table) = tables.get_mut(&collection) else {
            return match scope {
                Scope::Record(id) => Err(missing(collection, *id)),
                Scope::User(_) => Ok(0),
            };
        };
        match scope {
            Scope::Record(id) => table
                .remove(id)
                .map(|_| 1)
                .ok_or_else(|| missing(collection, *id)),
            Scope::User(user) => {
                let before = table.len();
                table.retain(|_, r| &r.user_id != user);
                Ok(before - table.len())
            }
        }
    }
}
