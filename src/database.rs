//! # Data Store
//!
//! Key-value blob store backed by sqlite, plus typed repositories on top of it.
//! Every blob carries a version stamp; writes are compare-and-swap so two
//! concurrent writers of the same collection cannot silently drop an update.
//!
//! - **Version**: 2.0.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 2.0.0: Version-stamped blobs with compare-and-swap writes, schema envelope
//! - 1.0.0: Whole-collection get/set over sqlite

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use log::{debug, info};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;
use std::sync::Arc;

/// Logical keys of the four persisted records
pub mod keys {
    pub const GUESTS: &str = "guests";
    pub const DISHES: &str = "dishes";
    pub const EVENT_CONFIG: &str = "event-config";
    pub const PENDING_REMINDERS: &str = "pending-reminders";
}

/// Current schema version written into every envelope
pub const SCHEMA_VERSION: u32 = 1;

/// Give up after this many lost compare-and-swap races on one write
const MAX_WRITE_ATTEMPTS: usize = 8;

/// Raw blob as stored, with its version stamp
#[derive(Debug, Clone, PartialEq)]
pub struct StoredBlob {
    pub value: String,
    pub version: i64,
}

/// Minimal storage contract the repositories are written against
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Read a blob, `None` when the key was never written
    async fn get(&self, key: &str) -> Result<Option<StoredBlob>>;

    /// Write a blob if the stored version still equals `expected_version`
    /// (`None` means "only if absent"). Returns false when another writer won.
    async fn put(&self, key: &str, value: String, expected_version: Option<i64>) -> Result<bool>;
}

/// sqlite-backed blob store. Each operation opens its own connection on the
/// blocking pool so the handle is cheap to clone and share.
#[derive(Clone)]
pub struct Database {
    path: Arc<str>,
}

impl Database {
    pub async fn new(path: &str) -> Result<Self> {
        let database = Database { path: Arc::from(path) };

        database
            .with_connection(|conn| {
                conn.execute(
                    "CREATE TABLE IF NOT EXISTS blobs (
                        key TEXT PRIMARY KEY,
                        value TEXT NOT NULL,
                        version INTEGER NOT NULL,
                        updated_at TEXT NOT NULL
                    )",
                )?;
                Ok(())
            })
            .await
            .with_context(|| format!("Failed to initialise data store at {path}"))?;

        info!("Data store ready at {path}");
        Ok(database)
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    async fn with_connection<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut sqlite::Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = sqlite::open(&*path)?;
            conn.set_busy_timeout(5000)?;
            f(&mut conn)
        })
        .await
        .context("Data store task panicked")?
    }
}

#[async_trait]
impl BlobStore for Database {
    async fn get(&self, key: &str) -> Result<Option<StoredBlob>> {
        let key = key.to_string();
        self.with_connection(move |conn| {
            let mut statement = conn.prepare("SELECT value, version FROM blobs WHERE key = ?")?;
            statement.bind((1, key.as_str()))?;

            if let sqlite::State::Row = statement.next()? {
                Ok(Some(StoredBlob {
                    value: statement.read::<String, _>(0)?,
                    version: statement.read::<i64, _>(1)?,
                }))
            } else {
                Ok(None)
            }
        })
        .await
    }

    async fn put(&self, key: &str, value: String, expected_version: Option<i64>) -> Result<bool> {
        let key = key.to_string();
        let now = Utc::now().to_rfc3339();

        self.with_connection(move |conn| {
            match expected_version {
                None => {
                    let mut statement = conn.prepare(
                        "INSERT INTO blobs (key, value, version, updated_at) VALUES (?, ?, 1, ?)
                         ON CONFLICT(key) DO NOTHING",
                    )?;
                    statement.bind((1, key.as_str()))?;
                    statement.bind((2, value.as_str()))?;
                    statement.bind((3, now.as_str()))?;
                    while statement.next()? != sqlite::State::Done {}
                }
                Some(version) => {
                    let mut statement = conn.prepare(
                        "UPDATE blobs SET value = ?, version = version + 1, updated_at = ?
                         WHERE key = ? AND version = ?",
                    )?;
                    statement.bind((1, value.as_str()))?;
                    statement.bind((2, now.as_str()))?;
                    statement.bind((3, key.as_str()))?;
                    statement.bind((4, version))?;
                    while statement.next()? != sqlite::State::Done {}
                }
            }

            Ok(conn.change_count() == 1)
        })
        .await
    }
}

/// On-disk wrapper carrying the schema version of its payload
#[derive(Debug, Serialize, Deserialize)]
struct Envelope<T> {
    schema_version: u32,
    data: T,
}

/// Decode a stored blob, migrating bare legacy JSON (schema version 0)
fn decode<T: DeserializeOwned>(key: &str, raw: &str) -> Result<T> {
    let value: serde_json::Value = serde_json::from_str(raw)
        .with_context(|| format!("Stored value for '{key}' is not valid JSON"))?;

    let is_envelope = value
        .as_object()
        .map(|obj| obj.contains_key("schema_version") && obj.contains_key("data"))
        .unwrap_or(false);

    if !is_envelope {
        debug!("Migrating legacy unversioned record '{key}'");
        return serde_json::from_value(value)
            .with_context(|| format!("Legacy record '{key}' does not match the expected shape"));
    }

    let envelope: Envelope<serde_json::Value> = serde_json::from_value(value)?;
    if envelope.schema_version > SCHEMA_VERSION {
        anyhow::bail!(
            "Record '{}' has schema version {} but only {} is supported",
            key,
            envelope.schema_version,
            SCHEMA_VERSION
        );
    }

    serde_json::from_value(envelope.data)
        .with_context(|| format!("Record '{key}' does not match the expected shape"))
}

fn encode<T: Serialize>(data: &T) -> Result<String> {
    Ok(serde_json::to_string(&Envelope {
        schema_version: SCHEMA_VERSION,
        data,
    })?)
}

/// Read-modify-CAS loop shared by collections and documents
async fn update_blob<T, R, F>(
    store: &dyn BlobStore,
    key: &str,
    initial: impl Fn() -> T,
    mut mutate: F,
) -> Result<R>
where
    T: Serialize + DeserializeOwned,
    F: FnMut(&mut T) -> R,
{
    for attempt in 1..=MAX_WRITE_ATTEMPTS {
        let current = store.get(key).await?;
        let (mut data, version) = match &current {
            Some(blob) => (decode::<T>(key, &blob.value)?, Some(blob.version)),
            None => (initial(), None),
        };

        let result = mutate(&mut data);

        if store.put(key, encode(&data)?, version).await? {
            return Ok(result);
        }

        debug!("Write conflict on '{key}' (attempt {attempt}), retrying");
    }

    anyhow::bail!("Gave up writing '{}' after {} conflicting attempts", key, MAX_WRITE_ATTEMPTS)
}

/// Anything stored in a `Collection`
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    fn id(&self) -> &str;
}

impl Entity for crate::core::Guest {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Entity for crate::core::Dish {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Entity for crate::core::PendingReminder {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Repository over one collection key with per-item operations
pub struct Collection<T> {
    store: Arc<dyn BlobStore>,
    key: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            key: self.key,
            _marker: PhantomData,
        }
    }
}

impl<T: Entity> Collection<T> {
    pub fn new(store: Arc<dyn BlobStore>, key: &'static str) -> Self {
        Self {
            store,
            key,
            _marker: PhantomData,
        }
    }

    pub async fn list(&self) -> Result<Vec<T>> {
        match self.store.get(self.key).await? {
            Some(blob) => decode(self.key, &blob.value),
            None => Ok(Vec::new()),
        }
    }

    pub async fn find(&self, id: &str) -> Result<Option<T>> {
        Ok(self.list().await?.into_iter().find(|item| item.id() == id))
    }

    pub async fn insert(&self, item: T) -> Result<T> {
        self.update(|items| items.push(item.clone())).await?;
        Ok(item)
    }

    /// Apply `f` to one item; `None` when the id is absent (nothing written)
    pub async fn update_item<F>(&self, id: &str, mut f: F) -> Result<Option<T>>
    where
        F: FnMut(&mut T),
    {
        if self.find(id).await?.is_none() {
            return Ok(None);
        }

        self.update(|items| {
            items.iter_mut().find(|item| item.id() == id).map(|item| {
                f(item);
                item.clone()
            })
        })
        .await
    }

    pub async fn delete(&self, id: &str) -> Result<bool> {
        if self.find(id).await?.is_none() {
            return Ok(false);
        }

        self.update(|items| {
            let before = items.len();
            items.retain(|item| item.id() != id);
            items.len() != before
        })
        .await
    }

    /// Mutate the whole collection atomically; `f` may run more than once
    pub async fn update<R, F>(&self, f: F) -> Result<R>
    where
        F: FnMut(&mut Vec<T>) -> R,
    {
        update_blob(self.store.as_ref(), self.key, Vec::new, f).await
    }
}

/// Repository for a singleton record that materialises to a default when absent
pub struct Document<T> {
    store: Arc<dyn BlobStore>,
    key: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Document<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            key: self.key,
            _marker: PhantomData,
        }
    }
}

impl<T> Document<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    pub fn new(store: Arc<dyn BlobStore>, key: &'static str) -> Self {
        Self {
            store,
            key,
            _marker: PhantomData,
        }
    }

    pub async fn load(&self) -> Result<Option<T>> {
        match self.store.get(self.key).await? {
            Some(blob) => Ok(Some(decode(self.key, &blob.value)?)),
            None => Ok(None),
        }
    }

    pub async fn load_or(&self, default: impl FnOnce() -> T) -> Result<T> {
        Ok(self.load().await?.unwrap_or_else(default))
    }

    /// Replace the document wholesale
    pub async fn save(&self, value: &T) -> Result<()> {
        let replacement = value.clone();
        update_blob(
            self.store.as_ref(),
            self.key,
            || replacement.clone(),
            |current| *current = replacement.clone(),
        )
        .await
    }
}
