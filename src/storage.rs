//! Embedded document store backing the platform.
//!
//! Collections map to Sled trees; documents are schema-less JSON values
//! keyed by an opaque store-assigned `_id`. Queries are expressed as a
//! conjunction of conditions over dotted field paths plus an optional
//! single-field sort, skip and limit.

use serde::Serialize;
use serde_json::{Map, Value};
use sled::Db;
use std::cmp::Ordering;
use thiserror::Error;

/// Collection names used by the platform.
pub mod collections {
    pub const USERS: &str = "users";
    pub const PETS: &str = "pets";
    pub const ADOPTIONS: &str = "adoptions";
    pub const CAMPAIGNS: &str = "campaigns";
    pub const CATEGORIES: &str = "categories";
    pub const ENCOURAGE: &str = "encourage";
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("store error: {0}")]
    Sled(#[from] sled::Error),
    #[error("document serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("document must be a JSON object")]
    NotAnObject,
}

#[derive(Debug, Clone)]
enum Cond {
    Eq {
        path: String,
        value: Value,
    },
    Contains {
        path: String,
        pattern: String,
        case_insensitive: bool,
    },
}

/// Conjunction of field conditions. An empty filter matches every document.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    conds: Vec<Cond>,
}

impl Filter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_id(id: &str) -> Self {
        Self::all().eq("_id", Value::from(id))
    }

    pub fn eq(mut self, path: &str, value: Value) -> Self {
        self.conds.push(Cond::Eq {
            path: path.to_string(),
            value,
        });
        self
    }

    /// Substring containment on a string field. Never matches a missing or
    /// non-string field; an empty pattern matches any string value.
    pub fn contains(mut self, path: &str, pattern: &str) -> Self {
        self.conds.push(Cond::Contains {
            path: path.to_string(),
            pattern: pattern.to_string(),
            case_insensitive: false,
        });
        self
    }

    pub fn contains_ci(mut self, path: &str, pattern: &str) -> Self {
        self.conds.push(Cond::Contains {
            path: path.to_string(),
            pattern: pattern.to_string(),
            case_insensitive: true,
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.conds.is_empty()
    }

    pub fn matches(&self, doc: &Value) -> bool {
        self.conds.iter().all(|cond| match cond {
            Cond::Eq { path, value } => lookup_path(doc, path) == Some(value),
            Cond::Contains {
                path,
                pattern,
                case_insensitive,
            } => match lookup_path(doc, path).and_then(Value::as_str) {
                Some(s) if *case_insensitive => {
                    s.to_lowercase().contains(&pattern.to_lowercase())
                }
                Some(s) => s.contains(pattern.as_str()),
                None => false,
            },
        })
    }
}

/// Resolve a dotted path like `pet_category.value` against a document.
fn lookup_path<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = doc;
    for segment in path.split('.') {
        current = current.get(segment)?;
    }
    Some(current)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Default)]
pub struct FindOptions {
    sort: Option<(String, SortOrder)>,
    skip: usize,
    limit: Option<usize>,
}

impl FindOptions {
    pub fn sort(mut self, field: &str, order: SortOrder) -> Self {
        self.sort = Some((field.to_string(), order));
        self
    }

    pub fn skip(mut self, skip: usize) -> Self {
        self.skip = skip;
        self
    }

    /// A limit of 0 selects zero documents; without a limit the full
    /// matching set is returned.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Write results in the document-store wire shape, returned verbatim to
/// API callers.
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct InsertOneResult {
    pub acknowledged: bool,
    pub inserted_id: String,
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResult {
    pub acknowledged: bool,
    pub matched_count: u64,
    pub modified_count: u64,
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResult {
    pub acknowledged: bool,
    pub deleted_count: u64,
}

/// Handle to the document store. One instance is opened at startup and
/// shared across all requests (Sled internals are cheap to clone).
#[derive(Clone)]
pub struct Storage {
    db: Db,
}

impl Storage {
    /// Open or create the store at the given path.
    pub fn open(path: &str) -> Result<Self, StorageError> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    fn tree(&self, collection: &str) -> Result<sled::Tree, StorageError> {
        Ok(self.db.open_tree(collection)?)
    }

    /// Store-assigned ids are monotonically increasing hex strings, so an
    /// unsorted scan returns documents in insertion order.
    fn next_id(&self) -> Result<String, StorageError> {
        Ok(format!("{:016x}", self.db.generate_id()?))
    }

    /// Connectivity check used by startup logging.
    pub async fn ping(&self) -> Result<(), StorageError> {
        self.db.flush_async().await?;
        Ok(())
    }

    pub async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        options: &FindOptions,
    ) -> Result<Vec<Value>, StorageError> {
        let tree = self.tree(collection)?;
        let mut docs = Vec::new();
        for item in tree.iter() {
            let (_, bytes) = item?;
            let doc: Value = serde_json::from_slice(&bytes)?;
            if filter.matches(&doc) {
                docs.push(doc);
            }
        }

        if let Some((field, order)) = &options.sort {
            docs.sort_by(|a, b| {
                let ord = compare_values(lookup_path(a, field), lookup_path(b, field));
                match order {
                    SortOrder::Asc => ord,
                    SortOrder::Desc => ord.reverse(),
                }
            });
        }

        let mut docs: Vec<Value> = docs.into_iter().skip(options.skip).collect();
        if let Some(limit) = options.limit {
            docs.truncate(limit);
        }
        Ok(docs)
    }

    pub async fn find_one(
        &self,
        collection: &str,
        filter: &Filter,
    ) -> Result<Option<Value>, StorageError> {
        let tree = self.tree(collection)?;
        for item in tree.iter() {
            let (_, bytes) = item?;
            let doc: Value = serde_json::from_slice(&bytes)?;
            if filter.matches(&doc) {
                return Ok(Some(doc));
            }
        }
        Ok(None)
    }

    /// Insert a document, assigning an `_id` when the caller did not supply
    /// one. The document is persisted as-is; no shape validation happens
    /// at this layer.
    pub async fn insert_one(
        &self,
        collection: &str,
        doc: Value,
    ) -> Result<InsertOneResult, StorageError> {
        let mut obj = match doc {
            Value::Object(obj) => obj,
            _ => return Err(StorageError::NotAnObject),
        };
        let id = match obj.get("_id").and_then(Value::as_str) {
            Some(id) => id.to_string(),
            None => {
                let id = self.next_id()?;
                obj.insert("_id".to_string(), Value::from(id.clone()));
                id
            }
        };

        let tree = self.tree(collection)?;
        tree.insert(id.as_bytes(), serde_json::to_vec(&Value::Object(obj))?)?;
        Ok(InsertOneResult {
            acknowledged: true,
            inserted_id: id,
        })
    }

    /// Merge the given fields into the first matching document. The
    /// modified count is 0 when the merge changes nothing.
    pub async fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        set: &Map<String, Value>,
    ) -> Result<UpdateResult, StorageError> {
        let tree = self.tree(collection)?;
        for item in tree.iter() {
            let (key, bytes) = item?;
            let doc: Value = serde_json::from_slice(&bytes)?;
            if !filter.matches(&doc) {
                continue;
            }

            let mut updated = match doc.clone() {
                Value::Object(obj) => obj,
                _ => return Err(StorageError::NotAnObject),
            };
            for (field, value) in set {
                updated.insert(field.clone(), value.clone());
            }
            let updated = Value::Object(updated);
            let modified = if updated != doc {
                tree.insert(key, serde_json::to_vec(&updated)?)?;
                1
            } else {
                0
            };
            return Ok(UpdateResult {
                acknowledged: true,
                matched_count: 1,
                modified_count: modified,
            });
        }
        Ok(UpdateResult {
            acknowledged: true,
            matched_count: 0,
            modified_count: 0,
        })
    }

    pub async fn delete_one(
        &self,
        collection: &str,
        filter: &Filter,
    ) -> Result<DeleteResult, StorageError> {
        let tree = self.tree(collection)?;
        for item in tree.iter() {
            let (key, bytes) = item?;
            let doc: Value = serde_json::from_slice(&bytes)?;
            if filter.matches(&doc) {
                tree.remove(key)?;
                return Ok(DeleteResult {
                    acknowledged: true,
                    deleted_count: 1,
                });
            }
        }
        Ok(DeleteResult {
            acknowledged: true,
            deleted_count: 0,
        })
    }
}

/// Field ordering for sorts: missing sorts before present, numbers compare
/// numerically, strings lexicographically (RFC 3339 timestamps order
/// chronologically this way).
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(x), Some(y)) => match (x, y) {
            (Value::Number(m), Value::Number(n)) => m
                .as_f64()
                .partial_cmp(&n.as_f64())
                .unwrap_or(Ordering::Equal),
            (Value::String(s), Value::String(t)) => s.cmp(t),
            (Value::Bool(p), Value::Bool(q)) => p.cmp(q),
            _ => Ordering::Equal,
        },
    }
}
