//! Schema (database) entities of the shadow catalog.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// A shadow schema.
///
/// Schemas are churn objects: the fuzzer creates and drops them alongside the
/// working database, but never places tables inside them.
#[derive(Debug)]
pub struct Schema {
    name: String,
    /// Character set the schema was created with.
    pub charset: String,
    /// Collation the schema was created with.
    pub collate: String,
    server_id: Mutex<String>,
    deleted: AtomicBool,
}

impl Schema {
    /// A new live schema.
    pub fn new(name: String, charset: &str, collate: &str) -> Schema {
        Schema {
            name,
            charset: charset.to_string(),
            collate: collate.to_string(),
            server_id: Mutex::new(String::new()),
            deleted: AtomicBool::new(false),
        }
    }

    /// Schema name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Server-assigned schema id; empty until the order oracle stamps it.
    pub fn server_id(&self) -> String {
        self.server_id.lock().unwrap().clone()
    }

    /// Stamp the server-assigned schema id.
    pub fn set_server_id(&self, id: &str) {
        *self.server_id.lock().unwrap() = id.to_string();
    }

    /// Tombstone check.
    pub fn is_deleted(&self) -> bool {
        self.deleted.load(Ordering::SeqCst)
    }

    /// Mark the schema condemned by an in-flight drop. Idempotent.
    pub fn set_deleted(&self) {
        self.deleted.store(true, Ordering::SeqCst);
    }
}
