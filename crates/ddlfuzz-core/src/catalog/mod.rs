//! The shadow catalog: an in-memory mirror of the server's schema state.
//!
//! # Locking
//!
//! The catalog holds one coarse mutex per entity map (schemas, tables, views)
//! and each table carries its own reader-writer lock over columns and indexes.
//! Lock order is always catalog map first, then table state, never the
//! reverse. Preparers hold locks only while choosing a target and
//! synthesizing a statement; appliers retake them when the server's verdict
//! is in.
//!
//! # Tombstones vs membership
//!
//! Preparers consult tombstone flags (`is_deleted`/`is_renamed`) so they do
//! not pick a target an in-flight statement is about to destroy. Appliers
//! consult *membership*, whether the entity is still in its map, because a
//! prior applier of the same batch may have removed it. Both views coexist:
//! a tombstoned table stays in the map until its drop commits.

mod column;
mod schema;
mod table;
mod view;

pub use column::{ColId, Column};
pub use schema::Schema;
pub use table::{ColumnPos, Index, Table, TableState};
pub use view::View;

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use rand::Rng;

/// Anything the catalog stores under a unique name with a tombstone flag.
pub trait Entity {
    /// Unique entity name.
    fn name(&self) -> &str;
    /// Whether the entity has been condemned by an in-flight drop.
    fn is_tombstoned(&self) -> bool;
}

impl Entity for Schema {
    fn name(&self) -> &str {
        Schema::name(self)
    }
    fn is_tombstoned(&self) -> bool {
        self.is_deleted()
    }
}

impl Entity for Table {
    fn name(&self) -> &str {
        Table::name(self)
    }
    fn is_tombstoned(&self) -> bool {
        self.is_deleted()
    }
}

impl Entity for View {
    fn name(&self) -> &str {
        View::name(self)
    }
    fn is_tombstoned(&self) -> bool {
        false
    }
}

/// A name-keyed map of shared entities with uniform random picks over the
/// live (non-tombstoned) subset.
///
/// Backed by a `BTreeMap` so iteration order, and therefore seeded picks,
/// are reproducible across runs.
#[derive(Debug)]
pub struct NameMap<T: Entity> {
    entries: BTreeMap<String, Arc<T>>,
}

impl<T: Entity> NameMap<T> {
    fn new() -> NameMap<T> {
        NameMap { entries: BTreeMap::new() }
    }

    /// Register an entity under its own name.
    pub fn insert(&mut self, entity: Arc<T>) {
        self.entries.insert(entity.name().to_string(), entity);
    }

    /// Remove and return the entity registered under `name`.
    pub fn remove(&mut self, name: &str) -> Option<Arc<T>> {
        self.entries.remove(name)
    }

    /// Whether an entity is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Shared handle to the entity registered under `name`.
    pub fn get(&self, name: &str) -> Option<Arc<T>> {
        self.entries.get(name).cloned()
    }

    /// Total number of registered entities, tombstoned included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of live entities.
    pub fn live_count(&self) -> usize {
        self.entries.values().filter(|e| !e.is_tombstoned()).count()
    }

    /// A uniformly random live entity.
    pub fn pick_random<R: Rng>(&self, rng: &mut R) -> Option<Arc<T>> {
        let live: Vec<&Arc<T>> = self.entries.values().filter(|e| !e.is_tombstoned()).collect();
        if live.is_empty() {
            None
        } else {
            Some(Arc::clone(live[rng.gen_range(0..live.len())]))
        }
    }

    /// Iterate over every registered entity.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<T>> {
        self.entries.values()
    }
}

/// The global shadow catalog.
#[derive(Debug)]
pub struct Catalog {
    schemas: Mutex<NameMap<Schema>>,
    tables: Mutex<NameMap<Table>>,
    views: Mutex<NameMap<View>>,
}

impl Default for Catalog {
    fn default() -> Catalog {
        Catalog::new()
    }
}

impl Catalog {
    /// An empty catalog.
    pub fn new() -> Catalog {
        Catalog {
            schemas: Mutex::new(NameMap::new()),
            tables: Mutex::new(NameMap::new()),
            views: Mutex::new(NameMap::new()),
        }
    }

    /// Lock and access the schema map.
    pub fn schemas(&self) -> MutexGuard<'_, NameMap<Schema>> {
        self.schemas.lock().unwrap()
    }

    /// Lock and access the table map.
    pub fn tables(&self) -> MutexGuard<'_, NameMap<Table>> {
        self.tables.lock().unwrap()
    }

    /// Lock and access the view map.
    pub fn views(&self) -> MutexGuard<'_, NameMap<View>> {
        self.views.lock().unwrap()
    }

    /// A uniformly random live schema.
    pub fn pick_random_schema<R: Rng>(&self, rng: &mut R) -> Option<Arc<Schema>> {
        self.schemas().pick_random(rng)
    }

    /// A uniformly random live table.
    pub fn pick_random_table<R: Rng>(&self, rng: &mut R) -> Option<Arc<Table>> {
        self.tables().pick_random(rng)
    }

    /// Whether the table has been removed from the catalog (as opposed to
    /// merely tombstoned).
    pub fn is_table_removed(&self, table: &Table) -> bool {
        !self.tables().contains(table.name())
    }

    /// Whether the schema has been removed from the catalog.
    pub fn is_schema_removed(&self, schema: &Schema) -> bool {
        !self.schemas().contains(schema.name())
    }
}
