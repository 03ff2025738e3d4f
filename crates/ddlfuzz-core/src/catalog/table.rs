//! Table entities of the shadow catalog.

use std::fmt::Write as _;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

use rand::Rng;

use crate::catalog::column::{ColId, Column};
use crate::error::{Error, Result};
use crate::value::ColumnDef;

/// One index of a shadow table.
///
/// Member columns are referenced by id; the signature is the canonical
/// concatenation of the member names at creation time and is unique among a
/// table's live indexes.
#[derive(Clone, Debug)]
pub struct Index {
    /// Index name.
    pub name: String,
    /// Canonical concatenation of member column names.
    pub signature: String,
    /// Member column ids, in index order. Never empty.
    pub columns: Vec<ColId>,
}

impl Index {
    /// Canonical signature over an ordered list of member names.
    pub fn signature_of<'a>(names: impl IntoIterator<Item = &'a str>) -> String {
        let mut out = String::new();
        for name in names {
            out.push_str(name);
            out.push(',');
        }
        out
    }
}

/// Where to insert a column.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ColumnPos {
    /// Before every other column (`FIRST`).
    First,
    /// After every other column (no clause).
    Last,
    /// Immediately after the named column (`AFTER` ... ).
    After(String),
}

/// The lock-protected, mutable part of a table: columns, indexes and the
/// scalar attributes DDL can touch.
#[derive(Debug)]
pub struct TableState {
    next_col: u32,
    /// Ordered columns. Entries may carry tombstone flags until the
    /// corresponding drop commits.
    pub columns: Vec<Column>,
    /// Live indexes.
    pub indexes: Vec<Index>,
    /// Number of shadow rows.
    pub row_count: usize,
    /// Table comment.
    pub comment: String,
    /// Table character set.
    pub charset: String,
    /// Table collation.
    pub collate: String,
    /// `SHARD_ROW_ID_BITS` value last applied.
    pub shard_row_bits: u32,
    /// Auto-increment cursor as last observed from the server.
    pub auto_inc: i64,
}

impl TableState {
    /// Fresh state with no columns.
    pub fn new(comment: String, charset: &str, collate: &str) -> TableState {
        TableState {
            next_col: 0,
            columns: Vec::new(),
            indexes: Vec::new(),
            row_count: 0,
            comment,
            charset: charset.to_string(),
            collate: collate.to_string(),
            shard_row_bits: 0,
            auto_inc: 0,
        }
    }

    /// Allocate a fresh column id. Ids are never reused.
    pub fn alloc_col(&mut self) -> ColId {
        let id = ColId(self.next_col);
        self.next_col += 1;
        id
    }

    /// Instantiate a blueprint at the end of the column list, wiring the
    /// dependency edge when the blueprint is generated.
    ///
    /// Returns the id of the new column. Fails when a generated blueprint
    /// names a base column that does not exist.
    pub fn push_column_from_def(&mut self, def: &ColumnDef) -> Result<ColId> {
        let id = self.alloc_col();
        let mut col = Column::from_def(id, def);
        if let Some(gen) = &def.generated {
            let base = self
                .position_by_name(&gen.base)
                .ok_or_else(|| Error::ColumnNotExists {
                    table: String::new(),
                    column: gen.base.clone(),
                })?;
            let base_id = self.columns[base].id;
            col.depends_on = Some(base_id);
            self.columns[base].dependents.push(id);
        }
        self.columns.push(col);
        Ok(id)
    }

    /// Position of a column by id.
    pub fn position(&self, id: ColId) -> Option<usize> {
        self.columns.iter().position(|c| c.id == id)
    }

    /// Position of a column by name.
    pub fn position_by_name(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Shared access to a column by id.
    pub fn col(&self, id: ColId) -> Option<&Column> {
        self.columns.iter().find(|c| c.id == id)
    }

    /// Exclusive access to a column by id.
    pub fn col_mut(&mut self, id: ColId) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.id == id)
    }

    /// Number of columns a preparer may still pick.
    pub fn pickable_count(&self) -> usize {
        self.columns.iter().filter(|c| c.is_pickable()).count()
    }

    /// A uniformly random pickable column, as `(position, id)`.
    pub fn pick_random_column<R: Rng>(&self, rng: &mut R) -> Option<(usize, ColId)> {
        let live: Vec<(usize, ColId)> = self
            .columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_pickable())
            .map(|(at, c)| (at, c.id))
            .collect();
        if live.is_empty() {
            None
        } else {
            Some(live[rng.gen_range(0..live.len())])
        }
    }

    /// Insert an instantiated column at the given position.
    pub fn insert_column(&mut self, col: Column, pos: &ColumnPos) -> Result<()> {
        match pos {
            ColumnPos::First => self.columns.insert(0, col),
            ColumnPos::Last => self.columns.push(col),
            ColumnPos::After(name) => {
                let at = self
                    .position_by_name(name)
                    .ok_or_else(|| Error::ColumnNotExists {
                        table: String::new(),
                        column: name.clone(),
                    })?;
                self.columns.insert(at + 1, col);
            }
        }
        Ok(())
    }

    /// Position of an index by name.
    pub fn index_position(&self, name: &str) -> Option<usize> {
        self.indexes.iter().position(|i| i.name == name)
    }

    /// Whether any live index carries this signature.
    pub fn has_index_signature(&self, signature: &str) -> bool {
        self.indexes.iter().any(|i| i.signature == signature)
    }

    /// Whether any column belongs to the BLOB family.
    pub fn has_blob_column(&self) -> bool {
        self.columns.iter().any(|c| c.kind.is_blob_family())
    }

    /// Human-readable dump of the table for failure diagnostics.
    pub fn debug_dump(&self, table_name: &str) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "table `{table_name}` rows={} charset={} collate={} shard_row_bits={} auto_inc={} comment={:?}",
            self.row_count, self.charset, self.collate, self.shard_row_bits, self.auto_inc, self.comment,
        );
        for (at, col) in self.columns.iter().enumerate() {
            let _ = writeln!(
                out,
                "  col[{at}] {} `{}` {} pk={} refs={} default={} generated={:?} deleted={} renamed={}",
                col.id,
                col.name,
                col.kind.sql_type(),
                col.primary_key,
                col.index_refs,
                col.default.literal(),
                col.generated_expr,
                col.is_deleted(),
                col.is_renamed(),
            );
        }
        for idx in &self.indexes {
            let _ = writeln!(out, "  index `{}` signature={:?} members={:?}", idx.name, idx.signature, idx.columns);
        }
        out
    }
}

/// A shadow table.
///
/// The name and identity of a `Table` are immutable; a rename produces a new
/// `Table` object sharing the same [`TableState`], while the old one is
/// tombstoned so in-flight tasks holding it observe the disappearance.
#[derive(Debug)]
pub struct Table {
    name: String,
    server_id: Mutex<String>,
    deleted: AtomicBool,
    state: Arc<RwLock<TableState>>,
}

impl Table {
    /// A new table owning the given state.
    pub fn new(name: String, state: TableState) -> Table {
        Table {
            name,
            server_id: Mutex::new(String::new()),
            deleted: AtomicBool::new(false),
            state: Arc::new(RwLock::new(state)),
        }
    }

    /// Table name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Server-assigned table id; empty until the order oracle stamps it.
    pub fn server_id(&self) -> String {
        self.server_id.lock().unwrap().clone()
    }

    /// Stamp the server-assigned table id.
    pub fn set_server_id(&self, id: &str) {
        *self.server_id.lock().unwrap() = id.to_string();
    }

    /// Tombstone check.
    pub fn is_deleted(&self) -> bool {
        self.deleted.load(Ordering::SeqCst)
    }

    /// Mark the table condemned by an in-flight drop/rename. Idempotent.
    pub fn set_deleted(&self) {
        self.deleted.store(true, Ordering::SeqCst);
    }

    /// Shared access to the table state.
    pub fn read(&self) -> RwLockReadGuard<'_, TableState> {
        self.state.read().unwrap()
    }

    /// Exclusive access to the table state.
    pub fn write(&self) -> RwLockWriteGuard<'_, TableState> {
        self.state.write().unwrap()
    }

    /// The successor object of a rename: a live table under the new name that
    /// shares this table's state and server id.
    pub fn renamed_clone(&self, new_name: String) -> Table {
        Table {
            name: new_name,
            server_id: Mutex::new(self.server_id()),
            deleted: AtomicBool::new(false),
            state: Arc::clone(&self.state),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{ColumnKind, ColumnValue};

    fn def(name: &str, kind: ColumnKind) -> ColumnDef {
        ColumnDef {
            name: name.to_string(),
            kind,
            default: ColumnValue::Null,
            generated: None,
        }
    }

    #[test]
    fn positional_inserts() {
        let mut state = TableState::new(String::new(), "utf8", "utf8_general_ci");
        state.push_column_from_def(&def("a", ColumnKind::Int)).unwrap();
        state.push_column_from_def(&def("b", ColumnKind::Int)).unwrap();

        let id = state.alloc_col();
        state
            .insert_column(Column::from_def(id, &def("c", ColumnKind::Int)), &ColumnPos::First)
            .unwrap();
        let id = state.alloc_col();
        state
            .insert_column(
                Column::from_def(id, &def("d", ColumnKind::Int)),
                &ColumnPos::After("a".to_string()),
            )
            .unwrap();
        let names: Vec<_> = state.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["c", "a", "d", "b"]);

        let id = state.alloc_col();
        let err = state
            .insert_column(
                Column::from_def(id, &def("e", ColumnKind::Int)),
                &ColumnPos::After("missing".to_string()),
            )
            .unwrap_err();
        assert!(matches!(err, Error::ColumnNotExists { .. }));
    }

    #[test]
    fn generated_defs_wire_edges() {
        let mut state = TableState::new(String::new(), "utf8", "utf8_general_ci");
        let base = state.push_column_from_def(&def("base", ColumnKind::Int)).unwrap();
        let gen = state
            .push_column_from_def(&ColumnDef {
                name: "gen".to_string(),
                kind: ColumnKind::BigInt,
                default: ColumnValue::Null,
                generated: Some(crate::value::GeneratedDef {
                    base: "base".to_string(),
                    expr: "`base` + 1".to_string(),
                }),
            })
            .unwrap();
        assert_eq!(state.col(gen).unwrap().depends_on, Some(base));
        assert_eq!(state.col(base).unwrap().dependents, vec![gen]);
    }

    #[test]
    fn renamed_clone_shares_state() {
        let mut state = TableState::new(String::new(), "utf8", "utf8_general_ci");
        state.push_column_from_def(&def("a", ColumnKind::Int)).unwrap();
        let table = Table::new("old".to_string(), state);
        table.set_server_id("41");

        let renamed = table.renamed_clone("new".to_string());
        table.set_deleted();
        assert_eq!(renamed.server_id(), "41");
        assert!(!renamed.is_deleted());

        renamed.write().row_count = 7;
        assert_eq!(table.read().row_count, 7);
    }

    #[test]
    fn signature_is_order_sensitive() {
        assert_eq!(Index::signature_of(["a", "b"]), "a,b,");
        assert_ne!(Index::signature_of(["a", "b"]), Index::signature_of(["b", "a"]));
    }
}
