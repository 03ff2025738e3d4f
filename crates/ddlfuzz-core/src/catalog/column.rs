//! Column entities of the shadow catalog.
//!
//! Columns are arena entries inside their table's state: each gets a stable
//! [`ColId`] on allocation, and cross-column relations (generated-column
//! dependencies, index membership) are stored as id pairs rather than shared
//! pointers, so dropping a column is a pure index edit.

use std::fmt;

use crate::value::{ColumnDef, ColumnKind, ColumnValue};

/// Stable identifier of a column within one table.
///
/// Ids survive renames, repositioning and in-place modification; they are
/// never reused after a drop.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ColId(
    /// Allocation counter value within the owning table.
    pub u32,
);

impl fmt::Display for ColId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

/// One column of a shadow table.
#[derive(Clone, Debug)]
pub struct Column {
    /// Stable id within the owning table.
    pub id: ColId,
    /// Column name.
    pub name: String,
    /// Column kind.
    pub kind: ColumnKind,
    /// Whether the column participates in the primary key.
    pub primary_key: bool,
    /// Current default value.
    pub default: ColumnValue,
    /// Shadow row values; kept in lockstep with the table's row count for
    /// non-generated columns, cleared on truncate.
    pub rows: Vec<ColumnValue>,
    /// Number of live indexes this column is a member of.
    pub index_refs: u32,
    /// Generation expression, when the column is generated.
    pub generated_expr: Option<String>,
    /// Id of the column a generated column reads.
    pub depends_on: Option<ColId>,
    /// Ids of generated columns reading this column.
    pub dependents: Vec<ColId>,
    deleted: bool,
    renamed: bool,
}

impl Column {
    /// Instantiate a column from its blueprint.
    ///
    /// Dependency edges for generated columns are wired by the caller, which
    /// is the only place both ids are known.
    pub fn from_def(id: ColId, def: &ColumnDef) -> Column {
        Column {
            id,
            name: def.name.clone(),
            kind: def.kind,
            primary_key: false,
            default: def.default.clone(),
            rows: Vec::new(),
            index_refs: 0,
            generated_expr: def.generated.as_ref().map(|g| g.expr.clone()),
            depends_on: None,
            dependents: Vec::new(),
            deleted: false,
            renamed: false,
        }
    }

    /// Whether the column is generated from another column.
    pub fn is_generated(&self) -> bool {
        self.generated_expr.is_some()
    }

    /// Whether any generated column depends on this one.
    pub fn has_dependents(&self) -> bool {
        !self.dependents.is_empty()
    }

    /// Whether a preparer may pick this column as a target.
    ///
    /// Tombstoned and rename-in-flight columns are skipped so one generation
    /// pass does not stack a second operation onto a doomed target.
    pub fn is_pickable(&self) -> bool {
        !self.deleted && !self.renamed
    }

    /// Tombstone check.
    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    /// Rename-in-flight check.
    pub fn is_renamed(&self) -> bool {
        self.renamed
    }

    /// Mark the column as condemned by an in-flight drop. Idempotent.
    pub fn set_deleted(&mut self) {
        self.deleted = true;
    }

    /// Mark the column as target of an in-flight rename. Idempotent.
    pub fn set_renamed(&mut self) {
        self.renamed = true;
    }

    /// Clear both in-flight marks, making the column pickable again.
    pub fn set_recovered(&mut self) {
        self.deleted = false;
        self.renamed = false;
    }
}
