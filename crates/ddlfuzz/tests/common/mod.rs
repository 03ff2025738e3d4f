//! Shared test harness: a scripted executor and catalog fixtures.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use ddlfuzz::{SqlError, SqlExecutor};
use ddlfuzz_core::value::{ColumnDef, ColumnKind, ColumnValue};
use ddlfuzz_core::{Catalog, ColId, Index, Table, TableState};

/// A scripted in-memory stand-in for the server.
///
/// Statements matching a registered fragment fail with the registered error;
/// `admin show ddl jobs` returns the scripted history; single-value probes
/// answer by fragment. Everything executed is recorded.
#[derive(Default)]
pub struct MockExecutor {
    executed: Mutex<Vec<String>>,
    failures: Mutex<Vec<(String, SqlError)>>,
    history: Mutex<Vec<Vec<String>>>,
    singles: Mutex<Vec<(String, String)>>,
}

impl MockExecutor {
    pub fn new() -> MockExecutor {
        MockExecutor::default()
    }

    /// Fail any statement containing `fragment` with a server error.
    pub fn fail_on(&self, fragment: &str, code: u16, message: &str) {
        self.failures
            .lock()
            .unwrap()
            .push((fragment.to_string(), SqlError::server(code, message)));
    }

    /// Script the rows `admin show ddl jobs` returns.
    pub fn set_history(&self, rows: Vec<Vec<String>>) {
        *self.history.lock().unwrap() = rows;
    }

    /// Answer single-value probes whose SQL contains `fragment`.
    pub fn set_single(&self, fragment: &str, value: &str) {
        self.singles
            .lock()
            .unwrap()
            .push((fragment.to_string(), value.to_string()));
    }

    /// Every statement executed so far.
    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }

    fn scripted_failure(&self, sql: &str) -> Option<SqlError> {
        self.failures
            .lock()
            .unwrap()
            .iter()
            .find(|(fragment, _)| sql.contains(fragment))
            .map(|(_, err)| err.clone())
    }
}

#[async_trait]
impl SqlExecutor for MockExecutor {
    async fn exec(&self, sql: &str) -> Result<(), SqlError> {
        self.executed.lock().unwrap().push(sql.to_string());
        match self.scripted_failure(sql) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn query(&self, sql: &str) -> Result<Vec<Vec<String>>, SqlError> {
        if let Some(err) = self.scripted_failure(sql) {
            return Err(err);
        }
        if sql == "admin show ddl jobs" {
            return Ok(self.history.lock().unwrap().clone());
        }
        Ok(Vec::new())
    }

    async fn query_single(&self, sql: &str) -> Result<Option<String>, SqlError> {
        if let Some(err) = self.scripted_failure(sql) {
            return Err(err);
        }
        Ok(self
            .singles
            .lock()
            .unwrap()
            .iter()
            .find(|(fragment, _)| sql.contains(fragment))
            .map(|(_, value)| value.clone()))
    }
}

/// A ten-column history row in the server's layout.
pub fn job_row(
    id: i64,
    db: &str,
    table: &str,
    job_type: &str,
    schema_id: &str,
    table_id: &str,
    state: &str,
) -> Vec<String> {
    vec![
        id.to_string(),
        db.to_string(),
        table.to_string(),
        job_type.to_string(),
        "public".to_string(),
        schema_id.to_string(),
        table_id.to_string(),
        "0".to_string(),
        "2024-01-01 00:00:00.000 +0000 UTC".to_string(),
        state.to_string(),
    ]
}

/// A plain, non-generated column definition.
pub fn plain_def(name: &str, kind: ColumnKind) -> ColumnDef {
    ColumnDef {
        name: name.to_string(),
        kind,
        default: ColumnValue::Null,
        generated: None,
    }
}

/// A table with the given columns, registered in the catalog.
pub fn register_table(catalog: &Catalog, name: &str, cols: &[(&str, ColumnKind)]) -> Arc<Table> {
    let mut state = TableState::new(String::new(), "utf8", "utf8_general_ci");
    for (col, kind) in cols {
        state.push_column_from_def(&plain_def(col, *kind)).unwrap();
    }
    let table = Arc::new(Table::new(name.to_string(), state));
    catalog.tables().insert(Arc::clone(&table));
    table
}

/// Register an index over existing columns and bump their refcounts.
pub fn register_index(table: &Table, name: &str, members: &[&str]) {
    let mut state = table.write();
    let ids: Vec<ColId> = members
        .iter()
        .map(|member| {
            let at = state.position_by_name(member).unwrap();
            state.columns[at].id
        })
        .collect();
    let signature = Index::signature_of(members.iter().copied());
    state.indexes.push(Index {
        name: name.to_string(),
        signature,
        columns: ids.clone(),
    });
    for id in ids {
        state.col_mut(id).unwrap().index_refs += 1;
    }
}

/// Every column's reference count equals the number of live
/// indexes it belongs to.
pub fn assert_refcounts_sound(table: &Table) {
    let state = table.read();
    for col in &state.columns {
        let memberships = state
            .indexes
            .iter()
            .filter(|index| index.columns.contains(&col.id))
            .count() as u32;
        assert_eq!(
            col.index_refs, memberships,
            "column `{}` refcount drifted from its index memberships",
            col.name,
        );
    }
}
