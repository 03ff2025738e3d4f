//! View entities of the shadow catalog.

use std::sync::Arc;
use std::sync::Mutex;

use crate::catalog::table::Table;

/// A shadow view: a named projection of one table's columns.
#[derive(Debug)]
pub struct View {
    name: String,
    server_id: Mutex<String>,
    /// Projected column names, in select order.
    pub columns: Vec<String>,
    /// The table the view selects from.
    pub table: Arc<Table>,
}

impl View {
    /// A new view projecting `columns` of `table`.
    pub fn new(name: String, columns: Vec<String>, table: Arc<Table>) -> View {
        View {
            name,
            server_id: Mutex::new(String::new()),
            columns,
            table,
        }
    }

    /// View name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Server-assigned id; empty until the order oracle stamps it.
    pub fn server_id(&self) -> String {
        self.server_id.lock().unwrap().clone()
    }

    /// Stamp the server-assigned id.
    pub fn set_server_id(&self, id: &str) {
        *self.server_id.lock().unwrap() = id.to_string();
    }
}
