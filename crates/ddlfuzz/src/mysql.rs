//! MySQL-protocol implementation of the execution seam.

use async_trait::async_trait;
use mysql_async::prelude::Queryable;
use mysql_async::{Opts, Pool, Value};

use crate::executor::{SqlError, SqlExecutor};

/// A pooled MySQL-protocol connection to the target server.
pub struct MysqlExecutor {
    pool: Pool,
}

impl MysqlExecutor {
    /// Connect a pool from a `mysql://` URL.
    pub fn from_url(url: &str) -> Result<MysqlExecutor, SqlError> {
        let opts = Opts::from_url(url).map_err(|err| SqlError::transport(err.to_string()))?;
        Ok(MysqlExecutor { pool: Pool::new(opts) })
    }

    /// Gracefully close the pool.
    pub async fn disconnect(self) -> Result<(), SqlError> {
        self.pool.disconnect().await.map_err(SqlError::from)
    }
}

impl From<mysql_async::Error> for SqlError {
    fn from(err: mysql_async::Error) -> SqlError {
        match err {
            mysql_async::Error::Server(server) => SqlError::server(server.code, server.message),
            other => SqlError::transport(other.to_string()),
        }
    }
}

/// Widen one wire value to the string form the oracle parses.
fn value_to_string(value: &Value) -> String {
    match value {
        Value::NULL => "NULL".to_string(),
        Value::Bytes(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        Value::Int(v) => v.to_string(),
        Value::UInt(v) => v.to_string(),
        Value::Float(v) => v.to_string(),
        Value::Double(v) => v.to_string(),
        Value::Date(y, mo, d, h, mi, s, us) => {
            if *us == 0 {
                format!("{y:04}-{mo:02}-{d:02} {h:02}:{mi:02}:{s:02}")
            } else {
                format!("{y:04}-{mo:02}-{d:02} {h:02}:{mi:02}:{s:02}.{us:06}")
            }
        }
        Value::Time(neg, d, h, mi, s, us) => {
            let sign = if *neg { "-" } else { "" };
            let hours = u32::from(*h) + d * 24;
            if *us == 0 {
                format!("{sign}{hours:02}:{mi:02}:{s:02}")
            } else {
                format!("{sign}{hours:02}:{mi:02}:{s:02}.{us:06}")
            }
        }
    }
}

#[async_trait]
impl SqlExecutor for MysqlExecutor {
    async fn exec(&self, sql: &str) -> Result<(), SqlError> {
        let mut conn = self.pool.get_conn().await?;
        conn.query_drop(sql).await?;
        Ok(())
    }

    async fn query(&self, sql: &str) -> Result<Vec<Vec<String>>, SqlError> {
        let mut conn = self.pool.get_conn().await?;
        let rows: Vec<mysql_async::Row> = conn.query(sql).await?;
        Ok(rows
            .into_iter()
            .map(|row| row.unwrap().iter().map(value_to_string).collect())
            .collect())
    }

    async fn query_single(&self, sql: &str) -> Result<Option<String>, SqlError> {
        let mut conn = self.pool.get_conn().await?;
        let row: Option<mysql_async::Row> = conn.query_first(sql).await?;
        Ok(row.and_then(|row| row.unwrap().first().map(value_to_string)))
    }
}
