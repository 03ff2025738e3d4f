//! Classification of benign server errors.
//!
//! A concurrent DDL workload routinely trips errors that say nothing about
//! schema correctness: schema-version churn while a statement was in flight,
//! storage-layer retry hints, or a dropped connection. Statements failing
//! with one of these are dropped without recording an outcome; everything
//! else participates in the oracle comparison.

use crate::executor::SqlError;

/// Server error codes that never indicate a correctness problem.
///
/// 1205 lock wait timeout, 8027/8028 schema-version churn, 9002 storage
/// timeout, 9007 write conflict.
const IGNORABLE_CODES: &[u16] = &[1205, 8027, 8028, 9002, 9007];

/// Message fragments (lowercase) covering transport failures and servers
/// that phrase the retryable cases without a code.
const IGNORABLE_FRAGMENTS: &[&str] = &[
    "information schema is changed",
    "information schema is out of date",
    "tikv server timeout",
    "try again later",
    "connection refused",
    "connection reset",
    "broken pipe",
    "unexpected eof",
    "pool is closed",
];

/// Whether a DDL statement's failure should be ignored rather than recorded.
pub fn ddl_ignorable(err: &SqlError) -> bool {
    if let Some(code) = err.code {
        if IGNORABLE_CODES.contains(&code) {
            return true;
        }
    }
    let message = err.message.to_lowercase();
    IGNORABLE_FRAGMENTS.iter().any(|frag| message.contains(frag))
}
