//! Column kinds, values and randomized column definitions.
//!
//! This module is the column-type library behind the fuzzer: which SQL type a
//! column renders to, which DDL operations a kind is eligible for, and how
//! random values and literals are produced. All randomness flows through a
//! caller-supplied [`rand::Rng`] so a recorded seed reproduces a run.

mod charset;

pub use charset::{pick_random_charset_collate, CHARSET_PAIRS};

use rand::seq::SliceRandom;
use rand::Rng;

/// The fixed set of column kinds the fuzzer generates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum ColumnKind {
    TinyInt,
    SmallInt,
    Int,
    BigInt,
    Float,
    Double,
    Decimal,
    Char,
    Varchar,
    Text,
    Blob,
    TinyBlob,
    MediumBlob,
    LongBlob,
    Date,
    Datetime,
    Timestamp,
    Bool,
}

/// All kinds, in a fixed order so a seeded pick is reproducible.
pub const ALL_KINDS: &[ColumnKind] = &[
    ColumnKind::TinyInt,
    ColumnKind::SmallInt,
    ColumnKind::Int,
    ColumnKind::BigInt,
    ColumnKind::Float,
    ColumnKind::Double,
    ColumnKind::Decimal,
    ColumnKind::Char,
    ColumnKind::Varchar,
    ColumnKind::Text,
    ColumnKind::Blob,
    ColumnKind::TinyBlob,
    ColumnKind::MediumBlob,
    ColumnKind::LongBlob,
    ColumnKind::Date,
    ColumnKind::Datetime,
    ColumnKind::Timestamp,
    ColumnKind::Bool,
];

/// The integer widening chain used by modify-column.
const INT_CHAIN: &[ColumnKind] = &[
    ColumnKind::TinyInt,
    ColumnKind::SmallInt,
    ColumnKind::Int,
    ColumnKind::BigInt,
];

impl ColumnKind {
    /// SQL type text for column definitions.
    pub fn sql_type(self) -> &'static str {
        match self {
            ColumnKind::TinyInt => "tinyint",
            ColumnKind::SmallInt => "smallint",
            ColumnKind::Int => "int",
            ColumnKind::BigInt => "bigint",
            ColumnKind::Float => "float",
            ColumnKind::Double => "double",
            ColumnKind::Decimal => "decimal(12,6)",
            ColumnKind::Char => "char(32)",
            ColumnKind::Varchar => "varchar(64)",
            ColumnKind::Text => "text",
            ColumnKind::Blob => "blob",
            ColumnKind::TinyBlob => "tinyblob",
            ColumnKind::MediumBlob => "mediumblob",
            ColumnKind::LongBlob => "longblob",
            ColumnKind::Date => "date",
            ColumnKind::Datetime => "datetime",
            ColumnKind::Timestamp => "timestamp",
            ColumnKind::Bool => "boolean",
        }
    }

    /// Whether the kind belongs to the BLOB family.
    pub fn is_blob_family(self) -> bool {
        matches!(
            self,
            ColumnKind::Blob | ColumnKind::TinyBlob | ColumnKind::MediumBlob | ColumnKind::LongBlob
        )
    }

    /// Whether a column of this kind may be an index member without a prefix
    /// length.
    pub fn can_be_index(self) -> bool {
        !self.is_blob_family() && self != ColumnKind::Text
    }

    /// Whether a column of this kind may participate in a primary key.
    pub fn can_be_primary(self) -> bool {
        matches!(
            self,
            ColumnKind::TinyInt
                | ColumnKind::SmallInt
                | ColumnKind::Int
                | ColumnKind::BigInt
                | ColumnKind::Char
                | ColumnKind::Varchar
                | ColumnKind::Date
                | ColumnKind::Datetime
                | ColumnKind::Bool
        )
    }

    /// Whether modify-column may target this kind.
    ///
    /// Restricted to the integer widening chain: wider conversions make the
    /// server's accept/reject behavior version-dependent, which would poison
    /// the outcome comparison.
    pub fn can_be_modified(self) -> bool {
        INT_CHAIN.contains(&self)
    }

    /// Whether a column of this kind may carry a `DEFAULT` clause.
    pub fn can_have_default(self) -> bool {
        !self.is_blob_family() && self != ColumnKind::Text
    }

    /// A random kind at or after `self` in the widening chain.
    ///
    /// Only meaningful for kinds where [`ColumnKind::can_be_modified`] holds.
    pub fn widened<R: Rng>(self, rng: &mut R) -> ColumnKind {
        match INT_CHAIN.iter().position(|k| *k == self) {
            Some(at) => INT_CHAIN[rng.gen_range(at..INT_CHAIN.len())],
            None => self,
        }
    }

    /// A random value of this kind.
    pub fn random_value<R: Rng>(self, rng: &mut R) -> ColumnValue {
        match self {
            ColumnKind::TinyInt => ColumnValue::Int(rng.gen_range(-128..=127)),
            ColumnKind::SmallInt => ColumnValue::Int(rng.gen_range(-32_768..=32_767)),
            ColumnKind::Int => ColumnValue::Int(rng.gen_range(-2_147_483_648..=2_147_483_647)),
            ColumnKind::BigInt => ColumnValue::Int(rng.gen()),
            ColumnKind::Float | ColumnKind::Double | ColumnKind::Decimal => {
                // Keep the magnitude printable without scientific notation.
                ColumnValue::Float((rng.gen_range(-1_000_000.0..1_000_000.0f64) * 1e3).round() / 1e3)
            }
            ColumnKind::Char | ColumnKind::Varchar => {
                ColumnValue::Str(random_alnum(rng, 1, 16))
            }
            ColumnKind::Text => ColumnValue::Str(random_alnum(rng, 1, 64)),
            ColumnKind::Blob | ColumnKind::TinyBlob | ColumnKind::MediumBlob | ColumnKind::LongBlob => {
                let len = rng.gen_range(1..=16);
                ColumnValue::Bytes((0..len).map(|_| rng.gen()).collect())
            }
            ColumnKind::Date => ColumnValue::Str(random_date(rng)),
            ColumnKind::Datetime | ColumnKind::Timestamp => ColumnValue::Str(random_datetime(rng)),
            ColumnKind::Bool => ColumnValue::Bool(rng.gen()),
        }
    }
}

/// A concrete value a column can hold, used for default values and shadow
/// rows.
#[derive(Clone, Debug, PartialEq)]
#[allow(missing_docs)]
pub enum ColumnValue {
    Null,
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    Bool(bool),
}

impl ColumnValue {
    /// Render the value as a SQL literal.
    pub fn literal(&self) -> String {
        match self {
            ColumnValue::Null => "NULL".to_string(),
            ColumnValue::Int(v) => v.to_string(),
            ColumnValue::Float(v) => format!("{v}"),
            ColumnValue::Str(v) => format!("'{}'", v.replace('\'', "''")),
            ColumnValue::Bytes(v) => {
                let mut out = String::with_capacity(3 + v.len() * 2);
                out.push_str("x'");
                for b in v {
                    out.push_str(&format!("{b:02x}"));
                }
                out.push('\'');
                out
            }
            ColumnValue::Bool(v) => if *v { "TRUE" } else { "FALSE" }.to_string(),
        }
    }

    /// Whether the value is SQL NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, ColumnValue::Null)
    }
}

/// The blueprint of a column before it exists in any table: everything a
/// CREATE TABLE or ADD COLUMN statement needs to render it, and everything an
/// applier needs to instantiate it.
#[derive(Clone, Debug)]
pub struct ColumnDef {
    /// Column name (universally unique).
    pub name: String,
    /// Column kind.
    pub kind: ColumnKind,
    /// Default value; `Null` when the kind cannot carry a default.
    pub default: ColumnValue,
    /// For a generated column, the name of the base column and the generation
    /// expression.
    pub generated: Option<GeneratedDef>,
}

/// Generation clause of a generated column.
#[derive(Clone, Debug)]
pub struct GeneratedDef {
    /// Name of the column the expression reads.
    pub base: String,
    /// The expression text, referencing `base` in backticks.
    pub expr: String,
}

impl ColumnDef {
    /// A random non-generated column definition.
    pub fn random<R: Rng>(rng: &mut R) -> ColumnDef {
        let kind = *ALL_KINDS.choose(rng).unwrap();
        let default = if kind.can_have_default() {
            kind.random_value(rng)
        } else {
            ColumnValue::Null
        };
        ColumnDef {
            name: unique_name(rng),
            kind,
            default,
            generated: None,
        }
    }

    /// A random set of column definitions for a new table.
    ///
    /// Occasionally emits a generated column immediately after its base so
    /// that dependency edges get exercised.
    pub fn random_set<R: Rng>(rng: &mut R, count: usize) -> Vec<ColumnDef> {
        let mut defs = Vec::with_capacity(count + 1);
        for _ in 0..count {
            let def = ColumnDef::random(rng);
            let base_kind = def.kind;
            let base_name = def.name.clone();
            defs.push(def);
            if rng.gen_bool(0.2) {
                if let Some(gen) = GeneratedDef::derive(base_kind, &base_name) {
                    defs.push(ColumnDef {
                        name: unique_name(rng),
                        kind: gen.0,
                        default: ColumnValue::Null,
                        generated: Some(gen.1),
                    });
                }
            }
        }
        defs
    }

    /// The SQL fragment after the column name in a definition list, e.g.
    /// `bigint DEFAULT 42` or `varchar(64) AS (upper(`c`))`.
    pub fn definition(&self) -> String {
        let mut out = self.kind.sql_type().to_string();
        if let Some(gen) = &self.generated {
            out.push_str(&format!(" AS ({})", gen.expr));
        } else if self.kind.can_have_default() && !self.default.is_null() {
            out.push_str(&format!(" DEFAULT {}", self.default.literal()));
        }
        out
    }
}

impl GeneratedDef {
    /// A generated-column kind and clause derived from a base column, or
    /// `None` when the base kind has no usable expression.
    fn derive(base_kind: ColumnKind, base_name: &str) -> Option<(ColumnKind, GeneratedDef)> {
        match base_kind {
            ColumnKind::TinyInt | ColumnKind::SmallInt | ColumnKind::Int | ColumnKind::BigInt => {
                Some((
                    ColumnKind::BigInt,
                    GeneratedDef {
                        base: base_name.to_string(),
                        expr: format!("`{base_name}` + 1"),
                    },
                ))
            }
            ColumnKind::Char | ColumnKind::Varchar => Some((
                ColumnKind::Varchar,
                GeneratedDef {
                    base: base_name.to_string(),
                    expr: format!("upper(`{base_name}`)"),
                },
            )),
            _ => None,
        }
    }
}

/// A universally unique entity name drawn from the caller's rng, so names are
/// collision-free without a search yet still reproduce from a seed.
pub fn unique_name<R: Rng>(rng: &mut R) -> String {
    uuid::Builder::from_random_bytes(rng.gen()).into_uuid().to_string()
}

fn random_alnum<R: Rng>(rng: &mut R, min: usize, max: usize) -> String {
    const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
    let len = rng.gen_range(min..=max);
    (0..len)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

fn random_date<R: Rng>(rng: &mut R) -> String {
    // Day capped at 28 so every generated date is valid in every month.
    format!(
        "{:04}-{:02}-{:02}",
        rng.gen_range(1990..=2030),
        rng.gen_range(1..=12),
        rng.gen_range(1..=28)
    )
}

fn random_datetime<R: Rng>(rng: &mut R) -> String {
    format!(
        "{} {:02}:{:02}:{:02}",
        random_date(rng),
        rng.gen_range(0..24),
        rng.gen_range(0..60),
        rng.gen_range(0..60)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn blob_family_is_not_indexable_and_has_no_default() {
        for kind in [
            ColumnKind::Blob,
            ColumnKind::TinyBlob,
            ColumnKind::MediumBlob,
            ColumnKind::LongBlob,
            ColumnKind::Text,
        ] {
            assert!(!kind.can_be_index());
            assert!(!kind.can_have_default());
            assert!(!kind.can_be_primary());
        }
    }

    #[test]
    fn widening_never_narrows() {
        let mut rng = StdRng::seed_from_u64(3);
        let rank = |k: ColumnKind| INT_CHAIN.iter().position(|c| *c == k).unwrap();
        for _ in 0..256 {
            for kind in INT_CHAIN {
                let widened = kind.widened(&mut rng);
                assert!(rank(widened) >= rank(*kind));
            }
        }
        // Non-integer kinds stay put.
        assert_eq!(ColumnKind::Varchar.widened(&mut rng), ColumnKind::Varchar);
    }

    #[test]
    fn literals_render_sql() {
        assert_eq!(ColumnValue::Null.literal(), "NULL");
        assert_eq!(ColumnValue::Int(-5).literal(), "-5");
        assert_eq!(ColumnValue::Str("a'b".into()).literal(), "'a''b'");
        assert_eq!(ColumnValue::Bytes(vec![0xab, 0x01]).literal(), "x'ab01'");
        assert_eq!(ColumnValue::Bool(true).literal(), "TRUE");
    }

    #[test]
    fn random_defs_are_unique_and_reproducible() {
        let defs_a = ColumnDef::random_set(&mut StdRng::seed_from_u64(11), 8);
        let defs_b = ColumnDef::random_set(&mut StdRng::seed_from_u64(11), 8);
        assert_eq!(defs_a.len(), defs_b.len());
        for (a, b) in defs_a.iter().zip(&defs_b) {
            assert_eq!(a.name, b.name);
            assert_eq!(a.kind, b.kind);
        }
        let mut names: Vec<_> = defs_a.iter().map(|d| d.name.clone()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), defs_a.len());
    }

    #[test]
    fn generated_defs_reference_their_base() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..64 {
            for def in ColumnDef::random_set(&mut rng, 4) {
                if let Some(gen) = &def.generated {
                    assert!(gen.expr.contains(&gen.base));
                    assert!(def.definition().contains(" AS ("));
                }
            }
        }
    }
}
