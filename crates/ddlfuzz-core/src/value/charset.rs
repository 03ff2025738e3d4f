//! Character set and collation pairs the fuzzer draws from.

use rand::seq::SliceRandom;
use rand::Rng;

/// Supported `(charset, collate)` pairs.
///
/// The list intentionally includes both `utf8` and `utf8mb4` so the
/// utf8-to-utf8mb4 conversion path of modify-table-charset can fire.
pub const CHARSET_PAIRS: &[(&str, &str)] = &[
    ("utf8", "utf8_general_ci"),
    ("utf8mb4", "utf8mb4_general_ci"),
    ("latin1", "latin1_bin"),
    ("binary", "binary"),
];

/// A uniformly random charset/collation pair.
pub fn pick_random_charset_collate<R: Rng>(rng: &mut R) -> (&'static str, &'static str) {
    *CHARSET_PAIRS.choose(rng).unwrap()
}
