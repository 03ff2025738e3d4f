//! Property tests for positional column edits.
//!
//! Every positional mutation the appliers perform is replayed here against a
//! plain `Vec<String>` mirror; the shadow table must agree with the mirror
//! after any sequence of edits.

use ddlfuzz_core::value::{ColumnDef, ColumnValue};
use ddlfuzz_core::{Column, ColumnKind, ColumnPos, TableState};
use proptest::prelude::*;

#[derive(Clone, Debug)]
enum Edit {
    InsertFirst,
    InsertLast,
    // Insert after the column at this (modulo-reduced) position.
    InsertAfter(usize),
    // Remove the column at this (modulo-reduced) position.
    Remove(usize),
    // Move the column at `from` to just after the column at `after`.
    MoveAfter { from: usize, after: usize },
}

fn edit_strategy() -> impl Strategy<Value = Edit> {
    prop_oneof![
        Just(Edit::InsertFirst),
        Just(Edit::InsertLast),
        (0usize..32).prop_map(Edit::InsertAfter),
        (0usize..32).prop_map(Edit::Remove),
        (0usize..32, 0usize..32).prop_map(|(from, after)| Edit::MoveAfter { from, after }),
    ]
}

fn plain_def(name: String) -> ColumnDef {
    ColumnDef {
        name,
        kind: ColumnKind::Int,
        default: ColumnValue::Null,
        generated: None,
    }
}

fn fresh_column(state: &mut TableState, name: String) -> Column {
    let id = state.alloc_col();
    Column::from_def(id, &plain_def(name))
}

proptest! {
    #[test]
    fn shadow_matches_mirror(edits in proptest::collection::vec(edit_strategy(), 1..64)) {
        let mut state = TableState::new(String::new(), "utf8", "utf8_general_ci");
        let mut mirror: Vec<String> = Vec::new();
        let mut serial = 0u32;

        for (round, edit) in edits.into_iter().enumerate() {
            let name = format!("col_{round}_{serial}");
            serial += 1;
            match edit {
                Edit::InsertFirst => {
                    let col = fresh_column(&mut state, name.clone());
                    state.insert_column(col, &ColumnPos::First).unwrap();
                    mirror.insert(0, name);
                }
                Edit::InsertLast => {
                    let col = fresh_column(&mut state, name.clone());
                    state.insert_column(col, &ColumnPos::Last).unwrap();
                    mirror.push(name);
                }
                Edit::InsertAfter(at) => {
                    if mirror.is_empty() {
                        continue;
                    }
                    let at = at % mirror.len();
                    let anchor = mirror[at].clone();
                    let col = fresh_column(&mut state, name.clone());
                    state.insert_column(col, &ColumnPos::After(anchor)).unwrap();
                    mirror.insert(at + 1, name);
                }
                Edit::Remove(at) => {
                    if mirror.is_empty() {
                        continue;
                    }
                    let at = at % mirror.len();
                    state.columns.remove(at);
                    mirror.remove(at);
                }
                Edit::MoveAfter { from, after } => {
                    if mirror.len() < 2 {
                        continue;
                    }
                    let from = from % mirror.len();
                    let after = after % mirror.len();
                    // Appliers remove first, then recompute the insert
                    // position against the post-removal sequence.
                    let col = state.columns.remove(from);
                    let moved = mirror.remove(from);
                    let anchor = mirror.get(after.min(mirror.len().saturating_sub(1))).cloned();
                    match anchor {
                        Some(anchor) if !mirror.is_empty() => {
                            state.insert_column(col, &ColumnPos::After(anchor.clone())).unwrap();
                            let at = mirror.iter().position(|n| *n == anchor).unwrap();
                            mirror.insert(at + 1, moved);
                        }
                        _ => {
                            state.insert_column(col, &ColumnPos::Last).unwrap();
                            mirror.push(moved);
                        }
                    }
                }
            }

            let shadow: Vec<String> = state.columns.iter().map(|c| c.name.clone()).collect();
            prop_assert_eq!(&shadow, &mirror);
        }
    }
}
