//! Arity-dispatch table: the counting macro and the `FOR_EACH` selectors.
//!
//! `GET_MACRO(_0, .., _N, NAME, ...)` returns its `N + 2`-th argument. The
//! selector passes `_0`, the caller's `m` arguments, then the ladder names from
//! level `N` down to level `0`, so the `NAME` slot lands on level `m`.

use crate::ladder::Ladder;
use crate::model::{ArtifactBuilder, MacroDef, MacroId, MacroRole};
use crate::names::{MacroNames, EXPAND};

/// One `FOR_EACH` macro and the ladder levels it can resolve to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    pub id: MacroId,
    candidates: Vec<MacroId>,
}

impl Selector {
    /// Candidate ladder levels in the order they are listed, highest first
    pub fn candidates(&self) -> &[MacroId] {
        &self.candidates
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchTables {
    pub counter: MacroId,
    pub single: Selector,
    pub pair: Option<Selector>,
}

/// `#define GET_MACRO(_0, _1, .., _N, NAME, ...) NAME`
pub fn build_counter(builder: &mut ArtifactBuilder, names: &MacroNames, max_arity: usize) -> MacroId {
    let params = (0..=max_arity)
        .map(|slot| format!("_{}", slot))
        .chain(["NAME".to_string(), "...".to_string()]);
    builder.emit(
        MacroDef::new(names.get_macro(), MacroRole::Counter)
            .params(params)
            .body("NAME"),
    )
}

pub fn build_selector(
    builder: &mut ArtifactBuilder,
    name: String,
    counter: MacroId,
    expand: MacroId,
    ladder: &Ladder,
) -> Selector {
    let candidates: Vec<MacroId> = ladder.descending().collect();
    let counter_name = builder.arena().get(counter).name.clone();
    let listed = candidates
        .iter()
        .map(|id| builder.arena().get(*id).name.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    let body = format!(
        "{}({}(_0, __VA_ARGS__, {})(ACTION, __VA_ARGS__))",
        EXPAND, counter_name, listed
    );
    let refs = [expand, counter].into_iter().chain(candidates.iter().copied());
    let id = builder.emit(
        MacroDef::new(name, MacroRole::Selector)
            .params(["ACTION", "..."])
            .body(body)
            .refs(refs),
    );

    Selector { id, candidates }
}

pub fn build_tables(
    builder: &mut ArtifactBuilder,
    names: &MacroNames,
    expand: MacroId,
    max_arity: usize,
    single: &Ladder,
    pair: Option<&Ladder>,
) -> DispatchTables {
    let counter = build_counter(builder, names, max_arity);
    let single = build_selector(builder, names.for_each(), counter, expand, single);
    let pair = pair.map(|ladder| build_selector(builder, names.for_each2(), counter, expand, ladder));

    DispatchTables {
        counter,
        single,
        pair,
    }
}
