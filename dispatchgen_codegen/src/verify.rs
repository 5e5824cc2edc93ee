//! Structural checks over a built artifact.
//!
//! The builders already emit definitions in dependency order; these checks read
//! the arena back and reject anything a later edit could break silently.

use std::collections::HashSet;

use dispatchgen_types::GenerateError;

use crate::artifact::Artifact;
use crate::ladder::Ladder;
use crate::model::{MacroArena, MacroId, MacroRole};

fn structure(message: String) -> GenerateError {
    GenerateError::Structure(message)
}

pub fn verify(artifact: &Artifact) -> Result<(), GenerateError> {
    let arena = artifact.arena();
    let max_arity = artifact.config().max_arity;

    check_definition_order(arena)?;
    check_unique_names(arena)?;
    check_ladder(arena, artifact.ladder(), max_arity, 1, 2)?;
    if let (Some(ladder), Some(policy)) = (artifact.pair_ladder(), artifact.pair_policy()) {
        check_ladder(arena, ladder, max_arity, policy.step(), 3)?;
    }

    let tables = artifact.tables();
    check_counter(arena, tables.counter, max_arity)?;
    check_selector(arena, tables.single.id, artifact.ladder())?;
    match (&tables.pair, artifact.pair_ladder()) {
        (Some(selector), Some(ladder)) => check_selector(arena, selector.id, ladder)?,
        (None, None) => {}
        _ => return Err(structure("pair selector and pair ladder disagree".to_string())),
    }
    Ok(())
}

/// Identifiers of a macro body, skipping stringified (`#X`) tokens
fn identifiers(body: &str) -> Vec<&str> {
    let mut found = Vec::new();
    let bytes = body.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i];
        if c.is_ascii_alphabetic() || c == b'_' {
            let start = i;
            while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                i += 1;
            }
            if start == 0 || bytes[start - 1] != b'#' {
                found.push(&body[start..i]);
            }
        } else if c.is_ascii_digit() {
            while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                i += 1;
            }
        } else {
            i += 1;
        }
    }
    found
}

/// Every reference, by id or by name, points at an earlier definition
fn check_definition_order(arena: &MacroArena) -> Result<(), GenerateError> {
    for (id, def) in arena.iter() {
        for r in &def.refs {
            if *r >= id {
                return Err(structure(format!(
                    "{} references {} which is not defined before it",
                    def.name,
                    arena.get(*r).name
                )));
            }
        }

        let used: HashSet<&str> = identifiers(&def.body)
            .into_iter()
            .filter(|ident| !def.params.iter().any(|p| p == ident))
            .collect();

        for ident in &used {
            if let Some(target) = arena.lookup(ident) {
                if target >= id {
                    return Err(structure(format!(
                        "{} uses {} before its definition",
                        def.name, ident
                    )));
                }
            }
        }

        for r in &def.refs {
            let name = arena.get(*r).name.as_str();
            if !used.contains(name) {
                return Err(structure(format!(
                    "{} records a reference to {} that its body never uses",
                    def.name, name
                )));
            }
        }
    }
    Ok(())
}

/// Only the header-function helper may be defined twice, once per build side
fn check_unique_names(arena: &MacroArena) -> Result<(), GenerateError> {
    let mut seen = HashSet::new();
    for (_, def) in arena.iter() {
        if def.role == MacroRole::HeaderFunc {
            continue;
        }
        if !seen.insert(def.name.as_str()) {
            return Err(structure(format!("{} is defined more than once", def.name)));
        }
    }
    Ok(())
}

fn ladder_level(role: MacroRole) -> Option<usize> {
    match role {
        MacroRole::Ladder { level } | MacroRole::PairLadder { level } => Some(level),
        _ => None,
    }
}

/// Level `k` sits at index `k`, and each recursive level references only level `k - step`
fn check_ladder(
    arena: &MacroArena,
    ladder: &Ladder,
    max_arity: usize,
    step: usize,
    first_recursive: usize,
) -> Result<(), GenerateError> {
    if ladder.levels().len() != max_arity + 1 {
        return Err(structure(format!(
            "ladder has {} levels, expected {}",
            ladder.levels().len(),
            max_arity + 1
        )));
    }

    for (level, id) in ladder.levels().iter().enumerate() {
        let def = arena.get(*id);
        if ladder_level(def.role) != Some(level) {
            return Err(structure(format!("{} is not ladder level {}", def.name, level)));
        }

        let ladder_refs: Vec<MacroId> = def
            .refs
            .iter()
            .copied()
            .filter(|r| ladder_level(arena.get(*r).role).is_some())
            .collect();
        let expected: Vec<MacroId> = if level >= first_recursive {
            vec![ladder.levels()[level - step]]
        } else {
            Vec::new()
        };
        if ladder_refs != expected {
            return Err(structure(format!(
                "{} must reference exactly level {} of its ladder",
                def.name,
                level.saturating_sub(step)
            )));
        }
    }
    Ok(())
}

fn check_counter(arena: &MacroArena, counter: MacroId, max_arity: usize) -> Result<(), GenerateError> {
    let def = arena.get(counter);
    let slots = def.named_params().len();
    if def.role != MacroRole::Counter || !def.is_variadic() || slots != max_arity + 2 {
        return Err(structure(format!(
            "{} has {} placeholders, expected {}",
            def.name,
            slots,
            max_arity + 2
        )));
    }
    Ok(())
}

/// Candidates appear in the body in strictly descending level order, ending at level 0
fn check_selector(arena: &MacroArena, selector: MacroId, ladder: &Ladder) -> Result<(), GenerateError> {
    let def = arena.get(selector);
    let levels: Vec<usize> = def
        .refs
        .iter()
        .filter_map(|r| ladder_level(arena.get(*r).role).filter(|_| ladder.levels().contains(r)))
        .collect();

    let descending = levels.windows(2).all(|pair| pair[0] == pair[1] + 1);
    if levels.len() != ladder.levels().len() || !descending || levels.last() != Some(&0) {
        return Err(structure(format!(
            "{} must list levels {}..=0 in descending order, found {:?}",
            def.name,
            ladder.top(),
            levels
        )));
    }

    let listed = ladder
        .descending()
        .map(|id| arena.get(id).name.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    if !def.body.contains(&listed) {
        return Err(structure(format!(
            "{} body does not list its candidates as {}",
            def.name, listed
        )));
    }
    Ok(())
}
