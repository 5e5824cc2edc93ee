//! Single-argument expansion ladder (`FE_0 ..= FE_N`).

use crate::model::{ArtifactBuilder, MacroDef, MacroId, MacroRole};
use crate::names::{MacroNames, EXPAND};

/// Definitions of one ladder, indexed by level
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ladder {
    levels: Vec<MacroId>,
}

impl Ladder {
    pub(crate) fn from_levels(levels: Vec<MacroId>) -> Self {
        Self { levels }
    }

    pub fn level(&self, level: usize) -> Option<MacroId> {
        self.levels.get(level).copied()
    }

    pub fn levels(&self) -> &[MacroId] {
        &self.levels
    }

    /// Highest level defined
    pub fn top(&self) -> usize {
        self.levels.len().saturating_sub(1)
    }

    /// Levels from the top down to zero, the order the selector lists them in
    pub fn descending(&self) -> impl Iterator<Item = MacroId> + '_ {
        self.levels.iter().rev().copied()
    }
}

/// `#define EXPAND(x) x`
pub fn emit_expand(builder: &mut ArtifactBuilder) -> MacroId {
    builder.emit(
        MacroDef::new(EXPAND, MacroRole::Expand)
            .params(["x"])
            .body("x"),
    )
}

/// Emit levels `0..=max_arity`; level `k >= 2` applies `WHAT` to its first
/// argument and hands the rest to level `k - 1`.
pub fn build_ladder(
    builder: &mut ArtifactBuilder,
    names: &MacroNames,
    expand: MacroId,
    max_arity: usize,
) -> Ladder {
    let mut levels: Vec<MacroId> = Vec::with_capacity(max_arity + 1);

    levels.push(builder.emit(
        MacroDef::new(names.fe(0), MacroRole::Ladder { level: 0 }).params(["WHAT"]),
    ));

    if max_arity >= 1 {
        levels.push(builder.emit(
            MacroDef::new(names.fe(1), MacroRole::Ladder { level: 1 })
                .params(["WHAT", "X"])
                .body("WHAT(X)"),
        ));
    }

    for level in 2..=max_arity {
        let previous = levels[level - 1];
        let def = MacroDef::new(names.fe(level), MacroRole::Ladder { level })
            .params(["WHAT", "X", "..."])
            .body(format!(
                "{}(WHAT(X){}(WHAT, __VA_ARGS__))",
                EXPAND,
                names.fe(level - 1)
            ))
            .refs([expand, previous]);
        levels.push(builder.emit(def));
    }

    Ladder::from_levels(levels)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(max_arity: usize) -> (ArtifactBuilder, Ladder) {
        let mut builder = ArtifactBuilder::new();
        let expand = emit_expand(&mut builder);
        let ladder = build_ladder(&mut builder, &MacroNames::default(), expand, max_arity);
        (builder, ladder)
    }

    #[test]
    fn test_three_levels_plus_base() {
        let (builder, ladder) = build(3);
        let lines: Vec<String> = ladder
            .levels()
            .iter()
            .map(|id| builder.arena().get(*id).render())
            .collect();
        assert_eq!(
            lines,
            vec![
                "#define RPC_FE_0(WHAT)",
                "#define RPC_FE_1(WHAT, X) WHAT(X)",
                "#define RPC_FE_2(WHAT, X, ...) EXPAND(WHAT(X)RPC_FE_1(WHAT, __VA_ARGS__))",
                "#define RPC_FE_3(WHAT, X, ...) EXPAND(WHAT(X)RPC_FE_2(WHAT, __VA_ARGS__))",
            ]
        );
        assert_eq!(ladder.top(), 3);
    }

    #[test]
    fn test_zero_arity_is_base_case_only() {
        let (_, ladder) = build(0);
        assert_eq!(ladder.levels().len(), 1);
        assert_eq!(ladder.top(), 0);
    }

    #[test]
    fn test_each_level_references_only_its_predecessor() {
        let (builder, ladder) = build(8);
        for (level, id) in ladder.levels().iter().enumerate().skip(2) {
            let ladder_refs: Vec<MacroId> = builder
                .arena()
                .get(*id)
                .refs
                .iter()
                .copied()
                .filter(|r| ladder.levels().contains(r))
                .collect();
            assert_eq!(ladder_refs, vec![ladder.levels()[level - 1]]);
        }
    }

    #[test]
    fn test_descending_ends_at_base() {
        let (_, ladder) = build(4);
        let descending: Vec<MacroId> = ladder.descending().collect();
        assert_eq!(descending.first(), ladder.level(4).as_ref());
        assert_eq!(descending.last(), ladder.level(0).as_ref());
    }
}
