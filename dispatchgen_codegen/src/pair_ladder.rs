//! Dual-argument expansion ladder (`FE2_0 ..= FE2_N`).
//!
//! Levels 0 and 1 expand to nothing, level 2 applies `WHAT(X, Y)`. From level 3
//! on, the [`PairPolicy`] decides the recursion:
//!
//! * `HoldFirst` keeps `X` and descends one level, so `FE2_4(W, F, a, b, c)`
//!   yields `W(F, a) W(F, b) W(F, c)`.
//! * `AdvanceBoth` drops the pair and descends two levels, so
//!   `FE2_4(W, f, a, g, b)` yields `W(f, a) W(g, b)`.

use dispatchgen_types::PairPolicy;

use crate::ladder::Ladder;
use crate::model::{ArtifactBuilder, MacroDef, MacroId, MacroRole};
use crate::names::{MacroNames, EXPAND};

pub fn build_pair_ladder(
    builder: &mut ArtifactBuilder,
    names: &MacroNames,
    expand: MacroId,
    max_arity: usize,
    policy: PairPolicy,
) -> Ladder {
    let mut levels: Vec<MacroId> = Vec::with_capacity(max_arity + 1);

    levels.push(builder.emit(
        MacroDef::new(names.fe2(0), MacroRole::PairLadder { level: 0 }).params(["WHAT"]),
    ));

    if max_arity >= 1 {
        levels.push(builder.emit(
            MacroDef::new(names.fe2(1), MacroRole::PairLadder { level: 1 }).params(["WHAT", "X"]),
        ));
    }

    if max_arity >= 2 {
        levels.push(builder.emit(
            MacroDef::new(names.fe2(2), MacroRole::PairLadder { level: 2 })
                .params(["WHAT", "X", "Y"])
                .body("WHAT(X, Y)"),
        ));
    }

    for level in 3..=max_arity {
        let next = level - policy.step();
        let rest = match policy {
            PairPolicy::HoldFirst => "WHAT, X, __VA_ARGS__",
            PairPolicy::AdvanceBoth => "WHAT, __VA_ARGS__",
        };
        let def = MacroDef::new(names.fe2(level), MacroRole::PairLadder { level })
            .params(["WHAT", "X", "Y", "..."])
            .body(format!(
                "{}(WHAT(X, Y){}({}))",
                EXPAND,
                names.fe2(next),
                rest
            ))
            .refs([expand, levels[next]]);
        levels.push(builder.emit(def));
    }

    Ladder::from_levels(levels)
}
