//! Generator for the variadic dispatch helper header.
//!
//! C preprocessors cannot iterate over `__VA_ARGS__`, so the header spells out
//! a ladder of macros, one per arity, plus a selector that counts its arguments
//! by position and picks the matching ladder level. The registration macros a
//! server uses (`RPC_ATTACH_FUNCS`, `RPC_DEFAULT_DISPATCH`, ...) are built on
//! top of that machinery.
//!
//! Generation runs four stages in order, each depending on names produced by
//! the ones before it:
//!
//! 1. [`ladder`]: `FE_0 ..= FE_N`
//! 2. [`pair_ladder`]: `FE2_0 ..= FE2_N`, for variants with alias macros
//! 3. [`selector`]: `GET_MACRO` and the `FOR_EACH` selectors
//! 4. [`domain`]: the user-facing registration macros
//!
//! ```
//! use dispatchgen_codegen::generate;
//! use dispatchgen_types::{GeneratorConfig, Variant};
//!
//! let artifact = generate(&GeneratorConfig::for_variant(Variant::Classic).with_max_arity(3)).unwrap();
//! assert!(artifact.render().contains(
//!     "#define RPC_FOR_EACH(ACTION, ...) EXPAND(RPC_GET_MACRO(_0, __VA_ARGS__, RPC_FE_3, RPC_FE_2, RPC_FE_1, RPC_FE_0)(ACTION, __VA_ARGS__))"
//! ));
//! ```

use std::path::Path;

use dispatchgen_types::{GenerateError, GeneratorConfig};
use tracing::{debug, info};

pub mod artifact;
pub mod domain;
pub mod ladder;
pub mod model;
pub mod names;
pub mod pair_ladder;
pub mod plan;
pub mod profile;
pub mod selector;
pub mod verify;

pub use artifact::{write_artifact, Artifact, ArtifactSummary};
pub use model::{Block, MacroArena, MacroDef, MacroId, MacroRole};
pub use names::MacroNames;
pub use plan::{Branch, DispatchPlan, Group, Shadowed};
pub use profile::VariantProfile;
pub use verify::verify;

use domain::{assemble, emit_header_func};
use ladder::{build_ladder, emit_expand};
use model::ArtifactBuilder;
use pair_ladder::build_pair_ladder;
use profile::{LADDER_GUARD, SERVER_GUARD};
use selector::build_tables;

/// Build and verify the header for `config`
pub fn generate(config: &GeneratorConfig) -> Result<Artifact, GenerateError> {
    config.validate()?;
    if !names::is_valid_prefix(&config.prefix) {
        return Err(GenerateError::InvalidPrefix(config.prefix.clone()));
    }

    let names = MacroNames::new(&config.prefix);
    let profile = VariantProfile::of(config.variant);
    let pair_policy = config.effective_pair_policy();
    let max_arity = config.max_arity;

    info!(
        "Generating {} dispatch helper with max arity {}",
        config.variant, max_arity
    );

    let mut builder = ArtifactBuilder::new();
    builder.directive("#pragma once");
    builder.blank();
    if profile.guarded {
        builder.directive(LADDER_GUARD);
    }

    let expand = emit_expand(&mut builder);
    builder.blank();

    let single = build_ladder(&mut builder, &names, expand, max_arity);
    builder.blank();
    debug!("Stage 1: {} single-argument ladder levels", single.levels().len());

    let pair = pair_policy.map(|policy| {
        let ladder = build_pair_ladder(&mut builder, &names, expand, max_arity, policy);
        builder.blank();
        debug!(
            "Stage 2: {} pair ladder levels ({:?})",
            ladder.levels().len(),
            policy
        );
        (policy, ladder)
    });

    let tables = build_tables(
        &mut builder,
        &names,
        expand,
        max_arity,
        &single,
        pair.as_ref().map(|(_, ladder)| ladder),
    );
    builder.blank();
    debug!(
        "Stage 3: selectors for {} arities",
        tables.single.candidates().len()
    );

    if profile.guarded {
        builder.directive("#endif");
        builder.blank();
        emit_header_func(&mut builder, &names);
        builder.blank();
        builder.directive(SERVER_GUARD);
    }

    let domain = assemble(&mut builder, &names, profile, expand, &tables, pair_policy);

    if profile.guarded {
        builder.directive("#endif");
    }

    let artifact = Artifact::new(config.clone(), builder, single, pair, tables, domain);
    debug!("Stage 4: {} macros in total", artifact.arena().len());

    verify(&artifact)?;
    Ok(artifact)
}

/// Generate for `config` and write the header to `path`
pub fn generate_to_path(config: &GeneratorConfig, path: &Path) -> Result<ArtifactSummary, GenerateError> {
    let artifact = generate(config)?;
    write_artifact(path, &artifact)?;
    Ok(artifact.summary())
}
