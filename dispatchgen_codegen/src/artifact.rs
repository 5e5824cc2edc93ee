//! The finished header: arena, layout and persistence.

use std::fs;
use std::path::{Path, PathBuf};

use dispatchgen_types::{GenerateError, GeneratorConfig, PairPolicy, Variant};
use serde::Serialize;
use tracing::info;

use crate::domain::DomainMacros;
use crate::ladder::Ladder;
use crate::model::{ArtifactBuilder, Block, MacroArena};
use crate::selector::DispatchTables;

/// Output of one generation run
#[derive(Debug, Clone)]
pub struct Artifact {
    config: GeneratorConfig,
    arena: MacroArena,
    blocks: Vec<Block>,
    single: Ladder,
    pair: Option<(PairPolicy, Ladder)>,
    tables: DispatchTables,
    domain: DomainMacros,
}

/// Serializable overview of an artifact, logged by the binary
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactSummary {
    pub variant: Variant,
    pub max_arity: usize,
    pub pair_policy: Option<PairPolicy>,
    pub macro_count: usize,
    pub ladder_levels: usize,
    pub pair_ladder_levels: usize,
    pub bytes: usize,
}

impl Artifact {
    pub(crate) fn new(
        config: GeneratorConfig,
        builder: ArtifactBuilder,
        single: Ladder,
        pair: Option<(PairPolicy, Ladder)>,
        tables: DispatchTables,
        domain: DomainMacros,
    ) -> Self {
        let (arena, blocks) = builder.into_parts();
        Self {
            config,
            arena,
            blocks,
            single,
            pair,
            tables,
            domain,
        }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn arena(&self) -> &MacroArena {
        &self.arena
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn ladder(&self) -> &Ladder {
        &self.single
    }

    pub fn pair_ladder(&self) -> Option<&Ladder> {
        self.pair.as_ref().map(|(_, ladder)| ladder)
    }

    pub fn pair_policy(&self) -> Option<PairPolicy> {
        self.pair.as_ref().map(|(policy, _)| *policy)
    }

    pub fn tables(&self) -> &DispatchTables {
        &self.tables
    }

    pub fn domain(&self) -> &DomainMacros {
        &self.domain
    }

    /// Full header text, newline terminated
    pub fn render(&self) -> String {
        let mut out = banner(&self.config);
        out.push('\n');

        for block in &self.blocks {
            match block {
                Block::Def(id) => {
                    let def = self.arena.get(*id);
                    if let Some(doc) = &def.doc {
                        out.push_str("///@brief ");
                        out.push_str(doc);
                        out.push('\n');
                    }
                    out.push_str(&def.render());
                }
                Block::Directive(text) => out.push_str(text),
                Block::Blank => {}
            }
            out.push('\n');
        }

        // A trailing blank block would otherwise leave an empty last line
        while out.ends_with("\n\n") {
            out.pop();
        }
        out
    }

    pub fn summary(&self) -> ArtifactSummary {
        ArtifactSummary {
            variant: self.config.variant,
            max_arity: self.config.max_arity,
            pair_policy: self.pair_policy(),
            macro_count: self.arena.len(),
            ladder_levels: self.single.levels().len(),
            pair_ladder_levels: self.pair_ladder().map_or(0, |ladder| ladder.levels().len()),
            bytes: self.render().len(),
        }
    }

    #[cfg(test)]
    pub(crate) fn arena_mut(&mut self) -> &mut MacroArena {
        &mut self.arena
    }
}

fn banner(config: &GeneratorConfig) -> String {
    format!(
        "///@file rpc_dispatch_helper.hpp\n\
         ///@brief Helper macros for server dispatching of remote function calls\n\
         ///\n\
         ///@note Generated by dispatch_gen ({} variant, max arity {}). Do not edit;\n\
         ///      regenerate with a larger arity when more functions must be attached at once.\n\
         ///\n\
         /// SPDX-License-Identifier: MIT OR Apache-2.0\n",
        config.variant, config.max_arity
    )
}

/// Write the rendered artifact, replacing any previous file at `path`
pub fn write_artifact(path: &Path, artifact: &Artifact) -> Result<PathBuf, GenerateError> {
    let io_err = |source| GenerateError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }

    let text = artifact.render();
    fs::write(path, &text).map_err(io_err)?;

    info!("Dispatch helper written to: {} ({} bytes)", path.display(), text.len());
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate;

    #[test]
    fn test_render_starts_with_banner_then_pragma() {
        let artifact = generate(&GeneratorConfig::for_variant(Variant::Legacy).with_max_arity(2)).unwrap();
        let text = artifact.render();
        assert!(text.starts_with("///@file rpc_dispatch_helper.hpp\n"));
        let pragma = text.find("#pragma once").unwrap();
        assert!(pragma < text.find("#define EXPAND(x) x").unwrap());
        assert!(text.ends_with("\n"));
        assert!(!text.ends_with("\n\n"));
    }

    #[test]
    fn test_docs_precede_their_definition() {
        let artifact = generate(&GeneratorConfig::for_variant(Variant::Classic).with_max_arity(3)).unwrap();
        let text = artifact.render();
        assert!(text.contains(
            "///@brief Attaches multiple functions to the server dispatch function\n#define RPC_ATTACH_FUNCS("
        ));
    }

    #[test]
    fn test_summary_counts_levels() {
        let artifact = generate(&GeneratorConfig::for_variant(Variant::Templated).with_max_arity(6)).unwrap();
        let summary = artifact.summary();
        assert_eq!(summary.ladder_levels, 7);
        assert_eq!(summary.pair_ladder_levels, 7);
        assert_eq!(summary.pair_policy, Some(PairPolicy::HoldFirst));
        assert_eq!(summary.bytes, artifact.render().len());
    }
}
