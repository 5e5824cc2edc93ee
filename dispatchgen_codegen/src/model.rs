//! Arena of macro definitions.
//!
//! Every emitted `#define` is a [`MacroDef`] record owned by a [`MacroArena`].
//! A definition refers to the macros its body invokes by [`MacroId`], the index
//! of the referenced record, so "defined before use" is simply `ref < self`.

use std::collections::HashMap;

/// Index of a definition inside its arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MacroId(usize);

impl MacroId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// What part of the machinery a definition belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MacroRole {
    Expand,
    Ladder { level: usize },
    PairLadder { level: usize },
    /// Positional counting macro (`GET_MACRO`)
    Counter,
    Selector,
    HeaderFunc,
    Domain,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroDef {
    pub name: String,
    pub params: Vec<String>,
    pub body: String,
    pub refs: Vec<MacroId>,
    pub role: MacroRole,
    pub doc: Option<String>,
}

impl MacroDef {
    pub fn new(name: impl Into<String>, role: MacroRole) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            body: String::new(),
            refs: Vec::new(),
            role,
            doc: None,
        }
    }

    pub fn params<I, S>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.params = params.into_iter().map(Into::into).collect();
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn refs(mut self, refs: impl IntoIterator<Item = MacroId>) -> Self {
        self.refs = refs.into_iter().collect();
        self
    }

    pub fn doc(mut self, doc: Option<&str>) -> Self {
        self.doc = doc.map(String::from);
        self
    }

    pub fn is_variadic(&self) -> bool {
        self.params.last().map(String::as_str) == Some("...")
    }

    /// Formal parameters excluding the trailing `...`
    pub fn named_params(&self) -> &[String] {
        if self.is_variadic() {
            &self.params[..self.params.len() - 1]
        } else {
            &self.params
        }
    }

    /// The `#define` line, without a trailing newline
    pub fn render(&self) -> String {
        let mut line = format!("#define {}({})", self.name, self.params.join(", "));
        if !self.body.is_empty() {
            line.push(' ');
            line.push_str(&self.body);
        }
        line
    }
}

#[derive(Debug, Clone, Default)]
pub struct MacroArena {
    defs: Vec<MacroDef>,
    by_name: HashMap<String, MacroId>,
}

impl MacroArena {
    pub fn define(&mut self, def: MacroDef) -> MacroId {
        let id = MacroId(self.defs.len());
        self.by_name.entry(def.name.clone()).or_insert(id);
        self.defs.push(def);
        id
    }

    pub fn get(&self, id: MacroId) -> &MacroDef {
        &self.defs[id.0]
    }

    /// First definition carrying `name`
    pub fn lookup(&self, name: &str) -> Option<MacroId> {
        self.by_name.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (MacroId, &MacroDef)> {
        self.defs.iter().enumerate().map(|(i, def)| (MacroId(i), def))
    }

    #[cfg(test)]
    pub(crate) fn get_mut(&mut self, id: MacroId) -> &mut MacroDef {
        &mut self.defs[id.0]
    }
}

/// One line-level element of the output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Def(MacroId),
    Directive(String),
    Blank,
}

/// Append-only accumulator shared by the generation stages
#[derive(Debug, Default)]
pub struct ArtifactBuilder {
    arena: MacroArena,
    blocks: Vec<Block>,
}

impl ArtifactBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, def: MacroDef) -> MacroId {
        let id = self.arena.define(def);
        self.blocks.push(Block::Def(id));
        id
    }

    pub fn directive(&mut self, text: impl Into<String>) {
        self.blocks.push(Block::Directive(text.into()));
    }

    pub fn blank(&mut self) {
        if !matches!(self.blocks.last(), None | Some(Block::Blank)) {
            self.blocks.push(Block::Blank);
        }
    }

    pub fn arena(&self) -> &MacroArena {
        &self.arena
    }

    pub fn into_parts(self) -> (MacroArena, Vec<Block>) {
        (self.arena, self.blocks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_empty_body() {
        let def = MacroDef::new("RPC_FE_0", MacroRole::Ladder { level: 0 }).params(["WHAT"]);
        assert_eq!(def.render(), "#define RPC_FE_0(WHAT)");
    }

    #[test]
    fn test_named_params_skip_variadic_tail() {
        let def = MacroDef::new("M", MacroRole::Domain).params(["A", "B", "..."]);
        assert!(def.is_variadic());
        assert_eq!(def.named_params(), ["A".to_string(), "B".to_string()]);
    }

    #[test]
    fn test_lookup_returns_first_definition() {
        let mut arena = MacroArena::default();
        let first = arena.define(MacroDef::new("X", MacroRole::HeaderFunc));
        let second = arena.define(MacroDef::new("X", MacroRole::HeaderFunc));
        assert_ne!(first, second);
        assert_eq!(arena.lookup("X"), Some(first));
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn test_builder_collapses_blank_runs() {
        let mut builder = ArtifactBuilder::new();
        builder.blank();
        builder.directive("#pragma once");
        builder.blank();
        builder.blank();
        let (_, blocks) = builder.into_parts();
        assert_eq!(
            blocks,
            vec![Block::Directive("#pragma once".to_string()), Block::Blank]
        );
    }
}
