//! What a consumer's registration macros expand to.
//!
//! A [`DispatchPlan`] is the ordered list of macro invocations placed inside a
//! server's dispatch routine. It is checked against a generated header before
//! the consumer's compiler sees it: arity beyond the header's ceiling, alias
//! macros the variant does not emit, and branches that can never match.

use std::collections::HashMap;

use dispatchgen_types::{GenerateError, GeneratorConfig, PairPolicy, Variant};
use serde::{Deserialize, Serialize};

use crate::names::MacroNames;
use crate::profile::VariantProfile;

/// One registration macro invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "macro", rename_all = "snake_case")]
pub enum Group {
    /// `ATTACH_FUNC(F)` / `ATTACH_CACHED_FUNC(F)`
    Attach { func: String, cached: bool },
    /// `ATTACH_FUNCS(F, ...)` / `ATTACH_CACHED_FUNCS(F, ...)`
    AttachMany { funcs: Vec<String>, cached: bool },
    /// `ALIAS_FUNC(F, A)` / `ALIAS_CACHED_FUNC(F, A)`
    Alias { func: String, alias: String, cached: bool },
    /// `MULTI_ALIAS_FUNC(F, A, ...)`, one function under many names
    MultiAlias {
        func: String,
        aliases: Vec<String>,
        cached: bool,
    },
    /// `ALIAS_FUNCS(F1, A1, F2, A2, ...)`, `(function, alias)` pairs
    AliasPairs {
        pairs: Vec<(String, String)>,
        cached: bool,
    },
}

impl Group {
    /// Level of the ladder the selector resolves to, 0 when no selector is involved.
    ///
    /// The variadic macros always forward `FUNCNAME, __VA_ARGS__`, so a single
    /// name still arrives with a trailing empty argument.
    pub fn required_arity(&self) -> usize {
        match self {
            Group::Attach { .. } | Group::Alias { .. } => 0,
            Group::AttachMany { funcs, .. } => funcs.len().max(2),
            Group::MultiAlias { aliases, .. } => (aliases.len() + 1).max(3),
            Group::AliasPairs { pairs, .. } => (pairs.len() * 2).max(3),
        }
    }

    pub fn is_cached(&self) -> bool {
        match self {
            Group::Attach { cached, .. }
            | Group::AttachMany { cached, .. }
            | Group::Alias { cached, .. }
            | Group::MultiAlias { cached, .. }
            | Group::AliasPairs { cached, .. } => *cached,
        }
    }

    /// Name of the macro this group invokes
    pub fn macro_name(&self, names: &MacroNames) -> String {
        match self {
            Group::Attach { cached, .. } => names.attach_func(*cached),
            Group::AttachMany { cached, .. } => names.attach_funcs(*cached),
            Group::Alias { cached, .. } => names.alias_func(*cached),
            Group::MultiAlias { cached, .. } => names.multi_alias_func(*cached),
            Group::AliasPairs { cached, .. } => names.alias_funcs(*cached),
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            Group::AttachMany { funcs, .. } => funcs.is_empty(),
            Group::MultiAlias { aliases, .. } => aliases.is_empty(),
            Group::AliasPairs { pairs, .. } => pairs.is_empty(),
            Group::Attach { .. } | Group::Alias { .. } => false,
        }
    }

    fn push_branches(&self, out: &mut Vec<Branch>) {
        let cached = self.is_cached();
        let branch = |name: &String, target: &String| Branch {
            name: name.clone(),
            target: target.clone(),
            cached,
        };
        match self {
            Group::Attach { func, .. } => out.push(branch(func, func)),
            Group::AttachMany { funcs, .. } => out.extend(funcs.iter().map(|f| branch(f, f))),
            Group::Alias { func, alias, .. } => out.push(branch(alias, func)),
            Group::MultiAlias { func, aliases, .. } => {
                out.extend(aliases.iter().map(|a| branch(a, func)))
            }
            Group::AliasPairs { pairs, .. } => {
                out.extend(pairs.iter().map(|(f, a)| branch(a, f)))
            }
        }
    }
}

/// One `if (func_name == "name")` branch after expansion
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Branch {
    /// Public name the branch compares against
    pub name: String,
    /// Function the branch dispatches to
    pub target: String,
    pub cached: bool,
}

/// A branch that can never run because an earlier one matches the same name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Shadowed {
    pub name: String,
    /// Position of the dead branch
    pub position: usize,
    /// Position of the branch that wins
    pub first: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchPlan {
    groups: Vec<Group>,
}

impl DispatchPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// What `DEFAULT_DISPATCH(F, ...)` expands to
    pub fn default_dispatch<I, S>(funcs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new().attach_funcs(funcs)
    }

    pub fn push(mut self, group: Group) -> Self {
        self.groups.push(group);
        self
    }

    pub fn attach(self, func: impl Into<String>) -> Self {
        self.push(Group::Attach {
            func: func.into(),
            cached: false,
        })
    }

    pub fn attach_cached(self, func: impl Into<String>) -> Self {
        self.push(Group::Attach {
            func: func.into(),
            cached: true,
        })
    }

    pub fn attach_funcs<I, S>(self, funcs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push(Group::AttachMany {
            funcs: funcs.into_iter().map(Into::into).collect(),
            cached: false,
        })
    }

    pub fn attach_cached_funcs<I, S>(self, funcs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push(Group::AttachMany {
            funcs: funcs.into_iter().map(Into::into).collect(),
            cached: true,
        })
    }

    pub fn alias(self, func: impl Into<String>, alias: impl Into<String>) -> Self {
        self.push(Group::Alias {
            func: func.into(),
            alias: alias.into(),
            cached: false,
        })
    }

    pub fn multi_alias<I, S>(self, func: impl Into<String>, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push(Group::MultiAlias {
            func: func.into(),
            aliases: aliases.into_iter().map(Into::into).collect(),
            cached: false,
        })
    }

    pub fn alias_pairs<I, F, A>(self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (F, A)>,
        F: Into<String>,
        A: Into<String>,
    {
        self.push(Group::AliasPairs {
            pairs: pairs.into_iter().map(|(f, a)| (f.into(), a.into())).collect(),
            cached: false,
        })
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Highest ladder level any group needs
    pub fn required_arity(&self) -> usize {
        self.groups.iter().map(Group::required_arity).max().unwrap_or(0)
    }

    /// Fails when a group needs more ladder levels than the header defines
    pub fn check_capacity(&self, max_arity: usize) -> Result<(), GenerateError> {
        match self.groups.iter().map(Group::required_arity).find(|r| *r > max_arity) {
            Some(requested) => Err(GenerateError::ArityExceeded {
                requested,
                max_arity,
            }),
            None => Ok(()),
        }
    }

    /// Fails when a group invokes a macro the configured header does not define
    pub fn check_support(&self, config: &GeneratorConfig) -> Result<(), GenerateError> {
        let names = MacroNames::new(&config.prefix);
        let policy = config.effective_pair_policy();
        for group in &self.groups {
            let supported = match group {
                Group::Attach { .. } | Group::AttachMany { .. } => true,
                Group::Alias { .. } => policy.is_some(),
                Group::MultiAlias { .. } => policy == Some(PairPolicy::HoldFirst),
                Group::AliasPairs { .. } => policy == Some(PairPolicy::AdvanceBoth),
            };
            if !supported {
                return Err(GenerateError::UnsupportedMacro {
                    macro_name: group.macro_name(&names),
                    variant: config.variant,
                });
            }
            if group.is_empty() {
                return Err(GenerateError::Structure(format!(
                    "{} invoked without names",
                    group.macro_name(&names)
                )));
            }
        }
        Ok(())
    }

    /// Both checks against one header configuration
    pub fn validate(&self, config: &GeneratorConfig) -> Result<(), GenerateError> {
        self.check_support(config)?;
        self.check_capacity(config.max_arity)
    }

    /// Branches in expansion order
    pub fn branches(&self) -> Vec<Branch> {
        let mut out = Vec::new();
        for group in &self.groups {
            group.push_branches(&mut out);
        }
        out
    }

    /// Expanded dispatch routine; the "not found" fallback is always last
    pub fn render(&self, variant: Variant) -> String {
        let profile = VariantProfile::of(variant);
        let chain = self
            .branches()
            .iter()
            .map(|b| profile.branch(&format!("\"{}\"", b.name), &b.target, b.cached))
            .collect::<Vec<_>>()
            .join(" ");
        profile.default_dispatch(&chain)
    }

    /// Branches made dead by an earlier branch with the same name
    pub fn shadowed(&self) -> Vec<Shadowed> {
        let mut first_seen: HashMap<String, usize> = HashMap::new();
        let mut dead = Vec::new();
        for (position, branch) in self.branches().into_iter().enumerate() {
            match first_seen.get(&branch.name) {
                Some(first) => dead.push(Shadowed {
                    name: branch.name,
                    position,
                    first: *first,
                }),
                None => {
                    first_seen.insert(branch.name, position);
                }
            }
        }
        dead
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_arity_counts_trailing_argument() {
        let plan = DispatchPlan::new().attach_funcs(["Sum"]);
        assert_eq!(plan.required_arity(), 2);
        let plan = DispatchPlan::new().attach_funcs(["A", "B", "C", "D"]);
        assert_eq!(plan.required_arity(), 4);
        let plan = DispatchPlan::new().multi_alias("Sum", ["Add", "Plus", "Total"]);
        assert_eq!(plan.required_arity(), 4);
        let plan = DispatchPlan::new().alias_pairs([("Sum", "Add"), ("Mul", "Times")]);
        assert_eq!(plan.required_arity(), 4);
        assert_eq!(DispatchPlan::new().attach("Sum").required_arity(), 0);
    }

    #[test]
    fn test_capacity_ceiling() {
        let plan = DispatchPlan::default_dispatch(["A", "B", "C", "D", "E"]);
        assert!(plan.check_capacity(5).is_ok());
        assert!(matches!(
            plan.check_capacity(3),
            Err(GenerateError::ArityExceeded {
                requested: 5,
                max_arity: 3
            })
        ));
    }

    #[test]
    fn test_zero_arity_header_cannot_attach_many() {
        let plan = DispatchPlan::default_dispatch(["Sum"]);
        assert!(plan.check_capacity(0).is_err());
        assert!(DispatchPlan::new().attach("Sum").check_capacity(0).is_ok());
    }

    #[test]
    fn test_alias_support_follows_pair_policy() {
        let legacy = GeneratorConfig::for_variant(Variant::Legacy);
        let classic = GeneratorConfig::for_variant(Variant::Classic);
        let callback = GeneratorConfig::for_variant(Variant::Callback);

        let alias = DispatchPlan::new().alias("Sum", "Add");
        assert!(matches!(
            alias.check_support(&legacy),
            Err(GenerateError::UnsupportedMacro { .. })
        ));
        assert!(alias.check_support(&classic).is_ok());

        let multi = DispatchPlan::new().multi_alias("Sum", ["Add", "Plus"]);
        assert!(multi.check_support(&classic).is_ok());
        let err = multi.check_support(&callback).unwrap_err();
        assert_eq!(
            err.to_string(),
            "RPC_MULTI_ALIAS_FUNC is not generated by the callback variant"
        );

        let pairs = DispatchPlan::new().alias_pairs([("Sum", "Add")]);
        assert!(pairs.check_support(&callback).is_ok());
        assert!(pairs.check_support(&classic).is_err());
    }

    #[test]
    fn test_empty_group_is_rejected() {
        let plan = DispatchPlan::new().attach_funcs(Vec::<String>::new());
        assert!(matches!(
            plan.validate(&GeneratorConfig::default()),
            Err(GenerateError::Structure(_))
        ));
    }

    #[test]
    fn test_fallback_is_last_branch() {
        let profile = VariantProfile::of(Variant::Classic);
        for count in [0usize, 1, 3, 12] {
            let names: Vec<String> = (0..count).map(|i| format!("F{}", i)).collect();
            let text = DispatchPlan::default_dispatch(names).render(Variant::Classic);
            assert!(text.ends_with(profile.fallback()), "{}", count);
            if count > 0 {
                let last_branch = text.rfind("if (func_name ==").unwrap();
                assert!(last_branch < text.rfind(profile.fallback()).unwrap());
            }
        }
    }

    #[test]
    fn test_render_aliases_dispatch_to_target() {
        let text = DispatchPlan::new()
            .alias_pairs([("Sum", "Add")])
            .render(Variant::Callback);
        assert!(text.contains(
            "if (func_name == \"Add\") { return this->dispatch_callback(Sum, rpc_obj); }"
        ));
    }

    #[test]
    fn test_plan_loads_from_json() {
        let plan: DispatchPlan = serde_json::from_str(
            r#"{"groups": [
                {"macro": "attach_many", "funcs": ["Sum", "Mul"], "cached": false},
                {"macro": "multi_alias", "func": "Sum", "aliases": ["Add"], "cached": true}
            ]}"#,
        )
        .unwrap();
        assert_eq!(plan.groups().len(), 2);
        assert_eq!(
            plan.branches().last(),
            Some(&Branch {
                name: "Add".to_string(),
                target: "Sum".to_string(),
                cached: true
            })
        );
    }

    #[test]
    fn test_duplicate_attach_is_reported() {
        let plan = DispatchPlan::new()
            .attach_funcs(["Sum", "Mul"])
            .attach_cached("Sum")
            .alias("Div", "Mul");
        assert_eq!(
            plan.shadowed(),
            vec![
                Shadowed {
                    name: "Sum".to_string(),
                    position: 2,
                    first: 0
                },
                Shadowed {
                    name: "Mul".to_string(),
                    position: 3,
                    first: 1
                },
            ]
        );
        assert!(DispatchPlan::default_dispatch(["A", "B"]).shadowed().is_empty());
    }
}
