//! Names of every generated macro, derived from one prefix.

/// Forced re-expansion helper shared by every ladder level
pub const EXPAND: &str = "EXPAND";

#[derive(Debug, Clone)]
pub struct MacroNames {
    prefix: String,
}

impl MacroNames {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn with_prefix(&self, suffix: &str) -> String {
        format!("{}{}", self.prefix, suffix)
    }

    /// Single-argument ladder level `k`
    pub fn fe(&self, level: usize) -> String {
        self.with_prefix(&format!("FE_{}", level))
    }

    /// Dual-argument ladder level `k`
    pub fn fe2(&self, level: usize) -> String {
        self.with_prefix(&format!("FE2_{}", level))
    }

    pub fn get_macro(&self) -> String {
        self.with_prefix("GET_MACRO")
    }

    pub fn for_each(&self) -> String {
        self.with_prefix("FOR_EACH")
    }

    pub fn for_each2(&self) -> String {
        self.with_prefix("FOR_EACH2")
    }

    pub fn header_func(&self) -> String {
        self.with_prefix("HEADER_FUNC")
    }

    pub fn attach_func(&self, cached: bool) -> String {
        if cached {
            self.with_prefix("ATTACH_CACHED_FUNC")
        } else {
            self.with_prefix("ATTACH_FUNC")
        }
    }

    pub fn attach_funcs(&self, cached: bool) -> String {
        if cached {
            self.with_prefix("ATTACH_CACHED_FUNCS")
        } else {
            self.with_prefix("ATTACH_FUNCS")
        }
    }

    pub fn alias_func(&self, cached: bool) -> String {
        if cached {
            self.with_prefix("ALIAS_CACHED_FUNC")
        } else {
            self.with_prefix("ALIAS_FUNC")
        }
    }

    /// Many aliases for one function (hold-first pair ladder)
    pub fn multi_alias_func(&self, cached: bool) -> String {
        if cached {
            self.with_prefix("MULTI_ALIAS_CACHED_FUNC")
        } else {
            self.with_prefix("MULTI_ALIAS_FUNC")
        }
    }

    /// `(function, alias)` pairs (advance-both pair ladder)
    pub fn alias_funcs(&self, cached: bool) -> String {
        if cached {
            self.with_prefix("ALIAS_CACHED_FUNCS")
        } else {
            self.with_prefix("ALIAS_FUNCS")
        }
    }

    pub fn default_dispatch(&self) -> String {
        self.with_prefix("DEFAULT_DISPATCH")
    }
}

impl Default for MacroNames {
    fn default() -> Self {
        Self::new(dispatchgen_types::DEFAULT_PREFIX)
    }
}

/// A prefix must keep every generated name a valid C identifier
pub fn is_valid_prefix(prefix: &str) -> bool {
    let mut chars = prefix.chars();
    match chars.next() {
        None => true,
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        Some(_) => false,
    }
}
