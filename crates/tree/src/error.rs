use thiserror::Error;

/// Errors raised while registering a pattern into the tree.
///
/// All of them describe a route table that can never be served unambiguously, so callers are
/// expected to treat them as fatal configuration errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InsertError {
    #[error("must not contain multi-slash: \"{pattern}\"")]
    MultiSlash { pattern: String },

    #[error("invalid named parameter \"{name}\" in \"{pattern}\"")]
    InvalidParamName { pattern: String, name: String },

    #[error("{pattern} conflicts with existing pattern {existing}")]
    Conflict { pattern: String, existing: String },

    #[error("can't define path after wildcard pattern: {pattern}")]
    AfterWildcard { pattern: String },

    #[error("{pattern}, method: {method} already registered")]
    DuplicateValue { pattern: String, method: String },
}

impl InsertError {
    pub fn multi_slash<S: ToString>(pattern: S) -> Self {
        Self::MultiSlash { pattern: pattern.to_string() }
    }

    pub fn invalid_param_name<S: ToString, N: ToString>(pattern: S, name: N) -> Self {
        Self::InvalidParamName { pattern: pattern.to_string(), name: name.to_string() }
    }

    pub fn conflict<S: ToString, E: ToString>(pattern: S, existing: E) -> Self {
        Self::Conflict { pattern: pattern.to_string(), existing: existing.to_string() }
    }

    pub fn after_wildcard<S: ToString>(pattern: S) -> Self {
        Self::AfterWildcard { pattern: pattern.to_string() }
    }

    pub fn duplicate_value<S: ToString, M: ToString>(pattern: S, method: M) -> Self {
        Self::DuplicateValue { pattern: pattern.to_string(), method: method.to_string() }
    }
}
