//! Which failed actions stop a chain.

use std::collections::HashSet;

/// Per-action-class criticality. Every class is critical unless listed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CriticalityPolicy {
    non_critical: HashSet<String>,
}

impl CriticalityPolicy {
    /// All action classes critical.
    pub fn all_critical() -> Self {
        Self::default()
    }

    pub fn with_non_critical<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            non_critical: prefixes.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_critical(&self, prefix: &str) -> bool {
        !self.non_critical.contains(prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_all_critical() {
        let policy = CriticalityPolicy::all_critical();
        assert!(policy.is_critical("click:"));
        assert!(policy.is_critical("scroll:"));
    }

    #[test]
    fn listed_prefixes_are_not_critical() {
        let policy = CriticalityPolicy::with_non_critical(["scroll:"]);
        assert!(!policy.is_critical("scroll:"));
        assert!(policy.is_critical("scroll"));
        assert!(policy.is_critical("type:"));
    }
}
