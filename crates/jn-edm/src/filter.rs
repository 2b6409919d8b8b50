//! Navigation-path filtering: exact names, shell-style wildcards, or an
//! explicit allow-list. The default filter includes everything.

use glob::Pattern;

use crate::error::{EdmError, Result};

/// Predicate over navigation paths used by event assembly.
#[derive(Debug, Clone)]
pub enum PathFilter {
    /// Include every path.
    All,
    /// Shell-style wildcard (also covers exact names).
    Pattern(Pattern),
    /// Explicit allow-list.
    Names(Vec<String>),
}

impl Default for PathFilter {
    fn default() -> Self {
        PathFilter::All
    }
}

impl PathFilter {
    /// Wildcard or exact-name filter.
    pub fn pattern(pat: &str) -> Result<Self> {
        Pattern::new(pat)
            .map(PathFilter::Pattern)
            .map_err(|e| EdmError::BadFilter(format!("{pat}: {e}")))
    }

    /// Allow-list filter.
    pub fn names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        PathFilter::Names(names.into_iter().map(Into::into).collect())
    }

    /// Whether `path` passes the filter.
    pub fn matches(&self, path: &str) -> bool {
        match self {
            PathFilter::All => true,
            PathFilter::Pattern(p) => p.matches(path),
            PathFilter::Names(names) => names.iter().any(|n| n == path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_matches_everything() {
        assert!(PathFilter::default().matches("/Event/Sim"));
    }

    #[test]
    fn wildcard_all_is_a_no_op() {
        let f = PathFilter::pattern("*").unwrap();
        for p in ["/Event/Sim", "/Event/CdLpmtTruth", "/Meta/navigator"] {
            assert!(f.matches(p));
        }
    }

    #[test]
    fn suffix_pattern_selects_truth_paths() {
        let f = PathFilter::pattern("*pmtTruth").unwrap();
        assert!(f.matches("/Event/CdLpmtTruth"));
        assert!(f.matches("/Event/CdSpmtTruth"));
        assert!(!f.matches("/Event/Sim"));
    }

    #[test]
    fn exact_name_without_wildcards() {
        let f = PathFilter::pattern("/Event/Sim").unwrap();
        assert!(f.matches("/Event/Sim"));
        assert!(!f.matches("/Event/SimExtra"));
    }

    #[test]
    fn allow_list_is_membership() {
        let f = PathFilter::names(["/Event/Sim", "/Event/CdLpmtTruth"]);
        assert!(f.matches("/Event/Sim"));
        assert!(!f.matches("/Event/CdSpmtTruth"));
    }

    #[test]
    fn bad_pattern_is_reported() {
        assert!(matches!(PathFilter::pattern("[unclosed"), Err(EdmError::BadFilter(_))));
    }
}
