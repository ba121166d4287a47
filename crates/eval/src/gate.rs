//! Forbidden-pattern gate.
//!
//! A plain substring scan that stops candidates from delegating to a trusted
//! built-in sort. It is cheap and runs before any compilation, and it is
//! not a soundness guarantee: obfuscated calls get through.

use quine_core::GateSettings;

/// Static pre-compile filter.
#[derive(Debug, Clone)]
pub struct ForbiddenPatternGate {
    patterns: Vec<String>,
}

impl ForbiddenPatternGate {
    /// Create a gate over the given patterns. Empty patterns are ignored.
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            patterns: patterns
                .into_iter()
                .map(Into::into)
                .filter(|p: &String| !p.is_empty())
                .collect(),
        }
    }

    /// Gate configured from settings.
    pub fn from_settings(settings: &GateSettings) -> Self {
        Self::new(settings.forbidden_patterns.iter().cloned())
    }

    /// First disallowed pattern found in `source`, if any.
    pub fn violation(&self, source: &str) -> Option<&str> {
        self.patterns
            .iter()
            .find(|p| source.contains(p.as_str()))
            .map(String::as_str)
    }

    /// Whether `source` may proceed to compilation.
    pub fn passes(&self, source: &str) -> bool {
        self.violation(source).is_none()
    }

    /// Configured patterns.
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }
}

impl Default for ForbiddenPatternGate {
    fn default() -> Self {
        Self::from_settings(&GateSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quine_core::ORIGIN_SOURCE;

    #[test]
    fn test_origin_passes() {
        assert!(ForbiddenPatternGate::default().passes(ORIGIN_SOURCE));
    }

    #[test]
    fn test_builtin_sort_calls_are_rejected() {
        let gate = ForbiddenPatternGate::default();
        let cheats = [
            "pub fn solve(mut v: Vec<i32>) -> Vec<i32> { v.sort(); v }",
            "pub fn solve(mut v: Vec<i32>) -> Vec<i32> { v.sort_unstable(); v }",
            "pub fn solve(mut v: Vec<i32>) -> Vec<i32> { v.sort_by(|a, b| a.cmp(b)); v }",
            "pub fn solve(mut v: Vec<i32>) -> Vec<i32> { v.sort_unstable_by_key(|x| *x); v }",
            "use std::collections::BinaryHeap;",
            "pub fn solve(v: Vec<i32>) -> Vec<i32> { v.into_iter().collect::<std::collections::BTreeSet<_>>().into_iter().collect() }",
        ];
        for cheat in cheats {
            assert!(!gate.passes(cheat), "gate let through: {}", cheat);
        }
    }

    #[test]
    fn test_reports_first_matching_pattern() {
        let gate = ForbiddenPatternGate::new([".sort(", ".sort_unstable("]);
        assert_eq!(gate.violation("x.sort_unstable(); y.sort();"), Some(".sort("));
        assert_eq!(gate.violation("x.sort_unstable();"), Some(".sort_unstable("));
    }

    #[test]
    fn test_match_is_exact_substring() {
        let gate = ForbiddenPatternGate::new([".sort("]);
        // Helper names that merely contain "sort" are fine.
        assert!(gate.passes("fn quick_sort(v: &mut [i32]) {} fn merge_sort_into() {}"));
        assert!(gate.passes("v . sort ()"));
    }

    #[test]
    fn test_empty_patterns_are_ignored() {
        let gate = ForbiddenPatternGate::new(["", ".sort("]);
        assert_eq!(gate.patterns().len(), 1);
        assert!(gate.passes("anything"));
    }
}
