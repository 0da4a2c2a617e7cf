// src/name_match.rs

/// How a process name from the process table is compared with the name the
/// user asked for. Linux reports names verbatim, so they must match exactly;
/// other platforms capitalize names inconsistently and are compared
/// ignoring case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameComparison {
    Exact,
    FoldCase,
}

impl NameComparison {
    pub fn for_current_platform() -> Self {
        if cfg!(target_os = "linux") {
            NameComparison::Exact
        } else {
            NameComparison::FoldCase
        }
    }

    pub fn names_equal(&self, observed: &str, target: &str) -> bool {
        match self {
            NameComparison::Exact => observed == target,
            NameComparison::FoldCase => observed
                .chars()
                .flat_map(char::to_lowercase)
                .eq(target.chars().flat_map(char::to_lowercase)),
        }
    }
}
