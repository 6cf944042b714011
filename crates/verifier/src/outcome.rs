/// Result of one verification run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VerificationOutcome {
    /// Names of declarations that failed to verify, in report order.
    pub failed: Vec<String>,
    /// Total error count the backend reported (may exceed `failed.len()`
    /// when a declaration produces several errors, or when resolution
    /// errors carry no declaration name).
    pub error_count: usize,
}

impl VerificationOutcome {
    pub fn verified() -> Self {
        Self::default()
    }

    /// A repair candidate is accepted only on a fully clean run.
    pub fn is_fully_verified(&self) -> bool {
        self.failed.is_empty() && self.error_count == 0
    }

    /// The failing names that follow the `check_<i>` convention.
    pub fn failed_checks(&self) -> Vec<String> {
        self.failed
            .iter()
            .filter(|n| n.to_lowercase().contains("check"))
            .cloned()
            .collect()
    }
}
