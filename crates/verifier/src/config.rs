use std::env;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::VerifierError;

/// Environment variable that overrides verifier binary discovery.
pub const VERIFIER_ENV: &str = "VERILOC_VERIFIER";

/// Binary name used for PATH lookup.
const BINARY_NAME: &str = "dafny";

/// Common installation paths checked when PATH lookup fails.
const COMMON_PATHS: &[&str] = &[
    "/opt/homebrew/bin/dafny",
    "/usr/local/bin/dafny",
    "/usr/bin/dafny",
];

/// Configuration for invoking the external verification backend.
#[derive(Debug, Clone)]
pub struct VerifierConfig {
    /// Path to the verifier binary.
    pub binary: PathBuf,
    /// Per-run verification time limit in seconds; 0 disables the flag.
    pub time_limit_secs: u64,
    /// Extra command-line arguments appended to every invocation.
    pub extra_args: Vec<String>,
}

impl VerifierConfig {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            time_limit_secs: 30,
            extra_args: Vec::new(),
        }
    }

    /// Locate the verifier: the `VERILOC_VERIFIER` override first, then
    /// `PATH`, then common installation locations.
    pub fn auto_detect() -> Result<Self, VerifierError> {
        if let Ok(path) = env::var(VERIFIER_ENV) {
            let path = PathBuf::from(path);
            if path.exists() {
                tracing::debug!(path = %path.display(), "verifier from {VERIFIER_ENV}");
                return Ok(Self::new(path));
            }
            return Err(VerifierError::NotFound(path));
        }

        if let Some(path) = find_in_path(BINARY_NAME) {
            tracing::debug!(path = %path.display(), "verifier from PATH");
            return Ok(Self::new(path));
        }

        for candidate in COMMON_PATHS {
            let path = Path::new(candidate);
            if path.exists() {
                tracing::debug!(path = %path.display(), "verifier from common path");
                return Ok(Self::new(path));
            }
        }

        Err(VerifierError::NotFound(PathBuf::from(BINARY_NAME)))
    }

    /// Check that the configured binary exists.
    pub fn validate(&self) -> Result<(), VerifierError> {
        if self.binary.exists() {
            Ok(())
        } else {
            Err(VerifierError::NotFound(self.binary.clone()))
        }
    }

    /// Arguments for verifying one file.
    pub fn args_for(&self, file: &Path) -> Vec<String> {
        let mut args = vec!["verify".to_string(), file.display().to_string()];
        if self.time_limit_secs > 0 {
            args.push(format!("--verification-time-limit={}", self.time_limit_secs));
        }
        args.extend(self.extra_args.iter().cloned());
        args
    }
}

impl fmt::Display for VerifierConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (time limit {}s)",
            self.binary.display(),
            self.time_limit_secs
        )
    }
}

fn find_in_path(binary: &str) -> Option<PathBuf> {
    let path_var = env::var_os("PATH")?;
    for dir in env::split_paths(&path_var) {
        let candidate = dir.join(binary);
        if candidate.exists() {
            return Some(candidate);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_include_verify_and_file() {
        let config = VerifierConfig::new("/usr/bin/dafny");
        let args = config.args_for(Path::new("check.dfy"));
        assert_eq!(args[0], "verify");
        assert_eq!(args[1], "check.dfy");
        assert!(args
            .iter()
            .any(|a| a == "--verification-time-limit=30"));
    }

    #[test]
    fn zero_time_limit_omits_flag() {
        let mut config = VerifierConfig::new("/usr/bin/dafny");
        config.time_limit_secs = 0;
        let args = config.args_for(Path::new("check.dfy"));
        assert!(!args.iter().any(|a| a.contains("time-limit")));
    }

    #[test]
    fn extra_args_are_appended() {
        let mut config = VerifierConfig::new("/usr/bin/dafny");
        config.extra_args.push("--allow-warnings".to_string());
        let args = config.args_for(Path::new("check.dfy"));
        assert_eq!(args.last().map(String::as_str), Some("--allow-warnings"));
    }

    #[test]
    fn validate_rejects_missing_binary() {
        let config = VerifierConfig::new("/definitely/not/here/dafny");
        assert!(matches!(
            config.validate(),
            Err(VerifierError::NotFound(_))
        ));
    }
}
