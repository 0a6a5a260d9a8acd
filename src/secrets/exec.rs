//! External-process secret provider.
//!
//! Resolves a secret reference by executing
//! `<providers_dir>/<provider_name>.sh` (`.cmd` on Windows) with the fixed
//! calling convention
//!
//! ```text
//! <script> get <secret_ref> key1=value1 key2=value2 ...
//! ```
//!
//! where the `key=value` pairs are the provider's static parameters in
//! deterministic order followed by rule-level overrides. Exit code 0 means
//! success with the secret value on stdout; non-zero means failure with a
//! diagnostic on stderr. The invocation is bounded by a hard timeout and
//! runs as its own task, so a slow provider never blocks unrelated requests.

use super::provider::SecretProvider;
use super::types::SecretString;
use crate::errors::{Error, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, error};

/// Hard cap on one provider invocation.
pub const PROVIDER_TIMEOUT: Duration = Duration::from_secs(10);

/// File extension of provider executables on this platform.
#[cfg(unix)]
pub const PROVIDER_EXT: &str = "sh";
#[cfg(windows)]
pub const PROVIDER_EXT: &str = "cmd";

/// Provider backed by an external executable in the providers directory.
#[derive(Debug, Clone)]
pub struct ExecProvider {
    name: String,
    script: PathBuf,
    timeout: Duration,
}

impl ExecProvider {
    /// Bind a provider name to its executable under `providers_dir`.
    ///
    /// The executable's existence is checked at resolve time, not here, so a
    /// provider script dropped into the directory later is picked up without
    /// a reload.
    pub fn new(providers_dir: &Path, name: impl Into<String>) -> Self {
        let name = name.into();
        let script = providers_dir.join(format!("{name}.{PROVIDER_EXT}"));
        Self { name, script, timeout: PROVIDER_TIMEOUT }
    }

    /// Override the invocation timeout (tests mostly).
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Path of the executable this provider invokes.
    pub fn script(&self) -> &Path {
        &self.script
    }

    /// Strip exactly one trailing newline from provider output.
    ///
    /// Provider scripts conventionally emit the value followed by a single
    /// `\n` (`echo`, `gcloud`, `vault` all do); only that one terminator is
    /// removed. Interior newlines and any other trailing whitespace are part
    /// of the value and pass through verbatim.
    fn trim_output(mut stdout: Vec<u8>) -> Vec<u8> {
        if stdout.last() == Some(&b'\n') {
            stdout.pop();
            if stdout.last() == Some(&b'\r') {
                stdout.pop();
            }
        }
        stdout
    }
}

#[async_trait]
impl SecretProvider for ExecProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn resolve(&self, reference: &str, config: &[(String, String)]) -> Result<SecretString> {
        if !self.script.exists() {
            error!(provider = %self.name, path = %self.script.display(), "Provider executable not found");
            return Err(Error::ProviderNotFound {
                provider: self.name.clone(),
                path: self.script.clone(),
            });
        }

        let mut command = Command::new(&self.script);
        command.arg("get").arg(reference);
        for (key, value) in config {
            command.arg(format!("{key}={value}"));
        }
        command.kill_on_drop(true);

        debug!(provider = %self.name, reference = %reference, args = config.len(), "Invoking provider");

        let output = match tokio::time::timeout(self.timeout, command.output()).await {
            Ok(result) => result?,
            Err(_) => {
                error!(provider = %self.name, reference = %reference, timeout = ?self.timeout, "Provider timed out");
                return Err(Error::ProviderTimeout {
                    provider: self.name.clone(),
                    reference: reference.to_string(),
                    timeout: self.timeout,
                });
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            error!(provider = %self.name, reference = %reference, status = ?output.status.code(), stderr = %stderr, "Provider failed");
            return Err(Error::ProviderFailed {
                provider: self.name.clone(),
                reference: reference.to_string(),
                stderr,
            });
        }

        let value = String::from_utf8_lossy(&Self::trim_output(output.stdout)).into_owned();
        Ok(SecretString::new(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_path_composition() {
        let provider = ExecProvider::new(Path::new("/etc/credgate/providers"), "vault");
        assert_eq!(
            provider.script(),
            Path::new(&format!("/etc/credgate/providers/vault.{PROVIDER_EXT}"))
        );
        assert_eq!(provider.name(), "vault");
    }

    #[test]
    fn test_trim_output_strips_exactly_one_newline() {
        assert_eq!(ExecProvider::trim_output(b"tok-123\n".to_vec()), b"tok-123");
        assert_eq!(ExecProvider::trim_output(b"tok-123\r\n".to_vec()), b"tok-123");
        // Only one terminator comes off.
        assert_eq!(ExecProvider::trim_output(b"tok-123\n\n".to_vec()), b"tok-123\n");
        // Interior newlines and other trailing whitespace are preserved.
        assert_eq!(ExecProvider::trim_output(b"line1\nline2".to_vec()), b"line1\nline2");
        assert_eq!(ExecProvider::trim_output(b"tok-123 ".to_vec()), b"tok-123 ");
        assert_eq!(ExecProvider::trim_output(b"".to_vec()), b"");
    }

    #[tokio::test]
    async fn test_missing_executable_is_provider_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let provider = ExecProvider::new(dir.path(), "absent");
        let err = provider.resolve("any-ref", &[]).await.unwrap_err();
        assert!(matches!(err, Error::ProviderNotFound { .. }));
    }

    #[cfg(unix)]
    mod unix {
        use super::*;
        use std::os::unix::fs::PermissionsExt;

        fn write_script(dir: &Path, name: &str, body: &str) {
            let path = dir.join(format!("{name}.sh"));
            std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        }

        #[tokio::test]
        async fn test_successful_resolution_captures_stdout() {
            let dir = tempfile::tempdir().unwrap();
            write_script(dir.path(), "vault", r#"echo "tok-$2""#);

            let provider = ExecProvider::new(dir.path(), "vault");
            let value = provider.resolve("svc-token", &[]).await.unwrap();
            assert_eq!(value.expose_secret(), "tok-svc-token");
        }

        #[tokio::test]
        async fn test_calling_convention_verb_ref_then_pairs() {
            let dir = tempfile::tempdir().unwrap();
            // Echo the full argument vector back so the test can pin it.
            write_script(dir.path(), "echoargs", r#"printf '%s ' "$@""#);

            let provider = ExecProvider::new(dir.path(), "echoargs");
            let config = vec![
                ("project".to_string(), "prod".to_string()),
                ("region".to_string(), "us-east1".to_string()),
                ("project".to_string(), "override".to_string()),
            ];
            let value = provider.resolve("db-pass", &config).await.unwrap();
            assert_eq!(
                value.expose_secret().trim_end(),
                "get db-pass project=prod region=us-east1 project=override"
            );
        }

        #[tokio::test]
        async fn test_nonzero_exit_carries_stderr() {
            let dir = tempfile::tempdir().unwrap();
            write_script(dir.path(), "broken", "echo 'access denied' >&2; exit 3");

            let provider = ExecProvider::new(dir.path(), "broken");
            let err = provider.resolve("svc-token", &[]).await.unwrap_err();
            match err {
                Error::ProviderFailed { provider, reference, stderr } => {
                    assert_eq!(provider, "broken");
                    assert_eq!(reference, "svc-token");
                    assert_eq!(stderr, "access denied");
                }
                other => panic!("expected ProviderFailed, got {other:?}"),
            }
        }

        #[tokio::test]
        async fn test_slow_provider_times_out() {
            let dir = tempfile::tempdir().unwrap();
            write_script(dir.path(), "slow", "sleep 5; echo never");

            let provider =
                ExecProvider::new(dir.path(), "slow").with_timeout(Duration::from_millis(100));
            let err = provider.resolve("svc-token", &[]).await.unwrap_err();
            assert!(matches!(err, Error::ProviderTimeout { .. }));
        }
    }
}
