//! Credential sources
//!
//! The signer takes its credentials from an `aws-credential-types` provider.
//! By default that is the standard AWS chain as loaded by `aws-config`, so a
//! host authenticated through environment variables, `~/.aws` profiles, SSO,
//! an ECS task role or EC2 instance metadata works without extra setup.
//! Embedders that already hold credentials can hand in a fixed set instead.

use aws_config::BehaviorVersion;
use aws_types::region::Region;
use tracing::debug;

pub use aws_credential_types::Credentials;
pub use aws_credential_types::provider::{ProvideCredentials, SharedCredentialsProvider};

use crate::error::{Error, Result};

/// Provider name recorded on credentials built by `static_provider`.
const STATIC_PROVIDER_NAME: &str = "static";

/// Load the default AWS credential chain.
///
/// Reads the environment and shared config files once. The returned provider
/// still has to be asked for credentials; nothing is fetched here.
pub async fn default_chain(region: Option<&str>) -> Result<SharedCredentialsProvider> {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(region) = region {
        loader = loader.region(Region::new(region.to_owned()));
    }
    let config = loader.load().await;
    let provider = config.credentials_provider().ok_or_else(|| {
        Error::MissingCredentials("no AWS credential provider is configured".into())
    })?;
    debug!(region = ?config.region(), "default credential chain loaded");
    Ok(provider)
}

/// Provider that always returns the given key pair.
pub fn static_provider(
    access_key_id: impl Into<String>,
    secret_access_key: impl Into<String>,
    session_token: Option<String>,
) -> SharedCredentialsProvider {
    SharedCredentialsProvider::new(Credentials::new(
        access_key_id,
        secret_access_key,
        session_token,
        None,
        STATIC_PROVIDER_NAME,
    ))
}

/// Ask `provider` for credentials.
pub async fn resolve(provider: &SharedCredentialsProvider) -> Result<Credentials> {
    provider.provide_credentials().await.map_err(|e| {
        let message = match std::error::Error::source(&e) {
            Some(source) => format!("{e}: {source}"),
            None => e.to_string(),
        };
        Error::MissingCredentials(message)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::{Mutex, MutexGuard};

    /// Serialises tests that touch process environment variables.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// Variables the default chain consults before falling back to files.
    const CHAIN_VARS: &[&str] = &[
        "AWS_ACCESS_KEY_ID",
        "AWS_SECRET_ACCESS_KEY",
        "AWS_SESSION_TOKEN",
        "AWS_PROFILE",
        "AWS_DEFAULT_PROFILE",
        "AWS_ROLE_ARN",
        "AWS_WEB_IDENTITY_TOKEN_FILE",
        "AWS_CONTAINER_CREDENTIALS_RELATIVE_URI",
        "AWS_CONTAINER_CREDENTIALS_FULL_URI",
        "AWS_CONFIG_FILE",
        "AWS_SHARED_CREDENTIALS_FILE",
        "AWS_EC2_METADATA_DISABLED",
    ];

    /// SAFETY: callers must hold ENV_MUTEX.
    unsafe fn set_env(key: &str, val: &str) {
        unsafe { std::env::set_var(key, val) };
    }

    unsafe fn remove_env(key: &str) {
        unsafe { std::env::remove_var(key) };
    }

    /// Environment with no ambient AWS credentials and config files under a temp dir.
    struct IsolatedAws {
        dir: tempfile::TempDir,
        _lock: MutexGuard<'static, ()>,
    }

    impl IsolatedAws {
        fn new() -> Self {
            let lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
            let dir = tempfile::tempdir().unwrap();
            unsafe {
                for var in CHAIN_VARS {
                    remove_env(var);
                }
                set_env("AWS_CONFIG_FILE", dir.path().join("config").to_str().unwrap());
                set_env(
                    "AWS_SHARED_CREDENTIALS_FILE",
                    dir.path().join("credentials").to_str().unwrap(),
                );
                set_env("AWS_EC2_METADATA_DISABLED", "true");
            }
            Self { dir, _lock: lock }
        }

        fn credentials_file(&self) -> PathBuf {
            self.dir.path().join("credentials")
        }
    }

    impl Drop for IsolatedAws {
        fn drop(&mut self) {
            unsafe {
                for var in CHAIN_VARS {
                    remove_env(var);
                }
            }
        }
    }

    #[tokio::test]
    async fn default_chain_reads_environment_variables() {
        let _env = IsolatedAws::new();
        unsafe {
            set_env("AWS_ACCESS_KEY_ID", "AKIDENV");
            set_env("AWS_SECRET_ACCESS_KEY", "env-secret");
            set_env("AWS_SESSION_TOKEN", "env-token");
        }

        let provider = default_chain(Some("us-east-1")).await.unwrap();
        let creds = resolve(&provider).await.unwrap();
        assert_eq!(creds.access_key_id(), "AKIDENV");
        assert_eq!(creds.secret_access_key(), "env-secret");
        assert_eq!(creds.session_token(), Some("env-token"));
    }

    #[tokio::test]
    async fn default_chain_reads_shared_credentials_profile() {
        let env = IsolatedAws::new();
        std::fs::write(
            env.credentials_file(),
            "[default]\naws_access_key_id = AKIDPROFILE\naws_secret_access_key = profile-secret\n\n\
             [ci]\naws_access_key_id = AKIDCI\naws_secret_access_key = ci-secret\n",
        )
        .unwrap();

        let provider = default_chain(Some("us-east-1")).await.unwrap();
        let creds = resolve(&provider).await.unwrap();
        assert_eq!(creds.access_key_id(), "AKIDPROFILE");
        assert_eq!(creds.secret_access_key(), "profile-secret");
        assert!(creds.session_token().is_none());

        unsafe { set_env("AWS_PROFILE", "ci") };
        let provider = default_chain(Some("us-east-1")).await.unwrap();
        let creds = resolve(&provider).await.unwrap();
        assert_eq!(creds.access_key_id(), "AKIDCI");
    }

    #[tokio::test]
    async fn default_chain_without_any_source_is_missing_credentials() {
        let _env = IsolatedAws::new();

        let provider = default_chain(Some("us-east-1")).await.unwrap();
        let err = resolve(&provider).await.unwrap_err();
        assert!(matches!(err, Error::MissingCredentials(_)), "got: {err:?}");
    }

    #[tokio::test]
    async fn static_provider_returns_given_credentials() {
        let provider = static_provider("AKID", "secret", Some("token".into()));
        let creds = resolve(&provider).await.unwrap();
        assert_eq!(creds.access_key_id(), "AKID");
        assert_eq!(creds.secret_access_key(), "secret");
        assert_eq!(creds.session_token(), Some("token"));
        assert_eq!(creds.expiry(), None);
    }

    #[tokio::test]
    async fn credentials_debug_hides_secrets() {
        let provider = static_provider("AKID", "very-secret", Some("very-token".into()));
        let creds = resolve(&provider).await.unwrap();
        let debug = format!("{creds:?}");
        assert!(debug.contains("AKID"));
        assert!(!debug.contains("very-secret"));
        assert!(!debug.contains("very-token"));
    }
}
