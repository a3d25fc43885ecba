//! Boundary traits for the external collaborators the core depends on

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::*;

/// Reader for the previously published remarks table
///
/// The core treats the fetch as fallible and recoverable: any error is
/// reported as a warning and the merge proceeds against an empty history.
/// Implementations decide what "previous" means — an object-store URL, an
/// FTP path, a local file.
#[async_trait]
pub trait RemarksSource: Send + Sync {
    /// Fetch the raw bytes of the last published table
    ///
    /// Errors should be [`ReconError::SourceUnavailable`] with a message
    /// naming the failure (not found, unreachable, etc.).
    async fn fetch_previous(&self) -> ReconResult<Vec<u8>>;
}

/// Transfer client that delivers published bytes to the remote store
///
/// The core makes exactly one `send` attempt per run; retry policy belongs
/// to the caller. Ok carries the client's human-readable success message,
/// Err a [`ReconError::Transfer`] with the underlying failure text.
#[async_trait]
pub trait TransferClient: Send + Sync {
    /// Deliver `bytes` under `destination` at the remote store
    async fn send(&self, bytes: &[u8], destination: &str) -> ReconResult<String>;
}

/// Authentication gate the caller consults before invoking the core
///
/// The core does not implement authentication; this is the contract the
/// surrounding shell satisfies before any classification or merge runs.
pub trait AuthGate: Send + Sync {
    /// True iff the presented identity and secret are accepted
    fn check(&self, identity: &str, secret: &str) -> bool;
}

/// Credential pair resolved from injected configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Login identity
    pub identity: String,
    /// Login secret
    pub secret: String,
}

impl Credentials {
    /// Create credentials from explicit values
    pub fn new(identity: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            secret: secret.into(),
        }
    }

    /// Resolve credentials from the named environment variables, if both
    /// are set
    pub fn from_env(identity_var: &str, secret_var: &str) -> Option<Self> {
        match (std::env::var(identity_var), std::env::var(secret_var)) {
            (Ok(identity), Ok(secret)) => Some(Self { identity, secret }),
            _ => None,
        }
    }
}

/// [`AuthGate`] backed by a single injected credential pair
pub struct StaticGate {
    credentials: Credentials,
}

impl StaticGate {
    /// Create a gate that accepts exactly the given credentials
    pub fn new(credentials: Credentials) -> Self {
        Self { credentials }
    }
}

impl AuthGate for StaticGate {
    fn check(&self, identity: &str, secret: &str) -> bool {
        identity == self.credentials.identity && secret == self.credentials.secret
    }
}
