//! Remote activity log on GitHub: content API client, log-table
//! reconciliation, repository provisioning and the OAuth login handshake.

pub mod auth;
pub mod client;
pub mod content;
pub mod credentials;
pub mod reconcile;
pub mod table;

pub use client::{GithubClient, RepoContents, RepoRef};
pub use content::{ContentApi, RemoteError, RemoteFile};
pub use credentials::{CredentialError, CredentialStore};
pub use reconcile::{ReconcileError, ReconcileOutcome, RemoteLogReconciler};
