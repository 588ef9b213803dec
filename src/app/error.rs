use gc_base::ConfigError;
use gc_mod_git::ScanError;
use gc_mod_github::auth::AuthError;
use gc_mod_github::{CredentialError, RemoteError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error("GitHub: {0}")]
    Remote(#[from] RemoteError),

    #[error("login failed: {0}")]
    Auth(#[from] AuthError),

    #[error("working tree: {0}")]
    Scan(#[from] ScanError),

    #[error("not authenticated, run `gitclock login` first")]
    NotLoggedIn,

    #[error("could not install signal handler: {0}")]
    Signal(std::io::Error),
}
