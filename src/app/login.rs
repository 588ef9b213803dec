//! `gitclock login`: OAuth handshake, credential persistence, repository
//! provisioning.

use std::sync::Arc;
use std::time::Duration;

use gc_base::Config;
use gc_base::constants::HTTP_TIMEOUT_SECS;
use gc_mod_github::auth::{self, CallbackListener};
use gc_mod_github::{CredentialStore, GithubClient};
use reqwest::blocking::Client;
use tracing::{info, warn};

use super::AppError;

pub fn run_login(config: &Config) -> Result<(), AppError> {
    let oauth = config.oauth()?;

    // Listen before the browser can redirect
    let listener = CallbackListener::bind(&oauth.redirect_uri)?;
    info!("waiting for the OAuth callback on {}", oauth.redirect_uri);

    println!("Opening GitHub login page...");
    println!("If no browser opens, visit:\n  {}", oauth.auth_url);
    auth::open_browser(&oauth.auth_url);

    let pending = listener.wait_for_code(Duration::from_secs(oauth.timeout_secs))?;

    let http = Client::builder()
        .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
        .build()
        .map_err(auth::AuthError::from)?;
    let token = match auth::exchange_code(&http, oauth, &pending.code) {
        Ok(token) => {
            pending.respond(true, "You can close this window and return to your terminal.");
            token
        }
        Err(e) => {
            pending.respond(false, &format!("Error exchanging code for token: {}", e));
            return Err(e.into());
        }
    };

    let store = CredentialStore::new(&config.data_dir);
    store.save(&token)?;
    info!("credential saved to {}", store.path().display());
    println!("GitHub login successful!");

    let client = GithubClient::new(&config.github_api_url, Arc::new(token))?;
    match client.ensure_repository_exists(&config.repo_name) {
        Ok(repo) => println!("Activity log repository: {}", repo),
        Err(e) => warn!(error = %e, "login succeeded but the repository could not be provisioned"),
    }
    Ok(())
}
