mod error;
pub mod login;
pub mod pipeline;
pub mod scheduler;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use gc_base::{ChangeBatch, Config};
use gc_mod_git::{GitCli, WorkingTreeScanner};
use gc_mod_github::{CredentialStore, GithubClient, RemoteLogReconciler, table};
use tracing::info;

pub use error::AppError;
use pipeline::Pipeline;
use scheduler::{PhaseTracker, PollingScheduler, TickRunner, log_outcome};

/// How often the foreground loop checks for a termination signal
const SIGNAL_POLL_MS: u64 = 200;

fn scanner(config: &Config) -> WorkingTreeScanner<GitCli> {
    WorkingTreeScanner::new(GitCli::new(&config.working_tree, config.git_timeout_secs))
}

/// `gitclock run`: provision the log repository, then poll until interrupted.
pub fn run(config: &Config, once: bool) -> Result<(), AppError> {
    let store = CredentialStore::new(&config.data_dir);
    let token = store.load()?.ok_or(AppError::NotLoggedIn)?;

    let client = GithubClient::new(&config.github_api_url, token)?;
    let repo = client.ensure_repository_exists(&config.repo_name)?;
    info!(repo = %repo, file = %config.log_file, "logging working tree {}", config.working_tree.display());

    let reconciler = RemoteLogReconciler::new(client.contents(repo), config.log_file.clone());
    let mut pipeline = Pipeline::new(scanner(config), reconciler);

    if once {
        let outcome = pipeline.run_tick(&PhaseTracker::default());
        log_outcome(&outcome);
        return Ok(());
    }

    let term = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(signal_hook::consts::SIGINT, Arc::clone(&term)).map_err(AppError::Signal)?;
    signal_hook::flag::register(signal_hook::consts::SIGTERM, Arc::clone(&term)).map_err(AppError::Signal)?;

    let handle = PollingScheduler::start(pipeline, Duration::from_secs(config.poll_interval_secs));
    info!("polling every {}s, press Ctrl-C to stop", config.poll_interval_secs);
    while !term.load(Ordering::Relaxed) {
        thread::sleep(Duration::from_millis(SIGNAL_POLL_MS));
    }
    info!("stopping after the current tick");
    handle.stop();
    info!("gitclock stopped");
    Ok(())
}

/// `gitclock scan`: print the rows the current tree would add, without
/// touching the remote log.
pub fn scan(config: &Config) -> Result<(), AppError> {
    let scanner = scanner(config);
    match ChangeBatch::build(scanner.try_scan()?) {
        Some(batch) => print!("{}", table::render_rows(&batch)),
        None => println!("Working tree clean."),
    }
    Ok(())
}
