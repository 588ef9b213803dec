mod app;
mod infra;

use std::process::ExitCode;

use gc_base::Config;
use tracing::error;

const USAGE: &str = "\
gitclock - record uncommitted working-tree activity in a GitHub-hosted log

Usage:
  gitclock login        Authorize with GitHub and store the access token
  gitclock run [--once] Poll the working tree and append changes to the log
  gitclock scan         Print the rows the current tree would add (dry run)
  gitclock help         Show this message

Configuration comes from config.yaml in the platform config directory, .env,
and the environment (CLIENT_ID, CLIENT_SECRET, AUTH_URL, TOKEN_URL,
REDIRECT_URI, GITHUB_API_URL, REPO_NAME, GITCLOCK_LOG_FILE, GITCLOCK_POLL_SECS,
GITCLOCK_WORKING_TREE, GITCLOCK_LOG).";

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    dotenvy::dotenv().ok();
    infra::logging::init();

    let command = args.get(1).map(String::as_str).unwrap_or("run");
    if matches!(command, "help" | "-h" | "--help") {
        println!("{}", USAGE);
        return ExitCode::SUCCESS;
    }

    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = match command {
        "run" => app::run(&config, args.iter().skip(2).any(|a| a == "--once")),
        "login" => app::login::run_login(&config),
        "scan" => app::scan(&config),
        other => {
            eprintln!("Unknown command: {}\n\n{}", other, USAGE);
            return ExitCode::FAILURE;
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
