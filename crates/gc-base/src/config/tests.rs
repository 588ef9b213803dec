use std::collections::HashMap;

use secrecy::ExposeSecret;
use tempfile::TempDir;

use super::*;

fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    move |key| map.get(key).cloned()
}

fn data_dir() -> PathBuf {
    PathBuf::from("/tmp/gitclock-test")
}

#[test]
fn defaults_apply_when_nothing_is_set() {
    let cfg = Config::from_sources(FileConfig::default(), env_of(&[]), data_dir()).unwrap();
    assert_eq!(cfg.github_api_url, DEFAULT_GITHUB_API_URL);
    assert_eq!(cfg.repo_name, DEFAULT_REPO_NAME);
    assert_eq!(cfg.log_file, DEFAULT_LOG_FILE);
    assert_eq!(cfg.poll_interval_secs, DEFAULT_POLL_INTERVAL_SECS);
    assert_eq!(cfg.working_tree, PathBuf::from("."));
    assert!(cfg.oauth.is_none());
    assert!(cfg.oauth().is_err());
}

#[test]
fn env_overrides_file() {
    let file = FileConfig { repo_name: Some("from-file".into()), poll_interval_secs: Some(10), ..Default::default() };
    let cfg =
        Config::from_sources(file, env_of(&[("REPO_NAME", "from-env"), ("GITCLOCK_POLL_SECS", "5")]), data_dir())
            .unwrap();
    assert_eq!(cfg.repo_name, "from-env");
    assert_eq!(cfg.poll_interval_secs, 5);
}

#[test]
fn file_used_when_env_empty() {
    let file = FileConfig { repo_name: Some("from-file".into()), ..Default::default() };
    let cfg = Config::from_sources(file, env_of(&[("REPO_NAME", "")]), data_dir()).unwrap();
    assert_eq!(cfg.repo_name, "from-file");
}

#[test]
fn zero_poll_interval_rejected() {
    let err = Config::from_sources(FileConfig::default(), env_of(&[("GITCLOCK_POLL_SECS", "0")]), data_dir());
    assert!(matches!(err, Err(ConfigError::Invalid { key: "GITCLOCK_POLL_SECS", .. })));
}

#[test]
fn non_numeric_poll_interval_rejected() {
    let err = Config::from_sources(FileConfig::default(), env_of(&[("GITCLOCK_POLL_SECS", "soon")]), data_dir());
    assert!(matches!(err, Err(ConfigError::Invalid { .. })));
}

#[test]
fn blank_repo_name_rejected() {
    let file = FileConfig { repo_name: Some("  ".into()), ..Default::default() };
    assert!(Config::from_sources(file, env_of(&[]), data_dir()).is_err());
}

#[test]
fn api_url_trailing_slash_trimmed() {
    let cfg =
        Config::from_sources(FileConfig::default(), env_of(&[("GITHUB_API_URL", "http://localhost:9/")]), data_dir())
            .unwrap();
    assert_eq!(cfg.github_api_url, "http://localhost:9");
}

#[test]
fn oauth_group_requires_every_key() {
    let partial = env_of(&[("CLIENT_ID", "id"), ("CLIENT_SECRET", "secret")]);
    let cfg = Config::from_sources(FileConfig::default(), partial, data_dir()).unwrap();
    assert!(cfg.oauth.is_none());

    let full = env_of(&[
        ("CLIENT_ID", "id"),
        ("CLIENT_SECRET", "secret"),
        ("AUTH_URL", "https://github.com/login/oauth/authorize?client_id=id"),
        ("TOKEN_URL", "https://github.com/login/oauth/access_token"),
        ("REDIRECT_URI", "http://localhost:5000/oauthCallback"),
    ]);
    let cfg = Config::from_sources(FileConfig::default(), full, data_dir()).unwrap();
    let oauth = cfg.oauth().unwrap();
    assert_eq!(oauth.client_id, "id");
    assert_eq!(oauth.client_secret.expose_secret(), "secret");
    assert_eq!(oauth.timeout_secs, DEFAULT_AUTH_TIMEOUT_SECS);
}

#[test]
fn yaml_file_is_parsed() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("config.yaml");
    std::fs::write(&path, "repo_name: yaml-repo\npoll_interval_secs: 120\nlog_file: /ACTIVITY.md\n").unwrap();

    let file = read_file_config(&path).unwrap().unwrap();
    let cfg = Config::from_sources(file, env_of(&[]), data_dir()).unwrap();
    assert_eq!(cfg.repo_name, "yaml-repo");
    assert_eq!(cfg.poll_interval_secs, 120);
    assert_eq!(cfg.log_file, "ACTIVITY.md");
}

#[test]
fn missing_yaml_file_is_none() {
    let tmp = TempDir::new().unwrap();
    assert!(read_file_config(&tmp.path().join("nope.yaml")).unwrap().is_none());
}

#[test]
fn broken_yaml_is_an_error() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("config.yaml");
    std::fs::write(&path, "poll_interval_secs: [not, a, number]\n").unwrap();
    assert!(matches!(read_file_config(&path), Err(ConfigError::Yaml { .. })));
}
