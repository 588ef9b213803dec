//! GitHub REST client: repository provisioning and the content API.

use std::sync::Arc;
use std::time::Duration;

use base64::{Engine as _, engine::general_purpose};
use gc_base::constants::{APP_NAME, HTTP_TIMEOUT_SECS};
use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretBox};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use crate::content::{ContentApi, RemoteError, RemoteFile};

const GITHUB_API_VERSION: &str = "2022-11-28";

/// Page size for `/user/repos`
const REPOS_PER_PAGE: usize = 100;

/// `owner/name` of the repository that hosts the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl std::fmt::Display for RepoRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

#[derive(Clone)]
pub struct GithubClient {
    http: Client,
    api_url: Url,
    token: Arc<SecretBox<String>>,
}

#[derive(Deserialize)]
struct User {
    login: String,
}

#[derive(Deserialize)]
struct Repo {
    name: String,
    owner: User,
}

#[derive(Serialize)]
struct CreateRepo<'a> {
    name: &'a str,
    private: bool,
    description: &'a str,
}

#[derive(Deserialize)]
struct ContentResponse {
    sha: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    encoding: String,
}

#[derive(Deserialize)]
struct Blob {
    content: String,
    encoding: String,
}

#[derive(Serialize)]
struct PutContent<'a> {
    message: &'a str,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

impl GithubClient {
    pub fn new(api_url: &str, token: Arc<SecretBox<String>>) -> Result<Self, RemoteError> {
        let api_url =
            Url::parse(api_url).map_err(|e| RemoteError::Decode(format!("bad API URL {}: {}", api_url, e)))?;
        let http = Client::builder()
            .user_agent(format!("{}/{}", APP_NAME, env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()?;
        Ok(Self { http, api_url, token })
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.api_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty();
            for segment in segments {
                path.extend(segment.split('/').filter(|s| !s.is_empty()));
            }
        }
        url
    }

    fn authed(&self, req: RequestBuilder) -> RequestBuilder {
        req.header("Authorization", format!("Bearer {}", self.token.expose_secret()))
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", GITHUB_API_VERSION)
    }

    /// Login of the token's owner.
    pub fn current_user(&self) -> Result<String, RemoteError> {
        let resp = self.authed(self.http.get(self.url(&["user"]))).send()?;
        let user: User = json_or_error(resp)?;
        Ok(user.login)
    }

    /// Find the named repository among the user's own, creating it when absent.
    pub fn ensure_repository_exists(&self, repo_name: &str) -> Result<RepoRef, RemoteError> {
        let login = self.current_user()?;

        let mut page = 1;
        loop {
            let mut url = self.url(&["user", "repos"]);
            url.query_pairs_mut()
                .append_pair("per_page", &REPOS_PER_PAGE.to_string())
                .append_pair("page", &page.to_string())
                .append_pair("affiliation", "owner");
            let repos: Vec<Repo> = json_or_error(self.authed(self.http.get(url)).send()?)?;

            if let Some(found) =
                repos.iter().find(|r| r.name.eq_ignore_ascii_case(repo_name) && r.owner.login == login)
            {
                info!("Repository {}/{} exists", found.owner.login, found.name);
                return Ok(RepoRef { owner: found.owner.login.clone(), name: found.name.clone() });
            }
            if repos.len() < REPOS_PER_PAGE {
                break;
            }
            page += 1;
        }

        info!("Repository {} not found, creating it", repo_name);
        let body = CreateRepo {
            name: repo_name,
            private: false,
            description: "Working-tree activity log kept by gitclock",
        };
        let resp = self.authed(self.http.post(self.url(&["user", "repos"]))).json(&body).send()?;
        if resp.status() == StatusCode::UNPROCESSABLE_ENTITY {
            // Created concurrently by another client
            debug!("Repository {} already exists", repo_name);
            return Ok(RepoRef { owner: login, name: repo_name.to_string() });
        }
        let created: Repo = json_or_error(resp)?;
        info!("Repository {}/{} created", created.owner.login, created.name);
        Ok(RepoRef { owner: created.owner.login, name: created.name })
    }

    /// Content API bound to one repository.
    pub fn contents(&self, repo: RepoRef) -> RepoContents {
        RepoContents { client: self.clone(), repo }
    }
}

/// `ContentApi` over `/repos/{owner}/{repo}/contents/{path}`.
#[derive(Clone)]
pub struct RepoContents {
    client: GithubClient,
    repo: RepoRef,
}

impl RepoContents {
    pub fn repo(&self) -> &RepoRef {
        &self.repo
    }

    fn file_url(&self, path: &str) -> Url {
        self.client.url(&["repos", &self.repo.owner, &self.repo.name, "contents", path])
    }

    fn read_blob(&self, sha: &str) -> Result<Vec<u8>, RemoteError> {
        let url = self.client.url(&["repos", &self.repo.owner, &self.repo.name, "git", "blobs", sha]);
        let blob: Blob = json_or_error(self.client.authed(self.client.http.get(url)).send()?)?;
        if blob.encoding != "base64" {
            return Err(RemoteError::Decode(format!("unsupported blob encoding {:?}", blob.encoding)));
        }
        decode_base64(&blob.content)
    }

    fn put(&self, path: &str, content: &[u8], sha: Option<&str>, message: &str) -> Result<Response, RemoteError> {
        let body = PutContent { message, content: general_purpose::STANDARD.encode(content), sha };
        Ok(self.client.authed(self.client.http.put(self.file_url(path))).json(&body).send()?)
    }
}

impl ContentApi for RepoContents {
    fn read_file(&self, path: &str) -> Result<Option<RemoteFile>, RemoteError> {
        let resp = self.client.authed(self.client.http.get(self.file_url(path))).send()?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let file: ContentResponse = json_or_error(resp)?;
        let content = match file.encoding.as_str() {
            "base64" => decode_base64(&file.content)?,
            // Files over 1 MB come back without content; the blob API still serves them
            "none" => {
                debug!(path, sha = %file.sha, "content omitted, fetching blob");
                self.read_blob(&file.sha)?
            }
            other => return Err(RemoteError::Decode(format!("unsupported content encoding {:?}", other))),
        };
        Ok(Some(RemoteFile { content, sha: file.sha }))
    }

    fn create_file(&self, path: &str, content: &[u8], message: &str) -> Result<(), RemoteError> {
        let resp = self.put(path, content, None, message)?;
        match resp.status() {
            s if s.is_success() => Ok(()),
            // 422: the file appeared after our read, so a sha is now required
            StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => Err(RemoteError::Conflict),
            _ => Err(api_error(resp)),
        }
    }

    fn update_file(&self, path: &str, content: &[u8], sha: &str, message: &str) -> Result<(), RemoteError> {
        let resp = self.put(path, content, Some(sha), message)?;
        match resp.status() {
            s if s.is_success() => Ok(()),
            StatusCode::CONFLICT | StatusCode::PRECONDITION_FAILED => Err(RemoteError::Conflict),
            _ => Err(api_error(resp)),
        }
    }
}

/// GitHub wraps base64 payloads at 60 columns.
fn decode_base64(text: &str) -> Result<Vec<u8>, RemoteError> {
    let packed: String = text.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    general_purpose::STANDARD.decode(packed).map_err(|e| RemoteError::Decode(e.to_string()))
}

fn api_error(resp: Response) -> RemoteError {
    let status = resp.status().as_u16();
    let body = resp.text().unwrap_or_default();
    RemoteError::Api { status, body }
}

fn json_or_error<T: serde::de::DeserializeOwned>(resp: Response) -> Result<T, RemoteError> {
    if !resp.status().is_success() {
        return Err(api_error(resp));
    }
    let text = resp.text()?;
    serde_json::from_str(&text).map_err(|e| RemoteError::Decode(e.to_string()))
}
