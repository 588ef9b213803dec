use thiserror::Error;

/// A file as read from the repository content API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    /// Decoded file bytes
    pub content: Vec<u8>,
    /// Revision token (blob sha) the next update must be conditioned on
    pub sha: String,
}

#[derive(Error, Debug)]
pub enum RemoteError {
    /// The write was conditioned on a revision that is no longer current
    #[error("remote file changed since it was read")]
    Conflict,

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("GitHub API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("unexpected response: {0}")]
    Decode(String),
}

/// The three content operations the reconciler needs.
///
/// Content crosses this boundary as raw bytes; transport encoding is the
/// implementor's business, text decoding is the caller's.
pub trait ContentApi {
    /// `Ok(None)` when the file does not exist.
    fn read_file(&self, path: &str) -> Result<Option<RemoteFile>, RemoteError>;
    fn create_file(&self, path: &str, content: &[u8], message: &str) -> Result<(), RemoteError>;
    fn update_file(&self, path: &str, content: &[u8], sha: &str, message: &str) -> Result<(), RemoteError>;
}

impl<T: ContentApi + ?Sized> ContentApi for &T {
    fn read_file(&self, path: &str) -> Result<Option<RemoteFile>, RemoteError> {
        (**self).read_file(path)
    }
    fn create_file(&self, path: &str, content: &[u8], message: &str) -> Result<(), RemoteError> {
        (**self).create_file(path, content, message)
    }
    fn update_file(&self, path: &str, content: &[u8], sha: &str, message: &str) -> Result<(), RemoteError> {
        (**self).update_file(path, content, sha, message)
    }
}
