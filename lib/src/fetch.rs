use std::io;
use std::sync::Arc;
use std::path::{Path, PathBuf};

use crate::error::{Chainable, Error, Result};

/// A fetched document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: String,
}

impl Response {
    pub fn ok(body: impl Into<String>) -> Self {
        Response { status: 200, body: body.into() }
    }

    pub fn with_status(status: u16) -> Self {
        Response { status, body: String::new() }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Returns `self` if the status is a success, an error otherwise.
    pub fn success(self, target: &str) -> Result<Self> {
        if !self.is_success() {
            return err! {
                "request returned a failure status",
                "target" => target,
                "status" => self.status,
            };
        }

        Ok(self)
    }
}

/// Retrieves documents by name: the partials document and the event feed.
///
/// Every call is a suspension point; nothing is cancelled and no timeout is
/// imposed.
#[allow(async_fn_in_trait)]
pub trait Fetch {
    async fn fetch(&self, target: &str) -> Result<Response>;
}

impl<T: Fetch> Fetch for &T {
    async fn fetch(&self, target: &str) -> Result<Response> {
        (**self).fetch(target).await
    }
}

impl<T: Fetch> Fetch for Arc<T> {
    async fn fetch(&self, target: &str) -> Result<Response> {
        (**self).fetch(target).await
    }
}

/// Fetches from a directory. A missing file is a `404`.
#[derive(Debug, Clone)]
pub struct FsFetch {
    root: PathBuf,
}

impl FsFetch {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        FsFetch { root: root.as_ref().to_path_buf() }
    }
}

impl Fetch for FsFetch {
    async fn fetch(&self, target: &str) -> Result<Response> {
        let path = self.root.join(target.trim_start_matches('/'));
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Response::ok(String::from_utf8_lossy(&bytes))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Response::with_status(404)),
            Err(e) => Err(Error::from(e)).chain_with(|| error! {
                "failed to read document",
                "path" => path.display(),
            }),
        }
    }
}

/// Fetches over HTTP relative to a base URL.
#[cfg(feature = "http")]
#[derive(Debug, Clone)]
pub struct HttpFetch {
    client: reqwest::Client,
    base: reqwest::Url,
}

#[cfg(feature = "http")]
impl HttpFetch {
    pub fn new(base: &str) -> Result<Self> {
        let base = reqwest::Url::parse(base)
            .map_err(|e| error!("invalid base URL", "url" => base, e))?;

        Ok(HttpFetch { client: reqwest::Client::new(), base })
    }
}

#[cfg(feature = "http")]
impl Fetch for HttpFetch {
    async fn fetch(&self, target: &str) -> Result<Response> {
        let url = self.base.join(target)
            .map_err(|e| error!("invalid fetch target", "target" => target, e))?;

        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        Ok(Response { status, body: response.text().await? })
    }
}
