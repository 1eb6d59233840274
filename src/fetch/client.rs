use async_trait::async_trait;
use reqwest::{Request, Response};

/// Executes a single prepared request. Implemented by the real session client
/// and by header-injecting wrappers; tests provide canned implementations.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}

/// A reqwest client that keeps cookies between requests, so a visit to the
/// landing page seeds the session used for the data download.
pub struct SessionClient(reqwest::Client);

impl SessionClient {
    pub fn new() -> reqwest::Result<Self> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .gzip(true)
            .deflate(true)
            .build()?;
        Ok(Self(client))
    }
}

#[async_trait]
impl HttpClient for SessionClient {
    async fn execute(&self, req: Request) -> reqwest::Result<Response> {
        self.0.execute(req).await
    }
}
