use crate::fetch::client::HttpClient;
use async_trait::async_trait;
use reqwest::header::{
    ACCEPT, ACCEPT_LANGUAGE, CONNECTION, HeaderMap, HeaderValue, REFERER,
    UPGRADE_INSECURE_REQUESTS, USER_AGENT,
};

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// An [`HttpClient`] wrapper that makes every request look like it came from a
/// desktop browser arriving from `referer`.
///
/// `Accept-Encoding` is deliberately absent: reqwest only decompresses bodies
/// when it negotiates the encoding itself.
pub struct BrowserHeaders<C> {
    pub inner: C,
    headers: HeaderMap,
}

impl<C> BrowserHeaders<C> {
    pub fn new(inner: C, referer: &'static str) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
        headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
        headers.insert(UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));
        headers.insert(REFERER, HeaderValue::from_static(referer));
        Self { inner, headers }
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

#[async_trait]
impl<C: HttpClient> HttpClient for BrowserHeaders<C> {
    async fn execute(&self, mut req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        for (name, value) in &self.headers {
            // headers already set on the request win
            if !req.headers().contains_key(name) {
                req.headers_mut().insert(name.clone(), value.clone());
            }
        }
        self.inner.execute(req).await
    }
}
