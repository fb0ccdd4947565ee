use crate::fetch::client::HttpClient;
use anyhow::Context;
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderValue};

/// An [`HttpClient`] wrapper that sends `Authorization: Bearer <token>` with
/// every request, for datasets served behind a token.
pub struct BearerToken<C> {
    inner: C,
    value: HeaderValue,
}

impl<C> BearerToken<C> {
    /// Fails if the token contains characters not allowed in a header.
    pub fn new(inner: C, token: &str) -> anyhow::Result<Self> {
        let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
            .context("dataset token is not a valid header value")?;
        value.set_sensitive(true);
        Ok(Self { inner, value })
    }

    fn authorize(&self, req: &mut reqwest::Request) {
        req.headers_mut().insert(AUTHORIZATION, self.value.clone());
    }
}

#[async_trait]
impl<C: HttpClient> HttpClient for BearerToken<C> {
    async fn execute(&self, mut req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        self.authorize(&mut req);
        self.inner.execute(req).await
    }
}
