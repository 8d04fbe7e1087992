// src/repository/client.rs

//! HTTP client for upstream lookups
//!
//! Wraps reqwest with a timeout and an optional GitHub token that is only
//! sent to the GitHub API. Every request is made once; a transport failure
//! is returned to the caller, which treats it as "no data".

use crate::error::{Error, Result};
use reqwest::blocking::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Default timeout for HTTP requests (30 seconds)
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

const API_HOST: &str = "api.github.com";

/// HTTP client wrapper
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    token: Option<String>,
}

impl HttpClient {
    /// Create a new client
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .user_agent(concat!("melpazoid/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                Error::NetworkUnavailable(format!("Failed to create HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            token: None,
        })
    }

    /// Authenticate GitHub API requests with `token`
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.is_empty());
        self
    }

    fn request(&self, url: &str) -> RequestBuilder {
        let request = self.client.get(url);
        match &self.token {
            Some(token) if is_api_url(url) => request.header("Authorization", format!("token {token}")),
            _ => request,
        }
    }

    fn send(&self, url: &str) -> Result<reqwest::blocking::Response> {
        self.request(url).send().map_err(|e| {
            warn!("Fetch of {} failed: {}", url, e);
            Error::NetworkUnavailable(format!("Failed to fetch {url}: {e}"))
        })
    }

    /// Fetch a URL as text, failing on a non-success status
    pub fn get_text(&self, url: &str) -> Result<String> {
        debug!("GET {}", url);
        let response = self.send(url)?;
        if !response.status().is_success() {
            return Err(Error::NetworkUnavailable(format!(
                "HTTP {} from {}",
                response.status(),
                url
            )));
        }
        response
            .text()
            .map_err(|e| Error::NetworkUnavailable(format!("Failed to read response from {url}: {e}")))
    }

    /// Fetch and deserialize a JSON document
    pub fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let text = self.get_text(url)?;
        serde_json::from_str(&text)
            .map_err(|e| Error::ParseError(format!("Invalid JSON from {url}: {e}")))
    }

    /// Whether `url` answers with a success status
    pub fn exists(&self, url: &str) -> bool {
        match self.send(url) {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!("{}", e);
                false
            }
        }
    }
}

fn is_api_url(url: &str) -> bool {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h == API_HOST))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_only_for_api_host() {
        assert!(is_api_url("https://api.github.com/repos/melpa/melpa/pulls/1"));
        assert!(!is_api_url("https://github.com/melpa/melpa/pull/1.diff"));
        assert!(!is_api_url("not a url"));
    }

    #[test]
    fn test_empty_token_is_ignored() {
        let client = HttpClient::new().unwrap().with_token(Some(String::new()));
        assert!(client.token.is_none());
    }

    #[test]
    fn test_unreachable_host_is_tried_once() {
        let client = HttpClient::new().unwrap();
        let started = std::time::Instant::now();
        assert!(!client.exists("http://127.0.0.1:9/"));
        assert!(client.get_text("http://127.0.0.1:9/").is_err());
        assert!(started.elapsed() < Duration::from_secs(1));
    }
}
