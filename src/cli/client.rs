use reqwest::Method;
use serde_json::Value;

use crate::middleware::IDENTITY_HEADER;

/// Thin HTTP client for the flag manager API
pub struct ApiClient {
    http: reqwest::Client,
    base: url::Url,
    user: Option<String>,
}

/// Non-2xx answer from the server
#[derive(Debug, thiserror::Error)]
#[error("{status} {code}: {message}")]
pub struct ApiFailure {
    pub status: u16,
    pub code: String,
    pub message: String,
}

impl ApiClient {
    pub fn new(server: &str, user: Option<String>) -> anyhow::Result<Self> {
        let base = url::Url::parse(server)
            .map_err(|e| anyhow::anyhow!("Invalid server URL '{}': {}", server, e))?;
        Ok(Self {
            http: reqwest::Client::new(),
            base,
            user,
        })
    }

    pub fn base(&self) -> &url::Url {
        &self.base
    }

    /// `segments` are percent-encoded and joined below the base URL
    pub fn url(&self, segments: &[&str]) -> String {
        let mut url = self.base.as_str().trim_end_matches('/').to_string();
        for segment in segments.iter().filter(|s| !s.is_empty()) {
            url.push('/');
            url.push_str(&urlencoding::encode(segment));
        }
        url
    }

    pub async fn send(&self, method: Method, segments: &[&str], body: Option<&Value>) -> anyhow::Result<Value> {
        let url = self.url(segments);
        tracing::debug!("{} {}", method, url);

        let mut request = self.http.request(method, &url);
        if let Some(user) = &self.user {
            request = request.header(IDENTITY_HEADER, user);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        let value: Value = serde_json::from_str(&text).unwrap_or(Value::String(text));

        if !status.is_success() {
            return Err(ApiFailure {
                status: status.as_u16(),
                code: value["code"].as_str().unwrap_or("UNKNOWN").to_string(),
                message: value["error"]
                    .as_str()
                    .map(str::to_string)
                    .unwrap_or_else(|| value.to_string()),
            }
            .into());
        }
        Ok(value)
    }

    pub async fn get(&self, segments: &[&str]) -> anyhow::Result<Value> {
        self.send(Method::GET, segments, None).await
    }

    pub async fn post(&self, segments: &[&str], body: &Value) -> anyhow::Result<Value> {
        self.send(Method::POST, segments, Some(body)).await
    }

    pub async fn put(&self, segments: &[&str], body: &Value) -> anyhow::Result<Value> {
        self.send(Method::PUT, segments, Some(body)).await
    }

    pub async fn delete(&self, segments: &[&str]) -> anyhow::Result<Value> {
        self.send(Method::DELETE, segments, None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_encodes_segments_and_skips_empty_ones() {
        let client = ApiClient::new("http://localhost:3000/", None).unwrap();
        assert_eq!(
            client.url(&["parameters", "", "DARK_MODE"]),
            "http://localhost:3000/parameters/DARK_MODE"
        );
        assert_eq!(
            client.url(&["users", "ana@x.com"]),
            "http://localhost:3000/users/ana%40x.com"
        );
    }

    #[test]
    fn rejects_bad_server_url() {
        assert!(ApiClient::new("not a url", None).is_err());
    }
}
