//! URL shortening collaborator. Best effort: the long URL is always a valid answer.

use serde_json::Value;
use std::time::Duration;

/// One shortening backend, tried in list order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ShortenService {
    /// pxl.to (needs an API key).
    Pxl { api_key: String, endpoint: String },
    /// is.gd, plain-text response.
    IsGd { endpoint: String },
    /// TinyURL, plain-text response.
    TinyUrl { endpoint: String },
}

impl ShortenService {
    pub fn pxl(api_key: impl Into<String>) -> Self {
        Self::Pxl {
            api_key: api_key.into(),
            endpoint: "https://api.pxl.to/api/v1/short".to_string(),
        }
    }

    pub fn is_gd() -> Self {
        Self::IsGd {
            endpoint: "https://is.gd/create.php".to_string(),
        }
    }

    pub fn tiny_url() -> Self {
        Self::TinyUrl {
            endpoint: "https://tinyurl.com/api-create.php".to_string(),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            ShortenService::Pxl { .. } => "pxl.to",
            ShortenService::IsGd { .. } => "is.gd",
            ShortenService::TinyUrl { .. } => "tinyurl",
        }
    }
}

#[derive(Clone, Debug)]
pub struct Shortener {
    client: reqwest::Client,
    services: Vec<ShortenService>,
}

impl Shortener {
    pub fn new(services: Vec<ShortenService>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap_or_default();
        Self { client, services }
    }

    /// pxl.to first when a key is configured, then is.gd, then TinyURL.
    pub fn with_defaults(pxl_api_key: Option<String>) -> Self {
        let mut services = Vec::new();
        if let Some(key) = pxl_api_key.filter(|k| !k.is_empty()) {
            services.push(ShortenService::pxl(key));
        }
        services.push(ShortenService::is_gd());
        services.push(ShortenService::tiny_url());
        Self::new(services)
    }

    pub fn services(&self) -> &[ShortenService] {
        &self.services
    }

    /// Shorten `long_url`, falling back to it unchanged when every service fails.
    pub async fn shorten(&self, long_url: &str) -> String {
        for service in &self.services {
            match self.try_service(service, long_url).await {
                Ok(Some(short)) => return short,
                Ok(None) => log::warn!("{} returned no short URL", service.name()),
                Err(e) => log::warn!("{} failed: {}", service.name(), e),
            }
        }
        long_url.to_string()
    }

    async fn try_service(
        &self,
        service: &ShortenService,
        long_url: &str,
    ) -> Result<Option<String>, reqwest::Error> {
        match service {
            ShortenService::Pxl { api_key, endpoint } => {
                let body: Value = self
                    .client
                    .post(endpoint)
                    .bearer_auth(api_key)
                    .json(&serde_json::json!({ "destination": long_url }))
                    .send()
                    .await?
                    .error_for_status()?
                    .json()
                    .await?;
                Ok(extract_short_url(&body))
            }
            ShortenService::IsGd { endpoint } => {
                let text = self
                    .client
                    .get(endpoint)
                    .query(&[("format", "simple"), ("url", long_url)])
                    .send()
                    .await?
                    .error_for_status()?
                    .text()
                    .await?;
                Ok(plain_short_url(&text))
            }
            ShortenService::TinyUrl { endpoint } => {
                let text = self
                    .client
                    .get(endpoint)
                    .query(&[("url", long_url)])
                    .send()
                    .await?
                    .error_for_status()?
                    .text()
                    .await?;
                Ok(plain_short_url(&text))
            }
        }
    }
}

/// Find the short link in a pxl.to response; it has used several field names.
pub fn extract_short_url(body: &Value) -> Option<String> {
    let candidates = [
        body.get("short_url"),
        body.get("link"),
        body.pointer("/data/link"),
        body.pointer("/data/short_url"),
    ];
    candidates
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

fn plain_short_url(text: &str) -> Option<String> {
    let text = text.trim();
    if text.starts_with("http") {
        Some(text.to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_known_fields() {
        let body = serde_json::json!({ "data": { "link": "https://pxl.to/abc" } });
        assert_eq!(extract_short_url(&body).as_deref(), Some("https://pxl.to/abc"));
        let body = serde_json::json!({ "short_url": "https://pxl.to/x" });
        assert_eq!(extract_short_url(&body).as_deref(), Some("https://pxl.to/x"));
        assert_eq!(extract_short_url(&serde_json::json!({ "ok": true })), None);
    }

    #[test]
    fn plain_text_must_look_like_a_url() {
        assert_eq!(plain_short_url(" https://is.gd/q \n").as_deref(), Some("https://is.gd/q"));
        assert_eq!(plain_short_url("Error: rate limited"), None);
    }

    #[test]
    fn defaults_put_pxl_first_only_with_key() {
        assert_eq!(Shortener::with_defaults(None).services().len(), 2);
        let s = Shortener::with_defaults(Some("k".into()));
        assert_eq!(s.services()[0], ShortenService::pxl("k"));
        assert_eq!(Shortener::with_defaults(Some(String::new())).services().len(), 2);
    }

    #[tokio::test]
    async fn falls_back_to_long_url() {
        let long = "http://localhost:8080/#state=abc";
        assert_eq!(Shortener::new(Vec::new()).shorten(long).await, long);

        let unreachable = Shortener::new(vec![ShortenService::IsGd {
            endpoint: "http://127.0.0.1:9/create.php".to_string(),
        }]);
        assert_eq!(unreachable.shorten(long).await, long);
    }
}
