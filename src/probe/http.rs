use std::collections::HashMap;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_LENGTH, SERVER};
use reqwest::{Client, ClientBuilder};
use scraper::{Html, Selector};

use crate::config::ScanConfig;

/// How much of a response body the probe keeps for title extraction and the
/// downstream analyzers.
const BODY_CAP: usize = 256 * 1024;

/// Raw facts from the first scheme that answered. The body is capped and
/// reused by the fingerprint and passive vulnerability checks so those
/// stages do not re-fetch.
#[derive(Debug, Clone)]
pub struct HttpFacts {
    pub url: String,
    pub scheme: String,
    pub status: u16,
    pub title: Option<String>,
    pub server: Option<String>,
    pub content_length: Option<u64>,
    pub headers: HashMap<String, String>,
    pub body: String,
}

pub struct HttpProbe {
    client: Client,
    timeout: Duration,
}

impl HttpProbe {
    pub fn from_config(config: &ScanConfig) -> anyhow::Result<Self> {
        let mut default_headers = HeaderMap::new();
        for (key, value) in &config.headers {
            let name: HeaderName = key.parse()?;
            let value: HeaderValue = value.parse()?;
            default_headers.insert(name, value);
        }

        let timeout = Duration::from_secs(config.timeout_secs);
        let client = ClientBuilder::new()
            .user_agent(config.user_agent.clone())
            .default_headers(default_headers)
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(5)))
            .gzip(true)
            .brotli(true)
            .use_rustls_tls()
            // Recon targets routinely present self-signed or mismatched
            // certificates; the TLS stage judges them separately.
            .danger_accept_invalid_certs(true)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self { client, timeout })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Probe `http://host` then `https://host`, returning facts from the
    /// first scheme that produced any response. Both failing is an error so
    /// the caller's retry policy can take a view; the pipeline still treats
    /// final failure as soft.
    pub async fn check(&self, host: &str) -> anyhow::Result<HttpFacts> {
        let mut last_err = None;
        for scheme in ["http", "https"] {
            let url = format!("{scheme}://{host}");
            match self.fetch(&url, scheme).await {
                Ok(facts) => return Ok(facts),
                Err(err) => {
                    tracing::debug!(%url, %err, "http probe attempt failed");
                    last_err = Some(err);
                }
            }
        }
        Err(last_err.expect("two schemes attempted"))
    }

    async fn fetch(&self, url: &str, scheme: &str) -> anyhow::Result<HttpFacts> {
        let response = self.client.get(url).send().await?;

        let status = response.status().as_u16();
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let server = response
            .headers()
            .get(SERVER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let declared_length = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());

        let bytes = response.bytes().await.unwrap_or_default();
        let content_length = declared_length.or(Some(bytes.len() as u64));
        let capped = &bytes[..bytes.len().min(BODY_CAP)];
        let body = String::from_utf8_lossy(capped).into_owned();
        let title = extract_title(&body);

        Ok(HttpFacts {
            url: url.to_string(),
            scheme: scheme.to_string(),
            status,
            title,
            server,
            content_length,
            headers,
            body,
        })
    }
}

/// Pull the `<title>` text out of an HTML body: whitespace collapsed,
/// truncated to 100 chars like every other free-text field we record.
pub fn extract_title(body: &str) -> Option<String> {
    let document = Html::parse_document(body);
    let selector = Selector::parse("title").ok()?;
    let element = document.select(&selector).next()?;
    let text: String = element.text().collect();
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        None
    } else {
        Some(truncate(&collapsed, 100))
    }
}

pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{cut}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_and_collapses_title() {
        let body = "<html><head><title>\n  Admin \t Console  </title></head></html>";
        assert_eq!(extract_title(body), Some("Admin Console".to_string()));
    }

    #[test]
    fn missing_or_empty_title_is_none() {
        assert_eq!(extract_title("<html><body>hi</body></html>"), None);
        assert_eq!(extract_title("<title>   </title>"), None);
    }

    #[test]
    fn long_titles_are_truncated() {
        let long = "x".repeat(150);
        let body = format!("<title>{long}</title>");
        let title = extract_title(&body).unwrap();
        assert_eq!(title.chars().count(), 103);
        assert!(title.ends_with("..."));
    }

    #[test]
    fn truncate_leaves_short_strings_alone() {
        assert_eq!(truncate("short", 100), "short");
    }
}
