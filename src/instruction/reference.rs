//! Fetch a reference page and reduce it to plain text for the prompt.

use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;
use reqwest::{Client, Url};

use super::InstructionError;

/// Where reference docs come from.
#[async_trait]
pub trait ReferenceSource: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<String, InstructionError>;
}

#[async_trait]
impl ReferenceSource for Client {
    async fn fetch(&self, url: &Url) -> Result<String, InstructionError> {
        fetch_reference(self, url).await
    }
}

fn script_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?is)<script[^>]*>.*?</script>").expect("valid script pattern"))
}

fn tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)<[^>]+>").expect("valid tag pattern"))
}

/// Drop `<script>` elements with their contents, then every remaining tag.
pub fn clean_html(raw: &str) -> String {
    let without_scripts = script_pattern().replace_all(raw, "");
    tag_pattern().replace_all(&without_scripts, "").into_owned()
}

/// Download `url` and return its text with markup removed.
pub async fn fetch_reference(http: &Client, url: &Url) -> Result<String, InstructionError> {
    let fetch_err = |source: reqwest::Error| InstructionError::Fetch {
        url: url.to_string(),
        source,
    };

    let body = http
        .get(url.clone())
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(fetch_err)?
        .bytes()
        .await
        .map_err(fetch_err)?;

    let raw = String::from_utf8(body.to_vec()).map_err(|_| InstructionError::Decode(url.to_string()))?;
    Ok(clean_html(&raw))
}
