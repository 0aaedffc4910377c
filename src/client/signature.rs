// JSAPI URL signing
use super::Client;
use crate::error::Result;
use crate::models::JsApiConfig;
use sha1::{Digest, Sha1};
use std::collections::BTreeMap;
use url::Url;

/// Overrides for [`Client::get_jsapi_config`]
#[derive(Debug, Clone, Default)]
pub struct SignOptions {
    /// Sign with this ticket instead of fetching one
    pub ticket: Option<String>,
    pub nonce: Option<String>,
    /// Milliseconds since the epoch
    pub timestamp: Option<i64>,
}

/// Normalize a page URL for signing
///
/// Drops the fragment and rewrites the query with its values decoded, so
/// `%2F` becomes `/`. Only `%`, `&`, `#`, `+`, spaces and ASCII control
/// characters are re-escaped, which keeps the result parsing back to the same
/// pairs (normalizing twice is a no-op).
pub fn normalize_url(url: &str) -> Result<String> {
    let mut parsed = Url::parse(url)?;

    let query = parsed
        .query_pairs()
        .map(|(key, value)| format!("{}={}", escape_reserved(&key), escape_reserved(&value)))
        .collect::<Vec<_>>()
        .join("&");

    parsed.set_fragment(None);
    parsed.set_query(None);

    if query.is_empty() {
        Ok(parsed.to_string())
    } else {
        Ok(format!("{}?{}", parsed, query))
    }
}

fn escape_reserved(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '%' => out.push_str("%25"),
            '&' => out.push_str("%26"),
            '#' => out.push_str("%23"),
            '+' => out.push_str("%2B"),
            // The URL parser strips tabs and newlines and trims edge spaces
            ' ' => out.push_str("%20"),
            c if c.is_ascii_control() => out.push_str(&format!("%{:02X}", c as u32)),
            _ => out.push(c),
        }
    }
    out
}

/// SHA-1 hex digest over the sorted `key=value` pairs of the signing object
pub fn sign(ticket: &str, nonce: &str, timestamp: i64, url: &str) -> String {
    let timestamp = timestamp.to_string();
    let fields = BTreeMap::from([
        ("jsapi_ticket", ticket),
        ("noncestr", nonce),
        ("timestamp", timestamp.as_str()),
        ("url", url),
    ]);

    let content = fields
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha1::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

impl Client {
    /// Config the front-end needs to call `dd.config` on `page_url`
    pub async fn get_jsapi_config(&self, page_url: &str, opts: SignOptions) -> Result<JsApiConfig> {
        let url = normalize_url(page_url)?;
        let ticket = match opts.ticket {
            Some(ticket) => ticket,
            None => self.get_jsapi_ticket().await?,
        };

        let timestamp = opts
            .timestamp
            .unwrap_or_else(|| chrono::Utc::now().timestamp_millis());
        let nonce = opts
            .nonce
            .unwrap_or_else(|| format!("{}#{}", self.nonce_prefix(), timestamp));

        let signature = sign(&ticket, &nonce, timestamp, &url);
        tracing::debug!("Signed {} with nonce {}", url, nonce);

        Ok(JsApiConfig {
            corp_id: self.config().corpid.clone(),
            timestamp,
            nonce,
            signature,
        })
    }
}
