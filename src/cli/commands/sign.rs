use super::print_json;
use anyhow::Context;
use dingtalk::{DingTalk, SignOptions};

pub async fn execute(dingtalk: &DingTalk, url: &str) -> anyhow::Result<()> {
    let config = dingtalk
        .client()
        .get_jsapi_config(url, SignOptions::default())
        .await
        .with_context(|| format!("Failed to sign {}", url))?;

    print_json(&config)
}
