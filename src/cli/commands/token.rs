use anyhow::Context;
use dingtalk::DingTalk;

pub async fn execute(dingtalk: &DingTalk, app: bool) -> anyhow::Result<()> {
    let client = dingtalk.client();
    let credentials = if app {
        client.app_credentials()?
    } else {
        client.credentials().clone()
    };

    tracing::debug!("Requesting access token for {}", credentials.id());
    let token = client
        .get_access_token(Some(&credentials))
        .await
        .context("Failed to get access token")?;

    println!("{}", token);
    Ok(())
}

pub async fn execute_ticket(dingtalk: &DingTalk) -> anyhow::Result<()> {
    let ticket = dingtalk
        .client()
        .get_jsapi_ticket()
        .await
        .context("Failed to get jsapi ticket")?;

    println!("{}", ticket);
    Ok(())
}
