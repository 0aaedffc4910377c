use crate::client::{Client, RequestOptions};
use crate::error::{ensure, Result};
use serde_json::Value;

pub struct AuthApi<'a> {
    client: &'a Client,
}

impl<'a> AuthApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// `auth/scopes`: fields and org scopes granted to the app
    pub async fn scopes(&self) -> Result<Value> {
        self.client
            .get("auth/scopes", &(), &RequestOptions::default())
            .await?
            .into_json()
    }

    /// QR-code login page for an SNS app (default: the configured appid)
    pub fn qr_connect_url(
        &self,
        redirect_uri: &str,
        appid: Option<&str>,
        state: Option<&str>,
    ) -> Result<String> {
        self.sns_url("connect/qrconnect", redirect_uri, appid, state)
    }

    /// `goto` target for an embedded (iframe) QR login
    pub fn iframe_qr_goto_url(
        &self,
        redirect_uri: &str,
        appid: Option<&str>,
        state: Option<&str>,
    ) -> Result<String> {
        self.sns_url("connect/oauth2/sns_authorize", redirect_uri, appid, state)
    }

    fn sns_url(
        &self,
        path: &str,
        redirect_uri: &str,
        appid: Option<&str>,
        state: Option<&str>,
    ) -> Result<String> {
        ensure(!redirect_uri.is_empty(), "redirect_uri required")?;
        let config = self.client.config();
        let appid = match appid {
            Some(appid) => appid,
            None => config.app_pair()?.0,
        };

        Ok(format!(
            "{}/{}?appid={}&response_type=code&scope=snsapi_login&state={}&redirect_uri={}",
            config.base_url(),
            path,
            urlencoding::encode(appid),
            urlencoding::encode(state.unwrap_or("STATE")),
            urlencoding::encode(redirect_uri),
        ))
    }
}
