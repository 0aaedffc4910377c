// Authenticated access to the DingTalk open API
pub mod pagination;
mod response;
mod signature;

pub use pagination::{list_all, ListAll, ListAllOptions, Page};
pub use response::{envelope_code, ApiResponse, RawResponse, RequestBody, RequestOptions};
pub use signature::{normalize_url, sign, SignOptions};

use crate::cache::{MemoryCache, TokenCache};
use crate::config::Config;
use crate::error::{ensure, DingTalkError, Result};
use crate::models::{AccessTokenResponse, Credentials, JsApiTicketResponse};
use chrono::{Duration, Utc};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, HOST};
use reqwest::Method;
use response::{envelope_message, query_pairs};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration as StdDuration;

const DEFAULT_TIMEOUT: StdDuration = StdDuration::from_secs(30);
const POOL_IDLE_TIMEOUT: StdDuration = StdDuration::from_secs(30);
const POOL_MAX_IDLE_PER_HOST: usize = 256;

/// Builds a [`Client`], validating config and constructing the transport up front
pub struct ClientBuilder {
    config: Config,
    cache: Option<Arc<dyn TokenCache>>,
    http: Option<reqwest::Client>,
}

impl ClientBuilder {
    /// Store tokens somewhere other than process memory
    pub fn cache(mut self, cache: Arc<dyn TokenCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Use a preconfigured transport. It should not follow redirects,
    /// media retrieval reads the 302 location itself.
    pub fn http_client(mut self, http: reqwest::Client) -> Self {
        self.http = Some(http);
        self
    }

    pub fn build(self) -> Result<Client> {
        self.config.validate()?;

        let host = url::Url::parse(&self.config.host)?;
        let host_str = host
            .host_str()
            .ok_or_else(|| DingTalkError::Config(format!("host '{}' has no hostname", host)))?;
        let host_authority = match host.port() {
            Some(port) => format!("{}:{}", host_str, port),
            None => host_str.to_string(),
        };

        let http = match self.http {
            Some(http) => http,
            None => reqwest::Client::builder()
                .timeout(DEFAULT_TIMEOUT)
                .pool_idle_timeout(POOL_IDLE_TIMEOUT)
                .pool_max_idle_per_host(POOL_MAX_IDLE_PER_HOST)
                .redirect(reqwest::redirect::Policy::none())
                .no_proxy()
                .build()?,
        };

        let cache = self
            .cache
            .unwrap_or_else(|| Arc::new(MemoryCache::new()) as Arc<dyn TokenCache>);

        let credentials = Credentials::corp(&self.config.corpid, &self.config.corpsecret);
        let proxy = self
            .config
            .proxy
            .as_deref()
            .map(|p| p.trim_end_matches('/').to_string());

        Ok(Client {
            http,
            cache,
            credentials,
            host_authority,
            proxy,
            nonce_prefix: uuid::Uuid::new_v4().simple().to_string(),
            config: self.config,
        })
    }
}

/// DingTalk API client
///
/// Owns the transport and a handle to the token cache. Tokens are never held
/// on the client itself, every lookup goes through the cache.
pub struct Client {
    http: reqwest::Client,
    cache: Arc<dyn TokenCache>,
    config: Config,
    credentials: Credentials,
    host_authority: String,
    proxy: Option<String>,
    nonce_prefix: String,
}

impl Client {
    pub fn builder(config: Config) -> ClientBuilder {
        ClientBuilder {
            config,
            cache: None,
            http: None,
        }
    }

    /// Client with the in-memory cache and default transport
    pub fn new(config: Config) -> Result<Self> {
        Self::builder(config).build()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The configured corp credential pair
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// The configured app credential pair, if both halves are set
    pub fn app_credentials(&self) -> Result<Credentials> {
        let (appid, appsecret) = self.config.app_pair()?;
        Ok(Credentials::app(appid, appsecret))
    }

    /// Get an access token for `credentials` (default: the corp pair), cached for the configured lifetime
    pub async fn get_access_token(&self, credentials: Option<&Credentials>) -> Result<String> {
        let credentials = credentials.unwrap_or(&self.credentials);
        let key = credentials.cache_key();

        if let Some(token) = self.cache.get(&key).await? {
            tracing::debug!("Access token cache hit for {}", credentials.id());
            return Ok(token);
        }

        tracing::debug!(
            "Access token cache miss for {}, requesting {}",
            credentials.id(),
            credentials.token_endpoint()
        );

        let url = format!("{}/{}", self.config.base_url(), credentials.token_endpoint());
        let query: Vec<(String, String)> = credentials
            .token_query()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        let response: AccessTokenResponse = self
            .request(
                Method::GET,
                &url,
                &query,
                RequestBody::Empty,
                &RequestOptions::default(),
            )
            .await?
            .json()?;

        let expires_at = Utc::now() + self.config.access_token_lifetime();
        self.cache
            .set(&key, response.access_token.clone(), expires_at)
            .await?;

        tracing::info!(
            "Fetched access token for {} (server expires_in: {:?}s)",
            credentials.id(),
            response.expires_in
        );
        Ok(response.access_token)
    }

    /// Access token for the corp id plus dedicated SSO secret
    pub async fn get_sso_access_token(&self, ssosecret: &str) -> Result<String> {
        ensure(!ssosecret.is_empty(), "ssosecret required")?;
        let credentials = Credentials::sso(&self.config.corpid, ssosecret);
        self.get_access_token(Some(&credentials)).await
    }

    /// Get the jsapi ticket, cached for `min(expires_in, jsapi_ticket_lifetime)`
    pub async fn get_jsapi_ticket(&self) -> Result<String> {
        let key = format!("jsapi_ticket:{}", self.credentials.cache_key());

        if let Some(ticket) = self.cache.get(&key).await? {
            tracing::debug!("jsapi ticket cache hit");
            return Ok(ticket);
        }

        let response: JsApiTicketResponse = self
            .get_json(
                "get_jsapi_ticket",
                &json!({ "type": "jsapi" }),
                &RequestOptions::default(),
            )
            .await?;

        let lifetime = Duration::seconds(response.expires_in).min(self.config.jsapi_ticket_lifetime());
        self.cache
            .set(&key, response.ticket.clone(), Utc::now() + lifetime)
            .await?;

        tracing::info!("Fetched jsapi ticket, cached for {}s", lifetime.num_seconds());
        Ok(response.ticket)
    }

    /// Authenticated GET of `{host}/{api}`; the token goes first in the query
    pub async fn get<Q>(&self, api: &str, query: &Q, opts: &RequestOptions) -> Result<ApiResponse>
    where
        Q: Serialize + ?Sized,
    {
        let url = self.api_url(api)?;
        let mut params = vec![("access_token".to_string(), self.token_for(opts).await?)];
        params.extend(query_pairs(&serde_json::to_value(query)?));

        self.request(Method::GET, &url, &params, RequestBody::Empty, opts)
            .await
    }

    /// Authenticated POST of a JSON body to `{host}/{api}`
    pub async fn post<B>(&self, api: &str, body: &B, opts: &RequestOptions) -> Result<ApiResponse>
    where
        B: Serialize + ?Sized,
    {
        let url = self.api_url(api)?;
        let params = vec![("access_token".to_string(), self.token_for(opts).await?)];
        let body = serde_json::to_value(body)?;

        self.request(Method::POST, &url, &params, RequestBody::Json(body), opts)
            .await
    }

    pub async fn get_json<T, Q>(&self, api: &str, query: &Q, opts: &RequestOptions) -> Result<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        self.get(api, query, opts).await?.json()
    }

    pub async fn post_json<T, B>(&self, api: &str, body: &B, opts: &RequestOptions) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.post(api, body, opts).await?.json()
    }

    /// Authenticated multipart POST: `fields` as text parts, then the file under `file_field`
    pub async fn upload<Q>(
        &self,
        api: &str,
        query: &Q,
        file_field: &str,
        file_path: &Path,
        fields: &[(&str, &str)],
        opts: &RequestOptions,
    ) -> Result<ApiResponse>
    where
        Q: Serialize + ?Sized,
    {
        ensure(!file_field.is_empty(), "file field required")?;
        ensure(!file_path.as_os_str().is_empty(), "file path required")?;

        let url = self.api_url(api)?;
        let mut params = vec![("access_token".to_string(), self.token_for(opts).await?)];
        params.extend(query_pairs(&serde_json::to_value(query)?));

        let contents = tokio::fs::read(file_path).await?;
        let file_name = file_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| file_field.to_string());

        let mut form = reqwest::multipart::Form::new();
        for (name, value) in fields {
            form = form.text(name.to_string(), value.to_string());
        }
        let part = reqwest::multipart::Part::bytes(contents)
            .file_name(file_name)
            .mime_str("application/octet-stream")?;
        form = form.part(file_field.to_string(), part);

        self.request(Method::POST, &url, &params, RequestBody::Multipart(form), opts)
            .await
    }

    /// Send a request and unwrap the envelope
    ///
    /// URLs under the configured host are rerouted to the proxy when one is set.
    /// Bodies that are not a JSON object come back as [`ApiResponse::Raw`].
    pub async fn request(
        &self,
        method: Method,
        url: &str,
        query: &[(String, String)],
        body: RequestBody,
        opts: &RequestOptions,
    ) -> Result<ApiResponse> {
        let (target, host_header) = self.route(url);
        tracing::debug!("{} {}", method, target);

        let mut builder = self
            .http
            .request(method, &target)
            .headers(self.merge_headers(opts, host_header)?);
        if !query.is_empty() {
            builder = builder.query(query);
        }
        if let Some(timeout) = opts.timeout.or_else(|| self.config.request.timeout()) {
            builder = builder.timeout(timeout);
        }
        builder = match body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Multipart(form) => builder.multipart(form),
        };

        let response = builder.send().await?;
        decode(url, response, opts.ignore_error).await
    }

    /// Plain (unauthenticated) GET of `url`, body written to `dest`
    pub async fn download(&self, url: &str, dest: &Path, timeout: StdDuration) -> Result<()> {
        let (target, host_header) = self.route(url);
        tracing::debug!("Downloading {} to {}", target, dest.display());

        let mut builder = self.http.get(&target).timeout(timeout);
        if let Some(host) = host_header {
            builder = builder.header(HOST, host);
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DingTalkError::UnexpectedResponse(status));
        }

        let bytes = response.bytes().await?;
        tokio::fs::write(dest, &bytes).await?;
        Ok(())
    }

    /// Configured headers, overridden by name with the per-call ones
    fn merge_headers(&self, opts: &RequestOptions, host: Option<String>) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        let configured = self.config.request.headers.iter();
        for (name, value) in configured.chain(opts.headers.iter().map(|(n, v)| (n, v))) {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| DingTalkError::InvalidArgument(format!("invalid header name '{}'", name)))?;
            let header_value = HeaderValue::from_str(value).map_err(|_| {
                DingTalkError::InvalidArgument(format!("invalid value for header '{}'", name))
            })?;
            headers.insert(header_name, header_value);
        }

        // Proxied requests must still name the original host
        if let Some(host) = host {
            let value = HeaderValue::from_str(&host)
                .map_err(|_| DingTalkError::Config(format!("invalid host '{}'", host)))?;
            headers.insert(HOST, value);
        }
        Ok(headers)
    }

    async fn token_for(&self, opts: &RequestOptions) -> Result<String> {
        match &opts.access_token {
            Some(token) => Ok(token.clone()),
            None => self.get_access_token(None).await,
        }
    }

    fn api_url(&self, api: &str) -> Result<String> {
        let api = api.trim_start_matches('/');
        ensure(!api.is_empty(), "api path required")?;
        Ok(format!("{}/{}", self.config.base_url(), api))
    }

    /// Target URL plus the `Host` header to send, if rerouted through the proxy
    fn route(&self, url: &str) -> (String, Option<String>) {
        let Some(proxy) = &self.proxy else {
            return (url.to_string(), None);
        };

        // Only reroute when `url` is the host itself or a path/query below it,
        // not another authority sharing the prefix (`:80` vs `:8080`)
        match url.strip_prefix(self.config.base_url()) {
            Some(rest) if rest.is_empty() || rest.starts_with('/') || rest.starts_with('?') => {
                (format!("{}{}", proxy, rest), Some(self.host_authority.clone()))
            }
            _ => (url.to_string(), None),
        }
    }

    pub(crate) fn nonce_prefix(&self) -> &str {
        &self.nonce_prefix
    }
}

async fn decode(url: &str, response: reqwest::Response, ignore_error: bool) -> Result<ApiResponse> {
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.bytes().await?;

    // Anything but a JSON object (media bytes, redirects, empty bodies) is passed through raw
    let envelope = match serde_json::from_slice::<Value>(&body) {
        Ok(value @ Value::Object(_)) => value,
        _ => {
            tracing::debug!("{} returned a raw response ({})", url, status);
            return Ok(ApiResponse::Raw(RawResponse {
                status,
                headers,
                body: body.to_vec(),
            }));
        }
    };

    // errcode 0 (or none at all) is success; callers may opt in to seeing failures
    let code = envelope_code(&envelope);
    if code == 0 || ignore_error {
        return Ok(ApiResponse::Json(envelope));
    }

    let message = envelope_message(&envelope);
    tracing::warn!("{} got error {}: {}", url, code, message);
    Err(DingTalkError::RemoteApi {
        url: url.to_string(),
        code,
        message,
        payload: envelope,
    })
}
