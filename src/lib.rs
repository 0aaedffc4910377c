//! Client for the DingTalk open platform API.
//!
//! [`Client`] acquires and caches access tokens and jsapi tickets, attaches
//! them to requests and unwraps the `errcode` envelope every endpoint
//! returns. [`DingTalk`] bundles a client with the per-resource helpers.
//!
//! ```no_run
//! use dingtalk::{Config, DingTalk};
//!
//! # async fn example() -> dingtalk::Result<()> {
//! let dingtalk = DingTalk::new(Config::new("ding-corp-id", "corp-secret"))?;
//!
//! let departments = dingtalk.department().list(None).await?;
//! let users = dingtalk.user().simple_list_all(None, &Default::default()).await?;
//! println!("{} departments, {} users", departments.len(), users.items.len());
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod models;

pub use cache::{MemoryCache, TokenCache};
pub use client::{ApiResponse, Client, ClientBuilder, RequestOptions, SignOptions};
pub use config::Config;
pub use error::{DingTalkError, Result};
pub use models::{Credentials, JsApiConfig};

use api::{AuthApi, DepartmentApi, ExtContactApi, MediaApi, MessageApi, UserApi};
use std::sync::Arc;

/// DingTalk SDK entry point
#[derive(Clone)]
pub struct DingTalk {
    client: Arc<Client>,
}

impl DingTalk {
    pub fn new(config: Config) -> Result<Self> {
        Ok(Self::from_client(Client::new(config)?))
    }

    pub fn from_client(client: Client) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn department(&self) -> DepartmentApi<'_> {
        DepartmentApi::new(&self.client)
    }

    pub fn user(&self) -> UserApi<'_> {
        UserApi::new(&self.client)
    }

    pub fn message(&self) -> MessageApi<'_> {
        MessageApi::new(&self.client)
    }

    pub fn media(&self) -> MediaApi<'_> {
        MediaApi::new(&self.client)
    }

    pub fn auth(&self) -> AuthApi<'_> {
        AuthApi::new(&self.client)
    }

    pub fn extcontact(&self) -> ExtContactApi<'_> {
        ExtContactApi::new(&self.client)
    }
}
