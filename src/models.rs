use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A credential set the platform issues access tokens for
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Credentials {
    /// Corp-level pair, exchanged at `gettoken`
    Corp { corpid: String, corpsecret: String },
    /// App-level pair for SNS login apps, exchanged at `sns/gettoken`
    App { appid: String, appsecret: String },
    /// Corp id plus the dedicated SSO secret, exchanged at `sso/gettoken`
    Sso { corpid: String, ssosecret: String },
}

impl Credentials {
    pub fn corp(corpid: impl Into<String>, corpsecret: impl Into<String>) -> Self {
        Credentials::Corp {
            corpid: corpid.into(),
            corpsecret: corpsecret.into(),
        }
    }

    pub fn app(appid: impl Into<String>, appsecret: impl Into<String>) -> Self {
        Credentials::App {
            appid: appid.into(),
            appsecret: appsecret.into(),
        }
    }

    pub fn sso(corpid: impl Into<String>, ssosecret: impl Into<String>) -> Self {
        Credentials::Sso {
            corpid: corpid.into(),
            ssosecret: ssosecret.into(),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Credentials::Corp { .. } => "corp",
            Credentials::App { .. } => "app",
            Credentials::Sso { .. } => "sso",
        }
    }

    fn pair(&self) -> (&str, &str) {
        match self {
            Credentials::Corp { corpid, corpsecret } => (corpid, corpsecret),
            Credentials::App { appid, appsecret } => (appid, appsecret),
            Credentials::Sso { corpid, ssosecret } => (corpid, ssosecret),
        }
    }

    /// Token endpoint path, relative to the host
    pub fn token_endpoint(&self) -> &'static str {
        match self {
            Credentials::Corp { .. } => "gettoken",
            Credentials::App { .. } => "sns/gettoken",
            Credentials::Sso { .. } => "sso/gettoken",
        }
    }

    /// Query parameters sent to the token endpoint
    pub fn token_query(&self) -> [(&'static str, &str); 2] {
        let (id, secret) = self.pair();
        match self {
            Credentials::Corp { .. } | Credentials::Sso { .. } => {
                [("corpid", id), ("corpsecret", secret)]
            }
            Credentials::App { .. } => [("appid", id), ("appsecret", secret)],
        }
    }

    /// Stable cache key: kind prefix plus SHA-256 of the id/secret pair
    pub fn cache_key(&self) -> String {
        let (id, secret) = self.pair();
        let mut hasher = Sha256::new();
        hasher.update(id.as_bytes());
        hasher.update(b":");
        hasher.update(secret.as_bytes());
        format!("{}:{:x}", self.kind(), hasher.finalize())
    }

    /// Identifier half of the pair, safe to log
    pub fn id(&self) -> &str {
        self.pair().0
    }
}

/// Response of the token endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct AccessTokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
}

/// Response of `get_jsapi_ticket`
#[derive(Debug, Clone, Deserialize)]
pub struct JsApiTicketResponse {
    pub ticket: String,
    pub expires_in: i64,
}

/// Config handed to the front-end JSAPI `dd.config` call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsApiConfig {
    #[serde(rename = "corpId")]
    pub corp_id: String,
    #[serde(rename = "timeStamp")]
    pub timestamp: i64,
    #[serde(rename = "nonceStr")]
    pub nonce: String,
    pub signature: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    pub id: i64,
    pub name: String,
    #[serde(default, rename = "parentid")]
    pub parent_id: Option<i64>,
    #[serde(default)]
    pub create_dept_group: Option<bool>,
    #[serde(default)]
    pub auto_add_user: Option<bool>,
    /// Detail fields `department/get` adds
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Body of `department/list`
#[derive(Debug, Clone, Deserialize)]
pub struct DepartmentList {
    #[serde(default)]
    pub department: Vec<Department>,
}

/// Simple member record, as returned by `user/simplelist`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub userid: String,
    #[serde(default)]
    pub name: String,
    /// Every other field `user/list` returns
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// One page of department members
#[derive(Debug, Clone, Deserialize)]
pub struct UserPage {
    #[serde(default, rename = "hasMore")]
    pub has_more: bool,
    #[serde(default)]
    pub userlist: Vec<User>,
}

/// Media kinds accepted by `media/upload`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Voice,
    File,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Image => "image",
            MediaType::Voice => "voice",
            MediaType::File => "file",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UploadedMedia {
    pub media_id: String,
    #[serde(rename = "type")]
    pub media_type: MediaType,
    pub created_at: i64,
}

/// External contact record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtContact {
    pub userid: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub mobile: Option<String>,
    #[serde(default)]
    pub follower_user_id: Option<String>,
    #[serde(default)]
    pub label_ids: Vec<i64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}
