// Per-resource wrappers over the authenticated client
mod auth;
mod department;
mod extcontact;
mod media;
mod message;
mod user;

pub use auth::AuthApi;
pub use department::{DepartmentApi, DepartmentSpec};
pub use extcontact::{ExtContactApi, ExtContactSpec};
pub use media::MediaApi;
pub use message::{MessageApi, MessageStatus, OutgoingMessage};
pub use user::{ListAllUsersOptions, ListOptions, UserApi, UserSpec};

use crate::client::ApiResponse;
use crate::error::{DingTalkError, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Deserialize a success envelope into `T`, without its `errcode`/`errmsg`
fn into_record<T: DeserializeOwned>(response: ApiResponse) -> Result<T> {
    let mut envelope = response.into_json()?;
    if let Value::Object(map) = &mut envelope {
        map.remove("errcode");
        map.remove("errmsg");
    }
    Ok(serde_json::from_value(envelope)?)
}

/// Take one field out of a success envelope
fn field<T: DeserializeOwned>(response: ApiResponse, name: &str) -> Result<T> {
    let mut envelope = response.into_json()?;
    let value = envelope
        .get_mut(name)
        .map(Value::take)
        .unwrap_or(Value::Null);
    Ok(serde_json::from_value(value)?)
}

/// Turn the remote "does not exist" codes into `Ok(None)`
fn none_if_missing<T>(result: Result<T>, codes: &[i64]) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err) if err.is_remote_code(codes) => {
            tracing::debug!("Treating {} as not found", err);
            Ok(None)
        }
        Err(err) => Err(err),
    }
}
