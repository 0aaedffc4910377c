use crate::client::{Client, RequestOptions};
use crate::error::{ensure, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Corp message for `message/send`
///
/// The body lives under a key named after `msgtype`, e.g. `{"text": {"content": ".."}}`.
#[derive(Debug, Clone, Serialize)]
pub struct OutgoingMessage {
    /// Target users separated by `|`, `@all` for everyone
    #[serde(skip_serializing_if = "Option::is_none")]
    pub touser: Option<String>,
    /// Target departments separated by `|`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub toparty: Option<String>,
    pub agentid: String,
    pub msgtype: String,
    #[serde(flatten)]
    pub body: Map<String, Value>,
}

impl OutgoingMessage {
    pub fn new(agentid: impl Into<String>, msgtype: impl Into<String>, content: Value) -> Self {
        let msgtype = msgtype.into();
        let mut body = Map::new();
        body.insert(msgtype.clone(), content);
        Self {
            touser: None,
            toparty: None,
            agentid: agentid.into(),
            msgtype,
            body,
        }
    }

    pub fn text(agentid: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(agentid, "text", json!({ "content": content.into() }))
    }

    pub fn to_users(mut self, touser: impl Into<String>) -> Self {
        self.touser = Some(touser.into());
        self
    }

    pub fn to_parties(mut self, toparty: impl Into<String>) -> Self {
        self.toparty = Some(toparty.into());
        self
    }
}

/// Read receipts of a sent message
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct MessageStatus {
    #[serde(default)]
    pub read: Vec<String>,
    #[serde(default)]
    pub unread: Vec<String>,
}

pub struct MessageApi<'a> {
    client: &'a Client,
}

impl<'a> MessageApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// `message/send`, returns the envelope (`receiver`, `messageId`, ...)
    pub async fn send(&self, message: &OutgoingMessage) -> Result<Value> {
        let has_target = |t: &Option<String>| t.as_deref().is_some_and(|s| !s.is_empty());
        ensure(
            has_target(&message.touser) || has_target(&message.toparty),
            "touser or toparty required",
        )?;
        ensure(!message.msgtype.is_empty(), "msgtype required")?;
        ensure(!message.agentid.is_empty(), "agentid required")?;
        ensure(
            message.body.contains_key(&message.msgtype),
            &format!("{} body required", message.msgtype),
        )?;

        self.client
            .post("message/send", message, &RequestOptions::default())
            .await?
            .into_json()
    }

    pub async fn list_message_status(&self, message_id: &str) -> Result<MessageStatus> {
        ensure(!message_id.is_empty(), "messageId required")?;
        self.client
            .post_json(
                "message/list_message_status",
                &json!({ "messageId": message_id }),
                &RequestOptions::default(),
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_message_wire_shape() {
        let message = OutgoingMessage::text("36504082", "hello").to_users("u1|u2");
        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(
            value,
            json!({
                "touser": "u1|u2",
                "agentid": "36504082",
                "msgtype": "text",
                "text": { "content": "hello" },
            })
        );
    }
}
