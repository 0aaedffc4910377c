#![allow(dead_code)]

use dingtalk::{Client, Config, DingTalk};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const CORPID: &str = "ding-corp";
pub const CORPSECRET: &str = "corp-secret";
pub const TOKEN: &str = "test-token";

pub fn config(server: &MockServer) -> Config {
    Config::new(CORPID, CORPSECRET).with_host(server.uri())
}

pub fn envelope_ok(body: serde_json::Value) -> ResponseTemplate {
    let mut envelope = json!({ "errcode": 0, "errmsg": "ok" });
    if let (Some(target), Some(fields)) = (envelope.as_object_mut(), body.as_object()) {
        for (key, value) in fields {
            target.insert(key.clone(), value.clone());
        }
    }
    ResponseTemplate::new(200).set_body_json(envelope)
}

pub fn envelope_err(code: i64, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "errcode": code, "errmsg": message }))
}

/// Serve `gettoken` for the default corp pair
pub async fn mount_token(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/gettoken"))
        .and(query_param("corpid", CORPID))
        .and(query_param("corpsecret", CORPSECRET))
        .respond_with(envelope_ok(json!({ "access_token": TOKEN, "expires_in": 7200 })))
        .mount(server)
        .await;
}

/// A started server with the token endpoint mounted, and a client pointed at it
pub async fn setup() -> (MockServer, DingTalk) {
    let server = MockServer::start().await;
    mount_token(&server).await;
    let dingtalk = DingTalk::new(config(&server)).unwrap();
    (server, dingtalk)
}

pub fn client(config: Config) -> Client {
    Client::new(config).unwrap()
}
