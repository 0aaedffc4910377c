mod common;

use common::*;
use dingtalk::client::RequestBody;
use dingtalk::{ApiResponse, Config, Credentials, DingTalkError, RequestOptions, SignOptions};
use reqwest::Method;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

#[tokio::test]
async fn test_access_token_fetched_once_while_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gettoken"))
        .respond_with(envelope_ok(json!({ "access_token": TOKEN, "expires_in": 7200 })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(config(&server));
    assert_eq!(client.get_access_token(None).await.unwrap(), TOKEN);
    assert_eq!(client.get_access_token(None).await.unwrap(), TOKEN);
}

#[tokio::test]
async fn test_zero_lifetime_refetches() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gettoken"))
        .respond_with(envelope_ok(json!({ "access_token": TOKEN, "expires_in": 7200 })))
        .expect(2)
        .mount(&server)
        .await;

    let mut config = config(&server);
    config.access_token_lifetime = 0;
    let client = client(config);

    client.get_access_token(None).await.unwrap();
    client.get_access_token(None).await.unwrap();
}

#[tokio::test]
async fn test_credentials_have_separate_cache_entries() {
    let server = MockServer::start().await;
    for (corpid, token) in [("corp-a", "token-a"), ("corp-b", "token-b")] {
        Mock::given(method("GET"))
            .and(path("/gettoken"))
            .and(query_param("corpid", corpid))
            .respond_with(envelope_ok(json!({ "access_token": token })))
            .expect(1)
            .mount(&server)
            .await;
    }

    let client = client(config(&server));
    let a = Credentials::corp("corp-a", "secret");
    let b = Credentials::corp("corp-b", "secret");

    assert_eq!(client.get_access_token(Some(&a)).await.unwrap(), "token-a");
    assert_eq!(client.get_access_token(Some(&b)).await.unwrap(), "token-b");
    assert_eq!(client.get_access_token(Some(&a)).await.unwrap(), "token-a");
}

#[tokio::test]
async fn test_app_and_sso_token_endpoints() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sns/gettoken"))
        .and(query_param("appid", "app-id"))
        .and(query_param("appsecret", "app-secret"))
        .respond_with(envelope_ok(json!({ "access_token": "sns-token" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sso/gettoken"))
        .and(query_param("corpid", CORPID))
        .and(query_param("corpsecret", "sso-secret"))
        .respond_with(envelope_ok(json!({ "access_token": "sso-token" })))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = config(&server);
    config.appid = Some("app-id".to_string());
    config.appsecret = Some("app-secret".to_string());
    let client = client(config);

    let app = client.app_credentials().unwrap();
    assert_eq!(client.get_access_token(Some(&app)).await.unwrap(), "sns-token");
    assert_eq!(
        client.get_sso_access_token("sso-secret").await.unwrap(),
        "sso-token"
    );
}

#[tokio::test]
async fn test_app_credentials_require_config() {
    let server = MockServer::start().await;
    let client = client(config(&server));
    assert!(matches!(
        client.app_credentials(),
        Err(DingTalkError::Config(_))
    ));
}

#[tokio::test]
async fn test_token_endpoint_error_is_not_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gettoken"))
        .respond_with(envelope_err(40089, "invalid corpid or corpsecret"))
        .expect(2)
        .mount(&server)
        .await;

    let client = client(config(&server));
    for _ in 0..2 {
        let err = client.get_access_token(None).await.unwrap_err();
        assert_eq!(err.code(), Some(40089));
    }
}

#[tokio::test]
async fn test_success_envelope_is_returned_whole() {
    let (server, dingtalk) = setup().await;
    Mock::given(method("GET"))
        .and(path("/user/get"))
        .and(query_param("access_token", TOKEN))
        .and(query_param("userid", "manager"))
        .respond_with(envelope_ok(json!({ "userid": "manager", "name": "Boss" })))
        .mount(&server)
        .await;

    let envelope = dingtalk
        .client()
        .get("user/get", &json!({ "userid": "manager" }), &RequestOptions::default())
        .await
        .unwrap()
        .into_json()
        .unwrap();
    assert_eq!(envelope["errcode"], 0);
    assert_eq!(envelope["name"], "Boss");
}

#[tokio::test]
async fn test_error_envelope_becomes_remote_error() {
    let (server, dingtalk) = setup().await;
    Mock::given(method("GET"))
        .and(path("/user/get"))
        .respond_with(envelope_err(40001, "invalid access_token"))
        .mount(&server)
        .await;

    let err = dingtalk
        .client()
        .get("user/get", &json!({ "userid": "x" }), &RequestOptions::default())
        .await
        .unwrap_err();

    match err {
        DingTalkError::RemoteApi {
            url,
            code,
            message,
            payload,
        } => {
            assert!(url.ends_with("/user/get"));
            assert_eq!(code, 40001);
            assert_eq!(message, "invalid access_token");
            assert_eq!(payload["errcode"], 40001);
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_ignore_error_returns_envelope() {
    let (server, dingtalk) = setup().await;
    Mock::given(method("GET"))
        .and(path("/user/get"))
        .respond_with(envelope_err(60121, "no such user"))
        .mount(&server)
        .await;

    let response = dingtalk
        .client()
        .get(
            "user/get",
            &json!({ "userid": "x" }),
            &RequestOptions::new().ignore_error(),
        )
        .await
        .unwrap();
    assert_eq!(response.errcode(), Some(60121));
}

#[tokio::test]
async fn test_non_json_body_is_raw() {
    let (server, dingtalk) = setup().await;
    Mock::given(method("GET"))
        .and(path("/media/raw"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/png")
                .set_body_bytes(vec![0x89, b'P', b'N', b'G']),
        )
        .mount(&server)
        .await;

    let response = dingtalk
        .client()
        .get("media/raw", &(), &RequestOptions::default())
        .await
        .unwrap();
    match response {
        ApiResponse::Raw(raw) => {
            assert_eq!(raw.status, 200);
            assert_eq!(raw.body, vec![0x89, b'P', b'N', b'G']);
        }
        ApiResponse::Json(value) => panic!("expected raw body, got {}", value),
    }
}

#[tokio::test]
async fn test_post_sends_json_body_with_token_query() {
    let (server, dingtalk) = setup().await;
    Mock::given(method("POST"))
        .and(path("/department/create"))
        .and(query_param("access_token", TOKEN))
        .and(body_json(json!({ "name": "R&D", "parentid": 1 })))
        .respond_with(envelope_ok(json!({ "id": 42 })))
        .expect(1)
        .mount(&server)
        .await;

    let id: serde_json::Value = dingtalk
        .client()
        .post_json(
            "department/create",
            &json!({ "name": "R&D", "parentid": 1 }),
            &RequestOptions::default(),
        )
        .await
        .unwrap();
    assert_eq!(id["id"], 42);
}

#[tokio::test]
async fn test_request_headers_are_merged() {
    let (server, dingtalk) = setup().await;
    Mock::given(method("GET"))
        .and(path("/auth/scopes"))
        .and(header("x-trace", "abc"))
        .respond_with(envelope_ok(json!({ "auth_user_field": [] })))
        .expect(1)
        .mount(&server)
        .await;

    dingtalk
        .client()
        .get(
            "auth/scopes",
            &(),
            &RequestOptions::new().header("x-trace", "abc"),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_configured_headers_reach_server() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("GET"))
        .and(path("/auth/scopes"))
        .and(header("x-trace", "default"))
        .respond_with(envelope_ok(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = config(&server);
    config
        .request
        .headers
        .insert("x-trace".to_string(), "default".to_string());
    let client = client(config);

    client
        .get("auth/scopes", &(), &RequestOptions::default())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_call_header_replaces_configured_value() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("GET"))
        .and(path("/auth/scopes"))
        .respond_with(envelope_ok(json!({})))
        .mount(&server)
        .await;

    let mut config = config(&server);
    config
        .request
        .headers
        .insert("x-trace".to_string(), "default".to_string());
    let client = client(config);

    client
        .get(
            "auth/scopes",
            &(),
            &RequestOptions::new().header("x-trace", "call"),
        )
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    let scopes = requests
        .iter()
        .find(|r| r.url.path() == "/auth/scopes")
        .unwrap();
    let values: Vec<&str> = scopes
        .headers
        .get_all("x-trace")
        .iter()
        .map(|v| v.to_str().unwrap())
        .collect();
    assert_eq!(values, ["call"]);
}

#[tokio::test]
async fn test_proxy_keeps_original_host_header() {
    let proxy = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gettoken"))
        .and(header("host", "oapi.dingtalk.com"))
        .respond_with(envelope_ok(json!({ "access_token": TOKEN })))
        .expect(1)
        .mount(&proxy)
        .await;
    Mock::given(method("GET"))
        .and(path("/department/list"))
        .and(header("host", "oapi.dingtalk.com"))
        .and(query_param("access_token", TOKEN))
        .respond_with(envelope_ok(json!({ "department": [] })))
        .expect(1)
        .mount(&proxy)
        .await;

    let config = Config::new(CORPID, CORPSECRET)
        .with_host("https://oapi.dingtalk.com")
        .with_proxy(proxy.uri());
    let client = client(config);

    client
        .get("department/list", &(), &RequestOptions::default())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_explicit_url_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/anything"))
        .and(query_param("a", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .mount(&server)
        .await;

    let client = client(config(&server));
    let response = client
        .request(
            Method::GET,
            &format!("{}/anything", server.uri()),
            &[("a".to_string(), "1".to_string())],
            RequestBody::Empty,
            &RequestOptions::default(),
        )
        .await
        .unwrap()
        .into_json()
        .unwrap();
    assert_eq!(response["ok"], true);
}

#[tokio::test]
async fn test_jsapi_ticket_cached() {
    let (server, dingtalk) = setup().await;
    Mock::given(method("GET"))
        .and(path("/get_jsapi_ticket"))
        .and(query_param("type", "jsapi"))
        .and(query_param("access_token", TOKEN))
        .respond_with(envelope_ok(json!({ "ticket": "ticket-1", "expires_in": 7200 })))
        .expect(1)
        .mount(&server)
        .await;

    let client = dingtalk.client();
    assert_eq!(client.get_jsapi_ticket().await.unwrap(), "ticket-1");
    assert_eq!(client.get_jsapi_ticket().await.unwrap(), "ticket-1");
}

#[tokio::test]
async fn test_jsapi_ticket_honours_shorter_server_expiry() {
    let (server, dingtalk) = setup().await;
    Mock::given(method("GET"))
        .and(path("/get_jsapi_ticket"))
        .respond_with(envelope_ok(json!({ "ticket": "short", "expires_in": 0 })))
        .expect(2)
        .mount(&server)
        .await;

    let client = dingtalk.client();
    client.get_jsapi_ticket().await.unwrap();
    client.get_jsapi_ticket().await.unwrap();
}

#[tokio::test]
async fn test_jsapi_config_with_supplied_ticket() {
    let server = MockServer::start().await;
    let client = client(config(&server));

    let config = client
        .get_jsapi_config(
            "http://localhost:5000/?url=http%3A%2F%2Fabc.com%2Fsomewhere#top",
            SignOptions {
                ticket: Some(
                    "HerLBdXanXEE9D78HR1IutOlhOXkFWMKZThJ5bX35HSJA5s8jZUaKWQT7rauior2qyqLMehYaoA9iCemhUBVDD"
                        .to_string(),
                ),
                nonce: Some("DingTalk#1470295596107".to_string()),
                timestamp: Some(1470295596107),
            },
        )
        .await
        .unwrap();

    assert_eq!(config.corp_id, CORPID);
    assert_eq!(config.timestamp, 1470295596107);
    assert_eq!(config.nonce, "DingTalk#1470295596107");
    assert_eq!(config.signature, "d392648b027b8f6ce13dc89db8b1a86c94764fae");

    let wire = serde_json::to_value(&config).unwrap();
    assert_eq!(wire["corpId"], CORPID);
    assert_eq!(wire["nonceStr"], "DingTalk#1470295596107");
    assert_eq!(wire["timeStamp"], 1470295596107i64);
}

#[tokio::test]
async fn test_jsapi_config_fetches_ticket_and_generates_nonce() {
    let (server, dingtalk) = setup().await;
    Mock::given(method("GET"))
        .and(path("/get_jsapi_ticket"))
        .respond_with(envelope_ok(json!({ "ticket": "ticket-1", "expires_in": 7200 })))
        .expect(1)
        .mount(&server)
        .await;

    let config = dingtalk
        .client()
        .get_jsapi_config("https://app.example.com/page", SignOptions::default())
        .await
        .unwrap();

    assert!(config.nonce.ends_with(&format!("#{}", config.timestamp)));
    assert_eq!(
        config.signature,
        dingtalk::client::sign(
            "ticket-1",
            &config.nonce,
            config.timestamp,
            "https://app.example.com/page"
        )
    );
}

#[tokio::test]
async fn test_upload_sends_multipart_file() {
    let (server, dingtalk) = setup().await;
    Mock::given(method("POST"))
        .and(path("/media/upload"))
        .and(query_param("access_token", TOKEN))
        .and(query_param("type", "file"))
        .and(|req: &Request| {
            let body = String::from_utf8_lossy(&req.body);
            body.contains("name=\"media\"")
                && body.contains("filename=\"report.txt\"")
                && body.contains("quarterly numbers")
                && body.contains("name=\"note\"")
        })
        .respond_with(envelope_ok(json!({
            "type": "file",
            "media_id": "@lADOADmaWMzazQKA",
            "created_at": 1605863153573i64
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("report.txt");
    std::fs::write(&file, "quarterly numbers").unwrap();

    let response = dingtalk
        .client()
        .upload(
            "media/upload",
            &json!({ "type": "file" }),
            "media",
            &file,
            &[("note", "q3")],
            &RequestOptions::default(),
        )
        .await
        .unwrap()
        .into_json()
        .unwrap();
    assert_eq!(response["media_id"], "@lADOADmaWMzazQKA");
}

#[tokio::test]
async fn test_upload_missing_file_is_io_error() {
    let (_server, dingtalk) = setup().await;
    let err = dingtalk
        .client()
        .upload(
            "media/upload",
            &(),
            "media",
            std::path::Path::new("/nonexistent/file.bin"),
            &[],
            &RequestOptions::default(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DingTalkError::Io(_)));
}

#[tokio::test]
async fn test_download_writes_file() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files/a.bin"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"payload".to_vec()))
        .mount(&server)
        .await;

    let client = client(config(&server));
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("a.bin");
    client
        .download(
            &format!("{}/files/a.bin", server.uri()),
            &dest,
            Duration::from_secs(5),
        )
        .await
        .unwrap();
    assert_eq!(std::fs::read(&dest).unwrap(), b"payload");
}

#[tokio::test]
async fn test_download_rejects_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = client(config(&server));
    let dir = tempfile::tempdir().unwrap();
    let err = client
        .download(
            &format!("{}/missing", server.uri()),
            &dir.path().join("x"),
            Duration::from_secs(5),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DingTalkError::UnexpectedResponse(status) if status == 404));
}
