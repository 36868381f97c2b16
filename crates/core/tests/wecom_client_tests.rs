//! `WeComClient` against a local stand-in for the WeCom contacts API.
//!
//! An axum server bound to 127.0.0.1 serves the three endpoints orgsync
//! uses. No external network I/O.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;

use orgsync_core::errors::WeComError;
use orgsync_core::wecom::{DirectoryClient, WeComClient};
use orgsync_core::{AssemblySettings, RecordAssembler};

// ===========================================================================
// Fake WeCom server
// ===========================================================================

const TOKEN: &str = "ACCESS_TOKEN_123";
const SECRET: &str = "corp-secret";

#[derive(Clone, Default)]
struct FakeWeCom {
    token_requests: Arc<AtomicUsize>,
}

type Params = Query<HashMap<String, String>>;

async fn gettoken(State(state): State<FakeWeCom>, Query(q): Params) -> Json<serde_json::Value> {
    state.token_requests.fetch_add(1, Ordering::SeqCst);
    if q.get("corpid").map(String::as_str) == Some("ww-test")
        && q.get("corpsecret").map(String::as_str) == Some(SECRET)
    {
        Json(json!({ "errcode": 0, "errmsg": "ok", "access_token": TOKEN, "expires_in": 7200 }))
    } else {
        Json(json!({ "errcode": 40001, "errmsg": "invalid credential" }))
    }
}

fn token_ok(q: &HashMap<String, String>) -> bool {
    q.get("access_token").map(String::as_str) == Some(TOKEN)
}

async fn department_list(Query(q): Params) -> Json<serde_json::Value> {
    if !token_ok(&q) {
        return Json(json!({ "errcode": 40014, "errmsg": "invalid access_token" }));
    }
    Json(json!({
        "errcode": 0,
        "errmsg": "ok",
        "department": [
            { "id": 1, "name": "总部", "name_en": "HQ", "parentid": 0, "order": 100000000 },
            { "id": 2, "name": "研发中心", "name_en": "RD", "parentid": 1, "order": 99999000 }
        ]
    }))
}

async fn user_list(Query(q): Params) -> Response {
    if !token_ok(&q) {
        return Json(json!({ "errcode": 40014, "errmsg": "invalid access_token" })).into_response();
    }
    let fetch_child = q.get("fetch_child").cloned().unwrap_or_default();
    match q.get("department_id").map(String::as_str) {
        Some("1") => Json(json!({
            "errcode": 0,
            "errmsg": "ok",
            "userlist": [{
                "userid": "zhangsan",
                "name": "张三",
                "department": [1, 2],
                "position": "后台工程师",
                "mobile": "13800001234",
                "gender": "1",
                "email": "张三@gzdev.com",
                "biz_mail": "zhangsan@corp.wecom.work",
                "telephone": "020-123456",
                "alias": "jackzhang",
                "english_name": "jacky",
                "open_userid": "wmxxxx",
                "main_department": 1,
                "external_position": fetch_child
            }]
        }))
        .into_response(),
        Some("2") => Json(json!({ "errcode": 0, "errmsg": "ok", "userlist": [] })).into_response(),
        Some("403") => Json(json!({
            "errcode": 60011,
            "errmsg": "no privilege to access/modify contact/party/agent"
        }))
        .into_response(),
        Some("500") => (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded").into_response(),
        _ => (StatusCode::OK, "not json").into_response(),
    }
}

async fn spawn_fake(state: FakeWeCom) -> String {
    let app = Router::new()
        .route("/cgi-bin/gettoken", get(gettoken))
        .route("/cgi-bin/department/list", get(department_list))
        .route("/cgi-bin/user/list", get(user_list))
        .with_state(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn client(url: &str, secret: &str) -> WeComClient {
    WeComClient::new(url, "ww-test", secret, Duration::from_secs(5)).unwrap()
}

// ===========================================================================
// Tests
// ===========================================================================

#[tokio::test]
async fn test_list_departments() {
    let url = spawn_fake(FakeWeCom::default()).await;
    let depts = client(&url, SECRET).list_departments().await.unwrap();
    assert_eq!(depts.len(), 2);
    assert_eq!(depts[1].name, "研发中心");
    assert_eq!(depts[1].parentid, 1);
}

#[tokio::test]
async fn test_token_is_fetched_once() {
    let state = FakeWeCom::default();
    let url = spawn_fake(state.clone()).await;
    let wecom = client(&url, SECRET);

    wecom.list_departments().await.unwrap();
    wecom.list_users(2, true).await.unwrap();
    wecom.list_departments().await.unwrap();

    assert_eq!(state.token_requests.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_list_users_sends_fetch_child() {
    let url = spawn_fake(FakeWeCom::default()).await;
    let wecom = client(&url, SECRET);

    let with_children = wecom.list_users(1, true).await.unwrap();
    assert_eq!(with_children[0].external_position, "1");
    let without = wecom.list_users(1, false).await.unwrap();
    assert_eq!(without[0].external_position, "0");
    assert_eq!(without[0].department, vec![1, 2]);
}

#[tokio::test]
async fn test_bad_secret_is_authentication_failure() {
    let url = spawn_fake(FakeWeCom::default()).await;
    let err = client(&url, "wrong").list_departments().await.unwrap_err();
    match err {
        WeComError::AuthenticationFailed(msg) => assert!(msg.contains("40001")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_errcode_becomes_api_error() {
    let url = spawn_fake(FakeWeCom::default()).await;
    let err = client(&url, SECRET).list_users(403, true).await.unwrap_err();
    assert!(matches!(err, WeComError::ApiError { errcode: 60011, .. }));
}

#[tokio::test]
async fn test_http_failure_becomes_api_status() {
    let url = spawn_fake(FakeWeCom::default()).await;
    let err = client(&url, SECRET).list_users(500, true).await.unwrap_err();
    match err {
        WeComError::ApiStatus { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "upstream exploded");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_garbage_body_is_parse_error() {
    let url = spawn_fake(FakeWeCom::default()).await;
    let err = client(&url, SECRET).list_users(7, true).await.unwrap_err();
    assert!(matches!(err, WeComError::ParseError(_)));
}

#[tokio::test]
async fn test_assembler_over_http() {
    let url = spawn_fake(FakeWeCom::default()).await;
    let assembler = RecordAssembler::with_pinyin(
        client(&url, SECRET),
        AssemblySettings {
            flag: "wx".into(),
            personal_fallback_domain: "example.com".into(),
            biz_fallback_domain: "biz.example.com".into(),
        },
    );

    let users = assembler.users().await.unwrap();
    assert_eq!(users.len(), 1);
    let zhang = &users[0];
    assert_eq!(zhang.username, "zhangsan1234");
    assert_eq!(zhang.email.as_deref(), Some("13800001234@example.com"));
    assert_eq!(zhang.biz_email.as_deref(), Some("zhangsan@corp.wecom.work"));
    assert_eq!(zhang.biz_email_nickname.as_deref(), Some("zhangsan"));
    assert_eq!(zhang.department_ids, vec!["wx_1", "wx_2"]);
    assert_eq!(zhang.english_name, "jacky");

    let value = serde_json::to_value(zhang).unwrap();
    assert_eq!(value["custom_name_pinyin"], "zhangsan");
    assert_eq!(value["custom_nickname_email"], "13800001234");
    assert_eq!(value["mail_sanitized"], "张三@gzdev.com");

    let depts = assembler.departments().await.unwrap();
    assert_eq!(depts[1].name_pinyin, "yanfazhongxin");
    assert_eq!(depts[1].namespaced_parent_id, "wx_1");
}
