#![allow(clippy::unwrap_used)]
// Integration tests for `LegacyClient` and `SessionGuard` using wiremock.

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use unifra_api::{
    ControllerPlatform, Error, LegacyClient, LoginCredentials, Relogin, RestResource,
    SessionGuard,
};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup(platform: ControllerPlatform) -> (MockServer, LegacyClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client =
        LegacyClient::with_client(reqwest::Client::new(), base_url, "default".into(), platform);
    (server, client)
}

fn site_path(suffix: &str) -> String {
    format!("/api/s/default/{suffix}")
}

fn credentials() -> LoginCredentials {
    LoginCredentials::new("admin", "test-password".to_string().into())
}

fn ok_envelope(data: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "meta": { "rc": "ok" }, "data": data }))
}

// ── Authentication tests ────────────────────────────────────────────

#[tokio::test]
async fn test_login_success() {
    let (server, client) = setup(ControllerPlatform::ClassicController).await;

    Mock::given(method("POST"))
        .and(path("/api/login"))
        .and(body_partial_json(json!({ "username": "admin", "password": "test-password" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    client.login(&credentials()).await.unwrap();
}

#[tokio::test]
async fn test_login_failure() {
    let (server, client) = setup(ControllerPlatform::ClassicController).await;

    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ResponseTemplate::new(400).set_body_string("api.err.Invalid"))
        .mount(&server)
        .await;

    let result = client.login(&credentials()).await;

    assert!(
        matches!(result, Err(Error::Authentication { ref message }) if message.contains("api.err.Invalid")),
        "expected Authentication error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_unifi_os_csrf_token_is_sent_on_writes() {
    let (server, client) = setup(ControllerPlatform::UnifiOs).await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200).insert_header("X-CSRF-Token", "tok-1"))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/proxy/network/api/s/default/rest/usergroup"))
        .and(header("X-CSRF-Token", "tok-1"))
        .respond_with(ok_envelope(json!([{ "_id": "g1", "name": "guests" }])))
        .expect(1)
        .mount(&server)
        .await;

    client.login(&credentials()).await.unwrap();
    let created = client
        .create_rest(RestResource::UserGroup, &json!({ "name": "guests" }))
        .await
        .unwrap();

    assert_eq!(created["_id"], "g1");
}

// ── Resource tests ──────────────────────────────────────────────────

#[tokio::test]
async fn test_list_sites() {
    let (server, client) = setup(ControllerPlatform::ClassicController).await;

    Mock::given(method("GET"))
        .and(path("/api/self/sites"))
        .respond_with(ok_envelope(json!([
            { "_id": "s1", "name": "default", "desc": "Default", "role": "admin" }
        ])))
        .mount(&server)
        .await;

    let sites = client.list_sites().await.unwrap();

    assert_eq!(sites.len(), 1);
    assert_eq!(sites[0].name, "default");
    assert_eq!(sites[0].desc.as_deref(), Some("Default"));
}

#[tokio::test]
async fn test_health_and_sysinfo() {
    let (server, client) = setup(ControllerPlatform::ClassicController).await;

    Mock::given(method("GET"))
        .and(path(site_path("stat/health")))
        .respond_with(ok_envelope(json!([
            { "subsystem": "wan", "status": "ok", "wan_ip": "203.0.113.7" },
            { "subsystem": "vpn", "status": "unknown" }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(site_path("stat/sysinfo")))
        .respond_with(ok_envelope(json!([{ "version": "8.1.113" }])))
        .mount(&server)
        .await;

    let health = client.get_health().await.unwrap();
    let sysinfo = client.get_sysinfo().await.unwrap();

    assert_eq!(health.len(), 2);
    assert_eq!(health[0].subsystem, "wan");
    assert_eq!(health[0].status.as_deref(), Some("ok"));
    assert_eq!(health[0].extra["wan_ip"], "203.0.113.7");
    assert_eq!(sysinfo["version"], "8.1.113");
}

#[tokio::test]
async fn test_list_and_get_networks() {
    let (server, client) = setup(ControllerPlatform::ClassicController).await;

    Mock::given(method("GET"))
        .and(path(site_path("rest/networkconf")))
        .respond_with(ok_envelope(json!([
            { "_id": "n1", "name": "LAN", "purpose": "corporate" },
            { "_id": "n2", "name": "IoT", "purpose": "corporate", "vlan": 20 }
        ])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(site_path("rest/networkconf/n2")))
        .respond_with(ok_envelope(json!([{ "_id": "n2", "name": "IoT", "vlan": 20 }])))
        .mount(&server)
        .await;

    let all = client.list_rest(RestResource::Network).await.unwrap();
    assert_eq!(all.len(), 2);

    let one = client.get_rest(RestResource::Network, "n2").await.unwrap();
    assert_eq!(one["vlan"], 20);
}

#[tokio::test]
async fn test_get_missing_object_is_not_found() {
    let (server, client) = setup(ControllerPlatform::ClassicController).await;

    Mock::given(method("GET"))
        .and(path(site_path("rest/firewallrule/gone")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "meta": { "rc": "error", "msg": "api.err.IdInvalid" },
            "data": []
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(site_path("rest/firewallrule/empty")))
        .respond_with(ok_envelope(json!([])))
        .mount(&server)
        .await;

    let invalid = client.get_rest(RestResource::FirewallRule, "gone").await;
    let empty = client.get_rest(RestResource::FirewallRule, "empty").await;

    assert!(matches!(invalid, Err(Error::NotFound { .. })), "got: {invalid:?}");
    assert!(matches!(empty, Err(Error::NotFound { .. })), "got: {empty:?}");
}

#[tokio::test]
async fn test_update_and_delete() {
    let (server, client) = setup(ControllerPlatform::ClassicController).await;

    Mock::given(method("PUT"))
        .and(path(site_path("rest/portforward/pf1")))
        .and(body_partial_json(json!({ "dst_port": "8443" })))
        .respond_with(ok_envelope(json!([{ "_id": "pf1", "dst_port": "8443" }])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path(site_path("rest/portforward/pf1")))
        .respond_with(ok_envelope(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let updated = client
        .update_rest(RestResource::PortForward, "pf1", &json!({ "dst_port": "8443" }))
        .await
        .unwrap();
    assert_eq!(updated["dst_port"], "8443");

    client.delete_rest(RestResource::PortForward, "pf1").await.unwrap();
}

// ── Error classification tests ──────────────────────────────────────

#[tokio::test]
async fn test_http_401_is_session_expired() {
    let (server, client) = setup(ControllerPlatform::ClassicController).await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let result = client.list_sites().await;

    assert!(matches!(result, Err(Error::SessionExpired)), "got: {result:?}");
}

#[tokio::test]
async fn test_login_required_envelope_is_session_expired() {
    let (server, client) = setup(ControllerPlatform::ClassicController).await;

    Mock::given(method("GET"))
        .and(path(site_path("rest/wlanconf")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "meta": { "rc": "error", "msg": "api.err.LoginRequired" },
            "data": []
        })))
        .mount(&server)
        .await;

    let result = client.list_rest(RestResource::Wlan).await;

    assert!(matches!(result, Err(Error::SessionExpired)), "got: {result:?}");
}

#[tokio::test]
async fn test_unifi_os_error_body() {
    let (server, client) = setup(ControllerPlatform::UnifiOs).await;

    Mock::given(method("GET"))
        .and(path("/proxy/network/api/s/default/stat/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": { "code": 401, "message": "Unauthorized" }
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/proxy/network/api/s/default/stat/sysinfo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": { "code": 500, "message": "boom" }
        })))
        .mount(&server)
        .await;

    let health = client.get_health().await;
    let sysinfo = client.get_sysinfo().await;

    assert!(matches!(health, Err(Error::SessionExpired)), "got: {health:?}");
    assert!(
        matches!(sysinfo, Err(Error::LegacyApi { ref message }) if message.contains("500")),
        "got: {sysinfo:?}"
    );
}

#[tokio::test]
async fn test_forbidden_and_rate_limited() {
    let (server, client) = setup(ControllerPlatform::ClassicController).await;

    Mock::given(method("GET"))
        .and(path(site_path("rest/user")))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(site_path("rest/account")))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "7"))
        .mount(&server)
        .await;

    let forbidden = client.list_rest(RestResource::User).await;
    let limited = client.list_rest(RestResource::RadiusAccount).await;

    assert!(matches!(forbidden, Err(Error::Forbidden { .. })), "got: {forbidden:?}");
    assert!(
        matches!(limited, Err(Error::RateLimited { retry_after_secs: 7 })),
        "got: {limited:?}"
    );
}

#[tokio::test]
async fn test_legacy_api_error() {
    let (server, client) = setup(ControllerPlatform::ClassicController).await;

    Mock::given(method("POST"))
        .and(path(site_path("rest/networkconf")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "meta": { "rc": "error", "msg": "api.err.InvalidObject" },
            "data": []
        })))
        .mount(&server)
        .await;

    let result = client
        .create_rest(RestResource::Network, &json!({ "name": "bad" }))
        .await;

    match result {
        Err(Error::LegacyApi { ref message }) => {
            assert!(message.contains("InvalidObject"), "got: {message}");
        }
        other => panic!("expected LegacyApi error, got: {other:?}"),
    }
}

// ── Session recovery over HTTP ──────────────────────────────────────

struct LoginAdapter {
    client: LegacyClient,
    credentials: LoginCredentials,
}

#[async_trait]
impl Relogin for LoginAdapter {
    async fn relogin(&self) -> Result<(), Error> {
        self.client.login(&self.credentials).await
    }
}

#[tokio::test]
async fn test_guard_recovers_from_expired_cookie() {
    let (server, client) = setup(ControllerPlatform::ClassicController).await;

    // First list hits an expired session, the replay succeeds.
    Mock::given(method("GET"))
        .and(path(site_path("rest/firewallgroup")))
        .respond_with(ResponseTemplate::new(401))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(site_path("rest/firewallgroup")))
        .respond_with(ok_envelope(json!([{ "_id": "fg1", "name": "blocklist" }])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let guard = SessionGuard::new(LoginAdapter {
        client,
        credentials: credentials(),
    });
    let client = &guard.delegate().client;

    let groups = guard
        .execute(|| client.list_rest(RestResource::FirewallGroup))
        .await
        .unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0]["name"], "blocklist");
    assert!(guard.last_reauth().await.is_some());
}

#[tokio::test]
async fn test_guard_reports_failed_relogin() {
    let (server, client) = setup(ControllerPlatform::ClassicController).await;

    Mock::given(method("GET"))
        .and(path(site_path("rest/dynamicdns")))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ResponseTemplate::new(400).set_body_string("api.err.Invalid"))
        .expect(1)
        .mount(&server)
        .await;

    let guard = SessionGuard::new(LoginAdapter {
        client,
        credentials: credentials(),
    });
    let client = &guard.delegate().client;

    let result = guard
        .execute(|| client.list_rest(RestResource::DynamicDns))
        .await;

    match result {
        Err(Error::ReauthenticationFailed { source }) => {
            assert!(matches!(*source, Error::Authentication { .. }), "got: {source:?}");
        }
        other => panic!("expected ReauthenticationFailed, got: {other:?}"),
    }
}
