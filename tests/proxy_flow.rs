//! End-to-end tests: client → proxy → mock v5 upstream.

use std::net::SocketAddr;

use api_proxy::http::ErrorStatus;

mod common;

use common::{client, proxy_config, start_kraken_upstream, start_programmable_upstream, start_proxy, CLIENT_ID, V5_ACCEPT};

const USERS: &[(&str, u64)] = &[("forsen", 22484632), ("pajlada", 11148817)];

fn addrs(proxy: u16, upstream: u16) -> (SocketAddr, SocketAddr) {
    (
        format!("127.0.0.1:{}", proxy).parse().unwrap(),
        format!("127.0.0.1:{}", upstream).parse().unwrap(),
    )
}

#[tokio::test]
async fn test_named_segment_rewritten() {
    let (proxy_addr, upstream_addr) = addrs(28301, 28302);
    let upstream = start_kraken_upstream(upstream_addr, USERS).await;
    let shutdown = start_proxy(proxy_config(proxy_addr, upstream_addr)).await;

    let res = client()
        .get(format!("http://{}/kraken/channels/forsen/follows?limit=10&offset=5", proxy_addr))
        .header("Accept", "application/vnd.twitchtv.v3+json")
        .header("Client-ID", "caller-client")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), r#"{"ok":true}"#);

    let lookups = upstream.lookups();
    assert_eq!(lookups.len(), 1);
    assert_eq!(lookups[0].query(), Some("login=forsen"));
    assert_eq!(lookups[0].header("client-id"), Some(CLIENT_ID));
    assert_eq!(lookups[0].header("accept"), Some(V5_ACCEPT));

    let forwarded = upstream.forwarded();
    assert_eq!(forwarded.len(), 1);
    assert_eq!(forwarded[0].method, "GET");
    assert_eq!(forwarded[0].target, "/kraken/channels/22484632/follows?limit=10&offset=5");
    assert_eq!(forwarded[0].header("accept"), Some(V5_ACCEPT));
    assert_eq!(forwarded[0].header("client-id"), Some("caller-client"));
    assert!(forwarded[0].header("x-request-id").is_some());

    shutdown.trigger();
}

#[tokio::test]
async fn test_second_request_served_from_cache() {
    let (proxy_addr, upstream_addr) = addrs(28303, 28304);
    let upstream = start_kraken_upstream(upstream_addr, USERS).await;
    let shutdown = start_proxy(proxy_config(proxy_addr, upstream_addr)).await;

    let client = client();
    for _ in 0..3 {
        let res = client
            .get(format!("http://{}/kraken/users/pajlada", proxy_addr))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 200);
    }

    assert_eq!(upstream.lookups().len(), 1);
    let forwarded = upstream.forwarded();
    assert_eq!(forwarded.len(), 3);
    assert!(forwarded.iter().all(|r| r.target == "/kraken/users/11148817"));

    shutdown.trigger();
}

#[tokio::test]
async fn test_unknown_login_returns_404() {
    let (proxy_addr, upstream_addr) = addrs(28305, 28306);
    let upstream = start_kraken_upstream(upstream_addr, USERS).await;
    let shutdown = start_proxy(proxy_config(proxy_addr, upstream_addr)).await;

    let res = client()
        .get(format!("http://{}/kraken/users/doesnotexist123456", proxy_addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 404);

    let body: ErrorStatus = res.json().await.unwrap();
    assert_eq!(body.error, "Not Found");
    assert_eq!(body.status, 404);
    assert!(body.message.contains("doesnotexist123456"));
    assert!(body.message.contains(":user (#2)"));

    assert!(upstream.forwarded().is_empty());

    shutdown.trigger();
}

#[tokio::test]
async fn test_unmatched_and_opaque_paths_pass_through() {
    let (proxy_addr, upstream_addr) = addrs(28307, 28308);
    let upstream = start_kraken_upstream(upstream_addr, USERS).await;
    let shutdown = start_proxy(proxy_config(proxy_addr, upstream_addr)).await;

    let client = client();
    let res = client
        .get(format!("http://{}/kraken/teams/staff", proxy_addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    let res = client
        .post(format!("http://{}/kraken/some/unknown/path", proxy_addr))
        .body(r#"{"hello":"world"}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    assert!(upstream.lookups().is_empty());
    let forwarded = upstream.forwarded();
    assert_eq!(forwarded.len(), 2);
    assert_eq!(forwarded[0].target, "/kraken/teams/staff");
    assert_eq!(forwarded[1].method, "POST");
    assert_eq!(forwarded[1].target, "/kraken/some/unknown/path");
    assert_eq!(forwarded[1].body, r#"{"hello":"world"}"#);

    shutdown.trigger();
}

#[tokio::test]
async fn test_put_with_two_named_segments() {
    let (proxy_addr, upstream_addr) = addrs(28309, 28310);
    let upstream = start_kraken_upstream(upstream_addr, USERS).await;
    let shutdown = start_proxy(proxy_config(proxy_addr, upstream_addr)).await;

    let res = client()
        .put(format!("http://{}/kraken/users/pajlada/follows/channels/forsen", proxy_addr))
        .body("notifications=true")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    let forwarded = upstream.forwarded();
    assert_eq!(forwarded.len(), 1);
    assert_eq!(forwarded[0].target, "/kraken/users/11148817/follows/channels/22484632");
    assert_eq!(forwarded[0].body, "notifications=true");

    shutdown.trigger();
}

#[tokio::test]
async fn test_status_endpoint_not_proxied() {
    let (proxy_addr, upstream_addr) = addrs(28311, 28312);
    let upstream = start_kraken_upstream(upstream_addr, USERS).await;
    let shutdown = start_proxy(proxy_config(proxy_addr, upstream_addr)).await;

    let client = client();
    client
        .get(format!("http://{}/kraken/users/forsen", proxy_addr))
        .send()
        .await
        .unwrap();

    let res = client
        .get(format!("http://{}/apiproxy/status", proxy_addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    let line = res.text().await.unwrap();
    assert!(line.starts_with("twitch-api-v3-proxy online for "));
    assert!(line.contains("1 usernames in cache, 1 requests served"));
    assert!(line.ends_with("no last exception in the user ID resolver"));

    assert_eq!(upstream.forwarded().len(), 1);

    shutdown.trigger();
}

#[tokio::test]
async fn test_rejected_client_id_returns_400() {
    let (proxy_addr, upstream_addr) = addrs(28313, 28314);
    let upstream = start_programmable_upstream(upstream_addr, |_| {
        (
            400,
            r#"{"error":"Bad Request","status":400,"message":"Invalid client id specified"}"#.to_string(),
        )
    })
    .await;
    let shutdown = start_proxy(proxy_config(proxy_addr, upstream_addr)).await;

    let res = client()
        .get(format!("http://{}/kraken/users/forsen", proxy_addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);

    let body: ErrorStatus = res.json().await.unwrap();
    assert_eq!(body.error, "Bad Request");
    assert!(body.message.contains("Client-ID"));
    assert!(upstream.forwarded().is_empty());

    shutdown.trigger();
}

#[tokio::test]
async fn test_lookup_failure_returns_502_and_is_retried() {
    let (proxy_addr, upstream_addr) = addrs(28315, 28316);
    let upstream = start_programmable_upstream(upstream_addr, |request| {
        if request.is_user_lookup() {
            (500, r#"{"error":"Internal Server Error"}"#.to_string())
        } else {
            (200, "{}".to_string())
        }
    })
    .await;
    let shutdown = start_proxy(proxy_config(proxy_addr, upstream_addr)).await;

    let client = client();
    for _ in 0..2 {
        let res = client
            .get(format!("http://{}/kraken/users/forsen", proxy_addr))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 502);
    }
    // failures are not cached
    assert_eq!(upstream.lookups().len(), 2);

    let line = client
        .get(format!("http://{}/apiproxy/status", proxy_addr))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(line.contains("0 usernames in cache"));
    assert!(line.contains("last exception in the user ID resolver was "));

    shutdown.trigger();
}

#[tokio::test]
async fn test_upstream_error_status_copied_back() {
    let (proxy_addr, upstream_addr) = addrs(28317, 28318);
    start_programmable_upstream(upstream_addr, |_| {
        (
            404,
            r#"{"error":"Not Found","status":404,"message":"Channel does not exist"}"#.to_string(),
        )
    })
    .await;
    let shutdown = start_proxy(proxy_config(proxy_addr, upstream_addr)).await;

    let res = client()
        .get(format!("http://{}/kraken/teams/nope", proxy_addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 404);
    assert_eq!(res.headers()["content-type"], "application/json");

    let body: ErrorStatus = res.json().await.unwrap();
    assert_eq!(body.message, "Channel does not exist");

    shutdown.trigger();
}

#[tokio::test]
async fn test_unreachable_upstream_returns_502() {
    let (proxy_addr, upstream_addr) = addrs(28319, 28320);
    let shutdown = start_proxy(proxy_config(proxy_addr, upstream_addr)).await;

    let res = client()
        .get(format!("http://{}/kraken/teams/staff", proxy_addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 502);

    let body: ErrorStatus = res.json().await.unwrap();
    assert_eq!(body.error, "Bad Gateway");

    shutdown.trigger();
}

#[tokio::test]
async fn test_request_body_limits_and_bodyless_methods() {
    let (proxy_addr, upstream_addr) = addrs(28321, 28322);
    let upstream = start_kraken_upstream(upstream_addr, USERS).await;
    let mut config = proxy_config(proxy_addr, upstream_addr);
    config.limits.max_body_bytes = 16;
    let shutdown = start_proxy(config).await;

    let client = client();
    let res = client
        .post(format!("http://{}/kraken/some/unknown/path", proxy_addr))
        .body("x".repeat(64))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);

    let body: ErrorStatus = res.json().await.unwrap();
    assert_eq!(body.error, "Bad Request");
    assert_eq!(body.status, 400);
    assert!(upstream.forwarded().is_empty());

    let res = client
        .delete(format!("http://{}/kraken/some/unknown/path", proxy_addr))
        .body("not for the upstream")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    let forwarded = upstream.forwarded();
    assert_eq!(forwarded.len(), 1);
    assert_eq!(forwarded[0].method, "DELETE");
    assert_eq!(forwarded[0].body, "");

    shutdown.trigger();
}
