// End to end: GitHub feed (mocked) -> resolver -> HTTP endpoints
use http_body_util::BodyExt;
use hyper::{header, Request, StatusCode};
use mockito::{Matcher, Server, ServerGuard};
use release_channels::{
    handle, ChannelResolver, GitHubRepo, GitHubSource, HttpClient, ReleaseServer, ResolverConfig,
};
use std::fs;
use std::sync::Arc;
use tokio::net::TcpListener;

const FIXTURES: &str = "packages/release-provider/tests/web";

fn fixture(name: &str) -> String {
    fs::read_to_string(format!("{}/{}", FIXTURES, name)).unwrap()
}

fn resolver(server: &ServerGuard) -> ChannelResolver {
    let client = HttpClient::new("release-channels-tests").unwrap();
    let repo = GitHubRepo::new(server.url(), "BudgetBudget");
    let source = Arc::new(GitHubSource::with_memory_cache(repo.clone(), client));
    ChannelResolver::new(source, repo, ResolverConfig::default())
}

async fn mock_feed(server: &mut ServerGuard) -> Vec<mockito::Mock> {
    let mut mocks = Vec::new();
    for (after, name) in [
        (None, "releases_page1.atom"),
        (Some("v0.1.0"), "releases_page2.atom"),
        (Some("v0.0.9-alpha.8"), "releases_empty.atom"),
    ] {
        let mock = server.mock("GET", "/releases.atom");
        let mock = match after {
            Some(after) => mock.match_query(Matcher::UrlEncoded("after".into(), after.into())),
            None => mock,
        };
        mocks.push(mock.with_status(200).with_body(fixture(name)).create_async().await);
    }
    mocks
}

async fn mock_manifest(server: &mut ServerGuard, tag: &str) -> mockito::Mock {
    server
        .mock("GET", format!("/releases/download/{}/latest-mac.yml", tag).as_str())
        .with_status(200)
        .with_body(fixture("latest-mac.yml"))
        .create_async()
        .await
}

#[tokio::test]
async fn test_release_endpoint() {
    let mut server = Server::new_async().await;
    let _feed = mock_feed(&mut server).await;
    let _manifest = mock_manifest(&mut server, "v0.2.0-alpha.2").await;
    let resolver = resolver(&server);

    let req = Request::get("/release/alpha").body(()).unwrap();
    let rsp = handle(&resolver, req).await;
    assert_eq!(rsp.status(), StatusCode::OK);
    assert_eq!(rsp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");

    let body = rsp.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["version"], "v0.2.0-alpha.2");
    assert_eq!(json["title"], "v0.2.0-alpha.2");
    assert_eq!(json["files"]["x64"]["size"], "91.2 MB");
    assert_eq!(
        json["files"]["arm64"]["download"],
        format!(
            "{}/releases/download/v0.2.0-alpha.2/BudgetBudget-0.2.0-alpha.2-arm64.dmg",
            server.url()
        )
    );
    assert_eq!(json["changelog"]["Bug Fixes"]["_"][0]["commit"], "9be01d3");
}

#[tokio::test]
async fn test_releases_endpoint_reads_whole_feed() {
    let mut server = Server::new_async().await;
    let feed = mock_feed(&mut server).await;
    let _alpha = mock_manifest(&mut server, "v0.2.0-alpha.2").await;
    let _stable = mock_manifest(&mut server, "v0.1.0").await;
    let _beta = mock_manifest(&mut server, "v0.1.0-beta.3").await;
    let resolver = resolver(&server);

    let req = Request::get("/releases").body(()).unwrap();
    let rsp = handle(&resolver, req).await;
    assert_eq!(rsp.status(), StatusCode::OK);

    let body = rsp.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["alpha"]["version"], "v0.2.0-alpha.2");
    assert_eq!(json["beta"]["version"], "v0.1.0-beta.3");
    assert_eq!(json["stable"]["version"], "v0.1.0");
    for mock in &feed {
        mock.assert_async().await;
    }
}

#[tokio::test]
async fn test_server_redirects_to_installer() {
    let mut server = Server::new_async().await;
    let _feed = mock_feed(&mut server).await;
    let _manifest = mock_manifest(&mut server, "v0.2.0-alpha.2").await;
    let installer = server
        .mock(
            "GET",
            "/releases/download/v0.2.0-alpha.2/BudgetBudget-0.2.0-alpha.2-arm64.dmg",
        )
        .with_status(200)
        .with_body("arm64 installer")
        .create_async()
        .await;

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let release_server = ReleaseServer::new(Arc::new(resolver(&server)));
    tokio::spawn(release_server.serve(listener));

    let client = HttpClient::new("release-channels-tests").unwrap();
    let rsp = client
        .get(&format!("http://{}/download/alpha/arm64", addr))
        .await
        .unwrap();
    assert_eq!(rsp.status, 200);
    assert_eq!(rsp.text(), "arm64 installer");
    installer.assert_async().await;

    let rsp = client
        .get(&format!("http://{}/release", addr))
        .await
        .unwrap();
    assert_eq!(rsp.status, 400);
    assert_eq!(rsp.text(), "Missing channel parameter");
}
