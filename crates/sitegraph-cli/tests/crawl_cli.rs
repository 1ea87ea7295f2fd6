#![allow(missing_docs, clippy::unwrap_used)]

mod common;

use common::{sitegraph_cmd, urlset};
use predicates::prelude::*;
use tempfile::tempdir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn serve(server: &MockServer, at: &str, body: String, mime: &str) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, mime))
        .mount(server)
        .await;
}

/// `home.html` links to `about.html` and to a page that does not exist.
async fn small_site(server: &MockServer) -> String {
    let base = server.uri();
    serve(
        server,
        "/sitemap.xml",
        urlset(&base, &["home.html", "about.html"]),
        "text/xml",
    )
    .await;
    serve(
        server,
        "/home.html",
        r#"<html><head><title>Home</title></head><body>
            <nav><a href="about.html">About us</a></nav>
            <a href="/missing.html">Old page</a>
        </body></html>"#
            .to_string(),
        "text/html; charset=utf-8",
    )
    .await;
    serve(
        server,
        "/about.html",
        "<html><head><title>About</title></head><body></body></html>".to_string(),
        "text/html",
    )
    .await;
    Mock::given(method("HEAD"))
        .and(path("/missing.html"))
        .respond_with(ResponseTemplate::new(404))
        .mount(server)
        .await;
    format!("{base}/sitemap.xml")
}

#[tokio::test]
async fn json_report_on_stdout() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    let sitemap = small_site(&server).await;
    let cache = tempdir()?;

    let output = sitegraph_cmd()
        .args(["--sitemap", &sitemap, "--format", "json", "--cache-dir"])
        .arg(cache.path())
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let value: serde_json::Value = serde_json::from_slice(&output)?;
    assert_eq!(value["summary"]["pages"], 2);
    assert_eq!(value["summary"]["references"], 2);
    assert_eq!(value["summary"]["broken"], 1);
    assert_eq!(value["summary"]["orphans"], 1);
    assert_eq!(value["sitemaps"], 1);
    assert_eq!(value["page_links"][0]["link_kind"], "Menu");
    Ok(())
}

#[tokio::test]
async fn text_summary_lists_broken_links() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    let sitemap = small_site(&server).await;
    let cache = tempdir()?;

    sitegraph_cmd()
        .args(["--sitemap", &sitemap, "--cache-dir"])
        .arg(cache.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Broken links:"))
        .stdout(predicate::str::contains("missing.html"))
        .stdout(predicate::str::contains("Not linked from other pages:"));
    Ok(())
}

#[tokio::test]
async fn output_dir_holds_cache_and_report_with_backup() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    let sitemap = small_site(&server).await;
    let out = tempdir()?;

    for _ in 0..2 {
        sitegraph_cmd()
            .args(["--sitemap", &sitemap, "--quiet", "--output-dir"])
            .arg(out.path())
            .assert()
            .success();
    }

    assert!(out.path().join("cache").is_dir());
    assert!(out.path().join("127.0.0.1.json").is_file());
    assert!(out.path().join("127.0.0.1.json.bak").is_file());
    Ok(())
}

#[tokio::test]
async fn failing_sitemap_exits_with_network_code() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let cache = tempdir()?;

    sitegraph_cmd()
        .args(["--sitemap", &format!("{}/sitemap.xml", server.uri()), "--cache-dir"])
        .arg(cache.path())
        .assert()
        .code(5)
        .stderr(predicate::str::contains("GET "))
        .stderr(predicate::str::contains("/sitemap.xml"));
    Ok(())
}

#[tokio::test]
async fn unsupported_page_exits_with_content_code() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    let base = server.uri();
    serve(&server, "/sitemap.xml", urlset(&base, &["doc.pdf"]), "text/xml").await;
    Mock::given(method("GET"))
        .and(path("/doc.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("%PDF-1.4", "application/pdf"))
        .mount(&server)
        .await;
    let cache = tempdir()?;

    sitegraph_cmd()
        .args(["--sitemap", &format!("{base}/sitemap.xml"), "--cache-dir"])
        .arg(cache.path())
        .assert()
        .code(6)
        .stderr(predicate::str::contains("application/pdf"));
    Ok(())
}

#[test]
fn missing_sitemap_is_usage_error() {
    sitegraph_cmd().assert().code(2);
}

#[test]
fn unknown_retention_policy_is_usage_error() {
    sitegraph_cmd()
        .args([
            "--sitemap",
            "https://ex.org/sitemap.xml",
            "--retention-policy",
            "fortnight",
        ])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("fortnight"));
}
