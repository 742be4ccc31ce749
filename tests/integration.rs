use cf_images_uploader::{
    cache::{ImageCache, JsonFileStore, MemoryStore},
    format::DocumentKind,
    hash::content_digest,
    images::{CloudflareImagesClient, ImageHostService, MockImageHost},
    models::{ApiCredentials, Config},
    purge::{BulkDeleter, DeleteSummary},
    uploader::Uploader,
    Error,
};
use chrono::{Duration, SecondsFormat, Utc};
use std::collections::HashMap;
use std::io::Cursor;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> Config {
    let vars: HashMap<&str, String> = HashMap::from([
        ("CF_ACCOUNT_ID", "acct".to_string()),
        ("CF_API_TOKEN", "token".to_string()),
        ("CF_ACCOUNT_HASH", "abc".to_string()),
        ("CF_API_BASE_URL", server.uri()),
    ]);
    Config::from_lookup(|key| vars.get(key).cloned()).unwrap()
}

#[tokio::test]
async fn test_same_file_twice_issues_one_upload_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/accounts/acct/images/v1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "result": { "id": "xyz" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let image = dir.path().join("cat.png");
    std::fs::write(&image, b"cat pixels").unwrap();
    let state = dir.path().join("state.json");

    let client = CloudflareImagesClient::new(&config_for(&server));
    let mut uploader = Uploader::start(Box::new(client), Box::new(JsonFileStore::new(&state)));

    let first = uploader.upload_file(&image).await.unwrap();
    let second = uploader.upload_file(&image).await.unwrap();

    assert_eq!(first.url, "https://imagedelivery.net/abc/xyz/public");
    assert_eq!(second.url, first.url);
    assert!(second.duplicate);

    // The state file now carries the entry under the namespaced key.
    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&state).unwrap()).unwrap();
    let entry = &raw["imageCache"][content_digest(b"cat pixels")];
    assert_eq!(entry["remoteUrl"], "https://imagedelivery.net/abc/xyz/public");
    assert_eq!(entry["originalFileName"], "cat.png");
}

#[tokio::test]
async fn test_cache_is_reused_by_a_new_session() {
    let dir = tempfile::tempdir().unwrap();
    let state = dir.path().join("state.json");
    let host = MockImageHost::new().with_delivery("abc".to_string(), "/public".to_string());

    let mut first_session =
        Uploader::start(Box::new(host.clone()), Box::new(JsonFileStore::new(&state)));
    let url = first_session
        .upload_bytes(b"diagram", "diagram.png")
        .await
        .unwrap()
        .url;
    drop(first_session);

    let mut second_session =
        Uploader::start(Box::new(host.clone()), Box::new(JsonFileStore::new(&state)));
    let again = second_session
        .upload_bytes(b"diagram", "renamed.png")
        .await
        .unwrap();

    assert!(again.duplicate);
    assert_eq!(again.url, url);
    assert_eq!(host.get_upload_count(), 1);
}

#[tokio::test]
async fn test_missing_credentials_never_reach_the_network() {
    let server = MockServer::start().await;
    Mock::given(path_regex(".*"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    for missing in ["CF_ACCOUNT_ID", "CF_API_TOKEN", "CF_ACCOUNT_HASH"] {
        let mut vars: HashMap<&str, String> = HashMap::from([
            ("CF_ACCOUNT_ID", "acct".to_string()),
            ("CF_API_TOKEN", "token".to_string()),
            ("CF_ACCOUNT_HASH", "abc".to_string()),
            ("CF_API_BASE_URL", server.uri()),
        ]);
        vars.remove(missing);

        let store = MemoryStore::new();
        let result = Uploader::from_lookup(|key| vars.get(key).cloned(), Box::new(store.clone()));

        match result {
            Err(Error::Config(message)) => assert!(message.contains(missing), "{}", message),
            Err(other) => panic!("{}: unexpected error {:?}", missing, other),
            Ok(_) => panic!("{}: session started without it", missing),
        }
        assert_eq!(store.get_update_count(), 0);
    }

    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn test_configured_session_uploads_through_the_api() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/accounts/acct/images/v1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "result": { "id": "from-lookup" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let vars: HashMap<&str, String> = HashMap::from([
        ("CF_ACCOUNT_ID", "acct".to_string()),
        ("CF_API_TOKEN", "token".to_string()),
        ("CF_ACCOUNT_HASH", "abc".to_string()),
        ("CF_DEFAULT_VARIANT", "thumb".to_string()),
        ("CF_API_BASE_URL", server.uri()),
    ]);
    let mut uploader =
        Uploader::from_lookup(|key| vars.get(key).cloned(), Box::new(MemoryStore::new())).unwrap();

    let outcome = uploader.upload_bytes(b"bytes", "a.png").await.unwrap();
    assert_eq!(outcome.url, "https://imagedelivery.net/abc/from-lookup/thumb");
}

#[tokio::test]
async fn test_batch_upload_with_markup_links() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.png");
    let b = dir.path().join("b.png");
    std::fs::write(&a, b"aaa").unwrap();
    std::fs::write(&b, b"bbb").unwrap();

    let host = MockImageHost::new().with_delivery("abc".to_string(), "/public".to_string());
    let mut uploader = Uploader::start(Box::new(host.clone()), Box::new(MemoryStore::new()));

    let report = uploader
        .upload_batch(&[a, b], DocumentKind::from_language_id("html"))
        .await;

    assert_eq!(
        report.links,
        vec![
            "<img src=\"https://imagedelivery.net/abc/mock-1/public\" alt=\"a.png\" />",
            "<img src=\"https://imagedelivery.net/abc/mock-2/public\" alt=\"b.png\" />",
        ]
    );
    assert_eq!(report.duplicates, 0);
    assert!(report.failures.is_empty());
    assert_eq!(uploader.cache().len(), 2);
}

#[tokio::test]
async fn test_bulk_delete_against_api_with_partial_failure() {
    let server = MockServer::start().await;
    let now = Utc::now();
    let ts = |days: i64| (now - Duration::days(days)).to_rfc3339_opts(SecondsFormat::Millis, true);

    Mock::given(method("GET"))
        .and(path("/accounts/acct/images/v1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "result": { "images": [
                { "id": "one", "uploaded": ts(1), "filename": "one.png" },
                { "id": "two", "uploaded": ts(2), "filename": "two.png" },
                { "id": "three", "uploaded": ts(3), "filename": "three.png" },
                { "id": "old", "uploaded": ts(8), "filename": "old.png" },
                { "id": "garbled", "uploaded": "not a date", "filename": "garbled.png" }
            ]}
        })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/accounts/acct/images/v1/two"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path_regex("^/accounts/acct/images/v1/(one|three)$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true, "result": {}
        })))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/accounts/acct/images/v1/old"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = CloudflareImagesClient::with_credentials(ApiCredentials {
        account_id: "acct".to_string(),
        api_token: "token".to_string(),
    })
    .with_base_url(server.uri());
    let deleter = BulkDeleter::new(&client);

    let mut out = Vec::new();
    let summary = deleter
        .run(now, &mut Cursor::new(b"\n".to_vec()), &mut out)
        .await
        .unwrap();

    assert_eq!(
        summary,
        DeleteSummary {
            total_listed: 5,
            matched: 3,
            deleted: 2,
            failed: 1,
        }
    );
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("Found 3 image(s) to delete:"));
    assert!(text.contains("internal error"));
}

#[tokio::test]
async fn test_listing_failure_is_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/accounts/acct/images/v1"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
        .mount(&server)
        .await;

    let client = CloudflareImagesClient::new(&config_for(&server));
    let deleter = BulkDeleter::new(&client);

    let err = deleter
        .run(Utc::now(), &mut Cursor::new(Vec::new()), &mut Vec::new())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::RemoteApi(_)));
}

#[tokio::test]
async fn test_mock_host_satisfies_service_contract() {
    let host: Box<dyn ImageHostService> = Box::new(MockImageHost::new());
    let url = host.upload_image(&[], "empty.png").await.unwrap();
    assert!(url.starts_with("https://imagedelivery.net/"));

    let cache = ImageCache::load(Box::new(MemoryStore::new()));
    assert!(cache.is_empty());
}
