use crate::common::{ALICE, BOB, FAKE_PNG, TestApp, routes};

#[tokio::test]
async fn streams_bytes_with_cache_headers() {
    let app = TestApp::spawn().await;
    let alice = app.login(ALICE).await;
    let id = alice.generate("sunset", 1).await.remove(0);

    let res = alice.get(&routes::media(&id)).await;

    assert_eq!(res.status, 200);
    assert_eq!(res.bytes, FAKE_PNG);
    assert_eq!(res.header("content-type"), Some("image/png"));
    assert_eq!(res.header("etag"), Some(format!("\"{id}\"").as_str()));
    let cache = res.header("cache-control").unwrap();
    assert!(cache.contains("immutable"));
    assert!(cache.contains("max-age=31536000"));
}

#[tokio::test]
async fn matching_etag_is_not_modified() {
    let app = TestApp::spawn().await;
    let alice = app.login(ALICE).await;
    let id = alice.generate("sunset", 1).await.remove(0);
    let etag = format!("\"{id}\"");

    let res = alice
        .get_with_header(&routes::media(&id), "if-none-match", &etag)
        .await;
    assert_eq!(res.status, 304);
    assert!(res.bytes.is_empty());

    let stale = alice
        .get_with_header(&routes::media(&id), "if-none-match", "\"something-else\"")
        .await;
    assert_eq!(stale.status, 200);
    assert_eq!(stale.bytes, FAKE_PNG);
}

#[tokio::test]
async fn foreign_media_is_not_found() {
    let app = TestApp::spawn().await;
    let alice = app.login(ALICE).await;
    let bob = app.login(BOB).await;
    let id = alice.generate("mine", 1).await.remove(0);

    let res = bob.get(&routes::media(&id)).await;
    assert_eq!(res.status, 404);
    assert_eq!(res.body["code"], "NOT_FOUND");

    // An ETag guess does not bypass the ownership check.
    let probe = bob
        .get_with_header(&routes::media(&id), "if-none-match", "*")
        .await;
    assert_eq!(probe.status, 404);
}

#[tokio::test]
async fn unknown_media_is_not_found() {
    let app = TestApp::spawn().await;
    let res = app.login(ALICE).await.get(&routes::media("nope")).await;
    assert_eq!(res.status, 404);
}
