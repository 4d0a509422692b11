use std::collections::HashSet;

use ::common::storage::MediaKey;
use gateway::entity::history_record::{self, KIND_IMAGE};
use gateway::history::HistoryLedger;
use serde_json::json;

use crate::common::{ALICE, BOB, TestApp, routes};

/// Insert ledger rows directly, with controlled timestamps.
async fn seed_records(app: &TestApp, user_key: &str, count: usize) -> Vec<String> {
    let ledger = HistoryLedger::new(&app.db);
    let mut ids = Vec::new();
    for i in 0..count {
        let id = format!("{user_key}-rec{i:03}");
        ledger
            .insert(history_record::Model {
                id: id.clone(),
                user_key: user_key.to_string(),
                kind: KIND_IMAGE.to_string(),
                prompt: format!("prompt {i}"),
                // Pairs share a timestamp so the id tie-break is exercised.
                created_at: 1_700_000_000_000 + (i / 2) as i64,
                blob_key: format!("{user_key}/{id}.png"),
                mime_type: "image/png".to_string(),
                width: None,
                height: None,
                extra: None,
            })
            .await
            .unwrap();
        ids.push(id);
    }
    ids
}

mod listing {
    use super::*;

    #[tokio::test]
    async fn pages_are_disjoint_and_complete() {
        let app = TestApp::spawn().await;
        let alice = app.login(ALICE).await;
        let mut expected = seed_records(&app, ALICE, 7).await;
        seed_records(&app, BOB, 3).await;
        expected.reverse();

        let mut seen = Vec::new();
        let mut cursor: Option<String> = None;
        let mut pages = 0;
        loop {
            let res = alice
                .get(&routes::history_page(3, cursor.as_deref()))
                .await;
            assert_eq!(res.status, 200, "{}", res.text);
            pages += 1;
            for item in res.body["items"].as_array().unwrap() {
                seen.push(item["id"].as_str().unwrap().to_string());
                assert_eq!(item["kind"], "image");
                assert!(item["mediaUrl"].as_str().unwrap().starts_with("/api/media/"));
            }
            match res.body["nextCursor"].as_str() {
                Some(next) => cursor = Some(next.to_string()),
                None => {
                    assert!(res.body["nextCursor"].is_null());
                    break;
                }
            }
        }

        assert_eq!(pages, 3);
        assert_eq!(seen, expected);
        assert_eq!(seen.iter().collect::<HashSet<_>>().len(), 7);
    }

    #[tokio::test]
    async fn limit_defaults_and_clamps() {
        let app = TestApp::spawn().await;
        let alice = app.login(ALICE).await;
        seed_records(&app, ALICE, 60).await;

        let default = alice.get(routes::HISTORY).await;
        assert_eq!(default.body["items"].as_array().unwrap().len(), 20);

        let huge = alice.get(&routes::history_page(500, None)).await;
        assert_eq!(huge.body["items"].as_array().unwrap().len(), 50);

        let zero = alice.get(&routes::history_page(0, None)).await;
        assert_eq!(zero.body["items"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn empty_history_has_no_cursor() {
        let app = TestApp::spawn().await;
        let res = app.login(ALICE).await.get(routes::HISTORY).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["items"], json!([]));
        assert!(res.body["nextCursor"].is_null());
    }

    #[tokio::test]
    async fn malformed_cursor_is_rejected() {
        let app = TestApp::spawn().await;
        let alice = app.login(ALICE).await;

        let res = alice
            .get(&routes::history_page(5, Some("definitely-not-a-cursor")))
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

mod single_item {
    use super::*;

    #[tokio::test]
    async fn owner_can_read_it() {
        let app = TestApp::spawn().await;
        let alice = app.login(ALICE).await;
        let id = alice.generate("lighthouse", 1).await.remove(0);

        let res = alice.get(&routes::history_item(&id)).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["id"], id.as_str());
        assert_eq!(res.body["prompt"], "lighthouse");
        assert_eq!(res.body["mimeType"], "image/png");
        assert!(res.body["createdAt"].is_i64());
    }

    #[tokio::test]
    async fn foreign_and_unknown_ids_look_the_same() {
        let app = TestApp::spawn().await;
        let alice = app.login(ALICE).await;
        let bob = app.login(BOB).await;
        let id = alice.generate("secret", 1).await.remove(0);

        let foreign = bob.get(&routes::history_item(&id)).await;
        let unknown = bob.get(&routes::history_item("no-such-id")).await;

        assert_eq!(foreign.status, 404);
        assert_eq!(unknown.status, 404);
        assert_eq!(foreign.body, unknown.body);
    }
}

mod deletion {
    use super::*;

    #[tokio::test]
    async fn removes_row_and_blob() {
        let app = TestApp::spawn().await;
        let alice = app.login(ALICE).await;
        let id = alice.generate("short-lived", 1).await.remove(0);
        let record = HistoryLedger::new(&app.db)
            .get_by_id(&id)
            .await
            .unwrap()
            .unwrap();
        let key = MediaKey::parse(&record.blob_key).unwrap();
        assert!(app.media.exists(&key).await.unwrap());

        let res = alice.delete(&routes::history_item(&id)).await;
        assert_eq!(res.status, 204);

        assert_eq!(alice.get(&routes::history_item(&id)).await.status, 404);
        assert_eq!(alice.get(&routes::media(&id)).await.status, 404);
        assert!(!app.media.exists(&key).await.unwrap());
        assert_eq!(alice.delete(&routes::history_item(&id)).await.status, 404);
    }

    #[tokio::test]
    async fn other_users_cannot_delete() {
        let app = TestApp::spawn().await;
        let alice = app.login(ALICE).await;
        let bob = app.login(BOB).await;
        let id = alice.generate("keep me", 1).await.remove(0);

        let res = bob.delete(&routes::history_item(&id)).await;
        assert_eq!(res.status, 404);
        assert_eq!(alice.get(&routes::history_item(&id)).await.status, 200);
        assert_eq!(alice.get(&routes::media(&id)).await.status, 200);
    }

    #[tokio::test]
    async fn missing_blob_does_not_block_deletion() {
        let app = TestApp::spawn().await;
        let alice = app.login(ALICE).await;
        // Rows seeded directly have no blob behind them.
        let ids = seed_records(&app, ALICE, 1).await;

        let res = alice.delete(&routes::history_item(&ids[0])).await;
        assert_eq!(res.status, 204);
        assert_eq!(alice.get(&routes::history_item(&ids[0])).await.status, 404);
    }
}
