use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use gateway::history::HistoryLedger;
use serde_json::json;

use crate::common::{ALICE, BOB, FAKE_PNG, Step, TestApp, routes};

mod batch {
    use super::*;

    #[tokio::test]
    async fn stores_every_produced_image() {
        let app = TestApp::spawn().await;
        let alice = app.login(ALICE).await;

        app.provider
            .script(vec![Step::Image, Step::Noted("here you go")]);
        let res = alice
            .post(routes::GENERATE_IMAGE, &json!({"prompt": "a red fox", "count": 2}))
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["ok"], true);
        let items = res.body["items"].as_array().unwrap();
        assert_eq!(items.len(), 2);
        for item in items {
            let id = item["mediaId"].as_str().unwrap();
            assert_eq!(item["mediaUrl"], routes::media(id));
            assert_eq!(item["mimeType"], "image/png");
        }
        assert_eq!(res.body["textNote"], "here you go");

        let page = HistoryLedger::new(&app.db)
            .list_page(ALICE, 50, None)
            .await
            .unwrap();
        assert_eq!(page.items.len(), 2);
        assert!(page.items.iter().all(|r| r.prompt == "a red fox"));
    }

    #[tokio::test]
    async fn count_is_clamped_to_five() {
        let app = TestApp::spawn().await;
        let alice = app.login(ALICE).await;

        let ids = alice.generate("many cats", 40).await;
        assert_eq!(ids.len(), 5);
        assert_eq!(app.provider.image_calls(), 5);

        let one = alice
            .post(routes::GENERATE_IMAGE, &json!({"prompt": "cat", "count": 0}))
            .await;
        assert_eq!(one.body["items"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn declines_are_a_content_outcome() {
        let app = TestApp::spawn().await;
        let alice = app.login(ALICE).await;
        app.provider.script(vec![Step::Decline("cannot draw that")]);

        let res = alice
            .post(routes::GENERATE_IMAGE, &json!({"prompt": "something odd"}))
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["ok"], false);
        assert_eq!(res.body["textNote"], "cannot draw that");
        assert!(res.body.get("items").is_none());
    }

    #[tokio::test]
    async fn provider_failure_is_a_bad_gateway() {
        let app = TestApp::spawn().await;
        let alice = app.login(ALICE).await;
        app.provider.script(vec![Step::Image, Step::Fail]);

        let res = alice
            .post(routes::GENERATE_IMAGE, &json!({"prompt": "cat", "count": 3}))
            .await;

        assert_eq!(res.status, 502);
        assert_eq!(res.body["code"], "UPSTREAM_ERROR");
        // The batch stopped at the failure; the image before it is kept.
        assert_eq!(app.provider.image_calls(), 2);
        let page = HistoryLedger::new(&app.db)
            .list_page(ALICE, 50, None)
            .await
            .unwrap();
        assert_eq!(page.items.len(), 1);
    }

    #[tokio::test]
    async fn invalid_requests_never_reach_the_provider() {
        let app = TestApp::spawn().await;
        let alice = app.login(ALICE).await;

        let bodies = [
            json!({"prompt": ""}),
            json!({"prompt": "   "}),
            json!({"action": "edit", "prompt": "recolor"}),
            json!({"action": "paint", "prompt": "cat"}),
            json!({"action": "edit", "prompt": "x", "images": [{"mimeType": "image/png", "data": "%%%"}]}),
        ];
        for body in bodies {
            let res = alice.post(routes::GENERATE_IMAGE, &body).await;
            assert_eq!(res.status, 400, "accepted {body}");
            assert_eq!(res.body["code"], "VALIDATION_ERROR");
        }
        assert_eq!(app.provider.image_calls(), 0);
    }
}

mod streaming {
    use super::*;

    #[tokio::test]
    async fn reports_each_attempt_in_order() {
        let app = TestApp::spawn().await;
        let alice = app.login(ALICE).await;
        app.provider
            .script(vec![Step::Image, Step::Decline("empty"), Step::Image]);

        let res = alice
            .post(
                routes::GENERATE_IMAGE,
                &json!({"prompt": "three birds", "count": 3, "stream": true}),
            )
            .await;

        assert_eq!(res.status, 200);
        assert!(res.header("content-type").unwrap().starts_with("text/event-stream"));

        let events = res.events();
        let names: Vec<_> = events.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["start", "item", "skip", "item", "done"]);
        assert_eq!(events[0].1["requested"], 3);
        assert_eq!(events[1].1["index"], 0);
        assert!(events[1].1["mediaId"].is_string());
        assert_eq!(events[2].1["index"], 1);
        assert_eq!(events[3].1["index"], 2);
        assert_eq!(events[4].1["producedCount"], 2);
    }

    #[tokio::test]
    async fn accept_header_selects_streaming() {
        let app = TestApp::spawn().await;
        let alice = app.login(ALICE).await;

        let res = alice
            .post_with_header(
                routes::GENERATE_IMAGE,
                &json!({"prompt": "cat"}),
                "accept",
                "text/event-stream",
            )
            .await;

        let names: Vec<_> = res.events().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["start", "item", "done"]);
    }

    #[tokio::test]
    async fn failures_do_not_stop_the_stream() {
        let app = TestApp::spawn().await;
        let alice = app.login(ALICE).await;
        app.provider.script(vec![Step::Fail, Step::Image]);

        let res = alice
            .post(
                routes::GENERATE_IMAGE,
                &json!({"prompt": "cat", "count": 2, "stream": true}),
            )
            .await;

        let events = res.events();
        let names: Vec<_> = events.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["start", "skip", "item", "done"]);
        assert!(events[1].1["textNote"].is_string());
        assert_eq!(events[3].1["producedCount"], 1);
    }

    #[tokio::test]
    async fn total_failure_ends_with_error_event() {
        let app = TestApp::spawn().await;
        let alice = app.login(ALICE).await;
        app.provider.script(vec![Step::Fail]);

        let res = alice
            .post(
                routes::GENERATE_IMAGE,
                &json!({"prompt": "cat", "stream": true}),
            )
            .await;

        let names: Vec<_> = res.events().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["start", "skip", "error"]);
    }

    #[tokio::test]
    async fn validation_errors_are_plain_json() {
        let app = TestApp::spawn().await;
        let alice = app.login(ALICE).await;

        let res = alice
            .post(routes::GENERATE_IMAGE, &json!({"prompt": "", "stream": true}))
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

mod edit {
    use super::*;

    #[tokio::test]
    async fn history_reference_delivers_the_stored_bytes() {
        let app = TestApp::spawn().await;
        let alice = app.login(ALICE).await;
        let source = alice.generate("original", 1).await.remove(0);

        let res = alice
            .post(
                routes::GENERATE_IMAGE,
                &json!({
                    "action": "edit",
                    "prompt": "add a hat",
                    "images": [{"historyId": source}]
                }),
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        let inputs = app.provider.edit_inputs();
        assert_eq!(inputs.len(), 1);
        assert_eq!(inputs[0].bytes, FAKE_PNG);
        assert_eq!(inputs[0].mime_type, "image/png");
    }

    #[tokio::test]
    async fn inline_images_are_decoded() {
        let app = TestApp::spawn().await;
        let alice = app.login(ALICE).await;
        let upload = b"uploaded image bytes";

        let res = alice
            .post(
                routes::GENERATE_IMAGE,
                &json!({
                    "action": "edit",
                    "prompt": "sharpen",
                    "images": [
                        {"mimeType": "image/jpeg", "data": STANDARD.encode(upload)},
                        {"mimeType": "image/png", "data": format!("data:image/png;base64,{}", STANDARD.encode(FAKE_PNG))}
                    ]
                }),
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        let inputs = app.provider.edit_inputs();
        assert_eq!(inputs[0].bytes, upload);
        assert_eq!(inputs[0].mime_type, "image/jpeg");
        assert_eq!(inputs[1].bytes, FAKE_PNG);
    }

    #[tokio::test]
    async fn another_users_history_is_not_found() {
        let app = TestApp::spawn().await;
        let alice = app.login(ALICE).await;
        let bob = app.login(BOB).await;
        let source = alice.generate("private", 1).await.remove(0);
        let calls_before = app.provider.image_calls();

        let res = bob
            .post(
                routes::GENERATE_IMAGE,
                &json!({
                    "action": "edit",
                    "prompt": "mine now",
                    "images": [{"historyId": source}]
                }),
            )
            .await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
        assert_eq!(app.provider.image_calls(), calls_before);
    }
}
