use gateway::auth::credential::CredentialStore;
use serde_json::json;

use crate::common::{ALICE, BOB, TestApp, routes};

mod check {
    use super::*;

    #[tokio::test]
    async fn allowed_key_gets_a_session_cookie() {
        let app = TestApp::spawn().await;
        let session = app.anonymous();

        let res = session.post(routes::CHECK, &json!({"userKey": ALICE})).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["ok"], true);
        let cookie = res.header("set-cookie").expect("cookie set");
        assert!(cookie.starts_with("mg_session="));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));

        let me = session.get(routes::ME).await;
        assert_eq!(me.status, 200);
        assert_eq!(me.body["userKey"], ALICE);
    }

    #[tokio::test]
    async fn unknown_empty_and_padded_keys_are_rejected_alike() {
        let app = TestApp::spawn().await;
        let session = app.anonymous();

        for key in ["nobody", "", " alice-key", "alice-key "] {
            let res = session.post(routes::CHECK, &json!({"userKey": key})).await;
            assert_eq!(res.status, 401, "key {key:?} was accepted");
            assert_eq!(res.body["code"], "UNAUTHORIZED");
            assert!(res.header("set-cookie").is_none());
        }
    }

    #[tokio::test]
    async fn missing_field_is_a_validation_error() {
        let app = TestApp::spawn().await;
        let res = app.anonymous().post(routes::CHECK, &json!({})).await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn each_user_has_independent_sessions() {
        let app = TestApp::spawn().await;
        let alice = app.login(ALICE).await;
        let bob = app.login(BOB).await;
        let alice_again = app.login(ALICE).await;

        assert_eq!(alice.get(routes::ME).await.body["userKey"], ALICE);
        assert_eq!(bob.get(routes::ME).await.body["userKey"], BOB);
        assert_eq!(alice_again.get(routes::ME).await.body["userKey"], ALICE);
    }
}

mod protected_routes {
    use super::*;

    #[tokio::test]
    async fn require_a_session() {
        let app = TestApp::spawn().await;
        let anon = app.anonymous();

        let checks = [
            anon.get(routes::ME).await,
            anon.get(routes::HISTORY).await,
            anon.get(&routes::history_item("x")).await,
            anon.delete(&routes::history_item("x")).await,
            anon.get(&routes::media("x")).await,
            anon.get(&routes::video_status("op")).await,
            anon.post(routes::GENERATE_IMAGE, &json!({"prompt": "cat"})).await,
            anon.post(routes::VIDEO_START, &json!({"prompt": "cat"})).await,
        ];

        for res in checks {
            assert_eq!(res.status, 401, "unexpected: {}", res.text);
            assert_eq!(res.body["code"], "UNAUTHORIZED");
        }
        assert_eq!(app.provider.image_calls(), 0);
    }

    #[tokio::test]
    async fn forged_cookie_is_rejected() {
        let app = TestApp::spawn().await;
        let res = app
            .anonymous()
            .get_with_header(routes::ME, "cookie", "mg_session=not-a-real-token")
            .await;
        assert_eq!(res.status, 401);
    }

    #[tokio::test]
    async fn revoking_a_key_ends_its_sessions() {
        let app = TestApp::spawn().await;
        let alice = app.login(ALICE).await;

        CredentialStore::new(&app.db)
            .set_enabled(ALICE, false)
            .await
            .unwrap();

        assert_eq!(alice.get(routes::ME).await.status, 401);
        let retry = app
            .anonymous()
            .post(routes::CHECK, &json!({"userKey": ALICE}))
            .await;
        assert_eq!(retry.status, 401);
    }
}

mod logout {
    use super::*;

    #[tokio::test]
    async fn ends_the_session_and_clears_the_cookie() {
        let app = TestApp::spawn().await;
        let alice = app.login(ALICE).await;

        let res = alice.post(routes::LOGOUT, &json!({})).await;
        assert_eq!(res.status, 200);
        assert!(res.header("set-cookie").unwrap().contains("Max-Age=0"));

        assert_eq!(alice.get(routes::ME).await.status, 401);
    }

    #[tokio::test]
    async fn succeeds_without_a_session() {
        let app = TestApp::spawn().await;
        let res = app.anonymous().post(routes::LOGOUT, &json!({})).await;
        assert_eq!(res.status, 200);
        assert!(res.header("set-cookie").unwrap().contains("Max-Age=0"));
    }

    #[tokio::test]
    async fn leaves_other_sessions_alone() {
        let app = TestApp::spawn().await;
        let laptop = app.login(ALICE).await;
        let phone = app.login(ALICE).await;

        laptop.post(routes::LOGOUT, &json!({})).await;

        assert_eq!(laptop.get(routes::ME).await.status, 401);
        assert_eq!(phone.get(routes::ME).await.status, 200);
    }
}
