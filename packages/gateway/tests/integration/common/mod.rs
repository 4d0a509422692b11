use std::net::SocketAddr;
use std::sync::Arc;

use ::common::StorageConfig;
use ::common::storage::MediaStore;
use ::common::storage::filesystem::FilesystemMediaStore;
use reqwest::Client;
use reqwest::header::HeaderMap;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use serde_json::Value;
use tempfile::TempDir;

use gateway::config::{
    AppConfig, AuthConfig, CorsConfig, DatabaseConfig, ServerConfig, UpstreamConfig, VideoConfig,
};
use gateway::state::AppState;

pub const ALICE: &str = "alice-key";
pub const BOB: &str = "bob-key";

pub use gateway::testing::{FAKE_MP4, FAKE_PNG, FakeProvider, Step};

pub mod routes {
    pub const CHECK: &str = "/api/auth/check";
    pub const LOGOUT: &str = "/api/auth/logout";
    pub const ME: &str = "/api/auth/me";
    pub const GENERATE_IMAGE: &str = "/api/generate/image";
    pub const VIDEO_START: &str = "/api/video/start";
    pub const HISTORY: &str = "/api/history";

    pub fn video_status(name: &str) -> String {
        format!("/api/video/status?name={name}")
    }

    pub fn history_item(id: &str) -> String {
        format!("/api/history/{id}")
    }

    pub fn history_page(limit: u32, cursor: Option<&str>) -> String {
        match cursor {
            Some(c) => format!("/api/history?limit={limit}&cursor={c}"),
            None => format!("/api/history?limit={limit}"),
        }
    }

    pub fn media(id: &str) -> String {
        format!("/api/media/{id}")
    }
}

/// A running test server.
pub struct TestApp {
    pub addr: SocketAddr,
    pub db: DatabaseConnection,
    pub media: Arc<dyn MediaStore>,
    pub provider: Arc<FakeProvider>,
    _media_dir: TempDir,
}

/// Parsed HTTP response for test assertions.
pub struct TestResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub bytes: Vec<u8>,
    /// Raw response body as text.
    pub text: String,
    /// Parsed JSON body, or `Null` if the response is not valid JSON.
    pub body: Value,
}

/// A cookie-carrying client bound to one test server.
pub struct Session {
    base: String,
    pub client: Client,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let mut opts = ConnectOptions::new("sqlite::memory:");
        opts.max_connections(1).min_connections(1).sqlx_logging(false);
        let db = Database::connect(opts)
            .await
            .expect("Failed to open in-memory database");
        gateway::database::sync_schema(&db)
            .await
            .expect("Failed to sync schema");
        gateway::seed::ensure_indexes(&db)
            .await
            .expect("Failed to create indexes");

        let media_dir = tempfile::tempdir().expect("Failed to create media dir");
        let storage = StorageConfig {
            root: media_dir.path().to_path_buf(),
            ..Default::default()
        };
        let media: Arc<dyn MediaStore> = Arc::new(
            FilesystemMediaStore::new(storage.root.clone(), storage.max_blob_size)
                .await
                .expect("Failed to open media store"),
        );

        let app_config = AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors: CorsConfig::default(),
            },
            database: DatabaseConfig {
                url: "sqlite::memory:".to_string(),
            },
            auth: AuthConfig {
                // Plain HTTP in tests; reqwest drops Secure cookies on http.
                secure_cookie: false,
                allowed_keys: vec![ALICE.to_string(), BOB.to_string()],
                ..Default::default()
            },
            storage,
            upstream: UpstreamConfig::default(),
            video: VideoConfig::default(),
        };
        gateway::seed::seed_credentials(&db, &app_config.auth.allowed_keys)
            .await
            .expect("Failed to seed credentials");

        let provider = Arc::new(FakeProvider::default());
        let state = AppState {
            db: db.clone(),
            config: Arc::new(app_config),
            media: media.clone(),
            provider: provider.clone(),
        };

        let app = gateway::build_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            db,
            media,
            provider,
            _media_dir: media_dir,
        }
    }

    /// A client with an empty cookie jar.
    pub fn anonymous(&self) -> Session {
        Session {
            base: format!("http://{}", self.addr),
            client: Client::builder()
                .cookie_store(true)
                .build()
                .expect("Failed to build client"),
        }
    }

    /// A client holding a live session for `user_key`.
    pub async fn login(&self, user_key: &str) -> Session {
        let session = self.anonymous();
        let res = session
            .post(routes::CHECK, &serde_json::json!({"userKey": user_key}))
            .await;
        assert_eq!(res.status, 200, "Login failed: {}", res.text);
        session
    }
}

impl Session {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send GET request");
        TestResponse::from_response(res).await
    }

    pub async fn get_with_header(&self, path: &str, name: &str, value: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .header(name, value)
            .send()
            .await
            .expect("Failed to send GET request");
        TestResponse::from_response(res).await
    }

    pub async fn post(&self, path: &str, body: &Value) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to send POST request");
        TestResponse::from_response(res).await
    }

    pub async fn post_with_header(
        &self,
        path: &str,
        body: &Value,
        name: &str,
        value: &str,
    ) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .header(name, value)
            .json(body)
            .send()
            .await
            .expect("Failed to send POST request");
        TestResponse::from_response(res).await
    }

    pub async fn delete(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .delete(self.url(path))
            .send()
            .await
            .expect("Failed to send DELETE request");
        TestResponse::from_response(res).await
    }

    /// Generate `count` images without streaming and return their media ids.
    pub async fn generate(&self, prompt: &str, count: u32) -> Vec<String> {
        let res = self
            .post(
                routes::GENERATE_IMAGE,
                &serde_json::json!({"prompt": prompt, "count": count}),
            )
            .await;
        assert_eq!(res.status, 200, "generate failed: {}", res.text);
        res.body["items"]
            .as_array()
            .expect("items array")
            .iter()
            .map(|i| i["mediaId"].as_str().unwrap().to_string())
            .collect()
    }
}

impl TestResponse {
    pub async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let headers = res.headers().clone();
        let bytes = res.bytes().await.map(|b| b.to_vec()).unwrap_or_default();
        let text = String::from_utf8_lossy(&bytes).into_owned();
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Self {
            status,
            headers,
            bytes,
            text,
            body,
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Parse a server-sent event body into `(event, data)` pairs.
    pub fn events(&self) -> Vec<(String, Value)> {
        self.text
            .split("\n\n")
            .filter_map(|block| {
                let mut name = None;
                let mut data = String::new();
                for line in block.lines() {
                    if let Some(v) = line.strip_prefix("event:") {
                        name = Some(v.trim().to_string());
                    } else if let Some(v) = line.strip_prefix("data:") {
                        data.push_str(v.trim_start());
                    }
                }
                let name = name?;
                Some((name, serde_json::from_str(&data).unwrap_or(Value::Null)))
            })
            .collect()
    }
}
