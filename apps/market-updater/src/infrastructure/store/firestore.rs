//! Firestore REST adapter.
//!
//! Implements `DocumentStore` over the Firestore v1 REST API:
//!
//! - `set_document` → `PATCH .../documents/{collection}/{id}` (no update
//!   mask, so the document is replaced or created)
//! - `commit_batch` → `POST .../documents:commit` with one `update` write per
//!   staged document
//!
//! Every request carries an OAuth bearer token taken from a [`TokenSource`].
//! Outside the emulator the token comes from Google Application Default
//! Credentials and is refreshed before it expires.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};

use super::api_types::{CommitRequest, CommitWrite, FirestoreDocument};
use crate::application::ports::{Document, DocumentPath, DocumentStore, StoreError, UpsertBatch};

/// Production REST endpoint.
pub const DEFAULT_FIRESTORE_BASE_URL: &str = "https://firestore.googleapis.com/v1";

/// Database id used when none is configured.
pub const DEFAULT_DATABASE: &str = "(default)";

/// OAuth scope for Firestore data access.
pub const DATASTORE_SCOPE: &str = "https://www.googleapis.com/auth/datastore";

/// Configuration for the Firestore adapter.
#[derive(Clone)]
pub struct FirestoreConfig {
    /// Google Cloud project id.
    pub project_id: String,
    /// Database id.
    pub database: String,
    /// REST base URL, including the `/v1` version segment.
    pub base_url: String,
    /// Fixed OAuth access token. Takes precedence over ambient credentials.
    pub access_token: Option<String>,
    /// Target is the local emulator, which needs no credentials.
    pub emulator: bool,
}

impl FirestoreConfig {
    /// Create a configuration for the production endpoint.
    #[must_use]
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            database: DEFAULT_DATABASE.to_string(),
            base_url: DEFAULT_FIRESTORE_BASE_URL.to_string(),
            access_token: None,
            emulator: false,
        }
    }

    /// Use a custom REST base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Target a local emulator at `host:port`.
    #[must_use]
    pub fn with_emulator_host(mut self, host: &str) -> Self {
        self.emulator = true;
        self.with_base_url(format!("http://{host}/v1"))
    }

    /// Use a non-default database.
    #[must_use]
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    /// Attach a fixed bearer token to every request.
    #[must_use]
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }
}

impl std::fmt::Debug for FirestoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirestoreConfig")
            .field("project_id", &self.project_id)
            .field("database", &self.database)
            .field("base_url", &self.base_url)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("emulator", &self.emulator)
            .finish()
    }
}

/// Supplies bearer tokens for Firestore requests.
///
/// Called once per request; implementations cache and refresh as needed.
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Current access token.
    async fn token(&self) -> Result<String, StoreError>;
}

/// A token that never changes.
#[derive(Clone)]
pub struct StaticToken(String);

impl StaticToken {
    /// Wrap a token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl TokenSource for StaticToken {
    async fn token(&self) -> Result<String, StoreError> {
        Ok(self.0.clone())
    }
}

/// Tokens from Google Application Default Credentials.
struct ApplicationDefault(Arc<dyn gcp_auth::TokenProvider>);

#[async_trait]
impl TokenSource for ApplicationDefault {
    async fn token(&self) -> Result<String, StoreError> {
        let token = self
            .0
            .token(&[DATASTORE_SCOPE])
            .await
            .map_err(|e| StoreError::Transport(format!("access token refresh failed: {e}")))?;
        Ok(token.as_str().to_string())
    }
}

async fn application_default() -> Result<Arc<dyn TokenSource>, String> {
    let provider = gcp_auth::provider().await.map_err(|e| e.to_string())?;
    Ok(Arc::new(ApplicationDefault(provider)))
}

/// Pick the token source for `config`.
///
/// A fixed token wins. The emulator gets none. Anything else must resolve
/// ambient credentials or construction fails.
async fn resolve_token_source<F, Fut>(
    config: &FirestoreConfig,
    ambient: F,
) -> Result<Option<Arc<dyn TokenSource>>, StoreError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Arc<dyn TokenSource>, String>>,
{
    if let Some(token) = &config.access_token {
        return Ok(Some(Arc::new(StaticToken::new(token.clone()))));
    }
    if config.emulator {
        return Ok(None);
    }
    ambient().await.map(Some).map_err(|e| {
        StoreError::Construction(format!("no Google credentials available: {e}"))
    })
}

/// Firestore-backed document store.
#[derive(Clone)]
pub struct FirestoreStore {
    client: Client,
    base_url: Url,
    project_id: String,
    database: String,
    tokens: Option<Arc<dyn TokenSource>>,
}

impl FirestoreStore {
    /// Build the store client and resolve its credentials.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Construction` if the project id is empty, the base
    /// URL is unusable, the HTTP client cannot be built, or no credentials
    /// can be found for a non-emulator target.
    pub async fn new(config: &FirestoreConfig) -> Result<Self, StoreError> {
        let base_url = parse_target(config)?;
        let tokens = resolve_token_source(config, application_default).await?;
        Self::build(config, base_url, tokens)
    }

    /// Build the store client with an explicit token source.
    ///
    /// # Errors
    ///
    /// Same as [`FirestoreStore::new`], minus credential lookup.
    pub fn with_token_source(
        config: &FirestoreConfig,
        tokens: Arc<dyn TokenSource>,
    ) -> Result<Self, StoreError> {
        let base_url = parse_target(config)?;
        Self::build(config, base_url, Some(tokens))
    }

    fn build(
        config: &FirestoreConfig,
        base_url: Url,
        tokens: Option<Arc<dyn TokenSource>>,
    ) -> Result<Self, StoreError> {
        let client = Client::builder()
            .user_agent(concat!("market-updater/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| StoreError::Construction(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            project_id: config.project_id.clone(),
            database: config.database.clone(),
            tokens,
        })
    }

    /// Read a document back. Returns `None` if it does not exist.
    pub async fn get_document(&self, path: &DocumentPath) -> Result<Option<Document>, StoreError> {
        let url = self.url(&document_segments(path)?)?;
        let response = self.send(self.client.get(url)).await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = check_status(response).await?;

        let document: FirestoreDocument = response
            .json()
            .await
            .map_err(|e| StoreError::Transport(format!("invalid document body: {e}")))?;
        document.decode().map(Some)
    }

    /// `projects/{project}/databases/{database}/documents/{collection}/{id}`
    fn resource_name(&self, path: &DocumentPath) -> Result<String, StoreError> {
        let [collection, id] = document_segments(path)?;
        Ok(format!(
            "projects/{}/databases/{}/documents/{collection}/{id}",
            self.project_id, self.database,
        ))
    }

    /// `{base}/projects/{project}/databases/{database}/<tail...>`
    ///
    /// The first tail segment is appended to `documents`, so `[":commit"]`
    /// yields `.../documents:commit`.
    fn url(&self, tail: &[&str]) -> Result<Url, StoreError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|()| {
                StoreError::Transport(format!("base url cannot carry a path: {}", self.base_url))
            })?;
            segments
                .pop_if_empty()
                .extend([
                    "projects",
                    self.project_id.as_str(),
                    "databases",
                    self.database.as_str(),
                ]);

            match tail.split_first() {
                Some((first, rest)) if first.starts_with(':') => {
                    segments.push(&format!("documents{first}"));
                    segments.extend(rest);
                }
                _ => {
                    segments.push("documents");
                    segments.extend(tail);
                }
            }
        }
        Ok(url)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, StoreError> {
        let request = match &self.tokens {
            Some(tokens) => request.bearer_auth(tokens.token().await?),
            None => request,
        };
        request
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))
    }
}

fn parse_target(config: &FirestoreConfig) -> Result<Url, StoreError> {
    if config.project_id.trim().is_empty() {
        return Err(StoreError::Construction("project id is empty".to_string()));
    }
    if config.database.trim().is_empty() {
        return Err(StoreError::Construction("database id is empty".to_string()));
    }

    let base_url = Url::parse(&config.base_url)
        .map_err(|e| StoreError::Construction(format!("invalid base url: {e}")))?;
    if base_url.cannot_be_a_base() {
        return Err(StoreError::Construction(format!(
            "base url cannot carry a path: {base_url}"
        )));
    }
    Ok(base_url)
}

/// Collection and id of `path`, checked against Firestore's id rules.
///
/// A `/` would shift the document to another path, and `.`, `..` and
/// `__name__`-style ids are reserved.
fn document_segments(path: &DocumentPath) -> Result<[&str; 2], StoreError> {
    for segment in [path.collection(), path.id()] {
        let reserved = segment == "."
            || segment == ".."
            || (segment.len() >= 4 && segment.starts_with("__") && segment.ends_with("__"));
        if segment.is_empty() || segment.contains('/') || reserved {
            return Err(StoreError::InvalidPath(path.to_string()));
        }
    }
    Ok([path.collection(), path.id()])
}

async fn check_status(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(StoreError::Rejected {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    async fn set_document(
        &self,
        path: &DocumentPath,
        document: &Document,
    ) -> Result<(), StoreError> {
        let url = self.url(&document_segments(path)?)?;
        let body = FirestoreDocument::encode(None, document);

        let response = self.send(self.client.patch(url).json(&body)).await?;
        check_status(response).await?;
        Ok(())
    }

    async fn commit_batch(&self, batch: UpsertBatch) -> Result<(), StoreError> {
        let writes = batch
            .writes()
            .iter()
            .map(|(path, document)| {
                Ok(CommitWrite {
                    update: FirestoreDocument::encode(Some(self.resource_name(path)?), document),
                })
            })
            .collect::<Result<Vec<_>, StoreError>>()?;

        let url = self.url(&[":commit"])?;
        let response = self
            .send(self.client.post(url).json(&CommitRequest { writes }))
            .await?;
        check_status(response).await?;
        Ok(())
    }
}

impl std::fmt::Debug for FirestoreStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirestoreStore")
            .field("base_url", &self.base_url.as_str())
            .field("project_id", &self.project_id)
            .field("database", &self.database)
            .field("authenticated", &self.tokens.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::{Value, json};
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::application::ports::FieldValue;
    use crate::domain::market::DecimalText;

    const DOC_PATH: &str = "/v1/projects/demo/databases/(default)/documents/Market/BTC";

    fn emulator(server: &MockServer) -> FirestoreConfig {
        FirestoreConfig::new("demo").with_emulator_host(&server.address().to_string())
    }

    async fn store(server: &MockServer) -> FirestoreStore {
        FirestoreStore::new(&emulator(server)).await.unwrap()
    }

    fn bitcoin() -> Document {
        Document::new()
            .with("name", FieldValue::String("Bitcoin".into()))
            .with("rank", FieldValue::Integer(1))
            .with("symbol", FieldValue::String("BTC".into()))
    }

    /// Hands out `token-1`, `token-2`, ... so each request sees a fresh value.
    #[derive(Default)]
    struct RotatingToken(AtomicUsize);

    #[async_trait]
    impl TokenSource for RotatingToken {
        async fn token(&self) -> Result<String, StoreError> {
            let n = self.0.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(format!("token-{n}"))
        }
    }

    #[tokio::test]
    async fn construction_rejects_empty_project() {
        let config = FirestoreConfig::new("  ").with_emulator_host("localhost:8681");
        let err = FirestoreStore::new(&config).await.unwrap_err();
        assert!(matches!(err, StoreError::Construction(_)));
    }

    #[tokio::test]
    async fn construction_rejects_bad_base_url() {
        let config = FirestoreConfig::new("demo")
            .with_access_token("ya29.token")
            .with_base_url("not a url");
        assert!(matches!(
            FirestoreStore::new(&config).await,
            Err(StoreError::Construction(_))
        ));
    }

    #[tokio::test]
    async fn production_target_without_credentials_fails() {
        let config = FirestoreConfig::new("demo");

        let result =
            resolve_token_source(&config, || async { Err("no credentials found".to_string()) })
                .await;

        match result {
            Err(StoreError::Construction(message)) => {
                assert!(message.contains("no credentials found"));
            }
            other => panic!("expected construction error, got {:?}", other.map(|t| t.is_some())),
        }
    }

    #[tokio::test]
    async fn emulator_needs_no_credentials() {
        let config = FirestoreConfig::new("demo").with_emulator_host("localhost:8681");

        let tokens = resolve_token_source(&config, || async {
            panic!("ambient credentials looked up for the emulator")
        })
        .await
        .unwrap();

        assert!(tokens.is_none());
    }

    #[tokio::test]
    async fn fixed_token_skips_ambient_lookup() {
        let config = FirestoreConfig::new("demo").with_access_token("ya29.token");

        let tokens = resolve_token_source(&config, || async {
            panic!("ambient credentials looked up despite a fixed token")
        })
        .await
        .unwrap()
        .unwrap();

        assert_eq!(tokens.token().await.unwrap(), "ya29.token");
    }

    #[test]
    fn emulator_host_builds_plain_http_url() {
        let config = FirestoreConfig::new("demo").with_emulator_host("localhost:8681");
        assert_eq!(config.base_url, "http://localhost:8681/v1");
        assert!(config.emulator);
        assert!(!FirestoreConfig::new("demo").emulator);
    }

    #[test]
    fn config_debug_redacts_token() {
        let config = FirestoreConfig::new("demo").with_access_token("ya29.secret");
        let debug = format!("{config:?}");
        assert!(!debug.contains("ya29.secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn commit_url_and_resource_name() {
        let store = FirestoreStore::with_token_source(
            &FirestoreConfig::new("demo"),
            Arc::new(StaticToken::new("ya29.token")),
        )
        .unwrap();

        assert_eq!(
            store.url(&[":commit"]).unwrap().as_str(),
            "https://firestore.googleapis.com/v1/projects/demo/databases/(default)/documents:commit"
        );
        assert_eq!(
            store
                .resource_name(&DocumentPath::new("BatchMarket", "ETH"))
                .unwrap(),
            "projects/demo/databases/(default)/documents/BatchMarket/ETH"
        );
    }

    #[test]
    fn document_ids_follow_firestore_rules() {
        for id in ["BTC", "1INCH", "_x_", "__x"] {
            assert!(document_segments(&DocumentPath::new("Market", id)).is_ok(), "{id}");
        }
        for id in ["", "A/B", ".", "..", "__name__", "____"] {
            assert!(
                matches!(
                    document_segments(&DocumentPath::new("Market", id)),
                    Err(StoreError::InvalidPath(_))
                ),
                "{id}"
            );
        }
    }

    #[tokio::test]
    async fn slash_in_id_is_rejected_in_both_write_modes() {
        let server = MockServer::start().await;
        Mock::given(wiremock::matchers::any())
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(0)
            .mount(&server)
            .await;
        let store = store(&server).await;
        let path = DocumentPath::new("Market", "A/B");

        let single = store.set_document(&path, &bitcoin()).await;

        let mut batch = UpsertBatch::new();
        batch.set(DocumentPath::new("BatchMarket", "BTC"), bitcoin());
        batch.set(DocumentPath::new("BatchMarket", "A/B"), bitcoin());
        let batched = store.commit_batch(batch).await;

        assert_eq!(single, Err(StoreError::InvalidPath("Market/A/B".to_string())));
        assert_eq!(
            batched,
            Err(StoreError::InvalidPath("BatchMarket/A/B".to_string()))
        );
    }

    #[tokio::test]
    async fn set_document_patches_document() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path(DOC_PATH))
            .and(body_json(json!({
                "fields": {
                    "name": {"stringValue": "Bitcoin"},
                    "rank": {"integerValue": "1"},
                    "symbol": {"stringValue": "BTC"}
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        store(&server)
            .await
            .set_document(&DocumentPath::new("Market", "BTC"), &bitcoin())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn bearer_token_is_attached() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(header("authorization", "Bearer ya29.token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let config = emulator(&server).with_access_token("ya29.token");
        FirestoreStore::new(&config)
            .await
            .unwrap()
            .set_document(&DocumentPath::new("Market", "BTC"), &bitcoin())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn token_is_fetched_per_request() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(2)
            .mount(&server)
            .await;

        let store =
            FirestoreStore::with_token_source(&emulator(&server), Arc::new(RotatingToken::default()))
                .unwrap();
        for _ in 0..2 {
            store
                .set_document(&DocumentPath::new("Market", "BTC"), &bitcoin())
                .await
                .unwrap();
        }

        let auth: Vec<String> = server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .map(|r| r.headers["authorization"].to_str().unwrap().to_string())
            .collect();
        assert_eq!(auth, ["Bearer token-1", "Bearer token-2"]);
    }

    #[tokio::test]
    async fn commit_batch_posts_all_writes() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/projects/demo/databases/(default)/documents:commit"))
            .and(body_json(json!({
                "writes": [
                    {"update": {
                        "name": "projects/demo/databases/(default)/documents/BatchMarket/BTC",
                        "fields": {
                            "name": {"stringValue": "Bitcoin"},
                            "rank": {"integerValue": "1"},
                            "symbol": {"stringValue": "BTC"}
                        }
                    }},
                    {"update": {
                        "name": "projects/demo/databases/(default)/documents/BatchMarket/ETH",
                        "fields": {"rank": {"integerValue": "2"}}
                    }}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"writeResults": []})))
            .expect(1)
            .mount(&server)
            .await;

        let mut batch = UpsertBatch::new();
        batch.set(DocumentPath::new("BatchMarket", "BTC"), bitcoin());
        batch.set(
            DocumentPath::new("BatchMarket", "ETH"),
            Document::new().with("rank", FieldValue::Integer(2)),
        );

        store(&server).await.commit_batch(batch).await.unwrap();
    }

    #[tokio::test]
    async fn error_status_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .respond_with(ResponseTemplate::new(403).set_body_string("PERMISSION_DENIED"))
            .mount(&server)
            .await;

        let err = store(&server)
            .await
            .set_document(&DocumentPath::new("Market", "BTC"), &bitcoin())
            .await
            .unwrap_err();

        assert_eq!(
            err,
            StoreError::Rejected {
                status: 403,
                message: "PERMISSION_DENIED".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn decimal_price_reads_back_unchanged() {
        let price = "67234.518613423781000001";
        let writer = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path(DOC_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&writer)
            .await;

        store(&writer)
            .await
            .set_document(
                &DocumentPath::new("Market", "BTC"),
                &Document::new().with(
                    "price",
                    FieldValue::Decimal(DecimalText::parse(price).unwrap()),
                ),
            )
            .await
            .unwrap();
        let requests = writer.received_requests().await.unwrap();
        let written: Value = serde_json::from_slice(&requests[0].body).unwrap();

        let reader = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(DOC_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "projects/demo/databases/(default)/documents/Market/BTC",
                "fields": written["fields"],
            })))
            .mount(&reader)
            .await;

        let read = store(&reader)
            .await
            .get_document(&DocumentPath::new("Market", "BTC"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(read.get("price"), Some(&FieldValue::String(price.to_string())));
    }

    #[tokio::test]
    async fn missing_document_reads_as_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let read = store(&server)
            .await
            .get_document(&DocumentPath::new("Market", "NOPE"))
            .await
            .unwrap();
        assert!(read.is_none());
    }
}
