//! Test Helper Utilities
//!
//! Fake collaborators for driving resonance-pg without network access, and
//! a helper for serving fake upstream APIs on a local port.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use axum::Router;
use resonance_pg::services::{
    CatalogError, CredentialProvider, CredentialUnavailable, EnrichmentCoordinator,
    GenerationError, GenerativeClient, PlaylistService, PromptBuilder, RetryOrchestrator,
    RetryPolicy, TextGenerator, TrackSearch,
};
use resonance_pg::{build_router, AppState};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// How the fake generative service answers
#[derive(Clone)]
pub enum GeneratorMode {
    /// Same text for every call
    Reply(String),
    /// Never answers
    Hang,
    /// Fails every call with an upstream error
    Fail,
    /// Fails the first `n` calls, then answers with the text
    FailThenReply(usize, String),
}

pub struct FakeGenerator {
    mode: GeneratorMode,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl FakeGenerator {
    pub fn new(mode: GeneratorMode) -> Arc<Self> {
        Arc::new(Self {
            mode,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for FakeGenerator {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());

        match &self.mode {
            GeneratorMode::Reply(text) => Ok(text.clone()),
            GeneratorMode::Hang => std::future::pending().await,
            GeneratorMode::Fail => Err(GenerationError::upstream("503 Service Unavailable")),
            GeneratorMode::FailThenReply(n, _) if call < *n => {
                Err(GenerationError::upstream("503 Service Unavailable"))
            }
            GeneratorMode::FailThenReply(_, text) => Ok(text.clone()),
        }
    }
}

/// Credentials that always succeed (`Some`) or always fail (`None`)
pub struct FakeCredentials {
    token: Option<String>,
    calls: AtomicUsize,
}

impl FakeCredentials {
    pub fn new(token: Option<&str>) -> Arc<Self> {
        Arc::new(Self {
            token: token.map(str::to_string),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CredentialProvider for FakeCredentials {
    async fn get_token(&self) -> Result<String, CredentialUnavailable> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.token
            .clone()
            .ok_or_else(|| CredentialUnavailable::Status(400, "invalid_client".to_string()))
    }

    fn is_configured(&self) -> bool {
        self.token.is_some()
    }
}

/// Catalog that matches every query to `track:<query>`
pub struct FakeCatalog {
    searches: AtomicUsize,
}

impl FakeCatalog {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            searches: AtomicUsize::new(0),
        })
    }

    pub fn searches(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TrackSearch for FakeCatalog {
    async fn search_first_track(
        &self,
        _token: &str,
        query: &str,
    ) -> Result<Option<String>, CatalogError> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        Ok(Some(format!("track:{}", query)))
    }
}

/// Router wired with fake collaborators and the default retry policy
pub fn test_app(
    generator: Arc<FakeGenerator>,
    credentials: Arc<FakeCredentials>,
    catalog: Arc<FakeCatalog>,
) -> Router {
    let orchestrator = RetryOrchestrator::new(
        PromptBuilder::default(),
        GenerativeClient::new(generator, Duration::from_secs(30)),
        RetryPolicy::default(),
    );
    let enrichment = EnrichmentCoordinator::new(credentials, catalog);
    let service = PlaylistService::new(orchestrator, enrichment);

    build_router(AppState::new(Arc::new(service)))
}

pub fn post_json(uri: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

/// Serve `router` on an ephemeral local port; returns `http://127.0.0.1:<port>`
pub async fn spawn_server(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Should bind ephemeral port");
    let addr = listener.local_addr().expect("Should have local addr");

    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Fake server failed");
    });

    format!("http://{}", addr)
}

/// Fifteen well-formed songs, as a generative service would return them
pub fn bohemian_rhapsody_reply() -> String {
    let songs = [
        ("Somebody to Love", "Queen"),
        ("Stairway to Heaven", "Led Zeppelin"),
        ("Hotel California", "Eagles"),
        ("Life on Mars?", "David Bowie"),
        ("Comfortably Numb", "Pink Floyd"),
        ("Paranoid Android", "Radiohead"),
        ("November Rain", "Guns N' Roses"),
        ("A Day in the Life", "The Beatles"),
        ("Baba O'Riley", "The Who"),
        ("Don't Stop Believin'", "Journey"),
        ("Dream On", "Aerosmith"),
        ("Free Bird", "Lynyrd Skynyrd"),
        ("Roundabout", "Yes"),
        ("Layla", "Derek and the Dominos"),
        ("Kashmir", "Led Zeppelin"),
    ];

    let records: Vec<Value> = songs
        .iter()
        .enumerate()
        .map(|(i, (name, artist))| {
            serde_json::json!({
                "name": name,
                "artist": artist,
                "album": format!("Album {}", i + 1),
                "year": (1970 + i).to_string(),
                "genres": ["Rock", "Classic Rock"],
                "explanation": "Epic, multi-part rock composition"
            })
        })
        .collect();

    format!("```json\n{}\n```", serde_json::to_string_pretty(&records).unwrap())
}
