//! Test doubles shared across modules: a local HTTP server standing in for a
//! geocoding API, and an in-process backend with scripted latency.

use crate::config::{Endpoints, ProviderConfig};
use crate::geocoding::{GeocodeError, PlaceSearch, PlaceSuggestion, ProviderKind};
use crate::http::{build_client, ProxySettings};
use crate::tools::ToolContext;
use async_trait::async_trait;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Client that never goes through a proxy, whatever the environment says
pub fn test_client() -> reqwest::Client {
    build_client(Duration::from_secs(5), ProxySettings::default()).unwrap()
}

/// Tool context around `config` using [`test_client`]
pub fn tool_context(config: ProviderConfig) -> ToolContext {
    ToolContext::with_client(config, test_client())
}

/// Requests seen by a [`MockApi`]
#[derive(Default)]
pub struct Recorder {
    hits: AtomicUsize,
    queries: Mutex<Vec<HashMap<String, String>>>,
}

impl Recorder {
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn last_query(&self) -> Option<HashMap<String, String>> {
        self.queries.lock().unwrap().last().cloned()
    }
}

struct Canned {
    status: StatusCode,
    body: Value,
    recorder: Arc<Recorder>,
}

async fn canned(
    State(canned): State<Arc<Canned>>,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    canned.recorder.hits.fetch_add(1, Ordering::SeqCst);
    canned.recorder.queries.lock().unwrap().push(params);
    (canned.status, Json(canned.body.clone()))
}

/// Local HTTP server answering one path with a fixed response
pub struct MockApi {
    pub base_url: String,
    pub recorder: Arc<Recorder>,
}

impl MockApi {
    pub async fn start(path: &str, status: u16, body: Value) -> Self {
        let recorder = Arc::new(Recorder::default());
        let app = Router::new().route(path, get(canned)).with_state(Arc::new(Canned {
            status: StatusCode::from_u16(status).unwrap(),
            body,
            recorder: recorder.clone(),
        }));
        Self {
            base_url: serve(app).await,
            recorder,
        }
    }

    /// Server that answers `path` with a body that is not JSON
    pub async fn garbage(path: &str) -> Self {
        let recorder = Arc::new(Recorder::default());
        let hits = recorder.clone();
        let app = Router::new().route(
            path,
            get(move || {
                let hits = hits.clone();
                async move {
                    hits.hits.fetch_add(1, Ordering::SeqCst);
                    "<html>rate limited</html>"
                }
            }),
        );
        Self {
            base_url: serve(app).await,
            recorder,
        }
    }

    /// Configuration pointing every provider at this server
    pub fn config(&self, provider: ProviderKind) -> ProviderConfig {
        ProviderConfig {
            geocoding_provider: provider,
            endpoints: Endpoints {
                maps_co: self.base_url.clone(),
                mapbox: self.base_url.clone(),
                google: self.base_url.clone(),
            },
            ..ProviderConfig::default()
        }
    }
}

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Base URL nothing is listening on
pub async fn unreachable_base_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

/// Scripted answer for one query
#[derive(Clone)]
pub struct Script {
    pub delay: Duration,
    pub result: Result<Vec<String>, u16>,
}

/// In-process backend: answers from a script keyed by query, records calls
pub struct ScriptedBackend {
    kind: ProviderKind,
    scripts: HashMap<String, Script>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    pub fn new(kind: ProviderKind) -> Self {
        Self {
            kind,
            scripts: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn answer(mut self, query: &str, delay_ms: u64, labels: &[&str]) -> Self {
        self.scripts.insert(
            query.to_string(),
            Script {
                delay: Duration::from_millis(delay_ms),
                result: Ok(labels.iter().map(|l| l.to_string()).collect()),
            },
        );
        self
    }

    pub fn fail(mut self, query: &str, delay_ms: u64, status: u16) -> Self {
        self.scripts.insert(
            query.to_string(),
            Script {
                delay: Duration::from_millis(delay_ms),
                result: Err(status),
            },
        );
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PlaceSearch for ScriptedBackend {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    async fn search(&self, query: &str) -> Result<Vec<PlaceSuggestion>, GeocodeError> {
        self.calls.lock().unwrap().push(query.to_string());
        let script = self.scripts.get(query).cloned().unwrap_or(Script {
            delay: Duration::ZERO,
            result: Ok(Vec::new()),
        });
        tokio::time::sleep(script.delay).await;
        match script.result {
            Ok(labels) => Ok(labels
                .into_iter()
                .enumerate()
                .map(|(i, label)| PlaceSuggestion::new(i.to_string(), label))
                .collect()),
            Err(status) => Err(GeocodeError::Provider {
                provider: self.kind,
                status,
            }),
        }
    }
}
