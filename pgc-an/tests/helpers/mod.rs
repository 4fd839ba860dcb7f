//! Shared test helpers: in-memory database, scripted signal sources,
//! page fixtures and in-process stub HTTP servers.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::Router;
use pgc_an::page::PageDocument;
use pgc_an::signals::{NameInference, PictureInference};
use pgc_an::sink::OverlaySink;
use pgc_common::config::{PgcConfig, TimingConfig};
use pgc_common::{Gender, RunId};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

// ============================================================================
// Database
// ============================================================================

/// Single-connection in-memory database with the settings table
pub async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");

    pgc_common::db::create_settings_table(&pool)
        .await
        .expect("Failed to create settings table");

    pool
}

/// Config with no UI pacing and a short debounce
pub fn test_config() -> PgcConfig {
    let mut timing = TimingConfig::immediate();
    timing.debounce_ms = 50;
    PgcConfig {
        timing,
        ..PgcConfig::default()
    }
}

// ============================================================================
// Scripted signal sources
// ============================================================================

/// Name inferrer answering from a fixed table, counting calls
#[derive(Default)]
pub struct ScriptedNames {
    answers: HashMap<String, Gender>,
    calls: AtomicUsize,
}

impl ScriptedNames {
    pub fn new(answers: &[(&str, Gender)]) -> Self {
        Self {
            answers: answers
                .iter()
                .map(|(name, gender)| (name.to_string(), *gender))
                .collect(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NameInference for ScriptedNames {
    async fn infer_from_name(&self, full_name: &str) -> Option<Gender> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let first = full_name.split_whitespace().next()?;
        self.answers.get(first).copied()
    }
}

/// Scripted answer for one picture URL
#[derive(Clone)]
pub struct PictureScript {
    pub gender: Option<Gender>,
    /// When set, the answer is held back until the gate is notified
    pub gate: Option<Arc<Notify>>,
}

/// Picture inferrer answering per URL, optionally gated
#[derive(Default)]
pub struct ScriptedPictures {
    scripts: HashMap<String, PictureScript>,
    calls: AtomicUsize,
}

impl ScriptedPictures {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answer(mut self, url: &str, gender: Option<Gender>) -> Self {
        self.scripts
            .insert(url.to_string(), PictureScript { gender, gate: None });
        self
    }

    /// Answer only after the returned gate is notified
    pub fn gated(mut self, url: &str, gender: Option<Gender>) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        self.scripts.insert(
            url.to_string(),
            PictureScript {
                gender,
                gate: Some(gate.clone()),
            },
        );
        (self, gate)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PictureInference for ScriptedPictures {
    async fn infer_from_picture(&self, image_url: &str) -> Option<Gender> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let script = self.scripts.get(image_url)?.clone();
        if let Some(gate) = script.gate {
            gate.notified().await;
        }
        script.gender
    }
}

// ============================================================================
// Page fixtures
// ============================================================================

pub const PROFILE_URL: &str = "https://www.facebook.com/jane.doe";

/// Profile page markup with optional about text and picture
pub fn profile_html(name: &str, about: Option<&str>, picture: Option<&str>) -> String {
    let about = about
        .map(|text| format!(r#"<div data-testid="profile-about-section">{}</div>"#, text))
        .unwrap_or_default();
    let picture = picture
        .map(|src| format!(r#"<img data-imgperflogname="profilePicture" src="{}">"#, src))
        .unwrap_or_default();

    format!(
        r#"<html><body>
             <div role="main">
               <div data-pagelet="ProfileTimeline"></div>
               <h1 dir="auto">{}</h1>
               {}
               {}
             </div>
           </body></html>"#,
        name, about, picture
    )
}

pub fn profile_page(name: &str, about: Option<&str>, picture: Option<&str>) -> PageDocument {
    PageDocument::new(PROFILE_URL, profile_html(name, about, picture))
}

// ============================================================================
// Polling and stub servers
// ============================================================================

/// Wait until the overlay shows the verdict of `run`
pub async fn wait_for_rendered(overlay: &OverlaySink, run: RunId) -> bool {
    for _ in 0..200 {
        if overlay.snapshot().await.rendered_run == Some(run) {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

/// Serve a router on an ephemeral loopback port; returns its base URL
pub async fn spawn_stub(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind stub server");
    let addr = listener.local_addr().expect("stub address");

    tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });

    format!("http://{}", addr)
}
