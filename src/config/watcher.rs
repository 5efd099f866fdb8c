//! Configuration file watcher for hot reload.
//!
//! # Responsibilities
//! - Poll the configuration source on a fixed interval
//! - Detect semantic changes (parsed equality, not raw bytes)
//! - Validate off the serving path and publish only complete tables
//!
//! # Design Decisions
//! - Polling instead of OS notifications: the file may be removed and
//!   recreated by deployment tooling, and polling survives that unchanged
//! - An unreadable source counts as "no change"; the live table stays
//! - A rejected document never touches the registry
//! - The last rejected source text is remembered so a broken file is
//!   reported once, not every cycle

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::broadcast;
use tokio::time::{self, MissedTickBehavior};

use crate::config::loader::parse_document;
use crate::config::validation::validate_config;
use crate::observability::metrics;
use crate::routing::RouteRegistry;

/// Result of one reload attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReloadOutcome {
    /// A new table was published.
    Applied { generation: u64, route_count: usize },
    /// The source was unparsable or invalid; the previous table stays live.
    Rejected { reason: String },
    /// Nothing to do: same document, unreadable source, or an already
    /// rejected document.
    Unchanged,
}

impl ReloadOutcome {
    /// Label used in metrics.
    pub fn label(&self) -> &'static str {
        match self {
            ReloadOutcome::Applied { .. } => "applied",
            ReloadOutcome::Rejected { .. } => "rejected",
            ReloadOutcome::Unchanged => "unchanged",
        }
    }
}

impl fmt::Display for ReloadOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReloadOutcome::Applied {
                generation,
                route_count,
            } => write!(f, "applied generation {generation} with {route_count} route(s)"),
            ReloadOutcome::Rejected { reason } => write!(f, "rejected: {reason}"),
            ReloadOutcome::Unchanged => f.write_str("unchanged"),
        }
    }
}

/// Watches the configuration file and drives reloads into the registry.
pub struct ConfigWatcher {
    path: PathBuf,
    registry: Arc<RouteRegistry>,
    poll_interval: Duration,
    /// Document behind the currently published table.
    applied: Value,
    /// Source text of the most recent rejected document.
    rejected_source: Option<String>,
    source_missing: bool,
    last_outcome: Option<ReloadOutcome>,
}

impl ConfigWatcher {
    /// Create a watcher for `path`.
    ///
    /// `applied` is the parsed document the registry's current table was
    /// built from.
    pub fn new(
        path: &Path,
        registry: Arc<RouteRegistry>,
        applied: Value,
        poll_interval: Duration,
    ) -> Self {
        Self {
            path: path.to_path_buf(),
            registry,
            poll_interval,
            applied,
            rejected_source: None,
            source_missing: false,
            last_outcome: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Most recent outcome other than `Unchanged`.
    pub fn last_outcome(&self) -> Option<&ReloadOutcome> {
        self.last_outcome.as_ref()
    }

    /// Run one poll cycle.
    pub async fn poll_once(&mut self) -> ReloadOutcome {
        let outcome = self.check_source().await;

        metrics::record_reload(&outcome);
        match &outcome {
            ReloadOutcome::Applied {
                generation,
                route_count,
            } => {
                tracing::info!(
                    path = %self.path.display(),
                    generation,
                    route_count,
                    "Configuration reloaded"
                );
            }
            ReloadOutcome::Rejected { reason } => {
                tracing::error!(
                    path = %self.path.display(),
                    generation = self.registry.generation(),
                    %reason,
                    "Configuration rejected, keeping current routes"
                );
            }
            ReloadOutcome::Unchanged => {
                tracing::trace!(path = %self.path.display(), "Configuration unchanged");
            }
        }

        if outcome != ReloadOutcome::Unchanged {
            self.last_outcome = Some(outcome.clone());
        }
        outcome
    }

    async fn check_source(&mut self) -> ReloadOutcome {
        let source = match tokio::fs::read_to_string(&self.path).await {
            Ok(source) => source,
            Err(e) => {
                if !self.source_missing {
                    tracing::warn!(
                        path = %self.path.display(),
                        error = %e,
                        "Configuration source unreadable, serving current routes"
                    );
                    self.source_missing = true;
                }
                return ReloadOutcome::Unchanged;
            }
        };

        if self.source_missing {
            tracing::info!(path = %self.path.display(), "Configuration source available again");
            self.source_missing = false;
        }

        if self.rejected_source.as_deref() == Some(source.as_str()) {
            return ReloadOutcome::Unchanged;
        }

        let document = match parse_document(&source) {
            Ok(document) => document,
            Err(e) => {
                self.rejected_source = Some(source);
                return ReloadOutcome::Rejected {
                    reason: e.to_string(),
                };
            }
        };

        if document == self.applied {
            self.rejected_source = None;
            return ReloadOutcome::Unchanged;
        }

        match validate_config(&document) {
            Ok(config) => {
                let table = self.registry.publish(config);
                self.applied = document;
                self.rejected_source = None;
                ReloadOutcome::Applied {
                    generation: table.generation(),
                    route_count: table.len(),
                }
            }
            Err(e) => {
                self.rejected_source = Some(source);
                ReloadOutcome::Rejected {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Poll until a shutdown signal arrives.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            path = %self.path.display(),
            interval_ms = self.poll_interval.as_millis() as u64,
            "Config watcher started"
        );

        let mut ticker = time::interval(self.poll_interval.max(Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; startup already loaded the file.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.poll_once().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Config watcher received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::loader::load_config;
    use std::fs;

    const BASIC: &str = r#"
routes:
  - name: completions-gpt4
    type: llm/v1/completions
    model:
      name: gpt-4
      provider: openai
      config:
        openai_api_key: mykey
  - name: embeddings-gpt4
    type: llm/v1/embeddings
    model:
      name: gpt-4
      provider: openai
      config:
        openai_api_key: mykey
"#;

    const UPDATE: &str = r#"
routes:
  - name: chat-gpt4
    type: llm/v1/chat
    model:
      name: gpt-4
      provider: openai
      config:
        openai_api_key: mykey
"#;

    const INVALID: &str = r#"
routes:
  - invalid_name: invalid
    type: llm/v1/chat
    model:
      invalidkey: invalid
      invalid_provider: invalid
"#;

    fn setup(source: &str) -> (tempfile::TempDir, ConfigWatcher, Arc<RouteRegistry>) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, source).unwrap();

        let loaded = load_config(&path).unwrap();
        let registry = Arc::new(RouteRegistry::new(loaded.config));
        let watcher = ConfigWatcher::new(
            &path,
            Arc::clone(&registry),
            loaded.document,
            Duration::from_millis(20),
        );
        (dir, watcher, registry)
    }

    fn names(registry: &RouteRegistry) -> Vec<String> {
        registry.current().iter().map(|r| r.name.clone()).collect()
    }

    #[tokio::test]
    async fn test_valid_update_is_applied() {
        let (_dir, mut watcher, registry) = setup(BASIC);
        assert_eq!(watcher.poll_once().await, ReloadOutcome::Unchanged);

        fs::write(watcher.path(), UPDATE).unwrap();
        assert_eq!(
            watcher.poll_once().await,
            ReloadOutcome::Applied {
                generation: 2,
                route_count: 1
            }
        );
        assert_eq!(names(&registry), ["chat-gpt4"]);

        fs::write(watcher.path(), BASIC).unwrap();
        assert!(matches!(
            watcher.poll_once().await,
            ReloadOutcome::Applied { generation: 3, .. }
        ));
        assert_eq!(names(&registry), ["completions-gpt4", "embeddings-gpt4"]);
    }

    #[tokio::test]
    async fn test_invalid_update_keeps_previous_table() {
        let (_dir, mut watcher, registry) = setup(BASIC);

        fs::write(watcher.path(), INVALID).unwrap();
        let outcome = watcher.poll_once().await;
        assert!(matches!(outcome, ReloadOutcome::Rejected { .. }));
        assert_eq!(registry.generation(), 1);
        assert_eq!(names(&registry), ["completions-gpt4", "embeddings-gpt4"]);

        // Same broken file again is not re-reported.
        assert_eq!(watcher.poll_once().await, ReloadOutcome::Unchanged);
        assert_eq!(watcher.last_outcome(), Some(&outcome));
    }

    #[tokio::test]
    async fn test_malformed_yaml_is_rejected() {
        let (_dir, mut watcher, registry) = setup(BASIC);

        fs::write(watcher.path(), "routes: [unclosed").unwrap();
        assert!(matches!(
            watcher.poll_once().await,
            ReloadOutcome::Rejected { .. }
        ));
        assert_eq!(registry.current().len(), 2);
    }

    #[tokio::test]
    async fn test_removed_then_recreated_source() {
        let (_dir, mut watcher, registry) = setup(BASIC);

        fs::remove_file(watcher.path()).unwrap();
        assert_eq!(watcher.poll_once().await, ReloadOutcome::Unchanged);
        assert_eq!(watcher.poll_once().await, ReloadOutcome::Unchanged);
        assert_eq!(registry.current().len(), 2);

        fs::write(watcher.path(), UPDATE).unwrap();
        assert!(matches!(
            watcher.poll_once().await,
            ReloadOutcome::Applied { route_count: 1, .. }
        ));
        assert_eq!(names(&registry), ["chat-gpt4"]);
    }

    #[tokio::test]
    async fn test_reformatted_document_is_unchanged() {
        let (_dir, mut watcher, registry) = setup(UPDATE);

        let reformatted = "routes: [{name: chat-gpt4, type: llm/v1/chat, model: \
                           {name: gpt-4, provider: openai, config: {openai_api_key: mykey}}}]\n";
        fs::write(watcher.path(), reformatted).unwrap();
        assert_eq!(watcher.poll_once().await, ReloadOutcome::Unchanged);
        assert_eq!(registry.generation(), 1);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let (_dir, watcher, registry) = setup(BASIC);
        let path = watcher.path().to_path_buf();
        let (tx, rx) = broadcast::channel(1);

        let handle = tokio::spawn(watcher.run(rx));
        fs::write(&path, UPDATE).unwrap();

        let mut applied = false;
        for _ in 0..100 {
            if registry.generation() > 1 {
                applied = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert!(applied, "watcher loop should pick up the change");

        tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
