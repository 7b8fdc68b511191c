//! Shared application state for the secsgate gateway.
//!
//! Builds the template store and one [`Link`] per configured connection, and
//! registers them with the [`Orchestrator`].

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use secsgate_core::error::{Result, SecsGateError};
use secsgate_core::template::TemplateStore;

use crate::config::{ConnectionKind, GatewayConfig};
use crate::correlation::Link;
use crate::dispatch::Orchestrator;
use crate::obs::metrics::{GatewayMetrics, LinkGauge};
use crate::store::FsTemplateStore;
use crate::transport::{Connection, LoopbackConnection};

#[derive(Clone)]
pub struct AppState {
    orchestrator: Arc<Orchestrator>,
    metrics: Arc<GatewayMetrics>,
}

impl AppState {
    /// Build state from config: filesystem templates plus the configured
    /// connections. Must be called inside a Tokio runtime.
    pub fn new(cfg: GatewayConfig) -> Result<Self> {
        let dir = cfg.gateway.templates_dir.clone();
        if !Path::new(&dir).is_dir() {
            tracing::warn!(templates_dir = %dir, "templates_dir does not exist; template list will be empty");
        }
        let store: Arc<dyn TemplateStore> = Arc::new(FsTemplateStore::new(dir));

        let connections = cfg
            .connections
            .iter()
            .map(|c| match c.kind {
                ConnectionKind::Loopback => {
                    Arc::new(LoopbackConnection::from_config(c)) as Arc<dyn Connection>
                }
            })
            .collect();

        Self::with_parts(&cfg, store, connections)
    }

    /// Build state around an explicit store and connection set.
    pub fn with_parts(
        cfg: &GatewayConfig,
        store: Arc<dyn TemplateStore>,
        connections: Vec<Arc<dyn Connection>>,
    ) -> Result<Self> {
        let metrics = Arc::new(GatewayMetrics::default());
        let orchestrator = Orchestrator::new(
            store,
            Duration::from_millis(cfg.gateway.default_timeout_ms),
            Arc::clone(&metrics),
        );

        for conn in connections {
            let name = conn.name().to_owned();
            if orchestrator.link(&name).is_some() {
                return Err(SecsGateError::BadRequest(format!(
                    "duplicate connection name: {name}"
                )));
            }
            orchestrator.register_link(Arc::new(Link::new(conn)));
            tracing::info!(conn = %name, "connection registered");
        }

        Ok(Self {
            orchestrator: Arc::new(orchestrator),
            metrics,
        })
    }

    pub fn orchestrator(&self) -> Arc<Orchestrator> {
        Arc::clone(&self.orchestrator)
    }

    pub fn metrics(&self) -> Arc<GatewayMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Ready when every connection reports up.
    pub fn is_ready(&self) -> bool {
        self.orchestrator.links().iter().all(|l| l.is_connected())
    }

    pub fn link_gauges(&self) -> Vec<LinkGauge> {
        self.orchestrator
            .links()
            .iter()
            .map(|l| LinkGauge {
                name: l.name().to_owned(),
                connected: l.is_connected(),
                pending: l.pending_count(),
                unmatched: l.unmatched_replies(),
            })
            .collect()
    }
}
