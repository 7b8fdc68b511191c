use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use secsgate_core::error::{Result, SecsGateError};
use secsgate_core::item::ItemBuilder;
use secsgate_core::message::assemble;
use secsgate_core::template::{missing_keys, Template, TemplateHeader, TemplateStore, ValueTable};

use crate::correlation::{Link, SendOutcome};
use crate::obs::metrics::GatewayMetrics;

/// Template by stored name, or inline.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TemplateRef {
    Name(String),
    Inline(Value),
}

/// One `sendTemplate` call.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SendRequest {
    #[serde(default)]
    pub template: Option<TemplateRef>,
    /// Alias for a string `template`.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub values: ValueTable,
    /// Connection to send on.
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub wait_reply: Option<bool>,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

impl SendRequest {
    fn template_ref(&self) -> Option<TemplateRef> {
        self.template
            .clone()
            .or_else(|| self.name.clone().map(TemplateRef::Name))
    }
}

/// Top-level send pipeline: substitute, validate, build, assemble, dispatch.
pub struct Orchestrator {
    store: Arc<dyn TemplateStore>,
    links: DashMap<String, Arc<Link>>,
    default_timeout: Duration,
    metrics: Arc<GatewayMetrics>,
}

impl Orchestrator {
    pub fn new(
        store: Arc<dyn TemplateStore>,
        default_timeout: Duration,
        metrics: Arc<GatewayMetrics>,
    ) -> Self {
        Self {
            store,
            links: DashMap::new(),
            default_timeout,
            metrics,
        }
    }

    pub fn register_link(&self, link: Arc<Link>) {
        self.links.insert(link.name().to_owned(), link);
    }

    pub fn link(&self, name: &str) -> Option<Arc<Link>> {
        self.links.get(name).map(|l| Arc::clone(l.value()))
    }

    /// Registered links sorted by name.
    pub fn links(&self) -> Vec<Arc<Link>> {
        let mut out: Vec<Arc<Link>> = self.links.iter().map(|e| Arc::clone(e.value())).collect();
        out.sort_by(|a, b| a.name().cmp(b.name()));
        out
    }

    pub fn list_templates(&self) -> Result<Vec<String>> {
        self.store.list_names()
    }

    pub fn get_template(&self, name: &str) -> Result<Template> {
        self.store.load(name)
    }

    /// Run one send and record its outcome.
    pub async fn send_template(&self, req: SendRequest) -> Result<SendOutcome> {
        // label only with registered names so client input cannot mint series
        let label = req
            .from
            .as_deref()
            .map(str::trim)
            .and_then(|f| self.links.get(f).map(|l| l.key().clone()))
            .unwrap_or_else(|| "unknown".to_owned());
        let from_label = label.as_str();
        let res = self.run(req).await;

        let outcome = match &res {
            Ok(SendOutcome::Sent { .. }) => "sent",
            Ok(SendOutcome::Replied { .. }) => "replied",
            Err(SecsGateError::Timeout { .. }) => "timeout",
            Err(SecsGateError::Transport(_)) => "transport_error",
            Err(_) => "rejected",
        };
        self.metrics.sends.inc(&[("from", from_label), ("outcome", outcome)]);
        if let Ok(SendOutcome::Replied { latency_ms, .. }) = &res {
            self.metrics
                .reply_latency
                .observe(&[("from", from_label)], Duration::from_millis(*latency_ms));
        }
        if let Err(e) = &res {
            warn!(from = %from_label, code = e.client_code().as_str(), error = %e, "send failed");
        }
        res
    }

    async fn run(&self, req: SendRequest) -> Result<SendOutcome> {
        // 1) required fields
        let from = req
            .from
            .as_deref()
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .ok_or_else(|| SecsGateError::BadRequest("from is required".into()))?;
        let tref = req.template_ref().ok_or_else(|| {
            SecsGateError::BadRequest("template name or inline template is required".into())
        })?;
        if req.timeout_ms == Some(0) {
            return Err(SecsGateError::BadRequest("timeoutMs must be positive".into()));
        }

        // 2) template + connection
        let (label, original) = match tref {
            TemplateRef::Name(name) => {
                let t = self.store.load(&name)?;
                (name, t)
            }
            TemplateRef::Inline(v) => ("<inline>".to_owned(), Template::from_value(v)?),
        };
        let link = self
            .link(from)
            .ok_or_else(|| SecsGateError::NotFound(format!("connection {from}")))?;

        // 3) substitute, then check completeness against the original tree
        let substituted = original.substitute(&req.values);
        let missing = missing_keys(&original.placeholders(), &req.values);
        if !missing.is_empty() {
            return Err(SecsGateError::MissingPlaceholders(missing));
        }

        // 4) header + items
        let mut header = TemplateHeader::resolve(&substituted, &original)?;
        let descriptors = substituted.items()?;
        let items = ItemBuilder::new(link.capabilities()).build(&descriptors);

        // 5) assemble with the effective wait flag as the W-bit
        let wait = req
            .wait_reply
            .or(header.reply_expected)
            .unwrap_or(false);
        header.reply_expected = Some(wait);
        let message = assemble(&header, items, link.next_token());
        let timeout = req
            .timeout_ms
            .map(Duration::from_millis)
            .unwrap_or(self.default_timeout);

        info!(
            from = %from,
            template = %label,
            token = %message.token,
            msg = %message.label(),
            wait,
            timeout_ms = timeout.as_millis() as u64,
            "dispatching"
        );
        let started = Instant::now();
        let outcome = link.send_and_await(message, wait, timeout).await?;
        debug!(from = %from, elapsed_ms = started.elapsed().as_millis() as u64, "send complete");
        Ok(outcome)
    }
}
