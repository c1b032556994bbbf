//! System health view: live infrastructure metrics and service list.

use std::fmt;
use std::sync::Arc;

use faresight_types::MetricSnapshot;
use serde::{Deserialize, Serialize};

use super::ViewContext;
use crate::error::EngineResult;
use crate::scope::ViewScope;
use crate::ticker::LiveTickEngine;

const VIEW_NAME: &str = "system-health";

/// Health of a backend service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceState {
    Operational,
    Degraded,
    Down,
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Operational => write!(f, "operational"),
            Self::Degraded => write!(f, "degraded"),
            Self::Down => write!(f, "down"),
        }
    }
}

/// One row of the services list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub name: String,
    pub state: ServiceState,
    pub latency_ms: u32,
}

impl ServiceStatus {
    fn new(name: &str, state: ServiceState, latency_ms: u32) -> Self {
        Self {
            name: name.to_string(),
            state,
            latency_ms,
        }
    }
}

/// Live cpu, memory and network metrics, ticking while the view is mounted.
pub struct SystemHealthView {
    scope: ViewScope,
    ticker: LiveTickEngine,
    services: Vec<ServiceStatus>,
    uptime_pct: f64,
}

impl SystemHealthView {
    /// Mount the view and start its ticker. Needs a running tokio runtime.
    pub fn mount(ctx: &ViewContext) -> EngineResult<Self> {
        let scope = ViewScope::new(VIEW_NAME);
        let ticker = LiveTickEngine::new(VIEW_NAME, ctx.random_for(VIEW_NAME));
        ticker.start(
            &scope,
            ctx.config.ticker.interval(),
            ctx.config.ticker.metrics.clone(),
        )?;

        Ok(Self {
            scope,
            ticker,
            services: vec![
                ServiceStatus::new("API Gateway", ServiceState::Operational, 45),
                ServiceStatus::new("Prediction Engine", ServiceState::Operational, 120),
                ServiceStatus::new("Data Ingestion", ServiceState::Operational, 85),
                ServiceStatus::new("Database Cluster", ServiceState::Degraded, 350),
                ServiceStatus::new("Auth Service", ServiceState::Operational, 35),
            ],
            uptime_pct: 99.98,
        })
    }

    pub fn ticker(&self) -> &LiveTickEngine {
        &self.ticker
    }

    pub fn latest(&self) -> Option<Arc<MetricSnapshot>> {
        self.ticker.latest()
    }

    pub fn services(&self) -> &[ServiceStatus] {
        &self.services
    }

    pub fn uptime_pct(&self) -> f64 {
        self.uptime_pct
    }

    pub fn is_mounted(&self) -> bool {
        self.scope.is_active()
    }

    pub fn teardown(&self) {
        self.ticker.stop();
        self.scope.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FareSightConfig;
    use crate::status::SilentStatus;

    #[tokio::test]
    async fn test_mount_publishes_seed_values() {
        let ctx = ViewContext::new(FareSightConfig::default(), Arc::new(SilentStatus));
        let view = SystemHealthView::mount(&ctx).unwrap();

        let snap = view.latest().unwrap();
        assert_eq!(snap.value("cpu"), Some(45.0));
        assert_eq!(snap.value("memory"), Some(62.0));
        assert_eq!(snap.value("network"), Some(120.0));
        assert_eq!(view.services().len(), 5);

        view.teardown();
        assert!(!view.ticker().is_running());
        assert!(!view.is_mounted());
    }
}
