// Test Harness
//
// Owns the transport for one plugin and walks it through
// Created -> Serving -> Stopped. On start it probes the optional methods once
// and caches which ones the plugin implements.

use crate::client::{CostSourceClient, DEFAULT_CALL_TIMEOUT};
use crate::plugin::CostSourcePlugin;
use crate::status::RpcStatus;
use crate::transport::InProcessTransport;
use lecout::messages::{EstimateCostRequest, GetBudgetsRequest, GetRecommendationsRequest};
use lecout::RpcMethod;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Harness lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HarnessState {
    /// Constructed, not yet serving
    Created,
    /// Transport open, client usable
    Serving,
    /// Transport closed; terminal
    Stopped,
}

/// Harness lifecycle errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HarnessError {
    /// `start` called twice
    #[error("harness already started")]
    AlreadyStarted,

    /// Client requested before `start`
    #[error("harness is not serving")]
    NotServing,

    /// Any use after `stop`
    #[error("harness has been stopped")]
    Stopped,
}

/// Methods the plugin answered without `UNIMPLEMENTED`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilitySet {
    methods: BTreeSet<RpcMethod>,
}

impl CapabilitySet {
    /// Core methods only
    pub fn core() -> Self {
        Self {
            methods: RpcMethod::ALL
                .into_iter()
                .filter(|m| !m.is_optional())
                .collect(),
        }
    }

    /// Every method
    pub fn all() -> Self {
        Self {
            methods: RpcMethod::ALL.into_iter().collect(),
        }
    }

    /// Record an optional method as implemented
    pub fn insert(&mut self, method: RpcMethod) {
        self.methods.insert(method);
    }

    /// Whether `method` is implemented
    pub fn supports(&self, method: RpcMethod) -> bool {
        self.methods.contains(&method)
    }

    /// Implemented methods in service order
    pub fn methods(&self) -> impl Iterator<Item = RpcMethod> + '_ {
        self.methods.iter().copied()
    }

    /// Optional methods the plugin does not implement
    pub fn missing_optional(&self) -> Vec<RpcMethod> {
        RpcMethod::OPTIONAL
            .into_iter()
            .filter(|m| !self.supports(*m))
            .collect()
    }
}

/// Harness timeouts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HarnessConfig {
    /// Timeout applied to every client call
    pub call_timeout: Duration,
    /// Timeout for each capability probe
    pub probe_timeout: Duration,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            call_timeout: DEFAULT_CALL_TIMEOUT,
            probe_timeout: Duration::from_secs(2),
        }
    }
}

/// Serves one plugin to the suite
pub struct TestHarness {
    transport: Arc<InProcessTransport>,
    config: HarnessConfig,
    state: Mutex<HarnessState>,
    capabilities: Mutex<CapabilitySet>,
    plugin_name: Mutex<String>,
}

impl TestHarness {
    /// Harness over an owned plugin
    pub fn new<P: CostSourcePlugin + 'static>(plugin: P) -> Self {
        Self::from_shared(Arc::new(plugin), HarnessConfig::default())
    }

    /// Harness over an owned plugin with explicit timeouts
    pub fn with_config<P: CostSourcePlugin + 'static>(plugin: P, config: HarnessConfig) -> Self {
        Self::from_shared(Arc::new(plugin), config)
    }

    /// Harness over a shared plugin
    pub fn from_shared(plugin: Arc<dyn CostSourcePlugin>, config: HarnessConfig) -> Self {
        Self {
            transport: Arc::new(InProcessTransport::new(plugin)),
            config,
            state: Mutex::new(HarnessState::Created),
            capabilities: Mutex::new(CapabilitySet::core()),
            plugin_name: Mutex::new(String::new()),
        }
    }

    /// Current state
    pub fn state(&self) -> HarnessState {
        self.state
            .lock()
            .map(|s| *s)
            .unwrap_or(HarnessState::Stopped)
    }

    /// Open the transport and probe optional methods.
    pub async fn start(&self) -> Result<(), HarnessError> {
        {
            let mut state = self.state.lock().map_err(|_| HarnessError::Stopped)?;
            match *state {
                HarnessState::Created => *state = HarnessState::Serving,
                HarnessState::Serving => return Err(HarnessError::AlreadyStarted),
                HarnessState::Stopped => return Err(HarnessError::Stopped),
            }
        }
        self.transport.open();

        let probe = CostSourceClient::new(Arc::clone(&self.transport))
            .with_timeout(self.config.probe_timeout);

        let name = match probe.name().await {
            Ok(resp) => resp.name,
            Err(e) => {
                warn!("Name probe failed: {}", e);
                String::new()
            }
        };

        let mut capabilities = CapabilitySet::core();
        for method in RpcMethod::OPTIONAL {
            let outcome = match method {
                RpcMethod::GetRecommendations => probe
                    .get_recommendations(&GetRecommendationsRequest {
                        page_size: 1,
                        ..GetRecommendationsRequest::default()
                    })
                    .await
                    .map(|_| ()),
                RpcMethod::GetBudgets => probe
                    .get_budgets(&GetBudgetsRequest::default())
                    .await
                    .map(|_| ()),
                _ => probe
                    .estimate_cost(&EstimateCostRequest::default())
                    .await
                    .map(|_| ()),
            };
            if implemented(&outcome) {
                capabilities.insert(method);
            }
            debug!(plugin_name = %name, rpc_method = %method, implemented = implemented(&outcome), "capability probe");
        }

        info!(
            plugin_name = %name,
            missing = ?capabilities.missing_optional(),
            "harness serving"
        );

        if let Ok(mut slot) = self.capabilities.lock() {
            *slot = capabilities;
        }
        if let Ok(mut slot) = self.plugin_name.lock() {
            *slot = name;
        }
        Ok(())
    }

    /// Client bound to the serving transport
    pub fn client(&self) -> Result<CostSourceClient, HarnessError> {
        match self.state() {
            HarnessState::Serving => Ok(CostSourceClient::new(Arc::clone(&self.transport))
                .with_timeout(self.config.call_timeout)),
            HarnessState::Created => Err(HarnessError::NotServing),
            HarnessState::Stopped => Err(HarnessError::Stopped),
        }
    }

    /// Probed capabilities; core methods only until `start` completes
    pub fn capabilities(&self) -> CapabilitySet {
        self.capabilities
            .lock()
            .map(|c| c.clone())
            .unwrap_or_else(|_| CapabilitySet::core())
    }

    /// Name reported by the plugin at start; empty if the probe failed
    pub fn plugin_name(&self) -> String {
        self.plugin_name
            .lock()
            .map(|n| n.clone())
            .unwrap_or_default()
    }

    /// Close the transport. Idempotent; outstanding clients start failing
    /// with `UNAVAILABLE`.
    pub fn stop(&self) {
        if let Ok(mut state) = self.state.lock() {
            if *state != HarnessState::Stopped {
                debug!(plugin_name = %self.plugin_name(), "harness stopping");
            }
            *state = HarnessState::Stopped;
        }
        self.transport.close();
    }
}

impl Drop for TestHarness {
    fn drop(&mut self) {
        self.transport.close();
    }
}

fn implemented<T>(outcome: &Result<T, RpcStatus>) -> bool {
    !matches!(outcome, Err(status) if status.is_unimplemented())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_capabilities() {
        let caps = CapabilitySet::core();
        assert!(caps.supports(RpcMethod::GetPricingSpec));
        assert!(!caps.supports(RpcMethod::GetBudgets));
        assert_eq!(caps.missing_optional().len(), 3);
        assert!(CapabilitySet::all().missing_optional().is_empty());
    }

    #[test]
    fn test_implemented_classification() {
        assert!(implemented::<()>(&Ok(())));
        assert!(implemented::<()>(&Err(RpcStatus::invalid_argument("bad"))));
        assert!(!implemented::<()>(&Err(RpcStatus::unimplemented(
            RpcMethod::EstimateCost
        ))));
    }
}
