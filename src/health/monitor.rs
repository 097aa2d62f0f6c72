use crate::core::events::{ComponentHealth, SystemHealth, SystemMode};
use crate::health::classifier::ErrorHandler;
use crate::health::probes::ComponentProbe;
use crate::health::state::HealthState;
use chrono::Utc;
use log::{info, warn};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

struct ComponentEntry {
    health: ComponentHealth,
    probe: Arc<dyn ComponentProbe>,
}

/// Tracks per-component health through periodic probe sweeps
pub struct HealthMonitor {
    components: RwLock<HashMap<String, ComponentEntry>>,
    state: Arc<HealthState>,
    handler: Arc<ErrorHandler>,
}

impl HealthMonitor {
    pub fn new(state: Arc<HealthState>, handler: Arc<ErrorHandler>) -> Self {
        Self {
            components: RwLock::new(HashMap::new()),
            state,
            handler,
        }
    }

    /// Register a component; one health record per name, created at startup
    pub async fn register(&self, probe: Arc<dyn ComponentProbe>) {
        let name = probe.name().to_string();
        let mut components = self.components.write().await;
        components.insert(
            name.clone(),
            ComponentEntry {
                health: ComponentHealth::new(name),
                probe,
            },
        );
    }

    /// Probe every enabled component and apply status transitions
    ///
    /// Returns the components that transitioned to Critical or worse; the
    /// caller escalates those to the recovery orchestrator. Probing happens
    /// outside the component lock so slow host calls cannot block readers.
    pub async fn run_checks(&self) -> Vec<(String, SystemHealth)> {
        let probes: Vec<(String, Arc<dyn ComponentProbe>)> = {
            let components = self.components.read().await;
            components
                .iter()
                .filter(|(_, entry)| entry.health.enabled)
                .map(|(name, entry)| (name.clone(), entry.probe.clone()))
                .collect()
        };

        let mut results = Vec::with_capacity(probes.len());
        for (name, probe) in probes {
            let status = match probe.probe().await {
                Ok(status) => status,
                Err(error) => {
                    self.handler
                        .handle_failure(&error, &format!("probe of {}", name))
                        .await;
                    SystemHealth::Failed
                }
            };
            results.push((name, status));
        }

        let mut escalations = Vec::new();
        let now = Utc::now();
        {
            let mut components = self.components.write().await;
            for (name, status) in results {
                let entry = match components.get_mut(&name) {
                    Some(entry) => entry,
                    None => continue,
                };
                let previous = entry.health.status;
                entry.health.last_check_time = now;
                entry.health.status = status;

                if previous == SystemHealth::Healthy && status != SystemHealth::Healthy {
                    // Failure counting is per transition, not per unhealthy probe
                    entry.health.failure_count += 1;
                    entry.health.last_failure_time = Some(now);
                    warn!(
                        "component {} degraded: {:?} -> {:?} (failure #{})",
                        name, previous, status, entry.health.failure_count
                    );
                    if status >= SystemHealth::Critical {
                        escalations.push((name.clone(), status));
                    }
                } else if previous != SystemHealth::Healthy && status == SystemHealth::Healthy {
                    info!("component {} recovered: {:?} -> Healthy", name, previous);
                }
            }
        }

        self.apply_mode(&escalations).await;
        escalations
    }

    async fn apply_mode(&self, _escalations: &[(String, SystemHealth)]) {
        let worst = self.worst_status().await;
        self.state.set_worst_component(worst).await;

        let mode = self.state.mode().await;
        if worst == SystemHealth::Healthy {
            if mode == SystemMode::Recovery {
                self.state.set_mode(SystemMode::Normal).await;
            }
        } else if mode == SystemMode::Normal {
            self.state.set_mode(SystemMode::Recovery).await;
        }
    }

    /// Worst status across enabled components
    pub async fn worst_status(&self) -> SystemHealth {
        let components = self.components.read().await;
        components
            .values()
            .filter(|entry| entry.health.enabled)
            .map(|entry| entry.health.status)
            .max()
            .unwrap_or(SystemHealth::Healthy)
    }

    pub async fn component_health(&self, name: &str) -> Option<ComponentHealth> {
        let components = self.components.read().await;
        components.get(name).map(|entry| entry.health.clone())
    }

    /// Enabled components currently at or above a status
    pub async fn components_at_or_above(&self, status: SystemHealth) -> Vec<(String, SystemHealth)> {
        let components = self.components.read().await;
        components
            .values()
            .filter(|entry| entry.health.enabled && entry.health.status >= status)
            .map(|entry| (entry.health.name.clone(), entry.health.status))
            .collect()
    }

    /// Enable or disable a component; disabled components are not probed
    pub async fn set_enabled(&self, name: &str, enabled: bool) {
        let mut components = self.components.write().await;
        if let Some(entry) = components.get_mut(name) {
            if entry.health.enabled != enabled {
                warn!(
                    "component {} {}",
                    name,
                    if enabled { "re-enabled" } else { "disabled" }
                );
            }
            entry.health.enabled = enabled;
        }
    }
}
