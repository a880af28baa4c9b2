//! Limiter registry resolving which limiter guards a request.
//!
//! The sharing scope decides how many limiters exist:
//! - `global`: one limiter for every protected route
//! - `per_route`: one limiter per registered route
//! - `per_client`: one limiter per route and client address, created on first use

use dashmap::DashMap;
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::clock::Clock;
use super::limiter::Limiter;
use super::policy::{LimitPolicy, LimiterScope};
use crate::config::RateLimitingConfig;
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ClientKey {
    route: String,
    /// `None` when the transport did not expose a peer address
    client: Option<IpAddr>,
}

/// Owns every limiter in the process and answers admission queries.
pub struct AdmissionControl {
    scope: LimiterScope,
    default_policy: LimitPolicy,
    overrides: HashMap<String, LimitPolicy>,
    clock: Arc<dyn Clock>,
    global: Arc<Limiter>,
    routes: DashMap<String, Arc<Limiter>>,
    clients: DashMap<ClientKey, Arc<Limiter>>,
}

impl AdmissionControl {
    /// Build a registry from configuration, validating every policy up front.
    pub fn from_config(config: &RateLimitingConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;

        let default_policy = config.default_policy()?;
        let mut overrides = HashMap::with_capacity(config.routes.len());
        for route in config.routes.keys() {
            overrides.insert(route.clone(), config.policy_for(route)?);
        }

        info!(
            scope = %config.scope,
            policy = %default_policy,
            overrides = overrides.len(),
            "Admission control initialized"
        );

        Ok(Self {
            scope: config.scope,
            default_policy,
            overrides,
            global: Arc::new(Limiter::from_policy(default_policy, clock.clone())),
            clock,
            routes: DashMap::new(),
            clients: DashMap::new(),
        })
    }

    /// Build a registry applying a single policy to every route.
    pub fn new(scope: LimiterScope, policy: LimitPolicy, clock: Arc<dyn Clock>) -> Result<Self> {
        let config = RateLimitingConfig {
            capacity: policy.capacity,
            leak_rate: policy.leak_rate,
            scope,
            ..RateLimitingConfig::default()
        };
        Self::from_config(&config, clock)
    }

    /// The configured sharing scope.
    pub fn scope(&self) -> LimiterScope {
        self.scope
    }

    /// The policy enforced on `route`. Overrides are ignored in global scope.
    pub fn policy_for(&self, route: &str) -> LimitPolicy {
        if self.scope == LimiterScope::Global {
            return self.default_policy;
        }
        self.overrides
            .get(route)
            .copied()
            .unwrap_or(self.default_policy)
    }

    /// Register a protected route at startup.
    ///
    /// With per-route scope this creates the route's limiter immediately, so
    /// its leak reference starts when the route is registered.
    pub fn register(&self, route: &str) {
        if self.scope == LimiterScope::PerRoute {
            let limiter = self.route_limiter(route);
            debug!(route = route, policy = %limiter.policy(), "Route limiter registered");
        }
    }

    /// The limiter guarding a request to `route` from `client`.
    pub fn limiter_for(&self, route: &str, client: Option<IpAddr>) -> Arc<Limiter> {
        match self.scope {
            LimiterScope::Global => self.global.clone(),
            LimiterScope::PerRoute => self.route_limiter(route),
            LimiterScope::PerClient => {
                let key = ClientKey {
                    route: route.to_string(),
                    client,
                };
                self.clients
                    .entry(key)
                    .or_insert_with(|| {
                        debug!(route = route, client = ?client, "Creating client limiter");
                        Arc::new(Limiter::from_policy(self.policy_for(route), self.clock.clone()))
                    })
                    .clone()
            }
        }
    }

    /// Ask whether a request to `route` from `client` may proceed.
    pub fn check(&self, route: &str, client: Option<IpAddr>) -> bool {
        let limiter = self.limiter_for(route, client);
        let admitted = limiter.allow();

        if admitted {
            debug!(route = route, client = ?client, "Request admitted");
        } else {
            debug!(
                route = route,
                client = ?client,
                scope = %self.scope,
                "Rate limit exceeded"
            );
        }
        admitted
    }

    /// Drop per-client limiters whose buckets have fully drained.
    ///
    /// A drained limiter behaves exactly like a fresh one, so dropping it
    /// loses no state. Limiters still held by an in-flight request are kept
    /// even when empty; `retain` holds each shard's write lock, so no handle
    /// can be cloned out while the count is read. Returns the number of
    /// limiters removed.
    pub fn evict_idle(&self) -> usize {
        let before = self.clients.len();
        self.clients
            .retain(|_, limiter| Arc::strong_count(limiter) > 1 || limiter.occupancy() > 0);
        let evicted = before.saturating_sub(self.clients.len());
        if evicted > 0 {
            debug!(evicted = evicted, remaining = self.clients.len(), "Evicted idle client limiters");
        }
        evicted
    }

    /// Number of live per-client limiters.
    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    /// Number of live per-route limiters.
    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    /// Periodically evict idle per-client limiters in the background.
    pub fn spawn_idle_sweeper(self: &Arc<Self>, period: Duration) -> JoinHandle<()> {
        let admission = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                admission.evict_idle();
            }
        })
    }

    fn route_limiter(&self, route: &str) -> Arc<Limiter> {
        if let Some(limiter) = self.routes.get(route) {
            return limiter.clone();
        }
        self.routes
            .entry(route.to_string())
            .or_insert_with(|| {
                Arc::new(Limiter::from_policy(self.policy_for(route), self.clock.clone()))
            })
            .clone()
    }
}
