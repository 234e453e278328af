//! In-process cluster backend.
//!
//! Members are plain addresses registered with [`MemoryCluster::start_member`];
//! joining succeeds once any seed address matches a running member. Region
//! storage is a Moka cache with time-to-idle expiry, which gives touch-based TTL.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use moka::sync::Cache;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info};

use super::{ClusterConnection, ClusterConnector, ClusterRegion, ConnectionPolicy, Value};
use crate::cache::RegionTemplate;
use crate::config::{ClusterEndpoint, join_endpoints};
use crate::error::ClusterError;

const JOIN_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// A failure to inject into the next region-level call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    Transient,
    WorkerBlocked,
}

/// Shared in-process cluster. Cloning is cheap and shares state.
#[derive(Clone, Default)]
pub struct MemoryCluster {
    inner: Arc<ClusterState>,
}

#[derive(Default)]
struct ClusterState {
    members: RwLock<HashSet<String>>,
    regions: DashMap<String, Arc<MemoryRegion>>,
    joins: AtomicUsize,
    last_policy: Mutex<Option<ConnectionPolicy>>,
    fault: Mutex<Option<Fault>>,
}

impl MemoryCluster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a server member listening on `addr` (`host:port`).
    pub fn start_member(&self, addr: &str) {
        info!("Cluster member started on {}", addr);
        self.inner.members.write().insert(addr.to_string());
    }

    pub fn stop_member(&self, addr: &str) {
        if self.inner.members.write().remove(addr) {
            info!("Cluster member on {} stopped", addr);
        }
    }

    /// Number of successful joins since the cluster was created.
    pub fn join_count(&self) -> usize {
        self.inner.joins.load(Ordering::SeqCst)
    }

    /// Policy of the most recent successful join.
    ///
    /// The in-process transport has no peer queues or idle sockets, so the
    /// slow-client and idle-connection limits are recorded here rather than enforced.
    pub fn last_join_policy(&self) -> Option<ConnectionPolicy> {
        self.inner.last_policy.lock().clone()
    }

    /// Names of regions currently stored cluster-side.
    pub fn region_names(&self) -> Vec<String> {
        self.inner.regions.iter().map(|r| r.key().clone()).collect()
    }

    /// Make the next region-level call fail with `fault`.
    pub fn inject_fault(&self, fault: Fault) {
        *self.inner.fault.lock() = Some(fault);
    }

    fn find_member(&self, seeds: &[ClusterEndpoint]) -> Option<String> {
        let members = self.inner.members.read();
        seeds
            .iter()
            .flat_map(|seed| seed.addresses())
            .find(|addr| members.contains(addr))
    }
}

impl std::fmt::Debug for MemoryCluster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCluster")
            .field("members", &self.inner.members.read().len())
            .field("regions", &self.inner.regions.len())
            .field("joins", &self.join_count())
            .finish()
    }
}

impl ClusterConnector for MemoryCluster {
    fn connect(
        &self,
        seeds: &[ClusterEndpoint],
        policy: &ConnectionPolicy,
    ) -> Result<Arc<dyn ClusterConnection>, ClusterError> {
        let deadline = Instant::now() + policy.join_timeout;

        loop {
            if let Some(member) = self.find_member(seeds) {
                self.inner.joins.fetch_add(1, Ordering::SeqCst);
                *self.inner.last_policy.lock() = Some(policy.clone());
                info!("Joined cluster through {}", member);
                debug!(
                    "Slow-client queue limit {}, idle connection timeout {:?}",
                    policy.slow_client_queue_limit, policy.idle_connection_timeout
                );
                return Ok(Arc::new(MemoryConnection {
                    state: Arc::new(ConnectionState {
                        cluster: Arc::clone(&self.inner),
                        connected: AtomicBool::new(true),
                        worker_blocked_timeout: policy.failure.worker_blocked_timeout,
                    }),
                }));
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(ClusterError::JoinTimeout {
                    seeds: join_endpoints(seeds),
                    timeout: policy.join_timeout,
                });
            }
            thread::sleep(JOIN_POLL_INTERVAL.min(deadline - now));
        }
    }
}

struct ConnectionState {
    cluster: Arc<ClusterState>,
    connected: AtomicBool,
    worker_blocked_timeout: Duration,
}

impl ConnectionState {
    fn check(&self) -> Result<(), ClusterError> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(ClusterError::Disconnected);
        }
        match self.cluster.fault.lock().take() {
            None => Ok(()),
            Some(Fault::Transient) => Err(ClusterError::Transient {
                message: "injected fault".to_string(),
            }),
            Some(Fault::WorkerBlocked) => Err(ClusterError::WorkerBlocked {
                timeout: self.worker_blocked_timeout,
            }),
        }
    }
}

struct MemoryConnection {
    state: Arc<ConnectionState>,
}

impl ClusterConnection for MemoryConnection {
    fn get_or_create_region(
        &self,
        name: &str,
        template: &RegionTemplate,
    ) -> Result<Arc<dyn ClusterRegion>, ClusterError> {
        self.state.check()?;

        let region = self
            .state
            .cluster
            .regions
            .entry(name.to_string())
            .or_insert_with(|| {
                debug!("Creating region: {}", name);
                Arc::new(MemoryRegion::new(name, template.clone()))
            })
            .value()
            .clone();

        Ok(Arc::new(RegionView {
            region,
            state: Arc::clone(&self.state),
        }))
    }

    fn destroy_region(&self, name: &str) -> Result<bool, ClusterError> {
        self.state.check()?;

        match self.state.cluster.regions.remove(name) {
            Some((_, region)) => {
                region.destroyed.store(true, Ordering::SeqCst);
                region.entries.invalidate_all();
                debug!("Destroyed region: {}", name);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn disconnect(&self) {
        if self.state.connected.swap(false, Ordering::SeqCst) {
            info!("Disconnected from cluster");
        }
    }
}

struct MemoryRegion {
    name: String,
    template: RegionTemplate,
    entries: Cache<Vec<u8>, Value>,
    destroyed: AtomicBool,
}

impl MemoryRegion {
    fn new(name: &str, template: RegionTemplate) -> Self {
        let entries = Cache::builder().time_to_idle(template.expiry).build();
        Self {
            name: name.to_string(),
            template,
            entries,
            destroyed: AtomicBool::new(false),
        }
    }
}

/// A region as seen through one connection.
struct RegionView {
    region: Arc<MemoryRegion>,
    state: Arc<ConnectionState>,
}

impl RegionView {
    fn check(&self) -> Result<(), ClusterError> {
        if self.region.destroyed.load(Ordering::SeqCst) {
            return Err(ClusterError::RegionDestroyed {
                name: self.region.name.clone(),
            });
        }
        self.state.check()
    }

    fn read_out(&self, value: Value) -> Value {
        if self.region.template.copy_on_read {
            Arc::from(&value[..])
        } else {
            value
        }
    }
}

impl ClusterRegion for RegionView {
    fn name(&self) -> &str {
        &self.region.name
    }

    fn get(&self, key: &[u8]) -> Result<Option<Value>, ClusterError> {
        self.check()?;
        Ok(self.region.entries.get(key).map(|v| self.read_out(v)))
    }

    fn put(&self, key: &[u8], value: Value) -> Result<(), ClusterError> {
        self.check()?;
        self.region.entries.insert(key.to_vec(), value);
        Ok(())
    }

    fn touch(&self, key: &[u8]) -> Result<bool, ClusterError> {
        self.check()?;
        // A read is what resets the idle clock.
        Ok(self.region.entries.get(key).is_some())
    }

    fn remove(&self, key: &[u8]) -> Result<Option<Value>, ClusterError> {
        self.check()?;
        Ok(self.region.entries.remove(key).map(|v| self.read_out(v)))
    }

    fn clear(&self) -> Result<(), ClusterError> {
        self.check()?;
        self.region.entries.invalidate_all();
        Ok(())
    }

    fn entry_count(&self) -> Result<u64, ClusterError> {
        self.check()?;
        self.region.entries.run_pending_tasks();
        Ok(self.region.entries.entry_count())
    }

    fn is_destroyed(&self) -> bool {
        self.region.destroyed.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;

    fn policy(join_timeout_ms: u64) -> ConnectionPolicy {
        let config = ClientConfig::default().join_timeout(Duration::from_millis(join_timeout_ms));
        ConnectionPolicy::from_config(&config)
    }

    fn template() -> RegionTemplate {
        RegionTemplate::new(Duration::from_secs(60))
    }

    #[test]
    fn test_join_through_port_range() {
        let cluster = MemoryCluster::new();
        cluster.start_member("10.0.0.5:47503");

        let seeds = vec![ClusterEndpoint::with_range("10.0.0.5", 47500, 47509).unwrap()];
        assert!(cluster.connect(&seeds, &policy(100)).is_ok());
        assert_eq!(cluster.join_count(), 1);

        cluster.stop_member("10.0.0.5:47503");
        assert!(cluster.connect(&seeds, &policy(50)).is_err());
        assert_eq!(cluster.join_count(), 1);
    }

    #[test]
    fn test_join_timeout_is_bounded() {
        let cluster = MemoryCluster::new();
        let seeds = vec![ClusterEndpoint::new("10.0.0.9", 47500).unwrap()];

        let started = Instant::now();
        let err = cluster.connect(&seeds, &policy(150)).err().unwrap();
        let elapsed = started.elapsed();

        assert!(matches!(err, ClusterError::JoinTimeout { .. }));
        assert!(elapsed >= Duration::from_millis(150));
        assert!(elapsed < Duration::from_secs(2));
        assert_eq!(cluster.join_count(), 0);
    }

    #[test]
    fn test_member_started_during_join() {
        let cluster = MemoryCluster::new();
        let late = cluster.clone();
        let starter = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            late.start_member("node:1");
        });

        let seeds = vec![ClusterEndpoint::new("node", 1).unwrap()];
        assert!(cluster.connect(&seeds, &policy(2000)).is_ok());
        starter.join().unwrap();
    }

    #[test]
    fn test_destroy_invalidates_old_views() {
        let cluster = MemoryCluster::new();
        cluster.start_member("node:1");
        let conn = cluster
            .connect(&[ClusterEndpoint::new("node", 1).unwrap()], &policy(100))
            .unwrap();

        let sessions = conn.get_or_create_region("sessions", &template()).unwrap();
        let other = conn.get_or_create_region("other", &template()).unwrap();
        sessions.put(b"k", Arc::from(&b"v"[..])).unwrap();
        other.put(b"k", Arc::from(&b"w"[..])).unwrap();

        assert!(conn.destroy_region("sessions").unwrap());
        assert!(!conn.destroy_region("sessions").unwrap());
        assert!(sessions.is_destroyed());
        assert!(matches!(
            sessions.get(b"k"),
            Err(ClusterError::RegionDestroyed { .. })
        ));
        assert_eq!(other.get(b"k").unwrap().as_deref(), Some(&b"w"[..]));
        assert_eq!(cluster.region_names(), vec!["other".to_string()]);
    }

    #[test]
    fn test_copy_on_read() {
        let cluster = MemoryCluster::new();
        cluster.start_member("node:1");
        let conn = cluster
            .connect(&[ClusterEndpoint::new("node", 1).unwrap()], &policy(100))
            .unwrap();

        let shared = conn.get_or_create_region("shared", &template()).unwrap();
        let copied = conn
            .get_or_create_region("copied", &template().copy_on_read(true))
            .unwrap();
        let value: Value = Arc::from(&b"payload"[..]);
        shared.put(b"k", Arc::clone(&value)).unwrap();
        copied.put(b"k", Arc::clone(&value)).unwrap();

        assert!(Arc::ptr_eq(&shared.get(b"k").unwrap().unwrap(), &value));
        let read = copied.get(b"k").unwrap().unwrap();
        assert!(!Arc::ptr_eq(&read, &value));
        assert_eq!(read, value);
    }

    #[test]
    fn test_fault_hits_next_call_only() {
        let cluster = MemoryCluster::new();
        cluster.start_member("node:1");
        let conn = cluster
            .connect(&[ClusterEndpoint::new("node", 1).unwrap()], &policy(100))
            .unwrap();
        let region = conn.get_or_create_region("r", &template()).unwrap();

        cluster.inject_fault(Fault::Transient);
        assert!(matches!(region.get(b"k"), Err(ClusterError::Transient { .. })));
        assert!(region.get(b"k").unwrap().is_none());

        conn.disconnect();
        assert_eq!(region.get(b"k"), Err(ClusterError::Disconnected));
    }
}
