//! Integration tests for the samplers.
//!
//! The samplers run against fake `SystemSource`, `ProxyHost` and
//! `RuntimeProbe` implementations that count how often they are queried,
//! so staleness caching and degradation are observable.

use async_trait::async_trait;
use proxy_usage_monitor::collectors::filesystem::FilesystemStats;
use proxy_usage_monitor::error::{HostError, PingError};
use proxy_usage_monitor::host::{BackendHandle, PlayerCounts, ProxyHost, StaticHost};
use proxy_usage_monitor::runtime::{HeapUsage, RuntimeProbe};
use proxy_usage_monitor::sample::ConnectionQuality;
use proxy_usage_monitor::samplers::{
    ConnectionQualitySampler, CpuSampler, DiskSampler, JvmSampler, MemorySampler, NetworkSampler,
};
use proxy_usage_monitor::system::{CpuStat, MemoryInfo, SystemSource};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

const GIB: u64 = 1024 * 1024 * 1024;

/// Host with fixed latencies per backend; `None` means unreachable.
/// With `stall_pings` set, no ping ever resolves.
struct CountingHost {
    backends: Vec<(BackendHandle, Option<Duration>, u32)>,
    counts: Result<PlayerCounts, ()>,
    stall_pings: bool,
    count_queries: AtomicUsize,
    pings: AtomicUsize,
}

impl CountingHost {
    fn new(latencies: &[Option<u64>]) -> Self {
        let backends = latencies
            .iter()
            .enumerate()
            .map(|(i, ms)| {
                (
                    BackendHandle {
                        name: format!("server-{}", i),
                        address: format!("127.0.0.1:{}", 25565 + i),
                    },
                    ms.map(Duration::from_millis),
                    0,
                )
            })
            .collect();
        Self {
            backends,
            counts: Ok(PlayerCounts { current: 50, max: 200 }),
            stall_pings: false,
            count_queries: AtomicUsize::new(0),
            pings: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ProxyHost for CountingHost {
    fn list_backends(&self) -> Vec<BackendHandle> {
        self.backends.iter().map(|(b, _, _)| b.clone()).collect()
    }

    async fn ping_backend(
        &self,
        backend: &BackendHandle,
        _timeout: Duration,
    ) -> Result<Duration, PingError> {
        self.pings.fetch_add(1, Ordering::SeqCst);
        if self.stall_pings {
            return std::future::pending().await;
        }
        let (_, latency, _) = self
            .backends
            .iter()
            .find(|(b, _, _)| b == backend)
            .ok_or_else(|| PingError::Unreachable(backend.name.clone()))?;
        latency.ok_or_else(|| PingError::Unreachable(backend.name.clone()))
    }

    fn current_player_counts(&self) -> Result<PlayerCounts, HostError> {
        self.count_queries.fetch_add(1, Ordering::SeqCst);
        self.counts
            .map_err(|_| HostError::Unavailable("proxy not ready".to_string()))
    }

    fn players_on(&self, backend: &BackendHandle) -> u32 {
        self.backends
            .iter()
            .find(|(b, _, _)| b == backend)
            .map(|(_, _, players)| *players)
            .unwrap_or(0)
    }
}

/// System whose readings are swapped in by the test.
struct ScriptedSystem {
    cpu: Mutex<CpuStat>,
    memory: Result<MemoryInfo, String>,
    volumes: Vec<FilesystemStats>,
}

impl SystemSource for ScriptedSystem {
    fn cpu_times(&self) -> Result<CpuStat, String> {
        Ok(*self.cpu.lock().unwrap())
    }

    fn memory(&self) -> Result<MemoryInfo, String> {
        self.memory.clone()
    }

    fn volumes(&self) -> Result<Vec<FilesystemStats>, String> {
        Ok(self.volumes.clone())
    }
}

fn volume(mount: &str, total_bytes: u64, available_bytes: u64) -> FilesystemStats {
    FilesystemStats {
        device: format!("/dev/{}", mount.trim_start_matches('/')),
        mount_point: mount.to_string(),
        fstype: "ext4".to_string(),
        total_bytes,
        available_bytes,
    }
}

fn cpu(busy: u64, idle: u64) -> CpuStat {
    CpuStat {
        user: busy,
        idle,
        ..Default::default()
    }
}

#[test]
fn test_network_sample_cached_within_window() {
    let host = Arc::new(CountingHost::new(&[Some(5), None]));
    let sampler = NetworkSampler::with_window(host.clone(), Duration::from_secs(5));
    let t0 = Instant::now();

    let first = sampler.sample_at(t0);
    assert_eq!(first.current_players, 50);
    assert_eq!(first.max_players, 200);
    assert_eq!(first.utilization_percent, 25.0);
    assert_eq!(first.total_servers, 2);

    let cached = sampler.sample_at(t0 + Duration::from_secs(4));
    assert_eq!(cached, first);
    assert_eq!(host.count_queries.load(Ordering::SeqCst), 1);

    sampler.sample_at(t0 + Duration::from_secs(5));
    assert_eq!(host.count_queries.load(Ordering::SeqCst), 2);
    assert_eq!(sampler.cache_counters(), (1, 2));
}

#[test]
fn test_network_counts_populated_backends_online() {
    let mut host = CountingHost::new(&[None, None, None]);
    host.backends[1].2 = 12;
    let sampler = NetworkSampler::new(Arc::new(host));

    let sample = sampler.sample();
    assert_eq!(sample.online_servers, 1);
    assert_eq!(sample.total_servers, 3);
}

#[test]
fn test_network_immediate_ping_failure_counts_offline() {
    // The fake resolves on first poll, like a cached ping result would.
    let host = CountingHost::new(&[Some(3), None]);
    let sampler = NetworkSampler::new(Arc::new(host));
    assert_eq!(sampler.sample().online_servers, 1);
}

#[test]
fn test_network_ping_in_flight_counts_online() {
    let mut host = CountingHost::new(&[None, None]);
    host.stall_pings = true;
    let host = Arc::new(host);
    let sample = NetworkSampler::new(host.clone()).sample();

    assert_eq!(sample.online_servers, 2);
    assert_eq!(sample.total_servers, 2);
    assert_eq!(host.pings.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_network_listening_backend_counts_online() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let host = StaticHost::new(
        vec![
            BackendHandle {
                name: "lobby".to_string(),
                address: addr.to_string(),
            },
            BackendHandle {
                name: "broken".to_string(),
                address: "not an address".to_string(),
            },
        ],
        100,
    );

    let sample = NetworkSampler::new(Arc::new(host)).sample();
    assert_eq!(sample.online_servers, 1);
    assert_eq!(sample.total_servers, 2);
}

#[test]
fn test_network_host_failure_yields_zero_and_is_not_cached() {
    let mut host = CountingHost::new(&[Some(3)]);
    host.counts = Err(());
    let host = Arc::new(host);
    let sampler = NetworkSampler::new(host.clone());
    let now = Instant::now();

    assert_eq!(sampler.sample_at(now), Default::default());
    sampler.sample_at(now);
    assert_eq!(host.count_queries.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_connection_quality_pings_at_most_three() {
    let host = Arc::new(CountingHost::new(&[Some(20), Some(40), None, Some(10)]));
    let sampler = ConnectionQualitySampler::new(host.clone());

    let sample = sampler.sample().await;
    assert_eq!(host.pings.load(Ordering::SeqCst), 3);
    assert_eq!(sample.average_ping_ms, 30.0);
    assert_eq!(sample.max_ping_ms, 40.0);
    assert_eq!(sample.quality, ConnectionQuality::Excellent);
    assert!((sample.packet_loss_percent - 100.0 / 3.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_connection_quality_unknown_without_successful_ping() {
    let host = Arc::new(CountingHost::new(&[None, None]));
    let sample = ConnectionQualitySampler::new(host).sample().await;

    assert_eq!(sample.average_ping_ms, -1.0);
    assert_eq!(sample.quality, ConnectionQuality::Unknown);
    assert_eq!(sample.packet_loss_percent, 100.0);
}

#[tokio::test]
async fn test_connection_quality_cached_within_window() {
    let host = Arc::new(CountingHost::new(&[Some(150)]));
    let sampler = ConnectionQualitySampler::with_window(host.clone(), Duration::from_secs(10));
    let t0 = Instant::now();

    let first = sampler.sample_at(t0).await;
    assert_eq!(first.quality, ConnectionQuality::Fair);
    let again = sampler.sample_at(t0 + Duration::from_secs(9)).await;
    assert_eq!(again, first);
    assert_eq!(host.pings.load(Ordering::SeqCst), 1);

    sampler.sample_at(t0 + Duration::from_secs(10)).await;
    assert_eq!(host.pings.load(Ordering::SeqCst), 2);
}

#[test]
fn test_cpu_load_is_a_clamped_delta() {
    let system = Arc::new(ScriptedSystem {
        cpu: Mutex::new(cpu(100, 100)),
        memory: Err("no meminfo".into()),
        volumes: Vec::new(),
    });
    let sampler = CpuSampler::new(system.clone());

    *system.cpu.lock().unwrap() = cpu(175, 125);
    assert_eq!(sampler.sample(), 0.75);

    // Counters going backwards must not produce a negative or NaN load.
    *system.cpu.lock().unwrap() = cpu(10, 10);
    let load = sampler.sample();
    assert!((0.0..=1.0).contains(&load));

    // No progress at all
    let load = sampler.sample();
    assert_eq!(load, 0.0);
}

#[test]
fn test_memory_failure_yields_zeroed_sample() {
    let system = Arc::new(ScriptedSystem {
        cpu: Mutex::new(CpuStat::default()),
        memory: Err("permission denied".into()),
        volumes: Vec::new(),
    });
    let sample = MemorySampler::new(system).sample();
    assert_eq!(sample.total_bytes, 0);
    assert_eq!(sample.usage_percent, 0.0);
}

#[test]
fn test_memory_example() {
    let system = Arc::new(ScriptedSystem {
        cpu: Mutex::new(CpuStat::default()),
        memory: Ok(MemoryInfo {
            total_bytes: 8 * GIB,
            available_bytes: GIB,
        }),
        volumes: Vec::new(),
    });
    let sample = MemorySampler::new(system).sample();
    assert_eq!(sample.used_bytes, 7 * GIB);
    assert_eq!(sample.usage_percent, 87.5);
}

#[test]
fn test_disk_without_capacity_is_excluded() {
    let system = Arc::new(ScriptedSystem {
        cpu: Mutex::new(CpuStat::default()),
        memory: Err("unused".into()),
        volumes: vec![
            volume("/", 100 * GIB, 40 * GIB),
            volume("/empty", 0, 0),
            volume("/broken", 10 * GIB, 20 * GIB),
            volume("/data", 200 * GIB, 20 * GIB),
        ],
    });
    let disks = DiskSampler::new(system).sample();

    let names: Vec<_> = disks.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["/", "/data"]);
    assert_eq!(disks[0].usage_percent, 60.0);
    assert_eq!(disks[1].usage_percent, 90.0);
    assert!(disks.iter().all(|d| (0.0..=100.0).contains(&d.usage_percent)));
}

/// Runtime whose thread count read always fails.
struct PartialRuntime {
    gc_reads: AtomicU64,
}

impl RuntimeProbe for PartialRuntime {
    fn heap(&self) -> Result<HeapUsage, String> {
        Ok(HeapUsage {
            used_bytes: 512 * 1024 * 1024,
            max_bytes: 2 * GIB,
        })
    }

    fn non_heap_used_bytes(&self) -> Result<u64, String> {
        Ok(64 * 1024 * 1024)
    }

    fn thread_count(&self) -> Result<u64, String> {
        Err("thread bean unavailable".into())
    }

    fn loaded_class_count(&self) -> Result<u64, String> {
        Ok(9000)
    }

    fn gc_collection_times_ms(&self) -> Result<Vec<i64>, String> {
        self.gc_reads.fetch_add(1, Ordering::SeqCst);
        Ok(vec![120, -1, 30])
    }
}

#[test]
fn test_jvm_sub_read_failure_defaults_field() {
    let runtime = Arc::new(PartialRuntime {
        gc_reads: AtomicU64::new(0),
    });
    let sample = JvmSampler::new(runtime.clone()).sample();

    assert_eq!(sample.heap_utilization_percent, 25.0);
    assert_eq!(sample.non_heap_used_mb, 64.0);
    assert_eq!(sample.thread_count, 0);
    assert_eq!(sample.loaded_class_count, 9000);
    assert_eq!(sample.total_gc_time_ms, 150);
    assert_eq!(runtime.gc_reads.load(Ordering::SeqCst), 1);
}
