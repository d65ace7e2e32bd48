//! Network reachability signal.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tracing::{debug, info};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReachabilityError {
	#[error("Unable to start Reachability notifier: {0}")]
	Unavailable(String),
}

/// Online/offline signal consulted before every request.
pub trait Reachability: Send + Sync {
	/// Returns `true` when the platform should be considered reachable.
	fn is_online(&self) -> bool;

	/// Registers for connectivity change notifications.
	fn start_watching(&self) -> Result<(), ReachabilityError>;
}

/// Reachability driven entirely by the host.
///
/// Useful when the platform already exposes a connectivity callback, and in
/// tests.
#[derive(Debug)]
pub struct StaticReachability {
	online: AtomicBool,
	fail_watch: bool,
	watch_starts: AtomicUsize,
}

impl StaticReachability {
	pub fn online() -> Self {
		Self::with_state(true, false)
	}

	pub fn offline() -> Self {
		Self::with_state(false, false)
	}

	/// A signal whose watcher registration always fails.
	pub fn failing_watcher() -> Self {
		Self::with_state(true, true)
	}

	fn with_state(online: bool, fail_watch: bool) -> Self {
		Self {
			online: AtomicBool::new(online),
			fail_watch,
			watch_starts: AtomicUsize::new(0),
		}
	}

	pub fn set_online(&self, online: bool) {
		self.online.store(online, Ordering::SeqCst);
	}

	/// Number of `start_watching` calls observed, failed ones included.
	pub fn watch_starts(&self) -> usize {
		self.watch_starts.load(Ordering::SeqCst)
	}
}

impl Default for StaticReachability {
	fn default() -> Self {
		Self::online()
	}
}

impl Reachability for StaticReachability {
	fn is_online(&self) -> bool {
		self.online.load(Ordering::SeqCst)
	}

	fn start_watching(&self) -> Result<(), ReachabilityError> {
		self.watch_starts.fetch_add(1, Ordering::SeqCst);
		if self.fail_watch {
			return Err(ReachabilityError::Unavailable("watcher disabled".into()));
		}
		Ok(())
	}
}

/// Reachability that periodically opens a TCP connection to `addr`.
///
/// Reports online until the first probe completes. The probe loop runs on the
/// ambient tokio runtime and stops when the value is dropped.
#[derive(Debug)]
pub struct ProbeReachability {
	addr: String,
	interval: Duration,
	online: Arc<AtomicBool>,
	task: Mutex<Option<JoinHandle<()>>>,
}

impl ProbeReachability {
	pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(15);

	/// Creates a probe for a `host:port` address.
	pub fn new(addr: impl Into<String>, interval: Duration) -> Self {
		Self {
			addr: addr.into(),
			interval,
			online: Arc::new(AtomicBool::new(true)),
			task: Mutex::new(None),
		}
	}

	pub fn addr(&self) -> &str {
		&self.addr
	}
}

/// Returns `true` when a TCP connection to `addr` opens within `timeout`.
pub async fn probe(addr: &str, timeout: Duration) -> bool {
	matches!(tokio::time::timeout(timeout, TcpStream::connect(addr)).await, Ok(Ok(_)))
}

impl Reachability for ProbeReachability {
	fn is_online(&self) -> bool {
		self.online.load(Ordering::SeqCst)
	}

	fn start_watching(&self) -> Result<(), ReachabilityError> {
		let mut task = self.task.lock();
		if task.is_some() {
			return Ok(());
		}

		let handle = tokio::runtime::Handle::try_current().map_err(|err| ReachabilityError::Unavailable(err.to_string()))?;
		let addr = self.addr.clone();
		let interval = self.interval;
		let online = Arc::clone(&self.online);

		info!(target: "fh.reach", %addr, interval_ms = interval.as_millis() as u64, "reachability watcher started");
		*task = Some(handle.spawn(async move {
			loop {
				let reachable = probe(&addr, interval).await;
				let previous = online.swap(reachable, Ordering::SeqCst);
				if previous != reachable {
					info!(target: "fh.reach", %addr, online = reachable, "reachability changed");
				} else {
					debug!(target: "fh.reach", %addr, online = reachable, "probe");
				}
				tokio::time::sleep(interval).await;
			}
		}));
		Ok(())
	}
}

impl Drop for ProbeReachability {
	fn drop(&mut self) {
		if let Some(task) = self.task.get_mut().take() {
			task.abort();
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn static_signal_counts_watch_starts() {
		let reach = StaticReachability::online();
		assert!(reach.is_online());
		reach.start_watching().unwrap();
		reach.set_online(false);
		assert!(!reach.is_online());
		assert_eq!(reach.watch_starts(), 1);
	}

	#[test]
	fn failing_watcher_reports_error() {
		let reach = StaticReachability::failing_watcher();
		assert!(reach.start_watching().is_err());
		assert_eq!(reach.watch_starts(), 1);
	}

	#[test]
	fn probe_requires_runtime() {
		let reach = ProbeReachability::new("127.0.0.1:1", Duration::from_millis(10));
		assert!(reach.start_watching().is_err());
	}

	#[tokio::test]
	async fn probe_sees_listener_then_absence() {
		let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
		let addr = listener.local_addr().unwrap().to_string();
		assert!(probe(&addr, Duration::from_millis(500)).await);
		drop(listener);
		assert!(!probe(&addr, Duration::from_millis(500)).await);
	}

	#[tokio::test]
	async fn probe_watcher_flips_to_offline() {
		let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
		let addr = listener.local_addr().unwrap().to_string();
		drop(listener);

		let reach = ProbeReachability::new(addr, Duration::from_millis(20));
		assert!(reach.is_online());
		reach.start_watching().unwrap();
		reach.start_watching().unwrap();

		for _ in 0..50 {
			if !reach.is_online() {
				break;
			}
			tokio::time::sleep(Duration::from_millis(20)).await;
		}
		assert!(!reach.is_online());
	}
}
