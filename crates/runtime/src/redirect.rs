//! Interactive redirect surface for browser-based auth policies.
//!
//! The surface shows the platform's authorization URL and then reports every
//! URL it navigates to. It does not interpret those URLs; recognising the
//! completion marker is the SDK's job.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;

/// Stream of URLs the surface navigated to, in order.
///
/// The stream ending means the surface will report nothing further.
pub type Navigations = mpsc::UnboundedReceiver<String>;

pub trait RedirectSurface: Send + Sync {
	/// Shows `url` and returns the navigations that follow.
	fn present(&self, url: &str) -> Navigations;

	/// Closes the surface once the flow has completed.
	fn dismiss(&self) {}
}

#[derive(Debug, Default)]
struct RedirectState {
	sender: Option<mpsc::UnboundedSender<String>>,
	pending: Vec<String>,
	presented: Vec<String>,
	dismissals: usize,
}

/// Redirect surface fed from outside through a [`RedirectController`].
///
/// Hosts wire their own browser view (or a terminal prompt) to the controller;
/// tests use the controller to script navigations. Navigations sent before
/// `present` is called are buffered and replayed on presentation.
#[derive(Debug, Clone)]
pub struct ChannelRedirect {
	state: Arc<Mutex<RedirectState>>,
}

/// Handle used to report navigations to a [`ChannelRedirect`].
#[derive(Debug, Clone)]
pub struct RedirectController {
	state: Arc<Mutex<RedirectState>>,
}

impl ChannelRedirect {
	pub fn new() -> (Self, RedirectController) {
		let state = Arc::new(Mutex::new(RedirectState::default()));
		(Self { state: Arc::clone(&state) }, RedirectController { state })
	}
}

impl RedirectSurface for ChannelRedirect {
	fn present(&self, url: &str) -> Navigations {
		let (tx, rx) = mpsc::unbounded_channel();
		let mut state = self.state.lock();
		state.presented.push(url.to_string());
		for navigation in state.pending.drain(..) {
			let _ = tx.send(navigation);
		}
		state.sender = Some(tx);
		rx
	}

	fn dismiss(&self) {
		let mut state = self.state.lock();
		state.dismissals += 1;
		state.sender = None;
	}
}

impl RedirectController {
	/// Reports a navigation to `url`.
	pub fn navigate(&self, url: impl Into<String>) {
		let url = url.into();
		let mut state = self.state.lock();
		let delivered = match &state.sender {
			Some(sender) => sender.send(url.clone()).is_ok(),
			None => false,
		};
		if !delivered {
			state.pending.push(url);
		}
	}

	/// Ends the current navigation stream.
	pub fn close(&self) {
		self.state.lock().sender = None;
	}

	/// URLs presented so far.
	pub fn presented(&self) -> Vec<String> {
		self.state.lock().presented.clone()
	}

	pub fn dismissals(&self) -> usize {
		self.state.lock().dismissals
	}
}
