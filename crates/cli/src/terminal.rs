//! Redirect surface for a terminal session.
//!
//! Prints the authorization URL and treats every line typed on stdin as a URL
//! the browser landed on. Closing stdin ends the navigation stream.

use std::io::BufRead;

use fh_runtime::{ChannelRedirect, Navigations, RedirectController, RedirectSurface};
use tracing::debug;

pub struct TerminalRedirect {
	inner: ChannelRedirect,
	controller: RedirectController,
}

impl TerminalRedirect {
	pub fn new() -> Self {
		let (inner, controller) = ChannelRedirect::new();
		Self { inner, controller }
	}
}

impl Default for TerminalRedirect {
	fn default() -> Self {
		Self::new()
	}
}

/// Feeds non-empty lines from `input` to `controller`, then closes it.
pub fn forward_lines(input: impl BufRead, controller: &RedirectController) {
	for line in input.lines() {
		let Ok(line) = line else { break };
		let url = line.trim();
		if !url.is_empty() {
			debug!(target: "fh.cli", url, "navigation reported");
			controller.navigate(url);
		}
	}
	controller.close();
}

impl RedirectSurface for TerminalRedirect {
	fn present(&self, url: &str) -> Navigations {
		eprintln!("Open this URL in a browser to authenticate:\n\n  {url}\n");
		eprintln!("Then paste the URL the browser was redirected to:");

		let navigations = self.inner.present(url);
		let controller = self.controller.clone();
		// Detached: a blocked stdin read must not hold up process exit.
		std::thread::spawn(move || forward_lines(std::io::stdin().lock(), &controller));
		navigations
	}

	fn dismiss(&self) {
		self.inner.dismiss();
		eprintln!("Authentication complete.");
	}
}

#[cfg(test)]
mod tests {
	use std::io::Cursor;

	use super::*;

	#[tokio::test]
	async fn lines_become_navigations() {
		let (surface, controller) = ChannelRedirect::new();
		let mut navigations = surface.present("https://auth");

		forward_lines(Cursor::new("\nhttps://app/cb?status=pending\n  https://app/cb?status=complete  \n"), &controller);

		assert_eq!(navigations.recv().await.as_deref(), Some("https://app/cb?status=pending"));
		assert_eq!(navigations.recv().await.as_deref(), Some("https://app/cb?status=complete"));
		assert_eq!(navigations.recv().await, None);
	}
}
