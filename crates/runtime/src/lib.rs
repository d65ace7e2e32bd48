//! Host-side collaborators consumed by `fh-sdk`.
//!
//! The SDK core never touches the disk, the network interface table or a UI
//! directly. It talks to three narrow contracts defined here:
//!
//! * [`KeyValueStore`] - device id, session token and handshake cache
//! * [`Reachability`] - online signal plus a one-shot watcher registration
//! * [`RedirectSurface`] - something that can show a URL and report where it
//!   navigated to (an embedded browser on mobile, a terminal prompt in the CLI)
//!
//! Each contract ships with the implementations a host usually needs.

pub mod reachability;
pub mod redirect;
pub mod storage;

pub use reachability::{ProbeReachability, Reachability, ReachabilityError, StaticReachability};
pub use redirect::{ChannelRedirect, Navigations, RedirectController, RedirectSurface};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError};
