// fh: client SDK for the fh backend platform.
//
// `Fh::init` performs the handshake that discovers the cloud host; afterwards
// `Fh::cloud` issues calls to it and `Fh::auth` runs auth policies. Every
// operation resolves to a `Response` envelope.

pub mod auth;
pub mod client;
pub mod cloud;
pub mod config;
pub mod context;
pub mod error;
pub mod executor;
pub mod identity;
pub mod redirect;
pub mod response;
pub mod routing;
pub mod session;
pub mod transport;

pub use auth::{AuthFlow, AuthState};
pub use client::{Fh, FhBuilder};
pub use cloud::CloudCaller;
pub use config::Config;
pub use context::SessionContext;
pub use error::{Error, ErrorKind, Result};
pub use executor::RequestExecutor;
pub use fh_protocol::AuthCredentials;
pub use identity::DeviceIdentity;
pub use response::{Outcome, Response};
pub use routing::RoutingProperties;
pub use session::{SessionManager, SessionState};
pub use transport::{Headers, HttpMethod, HttpRequest, HttpResponse, ReqwestTransport, Transport, TransportError};
