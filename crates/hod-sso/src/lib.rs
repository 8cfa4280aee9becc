#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions)]

//! Single sign-on combined-token acquisition for Haven OnDemand.
//!
//! A page without its own credential asks the application backend for signed
//! request descriptors, replays them against HOD with the browser's session
//! cookie, and ends up with a combined token (or an error, or a redirect to the
//! SSO page when the session cookie is missing).
//!
//! Layout:
//! - `query.rs`: query-string parsing/building with multi-value support
//! - `model.rs`: descriptors, list-applications entries, flow output
//! - `error.rs`: flow error taxonomy plus transport/config errors
//! - `config.rs`: authenticate/logout options and their defaults
//! - `transport.rs`: HTTP and navigation seams
//! - `executor.rs`: signed request execution and backend descriptor fetches
//! - `page.rs`: page URL inspection and SSO redirect targets
//! - `flow.rs`: the authentication state machine
//! - `logout.rs`: combined token invalidation
//! - `http.rs` / `browser.rs`: native and `wasm32` transports

pub mod config;
pub mod error;
pub mod executor;
pub mod flow;
pub mod logout;
pub mod model;
pub mod page;
pub mod query;
pub mod transport;

#[cfg(not(target_arch = "wasm32"))]
pub mod http;

#[cfg(target_arch = "wasm32")]
pub mod browser;

pub use config::{AuthenticateOptions, LogoutOptions, RoundTripPolicy};
pub use error::{ConfigError, SsoError, SsoErrorKind, SsoResult, TransportError};
pub use flow::{AuthenticationFlow, FlowOutcome, FlowState, authenticate};
pub use logout::logout;
pub use model::{
    Account, Application, AuthenticateOutput, CombinedToken, HttpMethod, SignedRequest,
    UserStore, UserToken,
};
pub use query::QueryParameters;
pub use transport::{HttpRequest, HttpResponse, HttpTransport, Navigator};

#[cfg(not(target_arch = "wasm32"))]
pub use http::ReqwestTransport;

/// Error code HOD returns when the request carried no usable SSO session.
pub const NO_USER_TOKEN_CODE: i64 = 12_102;
