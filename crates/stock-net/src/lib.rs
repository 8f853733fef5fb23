//! Networking module for Stock.
//!
//! This crate provides an asynchronous URL request session: callers submit
//! GETs from any thread, a fixed pool of worker threads performs them, and
//! each outcome is delivered to a per-request callback. Requests can be
//! canceled at any point before their callback runs, and dropping the session
//! cancels everything still outstanding.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::mpsc;
//! use stock_net::{Session, SessionConfig};
//!
//! let config = SessionConfig::builder().worker_count(2).build()?;
//! let session = Session::new(config)?;
//!
//! let (tx, rx) = mpsc::channel();
//! session.submit("https://example.com/", move |response| {
//!     let _ = tx.send(response);
//! });
//!
//! let response = rx.recv().unwrap();
//! if response.successful {
//!     println!("{}", response.text());
//! }
//! # Ok::<(), stock_net::SessionError>(())
//! ```
//!
//! Transfers are performed by a [`Transport`]. [`HttpTransport`] is used by
//! [`Session::new`]; [`Session::with_transport`] accepts any other
//! implementation, such as one built with [`transport::from_fn`].

mod config;
mod error;
mod request;
mod response;
mod session;
pub mod transport;

pub use config::{SessionConfig, SessionConfigBuilder};
pub use error::{NetworkError, Result, SessionError};
pub use request::{CompletionCallback, RequestHandle};
pub use response::Response;
pub use session::Session;
pub use transport::{HttpTransport, HttpTransportBuilder, Transport};
