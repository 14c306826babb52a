//! Client for the ConfigHub configuration service. Pull the properties and
//! files resolved for a context, read them as typed values, and push changes
//! back.
//!
//! ```ignore
//! let mut hub = ConfigHub::builder()
//!     .token(&token)
//!     .context("Production;Billing")
//!     .application_name("billing")
//!     .build()?;
//! hub.pull()?;
//!
//! let port = hub.properties().get_integer_or("db.port", 5432)?;
//! hub.files().write_to_local("server/conf/tomee.xml", Path::new("conf/tomee.xml"))?;
//! ```
//!
//! # Sessions
//!
//! A [`ConfigHub`] session is bound to one repository and one context. It
//! authenticates either with a repository token or with an account and
//! repository name, never both. [`ConfigHubBuilder::build()`] enforces this
//! and rejects blank parameters before anything touches the network.
//!
//! Each pull sends the context, optional tag or date, and any security-group
//! passwords the service needs to decrypt values. The response is checked
//! (context, server error) and decoded into fresh tables. The session's
//! tables are swapped only when the whole payload decodes, so a failed pull
//! leaves the previous configuration readable.
//!
//! # Typed values
//!
//! Every property carries a declared type. Its value is decoded into a
//! [`Value`] variant at pull time, and accessors like
//! [`Properties::get_integer`] convert from the stored variant:
//!
//! - Numeric kinds convert between each other.
//! - Text parses into the requested kind, failing with
//!   [`ConfigHubError::Format`] when it doesn't parse.
//! - Anything else is a [`ConfigHubError::TypeMismatch`].
//!
//! Each accessor has an `_or` twin that returns a default when the key is
//! absent. A conversion error is still an error in the default form; the
//! default only covers absence.
//!
//! Reading a deprecated property logs a warning and returns the value.
//!
//! # Files
//!
//! Resolved configuration files come back next to properties as plain text
//! keyed by repository path. [`Files::write_to_local`] drops one onto disk.
//!
//! # Pushing
//!
//! [`ConfigHub::push_queue`] collects key changes ([`Key`]): a value per
//! context, plus readme, type, deprecation and security-group edits.
//! [`ConfigHub::flush`] sends them in one request and always empties the
//! queue. Its [`PushResponse`] carries the status and the service's message.
//!
//! # Offline snapshots
//!
//! [`ConfigHub::to_file`] saves the last pulled document as pretty JSON and
//! [`ConfigHub::from_file`] loads it back through the same decode path, so an
//! application can start from a snapshot when the service is unreachable.
//!
//! # Settings and CLI
//!
//! Connection parameters can come from a `confighub.toml` file and
//! `CONFIGHUB_*` environment variables via [`Settings`] (built on
//! [confique](https://docs.rs/confique)). With the `clap` feature (on by
//! default), `ConnectionArgs` adds the same parameters as command-line flags.
//!
//! # Transport
//!
//! Requests go through the [`Transport`] trait. [`HttpTransport`] is the
//! default blocking HTTP implementation. Supply your own with
//! [`ConfigHubBuilder::transport`] to proxy, record, or stub the service.
//!
//! # Logging
//!
//! The crate emits [`tracing`](https://docs.rs/tracing) events and never
//! installs a subscriber.
//!
//! # Error handling
//!
//! All fallible operations return [`ConfigHubError`]. See the [`error`]
//! module for the full set.

pub mod error;
pub mod types;

#[cfg(feature = "clap")]
mod cli;
mod client;
mod files;
mod properties;
mod push;
mod settings;
mod snapshot;
mod transport;
mod value;

#[cfg(test)]
mod fixtures;

#[cfg(feature = "clap")]
pub use cli::ConnectionArgs;
pub use client::{CLIENT_VERSION, ConfigHub, ConfigHubBuilder};
pub use error::ConfigHubError;
pub use files::Files;
pub use properties::Properties;
pub use push::{Key, PushQueue, PushResponse, PushValue};
pub use settings::{SETTINGS_FILE, Settings, default_path};
pub use snapshot::Snapshot;
pub use transport::{HttpTransport, Method, Request, Response, Transport, TransportError};
pub use types::{Auth, ValueDataType};
pub use value::{FromValue, Property, Value, ValueKind};
