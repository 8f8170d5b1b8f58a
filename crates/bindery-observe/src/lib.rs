#![forbid(unsafe_code)]

//! Member resolution and path observation for Bindery.
//!
//! This crate provides:
//! - [`MemberResolver`] mapping `(type, segment)` to member descriptors, with
//!   an attached-member overlay and layered caches
//! - [`MemberPath`] parsing of binding expressions such as `Parent.Items[2].Name`
//! - [`PathObserver`] keeping a weak, self-updating view of a path on a live
//!   object graph
//! - [`ObserverProvider`] choosing and wiring the observer variant
//! - [`ObserverConfig`] defaults, loadable from TOML or JSON with the
//!   `config` feature

pub mod config;
pub mod observer;
pub mod path;
pub mod provider;
pub mod resolver;

pub use config::ObserverConfig;
#[cfg(feature = "config")]
pub use config::ConfigError;
pub use observer::{
    LastMember, ObserverFlags, ObserverKind, ObserverListener, PathMembers, PathObserver,
    Resolution,
};
pub use path::{MemberPath, PathKind};
pub use provider::ObserverProvider;
pub use resolver::{MemberResolver, ResolverStats};
