//! Config documents and value injection
//!
//! A [`ConfigStore`] holds one JSON document (YAML is normalised on load) and
//! resolves dotted key paths. Fields bound to a key go through the
//! [`ValueBeanCache`], which keeps one [`ValueBean`] per `(key, default)` so
//! that every field reading the same key shares its converted value and is
//! refreshed together on reload.

mod cache;
mod convert;
mod path;
mod store;
mod value_bean;

pub use cache::{Propagation, ValueBeanCache};
pub use convert::{FromConfig, TIME_FORMAT};
pub use path::{lookup, segments};
pub use store::{ConfigFormat, ConfigSource, ConfigStore, parse, parse_literal, resolve};
pub use value_bean::{ValueBean, convert};
