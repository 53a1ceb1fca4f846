//! # Wirebean
//!
//! A bean container for service applications: it builds an object graph from
//! a root type, wiring dependency fields and config values without runtime
//! reflection.
//!
//! ## Features
//!
//! - **Role classification**: beans are configurations, controllers,
//!   middlewares, routers, repositories, tests or plain components, decided
//!   by an explicit tag or by the marker types a struct embeds
//! - **Value injection**: fields bound to dotted config keys (`app.port`)
//!   with defaults, shared per key and refreshed on reload
//! - **Factory methods**: configuration beans produce further beans, re-run
//!   when the values they read change
//! - **Axum integration**: [`Inject<T>`] resolves beans in handlers
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use wirebean::prelude::*;
//!
//! #[derive(Default, Bean)]
//! struct RedisConfig {
//!     marker: Configuration,
//!     #[bean(value = "rady.redis.host", default = "127.0.0.1")]
//!     host: String,
//!     #[bean(value = "rady.redis.port", default = "6379")]
//!     port: Value<u16>,
//! }
//!
//! #[derive(Default, Bean)]
//! struct UserController {
//!     marker: Controller,
//!     redis: Autowired<RedisConfig>,
//! }
//!
//! #[derive(Default, Bean)]
//! struct App {
//!     #[bean(prefix = "/users")]
//!     users: Autowired<UserController>,
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     wirebean::logging::init(None);
//!
//!     let app = Application::builder()
//!         .config_file("config.yaml")
//!         .root::<App>()
//!         .build_or_exit();
//!
//!     for controller in app.controllers() {
//!         tracing::info!("{} mounted at {:?}", controller.name, controller.prefix);
//!     }
//! }
//! ```

pub mod config;
pub mod di;
pub mod error;
pub mod lifecycle;
pub mod logging;
pub mod role;

// Re-export core types
pub use config::{ConfigFormat, ConfigSource, ConfigStore, FromConfig};
pub use di::{
    Autowired, Bean, BeanRef, Container, EntityType, EntityTypes, Factory, FactorySpec,
    HasContainer, Inject, ReloadSummary, Shared, Tag, TypeDef, TypeInfo, Value,
};
pub use error::{ConfigError, Result, WireError};
pub use lifecycle::{Application, ApplicationBuilder, Collaborator};
pub use role::{
    Component, Configuration, Controller, Entities, Middleware, Parameter, Repository, Role,
    Router, Testing,
};

// Re-export macros
pub use wirebean_macro::Bean as DeriveBean;

// Re-export commonly used types from dependencies
pub use async_trait::async_trait;
pub use axum;

/// Prelude module for convenient imports
///
/// ```
/// use wirebean::prelude::*;
/// ```
pub mod prelude {
    pub use crate::DeriveBean as Bean;
    pub use crate::config::{ConfigFormat, ConfigSource, ConfigStore, FromConfig};
    pub use crate::di::{
        Autowired, Bean, BeanRef, Container, EntityTypes, HasContainer, Inject, Shared, Tag, TypeDef,
        Value,
    };
    pub use crate::error::{Result, WireError};
    pub use crate::lifecycle::{Application, ApplicationBuilder, Collaborator, shutdown_signal};
    pub use crate::role::{
        Component, Configuration, Controller, Entities, Middleware, Parameter, Repository, Role,
        Router, Testing,
    };
    pub use async_trait::async_trait;
    pub use std::sync::Arc;
}
