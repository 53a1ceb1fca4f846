//! Application lifecycle
//!
//! # Phases
//!
//! ```text
//! 1. Configuration loading (JSON or YAML)
//!    ↓
//! 2. Graph construction from the registered roots
//!    ↓
//! 3. Factory methods on configuration beans
//!    ↓
//! 4. Collaborator start
//!    ↓
//! [Running...]  ← periodic reload, if enabled
//!    ↓
//! 5. Collaborator returns or shutdown signal (SIGTERM/SIGINT)
//! ```

mod application;
mod reload;
mod shutdown;
mod traits;

pub use application::{Application, ApplicationBuilder, exit_on_error};
pub use reload::spawn_reload_task;
pub use shutdown::shutdown_signal;
pub use traits::Collaborator;
