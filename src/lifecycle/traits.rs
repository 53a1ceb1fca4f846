//! Collaborator contract
//!
//! A collaborator is whatever the application hands control to once the bean
//! graph is ready: an HTTP server, a job runner, a test harness.

use super::Application;
use async_trait::async_trait;
use std::sync::Arc;

/// Consumer of a built [`Application`].
///
/// # Example
///
/// ```rust,ignore
/// use wirebean::lifecycle::{Application, Collaborator};
/// use async_trait::async_trait;
///
/// struct HttpServer;
///
/// #[async_trait]
/// impl Collaborator for HttpServer {
///     async fn start(&self, app: Arc<Application>) -> anyhow::Result<()> {
///         for controller in app.controllers() {
///             tracing::info!("Mount {} at {:?}", controller.name, controller.prefix);
///         }
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Collaborator: Send + Sync {
    /// Name used in startup logs
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Run until done. Returning ends [`Application::run`].
    async fn start(&self, app: Arc<Application>) -> anyhow::Result<()>;
}
