use std::sync::Arc;

use screener_events::{EventBus, Mailer};

use crate::config::ServerConfig;
use crate::uploads::ImageHostClient;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; everything heavy sits behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: screener_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Event bus; handlers publish after their writes commit.
    pub event_bus: Arc<EventBus>,
    /// Outbound email. `None` when SMTP is not configured.
    pub mailer: Option<Arc<dyn Mailer>>,
    /// Image host client. `None` when uploads are not configured.
    pub image_host: Option<Arc<ImageHostClient>>,
}
