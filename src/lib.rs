//! Order Pad - waiter draft-order editing core.
//!
//! The in-memory staging area a waiter uses to assemble one table's order
//! before submitting it as a single batch: the menu catalog view (fetched
//! once per session), the draft store with its variant-merge rules, the
//! split editor for dividing a line into comment-distinguished parts, and
//! the full-replace submit to the order server.
//!
//! All real business logic (pricing, persistence, settlement) lives on
//! the backend; this crate is the terminal-side editing state and its
//! two network edges.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub mod api;
pub mod catalog;
pub mod draft;
pub mod orders;
pub mod session;
pub mod split;

pub use api::{ApiClient, ApiError, ServerConfig};
pub use catalog::{Category, CategoryType, Food, MenuCatalog};
pub use draft::{DraftLineItem, DraftOrder};
pub use orders::{OrderItem, OrderService};
pub use session::{PadSession, SubmitError};
pub use split::{SplitEditor, SplitError, SplitPart};

/// Initialize structured logging for a terminal process embedding this
/// crate. Honors `RUST_LOG`; defaults to info with debug for the crate.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,order_pad=debug"));

    let console_layer = fmt::layer().with_target(true);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .init();
}
