//! The Linguist background process.
//!
//! UI contexts never touch storage or translators directly: they send named
//! requests to the background, which owns configuration, translator state
//! and caches.
//!
//! # Start-up
//!
//! [`Background::start`] runs once and moves through
//! [`LifecycleState`]s in order:
//!
//! 1. run persisted-state migrations
//! 2. build the configuration store
//! 3. build services and apply the translator set
//! 4. register every request handler, the readiness check (`ping`) last
//! 5. attach reactions to configuration changes
//!
//! Until step 4 completes every request, `ping` included, is answered with
//! `UnknownRequest`, so a successful `ping` means the background is ready.

pub mod client;
pub mod collaborators;
pub mod error;
pub mod handlers;
pub mod lifecycle;
pub mod router;
pub mod services;
pub mod state;

pub use client::BackgroundClient;
pub use collaborators::{Collaborators, ContextMenu, NoOpContextMenu, NoOpTheme, ThemeControl};
pub use error::{
    HandlerError, HandlerResult, LifecycleError, LifecycleResult, RequestError, RouterError, RouterResult,
};
pub use lifecycle::{Background, LifecycleState};
pub use router::{RequestHandler, Router};
pub use services::Services;
