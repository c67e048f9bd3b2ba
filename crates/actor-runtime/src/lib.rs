//! # Actor Runtime
//!
//! Runtime infrastructure for the modem actors.
//!
//! This crate defines:
//! - **Actor trait**: Base trait for all actors with lifecycle methods
//! - **Channel management**: Type-safe message routing between actors
//! - **Logging macros**: `actor_debug!`, `actor_info!`, `actor_warn!`, `actor_error!`
//!
//! ## Architecture
//!
//! The actor runtime follows these principles:
//! - **Zero shared state**: Each actor owns its data
//! - **Message passing**: Actors communicate via typed messages
//! - **Sequential processing**: Messages are handled one at a time
//! - **Failure isolation**: Actor errors don't crash the system
//!
//! ## Example
//!
//! ```ignore
//! use actor_runtime::{Actor, ChannelManager};
//!
//! let (mut manager, handles) = ChannelManager::new();
//!
//! let session = SessionActor::new(handles.event_tx.clone());
//! tokio::spawn(session.run(handles.session_rx, handles.event_tx.clone()));
//!
//! manager.send_command(ModemCommand::SetPduMode).await?;
//! let messages = manager.drain().await?;
//! ```

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing,
    clippy::todo
)]

pub mod actor;
pub mod channels;
pub mod logging;

pub use actor::Actor;
pub use channels::{ActorHandles, ChannelManager, PortMessage, SessionMessage};
