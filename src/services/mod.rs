//! Domain services used by websocket and HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own session persistence, cross-tab sync, interaction
//! routing, and content generation so route handlers stay focused on frame
//! translation. Leaves first: `bus` → `session` → `notifier`; `interaction`
//! and `voice` feed `desktop`; `prompt` and `webhook` feed `generation`.

pub mod bus;
pub mod desktop;
pub mod generation;
pub mod interaction;
pub mod notifier;
pub mod prompt;
pub mod session;
pub mod voice;
pub mod webhook;
