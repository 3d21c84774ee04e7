//! Umbra UI
//!
//! Toolbar widgets driven by text templates. Templates such as
//! `[cpu.usage] > 80 ? "hot" : "ok"` are evaluated lazily against a
//! registry of placeholders that providers refresh on a tick. Widgets are
//! laid out in a styled node tree and turned into a flat draw list for the
//! host to paint.

pub mod config;
pub mod cvars;
pub mod dump;
pub mod error;
pub mod event;
pub mod node;
pub mod placeholder;
pub mod render;
pub mod script;
pub mod session;
pub mod style;
pub mod widget;

pub use error::{Error, Result};
pub use node::{NodeId, NodeTree};
pub use session::{Session, SessionBuilder};
