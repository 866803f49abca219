//! mdblocks core - block segmentation, rendering and the editing session
//!
//! This crate contains the editor logic, independent of terminal UI concerns:
//! - Block segmentation and classification
//! - Per-block HTML rendering with pluggable code, checklist and link preview renderers
//! - The editing session: focus state machine, keyboard commands, undo/redo history
//! - Link preview fetching (optional feature)
//! - Clipboard copy formatting (system clipboard behind an optional feature)
//! - Configuration management

pub mod block;
pub mod classify;
pub mod clipboard;
pub mod config;
pub mod doc;
pub mod editor;
pub mod fetch;
pub mod format;
pub mod history;
pub mod keyboard;
pub mod render;
pub mod table;

// Re-export commonly used types
pub use block::{segment, Block};
pub use classify::{classify, BlockType};
pub use config::Config;
pub use doc::Document;
pub use editor::{EditState, EditorSession, Motion, Surface};
pub use format::Format;
pub use keyboard::{handle_key, Key, KeyInput, KeyOutcome, Modifiers};
