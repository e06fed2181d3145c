//! skrevo: a distraction-reduced terminal editor for free writing.
//!
//! The document is a list of lines, optionally tagged with a `(A) ` style
//! priority. A background worker saves it periodically while the terminal
//! session edits it.

pub mod autosave;
pub mod config;
pub mod context;
pub mod document;
pub mod error;
pub mod keys;
pub mod logging;
pub mod paths;
pub mod session;
pub mod theme;
pub mod ui;
pub mod wrap;
