//! Application state module

mod app_state;
pub mod autosave;
pub mod draft;
pub mod forms;

pub use app_state::*;
