//! Form rendering module
//!
//! - `field_renderer`: single field and attachment slot widgets
//! - `step_form`: the current step's fields laid out with scrolling

mod field_renderer;
mod step_form;

pub use step_form::draw_step_form;
