//! Column layout of stage dependency graphs
//!
//! The engine turns a flat stage list into dependency columns; the renderer
//! turns a layout into terminal text.

mod engine;
mod render;

pub use engine::{
    compute_layout, compute_layout_with, Column, DanglingPolicy, Layout, LayoutError,
    LayoutOptions,
};
pub use render::render_text;
