//! Built-in producers for the engine's input models
//!
//! Heron's engine is parser-agnostic: anything that emits the markup,
//! behavior, and style models can feed it. These producers cover the plain
//! HTML / CSS / script case so a project can be analyzed end to end without
//! external tooling. They are deliberately tolerant; malformed input is
//! recorded as a parse error on the tree and analysis continues.

pub mod css;
pub mod html;
pub mod script;

pub use css::parse_stylesheet;
pub use html::parse_markup;
pub use script::{extract_behaviors, extract_inline_behaviors};
