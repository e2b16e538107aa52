//! Interaction rules: behavior wiring between script and markup

pub mod click_without_keyboard;

pub use click_without_keyboard::ClickWithoutKeyboard;
