//! Structure rules: markup naming, alternatives, and ARIA usage

pub mod aria_attr;
pub mod aria_ref;
pub mod control_name;
pub mod img_alt;
pub mod positive_tabindex;

pub use aria_attr::AriaAttr;
pub use aria_ref::AriaRef;
pub use control_name::ControlName;
pub use img_alt::ImgAlt;
pub use positive_tabindex::PositiveTabindex;
