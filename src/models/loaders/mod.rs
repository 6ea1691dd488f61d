pub mod selectors_loader;

pub use selectors_loader::{apply_overrides, load_selector_overrides, SelectorOverrides};
