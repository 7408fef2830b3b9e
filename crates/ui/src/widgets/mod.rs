pub mod frame;
pub mod overlay;
pub mod popup;
