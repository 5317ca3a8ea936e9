pub mod overlay;
pub mod render;
pub mod shell;
