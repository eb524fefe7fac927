pub mod app;
pub mod keybinding_validator;
pub mod keybindings;
pub mod keybindings_default;
pub mod raster;
pub mod view;
