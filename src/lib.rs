pub mod api;
pub mod config;
pub mod internal;
pub mod launch;
pub mod tui;

pub use internal::models::{Bitmap, ReferenceSource};
pub use internal::overlay::{OverlayMode, OverlayState};
pub use internal::resolver::ResolveError;
pub use internal::ui::app::compare_with;
