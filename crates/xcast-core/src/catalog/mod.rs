//! Window discovery: which displays exist, which screens they serve, and
//! which windows on those screens are worth capturing.

mod discovery;
mod types;
mod walk;

pub use discovery::{Discovery, list_screens, probe_displays};
pub use types::{CatalogEntry, WindowFilter};
pub use walk::{CatalogWalk, describe_window, list_windows, window_title};
