//! v4l2loopback virtual camera devices.
//!
//! Listing goes through `v4l2-ctl`, configuration reloads the kernel module
//! with `modprobe` (which needs root).

mod errors;
mod operations;
mod types;

pub use errors::DeviceError;
pub use operations::{
    configure_devices, list_devices, modprobe_args, module_available, module_loaded,
    parse_device_listing, parse_proc_modules, validate_labels,
};
pub use types::{LOOPBACK_MARKER, LoopbackDevice, MODULE_NAME};
