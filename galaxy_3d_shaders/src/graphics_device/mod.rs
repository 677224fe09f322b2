/// Graphics device module - the device capability trait and the context shared on top of it

pub mod graphics_device;
pub mod context;

pub use graphics_device::*;
pub use context::*;

// Mock graphics device for tests (no GPU required)
#[cfg(test)]
pub mod mock_graphics_device;
