/// Graphics context - a graphics device plus the binding state tracked on top of it
///
/// The context is shared by every object that issues GPU calls (shader
/// manager, linked shaders, buffers) as a [`SharedGraphicsContext`]. The
/// `Rc<RefCell<_>>` sharing keeps the whole subsystem `!Send`: graphics calls
/// stay on the thread that owns the context.

use std::cell::RefCell;
use std::rc::Rc;
use crate::graphics_device::{GraphicsDevice, ProgramHandle, DeviceLimits};

/// Shared, single-threaded handle to a graphics context
pub type SharedGraphicsContext = Rc<RefCell<GraphicsContext>>;

/// Binding statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContextStats {
    /// Number of `use_program` calls actually issued to the device
    pub program_binds: u64,
    /// Number of binds elided because the program was already current
    pub redundant_binds_skipped: u64,
}

/// A graphics device and the program currently bound on it
pub struct GraphicsContext {
    device: Box<dyn GraphicsDevice>,
    bound_program: Option<ProgramHandle>,
    stats: ContextStats,
}

impl GraphicsContext {
    /// Wrap a device (no program bound)
    pub fn new<D: GraphicsDevice + 'static>(device: D) -> Self {
        Self {
            device: Box::new(device),
            bound_program: None,
            stats: ContextStats::default(),
        }
    }

    /// Wrap a device in a shared handle
    pub fn shared<D: GraphicsDevice + 'static>(device: D) -> SharedGraphicsContext {
        Rc::new(RefCell::new(Self::new(device)))
    }

    /// Access the underlying device
    pub fn device(&mut self) -> &mut dyn GraphicsDevice {
        self.device.as_mut()
    }

    /// Implementation limits of the device
    pub fn limits(&self) -> DeviceLimits {
        self.device.limits()
    }

    /// Bind a program unless it is already the current one
    ///
    /// Returns `true` if a device call was issued.
    pub fn bind_program(&mut self, program: ProgramHandle) -> bool {
        if self.bound_program == Some(program) {
            self.stats.redundant_binds_skipped += 1;
            return false;
        }

        self.device.use_program(Some(program));
        self.bound_program = Some(program);
        self.stats.program_binds += 1;
        true
    }

    /// Unbind whatever program is current and reset the tracking
    pub fn unbind_program(&mut self) {
        self.device.use_program(None);
        self.bound_program = None;
    }

    /// Program currently bound through this context
    pub fn bound_program(&self) -> Option<ProgramHandle> {
        self.bound_program
    }

    /// Forget a program that is about to be deleted
    ///
    /// Drivers recycle program names, so a stale entry would make the next
    /// program with the same name skip its bind.
    pub(crate) fn forget_program(&mut self, program: ProgramHandle) {
        if self.bound_program == Some(program) {
            self.bound_program = None;
        }
    }

    /// Binding statistics since creation
    pub fn stats(&self) -> ContextStats {
        self.stats
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
