//! Capturing the current thread's call stack
//!
//! Capture is platform glue: glibc's `backtrace` family yields addresses
//! with preformatted text, Windows yields bare addresses. Both produce
//! [`StackFrame`]s in call order, innermost first.

#[cfg(all(target_os = "linux", target_env = "gnu"))]
mod execinfo;
#[cfg(windows)]
mod windows;

#[cfg(all(target_os = "linux", target_env = "gnu"))]
pub use execinfo::ExecinfoCapture;
#[cfg(windows)]
pub use windows::RtlCapture;

use crate::domain::{StackFrame, SymbolizeError};

/// Source of captured call stacks
pub trait StackCapture {
    /// Capture up to `max_frames` frames of the calling thread
    ///
    /// # Errors
    /// Returns [`SymbolizeError::CaptureFailed`] if no backtrace is available
    fn capture(&self, max_frames: usize) -> Result<Vec<StackFrame>, SymbolizeError>;
}

impl<C: StackCapture + ?Sized> StackCapture for Box<C> {
    fn capture(&self, max_frames: usize) -> Result<Vec<StackFrame>, SymbolizeError> {
        (**self).capture(max_frames)
    }
}

/// Frames captured earlier (or built by hand), replayed on every call
#[derive(Debug, Clone, Default)]
pub struct FixedCapture {
    frames: Vec<StackFrame>,
}

impl FixedCapture {
    #[must_use]
    pub fn new(frames: Vec<StackFrame>) -> Self {
        Self { frames }
    }
}

impl StackCapture for FixedCapture {
    fn capture(&self, max_frames: usize) -> Result<Vec<StackFrame>, SymbolizeError> {
        if self.frames.is_empty() {
            return Err(SymbolizeError::CaptureFailed);
        }
        Ok(self.frames.iter().take(max_frames).cloned().collect())
    }
}

/// Capture for platforms without a supported backtrace facility
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedCapture;

impl StackCapture for UnsupportedCapture {
    fn capture(&self, _max_frames: usize) -> Result<Vec<StackFrame>, SymbolizeError> {
        Err(SymbolizeError::CaptureFailed)
    }
}

/// The stack capture for the platform this crate was built for
#[must_use]
pub fn platform_capture() -> Box<dyn StackCapture> {
    #[cfg(all(target_os = "linux", target_env = "gnu"))]
    {
        Box::new(ExecinfoCapture)
    }
    #[cfg(windows)]
    {
        Box::new(RtlCapture)
    }
    #[cfg(not(any(all(target_os = "linux", target_env = "gnu"), windows)))]
    {
        Box::new(UnsupportedCapture)
    }
}
