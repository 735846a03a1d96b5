#![allow(unsafe_code)] // RtlCaptureStackBackTrace is a C API

use std::ffi::c_void;

use windows_sys::Win32::System::Diagnostics::Debug::RtlCaptureStackBackTrace;

use super::StackCapture;
use crate::domain::{StackFrame, SymbolizeError};

/// Capture through `RtlCaptureStackBackTrace`; frames carry no text
#[derive(Debug, Clone, Copy, Default)]
pub struct RtlCapture;

impl StackCapture for RtlCapture {
    fn capture(&self, max_frames: usize) -> Result<Vec<StackFrame>, SymbolizeError> {
        let size = u32::try_from(max_frames).unwrap_or(u32::MAX);
        let mut buffer = vec![std::ptr::null_mut::<c_void>(); max_frames];
        // SAFETY: `buffer` holds `size` slots; the hash output is optional
        let captured = unsafe {
            RtlCaptureStackBackTrace(0, size, buffer.as_mut_ptr(), std::ptr::null_mut())
        };
        if captured == 0 {
            return Err(SymbolizeError::CaptureFailed);
        }

        Ok(buffer[..usize::from(captured)]
            .iter()
            .map(|&ip| StackFrame::from_address(ip as usize as u64))
            .collect())
    }
}
