#![allow(unsafe_code)] // glibc execinfo is a C API

use std::ffi::{c_char, c_int, c_void, CStr};

use super::StackCapture;
use crate::domain::{StackFrame, SymbolizeError};

extern "C" {
    fn backtrace(buffer: *mut *mut c_void, size: c_int) -> c_int;
    fn backtrace_symbols(buffer: *const *mut c_void, size: c_int) -> *mut *mut c_char;
}

/// Capture through glibc's `backtrace` and `backtrace_symbols`
///
/// Each frame carries text like `./app(_Z3fooi+0x20) [0x4010a0]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecinfoCapture;

impl StackCapture for ExecinfoCapture {
    fn capture(&self, max_frames: usize) -> Result<Vec<StackFrame>, SymbolizeError> {
        if max_frames == 0 {
            return Ok(Vec::new());
        }

        let size = c_int::try_from(max_frames).unwrap_or(c_int::MAX);
        let mut buffer = vec![std::ptr::null_mut::<c_void>(); max_frames];
        // SAFETY: `buffer` holds at least `size` slots
        let captured = unsafe { backtrace(buffer.as_mut_ptr(), size) };
        let Ok(count) = usize::try_from(captured) else {
            return Err(SymbolizeError::CaptureFailed);
        };
        if count == 0 {
            return Err(SymbolizeError::CaptureFailed);
        }

        // SAFETY: the first `captured` slots were filled by `backtrace`
        let strings = unsafe { backtrace_symbols(buffer.as_ptr(), captured) };
        if strings.is_null() {
            return Err(SymbolizeError::CaptureFailed);
        }

        let frames = buffer[..count]
            .iter()
            .enumerate()
            .map(|(i, &ip)| {
                // SAFETY: `strings` holds `count` NUL-terminated entries
                let text = unsafe { CStr::from_ptr(*strings.add(i)) };
                StackFrame::with_text(ip as usize as u64, text.to_string_lossy())
            })
            .collect();

        // SAFETY: backtrace_symbols returns one malloc'd block
        unsafe { libc::free(strings.cast()) };
        Ok(frames)
    }
}
