//! Resolution through the Windows debug-help library
//!
//! DbgHelp locates modules and reads their PDB data itself, so this resolver
//! needs neither the module enumerator nor the symbol cache. The process-wide
//! DbgHelp session is initialised on construction and cleaned up on drop.

#![allow(unsafe_code)] // DbgHelp is a C API

use std::ffi::CStr;
use std::mem;
use std::ptr;

use windows_sys::Win32::Foundation::HANDLE;
use windows_sys::Win32::System::Diagnostics::Debug::{
    SymCleanup, SymFromAddr, SymGetLineFromAddr64, SymGetOptions, SymInitialize, SymSetOptions,
    IMAGEHLP_LINE64, SYMBOL_INFO, SYMOPT_LOAD_LINES,
};
use windows_sys::Win32::System::Threading::GetCurrentProcess;

use super::resolver::SymbolResolver;
use crate::domain::{Address, ResolvedLocation, SymbolizeError};

const MAX_NAME_LEN: usize = 254;

pub struct DbgHelpResolver {
    process: HANDLE,
}

impl DbgHelpResolver {
    /// Start a DbgHelp session for the current process
    ///
    /// # Errors
    /// Returns an error if `SymInitialize` fails
    pub fn new() -> Result<Self, SymbolizeError> {
        // SAFETY: plain calls on the current-process pseudo handle
        unsafe {
            let process = GetCurrentProcess();
            if SymInitialize(process, ptr::null(), 1) == 0 {
                return Err(SymbolizeError::Io(std::io::Error::last_os_error()));
            }
            SymSetOptions(SymGetOptions() | SYMOPT_LOAD_LINES);
            Ok(Self { process })
        }
    }

    fn function_name(&self, addr: u64) -> Option<String> {
        // SYMBOL_INFO is followed in memory by the rest of its name buffer
        let words = (mem::size_of::<SYMBOL_INFO>() + MAX_NAME_LEN + 7) / 8;
        let mut buffer = vec![0u64; words];
        let info = buffer.as_mut_ptr().cast::<SYMBOL_INFO>();
        let mut displacement = 0u64;

        // SAFETY: `info` points at a zeroed, aligned buffer large enough for
        // the struct plus MAX_NAME_LEN name bytes
        unsafe {
            (*info).SizeOfStruct = mem::size_of::<SYMBOL_INFO>() as u32;
            (*info).MaxNameLen = MAX_NAME_LEN as u32;
            if SymFromAddr(self.process, addr, &mut displacement, info) == 0 {
                return None;
            }
            let len = ((*info).NameLen as usize).min(MAX_NAME_LEN);
            let name = std::slice::from_raw_parts((*info).Name.as_ptr().cast::<u8>(), len);
            Some(String::from_utf8_lossy(name).into_owned())
        }
    }

    fn source_line(&self, addr: u64) -> Option<(String, u32)> {
        let mut displacement = 0u32;
        // SAFETY: IMAGEHLP_LINE64 is plain data; DbgHelp fills it in
        unsafe {
            let mut line: IMAGEHLP_LINE64 = mem::zeroed();
            line.SizeOfStruct = mem::size_of::<IMAGEHLP_LINE64>() as u32;
            if SymGetLineFromAddr64(self.process, addr, &mut displacement, &mut line) == 0
                || line.FileName.is_null()
            {
                return None;
            }
            let file = CStr::from_ptr(line.FileName.cast::<std::ffi::c_char>()).to_string_lossy().into_owned();
            Some((file, line.LineNumber))
        }
    }
}

impl SymbolResolver for DbgHelpResolver {
    fn resolve(&mut self, addr: Address) -> Option<ResolvedLocation> {
        let function = self.function_name(addr.0);
        let (file, line) = match self.source_line(addr.0) {
            Some((file, line)) => (Some(file), Some(line)),
            None => (None, None),
        };
        let location = ResolvedLocation { file, line, function };
        (!location.is_empty()).then_some(location)
    }
}

impl Drop for DbgHelpResolver {
    fn drop(&mut self) {
        // SAFETY: the session was initialised in `new`
        unsafe {
            SymCleanup(self.process);
        }
    }
}
