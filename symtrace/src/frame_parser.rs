//! Parsing of textual backtrace records
//!
//! glibc's `backtrace_symbols` renders each frame as
//! `module(mangled+offset) [address]`. The name and offset are optional
//! (`./app() [0x4010a0]`, `./app(+0x1a) [0x4010a0]`), the address is not.

use crate::domain::Address;

/// Return the text strictly between the first `start` and the first `end`.
///
/// `end` is searched from the beginning of the line, not after `start`.
/// If `start` is missing, `end` is missing, or `end` comes before `start`,
/// the result is empty.
#[must_use]
pub fn extract_field(line: &str, start: char, end: char) -> &str {
    let Some(open) = line.find(start) else {
        return "";
    };
    let Some(close) = line.find(end) else {
        return "";
    };
    let from = open + start.len_utf8();
    if close < from {
        return "";
    }
    &line[from..close]
}

/// The three substrings of one frame record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedFrame<'a> {
    pub name: &'a str,
    pub offset: &'a str,
    pub address: &'a str,
}

impl<'a> ParsedFrame<'a> {
    #[must_use]
    pub fn parse(line: &'a str) -> Self {
        let name = extract_field(line, '(', '+');
        Self {
            // "(+0x1a)" has no name; the '+' belongs to the offset
            name: if name.starts_with('+') { "" } else { name },
            offset: extract_field(line, '+', ')'),
            address: extract_field(line, '[', ']'),
        }
    }

    /// Mangled symbol name, if the record carries one
    #[must_use]
    pub fn symbol(&self) -> Option<&'a str> {
        Some(self.name).filter(|name| !name.is_empty())
    }

    #[must_use]
    pub fn address_value(&self) -> Option<Address> {
        Address::parse_hex(self.address)
    }

    #[must_use]
    pub fn offset_value(&self) -> Option<u64> {
        Address::parse_hex(self.offset).map(|addr| addr.0)
    }
}
