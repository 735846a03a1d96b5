//! Core domain types shared by the capture, symbolization and printing layers

use std::fmt;

/// A runtime instruction address (newtype over the machine word)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address(pub u64);

impl Address {
    /// Parse hexadecimal text with or without a `0x` prefix
    #[must_use]
    pub fn parse_hex(text: &str) -> Option<Self> {
        let text = text.trim();
        let digits = text
            .strip_prefix("0x")
            .or_else(|| text.strip_prefix("0X"))
            .unwrap_or(text);
        if digits.is_empty() {
            return None;
        }
        u64::from_str_radix(digits, 16).ok().map(Address)
    }

    /// Offset of this address from a module's load base
    #[must_use]
    pub fn relative_to(self, base: u64) -> u64 {
        self.0.wrapping_sub(base)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

impl fmt::LowerHex for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

/// One captured call-stack entry
///
/// Some capture facilities return preformatted text such as
/// `./app(_Z3fooi+0x20) [0x4010a0]` alongside the raw address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackFrame {
    pub address: Address,
    pub text: Option<String>,
}

impl StackFrame {
    #[must_use]
    pub fn from_address(address: u64) -> Self {
        Self { address: Address(address), text: None }
    }

    #[must_use]
    pub fn with_text(address: u64, text: impl Into<String>) -> Self {
        Self { address: Address(address), text: Some(text.into()) }
    }

    /// Text printed at the start of this frame's output line
    #[must_use]
    pub fn display_text(&self) -> String {
        match self.text {
            Some(ref text) => text.clone(),
            None => format!("[{}]", self.address),
        }
    }
}

/// Source location produced by line resolution
///
/// `line` is only meaningful together with `file`; `function` may be known
/// even when no line information exists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedLocation {
    pub file: Option<String>,
    pub line: Option<u32>,
    pub function: Option<String>,
}

impl ResolvedLocation {
    /// File and line, when both are known
    #[must_use]
    pub fn source_line(&self) -> Option<(&str, u32)> {
        match (&self.file, self.line) {
            (Some(file), Some(line)) => Some((file.as_str(), line)),
            _ => None,
        }
    }

    /// Function name, ignoring empty strings
    #[must_use]
    pub fn function_name(&self) -> Option<&str> {
        self.function.as_deref().filter(|name| !name.is_empty())
    }

    /// Whether the lookup produced anything usable
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.file.is_none() && self.function_name().is_none()
    }
}
