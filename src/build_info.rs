//! Basket build metadata
//!
//! `build.rs` bumps a build counter and stamps the compile time; both reach
//! this module through `BASKET_BUILD_*` environment variables at compile time.
//! The HTTP and MCP binaries print them on startup and `basket_status` reports
//! them.

use serde::Serialize;

/// Counter from `build_number.txt`, 0 when built without the build script
pub const BUILD_NUMBER: u64 = match option_env!("BASKET_BUILD_NUMBER") {
    Some(s) => match parse_u64(s) {
        Some(n) => n,
        None => 0,
    },
    None => 0,
};

/// UTC compile time, e.g. 2026-10-16T09:30:00Z
pub const BUILD_TIMESTAMP: &str = match option_env!("BASKET_BUILD_TIMESTAMP") {
    Some(s) => s,
    None => "unknown",
};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Decimal digits only; anything else, or an overflowing value, is None.
/// `str::parse` is not usable in a const context.
const fn parse_u64(s: &str) -> Option<u64> {
    let digits = s.as_bytes();
    if digits.is_empty() {
        return None;
    }

    let mut value: u64 = 0;
    let mut i = 0;
    while i < digits.len() {
        let d = digits[i];
        if !d.is_ascii_digit() {
            return None;
        }
        value = match value.checked_mul(10) {
            Some(v) => match v.checked_add((d - b'0') as u64) {
                Some(v) => v,
                None => return None,
            },
            None => return None,
        };
        i += 1;
    }
    Some(value)
}

/// What this binary was built from, as shown in status output
#[derive(Debug, Clone, Serialize)]
pub struct BuildInfo {
    pub name: &'static str,
    pub version: &'static str,
    pub build_number: u64,
    pub build_timestamp: &'static str,
    pub description: &'static str,
}

impl BuildInfo {
    pub fn current() -> Self {
        Self {
            name: NAME,
            version: VERSION,
            build_number: BUILD_NUMBER,
            build_timestamp: BUILD_TIMESTAMP,
            description: DESCRIPTION,
        }
    }

    /// Banner for one server surface ("HTTP" or "MCP")
    pub fn banner(&self, surface: &str) -> String {
        let rule = "=".repeat(47);
        format!(
            "{rule}\n  Basket {surface} server\n  v{} build {} ({})\n{rule}",
            self.version, self.build_number, self.build_timestamp
        )
    }
}

/// Written to stderr so the MCP stdio transport stays clean
pub fn print_startup_banner(surface: &str) {
    eprintln!("{}", BuildInfo::current().banner(surface));
}
