//! Host language-version representation.
//!
//! Grounded on `red_knot_python_semantic::python_version`; trimmed to the
//! single operation this core actually needs: comparing a source-level
//! `sys.version_info` check (spec.md §4.D.3) against the host's configured
//! version.

use std::cmp::Ordering;
use std::fmt;

/// A `(major, minor)` Python version, as reported by [`HostInfo`](crate::HostInfo).
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct PythonVersion {
    pub major: u8,
    pub minor: u8,
}

impl PythonVersion {
    pub const fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }

    /// Parse a host-supplied `"major.minor"` string (e.g. from a config
    /// file or CLI flag) into a [`PythonVersion`]. Construction-time
    /// failure here is a caller configuration error, not something this
    /// core can recover a default from, so it's reported via `anyhow`
    /// rather than silently falling back.
    pub fn parse(s: &str) -> anyhow::Result<Self> {
        let (major, minor) = s
            .split_once('.')
            .ok_or_else(|| anyhow::anyhow!("expected `major.minor`, got `{s}`"))?;
        let major = major
            .parse::<u8>()
            .map_err(|e| anyhow::anyhow!("invalid major version `{major}`: {e}"))?;
        let minor = minor
            .parse::<u8>()
            .map_err(|e| anyhow::anyhow!("invalid minor version `{minor}`: {e}"))?;
        Ok(Self::new(major, minor))
    }

    /// Evaluate `self <op> (major, minor)`, used to prune `if
    /// sys.version_info <op> (M, N): ...` branches (spec.md §4.D.3).
    ///
    /// Returns `None` if the comparison can't be decided purely from the
    /// major/minor pair (e.g. a three-element tuple comparison) — callers
    /// must then walk both branches.
    pub fn compare_tuple(self, op: VersionCmpOp, other: (u8, u8)) -> Option<bool> {
        let ordering = (self.major, self.minor).cmp(&other);
        Some(match op {
            VersionCmpOp::Lt => ordering == Ordering::Less,
            VersionCmpOp::LtE => ordering != Ordering::Greater,
            VersionCmpOp::Gt => ordering == Ordering::Greater,
            VersionCmpOp::GtE => ordering != Ordering::Less,
            VersionCmpOp::Eq => ordering == Ordering::Equal,
            VersionCmpOp::NotEq => ordering != Ordering::Equal,
        })
    }
}

impl Default for PythonVersion {
    fn default() -> Self {
        Self::new(3, 12)
    }
}

impl fmt::Display for PythonVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Comparison operators the collector can fold `sys.version_info` against.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum VersionCmpOp {
    Lt,
    LtE,
    Gt,
    GtE,
    Eq,
    NotEq,
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test]
    fn decides_strictly_less() {
        let host = PythonVersion::new(3, 8);
        assert_eq!(host.compare_tuple(VersionCmpOp::Lt, (3, 9)), Some(true));
        assert_eq!(host.compare_tuple(VersionCmpOp::GtE, (3, 9)), Some(false));
    }

    #[test]
    fn decides_equal() {
        let host = PythonVersion::new(3, 9);
        assert_eq!(host.compare_tuple(VersionCmpOp::Eq, (3, 9)), Some(true));
    }

    #[test_case("3.11", 3, 11; "two digit minor")]
    #[test_case("3.8", 3, 8; "single digit minor")]
    #[test_case("2.7", 2, 7; "legacy major")]
    fn parses_valid_strings(input: &str, major: u8, minor: u8) {
        assert_eq!(PythonVersion::parse(input).unwrap(), PythonVersion::new(major, minor));
    }

    #[test_case("3"; "missing minor")]
    #[test_case("a.b"; "non-numeric")]
    #[test_case(""; "empty")]
    fn rejects_malformed_strings(input: &str) {
        assert!(PythonVersion::parse(input).is_err());
    }
}
