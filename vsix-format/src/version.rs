use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

// One digit, any character but a newline, one digit. The middle character is
// deliberately unconstrained so `6X1` passes the same as `6.1`. A single
// trailing newline is tolerated.
static VERSION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d.\d\n?$").expect("version pattern is a valid regex")
});

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Desired version number is not valid: '{0}'")]
pub struct VersionError(pub String);

/// A host product version accepted by the patcher, e.g. `6.1`.
///
/// The string is kept exactly as given; it ends up verbatim in the `Version`
/// attribute and in the output filename.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProductVersion(String);

impl ProductVersion {
    pub fn parse(input: &str) -> Result<Self, VersionError> {
        if VERSION_PATTERN.is_match(input) {
            Ok(ProductVersion(input.to_string()))
        } else {
            Err(VersionError(input.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for ProductVersion {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ProductVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ProductVersion {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
