//! Source locator for runtime modules.

use std::fmt;

/// The source URL a module reports in backtraces.
///
/// Empty when the host did not supply one.
///
/// # Examples
///
/// ```
/// use core_types::SourceLocator;
///
/// let loc = SourceLocator::new("file:///main.js");
/// assert_eq!(loc.as_str(), "file:///main.js");
/// assert!(SourceLocator::default().is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SourceLocator(String);

impl SourceLocator {
    /// Creates a locator from any string-like value.
    pub fn new(url: impl Into<String>) -> Self {
        SourceLocator(url.into())
    }

    /// Returns the locator text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true when no locator was supplied.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for SourceLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SourceLocator {
    fn from(url: &str) -> Self {
        SourceLocator::new(url)
    }
}
