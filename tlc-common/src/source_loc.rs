//! Source location tracking for diagnostics

use serde::{Deserialize, Serialize};
use std::fmt;

/// A location in a source file (line and column are 1-based, 0 means unknown)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    pub filename: String,
    pub line: u32,
    pub column: u32,
}

impl SourceLocation {
    pub fn new(filename: &str, line: u32, column: u32) -> Self {
        Self {
            filename: filename.to_string(),
            line,
            column,
        }
    }

    /// Location carrying only a line number, as produced by the AST
    pub fn line(line: u32) -> Self {
        Self::new("<input>", line, 0)
    }

    pub fn dummy() -> Self {
        Self::new("<unknown>", 0, 0)
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.column == 0 {
            write!(f, "{}:{}", self.filename, self.line)
        } else {
            write!(f, "{}:{}:{}", self.filename, self.line, self.column)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_with_and_without_column() {
        assert_eq!(SourceLocation::new("a.tl", 3, 7).to_string(), "a.tl:3:7");
        assert_eq!(SourceLocation::line(12).to_string(), "<input>:12");
    }
}
