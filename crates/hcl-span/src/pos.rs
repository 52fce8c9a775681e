use std::fmt;
use std::sync::Arc;

/// A position in source text.
///
/// `line` and `column` are 1-based, `column` counts characters. `offset` is
/// the 0-based byte offset into the parsed text. The filename is an opaque
/// label echoed back in diagnostics; it is shared between all positions of
/// one parse, so cloning a `Pos` never copies the name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Pos {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
    pub filename: Option<Arc<str>>,
}

impl Pos {
    pub fn new(line: usize, column: usize, offset: usize) -> Self {
        Self {
            line,
            column,
            offset,
            filename: None,
        }
    }

    /// Line 1, column 1, offset 0.
    pub fn start() -> Self {
        Self::new(1, 1, 0)
    }

    /// Attach a filename. An empty name is treated as no filename.
    pub fn with_filename(mut self, filename: impl AsRef<str>) -> Self {
        let filename = filename.as_ref();
        self.filename = if filename.is_empty() {
            None
        } else {
            Some(Arc::from(filename))
        };
        self
    }

    /// Share an already-allocated filename.
    pub fn with_shared_filename(mut self, filename: Option<Arc<str>>) -> Self {
        self.filename = filename;
        self
    }

    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    /// `true` when line and column are both set (1-based).
    pub fn is_valid(&self) -> bool {
        self.line > 0 && self.column > 0
    }

    /// Line and column as a tuple, handy for ordering checks.
    pub fn line_column(&self) -> (usize, usize) {
        (self.line, self.column)
    }
}

impl Default for Pos {
    fn default() -> Self {
        Self::start()
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.filename {
            Some(name) => write!(f, "{name}:{}:{}", self.line, self.column),
            None => write!(f, "{}:{}", self.line, self.column),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_display_without_filename() {
        assert_eq!(Pos::new(2, 5, 14).to_string(), "2:5");
    }

    #[test]
    fn test_display_with_filename() {
        let pos = Pos::new(10, 1, 200).with_filename("vars.tf");
        assert_eq!(pos.to_string(), "vars.tf:10:1");
        assert_eq!(pos.filename(), Some("vars.tf"));
    }

    #[test]
    fn test_empty_filename_is_none() {
        let pos = Pos::start().with_filename("");
        assert_eq!(pos.filename, None);
    }

    #[test]
    fn test_default_is_start() {
        assert_eq!(Pos::default(), Pos::new(1, 1, 0));
        assert!(Pos::default().is_valid());
        assert!(!Pos::new(0, 0, 0).is_valid());
    }

    #[test]
    fn test_shared_filename_is_not_copied() {
        let name: Arc<str> = Arc::from("a.hcl");
        let pos = Pos::new(1, 1, 0).with_shared_filename(Some(name.clone()));
        assert!(Arc::ptr_eq(pos.filename.as_ref().unwrap(), &name));
    }
}
