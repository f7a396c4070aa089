//! Position Resolver - maps AST offsets to file/line/column spans
//!
//! A [`FileSet`] assigns every registered source file a disjoint range of
//! global offsets ([`Pos`]), starting at 1 so that `Pos(0)` can mean "no
//! position". Any parser can feed the graph builder as long as its nodes
//! report start/end offsets in that global space (see [`AstNode`]).

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A global offset into a [`FileSet`]. `Pos(0)` is never valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Pos(pub u32);

impl Pos {
    /// The "no position" value
    pub const NONE: Pos = Pos(0);

    pub fn is_valid(self) -> bool {
        self.0 > 0
    }
}

/// Anything that spans a range of source text.
///
/// `end` is exclusive: it points one past the last byte of the node.
pub trait AstNode {
    fn pos(&self) -> Pos;
    fn end(&self) -> Pos;
}

/// A bare offset range, for callers without a syntax tree of their own
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub pos: Pos,
    pub end: Pos,
}

impl Span {
    pub fn new(pos: Pos, end: Pos) -> Self {
        Self { pos, end }
    }
}

impl AstNode for Span {
    fn pos(&self) -> Pos {
        self.pos
    }

    fn end(&self) -> Pos {
        self.end
    }
}

/// A resolved position inside one file (line and column are 1-indexed)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    pub filename: String,
    pub offset: usize,
    pub line: u32,
    pub column: u32,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.filename, self.line, self.column)
    }
}

/// Start and end of a node within a file (1-indexed, end column exclusive)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Region {
    pub start_line: u32,
    pub start_column: u32,
    pub end_line: u32,
    pub end_column: u32,
}

impl Region {
    pub fn new(start_line: u32, start_column: u32, end_line: u32, end_column: u32) -> Self {
        Self {
            start_line,
            start_column,
            end_line,
            end_column,
        }
    }

    /// Whether the start precedes (or equals) the end
    pub fn is_ordered(&self) -> bool {
        (self.start_line, self.start_column) <= (self.end_line, self.end_column)
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}-{}:{}",
            self.start_line, self.start_column, self.end_line, self.end_column
        )
    }
}

/// A region together with the file it belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PhysicalLocation {
    pub file: String,
    pub region: Region,
}

impl fmt::Display for PhysicalLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.region)
    }
}

/// One registered source file
#[derive(Debug)]
pub struct SourceFile {
    name: String,
    base: u32,
    content: String,
    /// Byte offsets at which each line starts
    line_starts: Vec<usize>,
}

impl SourceFile {
    fn new(name: String, base: u32, content: String) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            content
                .bytes()
                .enumerate()
                .filter(|(_, b)| *b == b'\n')
                .map(|(i, _)| i + 1),
        );

        Self {
            name,
            base,
            content,
            line_starts,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// First global offset of this file
    pub fn base(&self) -> Pos {
        Pos(self.base)
    }

    pub fn size(&self) -> usize {
        self.content.len()
    }

    /// Global offset of a byte offset within this file
    pub fn pos(&self, offset: usize) -> Pos {
        Pos(self.base + offset as u32)
    }

    /// Whether `pos` falls inside this file. The end-of-file offset counts.
    pub fn contains(&self, pos: Pos) -> bool {
        pos.0 >= self.base && (pos.0 - self.base) as usize <= self.size()
    }

    fn offset(&self, pos: Pos) -> usize {
        (pos.0 - self.base) as usize
    }

    fn line_column(&self, offset: usize) -> (u32, u32) {
        let line_index = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        let column = offset - self.line_starts[line_index];
        (line_index as u32 + 1, column as u32 + 1)
    }
}

/// Registry of source files mapping global offsets to positions.
///
/// Immutable once populated, so a single file set can be shared by every
/// worker translating units in parallel.
#[derive(Debug)]
pub struct FileSet {
    files: Vec<SourceFile>,
    next_base: u32,
}

impl Default for FileSet {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSet {
    pub fn new() -> Self {
        Self {
            files: Vec::new(),
            next_base: 1,
        }
    }

    /// Register a file and return its base offset
    pub fn add_file(&mut self, name: impl Into<String>, content: impl Into<String>) -> Pos {
        let base = self.next_base;
        let file = SourceFile::new(name.into(), base, content.into());
        self.next_base = base + file.size() as u32 + 1;
        self.files.push(file);
        Pos(base)
    }

    /// Find the file containing `pos`
    pub fn file(&self, pos: Pos) -> Option<&SourceFile> {
        if !pos.is_valid() {
            return None;
        }
        let index = match self.files.binary_search_by_key(&pos.0, |f| f.base) {
            Ok(i) => i,
            Err(0) => return None,
            Err(i) => i - 1,
        };
        self.files.get(index).filter(|f| f.contains(pos))
    }

    pub fn files(&self) -> impl Iterator<Item = &SourceFile> {
        self.files.iter()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Resolve a global offset to file, line and column
    pub fn position(&self, pos: Pos) -> Option<Position> {
        let file = self.file(pos)?;
        let offset = file.offset(pos);
        let (line, column) = file.line_column(offset);
        Some(Position {
            filename: file.name.clone(),
            offset,
            line,
            column,
        })
    }
}

/// Resolve a node to its verbatim source text and location.
///
/// Fails with [`Error::InvalidPosition`] when the node's offsets are not
/// both inside the same registered file, or when the end precedes the start.
pub fn resolve<N: AstNode + ?Sized>(fset: &FileSet, node: &N) -> Result<(String, PhysicalLocation)> {
    let (pos, end) = (node.pos(), node.end());

    let file = fset
        .file(pos)
        .ok_or_else(|| Error::InvalidPosition(format!("start offset {} is outside the file set", pos.0)))?;

    if !file.contains(end) {
        return Err(Error::InvalidPosition(format!(
            "end offset {} is outside {}",
            end.0, file.name
        )));
    }
    if end < pos {
        return Err(Error::InvalidPosition(format!(
            "end offset {} precedes start offset {} in {}",
            end.0, pos.0, file.name
        )));
    }

    let (start_offset, end_offset) = (file.offset(pos), file.offset(end));
    let code = file
        .content
        .get(start_offset..end_offset)
        .ok_or_else(|| {
            Error::InvalidPosition(format!(
                "offsets {}..{} split a character in {}",
                start_offset, end_offset, file.name
            ))
        })?
        .to_string();

    let (start_line, start_column) = file.line_column(start_offset);
    let (end_line, end_column) = file.line_column(end_offset);

    Ok((
        code,
        PhysicalLocation {
            file: file.name.clone(),
            region: Region::new(start_line, start_column, end_line, end_column),
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_set() -> (FileSet, Pos, Pos) {
        let mut fset = FileSet::new();
        let a = fset.add_file("a.go", "package a\n\nfunc f() {\n}\n");
        let b = fset.add_file("b.go", "package b\n");
        (fset, a, b)
    }

    #[test]
    fn test_resolve_single_line() {
        let (fset, a, _) = sample_set();
        let span = Span::new(Pos(a.0), Pos(a.0 + 7));

        let (code, location) = resolve(&fset, &span).unwrap();
        assert_eq!(code, "package");
        assert_eq!(location.file, "a.go");
        assert_eq!(location.region, Region::new(1, 1, 1, 8));
    }

    #[test]
    fn test_resolve_multi_line() {
        let (fset, a, _) = sample_set();
        let start = a.0 + 11;
        let span = Span::new(Pos(start), Pos(start + 12));

        let (code, location) = resolve(&fset, &span).unwrap();
        assert_eq!(code, "func f() {\n}");
        assert_eq!(location.region, Region::new(3, 1, 4, 2));
        assert!(location.region.is_ordered());
    }

    #[test]
    fn test_second_file_has_own_lines() {
        let (fset, _, b) = sample_set();
        let span = Span::new(Pos(b.0 + 8), Pos(b.0 + 9));

        let (code, location) = resolve(&fset, &span).unwrap();
        assert_eq!(code, "b");
        assert_eq!(location.file, "b.go");
        assert_eq!(location.region.start_line, 1);
        assert_eq!(location.region.start_column, 9);
    }

    #[test]
    fn test_every_valid_span_is_ordered() {
        let (fset, a, _) = sample_set();
        let size = fset.file(a).unwrap().size() as u32;
        for start in 0..=size {
            for end in start..=size {
                let span = Span::new(Pos(a.0 + start), Pos(a.0 + end));
                let (_, location) = resolve(&fset, &span).unwrap();
                assert!(location.region.is_ordered(), "{start}..{end}");
            }
        }
    }

    #[test]
    fn test_invalid_positions() {
        let (fset, a, b) = sample_set();

        assert!(matches!(
            resolve(&fset, &Span::new(Pos::NONE, Pos(a.0 + 1))),
            Err(Error::InvalidPosition(_))
        ));
        // end before start
        assert!(resolve(&fset, &Span::new(Pos(a.0 + 5), Pos(a.0 + 2))).is_err());
        // span crossing into another file
        assert!(resolve(&fset, &Span::new(Pos(a.0), Pos(b.0 + 1))).is_err());
        // past the last file
        assert!(resolve(&fset, &Span::new(Pos(10_000), Pos(10_001))).is_err());
    }

    #[test]
    fn test_position_lookup() {
        let (fset, a, _) = sample_set();
        let pos = fset.position(Pos(a.0 + 11)).unwrap();
        assert_eq!(pos.to_string(), "a.go:3:1");
        assert!(fset.position(Pos::NONE).is_none());
    }
}
