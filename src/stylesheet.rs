//! Comment stripping for Matplotlib style sheets.
//!
//! The commented reference sheet (`styles/base-ref.mplstyle`) is the
//! one maintained by hand.  The sheet installed for Matplotlib is
//! derived from it by removing comments and blank lines.

use std::{
    fmt::{Display, Formatter},
    fs,
    io,
    path::{Path, PathBuf},
};

/// Errors of the style-sheet utilities.
#[derive(Debug)]
pub enum SheetError {
    /// The input style sheet does not exist.
    MissingInputFile(PathBuf),
    /// Any other I/O failure.
    Io(io::Error),
}

impl Display for SheetError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        match self {
            SheetError::MissingInputFile(p) =>
                write!(f, "File '{}' not found.", p.display()),
            SheetError::Io(e) => write!(f, "Error reading file: {}", e),
        }
    }
}

impl std::error::Error for SheetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SheetError::MissingInputFile(_) => None,
            SheetError::Io(e) => Some(e),
        }
    }
}

impl From<io::Error> for SheetError {
    fn from(e: io::Error) -> Self { SheetError::Io(e) }
}

/// Remove the `#` comment of `line` and its trailing whitespace.
pub(crate) fn strip_line(line: &str) -> &str {
    let code = match line.find('#') {
        Some(i) => &line[.. i],
        None => line,
    };
    code.trim_end()
}

/// Strip comments from every line of `text`, dropping the lines left
/// empty.  Each remaining line is terminated by `'\n'`.
pub fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for line in text.lines().map(strip_line).filter(|l| !l.is_empty()) {
        out.push_str(line);
        out.push('\n');
    }
    out
}

/// Read a style sheet, failing with [`SheetError::MissingInputFile`]
/// if it does not exist.
pub(crate) fn read_sheet(path: &Path) -> Result<String, SheetError> {
    fs::read_to_string(path).map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            SheetError::MissingInputFile(path.to_path_buf())
        } else {
            SheetError::Io(e)
        }
    })
}

/// Write `input` stripped of its comments to `output` and return the
/// number of lines written.  The input is read completely before
/// `output` is created, so nothing is written if reading fails.
pub fn strip_file(input: impl AsRef<Path>, output: impl AsRef<Path>)
                  -> Result<usize, SheetError> {
    let input = input.as_ref();
    let output = output.as_ref();
    let stripped = strip_comments(&read_sheet(input)?);
    fs::write(output, &stripped)?;
    let n = stripped.lines().count();
    tracing::debug!("stripped {} into {} ({} lines)",
                    input.display(), output.display(), n);
    Ok(n)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_trailing_and_full_line_comments() {
        let s = strip_comments("a = 1 # comment\n# full comment\nb = 2\n");
        assert_eq!(s, "a = 1\nb = 2\n");
    }

    #[test]
    fn keeps_indentation_and_drops_blank_lines() {
        let s = strip_comments("  key: v\n\n   \t\nlast: x  ");
        assert_eq!(s, "  key: v\nlast: x\n");
        assert_eq!(strip_comments(""), "");
        assert_eq!(strip_comments("# only\n#\n"), "");
    }

    #[test]
    fn strip_file_writes_output() -> Result<(), SheetError> {
        let dir = tempfile::tempdir()?;
        let input = dir.path().join("ref.mplstyle");
        let output = dir.path().join("out.mplstyle");
        fs::write(&input, "a = 1 # comment\n# full comment\nb = 2\n")?;
        assert_eq!(strip_file(&input, &output)?, 2);
        assert_eq!(fs::read_to_string(&output)?, "a = 1\nb = 2\n");
        Ok(())
    }

    #[test]
    fn missing_input_leaves_no_output() -> Result<(), SheetError> {
        let dir = tempfile::tempdir()?;
        let input = dir.path().join("does-not-exist.mplstyle");
        let output = dir.path().join("out.mplstyle");
        match strip_file(&input, &output) {
            Err(SheetError::MissingInputFile(p)) => assert_eq!(p, input),
            other => panic!("unexpected {:?}", other),
        }
        assert!(!output.exists());
        Ok(())
    }

    #[test]
    fn unreadable_input_is_an_io_error() -> Result<(), SheetError> {
        let dir = tempfile::tempdir()?;
        let output = dir.path().join("out.mplstyle");
        // A directory cannot be read as a file.
        let r = strip_file(dir.path(), &output);
        assert!(matches!(r, Err(SheetError::Io(_))));
        assert!(!output.exists());
        Ok(())
    }

    #[test]
    fn shipped_base_sheet_is_stripped_reference() {
        let reference = include_str!("../styles/base-ref.mplstyle");
        let base = include_str!("../styles/base.mplstyle");
        assert_eq!(strip_comments(reference), base);
    }
}
