//! The filename-to-grid resolver spec.md's Loader component names.
//! [`crate::grid::Grid::from_file`] does the actual parsing; this
//! module is the thin seam the CLI binary (and, eventually, any other
//! host) goes through to turn a path on disk into interpreter state.

use std::path::Path;

use crate::error::GridError;

/// Read a file meant to pre-supply the `I` opcode's input buffer.
/// Unlike a program file this is read verbatim, not split into a
/// grid.
pub fn read_input_file(path: impl AsRef<Path>) -> Result<String, GridError> {
    let path = path.as_ref();
    std::fs::read_to_string(path).map_err(|source| GridError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn reads_input_file_verbatim() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, "hello").unwrap();
        assert_eq!(read_input_file(f.path()).unwrap(), "hello");
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = read_input_file("/nonexistent/path/xyz").unwrap_err();
        assert!(matches!(err, GridError::Io { .. }));
    }
}
