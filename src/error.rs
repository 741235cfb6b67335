use std::path::PathBuf;

/// Errors raised while constructing or merging a [`crate::grid::Grid`].
///
/// `Io` is only ever surfaced through [`crate::grid::Grid::merge`] as a
/// boolean (per the `M` opcode's silent-failure policy) or through the
/// loader, which does propagate it to the host.
#[derive(thiserror::Error, Debug)]
pub enum GridError {
    #[error("no source content or existing file provided")]
    InvalidSource,
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised by [`crate::interp::Interpreter::run`].
#[derive(thiserror::Error, Debug)]
pub enum RunError {
    #[error("step count must be non-negative, got {0}")]
    InvalidArgument(i64),
}
