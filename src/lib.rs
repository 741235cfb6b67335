//! Deolang: a two-dimensional, self-modifying esoteric language in
//! the Befunge lineage. A program is a rectangular character grid; an
//! instruction pointer walks it in one of four cardinal directions,
//! and each visited cell acts on two stacks, a heap, and the grid
//! itself.
//!
//! This crate is the execution core only: [`Grid`] (the self-modifiable
//! program/memory), [`Interpreter`] (the moving IP, two stacks, heap,
//! call stack, and opcode dispatch), and the small [`host`] contract a
//! debugger shell or CLI drives it through. The graphical debugger and
//! the ahead-of-time "compiler" utility are external collaborators,
//! out of scope here.

pub mod error;
pub mod grid;
pub mod host;
pub mod interp;
pub mod loader;
pub mod tables;

pub use error::{GridError, RunError};
pub use grid::Grid;
pub use host::{InputCallback, InputValue};
pub use interp::{Interpreter, Snapshot, StepOutcome};
pub use tables::Direction;
