//! Thin contract for blocking input requests. Mirrors the teacher's
//! `CommunicationInterface` trait (the bus the CPU reads/writes
//! through) except Deolang's host contract is a single pluggable
//! callback, not a read/write bus: the `I` opcode is the only point
//! where the interpreter ever needs to reach outside its own state.

/// What a host's blocking input callback hands back to the `I`
/// opcode. An empty string is folded into `None` by the callback
/// itself (see spec.md §6: "Empty string means no input available").
pub enum InputValue {
    Str(String),
    Int(i64),
    None,
}

/// A zero-argument, blocking input source. Boxed as a trait object
/// because the debugger shell needs to hand in a closure that pops a
/// modal dialog; the CLI binary hands in one that reads a line from
/// stdin.
pub type InputCallback = Box<dyn FnMut() -> InputValue>;
