//! Execution state and instruction dispatch: the part of the crate
//! that plays the role the teacher's `Cpu` plays for the MOS 6502 —
//! registers there, two stacks/heap/call-stack here; `Instruction::
//! decode_by` there, [`Opcode::classify`] here. The hard coupling
//! spec.md calls out — a moving 2D IP over mutable, self-modifying
//! program memory, with modal parsing layered on top — lives entirely
//! in [`Interpreter::step`].

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::seq::SliceRandom;
use tracing::{debug, info, trace, warn};

use crate::error::{GridError, RunError};
use crate::grid::Grid;
use crate::host::{InputCallback, InputValue};
use crate::tables::Direction;

/// Python-style floor division: rounds toward negative infinity, not
/// toward zero, so results differ from Rust's default `/` whenever
/// the operands' signs differ. `b == 0` is handled by the caller.
fn floor_div(a: i64, b: i64) -> i64 {
    let q = a / b;
    let r = a % b;
    if r != 0 && (r < 0) != (b < 0) {
        q - 1
    } else {
        q
    }
}

/// Python-style modulo paired with [`floor_div`]: the result always
/// takes the divisor's sign.
fn floor_mod(a: i64, b: i64) -> i64 {
    let r = a % b;
    if r != 0 && (r < 0) != (b < 0) {
        r + b
    } else {
        r
    }
}

/// One visited grid cell's meaning, once classified out of the
/// digit/empty/opcode space `process_char` distinguishes between.
/// A one-shot lexer pass over the cell character, matching spec.md
/// §9's recommendation of "a `match` over a closed enum of opcode
/// variants" given there are only ~40 of them.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Opcode {
    Up,
    Right,
    Left,
    Down,
    RandomDir,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    And,
    Or,
    Xor,
    Not,
    Eq,
    Less,
    Greater,
    Pop,
    Swap,
    Copy,
    MoveToAux,
    MoveFromAux,
    RotateLeft,
    RotateRight,
    Len,
    Clear,
    PrintNum,
    PrintChar,
    Input,
    HeapStore,
    HeapLoad,
    GridGet,
    GridPut,
    Jump,
    Call,
    Return,
    Merge,
    Time,
    Wait,
    VerticalMirror,
    HorizontalMirror,
    MirrorSlash,
    MirrorBackslash,
    Exit,
    Quote,
}

impl Opcode {
    fn classify(ch: char) -> Option<Opcode> {
        use Opcode::*;
        Some(match ch {
            '^' => Up,
            '>' => Right,
            '<' => Left,
            'V' => Down,
            '?' => RandomDir,
            '+' => Add,
            '-' => Sub,
            '*' => Mul,
            ':' => Div,
            '%' => Mod,
            '&' => And,
            'o' => Or,
            'x' => Xor,
            '~' => Not,
            '=' => Eq,
            '(' => Less,
            ')' => Greater,
            'P' => Pop,
            'S' => Swap,
            'C' => Copy,
            'D' => MoveToAux,
            'U' => MoveFromAux,
            '{' => RotateLeft,
            '}' => RotateRight,
            'L' => Len,
            'Z' => Clear,
            'N' => PrintNum,
            'A' => PrintChar,
            'I' => Input,
            'h' => HeapStore,
            'H' => HeapLoad,
            'g' => GridGet,
            'p' => GridPut,
            'j' => Jump,
            'F' => Call,
            'R' => Return,
            'M' => Merge,
            'T' => Time,
            'W' => Wait,
            '|' => VerticalMirror,
            '_' => HorizontalMirror,
            '/' => MirrorSlash,
            '\\' => MirrorBackslash,
            '@' => Exit,
            '"' => Quote,
            _ => return None,
        })
    }
}

/// What dispatching one opcode did to control flow.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Effect {
    /// Ordinary cell: the IP should advance by `direction` as usual.
    Normal,
    /// The opcode set `x, y` itself (`j`, `F`, `R`); the post-step
    /// move must be skipped.
    Jumped,
    /// `@`: halt execution, IP frozen.
    Halt,
}

/// Whether a completed step left the machine running or halted.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Continue,
    Halted,
}

/// A read-only view of interpreter state, for debugger-style
/// inspection between steps. Cloned out of live state rather than
/// borrowed, since a snapshot is meant to outlive the step that
/// produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub output: String,
    pub stack: Vec<i64>,
    pub aux: Vec<i64>,
    pub call_stack: Vec<(i64, i64)>,
    pub heap: HashMap<i64, i64>,
    pub position: (i64, i64),
    pub direction: Direction,
    pub character: Option<char>,
    pub ignore_mode: bool,
    pub string_mode: bool,
    pub input: Option<String>,
    pub input_pointer: usize,
}

/// The Deolang execution core: two stacks, a heap, a call stack, a
/// direction vector, modal flags, and the grid they all act on.
///
/// Owns its state singly, as spec.md's data model demands — there is
/// no shared mutable access from elsewhere while a step is in flight.
pub struct Interpreter {
    program: Option<Grid>,
    stack: Vec<i64>,
    aux: Vec<i64>,
    call_stack: Vec<(i64, i64)>,
    heap: HashMap<i64, i64>,
    x: i64,
    y: i64,
    direction: Direction,
    ignore_mode: bool,
    string_mode: bool,
    input: Option<String>,
    input_pointer: usize,
    output: Vec<String>,
    built_in_input: Option<InputCallback>,
    output_sink: Option<Box<dyn FnMut(&str)>>,
}

impl Interpreter {
    /// Construct an interpreter with no program loaded yet. `input`
    /// pre-supplies the buffer `I` reads from; `built_in_input` is the
    /// fallback the host provides once that buffer is exhausted or
    /// absent.
    pub fn new(input: Option<String>, built_in_input: Option<InputCallback>) -> Self {
        let input = input.filter(|s| !s.is_empty());
        Interpreter {
            program: None,
            stack: Vec::new(),
            aux: Vec::new(),
            call_stack: Vec::new(),
            heap: HashMap::new(),
            x: 0,
            y: 0,
            direction: Direction::default(),
            ignore_mode: false,
            string_mode: false,
            input,
            input_pointer: 0,
            output: Vec::new(),
            built_in_input,
            output_sink: None,
        }
    }

    /// Install a program from source text, replacing whatever grid
    /// was loaded before. All other state (stacks, heap, IP, ...) is
    /// left untouched — this is not a [`Interpreter::reset`].
    pub fn load_code(&mut self, code: &str) {
        self.program = Some(Grid::from_text(code));
    }

    /// Install a program read from `path`. Propagates read errors to
    /// the host, per spec.md §7 (`InvalidSource`/I-O errors are
    /// programmer-misuse class, unlike opcode faults).
    pub fn load_program(&mut self, path: impl AsRef<std::path::Path>) -> Result<(), GridError> {
        self.program = Some(Grid::from_file(path)?);
        Ok(())
    }

    /// Install a program the way a host normally has it to hand:
    /// inline content, a file path, or both (content wins). Fails with
    /// [`GridError::InvalidSource`] when neither is usable, instead of
    /// silently falling back to an empty grid.
    pub fn load(&mut self, file: Option<&std::path::Path>, content: Option<&str>) -> Result<(), GridError> {
        self.program = Some(Grid::new(file, content)?);
        Ok(())
    }

    /// Zero all dynamic state: IP to `(0, 0)`, direction to east, both
    /// stacks/call stack/heap/output emptied, both modal flags
    /// cleared, input pointer rewound. `program`, `input`, and
    /// `built_in_input` are untouched, per spec.md's lifecycle
    /// contract.
    pub fn reset(&mut self) {
        self.stack.clear();
        self.aux.clear();
        self.call_stack.clear();
        self.heap.clear();
        self.output.clear();
        self.ignore_mode = false;
        self.string_mode = false;
        self.input_pointer = 0;
        self.x = 0;
        self.y = 0;
        self.direction = Direction::default();
    }

    /// Install a streaming output sink, called with each fragment as
    /// `N` or `A` emits it. The buffer [`Interpreter::snapshot`] exposes
    /// keeps accumulating regardless of whether a sink is installed, so
    /// a debugger host can rely on the snapshot alone while a CLI host
    /// gets real-time terminal echo from the sink.
    pub fn set_output_sink(&mut self, sink: impl FnMut(&str) + 'static) {
        self.output_sink = Some(Box::new(sink));
    }

    /// Replace the pre-supplied input buffer. A non-empty buffer
    /// disables the host callback path until it is cleared again.
    pub fn set_input(&mut self, text: impl Into<String>, pointer: usize) {
        let text = text.into();
        if !text.is_empty() {
            self.built_in_input = None;
        }
        self.input = if text.is_empty() { None } else { Some(text) };
        self.input_pointer = pointer;
    }

    /// Run up to `steps` cells (or until halt if `steps == 0`).
    /// Returns `Ok(true)` if execution is still running after the
    /// requested step count, `Ok(false)` if it halted along the way.
    pub fn run(&mut self, steps: i64) -> Result<bool, RunError> {
        if steps < 0 {
            return Err(RunError::InvalidArgument(steps));
        }

        if steps > 0 {
            for _ in 0..steps {
                if self.step() == StepOutcome::Halted {
                    return Ok(false);
                }
            }
            Ok(true)
        } else {
            loop {
                if self.step() == StepOutcome::Halted {
                    return Ok(false);
                }
            }
        }
    }

    /// Execute exactly one grid cell: the per-cell dispatch contract
    /// spec.md §4.2 describes. Never faults — an unrecognized
    /// character (not a digit, not the empty sentinel, not in the
    /// opcode table) is a silent no-op, same as the Python source's
    /// caught-exception fallback, just without needing to catch
    /// anything because every handler here is already total.
    pub fn step(&mut self) -> StepOutcome {
        let ch = self.current_char();
        trace!(x = self.x, y = self.y, ?ch, "step");

        if self.string_mode {
            match ch {
                Some('"') => {
                    debug!("string_mode off");
                    self.string_mode = false;
                }
                Some(c) => self.stack.push(c as i64),
                None => {}
            }
            self.advance();
            return StepOutcome::Continue;
        }

        if self.ignore_mode {
            if matches!(ch, Some('|') | Some('_')) {
                debug!("ignore_mode off");
                self.ignore_mode = false;
            }
            self.advance();
            return StepOutcome::Continue;
        }

        let effect = match ch {
            None => Effect::Normal,
            Some(c) if c.is_ascii_digit() => {
                self.stack.push(i64::from(c.to_digit(10).unwrap()));
                Effect::Normal
            }
            Some(c) => match Opcode::classify(c) {
                Some(op) => self.dispatch(op),
                None => Effect::Normal,
            },
        };

        match effect {
            Effect::Halt => StepOutcome::Halted,
            Effect::Jumped => StepOutcome::Continue,
            Effect::Normal => {
                self.advance();
                StepOutcome::Continue
            }
        }
    }

    /// A read-only view of the current state, safe to hold onto after
    /// the interpreter has moved on.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            output: self.output.concat(),
            stack: self.stack.clone(),
            aux: self.aux.clone(),
            call_stack: self.call_stack.clone(),
            heap: self.heap.clone(),
            position: (self.x, self.y),
            direction: self.direction,
            character: self.current_char(),
            ignore_mode: self.ignore_mode,
            string_mode: self.string_mode,
            input: self.input.clone(),
            input_pointer: self.input_pointer,
        }
    }

    fn current_char(&self) -> Option<char> {
        self.program.as_ref().and_then(|g| g.get(self.x, self.y))
    }

    fn advance(&mut self) {
        let (dx, dy) = self.direction.delta();
        self.x += dx;
        self.y += dy;
    }

    fn dispatch(&mut self, op: Opcode) -> Effect {
        use Opcode::*;
        match op {
            Up => self.direction = Direction::North,
            Right => self.direction = Direction::East,
            Left => self.direction = Direction::West,
            Down => self.direction = Direction::South,
            RandomDir => {
                self.direction = *Direction::ALL.choose(&mut rand::thread_rng()).unwrap();
            }

            Add => self.binary_op(|a, b| a.wrapping_add(b)),
            Sub => self.binary_op(|a, b| a.wrapping_sub(b)),
            Mul => self.binary_op(|a, b| a.wrapping_mul(b)),
            Div => self.binary_op(|a, b| if b == 0 { 0 } else { floor_div(a, b) }),
            Mod => self.binary_op(|a, b| if b == 0 { 0 } else { floor_mod(a, b) }),
            And => self.binary_op(|a, b| a & b),
            Or => self.binary_op(|a, b| a | b),
            Xor => self.binary_op(|a, b| a ^ b),
            Not => {
                if let Some(v) = self.stack.pop() {
                    self.stack.push(!v);
                }
            }
            Eq => self.binary_op(|a, b| i64::from(a == b)),
            Less => self.binary_op(|a, b| i64::from(a < b)),
            Greater => self.binary_op(|a, b| i64::from(a > b)),

            Pop => {
                self.stack.pop();
            }
            Swap => {
                if self.stack.len() >= 2 {
                    let n = self.stack.len();
                    self.stack.swap(n - 1, n - 2);
                }
            }
            Copy => {
                if let Some(&top) = self.stack.last() {
                    self.stack.push(top);
                }
            }
            MoveToAux => {
                if let Some(v) = self.stack.pop() {
                    self.aux.push(v);
                }
            }
            MoveFromAux => {
                if let Some(v) = self.aux.pop() {
                    self.stack.push(v);
                }
            }
            RotateLeft => {
                if self.stack.len() > 1 {
                    let v = self.stack.pop().unwrap();
                    self.stack.insert(0, v);
                }
            }
            RotateRight => {
                if self.stack.len() > 1 {
                    let v = self.stack.remove(0);
                    self.stack.push(v);
                }
            }
            Len => self.stack.push(self.stack.len() as i64),
            Clear => self.stack.clear(),

            PrintNum => {
                if let Some(v) = self.stack.pop() {
                    let s = v.to_string();
                    trace!(output = %s, "print_num");
                    if let Some(sink) = self.output_sink.as_mut() {
                        sink(&s);
                    }
                    self.output.push(s);
                }
            }
            PrintChar => {
                if let Some(v) = self.stack.pop() {
                    if let Some(c) = char::from_u32(v as u32) {
                        trace!(output = %c, "print_char");
                        let s = c.to_string();
                        if let Some(sink) = self.output_sink.as_mut() {
                            sink(&s);
                        }
                        self.output.push(s);
                    }
                }
            }
            Input => self.op_input(),

            HeapStore => {
                if self.stack.len() >= 2 {
                    let addr = self.stack.pop().unwrap();
                    let val = self.stack.pop().unwrap();
                    self.heap.insert(addr, val);
                }
            }
            HeapLoad => {
                if let Some(addr) = self.stack.pop() {
                    self.stack.push(*self.heap.get(&addr).unwrap_or(&0));
                }
            }
            GridGet => {
                if self.stack.len() >= 2 {
                    let y = self.stack.pop().unwrap();
                    let x = self.stack.pop().unwrap();
                    let val = self
                        .program
                        .as_ref()
                        .and_then(|g| g.get(x, y))
                        .map_or(0, |c| c as i64);
                    self.stack.push(val);
                }
            }
            GridPut => {
                if self.stack.len() >= 3 {
                    let y = self.stack.pop().unwrap();
                    let x = self.stack.pop().unwrap();
                    let val = self.stack.pop().unwrap();
                    if let Some(c) = char::from_u32(val as u32) {
                        self.ensure_program().set(x, y, c);
                    }
                }
            }

            Jump => {
                if self.stack.len() >= 2 {
                    let y = self.stack.pop().unwrap();
                    let x = self.stack.pop().unwrap();
                    self.x = x;
                    self.y = y;
                    return Effect::Jumped;
                }
            }
            Call => {
                if self.stack.len() >= 2 {
                    let y = self.stack.pop().unwrap();
                    let x = self.stack.pop().unwrap();
                    let (dx, dy) = self.direction.delta();
                    self.call_stack.push((self.x + dx, self.y + dy));
                    self.x = x;
                    self.y = y;
                    return Effect::Jumped;
                }
            }
            Return => {
                if let Some((rx, ry)) = self.call_stack.pop() {
                    self.x = rx;
                    self.y = ry;
                    return Effect::Jumped;
                }
            }
            Merge => {
                if self.stack.len() >= 2 {
                    let y = self.stack.pop().unwrap();
                    let x = self.stack.pop().unwrap();
                    let filename = self.pop_string();
                    let ok = self.ensure_program().merge(&filename, x, y);
                    if !ok {
                        warn!(filename = %filename, "merge failed");
                    }
                }
            }

            Time => {
                let secs = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .map(|d| d.as_secs() as i64)
                    .unwrap_or(0);
                self.stack.push(secs);
            }
            Wait => {
                if let Some(n) = self.stack.pop() {
                    if n > 0 {
                        std::thread::sleep(std::time::Duration::from_secs(n as u64));
                    }
                }
            }

            VerticalMirror => {
                if self.direction.is_horizontal() {
                    self.ignore_mode = true;
                }
            }
            HorizontalMirror => {
                if self.direction.is_vertical() {
                    self.ignore_mode = true;
                }
            }
            MirrorSlash => {
                if let Some(v) = self.stack.pop() {
                    self.direction = if v == 0 {
                        self.direction.turn_left()
                    } else {
                        self.direction.turn_right()
                    };
                }
            }
            MirrorBackslash => {
                if let Some(v) = self.stack.pop() {
                    self.direction = if v == 0 {
                        self.direction.turn_right()
                    } else {
                        self.direction.turn_left()
                    };
                }
            }

            Exit => {
                info!(x = self.x, y = self.y, "program finished");
                return Effect::Halt;
            }
            Quote => self.string_mode = true,
        }
        Effect::Normal
    }

    /// Pop `b` (the top) then `a` (beneath it) and push `f(a, b)`.
    /// For `+ * & o x =` the result doesn't depend on pop order since
    /// `f` is commutative; for `- : % ( )` this order is the one
    /// spec.md documents (`b, a = pop(), pop()`).
    fn binary_op(&mut self, f: impl Fn(i64, i64) -> i64) {
        if self.stack.len() >= 2 {
            let b = self.stack.pop().unwrap();
            let a = self.stack.pop().unwrap();
            self.stack.push(f(a, b));
        }
    }

    fn op_input(&mut self) {
        match self.input.as_ref() {
            Some(s) => {
                let chars: Vec<char> = s.chars().collect();
                if self.input_pointer < chars.len() {
                    self.stack.push(chars[self.input_pointer] as i64);
                    self.input_pointer += 1;
                } else {
                    self.stack.push(-1);
                }
            }
            None => {
                if let Some(cb) = self.built_in_input.as_mut() {
                    match cb() {
                        InputValue::Str(s) => {
                            if let Some(c) = s.chars().next() {
                                self.stack.push(c as i64);
                            }
                        }
                        InputValue::Int(n) => self.stack.push(n),
                        InputValue::None => {}
                    }
                }
            }
        }
    }

    /// The null-terminated string-from-stack convention `M` uses to
    /// read its filename operand: pop until a `0` sentinel is
    /// consumed (or the stack runs dry), treating each non-zero
    /// popped value as a code point, assembled in pop order.
    fn pop_string(&mut self) -> String {
        let mut chars = Vec::new();
        while let Some(v) = self.stack.pop() {
            if v == 0 {
                break;
            }
            if let Some(c) = char::from_u32(v as u32) {
                chars.push(c);
            }
        }
        chars.into_iter().collect()
    }

    fn ensure_program(&mut self) -> &mut Grid {
        self.program.get_or_insert_with(|| Grid::from_text(""))
    }
}
