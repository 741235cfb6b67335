//! End-to-end programs run to completion through the public
//! `Interpreter` surface only, the way a real host would drive it.

use deolang::Interpreter;

fn run_to_completion(code: &str) -> (String, bool) {
    let mut interp = Interpreter::new(None, None);
    interp.load_code(code);
    let still_running = interp.run(0).expect("step count is non-negative");
    (interp.snapshot().output, still_running)
}

#[test]
fn hello_world_via_string_mode() {
    // Stack-based printing pops last-pushed-first, so pushing "Hello"
    // in string mode and then printing five times with `A` yields the
    // reverse of the pushed order.
    let (output, still_running) = run_to_completion("\"Hello\"AAAAA@");
    assert_eq!(output, "olleH");
    assert!(!still_running);
}

#[test]
fn stack_arithmetic() {
    let (output, still_running) = run_to_completion("34+N@");
    assert_eq!(output, "7");
    assert!(!still_running);
}

#[test]
fn conditional_mirror_turns_and_halts() {
    // `1` pushes a non-zero value; `/` turns right (east -> south);
    // the IP then lands one row down on `@` and halts.
    let code = "1/\n*@";
    let (output, still_running) = run_to_completion(code);
    assert_eq!(output, "");
    assert!(!still_running);
}

#[test]
fn heap_round_trip() {
    // push 9, push 7, `h` stores heap[7] = 9 (address on top), push 7
    // again, `H` loads it back, `N` prints it.
    let (output, still_running) = run_to_completion("97h7HN@");
    assert_eq!(output, "9");
    assert!(!still_running);
}

#[test]
fn subroutine_call_and_return() {
    // Row 0 pushes 3 (untouched marker), then x=0, y=1 for `F`; the
    // call jumps to row 1 col 0, which pushes 5 and returns. Back at
    // the resume point, `N` prints the top of the stack (5), leaving
    // the marker 3 underneath.
    let code = "3 0 1 F N @\n5 R";
    let (output, still_running) = run_to_completion(code);
    assert_eq!(output, "5");
    assert!(!still_running);
}

#[test]
fn bridge_skips_cells_until_the_next_bridge_character() {
    // The first `|` enters ignore mode while travelling horizontally;
    // `5` and `N` in between are skipped entirely (not dispatched);
    // the second `|` clears ignore mode, and the trailing `5N` runs
    // normally before `@` halts.
    let (output, still_running) = run_to_completion("|5N|5N@");
    assert_eq!(output, "5");
    assert!(!still_running);
}
