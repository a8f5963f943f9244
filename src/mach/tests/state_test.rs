use super::*;
use crate::mach::{Opcode, State};

#[test]
fn test_unit_life_cycle() {
    let mut r = Runtime::default();
    assert_eq!(r.state(), State::Idle);
    r.emit(Opcode::One);
    assert_eq!(r.state(), State::Compiling);
    r.emit(Opcode::Print);
    r.commit().unwrap();
    assert_eq!(r.state(), State::Ready);
    assert_eq!(run(&mut r), "1\n");
    assert_eq!(r.state(), State::Idle);
}

#[test]
fn test_discard_drops_emitted_code() {
    let mut r = Runtime::default();
    r.emit(Opcode::One);
    r.discard();
    assert_eq!(r.state(), State::Idle);
}

#[test]
fn test_running_state_between_slices() {
    let mut r = Runtime::default();
    r.enter("for (i=0; i<1000; i++) { }");
    assert!(matches!(r.execute(10), Event::Running));
    assert_eq!(r.state(), State::Executing);
    assert_eq!(run_cycles(&mut r, 100_000), "");
    assert_eq!(r.state(), State::Idle);
}

#[test]
fn test_error_restores_globals() {
    let mut r = Runtime::default();
    r.enter("define f(a, b[]) { auto c; b[0] = 1; c = 2; return (a/0) }");
    r.enter("a = 5; c = 6; f(1, b[]); 7");
    r.enter("a; c; b[0]");
    assert_eq!(
        run(&mut r),
        "Runtime error (func=f, adr=9): Divide by zero\n5\n6\n1\n"
    );
    assert_eq!(r.state(), State::Idle);
}

#[test]
fn test_quit_stops_the_queue() {
    let mut r = Runtime::default();
    r.enter("1\nquit\n2");
    assert!(matches!(r.execute(100), Event::Print(s) if s == "1\n"));
    assert!(matches!(r.execute(100), Event::Quit));
    assert!(matches!(r.execute(100), Event::Stopped));
}
