use tiny_basic_interpreter::{ControlTransfer, Executor, InterpreterError};

/// Helper to run a program to completion
fn run_program(source: &str) -> Executor {
    let mut executor = Executor::new(source).unwrap();
    executor.run().unwrap();
    executor
}

#[test]
fn test_variables_default_to_zero() {
    let executor = run_program("10 LET a = b + c\n");
    assert_eq!(executor.variable('a'), 0);
    assert_eq!(executor.variable('z'), 0);
}

#[test]
fn test_arithmetic_precedence_end_to_end() {
    let executor = run_program(
        "10 LET a = 2 + 3 * 4\n\
         20 LET b = (2 + 3) * 4\n\
         30 LET c = a - b / 2\n",
    );
    assert_eq!(executor.variable('a'), 14);
    assert_eq!(executor.variable('b'), 20);
    assert_eq!(executor.variable('c'), 4);
}

#[test]
fn test_division_by_zero_is_only_a_warning() {
    let executor = run_program("10 LET d = 0\n20 LET a = 5 / d\n30 LET b = 1\n");
    assert_eq!(executor.variable('a'), 0);
    // execution continued past the warning
    assert_eq!(executor.variable('b'), 1);
}

#[test]
fn test_goto_transfers_control() {
    let executor = run_program(
        "10 LET a = 1\n\
         20 GOTO 40\n\
         30 LET a = 99\n\
         40 LET b = a + 1\n",
    );
    assert_eq!(executor.variable('a'), 1);
    assert_eq!(executor.variable('b'), 2);
}

#[test]
fn test_goto_backward_makes_a_loop() {
    let mut executor = Executor::new(
        "10 LET i = i + 1\n\
         20 IF i = 5 THEN 40\n\
         30 GOTO 10\n\
         40 REM done\n",
    )
    .unwrap();
    executor.run().unwrap();
    assert_eq!(executor.variable('i'), 5);
    assert!(executor.finished());
}

#[test]
fn test_goto_to_missing_line_halts_the_run() {
    let mut executor = Executor::new("10 LET a = 1\n20 GOTO 25\n30 LET b = 1\n").unwrap();
    assert_eq!(
        executor.run().unwrap_err(),
        InterpreterError::UndefinedLine(25)
    );
    // nothing after the failed jump executed
    assert_eq!(executor.variable('b'), 0);
}

#[test]
fn test_if_then_both_branches() {
    let executor = run_program(
        "10 IF 1 = 1 THEN 40\n\
         20 LET a = 1\n\
         30 GOTO 50\n\
         40 LET b = 1\n\
         50 IF 1 = 0 THEN 70\n\
         60 LET c = 1\n\
         70 LET d = 1\n",
    );
    assert_eq!(executor.variable('a'), 0);
    assert_eq!(executor.variable('b'), 1);
    assert_eq!(executor.variable('c'), 1);
    assert_eq!(executor.variable('d'), 1);
}

#[test]
fn test_infinite_loop_stops_at_step_limit() {
    let mut executor = Executor::new("10 LET a = 1\n20 PRINT a\n30 GOTO 20\n").unwrap();
    executor.run_bounded(100).unwrap();
    assert!(!executor.finished());
    assert_eq!(executor.variable('a'), 1);
}

#[test]
fn test_comments_are_ignored() {
    let executor = run_program(
        "10 REM anything goes here: $%& no tokens needed\n\
         20 LET a = 3\n\
         30 REM trailing comment\n",
    );
    assert_eq!(executor.variable('a'), 3);
}

#[test]
fn test_unrecognized_statement_aborts() {
    let mut executor = Executor::new("10 THEN 20\n").unwrap();
    assert!(matches!(
        executor.run().unwrap_err(),
        InterpreterError::UnrecognizedStatement(_)
    ));
}

#[test]
fn test_syntax_error_names_both_tokens() {
    let mut executor = Executor::new("10 LET a 5\n").unwrap();
    assert_eq!(
        executor.run().unwrap_err(),
        InterpreterError::UnexpectedToken {
            found: "number".to_string(),
            expected: "=".to_string(),
        }
    );
}

#[test]
fn test_deferred_search_resumes_at_line() {
    let mut executor = Executor::new(
        "10 LET a = 1\n\
         20 LET b = 2\n\
         30 LET c = 3\n",
    )
    .unwrap();
    executor
        .transfer(ControlTransfer::DeferredForwardSearch(30))
        .unwrap();
    executor.run().unwrap();
    assert_eq!(executor.variable('a'), 0);
    assert_eq!(executor.variable('b'), 0);
    assert_eq!(executor.variable('c'), 3);
}

#[test]
fn test_deferred_search_checks_the_line_index() {
    let mut executor = Executor::new("10 LET a = 1\n").unwrap();
    assert_eq!(
        executor
            .transfer(ControlTransfer::DeferredForwardSearch(90))
            .unwrap_err(),
        InterpreterError::UndefinedLine(90)
    );
}

#[test]
fn test_immediate_rescan_via_public_request() {
    let mut executor = Executor::new("10 LET a = 1\n20 LET b = 2\n").unwrap();
    executor
        .transfer(ControlTransfer::ImmediateRescan(20))
        .unwrap();
    executor.run().unwrap();
    // cursor was left at line 20's statement, so line 10 never ran
    assert_eq!(executor.variable('a'), 0);
    assert_eq!(executor.variable('b'), 2);
}

#[test]
fn test_uppercase_source_runs() {
    let executor = run_program("10 LET X = 2\n20 IF X > 1 THEN 40\n30 LET Y = 1\n40 LET Z = X\n");
    assert_eq!(executor.variable('x'), 2);
    assert_eq!(executor.variable('y'), 0);
    assert_eq!(executor.variable('z'), 2);
}
