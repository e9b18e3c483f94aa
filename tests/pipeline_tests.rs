// End-to-end pipeline tests: whole programs through runner::run, checking
// the single result string the host receives.

use knl::runner::{ERROR_PREFIX, SUCCESS_TRAILER};
use knl::{runner, QueuedInput, RunOutcome};

fn run(source: &str) -> RunOutcome {
    let mut input = QueuedInput::default();
    runner::run(source, &mut input)
}

fn run_with_input(source: &str, lines: &[&str]) -> RunOutcome {
    let mut input = QueuedInput::new(lines.iter().copied());
    runner::run(source, &mut input)
}

/// Program output with the success trailer stripped.
fn output_of(outcome: RunOutcome) -> String {
    assert!(
        outcome.error.is_none(),
        "unexpected failure: {}",
        outcome.text
    );
    outcome
        .text
        .strip_suffix(SUCCESS_TRAILER)
        .expect("missing success trailer")
        .trim_end_matches('\n')
        .to_string()
}

fn error_of(outcome: RunOutcome) -> String {
    assert!(outcome.error.is_some(), "expected a failure, got: {}", outcome.text);
    assert!(outcome.text.starts_with(ERROR_PREFIX));
    outcome.text
}

#[test]
fn arithmetic_matches_host_integers() {
    let out = output_of(run("ಪ್ರಾರಂಭಿಸಿ\nಮುದ್ರಿಸಿ(2 + 3 * 4)\nಮುಗಿಯಿರಿ"));
    assert_eq!(out, "14");

    let out = output_of(run("ಪ್ರಾರಂಭಿಸಿ\nಮುದ್ರಿಸಿ(7 - 10, 6 * 7)\nಮುಗಿಯಿರಿ"));
    assert_eq!(out, "-3 42");
}

#[test]
fn division_is_always_true_division() {
    let out = output_of(run("ಪ್ರಾರಂಭಿಸಿ\nಮುದ್ರಿಸಿ(4 / 2)\nಮುಗಿಯಿರಿ"));
    assert_eq!(out, "2.0");

    let out = output_of(run("ಪ್ರಾರಂಭಿಸಿ\nಮುದ್ರಿಸಿ(7 / 2)\nಮುಗಿಯಿರಿ"));
    assert_eq!(out, "3.5");
}

#[test]
fn string_concatenation_and_comparison() {
    let out = output_of(run(
        "ಪ್ರಾರಂಭಿಸಿ\nಮುದ್ರಿಸಿ(\"ನಮಸ್ಕಾರ\" + \" \" + \"ವಿಶ್ವ\")\nಮುಗಿಯಿರಿ",
    ));
    assert_eq!(out, "ನಮಸ್ಕಾರ ವಿಶ್ವ");

    let out = output_of(run("ಪ್ರಾರಂಭಿಸಿ\nಮುದ್ರಿಸಿ(1 < 2, 2 == 3)\nಮುಗಿಯಿರಿ"));
    assert_eq!(out, "True False");
}

#[test]
fn print_joins_values_with_single_spaces() {
    let out = output_of(run(
        "ಪ್ರಾರಂಭಿಸಿ\nಮುದ್ರಿಸಿ(\"x\", 1, true)\nಮುಗಿಯಿರಿ",
    ));
    assert_eq!(out, "x 1 True");
}

#[test]
fn variables_assign_and_rebind() {
    let out = output_of(run(
        "ಪ್ರಾರಂಭಿಸಿ\nx = 1\nx = x + 1\nಮುದ್ರಿಸಿ(x)\nಮುಗಿಯಿರಿ",
    ));
    assert_eq!(out, "2");
}

#[test]
fn if_elif_else_chain_picks_one_branch() {
    let source = "ಪ್ರಾರಂಭಿಸಿ\n\
                  x = 2\n\
                  ನಂತರ x == 1:\n\
                  ಮುದ್ರಿಸಿ(\"one\")\n\
                  ಇಲ್ಲದಿದ್ದರೆನಂತರ x == 2:\n\
                  ಮುದ್ರಿಸಿ(\"two\")\n\
                  ಇಲ್ಲದಿದ್ದರೆ:\n\
                  ಮುದ್ರಿಸಿ(\"many\")\n\
                  ಮುಗಿಯಿರಿ\n\
                  ಮುಗಿಯಿರಿ";
    assert_eq!(output_of(run(source)), "two");
}

#[test]
fn while_loop_counts_down() {
    let source = "ಪ್ರಾರಂಭಿಸಿ\n\
                  n = 3\n\
                  ಯಾವಾಗ n > 0:\n\
                  ಮುದ್ರಿಸಿ(n)\n\
                  n = n - 1\n\
                  ಮುಗಿಯಿರಿ\n\
                  ಮುಗಿಯಿರಿ";
    assert_eq!(output_of(run(source)), "3\n2\n1");
}

#[test]
fn for_range_is_half_open_and_binding_persists() {
    let source = "ಪ್ರಾರಂಭಿಸಿ\n\
                  ನಿಮಿತ್ತ (i ಒಳಗೆ ವ್ಯಾಪ್ತಿ(0, 3)):\n\
                  ಮುದ್ರಿಸಿ(i)\n\
                  ಮುಗಿಯಿರಿ\n\
                  ಮುದ್ರಿಸಿ(i + 10)\n\
                  ಮುಗಿಯಿರಿ";
    // The loop variable keeps its last bound value after the loop.
    assert_eq!(output_of(run(source)), "0\n1\n2\n12");
}

#[test]
fn break_stops_the_loop_after_one_iteration() {
    let source = "ಪ್ರಾರಂಭಿಸಿ\n\
                  ನಿಮಿತ್ತ (i ಒಳಗೆ ವ್ಯಾಪ್ತಿ(0, 5)):\n\
                  ಮುದ್ರಿಸಿ(i)\n\
                  ಮುರಿದುಬಿಡು\n\
                  ಮುಗಿಯಿರಿ\n\
                  ಮುಗಿಯಿರಿ";
    assert_eq!(output_of(run(source)), "0");
}

#[test]
fn continue_skips_the_rest_of_the_body() {
    let source = "ಪ್ರಾರಂಭಿಸಿ\n\
                  ನಿಮಿತ್ತ (i ಒಳಗೆ ವ್ಯಾಪ್ತಿ(0, 4)):\n\
                  ನಂತರ i == 1:\n\
                  ಮುಂದುವರಿಸು\n\
                  ಮುಗಿಯಿರಿ\n\
                  ಮುದ್ರಿಸಿ(i)\n\
                  ಮುಗಿಯಿರಿ\n\
                  ಮುಗಿಯಿರಿ";
    assert_eq!(output_of(run(source)), "0\n2\n3");
}

#[test]
fn function_call_returns_its_value() {
    let source = "ಪ್ರಾರಂಭಿಸಿ\n\
                  ನಿರ್ಧರಿಸು add(a, b):\n\
                  ಹಿಂತಿರುಗಿಸು a + b\n\
                  ಮುಗಿಯಿರಿ\n\
                  ಮುದ್ರಿಸಿ(add(2, 3))\n\
                  ಮುಗಿಯಿರಿ";
    assert_eq!(output_of(run(source)), "5");
}

#[test]
fn missing_arguments_bind_the_absent_marker_and_extras_drop() {
    let source = "ಪ್ರಾರಂಭಿಸಿ\n\
                  ಕಾರ್ಯ second(a, b):\n\
                  ಹಿಂತಿರುಗಿಸು b\n\
                  ಮುಗಿಯಿರಿ\n\
                  ಮುದ್ರಿಸಿ(second(7))\n\
                  ಮುದ್ರಿಸಿ(second(1, 2, 3))\n\
                  ಮುಗಿಯಿರಿ";
    assert_eq!(output_of(run(source)), "None\n2");
}

#[test]
fn caller_table_is_restored_wholesale_after_a_call() {
    let source = "ಪ್ರಾರಂಭಿಸಿ\n\
                  x = 1\n\
                  ಕಾರ್ಯ f():\n\
                  x = 99\n\
                  ಹಿಂತಿರುಗಿಸು x\n\
                  ಮುಗಿಯಿರಿ\n\
                  r = f()\n\
                  ಮುದ್ರಿಸಿ(x, r)\n\
                  ಮುಗಿಯಿರಿ";
    // Inside the call x reads 99; after it, the caller's binding is back.
    assert_eq!(output_of(run(source)), "1 99");
}

#[test]
fn callee_only_names_do_not_leak_out() {
    let source = "ಪ್ರಾರಂಭಿಸಿ\n\
                  ಕಾರ್ಯ f():\n\
                  y = 5\n\
                  ಹಿಂತಿರುಗಿಸು y\n\
                  ಮುಗಿಯಿರಿ\n\
                  r = f()\n\
                  ಮುದ್ರಿಸಿ(y)\n\
                  ಮುಗಿಯಿರಿ";
    let text = error_of(run(source));
    assert!(text.contains("ಅಪರಿಚಿತ ಚರ/Unknown variable: y"), "got: {}", text);
}

#[test]
fn input_binds_the_raw_line() {
    let source = "ಪ್ರಾರಂಭಿಸಿ\n\
                  x = ಆಗು()\n\
                  ಮುದ್ರಿಸಿ(x)\n\
                  ಮುಗಿಯಿರಿ";
    let out = output_of(run_with_input(source, &["42"]));
    assert_eq!(out, "42");

    // No coercion: the bound value is text, so + concatenates.
    let source = "ಪ್ರಾರಂಭಿಸಿ\n\
                  x = ಆಗು()\n\
                  ಮುದ್ರಿಸಿ(x + x)\n\
                  ಮುಗಿಯಿರಿ";
    let out = output_of(run_with_input(source, &["42"]));
    assert_eq!(out, "4242");
}

#[test]
fn exhausted_input_channel_is_a_runtime_failure() {
    let source = "ಪ್ರಾರಂಭಿಸಿ\nx = ಆಗು()\nಮುಗಿಯಿರಿ";
    let text = error_of(run(source));
    assert!(text.contains("Input failed"), "got: {}", text);
}

#[test]
fn missing_end_keyword_fails_the_parse() {
    let outcome = run("ಪ್ರಾರಂಭಿಸಿ\nಮುದ್ರಿಸಿ(1)\n");
    let text = error_of(outcome);
    assert!(text.contains("end of input"), "got: {}", text);
    assert!(!text.contains('\n'), "no program output on parse failure");
}

#[test]
fn unknown_variable_names_the_identifier() {
    let text = error_of(run("ಪ್ರಾರಂಭಿಸಿ\nಮುದ್ರಿಸಿ(q)\nಮುಗಿಯಿರಿ"));
    assert!(text.contains("ಅಪರಿಚಿತ ಚರ/Unknown variable: q"), "got: {}", text);
}

#[test]
fn unknown_function_names_the_callee() {
    let text = error_of(run("ಪ್ರಾರಂಭಿಸಿ\nf(1)\nಮುಗಿಯಿರಿ"));
    assert!(text.contains("ಅಪರಿಚಿತ ಕಾರ್ಯ/Unknown function: f"), "got: {}", text);
}

#[test]
fn runtime_failure_discards_earlier_output() {
    let source = "ಪ್ರಾರಂಭಿಸಿ\nಮುದ್ರಿಸಿ(\"hi\")\nಮುದ್ರಿಸಿ(q)\nಮುಗಿಯಿರಿ";
    let text = error_of(run(source));
    assert!(!text.contains("hi"), "got: {}", text);
}

#[test]
fn try_except_swallows_the_failure() {
    let source = "ಪ್ರಾರಂಭಿಸಿ\n\
                  ಪ್ರಯತ್ನಿಸು:\n\
                  ಮುದ್ರಿಸಿ(q)\n\
                  ಹೊರಹಾಕು:\n\
                  ಮುದ್ರಿಸಿ(\"caught\")\n\
                  ಮುಗಿಯಿರಿ\n\
                  ಮುಗಿಯಿರಿ";
    assert_eq!(output_of(run(source)), "caught");
}

#[test]
fn finally_runs_after_either_branch() {
    let source = "ಪ್ರಾರಂಭಿಸಿ\n\
                  ಪ್ರಯತ್ನಿಸು:\n\
                  ಮುದ್ರಿಸಿ(1 / 0)\n\
                  ಹೊರಹಾಕು:\n\
                  ಮುದ್ರಿಸಿ(\"caught\")\n\
                  ಕೊನೆಗೂ:\n\
                  ಮುದ್ರಿಸಿ(\"done\")\n\
                  ಮುಗಿಯಿರಿ\n\
                  ಮುಗಿಯಿರಿ";
    assert_eq!(output_of(run(source)), "caught\ndone");
}

#[test]
fn import_and_class_statements_echo_acknowledgments() {
    let source = "ಪ್ರಾರಂಭಿಸಿ\n\
                  ಆಮದು math\n\
                  ಇಂದ math ಆಮದು sqrt\n\
                  ವರ್ಗ Point:\n\
                  ಹೋದರೂ\n\
                  ಮುಗಿಯಿರಿ\n\
                  ಮುಗಿಯಿರಿ";
    assert_eq!(
        output_of(run(source)),
        "Imported module: math\nImported sqrt from math\nDefined class: Point"
    );
}

#[test]
fn redefining_a_function_overwrites_it() {
    let source = "ಪ್ರಾರಂಭಿಸಿ\n\
                  ಕಾರ್ಯ f():\n\
                  ಹಿಂತಿರುಗಿಸು 1\n\
                  ಮುಗಿಯಿರಿ\n\
                  ಕಾರ್ಯ f():\n\
                  ಹಿಂತಿರುಗಿಸು 2\n\
                  ಮುಗಿಯಿರಿ\n\
                  ಮುದ್ರಿಸಿ(f())\n\
                  ಮುಗಿಯಿರಿ";
    assert_eq!(output_of(run(source)), "2");
}

#[test]
fn illegal_characters_surface_as_leading_output_lines() {
    let source = "ಪ್ರಾರಂಭಿಸಿ\nಮುದ್ರಿಸಿ(1) @\nಮುಗಿಯಿರಿ";
    let out = output_of(run(source));
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains("Illegal character '@'"), "got: {}", lines[0]);
    assert_eq!(lines[1], "1");
}

#[test]
fn success_text_ends_with_the_localized_trailer() {
    let outcome = run("ಪ್ರಾರಂಭಿಸಿ\nಮುದ್ರಿಸಿ(1)\nಮುಗಿಯಿರಿ");
    assert!(outcome.error.is_none());
    assert_eq!(outcome.text, format!("1\n{}", SUCCESS_TRAILER));
}

#[test]
fn negation_applies_to_numbers_only() {
    assert_eq!(
        output_of(run("ಪ್ರಾರಂಭಿಸಿ\nಮುದ್ರಿಸಿ(-5 + 2)\nಮುಗಿಯಿರಿ")),
        "-3"
    );
    let text = error_of(run("ಪ್ರಾರಂಭಿಸಿ\nಮುದ್ರಿಸಿ(-\"x\")\nಮುಗಿಯಿರಿ"));
    assert!(text.contains("Cannot negate"), "got: {}", text);
}

#[test]
fn mismatched_operand_types_fail_with_both_names() {
    let text = error_of(run("ಪ್ರಾರಂಭಿಸಿ\nಮುದ್ರಿಸಿ(1 + \"x\")\nಮುಗಿಯಿರಿ"));
    assert!(text.contains("Cannot add int and string"), "got: {}", text);
}

#[test]
fn return_inside_a_loop_exits_the_function() {
    let source = "ಪ್ರಾರಂಭಿಸಿ\n\
                  ಕಾರ್ಯ find():\n\
                  ನಿಮಿತ್ತ (i ಒಳಗೆ ವ್ಯಾಪ್ತಿ(0, 10)):\n\
                  ನಂತರ i == 4:\n\
                  ಹಿಂತಿರುಗಿಸು i\n\
                  ಮುಗಿಯಿರಿ\n\
                  ಮುಗಿಯಿರಿ\n\
                  ಹಿಂತಿರುಗಿಸು 0 - 1\n\
                  ಮುಗಿಯಿರಿ\n\
                  ಮುದ್ರಿಸಿ(find())\n\
                  ಮುಗಿಯಿರಿ";
    assert_eq!(output_of(run(source)), "4");
}
