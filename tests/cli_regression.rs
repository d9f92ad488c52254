//! End-to-end runs of the `tapkit` binary over directories of .tap files.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;

/// Creates a scratch directory of pre-recorded TAP units and cleans it up
/// on drop.
struct TapDir {
    path: PathBuf,
}

impl TapDir {
    fn new(tag: &str, units: &[(&str, &str)]) -> Self {
        let path = std::env::temp_dir().join(format!(
            "tapkit-cli-{}-{}",
            tag,
            std::process::id()
        ));
        fs::create_dir_all(&path).unwrap();
        for (name, body) in units {
            fs::write(path.join(name), body).unwrap();
        }
        Self { path }
    }

    fn arg(&self) -> &str {
        self.path.to_str().unwrap()
    }
}

impl Drop for TapDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

fn tapkit() -> Command {
    Command::cargo_bin("tapkit").unwrap()
}

#[test]
fn all_passing_units_exit_zero_with_a_tap_summary() {
    let dir = TapDir::new(
        "pass",
        &[
            ("a.tap", "1..1\nok 1 - alpha\n"),
            ("b.tap", "1..2\nok 1\nok 2\n"),
        ],
    );

    tapkit()
        .arg(dir.arg())
        .assert()
        .success()
        .stdout(predicate::str::contains("1..2"))
        .stdout(predicate::str::contains("ok 1 - "))
        .stdout(predicate::str::contains("ok 2 - "))
        .stdout(predicate::str::contains("not ok").not());
}

#[test]
fn a_failing_unit_exits_nonzero_and_is_named() {
    let dir = TapDir::new(
        "fail",
        &[
            ("good.tap", "1..1\nok 1\n"),
            ("sad.tap", "1..1\nnot ok 1 - broke\n"),
        ],
    );

    tapkit()
        .arg(dir.arg())
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("not ok"))
        .stdout(predicate::str::contains("sad.tap"))
        .stdout(predicate::str::contains("# Failed 1 test out of 2"));
}

#[test]
fn plan_short_units_count_as_failures() {
    let dir = TapDir::new("short", &[("early.tap", "1..3\nok 1\nok 2\n")]);

    tapkit().arg(dir.arg()).assert().failure().code(1);
}

#[test]
fn empty_directory_is_a_successful_empty_run() {
    let dir = TapDir::new("empty", &[]);

    tapkit()
        .arg(dir.arg())
        .assert()
        .success()
        .stdout(predicate::str::contains("ok").not());
}

#[test]
fn ext_filter_limits_which_files_run() {
    let dir = TapDir::new(
        "ext",
        &[
            ("unit.t", "1..1\nok 1\n"),
            ("notes.txt", "this is not TAP\n"),
            ("broken.tap", "1..1\nnot ok 1\n"),
        ],
    );

    tapkit()
        .arg(dir.arg())
        .args(["--ext", "t"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1..1"));
}

#[test]
fn verbose_report_goes_to_stderr_leaving_stdout_pure_tap() {
    let dir = TapDir::new("verbose", &[("a.tap", "1..1\nok 1\n")]);

    tapkit()
        .arg(dir.arg())
        .arg("--verbose")
        .assert()
        .success()
        .stdout(predicate::str::contains("PASS").not())
        .stderr(predicate::str::contains("PASS"))
        .stderr(predicate::str::contains("Unit summary"));
}

#[test]
fn todo_failures_in_a_unit_do_not_fail_the_run() {
    let dir = TapDir::new(
        "todo",
        &[("wip.tap", "1..2\nok 1\nnot ok 2 # TODO finish\n")],
    );

    tapkit().arg(dir.arg()).assert().success();
}
