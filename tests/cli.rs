use assert_cmd::Command;

#[test]
fn refuses_to_run_without_a_tty() {
    // piped stdin is never a tty
    let output = Command::cargo_bin("proctor")
        .unwrap()
        .write_stdin("")
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("stdin must be a tty"), "stderr was: {stderr}");
}

#[test]
fn help_lists_exam_options() {
    let output = Command::cargo_bin("proctor")
        .unwrap()
        .arg("--help")
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--questions"));
    assert!(stdout.contains("--seconds-per-question"));
    assert!(stdout.contains("--report-url"));
}
