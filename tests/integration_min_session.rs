// Drives the compiled binary through a PTY so the real event loop and
// crossterm input handling are exercised end to end.
//
// Unix-only and ignored by default; run manually via
// `cargo test --test integration_min_session -- --ignored`.

#![cfg(unix)]

use std::time::Duration;

use expectrl::{spawn, Eof};

#[test]
#[ignore]
fn prefilled_login_then_quit_exits() -> Result<(), Box<dyn std::error::Error>> {
    let bin = assert_cmd::cargo::cargo_bin("proctor");
    let cmd = format!(
        "{} --name Ada --id 42 --class B --no-lock-window",
        bin.display()
    );

    let mut p = spawn(cmd)?;
    std::thread::sleep(Duration::from_millis(200));

    // start the exam with the prefilled details
    p.send("\r")?;
    std::thread::sleep(Duration::from_millis(200));

    p.send("1")?;
    std::thread::sleep(Duration::from_millis(100));

    // ESC ends the running exam, a second ESC leaves the results screen
    p.send("\x1b")?;
    std::thread::sleep(Duration::from_millis(200));
    p.send("\x1b")?;

    p.expect(Eof)?;
    Ok(())
}
