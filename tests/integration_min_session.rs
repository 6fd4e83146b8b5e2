// Drives the typetest binary through a pseudo terminal: a typo, its
// correction, completion and the results screen, then checks what was
// persisted. Unix-only and ignored by default; run with
// `cargo test --test integration_min_session -- --ignored`.

#![cfg(unix)]

use std::process::Command;
use std::time::Duration;

use expectrl::{Eof, Session};
use tempfile::tempdir;
use typetest::history::SessionLog;

#[test]
#[ignore]
fn corrected_session_reaches_results() -> Result<(), Box<dyn std::error::Error>> {
    // isolated home so bests, history and config start empty
    let home = tempdir()?;
    let state_dir = home.path().join(".local").join("state").join("typetest");
    let bin = assert_cmd::cargo::cargo_bin("typetest");

    let mut cmd = Command::new(bin);
    cmd.env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join("config"))
        .args(["-p", "hi", "--config"])
        .arg(home.path().join("config.json"));

    let mut p = Session::spawn(cmd)?;
    p.set_expect_timeout(Some(Duration::from_secs(5)));

    p.expect("(esc)ape")?;

    // wrong second character, undone with backspace
    p.send("hx")?;
    p.send("\x7f")?;
    p.send("i")?;

    // the typo still counts under the default permanent counting
    p.expect("50% acc   2 chars   1 errors")?;
    p.expect("new personal best!")?;

    p.send("\x1b")?;
    p.expect(Eof)?;

    assert!(state_dir.join("bests.json").exists());
    let records = SessionLog::new(state_dir.join("history.csv")).read_all()?;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].errors, 1);
    assert_eq!(records[0].total_chars, 2);
    assert!(records[0].new_best);
    Ok(())
}
