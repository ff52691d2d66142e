//! Binary invocation tests for the commands that need no sound card.

use std::process::Command;

fn musigen() -> Command {
    Command::new(env!("CARGO_BIN_EXE_musigen"))
}

#[test]
fn render_prints_levels() {
    let output = musigen()
        .args(["render", "--source", "fm", "--blocks", "4", "--frames", "256"])
        .output()
        .expect("failed to run musigen render");
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("fm: 4 blocks x 256 frames x 1 ch"));
    assert!(stdout.contains("output  : peak"));
    assert!(stdout.contains("faults  : 0"));
}

#[test]
fn render_stop_is_silent() {
    let output = musigen()
        .args(["render", "--source", "stop", "--blocks", "2"])
        .output()
        .expect("failed to run musigen render");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("output  : peak 0.000 (-inf dB)"));
}

#[test]
fn unknown_source_is_rejected() {
    let output = musigen()
        .args(["render", "--source", "square"])
        .output()
        .expect("failed to run musigen render");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown source"));
}

#[test]
fn oversized_block_is_rejected() {
    let output = musigen()
        .args(["render", "--frames", "40000"])
        .output()
        .expect("failed to run musigen render");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("exceeds delay capacity"));
}
