use std::io::Write;
use std::process::Command;

fn walter() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_walter"));
    cmd.env("WALTER_LOG_LEVEL", "error");
    cmd
}

#[test]
fn test_cli_replays_body_file_in_chunks() {
    let mut body = tempfile::NamedTempFile::new().unwrap();
    body.write_all(&[b'x'; 1000]).unwrap();

    let output = walter()
        .args(["replay", "--method", "POST", "--url", "/upload", "--chunk-size", "64"])
        .arg("--body-file")
        .arg(body.path())
        .output()
        .expect("run cli");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.starts_with("HTTP/1.1 201 Created\r\n"));
    assert!(stdout.contains(r#"{"bytes":1000}"#));
}

#[test]
fn test_cli_chunk_size_from_environment() {
    let output = walter()
        .env("WALTER_CHUNK_SIZE", "0x2")
        .args(["replay", "-m", "PUT", "-u", "/notes", "-b", r#"{"title":"milk"}"#])
        .output()
        .expect("run cli");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains(r#""title":"milk""#));
}

#[test]
fn test_cli_missing_body_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let output = walter()
        .args(["replay", "-m", "POST", "-u", "/upload", "--body-file"])
        .arg(dir.path().join("absent.bin"))
        .output()
        .expect("run cli");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to read body file"));
}

#[test]
fn test_cli_routes() {
    let output = walter().arg("routes").output().expect("run cli");
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("DELETE\t/notes\tbuffered"));
}
