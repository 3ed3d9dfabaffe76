#![allow(dead_code)]

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

pub const REQUIRED_VARS: [&str; 5] = [
    "AZURE_API_ENDPOINT_405B",
    "AZURE_API_KEY_405B",
    "AZURE_API_ENDPOINT_70B",
    "AZURE_API_KEY_70B",
    "OPENAI_API_KEY",
];

/// Command with every required variable pointing at an unroutable local port.
pub fn configured_command() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_llm-tester"));
    cmd.env("AZURE_API_ENDPOINT_405B", "http://127.0.0.1:9/large")
        .env("AZURE_API_KEY_405B", "large-key")
        .env("AZURE_API_ENDPOINT_70B", "http://127.0.0.1:9/small")
        .env("AZURE_API_KEY_70B", "small-key")
        .env("OPENAI_API_KEY", "sk-test")
        .env("OPENAI_BASE_URL", "http://127.0.0.1:9/v1")
        .env_remove("MODEL_TIMEOUT_SECS")
        .env_remove("GATEWAY_MAX_TOKENS")
        .env_remove("RUST_LOG")
        .env_remove("LOG_OUTPUT")
        .env_remove("LOG_FORMAT")
        .env_remove("LOG_FILE_PATH");
    cmd
}

pub fn run_with_stdin(mut cmd: Command, stdin: &str) -> Output {
    let mut child = cmd
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to run llm-tester binary");

    child
        .stdin
        .take()
        .expect("stdin should be piped")
        .write_all(stdin.as_bytes())
        .expect("failed to write stdin");

    child
        .wait_with_output()
        .expect("failed to wait for llm-tester binary")
}

pub fn unique_temp_dir(suffix: &str) -> PathBuf {
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock should be after unix epoch")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!(
        "llm-tester-{suffix}-{stamp}-{}",
        std::process::id()
    ));
    fs::create_dir_all(&dir).expect("failed to create temp directory");
    dir
}
