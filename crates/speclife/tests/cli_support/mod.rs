#![allow(dead_code)]

use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

pub fn speclife_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_speclife"))
}

pub fn run_cli(args: &[&str], envs: &[(&str, &str)], cwd: &Path) -> Output {
    let mut cmd = Command::new(speclife_bin());
    cmd.args(args).current_dir(cwd).env_remove("SPECLIFE_CONFIG");
    for (key, value) in envs {
        cmd.env(key, value);
    }
    cmd.output().expect("failed to execute speclife CLI")
}

pub fn assert_cli_success(output: &Output, args: &[&str]) {
    assert!(
        output.status.success(),
        "command failed: {}\nstdout:\n{}\nstderr:\n{}",
        args.join(" "),
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
}

pub fn assert_cli_failure(output: &Output, args: &[&str]) -> String {
    assert!(
        !output.status.success(),
        "command unexpectedly succeeded: {}\nstdout:\n{}",
        args.join(" "),
        String::from_utf8_lossy(&output.stdout)
    );
    String::from_utf8_lossy(&output.stderr).to_string()
}

pub fn run_cli_json_value(args: &[&str], envs: &[(&str, &str)], cwd: &Path) -> serde_json::Value {
    let output = run_cli(args, envs, cwd);
    assert_cli_success(&output, args);

    let stdout = String::from_utf8_lossy(&output.stdout);
    let json_start = stdout.find(['{', '[']).unwrap_or_else(|| {
        panic!(
            "no JSON payload found in output\nstdout:\n{}\nstderr:\n{}",
            stdout,
            String::from_utf8_lossy(&output.stderr)
        )
    });
    let mut deserializer = serde_json::Deserializer::from_str(&stdout[json_start..]);
    serde_json::Value::deserialize(&mut deserializer).unwrap_or_else(|err| {
        panic!(
            "failed to parse JSON output: {}\nstdout:\n{}",
            err, stdout
        )
    })
}

pub fn run_cli_json<T: DeserializeOwned>(args: &[&str], envs: &[(&str, &str)], cwd: &Path) -> T {
    let value = run_cli_json_value(args, envs, cwd);
    serde_json::from_value(value).expect("failed to deserialize JSON output")
}
