//! Deploy pipeline end-to-end tests
//!
//! Runs the real binary against a sandboxed project with a stub template
//! and stub `npm`/`serverless` executables, so the whole step sequence is
//! exercised without the actual tool chain.

#![cfg(unix)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

fn write(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn write_executable(path: &Path, content: &str) {
    use std::os::unix::fs::PermissionsExt;
    write(path, content);
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
}

/// A deployable sandbox: template dir, project dir with markers, stub
/// `npm` on PATH and stub `serverless` inside the project.
struct Sandbox {
    _root: TempDir,
    template: PathBuf,
    project: PathBuf,
    bin: PathBuf,
    log: PathBuf,
}

impl Sandbox {
    fn new() -> Self {
        let root = TempDir::new().unwrap();
        let template = root.path().join("template");
        let project = root.path().join("project");
        let bin = root.path().join("bin");
        let log = root.path().join("stub.log");

        for entry in [
            "package.json",
            "package-lock.json",
            "serverless.yml",
            "tsconfig.json",
            "webpack.config.js",
        ] {
            write(&template.join(entry), &format!("template {entry}\n"));
        }
        write(&template.join("src/handler.js"), "exports.handler = 1;\n");

        write(&project.join("serverless.yml"), "service: old\n");
        write(&project.join("config/appconfig.json"), "{}\n");

        fs::create_dir_all(&bin).unwrap();
        let sandbox = Self {
            _root: root,
            template,
            project,
            bin,
            log,
        };
        sandbox.stub_npm("exit 0");
        sandbox.stub_serverless("exit 0");
        sandbox
    }

    fn stub_npm(&self, behavior: &str) {
        write_executable(
            &self.bin.join("npm"),
            &format!("#!/bin/sh\necho \"npm $@\" >> \"$STUB_LOG\"\n{behavior}\n"),
        );
    }

    fn stub_serverless(&self, behavior: &str) {
        write_executable(
            &self.project.join("node_modules/serverless/bin/serverless"),
            &format!("#!/bin/sh\necho \"serverless $@\" >> \"$STUB_LOG\"\n{behavior}\n"),
        );
    }

    fn deploy(&self, args: &[&str]) -> std::process::Output {
        self.deploy_with_env(args, &[])
    }

    fn deploy_with_env(&self, args: &[&str], env: &[(&str, &str)]) -> std::process::Output {
        let path = format!(
            "{}:{}",
            self.bin.display(),
            std::env::var("PATH").unwrap_or_default()
        );
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_jsonbay"));
        cmd.arg("deploy")
            .args(args)
            .current_dir(&self.project)
            .env("PATH", path)
            .env("JSONBAY_TEMPLATE_DIR", &self.template)
            .env("STUB_LOG", &self.log);
        for (key, value) in env {
            cmd.env(key, value);
        }
        cmd.output().expect("Failed to run jsonbay deploy")
    }

    fn stub_log(&self) -> String {
        fs::read_to_string(&self.log).unwrap_or_default()
    }

    fn artifact(&self) -> serde_json::Value {
        let content =
            fs::read_to_string(self.project.join("config/appconfig.json")).unwrap();
        serde_json::from_str(&content).unwrap()
    }
}

#[test]
fn deploy_runs_the_full_step_sequence() {
    let sandbox = Sandbox::new();
    sandbox.stub_serverless(
        "if [ \"$1\" = \"info\" ]; then echo \"endpoints: https://abc.example.com/api\"; fi\nexit 0",
    );

    let output = sandbox.deploy(&["--readonly", "--apiRoute", "/v2"]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    // External tool chain ran in order: install, build, deploy, info.
    let log = sandbox.stub_log();
    let positions: Vec<usize> = ["npm i", "npm run build", "serverless deploy", "serverless info"]
        .iter()
        .map(|needle| log.find(needle).unwrap_or_else(|| panic!("missing '{needle}' in log: {log}")))
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]), "out of order: {log}");

    // Template files were synchronized over the stale project copies.
    let synced = fs::read_to_string(sandbox.project.join("serverless.yml")).unwrap();
    assert_eq!(synced, "template serverless.yml\n");
    assert!(sandbox.project.join("src/handler.js").exists());

    // The artifact was persisted with flag overrides merged over defaults.
    let artifact = sandbox.artifact();
    assert_eq!(artifact["readOnly"], serde_json::json!(true));
    assert_eq!(artifact["routes"]["apiRoutePath"], serde_json::json!("/v2"));
    assert_eq!(
        artifact["routes"]["graphqlRoutePath"],
        serde_json::json!("/graphql")
    );

    // Captured info output was passed through for display.
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("endpoints: https://abc.example.com/api"));
}

#[test]
fn deploy_merges_flags_over_the_existing_artifact() {
    let sandbox = Sandbox::new();
    write(
        &sandbox.project.join("config/appconfig.json"),
        r#"{"routes": {"swaggerUIRoutePath": "/console"}}"#,
    );

    let output = sandbox.deploy(&["--graphqlRoute", "/gql"]);
    assert!(output.status.success());

    let artifact = sandbox.artifact();
    // Flag override applied, artifact value preserved, defaults filled in.
    assert_eq!(artifact["routes"]["graphqlRoutePath"], serde_json::json!("/gql"));
    assert_eq!(
        artifact["routes"]["swaggerUIRoutePath"],
        serde_json::json!("/console")
    );
    assert_eq!(artifact["routes"]["apiRoutePath"], serde_json::json!("/api"));
}

#[test]
fn build_failure_prevents_deploy_and_info() {
    let sandbox = Sandbox::new();
    sandbox.stub_npm("if [ \"$1\" = \"run\" ]; then exit 1; fi\nexit 0");

    let output = sandbox.deploy(&[]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Build code"), "unexpected stderr: {stderr}");

    let log = sandbox.stub_log();
    assert!(!log.contains("serverless deploy"), "deploy ran after failed build: {log}");
    assert!(!log.contains("serverless info"), "info ran after failed build: {log}");
}

#[test]
fn info_fetch_failure_still_reports_deployed() {
    let sandbox = Sandbox::new();
    sandbox.stub_serverless("if [ \"$1\" = \"info\" ]; then exit 1; fi\nexit 0");

    let output = sandbox.deploy(&[]);
    // Deployment success and info retrieval are decoupled outcomes.
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Stack deployed"), "unexpected stdout: {stdout}");
    assert!(
        stdout.contains("fetching endpoint info failed"),
        "unexpected stdout: {stdout}"
    );
}

#[test]
fn local_dev_skips_install_and_build() {
    let sandbox = Sandbox::new();
    // Any npm invocation would fail loudly.
    sandbox.stub_npm("exit 1");

    let output = sandbox.deploy_with_env(&[], &[("JSONBAY_ENV", "local")]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let log = sandbox.stub_log();
    assert!(!log.contains("npm"), "npm was invoked in local dev mode: {log}");
    assert!(log.contains("serverless deploy"));
}

#[test]
fn missing_template_entry_aborts_before_any_subprocess() {
    let sandbox = Sandbox::new();
    fs::remove_file(sandbox.template.join("webpack.config.js")).unwrap();

    let output = sandbox.deploy(&[]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Copy template files"),
        "unexpected stderr: {stderr}"
    );
    assert_eq!(sandbox.stub_log(), "");
}
