//! Integration tests for the chassis binary.
//!
//! Each test builds a descriptor and a handful of JSON manifests in a temp
//! directory and runs the CLI against them. HOME and XDG_CONFIG_HOME point
//! into the temp directory so a developer's own config never leaks in.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// A scratch program directory.
struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn write(&self, relative: &str, contents: &str) -> &Self {
        let path = self.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, contents).unwrap();
        self
    }

    fn descriptor(&self, execution_type: &str, modules: &str) -> &Self {
        self.write(
            "programdata.json",
            &format!(
                r#"{{"PROGRAM": {{"EXECUTIONTYPE": "{}", "LOGRINGLEN": 8}}, "MODULES": {}}}"#,
                execution_type, modules
            ),
        )
    }

    /// Get a command for running chassis inside the fixture.
    fn chassis(&self) -> Command {
        let mut cmd = Command::cargo_bin("chassis").unwrap();
        cmd.current_dir(self.path())
            .env("HOME", self.path())
            .env("XDG_CONFIG_HOME", self.path().join("xdg"))
            .env_remove("CHASSIS_CONFIG")
            .env_remove("RUST_LOG");
        cmd
    }
}

mod basics {
    use super::*;

    #[test]
    fn help_describes_the_tool() {
        Fixture::new()
            .chassis()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("lifecycle"));
    }

    #[test]
    fn version_flag_works() {
        Fixture::new()
            .chassis()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("chassis"));
    }

    #[test]
    fn types_lists_builtin_modes() {
        Fixture::new()
            .chassis()
            .arg("types")
            .assert()
            .success()
            .stdout(predicate::str::contains("CLITOOL (run modules: 1)"))
            .stdout(predicate::str::contains("WEBSERVER (run modules: 0)"));
    }

    #[test]
    fn completion_generates_script() {
        Fixture::new()
            .chassis()
            .args(["completion", "bash"])
            .assert()
            .success()
            .stdout(predicate::str::contains("chassis"));
    }
}

mod init {
    use super::*;

    #[test]
    fn writes_skeleton_descriptor() {
        let fx = Fixture::new();
        fx.chassis()
            .args(["init", "--execution-type", "WEBSERVER", "--ring-len", "16"])
            .assert()
            .success()
            .stdout(predicate::str::contains("WEBSERVER"));

        let written = fs::read_to_string(fx.path().join("programdata.json")).unwrap();
        let json: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(json["PROGRAM"]["EXECUTIONTYPE"], "WEBSERVER");
        assert_eq!(json["PROGRAM"]["LOGRINGLEN"], 16);
    }

    #[test]
    fn refuses_to_overwrite_without_force() {
        let fx = Fixture::new();
        fx.chassis().arg("init").assert().success();
        fx.chassis()
            .arg("init")
            .assert()
            .failure()
            .stderr(predicate::str::contains("already exists"));
        fx.chassis().args(["init", "--force"]).assert().success();
    }

    #[test]
    fn rejects_unknown_execution_type() {
        let fx = Fixture::new();
        fx.chassis()
            .args(["init", "--execution-type", "TKINTERGUI"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Unknown execution type"));
        assert!(!fx.path().join("programdata.json").exists());
    }

    #[test]
    fn skeleton_runs_cleanly_for_server_modes() {
        let fx = Fixture::new();
        fx.chassis()
            .args(["init", "--execution-type", "FILETALKSERVER"])
            .assert()
            .success();
        fx.chassis().arg("run").assert().success();
    }
}

mod discover {
    use super::*;

    #[test]
    fn lists_modules_from_the_search_path() {
        let fx = Fixture::new();
        fx.descriptor("WEBSERVER", r#"{"NAMES": ["core"]}"#)
            .write("modules/core.json", r#"{"MODULES": {"NAMES": ["storage"]}}"#)
            .write("modules/storage.json", r#"{"SYMBOLS": ["BUCKET"]}"#);

        fx.chassis()
            .args(["--module-path", "modules", "discover"])
            .assert()
            .success()
            .stdout(predicate::str::contains("execution type: WEBSERVER"))
            .stdout(predicate::str::contains("modules (2):"))
            .stdout(predicate::str::contains("  - core"))
            .stdout(predicate::str::contains("  - storage"));
    }

    #[test]
    fn json_output_is_machine_readable() {
        let fx = Fixture::new();
        fx.descriptor("WEBSERVER", r#"{"NAMES": ["core"]}"#)
            .write("modules/core.json", "{}");

        let output = fx
            .chassis()
            .args(["--module-path", "modules", "--json", "discover"])
            .output()
            .unwrap();
        assert!(output.status.success());

        let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(json["execution_type"], "WEBSERVER");
        assert_eq!(json["modules"], serde_json::json!(["core"]));
        assert_eq!(json["log"], serde_json::json!([]));
    }

    #[test]
    fn directories_resolve_relative_to_the_descriptor() {
        let fx = Fixture::new();
        fx.write(
            "app/programdata.json",
            r#"{"PROGRAM": {"EXECUTIONTYPE": "INTERACTIVEMENU", "LOGRINGLEN": 4},
                "MODULES": {"DIRS": ["plugins"]}}"#,
        )
        .write("app/plugins/menu.json", "{}")
        .write("app/plugins/help.json", "{}");

        fx.chassis()
            .args(["--descriptor", "app/programdata.json", "discover"])
            .assert()
            .success()
            .stdout(predicate::str::contains("modules (2):"))
            .stdout(predicate::str::contains("  - menu"))
            .stdout(predicate::str::contains("  - help"));
    }

    #[test]
    fn missing_module_names_its_requester() {
        let fx = Fixture::new();
        fx.descriptor("WEBSERVER", r#"{"NAMES": ["ghost"]}"#);

        fx.chassis()
            .arg("discover")
            .assert()
            .failure()
            .stderr(predicate::str::contains("module not found: name:ghost"))
            .stderr(predicate::str::contains("program descriptor"));
    }

    #[test]
    fn missing_descriptor_fails() {
        Fixture::new()
            .chassis()
            .arg("discover")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Failed to load"));
    }

    #[test]
    fn descriptor_path_from_config_file() {
        let fx = Fixture::new();
        fx.write(
            "elsewhere/app.json",
            r#"{"PROGRAM": {"EXECUTIONTYPE": "WEBSERVER", "LOGRINGLEN": 8}}"#,
        );
        let config = format!(
            "descriptor = {:?}\n",
            fx.path().join("elsewhere/app.json").display().to_string()
        );
        fx.write("chassis.toml", &config);

        fx.chassis()
            .env("CHASSIS_CONFIG", fx.path().join("chassis.toml"))
            .arg("discover")
            .assert()
            .success()
            .stdout(predicate::str::contains("modules (0):"));
    }

    #[test]
    fn invalid_config_fails() {
        let fx = Fixture::new();
        fx.write("chassis.toml", "colour = \"blue\"\n");

        fx.chassis()
            .env("CHASSIS_CONFIG", fx.path().join("chassis.toml"))
            .arg("types")
            .assert()
            .failure()
            .stderr(predicate::str::contains("configuration"));
    }
}

mod run {
    use super::*;

    #[test]
    fn prints_log_sections_and_exported_snowflakes() {
        let fx = Fixture::new();
        fx.descriptor("WEBSERVER", r#"{"NAMES": ["tickets"]}"#).write(
            "modules/tickets.json",
            r#"{"SNOWFLAKES": [
                {"NAME": "ticket", "DEFAULT": 100, "POLICY": "EXPORTED"},
                {"NAME": "scratch", "DEFAULT": 0, "POLICY": "SESSION"}
            ]}"#,
        );

        fx.chassis()
            .args(["--module-path", "modules", "run", "--pulses", "2"])
            .assert()
            .success()
            .stdout(predicate::str::contains("ringlog:"))
            .stdout(predicate::str::contains("noticed flags:"))
            .stdout(predicate::str::contains("  - ticket: 100"))
            .stdout(predicate::str::contains("scratch").not());
    }

    #[test]
    fn clitool_without_run_module_fails_after_reporting() {
        let fx = Fixture::new();
        fx.descriptor("CLITOOL", r#"{"NAMES": ["lib"]}"#)
            .write("modules/lib.json", "{}");

        fx.chassis()
            .args(["--module-path", "modules", "run"])
            .assert()
            .failure()
            .stdout(predicate::str::contains("code: NORUNMODULE"))
            .stdout(predicate::str::contains("\n  lib\n"))
            .stderr(predicate::str::contains("error: 1 error(s) logged: NORUNMODULE"));
    }

    #[test]
    fn json_report_carries_final_stage() {
        let fx = Fixture::new();
        fx.descriptor("WEBSERVER", r#"{}"#);

        let output = fx.chassis().args(["--json", "run"]).output().unwrap();
        assert!(output.status.success());

        let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(json["stage"], "TEARDOWN");
        assert_eq!(json["snowflakes"], serde_json::json!({}));
        assert_eq!(json["noticed"], serde_json::json!([]));
    }

    #[test]
    fn quiet_suppresses_the_report() {
        let fx = Fixture::new();
        fx.descriptor("WEBSERVER", r#"{}"#);

        fx.chassis()
            .args(["-q", "run"])
            .assert()
            .success()
            .stdout(predicate::str::is_empty());
    }
}
