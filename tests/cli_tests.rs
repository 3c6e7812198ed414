//! CLI integration tests for liveconf
//!
//! These run the built binary against temporary configuration files and
//! check exit status, stdout and the resulting file content.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

/// Helper to run liveconf against a configuration file
fn run_liveconf(file: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_liveconf"))
        .arg("--file")
        .arg(file)
        .args(args)
        .env_remove("LIVECONF_FILE")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute liveconf")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

/// Create a temporary configuration file with the given content
fn create_config(content: &str) -> (std::path::PathBuf, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("config.conf");
    fs::write(&path, content).expect("Failed to write config");
    (path, temp_dir)
}

mod cli_parsing {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_help_flag() {
        let output = Command::new(env!("CARGO_BIN_EXE_liveconf"))
            .arg("--help")
            .output()
            .unwrap();
        assert!(output.status.success());
        assert!(stdout(&output).contains("Live system configuration store"));
    }

    #[test]
    fn test_set_requires_assignments() {
        let (path, _dir) = create_config("");
        let output = run_liveconf(&path, &["set"]);
        assert!(!output.status.success());
    }

    #[test]
    fn test_set_rejects_malformed_assignment() {
        let (path, _dir) = create_config("");
        let output = run_liveconf(&path, &["set", "NOEQUALS"]);
        assert!(!output.status.success());
        assert_eq!(fs::read_to_string(&path).unwrap(), "");
    }
}

mod commands {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_get() {
        let (path, _dir) = create_config("USER_NAME=\"bob\"\n");

        let output = run_liveconf(&path, &["get", "USER_NAME"]);
        assert!(output.status.success());
        assert_eq!(stdout(&output), "bob\n");

        let output = run_liveconf(&path, &["get", "HOSTNAME"]);
        assert!(output.status.success());
        assert_eq!(stdout(&output), "\n");
    }

    #[test]
    fn test_get_missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let output = run_liveconf(&temp_dir.path().join("missing.conf"), &["get", "USER_NAME"]);
        assert!(output.status.success());
        assert_eq!(stdout(&output), "\n");
    }

    #[test]
    fn test_load() {
        let (path, _dir) = create_config("A=1\nB=(x 'y z')\nC=\"\"\n");

        let output = run_liveconf(&path, &["load", "B", "A", "C", "D"]);
        assert!(output.status.success());
        assert_eq!(stdout(&output), "B=(\"x\" \"y z\")\nA=\"1\"\n");
    }

    #[test]
    fn test_load_json() {
        let (path, _dir) = create_config("A=1\nB=(x y)\n");

        let output = run_liveconf(&path, &["load", "--json", "A", "B"]);
        assert!(output.status.success());

        let value: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
        assert_eq!(value["A"], "1");
        assert_eq!(value["B"], serde_json::json!(["x", "y"]));
    }

    #[test]
    fn test_set_and_get() {
        let (path, _dir) = create_config("# live\nUSER_NAME=\"bob\"\n");

        let output = run_liveconf(&path, &["set", "USER_NAME=alice", "LIVE_SERVICES=(ssh cron)"]);
        assert!(output.status.success(), "{}", stderr(&output));
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "# live\nUSER_NAME=\"alice\"\n\nLIVE_SERVICES=(\"ssh\" \"cron\")\n"
        );

        let output = run_liveconf(&path, &["get", "USER_NAME"]);
        assert_eq!(stdout(&output), "alice\n");
    }

    #[test]
    fn test_set_empty_needs_declared() {
        let (path, _dir) = create_config("A=\"1\"\n");

        let output = run_liveconf(&path, &["set", "K="]);
        assert!(output.status.success());
        assert_eq!(fs::read_to_string(&path).unwrap(), "A=\"1\"\n");

        let output = run_liveconf(&path, &["set", "--declared", "K="]);
        assert!(output.status.success());
        assert_eq!(fs::read_to_string(&path).unwrap(), "A=\"1\"\n\nK=\"\"\n");
    }

    #[test]
    fn test_set_only_selected_keys() {
        let (path, _dir) = create_config("A=\"1\"\n");

        let output = run_liveconf(&path, &["set", "--only", "A", "A=2", "B=3"]);
        assert!(output.status.success());
        assert_eq!(fs::read_to_string(&path).unwrap(), "A=\"2\"\n");
    }

    #[test]
    fn test_sync_updates_existing_keys_only() {
        let (path, _dir) = create_config("HOSTNAME=\"old\"\n");

        let output = run_liveconf(&path, &["sync", "HOSTNAME=live", "USER_NAME=user"]);
        assert!(output.status.success());
        assert_eq!(fs::read_to_string(&path).unwrap(), "HOSTNAME=\"live\"\n");
    }

    #[test]
    fn test_keys() {
        let (path, _dir) = create_config("# X=1\nB=1\nA=2\nB=3\n");

        let output = run_liveconf(&path, &["keys"]);
        assert!(output.status.success());
        assert_eq!(stdout(&output), "B\nA\n");
    }
}

mod failures {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_load_missing_file_fails_with_logged_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing.conf");

        let output = run_liveconf(&path, &["load", "USER_NAME"]);
        assert!(!output.status.success());
        assert!(stdout(&output).is_empty());
        assert!(stderr(&output).contains("not found"));
    }

    #[test]
    fn test_set_missing_file_fails_without_creating_it() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing.conf");

        let output = run_liveconf(&path, &["set", "USER_NAME=user"]);
        assert!(!output.status.success());
        assert!(!path.exists());
    }

    #[test]
    fn test_set_unrepresentable_value_fails() {
        let (path, _dir) = create_config("A=\"1\"\n");

        let output = run_liveconf(&path, &["set", "A=''x''"]);
        assert!(!output.status.success());
        assert!(stderr(&output).contains("cannot be stored"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "A=\"1\"\n");
    }
}
