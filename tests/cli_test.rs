//! Integration tests for the rpem command line
//!
//! These run the built binary against a temporary data directory. None of
//! them touch the network: only commands that need no download are used.

mod common;

use common::{stderr, stdout, TestEnv};
use std::process::Command;

// ============================================
// General
// ============================================

/// Test: --help lists the command groups
#[test]
fn test_help() {
    let env = TestEnv::new();
    let output = env.run(&["--help"]);

    assert!(output.status.success());
    let out = stdout(&output);
    for command in ["hardware", "os", "firmware", "image", "cmd", "run", "defaults"] {
        assert!(out.contains(command), "help is missing '{command}': {out}");
    }
}

/// Test: --version carries the package version
#[test]
fn test_version() {
    let env = TestEnv::new();
    let output = env.run(&["--version"]);

    assert!(output.status.success());
    assert!(stdout(&output).contains(env!("CARGO_PKG_VERSION")));
}

/// Test: the first command seeds the data directory from the catalog
#[test]
fn test_first_run_seeds_defaults() {
    let env = TestEnv::new();
    let output = env.run(&["hardware", "list"]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("rpi4b"));
    assert!(env.data_dir().join("images").is_dir());
    assert!(env.data_dir().join("fw").is_dir());

    let state = env.state();
    assert_eq!(state["catalog_version"], "1.0.0");
    assert_eq!(state["image"].as_array().map(Vec::len), Some(0));
    assert!(state["last_image"].is_null());
    assert!(env.ids("firmware").contains(&"aarch64_tianocore_edk2".to_string()));
}

/// Test: --data-dir wins over RPEM_DATA_DIR
#[test]
fn test_data_dir_flag() {
    let env = TestEnv::new();
    let other = env.dir.path().join("other");

    let output = env.run(&["--data-dir", other.to_str().unwrap(), "status"]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(other.join("index.json").is_file());
    assert!(!env.state_file().exists());
}

/// Test: [paths] data_dir is used when no override is set
#[test]
fn test_data_dir_from_config() {
    let env = TestEnv::new();
    let configured = env.dir.path().join("configured");
    env.write_config(&format!(
        "[paths]\ndata_dir = \"{}\"\n",
        configured.display()
    ));

    let output = Command::new(env!("CARGO_BIN_EXE_rpem"))
        .arg("status")
        .env_remove("RPEM_DATA_DIR")
        .env("RPEM_CONFIG_DIR", env.config_dir())
        .output()
        .expect("Failed to execute rpem");

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(configured.join("index.json").is_file());
}

/// Test: an unparsable config file is an error
#[test]
fn test_invalid_config() {
    let env = TestEnv::new();
    env.write_config("not [valid toml");

    let output = env.run(&["status"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Failed to load global configuration"));
}

/// Test: a corrupt state document is reported and left alone
#[test]
fn test_corrupt_state() {
    let env = TestEnv::new();
    std::fs::create_dir_all(env.data_dir()).unwrap();
    std::fs::write(env.state_file(), "garbage").unwrap();

    let output = env.run(&["hardware", "list"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("is corrupt"));
    assert_eq!(std::fs::read_to_string(env.state_file()).unwrap(), "garbage");
}

// ============================================
// Hardware and operating systems
// ============================================

#[test]
fn test_hardware_add_and_remove() {
    let env = TestEnv::new();

    let output = env.run(&[
        "hardware", "add", "custom", "--name", "Custom Board", "--arch", "arm", "--args",
        "-M raspi2b -m 1g",
    ]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("Added hardware 'custom'"));

    let state = env.state();
    let custom = state["hardware"]
        .as_array()
        .unwrap()
        .iter()
        .find(|hw| hw["id"] == "custom")
        .unwrap()
        .clone();
    assert_eq!(custom["qemu_args"], "-M raspi2b -m 1g");
    assert_eq!(custom["is_default"], false);

    let output = env.run(&["hardware", "remove", "custom"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(!env.ids("hardware").contains(&"custom".to_string()));
}

#[test]
fn test_hardware_add_duplicate() {
    let env = TestEnv::new();
    let output = env.run(&["hardware", "add", "rpi4b", "--name", "Again", "--arch", "aarch64"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("already present for id 'rpi4b'"));
}

#[test]
fn test_hardware_add_invalid_id() {
    let env = TestEnv::new();
    let output = env.run(&["hardware", "add", "a/b", "--name", "Bad", "--arch", "arm"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Invalid hardware id 'a/b'"));
}

/// Test: catalog entries cannot be removed
#[test]
fn test_remove_default_is_refused() {
    let env = TestEnv::new();

    for args in [
        ["hardware", "remove", "rpi4b"],
        ["os", "remove", "netbsd_aarch64"],
        ["firmware", "remove", "aarch64_tianocore_edk2"],
    ] {
        let output = env.run(&args);
        assert_eq!(output.status.code(), Some(1));
        assert!(stderr(&output).contains("Cannot delete default"));
    }
    assert!(env.ids("hardware").contains(&"rpi4b".to_string()));
}

/// Test: an unknown hardware id rejects the whole OS
#[test]
fn test_os_add_unknown_hardware() {
    let env = TestEnv::new();
    env.run(&["status"]);
    let before = env.ids("os");

    let output = env.run(&[
        "os",
        "add",
        "custom_os",
        "--name",
        "Custom",
        "--firmware",
        "aarch64_tianocore_edk2",
        "--hardware",
        "rpi4b",
        "ghost",
        "--url",
        "https://example.com/os.img.xz",
    ]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("No hardware found for id 'ghost'"));
    assert_eq!(env.ids("os"), before);
}

/// Test: entries that others depend on are not removed
#[test]
fn test_remove_referenced_hardware() {
    let env = TestEnv::new();
    env.run(&["hardware", "add", "board", "--name", "Board", "--arch", "arm"]);
    let output = env.run(&[
        "os",
        "add",
        "board_os",
        "--name",
        "Board OS",
        "--firmware",
        "armv7_tianocore_edk2",
        "--hardware",
        "board",
        "--url",
        "https://example.com/os.img",
    ]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let output = env.run(&["hardware", "remove", "board"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("still referenced by operating system 'board_os'"));

    assert!(env.run(&["os", "remove", "board_os"]).status.success());
    assert!(env.run(&["hardware", "remove", "board"]).status.success());
}

// ============================================
// Images and commands
// ============================================

#[test]
fn test_cmd_without_images() {
    let env = TestEnv::new();
    let output = env.run(&["cmd"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("No image given"));
}

#[test]
fn test_cmd_unknown_image() {
    let env = TestEnv::new();
    let output = env.run(&["cmd", "nope"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("No image found for id 'nope'"));
}

#[test]
fn test_image_path_unknown() {
    let env = TestEnv::new();
    let output = env.run(&["image", "path", "nope"]);

    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_image_list_empty() {
    let env = TestEnv::new();
    let output = env.run(&["image", "list"]);

    assert!(output.status.success());
    assert!(stdout(&output).contains("No images yet"));
}

// ============================================
// Defaults, catalog and status
// ============================================

/// Test: defaults update keeps user entries
#[test]
fn test_defaults_update_keeps_user_hardware() {
    let env = TestEnv::new();
    env.run(&["hardware", "add", "mine", "--name", "Mine", "--arch", "arm"]);

    let output = env.run(&["defaults", "update"]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("Defaults refreshed from catalog 1.0.0"));
    let hardware = env.ids("hardware");
    assert!(hardware.contains(&"mine".to_string()));
    assert!(hardware.contains(&"rpi4b".to_string()));
}

/// Test: running defaults update twice writes identical documents
#[test]
fn test_defaults_update_is_stable() {
    let env = TestEnv::new();
    env.run(&["defaults", "update"]);
    let first = std::fs::read(env.state_file()).unwrap();
    env.run(&["defaults", "update"]);
    let second = std::fs::read(env.state_file()).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_catalog_does_not_touch_data_dir() {
    let env = TestEnv::new();
    let output = env.run(&["catalog"]);

    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("Catalog version 1.0.0"));
    assert!(out.contains("netbsd_aarch64"));
    assert!(!env.state_file().exists());
}

#[test]
fn test_status_counts() {
    let env = TestEnv::new();
    env.run(&["hardware", "add", "mine", "--name", "Mine", "--arch", "arm"]);

    let output = env.run(&["status"]);

    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("Hardware: 6 (1 user)"));
    assert!(out.contains("Operating systems: 2 (0 user)"));
    assert!(out.contains("Images: 0"));
}

/// Test: --quiet suppresses confirmations
#[test]
fn test_quiet_add() {
    let env = TestEnv::new();
    let output = env.run(&["-q", "hardware", "add", "mine", "--name", "Mine", "--arch", "arm"]);

    assert!(output.status.success());
    assert!(stdout(&output).is_empty());
}
