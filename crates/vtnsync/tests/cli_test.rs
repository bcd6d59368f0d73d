//! Integration tests for the `vtnsync` CLI binary.
//!
//! Every test works on its own temporary state and config files, with
//! name resolution pinned through the config's `[hosts]` table.
#![allow(clippy::unwrap_used)]

use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::{Value, json};
use tempfile::TempDir;

const CHANNEL: &str = "rest_onos/v1/network/configuration/";

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `vtnsync` binary with env isolation.
fn vtnsync_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("vtnsync");
    cmd.env("HOME", "/tmp/vtnsync-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/vtnsync-cli-test-nonexistent")
        .env("XDG_DATA_HOME", "/tmp/vtnsync-cli-test-nonexistent")
        .env_remove("RUST_LOG")
        .env_remove("VTNSYNC_CONFIG")
        .env_remove("VTNSYNC_STATE_FILE")
        .env_remove("VTNSYNC_CAPABILITY")
        .env_remove("VTNSYNC_CHANNEL")
        .env_remove("VTNSYNC_INTEREST_MARKER")
        .env_remove("VTNSYNC_ALLOW_MULTIPLE_PRIMARY");
    cmd
}

fn tag(id: u64, node: u64, name: &str, value: &str) -> Value {
    json!({
        "id": id,
        "owner": { "kind": "Node", "id": node },
        "name": name,
        "value": value,
    })
}

fn inventory() -> Value {
    json!({
        "vtn_services": [{
            "id": 1,
            "name": "vtn",
            "private_gateway_mac": "00:00:00:00:00:01",
            "local_management_ip": "172.27.0.1/24",
            "ovsdb_port": 6641,
            "ssh_port": 22,
            "ssh_user": "root",
            "ssh_key_file": "/root/node_key",
            "mgmt_subnet_bits": 24,
            "xos_endpoint": "http://xos/",
            "xos_user": "padmin@vicci.org",
            "xos_password": "letmein",
            "controller_port": "onos:6653"
        }],
        "nodes": [
            { "id": 1, "name": "compute-1" },
            { "id": 2, "name": "compute-2" }
        ],
        "address_pools": [
            { "id": 1, "name": "public", "gateway_ip": "10.6.1.193", "gateway_mac": "02:42:0a:06:01:01" },
            { "id": 2, "name": "private", "gateway_ip": "", "gateway_mac": "02:42:0a:06:01:02" }
        ],
        "tags": [
            tag(10, 1, "bridgeId", "of:0000000000000001"),
            tag(11, 1, "dataPlaneIntf", "fabric"),
            tag(12, 1, "dataPlaneIp", "10.6.1.2/24"),
            tag(20, 2, "bridgeId", "of:0000000000000002")
        ],
        "service_instances": [
            { "id": 100, "name": "onos-cord", "updated": "2026-01-01T00:00:00Z" }
        ],
        "attributes": [{
            "id": 500,
            "service_instance_id": 100,
            "name": "autogenerate",
            "value": "vtn-network-cfg",
            "updated": "2026-01-01T00:00:00Z"
        }]
    })
}

struct Fixture {
    _dir: TempDir,
    config: PathBuf,
    state: PathBuf,
}

impl Fixture {
    fn new(state: &Value) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("config.toml");
        std::fs::write(
            &config,
            "[hosts]\nonos = \"10.0.0.5\"\n\"compute-1\" = \"10.1.0.1\"\n\"compute-2\" = \"10.1.0.2\"\n",
        )
        .unwrap();
        let state_path = dir.path().join("state.json");
        std::fs::write(&state_path, serde_json::to_string_pretty(state).unwrap()).unwrap();
        Self {
            _dir: dir,
            config,
            state: state_path,
        }
    }

    fn cmd(&self, args: &[&str]) -> assert_cmd::Command {
        let mut cmd = vtnsync_cmd();
        cmd.arg("--config")
            .arg(&self.config)
            .arg("--state")
            .arg(&self.state)
            .args(args);
        cmd
    }

    fn state_json(&self) -> Value {
        read_json(&self.state)
    }
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

fn published_slot(state: &Value) -> Option<String> {
    state["attributes"]
        .as_array()
        .unwrap()
        .iter()
        .find(|a| a["name"] == CHANNEL)
        .map(|a| a["value"].as_str().unwrap().to_owned())
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = vtnsync_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_lists_commands() {
    vtnsync_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("render")
            .and(predicate::str::contains("sync"))
            .and(predicate::str::contains("watch"))
            .and(predicate::str::contains("config")),
    );
}

#[test]
fn test_unknown_subcommand_is_usage_error() {
    vtnsync_cmd().arg("frobnicate").assert().code(2);
}

// ── render ──────────────────────────────────────────────────────────

#[test]
fn test_render_prints_document() {
    let fx = Fixture::new(&inventory());
    fx.cmd(&["render"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("\"org.opencord.vtn\": {")
                .and(predicate::str::contains("\"hostManagementIp\": \"10.1.0.1/24\""))
                .and(predicate::str::contains("\"10.0.0.5:6653\""))
                .and(predicate::str::contains("\"gatewayIp\": \"10.6.1.193\""))
                .and(predicate::str::contains("compute-2").not()),
        )
        .stderr(predicate::str::contains(
            "skipped Node 2 (compute-2): required tag dataPlaneIntf is missing",
        ));
}

#[test]
fn test_render_does_not_publish() {
    let fx = Fixture::new(&inventory());
    let before = std::fs::read(&fx.state).unwrap();
    fx.cmd(&["render"]).assert().success();
    assert_eq!(std::fs::read(&fx.state).unwrap(), before);
}

#[test]
fn test_render_to_file() {
    let fx = Fixture::new(&inventory());
    let out = fx.state.with_file_name("netcfg.json");
    fx.cmd(&["render", "--output", out.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
    let doc = read_json(&out);
    assert_eq!(
        doc["apps"]["org.opencord.vtn"]["cordvtn"]["nodes"]
            .as_array()
            .unwrap()
            .len(),
        1
    );
}

// ── sync ────────────────────────────────────────────────────────────

#[test]
fn test_sync_publishes_then_is_idempotent() {
    let fx = Fixture::new(&inventory());

    fx.cmd(&["sync"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "1 consumers: 1 created, 0 updated, 0 unchanged",
        ));
    let state = fx.state_json();
    let slot = published_slot(&state).expect("slot written");
    assert!(slot.contains("\"org.opencord.vtn\""));
    assert_ne!(state["service_instances"][0]["updated"], "2026-01-01T00:00:00Z");

    let after_first = std::fs::read(&fx.state).unwrap();
    fx.cmd(&["sync"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "1 consumers: 0 created, 0 updated, 1 unchanged",
        ));
    assert_eq!(std::fs::read(&fx.state).unwrap(), after_first);
}

#[test]
fn test_sync_dry_run_leaves_state_untouched() {
    let fx = Fixture::new(&inventory());
    let before = std::fs::read(&fx.state).unwrap();
    fx.cmd(&["sync", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("dry run: state file not written"));
    assert_eq!(std::fs::read(&fx.state).unwrap(), before);
}

#[test]
fn test_sync_json_summary() {
    let fx = Fixture::new(&inventory());
    let output = fx.cmd(&["sync", "--json"]).output().unwrap();
    assert!(output.status.success());
    let summary: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["nodes"], 1);
    assert_eq!(summary["public_gateways"], 1);
    assert_eq!(summary["consumers"]["created"], json!(["100"]));
    assert_eq!(summary["skipped"].as_array().unwrap().len(), 2);
}

#[test]
fn test_sync_updates_changed_document() {
    let fx = Fixture::new(&inventory());
    fx.cmd(&["sync"]).assert().success();

    let mut state = fx.state_json();
    state["tags"]
        .as_array_mut()
        .unwrap()
        .push(tag(21, 2, "dataPlaneIntf", "fabric"));
    state["tags"]
        .as_array_mut()
        .unwrap()
        .push(tag(22, 2, "dataPlaneIp", "10.6.1.3/24"));
    std::fs::write(&fx.state, serde_json::to_string(&state).unwrap()).unwrap();

    fx.cmd(&["sync"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 nodes").and(predicate::str::contains("1 updated")));
    assert!(published_slot(&fx.state_json()).unwrap().contains("compute-2"));
}

#[test]
fn test_sync_without_primary_is_precondition_failure() {
    let mut state = inventory();
    state["vtn_services"] = json!([]);
    let fx = Fixture::new(&state);
    fx.cmd(&["sync"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("precondition"));
    assert!(published_slot(&fx.state_json()).is_none());
}

#[test]
fn test_sync_with_two_primaries_is_precondition_failure() {
    let mut state = inventory();
    let mut second = state["vtn_services"][0].clone();
    second["id"] = json!(2);
    state["vtn_services"].as_array_mut().unwrap().push(second);
    let fx = Fixture::new(&state);
    fx.cmd(&["sync"]).assert().code(3);
}

#[test]
fn test_missing_state_file_exits_six() {
    let fx = Fixture::new(&inventory());
    std::fs::remove_file(&fx.state).unwrap();
    fx.cmd(&["sync"]).assert().code(6);
}

#[test]
fn test_corrupt_state_file_exits_six() {
    let fx = Fixture::new(&inventory());
    std::fs::write(&fx.state, "{ not json").unwrap();
    fx.cmd(&["render"]).assert().code(6);
}

// ── config ──────────────────────────────────────────────────────────

#[test]
fn test_missing_config_file_exits_five() {
    vtnsync_cmd()
        .args(["--config", "/tmp/vtnsync-cli-test-nonexistent/none.toml", "config", "show"])
        .assert()
        .code(5);
}

#[test]
fn test_config_show_includes_defaults_and_state_path() {
    let fx = Fixture::new(&inventory());
    fx.cmd(&["config", "show"]).assert().success().stdout(
        predicate::str::contains("capability = \"vtn-network-cfg\"")
            .and(predicate::str::contains("interest_marker = \"autogenerate\""))
            .and(predicate::str::contains(fx.state.to_str().unwrap()))
            .and(predicate::str::contains("[hosts]")),
    );
}

#[test]
fn test_config_show_honors_env_override() {
    let fx = Fixture::new(&inventory());
    fx.cmd(&["config", "show"])
        .env("VTNSYNC_CAPABILITY", "other-cfg")
        .assert()
        .success()
        .stdout(predicate::str::contains("capability = \"other-cfg\""));
}

#[test]
fn test_config_path_prints_override() {
    let fx = Fixture::new(&inventory());
    fx.cmd(&["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(fx.config.to_str().unwrap()));
}

#[test]
fn test_config_init_writes_defaults_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("etc/vtnsync.toml");
    let path_arg = path.to_str().unwrap();

    vtnsync_cmd()
        .args(["--config", path_arg, "config", "init"])
        .assert()
        .success();
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("capability = \"vtn-network-cfg\""));

    vtnsync_cmd()
        .args(["--config", path_arg, "config", "init"])
        .assert()
        .code(5)
        .stderr(predicate::str::contains("--force"));

    vtnsync_cmd()
        .args(["--config", path_arg, "config", "init", "--force"])
        .assert()
        .success();
}

// ── Watch ───────────────────────────────────────────────────────────

/// Poll `check` until it holds or `limit` runs out.
#[cfg(unix)]
fn wait_until(limit: std::time::Duration, mut check: impl FnMut() -> bool) -> bool {
    let deadline = std::time::Instant::now() + limit;
    while std::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        std::thread::sleep(std::time::Duration::from_millis(100));
    }
    check()
}

/// Read the state file, tolerating a write caught halfway.
#[cfg(unix)]
fn try_state(path: &Path) -> Option<Value> {
    serde_json::from_str(&std::fs::read_to_string(path).ok()?).ok()
}

#[cfg(unix)]
#[test]
fn test_watch_republishes_after_state_edit() {
    use std::process::{Command, Stdio};
    use std::time::Duration;

    let fx = Fixture::new(&inventory());
    let mut child = Command::new(env!("CARGO_BIN_EXE_vtnsync"))
        .env("HOME", "/tmp/vtnsync-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/vtnsync-cli-test-nonexistent")
        .env("XDG_DATA_HOME", "/tmp/vtnsync-cli-test-nonexistent")
        .env_remove("RUST_LOG")
        .env_remove("VTNSYNC_CONFIG")
        .env_remove("VTNSYNC_STATE_FILE")
        .arg("--config")
        .arg(&fx.config)
        .arg("--state")
        .arg(&fx.state)
        .args(["watch", "--interval", "1"])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();

    // Initial run publishes and persists.
    let published = wait_until(Duration::from_secs(10), || {
        try_state(&fx.state).is_some_and(|s| published_slot(&s).is_some())
    });
    if !published {
        child.kill().unwrap();
        panic!("watch never persisted the initial document");
    }
    let first = fx.state_json();
    let first_updated = first["service_instances"][0]["updated"].clone();
    assert!(published_slot(&first).unwrap().contains("of:0000000000000001"));

    // Tags are not watched kinds; only the poll tick can notice this.
    let mut edited = first;
    for t in edited["tags"].as_array_mut().unwrap() {
        if t["id"] == 10 {
            t["value"] = json!("of:00000000000000aa");
        }
    }
    let staging = fx.state.with_extension("json.tmp");
    std::fs::write(&staging, serde_json::to_string_pretty(&edited).unwrap()).unwrap();
    std::fs::rename(&staging, &fx.state).unwrap();

    let republished = wait_until(Duration::from_secs(15), || {
        try_state(&fx.state).is_some_and(|s| {
            published_slot(&s).is_some_and(|slot| slot.contains("of:00000000000000aa"))
                && s["service_instances"][0]["updated"] != first_updated
        })
    });
    let pid = child.id().to_string();
    Command::new("kill").args(["-INT", &pid]).status().unwrap();
    let exited = wait_until(Duration::from_secs(10), || {
        child.try_wait().unwrap().is_some()
    });
    if !exited {
        child.kill().unwrap();
        panic!("watch did not stop on SIGINT");
    }
    assert!(republished, "watch did not republish the edited bridge id");
    assert!(child.wait().unwrap().success());

    let state = fx.state_json();
    let slot = published_slot(&state).unwrap();
    assert!(!slot.contains("of:0000000000000001"));
    assert_ne!(state["service_instances"][0]["updated"], first_updated);
}
