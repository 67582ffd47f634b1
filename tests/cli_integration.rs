//! Integration tests for the ply CLI.
//!
//! These tests run the binary against design files in a temp directory.
//! Every invocation points the user config at the temp directory so a
//! developer's own configuration is never read or written.

use std::fs;

use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;

use plydesign::core::file::DesignLock;

const DESIGN: &str = "11111111-1111-4111-8111-111111111111";
const PLATE_SKETCH: &str = "22222222-2222-4222-8222-222222222222";
const TAB_SKETCH: &str = "44444444-4444-4444-8444-444444444444";
const SPARE_SKETCH: &str = "33333333-3333-4333-8333-333333333333";
const OP_PLATE: &str = "aaaaaaaa-aaaa-4aaa-8aaa-aaaaaaaaaaaa";
const OP_TAB: &str = "cccccccc-cccc-4ccc-8ccc-cccccccccccc";
const OP_UNION: &str = "bbbbbbbb-bbbb-4bbb-8bbb-bbbbbbbbbbbb";

/// A schema-1 file: two legacy sketch operations and a legacy union that
/// reads the first, plus one sketch nothing uses.
fn legacy_json() -> String {
    serde_json::json!({
        "kind": "plydesign.design",
        "schema_version": 1,
        "producer": { "name": "plydesign", "version": "0.0.1" },
        "saved_at": "2025-06-01T12:00:00Z",
        "design": {
            "id": DESIGN,
            "layerdef": { "layers": [{ "name": "top" }, { "name": "bottom" }] },
            "sketches": {
                PLATE_SKETCH: { "id": PLATE_SKETCH, "shapes": [{ "name": "plate", "construction": false }] },
                TAB_SKETCH: { "id": TAB_SKETCH, "shapes": [{ "name": "tab", "construction": false }] },
                SPARE_SKETCH: { "id": SPARE_SKETCH, "shapes": [{ "name": "spare", "construction": false }] }
            },
            "operations": [
                { "id": OP_PLATE, "kind": "sketch_v1", "sketch": PLATE_SKETCH },
                { "id": OP_TAB, "kind": "sketch_v1", "sketch": TAB_SKETCH, "layers": ["top"] },
                { "id": OP_UNION, "label": "body", "kind": "laminate_v1", "operands": [OP_PLATE], "function": "union" }
            ]
        }
    })
    .to_string()
}

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        dir.child("plate.ply.json").write_str(&legacy_json()).unwrap();
        Self { dir }
    }

    fn design(&self) -> std::path::PathBuf {
        self.dir.child("plate.ply.json").path().to_path_buf()
    }

    fn user_config(&self) -> std::path::PathBuf {
        self.dir.child("user-config.toml").path().to_path_buf()
    }

    /// Get a command for running ply in this fixture.
    fn ply(&self) -> Command {
        let mut cmd = Command::cargo_bin("ply").unwrap();
        cmd.current_dir(self.dir.path())
            .env("PLY_CONFIG", self.user_config())
            .env("XDG_CONFIG_HOME", self.dir.path())
            .env("HOME", self.dir.path())
            .env_remove("RUST_LOG");
        cmd
    }

    fn contents(&self) -> String {
        fs::read_to_string(self.design()).unwrap()
    }

    /// Append an operation quietly and return its id.
    fn add(&self, file: &str, args: &[&str]) -> String {
        let out = self
            .ply()
            .args(["--quiet", "add", file])
            .args(args)
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        String::from_utf8(out).unwrap().trim().to_string()
    }
}

#[test]
fn version_flag_works() {
    Command::cargo_bin("ply")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("ply"));
}

#[test]
fn help_flag_works() {
    Command::cargo_bin("ply")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("laminate designs"));
}

#[test]
fn info_summarizes_legacy_file_without_writing() {
    let fx = Fixture::new();
    let before = fx.contents();

    fx.ply()
        .args(["info", "plate.ply.json", "--operations"])
        .assert()
        .success()
        .stdout(predicate::str::contains(DESIGN))
        .stdout(predicate::str::contains("Operations:  3"))
        .stdout(predicate::str::contains("Sketches:    3"))
        .stdout(predicate::str::contains(format!("Main:        {OP_PLATE}:0")))
        .stdout(predicate::str::contains("body"))
        .stderr(predicate::str::contains("upgraded in memory"));

    assert_eq!(fx.contents(), before);
}

#[test]
fn verify_accepts_valid_design() {
    let fx = Fixture::new();
    fx.ply()
        .args(["verify", "plate.ply.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ok"));
}

#[test]
fn verify_reports_dangling_operand() {
    let fx = Fixture::new();
    let broken = legacy_json().replace(
        &format!("\"operands\":[\"{OP_PLATE}\"]"),
        "\"operands\":[\"99999999-9999-4999-8999-999999999999\"]",
    );
    assert_ne!(broken, legacy_json());
    fx.dir.child("broken.ply.json").write_str(&broken).unwrap();

    fx.ply()
        .args(["verify", "broken.ply.json"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("1 violation(s)"))
        .stderr(predicate::str::contains("99999999-9999-4999-8999-999999999999"));
}

#[test]
fn descendants_lists_consumers() {
    let fx = Fixture::new();
    fx.ply()
        .args(["descendants", "plate.ply.json", OP_PLATE])
        .assert()
        .success()
        .stdout(predicate::str::contains(OP_UNION))
        .stdout(predicate::str::contains(OP_TAB).not());
}

#[test]
fn descendants_unknown_operation_fails() {
    let fx = Fixture::new();
    fx.ply()
        .args([
            "descendants",
            "plate.ply.json",
            "99999999-9999-4999-8999-999999999999",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn relink_repoints_and_saves() {
    let fx = Fixture::new();
    let design = fx.design();
    fx.ply()
        .arg("relink")
        .arg(&design)
        .args(["--from", OP_PLATE, "--to", &format!("{OP_TAB}:0")])
        .assert()
        .success()
        .stdout(predicate::str::contains("(1 reference(s))"));

    // Saved at the current schema with the union now reading the tab
    assert!(fx.contents().contains("\"schema_version\": 2"));
    fx.ply()
        .args(["descendants", "plate.ply.json", OP_TAB])
        .assert()
        .success()
        .stdout(predicate::str::contains(OP_UNION));
    fx.ply()
        .args(["descendants", "plate.ply.json", OP_PLATE])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    // The last directory is remembered in the user config
    let user = fs::read_to_string(fx.user_config()).unwrap();
    assert!(user.contains("last_directory"));
}

#[test]
fn relink_to_descendant_is_refused() {
    let fx = Fixture::new();
    let before = fx.contents();

    fx.ply()
        .args(["relink", "plate.ply.json", "--from", OP_PLATE, "--to", OP_UNION])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cannot relink"))
        .stderr(predicate::str::contains("would create a cycle"));

    assert_eq!(fx.contents(), before);
}

#[test]
fn upgrade_fork_writes_independent_copy() {
    let fx = Fixture::new();
    let before = fx.contents();

    fx.ply()
        .args([
            "upgrade",
            "plate.ply.json",
            "--fork",
            "--output",
            "copy.ply.json",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("new ids"));

    assert_eq!(fx.contents(), before);
    fx.dir
        .child("copy.ply.json")
        .assert(predicate::str::contains("\"schema_version\": 2"))
        .assert(predicate::str::contains(OP_PLATE).not())
        .assert(predicate::str::contains(DESIGN).not());
}

#[test]
fn upgrade_in_place_keeps_ids() {
    let fx = Fixture::new();
    fx.ply()
        .args(["upgrade", "plate.ply.json"])
        .assert()
        .success();

    let contents = fx.contents();
    assert!(contents.contains("\"schema_version\": 2"));
    assert!(contents.contains(OP_UNION));
    assert!(!contents.contains("laminate_v1"));
}

#[test]
fn upgrade_to_output_locks_source() {
    let fx = Fixture::new();
    let _held = DesignLock::acquire(&fx.design()).unwrap();

    fx.ply()
        .args(["upgrade", "plate.ply.json", "--output", "copy.ply.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("locked"));
    fx.dir
        .child("copy.ply.json")
        .assert(predicate::path::missing());
}

#[test]
fn new_creates_default_stack_and_refuses_overwrite() {
    let fx = Fixture::new();
    fx.ply()
        .args(["new", "fresh.ply.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("5 layer(s)"));

    fx.ply()
        .args(["info", "fresh.ply.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "carbon-bottom, pyralux-bottom, kapton, pyralux-top, carbon-top",
        ))
        .stdout(predicate::str::contains("Operations:  0"));

    fx.ply()
        .args(["new", "fresh.ply.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    fx.ply()
        .args(["new", "pair.ply.json", "--layer", "top", "--layer", "top"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("duplicate layer name 'top'"));
    fx.dir
        .child("pair.ply.json")
        .assert(predicate::path::missing());
}

#[test]
fn build_edit_and_set_main_from_scratch() {
    let fx = Fixture::new();
    fx.ply()
        .args(["new", "hinge.ply.json", "--layer", "top=carbon", "--layer", "bottom"])
        .assert()
        .success();

    let plate = fx.add("hinge.ply.json", &["sketch", "--shape", "plate"]);
    let tab = fx.add("hinge.ply.json", &["sketch", "--shape", "tab", "--layer", "top"]);
    let body = fx.add(
        "hinge.ply.json",
        &[
            "laminate", "--function", "union", "--operand", &plate, "--operand", &tab, "--label",
            "body",
        ],
    );
    assert_ne!(plate, tab);

    fx.ply()
        .args(["reprocess", "hinge.ply.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("body"))
        .stdout(predicate::str::contains("top: plate, tab | bottom: plate"));

    fx.ply()
        .args(["edit", "hinge.ply.json", &body, "--function", "intersection"])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("Edited operation {body}")));
    fx.ply()
        .args(["reprocess", "hinge.ply.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("top: - | bottom: -"));

    // Parameters of another kind are refused
    fx.ply()
        .args(["edit", "hinge.ply.json", &tab, "--function", "union"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not apply to sketch operations"));

    fx.ply()
        .args(["set-main", "hinge.ply.json", &format!("{body}:0")])
        .assert()
        .success();
    fx.ply()
        .args(["info", "hinge.ply.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("Main:        {body}:0")));

    fx.ply()
        .args(["set-main", "hinge.ply.json", "--none"])
        .assert()
        .success();
    fx.ply()
        .args(["info", "hinge.ply.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Main:        (none)"));
}

#[test]
fn edit_refuses_operand_below_the_operation() {
    let fx = Fixture::new();
    let late = fx.add("plate.ply.json", &["sketch", "--shape", "late"]);
    let before = fx.contents();

    fx.ply()
        .args(["edit", "plate.ply.json", OP_UNION, "--operand", &late])
        .assert()
        .failure()
        .stderr(predicate::str::contains(format!(
            "Cannot edit operation {OP_UNION}"
        )));
    assert_eq!(fx.contents(), before);
}

#[test]
fn add_with_dangling_operand_is_not_saved() {
    let fx = Fixture::new();
    let before = fx.contents();

    fx.ply()
        .args([
            "add",
            "plate.ply.json",
            "laminate",
            "--function",
            "union",
            "--operand",
            "99999999-9999-4999-8999-999999999999",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("1 violation(s)"))
        .stderr(predicate::str::contains("99999999-9999-4999-8999-999999999999"));
    assert_eq!(fx.contents(), before);
}

#[test]
fn add_sketch_on_unknown_layer_is_not_saved() {
    let fx = Fixture::new();
    let before = fx.contents();

    fx.ply()
        .args([
            "add",
            "plate.ply.json",
            "sketch",
            "--sketch",
            SPARE_SKETCH,
            "--layer",
            "nonexistent",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown layer 'nonexistent'"));
    assert_eq!(fx.contents(), before);
}

#[test]
fn set_main_rejects_unknown_operation() {
    let fx = Fixture::new();
    fx.ply()
        .args([
            "set-main",
            "plate.ply.json",
            "99999999-9999-4999-8999-999999999999",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not resolve"));
}

#[test]
fn reprocess_prints_outputs_and_stable_fingerprint() {
    let fx = Fixture::new();
    let run = || {
        let out = fx
            .ply()
            .args(["reprocess", "plate.ply.json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("top: plate | bottom: plate"))
            .stdout(predicate::str::contains("top: tab | bottom: -"))
            .get_output()
            .stdout
            .clone();
        String::from_utf8(out)
            .unwrap()
            .lines()
            .find(|l| l.starts_with("fingerprint: "))
            .map(str::to_string)
            .unwrap()
    };

    assert_eq!(run(), run());
}

#[test]
fn reprocess_quiet_prints_only_fingerprint() {
    let fx = Fixture::new();
    fx.ply()
        .args(["--quiet", "reprocess", "plate.ply.json"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("fingerprint: "))
        .stdout(predicate::str::contains("plate").not());
}

#[test]
fn cleanup_dry_run_then_remove() {
    let fx = Fixture::new();
    let before = fx.contents();

    fx.ply()
        .args(["cleanup", "plate.ply.json", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("sketch {SPARE_SKETCH}")))
        .stdout(predicate::str::contains("Dry run"));
    assert_eq!(fx.contents(), before);

    fx.ply()
        .args(["cleanup", "plate.ply.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed 1 sketch(es) and 0 sub-design(s)"));
    assert!(!fx.contents().contains(SPARE_SKETCH));

    fx.ply()
        .args(["cleanup", "plate.ply.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing to clean up"));
}

#[test]
fn config_set_then_get() {
    let fx = Fixture::new();
    fx.ply()
        .args(["config", "set", "upgrade.max_passes", "32"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Set upgrade.max_passes = 32"));

    fx.ply()
        .args(["config", "get", "upgrade.max_passes"])
        .assert()
        .success()
        .stdout(predicate::str::diff("32\n"));

    fx.ply()
        .args(["config", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("reprocess.auto = true"))
        .stdout(predicate::str::contains("files.last_directory = (not set)"));
}

#[test]
fn config_rejects_bad_values() {
    let fx = Fixture::new();
    fx.ply()
        .args(["config", "set", "upgrade.max_passes", "0"])
        .assert()
        .failure();
    fx.ply()
        .args(["config", "set", "no.such.key", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no.such.key"));
    assert!(!fx.user_config().exists());
}

#[test]
fn project_config_bounds_upgrade_passes() {
    let fx = Fixture::new();
    fx.dir
        .child(".ply/config.toml")
        .write_str("[upgrade]\nmax_passes = 1\n")
        .unwrap();

    // laminate_v1 needs two steps plus a confirming pass
    fx.ply()
        .args(["info", "plate.ply.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("fixed point"));

    fx.ply()
        .args(["config", "get", "upgrade.max_passes", "--design", "plate.ply.json"])
        .assert()
        .success()
        .stdout(predicate::str::diff("1\n"));
}

#[test]
fn completion_generates_script() {
    Command::cargo_bin("ply")
        .unwrap()
        .args(["completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ply"));
}
