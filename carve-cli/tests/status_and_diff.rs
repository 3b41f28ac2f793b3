use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::str::contains;
use tempfile::TempDir;

const MANIFEST: &str = "\
headers:
  source: include
  destination: include
  files: [a.h]
sources:
  source: lib
  destination: lib
  files: [x.cpp, y.cpp]
tests:
  source: unittests
  destination: tests
  files: [t.cpp]
";

fn carve_cmd(cwd: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("carve"));
    cmd.current_dir(cwd).env_remove("RUST_LOG");
    cmd
}

fn put(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
    fs::write(path, content).expect("write");
}

struct Tree {
    cfg: TempDir,
    up: TempDir,
    dst: TempDir,
}

impl Tree {
    /// Synced tree; `cfg` holds `carve.yaml` and is the working directory.
    fn synced() -> Self {
        let tree = Tree {
            cfg: TempDir::new().expect("config"),
            up: TempDir::new().expect("upstream"),
            dst: TempDir::new().expect("dest"),
        };
        put(&tree.cfg.path().join("carve.yaml"), MANIFEST);
        put(&tree.up.path().join("include/a.h"), "#pragma once\n");
        put(&tree.up.path().join("lib/x.cpp"), "int x = 1;\n");
        put(&tree.up.path().join("lib/y.cpp"), "int y;\n");
        put(&tree.up.path().join("unittests/t.cpp"), "// t\n");
        tree.run(&["sync"]).assert().success();
        tree
    }

    fn run(&self, args: &[&str]) -> Command {
        let mut cmd = carve_cmd(self.cfg.path());
        cmd.arg(args[0])
            .arg(self.up.path())
            .arg(self.dst.path())
            .args(&args[1..]);
        cmd
    }

    fn status_json(&self) -> serde_json::Value {
        let output = self.run(&["status", "--json"]).output().expect("run status");
        assert!(
            output.status.success(),
            "status failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_slice(&output.stdout).expect("status JSON")
    }
}

#[test]
fn status_json_is_clean_after_sync() {
    let tree = Tree::synced();
    let json = tree.status_json();

    assert_eq!(json["summary"]["entries"], 4);
    assert_eq!(json["summary"]["current"], 4);
    assert_eq!(json["summary"]["clean"], true);
    assert_eq!(json["aggregate"]["path"], "lib/Support.cpp");
    assert_eq!(json["aggregate"]["status"], "current");

    let categories: Vec<&str> = json["categories"]
        .as_array()
        .expect("categories array")
        .iter()
        .map(|c| c["category"].as_str().expect("category name"))
        .collect();
    assert_eq!(categories, vec!["headers", "sources", "tests"]);
}

#[test]
fn status_json_classifies_every_state() {
    let tree = Tree::synced();
    put(&tree.up.path().join("lib/x.cpp"), "int x = 2;\n");
    fs::remove_file(tree.dst.path().join("lib/y.cpp")).expect("remove y");
    fs::remove_file(tree.up.path().join("unittests/t.cpp")).expect("remove t");
    put(&tree.dst.path().join("lib/Old.cpp"), "// stale\n");

    let json = tree.status_json();
    let sources = &json["categories"][1];
    assert_eq!(sources["entries"][0]["path"], "x.cpp");
    assert_eq!(sources["entries"][0]["status"], "outdated");
    assert_eq!(sources["entries"][1]["status"], "missing");
    assert_eq!(sources["untracked"][0], "Old.cpp");
    assert_eq!(json["categories"][2]["entries"][0]["status"], "source-missing");
    assert_eq!(json["summary"]["clean"], false);
    assert_eq!(json["summary"]["untracked"], 1);
}

#[test]
fn status_table_suggests_sync_when_stale() {
    let tree = Tree::synced();
    put(&tree.up.path().join("lib/x.cpp"), "int x = 2;\n");

    tree.run(&["status"])
        .assert()
        .success()
        .stdout(contains("x.cpp (outdated)"))
        .stdout(contains("Run 'carve sync'"));
}

#[test]
fn diff_shows_upstream_change_as_added_lines() {
    let tree = Tree::synced();
    put(&tree.up.path().join("lib/x.cpp"), "int x = 2;\n");

    let assert = tree.run(&["diff"]).assert().success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("stdout utf8");
    assert!(stdout.contains("--- a/lib/x.cpp"), "{stdout}");
    assert!(stdout.contains("+++ b/lib/x.cpp"), "{stdout}");
    assert!(stdout.lines().any(|l| l == "+int x = 2;"), "{stdout}");
    assert!(stdout.lines().any(|l| l == "-int x = 1;"), "{stdout}");
    assert_eq!(
        fs::read_to_string(tree.dst.path().join("lib/x.cpp")).expect("read"),
        "int x = 1;\n",
        "diff must not write"
    );
}

#[test]
fn diff_reports_nothing_for_clean_tree() {
    let tree = Tree::synced();
    tree.run(&["diff"])
        .assert()
        .success()
        .stdout(contains("No differences"));
}

#[test]
fn manifest_prints_built_in_yaml() {
    let cwd = TempDir::new().expect("cwd");
    carve_cmd(cwd.path())
        .arg("manifest")
        .assert()
        .success()
        .stdout(contains("undef_macro: DEBUG_TYPE"))
        .stdout(contains("Support/Unix/Path.inc"));
}

#[test]
fn manifest_output_writes_loadable_file() {
    let cwd = TempDir::new().expect("cwd");
    let out = cwd.path().join("exported.yaml");
    carve_cmd(cwd.path())
        .args(["manifest", "--output"])
        .arg(&out)
        .assert()
        .success();

    let loaded = carve_core::manifest::load_at(&out).expect("load exported");
    assert_eq!(loaded.sources.files.len(), 58);
}
