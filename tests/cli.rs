// Runs the non-interactive subcommands against a throwaway store.

use assert_cmd::Command;
use std::path::{Path, PathBuf};

struct Sandbox {
    dir: tempfile::TempDir,
}

impl Sandbox {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    fn store(&self) -> PathBuf {
        self.dir.path().join("workouts.json")
    }

    fn mapty(&self) -> Command {
        self.mapty_at(&self.store())
    }

    fn mapty_at(&self, store: &Path) -> Command {
        let mut cmd = Command::cargo_bin("mapty").unwrap();
        cmd.env("HOME", self.dir.path())
            .env_remove("MAPTY_LOG")
            .arg("--store")
            .arg(store)
            .arg("--config")
            .arg(self.dir.path().join("config.json"));
        cmd
    }

    fn stdout(&self, args: &[&str]) -> String {
        let out = self.mapty().args(args).assert().success();
        String::from_utf8(out.get_output().stdout.clone()).unwrap()
    }

    fn add(&self, args: &[&str]) -> String {
        let mut full = vec!["add"];
        full.extend_from_slice(args);
        self.stdout(&full).trim().to_string()
    }
}

fn saved_workouts(store: &Path) -> Vec<serde_json::Value> {
    let blobs: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(store).unwrap()).unwrap();
    let workouts = blobs["workouts"].as_str().unwrap();
    serde_json::from_str(workouts).unwrap()
}

#[test]
fn add_list_and_export() {
    let sb = Sandbox::new();
    let run = sb.add(&["--lat", "51.5", "--lng", "-0.1", "-d", "5", "-t", "25", "-c", "180"]);
    let ride = sb.add(&[
        "--kind", "cycling", "--lat", "48.8", "--lng", "2.3", "-d", "30", "-t", "90", "-e", "-15",
    ]);
    assert_eq!(run.len(), 10);
    assert_ne!(run, ride);

    let saved = saved_workouts(&sb.store());
    assert_eq!(saved.len(), 2);
    assert_eq!(saved[0]["type"], "running");
    assert_eq!(saved[0]["pace"], 5.0);
    assert_eq!(saved[1]["elevationGain"], -15.0);
    assert_eq!(saved[1]["coord"], serde_json::json!([48.8, 2.3]));

    let listed = sb.stdout(&["list"]);
    let lines: Vec<&str> = listed.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with(&run));
    assert!(lines[0].contains("min/km"));
    assert!(lines[1].contains("km/h"));

    let sorted = sb.stdout(&["list", "--sort", "distance", "--direction", "descending"]);
    assert!(sorted.lines().next().unwrap().starts_with(&ride));

    let csv = sb.stdout(&["export"]);
    let mut rows = csv.lines();
    assert!(rows.next().unwrap().starts_with("id,type,date"));
    assert!(rows.next().unwrap().starts_with(&format!("{run},running,")));
    assert!(rows.next().unwrap().starts_with(&format!("{ride},cycling,")));
}

#[test]
fn invalid_add_fails_without_saving() {
    let sb = Sandbox::new();
    let out = sb
        .mapty()
        .args(["add", "--lat", "1", "--lng", "1", "-d", "0", "-t", "25", "-c", "180"])
        .assert()
        .failure();
    let stderr = String::from_utf8(out.get_output().stderr.clone()).unwrap();
    assert!(stderr.contains("distance must be a positive number"));
    assert!(!sb.store().exists());
}

#[test]
fn edit_and_delete_by_id() {
    let sb = Sandbox::new();
    let id = sb.add(&["--lat", "51.5", "--lng", "-0.1", "-d", "5", "-t", "25", "-c", "180"]);

    sb.mapty()
        .args(["edit", &id, "-d", "10", "-t", "50"])
        .assert()
        .success();
    let saved = saved_workouts(&sb.store());
    assert_eq!(saved[0]["distance"], 10.0);
    assert_eq!(saved[0]["pace"], 5.0);
    assert_eq!(saved[0]["cadence"], 180.0);

    sb.mapty().args(["delete", &id]).assert().success();
    assert!(saved_workouts(&sb.store()).is_empty());

    sb.mapty().args(["delete", &id]).assert().failure();
}

#[test]
fn clear_requires_yes() {
    let sb = Sandbox::new();
    sb.add(&["--lat", "51.5", "--lng", "-0.1", "-d", "5", "-t", "25", "-c", "180"]);

    sb.mapty().arg("clear").assert().failure();
    assert_eq!(saved_workouts(&sb.store()).len(), 1);

    let out = sb.stdout(&["clear", "--yes"]);
    assert_eq!(out.trim(), "deleted 1 workouts");
    assert!(saved_workouts(&sb.store()).is_empty());

    sb.stdout(&["reset", "--yes"]);
    assert!(!sb.store().exists());
    assert_eq!(sb.stdout(&["list"]).trim(), "no workouts saved");
}

#[test]
fn sqlite_backend_keeps_workouts() {
    let sb = Sandbox::new();
    let db = sb.dir.path().join("workouts.db");

    let out = sb
        .mapty_at(&db)
        .args(["--storage", "sqlite"])
        .args(["add", "--lat", "1", "--lng", "1", "-d", "3", "-t", "18", "-c", "170"])
        .assert()
        .success();
    let id = String::from_utf8(out.get_output().stdout.clone()).unwrap();
    assert!(db.exists());
    assert!(!sb.store().exists());

    let out = sb
        .mapty_at(&db)
        .args(["--storage", "sqlite", "list"])
        .assert()
        .success();
    let listed = String::from_utf8(out.get_output().stdout.clone()).unwrap();
    assert!(listed.starts_with(id.trim()));
}
