//! CLI integration tests for craftcost
//!
//! Each test builds a small instance directory (loose datapack files plus a
//! mod archive) in a temp dir and drives the binary against it.

use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Get a command instance for the craftcost binary
fn craftcost_cmd() -> assert_cmd::Command {
    let mut cmd = assert_cmd::Command::new(assert_cmd::cargo::cargo_bin!("craftcost"));
    cmd.env_remove("ATM10_PATH")
        .env_remove("CRAFTCOST_DATAPACK_PATH")
        .env_remove("CRAFTCOST_INDEX_DIR")
        .env_remove("CRAFTCOST_CONFIG")
        .env_remove("RUST_LOG");
    cmd
}

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn write_jar(path: &Path, entries: &[(&str, &str)]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let mut zip = zip::ZipWriter::new(fs::File::create(path).unwrap());
    let options = zip::write::SimpleFileOptions::default();
    for (name, content) in entries {
        zip.start_file(*name, options).unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
}

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let instance = dir.path().join("instance");

        write(
            &instance,
            "datapacks/base/data/minecraft/recipes/stick.json",
            r##"{
                "type": "minecraft:crafting_shaped",
                "pattern": ["#", "#"],
                "key": {"#": {"tag": "minecraft:planks"}},
                "result": {"item": "minecraft:stick", "count": 4}
            }"##,
        );
        write(
            &instance,
            "datapacks/base/data/minecraft/recipes/oak_planks.json",
            r#"{
                "type": "minecraft:crafting_shapeless",
                "ingredients": [{"item": "minecraft:oak_log"}],
                "result": {"item": "minecraft:oak_planks", "count": 4}
            }"#,
        );
        write(
            &instance,
            "datapacks/base/data/minecraft/recipes/torch.json",
            r#"{
                "type": "minecraft:crafting_shaped",
                "pattern": ["C", "S"],
                "key": {
                    "C": [{"item": "minecraft:coal"}, {"item": "minecraft:charcoal"}],
                    "S": {"item": "minecraft:stick"}
                },
                "result": {"item": "minecraft:torch", "count": 4}
            }"#,
        );
        write(
            &instance,
            "datapacks/base/data/minecraft/tags/items/planks.json",
            r#"{"values": ["minecraft:oak_planks", "minecraft:birch_planks"]}"#,
        );
        write(
            &instance,
            "datapacks/loop/data/test/recipes/a.json",
            r#"{"type": "crafting_shapeless", "ingredients": ["test:b"], "result": "test:a"}"#,
        );
        write(
            &instance,
            "datapacks/loop/data/test/recipes/b.json",
            r#"{"type": "crafting_shapeless", "ingredients": ["test:a"], "result": "test:b"}"#,
        );
        write(
            &instance,
            "datapacks/broken/data/test/recipes/no_type.json",
            r#"{"result": "test:nothing"}"#,
        );
        write_jar(
            &instance.join("mods/bamboo.jar"),
            &[(
                "data/bamboo/recipes/stick_from_bamboo.json",
                r##"{
                    "type": "minecraft:crafting_shaped",
                    "pattern": ["#", "#"],
                    "key": {"#": {"item": "minecraft:bamboo"}},
                    "result": {"item": "minecraft:stick", "count": 1}
                }"##,
            )],
        );

        fs::write(dir.path().join("config.toml"), "").unwrap();
        Self { dir }
    }

    fn instance(&self) -> PathBuf {
        self.dir.path().join("instance")
    }

    fn config(&self) -> PathBuf {
        self.dir.path().join("config.toml")
    }

    fn index_dir(&self) -> PathBuf {
        self.dir.path().join("index")
    }

    /// Command wired to this fixture's instance, index dir and config
    fn cmd(&self) -> assert_cmd::Command {
        let mut cmd = craftcost_cmd();
        cmd.arg("--datapack-path")
            .arg(self.instance())
            .arg("--index-dir")
            .arg(self.index_dir())
            .arg("--config")
            .arg(self.config());
        cmd
    }

    fn json(&self, args: &[&str]) -> Value {
        let output = self
            .cmd()
            .args(args)
            .args(["--format", "json"])
            .assert()
            .success();
        serde_json::from_slice(&output.get_output().stdout).unwrap()
    }
}

fn items_of(values: &Value) -> Vec<String> {
    values
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["item"].as_str().unwrap().to_string())
        .collect()
}

// =============================================================================
// Analyze Tests
// =============================================================================

#[test]
fn test_analyze_worked_example() {
    let fixture = Fixture::new();
    let json = fixture.json(&["analyze", "minecraft:stick", "-n", "4"]);

    assert_eq!(json["target"], "minecraft:stick");
    assert_eq!(json["quantity"], 4);
    assert_eq!(items_of(&json["total_raw_materials"]), vec!["minecraft:oak_log"]);
    assert_eq!(json["total_raw_materials"][0]["count"], 0.5);
    assert_eq!(
        items_of(&json["steps"]),
        vec!["minecraft:oak_planks", "minecraft:stick"]
    );
    assert_eq!(json["steps"][0]["quantity"], 2);
    assert!(json.get("diagnostics").is_none());
}

#[test]
fn test_analyze_text_output() {
    let fixture = Fixture::new();

    fixture
        .cmd()
        .args(["analyze", "minecraft:torch", "-n", "4"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Raw materials:"))
        .stdout(predicate::str::contains("minecraft:coal"))
        .stdout(predicate::str::contains("0.125  minecraft:oak_log"))
        .stdout(predicate::str::contains("Steps:"));
}

#[test]
fn test_analyze_first_alternative_is_used() {
    let fixture = Fixture::new();
    let json = fixture.json(&["analyze", "minecraft:torch", "-n", "4"]);

    let raw = items_of(&json["total_raw_materials"]);
    assert!(raw.contains(&"minecraft:coal".to_string()));
    assert!(!raw.contains(&"minecraft:charcoal".to_string()));
}

#[test]
fn test_analyze_cube() {
    let fixture = Fixture::new();
    let json = fixture.json(&["analyze", "minecraft:stick", "--cube", "2"]);

    assert_eq!(json["quantity"], 8);
    assert_eq!(json["total_raw_materials"][0]["count"], 1);
}

#[test]
fn test_analyze_fractional_quantity() {
    let fixture = Fixture::new();
    let json = fixture.json(&["analyze", "minecraft:oak_planks", "-n", "0.5"]);

    assert_eq!(json["total_raw_materials"][0]["count"], 0.125);
}

#[test]
fn test_analyze_rejects_zero_quantity() {
    let fixture = Fixture::new();

    fixture
        .cmd()
        .args(["analyze", "minecraft:stick", "-n", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Quantity must be positive"));
}

#[test]
fn test_analyze_rejects_negative_quantity() {
    let fixture = Fixture::new();

    fixture
        .cmd()
        .args(["analyze", "minecraft:stick", "-n", "-2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Quantity must be positive"));
}

#[test]
fn test_analyze_quantity_conflicts_with_cube() {
    let fixture = Fixture::new();

    fixture
        .cmd()
        .args(["analyze", "minecraft:stick", "-n", "2", "--cube", "3"])
        .assert()
        .failure();
}

#[test]
fn test_analyze_unknown_item_is_raw() {
    let fixture = Fixture::new();
    let json = fixture.json(&["analyze", "minecraft:diamond", "-n", "3"]);

    assert_eq!(items_of(&json["total_raw_materials"]), vec!["minecraft:diamond"]);
    assert_eq!(json["total_raw_materials"][0]["count"], 3);
    assert_eq!(json["steps"], serde_json::json!([]));
}

#[test]
fn test_analyze_unknown_item_note_in_text_mode() {
    let fixture = Fixture::new();

    fixture
        .cmd()
        .args(["analyze", "minecraft:diamond"])
        .assert()
        .success()
        .stderr(predicate::str::contains("treating it as a raw material"));
}

#[test]
fn test_analyze_cycle_terminates() {
    let fixture = Fixture::new();
    let json = fixture.json(&["analyze", "test:a"]);

    assert_eq!(items_of(&json["total_raw_materials"]), vec!["test:a"]);
    let diagnostics = json["diagnostics"].as_array().unwrap();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0]["kind"], "cycle_detected");
    assert_eq!(
        diagnostics[0]["path"],
        serde_json::json!(["test:a", "test:b", "test:a"])
    );
}

#[test]
fn test_analyze_disk_recipe_beats_archive() {
    let fixture = Fixture::new();
    let json = fixture.json(&["analyze", "minecraft:stick", "-n", "4"]);

    let raw = items_of(&json["total_raw_materials"]);
    assert!(!raw.contains(&"minecraft:bamboo".to_string()));
}

#[test]
fn test_analyze_diagram() {
    let fixture = Fixture::new();

    fixture
        .cmd()
        .args(["analyze", "minecraft:stick", "--diagram"])
        .assert()
        .success()
        .stdout(predicate::str::contains("---"))
        .stdout(predicate::str::contains("flowchart TD"))
        .stdout(predicate::str::contains("class n2 raw"));
}

#[test]
fn test_analyze_writes_output_file() {
    let fixture = Fixture::new();
    let out = fixture.dir.path().join("bom.json");

    fixture
        .cmd()
        .args(["analyze", "minecraft:stick", "-n", "4", "-o"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote bill of materials"));

    let json: Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(json["target"], "minecraft:stick");
}

#[test]
fn test_analyze_invalid_item_id() {
    let fixture = Fixture::new();

    fixture
        .cmd()
        .args(["analyze", "Not An Id"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid item id"));
}

#[test]
fn test_missing_dataset_root_fails() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("config.toml"), "").unwrap();

    craftcost_cmd()
        .arg("--datapack-path")
        .arg(dir.path().join("nowhere"))
        .arg("--config")
        .arg(dir.path().join("config.toml"))
        .args(["analyze", "minecraft:stick"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Dataset root not found"));
}

// =============================================================================
// Configuration Tests
// =============================================================================

#[test]
fn test_legacy_env_var_sets_dataset_root() {
    let fixture = Fixture::new();

    craftcost_cmd()
        .env("ATM10_PATH", fixture.instance())
        .arg("--config")
        .arg(fixture.config())
        .args(["analyze", "minecraft:stick", "-n", "4", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("minecraft:oak_log"));
}

#[test]
fn test_config_file_supplies_defaults() {
    let fixture = Fixture::new();
    let config = fixture.dir.path().join("custom.toml");
    fs::write(
        &config,
        format!(
            "datapack_path = {:?}\ndefault_format = \"json\"\n",
            fixture.instance().display().to_string()
        ),
    )
    .unwrap();

    let output = craftcost_cmd()
        .env("CRAFTCOST_CONFIG", &config)
        .args(["analyze", "minecraft:stick", "-n", "4"])
        .assert()
        .success();

    let json: Value = serde_json::from_slice(&output.get_output().stdout).unwrap();
    assert_eq!(json["target"], "minecraft:stick");
}

#[test]
fn test_bad_config_fails() {
    let fixture = Fixture::new();
    fs::write(fixture.config(), "default_format = 42").unwrap();

    fixture
        .cmd()
        .args(["check"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load configuration"));
}

// =============================================================================
// Inspection Tests
// =============================================================================

#[test]
fn test_recipe_lists_candidates_in_preference_order() {
    let fixture = Fixture::new();
    let json = fixture.json(&["recipe", "minecraft:stick"]);

    let recipes = json["recipes"].as_array().unwrap();
    assert_eq!(recipes.len(), 2);
    assert_eq!(recipes[0]["id"], "minecraft:stick");
    assert_eq!(recipes[0]["origin"], "disk");
    assert_eq!(recipes[0]["primary"], true);
    assert_eq!(recipes[1]["id"], "bamboo:stick_from_bamboo");
    assert_eq!(recipes[1]["origin"], "archive");
}

#[test]
fn test_recipe_for_raw_item() {
    let fixture = Fixture::new();

    fixture
        .cmd()
        .args(["recipe", "minecraft:oak_log"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No recipe produces minecraft:oak_log"));
}

#[test]
fn test_tag_shows_members() {
    let fixture = Fixture::new();

    fixture
        .cmd()
        .args(["tag", "#minecraft:planks"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#minecraft:planks (2 members)"))
        .stdout(predicate::str::contains("minecraft:oak_planks  (used for recipes)"))
        .stdout(predicate::str::contains("minecraft:birch_planks"));
}

#[test]
fn test_unknown_tag_fails() {
    let fixture = Fixture::new();

    fixture
        .cmd()
        .args(["tag", "minecraft:logs"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown tag"));
}

#[test]
fn test_check_reports_skipped_records() {
    let fixture = Fixture::new();
    let json = fixture.json(&["check"]);

    assert_eq!(json["tags"], 1);
    let warnings = json["warnings"].as_array().unwrap();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0]["kind"], "missing_type");
}

#[test]
fn test_check_strict_fails_on_problems() {
    let fixture = Fixture::new();

    fixture
        .cmd()
        .args(["check", "--strict"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Skipped records (1)"))
        .stderr(predicate::str::contains("problem"));
}

// =============================================================================
// Item Index Tests
// =============================================================================

#[test]
fn test_items_search_builds_index_on_demand() {
    let fixture = Fixture::new();
    let json = fixture.json(&["items", "search", "oak"]);

    let ids: Vec<_> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids, vec!["minecraft:oak_log", "minecraft:oak_planks"]);
    assert!(fixture.index_dir().is_dir());
}

#[test]
fn test_items_search_respects_limit() {
    let fixture = Fixture::new();
    let json = fixture.json(&["items", "search", "--limit", "2"]);

    assert_eq!(json.as_array().unwrap().len(), 2);
}

#[test]
fn test_items_rebuild_and_status() {
    let fixture = Fixture::new();

    fixture
        .cmd()
        .args(["items", "rebuild"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Item index rebuilt"));

    let status = fixture.json(&["items", "status"]);
    assert!(status["items"].as_u64().unwrap() > 0);
    assert!(status["built_at"].is_string());
}

#[test]
fn test_items_status_before_build() {
    let fixture = Fixture::new();

    fixture
        .cmd()
        .args(["items", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Items: 0"))
        .stdout(predicate::str::contains("craftcost items rebuild"));
}

// =============================================================================
// Verbose Mode
// =============================================================================

#[test]
fn test_verbose_logs_to_stderr() {
    let fixture = Fixture::new();

    fixture
        .cmd()
        .args(["--verbose", "analyze", "minecraft:stick"])
        .assert()
        .success()
        .stderr(predicate::str::contains("[verbose:dataset]"));
}
