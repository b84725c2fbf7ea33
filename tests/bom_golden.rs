//! Golden file tests for the bill-of-materials payload
//!
//! The JSON written by `analyze --format json` is the contract for downstream
//! tooling; these tests pin its exact bytes and check it is reproducible.

use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Get a command instance for the craftcost binary
fn craftcost_cmd() -> assert_cmd::Command {
    let mut cmd = assert_cmd::Command::new(assert_cmd::cargo::cargo_bin!("craftcost"));
    cmd.env_remove("ATM10_PATH")
        .env_remove("CRAFTCOST_DATAPACK_PATH")
        .env_remove("CRAFTCOST_CONFIG")
        .env_remove("RUST_LOG");
    cmd
}

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// Instance with the stick/plank/log chain and a three-way split recipe
fn setup_instance() -> TempDir {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("instance/data");

    write(
        &data,
        "minecraft/recipes/stick.json",
        r##"{
            "type": "minecraft:crafting_shaped",
            "pattern": ["#", "#"],
            "key": {"#": {"tag": "minecraft:planks"}},
            "result": {"item": "minecraft:stick", "count": 4}
        }"##,
    );
    write(
        &data,
        "minecraft/recipes/oak_planks.json",
        r#"{
            "type": "minecraft:crafting_shapeless",
            "ingredients": [{"item": "minecraft:oak_log"}],
            "result": {"item": "minecraft:oak_planks", "count": 4}
        }"#,
    );
    write(
        &data,
        "minecraft/tags/items/planks.json",
        r#"{"values": ["minecraft:oak_planks", "minecraft:spruce_planks"]}"#,
    );
    write(
        &data,
        "test/recipes/shard.json",
        r#"{
            "type": "minecraft:stonecutting",
            "ingredient": {"item": "test:crystal"},
            "result": "test:shard",
            "count": 3
        }"#,
    );
    fs::write(dir.path().join("config.toml"), "").unwrap();

    dir
}

fn analyze_json(dir: &TempDir, args: &[&str]) -> String {
    let output = craftcost_cmd()
        .arg("--datapack-path")
        .arg(dir.path().join("instance"))
        .arg("--config")
        .arg(dir.path().join("config.toml"))
        .arg("analyze")
        .args(args)
        .args(["--format", "json"])
        .assert()
        .success();
    String::from_utf8(output.get_output().stdout.clone()).unwrap()
}

const STICK_GOLDEN: &str = r#"{
  "target": "minecraft:stick",
  "quantity": 4,
  "total_raw_materials": [
    {
      "item": "minecraft:oak_log",
      "count": 0.5
    }
  ],
  "steps": [
    {
      "item": "minecraft:oak_planks",
      "quantity": 2,
      "recipe": "minecraft:oak_planks",
      "ingredients": [
        {
          "item": "minecraft:oak_log",
          "count": 0.5
        }
      ]
    },
    {
      "item": "minecraft:stick",
      "quantity": 4,
      "recipe": "minecraft:stick",
      "ingredients": [
        {
          "item": "minecraft:oak_planks",
          "count": 2
        }
      ]
    }
  ]
}"#;

#[test]
fn golden_stick_payload() {
    let dir = setup_instance();
    let stdout = analyze_json(&dir, &["minecraft:stick", "-n", "4"]);

    assert_eq!(stdout.trim_end(), STICK_GOLDEN);
}

#[test]
fn golden_output_file_matches_stdout() {
    let dir = setup_instance();
    let out = dir.path().join("bom.json");

    craftcost_cmd()
        .arg("--datapack-path")
        .arg(dir.path().join("instance"))
        .arg("--config")
        .arg(dir.path().join("config.toml"))
        .args(["analyze", "minecraft:stick", "-n", "4", "-o"])
        .arg(&out)
        .assert()
        .success();

    assert_eq!(fs::read_to_string(&out).unwrap(), STICK_GOLDEN);
}

#[test]
fn repeated_runs_are_byte_identical() {
    let dir = setup_instance();

    let first = analyze_json(&dir, &["minecraft:stick", "-n", "12"]);
    let second = analyze_json(&dir, &["minecraft:stick", "-n", "12"]);
    assert_eq!(first, second);
}

#[test]
fn non_terminating_ratio_serializes_as_number() {
    let dir = setup_instance();
    let stdout = analyze_json(&dir, &["test:shard"]);
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();

    let count = json["total_raw_materials"][0]["count"].as_f64().unwrap();
    assert!((count - 1.0 / 3.0).abs() < 1e-12);
    assert_eq!(json["total_raw_materials"][0]["count_ratio"], "1/3");
    assert_eq!(json["steps"][0]["recipe"], "test:shard");
}

#[test]
fn whole_ratios_stay_integers() {
    let dir = setup_instance();
    let stdout = analyze_json(&dir, &["test:shard", "-n", "6"]);
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();

    assert!(json["total_raw_materials"][0]["count"].is_i64());
    assert_eq!(json["total_raw_materials"][0]["count"], 2);
    assert!(json["total_raw_materials"][0].get("count_ratio").is_none());
}

#[test]
fn fractional_target_quantity_keeps_exact_ratio() {
    let dir = setup_instance();
    let stdout = analyze_json(&dir, &["test:shard", "-n", "1/3"]);
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();

    assert_eq!(json["quantity_ratio"], "1/3");
    assert_eq!(json["steps"][0]["quantity_ratio"], "1/3");
    assert_eq!(json["total_raw_materials"][0]["count_ratio"], "1/9");
}
