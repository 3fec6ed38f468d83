use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::tempdir;

const FEATURES: &str = r#"{
  "type": "FeatureCollection",
  "features": [
    {"type": "Feature", "id": "DEU", "properties": {"name": "Germany"},
     "geometry": {"type": "Polygon", "coordinates": [[[6,47],[15,47],[15,55],[6,55],[6,47]]]}},
    {"type": "Feature", "id": "FRA", "properties": {"name": "France"},
     "geometry": {"type": "Polygon", "coordinates": [[[-5,42],[8,42],[8,51],[-5,51],[-5,42]]]}},
    {"type": "Feature", "id": "ESP", "properties": {"name": "Spain"},
     "geometry": {"type": "Polygon", "coordinates": [[[-9,36],[3,36],[3,43],[-9,43],[-9,36]]]}}
  ]
}"#;

const DATA: &str = "id,value\nDEU,83.2\nFRA,67.8\n";

fn write_inputs(dir: &Path) -> (String, String) {
    let features = dir.join("europe.geojson");
    let data = dir.join("population.csv");
    fs::write(&features, FEATURES).unwrap();
    fs::write(&data, DATA).unwrap();
    (
        features.to_string_lossy().into_owned(),
        data.to_string_lossy().into_owned(),
    )
}

#[test]
fn cli_shows_help() {
    let mut cmd = Command::cargo_bin("choropleth").unwrap();
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("choropleth"));
}

#[test]
fn bind_writes_csv_and_prints_stats() {
    let dir = tempdir().unwrap();
    let (features, data) = write_inputs(dir.path());
    let out = dir.path().join("bound.csv");

    let mut cmd = Command::cargo_bin("choropleth").unwrap();
    cmd.args(["bind", "--features", &features, "--data", &data, "--stats", "--out"])
        .arg(&out);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("features=3 matched=2 unmatched=1"));

    let csv_txt = fs::read_to_string(&out).unwrap();
    assert!(csv_txt.starts_with("index,id,label,matched,value,formatted_value,color"));
    assert_eq!(csv_txt.lines().count(), 4);
    assert!(csv_txt.contains("ESP,ESP,false,,,#999999"));
}

#[test]
fn bind_writes_json_with_label_flag() {
    let dir = tempdir().unwrap();
    let (features, data) = write_inputs(dir.path());
    let out = dir.path().join("bound.json");

    let mut cmd = Command::cargo_bin("choropleth").unwrap();
    cmd.args(["bind", "--features", &features, "--data", &data, "--label", "name", "--out"])
        .arg(&out);
    cmd.assert().success();

    let v: serde_json::Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    let rows = v.as_array().unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[1]["label"], "France");
    assert_eq!(rows[1]["value"], 67.8);
    assert!(rows[2]["data"].is_null());
}

#[test]
fn legend_prints_one_line_per_class() {
    let dir = tempdir().unwrap();
    let (features, data) = write_inputs(dir.path());

    let mut cmd = Command::cargo_bin("choropleth").unwrap();
    cmd.args([
        "legend", "--features", &features, "--data", &data, "--domain", "0:90", "--colors",
        "#eeeeee,#888888,#000000",
    ]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("#eeeeee\t0 - 30"))
        .stdout(predicate::str::contains("#000000\t60 - 90"));
}

#[test]
fn render_writes_svg() {
    let dir = tempdir().unwrap();
    let (features, data) = write_inputs(dir.path());
    let out = dir.path().join("map.svg");

    let mut cmd = Command::cargo_bin("choropleth").unwrap();
    cmd.args([
        "render", "--features", &features, "--data", &data, "--graticule", "--colors", "Blues",
        "--out",
    ])
    .arg(&out);
    cmd.assert().success();
    let svg = fs::read_to_string(&out).unwrap();
    assert!(svg.contains("<svg"));
}

#[test]
fn config_file_is_overridden_by_flags() {
    let dir = tempdir().unwrap();
    let (features, data) = write_inputs(dir.path());
    let config = dir.path().join("options.json");
    fs::write(&config, r#"{"domain": [0, 10], "colors": "Reds"}"#).unwrap();

    let mut cmd = Command::cargo_bin("choropleth").unwrap();
    cmd.args(["legend", "--features", &features, "--data", &data, "--json", "--domain", "auto"])
        .arg("--config")
        .arg(&config);
    let output = cmd.output().unwrap();
    assert!(output.status.success());
    let legend: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let entries = legend.as_array().unwrap();
    assert_eq!(entries.len(), 9);
    assert_eq!(entries[0]["extent"][0], 67.8);
}

#[test]
fn inverted_domain_fails_before_rendering() {
    let dir = tempdir().unwrap();
    let (features, data) = write_inputs(dir.path());
    let out = dir.path().join("never.svg");

    let mut cmd = Command::cargo_bin("choropleth").unwrap();
    cmd.args(["render", "--features", &features, "--data", &data, "--domain", "10:0", "--out"])
        .arg(&out);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("min is greater than max"));
    assert!(!out.exists());
}

#[test]
fn unknown_scheme_is_reported() {
    let dir = tempdir().unwrap();
    let (features, data) = write_inputs(dir.path());

    let mut cmd = Command::cargo_bin("choropleth").unwrap();
    cmd.args(["legend", "--features", &features, "--data", &data, "--colors", "Rainbow"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("unknown color scheme"));
}

#[test]
fn no_graticule_overrides_the_options_file() {
    let dir = tempdir().unwrap();
    let (features, data) = write_inputs(dir.path());
    let config = dir.path().join("options.json");
    fs::write(&config, r#"{"enable_graticule": true}"#).unwrap();

    let render = |extra: &[&str], out: &Path| {
        let mut cmd = Command::cargo_bin("choropleth").unwrap();
        cmd.args(["render", "--features", &features, "--data", &data, "--no-legend"])
            .args(extra)
            .arg("--config")
            .arg(&config)
            .arg("--out")
            .arg(out);
        cmd.assert().success();
        fs::read_to_string(out).unwrap()
    };
    let with_lines = render(&[], &dir.path().join("on.svg"));
    let without_lines = render(&["--no-graticule"], &dir.path().join("off.svg"));
    assert!(with_lines.matches("<polyline").count() > 0);
    assert_eq!(without_lines.matches("<polyline").count(), 0);
}
