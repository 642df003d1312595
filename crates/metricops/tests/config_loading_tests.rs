//! Loading a definition tree from disk and normalizing it.

use std::fs;
use std::path::Path;

use tempfile::TempDir;

use metricops::{normalize, ConfigError, ConfigLoader};

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

#[test]
fn test_tree_to_canonical_config() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();

    write(root, "template_values.yaml", "host:\n  - web\n  - db\n");
    write(
        root,
        "metrics/defaults.yaml",
        "name: __default__\nperiod: 60\n",
    );
    write(
        root,
        "metrics/hosts/cpu.yaml",
        "- name: cpu.{{host}}\n  display_name: CPU on {{ host }}\n",
    );
    write(
        root,
        "spaces/ops.json",
        r#"{"name": "Ops", "charts": [{"name": "load", "streams": [{"metric": "cpu.web"}]}]}"#,
    );
    write(root, "services/pager.yml", "title: pager\ntype: pagerduty\n");
    write(root, "outdated/metrics/old.yaml", "- old.{{host}}\n- old.{{host}}\n");
    write(root, ".hidden/metrics/ignored.yaml", "name: ignored\n");
    write(root, "metrics/notes.txt", "not a definition");

    let raw = ConfigLoader::new(root).load().unwrap();
    let config = normalize(&raw).unwrap();

    let names: Vec<&str> = config.metrics.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, ["cpu.web", "cpu.db"]);
    assert!(config
        .metrics
        .iter()
        .all(|m| m.period == Some(serde_json::json!(60))));

    assert_eq!(config.spaces.len(), 1);
    assert_eq!(config.spaces[0].name, "Ops");
    assert_eq!(config.services.len(), 1);
    assert_eq!(config.outdated.metrics, ["old.web", "old.db"]);
}

#[test]
fn test_missing_directory() {
    let err = ConfigLoader::new("/nonexistent/metricops/config")
        .load()
        .unwrap_err();
    assert!(matches!(err, ConfigError::ConfigDirNotFound(_)));
}

#[test]
fn test_invalid_file_names_path() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "metrics/broken.yaml", "name: [unclosed\n");

    let err = ConfigLoader::new(dir.path()).load().unwrap_err();
    assert!(err.to_string().contains("broken.yaml"));
}
