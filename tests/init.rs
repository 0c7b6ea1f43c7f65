use std::process::Command;

#[test]
fn init_creates_valid_toml() {
    let dir = tempfile::tempdir().unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_coevo"))
        .arg("init")
        .current_dir(dir.path())
        .output()
        .unwrap();

    assert!(
        output.status.success(),
        "coevo init failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let config_path = dir.path().join(".coevo.toml");
    assert!(config_path.exists(), ".coevo.toml should exist");

    let content = std::fs::read_to_string(&config_path).unwrap();
    assert!(content.contains("[mining]"));
    assert!(content.contains("[coupling]"));

    // The commented template must parse back to the defaults.
    let config: coevo_core::CoevoConfig = toml::from_str(&content).unwrap();
    assert_eq!(config.coupling.min_coupling, 30);
    assert_eq!(config.thresholds.min_shared_revs, 5);
}

#[test]
fn init_refuses_if_exists() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(".coevo.toml"), "# existing").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_coevo"))
        .arg("init")
        .current_dir(dir.path())
        .output()
        .unwrap();

    assert!(!output.status.success());
    let content = std::fs::read_to_string(dir.path().join(".coevo.toml")).unwrap();
    assert_eq!(content, "# existing");
}
