use scripted_dialog::config::Scenario;
use scripted_dialog::error::ConfigError;
use scripted_dialog::engine::MessageNode;

#[test]
fn test_load_example_scenario() {
    let scenario_path = concat!(env!("CARGO_MANIFEST_DIR"), "/scenarios/example.toml");
    let scenario = Scenario::from_file(scenario_path).expect("Failed to load scenario");

    assert_eq!(scenario.name(), "onboarding");
    assert_eq!(scenario.description(), Some("新規ユーザーへの簡単なヒアリング"));
    assert_eq!(scenario.root().id(), "main");

    let MessageNode::Group(group) = scenario.root() else {
        panic!("root should be a group");
    };
    let ids: Vec<&str> = group.children().iter().map(MessageNode::id).collect();
    assert_eq!(ids, ["name", "languages", "newsletter", "thanks"]);

    let config = scenario.session_config();
    assert_eq!(config.stop_command(), Some("/stop"));
    assert!(config.headline().is_some());
}

#[test]
fn test_scenario_roundtrip_with_real_file() {
    let scenario_path = concat!(env!("CARGO_MANIFEST_DIR"), "/scenarios/example.toml");

    // Load scenario from file
    let original = Scenario::from_file(scenario_path).expect("Failed to load scenario");

    // Write to a temporary file and read it back
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let copy_path = dir.path().join("copy.toml");
    original.to_file(&copy_path).expect("Failed to write");
    let restored = Scenario::from_file(&copy_path).expect("Failed to parse");

    // Verify they match
    assert_eq!(restored, original);
}

#[test]
fn test_missing_file_is_an_error() {
    let result = Scenario::from_file("does/not/exist.toml");

    assert!(matches!(result, Err(ConfigError::FileRead { .. })));
}

#[test]
fn test_write_to_missing_directory_is_a_write_error() {
    let scenario_path = concat!(env!("CARGO_MANIFEST_DIR"), "/scenarios/example.toml");
    let scenario = Scenario::from_file(scenario_path).expect("Failed to load scenario");

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let err = scenario
        .to_file(dir.path().join("missing/copy.toml"))
        .unwrap_err();

    assert!(matches!(err, ConfigError::FileWrite { .. }));
    assert!(err.to_string().contains("書き込み"));
}
