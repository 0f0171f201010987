use std::fs;

use migrate_cli::files::{
    ConfigError, FileError, load_records, load_seed, parse_config, parse_csv_records, parse_seed,
    write_snapshot,
};
use migrate_map::MigrationSession;
use migrate_model::{CardinalityPolicy, InputError, LinkOrigin, RecordKey, SessionConfig, Side};
use serde_json::{Value, json};
use tempfile::TempDir;

#[test]
fn csv_rows_become_string_fields() {
    let text = "id, name ,city\n1,John Doe,\n2,Jane Smith,Oslo\n";
    let rows = parse_csv_records(text.as_bytes()).unwrap();
    assert_eq!(
        rows,
        vec![
            json!({"id": "1", "name": "John Doe", "city": Value::Null}),
            json!({"id": "2", "name": "Jane Smith", "city": "Oslo"}),
        ]
    );
}

#[test]
fn csv_and_json_keys_agree() {
    let dir = TempDir::new().unwrap();
    let csv_path = dir.path().join("old.csv");
    let json_path = dir.path().join("new.json");
    fs::write(&csv_path, "id,name\n1,John Doe\n2,Jane Smith\n").unwrap();
    fs::write(
        &json_path,
        r#"[{"id": 1, "name": "John Doe"}, {"id": 2, "name": "Jane Smith"}]"#,
    )
    .unwrap();

    let old = load_records(&csv_path, Side::Old, "id").unwrap();
    let new = load_records(&json_path, Side::New, "id").unwrap();
    assert_eq!(old.keys(), new.keys());
    assert_eq!(old.side(), Side::Old);
    assert!(new.contains(&RecordKey::from(2)));
}

#[test]
fn empty_key_cell_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("blank-key.csv");
    fs::write(&path, "id,name\n,John Doe\n").unwrap();
    let err = load_records(&path, Side::Old, "id").unwrap_err();
    assert!(matches!(
        err,
        FileError::Input {
            source: InputError::InvalidKey { index: 0, .. },
            ..
        }
    ));
}

#[test]
fn json_object_payload_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("object.json");
    fs::write(&path, r#"{"id": 1}"#).unwrap();
    let err = load_records(&path, Side::New, "id").unwrap_err();
    assert!(matches!(
        err,
        FileError::Input {
            source: InputError::NotAnArray { side: Side::New },
            ..
        }
    ));
}

#[test]
fn malformed_json_is_reported_with_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.json");
    fs::write(&path, "[{").unwrap();
    let err = load_records(&path, Side::Old, "id").unwrap_err();
    assert!(matches!(err, FileError::Json { .. }));
    assert!(err.to_string().contains("broken.json"));
}

#[test]
fn config_file_overrides_defaults() {
    let config = parse_config(
        r#"
        display_field = "label"
        policy = "many-to-one"
        threshold = 0.75
        metric = "jaro-winkler"
        history_limit = 50

        [secondary]
        field = "city"
        weight = 0.25
        "#,
    )
    .unwrap();
    assert_eq!(config.key_field, "id");
    assert_eq!(config.display_field, "label");
    assert_eq!(config.policy, CardinalityPolicy::ManyToOne);
    assert_eq!(config.history_limit, Some(50));
    assert_eq!(config.secondary.map(|s| s.field).as_deref(), Some("city"));
}

#[test]
fn out_of_range_config_is_invalid() {
    let err = parse_config("threshold = 1.5").unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(InputError::InvalidConfig(_))));
    let err = parse_config("threshold = \"high\"").unwrap_err();
    assert!(matches!(err, ConfigError::Toml(_)));
}

#[test]
fn seed_accepts_bare_link_list() {
    let links = parse_seed(r#"[{"old_key": "1", "new_key": "101", "origin": "manual"}]"#).unwrap();
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].origin, LinkOrigin::Manual);
    assert_eq!(links[0].score, None);
}

#[test]
fn exported_snapshot_seeds_a_new_session() {
    let dir = TempDir::new().unwrap();
    let old = vec![
        json!({"id": 1, "name": "John Doe"}),
        json!({"id": 2, "name": "Jane Smith"}),
    ];
    let new = vec![
        json!({"id": 101, "name": "John Doe"}),
        json!({"id": 102, "name": "Jane Smith"}),
    ];
    let mut session =
        MigrationSession::new(SessionConfig::default(), old.clone(), new.clone()).unwrap();
    session.auto_match();
    let snapshot = session.request_export();

    let path = dir.path().join("export.json");
    write_snapshot(&path, &snapshot).unwrap();
    let seed = load_seed(&path).unwrap();
    assert_eq!(seed, snapshot.links);

    let resumed = MigrationSession::new(SessionConfig::default(), old, new)
        .unwrap()
        .with_links(seed)
        .unwrap();
    assert!(resumed.progress().is_complete());
    assert!(!resumed.can_undo());

    let root = dir.path().to_path_buf();
    drop(dir);
    assert!(!root.exists());
}
