//! Tests for migrate-model types.

use migrate_model::{
    CardinalityPolicy, InputError, Link, LinkOrigin, RecordKey, RecordSet, SessionConfig, Side,
};
use serde_json::json;

#[test]
fn record_set_from_json_payload() {
    let payload = json!([
        {"id": 1, "name": "John Doe", "email": "john@example.com"},
        {"id": 2, "name": "Jane Smith"},
    ]);
    let set = RecordSet::from_json(Side::Old, "id", payload).expect("valid record set");
    assert_eq!(set.side(), Side::Old);
    assert_eq!(set.key_field(), "id");
    let keys: Vec<&str> = set.keys().iter().map(RecordKey::as_str).collect();
    assert_eq!(keys, vec!["1", "2"]);
    let emails: Vec<Option<String>> = set
        .records()
        .iter()
        .map(|r| r.text("email").map(|t| t.into_owned()))
        .collect();
    assert_eq!(emails, vec![Some("john@example.com".to_string()), None]);
}

#[test]
fn invalid_key_reports_reason() {
    let err = RecordSet::from_values(Side::New, "code", vec![json!({"code": {"nested": 1}})])
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "new record at index 0 has an invalid 'code' value: not a scalar"
    );
    assert!(matches!(err, InputError::InvalidKey { .. }));
}

#[test]
fn config_serializes_round_trip_through_json() {
    let config = SessionConfig::default()
        .with_key_field("code")
        .with_display_field("title")
        .with_policy(CardinalityPolicy::ManyToOne)
        .with_threshold(0.75)
        .with_secondary("email", 0.2)
        .with_history_limit(Some(50));
    let json = serde_json::to_string(&config).expect("serialize config");
    let back: SessionConfig = serde_json::from_str(&json).expect("deserialize config");
    assert_eq!(back, config);
    assert!(json.contains(r#""policy":"many-to-one""#));
}

#[test]
fn export_links_deserialize_from_host_json() {
    let links: Vec<Link> = serde_json::from_value(json!([
        {"old_key": "1", "new_key": "101", "score": 0.92, "origin": "auto"},
        {"old_key": "2", "new_key": "102", "origin": "manual"},
    ]))
    .expect("deserialize links");
    assert_eq!(links[0].origin, LinkOrigin::Auto);
    assert_eq!(links[0].confidence(), 0.92);
    assert_eq!(links[1], Link::manual(2, 102));
}
