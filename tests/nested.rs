// Recursive wrapping tests.
//
// Invariants exercised:
// - With `recursive`, fields mapped to a nested spec become ValidatedMaps,
//   both as single maps and as lists of maps, at every depth.
// - Children inherit recursion, throw policy and relaxation.
// - Fields without a nested spec stay plain.
// - Relaxed filtering happens before wrapping.
use serde_json::json;
use validated_map::{
    map_from_json, Checked, JsonSchemaSpecs, Map, Options, SchemaError, SpecTable, ValidatedMap,
    Value,
};

fn raw(v: serde_json::Value) -> Map {
    map_from_json(v).expect("object literal")
}

fn slack() -> SpecTable {
    SpecTable::new()
        .define("message", ["text", "user", "reactions", "extra"])
        .define("user", ["id", "name", "profile"])
        .define("profile", ["email"])
        .define("reaction", ["emoji_name", "reaction_users", "reaction_count"])
        .nest("message", "user", "user")
        .nest("message", "reactions", "reaction")
        .nest("user", "profile", "profile")
}

// Test: a nested user map becomes a validated map.
// Assumes: recursive = true, `user` maps to a spec with schema {id, name, profile}.
// Verifies: reading a misspelled key on the child fails strictly.
#[test]
fn nested_field_is_wrapped() {
    let m = ValidatedMap::build(
        raw(json!({"user": {"id": "U1", "name": "A"}})),
        &Options::new().spec("message").recursive(true),
        &slack(),
    )
    .unwrap();

    let user = match m.get("user").unwrap() {
        Checked::Valid(Some(Value::Record(user))) => user,
        other => panic!("expected a validated user, got {:?}", other),
    };
    assert_eq!(user["id"], Value::from("U1"));
    assert!(matches!(
        user.get("nam"),
        Err(SchemaError::InvalidKeyAccess { .. })
    ));
}

// Test: recursion continues below the first level.
// Assumes: user.profile maps to a profile spec.
// Verifies: the grandchild is validated too.
#[test]
fn recursion_reaches_grandchildren() {
    let m = ValidatedMap::build(
        raw(json!({"user": {"id": "U1", "profile": {"email": "a@b"}}})),
        &Options::new().spec("message").recursive(true),
        &slack(),
    )
    .unwrap();

    let profile = m
        .get_in(&["user", "profile"])
        .unwrap()
        .valid()
        .flatten()
        .and_then(Value::as_record)
        .expect("profile is validated");
    assert!(profile.get("emial").is_err());
}

// Test: lists of maps.
// Assumes: reactions maps to the reaction spec.
// Verifies: every element is wrapped; a bad element fails the whole construction.
#[test]
fn lists_of_maps_are_wrapped_elementwise() {
    let specs = slack();
    let opts = Options::new().spec("message").recursive(true);
    let m = ValidatedMap::build(
        raw(json!({"reactions": [
            {"emoji_name": "+1", "reaction_count": 2},
            {"emoji_name": "tada", "reaction_count": 1}
        ]})),
        &opts,
        &specs,
    )
    .unwrap();
    let reactions = m["reactions"].as_list().unwrap();
    assert!(reactions.iter().all(|r| r.as_record().is_some()));

    let err = ValidatedMap::build(
        raw(json!({"reactions": [{"emoji_name": "+1"}, {"name": "tada"}]})),
        &opts,
        &specs,
    )
    .unwrap_err();
    assert!(matches!(
        err,
        SchemaError::ConstructorSchemaViolation { ref extra_keys, .. } if extra_keys == &["name"]
    ));
}

// Test: without `recursive`, nested maps stay plain.
#[test]
fn non_recursive_leaves_nested_plain() {
    let m = ValidatedMap::build(
        raw(json!({"user": {"id": "U1", "nam": "typo kept"}})),
        &Options::new().spec("message"),
        &slack(),
    )
    .unwrap();
    assert!(m["user"].as_map().is_some());
}

// Test: fields without a nested spec.
// Assumes: `extra` has no nested spec.
// Verifies: its map value stays plain even under recursion.
#[test]
fn fields_without_spec_stay_plain() {
    let m = ValidatedMap::build(
        raw(json!({"extra": {"anything": 1}})),
        &Options::new().spec("message").recursive(true),
        &slack(),
    )
    .unwrap();
    assert!(m["extra"].as_map().is_some());
}

// Test: policies are inherited.
// Assumes: parent is lenient on reads and relaxed.
// Verifies: child reads are lenient and child input is filtered.
#[test]
fn children_inherit_policies() {
    let m = ValidatedMap::build(
        raw(json!({"user": {"id": "U1", "nickname": "x"}})),
        &Options::new()
            .spec("message")
            .recursive(true)
            .relax_constructor_constraints(true)
            .throw_on_invalid_read(false),
        &slack(),
    )
    .unwrap();
    let user = m["user"].as_record().unwrap();
    assert!(!user.has_value("nickname"));
    assert!(user.get("nickname").unwrap().is_invalid_key());
}

// Test: relaxed filtering runs before wrapping.
// Assumes: `dropped` is outside the message schema but holds a map.
// Verifies: it is dropped rather than wrapped.
#[test]
fn dropped_keys_are_never_wrapped() {
    let specs = slack().nest("message", "dropped", "user");
    let m = ValidatedMap::build(
        raw(json!({"dropped": {"id": "U1"}, "text": "hi"})),
        &Options::new()
            .spec("message")
            .recursive(true)
            .relax_constructor_constraints(true),
        &specs,
    )
    .unwrap();
    assert_eq!(m.len(), 1);
    assert!(!m.has_value("dropped"));
}

// Test: JSON Schema documents drive recursion.
// Assumes: `$ref` names the child document.
// Verifies: the child is wrapped with the referenced document's properties.
#[test]
fn json_schema_refs_drive_recursion() {
    let mut specs = JsonSchemaSpecs::new();
    specs.insert(
        "message",
        json!({"properties": {"text": {}, "user": {"$ref": "user"}}}),
    );
    specs.insert("user", json!({"properties": {"id": {}, "name": {}}}));

    let m = ValidatedMap::build(
        raw(json!({"text": "hi", "user": {"id": "U1"}})),
        &Options::new().spec("message").recursive(true),
        &specs,
    )
    .unwrap();
    let user = m["user"].as_record().unwrap();
    assert!(user.contains_key("name"));
    assert!(user.get("nam").is_err());
}

// Test: nested specs follow the spec that supplied the schema.
// Assumes: `spec_id` is unknown, so resolution falls through to the metadata spec.
// Verifies: the user field is wrapped per the metadata spec's nested specs.
#[test]
fn metadata_spec_drives_recursion_when_spec_id_is_unknown() {
    let m = ValidatedMap::build(
        raw(json!({"user": {"id": "U1", "name": "A"}})),
        &Options::new()
            .spec("unknown")
            .metadata_spec("message")
            .recursive(true),
        &slack(),
    )
    .unwrap();

    assert!(m.contains_key("text"));
    let user = m["user"].as_record().expect("user is validated");
    assert!(user.get("nam").is_err());
}

// Test: recursion with a schema taken from the raw keys.
// Assumes: no spec id resolves, although the table nests `user` under `message`.
// Verifies: nothing is wrapped.
#[test]
fn raw_key_schema_wraps_nothing() {
    let specs = SpecTable::new().nest("message", "user", "user").define("user", ["id"]);
    let m = ValidatedMap::build(
        raw(json!({"user": {"id": "U1"}})),
        &Options::new().spec("message").recursive(true),
        &specs,
    )
    .unwrap();
    assert!(m["user"].as_map().is_some());
}
