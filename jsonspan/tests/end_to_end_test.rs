use jsonspan::{extract_value, resolve, to_bool, to_i64, to_string, Kind};

#[test]
fn navigates_a_realistic_document() {
    let doc = br#"
        {
            "user": {
                "name": "Ada Lovelace",
                "age": "36",
                "active": 1,
                "tags": ["mathematician", "writer"],
                "address": null
            }
        }
    "#;

    let (root, _) = extract_value(doc, 0).unwrap();

    let name_span = resolve(doc, &root, "user.name").unwrap();
    assert_eq!(to_string(doc, &name_span, false).unwrap(), "Ada Lovelace");

    let age_span = resolve(doc, &root, "user.age").unwrap();
    assert_eq!(to_i64(doc, &age_span, false).unwrap(), 36);
    assert!(to_i64(doc, &age_span, true).is_err());

    let active_span = resolve(doc, &root, "user.active").unwrap();
    assert!(to_bool(doc, &active_span, false).unwrap());

    let tag_span = resolve(doc, &root, "user.tags.0").unwrap();
    assert_eq!(to_string(doc, &tag_span, false).unwrap(), "mathematician");

    let address_span = resolve(doc, &root, "user.address").unwrap();
    assert_eq!(address_span.kind, Kind::Null);
}

#[test]
fn malformed_document_surfaces_byte_index() {
    let doc = br#"{"a": }"#;
    let err = extract_value(doc, 0).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("byte"));
}

#[test]
fn deeply_nested_arrays_round_trip() {
    let doc = b"[[[[[1]]]]]";
    let (root, _) = extract_value(doc, 0).unwrap();
    let span = resolve(doc, &root, "0.0.0.0.0").unwrap();
    assert_eq!(to_i64(doc, &span, false).unwrap(), 1);
}
