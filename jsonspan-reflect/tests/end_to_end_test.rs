use indexmap::IndexMap;
use jsonspan_reflect::{json_record, unmarshal, unmarshal_strict, Error, Reader, Value};

#[test]
fn scenario_1_nested_path_through_arrays_and_objects() {
    let doc = br#"{"a":[["a",1],["b",2],["c",3]]}"#;
    let reader = Reader::new(doc).unwrap();
    assert_eq!(reader.get_string("a.1.0").unwrap(), "b");
}

#[derive(Debug, Default, PartialEq)]
struct Item;

json_record! {
    struct Item {
        fields {}
        embeds {}
    }
}

#[derive(Debug, Default, PartialEq)]
struct Counted {
    count: i64,
    items: Vec<Item>,
}

json_record! {
    struct Counted {
        fields {
            count: i64 { json: "count", index: 0, required: true, nonempty: false },
            items: Vec<Item> { json: "items", index: 1, required: false, nonempty: false }
        }
        embeds {}
    }
}

#[test]
fn scenario_2_required_field_present_and_empty_sequence() {
    let doc = br#"{"count":19,"items":[]}"#;
    let record: Counted = unmarshal(doc).unwrap();
    assert_eq!(record.count, 19);
    assert!(record.items.is_empty());
}

#[derive(Debug, Default)]
struct IsEmptyFlagged {
    is_empty: i64,
}

json_record! {
    struct IsEmptyFlagged {
        fields {
            is_empty: i64 { json: "is_empty", index: 0, required: false, nonempty: true }
        }
        embeds {}
    }
}

#[test]
fn scenario_3_nonempty_zero_value_is_rejected() {
    let doc = br#"{"is_empty":0}"#;
    let err = unmarshal::<IsEmptyFlagged>(doc).unwrap_err();
    assert!(matches!(err, Error::NonEmptyZeroValue { field: "is_empty" }));
}

#[test]
fn scenario_4_missing_key_reports_key_missing_and_key_exists_is_false() {
    let doc = br#"{"a":"b"}"#;
    let reader = Reader::new(doc).unwrap();
    assert!(reader.get("x").is_err());
    assert!(!jsonspan::key_exists(
        doc,
        &jsonspan::extract_value(doc, 0).unwrap().0,
        "x"
    ));
}

#[test]
fn scenario_5_unmarshal_string_resolves_smart_quotes() {
    let doc = "\"\u{2018}Hello\u{2019}\"".as_bytes();
    let value: String = unmarshal(doc).unwrap();
    assert_eq!(value, "\u{2018}Hello\u{2019}");
}

#[test]
fn scenario_6_sequence_of_mappings_presized_to_element_count() {
    let doc = br#"[{"a":1},{"a":2}]"#;
    let value: Vec<IndexMap<String, i64>> = unmarshal(doc).unwrap();
    assert_eq!(value.len(), 2);
    assert_eq!(value[0].get("a"), Some(&1));
    assert_eq!(value[1].get("a"), Some(&2));
}

#[test]
fn strict_mode_rejects_number_to_string_unmarshal() {
    let doc = b"42";
    let err = unmarshal_strict::<String>(doc).unwrap_err();
    assert!(matches!(err, Error::Core(jsonspan::Error::StrictStandards { .. })));
}

#[test]
fn polymorphic_unmarshal_into_value_preserves_shape() {
    let doc = br#"{"n": null, "t": true, "arr": [1, 2.5, "x"]}"#;
    let value: Value = unmarshal(doc).unwrap();
    let obj = value.as_object().unwrap();
    assert_eq!(obj.get("n"), Some(&Value::Null));
    assert_eq!(obj.get("t"), Some(&Value::Bool(true)));
    assert_eq!(obj.get("arr").unwrap().as_array().unwrap().len(), 3);
}
