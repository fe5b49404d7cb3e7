//! End-to-end conversion tests against realistic schemas.

use std::collections::HashMap;

use apache_avro::types::Value;
use laminar_json2avro::temporal::{decode_date, decode_time, decode_timestamp};
use laminar_json2avro::{
    ConversionError, ConverterConfig, JsonAvroConverter, TemporalFailureStrategy,
    UnknownFieldStrategy,
};
use serde_json::{json, Value as JsonValue};

const ORDER_SCHEMA: &str = r#"{
    "type": "record",
    "name": "Order",
    "namespace": "shop",
    "fields": [
        {"name": "id", "type": "long"},
        {"name": "status", "type": {"type": "enum", "name": "Status", "symbols": ["NEW", "PAID", "SHIPPED"]}},
        {"name": "note", "type": ["null", "string"], "default": null},
        {"name": "placed_at", "type": {"type": "long", "logicalType": "timestamp-micros"}},
        {"name": "ship_date", "type": ["null", {"type": "int", "logicalType": "date"}], "default": null},
        {"name": "total", "type": {"type": "bytes", "logicalType": "decimal", "precision": 10, "scale": 2}},
        {"name": "items", "type": {"type": "array", "items": {
            "type": "record",
            "name": "Item",
            "fields": [
                {"name": "sku", "type": "string"},
                {"name": "qty", "type": "int", "default": 1},
                {"name": "weight", "type": ["null", "double"], "default": null}
            ]
        }}},
        {"name": "tags", "type": {"type": "map", "values": "string"}, "default": {}},
        {"name": "_ab_additional_properties", "type": ["null", {"type": "map", "values": "string"}], "default": null}
    ]
}"#;

fn order_converter(config: ConverterConfig) -> JsonAvroConverter {
    JsonAvroConverter::from_schema_str(ORDER_SCHEMA, config).unwrap()
}

fn field<'v>(value: &'v Value, name: &str) -> &'v Value {
    match value {
        Value::Record(fields) => fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
            .unwrap_or_else(|| panic!("no field {name}")),
        other => panic!("expected record, got {other:?}"),
    }
}

fn full_order() -> JsonValue {
    json!({
        "id": 1001,
        "status": "PAID",
        "note": "leave at door",
        "placed_at": 1_623_715_200_000_000_i64,
        "ship_date": 18_794,
        "total": 187.52,
        "items": [
            {"sku": "A-1", "qty": 2, "weight": 0.5},
            {"sku": "B-2", "qty": 1, "weight": null}
        ],
        "tags": {"channel": "web"}
    })
}

// ── Shape and round trip ─────────────────────────────────────────

#[test]
fn test_record_shape_matches_schema() {
    let converter = order_converter(ConverterConfig::default());
    let value = converter.convert_value(&full_order()).unwrap();

    let Value::Record(fields) = &value else {
        panic!("expected record");
    };
    let names: Vec<&str> = fields.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(
        names,
        [
            "id",
            "status",
            "note",
            "placed_at",
            "ship_date",
            "total",
            "items",
            "tags",
            "_ab_additional_properties"
        ]
    );
    assert_eq!(field(&value, "status"), &Value::Enum(1, "PAID".into()));
    assert_eq!(
        field(&value, "note"),
        &Value::Union(1, Box::new(Value::String("leave at door".into())))
    );
    assert_eq!(
        field(&value, "ship_date"),
        &Value::Union(1, Box::new(Value::Date(18_794)))
    );
    assert_eq!(
        field(&value, "_ab_additional_properties"),
        &Value::Union(0, Box::new(Value::Null))
    );
    assert!(value.validate(converter.schema()));
}

#[test]
fn test_record_to_json_round_trip() {
    let converter = order_converter(ConverterConfig::default());
    let json = full_order();
    let value = converter.convert_value(&json).unwrap();
    assert_eq!(converter.record_to_json(&value).unwrap(), json);
}

#[test]
fn test_avro_binary_round_trip() {
    let converter = order_converter(ConverterConfig::default());
    let json = full_order();
    let datum = converter
        .convert_to_avro(&serde_json::to_vec(&json).unwrap())
        .unwrap();
    let back: JsonValue =
        serde_json::from_slice(&converter.convert_to_json(&datum).unwrap()).unwrap();
    assert_eq!(back, json);
}

// ── Missing and optional fields ──────────────────────────────────

#[test]
fn test_missing_optional_field_is_null() {
    let converter = order_converter(ConverterConfig::default());
    let mut json = full_order();
    json.as_object_mut().unwrap().remove("note");
    let value = converter.convert_value(&json).unwrap();
    assert_eq!(field(&value, "note"), &Value::Union(0, Box::new(Value::Null)));
}

#[test]
fn test_missing_field_uses_default() {
    let converter = order_converter(ConverterConfig::default());
    let mut json = full_order();
    json["items"] = json!([{"sku": "C-3"}]);
    json.as_object_mut().unwrap().remove("tags");
    let value = converter.convert_value(&json).unwrap();

    let Value::Array(items) = field(&value, "items") else {
        panic!("expected array");
    };
    assert_eq!(field(&items[0], "qty"), &Value::Int(1));
    assert_eq!(field(&value, "tags"), &Value::Map(HashMap::new()));
}

#[test]
fn test_missing_required_field() {
    let converter = order_converter(ConverterConfig::default());
    let mut json = full_order();
    json.as_object_mut().unwrap().remove("id");
    let err = converter.convert_value(&json).unwrap_err();
    assert!(matches!(err, ConversionError::MissingRequiredField { ref path } if path == "id"));
}

#[test]
fn test_nested_error_path() {
    let converter = order_converter(ConverterConfig::default());
    let mut json = full_order();
    json["items"][1]["sku"] = json!(null);
    let err = converter.convert_value(&json).unwrap_err();
    assert_eq!(err.path(), Some("items[1].sku"));
}

// ── Additional properties ────────────────────────────────────────

#[test]
fn test_unmatched_field_collected() {
    let converter = order_converter(ConverterConfig::default());
    let mut json = full_order();
    json["extra"] = json!(42);
    json["meta"] = json!({"k": [1, 2]});
    let value = converter.convert_value(&json).unwrap();

    let Value::Union(1, extras) = field(&value, "_ab_additional_properties") else {
        panic!("expected populated catch-all");
    };
    let Value::Map(extras) = extras.as_ref() else {
        panic!("expected map");
    };
    assert_eq!(extras["extra"], Value::String("42".into()));
    assert_eq!(extras["meta"], Value::String(r#"{"k":[1,2]}"#.into()));
}

#[test]
fn test_nested_catch_all_object_merged() {
    let converter = order_converter(ConverterConfig::default());
    let mut json = full_order();
    json["_ab_additional_properties"] = json!({"carried": "yes"});
    json["extra"] = json!(true);
    let value = converter.convert_value(&json).unwrap();
    let back = converter.record_to_json(&value).unwrap();
    assert_eq!(back["carried"], json!("yes"));
    assert_eq!(back["extra"], json!("true"));
    assert!(back.get("_ab_additional_properties").is_none());
}

#[test]
fn test_ignore_strategy_drops_fields() {
    let converter = order_converter(ConverterConfig {
        unknown_fields: UnknownFieldStrategy::Ignore,
        ..ConverterConfig::default()
    });
    let mut json = full_order();
    json["extra"] = json!(42);
    let value = converter.convert_value(&json).unwrap();
    assert_eq!(
        field(&value, "_ab_additional_properties"),
        &Value::Union(0, Box::new(Value::Null))
    );
    assert_eq!(converter.stats().unknown_fields_dropped, 1);
}

#[test]
fn test_strict_unmatched_fields_from_properties() {
    let props = HashMap::from([("strict.unmatched.fields".to_string(), "true".to_string())]);
    let converter = order_converter(ConverterConfig::from_properties(&props).unwrap());
    let mut json = full_order();
    json["items"][0]["colour"] = json!("red");
    let err = converter.convert_value(&json).unwrap_err();
    assert!(matches!(
        err,
        ConversionError::UnknownField { ref path, ref field } if path == "items[0]" && field == "colour"
    ));
}

// ── Enums and unions ─────────────────────────────────────────────

#[test]
fn test_invalid_enum_symbol() {
    let converter = order_converter(ConverterConfig::default());
    let mut json = full_order();
    json["status"] = json!("LOST");
    let err = converter.convert_value(&json).unwrap_err();
    assert!(matches!(
        err,
        ConversionError::InvalidEnumSymbol { ref path, ref symbol } if path == "status" && symbol == "LOST"
    ));
}

#[test]
fn test_nullable_union_prefers_null() {
    let converter =
        JsonAvroConverter::from_schema_str(r#"["null", "string"]"#, ConverterConfig::default())
            .unwrap();
    assert_eq!(
        converter.convert_value(&json!(null)).unwrap(),
        Value::Union(0, Box::new(Value::Null))
    );
}

// ── Numerics ─────────────────────────────────────────────────────

#[test]
fn test_special_float_literals() {
    let converter =
        JsonAvroConverter::from_schema_str(r#""double""#, ConverterConfig::default()).unwrap();
    match converter.convert_value(&json!("NaN")).unwrap() {
        Value::Double(f) => assert!(f.is_nan()),
        other => panic!("expected double, got {other:?}"),
    }
    assert_eq!(
        converter.convert_value(&json!("Infinity")).unwrap(),
        Value::Double(f64::INFINITY)
    );
    let back = converter.record_to_json(&Value::Double(f64::NAN)).unwrap();
    assert_eq!(back, json!("NaN"));
}

#[test]
fn test_int_narrowing_overflow() {
    let converter = order_converter(ConverterConfig::default());
    let mut json = full_order();
    json["items"][0]["qty"] = json!(5_000_000_000_i64);
    let err = converter.convert_value(&json).unwrap_err();
    assert!(matches!(err, ConversionError::NumericOverflow { ref path, .. } if path == "items[0].qty"));
}

#[test]
fn test_decimal_excess_scale() {
    let converter = order_converter(ConverterConfig::default());
    let mut json = full_order();
    json["total"] = json!("1.005");
    let err = converter.convert_value(&json).unwrap_err();
    assert!(matches!(err, ConversionError::NumericOverflow { ref path, .. } if path == "total"));
}

#[test]
fn test_wide_decimal_round_trip() {
    let schema = r#"{"type": "record", "name": "Ledger", "fields": [
        {"name": "balance", "type": {"type": "bytes", "logicalType": "decimal", "precision": 20, "scale": 2}},
        {"name": "supply", "type": {"type": "bytes", "logicalType": "decimal", "precision": 40, "scale": 0}}
    ]}"#;
    let converter = JsonAvroConverter::from_schema_str(schema, ConverterConfig::default()).unwrap();
    let json = json!({
        "balance": "123456789012345678.91",
        "supply": "123456789012345678901234567890123456789"
    });
    let datum = converter
        .convert_to_avro(&serde_json::to_vec(&json).unwrap())
        .unwrap();
    let back: JsonValue =
        serde_json::from_slice(&converter.convert_to_json(&datum).unwrap()).unwrap();
    assert_eq!(back, json);
}

// ── Temporal ─────────────────────────────────────────────────────

#[test]
fn test_temporal_reference_values() {
    assert_eq!(decode_date("2021-06-15"), Some(18_793));
    assert_eq!(decode_timestamp("2021-06-15T00:00:00Z"), Some(1_623_715_200_000_000));
    assert_eq!(decode_time("02:00:00+03:00"), Some(23 * 3_600 * 1_000_000));
}

#[test]
fn test_temporal_text_fields() {
    let converter = order_converter(ConverterConfig::default());
    let mut json = full_order();
    json["placed_at"] = json!("2021-06-15T00:00:00Z");
    json["ship_date"] = json!("2021-06-16");
    let value = converter.convert_value(&json).unwrap();
    assert_eq!(field(&value, "placed_at"), &Value::TimestampMicros(1_623_715_200_000_000));
    assert_eq!(
        field(&value, "ship_date"),
        &Value::Union(1, Box::new(Value::Date(18_794)))
    );
}

#[test]
fn test_zoned_timestamp_in_date_field() {
    let converter = order_converter(ConverterConfig::default());
    let mut json = full_order();
    json["ship_date"] = json!("2021-06-16T10:00:00Z");
    let value = converter.convert_value(&json).unwrap();
    assert_eq!(
        field(&value, "ship_date"),
        &Value::Union(1, Box::new(Value::Date(18_794)))
    );
}

#[test]
fn test_temporal_failure_fatal_by_default() {
    let converter = order_converter(ConverterConfig::default());
    let mut json = full_order();
    json["ship_date"] = json!("someday");
    let err = converter.convert_value(&json).unwrap_err();
    assert!(matches!(
        err,
        ConversionError::TemporalDecodeFailure { ref path, logical_type: "date", .. } if path == "ship_date"
    ));
}

#[test]
fn test_temporal_failure_omitted() {
    let converter = order_converter(ConverterConfig {
        temporal_failure: TemporalFailureStrategy::Omit,
        ..ConverterConfig::default()
    });
    let mut json = full_order();
    json["ship_date"] = json!("someday");
    let value = converter.convert_value(&json).unwrap();
    assert_eq!(field(&value, "ship_date"), &Value::Union(0, Box::new(Value::Null)));
    assert_eq!(converter.stats().temporal_values_omitted, 1);

    // A required temporal field still fails.
    json["placed_at"] = json!("whenever");
    let err = converter.convert_value(&json).unwrap_err();
    assert!(matches!(err, ConversionError::TemporalDecodeFailure { .. }));
}
