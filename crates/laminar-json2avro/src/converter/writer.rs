//! Avro → JSON: the reverse walk.
//!
//! Unions are unwrapped, enums become their symbol, bytes and fixed
//! become Latin-1 strings, date/time values stay as their integer
//! encodings, and decimals become JSON numbers (or numeric strings when
//! a double cannot hold every digit). Non-finite floats are
//! written as the strings `"NaN"`, `"Infinity"` and `"-Infinity"`, which
//! the forward path accepts again. Catch-all entries are flattened back
//! into the enclosing object without overriding declared fields.

use apache_avro::schema::{DecimalSchema, RecordSchema, SchemaKind};
use apache_avro::types::Value;
use apache_avro::Schema;
use serde_json::{Map, Number, Value as JsonValue};

use crate::context::{ConversionContext, PathSegment};
use crate::decimal::{decimal_value, format_unscaled, from_twos_complement};
use crate::error::ConversionResult;
use crate::names::NamedSchemas;
use crate::scalar::latin1_string;

/// Renders Avro values as JSON, guided by the schema they conform to.
pub(crate) struct JsonWriter<'a> {
    names: &'a NamedSchemas,
}

impl<'a> JsonWriter<'a> {
    pub(crate) fn new(names: &'a NamedSchemas) -> Self {
        Self { names }
    }

    /// Converts `value` (conforming to `schema`) into a JSON tree.
    pub(crate) fn write(
        &self,
        schema: &Schema,
        value: &Value,
        ctx: &mut ConversionContext<'_>,
    ) -> ConversionResult<JsonValue> {
        let schema = self.names.require(schema, ctx)?;
        match (schema, value) {
            (Schema::Union(union), Value::Union(index, inner)) => {
                let branch = usize::try_from(*index)
                    .ok()
                    .and_then(|i| union.variants().get(i))
                    .ok_or_else(|| ctx.type_mismatch("union branch", format!("index {index}")))?;
                self.write(branch, inner, ctx)
            }
            (_, Value::Union(_, inner)) => self.write(schema, inner, ctx),
            (Schema::Union(union), _) => self.write_untagged(union.variants(), value, ctx),
            (_, Value::Null) => Ok(JsonValue::Null),
            (_, Value::Boolean(b)) => Ok(JsonValue::Bool(*b)),
            (_, Value::Int(n) | Value::Date(n) | Value::TimeMillis(n)) => Ok(JsonValue::from(*n)),
            (
                _,
                Value::Long(n)
                | Value::TimeMicros(n)
                | Value::TimestampMillis(n)
                | Value::TimestampMicros(n)
                | Value::LocalTimestampMillis(n)
                | Value::LocalTimestampMicros(n),
            ) => Ok(JsonValue::from(*n)),
            // Shortest decimal form, so 0.1f32 stays 0.1.
            (_, Value::Float(f)) => Ok(float_to_json(
                f.to_string().parse().unwrap_or_else(|_| f64::from(*f)),
            )),
            (_, Value::Double(f)) => Ok(float_to_json(*f)),
            (_, Value::String(s) | Value::Enum(_, s)) => Ok(JsonValue::String(s.clone())),
            (_, Value::Bytes(bytes) | Value::Fixed(_, bytes)) => {
                Ok(JsonValue::String(latin1_string(bytes)))
            }
            (_, Value::Uuid(uuid)) => Ok(JsonValue::String(uuid.to_string())),
            (_, Value::Duration(duration)) => {
                Ok(JsonValue::String(latin1_string(&<[u8; 12]>::from(*duration))))
            }
            (Schema::Decimal(decimal), Value::Decimal(d)) => Self::write_decimal(decimal, d),
            (Schema::Array(items), Value::Array(elements)) => {
                let mut out = Vec::with_capacity(elements.len());
                for (i, element) in elements.iter().enumerate() {
                    out.push(ctx.scoped(PathSegment::Index(i), |ctx| self.write(items, element, ctx))?);
                }
                Ok(JsonValue::Array(out))
            }
            (Schema::Map(values), Value::Map(entries)) => {
                let mut out = Map::new();
                for (key, entry) in entries {
                    let json =
                        ctx.scoped(PathSegment::Key(key.clone()), |ctx| self.write(values, entry, ctx))?;
                    out.insert(key.clone(), json);
                }
                Ok(JsonValue::Object(out))
            }
            (Schema::Record(record), Value::Record(fields)) => self.write_record(record, fields, ctx),
            (schema, value) => Err(ctx.type_mismatch(
                format!("{:?}", SchemaKind::from(schema)).to_lowercase(),
                format!("{:?} value", SchemaKind::from(value)).to_lowercase(),
            )),
        }
    }

    /// A bare value against a union schema: the first member that accepts it.
    fn write_untagged(
        &self,
        variants: &[Schema],
        value: &Value,
        ctx: &mut ConversionContext<'_>,
    ) -> ConversionResult<JsonValue> {
        let mut last_err = None;
        for variant in variants {
            match self.write(variant, value, ctx) {
                Ok(json) => return Ok(json),
                Err(e) => last_err = Some(e),
            }
        }
        Err(last_err.unwrap_or_else(|| ctx.unsupported("empty union")))
    }

    fn write_record(
        &self,
        record: &RecordSchema,
        fields: &[(String, Value)],
        ctx: &mut ConversionContext<'_>,
    ) -> ConversionResult<JsonValue> {
        let catch_all = ctx.config().additional_properties_field.as_str();
        let mut object = Map::new();
        let mut extras = None;

        for (name, value) in fields {
            let field = record
                .lookup
                .get(name)
                .and_then(|&i| record.fields.get(i))
                .ok_or_else(|| {
                    ctx.type_mismatch(format!("field of record {}", record.name.name), format!("field '{name}'"))
                })?;
            let json = ctx.scoped(PathSegment::Field(name.clone()), |ctx| {
                self.write(&field.schema, value, ctx)
            })?;
            if name == catch_all {
                extras = Some(json);
            } else {
                object.insert(name.clone(), json);
            }
        }

        match extras {
            Some(JsonValue::Object(entries)) => {
                for (key, value) in entries {
                    object.entry(key).or_insert(value);
                }
            }
            Some(JsonValue::Null) | None => {}
            Some(other) => {
                object.insert(catch_all.to_string(), other);
            }
        }
        Ok(JsonValue::Object(object))
    }

    fn write_decimal(decimal: &DecimalSchema, value: &apache_avro::Decimal) -> ConversionResult<JsonValue> {
        let bytes = Vec::<u8>::try_from(value)?;
        let text = format_unscaled(&from_twos_complement(&bytes), decimal.scale);
        let number: Number = serde_json::from_str(&text)?;
        let exact = number.is_i64()
            || number.is_u64()
            || number
                .as_f64()
                .and_then(|f| decimal_value(&f.to_string()))
                .zip(decimal_value(&text))
                .is_some_and(|(shown, actual)| shown == actual);
        Ok(if exact {
            JsonValue::Number(number)
        } else {
            JsonValue::String(text)
        })
    }
}

fn float_to_json(value: f64) -> JsonValue {
    if value.is_nan() {
        JsonValue::String("NaN".into())
    } else if value.is_infinite() {
        let text = if value > 0.0 { "Infinity" } else { "-Infinity" };
        JsonValue::String(text.into())
    } else {
        Number::from_f64(value).map_or(JsonValue::Null, JsonValue::Number)
    }
}
