//! JSON → Avro: walks a schema in lockstep with a JSON tree.

use std::collections::HashMap;

use apache_avro::schema::{DecimalSchema, EnumSchema, FixedSchema, RecordField, RecordSchema, UnionSchema};
use apache_avro::types::Value;
use apache_avro::{Decimal, Duration, Schema};
use serde_json::{Map, Value as JsonValue};
use tracing::{debug, trace};

use crate::additional::{collect_as_json, sanitize_field_name};
use crate::config::{ConverterConfig, TemporalFailureStrategy, UnknownFieldStrategy};
use crate::context::{ConversionContext, PathSegment};
use crate::decimal::{to_twos_complement, unscaled_from_text};
use crate::error::{ConversionError, ConversionResult, ScalarError};
use crate::names::NamedSchemas;
use crate::scalar::{
    coerce_scalar, extract_i64, is_integer_literal, json_kind_name, latin1_bytes,
    parse_special_float, render_json_text, ScalarKind,
};
use crate::temporal::{decode_date, decode_time, decode_timestamp, micros_to_millis};

/// Size of an Avro `duration` fixed value.
const DURATION_SIZE: usize = 12;

/// Date/time logical types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Temporal {
    Date,
    TimeMillis,
    TimeMicros,
    TimestampMillis,
    TimestampMicros,
    LocalTimestampMillis,
    LocalTimestampMicros,
}

impl Temporal {
    fn of(schema: &Schema) -> Option<Self> {
        Some(match schema {
            Schema::Date => Self::Date,
            Schema::TimeMillis => Self::TimeMillis,
            Schema::TimeMicros => Self::TimeMicros,
            Schema::TimestampMillis => Self::TimestampMillis,
            Schema::TimestampMicros => Self::TimestampMicros,
            Schema::LocalTimestampMillis => Self::LocalTimestampMillis,
            Schema::LocalTimestampMicros => Self::LocalTimestampMicros,
            _ => return None,
        })
    }

    fn logical_type(self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::TimeMillis => "time-millis",
            Self::TimeMicros => "time-micros",
            Self::TimestampMillis => "timestamp-millis",
            Self::TimestampMicros => "timestamp-micros",
            Self::LocalTimestampMillis => "local-timestamp-millis",
            Self::LocalTimestampMicros => "local-timestamp-micros",
        }
    }

    /// Decodes text into this type's own unit.
    fn decode(self, text: &str) -> Option<i64> {
        match self {
            Self::Date => decode_date(text).map(i64::from),
            Self::TimeMillis => decode_time(text).map(micros_to_millis),
            Self::TimeMicros => decode_time(text),
            Self::TimestampMillis | Self::LocalTimestampMillis => {
                decode_timestamp(text).map(micros_to_millis)
            }
            Self::TimestampMicros | Self::LocalTimestampMicros => decode_timestamp(text),
        }
    }

    fn to_value(self, encoded: i64) -> Option<Value> {
        Some(match self {
            Self::Date => Value::Date(i32::try_from(encoded).ok()?),
            Self::TimeMillis => Value::TimeMillis(i32::try_from(encoded).ok()?),
            Self::TimeMicros => Value::TimeMicros(encoded),
            Self::TimestampMillis => Value::TimestampMillis(encoded),
            Self::TimestampMicros => Value::TimestampMicros(encoded),
            Self::LocalTimestampMillis => Value::LocalTimestampMillis(encoded),
            Self::LocalTimestampMicros => Value::LocalTimestampMicros(encoded),
        })
    }
}

/// Converts JSON values against a schema, resolving references through
/// a [`NamedSchemas`] table.
pub(crate) struct JsonReader<'a> {
    names: &'a NamedSchemas,
}

impl<'a> JsonReader<'a> {
    pub(crate) fn new(names: &'a NamedSchemas) -> Self {
        Self { names }
    }

    /// Converts `json` into a value conforming to `schema`.
    pub(crate) fn read(
        &self,
        schema: &Schema,
        json: &JsonValue,
        ctx: &mut ConversionContext<'_>,
    ) -> ConversionResult<Value> {
        if let Some(temporal) = Temporal::of(schema) {
            return Self::read_temporal(temporal, json, ctx);
        }
        match schema {
            Schema::Null => match json {
                JsonValue::Null => Ok(Value::Null),
                other => Err(ctx.type_mismatch("null", json_kind_name(other))),
            },
            Schema::Boolean => Self::scalar(ScalarKind::Boolean, json, ctx),
            Schema::Int => Self::scalar(ScalarKind::Int, json, ctx),
            Schema::Long => Self::scalar(ScalarKind::Long, json, ctx),
            Schema::Float => Self::scalar(ScalarKind::Float, json, ctx),
            Schema::Double => Self::scalar(ScalarKind::Double, json, ctx),
            Schema::Bytes => Self::scalar(ScalarKind::Bytes, json, ctx),
            Schema::String => Self::read_string(json, ctx),
            Schema::Record(record) => self.read_record(record, json, ctx),
            Schema::Enum(e) => Self::read_enum(e, json, ctx),
            Schema::Array(items) => self.read_array(items, json, ctx),
            Schema::Map(values) => self.read_map(values, json, ctx),
            Schema::Union(union) => self.read_union(union, json, ctx),
            Schema::Fixed(fixed) => Self::read_fixed(fixed, json, ctx),
            Schema::Decimal(decimal) => self.read_decimal(decimal, json, ctx),
            Schema::Uuid => match json {
                JsonValue::String(s) => uuid::Uuid::parse_str(s.trim())
                    .map(Value::Uuid)
                    .map_err(|_| ctx.type_mismatch("uuid", format!("string '{s}'"))),
                other => Err(ctx.type_mismatch("uuid", json_kind_name(other))),
            },
            Schema::Duration => {
                let bytes = Self::latin1(json, "duration", ctx)?;
                let raw: [u8; DURATION_SIZE] = bytes.try_into().map_err(|b: Vec<u8>| {
                    ctx.type_mismatch("duration (12 bytes)", format!("{} bytes", b.len()))
                })?;
                Ok(Value::Duration(Duration::from(raw)))
            }
            Schema::Ref { .. } => {
                let target = self.names.require(schema, ctx)?;
                self.read(target, json, ctx)
            }
            other => Err(ctx.unsupported(format!(
                "{:?} schemas are not supported",
                apache_avro::schema::SchemaKind::from(other)
            ))),
        }
    }

    // ── Scalars ──────────────────────────────────────────────

    fn scalar(kind: ScalarKind, json: &JsonValue, ctx: &ConversionContext<'_>) -> ConversionResult<Value> {
        coerce_scalar(kind, json).map_err(|e| ctx.scalar_error(e))
    }

    fn read_string(json: &JsonValue, ctx: &ConversionContext<'_>) -> ConversionResult<Value> {
        match json {
            JsonValue::String(s) => Ok(Value::String(s.clone())),
            JsonValue::Null => Err(ctx.type_mismatch("string", "null")),
            other if ctx.config().stringify_non_string => {
                Ok(Value::String(render_json_text(other)))
            }
            other => Err(ctx.type_mismatch("string", json_kind_name(other))),
        }
    }

    fn latin1(json: &JsonValue, expected: &str, ctx: &ConversionContext<'_>) -> ConversionResult<Vec<u8>> {
        match json {
            JsonValue::String(s) => latin1_bytes(s).ok_or_else(|| {
                ctx.type_mismatch(expected, "string with characters outside Latin-1")
            }),
            other => Err(ctx.type_mismatch(expected, json_kind_name(other))),
        }
    }

    fn read_fixed(fixed: &FixedSchema, json: &JsonValue, ctx: &ConversionContext<'_>) -> ConversionResult<Value> {
        let expected = format!("fixed({})", fixed.size);
        let bytes = Self::latin1(json, &expected, ctx)?;
        if bytes.len() != fixed.size {
            return Err(ctx.type_mismatch(expected, format!("{} bytes", bytes.len())));
        }
        Ok(Value::Fixed(fixed.size, bytes))
    }

    fn read_enum(e: &EnumSchema, json: &JsonValue, ctx: &ConversionContext<'_>) -> ConversionResult<Value> {
        let JsonValue::String(symbol) = json else {
            return Err(ctx.type_mismatch(format!("enum {}", e.name.name), json_kind_name(json)));
        };
        let index = e
            .symbols
            .iter()
            .position(|s| s == symbol)
            .ok_or_else(|| ctx.invalid_symbol(symbol))?;
        let index = u32::try_from(index).map_err(|_| ctx.unsupported("enum has too many symbols"))?;
        Ok(Value::Enum(index, symbol.clone()))
    }

    fn read_decimal(
        &self,
        decimal: &DecimalSchema,
        json: &JsonValue,
        ctx: &ConversionContext<'_>,
    ) -> ConversionResult<Value> {
        let text = match json {
            JsonValue::Number(n) => n.to_string(),
            JsonValue::String(s) => s.clone(),
            other => return Err(ctx.type_mismatch("decimal", json_kind_name(other))),
        };
        let unscaled = unscaled_from_text(&text, decimal.precision, decimal.scale)
            .map_err(|e| ctx.scalar_error(e))?;
        let bytes = to_twos_complement(&unscaled);
        if let Schema::Fixed(fixed) = self.names.require(&decimal.inner, ctx)? {
            if bytes.len() > fixed.size {
                return Err(ctx.scalar_error(ScalarError::Overflow {
                    value: text,
                    target: format!("fixed({})", fixed.size),
                }));
            }
        }
        Ok(Value::Decimal(Decimal::from(bytes)))
    }

    fn read_temporal(
        temporal: Temporal,
        json: &JsonValue,
        ctx: &ConversionContext<'_>,
    ) -> ConversionResult<Value> {
        let logical_type = temporal.logical_type();
        let encoded = match json {
            // Anything that is not an integer literal is date/time text.
            JsonValue::String(s) if !is_integer_literal(s.trim()) => temporal
                .decode(s)
                .ok_or_else(|| ctx.temporal_failure(logical_type, s))?,
            JsonValue::String(_) | JsonValue::Number(_) => {
                extract_i64(json, logical_type).map_err(|e| ctx.scalar_error(e))?
            }
            other => return Err(ctx.type_mismatch(logical_type, json_kind_name(other))),
        };
        temporal.to_value(encoded).ok_or_else(|| {
            ctx.scalar_error(ScalarError::Overflow {
                value: encoded.to_string(),
                target: logical_type.into(),
            })
        })
    }

    // ── Containers ───────────────────────────────────────────

    fn read_array(
        &self,
        items: &Schema,
        json: &JsonValue,
        ctx: &mut ConversionContext<'_>,
    ) -> ConversionResult<Value> {
        let JsonValue::Array(elements) = json else {
            return Err(ctx.type_mismatch("array", json_kind_name(json)));
        };
        let mut out = Vec::with_capacity(elements.len());
        for (i, element) in elements.iter().enumerate() {
            out.push(ctx.scoped(PathSegment::Index(i), |ctx| self.read(items, element, ctx))?);
        }
        Ok(Value::Array(out))
    }

    fn read_map(
        &self,
        values: &Schema,
        json: &JsonValue,
        ctx: &mut ConversionContext<'_>,
    ) -> ConversionResult<Value> {
        let JsonValue::Object(entries) = json else {
            return Err(ctx.type_mismatch("map", json_kind_name(json)));
        };
        let mut out = HashMap::with_capacity(entries.len());
        for (key, value) in entries {
            let converted =
                ctx.scoped(PathSegment::Key(key.clone()), |ctx| self.read(values, value, ctx))?;
            out.insert(key.clone(), converted);
        }
        Ok(Value::Map(out))
    }

    // ── Unions ───────────────────────────────────────────────

    fn read_union(
        &self,
        union: &UnionSchema,
        json: &JsonValue,
        ctx: &mut ConversionContext<'_>,
    ) -> ConversionResult<Value> {
        let variants = union.variants();
        let index = self
            .select_branch(variants, json, ctx.config())
            .ok_or_else(|| ctx.no_union_branch(json_kind_name(json)))?;
        let value = self.read(&variants[index], json, ctx)?;
        let tag = u32::try_from(index).map_err(|_| ctx.unsupported("union has too many branches"))?;
        Ok(Value::Union(tag, Box::new(value)))
    }

    /// Earliest exact-kind member, else earliest member the value can be
    /// coerced into. JSON null only ever selects the null member.
    ///
    /// Integral numbers first look for an integer member wide enough to
    /// hold them, so `["int", "long"]` takes 3000000000 as a long. Only
    /// when none fits does the earliest integer member win (and overflow).
    fn select_branch(&self, variants: &[Schema], json: &JsonValue, config: &ConverterConfig) -> Option<usize> {
        if json.is_null() {
            return variants
                .iter()
                .position(|v| matches!(self.names.resolve(v), Some(Schema::Null)));
        }
        variants
            .iter()
            .position(|v| self.exact_match(v, json, true))
            .or_else(|| variants.iter().position(|v| self.exact_match(v, json, false)))
            .or_else(|| variants.iter().position(|v| self.coercible(v, json, config)))
    }

    fn exact_match(&self, schema: &Schema, json: &JsonValue, in_range: bool) -> bool {
        let Some(schema) = self.names.resolve(schema) else {
            return false;
        };
        let temporal = Temporal::of(schema).is_some();
        match json {
            JsonValue::Null => matches!(schema, Schema::Null),
            JsonValue::Bool(_) => matches!(schema, Schema::Boolean),
            JsonValue::Number(n) => {
                let integral = n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f.fract() == 0.0);
                match schema {
                    Schema::Float | Schema::Double | Schema::Decimal(_) => true,
                    Schema::Int => {
                        integral
                            && (!in_range || fits_integral(n, i64::from(i32::MIN), i64::from(i32::MAX)))
                    }
                    Schema::Long => integral && (!in_range || fits_integral(n, i64::MIN, i64::MAX)),
                    _ => temporal && integral,
                }
            }
            JsonValue::String(s) => match schema {
                Schema::String
                | Schema::Bytes
                | Schema::Fixed(_)
                | Schema::Uuid
                | Schema::Decimal(_)
                | Schema::Duration => true,
                Schema::Enum(e) => e.symbols.iter().any(|sym| sym == s),
                _ => temporal,
            },
            JsonValue::Array(_) => matches!(schema, Schema::Array(_)),
            JsonValue::Object(_) => matches!(schema, Schema::Record(_) | Schema::Map(_)),
        }
    }

    fn coercible(&self, schema: &Schema, json: &JsonValue, config: &ConverterConfig) -> bool {
        match (self.names.resolve(schema), json) {
            (Some(Schema::Int | Schema::Long), JsonValue::String(s)) => is_integer_literal(s.trim()),
            (Some(Schema::Float | Schema::Double), JsonValue::String(s)) => {
                parse_special_float(s).is_some() || s.trim().parse::<f64>().is_ok()
            }
            (Some(Schema::String), JsonValue::Null) => false,
            (Some(Schema::String), _) => config.stringify_non_string,
            _ => false,
        }
    }

    // ── Records ──────────────────────────────────────────────

    fn read_record(
        &self,
        record: &RecordSchema,
        json: &JsonValue,
        ctx: &mut ConversionContext<'_>,
    ) -> ConversionResult<Value> {
        let JsonValue::Object(object) = json else {
            return Err(ctx.type_mismatch(format!("record {}", record.name.name), json_kind_name(json)));
        };
        let config = ctx.config();
        let catch_all = config.additional_properties_field.as_str();
        let has_catch_all = record.lookup.contains_key(catch_all);

        let mut matched: HashMap<&str, &JsonValue> = HashMap::with_capacity(record.fields.len());
        let mut extras = Map::new();
        let mut leftovers = Vec::new();

        for (key, value) in object {
            if has_catch_all && key == catch_all {
                match value {
                    JsonValue::Object(carried) => extras.extend(carried.clone()),
                    JsonValue::Null => {}
                    _ => leftovers.push((key, value)),
                }
            } else if record.lookup.contains_key(key.as_str()) {
                matched.insert(key.as_str(), value);
            } else {
                leftovers.push((key, value));
            }
        }

        // Keys that only match once illegal characters are replaced.
        let mut unmatched = Map::new();
        for (key, value) in leftovers {
            let sanitized = sanitize_field_name(key, &config.field_name_replacement);
            match record.lookup.get_key_value(sanitized.as_str()) {
                Some((name, _)) if name != catch_all && !matched.contains_key(name.as_str()) => {
                    matched.insert(name.as_str(), value);
                }
                _ => {
                    unmatched.insert(key.clone(), value.clone());
                }
            }
        }

        if !unmatched.is_empty() {
            match config.unknown_fields {
                UnknownFieldStrategy::Reject => {
                    if let Some(field) = unmatched.keys().next() {
                        return Err(ConversionError::UnknownField {
                            path: ctx.path(),
                            field: field.clone(),
                        });
                    }
                }
                UnknownFieldStrategy::Collect if has_catch_all => {}
                _ => {
                    debug!(
                        path = %ctx.path(),
                        dropped = unmatched.len(),
                        "dropping JSON fields not declared by record {}",
                        record.name.name
                    );
                    ctx.unknown_fields_dropped += u64::try_from(unmatched.len()).unwrap_or(u64::MAX);
                    unmatched.clear();
                }
            }
        }
        extras.extend(unmatched);

        let mut fields = Vec::with_capacity(record.fields.len());
        for field in &record.fields {
            let value = ctx.scoped(PathSegment::Field(field.name.clone()), |ctx| {
                if has_catch_all && field.name == catch_all {
                    return self.read_additional(&field.schema, &extras, ctx);
                }
                match matched.get(field.name.as_str()) {
                    Some(value) if !value.is_null() => self.read_field(field, value, ctx),
                    _ => self.absent_field(field, ctx),
                }
            })?;
            fields.push((field.name.clone(), value));
        }
        Ok(Value::Record(fields))
    }

    fn read_field(
        &self,
        field: &RecordField,
        json: &JsonValue,
        ctx: &mut ConversionContext<'_>,
    ) -> ConversionResult<Value> {
        match self.read(&field.schema, json, ctx) {
            Err(err @ ConversionError::TemporalDecodeFailure { .. })
                if ctx.config().temporal_failure == TemporalFailureStrategy::Omit =>
            {
                let value = self.absent_field(field, ctx).map_err(|_| err)?;
                trace!(path = %ctx.path(), "omitting undecodable date/time value");
                ctx.temporal_values_omitted += 1;
                Ok(value)
            }
            other => other,
        }
    }

    /// Default, then null for nullable fields, otherwise an error.
    fn absent_field(&self, field: &RecordField, ctx: &mut ConversionContext<'_>) -> ConversionResult<Value> {
        if let Some(default) = &field.default {
            return self.read_default(&field.schema, default, ctx);
        }
        self.null_branch(&field.schema)
            .ok_or_else(|| ctx.missing_field())
    }

    /// Union defaults always belong to the first member.
    fn read_default(
        &self,
        schema: &Schema,
        default: &JsonValue,
        ctx: &mut ConversionContext<'_>,
    ) -> ConversionResult<Value> {
        match self.names.require(schema, ctx)? {
            Schema::Union(union) => {
                let first = union
                    .variants()
                    .first()
                    .ok_or_else(|| ctx.unsupported("empty union"))?;
                let value = self.read(first, default, ctx)?;
                Ok(Value::Union(0, Box::new(value)))
            }
            other => self.read(other, default, ctx),
        }
    }

    fn null_branch(&self, schema: &Schema) -> Option<Value> {
        match self.names.resolve(schema)? {
            Schema::Null => Some(Value::Null),
            Schema::Union(union) => {
                let index = union
                    .variants()
                    .iter()
                    .position(|v| matches!(v, Schema::Null))?;
                Some(Value::Union(u32::try_from(index).ok()?, Box::new(Value::Null)))
            }
            _ => None,
        }
    }

    fn read_additional(
        &self,
        schema: &Schema,
        extras: &Map<String, JsonValue>,
        ctx: &mut ConversionContext<'_>,
    ) -> ConversionResult<Value> {
        if extras.is_empty() {
            if let Some(null) = self.null_branch(schema) {
                return Ok(null);
            }
        }
        let collected = JsonValue::Object(collect_as_json(extras));
        self.read(schema, &collected, ctx)
    }
}

/// Whether an integral JSON number lies within `[min, max]`.
#[allow(clippy::cast_precision_loss)]
fn fits_integral(n: &serde_json::Number, min: i64, max: i64) -> bool {
    if let Some(v) = n.as_i64() {
        return (min..=max).contains(&v);
    }
    if n.is_u64() {
        return false;
    }
    n.as_f64().is_some_and(|f| f >= min as f64 && f <= max as f64)
}
