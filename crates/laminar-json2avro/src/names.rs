//! Named-type table for resolving `Schema::Ref` nodes.
//!
//! Avro lets a record, enum or fixed type be declared once and referred
//! to by name afterwards (including from inside itself, for recursive
//! records). The parsed schema keeps such uses as `Schema::Ref`; this
//! table maps every declared name back to its definition.

use std::collections::HashMap;

use apache_avro::schema::Name;
use apache_avro::Schema;

use crate::context::ConversionContext;
use crate::error::{ConversionError, ConversionResult};

/// Owned copies of every named type declared in a schema tree.
#[derive(Debug, Clone, Default)]
pub struct NamedSchemas {
    by_name: HashMap<Name, Schema>,
}

impl NamedSchemas {
    /// Walks `root` and records every named definition it contains.
    ///
    /// The first definition of a name wins.
    #[must_use]
    pub fn from_schema(root: &Schema) -> Self {
        let mut table = Self::default();
        table.collect(root);
        table
    }

    fn collect(&mut self, schema: &Schema) {
        match schema {
            Schema::Record(record) => {
                if self.by_name.contains_key(&record.name) {
                    return;
                }
                self.by_name.insert(record.name.clone(), schema.clone());
                for field in &record.fields {
                    self.collect(&field.schema);
                }
            }
            Schema::Enum(e) => {
                self.by_name
                    .entry(e.name.clone())
                    .or_insert_with(|| schema.clone());
            }
            Schema::Fixed(f) => {
                self.by_name
                    .entry(f.name.clone())
                    .or_insert_with(|| schema.clone());
            }
            Schema::Array(inner) | Schema::Map(inner) => self.collect(inner),
            Schema::Union(union) => {
                for variant in union.variants() {
                    self.collect(variant);
                }
            }
            Schema::Decimal(decimal) => self.collect(&decimal.inner),
            _ => {}
        }
    }

    /// Looks up a definition by full name, falling back to the unqualified
    /// name when exactly one definition carries it.
    #[must_use]
    pub fn get(&self, name: &Name) -> Option<&Schema> {
        if let Some(schema) = self.by_name.get(name) {
            return Some(schema);
        }
        let mut candidates = self.by_name.iter().filter(|(n, _)| n.name == name.name);
        match (candidates.next(), candidates.next()) {
            (Some((_, schema)), None) => Some(schema),
            _ => None,
        }
    }

    /// Follows a `Ref` to its definition; other nodes are returned as is.
    #[must_use]
    pub fn resolve<'s>(&'s self, schema: &'s Schema) -> Option<&'s Schema> {
        match schema {
            Schema::Ref { name } => self.get(name),
            other => Some(other),
        }
    }

    /// Like [`resolve`](Self::resolve), failing with
    /// [`ConversionError::UnresolvedReference`] at the current path.
    pub(crate) fn require<'s>(
        &'s self,
        schema: &'s Schema,
        ctx: &ConversionContext<'_>,
    ) -> ConversionResult<&'s Schema> {
        match schema {
            Schema::Ref { name } => {
                self.get(name)
                    .ok_or_else(|| ConversionError::UnresolvedReference {
                        path: ctx.path(),
                        name: name.fullname(None),
                    })
            }
            other => Ok(other),
        }
    }

    /// Number of named definitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// Returns `true` if the schema declares no named types.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}
