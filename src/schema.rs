//! Entity metadata: descriptors, alias maps and the resolving registry.
//!
//! An [`EntityDescriptor`] lists the properties of one record type and which
//! of them are keys or computed. The [`Registry`] turns a descriptor into an
//! [`EntityMeta`] with table and column names resolved, and memoizes it.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::ast::{FromValue, Record, Value};
use crate::error::{OrmError, OrmResult};

/// One mapped property of an entity.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PropertyDescriptor {
    pub name: String,
    /// Column name override; otherwise derived through [`NameCase`].
    #[serde(default)]
    pub column: Option<String>,
    /// Database-generated key.
    #[serde(default)]
    pub key: bool,
    /// Caller-supplied key.
    #[serde(default)]
    pub explicit_key: bool,
    /// Read-only; excluded from INSERT and UPDATE.
    #[serde(default)]
    pub computed: bool,
}

/// Static description of a record type.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EntityDescriptor {
    pub name: String,
    #[serde(default)]
    pub table: Option<String>,
    #[serde(default, rename = "property")]
    pub properties: Vec<PropertyDescriptor>,
}

impl EntityDescriptor {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn table(mut self, table: &str) -> Self {
        self.table = Some(table.to_string());
        self
    }

    fn push(mut self, name: &str, f: impl FnOnce(&mut PropertyDescriptor)) -> Self {
        let mut prop = PropertyDescriptor {
            name: name.to_string(),
            ..Default::default()
        };
        f(&mut prop);
        self.properties.push(prop);
        self
    }

    /// A plain property.
    pub fn property(self, name: &str) -> Self {
        self.push(name, |_| {})
    }

    /// A database-generated key.
    pub fn key(self, name: &str) -> Self {
        self.push(name, |p| p.key = true)
    }

    /// A caller-supplied key.
    pub fn explicit_key(self, name: &str) -> Self {
        self.push(name, |p| p.explicit_key = true)
    }

    pub fn computed(self, name: &str) -> Self {
        self.push(name, |p| p.computed = true)
    }

    /// Override the column of an already-declared property.
    pub fn column(mut self, property: &str, column: &str) -> Self {
        if let Some(p) = self.properties.iter_mut().find(|p| p.name == property) {
            p.column = Some(column.to_string());
        }
        self
    }
}

#[derive(Debug, Default, Deserialize)]
struct SchemaFile {
    #[serde(default, rename = "entity")]
    entities: Vec<EntityDescriptor>,
}

/// Load `[[entity]]` tables from a TOML schema file.
pub fn load_schema(path: &Path) -> OrmResult<Vec<EntityDescriptor>> {
    let text = std::fs::read_to_string(path)?;
    parse_schema(&text)
}

/// Parse `[[entity]]` tables from TOML text.
pub fn parse_schema(text: &str) -> OrmResult<Vec<EntityDescriptor>> {
    let file: SchemaFile = toml::from_str(text).map_err(|e| OrmError::Config(e.to_string()))?;
    Ok(file.entities)
}

/// How default table and column names are derived from entity and
/// property names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NameCase {
    #[default]
    Upper,
    Lower,
    Preserve,
}

impl NameCase {
    pub fn apply(&self, name: &str) -> String {
        match self {
            NameCase::Upper => name.to_uppercase(),
            NameCase::Lower => name.to_lowercase(),
            NameCase::Preserve => name.to_string(),
        }
    }
}

/// Table and column aliases for one entity. Takes precedence over both the
/// descriptor and the name case policy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasMap {
    pub table: Option<String>,
    pub columns: HashMap<String, String>,
}

impl AliasMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(mut self, table: &str) -> Self {
        self.table = Some(table.to_string());
        self
    }

    pub fn column(mut self, property: &str, column: &str) -> Self {
        self.columns.insert(property.to_string(), column.to_string());
        self
    }
}

/// A property after name resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedProperty {
    pub name: String,
    pub column: String,
    /// Database-generated key, declared or by the `id` convention.
    pub key: bool,
    pub explicit_key: bool,
    pub computed: bool,
}

impl ResolvedProperty {
    pub fn is_any_key(&self) -> bool {
        self.key || self.explicit_key
    }
}

/// Key properties of an entity, split by who supplies the value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySet {
    pub implicit: Vec<String>,
    pub explicit: Vec<String>,
}

/// Resolved metadata for one entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityMeta {
    name: String,
    table: String,
    properties: Vec<ResolvedProperty>,
}

impl EntityMeta {
    fn resolve(desc: &EntityDescriptor, alias: Option<&AliasMap>, case: NameCase) -> OrmResult<Self> {
        if desc.properties.is_empty() {
            return Err(OrmError::schema(format!("entity '{}' has no properties", desc.name)));
        }

        let mut seen = std::collections::HashSet::new();
        for p in &desc.properties {
            if !seen.insert(p.name.to_lowercase()) {
                return Err(OrmError::schema(format!(
                    "duplicate property '{}' on '{}'",
                    p.name, desc.name
                )));
            }
            if p.computed && (p.key || p.explicit_key) {
                return Err(OrmError::schema(format!(
                    "key property '{}' cannot be computed",
                    p.name
                )));
            }
            if p.key && p.explicit_key {
                return Err(OrmError::schema(format!(
                    "property '{}' cannot be both a generated and an explicit key",
                    p.name
                )));
            }
        }

        // Convention: without a declared key, a property named `id` is one.
        let conventional = if desc.properties.iter().any(|p| p.key) {
            None
        } else {
            desc.properties
                .iter()
                .find(|p| p.name.eq_ignore_ascii_case("id") && !p.explicit_key && !p.computed)
                .map(|p| p.name.clone())
        };

        let table = alias
            .and_then(|a| a.table.clone())
            .or_else(|| desc.table.clone())
            .unwrap_or_else(|| case.apply(&desc.name));

        let properties = desc
            .properties
            .iter()
            .map(|p| ResolvedProperty {
                name: p.name.clone(),
                column: alias
                    .and_then(|a| a.columns.get(&p.name).cloned())
                    .or_else(|| p.column.clone())
                    .unwrap_or_else(|| case.apply(&p.name)),
                key: p.key || conventional.as_deref() == Some(p.name.as_str()),
                explicit_key: p.explicit_key,
                computed: p.computed,
            })
            .collect();

        Ok(Self {
            name: desc.name.clone(),
            table,
            properties,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn properties(&self) -> &[ResolvedProperty] {
        &self.properties
    }

    /// Find a property by name; exact match first, then case-insensitive.
    pub fn property(&self, name: &str) -> Option<&ResolvedProperty> {
        self.properties
            .iter()
            .find(|p| p.name == name)
            .or_else(|| self.properties.iter().find(|p| p.name.eq_ignore_ascii_case(name)))
    }

    /// Column name of a property.
    pub fn column(&self, property: &str) -> OrmResult<&str> {
        self.property(property)
            .map(|p| p.column.as_str())
            .ok_or_else(|| {
                OrmError::schema(format!("'{}' has no property '{}'", self.name, property))
            })
    }

    /// Key properties; fails when the entity has none.
    pub fn keys(&self) -> OrmResult<KeySet> {
        let implicit: Vec<String> = self.properties.iter().filter(|p| p.key).map(|p| p.name.clone()).collect();
        let explicit: Vec<String> = self
            .properties
            .iter()
            .filter(|p| p.explicit_key)
            .map(|p| p.name.clone())
            .collect();
        if implicit.is_empty() && explicit.is_empty() {
            return Err(OrmError::schema("no key defined"));
        }
        Ok(KeySet { implicit, explicit })
    }

    /// All key properties in declaration order; fails when there are none.
    pub fn key_properties(&self) -> OrmResult<Vec<&ResolvedProperty>> {
        let keys: Vec<_> = self.properties.iter().filter(|p| p.is_any_key()).collect();
        if keys.is_empty() {
            return Err(OrmError::schema("no key defined"));
        }
        Ok(keys)
    }

    pub fn computed(&self) -> Vec<&str> {
        self.properties
            .iter()
            .filter(|p| p.computed)
            .map(|p| p.name.as_str())
            .collect()
    }

    /// Properties read by SELECT: everything but computed.
    pub fn select_properties(&self) -> Vec<&ResolvedProperty> {
        self.properties.iter().filter(|p| !p.computed).collect()
    }

    /// Properties written by INSERT: generated keys and computed excluded.
    pub fn insert_properties(&self) -> Vec<&ResolvedProperty> {
        self.properties.iter().filter(|p| !p.computed && !p.key).collect()
    }

    /// Properties written by UPDATE SET: keys and computed excluded.
    pub fn update_properties(&self) -> Vec<&ResolvedProperty> {
        self.properties
            .iter()
            .filter(|p| !p.computed && !p.is_any_key())
            .collect()
    }

    /// Re-key a fetched row (column names, any case) by property name.
    pub fn row_to_record(&self, columns: &Record) -> Record {
        self.select_properties()
            .into_iter()
            .map(|p| {
                let value = columns
                    .get(&p.column)
                    .or_else(|| {
                        columns
                            .iter()
                            .find(|(k, _)| k.eq_ignore_ascii_case(&p.column))
                            .map(|(_, v)| v)
                    })
                    .cloned()
                    .unwrap_or(Value::Null);
                (p.name.clone(), value)
            })
            .collect()
    }
}

/// Thread-safe memo of resolved entity metadata, keyed by entity name.
///
/// Population is insert-if-absent: concurrent resolvers of the same entity
/// may both compute it, but only the first result is kept and returned.
#[derive(Debug, Default)]
pub struct Registry {
    resolved: DashMap<String, Arc<EntityMeta>>,
    aliases: DashMap<String, AliasMap>,
    name_case: NameCase,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name_case(name_case: NameCase) -> Self {
        Self {
            name_case,
            ..Default::default()
        }
    }

    pub fn name_case(&self) -> NameCase {
        self.name_case
    }

    /// Register aliases for an entity. Drops any memoized metadata for it.
    pub fn register_alias(&self, entity: &str, alias: AliasMap) {
        self.aliases.insert(entity.to_string(), alias);
        self.resolved.remove(entity);
    }

    /// Resolve a descriptor, memoizing the result.
    pub fn resolve(&self, desc: &EntityDescriptor) -> OrmResult<Arc<EntityMeta>> {
        if let Some(meta) = self.resolved.get(&desc.name) {
            return Ok(Arc::clone(&meta));
        }
        let alias = self.aliases.get(&desc.name).map(|a| a.value().clone());
        let meta = Arc::new(EntityMeta::resolve(desc, alias.as_ref(), self.name_case)?);
        let entry = self.resolved.entry(desc.name.clone()).or_insert(meta);
        trace!(entity = %desc.name, table = %entry.table, "memoized entity metadata");
        Ok(Arc::clone(&entry))
    }

    /// Resolve the metadata of an [`Entity`] type.
    pub fn meta<T: Entity>(&self) -> OrmResult<Arc<EntityMeta>> {
        self.resolve(&T::descriptor())
    }

    /// Look up already-resolved metadata by entity name.
    pub fn get(&self, entity: &str) -> Option<Arc<EntityMeta>> {
        self.resolved.get(entity).map(|m| Arc::clone(&m))
    }

    pub fn len(&self) -> usize {
        self.resolved.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolved.is_empty()
    }
}

/// A record type mapped to a table.
///
/// Usually implemented through [`entity!`](crate::entity).
pub trait Entity: Sized {
    fn descriptor() -> EntityDescriptor;

    /// Field values keyed by property name.
    fn to_record(&self) -> Record;

    /// Build from field values keyed by property name.
    fn from_record(record: &Record) -> OrmResult<Self>;

    /// Assign one property, e.g. a generated key after insert.
    fn set_property(&mut self, name: &str, value: Value) -> OrmResult<()>;
}

/// Read one field out of a record; a missing field reads as NULL.
pub fn read_field<T: FromValue>(record: &Record, name: &str) -> OrmResult<T> {
    T::from_value(record.get(name).cloned().unwrap_or(Value::Null))
}

/// Computed properties are never selected; absent or NULL reads as `T::default()`.
pub fn read_computed<T: FromValue + Default>(record: &Record, name: &str) -> OrmResult<T> {
    match record.get(name) {
        None | Some(Value::Null) => Ok(T::default()),
        Some(value) => T::from_value(value.clone()),
    }
}

/// Declares an entity struct with an automatic [`Entity`] implementation.
///
/// Fields can be tagged `=> key`, `=> explicit_key` or `=> computed`.
/// Computed field types must implement `Default`; loaded entities get the
/// default because computed columns are not selected.
///
/// ```
/// minorm::entity! {
///     table = "ARTICLES",
///     #[derive(Debug, Clone, Default)]
///     pub struct Article {
///         pub id: i64 => key,
///         pub name: String,
///         pub views: i64 => computed,
///     }
/// }
///
/// use minorm::schema::Entity;
/// let desc = Article::descriptor();
/// assert_eq!(desc.table.as_deref(), Some("ARTICLES"));
/// assert!(desc.properties[0].key);
/// ```
#[macro_export]
macro_rules! entity {
    (@prop $d:ident, $field:ident) => {
        $d = $d.property(stringify!($field));
    };
    (@prop $d:ident, $field:ident, key) => {
        $d = $d.key(stringify!($field));
    };
    (@prop $d:ident, $field:ident, explicit_key) => {
        $d = $d.explicit_key(stringify!($field));
    };
    (@prop $d:ident, $field:ident, computed) => {
        $d = $d.computed(stringify!($field));
    };

    (@read $r:ident, $field:ident, computed) => {
        $crate::schema::read_computed($r, stringify!($field))?
    };
    (@read $r:ident, $field:ident $(, $flag:ident)?) => {
        $crate::schema::read_field($r, stringify!($field))?
    };

    (
        @table $table:expr,
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field_vis:vis $field:ident : $ty:ty $(=> $flag:ident)?
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $(
                $(#[$field_meta])*
                $field_vis $field : $ty
            ),*
        }

        impl $crate::schema::Entity for $name {
            fn descriptor() -> $crate::schema::EntityDescriptor {
                let mut desc = $crate::schema::EntityDescriptor::new(stringify!($name));
                let table: Option<&str> = $table;
                if let Some(table) = table {
                    desc = desc.table(table);
                }
                $( $crate::entity!(@prop desc, $field $(, $flag)?); )*
                desc
            }

            fn to_record(&self) -> $crate::ast::Record {
                let mut record = $crate::ast::Record::new();
                $(
                    record.insert(
                        stringify!($field).to_string(),
                        $crate::ast::Value::from(self.$field.clone()),
                    );
                )*
                record
            }

            fn from_record(record: &$crate::ast::Record) -> $crate::error::OrmResult<Self> {
                Ok(Self {
                    $( $field: $crate::entity!(@read record, $field $(, $flag)?), )*
                })
            }

            fn set_property(
                &mut self,
                name: &str,
                value: $crate::ast::Value,
            ) -> $crate::error::OrmResult<()> {
                $(
                    if name.eq_ignore_ascii_case(stringify!($field)) {
                        self.$field = <$ty as $crate::ast::FromValue>::from_value(value)?;
                        return Ok(());
                    }
                )*
                Err($crate::error::OrmError::schema(format!(
                    "{} has no property '{}'",
                    stringify!($name),
                    name
                )))
            }
        }
    };

    (table = $table:literal, $($rest:tt)*) => {
        $crate::entity!(@table Some($table), $($rest)*);
    };

    ($($rest:tt)*) => {
        $crate::entity!(@table None, $($rest)*);
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article() -> EntityDescriptor {
        EntityDescriptor::new("Article")
            .property("Id")
            .property("Name")
            .property("Description")
    }

    #[test]
    fn test_default_names_and_id_convention() {
        let registry = Registry::new();
        let meta = registry.resolve(&article()).unwrap();
        assert_eq!(meta.table(), "ARTICLE");
        assert_eq!(meta.column("Name").unwrap(), "NAME");
        let keys = meta.keys().unwrap();
        assert_eq!(keys.implicit, vec!["Id".to_string()]);
        assert!(keys.explicit.is_empty());
    }

    #[test]
    fn test_no_key_defined() {
        let desc = EntityDescriptor::new("Log").property("Line");
        let meta = Registry::new().resolve(&desc).unwrap();
        let err = meta.keys().unwrap_err();
        assert_eq!(err.to_string(), "Schema error: no key defined");
    }

    #[test]
    fn test_explicit_key_is_inserted() {
        let desc = EntityDescriptor::new("Code").explicit_key("Id").property("Label");
        let meta = Registry::new().resolve(&desc).unwrap();
        let keys = meta.keys().unwrap();
        assert!(keys.implicit.is_empty());
        assert_eq!(keys.explicit, vec!["Id".to_string()]);
        // Explicit keys are caller-supplied, so INSERT writes them.
        let names: Vec<_> = meta.insert_properties().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Id", "Label"]);
    }

    #[test]
    fn test_alias_precedence() {
        let registry = Registry::with_name_case(NameCase::Lower);
        registry.register_alias("Article", AliasMap::new().table("tbl_articles").column("Name", "art_name"));
        let desc = article().column("Description", "DESCR");
        let meta = registry.resolve(&desc).unwrap();
        assert_eq!(meta.table(), "tbl_articles");
        assert_eq!(meta.column("Name").unwrap(), "art_name");
        assert_eq!(meta.column("Description").unwrap(), "DESCR");
        assert_eq!(meta.column("id").unwrap(), "id");
    }

    #[test]
    fn test_invalid_descriptors() {
        let r = Registry::new();
        assert!(r.resolve(&EntityDescriptor::new("E").key("Id").computed("Id")).is_err());
        let mut both = EntityDescriptor::new("E").key("Id");
        both.properties[0].computed = true;
        assert!(matches!(r.resolve(&both), Err(OrmError::Schema(_))));
        assert!(r.resolve(&EntityDescriptor::new("Empty")).is_err());
    }

    #[test]
    fn test_memoization_is_idempotent() {
        let registry = Arc::new(Registry::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || registry.resolve(&article()).unwrap())
            })
            .collect();
        let metas: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(metas.iter().all(|m| Arc::ptr_eq(m, &metas[0])));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_parse_schema_toml() {
        let text = r#"
            [[entity]]
            name = "Article"

            [[entity.property]]
            name = "Id"
            key = true

            [[entity.property]]
            name = "Name"
            column = "TITLE"
        "#;
        let entities = parse_schema(text).unwrap();
        assert_eq!(entities.len(), 1);
        assert!(entities[0].properties[0].key);
        assert_eq!(entities[0].properties[1].column.as_deref(), Some("TITLE"));
    }

    crate::entity! {
        #[derive(Debug, Clone, Default, PartialEq)]
        struct Person {
            id: i64 => key,
            name: String,
            nick: Option<String>,
            age: i32 => computed,
        }
    }

    #[test]
    fn test_entity_macro() {
        let desc = Person::descriptor();
        assert_eq!(desc.name, "Person");
        assert_eq!(desc.table, None);
        assert!(desc.properties[0].key);
        assert!(desc.properties[3].computed);

        let p = Person {
            id: 3,
            name: "Ann".into(),
            nick: None,
            age: 40,
        };
        let record = p.to_record();
        assert_eq!(record["nick"], Value::Null);
        assert_eq!(Person::from_record(&record).unwrap(), p);

        let mut q = p.clone();
        q.set_property("ID", Value::Int(9)).unwrap();
        assert_eq!(q.id, 9);
        assert!(q.set_property("missing", Value::Null).is_err());
    }
}
