//! Transpiler test suites.

mod predicate;

use crate::ast::{Record, Value};
use crate::schema::{EntityDescriptor, EntityMeta, Registry};

/// `Article { Id (key by convention), Name, Description }`
pub(crate) fn article() -> EntityMeta {
    let desc = EntityDescriptor::new("Article")
        .property("Id")
        .property("Name")
        .property("Description");
    resolve(&desc)
}

pub(crate) fn resolve(desc: &EntityDescriptor) -> EntityMeta {
    Registry::new().resolve(desc).unwrap().as_ref().clone()
}

pub(crate) fn article_record(id: i64, name: &str, description: &str) -> Record {
    let mut r = Record::new();
    r.insert("Id".into(), Value::Int(id));
    r.insert("Name".into(), Value::from(name));
    r.insert("Description".into(), Value::from(description));
    r
}
