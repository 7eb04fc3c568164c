//! Model validation: names, referential integrity and inheritance shape.

use crate::catalog::{ModelConfig, RecordTypeConfig};
use crate::error::CatalogError;
use crate::value::FieldType;
use regex::Regex;
use std::collections::{HashMap, HashSet};

pub fn validate(config: &ModelConfig) -> Result<(), CatalogError> {
    // PostgreSQL rejects control characters in identifiers even when quoted.
    let identifier = Regex::new(r"^[^\x00-\x1F]*\S[^\x00-\x1F]*$")
        .map_err(|e| CatalogError::Validation(e.to_string()))?;
    let check_ident = |kind: &'static str, s: &str| -> Result<(), CatalogError> {
        if identifier.is_match(s) {
            Ok(())
        } else {
            Err(CatalogError::Validation(format!("invalid {} name: {:?}", kind, s)))
        }
    };

    check_ident("schema", &config.default_schema)?;

    let mut names = HashSet::new();
    let mut display_names = HashSet::new();
    for rt in &config.record_types {
        check_ident("record type", &rt.name)?;
        check_ident("table", &rt.table)?;
        if let Some(schema) = &rt.schema {
            check_ident("schema", schema)?;
        }
        if !names.insert(rt.name.to_lowercase()) {
            return Err(CatalogError::DuplicateName {
                kind: "record type",
                name: rt.name.clone(),
            });
        }
        let display = rt.display_name.as_deref().unwrap_or(&rt.name).to_lowercase();
        if !display_names.insert(display) {
            return Err(CatalogError::DuplicateName {
                kind: "display name",
                name: rt.display_name.clone().unwrap_or_else(|| rt.name.clone()),
            });
        }
    }

    let by_name: HashMap<&str, &RecordTypeConfig> =
        config.record_types.iter().map(|rt| (rt.name.as_str(), rt)).collect();

    for rt in &config.record_types {
        if let Some(parent) = &rt.parent {
            if !by_name.contains_key(parent.as_str()) {
                return Err(CatalogError::MissingReference {
                    kind: "parent record type",
                    id: parent.clone(),
                });
            }
        }
    }

    for rt in &config.record_types {
        let mut seen = HashSet::new();
        let mut current = rt;
        while let Some(parent) = current.parent.as_deref() {
            if !seen.insert(current.name.as_str()) || parent == rt.name {
                return Err(CatalogError::InheritanceCycle(rt.name.clone()));
            }
            current = by_name[parent];
        }
    }

    for rt in &config.record_types {
        validate_discriminator(config, rt, &by_name)?;

        let mut field_names: HashSet<&str> = HashSet::new();
        let mut lineage = vec![rt];
        let mut current = rt;
        while let Some(parent) = current.parent.as_deref() {
            current = by_name[parent];
            lineage.push(current);
        }
        for owner in lineage.iter().rev() {
            for f in &owner.fields {
                if owner.name == rt.name {
                    validate_field(rt, f, &by_name, &check_ident)?;
                }
                if !field_names.insert(f.name.as_str()) {
                    return Err(CatalogError::DuplicateName {
                        kind: "field",
                        name: format!("{}.{}", rt.name, f.name),
                    });
                }
            }
        }
    }

    validate_discriminated_tables(config)?;

    Ok(())
}

/// Once any record type on a table declares a discriminator, every record type stored there must, so that
/// filtering by discriminator value selects the same rows as filtering by concrete type.
fn validate_discriminated_tables(config: &ModelConfig) -> Result<(), CatalogError> {
    for rt in &config.record_types {
        if rt.discriminator.is_some() {
            continue;
        }
        let discriminated = config
            .record_types
            .iter()
            .find(|other| other.discriminator.is_some() && same_table(config, rt, other));
        if let Some(other) = discriminated {
            return Err(CatalogError::Validation(format!(
                "{}: table {} has discriminator column '{}' (declared by {}) but {} declares no value",
                rt.name,
                rt.table,
                other.discriminator.as_ref().map(|d| d.column.as_str()).unwrap_or_default(),
                other.name,
                rt.name
            )));
        }
    }
    Ok(())
}

fn validate_field(
    rt: &RecordTypeConfig,
    f: &crate::catalog::FieldConfig,
    by_name: &HashMap<&str, &RecordTypeConfig>,
    check_ident: &dyn Fn(&'static str, &str) -> Result<(), CatalogError>,
) -> Result<(), CatalogError> {
    check_ident("field", &f.name)?;
    if let Some(column) = &f.column {
        check_ident("column", column)?;
    }
    match (&f.type_, &f.navigation) {
        (Some(ty), None) => {
            if FieldType::from_type_name(ty).is_none() {
                return Err(CatalogError::Validation(format!(
                    "{}.{}: unsupported scalar type '{}'",
                    rt.name, f.name, ty
                )));
            }
        }
        (None, Some(nav)) => {
            if !by_name.contains_key(nav.target.as_str()) {
                return Err(CatalogError::MissingReference {
                    kind: "navigation target",
                    id: nav.target.clone(),
                });
            }
        }
        _ => {
            return Err(CatalogError::Validation(format!(
                "{}.{}: field must declare exactly one of type or navigation",
                rt.name, f.name
            )));
        }
    }
    Ok(())
}

/// Discriminators only make sense for a type sharing its parent's table, and the whole hierarchy must use one column.
fn validate_discriminator(
    config: &ModelConfig,
    rt: &RecordTypeConfig,
    by_name: &HashMap<&str, &RecordTypeConfig>,
) -> Result<(), CatalogError> {
    let Some(disc) = &rt.discriminator else {
        return Ok(());
    };
    let Some(parent) = rt.parent.as_deref().map(|p| by_name[p]) else {
        return Ok(());
    };
    if !same_table(config, rt, parent) {
        return Err(CatalogError::Validation(format!(
            "{}: discriminator declared but table differs from parent {}",
            rt.name, parent.name
        )));
    }
    if let Some(parent_disc) = &parent.discriminator {
        if parent_disc.column != disc.column {
            return Err(CatalogError::Validation(format!(
                "{}: discriminator column '{}' differs from parent's '{}'",
                rt.name, disc.column, parent_disc.column
            )));
        }
    }
    Ok(())
}

fn same_table(config: &ModelConfig, a: &RecordTypeConfig, b: &RecordTypeConfig) -> bool {
    let schema_a = a.schema.as_deref().unwrap_or(&config.default_schema);
    let schema_b = b.schema.as_deref().unwrap_or(&config.default_schema);
    crate::case::eq_ignore_case(schema_a, schema_b) && crate::case::eq_ignore_case(&a.table, &b.table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{DiscriminatorConfig, DiscriminatorValue, FieldConfig};

    fn record(name: &str, table: &str, parent: Option<&str>, fields: Vec<FieldConfig>) -> RecordTypeConfig {
        RecordTypeConfig {
            name: name.into(),
            display_name: None,
            table: table.into(),
            schema: None,
            parent: parent.map(Into::into),
            discriminator: None,
            fields,
        }
    }

    fn model(record_types: Vec<RecordTypeConfig>) -> ModelConfig {
        ModelConfig {
            record_types,
            ..ModelConfig::default()
        }
    }

    #[test]
    fn accepts_hierarchy_with_navigation() {
        let config = model(vec![
            record("Customer", "Customers", None, vec![
                FieldConfig::scalar("LastName", "text"),
                FieldConfig::navigation("Orders", "Order", true),
            ]),
            record("Order", "Orders", None, vec![FieldConfig::scalar("Total", "numeric")]),
            record("Vip", "Customers", Some("Customer"), vec![FieldConfig::scalar("Tier", "int")]),
        ]);
        validate(&config).unwrap();
    }

    #[test]
    fn rejects_duplicate_type_names_case_insensitively() {
        let config = model(vec![record("Customer", "a", None, vec![]), record("customer", "b", None, vec![])]);
        assert!(matches!(validate(&config), Err(CatalogError::DuplicateName { kind: "record type", .. })));
    }

    #[test]
    fn rejects_unknown_parent_and_cycles() {
        let config = model(vec![record("A", "t", Some("Missing"), vec![])]);
        assert!(matches!(validate(&config), Err(CatalogError::MissingReference { .. })));

        let config = model(vec![record("A", "t", Some("B"), vec![]), record("B", "t", Some("A"), vec![])]);
        assert!(matches!(validate(&config), Err(CatalogError::InheritanceCycle(_))));
    }

    #[test]
    fn rejects_field_redeclared_from_parent() {
        let config = model(vec![
            record("Base", "t", None, vec![FieldConfig::scalar("Name", "text")]),
            record("Derived", "t", Some("Base"), vec![FieldConfig::scalar("Name", "text")]),
        ]);
        assert!(matches!(validate(&config), Err(CatalogError::DuplicateName { kind: "field", .. })));
    }

    #[test]
    fn rejects_bad_field_shapes() {
        let mut both = FieldConfig::scalar("X", "text");
        both.navigation = FieldConfig::navigation("X", "A", false).navigation;
        let config = model(vec![record("A", "t", None, vec![both])]);
        assert!(matches!(validate(&config), Err(CatalogError::Validation(_))));

        let config = model(vec![record("A", "t", None, vec![FieldConfig::scalar("J", "jsonb")])]);
        assert!(matches!(validate(&config), Err(CatalogError::Validation(_))));

        let config = model(vec![record("A", "t", None, vec![FieldConfig::navigation("B", "Nope", false)])]);
        assert!(matches!(validate(&config), Err(CatalogError::MissingReference { .. })));
    }

    #[test]
    fn rejects_discriminator_on_separate_table() {
        let mut derived = record("Derived", "other", Some("Base"), vec![]);
        derived.discriminator = Some(DiscriminatorConfig {
            column: "kind".into(),
            value: DiscriminatorValue::Text("derived".into()),
        });
        let config = model(vec![record("Base", "t", None, vec![]), derived]);
        assert!(matches!(validate(&config), Err(CatalogError::Validation(_))));
    }

    #[test]
    fn rejects_type_without_discriminator_value_on_discriminated_table() {
        let disc = |value: &str| {
            Some(DiscriminatorConfig {
                column: "kind".into(),
                value: DiscriminatorValue::Text(value.into()),
            })
        };
        let mut person = record("Person", "people", None, vec![FieldConfig::scalar("Name", "text")]);
        person.discriminator = disc("P");
        let employee = record("Employee", "people", Some("Person"), vec![]);
        let mut manager = record("Manager", "people", Some("Employee"), vec![]);
        manager.discriminator = disc("M");

        let config = model(vec![person.clone(), employee, manager.clone()]);
        match validate(&config) {
            Err(CatalogError::Validation(msg)) => assert!(msg.starts_with("Employee:"), "{}", msg),
            other => panic!("expected validation error, got {:?}", other),
        }

        let mut employee = record("Employee", "people", Some("Person"), vec![]);
        employee.discriminator = disc("E");
        validate(&model(vec![person, employee, manager])).unwrap();
    }

    #[test]
    fn rejects_blank_identifiers() {
        let config = model(vec![record("A", "  ", None, vec![])]);
        assert!(matches!(validate(&config), Err(CatalogError::Validation(_))));
    }
}
