//! Resolve a record type from a table name (optionally schema-qualified) or an entity name.

use crate::case::eq_ignore_case;
use crate::catalog::{RecordType, SchemaCatalog};
use crate::error::ResolutionError;
use std::collections::HashSet;

impl SchemaCatalog {
    /// Record type mapped to `schema.table` (default schema when `schema` is None).
    /// Several matches resolve to the single inheritance root among them, or fail as ambiguous.
    pub fn resolve_by_table(&self, table: &str, schema: Option<&str>) -> Result<&RecordType, ResolutionError> {
        if table.trim().is_empty() {
            return Err(ResolutionError::InvalidArgument("table name"));
        }
        let schema = schema.unwrap_or(self.default_schema());
        let matches: Vec<&RecordType> = self
            .record_types()
            .iter()
            .filter(|rt| rt.mapping.matches(schema, table))
            .collect();
        if matches.is_empty() {
            return Err(ResolutionError::NotFound {
                name: format!("{}.{}", schema, table),
            });
        }
        self.single_root(schema, table, matches)
    }

    /// Table lookup first ("schema.table", then a bare table name in the default schema, then in any schema),
    /// then the record type's display name or simple name.
    pub fn resolve_by_name_or_table(&self, name: &str) -> Result<&RecordType, ResolutionError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ResolutionError::InvalidArgument("name"));
        }

        if let Some((schema, table)) = name.split_once('.') {
            let matches = self.table_matches(|rt| rt.mapping.matches(schema, table));
            if !matches.is_empty() {
                tracing::debug!(name = %name, "resolved by qualified table name");
                return self.single_root(schema, table, matches);
            }
        }

        match self.resolve_by_table(name, None) {
            Ok(rt) => {
                tracing::debug!(name = %name, record_type = %rt.name, "resolved by table name in default schema");
                return Ok(rt);
            }
            Err(ResolutionError::NotFound { .. }) => {}
            Err(e) => return Err(e),
        }

        let matches = self.table_matches(|rt| eq_ignore_case(&rt.mapping.table, name));
        if !matches.is_empty() {
            let schemas: Vec<&str> = matches.iter().fold(Vec::new(), |mut acc, rt| {
                if !acc.iter().any(|s| eq_ignore_case(s, &rt.mapping.schema)) {
                    acc.push(rt.mapping.schema.as_str());
                }
                acc
            });
            let schema = schemas.join(",");
            tracing::debug!(name = %name, schemas = %schema, "resolved by table name");
            return self.single_root(&schema, name, matches);
        }

        let by_entity = self
            .record_types()
            .iter()
            .find(|rt| eq_ignore_case(&rt.display_name, name) || eq_ignore_case(&rt.name, name));
        match by_entity {
            Some(rt) => {
                tracing::debug!(name = %name, record_type = %rt.name, "resolved by entity name");
                Ok(rt)
            }
            None => Err(ResolutionError::NotFound { name: name.to_string() }),
        }
    }

    /// With a schema: exact table lookup. Without: table or entity name.
    pub fn resolve_entity_type(&self, name: &str, schema: Option<&str>) -> Result<&RecordType, ResolutionError> {
        match schema {
            Some(schema) => self.resolve_by_table(name, Some(schema)),
            None => self.resolve_by_name_or_table(name),
        }
    }

    fn table_matches(&self, pred: impl Fn(&RecordType) -> bool) -> Vec<&RecordType> {
        self.record_types().iter().filter(|rt| pred(rt)).collect()
    }

    /// A root is a match none of whose transitive ancestors is also a match. Exactly one root is required;
    /// that root is then an ancestor of every other match.
    fn single_root<'a>(
        &'a self,
        schema: &str,
        table: &str,
        matches: Vec<&'a RecordType>,
    ) -> Result<&'a RecordType, ResolutionError> {
        if matches.len() == 1 {
            return Ok(matches[0]);
        }
        let names: HashSet<&str> = matches.iter().map(|rt| rt.name.as_str()).collect();
        let roots: Vec<&RecordType> = matches
            .iter()
            .copied()
            .filter(|rt| !self.ancestors(rt).any(|a| names.contains(a.name.as_str())))
            .collect();
        match roots.as_slice() {
            [root] => Ok(*root),
            _ => Err(ResolutionError::AmbiguousMapping {
                schema: schema.to_string(),
                table: table.to_string(),
                candidates: roots.iter().map(|rt| rt.name.clone()).collect(),
            }),
        }
    }
}
