use std::collections::BTreeSet;

use strata_core::{Catalog, TableName};

/// Source of names for objects the planner creates implicitly.
///
/// Callers own the generator; the planner never keeps naming state of its own.
pub trait NameGenerator {
    /// Name for an unnamed index whose first key column is `first_column`.
    fn index_name(&mut self, table: &TableName, first_column: &str) -> String;

    /// Name for a grouping join without an explicit constraint name.
    fn join_name(&mut self, parent: &TableName, child: &TableName) -> String;

    /// Name for the sequence backing an identity column.
    fn identity_sequence_name(&mut self, table: &TableName, column: &str) -> TableName;

    /// Constraint name recorded on a unique index.
    fn unique_constraint_name(&mut self, table: &TableName, index: &str) -> String;
}

/// Suffixing name generator seeded with every name already in a catalog.
#[derive(Debug, Default, Clone)]
pub struct DefaultNameGenerator {
    index_names: BTreeSet<(TableName, String)>,
    join_names: BTreeSet<String>,
    sequence_names: BTreeSet<TableName>,
    constraint_names: BTreeSet<(String, String)>,
}

impl DefaultNameGenerator {
    pub fn for_catalog(catalog: &Catalog) -> Self {
        let mut generator = Self::default();
        for table in &catalog.tables {
            for index in &table.indexes {
                generator
                    .index_names
                    .insert((table.name.clone(), index.name.clone()));
                if let Some(constraint) = &index.constraint_name {
                    generator
                        .constraint_names
                        .insert((table.name.schema.clone(), constraint.clone()));
                }
            }
            if let Some(join) = &table.parent_join {
                generator.join_names.insert(join.name.clone());
            }
        }
        for group in &catalog.groups {
            for table in catalog.tables_in_group(&group.name) {
                for index in &group.indexes {
                    generator
                        .index_names
                        .insert((table.name.clone(), index.name.clone()));
                }
            }
        }
        generator
            .sequence_names
            .extend(catalog.sequences.iter().map(|sequence| sequence.name.clone()));
        generator
    }
}

/// First of `base`, `base_2`, `base_3`, ... rejected by `taken`.
fn unique_name(base: &str, taken: impl Fn(&str) -> bool) -> String {
    if !taken(base) {
        return base.to_string();
    }
    let mut suffix = 2;
    loop {
        let candidate = format!("{base}_{suffix}");
        if !taken(&candidate) {
            return candidate;
        }
        suffix += 1;
    }
}

impl NameGenerator for DefaultNameGenerator {
    fn index_name(&mut self, table: &TableName, first_column: &str) -> String {
        let name = unique_name(first_column, |candidate| {
            self.index_names
                .contains(&(table.clone(), candidate.to_string()))
        });
        self.index_names.insert((table.clone(), name.clone()));
        name
    }

    fn join_name(&mut self, parent: &TableName, child: &TableName) -> String {
        let base = format!("{}_{}", child.table, parent.table);
        let name = unique_name(&base, |candidate| self.join_names.contains(candidate));
        self.join_names.insert(name.clone());
        name
    }

    fn identity_sequence_name(&mut self, table: &TableName, column: &str) -> TableName {
        let base = format!("{}_{}_seq", table.table, column);
        let name = unique_name(&base, |candidate| {
            self.sequence_names
                .contains(&TableName::new(table.schema.clone(), candidate))
        });
        let name = TableName::new(table.schema.clone(), name);
        self.sequence_names.insert(name.clone());
        name
    }

    fn unique_constraint_name(&mut self, table: &TableName, index: &str) -> String {
        let base = format!("{}_{}_key", table.table, index);
        let name = unique_name(&base, |candidate| {
            self.constraint_names
                .contains(&(table.schema.clone(), candidate.to_string()))
        });
        self.constraint_names
            .insert((table.schema.clone(), name.clone()));
        name
    }
}
