mod common;

use common::{catalog, name, options};
use strata_core::{
    Catalog, CatalogBuilder, ColumnType, IdentityGeneration, TableName, validate_catalog,
};
use strata_plan::{
    AlterOutcome, AlterTableRequest, AlterationPlan, CatalogDdl, ChangeLevel, ColumnDefinition,
    ConstraintDefinition, ConstraintKind, DdlFunctions, DefaultNameGenerator, DropConstraintKind,
    ErrorCategory, ExistenceCheck, ForeignKeyDefinition, GroupingForeignKey, IdentityChange,
    IdentityDefinition, IndexColumnRef, IndexDefinition, PlanError, PlannerOptions, QualifiedName,
    RequestedJoinType, Result, TableChange, TableElement, execute_alter_table, plan_alter_table,
};

fn request(table: &str, elements: Vec<TableElement>) -> AlterTableRequest {
    AlterTableRequest::new(QualifiedName::unqualified(table), elements)
}

fn plan_with(
    catalog: &Catalog,
    table: &str,
    elements: Vec<TableElement>,
    options: &PlannerOptions,
) -> Result<AlterOutcome> {
    let mut names = DefaultNameGenerator::for_catalog(catalog);
    plan_alter_table(catalog, &request(table, elements), options, &mut names)
}

fn alter(catalog: &Catalog, table: &str, elements: Vec<TableElement>) -> Result<AlterOutcome> {
    plan_with(catalog, table, elements, &options())
}

fn accepted(outcome: Result<AlterOutcome>) -> AlterationPlan {
    match outcome.expect("plan accepted") {
        AlterOutcome::Alter(plan) => plan,
        other => panic!("expected an alteration, got {other:?}"),
    }
}

fn drop_column(column: &str) -> TableElement {
    TableElement::DropColumn {
        name: column.to_string(),
        existence: ExistenceCheck::NoCondition,
    }
}

fn grouping_fk(columns: &[&str], parent: &str, parent_columns: &[&str]) -> TableElement {
    TableElement::AddGroupingForeignKey(GroupingForeignKey {
        name: None,
        columns: columns.iter().map(|col| col.to_string()).collect(),
        parent: QualifiedName::unqualified(parent),
        parent_columns: parent_columns.iter().map(|col| col.to_string()).collect(),
    })
}

fn layout(plan: &AlterationPlan) -> Vec<(String, usize)> {
    plan.candidate()
        .expect("candidate")
        .columns
        .iter()
        .map(|column| (column.name.clone(), column.position))
        .collect()
}

#[test]
fn dropping_unique_column_drops_its_index() {
    let catalog = catalog();
    let plan = accepted(alter(&catalog, "t", vec![drop_column("x")]));

    assert_eq!(
        layout(&plan),
        vec![("id".to_string(), 0), ("y".to_string(), 1)]
    );
    assert_eq!(plan.column_changes, vec![TableChange::create_drop("x")]);
    assert_eq!(plan.index_changes, vec![TableChange::create_drop("U")]);
    assert!(plan.group_index_changes.is_empty());
    assert_eq!(plan.level, ChangeLevel::Table);
    assert!(plan.candidate().expect("candidate").index("U").is_none());
}

#[test]
fn grouping_foreign_key_joins_standalone_table() {
    let catalog = catalog();
    let plan = accepted(alter(&catalog, "s", vec![grouping_fk(&["pid"], "p", &[])]));

    let candidate = plan.candidate().expect("candidate");
    let join = candidate.parent_join.as_ref().expect("join created");
    assert_eq!(join.parent, name("p"));
    assert_eq!(join.child, name("s"));
    assert_eq!(join.parent_columns(), vec!["id"]);
    assert_eq!(join.child_columns(), vec!["pid"]);
    assert_eq!(join.name, "s_p");
    assert!(candidate.group.is_none());
    assert!(plan.column_changes.is_empty());
    assert!(plan.index_changes.is_empty());
    assert_eq!(plan.level, ChangeLevel::Group);
}

#[test]
fn planning_leaves_catalog_untouched() {
    let catalog = catalog();
    let before = catalog.clone();
    accepted(alter(&catalog, "o", vec![drop_column("placed")]));
    assert_eq!(catalog, before);
}

#[test]
fn dropped_column_cascades_into_table_and_group_indexes() {
    let catalog = catalog();
    let plan = accepted(alter(&catalog, "o", vec![drop_column("placed")]));

    assert_eq!(plan.index_changes, vec![TableChange::create_drop("by_placed")]);
    assert_eq!(
        plan.group_index_changes,
        vec![TableChange::create_modify("name_placed", "name_placed")]
    );
    let group = plan.working_catalog.group(&name("c")).expect("group");
    let index = group.index("name_placed").expect("group index survives");
    assert_eq!(index.column_names(), vec!["name"]);
    assert_eq!(plan.level, ChangeLevel::Table);
}

#[test]
fn renamed_column_is_followed_without_spurious_changes() {
    let catalog = catalog();
    let plan = accepted(alter(
        &catalog,
        "o",
        vec![TableElement::RenameColumn {
            old_name: "placed".to_string(),
            new_name: "placed_at".to_string(),
        }],
    ));

    assert_eq!(
        plan.column_changes,
        vec![TableChange::create_modify("placed", "placed_at")]
    );
    assert!(plan.index_changes.is_empty());
    assert!(plan.group_index_changes.is_empty());
    assert_eq!(plan.level, ChangeLevel::Metadata);

    let candidate = plan.candidate().expect("candidate");
    let index = candidate.index("by_placed").expect("index kept");
    assert_eq!(index.column_names(), vec!["placed_at"]);
    let group = plan.working_catalog.group(&name("c")).expect("group");
    let group_index = group.index("name_placed").expect("group index kept");
    assert_eq!(group_index.column_names(), vec!["name", "placed_at"]);
}

#[test]
fn rename_onto_existing_column_is_rejected() {
    let catalog = catalog();
    let err = alter(
        &catalog,
        "o",
        vec![TableElement::RenameColumn {
            old_name: "placed".to_string(),
            new_name: "status".to_string(),
        }],
    )
    .expect_err("duplicate");
    assert!(matches!(err, PlanError::DuplicateColumnName { .. }));
}

#[test]
fn table_keeps_a_single_parent() {
    let catalog = catalog();
    let err =
        alter(&catalog, "o", vec![grouping_fk(&["cid"], "p", &[])]).expect_err("second parent");
    assert!(matches!(err, PlanError::JoinToMultipleParents { .. }));

    let err = alter(&catalog, "s", vec![grouping_fk(&["id"], "s", &[])]).expect_err("self join");
    assert!(matches!(err, PlanError::JoinToSelf { .. }));
}

#[test]
fn grouping_foreign_key_shape_is_checked() {
    let catalog = catalog();

    let err = alter(&catalog, "s", vec![grouping_fk(&["id", "pid"], "p", &[])])
        .expect_err("column count");
    assert!(matches!(
        err,
        PlanError::JoinColumnCountMismatch {
            columns: 2,
            primary_key_columns: 1,
            ..
        }
    ));

    let err = alter(&catalog, "s", vec![grouping_fk(&["pid"], "p", &["nope"])])
        .expect_err("wrong parent column");
    assert!(matches!(err, PlanError::JoinToWrongColumns { .. }));

    let err = alter(&catalog, "s", vec![grouping_fk(&["nope"], "p", &[])])
        .expect_err("missing child column");
    assert!(matches!(err, PlanError::NoSuchColumn { .. }));

    let err = alter(&catalog, "s", vec![grouping_fk(&["pid"], "nope", &[])])
        .expect_err("missing parent");
    assert!(matches!(err, PlanError::NoSuchTable { .. }));
}

#[test]
fn rename_short_circuits_the_batch() {
    let catalog = catalog();
    let rename = || TableElement::RenameTable {
        new_name: QualifiedName::unqualified("customers"),
    };

    let outcome = alter(&catalog, "c", vec![drop_column("zip"), rename()]).expect("rename");
    assert_eq!(
        outcome,
        AlterOutcome::Rename {
            old_name: name("c"),
            new_name: name("customers"),
        }
    );
    assert_eq!(outcome.level(), Some(ChangeLevel::Metadata));

    let err = alter(&catalog, "c", vec![drop_column("nope"), rename()]).expect_err("earlier error");
    assert!(matches!(err, PlanError::NoSuchColumn { .. }));

    let strict = PlannerOptions {
        strict_rename_batches: true,
        ..options()
    };
    let err = plan_with(&catalog, "c", vec![drop_column("zip"), rename()], &strict)
        .expect_err("strict");
    assert!(matches!(err, PlanError::RenameMixedWithOtherChanges { .. }));
    assert!(plan_with(&catalog, "c", vec![rename()], &strict).is_ok());

    let err = alter(
        &catalog,
        "c",
        vec![TableElement::RenameTable {
            new_name: QualifiedName::unqualified("o"),
        }],
    )
    .expect_err("taken");
    assert!(matches!(err, PlanError::DuplicateTableName { .. }));
}

#[test]
fn existence_checks_turn_missing_objects_into_no_ops() {
    let catalog = catalog();

    let mut missing = request("nope", vec![drop_column("x")]);
    let mut names = DefaultNameGenerator::for_catalog(&catalog);
    let err = plan_alter_table(&catalog, &missing, &options(), &mut names).expect_err("missing");
    assert_eq!(err.category(), ErrorCategory::Reference);

    missing.existence = ExistenceCheck::IfExists;
    let outcome = plan_alter_table(&catalog, &missing, &options(), &mut names).expect("skipped");
    assert_eq!(outcome, AlterOutcome::Skipped);

    let plan = accepted(alter(
        &catalog,
        "c",
        vec![
            TableElement::DropColumn {
                name: "nope".to_string(),
                existence: ExistenceCheck::IfExists,
            },
            TableElement::DropIndex {
                name: "nope".to_string(),
                existence: ExistenceCheck::IfExists,
            },
        ],
    ));
    assert!(plan.column_changes.is_empty());
    assert!(plan.index_changes.is_empty());
    assert_eq!(plan.level, ChangeLevel::Metadata);

    let mut duplicate = ColumnDefinition::new("name", ColumnType::int());
    let err = alter(&catalog, "c", vec![TableElement::AddColumn(duplicate.clone())])
        .expect_err("duplicate column");
    assert!(matches!(err, PlanError::DuplicateColumnName { .. }));
    duplicate.existence = ExistenceCheck::IfNotExists;
    let plan = accepted(alter(&catalog, "c", vec![TableElement::AddColumn(duplicate)]));
    assert!(plan.column_changes.is_empty());
}

#[test]
fn dropped_column_name_can_be_reused() {
    let catalog = catalog();
    let plan = accepted(alter(
        &catalog,
        "t",
        vec![
            drop_column("y"),
            TableElement::AddColumn(ColumnDefinition::new("y", ColumnType::bigint())),
        ],
    ));
    assert_eq!(
        plan.column_changes,
        vec![TableChange::create_drop("y"), TableChange::create_add("y")]
    );
    let candidate = plan.candidate().expect("candidate");
    assert_eq!(
        candidate.column("y").map(|col| col.column_type.clone()),
        Some(ColumnType::bigint())
    );
}

#[test]
fn adding_primary_key_forces_not_null() {
    let catalog = catalog();
    let plan = accepted(alter(
        &catalog,
        "s",
        vec![TableElement::AddConstraint(ConstraintDefinition {
            kind: ConstraintKind::PrimaryKey,
            name: None,
            columns: vec!["id".to_string()],
        })],
    ));

    let candidate = plan.candidate().expect("candidate");
    assert_eq!(candidate.primary_key_columns(), vec!["id"]);
    assert_eq!(candidate.column("id").map(|col| col.nullable), Some(false));
    assert_eq!(plan.column_changes, vec![TableChange::create_modify("id", "id")]);
    assert_eq!(plan.index_changes, vec![TableChange::create_add("PRIMARY")]);
    assert_eq!(plan.level, ChangeLevel::Table);

    let err = plan_second_primary_key(&catalog);
    assert!(matches!(err, PlanError::DuplicateIndex { .. }));
}

fn plan_second_primary_key(catalog: &Catalog) -> PlanError {
    alter(
        catalog,
        "t",
        vec![TableElement::AddConstraint(ConstraintDefinition {
            kind: ConstraintKind::PrimaryKey,
            name: None,
            columns: vec!["x".to_string()],
        })],
    )
    .expect_err("second primary key")
}

#[test]
fn primary_key_on_new_column_adds_no_modify() {
    let catalog = catalog();
    let plan = accepted(alter(
        &catalog,
        "s",
        vec![
            TableElement::AddColumn(ColumnDefinition::new("k", ColumnType::int())),
            TableElement::AddConstraint(ConstraintDefinition {
                kind: ConstraintKind::PrimaryKey,
                name: Some("s_pk".to_string()),
                columns: vec!["k".to_string()],
            }),
        ],
    ));
    assert_eq!(plan.column_changes, vec![TableChange::create_add("k")]);
    let candidate = plan.candidate().expect("candidate");
    let primary = candidate.primary_key().expect("primary key");
    assert_eq!(primary.constraint_name.as_deref(), Some("s_pk"));
    assert_eq!(candidate.column("k").map(|col| col.position), Some(2));
}

#[test]
fn serial_column_mints_identity_sequence() {
    let catalog = catalog();
    let plan = accepted(alter(
        &catalog,
        "t",
        vec![TableElement::AddColumn(ColumnDefinition::new(
            "n",
            ColumnType::new("SERIAL"),
        ))],
    ));

    let column = plan.candidate().and_then(|table| table.column("n")).expect("n");
    assert_eq!(column.column_type, ColumnType::int());
    assert!(!column.nullable);
    let identity = column.identity.as_ref().expect("identity");
    assert_eq!(identity.generation, IdentityGeneration::ByDefault);
    assert_eq!(identity.sequence, name("t_n_seq"));
    assert!(plan.working_catalog.sequence(&identity.sequence).is_some());
    assert_eq!(plan.level, ChangeLevel::Table);
}

#[test]
fn identity_edits_follow_the_generated_state() {
    let catalog = catalog();

    let err = alter(
        &catalog,
        "i",
        vec![TableElement::AlterColumnIdentity {
            name: "iid".to_string(),
            change: IdentityChange::Create(IdentityDefinition {
                generation: IdentityGeneration::ByDefault,
                start: 1,
                increment: 1,
            }),
            existence: ExistenceCheck::NoCondition,
        }],
    )
    .expect_err("already generated");
    assert!(matches!(err, PlanError::ColumnAlreadyGenerated { .. }));

    let plan_drop_default = accepted(alter(
        &catalog,
        "i",
        vec![TableElement::AlterColumnDefault {
            name: "iid".to_string(),
            default: None,
            existence: ExistenceCheck::NoCondition,
        }],
    ));
    let column = plan_drop_default
        .candidate()
        .and_then(|table| table.column("iid"))
        .expect("iid");
    assert!(column.identity.is_none());
    assert!(plan_drop_default
        .working_catalog
        .sequence(&name("i_iid_seq"))
        .is_none());
    assert_eq!(plan_drop_default.level, ChangeLevel::Metadata);

    let created = accepted(alter(
        &catalog,
        "i",
        vec![TableElement::AlterColumnIdentity {
            name: "qty".to_string(),
            change: IdentityChange::Create(IdentityDefinition {
                generation: IdentityGeneration::Always,
                start: 10,
                increment: 5,
            }),
            existence: ExistenceCheck::NoCondition,
        }],
    ));
    let sequence = created
        .working_catalog
        .sequence(&name("i_qty_seq"))
        .expect("sequence");
    assert_eq!((sequence.start, sequence.increment), (10, 5));

    let err = alter(
        &catalog,
        "i",
        vec![TableElement::AlterColumnIdentity {
            name: "iid".to_string(),
            change: IdentityChange::RestartWith { start: 5 },
            existence: ExistenceCheck::NoCondition,
        }],
    )
    .expect_err("restart");
    assert_eq!(err.category(), ErrorCategory::Capability);
}

#[test]
fn type_change_keeps_column_position() {
    let catalog = catalog();
    let plan = accepted(alter(
        &catalog,
        "t",
        vec![TableElement::AlterColumnType {
            name: "x".to_string(),
            column_type: ColumnType::bigint(),
            existence: ExistenceCheck::NoCondition,
        }],
    ));
    let candidate = plan.candidate().expect("candidate");
    let x = candidate.column("x").expect("x");
    assert_eq!(x.position, 1);
    assert_eq!(x.column_type, ColumnType::bigint());
    assert!(candidate.index("U").is_some());
    assert!(plan.index_changes.is_empty());
    assert_eq!(plan.level, ChangeLevel::Table);
}

#[test]
fn spatial_index_cascade() {
    let catalog = catalog();

    let plan_lat = accepted(alter(&catalog, "places", vec![drop_column("lat")]));
    assert_eq!(plan_lat.index_changes, vec![TableChange::create_drop("geo")]);

    let plan_tag = accepted(alter(&catalog, "places", vec![drop_column("tag")]));
    assert_eq!(
        plan_tag.index_changes,
        vec![TableChange::create_modify("geo", "geo")]
    );
    let geo = plan_tag
        .candidate()
        .and_then(|table| table.index("geo"))
        .expect("geo");
    assert_eq!(geo.column_names(), vec!["lat", "lon"]);
    let range = geo.spatial.expect("spatial");
    assert_eq!((range.first, range.dimensions), (0, 2));
}

#[test]
fn constraint_drops_resolve_against_the_original_table() {
    let catalog = catalog();

    let drop_unique = |table: &str, constraint: &str| {
        alter(
            &catalog,
            table,
            vec![TableElement::DropConstraint {
                kind: DropConstraintKind::Unique,
                name: Some(constraint.to_string()),
                existence: ExistenceCheck::NoCondition,
            }],
        )
    };
    let plan_u = accepted(drop_unique("t", "U"));
    assert_eq!(plan_u.index_changes, vec![TableChange::create_drop("U")]);
    let err = drop_unique("c", "zip").expect_err("not unique");
    assert!(matches!(err, PlanError::NoSuchUnique { .. }));

    let detach = accepted(alter(
        &catalog,
        "o",
        vec![TableElement::DropConstraint {
            kind: DropConstraintKind::Any,
            name: Some("o_c".to_string()),
            existence: ExistenceCheck::NoCondition,
        }],
    ));
    assert!(detach.candidate().expect("candidate").parent_join.is_none());
    assert_eq!(detach.level, ChangeLevel::Group);

    let err = alter(
        &catalog,
        "s",
        vec![TableElement::DropConstraint {
            kind: DropConstraintKind::PrimaryKey,
            name: None,
            existence: ExistenceCheck::NoCondition,
        }],
    )
    .expect_err("no primary key");
    assert!(matches!(err, PlanError::NoSuchConstraint { .. }));
}

#[test]
fn added_indexes_are_named_and_recorded() {
    let catalog = catalog();
    let mut unique = IndexDefinition::new("ignored", vec![IndexColumnRef::column("zip")]);
    unique.name = None;
    unique.unique = true;

    let plan = accepted(alter(
        &catalog,
        "c",
        vec![
            TableElement::AddIndex(IndexDefinition::new(
                "by_name",
                vec![IndexColumnRef::column("name")],
            )),
            TableElement::AddIndex(unique),
        ],
    ));
    assert_eq!(
        plan.index_changes,
        vec![
            TableChange::create_add("by_name"),
            TableChange::create_add("zip_2")
        ]
    );
    let candidate = plan.candidate().expect("candidate");
    let generated = candidate.index("zip_2").expect("generated index");
    assert!(generated.is_unique);
    assert_eq!(generated.constraint_name.as_deref(), Some("c_zip_2_key"));
}

#[test]
fn unsupported_elements_are_rejected() {
    let catalog = catalog();

    let err = alter(&catalog, "t", Vec::new()).expect_err("empty");
    assert!(matches!(err, PlanError::EmptyAlteration { .. }));

    let err = alter(&catalog, "t", vec![drop_column("__row_id")]).expect_err("protected");
    assert!(matches!(err, PlanError::ProtectedColumn { .. }));

    let err = alter(
        &catalog,
        "t",
        vec![TableElement::AddConstraint(ConstraintDefinition {
            kind: ConstraintKind::Check,
            name: None,
            columns: Vec::new(),
        })],
    )
    .expect_err("check");
    assert!(matches!(err, PlanError::UnsupportedCheckConstraint));

    let err = alter(
        &catalog,
        "s",
        vec![TableElement::AddForeignKey(ForeignKeyDefinition {
            name: None,
            columns: vec!["pid".to_string()],
            referenced: QualifiedName::unqualified("p"),
            referenced_columns: Vec::new(),
        })],
    )
    .expect_err("foreign key");
    assert!(matches!(err, PlanError::UnsupportedForeignKeyIndex));

    let mut joined = IndexDefinition::new("gi", vec![IndexColumnRef::column("name")]);
    joined.join_type = Some(RequestedJoinType::Left);
    let err = alter(&catalog, "c", vec![TableElement::AddIndex(joined)]).expect_err("join type");
    assert!(matches!(err, PlanError::UnsupportedAlteration { .. }));
}

#[test]
fn committed_grouping_moves_tables_between_groups() {
    let mut ddl = CatalogDdl::new(catalog());
    let mut names = DefaultNameGenerator::for_catalog(ddl.catalog());

    let outcome = execute_alter_table(
        &mut ddl,
        &request("s", vec![grouping_fk(&["pid"], "p", &[])]),
        &options(),
        &mut names,
    )
    .expect("join s to p");
    assert_eq!(outcome.level(), Some(ChangeLevel::Group));

    execute_alter_table(
        &mut ddl,
        &request(
            "o",
            vec![TableElement::DropGroupingForeignKey {
                existence: ExistenceCheck::NoCondition,
            }],
        ),
        &options(),
        &mut names,
    )
    .expect("detach o");

    let catalog = ddl.into_catalog();
    let group_of = |table: &str| {
        catalog
            .table(&name(table))
            .and_then(|table| table.group.clone())
    };
    assert_eq!(group_of("s"), Some(name("p")));
    assert!(catalog.group(&name("s")).is_none());
    assert_eq!(group_of("o"), Some(name("o")));
    assert_eq!(group_of("i"), Some(name("o")));
    let customers = catalog.group(&name("c")).expect("group c");
    assert!(customers.index("name_placed").is_none());
    validate_catalog(&catalog).expect("committed catalog stays valid");
}

#[test]
fn committed_column_drop_rewrites_group_index() {
    let mut ddl = CatalogDdl::new(catalog());
    let mut names = DefaultNameGenerator::for_catalog(ddl.catalog());
    execute_alter_table(
        &mut ddl,
        &request("o", vec![drop_column("placed")]),
        &options(),
        &mut names,
    )
    .expect("drop placed");

    let catalog = ddl.into_catalog();
    let orders = catalog.table(&name("o")).expect("o");
    assert!(orders.column("placed").is_none());
    assert!(orders.index("by_placed").is_none());
    let group_index = catalog
        .group(&name("c"))
        .and_then(|group| group.index("name_placed"))
        .expect("group index");
    assert_eq!(group_index.column_names(), vec!["name"]);
    assert_eq!(
        group_index.columns[0].table,
        TableName::new("test", "c")
    );
    validate_catalog(&catalog).expect("committed catalog stays valid");
}

fn commit(catalog: Catalog, table: &str, elements: Vec<TableElement>) -> (AlterOutcome, Catalog) {
    let mut ddl = CatalogDdl::new(catalog);
    let mut names = DefaultNameGenerator::for_catalog(ddl.catalog());
    let outcome = execute_alter_table(&mut ddl, &request(table, elements), &options(), &mut names)
        .expect("alteration committed");
    (outcome, ddl.into_catalog())
}

fn rename_column(old_name: &str, new_name: &str) -> TableElement {
    TableElement::RenameColumn {
        old_name: old_name.to_string(),
        new_name: new_name.to_string(),
    }
}

#[test]
fn dropped_join_column_detaches_table_from_parent() {
    let catalog = catalog();
    let plan = accepted(alter(&catalog, "o", vec![drop_column("cid")]));

    let candidate = plan.candidate().expect("candidate");
    assert!(candidate.column("cid").is_none());
    assert!(candidate.parent_join.is_none());
    assert!(candidate.group.is_none());
    assert!(plan.detached_children.is_empty());
    assert_eq!(plan.level, ChangeLevel::Group);

    let (_, committed) = commit(catalog, "o", vec![drop_column("cid")]);
    let group_of = |table: &str| {
        committed
            .table(&name(table))
            .and_then(|table| table.group.clone())
    };
    assert_eq!(group_of("o"), Some(name("o")));
    assert_eq!(group_of("i"), Some(name("o")));
    assert_eq!(group_of("c"), Some(name("c")));
    validate_catalog(&committed).expect("committed catalog stays valid");
}

#[test]
fn primary_key_changes_detach_children() {
    let catalog = catalog();
    let plan = accepted(alter(&catalog, "c", vec![drop_column("cid")]));
    assert!(plan.index_changes.contains(&TableChange::create_drop("PRIMARY")));
    assert_eq!(plan.detached_children, vec![name("o")]);
    assert_eq!(plan.level, ChangeLevel::Group);
    let orders = plan.working_catalog.table(&name("o")).expect("o");
    assert!(orders.parent_join.is_none());

    let retyped = accepted(alter(
        &catalog,
        "o",
        vec![TableElement::AlterColumnType {
            name: "oid".to_string(),
            column_type: ColumnType::int(),
            existence: ExistenceCheck::NoCondition,
        }],
    ));
    assert_eq!(retyped.detached_children, vec![name("i")]);
    assert!(retyped.candidate().expect("o").parent_join.is_some());
    assert_eq!(retyped.level, ChangeLevel::Group);

    let (_, committed) = commit(catalog, "c", vec![drop_column("cid")]);
    let orders = committed.table(&name("o")).expect("o");
    assert!(orders.parent_join.is_none());
    assert_eq!(orders.group, Some(name("o")));
    assert_eq!(
        committed.table(&name("i")).and_then(|table| table.group.clone()),
        Some(name("o"))
    );
    validate_catalog(&committed).expect("committed catalog stays valid");
}

#[test]
fn renamed_join_columns_are_rewritten_in_place() {
    let catalog = catalog();
    let elements = vec![rename_column("cid", "customer_id"), rename_column("oid", "order_id")];
    let plan = accepted(alter(&catalog, "o", elements.clone()));

    let own = plan
        .candidate()
        .and_then(|table| table.parent_join.as_ref())
        .expect("parent join kept");
    assert_eq!(own.child_columns(), vec!["customer_id"]);
    let child = plan
        .working_catalog
        .table(&name("i"))
        .and_then(|table| table.parent_join.as_ref())
        .expect("child join kept");
    assert_eq!(child.parent_columns(), vec!["order_id"]);
    assert!(plan.detached_children.is_empty());
    assert!(plan.index_changes.is_empty());
    assert_eq!(plan.level, ChangeLevel::Metadata);

    let (_, committed) = commit(catalog, "o", elements);
    let items = committed.table(&name("i")).expect("i");
    assert_eq!(
        items.parent_join.as_ref().map(|join| join.parent_columns()),
        Some(vec!["order_id"])
    );
    assert_eq!(items.group, Some(name("c")));
    validate_catalog(&committed).expect("committed catalog stays valid");
}

#[test]
fn batch_without_effective_edits_reproduces_the_table() {
    let catalog = catalog();
    let plan = accepted(alter(
        &catalog,
        "o",
        vec![TableElement::DropColumn {
            name: "missing".to_string(),
            existence: ExistenceCheck::IfExists,
        }],
    ));

    assert_eq!(plan.candidate(), catalog.table(&name("o")));
    assert_eq!(
        plan.working_catalog.group(&name("c")),
        catalog.group(&name("c"))
    );
    assert!(plan.column_changes.is_empty());
    assert!(plan.index_changes.is_empty());
    assert!(plan.group_index_changes.is_empty());
    assert_eq!(plan.level, ChangeLevel::Metadata);
}

#[test]
fn multi_column_index_shrinks_then_drops() {
    let mut builder = CatalogBuilder::new("test");
    builder
        .table("m")
        .int("a")
        .int("b")
        .int("c")
        .int("d")
        .pk(&["d"])
        .key("I", &["a", "b", "c"]);
    let catalog = builder.build();

    let shrunk = accepted(alter(&catalog, "m", vec![drop_column("b")]));
    assert_eq!(shrunk.index_changes, vec![TableChange::create_modify("I", "I")]);
    let index = shrunk
        .candidate()
        .and_then(|table| table.index("I"))
        .expect("I survives");
    assert_eq!(index.column_names(), vec!["a", "c"]);

    let emptied = accepted(alter(
        &catalog,
        "m",
        vec![drop_column("a"), drop_column("b"), drop_column("c")],
    ));
    assert_eq!(emptied.index_changes, vec![TableChange::create_drop("I")]);
    assert!(emptied.candidate().expect("candidate").index("I").is_none());
    assert_eq!(layout(&emptied), vec![("d".to_string(), 0)]);
}

#[test]
fn positions_stay_dense_through_mixed_edits() {
    let catalog = catalog();
    let plan = accepted(alter(
        &catalog,
        "t",
        vec![
            TableElement::AddColumn(ColumnDefinition::new("a", ColumnType::int())),
            drop_column("x"),
            TableElement::AlterColumnType {
                name: "y".to_string(),
                column_type: ColumnType::bigint(),
                existence: ExistenceCheck::NoCondition,
            },
            TableElement::AddColumn(ColumnDefinition::new("b", ColumnType::int())),
        ],
    ));

    assert_eq!(
        layout(&plan),
        vec![
            ("id".to_string(), 0),
            ("y".to_string(), 1),
            ("a".to_string(), 2),
            ("b".to_string(), 3),
        ]
    );
    let candidate = plan.candidate().expect("candidate");
    assert!(candidate
        .columns
        .iter()
        .enumerate()
        .all(|(position, column)| column.position == position));
    assert_eq!(plan.level, ChangeLevel::Table);
}

#[test]
fn outcome_serializes_with_tag() {
    let catalog = catalog();
    let outcome = alter(&catalog, "t", vec![drop_column("x")]).expect("plan");
    let json = serde_json::to_value(&outcome).expect("serialize");
    assert_eq!(json["outcome"], "alter");
    assert_eq!(json["level"], "table");
    assert_eq!(json["column_changes"][0]["change_type"], "drop");
}
