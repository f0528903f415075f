mod common;

use common::{catalog, name};
use strata_core::{Catalog, IndexJoinType, IndexKind};
use strata_plan::{
    BuiltIndex, CatalogDdl, CreateIndexRequest, DdlFunctions, DefaultNameGenerator, DropIndexPlan,
    DropIndexRequest, ExistenceCheck, IndexColumnRef, IndexDefinition, IndexOwner, PlanError,
    QualifiedName, RequestedJoinType, Result, SpatialFunction, SpatialMarker, execute_create_index,
    execute_drop_index, plan_create_index, plan_drop_index,
};

fn create(catalog: &Catalog, table: &str, index: IndexDefinition) -> Result<Option<BuiltIndex>> {
    let mut names = DefaultNameGenerator::for_catalog(catalog);
    let request = CreateIndexRequest {
        table: QualifiedName::unqualified(table),
        index,
        existence: ExistenceCheck::NoCondition,
    };
    plan_create_index(catalog, "test", &request, &mut names)
}

fn built(result: Result<Option<BuiltIndex>>) -> BuiltIndex {
    result.expect("index planned").expect("index built")
}

fn group_definition(join_type: Option<RequestedJoinType>) -> IndexDefinition {
    let mut definition = IndexDefinition::new(
        "name_status",
        vec![
            IndexColumnRef::column("name"),
            IndexColumnRef::qualified("o", "status"),
        ],
    );
    definition.join_type = join_type;
    definition
}

fn drop_request(table: Option<&str>, index: &str) -> DropIndexRequest {
    DropIndexRequest {
        table: table.map(QualifiedName::unqualified),
        schema: None,
        name: index.to_string(),
        existence: ExistenceCheck::NoCondition,
    }
}

#[test]
fn local_columns_build_table_index() {
    let catalog = catalog();
    let mut definition = IndexDefinition::new("unused", vec![IndexColumnRef::column("name")]);
    definition.name = None;

    let index = built(create(&catalog, "c", definition));
    assert_eq!(index.owner, IndexOwner::Table(name("c")));
    assert_eq!(index.index.name, "name");
    assert_eq!(index.index.kind, IndexKind::Table);
    assert!(!index.index.is_unique);
}

#[test]
fn columns_from_group_mates_build_group_index() {
    let catalog = catalog();
    let index = built(create(
        &catalog,
        "c",
        group_definition(Some(RequestedJoinType::Right)),
    ));
    assert_eq!(index.owner, IndexOwner::Group(name("c")));
    assert_eq!(index.index.kind, IndexKind::Group);
    assert_eq!(index.index.join_type, Some(IndexJoinType::Right));
    assert_eq!(index.index.columns[1].table, name("o"));
}

#[test]
fn group_index_join_type_rules() {
    let catalog = catalog();

    let err = create(&catalog, "c", group_definition(None)).expect_err("missing join type");
    assert!(matches!(err, PlanError::MissingGroupIndexJoinType { .. }));

    let err = create(&catalog, "c", group_definition(Some(RequestedJoinType::Inner)))
        .expect_err("inner join");
    match err {
        PlanError::UnsupportedGroupIndexJoinType { join_type, .. } => {
            assert_eq!(join_type, "INNER")
        }
        other => panic!("unexpected error: {other}"),
    }

    let mut unique = group_definition(None);
    unique.unique = true;
    let err = create(&catalog, "c", unique).expect_err("unique group index");
    assert!(matches!(err, PlanError::UnsupportedUniqueGroupIndex { .. }));

    let mut local = IndexDefinition::new("by_zip", vec![IndexColumnRef::column("zip")]);
    local.join_type = Some(RequestedJoinType::Left);
    let err = create(&catalog, "c", local).expect_err("join type on table index");
    assert!(matches!(err, PlanError::TableIndexJoinTypeNotAllowed { .. }));
}

#[test]
fn group_index_columns_must_stay_in_group() {
    let catalog = catalog();
    let mut definition = IndexDefinition::new(
        "across",
        vec![
            IndexColumnRef::column("name"),
            IndexColumnRef::qualified("p", "id"),
        ],
    );
    definition.join_type = Some(RequestedJoinType::Left);
    let err = create(&catalog, "c", definition).expect_err("outside group");
    assert!(matches!(err, PlanError::IndexTableNotInGroup { .. }));

    let mut definition = group_definition(Some(RequestedJoinType::Left));
    definition.columns[1] = IndexColumnRef::qualified("o", "nope");
    let err = create(&catalog, "c", definition).expect_err("missing column");
    assert!(matches!(err, PlanError::NoSuchColumn { .. }));

    let mut definition = group_definition(Some(RequestedJoinType::Left));
    definition.columns[1] = IndexColumnRef::qualified("nope", "id");
    let err = create(&catalog, "c", definition).expect_err("missing table");
    assert!(matches!(err, PlanError::NoSuchTable { .. }));
}

#[test]
fn descending_columns_are_unsupported() {
    let catalog = catalog();
    let mut column = IndexColumnRef::column("name");
    column.ascending = false;
    let err = create(&catalog, "c", IndexDefinition::new("desc", vec![column])).expect_err("desc");
    assert!(matches!(err, PlanError::UnsupportedAlteration { .. }));
}

#[test]
fn existing_index_name_respects_if_not_exists() {
    let catalog = catalog();
    let definition = IndexDefinition::new("zip", vec![IndexColumnRef::column("zip")]);
    let err = create(&catalog, "c", definition.clone()).expect_err("duplicate");
    assert!(matches!(err, PlanError::DuplicateIndex { .. }));

    let mut names = DefaultNameGenerator::for_catalog(&catalog);
    let request = CreateIndexRequest {
        table: QualifiedName::unqualified("o"),
        index: IndexDefinition::new("name_placed", vec![IndexColumnRef::column("status")]),
        existence: ExistenceCheck::IfNotExists,
    };
    let planned = plan_create_index(&catalog, "test", &request, &mut names).expect("tolerated");
    assert!(planned.is_none());
}

#[test]
fn spatial_index_shape_is_checked() {
    let catalog = catalog();
    let spatial = |first, last| {
        let mut definition = IndexDefinition::new(
            "where",
            vec![IndexColumnRef::column("lat"), IndexColumnRef::column("lon")],
        );
        definition.spatial = Some(SpatialMarker {
            function: SpatialFunction::ZOrderLatLon,
            first,
            last,
        });
        definition
    };

    let index = built(create(&catalog, "places", spatial(0, 1)));
    let range = index.index.spatial.expect("spatial range");
    assert_eq!((range.first, range.dimensions), (0, 2));

    let err = create(&catalog, "places", spatial(0, 0)).expect_err("one dimension");
    assert!(matches!(err, PlanError::BadSpatialIndex { .. }));

    let err = create(&catalog, "places", spatial(1, 2)).expect_err("past the key");
    assert!(matches!(err, PlanError::BadSpatialIndex { .. }));

    let err = create(&catalog, "places", spatial(0, usize::MAX)).expect_err("unbounded range");
    assert!(matches!(err, PlanError::BadSpatialIndex { .. }));
}

#[test]
fn drop_index_resolves_table_or_group() {
    let catalog = catalog();

    let plan = plan_drop_index(&catalog, "test", &drop_request(Some("c"), "zip")).expect("table");
    assert_eq!(
        plan,
        Some(DropIndexPlan::Table {
            table: name("c"),
            indexes: vec!["zip".to_string()],
        })
    );

    let plan =
        plan_drop_index(&catalog, "test", &drop_request(Some("o"), "name_placed")).expect("group");
    assert_eq!(
        plan,
        Some(DropIndexPlan::Group {
            group: name("c"),
            indexes: vec!["name_placed".to_string()],
        })
    );

    let plan = plan_drop_index(&catalog, "test", &drop_request(None, "by_placed")).expect("scan");
    assert_eq!(
        plan,
        Some(DropIndexPlan::Table {
            table: name("o"),
            indexes: vec!["by_placed".to_string()],
        })
    );
}

#[test]
fn drop_index_reports_ambiguity_and_absence() {
    let mut catalog = catalog();

    let err = plan_drop_index(&catalog, "test", &drop_request(None, "PRIMARY"))
        .expect_err("every table has one");
    assert!(matches!(err, PlanError::IndistinguishableIndex { .. }));

    let err = plan_drop_index(&catalog, "test", &drop_request(Some("c"), "nope"))
        .expect_err("missing");
    assert!(matches!(err, PlanError::NoSuchIndex { .. }));

    let mut lenient = drop_request(Some("c"), "nope");
    lenient.existence = ExistenceCheck::IfExists;
    assert_eq!(plan_drop_index(&catalog, "test", &lenient).expect("no-op"), None);

    let mut shadow = catalog
        .table(&name("c"))
        .and_then(|table| table.index("zip"))
        .cloned()
        .expect("zip index");
    shadow.name = "name_placed".to_string();
    if let Some(customers) = catalog.table_mut(&name("c")) {
        customers.indexes.push(shadow);
    }
    let err = plan_drop_index(&catalog, "test", &drop_request(Some("c"), "name_placed"))
        .expect_err("table and group share the name");
    assert!(matches!(err, PlanError::IndistinguishableIndex { .. }));
}

#[test]
fn create_and_drop_through_ddl() {
    let mut ddl = CatalogDdl::new(catalog());
    let mut names = DefaultNameGenerator::for_catalog(ddl.catalog());

    let request = CreateIndexRequest {
        table: QualifiedName::unqualified("c"),
        index: group_definition(Some(RequestedJoinType::Left)),
        existence: ExistenceCheck::NoCondition,
    };
    execute_create_index(&mut ddl, "test", &request, &mut names).expect("create");
    assert!(ddl
        .catalog()
        .group(&name("c"))
        .and_then(|group| group.index("name_status"))
        .is_some());

    let err = execute_create_index(&mut ddl, "test", &request, &mut names).expect_err("again");
    assert!(matches!(err, PlanError::DuplicateIndex { .. }));

    execute_drop_index(&mut ddl, "test", &drop_request(None, "name_status")).expect("drop");
    execute_drop_index(&mut ddl, "test", &drop_request(Some("c"), "zip")).expect("drop zip");

    let catalog = ddl.into_catalog();
    let customers = catalog.table(&name("c")).expect("c");
    assert!(customers.index("zip").is_none());
    assert!(catalog
        .group(&name("c"))
        .and_then(|group| group.index("name_status"))
        .is_none());
}
