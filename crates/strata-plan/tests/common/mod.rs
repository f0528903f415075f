#![allow(dead_code)]

use strata_core::{Catalog, CatalogBuilder, IdentityGeneration, IndexJoinType, TableName};
use strata_plan::PlannerOptions;

pub fn name(table: &str) -> TableName {
    TableName::new("test", table)
}

pub fn options() -> PlannerOptions {
    PlannerOptions {
        default_schema: "test".to_string(),
        strict_rename_batches: false,
    }
}

/// Customers, orders and items in one group, plus standalone tables.
///
/// - `c(cid, name, zip)` with key `zip`
/// - `o(oid, cid, placed, status)` joined to `c`, key `by_placed`
/// - `i(iid, oid, sku, qty)` joined to `o`, `iid` is an identity column
/// - group index `name_placed` LEFT over `c.name, o.placed`
/// - `t(id, x, y)` with unique `U(x)`
/// - `p(id)` and `s(id, pid)` standalone, `s` has no primary key
/// - `places(id, tag, lat, lon)` with spatial key `geo(tag, lat, lon)` over `lat, lon`
pub fn catalog() -> Catalog {
    let mut builder = CatalogBuilder::new("test");
    builder
        .table("c")
        .bigint("cid")
        .varchar("name", 32)
        .varchar("zip", 10)
        .pk(&["cid"])
        .key("zip", &["zip"]);
    builder
        .table("o")
        .bigint("oid")
        .bigint("cid")
        .int("placed")
        .varchar("status", 8)
        .pk(&["oid"])
        .key("by_placed", &["placed"]);
    builder
        .table("i")
        .bigint("iid")
        .bigint("oid")
        .varchar("sku", 16)
        .int("qty")
        .identity("iid", IdentityGeneration::Always)
        .pk(&["iid"]);
    builder.join("o", "c", &[("cid", "cid")]);
    builder.join("i", "o", &[("oid", "oid")]);
    builder.group_index(
        "c",
        "name_placed",
        IndexJoinType::Left,
        &[("c", "name"), ("o", "placed")],
    );

    builder
        .table("t")
        .int("id")
        .int("x")
        .int("y")
        .pk(&["id"])
        .unique("U", &["x"]);
    builder.table("p").int("id").pk(&["id"]);
    builder.table("s").int("id").int("pid");
    builder
        .table("places")
        .int("id")
        .int("tag")
        .decimal("lat", 11, 7)
        .decimal("lon", 11, 7)
        .pk(&["id"])
        .spatial_key("geo", &["tag", "lat", "lon"], 1, 2);
    builder.build()
}
