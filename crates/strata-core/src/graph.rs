use std::collections::{BTreeMap, BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::name::TableName;
use crate::schema::Catalog;

/// Summary of join graph structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinGraphSummary {
    pub nodes: usize,
    pub edges: usize,
}

/// Report for parent-before-child ordering of the join graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinGraphReport {
    pub summary: JoinGraphSummary,
    pub topo_order: Option<Vec<TableName>>,
    pub cycle: Option<Vec<TableName>>,
}

/// Build a deterministic join dependency report for a catalog.
pub fn build_join_graph_report(catalog: &Catalog) -> JoinGraphReport {
    let graph = build_adjacency(catalog);
    let nodes = graph.len();
    let edges = graph.values().map(|targets| targets.len()).sum();
    let summary = JoinGraphSummary { nodes, edges };

    match toposort(&graph) {
        Ok(order) => JoinGraphReport {
            summary,
            topo_order: Some(order),
            cycle: None,
        },
        Err(cycle) => JoinGraphReport {
            summary,
            topo_order: None,
            cycle: Some(cycle),
        },
    }
}

fn build_adjacency(catalog: &Catalog) -> BTreeMap<TableName, BTreeSet<TableName>> {
    let mut graph: BTreeMap<TableName, BTreeSet<TableName>> = BTreeMap::new();

    for table in &catalog.tables {
        graph.entry(table.name.clone()).or_default();
        if let Some(join) = &table.parent_join {
            graph
                .entry(join.parent.clone())
                .or_default()
                .insert(table.name.clone());
        }
    }

    graph
}

fn toposort(
    graph: &BTreeMap<TableName, BTreeSet<TableName>>,
) -> std::result::Result<Vec<TableName>, Vec<TableName>> {
    let mut indegree: BTreeMap<TableName, usize> =
        graph.keys().map(|node| (node.clone(), 0)).collect();

    for targets in graph.values() {
        for target in targets {
            *indegree.entry(target.clone()).or_insert(0) += 1;
        }
    }

    let mut ready: BTreeSet<TableName> = indegree
        .iter()
        .filter(|(_, count)| **count == 0)
        .map(|(node, _)| node.clone())
        .collect();

    let mut order = Vec::with_capacity(graph.len());

    while let Some(node) = ready.pop_first() {
        if let Some(targets) = graph.get(&node) {
            for target in targets {
                if let Some(count) = indegree.get_mut(target) {
                    *count = count.saturating_sub(1);
                    if *count == 0 {
                        ready.insert(target.clone());
                    }
                }
            }
        }
        order.push(node);
    }

    if order.len() == graph.len() {
        Ok(order)
    } else {
        Err(indegree
            .into_iter()
            .filter_map(|(node, count)| (count > 0).then_some(node))
            .collect())
    }
}

/// One table placed in a group tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupMember {
    pub table: TableName,
    pub parent: Option<TableName>,
    pub join: Option<String>,
    pub depth: usize,
}

/// Breadth-first layout of a group, root first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupTree {
    pub group: TableName,
    pub root: TableName,
    pub members: Vec<GroupMember>,
    pub index_count: usize,
}

/// Walks the group from its root through child joins.
pub fn build_group_tree(catalog: &Catalog, group: &TableName) -> Result<GroupTree> {
    let record = catalog
        .group(group)
        .ok_or_else(|| Error::InvalidCatalog(format!("group not found: {group}")))?;

    let mut members = Vec::new();
    let mut seen = BTreeSet::new();
    let mut queue = VecDeque::from([(record.root.clone(), None, None, 0usize)]);

    while let Some((table, parent, join, depth)) = queue.pop_front() {
        if !seen.insert(table.clone()) {
            return Err(Error::InvalidCatalog(format!(
                "join cycle through {table} in group {group}"
            )));
        }
        let mut children: Vec<_> = catalog.child_joins(&table).collect();
        children.sort_by(|left, right| left.child.cmp(&right.child));
        for child in children {
            queue.push_back((
                child.child.clone(),
                Some(table.clone()),
                Some(child.name.clone()),
                depth + 1,
            ));
        }
        members.push(GroupMember {
            table,
            parent,
            join,
            depth,
        });
    }

    Ok(GroupTree {
        group: record.name.clone(),
        root: record.root.clone(),
        members,
        index_count: record.indexes.len(),
    })
}
