use std::collections::HashSet;

use super::model::{CorrelationEdge, MetaboliteRegistry, NetworkGraph, NetworkNode, Row};

/// Build the correlation network from `metabolite_1,metabolite_2` rows.
///
/// Rows missing either endpoint are dropped. Every other row becomes an edge
/// as given; both endpoints join the node list once, in first-seen order,
/// annotated from the registry.
pub fn build_network(rows: &[Row], registry: &MetaboliteRegistry) -> NetworkGraph {
    let mut seen: HashSet<String> = HashSet::new();
    let mut node_ids: Vec<String> = Vec::new();
    let mut edges = Vec::with_capacity(rows.len());

    for row in rows {
        let (Some(source), Some(target)) = (row.text("metabolite_1"), row.text("metabolite_2"))
        else {
            continue;
        };

        for id in [&source, &target] {
            if seen.insert(id.clone()) {
                node_ids.push(id.clone());
            }
        }
        edges.push(CorrelationEdge { source, target });
    }

    let nodes: Vec<NetworkNode> = node_ids
        .into_iter()
        .map(|id| {
            let info = registry.resolve(&id);
            NetworkNode {
                id,
                name: info.name,
                subclass: info.subclass,
            }
        })
        .collect();

    log::debug!(
        "network: {} node(s), {} edge(s), {} row(s) dropped",
        nodes.len(),
        edges.len(),
        rows.len() - edges.len()
    );
    NetworkGraph { nodes, edges }
}
