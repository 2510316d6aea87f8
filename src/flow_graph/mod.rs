//! Flow graph module - Trace wallet fund flows and build the address graph

use crate::{Result, data_source::DataSource};

pub mod destination;
pub mod graph;
pub mod status;
pub mod traversal;

// Re-export key types
pub use destination::select_destination;
pub use graph::{AddressNode, Edge, FlowEdge, FlowGraph, GraphModel, GraphStats, Node, PairKey};
pub use status::{LogStatus, NoopStatus, Phase, StatusSink};
pub use traversal::{MAX_TXIDS_PER_ADDRESS, VertexMap, traverse};

/// Trace `origin` to `depth` waves and build the flow graph.
///
/// Reports `Ready` once the graph is built; failures are reported by the
/// traversal and returned unchanged.
pub async fn explore(
    source: &dyn DataSource,
    origin: &str,
    depth: u32,
    status: &mut dyn StatusSink,
) -> Result<(VertexMap, FlowGraph)> {
    let vertices = traverse(source, origin, depth, status).await?;
    let graph = FlowGraph::build_from_vertices(&vertices);

    let stats = graph.stats();
    tracing::info!(
        "Built graph with {} addresses and {} edges ({} bidirectional)",
        stats.total_addresses,
        stats.total_edges,
        stats.bidirectional_edges
    );

    status.report_phase(Phase::Ready);
    Ok((vertices, graph))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_source::mock::MockDataSource;
    use crate::data_source::{AddressRecord, TransactionRecord, TxOutput};
    use crate::flow_graph::status::testing::RecordingStatus;

    #[tokio::test]
    async fn test_explore_end_to_end() {
        let ds = MockDataSource::new()
            .with_address(AddressRecord::new("X").with_txids(["t1"]))
            .with_address(AddressRecord::new("Y").with_txids(["t2"]))
            .with_transaction(TransactionRecord::new(
                "t1",
                100,
                vec![TxOutput::new(8, &["X"]), TxOutput::new(90, &["Y"])],
            ));
        let mut status = RecordingStatus::default();

        let (vertices, graph) = explore(&ds, "X", 2, &mut status).await.unwrap();

        assert_eq!(vertices.len(), 2);
        assert_eq!(graph.graph.node_count(), 2);
        assert_eq!(graph.graph.edge_count(), 1);
        let edge = graph.edge_between("X", "Y").unwrap();
        assert_eq!(edge.source, "X");
        assert_eq!(edge.target, "Y");
        assert_eq!(status.phases, vec![Phase::Loading, Phase::Ready]);
    }

    #[tokio::test]
    async fn test_every_destination_becomes_a_node() {
        // Y and Z form the outermost ring; they are fetched but not expanded
        let ds = MockDataSource::new()
            .with_address(AddressRecord::new("X").with_txids(["t1", "t2"]))
            .with_address(AddressRecord::new("Y").with_txids(["t3"]))
            .with_address(AddressRecord::new("Z"))
            .with_transaction(TransactionRecord::new("t1", 5, vec![TxOutput::new(5, &["Y"])]))
            .with_transaction(TransactionRecord::new("t2", 5, vec![TxOutput::new(5, &["Z"])]));

        let (vertices, graph) = explore(&ds, "X", 2, &mut NoopStatus).await.unwrap();

        assert_eq!(vertices.addresses().collect::<Vec<_>>(), vec!["X", "Y", "Z"]);
        assert_eq!(graph.graph.edge_count(), 2);
        assert!(graph.edge_between("X", "Z").is_some());
        assert!(vertices.get("Y").unwrap().transactions.is_empty());
    }

    #[tokio::test]
    async fn test_explore_demo_fixtures() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/demos/fixtures.json");
        let ds = MockDataSource::from_file(path).unwrap();
        let origin = "bc1qorigin00000000000000000000000000000000";
        let exchange = "bc1qexchange000000000000000000000000000000";

        let (vertices, graph) = explore(&ds, origin, 3, &mut NoopStatus).await.unwrap();

        assert_eq!(vertices.len(), 4);
        let stats = graph.stats();
        assert_eq!(stats.total_edges, 3);
        assert_eq!(stats.bidirectional_edges, 1);

        let edge = graph.edge_between(exchange, origin).unwrap();
        assert_eq!(edge.source, origin);
        assert_eq!(edge.info.len(), 2);
        // the self-payment a3 stays on the vertex but never becomes an edge
        assert_eq!(vertices.get(origin).unwrap().transactions.len(), 3);
    }

    #[tokio::test]
    async fn test_explore_failure_reports_error_not_ready() {
        let ds = MockDataSource::new();
        let mut status = RecordingStatus::default();

        assert!(explore(&ds, "X", 2, &mut status).await.is_err());
        assert_eq!(status.phases, vec![Phase::Loading, Phase::Error]);
        assert_eq!(status.errors.len(), 1);
    }
}
