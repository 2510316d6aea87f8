//! Output formatting module
//!
//! This module renders a traced graph in the supported output formats and
//! reads/writes exported vertex maps.

use crate::flow_graph::graph::short_address;
use crate::flow_graph::{FlowGraph, VertexMap};
use crate::{Error, Result};
use std::io::Write;
use std::path::Path;

/// Output the renderer graph model as JSON
pub fn output_json(w: &mut impl std::io::Write, graph: &FlowGraph) -> Result<()> {
    serde_json::to_writer_pretty(&mut *w, &graph.model())?;
    writeln!(w)?;
    Ok(())
}

/// Output the vertex map as JSON keyed by address
pub fn output_export(w: &mut impl std::io::Write, vertices: &VertexMap) -> Result<()> {
    serde_json::to_writer_pretty(&mut *w, vertices)?;
    writeln!(w)?;
    Ok(())
}

/// Output the graph in DOT format
pub fn output_dot(w: &mut impl std::io::Write, graph: &FlowGraph) -> Result<()> {
    write!(w, "{}", graph.to_dot())?;
    Ok(())
}

/// Output addresses and edges as a text table
pub fn output_table(
    w: &mut impl std::io::Write,
    vertices: &VertexMap,
    graph: &FlowGraph,
) -> Result<()> {
    let stats = graph.stats();

    writeln!(w, "Wallet Flow Visualization - Trace Results")?;
    writeln!(w, "{}", "=".repeat(80))?;
    writeln!(w)?;

    writeln!(w, "Summary:")?;
    writeln!(w, "  Addresses:              {}", stats.total_addresses)?;
    writeln!(w, "  Explored transactions:  {}", vertices.transaction_count())?;
    writeln!(w, "  Edges:                  {}", stats.total_edges)?;
    writeln!(w, "  Bidirectional edges:    {}", stats.bidirectional_edges)?;
    writeln!(w)?;

    if !vertices.is_empty() {
        writeln!(w, "Addresses:")?;
        writeln!(w, "{:-<80}", "")?;
        writeln!(
            w,
            "{:<20} {:>16} {:>10} {:>10}",
            "Address", "Balance", "Txs", "Explored"
        )?;
        writeln!(w, "{:-<80}", "")?;

        for (address, record) in vertices.iter() {
            let balance = record
                .balance
                .map(|b| b.0.to_string())
                .unwrap_or_else(|| "-".to_string());
            writeln!(
                w,
                "{:<20} {:>16} {:>10} {:>10}",
                short_address(address),
                balance,
                record.txs,
                record.transactions.len()
            )?;
        }
        writeln!(w)?;
    }

    let edges = graph.edges();
    if !edges.is_empty() {
        writeln!(w, "Flows:")?;
        writeln!(w, "{:-<80}", "")?;
        writeln!(w, "{:<20} {:^4} {:<20} {:>8}", "From", "", "To", "Txs")?;
        writeln!(w, "{:-<80}", "")?;

        for edge in edges {
            let arrow = if edge.bidirectional { "<->" } else { "->" };
            writeln!(
                w,
                "{:<20} {:^4} {:<20} {:>8}",
                short_address(&edge.source),
                arrow,
                short_address(&edge.target),
                edge.info.len()
            )?;
        }
        writeln!(w)?;
    }

    Ok(())
}

/// Default export file name for an origin address
pub fn export_file_name(origin: &str) -> String {
    format!("track_{}.json", origin)
}

/// Write the vertex map to `path`
pub fn write_export(path: &Path, vertices: &VertexMap) -> Result<()> {
    let mut file = std::io::BufWriter::new(std::fs::File::create(path)?);
    output_export(&mut file, vertices)?;
    file.flush()?;
    tracing::info!("Exported {} addresses to {:?}", vertices.len(), path);
    Ok(())
}

/// Read a vertex map written by `write_export`
pub fn read_export(path: &Path) -> Result<VertexMap> {
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents)
        .map_err(|e| Error::parser(format!("Failed to parse export {:?}: {}", path, e)))
}
