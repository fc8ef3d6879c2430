use std::fs::File;
use std::io::{self, BufWriter, Write};

use log::info;

#[cfg(feature = "serde1")]
use serde::Serialize;

use crate::error::{BogError, BogResult};
use crate::graph::{BestOverlapGraph, EdgeCandidate};
use crate::read::End;

pub const BEST_EDGES_HEADER: &str = "#readId\tbest5\tlength5\terate5\tbest3\tlength3\terate3\tsuspicious";
pub const BEST_CONTAINS_HEADER: &str = "#readId\tcontainer\tlength\terate";

fn write_edge<W: Write>(edge: &EdgeCandidate, stream: &mut W) -> io::Result<()> {
    if edge.is_none() {
        write!(stream, "-\t-\t-")
    } else {
        write!(
            stream,
            "{}\t{}\t{:.4}",
            edge.neighbor,
            edge.score.overlap_length(),
            edge.score.erate()
        )
    }
}

/// One line per read: both best edges and the suspicious flag.
pub fn write_best_edges<W: Write>(graph: &BestOverlapGraph, stream: &mut W) -> io::Result<()> {
    writeln!(stream, "{}", BEST_EDGES_HEADER)?;
    for id in graph.read_ids() {
        write!(stream, "{}\t", id)?;
        write_edge(&graph.best_edge_overlap(id, End::FivePrime), stream)?;
        write!(stream, "\t")?;
        write_edge(&graph.best_edge_overlap(id, End::ThreePrime), stream)?;
        let flag = if graph.is_suspicious(id) { "yes" } else { "no" };
        writeln!(stream, "\t{}", flag)?;
    }
    Ok(())
}

/// One line per contained read.
pub fn write_best_contains<W: Write>(graph: &BestOverlapGraph, stream: &mut W) -> io::Result<()> {
    writeln!(stream, "{}", BEST_CONTAINS_HEADER)?;
    for id in graph.read_ids() {
        let cont = graph.best_container(id);
        if !cont.is_contained {
            continue;
        }
        writeln!(
            stream,
            "{}\t{}\t{}\t{:.4}",
            id,
            cont.container,
            cont.score.overlap_length(),
            cont.score.erate()
        )?;
    }
    Ok(())
}

pub fn best_edges_string(graph: &BestOverlapGraph) -> String {
    let mut buf = Vec::new();
    // writing to a Vec can't fail
    let _ = write_best_edges(graph, &mut buf);
    String::from_utf8_lossy(&buf).into_owned()
}

fn write_file<F>(path: &str, write: F) -> BogResult<()>
where
    F: FnOnce(&mut BufWriter<File>) -> io::Result<()>,
{
    let mut out = BufWriter::new(File::create(path)?);
    write(&mut out)?;
    out.flush()?;
    info!("wrote {}", path);
    Ok(())
}

impl BestOverlapGraph {
    /// Write `<prefix>.best.edges` and `<prefix>.best.contains` using
    /// the configured prefix.
    pub fn report_best_edges(&self) -> BogResult<()> {
        let prefix = self.config().prefix.as_deref().ok_or_else(|| {
            BogError::invalid_parameter("prefix", "no output prefix configured")
        })?;

        write_file(&format!("{}.best.edges", prefix), |w| {
            write_best_edges(self, w)
        })?;
        write_file(&format!("{}.best.contains", prefix), |w| {
            write_best_contains(self, w)
        })
    }
}

#[cfg(feature = "serde1")]
#[derive(Debug, Serialize)]
struct BestEdgesRow {
    read: crate::read::ReadId,
    best5: EdgeCandidate,
    best3: EdgeCandidate,
    container: crate::graph::ContainmentCandidate,
    suspicious: bool,
}

/// The same information as the text reports, one JSON object per
/// line.
#[cfg(feature = "serde1")]
pub fn write_best_edges_json<W: Write>(graph: &BestOverlapGraph, stream: &mut W) -> io::Result<()> {
    for read in graph.read_ids() {
        let row = BestEdgesRow {
            read,
            best5: graph.best_edge_overlap(read, End::FivePrime),
            best3: graph.best_edge_overlap(read, End::ThreePrime),
            container: graph.best_container(read),
            suspicious: graph.is_suspicious(read),
        };
        serde_json::to_writer(&mut *stream, &row)?;
        writeln!(stream)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BogConfig;
    use crate::overlap::OverlapRecord;
    use crate::read::{ReadEnd, ReadId};

    fn small_graph() -> BestOverlapGraph {
        let overlaps = vec![
            OverlapRecord::dovetail(ReadEnd::three_prime(1), ReadEnd::five_prime(2), 120, 0.01),
            OverlapRecord::containment(2, 3, 40, 0.0),
        ];
        let conf = BogConfig::new(3, 0.02, f64::INFINITY).without_cleanup();
        BestOverlapGraph::new(conf, overlaps).unwrap()
    }

    #[test]
    fn print_best_edges() {
        let text = best_edges_string(&small_graph());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            vec![
                BEST_EDGES_HEADER,
                "1\t-\t-\t-\t2:5'\t120\t0.0100\tno",
                "2\t1:3'\t120\t0.0100\t-\t-\t-\tno",
                "3\t-\t-\t-\t-\t-\t-\tno",
            ],
            lines
        );
    }

    #[test]
    fn print_best_contains() {
        let mut buf = Vec::new();
        write_best_contains(&small_graph(), &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(format!("{}\n3\t2\t40\t0.0000\n", BEST_CONTAINS_HEADER), text);
    }

    #[test]
    fn report_needs_a_prefix() {
        let g = small_graph();
        assert!(matches!(
            g.report_best_edges(),
            Err(BogError::InvalidParameter { parameter: "prefix", .. })
        ));
    }

    #[test]
    fn report_files() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("run");
        let prefix = prefix.to_str().unwrap().to_string();

        let overlaps = vec![OverlapRecord::containment(2, 3, 40, 0.0)];
        let conf = BogConfig::new(3, 0.02, f64::INFINITY).with_prefix(prefix.clone());
        let g = BestOverlapGraph::new(conf, overlaps).unwrap();
        g.report_best_edges().unwrap();

        let edges = std::fs::read_to_string(format!("{}.best.edges", prefix)).unwrap();
        assert_eq!(4, edges.lines().count());
        let contains = std::fs::read_to_string(format!("{}.best.contains", prefix)).unwrap();
        assert!(contains.lines().any(|l| l.starts_with("3\t2\t")));
        assert!(g.is_contained(ReadId(3)));
    }

    #[cfg(feature = "serde1")]
    #[test]
    fn json_rows() {
        let mut buf = Vec::new();
        write_best_edges_json(&small_graph(), &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let rows: Vec<serde_json::Value> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(3, rows.len());
        assert_eq!(true, rows[2]["container"]["is_contained"]);
        assert_eq!(false, rows[0]["suspicious"]);
    }
}
