use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use env_logger::Env;
use log::info;

use bog::config::BogConfig;
use bog::graph::BestOverlapGraph;
use bog::mmap::{load_read_lengths, MmapOverlaps};

/// Pick the best overlap on each read end and clean up the resulting
/// graph.
#[derive(Parser, Debug)]
#[command(name = "bog", version)]
struct Args {
    /// Read length table, one `iid length` per line
    reads: PathBuf,

    /// Overlap dump, one `aIID bIID aHang bHang orient pctError` per line
    overlaps: PathBuf,

    /// Maximum error rate of a usable overlap, as a fraction
    #[arg(short = 'e', long, default_value_t = 0.015)]
    erate: f64,

    /// Maximum expected number of mismatches of a usable overlap
    #[arg(short = 'E', long)]
    elimit: Option<f64>,

    /// Write `<prefix>.best.edges` and `<prefix>.best.contains`
    #[arg(short = 'o', long)]
    prefix: Option<String>,

    /// Clear best edges scoring below this many aligned bases
    #[arg(long)]
    remove_weak: Option<f64>,

    /// Only consider the N best candidates of each read end
    #[arg(long)]
    top_n: Option<usize>,

    /// Don't flag suspicious reads
    #[arg(long)]
    no_suspicious: bool,

    /// Don't remove spurs
    #[arg(long)]
    no_spurs: bool,

    /// Don't repair best edges that aren't returned
    #[arg(long)]
    no_false_best: bool,
}

impl Args {
    fn config(&self, num_reads: u32) -> BogConfig {
        let mut conf = BogConfig::new(
            num_reads,
            self.erate,
            self.elimit.unwrap_or(f64::INFINITY),
        )
        .with_remove_suspicious(!self.no_suspicious)
        .with_remove_spurs(!self.no_spurs)
        .with_remove_false_best(!self.no_false_best);

        if let Some(threshold) = self.remove_weak {
            conf = conf.with_remove_weak(threshold);
        }
        if let Some(n) = self.top_n {
            conf = conf.with_top_n(n);
        }
        if let Some(prefix) = &self.prefix {
            conf = conf.with_prefix(prefix.clone());
        }
        conf
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let lengths = load_read_lengths(&args.reads)?;
    info!("{} reads in {}", lengths.num_reads(), args.reads.display());

    let overlaps = MmapOverlaps::open(&args.overlaps)?;
    let graph = BestOverlapGraph::new(args.config(lengths.num_reads()), overlaps.records(&lengths))?;

    let contained = graph
        .read_ids()
        .into_iter()
        .filter(|&id| graph.is_contained(id))
        .count();
    info!(
        "{} contained reads, {} suspicious reads, {} best edges not returned",
        contained,
        graph.suspicious_reads().count(),
        graph.asymmetric_edges().len()
    );

    if graph.config().prefix.is_some() {
        graph.report_best_edges()?;
    }

    Ok(())
}
