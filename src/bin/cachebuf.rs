//! cachebuf soak tool
//!
//! Drives many regions concurrently through create → fill → grow → verify →
//! close, to check a backend on a given filesystem and kernel.

use cachebuf::{BufferCreator, Config};
use clap::{Parser, ValueEnum};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum BackendArg {
    Heap,
    Mmap,
}

/// cachebuf soak tool
#[derive(Parser, Debug)]
#[command(name = "cachebuf")]
#[command(about = "Exercise growable cache buffers")]
#[command(version)]
struct Args {
    /// Buffer backend
    #[arg(short, long, value_enum, default_value = "mmap")]
    backend: BackendArg,

    /// Directory for mapped region files
    #[arg(short, long, default_value = "./cachebuf_data")]
    dir: String,

    /// Number of regions, one thread each
    #[arg(short, long, default_value = "16")]
    regions: usize,

    /// Initial region size in KB
    #[arg(short, long, default_value = "64")]
    initial_kb: usize,

    /// Number of doublings per region
    #[arg(long, default_value = "4")]
    rounds: u32,

    /// Hard maximum region size in MB
    #[arg(short = 'm', long)]
    max_mb: Option<usize>,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,cachebuf=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("cachebuf v{}", cachebuf::VERSION);
    tracing::info!("Backend: {:?}", args.backend);

    let mut builder = Config::builder().initial_size(args.initial_kb * 1024);
    builder = match args.backend {
        BackendArg::Heap => builder.heap(),
        BackendArg::Mmap => {
            tracing::info!("Region directory: {}", args.dir);
            builder.mapped_dir(&args.dir)
        }
    };
    if let Some(mb) = args.max_mb {
        builder = builder.max_region_size(mb * 1024 * 1024);
    }
    let config = builder.build();

    let creator = match config.creator() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Failed to set up creator: {}", e);
            std::process::exit(1);
        }
    };

    let failures = run(&*creator, &config, &args);

    if failures > 0 {
        tracing::error!("{} of {} regions failed", failures, args.regions);
        std::process::exit(1);
    }

    tracing::info!("All {} regions verified", args.regions);
}

/// Run every region on its own scoped thread; returns the number of failures
fn run(creator: &dyn BufferCreator, config: &Config, args: &Args) -> usize {
    let result = crossbeam::scope(|scope| {
        let handles: Vec<_> = (0..args.regions)
            .map(|id| {
                scope.spawn(move |_| match soak_region(creator, config, args.rounds, id) {
                    Ok((expected, actual)) if expected == actual => true,
                    Ok((expected, actual)) => {
                        tracing::warn!(
                            "Region {} checksum mismatch: expected {:08x}, got {:08x}",
                            id,
                            expected,
                            actual
                        );
                        false
                    }
                    Err(e) => {
                        tracing::warn!("Region {} failed: {}", id, e);
                        false
                    }
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join())
            .filter(|verified| !matches!(verified, Ok(true)))
            .count()
    });

    result.unwrap_or(args.regions)
}

/// Fill a region, double it `rounds` times and check the live bytes survive
///
/// Returns the checksum of the first fill and of the same range after growth.
fn soak_region(
    creator: &dyn BufferCreator,
    config: &Config,
    rounds: u32,
    id: usize,
) -> cachebuf::Result<(u32, u32)> {
    let mut buffer = creator.create(config.initial_size)?;
    let mut live = fill(buffer.bytes_mut(), id);
    let checked = live;
    let expected = crc32fast::hash(&buffer.bytes()[..checked]);

    for round in 0..rounds {
        let mut target = buffer.len() * 2;
        if let Some(max) = config.max_region_size {
            target = target.min(max);
        }
        if target <= buffer.len() {
            tracing::debug!("Region {} reached its limit after {} rounds", id, round);
            break;
        }

        let mut grown = buffer.enlarge(target)?;
        let preserved = grown.is_preserved();
        let next = grown.migrate(0..live)?;
        live += fill(&mut next[live..], id);

        tracing::trace!("Region {} round {}: {} bytes (preserved: {})", id, round, next.len(), preserved);
    }

    let actual = crc32fast::hash(&buffer.bytes()[..checked]);
    buffer.close()?;

    tracing::debug!("Region {} done ({} live bytes)", id, live);
    Ok((expected, actual))
}

/// Write a pattern derived from `seed` over the whole slice
fn fill(bytes: &mut [u8], seed: usize) -> usize {
    for (i, b) in bytes.iter_mut().enumerate() {
        *b = (i.wrapping_mul(31) ^ seed) as u8;
    }
    bytes.len()
}
