use std::error::Error;
use std::fs;
use std::path::PathBuf;

use clap::Parser;
use glam::{IVec2, Vec2};
use tracing_subscriber::EnvFilter;

use terrain::backend::NullBackend;
use terrain::config::{DEFAULT_SEED, LevelConfig};
use terrain::follow::{FollowStatus, PathFollower};
use terrain::geometry::{Bounds, crosses_cell_boundary};
use terrain::manager::{ChunkManager, TickReport};
use terrain::samples::sample_library;
use terrain::streaming::StreamingPolicy;
use terrain::template::TemplateLibrary;

/// Streams a level headlessly while a camera walks its paths from chunk to
/// chunk.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Level seed
    #[arg(short, long, default_value_t = DEFAULT_SEED)]
    seed: u64,

    /// Number of simulation ticks to run
    #[arg(short, long, default_value_t = 300)]
    ticks: usize,

    /// Seconds per tick
    #[arg(long, default_value_t = 0.1)]
    dt: f32,

    /// Camera speed along paths, in world units per second
    #[arg(long, default_value_t = 8.0)]
    speed: f32,

    /// Half extent of the square view around the camera
    #[arg(long, default_value_t = 16.0)]
    view: f32,

    /// Extra world units streamed beyond the view on every side
    #[arg(long, default_value_t = 4.0)]
    margin: f32,

    /// World size of one tile
    #[arg(long, default_value_t = 1.0)]
    cell_size: f32,

    /// Maximum chunk distance from the start chunk; unbounded if omitted
    #[arg(short, long)]
    limit: Option<i32>,

    /// Mirror chunks across the start column
    #[arg(long)]
    symmetrical: bool,

    /// Destroy chunks this many chunks away from every visible one
    #[arg(long)]
    unload: Option<i32>,

    /// Load templates from a postcard file instead of the built-in samples
    #[arg(long)]
    templates: Option<PathBuf>,

    /// Write the template library as postcard to this path and continue
    #[arg(long)]
    export_templates: Option<PathBuf>,
}

#[derive(Debug, Default)]
struct Totals {
    generated: usize,
    destroyed: usize,
    failed: usize,
    chunks_walked: usize,
    stream_ticks: usize,
}

impl Totals {
    fn record(&mut self, report: &TickReport) {
        self.generated += report.generated.len();
        self.destroyed += report.destroyed.len();
        self.failed += report.failed.len();
        self.stream_ticks += 1;
    }
}

fn load_library(args: &Args) -> Result<TemplateLibrary, Box<dyn Error>> {
    let library = match &args.templates {
        Some(path) => TemplateLibrary::from_bytes(&fs::read(path)?)?,
        None => sample_library()?,
    };
    if let Some(path) = &args.export_templates {
        fs::write(path, library.to_bytes()?)?;
        tracing::info!("wrote {} templates to {}", library.len(), path.display());
    }
    Ok(library)
}

/// Where the camera goes once it reaches the end of its path: the neighbour
/// behind the followed exit, if that neighbour can ever exist.
enum NextChunk {
    Ready(IVec2),
    Pending,
    EdgeOfLevel,
}

fn next_chunk(mgr: &ChunkManager<NullBackend>, follower: &PathFollower) -> NextChunk {
    let handle = follower.handle();
    let Some(exit) = mgr
        .registry()
        .get(handle.grid)
        .ok()
        .and_then(|chunk| chunk.exits().get(handle.exit))
    else {
        return NextChunk::EdgeOfLevel;
    };
    if mgr.registry().contains(exit.neighbour_grid) {
        NextChunk::Ready(exit.neighbour_grid)
    } else if mgr.policy().within_limit(exit) {
        NextChunk::Pending
    } else {
        NextChunk::EdgeOfLevel
    }
}

fn run(args: &Args) -> Result<Totals, Box<dyn Error>> {
    let config = LevelConfig {
        seed: args.seed,
        cell_size: Vec2::splat(args.cell_size),
        policy: StreamingPolicy {
            generation_limit: args.limit,
            symmetrical: args.symmetrical,
            unload_distance: args.unload,
            ..StreamingPolicy::default()
        },
        ..LevelConfig::default()
    };
    let library = load_library(args)?;
    let mut mgr = ChunkManager::new(&config, library, NullBackend);

    let start = mgr.start(Vec2::ZERO)?;
    let mut position = mgr.registry().get(start)?.entrance();
    let half_view = Vec2::splat(args.view);
    let margin = Vec2::splat(args.margin);
    let stream_view = |at: Vec2| Bounds::around(at, half_view).expanded(margin);
    let cell = mgr.cell_size();
    let mut totals = Totals::default();

    let report = mgr.tick(&stream_view(position));
    totals.record(&report);
    let mut retry = !report.failed.is_empty();
    let mut streamed_at = position;
    let mut follower = PathFollower::attach(mgr.registry(), start, position, args.speed)?;

    for tick in 0..args.ticks {
        let update = follower.advance(args.dt, mgr.registry());
        if let Some(p) = update.position {
            position = p;
        }
        let mut waiting = false;
        match update.status {
            FollowStatus::Following => {}
            FollowStatus::Arrived => match next_chunk(&mgr, &follower) {
                NextChunk::Ready(grid) => {
                    follower = PathFollower::attach(mgr.registry(), grid, position, args.speed)?;
                    totals.chunks_walked += 1;
                    tracing::debug!("tick {tick}: entered chunk {grid}");
                }
                NextChunk::Pending => waiting = true,
                NextChunk::EdgeOfLevel => {
                    tracing::info!("tick {tick}: reached the edge of the level at {position}");
                    break;
                }
            },
            FollowStatus::Detached => {
                let Some(grid) = mgr.registry().chunk_at(position).map(|c| c.grid()) else {
                    tracing::warn!("tick {tick}: camera lost its chunk at {position}");
                    break;
                };
                follower = PathFollower::attach(mgr.registry(), grid, position, args.speed)?;
            }
        }

        // Streaming only changes once the camera enters another cell.
        if waiting || retry || crosses_cell_boundary(streamed_at, position, cell) {
            let report = mgr.tick(&stream_view(position));
            totals.record(&report);
            retry = !report.failed.is_empty();
            streamed_at = position;
        }
    }

    tracing::info!(
        "{} chunks live, camera at {position} in chunk {}",
        mgr.registry().len(),
        follower.handle().grid
    );
    Ok(totals)
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    tracing::info!(
        "walking level: seed={}, limit={:?}, symmetrical={}",
        args.seed,
        args.limit,
        args.symmetrical
    );

    let totals = run(&args)?;
    tracing::info!(
        "done: {} generated, {} destroyed, {} failed, {} chunks walked, {} streaming ticks",
        totals.generated,
        totals.destroyed,
        totals.failed,
        totals.chunks_walked,
        totals.stream_ticks
    );
    Ok(())
}
