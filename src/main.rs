//! Strata fly-through demo: streams a noise surface around a camera moving
//! along +X and renders it into a counting backend.
//!
//! Usage: cargo run --release -- [OPTIONS]
//!
//! Options:
//!   --frames <N>      Frames to simulate (default: 600)
//!   --config <PATH>   Render config JSON (default: built-in defaults)
//!   --speed <B/S>     Camera speed in blocks per second (default: 40)
//!   --headless        Use the headless renderer

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use strata::core::camera::{Camera, PerspectiveCamera};
use strata::core::config::RenderConfig;
use strata::core::logging;
use strata::core::types::{DVec3, IVec3, Result};
use strata::generation::{SurfaceGenerator, SurfaceParams};
use strata::math::Region3i;
use strata::render::{ChunkDraw, ChunkDrawBackend, PassDescriptor, WorldRenderer, create_world_renderer};
use strata::world::{Chunk, ChunkCoord, ChunkEvent, ChunkMesh, ChunkStore, MemoryWorld, RenderPhase};

const FRAME_TIME: f32 = 1.0 / 60.0;
/// Chunks generated per frame
const GENERATION_BUDGET: usize = 24;

/// Backend that only counts what it is asked to draw
#[derive(Default)]
struct CountingBackend {
    passes: u64,
    draws: u64,
}

impl ChunkDrawBackend for CountingBackend {
    fn begin_pass(&mut self, _pass: &PassDescriptor) {
        self.passes += 1;
    }

    fn draw_chunk(&mut self, _draw: &ChunkDraw<'_>) {
        self.draws += 1;
    }

    fn end_pass(&mut self, _pass: &PassDescriptor) {}
}

/// Produces chunk meshes from the surface generator and feeds the providers
struct SurfaceStreamer {
    generator: SurfaceGenerator,
    store: Arc<Mutex<ChunkStore>>,
    world: Arc<Mutex<MemoryWorld>>,
    generated: HashSet<ChunkCoord>,
    next_buffer_id: u64,
}

impl SurfaceStreamer {
    /// Generate up to the frame budget of missing chunks in `region`, nearest
    /// to `center` first, and unload those that left the keep region
    fn stream(&mut self, center: ChunkCoord, region: Region3i, keep: Region3i) -> Result<usize> {
        let (min_y, max_y) = self.generator.surface_chunk_range();

        let mut wanted: Vec<ChunkCoord> = region
            .iter()
            .map(ChunkCoord::from)
            .filter(|c| c.y >= min_y && c.y <= max_y && !self.generated.contains(c))
            .collect();
        wanted.sort_by_key(|c| (c.x - center.x).pow(2) + (c.z - center.z).pow(2));

        let mut produced = 0;
        for coord in wanted.into_iter().take(GENERATION_BUDGET) {
            let chunk = self.build_chunk(coord)?;
            self.store.lock().unwrap_or_else(PoisonError::into_inner).stage(chunk);
            self.world.lock().unwrap_or_else(PoisonError::into_inner).mark_ready(coord);
            self.generated.insert(coord);
            produced += 1;
        }

        let stale: Vec<ChunkCoord> = self
            .generated
            .iter()
            .copied()
            .filter(|c| !keep.encompasses(c.as_ivec3()))
            .collect();
        if !stale.is_empty() {
            let mut store = self.store.lock().unwrap_or_else(PoisonError::into_inner);
            let mut world = self.world.lock().unwrap_or_else(PoisonError::into_inner);
            for coord in stale {
                store.request_unload(coord);
                world.mark_not_ready(coord);
                self.generated.remove(&coord);
            }
        }

        Ok(produced)
    }

    fn build_chunk(&mut self, coord: ChunkCoord) -> Result<Chunk> {
        let blocks = self.generator.surface_blocks_in_chunk(coord)? as u32;
        let mut mesh = ChunkMesh::new();
        if blocks > 0 {
            // Two triangles per exposed top face, a quad of foliage every
            // eighth column
            mesh = mesh
                .with_phase(RenderPhase::Opaque, self.next_buffer_id, blocks * 2)
                .with_phase(RenderPhase::AlphaReject, self.next_buffer_id + 1, blocks / 8 * 2);
            self.next_buffer_id += 2;
        }
        Ok(Chunk::with_mesh(coord, mesh))
    }
}

fn main() {
    logging::init();

    if let Err(e) = run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let frames = parse_u64_arg(&args, "--frames").unwrap_or(600);
    let speed = parse_f64_arg(&args, "--speed").unwrap_or(40.0);
    let headless = args.iter().any(|a| a == "--headless");
    let config = match parse_path_arg(&args, "--config") {
        Some(path) => {
            log::info!("Loading render config from {}", path.display());
            RenderConfig::load(&path)?
        }
        None => RenderConfig::default(),
    };
    config.validate()?;

    let view = config.view_distance.chunk_distance();
    let capacity = (view.x * view.y * view.z) as usize * 2;
    let store = Arc::new(Mutex::new(ChunkStore::new(capacity)));
    let world = Arc::new(Mutex::new(MemoryWorld::new()));

    let params = SurfaceParams::default();
    let generator = SurfaceGenerator::new(params);
    let start = DVec3::new(0.0, (generator.height_at(0, 0) + 24) as f64, 0.0);
    let mut camera = PerspectiveCamera::new(start, 70.0, 16.0 / 9.0);
    camera.set_rotation_euler(-std::f32::consts::FRAC_PI_2, -0.3);

    log::info!(
        "Strata demo: {} frames, view distance {}, speed {} blocks/s{}",
        frames,
        view,
        speed,
        if headless { ", headless" } else { "" }
    );

    let mut streamer = SurfaceStreamer {
        generator,
        store: Arc::clone(&store),
        world: Arc::clone(&world),
        generated: HashSet::new(),
        next_buffer_id: 1,
    };

    let rounding = config.chunk_rounding;
    let mut renderer: Box<dyn WorldRenderer> = create_world_renderer(
        headless,
        config,
        Box::new(Arc::clone(&store)),
        Box::new(Arc::clone(&world)),
        Box::new(camera),
    );
    let mut backend = CountingBackend::default();
    let started = Instant::now();

    for frame in 0..frames {
        let position = renderer.active_camera().position();
        let center = ChunkCoord::from_world_pos(position, rounding);
        let region = Region3i::from_center_extents(center.as_ivec3(), view / 2);
        streamer.stream(center, region, region.expand(IVec3::ONE, IVec3::ONE))?;

        renderer.update(FRAME_TIME);

        let events = store.lock().unwrap_or_else(PoisonError::into_inner).drain_events();
        for event in events {
            match event {
                ChunkEvent::Loaded(coord) => renderer.on_chunk_loaded(coord),
                ChunkEvent::Unloaded(coord) => renderer.on_chunk_unloaded(coord),
            }
        }

        renderer.render(&mut backend);

        let next = position + DVec3::X * speed * FRAME_TIME as f64;
        renderer.active_camera_mut().set_position(next);

        if frame % 60 == 0 {
            log::info!(
                "Frame {}: camera at {:?}, {} chunks in proximity, light {:.2}",
                frame,
                center,
                renderer.chunks_in_proximity().len(),
                renderer.time_smoothed_main_light_intensity()
            );
            log::debug!("{}", renderer.metrics());
        }
    }

    let elapsed = started.elapsed();
    log::info!(
        "Done: {} frames in {:.2}s, {} passes, {} chunk draws, {} resident",
        frames,
        elapsed.as_secs_f64(),
        backend.passes,
        backend.draws,
        store.lock().unwrap_or_else(PoisonError::into_inner).len()
    );
    println!("{}", serde_json::to_string_pretty(renderer.statistics())?);

    renderer.dispose();
    Ok(())
}

fn parse_u64_arg(args: &[String], flag: &str) -> Option<u64> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
}

fn parse_f64_arg(args: &[String], flag: &str) -> Option<f64> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
}

fn parse_path_arg(args: &[String], flag: &str) -> Option<PathBuf> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(PathBuf::from)
}
