//! The world renderer facade: per-frame update of world state and
//! visibility, the three chunk passes, and light queries.
//!
//! Two implementations sit behind [`WorldRenderer`]: [`ChunkWorldRenderer`]
//! draws through a [`ChunkDrawBackend`], [`HeadlessWorldRenderer`] keeps the
//! world ticking for servers without drawing anything.

use crate::core::camera::{Camera, NullCamera};
use crate::core::config::{RenderConfig, ViewDistance};
use crate::core::types::{DVec3, IVec3};
use crate::render::drain::{ChunkDrawBackend, RenderPass, render_pass};
use crate::render::queues::RenderQueues;
use crate::render::stats::{RenderStatistics, StatisticsSink};
use crate::world::chunk::ChunkCoord;
use crate::world::provider::{ChunkProvider, MAX_LIGHT, WorldProvider};
use crate::world::proximity::{ChunkVisibilitySet, ProximitySnapshot};

/// Facade the rest of the engine drives the renderer through
pub trait WorldRenderer {
    /// Advance world state and the proximity set by one frame
    fn update(&mut self, delta: f32);

    /// Draw the chunks in proximity
    fn render(&mut self, backend: &mut dyn ChunkDrawBackend);

    fn active_camera(&self) -> &dyn Camera;

    fn active_camera_mut(&mut self) -> &mut dyn Camera;

    fn statistics(&self) -> &RenderStatistics;

    fn increase_triangle_count(&mut self, increase: u32);

    fn increase_not_ready_chunk_count(&mut self, increase: u32);

    fn set_view_distance(&mut self, view_distance: ViewDistance);

    /// Force the proximity set up to date. Returns true once every chunk in
    /// the view region is resident and ready.
    fn pregenerate_chunks(&mut self) -> bool;

    fn on_chunk_loaded(&mut self, coord: ChunkCoord);

    fn on_chunk_unloaded(&mut self, coord: ChunkCoord);

    /// Sunlight contribution at a world position, `0.0..=1.0`
    fn main_light_intensity_at(&self, pos: DVec3) -> f32;

    /// Block light contribution at a world position, `0.0..=1.0`
    fn block_light_intensity_at(&self, pos: DVec3) -> f32;

    /// Brighter of main and block light
    fn rendering_light_intensity_at(&self, pos: DVec3) -> f32;

    /// Main light at the camera, smoothed over time
    fn time_smoothed_main_light_intensity(&self) -> f32;

    fn seconds_since_last_frame(&self) -> f32;

    /// Chunks in proximity as of the last update
    fn chunks_in_proximity(&self) -> ProximitySnapshot;

    /// Debug overlay text
    fn metrics(&self) -> String;

    /// Release the world provider. Later calls do nothing.
    fn dispose(&mut self);
}

/// Build the renderer the engine was started with
pub fn create_world_renderer(
    headless: bool,
    config: RenderConfig,
    chunks: Box<dyn ChunkProvider>,
    world: Box<dyn WorldProvider>,
    camera: Box<dyn Camera>,
) -> Box<dyn WorldRenderer> {
    if headless {
        log::info!("Creating headless world renderer");
        Box::new(HeadlessWorldRenderer::new(config, chunks, world, camera.position()))
    } else {
        log::info!("Creating world renderer, view distance {:?}", config.view_distance);
        Box::new(ChunkWorldRenderer::new(config, chunks, world, camera))
    }
}

/// World-side state both renderers share
struct WorldState {
    chunks: Box<dyn ChunkProvider>,
    world: Box<dyn WorldProvider>,
    visibility: ChunkVisibilitySet,
    config: RenderConfig,
    disposed: bool,
}

impl WorldState {
    fn new(config: RenderConfig, chunks: Box<dyn ChunkProvider>, world: Box<dyn WorldProvider>) -> Self {
        Self {
            chunks,
            world,
            visibility: ChunkVisibilitySet::from_config(&config),
            config,
            disposed: false,
        }
    }

    /// Propagation, chunk cache cycle, then proximity
    fn update(&mut self, viewpoint: DVec3) -> bool {
        self.world.process_propagation();

        self.chunks.complete_update();
        self.chunks.begin_update();

        self.visibility
            .update_chunks_in_proximity(false, viewpoint, self.chunks.as_ref(), self.world.as_ref())
    }

    fn pregenerate(&mut self, viewpoint: DVec3) -> bool {
        self.chunks.complete_update();
        self.chunks.begin_update();
        self.visibility
            .update_chunks_in_proximity(true, viewpoint, self.chunks.as_ref(), self.world.as_ref());
        !self.visibility.is_pending()
    }

    fn set_view_distance(&mut self, view_distance: ViewDistance) {
        self.config.view_distance = view_distance;
        self.visibility.set_view_distance(view_distance.chunk_distance());
    }

    fn dispose(&mut self) {
        if self.disposed {
            log::debug!("World renderer already disposed");
            return;
        }
        self.world.dispose();
        self.disposed = true;
        log::info!("World renderer disposed");
    }
}

fn block_pos(pos: DVec3) -> IVec3 {
    pos.floor().as_ivec3()
}

/// Renderer that draws chunks through a backend
pub struct ChunkWorldRenderer {
    state: WorldState,
    camera: Box<dyn Camera>,
    queues: RenderQueues,
    statistics: RenderStatistics,
    smoothed_main_light: f32,
    seconds_since_last_frame: f32,
    first_update: bool,
}

impl ChunkWorldRenderer {
    pub fn new(
        config: RenderConfig,
        chunks: Box<dyn ChunkProvider>,
        world: Box<dyn WorldProvider>,
        camera: Box<dyn Camera>,
    ) -> Self {
        Self {
            state: WorldState::new(config, chunks, world),
            camera,
            queues: RenderQueues::new(),
            statistics: RenderStatistics::default(),
            smoothed_main_light: 0.0,
            seconds_since_last_frame: 0.0,
            first_update: true,
        }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.state.config
    }

    pub fn is_disposed(&self) -> bool {
        self.state.disposed
    }

    fn update_smoothed_light(&mut self, delta: f32) {
        let target = self.main_light_intensity_at(self.camera.position());
        if self.first_update {
            self.smoothed_main_light = target;
            return;
        }
        let blend = 1.0 - (-self.state.config.light_smoothing_rate * delta.max(0.0)).exp();
        self.smoothed_main_light += (target - self.smoothed_main_light) * blend;
    }
}

impl WorldRenderer for ChunkWorldRenderer {
    fn update(&mut self, delta: f32) {
        if self.state.disposed {
            return;
        }
        self.seconds_since_last_frame += delta;

        self.state.update(self.camera.position());
        self.statistics.chunks_in_proximity = self.state.visibility.len() as u32;

        self.update_smoothed_light(delta);
        self.first_update = false;
    }

    fn render(&mut self, backend: &mut dyn ChunkDrawBackend) {
        if self.state.disposed {
            return;
        }
        self.statistics.begin_frame();

        let snapshot = self.state.visibility.snapshot();
        let frustum_culling = self.state.config.frustum_culling;
        self.statistics.chunks_culled = self.queues.fill(&snapshot, self.camera.as_ref(), frustum_culling);

        for pass in RenderPass::ALL {
            render_pass(
                pass,
                self.queues.queue_mut(pass),
                self.camera.as_mut(),
                backend,
                &mut self.statistics,
            );
        }

        self.seconds_since_last_frame = 0.0;
    }

    fn active_camera(&self) -> &dyn Camera {
        self.camera.as_ref()
    }

    fn active_camera_mut(&mut self) -> &mut dyn Camera {
        self.camera.as_mut()
    }

    fn statistics(&self) -> &RenderStatistics {
        &self.statistics
    }

    fn increase_triangle_count(&mut self, increase: u32) {
        self.statistics.increase_triangle_count(increase);
    }

    fn increase_not_ready_chunk_count(&mut self, increase: u32) {
        self.statistics.increase_not_ready_chunk_count(increase);
    }

    fn set_view_distance(&mut self, view_distance: ViewDistance) {
        self.state.set_view_distance(view_distance);
    }

    fn pregenerate_chunks(&mut self) -> bool {
        let position = self.camera.position();
        self.state.pregenerate(position)
    }

    fn on_chunk_loaded(&mut self, coord: ChunkCoord) {
        self.state.visibility.notify_chunk_loaded(coord);
    }

    fn on_chunk_unloaded(&mut self, coord: ChunkCoord) {
        self.state.visibility.notify_chunk_unloaded(coord);
    }

    fn main_light_intensity_at(&self, pos: DVec3) -> f32 {
        let sunlight = self.state.world.sunlight(block_pos(pos)) as f32 / MAX_LIGHT as f32;
        sunlight * self.state.world.daylight()
    }

    fn block_light_intensity_at(&self, pos: DVec3) -> f32 {
        self.state.world.light(block_pos(pos)) as f32 / MAX_LIGHT as f32
    }

    fn rendering_light_intensity_at(&self, pos: DVec3) -> f32 {
        self.main_light_intensity_at(pos).max(self.block_light_intensity_at(pos))
    }

    fn time_smoothed_main_light_intensity(&self) -> f32 {
        self.smoothed_main_light
    }

    fn seconds_since_last_frame(&self) -> f32 {
        self.seconds_since_last_frame
    }

    fn chunks_in_proximity(&self) -> ProximitySnapshot {
        self.state.visibility.snapshot()
    }

    fn metrics(&self) -> String {
        self.statistics.metrics()
    }

    fn dispose(&mut self) {
        self.state.dispose();
    }
}

/// Renderer for servers: keeps world state and proximity current, never
/// draws, counts nothing and reports no light
pub struct HeadlessWorldRenderer {
    state: WorldState,
    camera: NullCamera,
    statistics: RenderStatistics,
}

impl HeadlessWorldRenderer {
    pub fn new(
        config: RenderConfig,
        chunks: Box<dyn ChunkProvider>,
        world: Box<dyn WorldProvider>,
        position: DVec3,
    ) -> Self {
        Self {
            state: WorldState::new(config, chunks, world),
            camera: NullCamera::new(position),
            statistics: RenderStatistics::default(),
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.state.disposed
    }
}

impl WorldRenderer for HeadlessWorldRenderer {
    fn update(&mut self, _delta: f32) {
        if self.state.disposed {
            return;
        }
        self.state.update(self.camera.position());
    }

    fn render(&mut self, _backend: &mut dyn ChunkDrawBackend) {}

    fn active_camera(&self) -> &dyn Camera {
        &self.camera
    }

    fn active_camera_mut(&mut self) -> &mut dyn Camera {
        &mut self.camera
    }

    fn statistics(&self) -> &RenderStatistics {
        &self.statistics
    }

    fn increase_triangle_count(&mut self, _increase: u32) {}

    fn increase_not_ready_chunk_count(&mut self, _increase: u32) {}

    fn set_view_distance(&mut self, view_distance: ViewDistance) {
        self.state.set_view_distance(view_distance);
    }

    fn pregenerate_chunks(&mut self) -> bool {
        false
    }

    fn on_chunk_loaded(&mut self, coord: ChunkCoord) {
        self.state.visibility.notify_chunk_loaded(coord);
    }

    fn on_chunk_unloaded(&mut self, coord: ChunkCoord) {
        self.state.visibility.notify_chunk_unloaded(coord);
    }

    fn main_light_intensity_at(&self, _pos: DVec3) -> f32 {
        0.0
    }

    fn block_light_intensity_at(&self, _pos: DVec3) -> f32 {
        0.0
    }

    fn rendering_light_intensity_at(&self, _pos: DVec3) -> f32 {
        0.0
    }

    fn time_smoothed_main_light_intensity(&self) -> f32 {
        0.0
    }

    fn seconds_since_last_frame(&self) -> f32 {
        0.0
    }

    fn chunks_in_proximity(&self) -> ProximitySnapshot {
        self.state.visibility.snapshot()
    }

    fn metrics(&self) -> String {
        String::new()
    }

    fn dispose(&mut self) {
        self.state.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ChunkRounding;
    use crate::render::drain::tests::RecordingBackend;
    use crate::world::chunk::{Chunk, ChunkMesh, RenderPhase};
    use crate::world::store::{ChunkEvent, ChunkStore, MemoryWorld};
    use std::sync::{Arc, Mutex};

    struct Fixture {
        store: Arc<Mutex<ChunkStore>>,
        world: Arc<Mutex<MemoryWorld>>,
    }

    impl Fixture {
        /// 3x1x3 region around chunk (0,0,0), all resident and ready
        fn new() -> Self {
            let store = Arc::new(Mutex::new(ChunkStore::new(64)));
            let world = Arc::new(Mutex::new(MemoryWorld::new()));
            for x in -1..=1 {
                for z in -1..=1 {
                    let coord = ChunkCoord::new(x, 0, z);
                    let mesh = ChunkMesh::new()
                        .with_phase(RenderPhase::Opaque, 1, 100)
                        .with_phase(RenderPhase::AlphaBlend, 2, 10);
                    store.lock().unwrap().stage(Chunk::with_mesh(coord, mesh));
                    world.lock().unwrap().mark_ready(coord);
                }
            }
            Self { store, world }
        }

        fn config() -> RenderConfig {
            RenderConfig {
                view_distance: ViewDistance::Custom { x: 3, y: 1, z: 3 },
                chunk_rounding: ChunkRounding::Floor,
                light_smoothing_rate: 2.0,
                frustum_culling: false,
            }
        }

        fn renderer(&self) -> ChunkWorldRenderer {
            ChunkWorldRenderer::new(
                Self::config(),
                Box::new(self.store.clone()),
                Box::new(self.world.clone()),
                Box::new(NullCamera::new(DVec3::new(16.0, 10.0, 16.0))),
            )
        }
    }

    #[test]
    fn test_update_commits_and_fills_proximity() {
        let fixture = Fixture::new();
        let mut renderer = fixture.renderer();

        renderer.update(0.016);

        assert_eq!(renderer.chunks_in_proximity().len(), 9);
        assert_eq!(renderer.statistics().chunks_in_proximity, 9);
        assert_eq!(fixture.world.lock().unwrap().propagation_ticks(), 1);
        assert!(fixture.store.lock().unwrap().is_updating());
    }

    #[test]
    fn test_render_runs_all_passes() {
        let fixture = Fixture::new();
        let mut renderer = fixture.renderer();
        renderer.update(0.016);

        let mut backend = RecordingBackend::default();
        renderer.render(&mut backend);

        let begins: Vec<_> = backend.calls.iter().filter(|c| c.starts_with("begin")).collect();
        assert_eq!(
            begins,
            vec![
                "begin rendering/chunksOpaque",
                "begin rendering/chunksAlphaReject",
                "begin rendering/chunksAlphaBlend",
            ]
        );
        let stats = renderer.statistics();
        assert_eq!(stats.triangles, 9 * 100 + 9 * 10);
        assert_eq!(stats.not_ready_chunks, 0);
        assert_eq!(stats.frames, 1);
        assert_eq!(backend.draws.len(), 18);
        assert_eq!(renderer.seconds_since_last_frame(), 0.0);
    }

    #[test]
    fn test_unloaded_chunk_not_drawn() {
        let fixture = Fixture::new();
        let mut renderer = fixture.renderer();
        renderer.update(0.016);

        {
            let mut store = fixture.store.lock().unwrap();
            store.request_unload(ChunkCoord::new(1, 0, 1));
        }
        renderer.update(0.016);
        for event in fixture.store.lock().unwrap().drain_events() {
            if let ChunkEvent::Unloaded(coord) = event {
                renderer.on_chunk_unloaded(coord);
            }
        }

        let mut backend = RecordingBackend::default();
        renderer.render(&mut backend);
        assert!(backend.draws.iter().all(|d| d.0 != ChunkCoord::new(1, 0, 1)));
        assert_eq!(backend.draws.len(), 16);
    }

    #[test]
    fn test_not_ready_chunks_counted() {
        let fixture = Fixture::new();
        let mut renderer = fixture.renderer();
        renderer.update(0.016);

        let chunk = fixture.store.lock().unwrap().chunk(ChunkCoord::new(0, 0, 0));
        assert!(chunk.is_some_and(|c| c.dispose_mesh()));

        let mut backend = RecordingBackend::default();
        renderer.render(&mut backend);
        assert_eq!(renderer.statistics().not_ready_chunks, 1);
        assert_eq!(renderer.statistics().triangles, 8 * 110);
    }

    #[test]
    fn test_light_intensities() {
        let fixture = Fixture::new();
        let renderer = fixture.renderer();
        let pos = DVec3::new(3.5, 20.2, -1.5);
        {
            let mut world = fixture.world.lock().unwrap();
            world.set_sunlight(IVec3::new(3, 20, -2), 12);
            world.set_light(IVec3::new(3, 20, -2), 9);
            world.set_daylight(0.5);
        }

        assert!((renderer.main_light_intensity_at(pos) - 12.0 / 15.0 * 0.5).abs() < 1e-6);
        assert!((renderer.block_light_intensity_at(pos) - 9.0 / 15.0).abs() < 1e-6);
        assert!((renderer.rendering_light_intensity_at(pos) - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_smoothed_light_follows_target() {
        let fixture = Fixture::new();
        let mut renderer = fixture.renderer();

        renderer.update(0.1);
        assert!((renderer.time_smoothed_main_light_intensity() - 1.0).abs() < 1e-6);

        fixture.world.lock().unwrap().set_daylight(0.0);
        renderer.update(0.1);
        let after_one = renderer.time_smoothed_main_light_intensity();
        assert!(after_one < 1.0 && after_one > 0.0);

        for _ in 0..200 {
            renderer.update(0.1);
        }
        assert!(renderer.time_smoothed_main_light_intensity() < 1e-3);
    }

    #[test]
    fn test_dispose_once() {
        let fixture = Fixture::new();
        let mut renderer = fixture.renderer();
        renderer.dispose();
        renderer.dispose();
        assert!(renderer.is_disposed());
        assert!(fixture.world.lock().unwrap().is_disposed());

        renderer.update(0.016);
        assert_eq!(fixture.world.lock().unwrap().propagation_ticks(), 0);
    }

    #[test]
    fn test_pregenerate_reports_missing_chunks() {
        let fixture = Fixture::new();
        let mut renderer = fixture.renderer();
        assert!(renderer.pregenerate_chunks());

        fixture.world.lock().unwrap().mark_not_ready(ChunkCoord::new(-1, 0, -1));
        assert!(!renderer.pregenerate_chunks());
    }

    #[test]
    fn test_view_distance_change_rebuilds() {
        let fixture = Fixture::new();
        let mut renderer = fixture.renderer();
        renderer.update(0.016);
        assert_eq!(renderer.chunks_in_proximity().len(), 9);

        renderer.set_view_distance(ViewDistance::Custom { x: 1, y: 1, z: 1 });
        renderer.update(0.016);
        assert_eq!(renderer.chunks_in_proximity().len(), 1);
        assert_eq!(renderer.config().view_distance, ViewDistance::Custom { x: 1, y: 1, z: 1 });
    }

    #[test]
    fn test_headless_tracks_proximity_without_drawing() {
        let fixture = Fixture::new();
        let mut renderer = create_world_renderer(
            true,
            Fixture::config(),
            Box::new(fixture.store.clone()),
            Box::new(fixture.world.clone()),
            Box::new(NullCamera::new(DVec3::new(16.0, 10.0, 16.0))),
        );

        renderer.update(0.016);
        assert_eq!(renderer.chunks_in_proximity().len(), 9);

        let mut backend = RecordingBackend::default();
        renderer.render(&mut backend);
        renderer.increase_triangle_count(50);
        assert!(backend.calls.is_empty());
        assert_eq!(renderer.statistics().triangles, 0);
        assert_eq!(renderer.main_light_intensity_at(DVec3::ZERO), 0.0);
        assert_eq!(renderer.metrics(), "");
        assert!(!renderer.pregenerate_chunks());

        renderer.dispose();
        assert!(fixture.world.lock().unwrap().is_disposed());
    }
}
