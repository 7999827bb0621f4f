//! The map console engine.
//!
//! `MapConsole` is the single writer for all view state. Three event sources
//! feed it through `&mut self` handlers:
//!
//! - grid messages → decoder → base raster
//! - transform messages → store → estimator → pose marker and label
//! - pointer/resize events → viewport → gesture state and drag overlay
//!
//! Every handler does a bounded amount of work and at most schedules a
//! redraw; drawing happens on [`MapConsole::on_frame`], once per display frame.
//! All coordinate conversions share one [`ViewportMapper`], so overlays and
//! pointer hits always use the geometry the raster was drawn with.

use std::path::Path;
use std::time::{Duration, Instant};

use image::RgbaImage;

use crate::config::DrishtiConfig;
use crate::core::types::{Point2D, Pose2D};
use crate::error::Result;
use crate::grid::{MapMeta, OccupancyGrid, Raster, decode};
use crate::interaction::{InteractionController, NavCommand, NavTool};
use crate::tf::{PoseEstimator, ResolvedPose, TransformEntry, TransformStore};
use crate::view::{FrameScene, RenderPipeline, ViewportGeometry, ViewportMapper, screen_to_world};

/// Rate-limited copy of the robot pose for the status label.
///
/// The marker follows every transform update; the label only moves once per
/// interval so the text stays readable.
#[derive(Debug, Clone)]
pub struct PoseLabel {
    interval: Duration,
    shown: Option<Pose2D>,
    last_update: Option<Instant>,
}

impl PoseLabel {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            shown: None,
            last_update: None,
        }
    }

    /// Offer a fresh pose; returns `true` if the label took it.
    pub fn offer(&mut self, pose: Pose2D, now: Instant) -> bool {
        let due = match self.last_update {
            Some(last) => now.saturating_duration_since(last) >= self.interval,
            None => true,
        };
        if due {
            self.shown = Some(pose);
            self.last_update = Some(now);
        }
        due
    }

    #[inline]
    pub fn shown(&self) -> Option<Pose2D> {
        self.shown
    }

    pub fn clear(&mut self) {
        self.shown = None;
        self.last_update = None;
    }
}

/// Message counters for periodic logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsoleStats {
    pub grids_accepted: u64,
    pub grids_rejected: u64,
    pub transform_batches: u64,
    pub transforms_rejected: u64,
    pub commands_emitted: u64,
}

/// Map/pose rendering and interaction engine.
pub struct MapConsole {
    map_topic: String,
    raster: Option<Raster>,
    meta: Option<MapMeta>,
    store: TransformStore,
    estimator: PoseEstimator,
    pose: Option<ResolvedPose>,
    label: PoseLabel,
    mapper: ViewportMapper,
    pipeline: RenderPipeline,
    interaction: InteractionController,
    stats: ConsoleStats,
    detached: bool,
}

impl MapConsole {
    pub fn new(config: &DrishtiConfig) -> Self {
        Self {
            map_topic: config.topics.map.clone(),
            raster: None,
            meta: None,
            store: TransformStore::new(),
            estimator: PoseEstimator::from_config(&config.frames),
            pose: None,
            label: PoseLabel::new(config.display.pose_label_interval()),
            mapper: ViewportMapper::new(),
            pipeline: RenderPipeline::from_config(&config.display),
            interaction: InteractionController::new(
                config.navigation.enabled,
                config.navigation.default_tool,
            ),
            stats: ConsoleStats::default(),
            detached: false,
        }
    }

    // ------------------------------------------------------------------
    // Inbound streams
    // ------------------------------------------------------------------

    /// Replace the map with a new grid.
    ///
    /// A malformed grid is dropped and the previous raster stays up.
    pub fn handle_grid(&mut self, grid: &OccupancyGrid) -> bool {
        if self.detached {
            return false;
        }
        let Some(raster) = decode(grid) else {
            self.stats.grids_rejected += 1;
            tracing::debug!(
                "Dropping malformed grid {}x{} with {} cells",
                grid.width,
                grid.height,
                grid.cells.len()
            );
            return false;
        };

        if self.meta.is_none() {
            let counts = grid.count_by_class();
            tracing::info!(
                "First map {}x{} @ {:.3} m/cell ({} free, {} occupied, {} unknown)",
                grid.width,
                grid.height,
                grid.resolution,
                counts.free,
                counts.occupied,
                counts.unknown
            );
        }

        self.meta = Some(grid.meta());
        self.raster = Some(raster);
        self.stats.grids_accepted += 1;
        self.pipeline.schedule_redraw();
        true
    }

    /// Merge a transform batch and re-resolve the robot pose.
    ///
    /// Returns how many entries were accepted.
    pub fn handle_transforms(&mut self, entries: &[TransformEntry], now: Instant) -> usize {
        if self.detached || entries.is_empty() {
            return 0;
        }
        let accepted = self.store.upsert_batch(entries);
        self.stats.transform_batches += 1;
        self.stats.transforms_rejected += (entries.len() - accepted) as u64;

        let Some(resolved) = self.estimator.resolve(&self.store) else {
            return accepted;
        };

        if self.pose.as_ref().map(|p| &p.source) != Some(&resolved.source) {
            tracing::info!("Robot pose resolved via {:?}", resolved.source);
        }
        self.label.offer(resolved.pose, now);
        self.pose = Some(resolved);
        self.pipeline.schedule_redraw();
        accepted
    }

    /// Forget every transform; called when a new bridge link comes up.
    pub fn reset_transforms(&mut self) {
        self.store.clear();
        self.pose = None;
        self.label.clear();
        self.pipeline.schedule_redraw();
    }

    // ------------------------------------------------------------------
    // Screen
    // ------------------------------------------------------------------

    /// Surface resized.
    pub fn handle_resize(&mut self, width: u32, height: u32) {
        if self.detached {
            return;
        }
        self.pipeline.resize(width, height);
    }

    /// Geometry for the current raster and surface, if a map is loaded.
    pub fn geometry(&mut self) -> Option<ViewportGeometry> {
        if self.detached {
            return None;
        }
        let raster = self.raster.as_ref()?.dimensions();
        Some(self.mapper.geometry(raster, self.pipeline.screen_size()))
    }

    /// Screen pixel → world point, `None` off the drawn map.
    pub fn screen_to_world(&mut self, sx: f64, sy: f64) -> Option<Point2D> {
        let geometry = self.geometry()?;
        let meta = self.meta?;
        screen_to_world(sx, sy, &geometry, &meta)
    }

    // ------------------------------------------------------------------
    // Pointer
    // ------------------------------------------------------------------

    pub fn pointer_down(&mut self, sx: f64, sy: f64) -> bool {
        if !self.interaction.is_enabled() {
            return false;
        }
        let world = self.screen_to_world(sx, sy);
        let started = self.interaction.pointer_down(world);
        if started {
            self.pipeline.schedule_redraw();
        }
        started
    }

    pub fn pointer_move(&mut self, sx: f64, sy: f64) -> bool {
        if !self.interaction.is_dragging() {
            return false;
        }
        let world = self.screen_to_world(sx, sy);
        let moved = self.interaction.pointer_move(world);
        if moved {
            self.pipeline.schedule_redraw();
        }
        moved
    }

    /// Finish a gesture; at most one command per gesture.
    pub fn pointer_up(&mut self) -> Option<NavCommand> {
        let command = self.interaction.pointer_up()?;
        self.stats.commands_emitted += 1;
        self.pipeline.schedule_redraw();
        Some(command)
    }

    /// Abort the active gesture, if any.
    pub fn cancel_gesture(&mut self) {
        if self.interaction.cancel() {
            self.pipeline.schedule_redraw();
        }
    }

    pub fn set_tool(&mut self, tool: NavTool) {
        self.interaction.set_tool(tool);
        if self.interaction.is_dragging() {
            self.pipeline.schedule_redraw();
        }
    }

    pub fn set_navigation_enabled(&mut self, enabled: bool) {
        let was_dragging = self.interaction.is_dragging();
        self.interaction.set_enabled(enabled);
        if was_dragging && !enabled {
            self.pipeline.schedule_redraw();
        }
    }

    // ------------------------------------------------------------------
    // Frames
    // ------------------------------------------------------------------

    /// Display frame tick. Returns `true` if the surface was redrawn.
    pub fn on_frame(&mut self) -> bool {
        self.draw_scene(RenderPipeline::on_frame)
    }

    /// Draw immediately, bypassing the scheduler.
    pub fn render_now(&mut self) -> bool {
        self.draw_scene(RenderPipeline::draw)
    }

    /// Assemble the current scene and hand it to one of the pipeline's draw paths.
    fn draw_scene<F>(&mut self, draw: F) -> bool
    where
        F: FnOnce(&mut RenderPipeline, &FrameScene<'_>) -> bool,
    {
        let geometry = self.geometry();
        let scene = FrameScene {
            raster: self.raster.as_ref().map(Raster::image),
            meta: self.meta,
            geometry,
            pose: self.pose.as_ref().map(|p| p.pose),
            drag: self.interaction.overlay(),
        };
        draw(&mut self.pipeline, &scene)
    }

    /// Write the last drawn frame as PNG.
    pub fn save_snapshot(&self, path: &Path) -> Result<()> {
        self.pipeline.save_snapshot(path)
    }

    /// Stop for good: no more draws, no more gestures. Idempotent.
    pub fn detach(&mut self) {
        if self.detached {
            return;
        }
        self.detached = true;
        self.interaction.cancel();
        self.mapper.invalidate();
        self.pipeline.detach();
        tracing::info!("Map console detached");
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Status line: map state plus the rate-limited robot position.
    pub fn status_text(&self) -> String {
        let mut text = match self.meta {
            Some(meta) => format!(
                "Mapping... ({})  {}×{}",
                self.map_topic, meta.width, meta.height
            ),
            None => format!("Waiting for {}...", self.map_topic),
        };
        if let Some(pose) = self.label.shown() {
            text.push_str(&format!("   |   robot: ({:.2}, {:.2})", pose.x, pose.y));
        }
        text
    }

    /// Latest resolved pose (not rate limited).
    #[inline]
    pub fn pose(&self) -> Option<Pose2D> {
        self.pose.as_ref().map(|p| p.pose)
    }

    #[inline]
    pub fn resolved_pose(&self) -> Option<&ResolvedPose> {
        self.pose.as_ref()
    }

    /// Pose currently shown in the label.
    #[inline]
    pub fn label_pose(&self) -> Option<Pose2D> {
        self.label.shown()
    }

    #[inline]
    pub fn raster(&self) -> Option<&Raster> {
        self.raster.as_ref()
    }

    #[inline]
    pub fn meta(&self) -> Option<MapMeta> {
        self.meta
    }

    #[inline]
    pub fn transforms(&self) -> &TransformStore {
        &self.store
    }

    #[inline]
    pub fn interaction(&self) -> &InteractionController {
        &self.interaction
    }

    #[inline]
    pub fn pipeline(&self) -> &RenderPipeline {
        &self.pipeline
    }

    #[inline]
    pub fn surface(&self) -> Option<&RgbaImage> {
        self.pipeline.surface()
    }

    #[inline]
    pub fn redraw_pending(&self) -> bool {
        self.pipeline.scheduler().is_pending()
    }

    #[inline]
    pub fn stats(&self) -> ConsoleStats {
        self.stats
    }

    #[inline]
    pub fn is_detached(&self) -> bool {
        self.detached
    }
}
