//! Surface ownership and layered frame drawing.
//!
//! Layer order, back to front:
//! 1. white background
//! 2. map raster, nearest-neighbor scaled through the viewport geometry
//! 3. robot marker (dot, outline, heading line)
//! 4. drag arrow for an in-progress pose/goal gesture
//!
//! Overlay sizes are fixed screen pixels; only positions follow the map.

use std::path::Path;

use image::{Rgba, RgbaImage};

use crate::config::DisplayConfig;
use crate::core::types::{Point2D, Pose2D};
use crate::error::{DrishtiError, Result};
use crate::grid::MapMeta;
use crate::interaction::NavTool;

use super::draw::{self, rgba};
use super::scheduler::RedrawScheduler;
use super::viewport::{ViewportGeometry, world_to_screen};

const BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Colours and sizes of the overlay layers.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderStyle {
    pub marker_radius: f64,
    pub marker_color: Rgba<u8>,
    pub marker_outline: Rgba<u8>,
    pub heading_length: f64,
    pub heading_width: f64,
    pub drag_width: f64,
    pub arrow_head: f64,
    pub pose_tool_color: Rgba<u8>,
    pub goal_tool_color: Rgba<u8>,
}

impl RenderStyle {
    pub fn from_config(display: &DisplayConfig) -> Self {
        Self {
            marker_radius: display.marker_radius_px as f64,
            heading_length: display.heading_length_px as f64,
            heading_width: display.heading_width_px as f64,
            drag_width: display.drag_width_px as f64,
            arrow_head: display.arrow_head_px as f64,
            ..Self::default()
        }
    }

    fn tool_color(&self, tool: NavTool) -> Rgba<u8> {
        match tool {
            NavTool::SetPose => self.pose_tool_color,
            NavTool::SetGoal => self.goal_tool_color,
        }
    }
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self {
            marker_radius: 9.0,
            marker_color: rgba(255, 0, 0, 0.85),
            marker_outline: rgba(255, 255, 255, 0.9),
            heading_length: 45.0,
            heading_width: 4.0,
            drag_width: 3.0,
            arrow_head: 10.0,
            pose_tool_color: rgba(0, 128, 255, 0.9),
            goal_tool_color: rgba(0, 200, 0, 0.9),
        }
    }
}

/// In-progress gesture to draw, in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragOverlay {
    pub start: Point2D,
    pub current: Point2D,
    pub tool: NavTool,
}

/// Everything one frame needs, borrowed from the console.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameScene<'a> {
    pub raster: Option<&'a RgbaImage>,
    pub meta: Option<MapMeta>,
    pub geometry: Option<ViewportGeometry>,
    pub pose: Option<Pose2D>,
    pub drag: Option<DragOverlay>,
}

/// Owns the drawing surface and draws at most once per display frame.
#[derive(Debug)]
pub struct RenderPipeline {
    surface: Option<RgbaImage>,
    scheduler: RedrawScheduler,
    style: RenderStyle,
}

impl RenderPipeline {
    pub fn new(width: u32, height: u32, style: RenderStyle) -> Self {
        let mut pipeline = Self {
            surface: Some(RgbaImage::from_pixel(width.max(1), height.max(1), BACKGROUND)),
            scheduler: RedrawScheduler::new(),
            style,
        };
        pipeline.scheduler.schedule();
        pipeline
    }

    pub fn from_config(display: &DisplayConfig) -> Self {
        Self::new(
            display.width,
            display.height,
            RenderStyle::from_config(display),
        )
    }

    /// Reallocate the surface (min 1×1) and request a redraw.
    ///
    /// Ignored after [`detach`](Self::detach).
    pub fn resize(&mut self, width: u32, height: u32) {
        if self.scheduler.is_detached() {
            return;
        }
        let (w, h) = (width.max(1), height.max(1));
        if self.screen_size() != (w, h) {
            tracing::debug!("Surface resized to {}x{}", w, h);
            self.surface = Some(RgbaImage::from_pixel(w, h, BACKGROUND));
        }
        self.scheduler.schedule();
    }

    /// Request a redraw on the next frame; returns `true` if newly scheduled.
    #[inline]
    pub fn schedule_redraw(&mut self) -> bool {
        self.scheduler.schedule()
    }

    /// Current surface size; `(0, 0)` once detached.
    pub fn screen_size(&self) -> (u32, u32) {
        self.surface
            .as_ref()
            .map(|s| s.dimensions())
            .unwrap_or((0, 0))
    }

    #[inline]
    pub fn scheduler(&self) -> &RedrawScheduler {
        &self.scheduler
    }

    #[inline]
    pub fn style(&self) -> &RenderStyle {
        &self.style
    }

    #[inline]
    pub fn surface(&self) -> Option<&RgbaImage> {
        self.surface.as_ref()
    }

    /// Display frame tick: draw if a redraw was scheduled.
    ///
    /// Returns `true` if the surface was redrawn.
    pub fn on_frame(&mut self, scene: &FrameScene<'_>) -> bool {
        if !self.scheduler.take_frame() {
            return false;
        }
        self.draw(scene)
    }

    /// Draw all layers now. No-op without a surface.
    pub fn draw(&mut self, scene: &FrameScene<'_>) -> bool {
        let Some(surface) = self.surface.as_mut() else {
            return false;
        };

        draw::fill(surface, BACKGROUND);

        let (Some(meta), Some(geometry)) = (scene.meta, scene.geometry) else {
            return true;
        };

        if let Some(raster) = scene.raster {
            draw::blit_nearest(surface, raster, &geometry);
        }
        if let Some(pose) = scene.pose {
            draw_marker(surface, &self.style, &pose, &geometry, &meta);
        }
        if let Some(drag) = scene.drag {
            draw_drag(surface, &self.style, &drag, &geometry, &meta);
        }
        true
    }

    /// Write the current surface to `path` as PNG.
    pub fn save_snapshot(&self, path: &Path) -> Result<()> {
        let surface = self
            .surface
            .as_ref()
            .ok_or_else(|| DrishtiError::Render("no surface to snapshot".into()))?;

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                DrishtiError::Render(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }
        surface.save_with_format(path, image::ImageFormat::Png)?;
        tracing::debug!("Snapshot written to {}", path.display());
        Ok(())
    }

    /// Stop drawing and release the surface. Safe to call more than once.
    pub fn detach(&mut self) {
        if !self.scheduler.is_detached() {
            tracing::debug!("Render pipeline detached");
        }
        self.scheduler.detach();
        self.surface = None;
    }
}

fn draw_marker(
    surface: &mut RgbaImage,
    style: &RenderStyle,
    pose: &Pose2D,
    geometry: &ViewportGeometry,
    meta: &MapMeta,
) {
    let c = world_to_screen(pose.x, pose.y, geometry, meta);
    if !c.is_finite() {
        return;
    }

    draw::fill_circle(surface, c.x, c.y, style.marker_radius, style.marker_color);
    draw::stroke_circle(surface, c.x, c.y, style.marker_radius, 1.0, style.marker_outline);

    // Screen Y points down, so the heading is mirrored
    let screen_yaw = -pose.yaw;
    let tip = (
        c.x + screen_yaw.cos() * style.heading_length,
        c.y + screen_yaw.sin() * style.heading_length,
    );
    draw::draw_line(
        surface,
        (c.x, c.y),
        tip,
        style.heading_width,
        style.marker_color,
    );
}

fn draw_drag(
    surface: &mut RgbaImage,
    style: &RenderStyle,
    drag: &DragOverlay,
    geometry: &ViewportGeometry,
    meta: &MapMeta,
) {
    let s = world_to_screen(drag.start.x, drag.start.y, geometry, meta);
    let c = world_to_screen(drag.current.x, drag.current.y, geometry, meta);
    if !s.is_finite() || !c.is_finite() {
        return;
    }
    let color = style.tool_color(drag.tool);

    draw::draw_line(surface, (s.x, s.y), (c.x, c.y), style.drag_width, color);

    let ang = (c.y - s.y).atan2(c.x - s.x);
    let wing = std::f64::consts::FRAC_PI_6;
    let ah = style.arrow_head;
    draw::fill_triangle(
        surface,
        (c.x, c.y),
        (c.x - (ang - wing).cos() * ah, c.y - (ang - wing).sin() * ah),
        (c.x - (ang + wing).cos() * ah, c.y - (ang + wing).sin() * ah),
        color,
    );
}
