//! End-to-end console scenarios.
//!
//! Drives `MapConsole` the way the binary does (grid and transform messages,
//! resizes, pointer gestures, frame ticks) and checks the resulting pixels,
//! poses and commands.

use std::f64::consts::FRAC_PI_2;
use std::time::{Duration, Instant};

mod common;

use approx::assert_relative_eq;
use common::{navigation_config, office_grid, robot_at};
use drishti::config::DrishtiConfig;
use drishti::{
    MapConsole, NavCommand, NavTool, OccupancyGrid, Point2D, PoseSource, Transform, TransformEntry,
};

#[test]
fn test_goal_gesture_on_letterboxed_map() {
    let mut console = MapConsole::new(&navigation_config());
    assert!(console.handle_grid(&office_grid()));
    console.handle_transforms(&robot_at(0.0, 0.0, 0.0), Instant::now());
    assert!(console.on_frame());

    let geometry = console.geometry().unwrap();
    assert_relative_eq!(geometry.scale, 2.0);
    assert_relative_eq!(geometry.offset_x, 0.0);
    assert_relative_eq!(geometry.offset_y, 100.0);

    // World (0, 0) lands on screen (400, 298)
    let surface = console.surface().unwrap();
    let marker = surface.get_pixel(400, 298);
    assert_eq!(marker[0], 255);
    assert!(marker[1] < 100 && marker[2] < 100);
    assert_eq!(surface.get_pixel(100, 200)[1], 255);

    // Drag right from screen (200, 300)
    assert!(console.pointer_down(200.0, 300.0));
    assert!(console.pointer_move(300.0, 300.0));
    assert!(console.on_frame());
    let arrow = console.surface().unwrap().get_pixel(250, 300);
    assert!(arrow[1] > 180 && arrow[0] < 100);

    let Some(NavCommand::NavigationGoal(goal)) = console.pointer_up() else {
        panic!("expected a navigation goal");
    };
    assert_relative_eq!(goal.x, -5.0, epsilon = 1e-9);
    assert_relative_eq!(goal.y, -0.05, epsilon = 1e-9);
    assert_relative_eq!(goal.yaw, 0.0, epsilon = 1e-9);

    assert!(console.pointer_up().is_none());
    assert_eq!(console.stats().commands_emitted, 1);
}

#[test]
fn test_pose_tool_and_upward_drag() {
    let mut config = navigation_config();
    config.navigation.default_tool = NavTool::SetPose;
    let mut console = MapConsole::new(&config);
    console.handle_grid(&office_grid());

    assert!(console.pointer_down(400.0, 300.0));
    assert!(console.pointer_move(400.0, 200.0));
    let Some(NavCommand::PoseEstimate(pose)) = console.pointer_up() else {
        panic!("expected a pose estimate");
    };
    // Screen up is world +Y
    assert_relative_eq!(pose.yaw, FRAC_PI_2, epsilon = 1e-9);
}

#[test]
fn test_release_uses_last_point_on_map() {
    let mut console = MapConsole::new(&navigation_config());
    console.handle_grid(&office_grid());

    assert!(console.pointer_down(200.0, 300.0));
    assert!(console.pointer_move(300.0, 300.0));
    // Into the letterbox: ignored, the gesture keeps its last valid point
    assert!(!console.pointer_move(300.0, 50.0));

    let command = console.pointer_up().unwrap();
    assert_relative_eq!(command.pose().yaw, 0.0, epsilon = 1e-9);
}

#[test]
fn test_press_outside_map_starts_nothing() {
    let mut console = MapConsole::new(&navigation_config());
    console.handle_grid(&office_grid());

    assert!(!console.pointer_down(400.0, 50.0));
    assert!(!console.pointer_move(400.0, 300.0));
    assert!(console.pointer_up().is_none());
    assert_eq!(console.stats().commands_emitted, 0);
}

#[test]
fn test_click_without_drag_has_zero_heading() {
    let mut console = MapConsole::new(&navigation_config());
    console.handle_grid(&office_grid());

    assert!(console.pointer_down(200.0, 300.0));
    let command = console.pointer_up().unwrap();
    assert_eq!(command.pose().yaw, 0.0);
}

#[test]
fn test_navigation_disabled_ignores_gestures() {
    let mut console = MapConsole::new(&DrishtiConfig::default());
    console.handle_grid(&office_grid());

    assert!(!console.pointer_down(200.0, 300.0));
    assert!(console.pointer_up().is_none());

    // Turning navigation off mid-gesture drops it
    console.set_navigation_enabled(true);
    assert!(console.pointer_down(200.0, 300.0));
    console.set_navigation_enabled(false);
    assert!(console.pointer_up().is_none());
    assert!(console.interaction().overlay().is_none());
}

#[test]
fn test_resize_never_uses_stale_geometry() {
    let mut console = MapConsole::new(&navigation_config());
    console.handle_grid(&office_grid());
    assert_relative_eq!(console.geometry().unwrap().scale, 2.0);

    console.handle_resize(400, 400);
    let geometry = console.geometry().unwrap();
    assert_relative_eq!(geometry.scale, 1.0);
    assert_relative_eq!(geometry.offset_y, 100.0);

    // Bottom-left drawn pixel is world (-10, -5) at the new scale
    let world = console.screen_to_world(0.0, 299.0).unwrap();
    assert_relative_eq!(world.x, -10.0, epsilon = 1e-9);
    assert_relative_eq!(world.y, -5.0, epsilon = 1e-9);
    assert!(console.screen_to_world(0.0, 300.0).is_none());
}

#[test]
fn test_two_by_two_grid_palette_and_flip() {
    let mut console = MapConsole::new(&DrishtiConfig::default());
    // Row 0 (world bottom): occupied, unknown. Row 1: free, free.
    console.handle_grid(&OccupancyGrid {
        width: 2,
        height: 2,
        resolution: 1.0,
        origin: Point2D::new(0.0, 0.0),
        cells: vec![100, -1, 0, 0],
    });

    let raster = console.raster().unwrap();
    assert_eq!(raster.pixel(0, 1).0, [0, 0, 0, 255]);
    assert_eq!(raster.pixel(1, 1).0, [205, 205, 205, 255]);
    assert_eq!(raster.pixel(0, 0).0, [255, 255, 255, 255]);

    // 800x600 surface: scale 300, centered horizontally
    assert!(console.on_frame());
    let surface = console.surface().unwrap();
    assert_eq!(surface.get_pixel(200, 450).0, [0, 0, 0, 255]);
    assert_eq!(surface.get_pixel(500, 450).0, [205, 205, 205, 255]);
    assert_eq!(surface.get_pixel(200, 150).0, [255, 255, 255, 255]);
}

#[test]
fn test_pose_via_odom_chain() {
    let mut console = MapConsole::new(&DrishtiConfig::default());
    let now = Instant::now();

    console.handle_transforms(
        &[TransformEntry::new("map", "odom", Transform::planar(1.0, 0.0, 0.0))],
        now,
    );
    assert!(console.pose().is_none());

    console.handle_transforms(
        &[TransformEntry::new(
            "odom",
            "base_footprint",
            Transform::planar(1.0, 0.0, FRAC_PI_2),
        )],
        now,
    );
    let resolved = console.resolved_pose().unwrap();
    assert_eq!(
        resolved.source,
        PoseSource::ViaOdom("base_footprint".to_string())
    );
    assert_relative_eq!(resolved.pose.x, 2.0, epsilon = 1e-9);
    assert_relative_eq!(resolved.pose.y, 0.0, epsilon = 1e-9);
    assert_relative_eq!(resolved.pose.yaw, FRAC_PI_2, epsilon = 1e-9);

    // A direct edge wins once it appears
    console.handle_transforms(&robot_at(5.0, 5.0, 0.0), now);
    assert_eq!(
        console.resolved_pose().unwrap().source,
        PoseSource::Direct("base_link".to_string())
    );
}

#[test]
fn test_label_lags_marker_between_updates() {
    let mut console = MapConsole::new(&DrishtiConfig::default());
    console.handle_grid(&office_grid());
    let t0 = Instant::now();

    console.handle_transforms(&robot_at(1.0, 1.0, 0.0), t0);
    console.handle_transforms(&robot_at(2.0, 2.0, 0.0), t0 + Duration::from_millis(40));

    assert_relative_eq!(console.pose().unwrap().x, 2.0);
    assert_relative_eq!(console.label_pose().unwrap().x, 1.0);
    assert!(console.status_text().ends_with("robot: (1.00, 1.00)"));

    console.handle_transforms(&robot_at(3.0, 3.0, 0.0), t0 + Duration::from_millis(120));
    assert_relative_eq!(console.label_pose().unwrap().x, 3.0);
    assert_eq!(
        console.status_text(),
        "Mapping... (/map)  400×200   |   robot: (3.00, 3.00)"
    );
}

#[test]
fn test_bursts_coalesce_into_one_frame() {
    let mut console = MapConsole::new(&DrishtiConfig::default());
    assert!(console.on_frame());
    assert!(!console.on_frame());

    for i in 0..5 {
        console.handle_grid(&office_grid());
        console.handle_transforms(&robot_at(i as f64 * 0.1, 0.0, 0.0), Instant::now());
    }
    assert!(console.redraw_pending());
    assert!(console.on_frame());
    assert!(!console.on_frame());
}

#[test]
fn test_reset_transforms_clears_pose() {
    let mut console = MapConsole::new(&DrishtiConfig::default());
    console.handle_transforms(&robot_at(1.0, 2.0, 0.0), Instant::now());
    assert!(console.pose().is_some());

    console.reset_transforms();
    assert!(console.pose().is_none());
    assert!(console.label_pose().is_none());
    assert!(console.transforms().is_empty());
    assert_eq!(console.status_text(), "Waiting for /map...");
}

#[test]
fn test_snapshot_after_detach_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("frames").join("map.png");

    let mut console = MapConsole::new(&DrishtiConfig::default());
    console.handle_grid(&office_grid());
    console.render_now();
    console.save_snapshot(&path).unwrap();
    assert!(path.exists());

    console.detach();
    assert!(console.save_snapshot(&path).is_err());
    assert!(!console.pointer_down(200.0, 300.0));
}
