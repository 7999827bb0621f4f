//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::net::{TcpListener, TcpStream};
use std::time::Duration;

use drishti::config::DrishtiConfig;
use drishti::io::BridgeClient;
use drishti::{OccupancyGrid, Point2D, Transform, TransformEntry};

/// Generous timeout for loopback reads.
pub const TIMEOUT: Duration = Duration::from_secs(5);

/// 400x200 free grid at 5 cm, origin (-10, -5): covers x in [-10, 10), y in [-5, 5).
pub fn office_grid() -> OccupancyGrid {
    OccupancyGrid {
        width: 400,
        height: 200,
        resolution: 0.05,
        origin: Point2D::new(-10.0, -5.0),
        cells: vec![0; 400 * 200],
    }
}

/// Default config with pose/goal gestures enabled.
pub fn navigation_config() -> DrishtiConfig {
    let mut config = DrishtiConfig::default();
    config.navigation.enabled = true;
    config
}

/// A transform batch placing `base_link` directly in the map frame.
pub fn robot_at(x: f64, y: f64, yaw: f64) -> Vec<TransformEntry> {
    vec![TransformEntry::new(
        "map",
        "base_link",
        Transform::planar(x, y, yaw),
    )]
}

/// Connect a client to a fresh loopback listener; returns both ends.
pub fn loopback_bridge() -> (BridgeClient, TcpStream) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let client = BridgeClient::connect_timeout(&addr.to_string(), TIMEOUT).unwrap();
    let (server, _) = listener.accept().unwrap();
    server.set_read_timeout(Some(TIMEOUT)).unwrap();
    (client, server)
}

/// A loopback listener plus a navigation config pointing at it.
pub fn bridge_listener() -> (TcpListener, DrishtiConfig) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let mut config = navigation_config();
    config.connection.bridge_ip = "127.0.0.1".into();
    config.connection.port = listener.local_addr().unwrap().port();
    (listener, config)
}

/// Accept the next client on `listener` with a read timeout set.
pub fn accept_bridge(listener: &TcpListener) -> TcpStream {
    let (server, _) = listener.accept().unwrap();
    server.set_read_timeout(Some(TIMEOUT)).unwrap();
    server
}
