//! Shared core for the Putnik clock
//!
//! Timezone resolution, zone-local time sampling, hand angle computation, mesh binding,
//! the per-frame clock drive and the loading progress simulator. Nothing here renders;
//! the clock apps feed scenes and input in and apply the resulting rotations.

pub mod binder;
pub mod config;
pub mod drive;
pub mod hands;
pub mod progress;
pub mod time_engine;
pub mod timezone;

pub use binder::{bind, HandBindings, MeshNames, MeshRole, SceneGraph};
pub use config::{
    config_dir, config_path, delete_config, load_config, save_config, ClockConfig, ConfigError,
    DEFAULT_SPIN_SPEED,
};
pub use drive::{AutoSpin, ClockDrive, FrameReport, RotationSink};
pub use hands::{
    base_angles, compute_angles, dial_angle, Axis, CalibrationParseError, Hand, HandAngles,
    HandOffsets, OffsetChange, Rotation,
};
pub use progress::{Phase, ProgressInput, ProgressSimulator, ProgressState};
pub use time_engine::{sample, sample_at, FixedClock, SystemClock, TimeSample, TimeSource};
pub use timezone::{resolve, zone_from_query, ZoneId, DEFAULT_ZONE};
