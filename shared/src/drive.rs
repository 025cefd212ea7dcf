//! Per-frame clock drive
//!
//! Each frame the drive samples the zone-local time, computes hand angles and pushes the
//! same rotation to every mesh bound to a hand. Until all three primary hands are bound
//! the drive is inert.

use chrono_tz::Tz;
use tracing::{debug, info};

use crate::binder::{bind, HandBindings, MeshNames, SceneGraph};
use crate::hands::{compute_angles, Hand, HandOffsets, Rotation};
use crate::time_engine::{sample_tz, SystemClock, TimeSample, TimeSource};
use crate::timezone::ZoneId;

/// Receives rotations for bound targets
pub trait RotationSink<H> {
    fn set_rotation(&mut self, target: H, rotation: Rotation);
}

impl<H> RotationSink<H> for Vec<(H, Rotation)> {
    fn set_rotation(&mut self, target: H, rotation: Rotation) {
        self.push((target, rotation));
    }
}

/// Idle rotation of the whole clock assembly about its vertical axis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AutoSpin {
    enabled: bool,
    /// Set once the user interacts; settings can no longer re-enable the spin
    halted: bool,
    /// Radians per second
    speed: f64,
    angle: f64,
}

impl AutoSpin {
    pub fn new(speed: f64) -> Self {
        Self {
            enabled: true,
            halted: false,
            speed,
            angle: 0.0,
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            halted: false,
            speed: 0.0,
            angle: 0.0,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn angle(&self) -> f64 {
        self.angle
    }

    /// Stop spinning for the rest of the session. The current angle is kept.
    pub fn disable(&mut self) {
        self.enabled = false;
        self.halted = true;
    }

    /// Apply new settings from the current angle
    pub fn reconfigure(&mut self, enabled: bool, speed: f64) {
        self.enabled = enabled && !self.halted;
        self.speed = speed;
    }

    pub fn advance(&mut self, delta_secs: f64) {
        if self.enabled {
            self.angle += self.speed * delta_secs;
        }
    }
}

/// What one tick did
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    pub sample: TimeSample,
    /// Number of rotations pushed to the sink
    pub mutations: usize,
}

/// Drives the hands of one clock
pub struct ClockDrive<H, C = SystemClock> {
    zone: ZoneId,
    tz: Tz,
    clock: C,
    bindings: HandBindings<H>,
    spin: AutoSpin,
}

impl<H: Copy> ClockDrive<H, SystemClock> {
    /// Drive against the system clock
    pub fn new(zone: ZoneId, spin: AutoSpin) -> Self {
        Self::with_clock(zone, SystemClock, spin)
    }
}

impl<H: Copy, C: TimeSource> ClockDrive<H, C> {
    pub fn with_clock(zone: ZoneId, clock: C, spin: AutoSpin) -> Self {
        let tz = zone.tz();
        Self {
            zone,
            tz,
            clock,
            bindings: HandBindings::default(),
            spin,
        }
    }

    pub fn zone(&self) -> &ZoneId {
        &self.zone
    }

    /// Switch zones; takes effect on the next tick
    pub fn set_zone(&mut self, zone: ZoneId) {
        self.tz = zone.tz();
        self.zone = zone;
    }

    pub fn bindings(&self) -> &HandBindings<H> {
        &self.bindings
    }

    pub fn hands_ready(&self) -> bool {
        self.bindings.hands_ready()
    }

    pub fn spin(&self) -> &AutoSpin {
        &self.spin
    }

    /// Current yaw of the whole assembly from idle spin
    pub fn assembly_yaw(&self) -> f64 {
        self.spin.angle()
    }

    /// Change the idle spin settings. Has no effect on enabling once the user has interacted.
    pub fn configure_spin(&mut self, enabled: bool, speed: f64) {
        self.spin.reconfigure(enabled, speed);
        debug!(
            enabled = self.spin.is_enabled(),
            speed = self.spin.speed(),
            "auto spin reconfigured"
        );
    }

    /// Bind a freshly loaded scene, replacing earlier bindings
    pub fn attach<S>(&mut self, scene: &S, names: &MeshNames) -> bool
    where
        S: SceneGraph<Handle = H>,
    {
        self.bindings = bind(scene, names);
        let ready = self.bindings.hands_ready();
        info!(zone = %self.zone, hands_ready = ready, "scene attached to clock drive");
        ready
    }

    /// Forget the current scene; ticks become no-ops
    pub fn detach(&mut self) {
        self.bindings = HandBindings::default();
        debug!("clock drive detached");
    }

    /// The user started interacting; idle spin stops for good
    pub fn interaction_started(&mut self) {
        if self.spin.is_enabled() {
            debug!(angle = self.spin.angle(), "auto spin disabled by interaction");
        }
        self.spin.disable();
    }

    /// Advance one frame.
    ///
    /// `offsets` is a snapshot taken by the caller for this frame. Returns `None` without
    /// touching the sink when the hands are not bound.
    pub fn tick<S>(
        &mut self,
        delta_secs: f64,
        offsets: HandOffsets,
        sink: &mut S,
    ) -> Option<FrameReport>
    where
        S: RotationSink<H> + ?Sized,
    {
        if !self.bindings.hands_ready() {
            return None;
        }

        self.spin.advance(delta_secs);

        let sample = sample_tz(self.tz, self.clock.now());
        let angles = compute_angles(&sample, &offsets);
        let mut mutations = 0;

        for hand in Hand::ALL {
            let rotation = angles.hand(hand);
            for target in self.bindings.targets(hand) {
                sink.set_rotation(target, rotation);
                mutations += 1;
            }
        }

        if let Some(dial) = self.bindings.dial {
            sink.set_rotation(dial, angles.dial);
            mutations += 1;
        }
        if let Some(spinner) = self.bindings.spinner {
            sink.set_rotation(spinner, Rotation::IDENTITY);
            mutations += 1;
        }

        Some(FrameReport { sample, mutations })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hands::{base_angles, dial_angle};
    use crate::time_engine::FixedClock;
    use chrono::{TimeZone, Utc};
    use std::f64::consts::PI;

    struct NamedScene(Vec<&'static str>);

    impl SceneGraph for NamedScene {
        type Handle = usize;

        fn traverse_meshes(&self, visit: &mut dyn FnMut(&str, usize)) {
            for (i, name) in self.0.iter().enumerate() {
                visit(*name, i);
            }
        }
    }

    const FULL: [&str; 7] = [
        "Cylinder001",
        "Hand_Min001_1",
        "Hand_Min001",
        "Hand_Hour001_1",
        "Hand_Hour001",
        "Cylinder003",
        "Cylinder004",
    ];

    fn vladivostok_drive() -> ClockDrive<usize, FixedClock> {
        // 14:30:00 on the 15th in Vladivostok (UTC+10)
        let instant = Utc.with_ymd_and_hms(2024, 3, 15, 4, 30, 0).unwrap();
        ClockDrive::with_clock(
            ZoneId::new("Asia/Vladivostok"),
            FixedClock(instant),
            AutoSpin::new(0.5),
        )
    }

    #[test]
    fn test_unbound_drive_is_inert() {
        let mut drive = vladivostok_drive();
        let mut sink: Vec<(usize, Rotation)> = Vec::new();
        assert!(drive.tick(0.016, HandOffsets::default(), &mut sink).is_none());
        assert!(sink.is_empty());
        assert_eq!(drive.assembly_yaw(), 0.0);
    }

    #[test]
    fn test_missing_hour_hand_produces_no_mutations() {
        let mut drive = vladivostok_drive();
        let scene = NamedScene(vec!["Cylinder001", "Hand_Min001_1", "Hand_Min001", "Cylinder003"]);
        assert!(!drive.attach(&scene, &MeshNames::default()));

        let mut sink: Vec<(usize, Rotation)> = Vec::new();
        for _ in 0..3 {
            assert!(drive.tick(0.016, HandOffsets::default(), &mut sink).is_none());
        }
        assert!(sink.is_empty());
    }

    #[test]
    fn test_full_scene_drives_every_target() {
        let mut drive = vladivostok_drive();
        assert!(drive.attach(&NamedScene(FULL.to_vec()), &MeshNames::default()));

        let mut sink: Vec<(usize, Rotation)> = Vec::new();
        let report = drive.tick(0.0, HandOffsets::default(), &mut sink).unwrap();
        assert_eq!(report.mutations, 7);
        assert_eq!(sink.len(), 7);

        let base = base_angles(&report.sample);
        assert_eq!(base.minute, -PI);
        assert_eq!(base.hour, -((2.0 + 0.5) / 12.0) * PI * 2.0);

        let rotation_of = |target: usize| sink.iter().find(|(t, _)| *t == target).unwrap().1;
        // Redundant hands get the exact same rotation as their primaries
        assert_eq!(rotation_of(1), rotation_of(2));
        assert_eq!(rotation_of(3), rotation_of(4));
        assert_eq!(rotation_of(1).y, -PI);
        assert_eq!(rotation_of(5), Rotation::new(0.0, 0.0, dial_angle(15)));
        assert_eq!(rotation_of(6), Rotation::IDENTITY);
    }

    #[test]
    fn test_optional_parts_are_skipped() {
        let mut drive = vladivostok_drive();
        let scene = NamedScene(vec!["Cylinder001", "Hand_Min001_1", "Hand_Hour001_1"]);
        assert!(drive.attach(&scene, &MeshNames::default()));

        let mut sink: Vec<(usize, Rotation)> = Vec::new();
        let report = drive.tick(0.0, HandOffsets::putnik(), &mut sink).unwrap();
        assert_eq!(report.mutations, 3);
        assert!((sink[0].1.z - 195f64.to_radians()).abs() < 1e-12);
    }

    #[test]
    fn test_auto_spin_until_interaction() {
        let mut drive = vladivostok_drive();
        drive.attach(&NamedScene(FULL.to_vec()), &MeshNames::default());

        let mut sink: Vec<(usize, Rotation)> = Vec::new();
        drive.tick(2.0, HandOffsets::default(), &mut sink);
        assert!((drive.assembly_yaw() - 1.0).abs() < 1e-12);

        drive.interaction_started();
        drive.tick(2.0, HandOffsets::default(), &mut sink);
        assert!((drive.assembly_yaw() - 1.0).abs() < 1e-12);
        assert!(!drive.spin().is_enabled());
    }

    #[test]
    fn test_configure_spin_keeps_angle() {
        let mut drive = vladivostok_drive();
        drive.attach(&NamedScene(FULL.to_vec()), &MeshNames::default());

        let mut sink: Vec<(usize, Rotation)> = Vec::new();
        drive.tick(2.0, HandOffsets::default(), &mut sink);
        drive.configure_spin(true, 0.25);
        drive.tick(2.0, HandOffsets::default(), &mut sink);
        assert!((drive.assembly_yaw() - 1.5).abs() < 1e-12);
        assert_eq!(drive.spin().speed(), 0.25);

        drive.configure_spin(false, 0.25);
        drive.tick(2.0, HandOffsets::default(), &mut sink);
        assert!((drive.assembly_yaw() - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_configure_spin_cannot_undo_interaction() {
        let mut drive = vladivostok_drive();
        drive.interaction_started();
        drive.configure_spin(true, 0.5);
        assert!(!drive.spin().is_enabled());

        let mut spin = AutoSpin::disabled();
        spin.reconfigure(true, 0.5);
        assert!(spin.is_enabled());
    }

    #[test]
    fn test_detach_stops_updates() {
        let mut drive = vladivostok_drive();
        drive.attach(&NamedScene(FULL.to_vec()), &MeshNames::default());
        drive.detach();

        let mut sink: Vec<(usize, Rotation)> = Vec::new();
        assert!(drive.tick(0.016, HandOffsets::default(), &mut sink).is_none());
        assert!(sink.is_empty());
    }

    #[test]
    fn test_set_zone_changes_sample() {
        let mut drive = vladivostok_drive();
        drive.attach(&NamedScene(FULL.to_vec()), &MeshNames::default());
        drive.set_zone(ZoneId::new("Europe/Moscow"));

        let mut sink: Vec<(usize, Rotation)> = Vec::new();
        let report = drive.tick(0.0, HandOffsets::default(), &mut sink).unwrap();
        assert_eq!(report.sample.hours, 7);
        assert_eq!(drive.zone().as_str(), "Europe/Moscow");
    }
}
