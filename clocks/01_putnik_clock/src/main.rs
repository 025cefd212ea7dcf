//! Putnik Clock
//!
//! A 3D analog clock whose hands follow the wall clock of a chosen timezone. The model is
//! built behind a loading overlay; once its hand meshes bind, every frame samples the
//! zone-local time and rotates the hands. The clock idles in a slow spin until the user
//! first drags it.
//!
//! The zone comes from a `timezone` or `tz` query parameter passed as the first argument,
//! e.g. `putnik_clock '?tz=Владивосток'`, falling back to the configured zone.

mod drawing;
mod scene;
mod ui;

use std::time::Duration;

use nannou::prelude::*;
use nannou_egui::{self, Egui};
use shared::timezone::zone_param;
use shared::{
    resolve, AutoSpin, ClockConfig, ClockDrive, HandOffsets, ProgressSimulator, TimeSample,
    ZoneId,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::drawing::{
    colors, draw_loading_overlay, draw_onboarding_hint, draw_readout, draw_scene, ViewPose,
};
use crate::scene::{NodeId, Scene, SceneLoader};
use crate::ui::{draw_calibration_panel, CalibrationPanel};

const CLOCK_NAME: &str = "putnik_clock";
/// The heavy scene mounts shortly after the window appears
const MOUNT_DELAY: Duration = Duration::from_millis(600);
const PART_BUILD_TIME: Duration = Duration::from_millis(120);
/// Radians of orbit per pixel dragged
const ORBIT_SENSITIVITY: f32 = 0.01;

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    nannou::app(model).update(update).exit(exit).run();
}

/// Camera orbit driven by mouse drags
#[derive(Debug, Default)]
struct Orbit {
    yaw: f32,
    pitch: f32,
    drag_from: Option<Point2>,
}

/// Application state
struct Model {
    /// Persisted settings
    config: ClockConfig,
    /// Live calibration, applied as a snapshot each frame
    offsets: HandOffsets,
    /// Hand drive for the loaded scene
    drive: ClockDrive<NodeId>,
    loader: SceneLoader,
    /// Loaded scene, once the loader hands it over
    scene: Option<Scene>,
    progress: ProgressSimulator,
    /// Time shown in the readout
    last_sample: Option<TimeSample>,
    orbit: Orbit,
    /// Whether the user has dragged the clock yet
    interacted: bool,
    panel: CalibrationPanel,
    elapsed: Duration,
    /// egui integration
    egui: Egui,
}

fn save_config(model: &Model) {
    if let Err(e) = shared::save_config(CLOCK_NAME, &model.config) {
        warn!(error = %e, "failed to save config");
    }
}

/// Push spin and mesh-name settings into a running drive
fn apply_settings(drive: &mut ClockDrive<NodeId>, scene: Option<&Scene>, config: &ClockConfig) {
    drive.configure_spin(config.auto_spin, config.spin_speed);
    if let Some(scene) = scene {
        if !drive.attach(scene, &config.mesh_names) {
            warn!("hand meshes missing from scene, hands will not move");
        }
    }
}

/// Drop the scene bindings and stop the loading timer
fn release(drive: &mut ClockDrive<NodeId>, progress: &mut ProgressSimulator) {
    drive.detach();
    progress.cancel();
}

/// Pick the zone from the first CLI argument, else the configured zone
fn startup_zone(config: &ClockConfig) -> ZoneId {
    let requested = std::env::args().nth(1).and_then(|arg| zone_param(&arg));
    let zone = match requested {
        Some(token) => resolve(Some(&token)),
        None => resolve(Some(&config.zone)),
    };
    if !zone.is_recognized() {
        warn!(zone = %zone, "zone not in tz database, showing {}", shared::DEFAULT_ZONE);
    }
    zone
}

fn model(app: &App) -> Model {
    let window_id = app
        .new_window()
        .title("Putnik Clock")
        .size(900, 700)
        .view(view)
        .key_pressed(key_pressed)
        .mouse_pressed(mouse_pressed)
        .mouse_released(mouse_released)
        .mouse_moved(mouse_moved)
        .raw_event(raw_window_event)
        .build()
        .unwrap();

    let window = app.window(window_id).unwrap();
    let egui = Egui::from_window(&window);

    let config: ClockConfig = match shared::load_config(CLOCK_NAME) {
        Ok(config) => config.unwrap_or_default(),
        Err(e) => {
            warn!(error = %e, "failed to load config, using defaults");
            ClockConfig::default()
        }
    };

    let zone = startup_zone(&config);
    info!(zone = %zone, "clock starting");

    let spin = if config.auto_spin {
        AutoSpin::new(config.spin_speed)
    } else {
        AutoSpin::disabled()
    };

    Model {
        offsets: config.offsets,
        drive: ClockDrive::new(zone, spin),
        loader: SceneLoader::putnik(MOUNT_DELAY, PART_BUILD_TIME),
        scene: None,
        progress: ProgressSimulator::default(),
        last_sample: None,
        orbit: Orbit::default(),
        interacted: false,
        panel: CalibrationPanel::default(),
        elapsed: Duration::ZERO,
        config,
        egui,
    }
}

fn update(_app: &App, model: &mut Model, update: Update) {
    model.elapsed = update.since_start;

    // Scene provider
    model.loader.update(update.since_start);
    if let Some(scene) = model.loader.take_scene() {
        if !model.drive.attach(&scene, &model.config.mesh_names) {
            warn!("hand meshes missing from scene, hands will not move");
        }
        model.scene = Some(scene);
    }

    // The overlay stays up until the clock itself has a scene
    let active = model.loader.is_active() || model.scene.is_none();
    model.progress.update(update.since_start, model.loader.progress(), active);

    if let Some(scene) = model.scene.as_mut() {
        let delta = update.since_last.as_secs_f64();
        if let Some(report) = model.drive.tick(delta, model.offsets, scene) {
            model.last_sample = Some(report.sample);
        }
    }

    model.egui.set_elapsed_time(update.since_start);
    let ctx = model.egui.begin_frame();
    let ui_result = draw_calibration_panel(&ctx, &mut model.panel, &model.offsets);
    drop(ctx);

    if ui_result.reset {
        model.offsets = ClockConfig::default().offsets;
    }
    for change in &ui_result.changes {
        model.offsets.apply(*change);
    }
    if ui_result.reset || !ui_result.changes.is_empty() {
        model.config.offsets = model.offsets;
        save_config(model);
    }
}

fn view(app: &App, model: &Model, frame: Frame) {
    let draw = app.draw();
    let window_rect = app.window_rect();

    draw.background().color(colors::BACKGROUND);

    if let Some(scene) = &model.scene {
        let pose = ViewPose {
            center: window_rect.xy(),
            radius: window_rect.w().min(window_rect.h()) * 0.36,
            yaw: model.orbit.yaw,
            pitch: model.orbit.pitch,
            spin: model.drive.assembly_yaw() as f32,
        };
        draw_scene(&draw, scene, pose);
        draw_readout(&draw, model.drive.zone(), model.last_sample.as_ref(), window_rect);
    }

    if !model.interacted {
        draw_onboarding_hint(&draw, window_rect);
    }

    if model.config.show_loading_overlay && model.progress.visible() {
        let elapsed = model.elapsed.as_secs_f32();
        draw_loading_overlay(&draw, model.progress.state(), window_rect, elapsed);
    }

    draw.to_frame(app, &frame).unwrap();

    model.egui.draw_to_frame(&frame).unwrap();
}

fn key_pressed(_app: &App, model: &mut Model, key: Key) {
    match key {
        Key::Space => model.panel.toggle(),
        Key::R => {
            model.offsets = ClockConfig::default().offsets;
            model.config.offsets = model.offsets;
            save_config(model);
        }
        // Forget everything saved; the zone stays as launched
        Key::Delete => {
            if let Err(e) = shared::delete_config(CLOCK_NAME) {
                warn!(error = %e, "failed to delete config");
            }
            model.config = ClockConfig::default();
            model.offsets = model.config.offsets;
            apply_settings(&mut model.drive, model.scene.as_ref(), &model.config);
            info!("saved settings cleared");
        }
        _ => {}
    }
}

fn exit(_app: &App, mut model: Model) {
    release(&mut model.drive, &mut model.progress);
    model.scene = None;
    info!("clock stopped");
}

fn mouse_pressed(app: &App, model: &mut Model, button: MouseButton) {
    if button != MouseButton::Left || model.egui.ctx().wants_pointer_input() {
        return;
    }
    model.orbit.drag_from = Some(app.mouse.position());
    if !model.interacted {
        model.interacted = true;
        model.drive.interaction_started();
    }
}

fn mouse_released(_app: &App, model: &mut Model, button: MouseButton) {
    if button == MouseButton::Left {
        model.orbit.drag_from = None;
    }
}

fn mouse_moved(_app: &App, model: &mut Model, pos: Point2) {
    let Some(from) = model.orbit.drag_from else {
        return;
    };
    let delta = pos - from;
    model.orbit.yaw += delta.x * ORBIT_SENSITIVITY;
    model.orbit.pitch = (model.orbit.pitch - delta.y * ORBIT_SENSITIVITY).clamp(-1.4, 1.4);
    model.orbit.drag_from = Some(pos);
}

fn raw_window_event(_app: &App, model: &mut Model, event: &nannou::winit::event::WindowEvent) {
    model.egui.handle_raw_event(event);
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::MeshNames;

    fn loaded_scene() -> Scene {
        let mut loader = SceneLoader::putnik(Duration::ZERO, Duration::ZERO);
        loader.update(Duration::from_millis(1));
        loader.take_scene().unwrap()
    }

    fn still_drive() -> ClockDrive<NodeId> {
        ClockDrive::new(ZoneId::default(), AutoSpin::disabled())
    }

    #[test]
    fn test_apply_settings_restores_spin_and_names() {
        let scene = loaded_scene();
        let mut drive = still_drive();
        let mut renamed = ClockConfig::default();
        renamed.mesh_names.hour = "Missing_Hour".to_string();
        apply_settings(&mut drive, Some(&scene), &renamed);
        assert!(!drive.hands_ready());

        let config = ClockConfig::default();
        apply_settings(&mut drive, Some(&scene), &config);
        assert!(drive.hands_ready());
        assert!(drive.spin().is_enabled());
        assert_eq!(drive.spin().speed(), config.spin_speed);
    }

    #[test]
    fn test_apply_settings_after_interaction_keeps_spin_off() {
        let mut drive = still_drive();
        drive.interaction_started();
        apply_settings(&mut drive, None, &ClockConfig::default());
        assert!(!drive.spin().is_enabled());
    }

    #[test]
    fn test_release_detaches_and_stops_progress() {
        let scene = loaded_scene();
        let mut drive = still_drive();
        assert!(drive.attach(&scene, &MeshNames::default()));

        let mut progress = ProgressSimulator::default();
        progress.update(Duration::ZERO, 10.0, true);
        progress.update(Duration::from_millis(250), 20.0, true);
        assert!(progress.is_ticking());

        release(&mut drive, &mut progress);
        assert!(!drive.hands_ready());
        assert!(!progress.is_ticking());
        assert!(!progress.visible());
    }
}
