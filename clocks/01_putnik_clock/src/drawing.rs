//! Drawing module - scene rendering, loading overlay and readouts
//!
//! Renders the Putnik scene graph with nannou's Draw API. Each node contributes a
//! translation and an XYZ Euler rotation to its children; mesh shapes are drawn flat in
//! their local XY plane after the mesh mount rotation.

use nannou::prelude::*;
use shared::{ProgressState, Rotation, TimeSample, ZoneId};

use crate::scene::{NodeId, Scene, Shape};

/// Color palette for the Putnik clock
pub mod colors {
    use nannou::prelude::*;

    pub const BACKGROUND: Srgb<u8> = Srgb {
        red: 0,
        green: 0,
        blue: 0,
        standard: std::marker::PhantomData,
    };
    pub const CASE: Srgb<u8> = Srgb {
        red: 58,
        green: 62,
        blue: 66,
        standard: std::marker::PhantomData,
    };
    pub const BEZEL: Srgb<u8> = Srgb {
        red: 196,
        green: 200,
        blue: 204,
        standard: std::marker::PhantomData,
    };
    pub const DIAL: Srgb<u8> = Srgb {
        red: 22,
        green: 30,
        blue: 44,
        standard: std::marker::PhantomData,
    };
    pub const TICK: Srgb<u8> = Srgb {
        red: 120,
        green: 128,
        blue: 140,
        standard: std::marker::PhantomData,
    };
    pub const TICK_MAJOR: Srgb<u8> = Srgb {
        red: 230,
        green: 230,
        blue: 230,
        standard: std::marker::PhantomData,
    };
    pub const HAND: Srgb<u8> = Srgb {
        red: 240,
        green: 236,
        blue: 226,
        standard: std::marker::PhantomData,
    };
    pub const HAND_SHADOW: Srgb<u8> = Srgb {
        red: 10,
        green: 12,
        blue: 16,
        standard: std::marker::PhantomData,
    };
    pub const SECOND_HAND: Srgb<u8> = Srgb {
        red: 226,
        green: 62,
        blue: 48,
        standard: std::marker::PhantomData,
    };
    pub const DATE_WHEEL: Srgb<u8> = Srgb {
        red: 186,
        green: 160,
        blue: 104,
        standard: std::marker::PhantomData,
    };
    pub const SPINNER: Srgb<u8> = Srgb {
        red: 150,
        green: 150,
        blue: 150,
        standard: std::marker::PhantomData,
    };
    pub const TEXT_PRIMARY: Srgb<u8> = Srgb {
        red: 255,
        green: 255,
        blue: 255,
        standard: std::marker::PhantomData,
    };
    pub const TEXT_SECONDARY: Srgb<u8> = Srgb {
        red: 150,
        green: 150,
        blue: 150,
        standard: std::marker::PhantomData,
    };
    pub const BAR_TRACK: Srgb<u8> = Srgb {
        red: 40,
        green: 40,
        blue: 40,
        standard: std::marker::PhantomData,
    };
}

/// How the whole assembly is posed on screen
#[derive(Debug, Clone, Copy)]
pub struct ViewPose {
    pub center: Point2,
    /// Clock radius in pixels
    pub radius: f32,
    /// Orbit rotation about the vertical axis
    pub yaw: f32,
    /// Orbit rotation about the horizontal axis
    pub pitch: f32,
    /// Idle spin of the assembly
    pub spin: f32,
}

fn rotation_matrix(rotation: Rotation) -> Mat4 {
    Mat4::from_rotation_x(rotation.x as f32)
        * Mat4::from_rotation_y(rotation.y as f32)
        * Mat4::from_rotation_z(rotation.z as f32)
}

/// Draw every node of the scene
pub fn draw_scene(draw: &Draw, scene: &Scene, pose: ViewPose) {
    let root = Mat4::from_translation(pose.center.extend(0.0))
        * Mat4::from_rotation_x(pose.pitch)
        * Mat4::from_rotation_y(pose.yaw + pose.spin)
        * Mat4::from_scale(Vec3::splat(pose.radius));

    draw_node(draw, scene, scene.root(), root);
}

fn draw_node(draw: &Draw, scene: &Scene, id: NodeId, parent: Mat4) {
    let node = scene.node(id);
    let world = parent * Mat4::from_translation(node.position) * rotation_matrix(node.rotation);

    if let Some(mesh) = node.mesh {
        let local = draw.transform(world * rotation_matrix(mesh.mount));
        draw_shape(&local, mesh.shape, mesh.color);
    }

    for &child in &node.children {
        draw_node(draw, scene, child, world);
    }
}

fn draw_shape(draw: &Draw, shape: Shape, color: Srgb<u8>) {
    match shape {
        Shape::Disc { radius } => {
            draw.ellipse().radius(radius).color(color);
        }
        Shape::Ring { radius, weight } => {
            draw.ellipse()
                .radius(radius)
                .no_fill()
                .stroke(color)
                .stroke_weight(weight);
        }
        Shape::Bar { length, width, tail } => {
            let span = length + tail;
            draw.rect()
                .x_y(0.0, (length - tail) / 2.0)
                .w_h(width, span)
                .color(color);
            draw.ellipse().radius(width * 0.9).color(color);
        }
        Shape::Ticks {
            count,
            radius,
            length,
            weight,
        } => {
            for i in 0..count {
                let angle = PI / 2.0 - (i as f32 / count as f32) * TAU;
                let dir = vec2(angle.cos(), angle.sin());
                draw.line()
                    .start(dir * (radius - length))
                    .end(dir * radius)
                    .weight(weight)
                    .color(color);
            }
        }
        Shape::Wheel { radius, slots } => {
            draw.ellipse()
                .radius(radius)
                .no_fill()
                .stroke(color)
                .stroke_weight(radius * 0.08);
            for i in 0..slots {
                let angle = PI / 2.0 - (i as f32 / slots as f32) * TAU;
                let dir = vec2(angle.cos(), angle.sin());
                let inner = if i == 0 { 0.45 } else { 0.75 };
                draw.line()
                    .start(dir * radius * inner)
                    .end(dir * radius)
                    .weight(radius * 0.04)
                    .color(color);
            }
        }
    }
}

/// Full-screen loading overlay with a progress bar and percentage
pub fn draw_loading_overlay(
    draw: &Draw,
    progress: &ProgressState,
    window_rect: Rect,
    elapsed_secs: f32,
) {
    draw.rect()
        .xy(window_rect.xy())
        .wh(window_rect.wh())
        .color(colors::BACKGROUND);

    let bar_w = window_rect.w().min(508.0) * 0.9;
    let bar_h = 4.0;
    let bar_y = window_rect.y() - 10.0;

    draw.text("ПУТНИК")
        .x_y(window_rect.x(), bar_y + 60.0)
        .color(colors::TEXT_PRIMARY)
        .font_size(28)
        .w(bar_w);

    draw.rect()
        .x_y(window_rect.x(), bar_y)
        .w_h(bar_w, bar_h)
        .color(colors::BAR_TRACK);

    let fill_w = bar_w * (progress.displayed as f32 / 100.0).clamp(0.0, 1.0);
    let left = window_rect.x() - bar_w / 2.0;
    draw.rect()
        .x_y(left + fill_w / 2.0, bar_y)
        .w_h(fill_w, bar_h)
        .color(colors::TEXT_PRIMARY);

    // Shimmer sweeping across the filled part
    if fill_w > 0.0 {
        let phase = (elapsed_secs * 0.8).fract();
        let shimmer_w = (bar_w * 0.12).min(fill_w);
        let x = left + shimmer_w / 2.0 + (fill_w - shimmer_w) * phase;
        draw.rect()
            .x_y(x, bar_y)
            .w_h(shimmer_w, bar_h)
            .color(srgba(255u8, 255u8, 255u8, 90u8));
    }

    draw.text(&format!("{}%", progress.percent_label()))
        .x_y(window_rect.x(), bar_y - 22.0)
        .color(colors::TEXT_SECONDARY)
        .font_size(12)
        .w(bar_w);
}

/// Hint shown until the user first drags the clock
pub fn draw_onboarding_hint(draw: &Draw, window_rect: Rect) {
    draw.text("ВРАЩАЙТЕ ЧАСЫ, ЗАЖАВ ЛЕВУЮ КНОПКУ МЫШИ")
        .x_y(window_rect.x(), window_rect.bottom() + 64.0)
        .color(srgba(255u8, 255u8, 255u8, 128u8))
        .font_size(12)
        .w(window_rect.w());
}

/// Small zone and time readout in the corner
pub fn draw_readout(draw: &Draw, zone: &ZoneId, sample: Option<&TimeSample>, window_rect: Rect) {
    let time = sample.map(TimeSample::format_time).unwrap_or_else(|| "--:--:--".to_string());
    let text = format!("{} · {}", zone, time);
    draw.text(&text)
        .x_y(window_rect.right() - 160.0, window_rect.top() - 24.0)
        .color(colors::TEXT_SECONDARY)
        .font_size(12)
        .w(300.0)
        .right_justify();
}
