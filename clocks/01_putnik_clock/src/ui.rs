//! UI module - egui calibration panel
//!
//! Sliders for every hand and axis. Each moved slider becomes one `OffsetChange` event;
//! the caller applies events between frames.

use nannou_egui::egui;
use shared::{Axis, Hand, HandOffsets, OffsetChange};

/// State for the calibration panel
#[derive(Default)]
pub struct CalibrationPanel {
    pub is_open: bool,
}

impl CalibrationPanel {
    pub fn toggle(&mut self) {
        self.is_open = !self.is_open;
    }
}

/// Result of UI interactions
#[derive(Default)]
pub struct UiResult {
    /// Calibration events emitted this frame
    pub changes: Vec<OffsetChange>,
    /// Restore the stock calibration
    pub reset: bool,
}

/// Draw the calibration window
pub fn draw_calibration_panel(
    ctx: &egui::Context,
    panel: &mut CalibrationPanel,
    offsets: &HandOffsets,
) -> UiResult {
    let mut result = UiResult::default();

    if !panel.is_open {
        return result;
    }

    egui::Window::new("Calibration")
        .collapsible(false)
        .resizable(false)
        .default_width(320.0)
        .anchor(egui::Align2::RIGHT_BOTTOM, [-16.0, -16.0])
        .open(&mut panel.is_open)
        .show(ctx, |ui| {
            egui::Grid::new("calibration_grid")
                .num_columns(4)
                .spacing([8.0, 6.0])
                .show(ui, |ui| {
                    ui.label("");
                    for axis in Axis::ALL {
                        ui.label(axis.to_string());
                    }
                    ui.end_row();

                    for hand in Hand::ALL {
                        ui.label(hand.name());
                        let rotation = offsets.get(hand);
                        for axis in Axis::ALL {
                            let mut degrees = rotation.axis(axis).to_degrees();
                            let slider = egui::Slider::new(&mut degrees, -360.0..=360.0)
                                .suffix("°")
                                .fixed_decimals(0);
                            if ui.add(slider).changed() {
                                result.changes.push(OffsetChange {
                                    hand,
                                    axis,
                                    value: degrees.to_radians(),
                                });
                            }
                        }
                        ui.end_row();
                    }
                });

            ui.separator();
            ui.horizontal(|ui| {
                if ui.button("Reset").clicked() {
                    result.reset = true;
                }
                ui.label("Space toggles this panel");
            });
        });

    result
}
