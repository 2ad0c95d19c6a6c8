//! Control panel using bevy_egui

use aquarium_core::{AquariumCommand, ButtonKind, LoadStep, SliderKind};
use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts, EguiPrimaryContextPass};

use crate::loading::{AppPhase, ModelLoads};
use crate::state::{AquariumState, SceneCommand, SceneConfig};

/// Egui window with the sliders, the toggle buttons and load status
pub struct ControlPanelPlugin;

impl Plugin for ControlPanelPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(EguiPrimaryContextPass, control_panel);
    }
}

fn status_line(phase: AppPhase, loads: &ModelLoads) -> (egui::Color32, String) {
    match phase {
        AppPhase::Running => (egui::Color32::GREEN, "Ready".to_string()),
        AppPhase::Failed => {
            let reason = loads
                .sequence
                .error()
                .map(ToString::to_string)
                .unwrap_or_else(|| "unknown error".to_string());
            (egui::Color32::RED, reason)
        }
        AppPhase::Loading => {
            let text = match loads.sequence.current() {
                Some(step) => format!(
                    "Loading {} ({}/{})",
                    step.label(),
                    step.number(),
                    LoadStep::ORDER.len()
                ),
                None => "Preparing scene".to_string(),
            };
            (egui::Color32::YELLOW, text)
        }
    }
}

fn control_panel(
    mut contexts: EguiContexts,
    state: Res<AquariumState>,
    config: Res<SceneConfig>,
    loads: Res<ModelLoads>,
    phase: Res<State<AppPhase>>,
    mut commands: MessageWriter<SceneCommand>,
) {
    let Ok(ctx) = contexts.ctx_mut() else {
        return;
    };
    let controls = &config.controls;

    egui::Window::new("Aquarium")
        .default_pos([10.0, 10.0])
        .resizable(false)
        .show(ctx, |ui| {
            let (color, text) = status_line(*phase.get(), &loads);
            ui.horizontal(|ui| {
                ui.colored_label(color, "●");
                ui.label(text);
            });
            ui.separator();

            let mut count = state.visible_threshold();
            ui.label(SliderKind::FishCount.label());
            if ui
                .add(egui::Slider::new(&mut count, 0..=state.school().len()))
                .changed()
            {
                commands.write(SceneCommand(AquariumCommand::SetVisibleFish(count)));
            }

            let mut speed = state.speed_multiplier();
            ui.label(SliderKind::Speed.label());
            if ui
                .add(egui::Slider::new(
                    &mut speed,
                    controls.speed_range[0]..=controls.speed_range[1],
                ))
                .changed()
            {
                commands.write(SceneCommand(AquariumCommand::SetSpeedMultiplier(speed)));
            }

            let mut light = state.light_intensity();
            ui.label(SliderKind::LightIntensity.label());
            if ui
                .add(egui::Slider::new(
                    &mut light,
                    controls.light_range[0]..=controls.light_range[1],
                ))
                .changed()
            {
                commands.write(SceneCommand(AquariumCommand::SetLightIntensity(light)));
            }

            ui.separator();
            ui.horizontal(|ui| {
                for button in ButtonKind::ALL {
                    if ui.button(button.label()).clicked() {
                        commands.write(SceneCommand(button.command()));
                    }
                }
            });

            ui.separator();
            ui.label(format!(
                "Fish visible: {} / {}",
                state.school().visible_count(),
                state.school().len()
            ));
            ui.label(format!(
                "Squid: {}  Mirror: {}",
                on_off(state.squid_visible()),
                on_off(state.mirror_mode())
            ));
        });
}

fn on_off(value: bool) -> &'static str {
    if value {
        "on"
    } else {
        "off"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aquarium_core::LoadError;

    #[test]
    fn test_status_while_loading() {
        let loads = ModelLoads::default();
        let (color, text) = status_line(AppPhase::Loading, &loads);
        assert_eq!(color, egui::Color32::YELLOW);
        assert!(text.contains("(1/3)"), "{text}");
    }

    #[test]
    fn test_status_reports_failure() {
        let mut loads = ModelLoads::default();
        loads.sequence.fail(LoadError::Failed {
            step: LoadStep::SquidGeometry,
            path: "squid/missing.obj".to_string(),
            reason: "not found".to_string(),
        });
        let (color, text) = status_line(AppPhase::Failed, &loads);
        assert_eq!(color, egui::Color32::RED);
        assert!(text.contains("squid/missing.obj"), "{text}");
    }
}
