mod tabs;

pub use tabs::{showing_back, EditorTab, FilterTab, TabIcon};

use crate::config::{DecalSide, DecalTarget, HexColor, Registry};
use crate::render::damping::wrap_angle;
use crate::store::{Axis, GarmentState, Intent, RotationMode};
use egui::{Color32, Context, RichText, Slider};
use glam::Vec3;

const ROTATION_STEP_DEGREES: f64 = 5.0;
const POSITION_RANGE: std::ops::RangeInclusive<f32> = -0.5..=0.5;

/// Something the panels asked the host to do this frame.
#[derive(Debug, Clone, PartialEq)]
pub enum UiAction {
    Dispatch(Intent),
    /// Open a file dialog and load the chosen image into `target`.
    PickDecal(DecalTarget),
}

/// Read-only inputs for one UI pass.
pub struct UiView<'a> {
    pub state: &'a GarmentState,
    pub registry: &'a Registry,
    pub pending_loads: usize,
    pub frame_dt: f32,
}

/// Panel layout state that is not part of the garment itself.
pub struct UiState {
    active_editor: Option<EditorTab>,
    logo_side: DecalSide,
}

impl Default for UiState {
    fn default() -> Self {
        Self::new()
    }
}

impl UiState {
    pub fn new() -> Self {
        Self {
            active_editor: None,
            logo_side: DecalSide::Front,
        }
    }

    pub fn active_editor(&self) -> Option<EditorTab> {
        self.active_editor
    }

    /// Clicking the active tab closes it.
    pub fn toggle_editor(&mut self, tab: EditorTab) {
        self.active_editor = if self.active_editor == Some(tab) {
            None
        } else {
            Some(tab)
        };
    }

    /// Called after an upload was picked so the editor collapses.
    pub fn close_editor(&mut self) {
        self.active_editor = None;
    }

    pub fn show(&mut self, ctx: &Context, view: &UiView<'_>) -> Vec<UiAction> {
        let mut actions = Vec::new();
        if view.state.intro {
            intro_panel(ctx, &mut actions);
        } else {
            self.customizer(ctx, view, &mut actions);
        }
        if view.state.debug {
            debug_window(ctx, view);
        }
        actions
    }

    fn customizer(&mut self, ctx: &Context, view: &UiView<'_>, actions: &mut Vec<UiAction>) {
        let state = view.state;

        egui::SidePanel::left("editor_tabs")
            .resizable(false)
            .show(ctx, |ui| {
                ui.add_space(8.0);
                for tab in EditorTab::ALL {
                    let active = self.active_editor == Some(tab);
                    let text = tab.icon().button_text(tab.label());
                    if ui
                        .selectable_label(active, RichText::new(text).size(18.0))
                        .on_hover_text(tab.label())
                        .clicked()
                    {
                        self.toggle_editor(tab);
                    }
                }
            });

        if let Some(tab) = self.active_editor {
            egui::Window::new(tab.label())
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::LEFT_TOP, [8.0, 8.0])
                .show(ctx, |ui| match tab {
                    EditorTab::ColorPicker => color_picker(ui, view, actions),
                    EditorTab::FilePicker => file_picker(ui, actions),
                    EditorTab::ModelPicker => model_picker(ui, view, actions),
                    EditorTab::RotationControl => rotation_control(ui, state, actions),
                    EditorTab::LogoControl => {
                        logo_control(ui, view, &mut self.logo_side, actions)
                    }
                });
        }

        egui::TopBottomPanel::top("customizer_header").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.button("Go Back").clicked() {
                    actions.push(UiAction::Dispatch(Intent::SetIntro(true)));
                }
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let mut debug = state.debug;
                    if ui.checkbox(&mut debug, "Debug").changed() {
                        actions.push(UiAction::Dispatch(Intent::SetDebug(debug)));
                    }
                });
            });
        });

        egui::TopBottomPanel::bottom("filter_tabs").show(ctx, |ui| {
            ui.horizontal(|ui| {
                for tab in FilterTab::ALL {
                    let text = tab.icon().button_text(tab.label());
                    if ui
                        .selectable_label(tab.is_active(state), text)
                        .on_hover_text(tab.label())
                        .clicked()
                    {
                        actions.push(UiAction::Dispatch(tab.toggle(state)));
                    }
                }
            });
        });
    }
}

fn intro_panel(ctx: &Context, actions: &mut Vec<UiAction>) {
    egui::Area::new(egui::Id::new("intro"))
        .anchor(egui::Align2::LEFT_CENTER, [48.0, 0.0])
        .show(ctx, |ui| {
            ui.label(RichText::new("LET'S DO IT.").size(48.0).strong());
            ui.label("Create your unique and exclusive shirt. Pick a color, drop in a logo, and make it yours.");
            ui.add_space(12.0);
            if ui.button(RichText::new("Customize It").size(18.0)).clicked() {
                actions.push(UiAction::Dispatch(Intent::SetIntro(false)));
            }
        });
}

fn swatch(color: HexColor) -> Color32 {
    let [r, g, b] = color.rgb();
    Color32::from_rgb(r, g, b)
}

fn color_picker(ui: &mut egui::Ui, view: &UiView<'_>, actions: &mut Vec<UiAction>) {
    let current = view.state.base_color;
    egui::Grid::new("color_presets")
        .spacing([4.0, 4.0])
        .show(ui, |ui| {
            for (index, preset) in view.registry.color_presets().iter().enumerate() {
                let button = egui::Button::new("")
                    .fill(swatch(preset.color))
                    .min_size(egui::vec2(24.0, 24.0))
                    .selected(preset.color == current);
                if ui.add(button).on_hover_text(&preset.name).clicked() {
                    actions.push(UiAction::Dispatch(Intent::SetBaseColor(preset.color)));
                }
                if index % 4 == 3 {
                    ui.end_row();
                }
            }
        });
    ui.separator();
    let mut rgb = current.rgb();
    ui.horizontal(|ui| {
        if egui::color_picker::color_edit_button_srgb(ui, &mut rgb).changed() {
            let [r, g, b] = rgb;
            actions.push(UiAction::Dispatch(Intent::SetBaseColor(HexColor::from_rgb(
                r, g, b,
            ))));
        }
        ui.monospace(current.to_string());
    });
}

fn file_picker(ui: &mut egui::Ui, actions: &mut Vec<UiAction>) {
    ui.label("Upload an image (PNG or JPEG)");
    ui.horizontal(|ui| {
        for (label, target) in [
            ("Front logo", DecalTarget::Logo(DecalSide::Front)),
            ("Back logo", DecalTarget::Logo(DecalSide::Back)),
            ("Full pattern", DecalTarget::FullPattern),
        ] {
            if ui.button(label).clicked() {
                actions.push(UiAction::PickDecal(target));
            }
        }
    });
}

fn model_picker(ui: &mut egui::Ui, view: &UiView<'_>, actions: &mut Vec<UiAction>) {
    for model in view.registry.models() {
        let selected = model.id == view.state.selected_model;
        if ui
            .selectable_label(selected, &model.display_name)
            .clicked()
            && !selected
        {
            actions.push(UiAction::Dispatch(Intent::SelectModel(model.id)));
        }
    }
}

/// Degrees shown by a rotation slider for `radians`, wrapped to one turn.
fn slider_degrees(radians: f32) -> f64 {
    f64::from(wrap_angle(radians).to_degrees())
}

/// True only for edits the user made this frame. A slider also reports a
/// change when it snaps its bound value onto the step grid.
fn user_edited(response: &egui::Response) -> bool {
    response.changed()
        && (response.dragged()
            || response.drag_stopped()
            || response.is_pointer_button_down_on()
            || response.has_focus()
            || response.lost_focus())
}

fn rotation_control(ui: &mut egui::Ui, state: &GarmentState, actions: &mut Vec<UiAction>) {
    let mut manual = state.rotation_mode == RotationMode::Manual;
    if ui.checkbox(&mut manual, "Manual rotation").changed() {
        let mode = if manual {
            RotationMode::Manual
        } else {
            RotationMode::Automatic
        };
        actions.push(UiAction::Dispatch(Intent::SetRotationMode(mode)));
    }
    ui.add_enabled_ui(manual, |ui| {
        for axis in Axis::ALL {
            let mut degrees = slider_degrees(state.manual_rotation[axis.index()]);
            let slider = Slider::new(&mut degrees, -180.0..=180.0)
                .step_by(ROTATION_STEP_DEGREES)
                .suffix("°")
                .text(axis.label());
            if user_edited(&ui.add(slider)) {
                actions.push(UiAction::Dispatch(Intent::SetManualRotationAxis {
                    axis,
                    radians: (degrees as f32).to_radians(),
                }));
            }
        }
        if ui.button("Reset rotation").clicked() {
            actions.push(UiAction::Dispatch(Intent::ResetRotation));
        }
    });
}

fn logo_control(
    ui: &mut egui::Ui,
    view: &UiView<'_>,
    side: &mut DecalSide,
    actions: &mut Vec<UiAction>,
) {
    let state = view.state;
    let model = view
        .registry
        .models()
        .iter()
        .find(|model| model.id == state.selected_model)
        .unwrap_or_else(|| view.registry.default_model());
    if model.decal_exempt {
        ui.label(format!(
            "{} uses its own artwork; logo placement is disabled.",
            model.display_name
        ));
        return;
    }

    ui.horizontal(|ui| {
        ui.radio_value(side, DecalSide::Front, "Front");
        ui.radio_value(side, DecalSide::Back, "Back");
    });
    let side = *side;

    let mut visible = state.logo_visible(side);
    if ui.checkbox(&mut visible, "Show logo").changed() {
        actions.push(UiAction::Dispatch(Intent::SetLogoVisible { side, visible }));
    }

    let placement = state.placement(side);
    let limits = view.registry.logo_scale();
    let mut scale = placement.scale;
    if user_edited(&ui.add(Slider::new(&mut scale, limits.min..=limits.max).text("Scale"))) {
        actions.push(UiAction::Dispatch(Intent::SetPlacementScale { side, scale }));
    }

    ui.label("Rotation");
    let rotation = placement.rotation.unwrap_or(Vec3::ZERO);
    let mut degrees = [
        slider_degrees(rotation.x),
        slider_degrees(rotation.y),
        slider_degrees(rotation.z),
    ];
    let mut rotation_changed = false;
    for axis in Axis::ALL {
        let slider = Slider::new(&mut degrees[axis.index()], -180.0..=180.0)
            .step_by(ROTATION_STEP_DEGREES)
            .suffix("°")
            .text(axis.label());
        rotation_changed |= user_edited(&ui.add(slider));
    }
    if rotation_changed {
        let rotation = Vec3::new(
            (degrees[0] as f32).to_radians(),
            (degrees[1] as f32).to_radians(),
            (degrees[2] as f32).to_radians(),
        );
        actions.push(UiAction::Dispatch(Intent::SetPlacementRotation { side, rotation }));
    }

    ui.label("Position");
    let mut position = placement.position;
    let mut position_changed = false;
    for axis in Axis::ALL {
        let slider = Slider::new(&mut position[axis.index()], POSITION_RANGE)
            .step_by(0.01)
            .text(axis.label());
        position_changed |= user_edited(&ui.add(slider));
    }
    if position_changed {
        actions.push(UiAction::Dispatch(Intent::SetPlacementPosition { side, position }));
    }

    if ui.button("Reset to model defaults").clicked() {
        actions.push(UiAction::Dispatch(Intent::ResetPlacement(side)));
    }
}

fn debug_window(ctx: &Context, view: &UiView<'_>) {
    let state = view.state;
    egui::Window::new("Debug")
        .anchor(egui::Align2::RIGHT_TOP, [-8.0, 40.0])
        .resizable(false)
        .show(ctx, |ui| {
            egui::Grid::new("debug_state")
                .num_columns(2)
                .striped(true)
                .show(ui, |ui| {
                    let mut row = |label: &str, value: String| {
                        ui.label(label);
                        ui.monospace(value);
                        ui.end_row();
                    };
                    row("Model", state.selected_model.to_string());
                    row("Color", state.base_color.to_string());
                    row(
                        "Textures",
                        format!(
                            "logo={} pattern={}",
                            state.texture_mode.logo_overlay, state.texture_mode.full_pattern
                        ),
                    );
                    row(
                        "Logos shown",
                        format!(
                            "front={} back={}",
                            state.show_front_logo, state.show_back_logo
                        ),
                    );
                    for side in [DecalSide::Front, DecalSide::Back] {
                        let placement = state.placement(side);
                        row(
                            if side == DecalSide::Front {
                                "Front placement"
                            } else {
                                "Back placement"
                            },
                            format!(
                                "pos {:.3} scale {:.3}",
                                placement.position, placement.scale
                            ),
                        );
                    }
                    row("Rotation mode", state.rotation_mode.to_string());
                    row("Manual rotation", format!("{:.3}", state.manual_rotation));
                    row("Pending loads", view.pending_loads.to_string());
                    let fps = if view.frame_dt > 0.0 {
                        1.0 / view.frame_dt
                    } else {
                        0.0
                    };
                    row("Frame", format!("{:.2} ms ({fps:.0} fps)", view.frame_dt * 1000.0));
                });
        });
}
