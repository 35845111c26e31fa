use crate::render::UiFrame;
use egui_winit::winit::event::WindowEvent;
use winit::window::Window;

pub struct EguiOutput {
    pub frame: UiFrame,
    pub wants_pointer_input: bool,
    pub wants_keyboard_input: bool,
}

/// Feeds winit events into egui and tessellates the panels each frame.
pub struct EguiHost {
    context: egui::Context,
    winit_state: egui_winit::State,
}

impl EguiHost {
    pub fn new(window: &Window) -> Self {
        let context = egui::Context::default();
        let winit_state = egui_winit::State::new(
            context.clone(),
            egui::ViewportId::ROOT,
            window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );

        Self {
            context,
            winit_state,
        }
    }

    /// Returns true when egui consumed the event.
    pub fn on_window_event(&mut self, window: &Window, event: &WindowEvent) -> bool {
        self.winit_state.on_window_event(window, event).consumed
    }

    /// Whether the pointer is over a panel or a widget is being dragged.
    pub fn wants_pointer_input(&self) -> bool {
        self.context.wants_pointer_input() || self.context.is_pointer_over_area()
    }

    pub fn run_ui<F>(&mut self, window: &Window, run_ui: F) -> EguiOutput
    where
        F: FnMut(&egui::Context),
    {
        let raw_input = self.winit_state.take_egui_input(window);
        let full_output = self.context.run(raw_input, run_ui);
        self.winit_state
            .handle_platform_output(window, full_output.platform_output);
        let pixels_per_point = full_output.pixels_per_point;
        let clipped_primitives = self
            .context
            .tessellate(full_output.shapes, pixels_per_point);
        let size = window.inner_size();

        EguiOutput {
            frame: UiFrame {
                clipped_primitives,
                textures_delta: full_output.textures_delta,
                pixels_per_point,
                screen_size_px: [size.width.max(1), size.height.max(1)],
            },
            wants_pointer_input: self.context.wants_pointer_input(),
            wants_keyboard_input: self.context.wants_keyboard_input(),
        }
    }
}
