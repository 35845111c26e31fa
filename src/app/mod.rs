mod egui_host;
mod input;
mod timing;

use crate::assets::{AssetEvent, AssetManager, CatalogState, DecalOrigin};
use crate::config::{serialization, DecalSide, DecalTarget, GarmentId, Registry};
use crate::diagnostics::Diagnostics;
use crate::interaction::InteractionController;
use crate::render::{FrameDamper, LogSurface, RenderSurface};
use crate::scene::{FrameScene, GarmentSlot};
use crate::store::{GarmentState, Intent, StateChange, Store};
use crate::ui::{showing_back, UiAction, UiState, UiView};
use egui_host::EguiHost;
use glam::Vec2;
use input::KeyAction;
use timing::FrameTiming;

use std::sync::Arc;
use std::time::{Duration, Instant};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{DeviceEvent, DeviceId, ElementState, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowAttributes, WindowId};

const WINDOW_TITLE: &str = "Garment Studio";
const DEFAULT_WINDOW_SIZE: PhysicalSize<u32> = PhysicalSize::new(1280, 720);

pub struct App {
    window: Option<Arc<Window>>,
    egui: Option<EguiHost>,
    diagnostics: Diagnostics,
    store: Store,
    assets: AssetManager,
    interaction: InteractionController,
    damper: FrameDamper,
    slot: GarmentSlot,
    ui: UiState,
    surface: Box<dyn RenderSurface>,
    cursor: Option<Vec2>,
    ui_wants_pointer: bool,
    ui_wants_keyboard: bool,
    timing: FrameTiming,
    target_frame_duration: Duration,
    next_frame_time: Instant,
}

impl App {
    pub fn new(registry: Registry, surface: Box<dyn RenderSurface>) -> Self {
        let mut app = Self::with_assets(registry, surface, AssetManager::new());
        if let Ok(requested) = std::env::var("GARMENT_STUDIO_MODEL") {
            let id = app
                .store
                .registry()
                .resolve_id(&requested, &app.diagnostics);
            if id != app.store.state().selected_model {
                app.dispatch(Intent::SelectModel(id));
            }
        }
        app
    }

    /// Host without a window yet, loading through `assets`. Starts preloading
    /// every catalog and the configured default decals.
    pub fn with_assets(
        registry: Registry,
        surface: Box<dyn RenderSurface>,
        assets: AssetManager,
    ) -> Self {
        let diagnostics = Diagnostics::to_log(registry.defaults().debug);
        let mut store = Store::new(registry);
        store.subscribe(Box::new(|change: &StateChange, state: &GarmentState| {
            log::debug!("State change {change:?} (model {})", state.selected_model);
        }));

        let mut app = Self {
            window: None,
            egui: None,
            damper: FrameDamper::new(store.state(), DEFAULT_WINDOW_SIZE.width as f32),
            diagnostics,
            store,
            assets,
            interaction: InteractionController::default(),
            slot: GarmentSlot::default(),
            ui: UiState::new(),
            surface,
            cursor: None,
            ui_wants_pointer: false,
            ui_wants_keyboard: false,
            timing: FrameTiming::new(WINDOW_TITLE.to_string(), Instant::now()),
            target_frame_duration: Duration::from_millis(16),
            next_frame_time: Instant::now(),
        };
        app.preload();
        app
    }

    /// Every model's catalog plus the configured default decals.
    fn preload(&mut self) {
        let registry = self.store.registry();
        for model in registry.models() {
            let path = registry.resolve_asset_path(&model.asset_path);
            self.assets.request_catalog(model.id, path);
        }
        for (target, path) in registry.defaults().decals.entries() {
            let path = registry.resolve_asset_path(path);
            self.assets.request_decal(target, path, DecalOrigin::Default);
        }
    }

    fn dispatch(&mut self, intent: Intent) {
        let changes = self.store.dispatch(intent, &self.diagnostics);
        for change in &changes {
            self.interaction.on_state_change(change);
            if let StateChange::ModelSelected { current, .. } = change {
                self.ensure_catalog(*current);
            }
        }
    }

    fn ensure_catalog(&mut self, model: GarmentId) {
        let registry = self.store.registry();
        let Some(descriptor) = registry.models().iter().find(|entry| entry.id == model) else {
            return;
        };
        let path = registry.resolve_asset_path(&descriptor.asset_path);
        if matches!(self.assets.catalog(model), Some(CatalogState::Failed(_))) {
            log::info!("Retrying catalog load for {model}");
            self.assets.reload_catalog(model, path);
        } else {
            self.assets.request_catalog(model, path);
        }
    }

    fn poll_assets(&mut self) {
        let selected = self.store.state().selected_model;
        for event in self.assets.poll(selected, &self.diagnostics) {
            match event {
                AssetEvent::CatalogReady { model } => {
                    log::info!("Catalog ready for {model}");
                }
                AssetEvent::CatalogFailed { model, error } => {
                    log::warn!("Catalog for {model} failed: {error}");
                }
                AssetEvent::DecalReady {
                    target,
                    origin,
                    image,
                } => {
                    let intent = match origin {
                        DecalOrigin::Upload => Intent::ApplyDecal { target, image },
                        DecalOrigin::Default => Intent::InstallDecal { target, image },
                    };
                    self.dispatch(intent);
                }
                AssetEvent::DecalFailed { target, error, .. } => {
                    log::warn!("Keeping previous {target} image: {error}");
                }
            }
        }
    }

    fn pick_decal(&mut self, target: DecalTarget) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Image", &["png", "jpg", "jpeg", "webp"])
            .pick_file()
        else {
            return;
        };
        log::info!("Loading {target} image from {}", path.display());
        self.assets.request_decal(target, path, DecalOrigin::Upload);
        self.ui.close_editor();
    }

    fn viewport_size(&self) -> Vec2 {
        let Some(window) = &self.window else {
            return Vec2::new(
                DEFAULT_WINDOW_SIZE.width as f32,
                DEFAULT_WINDOW_SIZE.height as f32,
            );
        };
        let size = window.inner_size().to_logical::<f32>(window.scale_factor());
        Vec2::new(size.width, size.height)
    }

    fn update_target_frame_duration(&mut self, window: &Window) {
        let mut target = Duration::from_millis(16);
        if let Some(millihz) = window
            .current_monitor()
            .and_then(|monitor| monitor.refresh_rate_millihertz())
        {
            let hz = millihz as f32 / 1000.0;
            if hz > 1.0 {
                target = Duration::from_secs_f32(1.0 / hz);
            }
        }
        self.target_frame_duration = target;
        self.next_frame_time = Instant::now() + self.target_frame_duration;
    }

    fn handle_key(&mut self, action: KeyAction, event_loop: &ActiveEventLoop) {
        match action {
            KeyAction::None => {}
            KeyAction::Quit => event_loop.exit(),
            KeyAction::Nudge { yaw, pitch } => {
                if let Some(intent) = self.interaction.nudge(yaw, pitch, self.store.state()) {
                    self.dispatch(intent);
                }
            }
            KeyAction::ResetRotation => self.dispatch(Intent::ResetRotation),
            KeyAction::FlipView => {
                let side = if showing_back(self.store.state()) {
                    DecalSide::Front
                } else {
                    DecalSide::Back
                };
                self.dispatch(Intent::ShowSide(side));
            }
        }
    }

    fn pointer_moved(&mut self, position: Vec2) {
        if self.cursor.is_none() {
            // Raw motion outside the window does not track the cursor exactly.
            self.interaction.reanchor(position);
        }
        self.cursor = Some(position);
        let viewport = self.viewport_size();
        if let Some(intent) =
            self.interaction
                .pointer_moved(position, viewport, self.store.state())
        {
            self.dispatch(intent);
        }
    }

    fn frame(&mut self) {
        let Some(window) = self.window.clone() else {
            return;
        };
        if let Some(title) = self.timing.update(Instant::now()) {
            window.set_title(&title);
        }
        let dt = self.timing.frame_dt;

        self.poll_assets();

        let mut actions = Vec::new();
        let ui_frame = match self.egui.as_mut() {
            Some(egui) => {
                let view = UiView {
                    state: self.store.state(),
                    registry: self.store.registry(),
                    pending_loads: self.assets.pending_loads(),
                    frame_dt: dt,
                };
                let ui = &mut self.ui;
                let output = egui.run_ui(&window, |ctx| {
                    actions = ui.show(ctx, &view);
                });
                self.ui_wants_pointer = output.wants_pointer_input;
                self.ui_wants_keyboard = output.wants_keyboard_input;
                output.frame
            }
            None => Default::default(),
        };
        for action in actions {
            match action {
                UiAction::Dispatch(intent) => self.dispatch(intent),
                UiAction::PickDecal(target) => self.pick_decal(target),
            }
        }

        let viewport = self.viewport_size();
        let state = self.store.state();
        let model = self
            .store
            .registry()
            .model(state.selected_model, &self.diagnostics);
        self.slot.sync(
            model,
            self.assets.catalog(model.id),
            state.base_color,
            &self.diagnostics,
        );
        let pose = self
            .damper
            .tick(state, self.interaction.ambient_target(), viewport.x, dt);
        let scene = FrameScene::assemble(state, model, self.slot.visual(), pose);
        self.surface.present(&scene, &ui_frame);
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attrs = WindowAttributes::default()
            .with_title(WINDOW_TITLE)
            .with_inner_size(DEFAULT_WINDOW_SIZE)
            .with_resizable(true);

        let window = Arc::new(
            event_loop
                .create_window(window_attrs)
                .expect("Failed to create window"),
        );

        let size = window.inner_size();
        self.surface.resize(size.width, size.height);
        self.egui = Some(EguiHost::new(&window));
        self.update_target_frame_duration(&window);
        self.window = Some(window);
        let width = self.viewport_size().x;
        self.damper = FrameDamper::new(self.store.state(), width);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let consumed = match (self.egui.as_mut(), self.window.as_ref()) {
            (Some(egui), Some(window)) => egui.on_window_event(window, &event),
            _ => false,
        };

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Focused(false) => {
                self.interaction.pointer_up();
                self.cursor = None;
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if consumed || self.ui_wants_keyboard {
                    return;
                }
                let pressed = event.state == ElementState::Pressed;
                self.handle_key(input::map_key(event.physical_key, pressed), event_loop);
            }
            WindowEvent::Resized(new_size) => {
                self.surface.resize(new_size.width, new_size.height);
                if let Some(window) = self.window.clone() {
                    self.update_target_frame_duration(&window);
                }
            }
            WindowEvent::Moved(_) => {
                if let Some(window) = self.window.clone() {
                    self.update_target_frame_duration(&window);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                let scale = self
                    .window
                    .as_ref()
                    .map(|window| window.scale_factor())
                    .unwrap_or(1.0);
                let logical = position.to_logical::<f32>(scale);
                self.pointer_moved(Vec2::new(logical.x, logical.y));
            }
            WindowEvent::CursorLeft { .. } => {
                self.cursor = None;
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => match state {
                ElementState::Pressed => {
                    let over_ui = consumed
                        || self.ui_wants_pointer
                        || self
                            .egui
                            .as_ref()
                            .is_some_and(|egui| egui.wants_pointer_input());
                    if let (false, Some(cursor)) = (over_ui, self.cursor) {
                        self.interaction.pointer_down(cursor, self.store.state());
                    }
                }
                ElementState::Released => self.interaction.pointer_up(),
            },
            WindowEvent::RedrawRequested => self.frame(),
            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        if !self.interaction.is_dragging() {
            return;
        }
        match event {
            DeviceEvent::Button {
                state: ElementState::Released,
                ..
            } => self.interaction.pointer_up(),
            DeviceEvent::MouseMotion { delta } if self.cursor.is_none() => {
                let scale = self
                    .window
                    .as_ref()
                    .map(|window| window.scale_factor())
                    .unwrap_or(1.0);
                let delta = Vec2::new((delta.0 / scale) as f32, (delta.1 / scale) as f32);
                if let Some(intent) = self.interaction.pointer_delta(delta, self.store.state()) {
                    self.dispatch(intent);
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        if now >= self.next_frame_time {
            if let Some(window) = &self.window {
                window.request_redraw();
            }
            self.next_frame_time = now + self.target_frame_duration;
        }
        event_loop.set_control_flow(ControlFlow::WaitUntil(self.next_frame_time));
    }
}

pub fn run() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    log::info!("Garment Studio");
    log::info!("   Drag to rotate in manual mode, ESC to exit");

    let registry = match serialization::registry_from_env() {
        Ok(registry) => registry,
        Err(err) => {
            log::error!("Invalid garment config, using builtin registry: {err}");
            Registry::builtin()
        }
    };

    let event_loop = EventLoop::new().expect("Failed to create event loop");
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = App::new(registry, Box::new(LogSurface::new()));
    event_loop.run_app(&mut app).expect("Event loop error");

    log::info!("Goodbye!");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{
        texture, AssetCatalog, AssetError, CatalogLoader, DecalImage, ImageDecoder,
    };
    use std::path::{Path, PathBuf};

    struct MissingCatalogs;

    impl CatalogLoader for MissingCatalogs {
        fn load_catalog(&self, path: &Path) -> Result<AssetCatalog, AssetError> {
            Err(AssetError::Read {
                path: path.display().to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
            })
        }
    }

    /// Decodes paths containing "good"; everything else is corrupt.
    struct PickyDecoder;

    impl ImageDecoder for PickyDecoder {
        fn decode_image(&self, path: &Path) -> Result<DecalImage, AssetError> {
            let name = path.display().to_string();
            if name.contains("good") {
                let bytes = texture::tests::png_bytes(2, 2, [200, 10, 10, 255]);
                return DecalImage::decode(&bytes, &name);
            }
            Err(AssetError::Read {
                path: name,
                source: std::io::Error::new(std::io::ErrorKind::InvalidData, "corrupt"),
            })
        }
    }

    fn app() -> App {
        let assets =
            AssetManager::with_loaders(Arc::new(MissingCatalogs), Arc::new(PickyDecoder));
        App::with_assets(Registry::builtin(), Box::new(LogSurface::new()), assets)
    }

    fn settle(app: &mut App) {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            app.poll_assets();
            if app.assets.pending_loads() == 0 || Instant::now() > deadline {
                break;
            }
            std::thread::sleep(Duration::from_millis(2));
        }
    }

    #[test]
    fn failed_upload_keeps_previous_decal_and_visibility() {
        let mut app = app();
        settle(&mut app);
        let front = DecalTarget::Logo(DecalSide::Front);

        app.assets
            .request_decal(front, PathBuf::from("good-front.png"), DecalOrigin::Upload);
        settle(&mut app);
        let applied = app
            .store
            .state()
            .front_decal
            .as_ref()
            .map(|image| image.source_hash().to_string())
            .expect("upload applied");
        assert!(app.store.state().show_front_logo);

        app.dispatch(Intent::SetLogoVisible {
            side: DecalSide::Front,
            visible: false,
        });
        app.assets
            .request_decal(front, PathBuf::from("corrupt-front.png"), DecalOrigin::Upload);
        settle(&mut app);

        let state = app.store.state();
        assert_eq!(
            state.front_decal.as_ref().map(|image| image.label()),
            Some("good-front.png")
        );
        assert_eq!(
            state.front_decal.as_ref().map(|image| image.source_hash()),
            Some(applied.as_str())
        );
        assert!(!state.show_front_logo);
    }

    #[test]
    fn failed_catalog_reloads_when_its_model_is_selected_again() {
        let mut app = app();
        settle(&mut app);
        assert_eq!(app.store.state().selected_model, GarmentId::Shirt);
        assert!(matches!(
            app.assets.catalog(GarmentId::Hoodie),
            Some(CatalogState::Failed(_))
        ));

        app.dispatch(Intent::SelectModel(GarmentId::Hoodie));
        assert!(matches!(
            app.assets.catalog(GarmentId::Hoodie),
            Some(CatalogState::Pending)
        ));

        settle(&mut app);
        assert!(matches!(
            app.assets.catalog(GarmentId::Hoodie),
            Some(CatalogState::Failed(_))
        ));
    }
}
