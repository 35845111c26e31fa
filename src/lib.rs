//! Garment Studio - interactive 3D garment customization preview.
//!
//! The crate is split the way data flows through a frame:
//! - `config` and `store` hold the immutable catalog and the mutable garment state
//! - `assets` loads glTF catalogs and decal images off the frame loop
//! - `interaction` turns pointer and keyboard input into state intents
//! - `render` smooths state toward its targets and hands frames to a surface
//! - `scene` assembles what a surface draws
//! - `ui` draws the egui panels and `app` hosts everything in a winit window

pub mod app;
pub mod assets;
pub mod config;
pub mod diagnostics;
pub mod interaction;
pub mod render;
pub mod scene;
pub mod store;
pub mod ui;
