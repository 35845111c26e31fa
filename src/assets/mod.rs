pub mod catalog;
pub mod resolve;
pub mod texture;

pub use catalog::{AssetCatalog, CatalogNode, GeometryRef, MaterialRef};
pub use resolve::{GeometryResolution, MaterialResolution, ResolvedGarment};
pub use texture::{DecalImage, TextureId};

use crate::config::{DecalTarget, GarmentId};
use crate::diagnostics::{Diagnostic, Diagnostics};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse glTF {path}: {source}")]
    ParseGltf {
        path: String,
        #[source]
        source: gltf::Error,
    },
    #[error("failed to decode image {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: ::image::ImageError,
    },
    #[error("failed to start loader thread: {0}")]
    WorkerSpawn(#[source] std::io::Error),
}

/// Produces the node/material catalog of a garment asset.
pub trait CatalogLoader: Send + Sync + 'static {
    fn load_catalog(&self, path: &Path) -> Result<AssetCatalog, AssetError>;
}

/// Turns a user-selected file into a decal texture.
pub trait ImageDecoder: Send + Sync + 'static {
    fn decode_image(&self, path: &Path) -> Result<DecalImage, AssetError>;
}

pub struct GltfLoader;

impl CatalogLoader for GltfLoader {
    fn load_catalog(&self, path: &Path) -> Result<AssetCatalog, AssetError> {
        AssetCatalog::from_gltf_path(path)
    }
}

pub struct FileImageDecoder;

impl ImageDecoder for FileImageDecoder {
    fn decode_image(&self, path: &Path) -> Result<DecalImage, AssetError> {
        DecalImage::open(path)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    pub model: GarmentId,
    pub generation: u64,
}

#[derive(Debug, Clone)]
pub enum CatalogState {
    Pending,
    Ready(Arc<AssetCatalog>),
    Failed(String),
}

/// Why a decal image is being loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecalOrigin {
    /// Configured default, installed without touching display flags.
    Default,
    /// Picked by the user.
    Upload,
}

#[derive(Debug)]
pub enum AssetEvent {
    /// The selected model's catalog finished loading.
    CatalogReady { model: GarmentId },
    CatalogFailed { model: GarmentId, error: String },
    DecalReady {
        target: DecalTarget,
        origin: DecalOrigin,
        image: DecalImage,
    },
    DecalFailed {
        target: DecalTarget,
        origin: DecalOrigin,
        error: String,
    },
}

enum WorkerMessage {
    Catalog {
        ticket: LoadTicket,
        result: Result<AssetCatalog, AssetError>,
    },
    Decal {
        target: DecalTarget,
        origin: DecalOrigin,
        generation: u64,
        path: PathBuf,
        result: Result<DecalImage, AssetError>,
    },
}

/// Loads garment catalogs and decal images off the frame loop.
///
/// Work runs on short-lived threads and reports back over a channel that
/// [`AssetManager::poll`] drains once per frame. Catalogs are cached per
/// model; a catalog that lands after its model was deselected is cached but
/// never announced, so it cannot replace the visible garment.
pub struct AssetManager {
    catalog_loader: Arc<dyn CatalogLoader>,
    image_decoder: Arc<dyn ImageDecoder>,
    sender: Sender<WorkerMessage>,
    receiver: Receiver<WorkerMessage>,
    catalogs: HashMap<GarmentId, CatalogState>,
    latest_generation: HashMap<GarmentId, u64>,
    latest_decal: HashMap<DecalTarget, u64>,
    /// Targets the user uploaded to; configured defaults no longer apply.
    uploaded: HashSet<DecalTarget>,
    next_generation: u64,
    pending_decals: usize,
}

impl AssetManager {
    pub fn new() -> Self {
        Self::with_loaders(Arc::new(GltfLoader), Arc::new(FileImageDecoder))
    }

    pub fn with_loaders(
        catalog_loader: Arc<dyn CatalogLoader>,
        image_decoder: Arc<dyn ImageDecoder>,
    ) -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            catalog_loader,
            image_decoder,
            sender,
            receiver,
            catalogs: HashMap::new(),
            latest_generation: HashMap::new(),
            latest_decal: HashMap::new(),
            uploaded: HashSet::new(),
            next_generation: 1,
            pending_decals: 0,
        }
    }

    pub fn catalog(&self, model: GarmentId) -> Option<&CatalogState> {
        self.catalogs.get(&model)
    }

    pub fn pending_loads(&self) -> usize {
        let catalogs = self
            .catalogs
            .values()
            .filter(|state| matches!(state, CatalogState::Pending))
            .count();
        catalogs + self.pending_decals
    }

    /// Start loading `model` unless it is cached or already in flight.
    pub fn request_catalog(&mut self, model: GarmentId, path: PathBuf) -> Option<LoadTicket> {
        if matches!(
            self.catalogs.get(&model),
            Some(CatalogState::Pending | CatalogState::Ready(_))
        ) {
            return None;
        }
        Some(self.spawn_catalog_load(model, path))
    }

    /// Drop any cached catalog for `model` and load it again.
    pub fn reload_catalog(&mut self, model: GarmentId, path: PathBuf) -> LoadTicket {
        self.spawn_catalog_load(model, path)
    }

    fn spawn_catalog_load(&mut self, model: GarmentId, path: PathBuf) -> LoadTicket {
        let ticket = LoadTicket {
            model,
            generation: self.next_generation,
        };
        self.next_generation += 1;
        self.latest_generation.insert(model, ticket.generation);
        self.catalogs.insert(model, CatalogState::Pending);

        log::info!("Loading garment catalog {} from {}", model, path.display());
        let loader = Arc::clone(&self.catalog_loader);
        let sender = self.sender.clone();
        let spawned = std::thread::Builder::new()
            .name(format!("catalog-{model}"))
            .spawn(move || {
                let result = loader.load_catalog(&path);
                let _ = sender.send(WorkerMessage::Catalog { ticket, result });
            });
        if let Err(err) = spawned {
            let error = AssetError::WorkerSpawn(err).to_string();
            self.catalogs.insert(model, CatalogState::Failed(error));
        }
        ticket
    }

    /// Start decoding an image for `target`. Only the most recent request per
    /// target is reported, and defaults are skipped once the user uploaded.
    pub fn request_decal(&mut self, target: DecalTarget, path: PathBuf, origin: DecalOrigin) {
        match origin {
            DecalOrigin::Default if self.uploaded.contains(&target) => {
                log::debug!("Skipping default {target} image, an upload replaced it");
                return;
            }
            DecalOrigin::Default => {}
            DecalOrigin::Upload => {
                self.uploaded.insert(target);
            }
        }
        let generation = self.next_generation;
        self.next_generation += 1;
        self.latest_decal.insert(target, generation);

        let decoder = Arc::clone(&self.image_decoder);
        let sender = self.sender.clone();
        let worker_path = path.clone();
        let spawned = std::thread::Builder::new()
            .name("decal-decode".to_string())
            .spawn(move || {
                let result = decoder.decode_image(&worker_path);
                let _ = sender.send(WorkerMessage::Decal {
                    target,
                    origin,
                    generation,
                    path: worker_path,
                    result,
                });
            });
        match spawned {
            Ok(_) => self.pending_decals += 1,
            Err(err) => {
                let _ = self.sender.send(WorkerMessage::Decal {
                    target,
                    origin,
                    generation,
                    path,
                    result: Err(AssetError::WorkerSpawn(err)),
                });
                self.pending_decals += 1;
            }
        }
    }

    /// Collect finished work. `selected` is the model currently on screen.
    pub fn poll(&mut self, selected: GarmentId, diagnostics: &Diagnostics) -> Vec<AssetEvent> {
        let mut events = Vec::new();
        loop {
            let message = match self.receiver.try_recv() {
                Ok(message) => message,
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            };
            match message {
                WorkerMessage::Catalog { ticket, result } => {
                    if let Some(event) = self.finish_catalog(ticket, result, selected, diagnostics)
                    {
                        events.push(event);
                    }
                }
                WorkerMessage::Decal {
                    target,
                    origin,
                    generation,
                    path,
                    result,
                } => {
                    self.pending_decals = self.pending_decals.saturating_sub(1);
                    if self.latest_decal.get(&target) != Some(&generation) {
                        log::debug!(
                            "Ignoring superseded {target} image {} #{generation}",
                            path.display()
                        );
                        continue;
                    }
                    let path = path.display().to_string();
                    match result {
                        Ok(image) => {
                            diagnostics.emit(Diagnostic::DecalLoaded {
                                target,
                                path,
                                hash: image.source_hash().to_string(),
                            });
                            events.push(AssetEvent::DecalReady {
                                target,
                                origin,
                                image,
                            });
                        }
                        Err(err) => {
                            let error = err.to_string();
                            diagnostics.emit(Diagnostic::DecalLoadFailed {
                                target,
                                path,
                                error: error.clone(),
                            });
                            events.push(AssetEvent::DecalFailed {
                                target,
                                origin,
                                error,
                            });
                        }
                    }
                }
            }
        }
        events
    }

    fn finish_catalog(
        &mut self,
        ticket: LoadTicket,
        result: Result<AssetCatalog, AssetError>,
        selected: GarmentId,
        diagnostics: &Diagnostics,
    ) -> Option<AssetEvent> {
        if self.latest_generation.get(&ticket.model) != Some(&ticket.generation) {
            log::debug!(
                "Ignoring superseded catalog load {} #{}",
                ticket.model,
                ticket.generation
            );
            return None;
        }

        let (state, event) = match result {
            Ok(catalog) => (
                CatalogState::Ready(Arc::new(catalog)),
                AssetEvent::CatalogReady {
                    model: ticket.model,
                },
            ),
            Err(err) => {
                let error = err.to_string();
                diagnostics.emit(Diagnostic::AssetLoadFailed {
                    asset: ticket.model.to_string(),
                    error: error.clone(),
                });
                (
                    CatalogState::Failed(error.clone()),
                    AssetEvent::CatalogFailed {
                        model: ticket.model,
                        error,
                    },
                )
            }
        };
        self.catalogs.insert(ticket.model, state);

        if ticket.model != selected {
            diagnostics.emit(Diagnostic::StaleLoadDiscarded {
                model: ticket.model,
                selected,
            });
            return None;
        }
        Some(event)
    }
}

impl Default for AssetManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DecalSide;
    use crate::diagnostics::MemorySink;
    use std::rc::Rc;
    use std::sync::Mutex;
    use std::time::{Duration, Instant};

    /// Catalog loader that blocks until the test releases a model.
    struct GatedLoader {
        released: Mutex<Vec<String>>,
    }

    impl GatedLoader {
        fn release(&self, name: &str) {
            self.released.lock().unwrap().push(name.to_string());
        }
    }

    impl CatalogLoader for GatedLoader {
        fn load_catalog(&self, path: &Path) -> Result<AssetCatalog, AssetError> {
            let name = path.to_string_lossy().to_string();
            let deadline = Instant::now() + Duration::from_secs(5);
            while !self.released.lock().unwrap().contains(&name) && Instant::now() < deadline {
                std::thread::sleep(Duration::from_millis(2));
            }
            if name.contains("broken") {
                return Err(AssetError::Read {
                    path: name,
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
                });
            }
            Ok(AssetCatalog::new(
                vec![CatalogNode {
                    name: name.clone(),
                    geometry: Some(GeometryRef {
                        node: name,
                        mesh_index: 0,
                        primitive_count: 1,
                        vertex_count: 3,
                    }),
                }],
                Vec::new(),
            ))
        }
    }

    struct StaticDecoder;

    impl ImageDecoder for StaticDecoder {
        fn decode_image(&self, path: &Path) -> Result<DecalImage, AssetError> {
            let bytes = std::fs::read(path).map_err(|source| AssetError::Read {
                path: path.display().to_string(),
                source,
            })?;
            DecalImage::decode(&bytes, "upload.png")
        }
    }

    /// Image decoder that blocks until the test releases a path.
    struct GatedDecoder {
        released: Mutex<Vec<String>>,
    }

    impl GatedDecoder {
        fn release(&self, name: &str) {
            self.released.lock().unwrap().push(name.to_string());
        }
    }

    impl ImageDecoder for GatedDecoder {
        fn decode_image(&self, path: &Path) -> Result<DecalImage, AssetError> {
            let name = path.to_string_lossy().to_string();
            let deadline = Instant::now() + Duration::from_secs(5);
            while !self.released.lock().unwrap().contains(&name) && Instant::now() < deadline {
                std::thread::sleep(Duration::from_millis(2));
            }
            DecalImage::decode(&texture::tests::png_bytes(1, 1, [1, 2, 3, 255]), &name)
        }
    }

    fn gated_decals() -> (AssetManager, Arc<GatedDecoder>) {
        let decoder = Arc::new(GatedDecoder {
            released: Mutex::new(Vec::new()),
        });
        let loader = Arc::new(GatedLoader {
            released: Mutex::new(Vec::new()),
        });
        (AssetManager::with_loaders(loader, decoder.clone()), decoder)
    }

    fn decal_labels(events: &[AssetEvent]) -> Vec<(DecalOrigin, String)> {
        events
            .iter()
            .filter_map(|event| match event {
                AssetEvent::DecalReady { origin, image, .. } => {
                    Some((*origin, image.label().to_string()))
                }
                _ => None,
            })
            .collect()
    }

    fn manager() -> (AssetManager, Arc<GatedLoader>) {
        let loader = Arc::new(GatedLoader {
            released: Mutex::new(Vec::new()),
        });
        let manager = AssetManager::with_loaders(loader.clone(), Arc::new(StaticDecoder));
        (manager, loader)
    }

    fn poll_until<F>(
        manager: &mut AssetManager,
        selected: GarmentId,
        diagnostics: &Diagnostics,
        mut done: F,
    ) -> Vec<AssetEvent>
    where
        F: FnMut(&AssetManager) -> bool,
    {
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut events = Vec::new();
        while Instant::now() < deadline {
            events.extend(manager.poll(selected, diagnostics));
            if done(manager) {
                break;
            }
            std::thread::sleep(Duration::from_millis(2));
        }
        events
    }

    #[test]
    fn catalog_for_selected_model_is_announced() {
        let (mut manager, loader) = manager();
        let diagnostics = Diagnostics::new(Rc::new(MemorySink::default()), false);

        let ticket = manager
            .request_catalog(GarmentId::Shirt, PathBuf::from("shirt"))
            .unwrap();
        assert_eq!(ticket.model, GarmentId::Shirt);
        assert!(matches!(
            manager.catalog(GarmentId::Shirt),
            Some(CatalogState::Pending)
        ));
        assert!(manager
            .request_catalog(GarmentId::Shirt, PathBuf::from("shirt"))
            .is_none());

        loader.release("shirt");
        let events = poll_until(&mut manager, GarmentId::Shirt, &diagnostics, |m| {
            m.pending_loads() == 0
        });
        assert!(matches!(
            events.as_slice(),
            [AssetEvent::CatalogReady {
                model: GarmentId::Shirt
            }]
        ));
        assert!(matches!(
            manager.catalog(GarmentId::Shirt),
            Some(CatalogState::Ready(_))
        ));
    }

    #[test]
    fn late_catalog_for_deselected_model_is_cached_not_announced() {
        let (mut manager, loader) = manager();
        let sink = Rc::new(MemorySink::default());
        let diagnostics = Diagnostics::new(sink.clone(), true);

        manager.request_catalog(GarmentId::Hoodie, PathBuf::from("hoodie"));
        loader.release("hoodie");
        let events = poll_until(&mut manager, GarmentId::Shirt, &diagnostics, |m| {
            m.pending_loads() == 0
        });

        assert!(events.is_empty());
        assert!(matches!(
            manager.catalog(GarmentId::Hoodie),
            Some(CatalogState::Ready(_))
        ));
        assert!(sink.events().contains(&Diagnostic::StaleLoadDiscarded {
            model: GarmentId::Hoodie,
            selected: GarmentId::Shirt,
        }));
    }

    #[test]
    fn superseded_generation_is_ignored() {
        let (mut manager, loader) = manager();
        let diagnostics = Diagnostics::new(Rc::new(MemorySink::default()), false);

        let first = manager.reload_catalog(GarmentId::Shirt, PathBuf::from("broken-shirt"));
        let second = manager.reload_catalog(GarmentId::Shirt, PathBuf::from("shirt"));
        assert!(second.generation > first.generation);

        loader.release("shirt");
        loader.release("broken-shirt");
        let events = poll_until(&mut manager, GarmentId::Shirt, &diagnostics, |m| {
            m.pending_loads() == 0
        });
        // Give the superseded worker time to report as well.
        std::thread::sleep(Duration::from_millis(50));
        let mut events = events;
        events.extend(manager.poll(GarmentId::Shirt, &diagnostics));

        assert!(events
            .iter()
            .all(|event| matches!(event, AssetEvent::CatalogReady { .. })));
        assert!(matches!(
            manager.catalog(GarmentId::Shirt),
            Some(CatalogState::Ready(_))
        ));
    }

    #[test]
    fn failed_catalog_is_reported_and_remembered() {
        let (mut manager, loader) = manager();
        let diagnostics = Diagnostics::new(Rc::new(MemorySink::default()), false);

        manager.request_catalog(GarmentId::Shirt, PathBuf::from("broken"));
        loader.release("broken");
        let events = poll_until(&mut manager, GarmentId::Shirt, &diagnostics, |m| {
            m.pending_loads() == 0
        });
        assert!(matches!(
            events.as_slice(),
            [AssetEvent::CatalogFailed { .. }]
        ));
        assert!(matches!(
            manager.catalog(GarmentId::Shirt),
            Some(CatalogState::Failed(_))
        ));
    }

    #[test]
    fn decal_decode_success_and_failure_are_events() {
        let (mut manager, _loader) = manager();
        let diagnostics = Diagnostics::new(Rc::new(MemorySink::default()), false);

        let mut good = std::env::temp_dir();
        good.push(format!("garment_studio_decal_{}.png", std::process::id()));
        std::fs::write(&good, texture::tests::png_bytes(2, 2, [9, 9, 9, 255])).unwrap();

        manager.request_decal(
            DecalTarget::Logo(DecalSide::Back),
            good.clone(),
            DecalOrigin::Upload,
        );
        manager.request_decal(
            DecalTarget::FullPattern,
            PathBuf::from("/definitely/not/here.png"),
            DecalOrigin::Default,
        );
        let events = poll_until(&mut manager, GarmentId::Shirt, &diagnostics, |m| {
            m.pending_loads() == 0
        });
        let _ = std::fs::remove_file(good);

        assert_eq!(events.len(), 2);
        assert!(events.iter().any(|event| matches!(
            event,
            AssetEvent::DecalReady {
                target: DecalTarget::Logo(DecalSide::Back),
                ..
            }
        )));
        assert!(events.iter().any(|event| matches!(
            event,
            AssetEvent::DecalFailed {
                target: DecalTarget::FullPattern,
                origin: DecalOrigin::Default,
                ..
            }
        )));
    }

    #[test]
    fn default_decal_finishing_after_upload_is_dropped() {
        let (mut manager, decoder) = gated_decals();
        let diagnostics = Diagnostics::new(Rc::new(MemorySink::default()), false);
        let front = DecalTarget::Logo(DecalSide::Front);

        manager.request_decal(front, PathBuf::from("default-front"), DecalOrigin::Default);
        manager.request_decal(front, PathBuf::from("upload-front"), DecalOrigin::Upload);
        decoder.release("upload-front");
        let mut events = poll_until(&mut manager, GarmentId::Shirt, &diagnostics, |m| {
            m.pending_loads() == 1
        });
        decoder.release("default-front");
        events.extend(poll_until(
            &mut manager,
            GarmentId::Shirt,
            &diagnostics,
            |m| m.pending_loads() == 0,
        ));

        assert_eq!(
            decal_labels(&events),
            vec![(DecalOrigin::Upload, "upload-front".to_string())]
        );

        // A later default request for the same target is not even started.
        manager.request_decal(front, PathBuf::from("default-front"), DecalOrigin::Default);
        assert_eq!(manager.pending_loads(), 0);
    }

    #[test]
    fn latest_upload_wins_over_slower_earlier_one() {
        let (mut manager, decoder) = gated_decals();
        let diagnostics = Diagnostics::new(Rc::new(MemorySink::default()), false);

        manager.request_decal(
            DecalTarget::FullPattern,
            PathBuf::from("slow"),
            DecalOrigin::Upload,
        );
        manager.request_decal(
            DecalTarget::FullPattern,
            PathBuf::from("fast"),
            DecalOrigin::Upload,
        );
        manager.request_decal(
            DecalTarget::Logo(DecalSide::Back),
            PathBuf::from("back"),
            DecalOrigin::Default,
        );
        decoder.release("fast");
        decoder.release("back");
        let mut events = poll_until(&mut manager, GarmentId::Shirt, &diagnostics, |m| {
            m.pending_loads() == 1
        });
        decoder.release("slow");
        events.extend(poll_until(
            &mut manager,
            GarmentId::Shirt,
            &diagnostics,
            |m| m.pending_loads() == 0,
        ));

        let mut labels = decal_labels(&events);
        labels.sort_by(|a, b| a.1.cmp(&b.1));
        assert_eq!(
            labels,
            vec![
                (DecalOrigin::Default, "back".to_string()),
                (DecalOrigin::Upload, "fast".to_string()),
            ]
        );
    }
}
