//! Single diagnostic sink shared by the core.
//!
//! Core code never calls `log` directly for decisions worth inspecting; it
//! emits a [`Diagnostic`] through [`Diagnostics`], which applies the
//! `debug` gate and forwards to the injected [`DiagnosticSink`].

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::config::{DecalTarget, GarmentId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Debug,
    Warn,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    GeometryResolved {
        asset: String,
        node: String,
        source: &'static str,
    },
    GeometryMissing {
        asset: String,
        available: Vec<String>,
    },
    MaterialResolved {
        asset: String,
        material: String,
        source: &'static str,
    },
    MaterialSynthesized {
        asset: String,
    },
    UnknownModel {
        requested: String,
        fallback: GarmentId,
    },
    PlacementsReset {
        model: GarmentId,
    },
    StaleLoadDiscarded {
        model: GarmentId,
        selected: GarmentId,
    },
    AssetLoadFailed {
        asset: String,
        error: String,
    },
    DecalLoadFailed {
        target: DecalTarget,
        path: String,
        error: String,
    },
    DecalLoaded {
        target: DecalTarget,
        path: String,
        hash: String,
    },
}

impl Diagnostic {
    pub fn severity(&self) -> Severity {
        match self {
            Diagnostic::GeometryMissing { .. }
            | Diagnostic::UnknownModel { .. }
            | Diagnostic::AssetLoadFailed { .. }
            | Diagnostic::DecalLoadFailed { .. } => Severity::Warn,
            _ => Severity::Debug,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::GeometryResolved {
                asset,
                node,
                source,
            } => write!(f, "[{asset}] using {source} geometry '{node}'"),
            Diagnostic::GeometryMissing { asset, available } => write!(
                f,
                "[{asset}] no geometry found, rendering fallback cube (nodes: {})",
                available.join(", ")
            ),
            Diagnostic::MaterialResolved {
                asset,
                material,
                source,
            } => write!(f, "[{asset}] using {source} material '{material}'"),
            Diagnostic::MaterialSynthesized { asset } => {
                write!(f, "[{asset}] no material in catalog, using base color material")
            }
            Diagnostic::UnknownModel {
                requested,
                fallback,
            } => write!(f, "unknown garment model '{requested}', defaulting to {fallback}"),
            Diagnostic::PlacementsReset { model } => {
                write!(f, "logo placements reset to {model} defaults")
            }
            Diagnostic::StaleLoadDiscarded { model, selected } => write!(
                f,
                "discarding late {model} catalog, {selected} is selected"
            ),
            Diagnostic::AssetLoadFailed { asset, error } => {
                write!(f, "[{asset}] load failed: {error}")
            }
            Diagnostic::DecalLoadFailed {
                target,
                path,
                error,
            } => write!(f, "{target} decal '{path}' failed to load: {error}"),
            Diagnostic::DecalLoaded { target, path, hash } => {
                write!(f, "{target} decal '{path}' loaded ({})", short_hash(hash))
            }
        }
    }
}

fn short_hash(hash: &str) -> &str {
    hash.get(..12).unwrap_or(hash)
}

pub trait DiagnosticSink {
    fn record(&self, diagnostic: &Diagnostic);
}

/// Forwards diagnostics to the `log` facade.
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn record(&self, diagnostic: &Diagnostic) {
        match diagnostic.severity() {
            Severity::Warn => log::warn!(target: "garment_studio::diagnostics", "{diagnostic}"),
            Severity::Debug => log::debug!(target: "garment_studio::diagnostics", "{diagnostic}"),
        }
    }
}

/// Keeps every diagnostic in memory, for tests and the debug panel.
#[derive(Default)]
pub struct MemorySink {
    events: RefCell<Vec<Diagnostic>>,
}

impl MemorySink {
    pub fn events(&self) -> Vec<Diagnostic> {
        self.events.borrow().clone()
    }
}

impl DiagnosticSink for MemorySink {
    fn record(&self, diagnostic: &Diagnostic) {
        self.events.borrow_mut().push(diagnostic.clone());
    }
}

pub struct Diagnostics {
    enabled: Cell<bool>,
    sink: Rc<dyn DiagnosticSink>,
}

impl Diagnostics {
    pub fn new(sink: Rc<dyn DiagnosticSink>, enabled: bool) -> Self {
        Self {
            enabled: Cell::new(enabled),
            sink,
        }
    }

    pub fn to_log(enabled: bool) -> Self {
        Self::new(Rc::new(LogSink), enabled)
    }

    pub fn enabled(&self) -> bool {
        self.enabled.get()
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.set(enabled);
    }

    pub fn emit(&self, diagnostic: Diagnostic) {
        if diagnostic.severity() == Severity::Warn || self.enabled.get() {
            self.sink.record(&diagnostic);
        }
    }
}
