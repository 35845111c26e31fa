//! Garment Studio desktop entry point.
//!
//! Set `GARMENT_STUDIO_CONFIG` to a JSON registry to replace the builtin
//! garments, `GARMENT_STUDIO_MODEL` to pick the starting model and
//! `RUST_LOG` to adjust logging.

fn main() {
    garment_studio::app::run();
}
