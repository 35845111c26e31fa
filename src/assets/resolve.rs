//! Geometry and material selection for a loaded garment asset.
//!
//! Resolution never fails. Geometry falls through primary name, the
//! model's ordered fallback names, then the first node carrying a mesh;
//! only an asset without any mesh yields [`GeometryResolution::Missing`],
//! which the scene turns into the error cube. Materials fall through the
//! primary name, then the first catalog material, then a material
//! synthesized from the current base color.

use crate::assets::catalog::{AssetCatalog, GeometryRef, MaterialRef};
use crate::config::{GarmentModel, HexColor};
use crate::diagnostics::{Diagnostic, Diagnostics};

#[derive(Debug, Clone, PartialEq)]
pub enum GeometryResolution {
    Primary(GeometryRef),
    Fallback { rank: usize, geometry: GeometryRef },
    AutoDetected(GeometryRef),
    Missing,
}

impl GeometryResolution {
    pub fn geometry(&self) -> Option<&GeometryRef> {
        match self {
            GeometryResolution::Primary(geometry)
            | GeometryResolution::Fallback { geometry, .. }
            | GeometryResolution::AutoDetected(geometry) => Some(geometry),
            GeometryResolution::Missing => None,
        }
    }

    fn source(&self) -> &'static str {
        match self {
            GeometryResolution::Primary(_) => "primary",
            GeometryResolution::Fallback { .. } => "fallback",
            GeometryResolution::AutoDetected(_) => "auto-detected",
            GeometryResolution::Missing => "missing",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MaterialResolution {
    Named(MaterialRef),
    FirstAvailable(MaterialRef),
    Synthesized { base_color: HexColor },
}

impl MaterialResolution {
    pub fn name(&self) -> Option<&str> {
        match self {
            MaterialResolution::Named(material) | MaterialResolution::FirstAvailable(material) => {
                Some(&material.name)
            }
            MaterialResolution::Synthesized { .. } => None,
        }
    }
}

pub fn resolve_geometry(catalog: &AssetCatalog, model: &GarmentModel) -> GeometryResolution {
    if let Some(geometry) = catalog.geometry_named(&model.primary_geometry) {
        return GeometryResolution::Primary(geometry.clone());
    }
    for (rank, name) in model.fallback_geometries.iter().enumerate() {
        if let Some(geometry) = catalog.geometry_named(name) {
            return GeometryResolution::Fallback {
                rank,
                geometry: geometry.clone(),
            };
        }
    }
    match catalog.first_geometry() {
        Some(geometry) => GeometryResolution::AutoDetected(geometry.clone()),
        None => GeometryResolution::Missing,
    }
}

pub fn resolve_material(
    catalog: &AssetCatalog,
    model: &GarmentModel,
    base_color: HexColor,
) -> MaterialResolution {
    let named = model
        .primary_material
        .as_deref()
        .and_then(|name| catalog.material_named(name));
    if let Some(material) = named {
        return MaterialResolution::Named(material.clone());
    }
    match catalog.first_material() {
        Some(material) => MaterialResolution::FirstAvailable(material.clone()),
        None => MaterialResolution::Synthesized { base_color },
    }
}

/// Geometry and material picked for one model.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedGarment {
    pub geometry: GeometryResolution,
    pub material: MaterialResolution,
}

impl ResolvedGarment {
    pub fn resolve(
        catalog: &AssetCatalog,
        model: &GarmentModel,
        base_color: HexColor,
        diagnostics: &Diagnostics,
    ) -> Self {
        let geometry = resolve_geometry(catalog, model);
        let material = resolve_material(catalog, model, base_color);

        match geometry.geometry() {
            Some(found) => diagnostics.emit(Diagnostic::GeometryResolved {
                asset: model.asset_path.clone(),
                node: found.node.clone(),
                source: geometry.source(),
            }),
            None => diagnostics.emit(Diagnostic::GeometryMissing {
                asset: model.asset_path.clone(),
                available: catalog
                    .node_names()
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
            }),
        }
        match &material {
            MaterialResolution::Named(found) => diagnostics.emit(Diagnostic::MaterialResolved {
                asset: model.asset_path.clone(),
                material: found.name.clone(),
                source: "specified",
            }),
            MaterialResolution::FirstAvailable(found) => {
                diagnostics.emit(Diagnostic::MaterialResolved {
                    asset: model.asset_path.clone(),
                    material: found.name.clone(),
                    source: "first available",
                })
            }
            MaterialResolution::Synthesized { .. } => {
                diagnostics.emit(Diagnostic::MaterialSynthesized {
                    asset: model.asset_path.clone(),
                })
            }
        }

        Self { geometry, material }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::catalog::CatalogNode;
    use crate::config::{AppConfig, GarmentId};
    use crate::diagnostics::MemorySink;
    use std::rc::Rc;

    fn shirt() -> GarmentModel {
        AppConfig::builtin()
            .models
            .into_iter()
            .find(|model| model.id == GarmentId::Shirt)
            .unwrap()
    }

    fn mesh(name: &str, mesh_index: usize) -> CatalogNode {
        CatalogNode {
            name: name.to_string(),
            geometry: Some(GeometryRef {
                node: name.to_string(),
                mesh_index,
                primitive_count: 1,
                vertex_count: 3,
            }),
        }
    }

    fn empty(name: &str) -> CatalogNode {
        CatalogNode {
            name: name.to_string(),
            geometry: None,
        }
    }

    fn material(name: &str, index: usize) -> MaterialRef {
        MaterialRef {
            name: name.to_string(),
            index,
            base_color: [1.0; 4],
        }
    }

    #[test]
    fn primary_name_wins_over_fallbacks() {
        let catalog = AssetCatalog::new(
            vec![mesh("Mesh", 0), mesh("Object_2", 1), mesh("T_Shirt_male", 2)],
            vec![],
        );
        let resolution = resolve_geometry(&catalog, &shirt());
        assert!(matches!(resolution, GeometryResolution::Primary(ref g) if g.mesh_index == 2));
    }

    #[test]
    fn earliest_fallback_rank_wins() {
        // "Mesh" is rank 4 and listed first in the asset; "Object_0" is rank 1.
        let catalog = AssetCatalog::new(vec![mesh("Mesh", 0), mesh("Object_0", 1)], vec![]);
        match resolve_geometry(&catalog, &shirt()) {
            GeometryResolution::Fallback { rank, geometry } => {
                assert_eq!(rank, 1);
                assert_eq!(geometry.node, "Object_0");
            }
            other => panic!("expected fallback, got {other:?}"),
        }
    }

    #[test]
    fn named_node_without_mesh_is_skipped() {
        let catalog = AssetCatalog::new(vec![empty("T_Shirt_male"), mesh("Shirt", 0)], vec![]);
        assert!(matches!(
            resolve_geometry(&catalog, &shirt()),
            GeometryResolution::Fallback { rank: 2, .. }
        ));
    }

    #[test]
    fn unmatched_catalog_auto_detects_first_mesh() {
        let catalog = AssetCatalog::new(
            vec![empty("Root"), mesh("Sleeve", 4), mesh("Collar", 5)],
            vec![],
        );
        match resolve_geometry(&catalog, &shirt()) {
            GeometryResolution::AutoDetected(geometry) => assert_eq!(geometry.node, "Sleeve"),
            other => panic!("expected auto-detect, got {other:?}"),
        }
    }

    #[test]
    fn catalog_without_meshes_is_missing() {
        let empty_catalog = AssetCatalog::default();
        assert_eq!(
            resolve_geometry(&empty_catalog, &shirt()),
            GeometryResolution::Missing
        );
        let hollow = AssetCatalog::new(vec![empty("Root"), empty("Camera")], vec![]);
        assert_eq!(resolve_geometry(&hollow, &shirt()), GeometryResolution::Missing);
    }

    #[test]
    fn resolution_is_repeatable_for_same_catalog() {
        let catalog = AssetCatalog::new(vec![mesh("A", 0), mesh("B", 1)], vec![]);
        let first = resolve_geometry(&catalog, &shirt());
        for _ in 0..10 {
            assert_eq!(resolve_geometry(&catalog, &shirt()), first);
        }
    }

    #[test]
    fn material_prefers_named_then_first_then_synthesized() {
        let color = HexColor::from_rgb(1, 2, 3);
        let named = AssetCatalog::new(vec![], vec![material("other", 0), material("lambert1", 1)]);
        assert!(matches!(
            resolve_material(&named, &shirt(), color),
            MaterialResolution::Named(ref m) if m.name == "lambert1"
        ));

        let unnamed = AssetCatalog::new(vec![], vec![material("cloth", 0), material("trim", 1)]);
        assert!(matches!(
            resolve_material(&unnamed, &shirt(), color),
            MaterialResolution::FirstAvailable(ref m) if m.name == "cloth"
        ));

        assert_eq!(
            resolve_material(&AssetCatalog::default(), &shirt(), color),
            MaterialResolution::Synthesized { base_color: color }
        );
    }

    #[test]
    fn missing_geometry_reports_available_nodes() {
        let sink = Rc::new(MemorySink::default());
        let diagnostics = Diagnostics::new(sink.clone(), false);
        let catalog = AssetCatalog::new(vec![empty("Root")], vec![]);
        let resolved = ResolvedGarment::resolve(
            &catalog,
            &shirt(),
            HexColor::from_rgb(0, 0, 0),
            &diagnostics,
        );
        assert_eq!(resolved.geometry, GeometryResolution::Missing);
        assert_eq!(
            sink.events(),
            vec![Diagnostic::GeometryMissing {
                asset: "shirt-baked.glb".to_string(),
                available: vec!["Root".to_string()],
            }]
        );
    }
}
