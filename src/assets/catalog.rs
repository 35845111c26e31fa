use crate::assets::AssetError;
use std::path::Path;

/// Mesh data reachable from a named node.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryRef {
    pub node: String,
    pub mesh_index: usize,
    pub primitive_count: usize,
    pub vertex_count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MaterialRef {
    pub name: String,
    pub index: usize,
    pub base_color: [f32; 4],
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatalogNode {
    pub name: String,
    pub geometry: Option<GeometryRef>,
}

/// Named geometries and materials of one loaded asset, in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssetCatalog {
    nodes: Vec<CatalogNode>,
    materials: Vec<MaterialRef>,
}

impl AssetCatalog {
    pub fn new(nodes: Vec<CatalogNode>, materials: Vec<MaterialRef>) -> Self {
        Self { nodes, materials }
    }

    pub fn nodes(&self) -> &[CatalogNode] {
        &self.nodes
    }

    pub fn materials(&self) -> &[MaterialRef] {
        &self.materials
    }

    pub fn node_names(&self) -> Vec<&str> {
        self.nodes.iter().map(|node| node.name.as_str()).collect()
    }

    /// Geometry of the first node called `name` that carries one.
    pub fn geometry_named(&self, name: &str) -> Option<&GeometryRef> {
        self.nodes
            .iter()
            .filter(|node| node.name == name)
            .find_map(|node| node.geometry.as_ref())
    }

    pub fn first_geometry(&self) -> Option<&GeometryRef> {
        self.nodes.iter().find_map(|node| node.geometry.as_ref())
    }

    pub fn material_named(&self, name: &str) -> Option<&MaterialRef> {
        self.materials.iter().find(|material| material.name == name)
    }

    pub fn first_material(&self) -> Option<&MaterialRef> {
        self.materials.first()
    }

    pub fn from_gltf_slice(bytes: &[u8], label: &str) -> Result<Self, AssetError> {
        let gltf = gltf::Gltf::from_slice(bytes).map_err(|source| AssetError::ParseGltf {
            path: label.to_string(),
            source,
        })?;
        Ok(Self::from_document(&gltf.document))
    }

    pub fn from_gltf_path(path: &Path) -> Result<Self, AssetError> {
        let bytes = std::fs::read(path).map_err(|source| AssetError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_gltf_slice(&bytes, &path.display().to_string())
    }

    fn from_document(document: &gltf::Document) -> Self {
        let nodes = document
            .nodes()
            .map(|node| {
                let name = node
                    .name()
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("node_{}", node.index()));
                let geometry = node.mesh().map(|mesh| GeometryRef {
                    node: name.clone(),
                    mesh_index: mesh.index(),
                    primitive_count: mesh.primitives().len(),
                    vertex_count: mesh
                        .primitives()
                        .filter_map(|primitive| primitive.get(&gltf::Semantic::Positions))
                        .map(|accessor| accessor.count())
                        .sum(),
                });
                CatalogNode { name, geometry }
            })
            .collect();

        let materials = document
            .materials()
            .filter_map(|material| {
                let index = material.index()?;
                Some(MaterialRef {
                    name: material
                        .name()
                        .map(str::to_string)
                        .unwrap_or_else(|| format!("material_{index}")),
                    index,
                    base_color: material.pbr_metallic_roughness().base_color_factor(),
                })
            })
            .collect();

        Self { nodes, materials }
    }
}
