//! Flat scene graph owned by the hall.
//!
//! Nodes live in an arena addressed by [`NodeId`]. Geometry and textures are
//! shared resources addressed by id; the [`ResourceLedger`] guarantees each is
//! released exactly once and queues the release for the renderer, which drops
//! the matching GPU buffers on its next frame.

use crate::geometry::MeshData;
use fnv::{FnvHashMap, FnvHashSet};
use glam::{Quat, Vec2, Vec3};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GeometryId(u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceId {
    Geometry(GeometryId),
    Texture(TextureId),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlendMode {
    Opaque,
    Alpha,
    Additive,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Material {
    /// Linear RGB plus opacity.
    pub color: [f32; 4],
    /// Multiplier fed to the HDR target; values above 1 bloom.
    pub emissive: f32,
    pub texture: Option<TextureId>,
    pub blend: BlendMode,
}

impl Material {
    pub fn opaque(color: [f32; 3]) -> Self {
        Self {
            color: [color[0], color[1], color[2], 1.0],
            emissive: 1.0,
            texture: None,
            blend: BlendMode::Opaque,
        }
    }

    pub fn glow(color: [f32; 3], opacity: f32, emissive: f32) -> Self {
        Self {
            color: [color[0], color[1], color[2], opacity],
            emissive,
            texture: None,
            blend: BlendMode::Additive,
        }
    }

    pub fn textured(texture: TextureId, blend: BlendMode) -> Self {
        Self {
            color: [1.0; 4],
            emissive: 1.0,
            texture: Some(texture),
            blend,
        }
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.color[3] = opacity;
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn at(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::default()
        }
    }

    pub fn matrix(&self) -> glam::Mat4 {
        glam::Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

/// Per-point buffers for particle clouds and the starfield.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PointCloud {
    pub positions: Vec<Vec3>,
    pub alphas: Vec<f32>,
    pub size: f32,
}

impl PointCloud {
    pub fn with_capacity(n: usize, size: f32) -> Self {
        Self {
            positions: Vec::with_capacity(n),
            alphas: Vec::with_capacity(n),
            size,
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    Mesh {
        geometry: GeometryId,
        material: Material,
    },
    /// Camera-facing quad sized in world units.
    Sprite { size: Vec2, material: Material },
    PointLight {
        color: [f32; 3],
        intensity: f32,
        distance: f32,
    },
    Points {
        cloud: PointCloud,
        material: Material,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub transform: Transform,
    pub visible: bool,
}

impl Node {
    pub fn new(kind: NodeKind, transform: Transform) -> Self {
        Self {
            kind,
            transform,
            visible: true,
        }
    }

    pub fn material_mut(&mut self) -> Option<&mut Material> {
        match &mut self.kind {
            NodeKind::Mesh { material, .. }
            | NodeKind::Sprite { material, .. }
            | NodeKind::Points { material, .. } => Some(material),
            NodeKind::PointLight { .. } => None,
        }
    }

    pub fn light_mut(&mut self) -> Option<&mut f32> {
        match &mut self.kind {
            NodeKind::PointLight { intensity, .. } => Some(intensity),
            _ => None,
        }
    }
}

/// Live resource set plus the queue of releases the renderer has not seen yet.
#[derive(Debug, Default)]
pub struct ResourceLedger {
    live: FnvHashSet<ResourceId>,
    released: Vec<ResourceId>,
    released_total: usize,
}

impl ResourceLedger {
    fn track(&mut self, id: ResourceId) {
        self.live.insert(id);
    }

    /// Returns false when `id` was never tracked or is already released.
    pub fn release(&mut self, id: ResourceId) -> bool {
        if !self.live.remove(&id) {
            return false;
        }
        self.released.push(id);
        self.released_total += 1;
        true
    }

    pub fn is_live(&self, id: ResourceId) -> bool {
        self.live.contains(&id)
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn released_total(&self) -> usize {
        self.released_total
    }

    pub fn drain_released(&mut self) -> Vec<ResourceId> {
        std::mem::take(&mut self.released)
    }
}

/// Texture payload plus a version bumped on every repaint.
#[derive(Debug)]
pub struct TextureEntry<T> {
    pub payload: T,
    pub version: u64,
}

#[derive(Debug)]
pub struct SceneGraph<T> {
    nodes: Vec<Option<Node>>,
    free: Vec<u32>,
    geometries: FnvHashMap<GeometryId, MeshData>,
    textures: FnvHashMap<TextureId, TextureEntry<T>>,
    ledger: ResourceLedger,
    next_resource: u32,
    pub ambient: [f32; 3],
    pub clear_color: [f32; 3],
}

impl<T> Default for SceneGraph<T> {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            free: Vec::new(),
            geometries: FnvHashMap::default(),
            textures: FnvHashMap::default(),
            ledger: ResourceLedger::default(),
            next_resource: 1,
            ambient: [0.0; 3],
            clear_color: [0.0; 3],
        }
    }
}

impl<T> SceneGraph<T> {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_resource(&mut self) -> u32 {
        let id = self.next_resource;
        self.next_resource += 1;
        id
    }

    pub fn add_geometry(&mut self, mesh: MeshData) -> GeometryId {
        let id = GeometryId(self.next_resource());
        self.geometries.insert(id, mesh);
        self.ledger.track(ResourceId::Geometry(id));
        id
    }

    pub fn geometry(&self, id: GeometryId) -> Option<&MeshData> {
        self.geometries.get(&id)
    }

    pub fn add_texture(&mut self, payload: T) -> TextureId {
        let id = TextureId(self.next_resource());
        self.textures.insert(id, TextureEntry { payload, version: 1 });
        self.ledger.track(ResourceId::Texture(id));
        id
    }

    pub fn texture(&self, id: TextureId) -> Option<&TextureEntry<T>> {
        self.textures.get(&id)
    }

    /// Mutable access to a texture payload; marks it for re-upload.
    pub fn texture_mut(&mut self, id: TextureId) -> Option<&mut T> {
        self.textures.get_mut(&id).map(|entry| {
            entry.version += 1;
            &mut entry.payload
        })
    }

    pub fn textures(&self) -> impl Iterator<Item = (TextureId, &TextureEntry<T>)> {
        self.textures.iter().map(|(id, e)| (*id, e))
    }

    pub fn release_geometry(&mut self, id: GeometryId) -> bool {
        self.geometries.remove(&id);
        self.ledger.release(ResourceId::Geometry(id))
    }

    /// Removes the texture and hands its payload back for disposal. `None`
    /// when it was already released.
    pub fn release_texture(&mut self, id: TextureId) -> Option<T> {
        let entry = self.textures.remove(&id)?;
        self.ledger.release(ResourceId::Texture(id));
        Some(entry.payload)
    }

    pub fn add_node(&mut self, node: Node) -> NodeId {
        match self.free.pop() {
            Some(slot) => {
                self.nodes[slot as usize] = Some(node);
                NodeId(slot)
            }
            None => {
                self.nodes.push(Some(node));
                NodeId(self.nodes.len() as u32 - 1)
            }
        }
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0 as usize).and_then(Option::as_ref)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0 as usize).and_then(Option::as_mut)
    }

    pub fn remove_node(&mut self, id: NodeId) -> Option<Node> {
        let node = self.nodes.get_mut(id.0 as usize)?.take()?;
        self.free.push(id.0);
        Some(node)
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, n)| n.as_ref().map(|n| (NodeId(i as u32), n)))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    pub fn set_translation(&mut self, id: NodeId, translation: Vec3) {
        if let Some(node) = self.node_mut(id) {
            node.transform.translation = translation;
        }
    }

    pub fn ledger(&self) -> &ResourceLedger {
        &self.ledger
    }

    pub fn drain_released(&mut self) -> Vec<ResourceId> {
        self.ledger.drain_released()
    }

    /// Remove every node and release every live resource. Texture payloads are
    /// returned so the caller can dispose them.
    pub fn clear(&mut self) -> Vec<T> {
        self.nodes.clear();
        self.free.clear();
        let geometry_ids: Vec<GeometryId> = self.geometries.keys().copied().collect();
        for id in geometry_ids {
            self.release_geometry(id);
        }
        let texture_ids: Vec<TextureId> = self.textures.keys().copied().collect();
        texture_ids
            .into_iter()
            .filter_map(|id| self.release_texture(id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::disc;

    #[test]
    fn resources_release_exactly_once() {
        let mut scene: SceneGraph<u8> = SceneGraph::new();
        let g = scene.add_geometry(disc(1.0, 8));
        let t = scene.add_texture(7);
        assert!(scene.release_geometry(g));
        assert!(!scene.release_geometry(g));
        assert_eq!(scene.release_texture(t), Some(7));
        assert_eq!(scene.release_texture(t), None);
        assert_eq!(scene.ledger().released_total(), 2);
        assert_eq!(scene.drain_released().len(), 2);
        assert!(scene.drain_released().is_empty());
    }

    #[test]
    fn removed_slots_are_reused() {
        let mut scene: SceneGraph<()> = SceneGraph::new();
        let a = scene.add_node(Node::new(
            NodeKind::PointLight {
                color: [1.0; 3],
                intensity: 1.0,
                distance: 10.0,
            },
            Transform::default(),
        ));
        assert!(scene.remove_node(a).is_some());
        assert!(scene.remove_node(a).is_none());
        let b = scene.add_node(Node::new(
            NodeKind::Sprite {
                size: Vec2::ONE,
                material: Material::opaque([1.0; 3]),
            },
            Transform::default(),
        ));
        assert_eq!(a, b);
        assert_eq!(scene.node_count(), 1);
    }

    #[test]
    fn texture_mut_bumps_version() {
        let mut scene: SceneGraph<u8> = SceneGraph::new();
        let t = scene.add_texture(0);
        *scene.texture_mut(t).unwrap() = 3;
        let entry = scene.texture(t).unwrap();
        assert_eq!((entry.payload, entry.version), (3, 2));
    }

    #[test]
    fn clear_releases_everything() {
        let mut scene: SceneGraph<u8> = SceneGraph::new();
        scene.add_geometry(disc(1.0, 8));
        scene.add_texture(1);
        scene.add_texture(2);
        let payloads = scene.clear();
        assert_eq!(payloads.len(), 2);
        assert_eq!(scene.ledger().live_count(), 0);
        assert!(scene.clear().is_empty());
        assert_eq!(scene.ledger().released_total(), 3);
    }
}
