//! Scene module - procedural Putnik clock model and its staged loader
//!
//! The scene is a small tree of named nodes. Mesh nodes carry a flat shape drawn in their
//! local XY plane; group nodes only carry a transform. Node names follow the exported
//! Putnik model so the default mesh-name table binds against it.

use std::f64::consts::FRAC_PI_2;
use std::time::Duration;

use nannou::prelude::*;
use shared::{Rotation, RotationSink, SceneGraph};
use tracing::info;

use crate::drawing::colors;

/// Index of a node inside its [`Scene`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// Flat geometry, in clock-radius units
#[derive(Debug, Clone, Copy)]
pub enum Shape {
    Disc { radius: f32 },
    Ring { radius: f32, weight: f32 },
    /// Hand pointing along +Y from the pivot
    Bar { length: f32, width: f32, tail: f32 },
    /// Evenly spaced radial marks
    Ticks { count: u32, radius: f32, length: f32, weight: f32 },
    /// Notched wheel with one mark per slot
    Wheel { radius: f32, slots: u32 },
}

#[derive(Debug, Clone, Copy)]
pub struct Mesh {
    pub shape: Shape,
    pub color: Srgb<u8>,
    /// Fixed rotation between the node frame and the shape plane
    pub mount: Rotation,
}

#[derive(Debug, Clone)]
pub struct SceneNode {
    pub name: String,
    pub position: Vec3,
    pub rotation: Rotation,
    pub mesh: Option<Mesh>,
    pub children: Vec<NodeId>,
}

/// A loaded clock model
#[derive(Debug, Clone)]
pub struct Scene {
    nodes: Vec<SceneNode>,
}

impl Scene {
    fn new(root_name: &str) -> Self {
        Self {
            nodes: vec![SceneNode {
                name: root_name.to_string(),
                position: Vec3::ZERO,
                rotation: Rotation::IDENTITY,
                mesh: None,
                children: Vec::new(),
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> &SceneNode {
        &self.nodes[id.0]
    }

    fn add(&mut self, parent: NodeId, node: SceneNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Find a node by name anywhere in the tree
    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.nodes.iter().position(|n| n.name == name).map(NodeId)
    }

    fn visit(&self, id: NodeId, f: &mut dyn FnMut(NodeId, &SceneNode)) {
        let node = self.node(id);
        f(id, node);
        for &child in &node.children {
            self.visit(child, f);
        }
    }
}

impl SceneGraph for Scene {
    type Handle = NodeId;

    fn traverse_meshes(&self, visit: &mut dyn FnMut(&str, NodeId)) {
        self.visit(self.root(), &mut |id, node| {
            if node.mesh.is_some() {
                visit(node.name.as_str(), id);
            }
        });
    }
}

impl RotationSink<NodeId> for Scene {
    fn set_rotation(&mut self, target: NodeId, rotation: Rotation) {
        if let Some(node) = self.nodes.get_mut(target.0) {
            node.rotation = rotation;
        }
    }
}

/// Where a part attaches
#[derive(Debug, Clone, Copy)]
enum Parent {
    Root,
    Named(&'static str),
}

/// One build step of the model
struct PartDef {
    name: &'static str,
    parent: Parent,
    position: Vec3,
    rotation: Rotation,
    mesh: Option<Mesh>,
}

fn group(name: &'static str, parent: Parent, position: Vec3, rotation: Rotation) -> PartDef {
    PartDef {
        name,
        parent,
        position,
        rotation,
        mesh: None,
    }
}

fn mesh(
    name: &'static str,
    parent: Parent,
    position: Vec3,
    shape: Shape,
    color: Srgb<u8>,
    mount: Rotation,
) -> PartDef {
    PartDef {
        name,
        parent,
        position,
        rotation: Rotation::IDENTITY,
        mesh: Some(Mesh { shape, color, mount }),
    }
}

/// Minute and hour hands turn about Y, so the face plane is the XZ plane of its children
const FACE_MOUNT: Rotation = Rotation { x: -FRAC_PI_2, y: 0.0, z: 0.0 };

/// Parts of the Putnik clock in build order
fn putnik_parts() -> Vec<PartDef> {
    let flat = Rotation::IDENTITY;
    let face = Parent::Named("Face");
    // The second hand rests at -195° so the stock calibration points it at twelve
    let second_mount = Rotation::new(0.0, 0.0, -195f64.to_radians());

    vec![
        mesh(
            "Case",
            Parent::Root,
            vec3(0.0, 0.0, -0.04),
            Shape::Disc { radius: 1.0 },
            colors::CASE,
            flat,
        ),
        mesh(
            "Bezel",
            Parent::Root,
            vec3(0.0, 0.0, -0.03),
            Shape::Ring { radius: 0.97, weight: 0.04 },
            colors::BEZEL,
            flat,
        ),
        mesh(
            "Dial_Face",
            Parent::Root,
            vec3(0.0, 0.0, -0.02),
            Shape::Disc { radius: 0.93 },
            colors::DIAL,
            flat,
        ),
        mesh(
            "Index",
            Parent::Root,
            vec3(0.0, 0.0, -0.01),
            Shape::Ticks { count: 60, radius: 0.9, length: 0.05, weight: 0.008 },
            colors::TICK,
            flat,
        ),
        mesh(
            "Index_Hours",
            Parent::Root,
            vec3(0.0, 0.0, -0.01),
            Shape::Ticks { count: 12, radius: 0.9, length: 0.12, weight: 0.025 },
            colors::TICK_MAJOR,
            flat,
        ),
        group("DateWindow", Parent::Root, vec3(0.42, 0.0, 0.0), flat),
        mesh(
            "Cylinder003",
            Parent::Named("DateWindow"),
            Vec3::ZERO,
            Shape::Wheel { radius: 0.16, slots: 31 },
            colors::DATE_WHEEL,
            flat,
        ),
        group("SecondsSubdial", Parent::Root, vec3(0.0, -0.45, 0.0), flat),
        mesh(
            "Subdial_Ring",
            Parent::Named("SecondsSubdial"),
            vec3(0.0, 0.0, -0.005),
            Shape::Ring { radius: 0.2, weight: 0.01 },
            colors::TICK,
            flat,
        ),
        mesh(
            "Cylinder001",
            Parent::Named("SecondsSubdial"),
            Vec3::ZERO,
            Shape::Bar { length: 0.18, width: 0.012, tail: 0.04 },
            colors::SECOND_HAND,
            second_mount,
        ),
        group("Face", Parent::Root, vec3(0.0, 0.0, 0.01), Rotation::new(FRAC_PI_2, 0.0, 0.0)),
        // Twins sit behind their primaries and read as a shadow
        mesh(
            "Hand_Hour001",
            face,
            vec3(0.012, -0.01, 0.0),
            Shape::Bar { length: 0.5, width: 0.05, tail: 0.08 },
            colors::HAND_SHADOW,
            FACE_MOUNT,
        ),
        mesh(
            "Hand_Hour001_1",
            face,
            Vec3::ZERO,
            Shape::Bar { length: 0.5, width: 0.05, tail: 0.08 },
            colors::HAND,
            FACE_MOUNT,
        ),
        mesh(
            "Hand_Min001",
            face,
            vec3(0.012, -0.005, 0.0),
            Shape::Bar { length: 0.78, width: 0.035, tail: 0.1 },
            colors::HAND_SHADOW,
            FACE_MOUNT,
        ),
        mesh(
            "Hand_Min001_1",
            face,
            vec3(0.0, 0.005, 0.0),
            Shape::Bar { length: 0.78, width: 0.035, tail: 0.1 },
            colors::HAND,
            FACE_MOUNT,
        ),
        mesh(
            "Cylinder004",
            Parent::Root,
            vec3(0.0, 0.0, 0.03),
            Shape::Wheel { radius: 0.045, slots: 6 },
            colors::SPINNER,
            flat,
        ),
    ]
}

/// Builds the model a few parts at a time, reporting progress like an asset loader
pub struct SceneLoader {
    parts: Vec<PartDef>,
    built: usize,
    scene: Option<Scene>,
    /// Time to wait before the first part
    start_delay: Duration,
    /// Time each part takes to build
    part_cost: Duration,
    started: bool,
    finished: bool,
}

impl SceneLoader {
    pub fn putnik(start_delay: Duration, part_cost: Duration) -> Self {
        Self {
            parts: putnik_parts(),
            built: 0,
            scene: None,
            start_delay,
            part_cost,
            started: false,
            finished: false,
        }
    }

    /// Whether parts are currently being built
    pub fn is_active(&self) -> bool {
        self.started && !self.finished
    }

    /// Real progress, 0-100
    pub fn progress(&self) -> f64 {
        if self.parts.is_empty() {
            return 100.0;
        }
        self.built as f64 / self.parts.len() as f64 * 100.0
    }

    /// Build every part that is due by `now`
    pub fn update(&mut self, now: Duration) {
        if self.finished || now < self.start_delay {
            return;
        }
        if !self.started {
            self.started = true;
            self.scene = Some(Scene::new("Putnik"));
            info!(parts = self.parts.len(), "scene load started");
        }

        let elapsed = now - self.start_delay;
        let due = if self.part_cost.is_zero() {
            self.parts.len()
        } else {
            ((elapsed.as_secs_f64() / self.part_cost.as_secs_f64()) as usize).min(self.parts.len())
        };

        while self.built < due {
            self.build_part(self.built);
            self.built += 1;
        }
        if self.built == self.parts.len() {
            self.finished = true;
        }
    }

    fn build_part(&mut self, index: usize) {
        let Some(scene) = self.scene.as_mut() else {
            return;
        };
        let part = &self.parts[index];
        let parent = match part.parent {
            Parent::Root => scene.root(),
            Parent::Named(name) => scene.find(name).unwrap_or(scene.root()),
        };
        scene.add(
            parent,
            SceneNode {
                name: part.name.to_string(),
                position: part.position,
                rotation: part.rotation,
                mesh: part.mesh,
                children: Vec::new(),
            },
        );
    }

    /// Hand over the finished scene, once
    pub fn take_scene(&mut self) -> Option<Scene> {
        if self.finished {
            self.scene.take()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{bind, Hand, MeshNames};

    fn loaded() -> Scene {
        let mut loader = SceneLoader::putnik(Duration::ZERO, Duration::ZERO);
        loader.update(Duration::from_millis(1));
        loader.take_scene().unwrap()
    }

    #[test]
    fn test_loader_reports_progress() {
        let cost = Duration::from_millis(100);
        let mut loader = SceneLoader::putnik(Duration::from_millis(600), cost);
        loader.update(Duration::from_millis(300));
        assert!(!loader.is_active());
        assert_eq!(loader.progress(), 0.0);

        loader.update(Duration::from_millis(850));
        assert!(loader.is_active());
        assert!(loader.progress() > 0.0 && loader.progress() < 100.0);
        assert!(loader.take_scene().is_none());

        loader.update(Duration::from_secs(60));
        assert!(!loader.is_active());
        assert_eq!(loader.progress(), 100.0);
        assert!(loader.take_scene().is_some());
        assert!(loader.take_scene().is_none());
    }

    #[test]
    fn test_putnik_scene_binds_all_roles() {
        let scene = loaded();
        let bindings = bind(&scene, &MeshNames::default());
        assert!(bindings.hands_ready());
        assert_eq!(bindings.bound_count(), 7);
        assert_eq!(bindings.targets(Hand::Hour).count(), 2);
    }

    #[test]
    fn test_groups_are_not_traversed_as_meshes() {
        let scene = loaded();
        let mut names = Vec::new();
        scene.traverse_meshes(&mut |name, _| names.push(name.to_string()));
        assert!(!names.iter().any(|n| n == "Face" || n == "Putnik"));
        assert!(names.iter().any(|n| n == "Hand_Min001"));
    }

    #[test]
    fn test_sink_sets_node_rotation() {
        let mut scene = loaded();
        let id = scene.find("Hand_Min001_1").unwrap();
        scene.set_rotation(id, Rotation::new(0.0, 1.0, 0.0));
        assert_eq!(scene.node(id).rotation.y, 1.0);
    }
}
