pub use heading::{target_heading, Heading};
pub use model::{Mesh, Model, Vertex};

mod heading;
mod model;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ObjectId {
    Player,
    Cube,
}

#[derive(Debug, Copy, Clone)]
pub struct Transform {
    pub position: uv::Vec3,
    /// Rotation around world Y, radians.
    pub rotation: f32,
    pub scale: f32,
}

pub struct Scene {
    objects: std::collections::HashMap<ObjectId, Transform>,
}

impl Transform {
    pub fn new(position: uv::Vec3, rotation: f32, scale: f32) -> Self {
        Self {
            position,
            rotation,
            scale,
        }
    }

    pub fn mat(&self) -> uv::Mat4 {
        uv::Mat4::from_translation(self.position)
            * uv::Mat4::from_rotation_y(self.rotation)
            * uv::Mat4::from_scale(self.scale)
    }
}

impl Scene {
    pub fn new() -> Self {
        Self {
            objects: std::collections::HashMap::new(),
        }
    }

    /// The demo scene: a player avatar at the origin and a cube off to the
    /// side.
    pub fn demo() -> Self {
        let mut scene = Self::new();
        scene.insert(
            ObjectId::Player,
            Transform::new(uv::Vec3::zero(), 0.0, 0.1),
        );
        scene.insert(
            ObjectId::Cube,
            Transform::new(uv::Vec3::new(1.0, 0.0, 0.0), 0.0, 0.5),
        );
        scene
    }

    pub fn insert(&mut self, id: ObjectId, transform: Transform) {
        self.objects.insert(id, transform);
    }

    pub fn get(&self, id: ObjectId) -> Option<&Transform> {
        self.objects.get(&id)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut Transform> {
        self.objects.get_mut(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ObjectId, &Transform)> {
        self.objects.iter().map(|(id, transform)| (*id, transform))
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transform_mat_translates_rotates_scales() {
        let transform = Transform::new(uv::Vec3::new(1.0, 2.0, 3.0), 0.0, 2.0);
        let p = transform.mat() * uv::Vec4::new(1.0, 0.0, 0.0, 1.0);
        assert!((p.x - 3.0).abs() < 1e-5);
        assert!((p.y - 2.0).abs() < 1e-5);
        assert!((p.z - 3.0).abs() < 1e-5);

        // quarter turn around Y sends +x to -z
        let transform = Transform::new(uv::Vec3::zero(), std::f32::consts::FRAC_PI_2, 1.0);
        let p = transform.mat() * uv::Vec4::new(1.0, 0.0, 0.0, 1.0);
        assert!(p.x.abs() < 1e-5);
        assert!((p.z + 1.0).abs() < 1e-5)
    }

    #[test]
    fn demo_scene_objects() {
        let scene = Scene::demo();
        assert_eq!(scene.len(), 2);
        assert!((scene.get(ObjectId::Player).unwrap().scale - 0.1).abs() < 1e-6);
        let cube = scene.get(ObjectId::Cube).unwrap();
        assert!((cube.position.x - 1.0).abs() < 1e-6);
        assert!((cube.scale - 0.5).abs() < 1e-6)
    }

    #[test]
    fn insert_replaces_existing_transform() {
        let mut scene = Scene::demo();
        scene.insert(ObjectId::Cube, Transform::new(uv::Vec3::zero(), 1.0, 1.0));
        assert_eq!(scene.len(), 2);
        assert!((scene.get(ObjectId::Cube).unwrap().rotation - 1.0).abs() < 1e-6)
    }
}
