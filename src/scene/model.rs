/// Vertex layout shared with the vertex shader input bindings.
#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct Vertex {
    pub pos: [f32; 3],
    pub normal: [f32; 3],
}

pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub base_color: [f32; 4],
}

pub struct Model {
    pub meshes: Vec<Mesh>,
}

impl Model {
    /// Import every mesh primitive of a glTF file. Node transforms are not
    /// applied; the demo assets are single-node scenes.
    pub fn import(path: impl AsRef<std::path::Path>) -> Result<Self, gltf::Error> {
        let (document, buffers, _images) = gltf::import(path)?;

        let mut meshes = Vec::new();
        for mesh in document.meshes() {
            for primitive in mesh.primitives() {
                let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));
                let positions = match reader.read_positions() {
                    Some(positions) => positions,
                    None => continue,
                };

                let mut vertices = positions
                    .map(|pos| Vertex {
                        pos,
                        normal: [0.0; 3],
                    })
                    .collect::<Vec<_>>();
                if let Some(normals) = reader.read_normals() {
                    for (vertex, normal) in vertices.iter_mut().zip(normals) {
                        vertex.normal = normal
                    }
                }

                let indices = match reader.read_indices() {
                    Some(indices) => indices.into_u32().collect(),
                    None => (0..vertices.len() as u32).collect(),
                };

                let base_color = primitive
                    .material()
                    .pbr_metallic_roughness()
                    .base_color_factor();

                meshes.push(Mesh {
                    vertices,
                    indices,
                    base_color,
                })
            }
        }

        log::info!("imported {} mesh primitives", meshes.len());
        Ok(Self { meshes })
    }
}
