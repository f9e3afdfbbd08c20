use super::{Instance, Renderable};
use crate::scene::{Mesh, Model, ObjectId, Scene, Vertex};
use erupt::vk;

const Z_NEAR: f32 = 0.1;

/// Per-draw data handed to the shaders, the demo's whole uniform interface.
#[repr(C)]
struct PushConstants {
    mvp: uv::Mat4,
    base_color: [f32; 4],
}

struct MeshBuffer {
    vertex_buffer: vk::Buffer,
    vertex_allocation: vk_alloc::Allocation,
    index_buffer: vk::Buffer,
    index_allocation: vk_alloc::Allocation,
    index_count: u32,
    base_color: [f32; 4],
}

/// Owns the GPU copies of imported models, keyed by the scene object they
/// are drawn as.
pub struct ModelManager<T: Instance> {
    instance: std::sync::Arc<T>,
    models: std::collections::HashMap<ObjectId, Vec<MeshBuffer>>,
}

pub struct ModelRenderer<T: Instance> {
    instance: std::sync::Arc<T>,
    layout: vk::PipelineLayout,
    pipeline: vk::Pipeline,
    extent: vk::Extent2D,
}

impl MeshBuffer {
    fn new(instance: &impl Instance, mesh: &Mesh) -> Self {
        let (vertex_buffer, vertex_allocation) = upload(
            instance,
            vk::BufferUsageFlags::VERTEX_BUFFER,
            &mesh.vertices,
        );
        let (index_buffer, index_allocation) =
            upload(instance, vk::BufferUsageFlags::INDEX_BUFFER, &mesh.indices);

        Self {
            vertex_buffer,
            vertex_allocation,
            index_buffer,
            index_allocation,
            index_count: mesh.indices.len() as u32,
            base_color: mesh.base_color,
        }
    }

    fn destroy(&self, instance: &impl Instance) {
        let device = instance.device();
        let allocator = instance.allocator();
        unsafe {
            allocator.deallocate(device, &self.vertex_allocation).unwrap();
            device.destroy_buffer(Some(self.vertex_buffer), None);
            allocator.deallocate(device, &self.index_allocation).unwrap();
            device.destroy_buffer(Some(self.index_buffer), None);
        }
    }
}

fn upload<T: Copy>(
    instance: &impl Instance,
    usage: vk::BufferUsageFlags,
    data: &[T],
) -> (vk::Buffer, vk_alloc::Allocation) {
    let device = instance.device();
    let allocator = instance.allocator();

    let buffer_info = vk::BufferCreateInfoBuilder::new()
        .size((std::mem::size_of::<T>() * data.len()) as vk::DeviceSize)
        .usage(usage)
        .sharing_mode(vk::SharingMode::EXCLUSIVE);
    let buffer = unsafe { device.create_buffer(&buffer_info, None) }.unwrap();

    let mut allocation = allocator
        .allocate_memory_for_buffer(device, buffer, vk_alloc::MemoryLocation::CpuToGpu)
        .unwrap();
    unsafe { device.bind_buffer_memory(buffer, allocation.device_memory, allocation.offset) }
        .unwrap();

    let slice = allocation.mapped_slice_mut().unwrap().unwrap();
    unsafe { std::ptr::copy_nonoverlapping(data.as_ptr(), slice.as_mut_ptr().cast(), data.len()) };

    (buffer, allocation)
}

impl<T: Instance> ModelManager<T> {
    pub fn new(instance: std::sync::Arc<T>) -> Self {
        Self {
            instance,
            models: std::collections::HashMap::new(),
        }
    }

    pub fn upload_model(&mut self, id: ObjectId, model: &Model) {
        let buffers = model
            .meshes
            .iter()
            .map(|mesh| MeshBuffer::new(self.instance.as_ref(), mesh))
            .collect();
        if let Some(old) = self.models.insert(id, buffers) {
            for mesh in &old {
                mesh.destroy(self.instance.as_ref())
            }
        }
    }

    fn meshes(&self, id: ObjectId) -> Option<&[MeshBuffer]> {
        self.models.get(&id).map(Vec::as_slice)
    }

    pub fn mesh_count(&self) -> usize {
        self.models.values().map(Vec::len).sum()
    }
}

impl<T: Instance> Drop for ModelManager<T> {
    fn drop(&mut self) {
        for mesh in self.models.values().flatten() {
            mesh.destroy(self.instance.as_ref())
        }
    }
}

impl<T: Instance> ModelRenderer<T> {
    const MODEL_VERT_SPV_BYTES: &'static [u8] = include_shader!("model.vert");
    const MODEL_FRAG_SPV_BYTES: &'static [u8] = include_shader!("model.frag");

    pub fn new(instance: std::sync::Arc<T>, surface: &impl Renderable) -> Self {
        let device = instance.device();
        let render_info = surface.render_info();

        let vert_code = erupt::utils::decode_spv(Self::MODEL_VERT_SPV_BYTES).unwrap();
        let vert_shader_module_create_info =
            vk::ShaderModuleCreateInfoBuilder::new().code(&vert_code);
        let vert_shader_module =
            unsafe { device.create_shader_module(&vert_shader_module_create_info, None) }.unwrap();

        let frag_code = erupt::utils::decode_spv(Self::MODEL_FRAG_SPV_BYTES).unwrap();
        let frag_shader_module_create_info =
            vk::ShaderModuleCreateInfoBuilder::new().code(&frag_code);
        let frag_shader_module =
            unsafe { device.create_shader_module(&frag_shader_module_create_info, None) }.unwrap();

        let entry_point = std::ffi::CString::new("main").unwrap();

        let stages = [
            vk::PipelineShaderStageCreateInfoBuilder::new()
                .stage(vk::ShaderStageFlagBits::VERTEX)
                .module(vert_shader_module)
                .name(&entry_point),
            vk::PipelineShaderStageCreateInfoBuilder::new()
                .stage(vk::ShaderStageFlagBits::FRAGMENT)
                .module(frag_shader_module)
                .name(&entry_point),
        ];

        let vertex_binding = vk::VertexInputBindingDescriptionBuilder::new()
            .binding(0)
            .stride(std::mem::size_of::<Vertex>() as u32)
            .input_rate(vk::VertexInputRate::VERTEX);
        let vertex_attributes = [
            vk::VertexInputAttributeDescriptionBuilder::new()
                .location(0)
                .binding(0)
                .format(vk::Format::R32G32B32_SFLOAT)
                .offset(0),
            vk::VertexInputAttributeDescriptionBuilder::new()
                .location(1)
                .binding(0)
                .format(vk::Format::R32G32B32_SFLOAT)
                .offset(12),
        ];
        let vertex_input_state = vk::PipelineVertexInputStateCreateInfoBuilder::new()
            .vertex_binding_descriptions(std::slice::from_ref(&vertex_binding))
            .vertex_attribute_descriptions(&vertex_attributes);

        let input_assembly_state = vk::PipelineInputAssemblyStateCreateInfoBuilder::new()
            .topology(vk::PrimitiveTopology::TRIANGLE_LIST)
            .primitive_restart_enable(false);

        let viewport = vk::ViewportBuilder::new()
            .x(0.0)
            .y(0.0)
            .width(render_info.extent.width as f32)
            .height(render_info.extent.height as f32)
            .min_depth(0.0)
            .max_depth(1.0);
        let scissor = vk::Rect2DBuilder::new()
            .offset(vk::Offset2D { x: 0, y: 0 })
            .extent(render_info.extent);
        let viewport_state = vk::PipelineViewportStateCreateInfoBuilder::new()
            .viewports(std::slice::from_ref(&viewport))
            .scissors(std::slice::from_ref(&scissor));

        // glTF triangles are CCW in world space; the y flip of the vk
        // projection makes them CW on screen
        let rasterization_state = vk::PipelineRasterizationStateCreateInfoBuilder::new()
            .depth_clamp_enable(false)
            .rasterizer_discard_enable(false)
            .polygon_mode(vk::PolygonMode::FILL)
            .cull_mode(vk::CullModeFlags::BACK)
            .front_face(vk::FrontFace::CLOCKWISE)
            .depth_bias_enable(false)
            .line_width(1.0);

        let multisample_state = vk::PipelineMultisampleStateCreateInfoBuilder::new()
            .rasterization_samples(vk::SampleCountFlagBits::_1)
            .sample_shading_enable(false)
            .alpha_to_coverage_enable(false)
            .alpha_to_one_enable(false);

        let depth_stencil_state = vk::PipelineDepthStencilStateCreateInfoBuilder::new()
            .depth_test_enable(true)
            .depth_write_enable(true)
            .depth_compare_op(vk::CompareOp::LESS)
            .depth_bounds_test_enable(false)
            .stencil_test_enable(false);

        let color_blend_attachment = vk::PipelineColorBlendAttachmentStateBuilder::new()
            .blend_enable(false)
            .color_write_mask(vk::ColorComponentFlags::all());
        let color_blend_state = vk::PipelineColorBlendStateCreateInfoBuilder::new()
            .logic_op_enable(false)
            .attachments(std::slice::from_ref(&color_blend_attachment))
            .blend_constants([0.0, 0.0, 0.0, 0.0]);

        let push_constant_range = vk::PushConstantRangeBuilder::new()
            .stage_flags(vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::FRAGMENT)
            .offset(0)
            .size(std::mem::size_of::<PushConstants>() as u32);

        let layout_create_info = vk::PipelineLayoutCreateInfoBuilder::new()
            .push_constant_ranges(std::slice::from_ref(&push_constant_range));

        let layout = unsafe { device.create_pipeline_layout(&layout_create_info, None) }.unwrap();

        let pipeline_create_info = vk::GraphicsPipelineCreateInfoBuilder::new()
            .stages(&stages)
            .vertex_input_state(&vertex_input_state)
            .input_assembly_state(&input_assembly_state)
            .viewport_state(&viewport_state)
            .rasterization_state(&rasterization_state)
            .multisample_state(&multisample_state)
            .depth_stencil_state(&depth_stencil_state)
            .color_blend_state(&color_blend_state)
            .layout(layout)
            .render_pass(render_info.render_pass)
            .subpass(0);

        let pipeline =
            unsafe { device.create_graphics_pipelines(None, &[pipeline_create_info], None) }
                .unwrap()[0];

        unsafe {
            device.destroy_shader_module(Some(vert_shader_module), None);
            device.destroy_shader_module(Some(frag_shader_module), None);
        }

        Self {
            instance,
            layout,
            pipeline,
            extent: render_info.extent,
        }
    }

    fn perspective_mat(&self, v_fov_degrees: f32) -> uv::Mat4 {
        uv::projection::perspective_infinite_z_vk(
            v_fov_degrees.to_radians(),
            self.extent.width as f32 / self.extent.height as f32,
            Z_NEAR,
        )
    }

    /// One indexed draw per mesh, per scene object with an uploaded model.
    pub fn render(
        &mut self,
        command_buffer: vk::CommandBuffer,
        manager: &ModelManager<impl Instance>,
        scene: &Scene,
        view_mat: uv::Mat4,
        v_fov_degrees: f32,
    ) {
        let device = self.instance.device();
        unsafe {
            device.cmd_bind_pipeline(
                command_buffer,
                vk::PipelineBindPoint::GRAPHICS,
                self.pipeline,
            );
        }
        let view_projection = self.perspective_mat(v_fov_degrees) * view_mat;
        for (id, transform) in scene.iter() {
            let meshes = match manager.meshes(id) {
                Some(meshes) => meshes,
                None => continue,
            };
            let mvp = view_projection * transform.mat();
            for mesh in meshes {
                let push = PushConstants {
                    mvp,
                    base_color: mesh.base_color,
                };
                unsafe {
                    device.cmd_push_constants(
                        command_buffer,
                        self.layout,
                        vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::FRAGMENT,
                        0,
                        std::mem::size_of::<PushConstants>() as u32,
                        (&push as *const PushConstants).cast(),
                    );
                    device.cmd_bind_vertex_buffers(command_buffer, 0, &[mesh.vertex_buffer], &[0]);
                    device.cmd_bind_index_buffer(
                        command_buffer,
                        mesh.index_buffer,
                        0,
                        vk::IndexType::UINT32,
                    );
                    device.cmd_draw_indexed(command_buffer, mesh.index_count, 1, 0, 0, 0)
                }
            }
        }
    }

    pub fn rebuild(&mut self, surface: &impl Renderable) {
        let instance = self.instance.clone();
        unsafe {
            std::mem::drop(std::ptr::read(self));
            std::ptr::write(self, Self::new(instance, surface))
        }
    }
}

impl<T: Instance> Drop for ModelRenderer<T> {
    fn drop(&mut self) {
        let device = self.instance.device();
        unsafe {
            device.destroy_pipeline_layout(Some(self.layout), None);
            device.destroy_pipeline(Some(self.pipeline), None)
        }
    }
}
