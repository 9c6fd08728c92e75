//! A recording [`GpuDevice`] that never talks to a driver.

use std::cell::{Cell, RefCell};
use ash::prelude::VkResult;
use ash::vk;
use ash::vk::Handle;
use crate::renderer::contexts::device_ctx::GpuDevice;

#[derive(Debug, Clone)]
pub struct RecordedSetLayout {
    pub handle: vk::DescriptorSetLayout,
    pub bindings: Vec<(u32, vk::DescriptorType, u32, vk::ShaderStageFlags)>,
}

#[derive(Debug, Clone)]
pub struct RecordedPipelineLayout {
    pub handle: vk::PipelineLayout,
    pub set_layouts: Vec<vk::DescriptorSetLayout>,
    pub push_constant_ranges: Vec<vk::PushConstantRange>,
}

#[derive(Debug, Clone)]
pub struct RecordedPool {
    pub handle: vk::DescriptorPool,
    pub max_sets: u32,
    pub sizes: Vec<(vk::DescriptorType, u32)>,
}

#[derive(Debug, Clone)]
pub struct RecordedWrite {
    pub dst_set: vk::DescriptorSet,
    pub binding: u32,
    pub array_element: u32,
    pub count: u32,
    pub ty: vk::DescriptorType,
    /// Buffer handles for buffer writes, image view handles for image writes.
    pub resources: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedBind {
    pub first_set: u32,
    pub sets: Vec<vk::DescriptorSet>,
    pub dynamic_offsets: Vec<u32>,
}

#[derive(Debug, Clone)]
pub struct RecordedPipeline {
    pub handle: vk::Pipeline,
    pub stage_count: u32,
    pub stages: Vec<vk::ShaderStageFlags>,
    pub color_attachment_count: u32,
    pub dynamic_states: Vec<vk::DynamicState>,
    pub topology: vk::PrimitiveTopology,
    pub polygon_mode: vk::PolygonMode,
    pub cull_mode: vk::CullModeFlags,
    pub front_face: vk::FrontFace,
    pub depth_bias_enable: bool,
    pub depth_test_enable: bool,
    pub depth_write_enable: bool,
    pub samples: vk::SampleCountFlags,
    pub sample_shading_enable: bool,
    pub vertex_binding_count: u32,
    pub vertex_attribute_count: u32,
    pub viewport_count: u32,
    pub has_static_viewports: bool,
    pub layout: vk::PipelineLayout,
    pub render_pass: vk::RenderPass,
    pub subpass: u32,
}

#[derive(Default)]
pub struct MockDevice {
    next_handle: Cell<u64>,

    pub fail_pipeline: Cell<bool>,
    pub fail_pipeline_layout: Cell<bool>,
    /// Set layout creation fails once this many have been created.
    pub set_layout_limit: Cell<Option<usize>>,
    /// Descriptor pool creation fails once this many have been created.
    pub pool_limit: Cell<Option<usize>>,
    /// Pools hand out at most this many sets, regardless of `max_sets`.
    pub pool_set_capacity: Cell<Option<u32>>,

    pub set_layouts: RefCell<Vec<RecordedSetLayout>>,
    pub destroyed_set_layouts: RefCell<Vec<vk::DescriptorSetLayout>>,
    pub pipeline_layouts: RefCell<Vec<RecordedPipelineLayout>>,
    pub destroyed_pipeline_layouts: RefCell<Vec<vk::PipelineLayout>>,
    pub pools: RefCell<Vec<RecordedPool>>,
    pub destroyed_pools: RefCell<Vec<vk::DescriptorPool>>,
    pub allocations: RefCell<Vec<(vk::DescriptorPool, Vec<vk::DescriptorSet>)>>,
    pub update_calls: RefCell<Vec<Vec<RecordedWrite>>>,
    pub shader_modules: RefCell<Vec<vk::ShaderModule>>,
    pub destroyed_shader_modules: RefCell<Vec<vk::ShaderModule>>,
    pub pipelines: RefCell<Vec<RecordedPipeline>>,
    pub destroyed_pipelines: RefCell<Vec<vk::Pipeline>>,
    pub bound_descriptor_sets: RefCell<Vec<RecordedBind>>,
}

impl MockDevice {
    pub fn new() -> Self {
        Self {
            next_handle: Cell::new(0x1000),
            ..Default::default()
        }
    }

    fn handle(&self) -> u64 {
        let handle = self.next_handle.get();
        self.next_handle.set(handle + 1);
        handle
    }

    /// Every descriptor set ever written to, with the bindings touched.
    pub fn all_writes(&self) -> Vec<RecordedWrite> {
        self.update_calls.borrow().iter().flatten().cloned().collect()
    }

    pub fn live_set_layouts(&self) -> usize {
        self.set_layouts.borrow().len() - self.destroyed_set_layouts.borrow().len()
    }

    pub fn live_pipeline_layouts(&self) -> usize {
        self.pipeline_layouts.borrow().len() - self.destroyed_pipeline_layouts.borrow().len()
    }

    pub fn live_pools(&self) -> usize {
        self.pools.borrow().len() - self.destroyed_pools.borrow().len()
    }

    pub fn live_shader_modules(&self) -> usize {
        self.shader_modules.borrow().len() - self.destroyed_shader_modules.borrow().len()
    }

    pub fn live_pipelines(&self) -> usize {
        self.pipelines.borrow().len() - self.destroyed_pipelines.borrow().len()
    }
}

unsafe fn slice<'a, T>(ptr: *const T, len: u32) -> &'a [T] {
    if ptr.is_null() || len == 0 {
        &[]
    } else {
        unsafe { std::slice::from_raw_parts(ptr, len as usize) }
    }
}

impl GpuDevice for MockDevice {
    fn create_descriptor_set_layout(
        &self,
        create_info: &vk::DescriptorSetLayoutCreateInfo<'_>,
    ) -> VkResult<vk::DescriptorSetLayout> {
        if let Some(limit) = self.set_layout_limit.get() {
            if self.set_layouts.borrow().len() >= limit {
                return Err(vk::Result::ERROR_OUT_OF_DEVICE_MEMORY);
            }
        }

        let bindings = unsafe { slice(create_info.p_bindings, create_info.binding_count) }
            .iter()
            .map(|b| (b.binding, b.descriptor_type, b.descriptor_count, b.stage_flags))
            .collect();
        let handle = vk::DescriptorSetLayout::from_raw(self.handle());
        self.set_layouts
            .borrow_mut()
            .push(RecordedSetLayout { handle, bindings });
        Ok(handle)
    }

    fn destroy_descriptor_set_layout(&self, layout: vk::DescriptorSetLayout) {
        self.destroyed_set_layouts.borrow_mut().push(layout);
    }

    fn create_pipeline_layout(
        &self,
        create_info: &vk::PipelineLayoutCreateInfo<'_>,
    ) -> VkResult<vk::PipelineLayout> {
        if self.fail_pipeline_layout.get() {
            return Err(vk::Result::ERROR_OUT_OF_HOST_MEMORY);
        }

        let handle = vk::PipelineLayout::from_raw(self.handle());
        self.pipeline_layouts.borrow_mut().push(RecordedPipelineLayout {
            handle,
            set_layouts: unsafe {
                slice(create_info.p_set_layouts, create_info.set_layout_count)
            }
            .to_vec(),
            push_constant_ranges: unsafe {
                slice(
                    create_info.p_push_constant_ranges,
                    create_info.push_constant_range_count,
                )
            }
            .to_vec(),
        });
        Ok(handle)
    }

    fn destroy_pipeline_layout(&self, layout: vk::PipelineLayout) {
        self.destroyed_pipeline_layouts.borrow_mut().push(layout);
    }

    fn create_descriptor_pool(
        &self,
        create_info: &vk::DescriptorPoolCreateInfo<'_>,
    ) -> VkResult<vk::DescriptorPool> {
        if let Some(limit) = self.pool_limit.get() {
            if self.pools.borrow().len() >= limit {
                return Err(vk::Result::ERROR_OUT_OF_DEVICE_MEMORY);
            }
        }

        let handle = vk::DescriptorPool::from_raw(self.handle());
        self.pools.borrow_mut().push(RecordedPool {
            handle,
            max_sets: create_info.max_sets,
            sizes: unsafe { slice(create_info.p_pool_sizes, create_info.pool_size_count) }
                .iter()
                .map(|size| (size.ty, size.descriptor_count))
                .collect(),
        });
        Ok(handle)
    }

    fn destroy_descriptor_pool(&self, pool: vk::DescriptorPool) {
        self.destroyed_pools.borrow_mut().push(pool);
    }

    fn allocate_descriptor_sets(
        &self,
        allocate_info: &vk::DescriptorSetAllocateInfo<'_>,
    ) -> VkResult<Vec<vk::DescriptorSet>> {
        let requested = allocate_info.descriptor_set_count;
        let max_sets = self
            .pools
            .borrow()
            .iter()
            .find(|pool| pool.handle == allocate_info.descriptor_pool)
            .map(|pool| pool.max_sets)
            .ok_or(vk::Result::ERROR_UNKNOWN)?;
        let capacity = self.pool_set_capacity.get().unwrap_or(max_sets).min(max_sets);
        if requested > capacity {
            return Err(vk::Result::ERROR_OUT_OF_POOL_MEMORY);
        }

        let sets = (0..requested)
            .map(|_| vk::DescriptorSet::from_raw(self.handle()))
            .collect::<Vec<_>>();
        self.allocations
            .borrow_mut()
            .push((allocate_info.descriptor_pool, sets.clone()));
        Ok(sets)
    }

    fn update_descriptor_sets(&self, writes: &[vk::WriteDescriptorSet<'_>]) {
        let recorded = writes
            .iter()
            .map(|write| {
                let resources = if !write.p_buffer_info.is_null() {
                    unsafe { slice(write.p_buffer_info, write.descriptor_count) }
                        .iter()
                        .map(|info| info.buffer.as_raw())
                        .collect()
                } else {
                    unsafe { slice(write.p_image_info, write.descriptor_count) }
                        .iter()
                        .map(|info| info.image_view.as_raw())
                        .collect()
                };

                RecordedWrite {
                    dst_set: write.dst_set,
                    binding: write.dst_binding,
                    array_element: write.dst_array_element,
                    count: write.descriptor_count,
                    ty: write.descriptor_type,
                    resources,
                }
            })
            .collect();
        self.update_calls.borrow_mut().push(recorded);
    }

    fn create_shader_module(
        &self,
        _create_info: &vk::ShaderModuleCreateInfo<'_>,
    ) -> VkResult<vk::ShaderModule> {
        let handle = vk::ShaderModule::from_raw(self.handle());
        self.shader_modules.borrow_mut().push(handle);
        Ok(handle)
    }

    fn destroy_shader_module(&self, module: vk::ShaderModule) {
        self.destroyed_shader_modules.borrow_mut().push(module);
    }

    fn create_graphics_pipeline(
        &self,
        create_info: &vk::GraphicsPipelineCreateInfo<'_>,
    ) -> VkResult<vk::Pipeline> {
        if self.fail_pipeline.get() {
            return Err(vk::Result::ERROR_OUT_OF_DEVICE_MEMORY);
        }

        let recorded = unsafe {
            let stages = slice(create_info.p_stages, create_info.stage_count);
            let color_blend = &*create_info.p_color_blend_state;
            let input_assembly = &*create_info.p_input_assembly_state;
            let rasterization = &*create_info.p_rasterization_state;
            let multisample = &*create_info.p_multisample_state;
            let depth_stencil = &*create_info.p_depth_stencil_state;
            let vertex_input = &*create_info.p_vertex_input_state;
            let viewport = &*create_info.p_viewport_state;
            let dynamic_states = if create_info.p_dynamic_state.is_null() {
                Vec::new()
            } else {
                let dynamic = &*create_info.p_dynamic_state;
                slice(dynamic.p_dynamic_states, dynamic.dynamic_state_count).to_vec()
            };

            RecordedPipeline {
                handle: vk::Pipeline::from_raw(self.handle()),
                stage_count: create_info.stage_count,
                stages: stages.iter().map(|stage| stage.stage).collect(),
                color_attachment_count: color_blend.attachment_count,
                dynamic_states,
                topology: input_assembly.topology,
                polygon_mode: rasterization.polygon_mode,
                cull_mode: rasterization.cull_mode,
                front_face: rasterization.front_face,
                depth_bias_enable: rasterization.depth_bias_enable == vk::TRUE,
                depth_test_enable: depth_stencil.depth_test_enable == vk::TRUE,
                depth_write_enable: depth_stencil.depth_write_enable == vk::TRUE,
                samples: multisample.rasterization_samples,
                sample_shading_enable: multisample.sample_shading_enable == vk::TRUE,
                vertex_binding_count: vertex_input.vertex_binding_description_count,
                vertex_attribute_count: vertex_input.vertex_attribute_description_count,
                viewport_count: viewport.viewport_count,
                has_static_viewports: !viewport.p_viewports.is_null(),
                layout: create_info.layout,
                render_pass: create_info.render_pass,
                subpass: create_info.subpass,
            }
        };

        let handle = recorded.handle;
        self.pipelines.borrow_mut().push(recorded);
        Ok(handle)
    }

    fn destroy_pipeline(&self, pipeline: vk::Pipeline) {
        self.destroyed_pipelines.borrow_mut().push(pipeline);
    }

    fn cmd_bind_pipeline(
        &self,
        _command_buffer: vk::CommandBuffer,
        _bind_point: vk::PipelineBindPoint,
        _pipeline: vk::Pipeline,
    ) {
    }

    fn cmd_bind_descriptor_sets(
        &self,
        _command_buffer: vk::CommandBuffer,
        _bind_point: vk::PipelineBindPoint,
        _layout: vk::PipelineLayout,
        first_set: u32,
        descriptor_sets: &[vk::DescriptorSet],
        dynamic_offsets: &[u32],
    ) {
        self.bound_descriptor_sets.borrow_mut().push(RecordedBind {
            first_set,
            sets: descriptor_sets.to_vec(),
            dynamic_offsets: dynamic_offsets.to_vec(),
        });
    }

    fn cmd_push_constants(
        &self,
        _command_buffer: vk::CommandBuffer,
        _layout: vk::PipelineLayout,
        _stage_flags: vk::ShaderStageFlags,
        _offset: u32,
        _data: &[u8],
    ) {
    }
}
