pub mod device;

use std::sync::Arc;
use ash::prelude::VkResult;
use ash::vk;

/// The subset of the Vulkan device API the pipeline and descriptor core needs.
///
/// Implemented for [`ash::Device`]. Every object handed out by this trait is
/// created with the default allocator callbacks.
pub trait GpuDevice {
    fn create_descriptor_set_layout(
        &self,
        create_info: &vk::DescriptorSetLayoutCreateInfo<'_>,
    ) -> VkResult<vk::DescriptorSetLayout>;

    fn destroy_descriptor_set_layout(&self, layout: vk::DescriptorSetLayout);

    fn create_pipeline_layout(
        &self,
        create_info: &vk::PipelineLayoutCreateInfo<'_>,
    ) -> VkResult<vk::PipelineLayout>;

    fn destroy_pipeline_layout(&self, layout: vk::PipelineLayout);

    fn create_descriptor_pool(
        &self,
        create_info: &vk::DescriptorPoolCreateInfo<'_>,
    ) -> VkResult<vk::DescriptorPool>;

    /// Destroying a pool implicitly frees every set allocated from it.
    fn destroy_descriptor_pool(&self, pool: vk::DescriptorPool);

    fn allocate_descriptor_sets(
        &self,
        allocate_info: &vk::DescriptorSetAllocateInfo<'_>,
    ) -> VkResult<Vec<vk::DescriptorSet>>;

    fn update_descriptor_sets(&self, writes: &[vk::WriteDescriptorSet<'_>]);

    fn create_shader_module(
        &self,
        create_info: &vk::ShaderModuleCreateInfo<'_>,
    ) -> VkResult<vk::ShaderModule>;

    fn destroy_shader_module(&self, module: vk::ShaderModule);

    fn create_graphics_pipeline(
        &self,
        create_info: &vk::GraphicsPipelineCreateInfo<'_>,
    ) -> VkResult<vk::Pipeline>;

    fn destroy_pipeline(&self, pipeline: vk::Pipeline);

    fn cmd_bind_pipeline(
        &self,
        command_buffer: vk::CommandBuffer,
        bind_point: vk::PipelineBindPoint,
        pipeline: vk::Pipeline,
    );

    fn cmd_bind_descriptor_sets(
        &self,
        command_buffer: vk::CommandBuffer,
        bind_point: vk::PipelineBindPoint,
        layout: vk::PipelineLayout,
        first_set: u32,
        descriptor_sets: &[vk::DescriptorSet],
        dynamic_offsets: &[u32],
    );

    fn cmd_push_constants(
        &self,
        command_buffer: vk::CommandBuffer,
        layout: vk::PipelineLayout,
        stage_flags: vk::ShaderStageFlags,
        offset: u32,
        data: &[u8],
    );
}

/// Responsibilities:
/// - Hold the logical device every pipeline and descriptor object is created on
/// - Be passed explicitly to anything that touches the device
///
/// Instance creation, physical device selection and queues live outside this crate.
#[derive(Clone)]
pub struct RenderDeviceContext {
    pub device: Arc<dyn GpuDevice>,
}

impl RenderDeviceContext {
    pub fn new(device: Arc<dyn GpuDevice>) -> Self {
        Self { device }
    }

    /// Wraps a logical device created by the surrounding renderer.
    pub fn from_ash(device: ash::Device) -> Self {
        Self {
            device: Arc::new(device),
        }
    }
}
