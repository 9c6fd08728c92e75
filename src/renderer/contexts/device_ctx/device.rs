use ash::prelude::VkResult;
use ash::vk;
use crate::renderer::contexts::device_ctx::GpuDevice;

impl GpuDevice for ash::Device {
    fn create_descriptor_set_layout(
        &self,
        create_info: &vk::DescriptorSetLayoutCreateInfo<'_>,
    ) -> VkResult<vk::DescriptorSetLayout> {
        unsafe { ash::Device::create_descriptor_set_layout(self, create_info, None) }
    }

    fn destroy_descriptor_set_layout(&self, layout: vk::DescriptorSetLayout) {
        unsafe { ash::Device::destroy_descriptor_set_layout(self, layout, None) }
    }

    fn create_pipeline_layout(
        &self,
        create_info: &vk::PipelineLayoutCreateInfo<'_>,
    ) -> VkResult<vk::PipelineLayout> {
        unsafe { ash::Device::create_pipeline_layout(self, create_info, None) }
    }

    fn destroy_pipeline_layout(&self, layout: vk::PipelineLayout) {
        unsafe { ash::Device::destroy_pipeline_layout(self, layout, None) }
    }

    fn create_descriptor_pool(
        &self,
        create_info: &vk::DescriptorPoolCreateInfo<'_>,
    ) -> VkResult<vk::DescriptorPool> {
        unsafe { ash::Device::create_descriptor_pool(self, create_info, None) }
    }

    fn destroy_descriptor_pool(&self, pool: vk::DescriptorPool) {
        unsafe { ash::Device::destroy_descriptor_pool(self, pool, None) }
    }

    fn allocate_descriptor_sets(
        &self,
        allocate_info: &vk::DescriptorSetAllocateInfo<'_>,
    ) -> VkResult<Vec<vk::DescriptorSet>> {
        unsafe { ash::Device::allocate_descriptor_sets(self, allocate_info) }
    }

    fn update_descriptor_sets(&self, writes: &[vk::WriteDescriptorSet<'_>]) {
        unsafe { ash::Device::update_descriptor_sets(self, writes, &[]) }
    }

    fn create_shader_module(
        &self,
        create_info: &vk::ShaderModuleCreateInfo<'_>,
    ) -> VkResult<vk::ShaderModule> {
        unsafe { ash::Device::create_shader_module(self, create_info, None) }
    }

    fn destroy_shader_module(&self, module: vk::ShaderModule) {
        unsafe { ash::Device::destroy_shader_module(self, module, None) }
    }

    fn create_graphics_pipeline(
        &self,
        create_info: &vk::GraphicsPipelineCreateInfo<'_>,
    ) -> VkResult<vk::Pipeline> {
        let pipelines = unsafe {
            ash::Device::create_graphics_pipelines(
                self,
                vk::PipelineCache::null(),
                std::slice::from_ref(create_info),
                None,
            )
        }
        .map_err(|(_, err)| err)?;

        Ok(pipelines[0])
    }

    fn destroy_pipeline(&self, pipeline: vk::Pipeline) {
        unsafe { ash::Device::destroy_pipeline(self, pipeline, None) }
    }

    fn cmd_bind_pipeline(
        &self,
        command_buffer: vk::CommandBuffer,
        bind_point: vk::PipelineBindPoint,
        pipeline: vk::Pipeline,
    ) {
        unsafe { ash::Device::cmd_bind_pipeline(self, command_buffer, bind_point, pipeline) }
    }

    fn cmd_bind_descriptor_sets(
        &self,
        command_buffer: vk::CommandBuffer,
        bind_point: vk::PipelineBindPoint,
        layout: vk::PipelineLayout,
        first_set: u32,
        descriptor_sets: &[vk::DescriptorSet],
        dynamic_offsets: &[u32],
    ) {
        unsafe {
            ash::Device::cmd_bind_descriptor_sets(
                self,
                command_buffer,
                bind_point,
                layout,
                first_set,
                descriptor_sets,
                dynamic_offsets,
            )
        }
    }

    fn cmd_push_constants(
        &self,
        command_buffer: vk::CommandBuffer,
        layout: vk::PipelineLayout,
        stage_flags: vk::ShaderStageFlags,
        offset: u32,
        data: &[u8],
    ) {
        unsafe {
            ash::Device::cmd_push_constants(self, command_buffer, layout, stage_flags, offset, data)
        }
    }
}
