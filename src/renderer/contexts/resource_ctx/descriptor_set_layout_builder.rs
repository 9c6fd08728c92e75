use ash::vk;
use crate::renderer::contexts::device_ctx::GpuDevice;
use crate::renderer::contexts::pipeline_ctx::reflection::ShaderBinding;
use crate::renderer::error::Result;

pub struct DescriptorSetLayoutBuilder {
    bindings: Vec<vk::DescriptorSetLayoutBinding<'static>>,
}

impl DescriptorSetLayoutBuilder {
    pub fn new() -> Self {
        Self {
            bindings: Vec::new(),
        }
    }

    pub fn add_binding(
        mut self,
        binding: u32,
        descriptor_type: vk::DescriptorType,
        descriptor_count: u32,
        stages: vk::ShaderStageFlags,
    ) -> Self {
        self.bindings.push(
            vk::DescriptorSetLayoutBinding::default()
                .binding(binding)
                .descriptor_type(descriptor_type)
                .descriptor_count(descriptor_count)
                .stage_flags(stages),
        );
        self
    }

    pub fn add_shader_binding(self, binding: &ShaderBinding) -> Self {
        self.add_binding(
            binding.slot,
            binding.resource_type.descriptor_type(),
            binding.count,
            binding.stage_flags,
        )
    }

    pub fn build(
        self,
        flags: vk::DescriptorSetLayoutCreateFlags,
        device: &dyn GpuDevice,
    ) -> Result<vk::DescriptorSetLayout> {
        let layout_info = vk::DescriptorSetLayoutCreateInfo::default()
            .bindings(&self.bindings)
            .flags(flags);

        Ok(device.create_descriptor_set_layout(&layout_info)?)
    }
}

impl Default for DescriptorSetLayoutBuilder {
    fn default() -> Self {
        Self::new()
    }
}
