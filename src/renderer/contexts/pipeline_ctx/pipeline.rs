use std::sync::Arc;
use ash::vk;
use crate::renderer::contexts::device_ctx::GpuDevice;
use crate::renderer::contexts::pipeline_ctx::layout::{PipelineLayouts, SetLayoutDescription};
use crate::renderer::contexts::resource_ctx::resource_type::PoolSizingTable;
use crate::renderer::error::{PipelineError, Result};

/// An immutable graphics pipeline together with the layouts it was compiled against.
pub struct Pipeline {
    pipeline: vk::Pipeline,
    pipeline_bind_point: vk::PipelineBindPoint,
    render_pass: vk::RenderPass,
    subpass: u32,
    // Dropped after the pipeline handle is destroyed
    layouts: PipelineLayouts,
    device: Arc<dyn GpuDevice>,
}

impl Pipeline {
    pub(crate) fn new(
        pipeline: vk::Pipeline,
        render_pass: vk::RenderPass,
        subpass: u32,
        layouts: PipelineLayouts,
        device: Arc<dyn GpuDevice>,
    ) -> Self {
        Self {
            pipeline,
            pipeline_bind_point: vk::PipelineBindPoint::GRAPHICS,
            render_pass,
            subpass,
            layouts,
            device,
        }
    }

    pub fn handle(&self) -> vk::Pipeline {
        self.pipeline
    }

    pub fn layout(&self) -> vk::PipelineLayout {
        self.layouts.pipeline_layout()
    }

    pub fn set_layouts(&self) -> &[vk::DescriptorSetLayout] {
        self.layouts.set_layouts()
    }

    /// Per-type descriptor totals for one draw using this pipeline.
    pub fn pool_sizing(&self) -> &PoolSizingTable {
        self.layouts.pool_sizing()
    }

    pub fn description(&self) -> &SetLayoutDescription {
        self.layouts.description()
    }

    pub fn render_pass(&self) -> (vk::RenderPass, u32) {
        (self.render_pass, self.subpass)
    }

    pub fn push_constants(
        &self,
        command_buffer: vk::CommandBuffer,
        stage_flags: vk::ShaderStageFlags,
        offset: u32,
        data: &[u8],
    ) {
        self.device.cmd_push_constants(
            command_buffer,
            self.layout(),
            stage_flags,
            offset,
            data,
        );
    }

    pub fn bind_pipeline(&self, command_buffer: vk::CommandBuffer) {
        self.device.cmd_bind_pipeline(
            command_buffer,
            self.pipeline_bind_point,
            self.pipeline,
        );
    }

    /// Binds `descriptor_sets` starting at `first_set`.
    ///
    /// `dynamic_offsets` holds one entry per dynamic buffer descriptor in the
    /// bound sets, in set then slot order.
    pub fn bind_descriptor_sets(
        &self,
        command_buffer: vk::CommandBuffer,
        first_set: u32,
        descriptor_sets: &[vk::DescriptorSet],
        dynamic_offsets: &[u32],
    ) -> Result<()> {
        let expected = self.dynamic_offset_count(first_set, descriptor_sets.len());
        if dynamic_offsets.len() != expected {
            return Err(PipelineError::DynamicOffsetCountMismatch {
                expected,
                actual: dynamic_offsets.len(),
            });
        }

        self.device.cmd_bind_descriptor_sets(
            command_buffer,
            self.pipeline_bind_point,
            self.layout(),
            first_set,
            descriptor_sets,
            dynamic_offsets,
        );
        Ok(())
    }

    /// How many dynamic offsets binding `set_count` sets from `first_set` takes.
    pub fn dynamic_offset_count(&self, first_set: u32, set_count: usize) -> usize {
        self.description()
            .sets
            .iter()
            .skip(first_set as usize)
            .take(set_count)
            .flatten()
            .filter(|binding| binding.resource_type.is_dynamic())
            .map(|binding| binding.count as usize)
            .sum()
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        log::debug!("Destroying pipeline {:?}", self.pipeline);
        self.device.destroy_pipeline(self.pipeline);
    }
}
