use ash::vk;
use crate::renderer::config::RenderConfig;
use crate::renderer::contexts::device_ctx::RenderDeviceContext;
use crate::renderer::contexts::pipeline_ctx::pipeline::Pipeline;
use crate::renderer::contexts::resource_ctx::descriptor_arena::DescriptorArena;
use crate::renderer::contexts::resource_ctx::descriptor_writer::DescriptorWriter;
use crate::renderer::contexts::resource_ctx::resource_type::PoolSizingTable;
use crate::renderer::error::Result;

/// Responsibilities:
/// - Own the per-frame descriptor sets of every primitive
/// - Track which frame in flight is being recorded
/// - Drive per-primitive descriptor updates
pub struct RenderFrameContext {
    arena: DescriptorArena,
    current_frame: usize,
    frames_in_flight: usize,
}

impl RenderFrameContext {
    pub fn new(
        dev_ctx: &RenderDeviceContext,
        config: &RenderConfig,
        set_layouts: &[vk::DescriptorSetLayout],
        pool_sizing: &PoolSizingTable,
        primitive_count: usize,
    ) -> Result<Self> {
        let frames_in_flight = config.frames_in_flight.max(1);
        let arena = DescriptorArena::new(
            dev_ctx,
            set_layouts,
            pool_sizing,
            primitive_count,
            frames_in_flight,
        )?;

        Ok(Self {
            arena,
            current_frame: 0,
            frames_in_flight,
        })
    }

    /// Sizes the arena for `primitive_count` draws with `pipeline`.
    pub fn for_pipeline(
        dev_ctx: &RenderDeviceContext,
        config: &RenderConfig,
        pipeline: &Pipeline,
        primitive_count: usize,
    ) -> Result<Self> {
        Self::new(
            dev_ctx,
            config,
            pipeline.set_layouts(),
            pipeline.pool_sizing(),
            primitive_count,
        )
    }

    pub fn current_frame(&self) -> usize {
        self.current_frame
    }

    pub fn arena(&self) -> &DescriptorArena {
        &self.arena
    }

    /// Moves on to the next frame in flight and returns its index.
    pub fn advance(&mut self) -> usize {
        self.current_frame = (self.current_frame + 1) % self.frames_in_flight;
        self.current_frame
    }

    /// The sets to bind for `primitive` in the current frame.
    pub fn current_sets(&self, primitive: usize) -> Result<&[vk::DescriptorSet]> {
        self.arena.sets(self.current_frame, primitive)
    }

    /// Runs `bind` for each primitive of the current frame and flushes its writes.
    ///
    /// The caller must know the GPU has finished with this frame's sets.
    pub fn bind_primitives<F>(&self, primitive_count: usize, mut bind: F) -> Result<()>
    where
        F: FnMut(usize, &mut DescriptorWriter<'_>) -> Result<()>,
    {
        for primitive in 0..primitive_count {
            let mut writer = self.arena.writer(self.current_frame, primitive)?;
            bind(primitive, &mut writer)?;
            writer.write();
        }
        Ok(())
    }

    /// Replaces the arena for new scene content. On failure the old arena stays.
    pub fn rebuild(
        &mut self,
        dev_ctx: &RenderDeviceContext,
        set_layouts: &[vk::DescriptorSetLayout],
        pool_sizing: &PoolSizingTable,
        primitive_count: usize,
    ) -> Result<()> {
        self.arena = DescriptorArena::new(
            dev_ctx,
            set_layouts,
            pool_sizing,
            primitive_count,
            self.frames_in_flight,
        )?;
        self.current_frame = 0;
        Ok(())
    }
}
