use std::ops::Range;
use std::sync::Arc;
use ash::vk;
use crate::renderer::contexts::device_ctx::{GpuDevice, RenderDeviceContext};
use crate::renderer::contexts::resource_ctx::descriptor_writer::DescriptorWriter;
use crate::renderer::contexts::resource_ctx::resource_type::PoolSizingTable;
use crate::renderer::error::{PipelineError, Result};

struct FrameDescriptors {
    pool: vk::DescriptorPool,
    // primitive-major: primitive * sets_per_primitive + set
    sets: Vec<vk::DescriptorSet>,
}

/// Descriptor sets for every (frame, primitive, set) triple, allocated up front.
///
/// One pool per frame in flight. Each pool holds `primitive_count` contiguous
/// groups of sets, one set per layout. The arena never grows; rebuild it when
/// the primitive count or layouts change.
pub struct DescriptorArena {
    frames: Vec<FrameDescriptors>,
    frame_count: usize,
    primitives_per_frame: usize,
    sets_per_primitive: usize,
    device: Arc<dyn GpuDevice>,
}

impl DescriptorArena {
    pub fn new(
        dev_ctx: &RenderDeviceContext,
        set_layouts: &[vk::DescriptorSetLayout],
        pool_sizing: &PoolSizingTable,
        primitive_count: usize,
        frame_count: usize,
    ) -> Result<Self> {
        let sets_per_primitive = set_layouts.len();
        let primitives_per_frame = if sets_per_primitive == 0 { 0 } else { primitive_count };

        // Pools created before a failure are destroyed when this drops.
        let mut arena = Self {
            frames: Vec::with_capacity(frame_count),
            frame_count,
            primitives_per_frame,
            sets_per_primitive,
            device: dev_ctx.device.clone(),
        };

        if primitives_per_frame == 0 {
            log::debug!("Descriptor arena has nothing to allocate");
            return Ok(arena);
        }

        // Counts are checked before anything is allocated
        let primitive_factor = u32::try_from(primitives_per_frame)
            .map_err(|_| PipelineError::DescriptorCountOverflow)?;
        let sets_per_frame = primitives_per_frame
            .checked_mul(sets_per_primitive)
            .and_then(|sets| u32::try_from(sets).ok())
            .ok_or(PipelineError::DescriptorCountOverflow)?;
        let pool_sizes = pool_sizing.scaled(primitive_factor)?.pool_sizes();
        let layouts = (0..primitives_per_frame)
            .flat_map(|_| set_layouts.iter().copied())
            .collect::<Vec<_>>();

        for frame in 0..frame_count {
            let pool_info = vk::DescriptorPoolCreateInfo::default()
                .max_sets(sets_per_frame)
                .pool_sizes(&pool_sizes);
            let pool = arena.device.create_descriptor_pool(&pool_info)?;
            arena.frames.push(FrameDescriptors {
                pool,
                sets: Vec::new(),
            });

            let allocate_info = vk::DescriptorSetAllocateInfo::default()
                .descriptor_pool(pool)
                .set_layouts(&layouts);
            let sets = arena
                .device
                .allocate_descriptor_sets(&allocate_info)
                .map_err(|err| match err {
                    vk::Result::ERROR_OUT_OF_POOL_MEMORY | vk::Result::ERROR_FRAGMENTED_POOL => {
                        log::error!(
                            "Descriptor pool for frame {} cannot hold {} sets: {}",
                            frame,
                            sets_per_frame,
                            err,
                        );
                        PipelineError::DescriptorPoolExhausted { frame }
                    }
                    err => PipelineError::Vulkan(err),
                })?;

            if let Some(frame_descriptors) = arena.frames.last_mut() {
                frame_descriptors.sets = sets;
            }
        }

        log::info!(
            "Allocated descriptor arena: {} frames x {} primitives x {} sets",
            frame_count,
            primitives_per_frame,
            sets_per_primitive,
        );

        Ok(arena)
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    pub fn primitives_per_frame(&self) -> usize {
        self.primitives_per_frame
    }

    pub fn sets_per_primitive(&self) -> usize {
        self.sets_per_primitive
    }

    /// Where a primitive's sets live in its frame's flat set array.
    pub fn flat_range(&self, primitive: usize) -> Range<usize> {
        let start = primitive * self.sets_per_primitive;
        start..start + self.sets_per_primitive
    }

    /// Every set of one frame, primitive-major.
    pub fn frame_sets(&self, frame: usize) -> Result<&[vk::DescriptorSet]> {
        self.check_frame(frame)?;
        Ok(self
            .frames
            .get(frame)
            .map(|frame_descriptors| frame_descriptors.sets.as_slice())
            .unwrap_or_default())
    }

    /// The sets to bind when drawing `primitive` in `frame`, indexed by set number.
    pub fn sets(&self, frame: usize, primitive: usize) -> Result<&[vk::DescriptorSet]> {
        self.check_frame(frame)?;
        if primitive >= self.primitives_per_frame {
            return Err(PipelineError::PrimitiveOutOfRange {
                primitive,
                primitive_count: self.primitives_per_frame,
            });
        }

        let range = self.flat_range(primitive);
        self.frames
            .get(frame)
            .and_then(|frame_descriptors| frame_descriptors.sets.get(range))
            .ok_or(PipelineError::PrimitiveOutOfRange {
                primitive,
                primitive_count: self.primitives_per_frame,
            })
    }

    /// A writer restricted to the sets of one primitive.
    pub fn writer(&self, frame: usize, primitive: usize) -> Result<DescriptorWriter<'_>> {
        let sets = self.sets(frame, primitive)?;
        Ok(DescriptorWriter::new(sets, self.device.as_ref()))
    }

    fn check_frame(&self, frame: usize) -> Result<()> {
        if frame >= self.frame_count {
            return Err(PipelineError::FrameOutOfRange {
                frame,
                frame_count: self.frame_count,
            });
        }
        Ok(())
    }
}

impl Drop for DescriptorArena {
    fn drop(&mut self) {
        // Destroying a pool frees its sets
        for frame in self.frames.drain(..) {
            self.device.destroy_descriptor_pool(frame.pool);
        }
    }
}
