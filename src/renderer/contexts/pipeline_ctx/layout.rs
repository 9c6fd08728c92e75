use std::collections::BTreeMap;
use std::sync::Arc;
use ash::vk;
use crate::renderer::contexts::device_ctx::{GpuDevice, RenderDeviceContext};
use crate::renderer::contexts::pipeline_ctx::reflection::{ShaderBinding, ShaderReflection};
use crate::renderer::contexts::resource_ctx::descriptor_set_layout_builder::DescriptorSetLayoutBuilder;
use crate::renderer::contexts::resource_ctx::resource_type::PoolSizingTable;
use crate::renderer::error::{PipelineError, Result};

// No driver exposes more bound descriptor sets than this
pub const MAX_DESCRIPTOR_SETS: u32 = 64;

/// Merged bindings of every stage, indexed by set number.
#[derive(Debug, Clone)]
pub struct SetLayoutDescription {
    /// Index is the set number. Sets nobody references are present and empty.
    pub sets: Vec<Vec<ShaderBinding>>,
    pub pool_sizing: PoolSizingTable,
}

impl SetLayoutDescription {
    pub fn set_count(&self) -> usize {
        self.sets.len()
    }

    pub fn binding_count(&self) -> usize {
        self.sets.iter().map(Vec::len).sum()
    }
}

/// Accumulates per-stage reflections into one pipeline's binding layout.
#[derive(Debug, Default)]
pub struct SetLayoutAggregator {
    // set -> slot -> binding
    sets: BTreeMap<u32, BTreeMap<u32, ShaderBinding>>,
    push_constant_ranges: Vec<vk::PushConstantRange>,
    stages: vk::ShaderStageFlags,
    stage_count: usize,
}

impl SetLayoutAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges one stage. A (set, slot) seen before becomes one binding visible
    /// to both stages; it must agree on type and count. A rejected stage leaves
    /// the aggregator as it was.
    pub fn add(&mut self, reflection: &ShaderReflection) -> Result<()> {
        for binding in &reflection.bindings {
            if binding.set >= MAX_DESCRIPTOR_SETS {
                return Err(PipelineError::DescriptorSetLimitExceeded {
                    set: binding.set,
                    limit: MAX_DESCRIPTOR_SETS,
                });
            }

            let existing = self
                .sets
                .get(&binding.set)
                .and_then(|slots| slots.get(&binding.slot));
            if let Some(existing) = existing {
                if existing.resource_type != binding.resource_type
                    || existing.count != binding.count
                {
                    return Err(PipelineError::ConflictingBinding {
                        set: binding.set,
                        slot: binding.slot,
                    });
                }
            }
        }

        for binding in &reflection.bindings {
            self.sets
                .entry(binding.set)
                .or_default()
                .entry(binding.slot)
                .and_modify(|existing| existing.stage_flags |= binding.stage_flags)
                .or_insert(*binding);
        }

        self.stages |= reflection.stage;
        self.stage_count += 1;
        Ok(())
    }

    pub fn add_push_constant_range(&mut self, range: vk::PushConstantRange) {
        self.push_constant_ranges.push(range);
    }

    pub fn stages(&self) -> vk::ShaderStageFlags {
        self.stages
    }

    /// The device-free result of aggregation.
    pub fn describe(&self) -> Result<SetLayoutDescription> {
        if self.stage_count == 0 {
            return Err(PipelineError::EmptyShaderSet);
        }

        let set_count = self
            .sets
            .keys()
            .next_back()
            .map_or(0, |&max_set| max_set as usize + 1);

        let mut sets = vec![Vec::new(); set_count];
        let mut pool_sizing = PoolSizingTable::new();
        for (&set, slots) in &self.sets {
            for binding in slots.values() {
                pool_sizing.add(binding.resource_type, binding.count)?;
                sets[set as usize].push(*binding);
            }
        }

        Ok(SetLayoutDescription { sets, pool_sizing })
    }

    /// Creates one descriptor set layout per set and the pipeline layout.
    pub fn finalize(&self, dev_ctx: &RenderDeviceContext) -> Result<PipelineLayouts> {
        let description = self.describe()?;
        let device = dev_ctx.device.clone();

        // Anything created before a failure is released when this drops.
        let mut layouts = PipelineLayouts {
            set_layouts: Vec::with_capacity(description.set_count()),
            pipeline_layout: vk::PipelineLayout::null(),
            description,
            device,
        };

        for set in &layouts.description.sets {
            let layout = set
                .iter()
                .fold(DescriptorSetLayoutBuilder::new(), |builder, binding| {
                    builder.add_shader_binding(binding)
                })
                .build(
                    vk::DescriptorSetLayoutCreateFlags::empty(),
                    layouts.device.as_ref(),
                )?;
            layouts.set_layouts.push(layout);
        }

        let pipeline_layout_info = vk::PipelineLayoutCreateInfo::default()
            .set_layouts(&layouts.set_layouts)
            .push_constant_ranges(&self.push_constant_ranges);
        layouts.pipeline_layout = layouts
            .device
            .create_pipeline_layout(&pipeline_layout_info)?;

        log::info!(
            "Created pipeline layout with {} descriptor sets ({} bindings) and {} push constant ranges",
            layouts.set_layouts.len(),
            layouts.description.binding_count(),
            self.push_constant_ranges.len(),
        );

        Ok(layouts)
    }
}

/// Device objects produced by [`SetLayoutAggregator::finalize`].
///
/// Owns the set layouts and the pipeline layout and destroys them on drop.
pub struct PipelineLayouts {
    set_layouts: Vec<vk::DescriptorSetLayout>,
    pipeline_layout: vk::PipelineLayout,
    description: SetLayoutDescription,
    device: Arc<dyn GpuDevice>,
}

impl PipelineLayouts {
    pub fn set_layouts(&self) -> &[vk::DescriptorSetLayout] {
        &self.set_layouts
    }

    pub fn pipeline_layout(&self) -> vk::PipelineLayout {
        self.pipeline_layout
    }

    pub fn pool_sizing(&self) -> &PoolSizingTable {
        &self.description.pool_sizing
    }

    pub fn description(&self) -> &SetLayoutDescription {
        &self.description
    }
}

impl Drop for PipelineLayouts {
    fn drop(&mut self) {
        if self.pipeline_layout != vk::PipelineLayout::null() {
            self.device.destroy_pipeline_layout(self.pipeline_layout);
        }
        for layout in self.set_layouts.drain(..) {
            self.device.destroy_descriptor_set_layout(layout);
        }
    }
}
