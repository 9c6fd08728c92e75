use ash::vk;
use gpu_descriptor::DescriptorTotalCount;
use spirv_reflect::types::ReflectDescriptorType;
use crate::renderer::error::{PipelineError, Result};

/// Every kind of shader-visible resource a binding can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceType {
    Sampler,
    CombinedImageSampler,
    SampledImage,
    StorageImage,
    UniformTexelBuffer,
    StorageTexelBuffer,
    UniformBuffer,
    StorageBuffer,
    UniformBufferDynamic,
    StorageBufferDynamic,
    InputAttachment,
    AccelerationStructure,
}

impl ResourceType {
    pub const ALL: &'static [Self] = &[
        Self::Sampler,
        Self::CombinedImageSampler,
        Self::SampledImage,
        Self::StorageImage,
        Self::UniformTexelBuffer,
        Self::StorageTexelBuffer,
        Self::UniformBuffer,
        Self::StorageBuffer,
        Self::UniformBufferDynamic,
        Self::StorageBufferDynamic,
        Self::InputAttachment,
        Self::AccelerationStructure,
    ];

    pub fn descriptor_type(&self) -> vk::DescriptorType {
        match self {
            Self::Sampler => vk::DescriptorType::SAMPLER,
            Self::CombinedImageSampler => vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
            Self::SampledImage => vk::DescriptorType::SAMPLED_IMAGE,
            Self::StorageImage => vk::DescriptorType::STORAGE_IMAGE,
            Self::UniformTexelBuffer => vk::DescriptorType::UNIFORM_TEXEL_BUFFER,
            Self::StorageTexelBuffer => vk::DescriptorType::STORAGE_TEXEL_BUFFER,
            Self::UniformBuffer => vk::DescriptorType::UNIFORM_BUFFER,
            Self::StorageBuffer => vk::DescriptorType::STORAGE_BUFFER,
            Self::UniformBufferDynamic => vk::DescriptorType::UNIFORM_BUFFER_DYNAMIC,
            Self::StorageBufferDynamic => vk::DescriptorType::STORAGE_BUFFER_DYNAMIC,
            Self::InputAttachment => vk::DescriptorType::INPUT_ATTACHMENT,
            Self::AccelerationStructure => vk::DescriptorType::ACCELERATION_STRUCTURE_KHR,
        }
    }

    /// Maps a reflected descriptor type, `None` when the kind is not modeled.
    pub fn from_reflected(ty: &ReflectDescriptorType) -> Option<Self> {
        match ty {
            ReflectDescriptorType::Sampler => Some(Self::Sampler),
            ReflectDescriptorType::CombinedImageSampler => Some(Self::CombinedImageSampler),
            ReflectDescriptorType::SampledImage => Some(Self::SampledImage),
            ReflectDescriptorType::StorageImage => Some(Self::StorageImage),
            ReflectDescriptorType::UniformTexelBuffer => Some(Self::UniformTexelBuffer),
            ReflectDescriptorType::StorageTexelBuffer => Some(Self::StorageTexelBuffer),
            ReflectDescriptorType::UniformBuffer => Some(Self::UniformBuffer),
            ReflectDescriptorType::StorageBuffer => Some(Self::StorageBuffer),
            ReflectDescriptorType::UniformBufferDynamic => Some(Self::UniformBufferDynamic),
            ReflectDescriptorType::StorageBufferDynamic => Some(Self::StorageBufferDynamic),
            ReflectDescriptorType::InputAttachment => Some(Self::InputAttachment),
            ReflectDescriptorType::AccelerationStructureNV => Some(Self::AccelerationStructure),
            ReflectDescriptorType::Undefined => None,
        }
    }

    /// The dynamic-offset variant of a buffer type, if it has one.
    pub fn dynamic_variant(&self) -> Option<Self> {
        match self {
            Self::UniformBuffer | Self::UniformBufferDynamic => Some(Self::UniformBufferDynamic),
            Self::StorageBuffer | Self::StorageBufferDynamic => Some(Self::StorageBufferDynamic),
            _ => None,
        }
    }

    /// Needs one dynamic offset per descriptor when its set is bound.
    pub fn is_dynamic(&self) -> bool {
        matches!(self, Self::UniformBufferDynamic | Self::StorageBufferDynamic)
    }

    /// Written through `vk::DescriptorBufferInfo`.
    pub fn is_buffer(&self) -> bool {
        matches!(
            self,
            Self::UniformBuffer
                | Self::StorageBuffer
                | Self::UniformBufferDynamic
                | Self::StorageBufferDynamic
        )
    }

    /// Written through `vk::DescriptorImageInfo`.
    pub fn is_image(&self) -> bool {
        matches!(
            self,
            Self::Sampler
                | Self::CombinedImageSampler
                | Self::SampledImage
                | Self::StorageImage
                | Self::InputAttachment
        )
    }
}

/// Per-resource-type descriptor totals used to size descriptor pools.
///
/// Frame and primitive agnostic: callers scale it by how many copies of the
/// layout they intend to allocate.
#[derive(Clone, Copy, Debug)]
pub struct PoolSizingTable(DescriptorTotalCount);

impl PoolSizingTable {
    pub fn new() -> Self {
        Self(DescriptorTotalCount {
            sampler: 0,
            combined_image_sampler: 0,
            sampled_image: 0,
            storage_image: 0,
            uniform_texel_buffer: 0,
            storage_texel_buffer: 0,
            uniform_buffer: 0,
            storage_buffer: 0,
            uniform_buffer_dynamic: 0,
            storage_buffer_dynamic: 0,
            input_attachment: 0,
            acceleration_structure: 0,
            inline_uniform_block_bytes: 0,
            inline_uniform_block_bindings: 0,
        })
    }

    pub fn get(&self, ty: ResourceType) -> u32 {
        let total = &self.0;
        match ty {
            ResourceType::Sampler => total.sampler,
            ResourceType::CombinedImageSampler => total.combined_image_sampler,
            ResourceType::SampledImage => total.sampled_image,
            ResourceType::StorageImage => total.storage_image,
            ResourceType::UniformTexelBuffer => total.uniform_texel_buffer,
            ResourceType::StorageTexelBuffer => total.storage_texel_buffer,
            ResourceType::UniformBuffer => total.uniform_buffer,
            ResourceType::StorageBuffer => total.storage_buffer,
            ResourceType::UniformBufferDynamic => total.uniform_buffer_dynamic,
            ResourceType::StorageBufferDynamic => total.storage_buffer_dynamic,
            ResourceType::InputAttachment => total.input_attachment,
            ResourceType::AccelerationStructure => total.acceleration_structure,
        }
    }

    pub fn add(&mut self, ty: ResourceType, count: u32) -> Result<()> {
        let total = &mut self.0;
        let slot = match ty {
            ResourceType::Sampler => &mut total.sampler,
            ResourceType::CombinedImageSampler => &mut total.combined_image_sampler,
            ResourceType::SampledImage => &mut total.sampled_image,
            ResourceType::StorageImage => &mut total.storage_image,
            ResourceType::UniformTexelBuffer => &mut total.uniform_texel_buffer,
            ResourceType::StorageTexelBuffer => &mut total.storage_texel_buffer,
            ResourceType::UniformBuffer => &mut total.uniform_buffer,
            ResourceType::StorageBuffer => &mut total.storage_buffer,
            ResourceType::UniformBufferDynamic => &mut total.uniform_buffer_dynamic,
            ResourceType::StorageBufferDynamic => &mut total.storage_buffer_dynamic,
            ResourceType::InputAttachment => &mut total.input_attachment,
            ResourceType::AccelerationStructure => &mut total.acceleration_structure,
        };
        *slot = slot
            .checked_add(count)
            .ok_or(PipelineError::DescriptorCountOverflow)?;
        Ok(())
    }

    /// Every entry multiplied by `factor`.
    pub fn scaled(&self, factor: u32) -> Result<Self> {
        let mut scaled = Self::new();
        for &ty in ResourceType::ALL {
            let count = self
                .get(ty)
                .checked_mul(factor)
                .ok_or(PipelineError::DescriptorCountOverflow)?;
            scaled.add(ty, count)?;
        }
        Ok(scaled)
    }

    pub fn is_empty(&self) -> bool {
        ResourceType::ALL.iter().all(|&ty| self.get(ty) == 0)
    }

    /// Non-zero entries as pool sizes, in `ResourceType::ALL` order.
    pub fn pool_sizes(&self) -> Vec<vk::DescriptorPoolSize> {
        ResourceType::ALL
            .iter()
            .filter(|&&ty| self.get(ty) > 0)
            .map(|&ty| {
                vk::DescriptorPoolSize::default()
                    .ty(ty.descriptor_type())
                    .descriptor_count(self.get(ty))
            })
            .collect()
    }
}

impl Default for PoolSizingTable {
    fn default() -> Self {
        Self::new()
    }
}
