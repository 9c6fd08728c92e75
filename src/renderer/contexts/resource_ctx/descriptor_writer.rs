use ash::vk;
use smallvec::SmallVec;
use crate::renderer::contexts::device_ctx::GpuDevice;
use crate::renderer::contexts::resource_ctx::resource_type::ResourceType;
use crate::renderer::error::{PipelineError, Result};

enum PendingInfo {
    Buffers(SmallVec<[vk::DescriptorBufferInfo; 1]>),
    Images(SmallVec<[vk::DescriptorImageInfo; 1]>),
}

struct PendingWrite {
    set: vk::DescriptorSet,
    slot: u32,
    array_element: u32,
    ty: ResourceType,
    info: PendingInfo,
}

/// Batches descriptor updates for the sets of one primitive.
///
/// Nothing reaches the device until [`DescriptorWriter::write`]. Texel buffers
/// and acceleration structures cannot be written through this type. Empty
/// arrays are dropped rather than queued with a zero descriptor count.
pub struct DescriptorWriter<'a> {
    sets: &'a [vk::DescriptorSet],
    device: &'a dyn GpuDevice,
    pending: SmallVec<[PendingWrite; 8]>,
}

impl<'a> DescriptorWriter<'a> {
    pub(crate) fn new(sets: &'a [vk::DescriptorSet], device: &'a dyn GpuDevice) -> Self {
        Self {
            sets,
            device,
            pending: SmallVec::new(),
        }
    }

    /// The sets this writer may touch, indexed by set number.
    pub fn sets(&self) -> &[vk::DescriptorSet] {
        self.sets
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn write_buffer(
        &mut self,
        set: usize,
        slot: u32,
        info: vk::DescriptorBufferInfo,
        ty: ResourceType,
    ) -> Result<&mut Self> {
        self.write_buffers(set, slot, 0, &[info], ty)
    }

    pub fn write_buffers(
        &mut self,
        set: usize,
        slot: u32,
        first_element: u32,
        infos: &[vk::DescriptorBufferInfo],
        ty: ResourceType,
    ) -> Result<&mut Self> {
        if !ty.is_buffer() {
            return Err(PipelineError::InvalidWriteType { ty, expected: "buffer" });
        }
        let set = self.resolve(set)?;
        if infos.is_empty() {
            log::debug!("Skipping empty buffer write to slot {}", slot);
            return Ok(self);
        }
        self.pending.push(PendingWrite {
            set,
            slot,
            array_element: first_element,
            ty,
            info: PendingInfo::Buffers(SmallVec::from_slice(infos)),
        });
        Ok(self)
    }

    pub fn write_image(
        &mut self,
        set: usize,
        slot: u32,
        info: vk::DescriptorImageInfo,
        ty: ResourceType,
    ) -> Result<&mut Self> {
        self.write_images(set, slot, 0, &[info], ty)
    }

    pub fn write_images(
        &mut self,
        set: usize,
        slot: u32,
        first_element: u32,
        infos: &[vk::DescriptorImageInfo],
        ty: ResourceType,
    ) -> Result<&mut Self> {
        if !ty.is_image() {
            return Err(PipelineError::InvalidWriteType { ty, expected: "image" });
        }
        let set = self.resolve(set)?;
        if infos.is_empty() {
            log::debug!("Skipping empty image write to slot {}", slot);
            return Ok(self);
        }
        self.pending.push(PendingWrite {
            set,
            slot,
            array_element: first_element,
            ty,
            info: PendingInfo::Images(SmallVec::from_slice(infos)),
        });
        Ok(self)
    }

    /// Flushes every pending update in one device call.
    pub fn write(&mut self) {
        if self.pending.is_empty() {
            return;
        }

        let writes = self
            .pending
            .iter()
            .map(|pending| {
                let write = vk::WriteDescriptorSet::default()
                    .dst_set(pending.set)
                    .dst_binding(pending.slot)
                    .dst_array_element(pending.array_element)
                    .descriptor_type(pending.ty.descriptor_type());
                match &pending.info {
                    PendingInfo::Buffers(infos) => write.buffer_info(infos),
                    PendingInfo::Images(infos) => write.image_info(infos),
                }
            })
            .collect::<SmallVec<[_; 8]>>();

        log::trace!("Flushing {} descriptor writes", writes.len());
        self.device.update_descriptor_sets(&writes);
        drop(writes);

        self.pending.clear();
    }

    fn resolve(&self, set: usize) -> Result<vk::DescriptorSet> {
        self.sets
            .get(set)
            .copied()
            .ok_or(PipelineError::SetIndexOutOfRange {
                set,
                sets_per_primitive: self.sets.len(),
            })
    }
}
