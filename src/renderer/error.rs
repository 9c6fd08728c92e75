use ash::vk;
use thiserror::Error;
use crate::renderer::contexts::resource_ctx::resource_type::ResourceType;

pub type Result<T> = std::result::Result<T, PipelineError>;

/// Every failure the pipeline and descriptor core can report.
///
/// All of these are configuration or programmer errors. Nothing here is
/// retried internally.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error("malformed shader binary: {0}")]
    MalformedShaderBinary(String),

    #[error("binding (set {set}, slot {slot}) uses an unsupported resource type: {kind}")]
    UnsupportedBindingType { set: u32, slot: u32, kind: String },

    #[error("no shader stages were added before finalizing the set layouts")]
    EmptyShaderSet,

    #[error("binding (set {set}, slot {slot}) is declared with conflicting types or counts")]
    ConflictingBinding { set: u32, slot: u32 },

    #[error("set {set} exceeds the descriptor set limit of {limit}")]
    DescriptorSetLimitExceeded { set: u32, limit: u32 },

    #[error("no shader stages bound to the pipeline builder")]
    NoShaderStagesBound,

    #[error("no render pass bound to the pipeline builder")]
    NoRenderPassBound,

    #[error("pipeline builder was already used to build a pipeline")]
    AlreadyBuilt,

    #[error("shader entry point name is not a valid C string: {0:?}")]
    InvalidEntryPoint(String),

    #[error("{stage:?} is not a graphics pipeline stage")]
    InvalidShaderStage { stage: vk::ShaderStageFlags },

    #[error("{stage:?} stage is bound more than once")]
    DuplicateShaderStage { stage: vk::ShaderStageFlags },

    #[error("{actual} dynamic offsets given, the bound sets need {expected}")]
    DynamicOffsetCountMismatch { expected: usize, actual: usize },

    #[error("descriptor pool for frame {frame} is exhausted")]
    DescriptorPoolExhausted { frame: usize },

    #[error("descriptor counts do not fit in a u32")]
    DescriptorCountOverflow,

    #[error("frame {frame} is out of range (frame count {frame_count})")]
    FrameOutOfRange { frame: usize, frame_count: usize },

    #[error("primitive {primitive} is out of range (primitive count {primitive_count})")]
    PrimitiveOutOfRange { primitive: usize, primitive_count: usize },

    #[error("set {set} is out of range ({sets_per_primitive} sets per primitive)")]
    SetIndexOutOfRange { set: usize, sets_per_primitive: usize },

    #[error("{ty:?} cannot be written as a {expected} descriptor")]
    InvalidWriteType { ty: ResourceType, expected: &'static str },

    #[error("vulkan call failed: {0}")]
    Vulkan(#[from] vk::Result),
}
