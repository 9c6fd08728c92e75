pub mod renderer;

pub use renderer::config::RenderConfig;
pub use renderer::contexts::device_ctx::{GpuDevice, RenderDeviceContext};
pub use renderer::contexts::frame_ctx::RenderFrameContext;
pub use renderer::contexts::pipeline_ctx::RenderPipelineContext;
pub use renderer::contexts::pipeline_ctx::builder::GraphicsPipelineBuilder;
pub use renderer::contexts::pipeline_ctx::layout::{SetLayoutAggregator, SetLayoutDescription};
pub use renderer::contexts::pipeline_ctx::pipeline::Pipeline;
pub use renderer::contexts::pipeline_ctx::reflection::{reflect, ShaderBinding, ShaderReflection};
pub use renderer::contexts::resource_ctx::descriptor_arena::DescriptorArena;
pub use renderer::contexts::resource_ctx::descriptor_writer::DescriptorWriter;
pub use renderer::contexts::resource_ctx::resource_type::{PoolSizingTable, ResourceType};
pub use renderer::error::{PipelineError, Result};
