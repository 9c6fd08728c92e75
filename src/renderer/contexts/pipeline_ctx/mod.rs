pub mod builder;
pub mod layout;
pub mod pipeline;
pub mod reflection;

use std::collections::HashMap;
use crate::renderer::config::RenderConfig;
use crate::renderer::contexts::device_ctx::RenderDeviceContext;
use crate::renderer::contexts::pipeline_ctx::builder::GraphicsPipelineBuilder;
use crate::renderer::contexts::pipeline_ctx::pipeline::Pipeline;
use crate::renderer::error::Result;

/// Responsibilities:
/// - Build graphics pipelines from shader binaries
/// - Own named pipelines until they are removed or invalidated
/// - Drop every pipeline when the render pass is recreated
pub struct RenderPipelineContext {
    dev_ctx: RenderDeviceContext,
    config: RenderConfig,
    pipelines: HashMap<String, Pipeline>,
}

impl RenderPipelineContext {
    pub fn new(dev_ctx: &RenderDeviceContext, config: &RenderConfig) -> Self {
        Self {
            dev_ctx: dev_ctx.clone(),
            config: config.clone(),
            pipelines: HashMap::new(),
        }
    }

    /// A fresh builder bound to this context's device and entry point.
    pub fn builder(&self) -> GraphicsPipelineBuilder {
        GraphicsPipelineBuilder::new(&self.dev_ctx, &self.config)
    }

    /// Builds a pipeline and stores it under `name`, replacing any previous one.
    ///
    /// A failure leaves every other stored pipeline untouched.
    pub fn build(&mut self, name: &str, mut builder: GraphicsPipelineBuilder) -> Result<&Pipeline> {
        let pipeline = builder.build().inspect_err(|err| {
            log::error!("Failed to build pipeline '{}': {}", name, err);
        })?;

        // Replacing drops the old pipeline first
        let _ = self.pipelines.remove(name);
        Ok(self.pipelines.entry(name.to_owned()).or_insert(pipeline))
    }

    pub fn get(&self, name: &str) -> Option<&Pipeline> {
        self.pipelines.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Pipeline> {
        self.pipelines.remove(name)
    }

    pub fn len(&self) -> usize {
        self.pipelines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pipelines.is_empty()
    }

    /// Destroys every pipeline. Call after the render pass they target is recreated.
    pub fn invalidate(&mut self) {
        log::info!("Invalidating {} pipelines", self.pipelines.len());
        self.pipelines.clear();
    }
}
