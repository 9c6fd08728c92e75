use std::slice;
use ash::vk;
use crate::renderer::config::RenderConfig;
use crate::renderer::contexts::device_ctx::RenderDeviceContext;
use crate::renderer::contexts::pipeline_ctx::layout::SetLayoutAggregator;
use crate::renderer::contexts::pipeline_ctx::pipeline::Pipeline;
use crate::renderer::error::{PipelineError, Result};
use crate::renderer::resources::shader::{self, ShaderModule, ShaderSource};
use crate::renderer::resources::vertex::{VertexInputDescription, VertexLayout};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuilderState {
    Empty,
    Configuring,
    Built,
}

struct ShaderStage {
    code: Vec<u8>,
    entry_point: String,
}

/// Accumulates graphics pipeline state and builds exactly one [`Pipeline`].
///
/// Every state block left unbound falls back to the `default_*_info` below.
/// The pipeline layout is derived from the bound shaders, never supplied.
pub struct GraphicsPipelineBuilder {
    dev_ctx: RenderDeviceContext,
    default_entry_point: String,
    state: BuilderState,

    shader_stages: Vec<ShaderStage>,
    vertex_input: Option<VertexInputDescription>,
    input_assembly: Option<vk::PipelineInputAssemblyStateCreateInfo<'static>>,
    viewport: Option<(vk::Viewport, vk::Rect2D)>,
    rasterization: Option<vk::PipelineRasterizationStateCreateInfo<'static>>,
    multisample: Option<vk::PipelineMultisampleStateCreateInfo<'static>>,
    depth_stencil: Option<vk::PipelineDepthStencilStateCreateInfo<'static>>,
    color_blend_attachments: Vec<vk::PipelineColorBlendAttachmentState>,
    dynamic_states: Vec<vk::DynamicState>,
    render_pass: Option<(vk::RenderPass, u32)>,
    push_constant_ranges: Vec<vk::PushConstantRange>,
    dynamic_bindings: Vec<(u32, u32)>,
}

impl GraphicsPipelineBuilder {
    pub fn new(dev_ctx: &RenderDeviceContext, config: &RenderConfig) -> Self {
        Self {
            dev_ctx: dev_ctx.clone(),
            default_entry_point: config.shader_entry_point.clone(),
            state: BuilderState::Empty,

            shader_stages: Vec::new(),
            vertex_input: None,
            input_assembly: None,
            viewport: None,
            rasterization: None,
            multisample: None,
            depth_stencil: None,
            color_blend_attachments: Vec::new(),
            dynamic_states: Vec::new(),
            render_pass: None,
            push_constant_ranges: Vec::new(),
            dynamic_bindings: Vec::new(),
        }
    }

    pub fn state(&self) -> BuilderState {
        self.state
    }

    fn configure(&mut self) {
        if self.state == BuilderState::Empty {
            self.state = BuilderState::Configuring;
        }
    }

    fn rasterization_mut(&mut self) -> &mut vk::PipelineRasterizationStateCreateInfo<'static> {
        self.configure();
        self.rasterization
            .get_or_insert_with(Self::default_rasterization_info)
    }

    fn multisample_mut(&mut self) -> &mut vk::PipelineMultisampleStateCreateInfo<'static> {
        self.configure();
        self.multisample.get_or_insert_with(Self::default_multisample_info)
    }

    fn depth_stencil_mut(&mut self) -> &mut vk::PipelineDepthStencilStateCreateInfo<'static> {
        self.configure();
        self.depth_stencil
            .get_or_insert_with(Self::default_depth_stencil_info)
    }

    /// Adds a stage using the configured default entry point.
    pub fn with_shader_stage(self, code: &[u8]) -> Self {
        let entry_point = self.default_entry_point.clone();
        self.with_shader_stage_entry(code, &entry_point)
    }

    pub fn with_shader_stage_entry(mut self, code: &[u8], entry_point: &str) -> Self {
        self.configure();
        self.shader_stages.push(ShaderStage {
            code: code.to_vec(),
            entry_point: entry_point.to_owned(),
        });
        self
    }

    pub fn with_vertex_layout<V: VertexLayout>(self) -> Self {
        self.with_vertex_input(V::input_description())
    }

    pub fn with_vertex_input(mut self, description: VertexInputDescription) -> Self {
        self.configure();
        let _ = self.vertex_input.replace(description);
        self
    }

    pub fn with_input_topology(
        mut self,
        topology: vk::PrimitiveTopology,
        primitive_restart: bool,
    ) -> Self {
        self.configure();
        let _ = self.input_assembly.replace(
            Self::default_input_assembly_info()
                .topology(topology)
                .primitive_restart_enable(primitive_restart),
        );
        self
    }

    /// Bakes a static viewport and scissor into the pipeline.
    pub fn with_viewport(mut self, viewport: vk::Viewport, scissor: vk::Rect2D) -> Self {
        self.configure();
        let _ = self.viewport.replace((viewport, scissor));
        self
    }

    pub fn with_polygon_mode(mut self, mode: vk::PolygonMode) -> Self {
        self.rasterization_mut().polygon_mode = mode;
        self
    }

    pub fn with_cull_mode(
        mut self,
        cull_mode: vk::CullModeFlags,
        front_face: vk::FrontFace,
    ) -> Self {
        let rasterization = self.rasterization_mut();
        rasterization.cull_mode = cull_mode;
        rasterization.front_face = front_face;
        self
    }

    pub fn with_depth_bias(mut self, constant: f32, clamp: f32, slope: f32) -> Self {
        let rasterization = self.rasterization_mut();
        rasterization.depth_bias_enable = vk::TRUE;
        rasterization.depth_bias_constant_factor = constant;
        rasterization.depth_bias_clamp = clamp;
        rasterization.depth_bias_slope_factor = slope;
        self
    }

    pub fn with_line_width(mut self, width: f32) -> Self {
        self.rasterization_mut().line_width = width;
        self
    }

    /// `min_sample_shading` enables per-sample shading when given.
    pub fn with_multisampling(
        mut self,
        samples: vk::SampleCountFlags,
        min_sample_shading: Option<f32>,
    ) -> Self {
        let multisample = self.multisample_mut();
        multisample.rasterization_samples = samples;
        match min_sample_shading {
            Some(min) => {
                multisample.sample_shading_enable = vk::TRUE;
                multisample.min_sample_shading = min;
            }
            None => {
                multisample.sample_shading_enable = vk::FALSE;
                multisample.min_sample_shading = 1.0;
            }
        }
        self
    }

    /// `None` disables the depth test.
    pub fn with_depth_test(mut self, compare: Option<vk::CompareOp>) -> Self {
        let depth_stencil = self.depth_stencil_mut();
        match compare {
            Some(compare) => {
                depth_stencil.depth_test_enable = vk::TRUE;
                depth_stencil.depth_compare_op = compare;
            }
            None => {
                depth_stencil.depth_test_enable = vk::FALSE;
                depth_stencil.depth_compare_op = vk::CompareOp::ALWAYS;
            }
        }
        self
    }

    pub fn with_depth_write(mut self, enable: bool) -> Self {
        self.depth_stencil_mut().depth_write_enable = enable.into();
        self
    }

    pub fn with_stencil_test(
        mut self,
        front: vk::StencilOpState,
        back: vk::StencilOpState,
    ) -> Self {
        let depth_stencil = self.depth_stencil_mut();
        depth_stencil.stencil_test_enable = vk::TRUE;
        depth_stencil.front = front;
        depth_stencil.back = back;
        self
    }

    /// Appends one color attachment's blend state.
    pub fn with_color_blend_attachment(
        mut self,
        attachment: vk::PipelineColorBlendAttachmentState,
    ) -> Self {
        self.configure();
        self.color_blend_attachments.push(attachment);
        self
    }

    pub fn with_blending_disabled(self) -> Self {
        self.with_color_blend_attachment(
            vk::PipelineColorBlendAttachmentState::default()
                .color_write_mask(vk::ColorComponentFlags::RGBA)
                .blend_enable(false),
        )
    }

    // Make sure the transparent object is rendered AFTER the opaque ones
    pub fn with_alpha_blending_enabled(self) -> Self {
        self.with_color_blend_attachment(
            vk::PipelineColorBlendAttachmentState::default()
                .color_write_mask(vk::ColorComponentFlags::RGBA)
                .blend_enable(true)
                .src_color_blend_factor(vk::BlendFactor::SRC_ALPHA)
                .dst_color_blend_factor(vk::BlendFactor::ONE_MINUS_SRC_ALPHA)
                .color_blend_op(vk::BlendOp::ADD)
                .src_alpha_blend_factor(vk::BlendFactor::ONE)
                .dst_alpha_blend_factor(vk::BlendFactor::ZERO)
                .alpha_blend_op(vk::BlendOp::ADD),
        )
    }

    pub fn with_additive_blending_enabled(self) -> Self {
        self.with_color_blend_attachment(
            vk::PipelineColorBlendAttachmentState::default()
                .color_write_mask(vk::ColorComponentFlags::RGBA)
                .blend_enable(true)
                .src_color_blend_factor(vk::BlendFactor::ONE)
                .dst_color_blend_factor(vk::BlendFactor::DST_ALPHA)
                .color_blend_op(vk::BlendOp::ADD)
                .src_alpha_blend_factor(vk::BlendFactor::ONE)
                .dst_alpha_blend_factor(vk::BlendFactor::ZERO)
                .alpha_blend_op(vk::BlendOp::ADD),
        )
    }

    pub fn with_dynamic_states(mut self, states: &[vk::DynamicState]) -> Self {
        self.configure();
        for state in states {
            if !self.dynamic_states.contains(state) {
                self.dynamic_states.push(*state);
            }
        }
        self
    }

    pub fn with_render_pass(mut self, render_pass: vk::RenderPass, subpass: u32) -> Self {
        self.configure();
        let _ = self.render_pass.replace((render_pass, subpass));
        self
    }

    pub fn with_push_constant_range(
        mut self,
        stages: vk::ShaderStageFlags,
        offset: u32,
        size: u32,
    ) -> Self {
        self.configure();
        self.push_constant_ranges.push(
            vk::PushConstantRange::default()
                .stage_flags(stages)
                .offset(offset)
                .size(size),
        );
        self
    }

    /// Binds the buffer at (set, slot) with a dynamic offset.
    pub fn with_dynamic_binding(mut self, set: u32, slot: u32) -> Self {
        self.configure();
        self.dynamic_bindings.push((set, slot));
        self
    }

    pub fn build(&mut self) -> Result<Pipeline> {
        if self.state == BuilderState::Built {
            return Err(PipelineError::AlreadyBuilt);
        }
        if self.shader_stages.is_empty() {
            return Err(PipelineError::NoShaderStagesBound);
        }
        let (render_pass, subpass) = self.render_pass.ok_or(PipelineError::NoRenderPassBound)?;

        // Everything that can fail without the device goes first
        let mut sources = Vec::with_capacity(self.shader_stages.len());
        let mut entry_points = Vec::with_capacity(self.shader_stages.len());
        let mut bound_stages = vk::ShaderStageFlags::empty();
        for stage in &self.shader_stages {
            let mut source = ShaderSource::new(&stage.code)?;
            if !vk::ShaderStageFlags::ALL_GRAPHICS.contains(source.stage()) {
                return Err(PipelineError::InvalidShaderStage {
                    stage: source.stage(),
                });
            }
            if bound_stages.intersects(source.stage()) {
                return Err(PipelineError::DuplicateShaderStage {
                    stage: source.stage(),
                });
            }
            bound_stages |= source.stage();

            for &(set, slot) in &self.dynamic_bindings {
                source.reflection_mut().promote_dynamic(set, slot);
            }
            sources.push(source);
            entry_points.push(shader::entry_point_name(&stage.entry_point)?);
        }

        let mut aggregator = SetLayoutAggregator::new();
        for source in &sources {
            aggregator.add(source.reflection())?;
        }
        for range in &self.push_constant_ranges {
            aggregator.add_push_constant_range(*range);
        }

        // Released on any early return below
        let layouts = aggregator.finalize(&self.dev_ctx)?;
        let modules = sources
            .iter()
            .map(|source| ShaderModule::new(source, self.dev_ctx.device.clone()))
            .collect::<Result<Vec<_>>>()?;

        let shader_stages = modules
            .iter()
            .zip(&entry_points)
            .map(|(module, entry_point)| {
                vk::PipelineShaderStageCreateInfo::default()
                    .stage(module.stage)
                    .module(module.module)
                    .name(entry_point.as_c_str())
            })
            .collect::<Vec<_>>();

        let vertex_input_description = self.vertex_input.clone().unwrap_or_default();
        let vertex_input = vk::PipelineVertexInputStateCreateInfo::default()
            .vertex_attribute_descriptions(&vertex_input_description.attributes)
            .vertex_binding_descriptions(&vertex_input_description.bindings)
            .flags(vertex_input_description.flags);

        let input_assembly = self
            .input_assembly
            .unwrap_or_else(Self::default_input_assembly_info);
        let rasterization = self
            .rasterization
            .unwrap_or_else(Self::default_rasterization_info);
        let multisample = self
            .multisample
            .unwrap_or_else(Self::default_multisample_info);
        let depth_stencil = self
            .depth_stencil
            .unwrap_or_else(Self::default_depth_stencil_info);

        let viewport_state = match &self.viewport {
            Some((viewport, scissor)) => vk::PipelineViewportStateCreateInfo::default()
                .viewports(slice::from_ref(viewport))
                .scissors(slice::from_ref(scissor)),
            None => {
                self.warn_missing_dynamic_viewport();
                vk::PipelineViewportStateCreateInfo {
                    viewport_count: 1,
                    scissor_count: 1,
                    ..Default::default()
                }
            }
        };

        let color_blend_info = vk::PipelineColorBlendStateCreateInfo::default()
            .logic_op_enable(false)
            .logic_op(vk::LogicOp::COPY)
            .attachments(&self.color_blend_attachments);

        let dynamic_info = vk::PipelineDynamicStateCreateInfo::default()
            .dynamic_states(&self.dynamic_states);

        let mut pipeline_info = vk::GraphicsPipelineCreateInfo::default()
            .stages(&shader_stages)
            .layout(layouts.pipeline_layout())
            .vertex_input_state(&vertex_input)
            .input_assembly_state(&input_assembly)
            .viewport_state(&viewport_state)
            .rasterization_state(&rasterization)
            .multisample_state(&multisample)
            .color_blend_state(&color_blend_info)
            .depth_stencil_state(&depth_stencil)
            .render_pass(render_pass)
            .subpass(subpass);
        if !self.dynamic_states.is_empty() {
            pipeline_info = pipeline_info.dynamic_state(&dynamic_info);
        }

        let pipeline = self
            .dev_ctx
            .device
            .create_graphics_pipeline(&pipeline_info)
            .inspect_err(|err| log::error!("Failed to create graphics pipeline: {}", err))?;

        // Modules are no longer needed once the pipeline exists
        drop(modules);

        log::info!(
            "Created graphics pipeline {:?} with {} stages and {} color attachments",
            pipeline,
            shader_stages.len(),
            self.color_blend_attachments.len(),
        );

        self.state = BuilderState::Built;
        Ok(Pipeline::new(
            pipeline,
            render_pass,
            subpass,
            layouts,
            self.dev_ctx.device.clone(),
        ))
    }

    fn warn_missing_dynamic_viewport(&self) {
        let dynamic_viewport = self.dynamic_states.contains(&vk::DynamicState::VIEWPORT);
        let dynamic_scissor = self.dynamic_states.contains(&vk::DynamicState::SCISSOR);
        if !dynamic_viewport || !dynamic_scissor {
            log::warn!(
                "Pipeline has no static viewport but VIEWPORT and SCISSOR are not both dynamic"
            );
        }
    }

    fn default_input_assembly_info() -> vk::PipelineInputAssemblyStateCreateInfo<'static> {
        vk::PipelineInputAssemblyStateCreateInfo::default()
            .topology(vk::PrimitiveTopology::TRIANGLE_LIST)
            .primitive_restart_enable(false)
    }

    fn default_rasterization_info() -> vk::PipelineRasterizationStateCreateInfo<'static> {
        vk::PipelineRasterizationStateCreateInfo::default()
            .depth_clamp_enable(false)
            // Discards all primitives before rasterization stage if true
            .rasterizer_discard_enable(false)
            .polygon_mode(vk::PolygonMode::FILL)
            .line_width(1.0)
            // Backface culling
            .cull_mode(vk::CullModeFlags::BACK)
            .front_face(vk::FrontFace::COUNTER_CLOCKWISE)
            // No depth bias
            .depth_bias_enable(false)
            .depth_bias_constant_factor(0.0)
            .depth_bias_clamp(0.0)
            .depth_bias_slope_factor(0.0)
    }

    fn default_multisample_info() -> vk::PipelineMultisampleStateCreateInfo<'static> {
        vk::PipelineMultisampleStateCreateInfo::default()
            .sample_shading_enable(false)
            // 1 sample per pixel means no multisampling
            .rasterization_samples(vk::SampleCountFlags::TYPE_1)
            .min_sample_shading(1.0)
            .alpha_to_coverage_enable(false)
            .alpha_to_one_enable(false)
    }

    fn default_depth_stencil_info() -> vk::PipelineDepthStencilStateCreateInfo<'static> {
        vk::PipelineDepthStencilStateCreateInfo::default()
            .depth_test_enable(false)
            .depth_write_enable(false)
            .depth_compare_op(vk::CompareOp::ALWAYS)
            .depth_bounds_test_enable(false)
            .min_depth_bounds(0.0)
            .max_depth_bounds(1.0)
            .stencil_test_enable(false)
    }
}
