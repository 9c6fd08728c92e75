use std::sync::Arc;
use ash::vk;
use crate::renderer::contexts::device_ctx::GpuDevice;
use crate::renderer::contexts::pipeline_ctx::reflection::{self, ShaderReflection};
use crate::renderer::error::{PipelineError, Result};

/// SPIR-V bytes for one stage, validated and reflected up front.
#[derive(Debug, Clone)]
pub struct ShaderSource {
    words: Vec<u32>,
    reflection: ShaderReflection,
}

impl ShaderSource {
    pub fn new(code: &[u8]) -> Result<Self> {
        let reflection = reflection::reflect(code)?;
        Ok(Self {
            words: code_to_words(code),
            reflection,
        })
    }

    pub fn stage(&self) -> vk::ShaderStageFlags {
        self.reflection.stage
    }

    pub fn reflection(&self) -> &ShaderReflection {
        &self.reflection
    }

    pub fn reflection_mut(&mut self) -> &mut ShaderReflection {
        &mut self.reflection
    }

    pub fn words(&self) -> &[u32] {
        &self.words
    }
}

/// A live `vk::ShaderModule`, destroyed on drop.
pub struct ShaderModule {
    pub module: vk::ShaderModule,
    pub stage: vk::ShaderStageFlags,
    device: Arc<dyn GpuDevice>,
}

impl ShaderModule {
    pub fn new(source: &ShaderSource, device: Arc<dyn GpuDevice>) -> Result<Self> {
        let shader_module_info = vk::ShaderModuleCreateInfo::default()
            .code(source.words());

        let module = device.create_shader_module(&shader_module_info)?;
        log::debug!("Created {:?} shader module {:?}", source.stage(), module);

        Ok(Self {
            module,
            stage: source.stage(),
            device,
        })
    }
}

impl Drop for ShaderModule {
    fn drop(&mut self) {
        self.device.destroy_shader_module(self.module);
    }
}

// Byte buffers from disk carry no alignment guarantee, so copy instead of casting.
fn code_to_words(code: &[u8]) -> Vec<u32> {
    code.chunks_exact(4)
        .map(|word| u32::from_le_bytes([word[0], word[1], word[2], word[3]]))
        .collect()
}

/// Validates the entry point name a pipeline stage will reference.
pub fn entry_point_name(name: &str) -> Result<std::ffi::CString> {
    std::ffi::CString::new(name).map_err(|_| PipelineError::InvalidEntryPoint(name.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::test_support::mock_context;
    use crate::renderer::test_support::shaders;

    #[test]
    fn words_preserve_little_endian_order() {
        let code = shaders::fragment(shaders::FRAGMENT_TEXTURED);
        let source = ShaderSource::new(&code).unwrap();
        assert_eq!(source.words()[0], 0x0723_0203);
        assert_eq!(source.words().len(), code.len() / 4);
        assert_eq!(source.stage(), vk::ShaderStageFlags::FRAGMENT);
    }

    #[test]
    fn garbage_is_rejected_before_any_module_exists() {
        assert!(matches!(
            ShaderSource::new(&[0xde, 0xad, 0xbe, 0xef]),
            Err(PipelineError::MalformedShaderBinary(_)),
        ));
    }

    #[test]
    fn module_is_destroyed_on_drop() {
        let (mock, dev_ctx) = mock_context();
        let source = ShaderSource::new(&shaders::vertex(shaders::VERTEX_BARE)).unwrap();

        let module = ShaderModule::new(&source, dev_ctx.device.clone()).unwrap();
        assert_eq!(module.stage, vk::ShaderStageFlags::VERTEX);
        assert_eq!(mock.live_shader_modules(), 1);

        drop(module);
        assert_eq!(mock.live_shader_modules(), 0);
    }

    #[test]
    fn entry_point_with_interior_nul_is_rejected() {
        assert_eq!(entry_point_name("main").unwrap().as_bytes(), b"main");
        assert!(matches!(
            entry_point_name("ma\0in"),
            Err(PipelineError::InvalidEntryPoint(_)),
        ));
    }
}
