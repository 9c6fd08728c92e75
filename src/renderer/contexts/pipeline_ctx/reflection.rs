use ash::vk;
use crate::renderer::contexts::resource_ctx::resource_type::ResourceType;
use crate::renderer::error::{PipelineError, Result};

const SPIRV_MAGIC: u32 = 0x0723_0203;
const SPIRV_HEADER_WORDS: usize = 5;
const SPIRV_MAX_MINOR_VERSION: u32 = 6;

/// One descriptor binding declared by a shader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShaderBinding {
    pub set: u32,
    pub slot: u32,
    pub resource_type: ResourceType,
    /// 1 for scalars, N for arrays.
    pub count: u32,
    pub stage_flags: vk::ShaderStageFlags,
}

/// The result of reflecting one compiled shader module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderReflection {
    pub stage: vk::ShaderStageFlags,
    /// Ordered by (set, slot).
    pub bindings: Vec<ShaderBinding>,
}

impl ShaderReflection {
    /// Turns the buffer binding at (set, slot) into its dynamic-offset variant.
    ///
    /// Returns false when there is no such binding or it is not a plain buffer.
    pub fn promote_dynamic(&mut self, set: u32, slot: u32) -> bool {
        self.bindings
            .iter_mut()
            .find(|binding| binding.set == set && binding.slot == slot)
            .and_then(|binding| {
                let dynamic = binding.resource_type.dynamic_variant()?;
                binding.resource_type = dynamic;
                Some(())
            })
            .is_some()
    }
}

/// Recovers the stage and descriptor bindings declared by a SPIR-V module.
///
/// The header is validated before the module is handed to the reflection
/// library so that garbage input always fails closed with
/// [`PipelineError::MalformedShaderBinary`].
pub fn reflect(code: &[u8]) -> Result<ShaderReflection> {
    validate_header(code)?;

    let module = spirv_reflect::ShaderModule::load_u8_data(code)
        .map_err(|err| PipelineError::MalformedShaderBinary(err.to_string()))?;

    let stage = vk::ShaderStageFlags::from_raw(module.get_shader_stage().bits());
    if stage.is_empty() {
        return Err(PipelineError::MalformedShaderBinary(
            "module declares no entry point".to_owned(),
        ));
    }

    let mut bindings = module
        .enumerate_descriptor_bindings(None)
        .map_err(|err| PipelineError::MalformedShaderBinary(err.to_string()))?
        .iter()
        .map(|reflected| {
            let resource_type = ResourceType::from_reflected(&reflected.descriptor_type)
                .ok_or_else(|| PipelineError::UnsupportedBindingType {
                    set: reflected.set,
                    slot: reflected.binding,
                    kind: format!("{:?}", reflected.descriptor_type),
                })?;

            Ok(ShaderBinding {
                set: reflected.set,
                slot: reflected.binding,
                resource_type,
                count: reflected.count.max(1),
                stage_flags: stage,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    bindings.sort_by_key(|binding| (binding.set, binding.slot));

    log::debug!(
        "Reflected {:?} shader with {} descriptor bindings",
        stage,
        bindings.len(),
    );

    Ok(ShaderReflection { stage, bindings })
}

fn validate_header(code: &[u8]) -> Result<()> {
    if code.len() % 4 != 0 {
        return Err(PipelineError::MalformedShaderBinary(format!(
            "length {} is not a multiple of 4",
            code.len(),
        )));
    }
    if code.len() < SPIRV_HEADER_WORDS * 4 {
        return Err(PipelineError::MalformedShaderBinary(format!(
            "length {} is shorter than the module header",
            code.len(),
        )));
    }

    let word = |index: usize| {
        let start = index * 4;
        u32::from_le_bytes([code[start], code[start + 1], code[start + 2], code[start + 3]])
    };

    let magic = word(0);
    if magic != SPIRV_MAGIC {
        return Err(PipelineError::MalformedShaderBinary(format!(
            "bad magic number {magic:#010x}",
        )));
    }

    // Version word layout: 0 | major | minor | 0
    let version = word(1);
    let major = (version >> 16) & 0xff;
    let minor = (version >> 8) & 0xff;
    if major != 1 || minor > SPIRV_MAX_MINOR_VERSION || version & 0xff00_00ff != 0 {
        return Err(PipelineError::MalformedShaderBinary(format!(
            "unsupported version word {version:#010x}",
        )));
    }

    Ok(())
}
