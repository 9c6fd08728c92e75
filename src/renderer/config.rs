/// Contains configuration options for the renderer core like the number of frames in flight
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// How many frames the CPU may record ahead of the GPU. One descriptor pool
    /// is allocated per frame.
    pub frames_in_flight: usize,
    /// Entry point used for shader stages bound without an explicit name.
    pub shader_entry_point: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            frames_in_flight: 2,
            shader_entry_point: "main".to_owned(),
        }
    }
}
