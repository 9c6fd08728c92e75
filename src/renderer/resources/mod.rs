/// "Resources" refers to middle-level objects that the pipeline builder creates
/// from user input. They are relatively intuitive and managed by the user.

pub mod shader;
pub mod vertex;
