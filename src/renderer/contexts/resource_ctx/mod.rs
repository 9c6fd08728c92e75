pub mod descriptor_arena;
pub mod descriptor_set_layout_builder;
pub mod descriptor_writer;
pub mod resource_type;
