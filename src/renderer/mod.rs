pub mod config;
pub mod contexts;
pub mod error;
pub mod resources;

#[cfg(test)]
mod test_support;
