pub mod config;
pub mod node;
pub mod scene;
pub mod scene_file;
