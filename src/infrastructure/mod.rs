// Infrastructure layer: file-backed persistence

pub mod json_file;

pub use json_file::{JsonFileConfig, JsonFileExporter, JsonFileImporter};
