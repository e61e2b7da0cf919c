pub mod image_writer;
pub mod llm_image_service;

pub use image_writer::ImageWriter;
pub use llm_image_service::LlmImageService;
