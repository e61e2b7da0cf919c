pub mod image_loader;

pub use image_loader::{load_source_image, mime_for_path};
