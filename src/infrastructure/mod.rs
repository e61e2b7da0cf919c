pub mod image_generator;

pub use image_generator::{generator_fn, FnGenerator, GenerateFuture, ImageGenerator};
