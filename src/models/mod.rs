pub mod image;
pub mod job;
pub mod loaders;
pub mod period;

pub use image::{ImageRef, SourceImage};
pub use job::{BatchSnapshot, BatchStats, JobEvent, JobSnapshot, JobState, JobStatus};
pub use loaders::load_source_image;
pub use period::Period;
