pub mod face;
pub mod image_buffer;
pub mod math;
pub mod projection;
