pub mod job;
pub mod renderer;
