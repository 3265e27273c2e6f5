pub mod cubemap;
pub mod spherical;
pub mod vector;
