pub mod decorator;
pub mod labels;
pub mod paint;
pub mod primitives;
pub mod rasterizer;
pub mod renderer;
pub mod text;
