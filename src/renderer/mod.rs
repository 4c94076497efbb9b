//! Rendering
//!
//! `scene` builds a triangle list in screen pixels from the simulation state;
//! `pipeline` uploads it and draws with WebGPU.

pub mod pipeline;
pub mod scene;
pub mod shapes;
pub mod vertex;

pub use pipeline::RenderState;
pub use vertex::Vertex;
