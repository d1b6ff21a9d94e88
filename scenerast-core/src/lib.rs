/// scenerast core library - scenegraph, camera and software rasterizer
///
/// This library holds the stateless rendering pipeline: building a scenegraph
/// of transforms, surfaces and shapes, projecting it through a pinhole camera,
/// and producing either wireframe polylines or a z-buffered image.

pub mod camera;
pub mod error;
pub mod geometry;
pub mod raster;
pub mod render;
pub mod scenegraph;
pub mod shapes;
pub mod stl;
pub mod transform;

// Re-export commonly used types
pub use camera::Camera;
pub use error::{RenderError, RenderResult};
pub use geometry::{Color, Mesh};
pub use raster::FrameBuffer;
pub use render::{render, Polyline, RenderMode, RenderOutput, RenderSettings};
pub use scenegraph::{Instance, NodeId, SceneGraph, TransformKind};
pub use transform::{Angles, Axis, Transform};
