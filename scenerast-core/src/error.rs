/// Error types shared by the scenegraph, camera and rendering pipeline
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RenderError {
    /// Scenegraph edges that break the one-child rule, nest a root, or close a cycle.
    #[error("scenegraph structure error: {0}")]
    Structure(String),

    /// Camera pose or frustum parameters that cannot produce an orthonormal basis.
    #[error("degenerate camera: {0}")]
    DegeneratePose(String),

    /// Malformed arrays, colors or image sizes handed in by the caller.
    #[error("malformed input: {0}")]
    InputShape(String),

    #[error("failed to parse STL: {0}")]
    Stl(String),
}

pub type RenderResult<T> = Result<T, RenderError>;
