//! SketchBoard Core Library
//!
//! Shape model, hit-testing and document state for the SketchBoard drawing
//! surface. No I/O and no async: every operation is synchronous.

pub mod canvas;
pub mod draft;
pub mod geometry;
pub mod shapes;

pub use canvas::{CanvasDocument, CanvasError, DocumentSnapshot};
pub use draft::ShapeDraft;
pub use shapes::{Geometry, PreviewShape, SerializableColor, Shape, ShapeId, ShapeStyle};
