//! Sprite rendering core.
//!
//! Three drawers share one [`RenderStateMachine`] and one [`TextureCache`]:
//! - [`SolidRectDrawer`]: filled rectangles
//! - [`SingleImageDrawer`]: one image with a model matrix
//! - [`SpriteBatchBuilder`]: many sprites in one triangle strip
//!
//! Convention: positions are drawing-buffer pixels, top-left origin, +Y down.

mod batch;
mod image;
pub mod program;
mod rect;
mod renderer;
mod state;
mod texture;
mod vertex;

pub use batch::{BatchStats, SpriteBatchBuilder, strip_vertex_count};
pub use image::{SingleImageDrawer, image_quad};
pub use program::{ProgramKind, ProgramRegistry, ProgramSource, ShaderProgram};
pub use rect::{SolidRectDrawer, solid_quad};
pub use renderer::{FrameStats, Renderer};
pub use state::RenderStateMachine;
pub use texture::{TextureBinding, TextureCache};
pub use vertex::{BatchVertex, ImageVertex, VertexArena, VertexWriter};
