pub mod draw;
pub mod graph;

pub use draw::{draw_batch, draw_node, NORMAL_MAP_UNIT};
pub use graph::{Drawable, Node, NodeId, NodeKind, SceneGraph};
