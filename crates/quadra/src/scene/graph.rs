//! Scene graph: a tree of drawable nodes stored in a flat arena.
//!
//! Node 0 is an always-present group at the root. Children are kept in
//! insertion order, which is also their draw order.

use crate::error::{rejected, RenderError, RenderResult};
use crate::gpu::backend::{GraphicsBackend, ProgramId};
use crate::gpu::context::RenderContext;
use crate::sprite::batch::SpriteBatch;

/// Anything the scene can draw besides a sprite batch (text labels, debug
/// overlays, custom geometry).
pub trait Drawable<B: GraphicsBackend> {
    /// Update pass: bring GPU-side data up to date.
    fn update(&mut self, ctx: &mut RenderContext<B>) -> RenderResult<()>;

    /// Draw pass: bind and issue draw calls. The node's program is already
    /// in use.
    fn draw(&self, ctx: &mut RenderContext<B>) -> RenderResult<()>;
}

/// Handle to a node: its arena slot and the slot's generation when the node
/// was added. A handle to a removed node never resolves, even after its slot
/// is reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    pub const ROOT: NodeId = NodeId { index: 0, generation: 0 };

    pub fn index(&self) -> u32 {
        self.index
    }
}

pub enum NodeKind<B: GraphicsBackend> {
    /// Draws nothing itself; exists to group children under one
    /// enable flag or program.
    Group,
    SpriteBatch(SpriteBatch),
    Drawable(Box<dyn Drawable<B>>),
}

impl<B: GraphicsBackend> NodeKind<B> {
    pub fn as_batch(&self) -> Option<&SpriteBatch> {
        match self {
            NodeKind::SpriteBatch(batch) => Some(batch),
            _ => None,
        }
    }
}

pub struct Node<B: GraphicsBackend> {
    pub enabled: bool,
    /// Program to draw this node and its subtree with. `None` inherits.
    pub program: Option<ProgramId>,
    pub kind: NodeKind<B>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

impl<B: GraphicsBackend> Node<B> {
    fn new(kind: NodeKind<B>, parent: Option<NodeId>) -> Self {
        Self {
            enabled: true,
            program: None,
            kind,
            parent,
            children: Vec::new(),
        }
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }
}

pub struct SceneGraph<B: GraphicsBackend> {
    pub(crate) nodes: Vec<Option<Node<B>>>,
    /// Bumped each time a slot is vacated.
    generations: Vec<u32>,
    free: Vec<u32>,
}

impl<B: GraphicsBackend> SceneGraph<B> {
    pub fn new() -> Self {
        Self {
            nodes: vec![Some(Node::new(NodeKind::Group, None))],
            generations: vec![0],
            free: Vec::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Append a node as the last child of `parent`.
    pub fn add(&mut self, parent: NodeId, kind: NodeKind<B>) -> RenderResult<NodeId> {
        self.node(parent)?;

        let node = Node::new(kind, Some(parent));
        let id = match self.free.pop() {
            Some(index) => {
                self.nodes[index as usize] = Some(node);
                NodeId { index, generation: self.generations[index as usize] }
            }
            None => {
                self.nodes.push(Some(node));
                self.generations.push(0);
                NodeId { index: self.nodes.len() as u32 - 1, generation: 0 }
            }
        };
        self.node_mut(parent)?.children.push(id);
        Ok(id)
    }

    /// Shorthand for adding a sprite batch node.
    pub fn add_batch(&mut self, parent: NodeId, batch: SpriteBatch) -> RenderResult<NodeId> {
        self.add(parent, NodeKind::SpriteBatch(batch))
    }

    fn is_live(&self, id: NodeId) -> bool {
        self.generations.get(id.index as usize) == Some(&id.generation)
    }

    pub fn node(&self, id: NodeId) -> RenderResult<&Node<B>> {
        self.nodes
            .get(id.index as usize)
            .and_then(Option::as_ref)
            .filter(|_| self.is_live(id))
            .ok_or_else(|| rejected(RenderError::UnknownNode(id.index)))
    }

    pub fn node_mut(&mut self, id: NodeId) -> RenderResult<&mut Node<B>> {
        let live = self.is_live(id);
        self.nodes
            .get_mut(id.index as usize)
            .and_then(Option::as_mut)
            .filter(|_| live)
            .ok_or_else(|| rejected(RenderError::UnknownNode(id.index)))
    }

    /// Enable or disable a node. A disabled node hides its whole subtree.
    pub fn set_enabled(&mut self, id: NodeId, enabled: bool) -> RenderResult<()> {
        self.node_mut(id)?.enabled = enabled;
        Ok(())
    }

    pub fn set_program(&mut self, id: NodeId, program: Option<ProgramId>) -> RenderResult<()> {
        self.node_mut(id)?.program = program;
        Ok(())
    }

    pub fn batch(&self, id: NodeId) -> RenderResult<&SpriteBatch> {
        self.node(id)?
            .kind
            .as_batch()
            .ok_or_else(|| rejected(RenderError::NotABatch(id.index)))
    }

    pub fn batch_mut(&mut self, id: NodeId) -> RenderResult<&mut SpriteBatch> {
        match &mut self.node_mut(id)?.kind {
            NodeKind::SpriteBatch(batch) => Ok(batch),
            _ => Err(rejected(RenderError::NotABatch(id.index))),
        }
    }

    /// Detach `id` and its subtree, returning the payloads in depth-first
    /// order so the caller can release their GPU resources. Removing the
    /// root only removes its children.
    pub fn remove(&mut self, id: NodeId) -> RenderResult<Vec<NodeKind<B>>> {
        let parent = self.node(id)?.parent;
        let mut removed = Vec::new();

        if id == NodeId::ROOT {
            let children = std::mem::take(&mut self.node_mut(id)?.children);
            for child in children {
                self.take_subtree(child, &mut removed);
            }
            return Ok(removed);
        }

        if let Some(parent) = parent {
            self.node_mut(parent)?.children.retain(|&c| c != id);
        }
        self.take_subtree(id, &mut removed);
        Ok(removed)
    }

    fn take_subtree(&mut self, id: NodeId, out: &mut Vec<NodeKind<B>>) {
        if !self.is_live(id) {
            return;
        }
        let Some(node) = self.nodes.get_mut(id.index as usize).and_then(Option::take) else {
            return;
        };
        let generation = &mut self.generations[id.index as usize];
        *generation = generation.wrapping_add(1);
        self.free.push(id.index);
        out.push(node.kind);
        for child in node.children {
            self.take_subtree(child, out);
        }
    }

    /// Remove every node below the root and delete the vertex buffers of
    /// the batches among them. Dropping a graph without this leaves those
    /// buffers allocated on the backend.
    pub fn release_all(&mut self, ctx: &mut RenderContext<B>) -> RenderResult<()> {
        for kind in self.remove(NodeId::ROOT)? {
            if let NodeKind::SpriteBatch(batch) = kind {
                batch.release(ctx);
            }
        }
        Ok(())
    }

    /// Number of live nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }

    /// Every sprite batch in the graph, enabled or not.
    pub fn batches(&self) -> impl Iterator<Item = &SpriteBatch> + '_ {
        self.nodes
            .iter()
            .flatten()
            .filter_map(|node| node.kind.as_batch())
    }
}

impl<B: GraphicsBackend> Default for SceneGraph<B> {
    fn default() -> Self {
        Self::new()
    }
}
