//! Frame passes over a scene graph.
//!
//! `update` brings every batch and drawable up to date (uploads included);
//! `draw` walks the tree depth-first issuing draw calls. Within a frame the
//! update pass always finishes before the draw pass starts.

use super::graph::{NodeId, NodeKind, SceneGraph};
use crate::error::RenderResult;
use crate::gpu::backend::GraphicsBackend;
use crate::gpu::context::RenderContext;
use crate::sprite::batch::SpriteBatch;

/// Texture unit the normal map is bound to.
pub const NORMAL_MAP_UNIT: u32 = 1;

impl<B: GraphicsBackend> SceneGraph<B> {
    /// Update pass. Disabled nodes are updated too so re-enabling one never
    /// shows stale geometry.
    pub fn update(&mut self, ctx: &mut RenderContext<B>) -> RenderResult<()> {
        for node in self.nodes.iter_mut().flatten() {
            match &mut node.kind {
                NodeKind::Group => {}
                NodeKind::SpriteBatch(batch) => {
                    batch.update(ctx)?;
                }
                NodeKind::Drawable(drawable) => drawable.update(ctx)?,
            }
        }
        Ok(())
    }

    /// Draw pass from the root.
    pub fn draw(&self, ctx: &mut RenderContext<B>) -> RenderResult<()> {
        draw_node(self, ctx, NodeId::ROOT)
    }

    /// One full frame: update pass, then draw pass.
    pub fn render_frame(&mut self, ctx: &mut RenderContext<B>) -> RenderResult<()> {
        self.update(ctx)?;
        self.draw(ctx)
    }
}

/// Draw `id` and then its children in order. A disabled node skips its
/// whole subtree. A node's program stays in use for its subtree and the
/// previous program is restored afterwards.
pub fn draw_node<B: GraphicsBackend>(
    graph: &SceneGraph<B>,
    ctx: &mut RenderContext<B>,
    id: NodeId,
) -> RenderResult<()> {
    let node = graph.node(id)?;
    if !node.enabled {
        return Ok(());
    }

    let previous = ctx.programs.current();
    if let Some(program) = node.program {
        ctx.use_program(program)?;
    }

    match &node.kind {
        NodeKind::Group => {}
        NodeKind::SpriteBatch(batch) => draw_batch(ctx, batch)?,
        NodeKind::Drawable(drawable) => drawable.draw(ctx)?,
    }

    for &child in node.children() {
        draw_node(graph, ctx, child)?;
    }

    if let Some(previous) = previous {
        ctx.use_program(previous)?;
    }
    Ok(())
}

/// Bind the batch's texture and buffers and issue its single indexed draw.
/// The normal map goes on unit 1, and only when the current program samples
/// one. Empty batches issue nothing.
pub fn draw_batch<B: GraphicsBackend>(ctx: &mut RenderContext<B>, batch: &SpriteBatch) -> RenderResult<()> {
    if batch.is_empty() {
        log::trace!("batch {} is empty, not drawn", batch.id().0);
        return Ok(());
    }

    let index_buffer = ctx.index_buffer();
    ctx.textures.bind(&mut ctx.backend, batch.texture());
    ctx.backend.bind_buffer(batch.vertex_buffer());
    ctx.backend.bind_buffer(index_buffer);

    let wants_normal = ctx.programs.current_info().is_some_and(|p| p.uses_normal_map);
    if let (true, Some(normal)) = (wants_normal, batch.normal()) {
        ctx.textures.bind_unit(&mut ctx.backend, normal.texture(), NORMAL_MAP_UNIT)?;
    }

    ctx.backend.draw_elements(batch.index_count());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RenderConfig;
    use crate::gpu::backend::ProgramId;
    use crate::gpu::recording::{GpuCommand, RecordingBackend};
    use crate::gpu::shader::ProgramInfo;
    use crate::scene::graph::Drawable;
    use crate::texture::atlas::TextureAtlas;
    use crate::texture::image::DecodedImage;
    use glam::Vec2;
    use std::cell::Cell;
    use std::rc::Rc;

    const PLAIN: ProgramId = ProgramId(10);
    const LIT: ProgramId = ProgramId(11);

    fn context() -> RenderContext<RecordingBackend> {
        let mut ctx = RenderContext::new(RecordingBackend::new(), RenderConfig::default()).unwrap();
        ctx.register_program(ProgramInfo::new(PLAIN));
        ctx.register_program(ProgramInfo::new(LIT).with_normal_map());
        ctx
    }

    fn atlas(ctx: &mut RenderContext<RecordingBackend>) -> Rc<TextureAtlas> {
        let mut atlas = TextureAtlas::from_image(ctx, &DecodedImage::solid(16, 16, [255; 4])).unwrap();
        atlas.define_region(0, 0, 16, 16).unwrap();
        Rc::new(atlas)
    }

    fn batch_with(ctx: &mut RenderContext<RecordingBackend>, sprites: usize) -> SpriteBatch {
        let atlas = atlas(ctx);
        let mut batch = SpriteBatch::new(ctx, atlas, 8).unwrap();
        for _ in 0..sprites {
            batch.create_sprite_from_region(0, 16, 16).unwrap();
        }
        batch
    }

    fn draws(ctx: &RenderContext<RecordingBackend>) -> Vec<u32> {
        ctx.backend
            .commands()
            .iter()
            .filter_map(|c| match c {
                GpuCommand::DrawElements(n) => Some(*n),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn one_draw_per_batch_in_tree_order() {
        let mut ctx = context();
        let mut graph = SceneGraph::new();
        let first = batch_with(&mut ctx, 1);
        let second = batch_with(&mut ctx, 3);
        let parent = graph.add_batch(graph.root(), first).unwrap();
        graph.add_batch(parent, second).unwrap();

        graph.render_frame(&mut ctx).unwrap();
        assert_eq!(draws(&ctx), vec![6, 18]);
    }

    #[test]
    fn disabled_subtree_issues_no_gpu_calls() {
        let mut ctx = context();
        let mut graph = SceneGraph::new();
        let batch = batch_with(&mut ctx, 2);
        let group = graph.add(graph.root(), NodeKind::Group).unwrap();
        graph.set_program(group, Some(PLAIN)).unwrap();
        graph.add_batch(group, batch).unwrap();
        graph.set_enabled(group, false).unwrap();

        graph.update(&mut ctx).unwrap();
        ctx.backend.clear_commands();
        graph.draw(&mut ctx).unwrap();
        assert!(ctx.backend.commands().is_empty());
    }

    #[test]
    fn disabled_batches_still_update() {
        let mut ctx = context();
        let mut graph = SceneGraph::new();
        let batch = batch_with(&mut ctx, 1);
        let node = graph.add_batch(graph.root(), batch).unwrap();
        graph.set_enabled(node, false).unwrap();

        graph.update(&mut ctx).unwrap();
        assert_eq!(graph.batch(node).unwrap().upload_count(), 1);
    }

    #[test]
    fn normal_map_bound_only_for_normal_map_program() {
        let mut ctx = context();
        let mut batch = batch_with(&mut ctx, 1);
        let normal = atlas(&mut ctx);
        let normal_id = normal.texture();
        batch.set_normal(normal);

        let mut graph = SceneGraph::new();
        let node = graph.add_batch(graph.root(), batch).unwrap();
        graph.update(&mut ctx).unwrap();

        let on_unit_one = |ctx: &RenderContext<RecordingBackend>| {
            ctx.backend.count(|c| *c == GpuCommand::BindTexture { unit: 1, id: normal_id })
        };

        graph.set_program(node, Some(PLAIN)).unwrap();
        graph.draw(&mut ctx).unwrap();
        assert_eq!(on_unit_one(&ctx), 0);

        graph.set_program(node, Some(LIT)).unwrap();
        graph.draw(&mut ctx).unwrap();
        assert_eq!(on_unit_one(&ctx), 1);
    }

    #[test]
    fn program_restored_after_subtree() {
        let mut ctx = context();
        let mut graph = SceneGraph::new();
        graph.set_program(graph.root(), Some(PLAIN)).unwrap();
        let lit = graph.add(graph.root(), NodeKind::Group).unwrap();
        graph.set_program(lit, Some(LIT)).unwrap();
        graph.add(graph.root(), NodeKind::Group).unwrap();

        graph.draw(&mut ctx).unwrap();
        assert_eq!(ctx.programs.current(), Some(PLAIN));
        let uses: Vec<_> = ctx
            .backend
            .commands()
            .iter()
            .filter_map(|c| match c {
                GpuCommand::UseProgram(p) => Some(*p),
                _ => None,
            })
            .collect();
        assert_eq!(uses, vec![PLAIN, LIT, PLAIN]);
    }

    #[test]
    fn release_all_frees_batch_buffers() {
        let mut ctx = context();
        let mut graph = SceneGraph::new();
        let first = batch_with(&mut ctx, 1);
        let second = batch_with(&mut ctx, 2);
        let group = graph.add(graph.root(), NodeKind::Group).unwrap();
        graph.add_batch(group, first).unwrap();
        graph.add_batch(graph.root(), second).unwrap();
        graph.render_frame(&mut ctx).unwrap();
        assert_eq!(ctx.backend.live_buffers(), 3);

        graph.release_all(&mut ctx).unwrap();
        // Only the context's shared index buffer is left.
        assert_eq!(ctx.backend.live_buffers(), 1);
        assert!(graph.is_empty());
        assert_eq!(graph.batches().count(), 0);
    }

    #[test]
    fn empty_batch_is_skipped() {
        let mut ctx = context();
        let mut graph = SceneGraph::new();
        let batch = batch_with(&mut ctx, 0);
        graph.add_batch(graph.root(), batch).unwrap();
        graph.render_frame(&mut ctx).unwrap();
        assert!(draws(&ctx).is_empty());
    }

    struct Marker {
        updates: Rc<Cell<u32>>,
        draws: Rc<Cell<u32>>,
    }

    impl Drawable<RecordingBackend> for Marker {
        fn update(&mut self, _ctx: &mut RenderContext<RecordingBackend>) -> RenderResult<()> {
            self.updates.set(self.updates.get() + 1);
            Ok(())
        }

        fn draw(&self, ctx: &mut RenderContext<RecordingBackend>) -> RenderResult<()> {
            self.draws.set(self.draws.get() + 1);
            ctx.backend.draw_elements(3);
            Ok(())
        }
    }

    #[test]
    fn custom_drawables_follow_parent() {
        let mut ctx = context();
        let mut graph: SceneGraph<RecordingBackend> = SceneGraph::new();
        let (updates, drawn) = (Rc::new(Cell::new(0)), Rc::new(Cell::new(0)));
        let mut batch = batch_with(&mut ctx, 1);
        let sprite = batch.sprite_refs().next().unwrap();
        batch.sprite_mut(sprite).unwrap().set_position(Vec2::new(4.0, 4.0));

        let parent = graph.add_batch(graph.root(), batch).unwrap();
        graph
            .add(
                parent,
                NodeKind::Drawable(Box::new(Marker {
                    updates: updates.clone(),
                    draws: drawn.clone(),
                })),
            )
            .unwrap();

        graph.render_frame(&mut ctx).unwrap();
        assert_eq!((updates.get(), drawn.get()), (1, 1));
        assert_eq!(draws(&ctx), vec![6, 3]);
    }
}
