//! Shader program bookkeeping.
//!
//! Compilation and linking happen outside this crate; the registry only knows
//! which programs exist, what they sample, and which one is current.

use std::collections::HashMap;

use super::backend::{GraphicsBackend, ProgramId};
use crate::error::{rejected, RenderError, RenderResult};

/// Metadata for a linked program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramInfo {
    pub id: ProgramId,
    /// Samples a normal map from texture unit 1.
    pub uses_normal_map: bool,
}

impl ProgramInfo {
    pub fn new(id: ProgramId) -> Self {
        Self { id, uses_normal_map: false }
    }

    pub fn with_normal_map(mut self) -> Self {
        self.uses_normal_map = true;
        self
    }
}

#[derive(Debug, Default)]
pub struct ProgramRegistry {
    programs: HashMap<ProgramId, ProgramInfo>,
    current: Option<ProgramId>,
}

impl ProgramRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, info: ProgramInfo) {
        self.programs.insert(info.id, info);
    }

    pub fn get(&self, id: ProgramId) -> Option<&ProgramInfo> {
        self.programs.get(&id)
    }

    pub fn current(&self) -> Option<ProgramId> {
        self.current
    }

    pub fn current_info(&self) -> Option<&ProgramInfo> {
        self.current.and_then(|id| self.programs.get(&id))
    }

    /// Make `id` the active program. Switching to the program already in use
    /// issues no backend call.
    pub fn use_program(&mut self, gpu: &mut dyn GraphicsBackend, id: ProgramId) -> RenderResult<()> {
        if !self.programs.contains_key(&id) {
            return Err(rejected(RenderError::UnknownProgram(id.0)));
        }
        if self.current == Some(id) {
            return Ok(());
        }
        gpu.use_program(id);
        self.current = Some(id);
        Ok(())
    }
}
