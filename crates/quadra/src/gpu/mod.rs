pub mod backend;
pub mod context;
pub mod recording;
pub mod shader;

pub use backend::{
    BackendError, BufferId, BufferKind, GraphicsBackend, ProgramId, SamplingParams, TextureId,
    TextureUpload, WrapMode,
};
pub use context::RenderContext;
pub use recording::{GpuCommand, RecordingBackend};
pub use shader::{ProgramInfo, ProgramRegistry};
