//! Headless backend that records every call.
//!
//! Used by the test suite and by tools that want to inspect a frame's GPU
//! traffic without a window. It tracks which textures and buffers are alive
//! and how many bytes each holds.

use std::collections::HashMap;

use super::backend::{
    BackendError, BufferId, BufferKind, GraphicsBackend, ProgramId, SamplingParams, TextureId,
    TextureUpload,
};

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum GpuCommand {
    CreateTexture(TextureId),
    UploadTexture { id: TextureId, width: u32, height: u32, bytes: usize },
    SetSampling { id: TextureId, params: SamplingParams },
    BindTexture { unit: u32, id: TextureId },
    DeleteTextures(Vec<TextureId>),
    CreateBuffer { id: BufferId, kind: BufferKind },
    UploadBuffer { id: BufferId, bytes: usize },
    BindBuffer(BufferId),
    DeleteBuffer(BufferId),
    UseProgram(ProgramId),
    DrawElements(u32),
}

#[derive(Debug, Default)]
pub struct RecordingBackend {
    commands: Vec<GpuCommand>,
    textures: HashMap<TextureId, usize>,
    buffers: HashMap<BufferId, Vec<u8>>,
    next_texture: u32,
    next_buffer: u32,
    fail_next_upload: Option<BackendError>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// All calls recorded since creation or the last `clear_commands`.
    pub fn commands(&self) -> &[GpuCommand] {
        &self.commands
    }

    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    /// Textures that exist on the "device", with their storage size in bytes.
    pub fn live_textures(&self) -> &HashMap<TextureId, usize> {
        &self.textures
    }

    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }

    /// Last bytes uploaded to `id`.
    pub fn buffer_contents(&self, id: BufferId) -> Option<&[u8]> {
        self.buffers.get(&id).map(Vec::as_slice)
    }

    /// Make the next texture or buffer upload fail with `err`.
    pub fn fail_next_upload(&mut self, err: BackendError) {
        self.fail_next_upload = Some(err);
    }

    /// Number of recorded calls matching `pred`.
    pub fn count(&self, pred: impl Fn(&GpuCommand) -> bool) -> usize {
        self.commands.iter().filter(|c| pred(c)).count()
    }
}

impl GraphicsBackend for RecordingBackend {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn create_texture(&mut self) -> Result<TextureId, BackendError> {
        self.next_texture += 1;
        let id = TextureId(self.next_texture);
        self.textures.insert(id, 0);
        self.commands.push(GpuCommand::CreateTexture(id));
        Ok(id)
    }

    fn upload_texture(&mut self, id: TextureId, upload: &TextureUpload<'_>) -> Result<(), BackendError> {
        if let Some(err) = self.fail_next_upload.take() {
            return Err(err);
        }
        let bytes = upload.width as usize * upload.height as usize * upload.format.bytes_per_pixel();
        let slot = self.textures.get_mut(&id).ok_or(BackendError::UnknownTexture(id.0))?;
        *slot = bytes;
        self.commands.push(GpuCommand::UploadTexture {
            id,
            width: upload.width,
            height: upload.height,
            bytes,
        });
        Ok(())
    }

    fn set_sampling(&mut self, id: TextureId, params: SamplingParams) {
        self.commands.push(GpuCommand::SetSampling { id, params });
    }

    fn bind_texture(&mut self, unit: u32, id: TextureId) {
        self.commands.push(GpuCommand::BindTexture { unit, id });
    }

    fn delete_textures(&mut self, ids: &[TextureId]) {
        for id in ids {
            self.textures.remove(id);
        }
        self.commands.push(GpuCommand::DeleteTextures(ids.to_vec()));
    }

    fn create_buffer(&mut self, kind: BufferKind) -> Result<BufferId, BackendError> {
        self.next_buffer += 1;
        let id = BufferId(self.next_buffer);
        self.buffers.insert(id, Vec::new());
        self.commands.push(GpuCommand::CreateBuffer { id, kind });
        Ok(id)
    }

    fn upload_buffer(&mut self, id: BufferId, bytes: &[u8]) -> Result<(), BackendError> {
        if let Some(err) = self.fail_next_upload.take() {
            return Err(err);
        }
        let contents = self.buffers.get_mut(&id).ok_or(BackendError::UnknownBuffer(id.0))?;
        contents.clear();
        contents.extend_from_slice(bytes);
        self.commands.push(GpuCommand::UploadBuffer { id, bytes: bytes.len() });
        Ok(())
    }

    fn bind_buffer(&mut self, id: BufferId) {
        self.commands.push(GpuCommand::BindBuffer(id));
    }

    fn delete_buffer(&mut self, id: BufferId) {
        self.buffers.remove(&id);
        self.commands.push(GpuCommand::DeleteBuffer(id));
    }

    fn use_program(&mut self, id: ProgramId) {
        self.commands.push(GpuCommand::UseProgram(id));
    }

    fn draw_elements(&mut self, count: u32) {
        self.commands.push(GpuCommand::DrawElements(count));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::texture::image::PixelFormat;

    #[test]
    fn handles_are_unique_and_nonzero() {
        let mut gpu = RecordingBackend::new();
        let a = gpu.create_texture().unwrap();
        let b = gpu.create_texture().unwrap();
        assert_ne!(a, b);
        assert_ne!(a, TextureId::NONE);
    }

    #[test]
    fn upload_tracks_texture_size() {
        let mut gpu = RecordingBackend::new();
        let id = gpu.create_texture().unwrap();
        let upload = TextureUpload { format: PixelFormat::Rgba, width: 4, height: 2, pixels: None };
        gpu.upload_texture(id, &upload).unwrap();
        assert_eq!(gpu.live_textures()[&id], 32);

        gpu.delete_textures(&[id]);
        assert!(gpu.live_textures().is_empty());
    }

    #[test]
    fn injected_failure_fires_once() {
        let mut gpu = RecordingBackend::new();
        let buf = gpu.create_buffer(BufferKind::Vertex).unwrap();
        gpu.fail_next_upload(BackendError::OutOfMemory { requested: 8 });
        assert!(gpu.upload_buffer(buf, &[0; 8]).is_err());
        assert!(gpu.upload_buffer(buf, &[0; 8]).is_ok());
        assert_eq!(gpu.buffer_contents(buf).unwrap().len(), 8);
    }
}
