//! The public recording facade.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use crossbeam_channel::Sender;
use permafrost_core::{Fingerprint, Handle};
use permafrost_schema::{
    ComputePipelineCreateInfo, DescriptorSetLayoutCreateInfo, ExtensionChain,
    GraphicsPipelineCreateInfo, PipelineLayoutCreateInfo, PipelineShaderStageCreateInfo,
    RenderPassCreateInfo, SamplerCreateInfo, ShaderModuleCreateInfo,
};

use crate::error::RecordError;
use crate::index::ObjectIndex;
use crate::serialize;
use crate::worker::{self, RecordedInfo, WorkItem};

#[derive(Debug, Clone)]
pub struct RecorderConfig {
    /// Directory per-object archives are written into. Nothing is written
    /// when unset; `set_serialization_path` can supply it later.
    pub serialization_path: Option<PathBuf>,
    /// Bound of the record queue. Record calls block once it fills up.
    pub queue_capacity: usize,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            serialization_path: None,
            queue_capacity: 1024,
        }
    }
}

pub(crate) struct RecorderShared {
    pub index: ObjectIndex,
    pub serialization: Mutex<Option<PathBuf>>,
}

/// Captures pipeline-object descriptions into a content-addressed archive.
///
/// `record_*` may be called from any thread; each call validates the
/// description, takes ownership of it, and enqueues it for the background
/// worker. Fingerprints become observable through `get_hash_for_*` once the
/// worker has processed the item; [`StateRecorder::record_end`] drains the
/// queue and is the quiescence point shutdown paths must reach.
pub struct StateRecorder {
    shared: Arc<RecorderShared>,
    sender: Sender<WorkItem>,
    worker: Option<JoinHandle<()>>,
}

impl StateRecorder {
    pub fn new() -> Self {
        Self::with_config(RecorderConfig::default())
    }

    pub fn with_config(config: RecorderConfig) -> Self {
        let shared = Arc::new(RecorderShared {
            index: ObjectIndex::new(),
            serialization: Mutex::new(config.serialization_path),
        });
        let (sender, receiver) = crossbeam_channel::bounded(config.queue_capacity);
        let worker_shared = Arc::clone(&shared);
        let worker = thread::Builder::new()
            .name("permafrost-record".to_string())
            .spawn(move || worker::record_task(worker_shared, receiver))
            .expect("failed to spawn record worker");
        Self {
            shared,
            sender,
            worker: Some(worker),
        }
    }

    /// Set (or replace) the directory per-object archives are written into.
    pub fn set_serialization_path(&self, dir: impl Into<PathBuf>) {
        *self.shared.serialization.lock().unwrap() = Some(dir.into());
    }

    // ── record operations ───────────────────────────────────

    pub fn record_sampler(
        &self,
        sampler: Handle,
        info: SamplerCreateInfo,
    ) -> Result<(), RecordError> {
        reject_extension(&info.next, "sampler create info")?;
        self.enqueue(sampler, RecordedInfo::Sampler(info))
    }

    pub fn record_descriptor_set_layout(
        &self,
        set_layout: Handle,
        info: DescriptorSetLayoutCreateInfo,
    ) -> Result<(), RecordError> {
        reject_extension(&info.next, "descriptor set layout create info")?;
        self.enqueue(set_layout, RecordedInfo::DescriptorSetLayout(info))
    }

    pub fn record_pipeline_layout(
        &self,
        pipeline_layout: Handle,
        info: PipelineLayoutCreateInfo,
    ) -> Result<(), RecordError> {
        reject_extension(&info.next, "pipeline layout create info")?;
        self.enqueue(pipeline_layout, RecordedInfo::PipelineLayout(info))
    }

    pub fn record_shader_module(
        &self,
        module: Handle,
        info: ShaderModuleCreateInfo,
    ) -> Result<(), RecordError> {
        reject_extension(&info.next, "shader module create info")?;
        self.enqueue(module, RecordedInfo::ShaderModule(info))
    }

    pub fn record_render_pass(
        &self,
        render_pass: Handle,
        info: RenderPassCreateInfo,
    ) -> Result<(), RecordError> {
        reject_extension(&info.next, "render pass create info")?;
        self.enqueue(render_pass, RecordedInfo::RenderPass(info))
    }

    pub fn record_compute_pipeline(
        &self,
        pipeline: Handle,
        info: ComputePipelineCreateInfo,
    ) -> Result<(), RecordError> {
        reject_extension(&info.next, "compute pipeline create info")?;
        reject_stage_extension(&info.stage)?;
        self.enqueue(pipeline, RecordedInfo::ComputePipeline(Box::new(info)))
    }

    pub fn record_graphics_pipeline(
        &self,
        pipeline: Handle,
        info: GraphicsPipelineCreateInfo,
    ) -> Result<(), RecordError> {
        reject_graphics_extensions(&info)?;
        self.enqueue(pipeline, RecordedInfo::GraphicsPipeline(Box::new(info)))
    }

    /// Post the shutdown sentinel and wait for the worker to drain the queue.
    /// After this returns every recorded object is fingerprinted and all
    /// pending archives are on disk; further record calls fail with
    /// [`RecordError::QueueClosed`].
    pub fn record_end(&mut self) -> Result<(), RecordError> {
        self.sender
            .send(WorkItem::Shutdown)
            .map_err(|_| RecordError::QueueClosed)?;
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
        Ok(())
    }

    // ── fingerprint accessors ───────────────────────────────
    //
    // Valid after a quiescence point (`record_end`, or any external guarantee
    // that the worker has consumed the relevant item).

    pub fn get_hash_for_sampler(&self, handle: Handle) -> Result<Fingerprint, RecordError> {
        self.shared.index.hash_for_sampler(handle)
    }

    pub fn get_hash_for_descriptor_set_layout(
        &self,
        handle: Handle,
    ) -> Result<Fingerprint, RecordError> {
        self.shared.index.hash_for_descriptor_set_layout(handle)
    }

    pub fn get_hash_for_pipeline_layout(
        &self,
        handle: Handle,
    ) -> Result<Fingerprint, RecordError> {
        self.shared.index.hash_for_pipeline_layout(handle)
    }

    pub fn get_hash_for_shader_module(&self, handle: Handle) -> Result<Fingerprint, RecordError> {
        self.shared.index.hash_for_shader_module(handle)
    }

    pub fn get_hash_for_render_pass(&self, handle: Handle) -> Result<Fingerprint, RecordError> {
        self.shared.index.hash_for_render_pass(handle)
    }

    pub fn get_hash_for_compute_pipeline(
        &self,
        handle: Handle,
    ) -> Result<Fingerprint, RecordError> {
        self.shared.index.hash_for_compute_pipeline(handle)
    }

    pub fn get_hash_for_graphics_pipeline(
        &self,
        handle: Handle,
    ) -> Result<Fingerprint, RecordError> {
        self.shared.index.hash_for_graphics_pipeline(handle)
    }

    // ── serialization ───────────────────────────────────────

    /// Serialize everything recorded so far into one archive document.
    pub fn serialize(&self) -> Result<Vec<u8>, RecordError> {
        let _guard = self.shared.serialization.lock().unwrap();
        let archive = serialize::full_archive(&self.shared.index);
        Ok(serde_json::to_vec_pretty(&archive)?)
    }

    /// Serialize one shader module as a single-object archive. Unknown
    /// fingerprints yield an archive with no entries.
    pub fn serialize_shader_module(&self, hash: Fingerprint) -> Result<Vec<u8>, RecordError> {
        let _guard = self.shared.serialization.lock().unwrap();
        let archive = serialize::shader_module_archive(&self.shared.index, hash);
        Ok(serde_json::to_vec_pretty(&archive)?)
    }

    /// Serialize one compute pipeline together with its transitive closure
    /// (pipeline layout, set layouts, immutable samplers).
    pub fn serialize_compute_pipeline(&self, hash: Fingerprint) -> Result<Vec<u8>, RecordError> {
        let _guard = self.shared.serialization.lock().unwrap();
        let archive = serialize::compute_pipeline_archive(&self.shared.index, hash);
        Ok(serde_json::to_vec_pretty(&archive)?)
    }

    /// Serialize one graphics pipeline together with its transitive closure
    /// (pipeline layout, set layouts, immutable samplers, render pass).
    pub fn serialize_graphics_pipeline(&self, hash: Fingerprint) -> Result<Vec<u8>, RecordError> {
        let _guard = self.shared.serialization.lock().unwrap();
        let archive = serialize::graphics_pipeline_archive(&self.shared.index, hash);
        Ok(serde_json::to_vec_pretty(&archive)?)
    }

    fn enqueue(&self, handle: Handle, info: RecordedInfo) -> Result<(), RecordError> {
        self.sender
            .send(WorkItem::Record { handle, info })
            .map_err(|_| RecordError::QueueClosed)
    }
}

impl Default for StateRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for StateRecorder {
    fn drop(&mut self) {
        let _ = self.sender.send(WorkItem::Shutdown);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn reject_extension(
    next: &Option<ExtensionChain>,
    what: &'static str,
) -> Result<(), RecordError> {
    if next.is_some() {
        return Err(RecordError::ExtensionNotSupported(what));
    }
    Ok(())
}

fn reject_stage_extension(stage: &PipelineShaderStageCreateInfo) -> Result<(), RecordError> {
    reject_extension(&stage.next, "shader stage create info")
}

/// Every sub-structure's own extension marker is checked exactly once.
fn reject_graphics_extensions(info: &GraphicsPipelineCreateInfo) -> Result<(), RecordError> {
    reject_extension(&info.next, "graphics pipeline create info")?;
    if let Some(state) = &info.tessellation_state {
        reject_extension(&state.next, "tessellation state")?;
    }
    if let Some(state) = &info.dynamic_state {
        reject_extension(&state.next, "dynamic state")?;
    }
    if let Some(state) = &info.multisample_state {
        reject_extension(&state.next, "multisample state")?;
    }
    if let Some(state) = &info.vertex_input_state {
        reject_extension(&state.next, "vertex input state")?;
    }
    if let Some(state) = &info.rasterization_state {
        reject_extension(&state.next, "rasterization state")?;
    }
    if let Some(state) = &info.input_assembly_state {
        reject_extension(&state.next, "input assembly state")?;
    }
    if let Some(state) = &info.color_blend_state {
        reject_extension(&state.next, "color blend state")?;
    }
    if let Some(state) = &info.viewport_state {
        reject_extension(&state.next, "viewport state")?;
    }
    if let Some(state) = &info.depth_stencil_state {
        reject_extension(&state.next, "depth stencil state")?;
    }
    for stage in &info.stages {
        reject_stage_extension(stage)?;
    }
    Ok(())
}
