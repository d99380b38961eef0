//! The recorder's background worker.
//!
//! A single thread drains the work queue in enqueue order: fingerprint,
//! register the handle, and on first sight of a fingerprint remap the frozen
//! description into archive space and store it. Shader modules and pipelines
//! additionally serialize their closure to the capture directory right away.
//! Errors are logged and skip the item; the worker keeps serving until the
//! shutdown sentinel arrives.

use std::sync::Arc;

use crossbeam_channel::Receiver;
use permafrost_core::Handle;
use permafrost_schema::{
    ComputePipelineCreateInfo, DescriptorSetLayoutCreateInfo, GraphicsPipelineCreateInfo,
    PipelineLayoutCreateInfo, RenderPassCreateInfo, SamplerCreateInfo, ShaderModuleCreateInfo,
    StateArchive,
};
use tracing::{debug, error, trace};

use crate::error::RecordError;
use crate::recorder::RecorderShared;
use crate::{hashing, remap, serialize};

/// One recorded description, tagged by kind. The worker dispatches on this
/// exhaustively; there is no structure-type sniffing.
pub(crate) enum RecordedInfo {
    Sampler(SamplerCreateInfo),
    DescriptorSetLayout(DescriptorSetLayoutCreateInfo),
    PipelineLayout(PipelineLayoutCreateInfo),
    ShaderModule(ShaderModuleCreateInfo),
    RenderPass(RenderPassCreateInfo),
    ComputePipeline(Box<ComputePipelineCreateInfo>),
    GraphicsPipeline(Box<GraphicsPipelineCreateInfo>),
}

pub(crate) enum WorkItem {
    Record { handle: Handle, info: RecordedInfo },
    Shutdown,
}

pub(crate) fn record_task(shared: Arc<RecorderShared>, receiver: Receiver<WorkItem>) {
    while let Ok(item) = receiver.recv() {
        let WorkItem::Record { handle, info } = item else {
            trace!("record worker shutting down");
            return;
        };
        if let Err(e) = process(&shared, handle, info) {
            error!("failed to record {handle}: {e}");
        }
    }
}

fn process(shared: &RecorderShared, handle: Handle, info: RecordedInfo) -> Result<(), RecordError> {
    let index = &shared.index;
    match info {
        RecordedInfo::Sampler(info) => {
            let hash = hashing::compute_hash_sampler(&info);
            index.sampler_hashes.insert(handle, hash);
            if !index.samplers.contains_key(&hash) {
                index.samplers.insert(hash, Arc::new(info));
            }
        }
        RecordedInfo::DescriptorSetLayout(mut info) => {
            let hash = hashing::compute_hash_descriptor_set_layout(index, &info)?;
            index.set_layout_hashes.insert(handle, hash);
            if !index.set_layouts.contains_key(&hash) {
                remap::remap_descriptor_set_layout(index, &mut info)?;
                index.set_layouts.insert(hash, Arc::new(info));
            }
        }
        RecordedInfo::PipelineLayout(mut info) => {
            let hash = hashing::compute_hash_pipeline_layout(index, &info)?;
            index.pipeline_layout_hashes.insert(handle, hash);
            if !index.pipeline_layouts.contains_key(&hash) {
                remap::remap_pipeline_layout(index, &mut info)?;
                index.pipeline_layouts.insert(hash, Arc::new(info));
            }
        }
        RecordedInfo::RenderPass(info) => {
            let hash = hashing::compute_hash_render_pass(&info);
            index.render_pass_hashes.insert(handle, hash);
            if !index.render_passes.contains_key(&hash) {
                index.render_passes.insert(hash, Arc::new(info));
            }
        }
        RecordedInfo::ShaderModule(info) => {
            let hash = hashing::compute_hash_shader_module(&info);
            index.shader_module_hashes.insert(handle, hash);
            if !index.shader_modules.contains_key(&hash) {
                index.shader_modules.insert(hash, Arc::new(info));
                write_archive(shared, hash, serialize::shader_module_archive(index, hash))?;
            }
        }
        RecordedInfo::ComputePipeline(mut info) => {
            let hash = hashing::compute_hash_compute_pipeline(index, &info)?;
            index.compute_pipeline_hashes.insert(handle, hash);
            if !index.compute_pipelines.contains_key(&hash) {
                remap::remap_compute_pipeline(index, &mut info)?;
                index.compute_pipelines.insert(hash, Arc::new(*info));
                write_archive(shared, hash, serialize::compute_pipeline_archive(index, hash))?;
            }
        }
        RecordedInfo::GraphicsPipeline(mut info) => {
            let hash = hashing::compute_hash_graphics_pipeline(index, &info)?;
            index.graphics_pipeline_hashes.insert(handle, hash);
            if !index.graphics_pipelines.contains_key(&hash) {
                remap::remap_graphics_pipeline(index, &mut info)?;
                index.graphics_pipelines.insert(hash, Arc::new(*info));
                write_archive(shared, hash, serialize::graphics_pipeline_archive(index, hash))?;
            }
        }
    }
    Ok(())
}

/// Write one object's archive to `<serialization_path>/<HEX16>.json`. Held
/// under the serialization lock so concurrent `serialize*` calls see a
/// consistent snapshot. I/O failures are logged, never propagated.
fn write_archive(
    shared: &RecorderShared,
    hash: permafrost_core::Fingerprint,
    archive: StateArchive,
) -> Result<(), RecordError> {
    let guard = shared.serialization.lock().unwrap();
    let Some(dir) = guard.as_ref() else {
        trace!("no serialization path set, skipping archive write for {hash}");
        return Ok(());
    };
    let bytes = serde_json::to_vec_pretty(&archive)?;
    let path = dir.join(format!("{hash}.json"));
    match std::fs::write(&path, &bytes) {
        Ok(()) => debug!("wrote archive {}", path.display()),
        Err(e) => error!("failed to write archive {}: {e}", path.display()),
    }
    Ok(())
}
