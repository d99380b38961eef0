//! Archive assembly from the recorder's frozen state.
//!
//! A per-pipeline archive carries only the transitive closure needed to
//! re-create that one pipeline: the pipeline itself, its pipeline layout, the
//! layout's descriptor set layouts, their immutable samplers, and (graphics
//! only) its render pass. Shader modules are deliberately absent; they live
//! in their own single-object archives and are fetched through the resolver
//! at replay.

use permafrost_core::Fingerprint;
use permafrost_schema::{consts, StateArchive};

use crate::index::ObjectIndex;

pub(crate) fn full_archive(index: &ObjectIndex) -> StateArchive {
    let mut archive = StateArchive::new();
    for entry in index.samplers.iter() {
        archive.samplers.insert(*entry.key(), entry.value().as_ref().clone());
    }
    for entry in index.set_layouts.iter() {
        archive.set_layouts.insert(*entry.key(), entry.value().as_ref().clone());
    }
    for entry in index.pipeline_layouts.iter() {
        archive
            .pipeline_layouts
            .insert(*entry.key(), entry.value().as_ref().clone());
    }
    for entry in index.shader_modules.iter() {
        archive
            .shader_modules
            .insert(*entry.key(), entry.value().as_ref().clone());
    }
    for entry in index.render_passes.iter() {
        archive
            .render_passes
            .insert(*entry.key(), entry.value().as_ref().clone());
    }
    for entry in index.compute_pipelines.iter() {
        archive
            .compute_pipelines
            .insert(*entry.key(), entry.value().as_ref().clone());
    }
    for entry in index.graphics_pipelines.iter() {
        archive
            .graphics_pipelines
            .insert(*entry.key(), entry.value().as_ref().clone());
    }
    archive
}

pub(crate) fn shader_module_archive(index: &ObjectIndex, hash: Fingerprint) -> StateArchive {
    let mut archive = StateArchive::new();
    if let Some(info) = index.shader_modules.get(&hash) {
        archive.shader_modules.insert(hash, info.value().as_ref().clone());
    }
    archive
}

pub(crate) fn compute_pipeline_archive(index: &ObjectIndex, hash: Fingerprint) -> StateArchive {
    let mut archive = StateArchive::new();
    let Some(pipe) = index.compute_pipelines.get(&hash) else {
        return archive;
    };
    let pipe = pipe.value().as_ref().clone();
    collect_layout_closure(index, pipe.layout.as_fingerprint(), &mut archive);
    archive.compute_pipelines.insert(hash, pipe);
    archive
}

pub(crate) fn graphics_pipeline_archive(index: &ObjectIndex, hash: Fingerprint) -> StateArchive {
    let mut archive = StateArchive::new();
    let Some(pipe) = index.graphics_pipelines.get(&hash) else {
        return archive;
    };
    let pipe = pipe.value().as_ref().clone();
    collect_layout_closure(index, pipe.layout.as_fingerprint(), &mut archive);
    let render_pass_hash = pipe.render_pass.as_fingerprint();
    if let Some(render_pass) = index.render_passes.get(&render_pass_hash) {
        archive
            .render_passes
            .insert(render_pass_hash, render_pass.value().as_ref().clone());
    }
    archive.graphics_pipelines.insert(hash, pipe);
    archive
}

/// Pull a pipeline layout, its set layouts, and their immutable samplers into
/// the archive. Handles in frozen descriptions are archive-space, so each is
/// reinterpreted as the fingerprint it encodes.
fn collect_layout_closure(index: &ObjectIndex, layout_hash: Fingerprint, archive: &mut StateArchive) {
    let Some(layout) = index.pipeline_layouts.get(&layout_hash) else {
        return;
    };
    let layout = layout.value().as_ref().clone();

    for &set_layout_handle in &layout.set_layouts {
        if set_layout_handle.is_null() {
            continue;
        }
        let set_layout_hash = set_layout_handle.as_fingerprint();
        let Some(set_layout) = index.set_layouts.get(&set_layout_hash) else {
            continue;
        };
        let set_layout = set_layout.value().as_ref().clone();

        for binding in &set_layout.bindings {
            if !consts::is_sampler_descriptor(binding.descriptor_type) {
                continue;
            }
            let Some(samplers) = &binding.immutable_samplers else {
                continue;
            };
            for &sampler_handle in samplers {
                if sampler_handle.is_null() {
                    continue;
                }
                let sampler_hash = sampler_handle.as_fingerprint();
                if let Some(sampler) = index.samplers.get(&sampler_hash) {
                    archive
                        .samplers
                        .entry(sampler_hash)
                        .or_insert_with(|| sampler.value().as_ref().clone());
                }
            }
        }

        archive.set_layouts.entry(set_layout_hash).or_insert(set_layout);
    }

    archive.pipeline_layouts.entry(layout_hash).or_insert(layout);
}
