//! Handle remapping: rewrites a frozen description's application-space
//! handles into archive space, i.e. each referent's fingerprint encoded as a
//! handle-shaped value. Runs on the worker, once per first-seen fingerprint,
//! before the description is stored. Null handles stay null. Kinds without
//! referents (sampler, shader module, render pass) need no remapping.

use permafrost_schema::consts;
use permafrost_schema::{
    ComputePipelineCreateInfo, DescriptorSetLayoutCreateInfo, GraphicsPipelineCreateInfo,
    PipelineLayoutCreateInfo,
};

use crate::error::RecordError;
use crate::index::ObjectIndex;

pub(crate) fn remap_descriptor_set_layout(
    index: &ObjectIndex,
    info: &mut DescriptorSetLayoutCreateInfo,
) -> Result<(), RecordError> {
    for binding in &mut info.bindings {
        if !consts::is_sampler_descriptor(binding.descriptor_type) {
            continue;
        }
        let Some(samplers) = binding.immutable_samplers.as_mut() else {
            continue;
        };
        for sampler in samplers {
            if !sampler.is_null() {
                *sampler = index.hash_for_sampler(*sampler)?.as_handle();
            }
        }
    }
    Ok(())
}

pub(crate) fn remap_pipeline_layout(
    index: &ObjectIndex,
    info: &mut PipelineLayoutCreateInfo,
) -> Result<(), RecordError> {
    for layout in &mut info.set_layouts {
        if !layout.is_null() {
            *layout = index.hash_for_descriptor_set_layout(*layout)?.as_handle();
        }
    }
    Ok(())
}

pub(crate) fn remap_graphics_pipeline(
    index: &ObjectIndex,
    info: &mut GraphicsPipelineCreateInfo,
) -> Result<(), RecordError> {
    info.render_pass = index.hash_for_render_pass(info.render_pass)?.as_handle();
    info.layout = index.hash_for_pipeline_layout(info.layout)?.as_handle();
    if !info.base_pipeline_handle.is_null() {
        info.base_pipeline_handle = index
            .hash_for_graphics_pipeline(info.base_pipeline_handle)?
            .as_handle();
    }
    for stage in &mut info.stages {
        stage.module = index.hash_for_shader_module(stage.module)?.as_handle();
    }
    Ok(())
}

pub(crate) fn remap_compute_pipeline(
    index: &ObjectIndex,
    info: &mut ComputePipelineCreateInfo,
) -> Result<(), RecordError> {
    info.stage.module = index.hash_for_shader_module(info.stage.module)?.as_handle();
    if !info.base_pipeline_handle.is_null() {
        info.base_pipeline_handle = index
            .hash_for_compute_pipeline(info.base_pipeline_handle)?
            .as_handle();
    }
    info.layout = index.hash_for_pipeline_layout(info.layout)?.as_handle();
    Ok(())
}
