//! Per-kind bidirectional object index.
//!
//! For every kind the recorder keeps two maps: application handle to
//! fingerprint (populated whenever that handle is recorded, last write wins)
//! and fingerprint to frozen description (first writer wins, never
//! overwritten). Both sides are concurrent maps; only the worker thread
//! mutates them, the application side reads fingerprints after a quiescence
//! point.

use std::sync::Arc;

use dashmap::DashMap;
use permafrost_core::{Fingerprint, Handle, ObjectKind};
use permafrost_schema::{
    ComputePipelineCreateInfo, DescriptorSetLayoutCreateInfo, GraphicsPipelineCreateInfo,
    PipelineLayoutCreateInfo, RenderPassCreateInfo, SamplerCreateInfo, ShaderModuleCreateInfo,
};

use crate::error::RecordError;

pub(crate) struct ObjectIndex {
    pub sampler_hashes: DashMap<Handle, Fingerprint>,
    pub set_layout_hashes: DashMap<Handle, Fingerprint>,
    pub pipeline_layout_hashes: DashMap<Handle, Fingerprint>,
    pub shader_module_hashes: DashMap<Handle, Fingerprint>,
    pub render_pass_hashes: DashMap<Handle, Fingerprint>,
    pub compute_pipeline_hashes: DashMap<Handle, Fingerprint>,
    pub graphics_pipeline_hashes: DashMap<Handle, Fingerprint>,

    pub samplers: DashMap<Fingerprint, Arc<SamplerCreateInfo>>,
    pub set_layouts: DashMap<Fingerprint, Arc<DescriptorSetLayoutCreateInfo>>,
    pub pipeline_layouts: DashMap<Fingerprint, Arc<PipelineLayoutCreateInfo>>,
    pub shader_modules: DashMap<Fingerprint, Arc<ShaderModuleCreateInfo>>,
    pub render_passes: DashMap<Fingerprint, Arc<RenderPassCreateInfo>>,
    pub compute_pipelines: DashMap<Fingerprint, Arc<ComputePipelineCreateInfo>>,
    pub graphics_pipelines: DashMap<Fingerprint, Arc<GraphicsPipelineCreateInfo>>,
}

macro_rules! hash_accessor {
    ($name:ident, $map:ident, $kind:expr) => {
        pub fn $name(&self, handle: Handle) -> Result<Fingerprint, RecordError> {
            self.$map
                .get(&handle)
                .map(|entry| *entry)
                .ok_or(RecordError::NotRegistered {
                    kind: $kind,
                    handle,
                })
        }
    };
}

impl ObjectIndex {
    pub fn new() -> Self {
        Self {
            sampler_hashes: DashMap::new(),
            set_layout_hashes: DashMap::new(),
            pipeline_layout_hashes: DashMap::new(),
            shader_module_hashes: DashMap::new(),
            render_pass_hashes: DashMap::new(),
            compute_pipeline_hashes: DashMap::new(),
            graphics_pipeline_hashes: DashMap::new(),
            samplers: DashMap::new(),
            set_layouts: DashMap::new(),
            pipeline_layouts: DashMap::new(),
            shader_modules: DashMap::new(),
            render_passes: DashMap::new(),
            compute_pipelines: DashMap::new(),
            graphics_pipelines: DashMap::new(),
        }
    }

    hash_accessor!(hash_for_sampler, sampler_hashes, ObjectKind::Sampler);
    hash_accessor!(
        hash_for_descriptor_set_layout,
        set_layout_hashes,
        ObjectKind::DescriptorSetLayout
    );
    hash_accessor!(
        hash_for_pipeline_layout,
        pipeline_layout_hashes,
        ObjectKind::PipelineLayout
    );
    hash_accessor!(
        hash_for_shader_module,
        shader_module_hashes,
        ObjectKind::ShaderModule
    );
    hash_accessor!(hash_for_render_pass, render_pass_hashes, ObjectKind::RenderPass);
    hash_accessor!(
        hash_for_compute_pipeline,
        compute_pipeline_hashes,
        ObjectKind::ComputePipeline
    );
    hash_accessor!(
        hash_for_graphics_pipeline,
        graphics_pipeline_hashes,
        ObjectKind::GraphicsPipeline
    );
}
