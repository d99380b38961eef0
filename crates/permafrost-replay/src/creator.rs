//! The capability the replayer drives object creation through.

use std::sync::Arc;

use permafrost_core::{Fingerprint, Handle};
use permafrost_schema::{
    ComputePipelineCreateInfo, DescriptorSetLayoutCreateInfo, GraphicsPipelineCreateInfo,
    PipelineLayoutCreateInfo, RenderPassCreateInfo, SamplerCreateInfo, ShaderModuleCreateInfo,
};

/// Consumes replayed descriptions and produces driver handles.
///
/// `enqueue_create_*` may complete creation asynchronously; the returned
/// handle only has to be usable after the next [`wait_enqueue`] returns, at
/// which point every previously enqueued creation must have completed.
/// Returning `None` aborts the parse with
/// [`ReplayError::CreateFailed`](crate::ReplayError::CreateFailed).
///
/// Before a kind's entries are enqueued, `set_num_*` announces how many that
/// archive holds (0 when the kind is absent). Descriptions arrive as `Arc`s
/// retained by the replayer for its own lifetime, so an asynchronous creator
/// can hold onto them past the call.
///
/// [`wait_enqueue`]: StateCreator::wait_enqueue
pub trait StateCreator {
    fn set_num_samplers(&mut self, count: usize) {
        let _ = count;
    }
    fn set_num_descriptor_set_layouts(&mut self, count: usize) {
        let _ = count;
    }
    fn set_num_pipeline_layouts(&mut self, count: usize) {
        let _ = count;
    }
    fn set_num_shader_modules(&mut self, count: usize) {
        let _ = count;
    }
    fn set_num_render_passes(&mut self, count: usize) {
        let _ = count;
    }
    fn set_num_compute_pipelines(&mut self, count: usize) {
        let _ = count;
    }
    fn set_num_graphics_pipelines(&mut self, count: usize) {
        let _ = count;
    }

    fn enqueue_create_sampler(
        &mut self,
        hash: Fingerprint,
        info: Arc<SamplerCreateInfo>,
    ) -> Option<Handle>;

    fn enqueue_create_descriptor_set_layout(
        &mut self,
        hash: Fingerprint,
        info: Arc<DescriptorSetLayoutCreateInfo>,
    ) -> Option<Handle>;

    fn enqueue_create_pipeline_layout(
        &mut self,
        hash: Fingerprint,
        info: Arc<PipelineLayoutCreateInfo>,
    ) -> Option<Handle>;

    fn enqueue_create_shader_module(
        &mut self,
        hash: Fingerprint,
        info: Arc<ShaderModuleCreateInfo>,
    ) -> Option<Handle>;

    fn enqueue_create_render_pass(
        &mut self,
        hash: Fingerprint,
        info: Arc<RenderPassCreateInfo>,
    ) -> Option<Handle>;

    fn enqueue_create_compute_pipeline(
        &mut self,
        hash: Fingerprint,
        info: Arc<ComputePipelineCreateInfo>,
    ) -> Option<Handle>;

    fn enqueue_create_graphics_pipeline(
        &mut self,
        hash: Fingerprint,
        info: Arc<GraphicsPipelineCreateInfo>,
    ) -> Option<Handle>;

    /// Synchronize with the creator: all enqueued creations have completed
    /// when this returns.
    fn wait_enqueue(&mut self) {}
}
