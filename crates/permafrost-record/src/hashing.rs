//! Canonical fingerprint computation, one function per object kind.
//!
//! Field order is fixed and load-bearing: two implementations of this module
//! must agree bit-exactly for archives to be shareable. Handles are resolved
//! to the referent's fingerprint through the object index and fed as 64-bit
//! words; a null handle feeds a single 0 word. Optional sub-states feed a
//! single 0 word when absent. Fields covered by a dynamic-state declaration
//! are skipped so that pipelines differing only in baked-but-dynamic values
//! fingerprint identically.

use permafrost_core::{Fingerprint, Hasher};
use permafrost_schema::consts;
use permafrost_schema::{
    ComputePipelineCreateInfo, DescriptorSetLayoutCreateInfo, GraphicsPipelineCreateInfo,
    PipelineDynamicStateCreateInfo, PipelineLayoutCreateInfo, RenderPassCreateInfo,
    SamplerCreateInfo, ShaderModuleCreateInfo, SpecializationInfo, SubpassDescription,
};

use crate::error::RecordError;
use crate::index::ObjectIndex;

pub(crate) fn compute_hash_sampler(info: &SamplerCreateInfo) -> Fingerprint {
    let mut h = Hasher::new();

    h.u32(info.flags);
    h.f32(info.max_anisotropy);
    h.f32(info.mip_lod_bias);
    h.f32(info.min_lod);
    h.f32(info.max_lod);
    h.i32(info.min_filter);
    h.i32(info.mag_filter);
    h.i32(info.mipmap_mode);
    h.b32(info.compare_enable);
    h.i32(info.compare_op);
    h.b32(info.anisotropy_enable);
    h.i32(info.address_mode_u);
    h.i32(info.address_mode_v);
    h.i32(info.address_mode_w);
    h.i32(info.border_color);
    h.b32(info.unnormalized_coordinates);

    Fingerprint::new(h.finish())
}

pub(crate) fn compute_hash_descriptor_set_layout(
    index: &ObjectIndex,
    info: &DescriptorSetLayoutCreateInfo,
) -> Result<Fingerprint, RecordError> {
    let mut h = Hasher::new();

    h.u32(info.bindings.len() as u32);
    h.u32(info.flags);
    for binding in &info.bindings {
        h.u32(binding.binding);
        h.u32(binding.descriptor_count);
        h.i32(binding.descriptor_type);
        h.u32(binding.stage_flags);

        if let Some(samplers) = &binding.immutable_samplers {
            if consts::is_sampler_descriptor(binding.descriptor_type) {
                for &sampler in samplers {
                    h.u64(index.hash_for_sampler(sampler)?.raw());
                }
            }
        }
    }

    Ok(Fingerprint::new(h.finish()))
}

pub(crate) fn compute_hash_pipeline_layout(
    index: &ObjectIndex,
    info: &PipelineLayoutCreateInfo,
) -> Result<Fingerprint, RecordError> {
    let mut h = Hasher::new();

    h.u32(info.set_layouts.len() as u32);
    for &layout in &info.set_layouts {
        if layout.is_null() {
            h.u32(0);
        } else {
            h.u64(index.hash_for_descriptor_set_layout(layout)?.raw());
        }
    }

    h.u32(info.push_constant_ranges.len() as u32);
    for range in &info.push_constant_ranges {
        h.u32(range.stage_flags);
        h.u32(range.size);
        h.u32(range.offset);
    }

    h.u32(info.flags);

    Ok(Fingerprint::new(h.finish()))
}

pub(crate) fn compute_hash_shader_module(info: &ShaderModuleCreateInfo) -> Fingerprint {
    let mut h = Hasher::new();
    h.words(&info.code);
    h.u32(info.flags);
    Fingerprint::new(h.finish())
}

fn hash_specialization_info(h: &mut Hasher, spec: &SpecializationInfo) {
    h.data(&spec.data);
    h.u64(spec.data_size);
    h.u32(spec.map_entries.len() as u32);
    for entry in &spec.map_entries {
        h.u32(entry.offset);
        h.u64(entry.size);
        h.u32(entry.constant_id);
    }
}

fn hash_subpass(h: &mut Hasher, subpass: &SubpassDescription) {
    h.u32(subpass.flags);
    h.u32(subpass.color_attachments.len() as u32);
    h.u32(subpass.input_attachments.len() as u32);
    h.u32(subpass.preserve_attachments.len() as u32);
    h.i32(subpass.pipeline_bind_point);

    for &preserve in &subpass.preserve_attachments {
        h.u32(preserve);
    }
    for color in &subpass.color_attachments {
        h.u32(color.attachment);
        h.i32(color.layout);
    }
    for input in &subpass.input_attachments {
        h.u32(input.attachment);
        h.i32(input.layout);
    }
    if !subpass.resolve_attachments.is_empty() {
        for resolve in &subpass.resolve_attachments {
            h.u32(resolve.attachment);
            h.i32(resolve.layout);
        }
    }
    match &subpass.depth_stencil_attachment {
        Some(depth_stencil) => {
            h.u32(depth_stencil.attachment);
            h.i32(depth_stencil.layout);
        }
        None => h.u32(0),
    }
}

pub(crate) fn compute_hash_render_pass(info: &RenderPassCreateInfo) -> Fingerprint {
    let mut h = Hasher::new();

    h.u32(info.attachments.len() as u32);
    h.u32(info.dependencies.len() as u32);
    h.u32(info.subpasses.len() as u32);

    for att in &info.attachments {
        h.u32(att.flags);
        h.i32(att.initial_layout);
        h.i32(att.final_layout);
        h.i32(att.format);
        h.i32(att.load_op);
        h.i32(att.store_op);
        h.i32(att.stencil_load_op);
        h.i32(att.stencil_store_op);
        h.u32(att.samples);
    }

    for dep in &info.dependencies {
        h.u32(dep.dependency_flags);
        h.u32(dep.dst_access_mask);
        h.u32(dep.src_access_mask);
        h.u32(dep.src_subpass);
        h.u32(dep.dst_subpass);
        h.u32(dep.src_stage_mask);
        h.u32(dep.dst_stage_mask);
    }

    for subpass in &info.subpasses {
        hash_subpass(&mut h, subpass);
    }

    Fingerprint::new(h.finish())
}

/// Which pipeline fields are declared dynamic and therefore elided.
#[derive(Default)]
struct DynamicCoverage {
    stencil_compare: bool,
    stencil_reference: bool,
    stencil_write_mask: bool,
    depth_bounds: bool,
    depth_bias: bool,
    line_width: bool,
    blend_constants: bool,
    scissor: bool,
    viewport: bool,
}

/// Hash the dynamic-state block and collect the coverage flags used to elide
/// baked values further down.
fn hash_dynamic_state(
    h: &mut Hasher,
    state: Option<&PipelineDynamicStateCreateInfo>,
) -> DynamicCoverage {
    let mut coverage = DynamicCoverage::default();
    match state {
        Some(dynamic) => {
            h.u32(dynamic.dynamic_states.len() as u32);
            h.u32(dynamic.flags);
            for &value in &dynamic.dynamic_states {
                h.u32(value);
                match value {
                    consts::DYNAMIC_STATE_DEPTH_BIAS => coverage.depth_bias = true,
                    consts::DYNAMIC_STATE_DEPTH_BOUNDS => coverage.depth_bounds = true,
                    consts::DYNAMIC_STATE_STENCIL_WRITE_MASK => coverage.stencil_write_mask = true,
                    consts::DYNAMIC_STATE_STENCIL_REFERENCE => coverage.stencil_reference = true,
                    consts::DYNAMIC_STATE_STENCIL_COMPARE_MASK => coverage.stencil_compare = true,
                    consts::DYNAMIC_STATE_BLEND_CONSTANTS => coverage.blend_constants = true,
                    consts::DYNAMIC_STATE_SCISSOR => coverage.scissor = true,
                    consts::DYNAMIC_STATE_VIEWPORT => coverage.viewport = true,
                    consts::DYNAMIC_STATE_LINE_WIDTH => coverage.line_width = true,
                    _ => {}
                }
            }
        }
        None => h.u32(0),
    }
    coverage
}

pub(crate) fn compute_hash_graphics_pipeline(
    index: &ObjectIndex,
    info: &GraphicsPipelineCreateInfo,
) -> Result<Fingerprint, RecordError> {
    let mut h = Hasher::new();

    h.u32(info.flags);

    // Unlike the compute hash, no placeholder is fed for a null base pipeline.
    if !info.base_pipeline_handle.is_null() {
        h.u64(
            index
                .hash_for_graphics_pipeline(info.base_pipeline_handle)?
                .raw(),
        );
        h.i32(info.base_pipeline_index);
    }

    h.u64(index.hash_for_pipeline_layout(info.layout)?.raw());
    h.u64(index.hash_for_render_pass(info.render_pass)?.raw());
    h.u32(info.subpass);
    h.u32(info.stages.len() as u32);

    let dynamic = hash_dynamic_state(&mut h, info.dynamic_state.as_ref());

    match &info.depth_stencil_state {
        Some(ds) => {
            h.u32(ds.flags);
            h.b32(ds.depth_bounds_test_enable);
            h.i32(ds.depth_compare_op);
            h.b32(ds.depth_test_enable);
            h.b32(ds.depth_write_enable);
            h.i32(ds.front.compare_op);
            h.i32(ds.front.depth_fail_op);
            h.i32(ds.front.fail_op);
            h.i32(ds.front.pass_op);
            h.i32(ds.back.compare_op);
            h.i32(ds.back.depth_fail_op);
            h.i32(ds.back.fail_op);
            h.i32(ds.back.pass_op);
            h.b32(ds.stencil_test_enable);

            if !dynamic.depth_bounds && ds.depth_bounds_test_enable {
                h.f32(ds.min_depth_bounds);
                h.f32(ds.max_depth_bounds);
            }

            if ds.stencil_test_enable {
                if !dynamic.stencil_compare {
                    h.u32(ds.front.compare_mask);
                    h.u32(ds.back.compare_mask);
                }
                if !dynamic.stencil_reference {
                    h.u32(ds.front.reference);
                    h.u32(ds.back.reference);
                }
                if !dynamic.stencil_write_mask {
                    h.u32(ds.front.write_mask);
                    h.u32(ds.back.write_mask);
                }
            }
        }
        None => h.u32(0),
    }

    match &info.input_assembly_state {
        Some(ia) => {
            h.u32(ia.flags);
            h.b32(ia.primitive_restart_enable);
            h.i32(ia.topology);
        }
        None => h.u32(0),
    }

    match &info.rasterization_state {
        Some(rs) => {
            h.u32(rs.flags);
            h.u32(rs.cull_mode);
            h.b32(rs.depth_clamp_enable);
            h.i32(rs.front_face);
            h.b32(rs.rasterizer_discard_enable);
            h.i32(rs.polygon_mode);
            h.b32(rs.depth_bias_enable);

            if rs.depth_bias_enable && !dynamic.depth_bias {
                h.f32(rs.depth_bias_clamp);
                h.f32(rs.depth_bias_slope_factor);
                h.f32(rs.depth_bias_constant_factor);
            }
            if !dynamic.line_width {
                h.f32(rs.line_width);
            }
        }
        None => h.u32(0),
    }

    match &info.multisample_state {
        Some(ms) => {
            h.u32(ms.flags);
            h.b32(ms.alpha_to_coverage_enable);
            h.b32(ms.alpha_to_one_enable);
            h.f32(ms.min_sample_shading);
            h.u32(ms.rasterization_samples);
            h.b32(ms.sample_shading_enable);
            match &ms.sample_mask {
                Some(mask) => {
                    let words = (ms.rasterization_samples as usize + 31) / 32;
                    for i in 0..words {
                        h.u32(mask.get(i).copied().unwrap_or(0));
                    }
                }
                None => h.u32(0),
            }
        }
        None => h.u32(0),
    }

    match &info.viewport_state {
        Some(vp) => {
            h.u32(vp.flags);
            h.u32(vp.scissor_count);
            h.u32(vp.viewport_count);
            if !dynamic.scissor {
                for scissor in &vp.scissors {
                    h.i32(scissor.x);
                    h.i32(scissor.y);
                    h.u32(scissor.width);
                    h.u32(scissor.height);
                }
            }
            if !dynamic.viewport {
                for viewport in &vp.viewports {
                    h.f32(viewport.x);
                    h.f32(viewport.y);
                    h.f32(viewport.width);
                    h.f32(viewport.height);
                    h.f32(viewport.min_depth);
                    h.f32(viewport.max_depth);
                }
            }
        }
        None => h.u32(0),
    }

    match &info.vertex_input_state {
        Some(vi) => {
            h.u32(vi.flags);
            h.u32(vi.attributes.len() as u32);
            h.u32(vi.bindings.len() as u32);

            for attr in &vi.attributes {
                h.u32(attr.offset);
                h.u32(attr.binding);
                h.i32(attr.format);
                h.u32(attr.location);
            }
            for binding in &vi.bindings {
                h.u32(binding.binding);
                h.i32(binding.input_rate);
                h.u32(binding.stride);
            }
        }
        None => h.u32(0),
    }

    match &info.color_blend_state {
        Some(cb) => {
            h.u32(cb.flags);
            h.u32(cb.attachments.len() as u32);
            h.b32(cb.logic_op_enable);
            h.i32(cb.logic_op);

            let mut need_blend_constants = false;
            for att in &cb.attachments {
                h.b32(att.blend_enable);
                if att.blend_enable {
                    h.u32(att.color_write_mask);
                    h.i32(att.alpha_blend_op);
                    h.i32(att.color_blend_op);
                    h.i32(att.dst_alpha_blend_factor);
                    h.i32(att.src_alpha_blend_factor);
                    h.i32(att.dst_color_blend_factor);
                    h.i32(att.src_color_blend_factor);

                    if references_blend_constants(att.dst_alpha_blend_factor)
                        || references_blend_constants(att.src_alpha_blend_factor)
                        || references_blend_constants(att.dst_color_blend_factor)
                        || references_blend_constants(att.src_color_blend_factor)
                    {
                        need_blend_constants = true;
                    }
                } else {
                    h.u32(0);
                }
            }

            if need_blend_constants && !dynamic.blend_constants {
                for &constant in &cb.blend_constants {
                    h.f32(constant);
                }
            }
        }
        None => h.u32(0),
    }

    match &info.tessellation_state {
        Some(tess) => {
            h.u32(tess.flags);
            h.u32(tess.patch_control_points);
        }
        None => h.u32(0),
    }

    for stage in &info.stages {
        h.u32(stage.flags);
        h.string(&stage.name);
        h.u32(stage.stage);
        h.u64(index.hash_for_shader_module(stage.module)?.raw());
        match &stage.specialization_info {
            Some(spec) => hash_specialization_info(&mut h, spec),
            None => h.u32(0),
        }
    }

    Ok(Fingerprint::new(h.finish()))
}

fn references_blend_constants(factor: i32) -> bool {
    factor == consts::BLEND_FACTOR_CONSTANT_COLOR || factor == consts::BLEND_FACTOR_CONSTANT_ALPHA
}

pub(crate) fn compute_hash_compute_pipeline(
    index: &ObjectIndex,
    info: &ComputePipelineCreateInfo,
) -> Result<Fingerprint, RecordError> {
    let mut h = Hasher::new();

    h.u64(index.hash_for_pipeline_layout(info.layout)?.raw());
    h.u32(info.flags);

    // The compute hash feeds a 0 placeholder for a null base pipeline; the
    // graphics hash feeds nothing.
    if !info.base_pipeline_handle.is_null() {
        h.u64(
            index
                .hash_for_compute_pipeline(info.base_pipeline_handle)?
                .raw(),
        );
        h.i32(info.base_pipeline_index);
    } else {
        h.u32(0);
    }

    h.u64(index.hash_for_shader_module(info.stage.module)?.raw());
    h.string(&info.stage.name);
    h.u32(info.stage.flags);
    h.u32(info.stage.stage);

    match &info.stage.specialization_info {
        Some(spec) => hash_specialization_info(&mut h, spec),
        None => h.u32(0),
    }

    Ok(Fingerprint::new(h.finish()))
}
