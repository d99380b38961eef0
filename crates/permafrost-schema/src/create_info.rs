//! Create-info descriptions for the seven recorded object kinds.
//!
//! Field names and enumerated integer values correspond one-for-one with the
//! GPU API's names and numeric constants; serde renames map them onto the
//! archive's camelCase keys. Optional sub-structures are `Option`s and are
//! omitted from the archive when absent.

use permafrost_core::Handle;
use serde::{Deserialize, Serialize};

use crate::payload;

/// Marker for an extension struct chained onto a description by the
/// application. Permafrost does not preserve extension chains; recording a
/// description that carries one fails. The shim populates `struct_type` with
/// the chained struct's type tag so the rejection can name it.
///
/// Never serialized: frozen descriptions are extension-free by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtensionChain {
    pub struct_type: u32,
}

// ── Sampler ─────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SamplerCreateInfo {
    pub flags: u32,
    pub min_filter: i32,
    pub mag_filter: i32,
    pub max_anisotropy: f32,
    pub compare_op: i32,
    pub anisotropy_enable: bool,
    pub mipmap_mode: i32,
    pub address_mode_u: i32,
    pub address_mode_v: i32,
    pub address_mode_w: i32,
    pub border_color: i32,
    pub unnormalized_coordinates: bool,
    pub compare_enable: bool,
    pub mip_lod_bias: f32,
    pub min_lod: f32,
    pub max_lod: f32,
    #[serde(skip)]
    pub next: Option<ExtensionChain>,
}

// ── Descriptor set layout ───────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DescriptorSetLayoutBinding {
    pub descriptor_type: i32,
    pub descriptor_count: u32,
    pub stage_flags: u32,
    pub binding: u32,
    /// Sampler handles baked into the layout. Only meaningful for
    /// sampler-bearing descriptor types.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub immutable_samplers: Option<Vec<Handle>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DescriptorSetLayoutCreateInfo {
    pub flags: u32,
    #[serde(default)]
    pub bindings: Vec<DescriptorSetLayoutBinding>,
    #[serde(skip)]
    pub next: Option<ExtensionChain>,
}

// ── Pipeline layout ─────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushConstantRange {
    pub stage_flags: u32,
    pub size: u32,
    pub offset: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineLayoutCreateInfo {
    pub flags: u32,
    #[serde(default)]
    pub push_constant_ranges: Vec<PushConstantRange>,
    #[serde(default)]
    pub set_layouts: Vec<Handle>,
    #[serde(skip)]
    pub next: Option<ExtensionChain>,
}

// ── Shader module ───────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShaderModuleCreateInfo {
    pub flags: u32,
    /// Size of `code` in bytes. Callers supply word-aligned bytecode, so this
    /// is always a multiple of 4.
    pub code_size: u64,
    #[serde(with = "payload")]
    pub code: Vec<u8>,
    #[serde(skip)]
    pub next: Option<ExtensionChain>,
}

// ── Render pass ─────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentDescription {
    pub flags: u32,
    pub format: i32,
    pub final_layout: i32,
    pub initial_layout: i32,
    pub load_op: i32,
    pub store_op: i32,
    pub samples: u32,
    pub stencil_load_op: i32,
    pub stencil_store_op: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubpassDependency {
    pub dependency_flags: u32,
    pub dst_access_mask: u32,
    pub src_access_mask: u32,
    pub dst_stage_mask: u32,
    pub src_stage_mask: u32,
    pub dst_subpass: u32,
    pub src_subpass: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentReference {
    pub attachment: u32,
    pub layout: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubpassDescription {
    pub flags: u32,
    pub pipeline_bind_point: i32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub preserve_attachments: Vec<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub input_attachments: Vec<AttachmentReference>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub color_attachments: Vec<AttachmentReference>,
    /// When present, parallel to `color_attachments`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resolve_attachments: Vec<AttachmentReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth_stencil_attachment: Option<AttachmentReference>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderPassCreateInfo {
    pub flags: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<SubpassDependency>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<AttachmentDescription>,
    #[serde(default)]
    pub subpasses: Vec<SubpassDescription>,
    #[serde(skip)]
    pub next: Option<ExtensionChain>,
}

// ── Shader stages & specialization ──────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecializationMapEntry {
    pub offset: u32,
    pub size: u64,
    #[serde(rename = "constantID")]
    pub constant_id: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecializationInfo {
    pub data_size: u64,
    #[serde(with = "payload")]
    pub data: Vec<u8>,
    #[serde(default)]
    pub map_entries: Vec<SpecializationMapEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineShaderStageCreateInfo {
    pub flags: u32,
    /// Entry point name.
    pub name: String,
    pub module: Handle,
    pub stage: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specialization_info: Option<SpecializationInfo>,
    #[serde(skip)]
    pub next: Option<ExtensionChain>,
}

// ── Graphics pipeline sub-states ────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VertexInputAttributeDescription {
    pub location: u32,
    pub binding: u32,
    pub offset: u32,
    pub format: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VertexInputBindingDescription {
    pub binding: u32,
    pub stride: u32,
    pub input_rate: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineVertexInputStateCreateInfo {
    pub flags: u32,
    #[serde(default)]
    pub attributes: Vec<VertexInputAttributeDescription>,
    #[serde(default)]
    pub bindings: Vec<VertexInputBindingDescription>,
    #[serde(skip)]
    pub next: Option<ExtensionChain>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineInputAssemblyStateCreateInfo {
    pub flags: u32,
    pub topology: i32,
    pub primitive_restart_enable: bool,
    #[serde(skip)]
    pub next: Option<ExtensionChain>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineTessellationStateCreateInfo {
    pub flags: u32,
    pub patch_control_points: u32,
    #[serde(skip)]
    pub next: Option<ExtensionChain>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rect2D {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineViewportStateCreateInfo {
    pub flags: u32,
    /// Declared counts. The arrays below may be empty when the corresponding
    /// state is dynamic, so the counts are carried separately.
    pub viewport_count: u32,
    pub scissor_count: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub viewports: Vec<Viewport>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scissors: Vec<Rect2D>,
    #[serde(skip)]
    pub next: Option<ExtensionChain>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineRasterizationStateCreateInfo {
    pub flags: u32,
    pub depth_bias_constant_factor: f32,
    pub depth_bias_slope_factor: f32,
    pub depth_bias_clamp: f32,
    pub depth_bias_enable: bool,
    pub depth_clamp_enable: bool,
    pub polygon_mode: i32,
    pub rasterizer_discard_enable: bool,
    pub front_face: i32,
    pub line_width: f32,
    pub cull_mode: u32,
    #[serde(skip)]
    pub next: Option<ExtensionChain>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineMultisampleStateCreateInfo {
    pub flags: u32,
    pub rasterization_samples: u32,
    pub sample_shading_enable: bool,
    pub min_sample_shading: f32,
    pub alpha_to_one_enable: bool,
    pub alpha_to_coverage_enable: bool,
    /// ⌈rasterization_samples / 32⌉ words when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_mask: Option<Vec<u32>>,
    #[serde(skip)]
    pub next: Option<ExtensionChain>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StencilOpState {
    pub compare_op: i32,
    pub write_mask: u32,
    pub reference: u32,
    pub compare_mask: u32,
    pub pass_op: i32,
    pub fail_op: i32,
    pub depth_fail_op: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineDepthStencilStateCreateInfo {
    pub flags: u32,
    pub stencil_test_enable: bool,
    pub max_depth_bounds: f32,
    pub min_depth_bounds: f32,
    pub depth_bounds_test_enable: bool,
    pub depth_write_enable: bool,
    pub depth_test_enable: bool,
    pub depth_compare_op: i32,
    pub front: StencilOpState,
    pub back: StencilOpState,
    #[serde(skip)]
    pub next: Option<ExtensionChain>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineColorBlendAttachmentState {
    pub dst_alpha_blend_factor: i32,
    pub src_alpha_blend_factor: i32,
    pub dst_color_blend_factor: i32,
    pub src_color_blend_factor: i32,
    pub color_write_mask: u32,
    pub alpha_blend_op: i32,
    pub color_blend_op: i32,
    pub blend_enable: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineColorBlendStateCreateInfo {
    pub flags: u32,
    pub logic_op: i32,
    pub logic_op_enable: bool,
    pub blend_constants: [f32; 4],
    #[serde(default)]
    pub attachments: Vec<PipelineColorBlendAttachmentState>,
    #[serde(skip)]
    pub next: Option<ExtensionChain>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineDynamicStateCreateInfo {
    pub flags: u32,
    #[serde(rename = "dynamicState", default)]
    pub dynamic_states: Vec<u32>,
    #[serde(skip)]
    pub next: Option<ExtensionChain>,
}

// ── Pipelines ───────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphicsPipelineCreateInfo {
    pub flags: u32,
    pub base_pipeline_handle: Handle,
    pub base_pipeline_index: i32,
    pub layout: Handle,
    pub render_pass: Handle,
    pub subpass: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tessellation_state: Option<PipelineTessellationStateCreateInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dynamic_state: Option<PipelineDynamicStateCreateInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multisample_state: Option<PipelineMultisampleStateCreateInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vertex_input_state: Option<PipelineVertexInputStateCreateInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rasterization_state: Option<PipelineRasterizationStateCreateInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_assembly_state: Option<PipelineInputAssemblyStateCreateInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_blend_state: Option<PipelineColorBlendStateCreateInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewport_state: Option<PipelineViewportStateCreateInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth_stencil_state: Option<PipelineDepthStencilStateCreateInfo>,
    #[serde(default)]
    pub stages: Vec<PipelineShaderStageCreateInfo>,
    #[serde(skip)]
    pub next: Option<ExtensionChain>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputePipelineCreateInfo {
    pub flags: u32,
    pub layout: Handle,
    pub base_pipeline_handle: Handle,
    pub base_pipeline_index: i32,
    pub stage: PipelineShaderStageCreateInfo,
    #[serde(skip)]
    pub next: Option<ExtensionChain>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sampler_serializes_to_camel_case_keys() {
        let sampler = SamplerCreateInfo {
            max_lod: 1000.0,
            ..Default::default()
        };
        let json = serde_json::to_value(&sampler).unwrap();
        assert_eq!(json["maxLod"], 1000.0);
        assert_eq!(json["addressModeU"], 0);
        assert!(json.get("next").is_none());
    }

    #[test]
    fn shader_module_code_round_trips_through_base64() {
        let code: Vec<u8> = (0..=255).cycle().take(4000).map(|b| b as u8).collect();
        let module = ShaderModuleCreateInfo {
            flags: 0,
            code_size: code.len() as u64,
            code: code.clone(),
            next: None,
        };
        let json = serde_json::to_string(&module).unwrap();
        let back: ShaderModuleCreateInfo = serde_json::from_str(&json).unwrap();
        assert_eq!(back.code, code);
        assert_eq!(back.code_size, 4000);
    }

    #[test]
    fn dynamic_state_uses_singular_archive_key() {
        let dynamic = PipelineDynamicStateCreateInfo {
            flags: 0,
            dynamic_states: vec![1, 2],
            next: None,
        };
        let json = serde_json::to_value(&dynamic).unwrap();
        assert_eq!(json["dynamicState"], serde_json::json!([1, 2]));
    }

    #[test]
    fn spec_map_entry_constant_id_key() {
        let entry = SpecializationMapEntry {
            offset: 4,
            size: 8,
            constant_id: 2,
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["constantID"], 2);
    }

    #[test]
    fn absent_sub_states_parse_as_none() {
        let json = r#"{
            "flags": 0,
            "basePipelineHandle": "0000000000000000",
            "basePipelineIndex": 0,
            "layout": "00000000000000AA",
            "renderPass": "00000000000000BB",
            "subpass": 0,
            "stages": []
        }"#;
        let pipe: GraphicsPipelineCreateInfo = serde_json::from_str(json).unwrap();
        assert!(pipe.depth_stencil_state.is_none());
        assert!(pipe.base_pipeline_handle.is_null());
        assert_eq!(pipe.layout.raw(), 0xAA);
    }

    #[test]
    fn immutable_samplers_omitted_when_absent() {
        let binding = DescriptorSetLayoutBinding {
            descriptor_type: 6,
            descriptor_count: 1,
            stage_flags: 0x20,
            binding: 0,
            immutable_samplers: None,
        };
        let json = serde_json::to_value(&binding).unwrap();
        assert!(json.get("immutableSamplers").is_none());
    }
}
