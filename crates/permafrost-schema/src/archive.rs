//! The archive document: one JSON object holding fingerprint-keyed maps of
//! descriptions, one map per object kind.

use std::collections::BTreeMap;

use permafrost_core::Fingerprint;
use serde::{Deserialize, Serialize};

use crate::create_info::{
    ComputePipelineCreateInfo, DescriptorSetLayoutCreateInfo, GraphicsPipelineCreateInfo,
    PipelineLayoutCreateInfo, RenderPassCreateInfo, SamplerCreateInfo, ShaderModuleCreateInfo,
};

/// Current archive format version. Parsing rejects any other value.
pub const FORMAT_VERSION: u32 = 1;

/// A serialized state archive. Map keys are 16-digit uppercase hex
/// fingerprints; handle-typed fields inside the descriptions are referent
/// fingerprints in the same encoding. Kinds with no entries are omitted from
/// the document and parse back as empty maps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateArchive {
    pub version: u32,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub samplers: BTreeMap<Fingerprint, SamplerCreateInfo>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub set_layouts: BTreeMap<Fingerprint, DescriptorSetLayoutCreateInfo>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub pipeline_layouts: BTreeMap<Fingerprint, PipelineLayoutCreateInfo>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub shader_modules: BTreeMap<Fingerprint, ShaderModuleCreateInfo>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub render_passes: BTreeMap<Fingerprint, RenderPassCreateInfo>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub compute_pipelines: BTreeMap<Fingerprint, ComputePipelineCreateInfo>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub graphics_pipelines: BTreeMap<Fingerprint, GraphicsPipelineCreateInfo>,
}

impl StateArchive {
    pub fn new() -> Self {
        Self {
            version: FORMAT_VERSION,
            samplers: BTreeMap::new(),
            set_layouts: BTreeMap::new(),
            pipeline_layouts: BTreeMap::new(),
            shader_modules: BTreeMap::new(),
            render_passes: BTreeMap::new(),
            compute_pipelines: BTreeMap::new(),
            graphics_pipelines: BTreeMap::new(),
        }
    }

    /// Total number of descriptions across all kinds.
    pub fn len(&self) -> usize {
        self.samplers.len()
            + self.set_layouts.len()
            + self.pipeline_layouts.len()
            + self.shader_modules.len()
            + self.render_passes.len()
            + self.compute_pipelines.len()
            + self.graphics_pipelines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fold another archive's entries into this one. Existing entries win;
    /// colliding fingerprints refer to identical content by construction.
    pub fn merge(&mut self, other: StateArchive) {
        for (hash, info) in other.samplers {
            self.samplers.entry(hash).or_insert(info);
        }
        for (hash, info) in other.set_layouts {
            self.set_layouts.entry(hash).or_insert(info);
        }
        for (hash, info) in other.pipeline_layouts {
            self.pipeline_layouts.entry(hash).or_insert(info);
        }
        for (hash, info) in other.shader_modules {
            self.shader_modules.entry(hash).or_insert(info);
        }
        for (hash, info) in other.render_passes {
            self.render_passes.entry(hash).or_insert(info);
        }
        for (hash, info) in other.compute_pipelines {
            self.compute_pipelines.entry(hash).or_insert(info);
        }
        for (hash, info) in other.graphics_pipelines {
            self.graphics_pipelines.entry(hash).or_insert(info);
        }
    }
}

impl Default for StateArchive {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::create_info::SamplerCreateInfo;

    #[test]
    fn empty_kinds_are_omitted() {
        let archive = StateArchive::new();
        let json = serde_json::to_value(&archive).unwrap();
        assert_eq!(json["version"], 1);
        assert!(json.get("samplers").is_none());
        assert!(json.get("graphicsPipelines").is_none());
    }

    #[test]
    fn fingerprint_keys_round_trip() {
        let mut archive = StateArchive::new();
        archive.samplers.insert(
            Fingerprint::new(0xDEAD_BEEF),
            SamplerCreateInfo {
                max_lod: 1000.0,
                ..Default::default()
            },
        );
        let bytes = serde_json::to_vec(&archive).unwrap();
        let text = String::from_utf8(bytes.clone()).unwrap();
        assert!(text.contains("\"00000000DEADBEEF\""));

        let back: StateArchive = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(back, archive);
    }

    #[test]
    fn absent_kind_parses_as_empty_map() {
        let doc: StateArchive = serde_json::from_str(r#"{"version":1}"#).unwrap();
        assert!(doc.samplers.is_empty());
        assert!(doc.is_empty());
    }

    #[test]
    fn merge_keeps_first_writer() {
        let mut a = StateArchive::new();
        a.samplers.insert(
            Fingerprint::new(1),
            SamplerCreateInfo {
                max_lod: 1.0,
                ..Default::default()
            },
        );
        let mut b = StateArchive::new();
        b.samplers.insert(
            Fingerprint::new(1),
            SamplerCreateInfo {
                max_lod: 2.0,
                ..Default::default()
            },
        );
        b.samplers.insert(Fingerprint::new(2), SamplerCreateInfo::default());

        a.merge(b);
        assert_eq!(a.samplers.len(), 2);
        assert_eq!(a.samplers[&Fingerprint::new(1)].max_lod, 1.0);
    }
}
