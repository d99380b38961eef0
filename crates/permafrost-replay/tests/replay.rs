//! Integration tests: StateReplayer
//!
//! Round-trips archives produced by a real StateRecorder through the
//! replayer and checks creator call ordering, handle wiring, idempotence,
//! and lazy cross-archive resolution.

use std::collections::HashMap;
use std::sync::Arc;

use permafrost_core::{Fingerprint, Handle, ObjectKind};
use permafrost_record::{RecorderConfig, StateRecorder};
use permafrost_replay::{
    ArchiveResolver, DirectoryResolver, ReplayError, StateCreator, StateReplayer,
};
use permafrost_schema::consts;
use permafrost_schema::*;

// ── test doubles ────────────────────────────────────────────

/// Creator that records every call in order and hands out sequential driver
/// handles.
#[derive(Default)]
struct RecordingCreator {
    next_handle: u64,
    /// `(kind, fingerprint)` in enqueue order.
    events: Vec<(ObjectKind, Fingerprint)>,
    shader_modules: HashMap<Fingerprint, Arc<ShaderModuleCreateInfo>>,
    pipeline_layout_handles: HashMap<Fingerprint, Handle>,
    graphics_pipelines: HashMap<Fingerprint, Arc<GraphicsPipelineCreateInfo>>,
    fail_samplers: bool,
}

impl RecordingCreator {
    fn issue(&mut self, kind: ObjectKind, hash: Fingerprint) -> Handle {
        self.next_handle += 1;
        self.events.push((kind, hash));
        Handle::new(0xD000_0000_0000_0000 + self.next_handle)
    }

    fn calls_for(&self, kind: ObjectKind) -> usize {
        self.events.iter().filter(|(k, _)| *k == kind).count()
    }

    fn position(&self, kind: ObjectKind, hash: Fingerprint) -> usize {
        self.events
            .iter()
            .position(|&(k, h)| k == kind && h == hash)
            .unwrap_or_else(|| panic!("no {kind} creation for {hash}"))
    }
}

impl StateCreator for RecordingCreator {
    fn enqueue_create_sampler(
        &mut self,
        hash: Fingerprint,
        _info: Arc<SamplerCreateInfo>,
    ) -> Option<Handle> {
        if self.fail_samplers {
            return None;
        }
        Some(self.issue(ObjectKind::Sampler, hash))
    }

    fn enqueue_create_descriptor_set_layout(
        &mut self,
        hash: Fingerprint,
        _info: Arc<DescriptorSetLayoutCreateInfo>,
    ) -> Option<Handle> {
        Some(self.issue(ObjectKind::DescriptorSetLayout, hash))
    }

    fn enqueue_create_pipeline_layout(
        &mut self,
        hash: Fingerprint,
        _info: Arc<PipelineLayoutCreateInfo>,
    ) -> Option<Handle> {
        let handle = self.issue(ObjectKind::PipelineLayout, hash);
        self.pipeline_layout_handles.insert(hash, handle);
        Some(handle)
    }

    fn enqueue_create_shader_module(
        &mut self,
        hash: Fingerprint,
        info: Arc<ShaderModuleCreateInfo>,
    ) -> Option<Handle> {
        self.shader_modules.insert(hash, info);
        Some(self.issue(ObjectKind::ShaderModule, hash))
    }

    fn enqueue_create_render_pass(
        &mut self,
        hash: Fingerprint,
        _info: Arc<RenderPassCreateInfo>,
    ) -> Option<Handle> {
        Some(self.issue(ObjectKind::RenderPass, hash))
    }

    fn enqueue_create_compute_pipeline(
        &mut self,
        hash: Fingerprint,
        _info: Arc<ComputePipelineCreateInfo>,
    ) -> Option<Handle> {
        Some(self.issue(ObjectKind::ComputePipeline, hash))
    }

    fn enqueue_create_graphics_pipeline(
        &mut self,
        hash: Fingerprint,
        info: Arc<GraphicsPipelineCreateInfo>,
    ) -> Option<Handle> {
        self.graphics_pipelines.insert(hash, info);
        Some(self.issue(ObjectKind::GraphicsPipeline, hash))
    }
}

/// Resolver backed by an in-memory fingerprint → archive map.
#[derive(Default)]
struct MapResolver {
    archives: HashMap<Fingerprint, Vec<u8>>,
}

impl ArchiveResolver for MapResolver {
    fn resolve(&mut self, hash: Fingerprint) -> Option<Vec<u8>> {
        self.archives.get(&hash).cloned()
    }
}

/// Resolver that always answers with empty bytes ("not found").
struct EmptyResolver;

impl ArchiveResolver for EmptyResolver {
    fn resolve(&mut self, _hash: Fingerprint) -> Option<Vec<u8>> {
        Some(Vec::new())
    }
}

// ── recording fixtures ──────────────────────────────────────

fn shader_code(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 31 + 5) as u8).collect()
}

fn shader_info(code: Vec<u8>) -> ShaderModuleCreateInfo {
    ShaderModuleCreateInfo {
        flags: 0,
        code_size: code.len() as u64,
        code,
        next: None,
    }
}

fn render_pass_info() -> RenderPassCreateInfo {
    RenderPassCreateInfo {
        flags: 0,
        dependencies: Vec::new(),
        attachments: vec![AttachmentDescription {
            format: 37,
            samples: 1,
            ..Default::default()
        }],
        subpasses: vec![SubpassDescription {
            pipeline_bind_point: 0,
            color_attachments: vec![AttachmentReference {
                attachment: 0,
                layout: 2,
            }],
            ..Default::default()
        }],
        next: None,
    }
}

fn stage(module: Handle) -> PipelineShaderStageCreateInfo {
    PipelineShaderStageCreateInfo {
        flags: 0,
        name: "main".to_string(),
        module,
        stage: 0x10,
        specialization_info: None,
        next: None,
    }
}

const SAMPLER: Handle = Handle::new(1);
const SET_LAYOUT: Handle = Handle::new(2);
const LAYOUT: Handle = Handle::new(3);
const MODULE: Handle = Handle::new(4);
const RENDER_PASS: Handle = Handle::new(5);
const PIPELINE_1: Handle = Handle::new(6);
const PIPELINE_2: Handle = Handle::new(7);

/// Record a graphics pipeline chain plus a derived pipeline, then drain the
/// worker. Returns the recorder for serialization and hash queries.
fn recorded_state() -> StateRecorder {
    let mut recorder = StateRecorder::new();
    recorder
        .record_sampler(
            SAMPLER,
            SamplerCreateInfo {
                max_lod: 1000.0,
                ..Default::default()
            },
        )
        .unwrap();
    recorder
        .record_descriptor_set_layout(
            SET_LAYOUT,
            DescriptorSetLayoutCreateInfo {
                flags: 0,
                bindings: vec![DescriptorSetLayoutBinding {
                    descriptor_type: consts::DESCRIPTOR_TYPE_COMBINED_IMAGE_SAMPLER,
                    descriptor_count: 1,
                    stage_flags: 0x10,
                    binding: 0,
                    immutable_samplers: Some(vec![SAMPLER]),
                }],
                next: None,
            },
        )
        .unwrap();
    recorder
        .record_pipeline_layout(
            LAYOUT,
            PipelineLayoutCreateInfo {
                flags: 0,
                push_constant_ranges: Vec::new(),
                set_layouts: vec![SET_LAYOUT],
                next: None,
            },
        )
        .unwrap();
    recorder
        .record_shader_module(MODULE, shader_info(shader_code(4000)))
        .unwrap();
    recorder.record_render_pass(RENDER_PASS, render_pass_info()).unwrap();
    recorder
        .record_graphics_pipeline(
            PIPELINE_1,
            GraphicsPipelineCreateInfo {
                layout: LAYOUT,
                render_pass: RENDER_PASS,
                stages: vec![stage(MODULE)],
                ..Default::default()
            },
        )
        .unwrap();
    recorder
        .record_graphics_pipeline(
            PIPELINE_2,
            GraphicsPipelineCreateInfo {
                flags: 0x4, // derivative
                base_pipeline_handle: PIPELINE_1,
                base_pipeline_index: -1,
                layout: LAYOUT,
                render_pass: RENDER_PASS,
                stages: vec![stage(MODULE)],
                ..Default::default()
            },
        )
        .unwrap();
    recorder.record_end().unwrap();
    recorder
}

// ── tests ───────────────────────────────────────────────────

#[test]
fn full_archive_replays_in_dependency_order_with_wired_handles() {
    let recorder = recorded_state();
    let bytes = recorder.serialize().unwrap();

    let mut creator = RecordingCreator::default();
    let mut resolver = MapResolver::default();
    let mut replayer = StateReplayer::new();
    replayer.parse(&mut creator, &mut resolver, &bytes).unwrap();

    let module_hash = recorder.get_hash_for_shader_module(MODULE).unwrap();
    let layout_hash = recorder.get_hash_for_pipeline_layout(LAYOUT).unwrap();
    let pipe_hash = recorder.get_hash_for_graphics_pipeline(PIPELINE_1).unwrap();

    // Kinds arrive in dependency order.
    let module_pos = creator.position(ObjectKind::ShaderModule, module_hash);
    let layout_pos = creator.position(ObjectKind::PipelineLayout, layout_hash);
    let pipe_pos = creator.position(ObjectKind::GraphicsPipeline, pipe_hash);
    assert!(module_pos < layout_pos);
    assert!(layout_pos < pipe_pos);

    // The pipeline handed to the creator references the driver handle the
    // creator returned for the layout, not the archive fingerprint.
    let created = &creator.graphics_pipelines[&pipe_hash];
    assert_eq!(created.layout, creator.pipeline_layout_handles[&layout_hash]);

    // Derived pipeline was wired to its base.
    let base_handle = replayer
        .replayed_handle(ObjectKind::GraphicsPipeline, pipe_hash)
        .unwrap();
    let derived_hash = recorder.get_hash_for_graphics_pipeline(PIPELINE_2).unwrap();
    let derived = &creator.graphics_pipelines[&derived_hash];
    assert_eq!(derived.base_pipeline_handle, base_handle);
}

#[test]
fn shader_bytecode_round_trips_bit_exact() {
    // Word-aligned payloads are the caller's contract; the misaligned 3999
    // and 4001 lengths must still round-trip byte-exact without tripping the
    // recorder, which hashes whole words only.
    for len in [3999usize, 4000, 4001, 4004] {
        let mut recorder = StateRecorder::new();
        let code = shader_code(len);
        recorder
            .record_shader_module(MODULE, shader_info(code.clone()))
            .unwrap();
        recorder.record_end().unwrap();
        let hash = recorder.get_hash_for_shader_module(MODULE).unwrap();
        let bytes = recorder.serialize_shader_module(hash).unwrap();

        let mut creator = RecordingCreator::default();
        let mut resolver = MapResolver::default();
        let mut replayer = StateReplayer::new();
        replayer.parse(&mut creator, &mut resolver, &bytes).unwrap();

        let replayed = &creator.shader_modules[&hash];
        assert_eq!(replayed.code, code);
        assert_eq!(replayed.code_size as usize, len);
    }
}

#[test]
fn reparsing_the_same_archive_is_idempotent() {
    let recorder = recorded_state();
    let bytes = recorder.serialize().unwrap();

    let mut creator = RecordingCreator::default();
    let mut resolver = MapResolver::default();
    let mut replayer = StateReplayer::new();
    replayer.parse(&mut creator, &mut resolver, &bytes).unwrap();
    let first_pass_events = creator.events.len();
    let first_pass_retained = replayer.retained_object_count();
    replayer.parse(&mut creator, &mut resolver, &bytes).unwrap();

    // Exactly one creator call per fingerprint per kind, including render
    // passes.
    assert_eq!(creator.events.len(), first_pass_events);
    assert_eq!(replayer.retained_object_count(), first_pass_retained);
    assert_eq!(creator.calls_for(ObjectKind::RenderPass), 1);
    assert_eq!(creator.calls_for(ObjectKind::Sampler), 1);
    assert_eq!(creator.calls_for(ObjectKind::GraphicsPipeline), 2);
}

#[test]
fn base_pipeline_resolves_through_the_resolver() {
    let recorder = recorded_state();
    let module_hash = recorder.get_hash_for_shader_module(MODULE).unwrap();
    let base_hash = recorder.get_hash_for_graphics_pipeline(PIPELINE_1).unwrap();
    let derived_hash = recorder.get_hash_for_graphics_pipeline(PIPELINE_2).unwrap();

    // Only the derived pipeline's archive is parsed directly; the base
    // pipeline and the shader module come back through the resolver.
    let mut resolver = MapResolver::default();
    resolver.archives.insert(
        module_hash,
        recorder.serialize_shader_module(module_hash).unwrap(),
    );
    resolver.archives.insert(
        base_hash,
        recorder.serialize_graphics_pipeline(base_hash).unwrap(),
    );
    let bytes = recorder.serialize_graphics_pipeline(derived_hash).unwrap();

    let mut creator = RecordingCreator::default();
    let mut replayer = StateReplayer::new();
    replayer.parse(&mut creator, &mut resolver, &bytes).unwrap();

    // The base was created before the derived pipeline.
    let base_pos = creator.position(ObjectKind::GraphicsPipeline, base_hash);
    let derived_pos = creator.position(ObjectKind::GraphicsPipeline, derived_hash);
    assert!(base_pos < derived_pos);

    // And the derived pipeline references the base's driver handle.
    let base_handle = replayer
        .replayed_handle(ObjectKind::GraphicsPipeline, base_hash)
        .unwrap();
    assert_eq!(
        creator.graphics_pipelines[&derived_hash].base_pipeline_handle,
        base_handle
    );
}

#[test]
fn missing_base_pipeline_with_empty_resolver_is_unresolved() {
    let mut recorder = StateRecorder::new();
    recorder
        .record_pipeline_layout(LAYOUT, PipelineLayoutCreateInfo::default())
        .unwrap();
    recorder
        .record_shader_module(MODULE, shader_info(shader_code(16)))
        .unwrap();
    let compute = |base: Handle, flags: u32| ComputePipelineCreateInfo {
        flags,
        layout: LAYOUT,
        base_pipeline_handle: base,
        base_pipeline_index: if base.is_null() { 0 } else { -1 },
        stage: PipelineShaderStageCreateInfo {
            stage: 0x20,
            ..stage(MODULE)
        },
        next: None,
    };
    recorder
        .record_compute_pipeline(PIPELINE_1, compute(Handle::null(), 0))
        .unwrap();
    recorder
        .record_compute_pipeline(PIPELINE_2, compute(PIPELINE_1, 0x4))
        .unwrap();
    recorder.record_end().unwrap();

    let derived_hash = recorder.get_hash_for_compute_pipeline(PIPELINE_2).unwrap();
    let bytes = recorder.serialize_compute_pipeline(derived_hash).unwrap();

    let mut creator = RecordingCreator::default();
    let mut replayer = StateReplayer::new();
    let result = replayer.parse(&mut creator, &mut EmptyResolver, &bytes);
    assert!(matches!(
        result,
        Err(ReplayError::UnresolvedReference {
            kind: ObjectKind::ComputePipeline,
            ..
        })
    ));
}

#[test]
fn version_mismatch_and_malformed_json_fail_parsing() {
    let mut creator = RecordingCreator::default();
    let mut resolver = MapResolver::default();
    let mut replayer = StateReplayer::new();

    let result = replayer.parse(&mut creator, &mut resolver, br#"{"version": 2}"#);
    assert!(matches!(
        result,
        Err(ReplayError::VersionMismatch { found: 2 })
    ));

    let result = replayer.parse(&mut creator, &mut resolver, b"not json at all");
    assert!(matches!(result, Err(ReplayError::Parse(_))));
}

#[test]
fn failed_parse_keeps_earlier_objects_registered() {
    let recorder = recorded_state();
    let bytes = recorder.serialize().unwrap();
    let module_hash = recorder.get_hash_for_shader_module(MODULE).unwrap();
    let sampler_hash = recorder.get_hash_for_sampler(SAMPLER).unwrap();

    let mut creator = RecordingCreator {
        fail_samplers: true,
        ..Default::default()
    };
    let mut resolver = MapResolver::default();
    let mut replayer = StateReplayer::new();

    // Shader modules replay before samplers, so the failure hits after the
    // module is registered.
    let result = replayer.parse(&mut creator, &mut resolver, &bytes);
    assert!(matches!(
        result,
        Err(ReplayError::CreateFailed {
            kind: ObjectKind::Sampler,
            ..
        })
    ));
    assert!(replayer
        .replayed_handle(ObjectKind::ShaderModule, module_hash)
        .is_some());

    // A later parse with a working creator picks up the rest without
    // re-creating the module.
    creator.fail_samplers = false;
    replayer.parse(&mut creator, &mut resolver, &bytes).unwrap();
    assert_eq!(creator.calls_for(ObjectKind::ShaderModule), 1);
    assert!(replayer
        .replayed_handle(ObjectKind::Sampler, sampler_hash)
        .is_some());
}

#[test]
fn replays_out_of_a_capture_directory() {
    let dir = tempfile::tempdir().unwrap();
    let mut recorder = StateRecorder::with_config(RecorderConfig {
        serialization_path: Some(dir.path().to_path_buf()),
        queue_capacity: 64,
    });
    recorder
        .record_sampler(
            SAMPLER,
            SamplerCreateInfo {
                max_lod: 1000.0,
                ..Default::default()
            },
        )
        .unwrap();
    recorder
        .record_descriptor_set_layout(
            SET_LAYOUT,
            DescriptorSetLayoutCreateInfo {
                flags: 0,
                bindings: vec![DescriptorSetLayoutBinding {
                    descriptor_type: consts::DESCRIPTOR_TYPE_SAMPLER,
                    descriptor_count: 1,
                    stage_flags: 0x10,
                    binding: 0,
                    immutable_samplers: Some(vec![SAMPLER]),
                }],
                next: None,
            },
        )
        .unwrap();
    recorder
        .record_pipeline_layout(
            LAYOUT,
            PipelineLayoutCreateInfo {
                flags: 0,
                push_constant_ranges: Vec::new(),
                set_layouts: vec![SET_LAYOUT],
                next: None,
            },
        )
        .unwrap();
    recorder
        .record_shader_module(MODULE, shader_info(shader_code(64)))
        .unwrap();
    recorder.record_render_pass(RENDER_PASS, render_pass_info()).unwrap();
    recorder
        .record_graphics_pipeline(
            PIPELINE_1,
            GraphicsPipelineCreateInfo {
                layout: LAYOUT,
                render_pass: RENDER_PASS,
                stages: vec![stage(MODULE)],
                ..Default::default()
            },
        )
        .unwrap();
    recorder.record_end().unwrap();

    // Replay the pipeline's own file; the shader module is pulled in through
    // the directory resolver.
    let pipe_hash = recorder.get_hash_for_graphics_pipeline(PIPELINE_1).unwrap();
    let bytes = std::fs::read(dir.path().join(format!("{pipe_hash}.json"))).unwrap();

    let mut creator = RecordingCreator::default();
    let mut resolver = DirectoryResolver::new(dir.path());
    let mut replayer = StateReplayer::new();
    replayer.parse(&mut creator, &mut resolver, &bytes).unwrap();

    assert_eq!(creator.calls_for(ObjectKind::GraphicsPipeline), 1);
    assert_eq!(creator.calls_for(ObjectKind::ShaderModule), 1);
    assert_eq!(creator.calls_for(ObjectKind::Sampler), 1);
}
