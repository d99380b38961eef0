use std::fmt;

/// The seven object kinds the recorder and replayer know about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Sampler,
    DescriptorSetLayout,
    PipelineLayout,
    ShaderModule,
    RenderPass,
    ComputePipeline,
    GraphicsPipeline,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ObjectKind::Sampler => "sampler",
            ObjectKind::DescriptorSetLayout => "descriptor set layout",
            ObjectKind::PipelineLayout => "pipeline layout",
            ObjectKind::ShaderModule => "shader module",
            ObjectKind::RenderPass => "render pass",
            ObjectKind::ComputePipeline => "compute pipeline",
            ObjectKind::GraphicsPipeline => "graphics pipeline",
        };
        f.write_str(name)
    }
}
