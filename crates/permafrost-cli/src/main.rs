use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use permafrost_core::{Fingerprint, Handle};
use permafrost_replay::{DirectoryResolver, StateCreator, StateReplayer};
use permafrost_schema::{
    ComputePipelineCreateInfo, DescriptorSetLayoutCreateInfo, GraphicsPipelineCreateInfo,
    PipelineLayoutCreateInfo, RenderPassCreateInfo, SamplerCreateInfo, ShaderModuleCreateInfo,
    StateArchive,
};
use tracing::info;

#[derive(Parser)]
#[command(name = "permafrost")]
#[command(about = "Permafrost - GPU pipeline state capture archives")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a summary of one archive file
    Inspect {
        /// Archive file to inspect
        archive: PathBuf,
    },

    /// Merge every per-object archive in a capture directory into one file
    Merge {
        /// Capture directory holding <HEX16>.json files
        dir: PathBuf,

        /// Output archive path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Dry-run replay of an archive, resolving references from a capture
    /// directory; prints the creation order
    Replay {
        /// Archive file to replay
        archive: PathBuf,

        /// Capture directory cross-archive references are resolved from
        /// (defaults to the archive's directory)
        #[arg(short, long)]
        from: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    permafrost_core::logging::init_logging();

    let cli = Cli::parse();

    match cli.command {
        Commands::Inspect { archive } => {
            let doc = read_archive(&archive)?;
            println!("version:            {}", doc.version);
            println!("samplers:           {}", doc.samplers.len());
            println!("set layouts:        {}", doc.set_layouts.len());
            println!("pipeline layouts:   {}", doc.pipeline_layouts.len());
            println!("shader modules:     {}", doc.shader_modules.len());
            println!("render passes:      {}", doc.render_passes.len());
            println!("compute pipelines:  {}", doc.compute_pipelines.len());
            println!("graphics pipelines: {}", doc.graphics_pipelines.len());

            for hash in doc.shader_modules.keys() {
                println!("  shader module {hash}");
            }
            for hash in doc.compute_pipelines.keys() {
                println!("  compute pipeline {hash}");
            }
            for hash in doc.graphics_pipelines.keys() {
                println!("  graphics pipeline {hash}");
            }
        }

        Commands::Merge { dir, output } => {
            let mut merged = StateArchive::new();
            let mut files = 0usize;
            for entry in std::fs::read_dir(&dir)? {
                let path = entry?.path();
                if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                    continue;
                }
                merged.merge(read_archive(&path)?);
                files += 1;
            }
            info!("merged {files} archives, {} objects", merged.len());
            std::fs::write(&output, serde_json::to_vec_pretty(&merged)?)?;
            println!("wrote {} objects to {}", merged.len(), output.display());
        }

        Commands::Replay { archive, from } => {
            let bytes = std::fs::read(&archive)?;
            let dir = match from {
                Some(dir) => dir,
                None => archive
                    .parent()
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from(".")),
            };

            let mut creator = PrintingCreator::default();
            let mut resolver = DirectoryResolver::new(dir);
            let mut replayer = StateReplayer::new();
            replayer
                .parse(&mut creator, &mut resolver, &bytes)
                .map_err(|e| anyhow::anyhow!("{e}"))?;

            println!("replayed {} objects", creator.created);
        }
    }

    Ok(())
}

fn read_archive(path: &Path) -> anyhow::Result<StateArchive> {
    let bytes = std::fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Creator that prints each creation and hands out sequential fake handles.
#[derive(Default)]
struct PrintingCreator {
    created: u64,
}

impl PrintingCreator {
    fn issue(&mut self, kind: &str, hash: Fingerprint) -> Option<Handle> {
        self.created += 1;
        println!("create {kind} {hash}");
        Some(Handle::new(self.created))
    }
}

impl StateCreator for PrintingCreator {
    fn enqueue_create_sampler(
        &mut self,
        hash: Fingerprint,
        _info: Arc<SamplerCreateInfo>,
    ) -> Option<Handle> {
        self.issue("sampler", hash)
    }

    fn enqueue_create_descriptor_set_layout(
        &mut self,
        hash: Fingerprint,
        _info: Arc<DescriptorSetLayoutCreateInfo>,
    ) -> Option<Handle> {
        self.issue("descriptor set layout", hash)
    }

    fn enqueue_create_pipeline_layout(
        &mut self,
        hash: Fingerprint,
        _info: Arc<PipelineLayoutCreateInfo>,
    ) -> Option<Handle> {
        self.issue("pipeline layout", hash)
    }

    fn enqueue_create_shader_module(
        &mut self,
        hash: Fingerprint,
        _info: Arc<ShaderModuleCreateInfo>,
    ) -> Option<Handle> {
        self.issue("shader module", hash)
    }

    fn enqueue_create_render_pass(
        &mut self,
        hash: Fingerprint,
        _info: Arc<RenderPassCreateInfo>,
    ) -> Option<Handle> {
        self.issue("render pass", hash)
    }

    fn enqueue_create_compute_pipeline(
        &mut self,
        hash: Fingerprint,
        _info: Arc<ComputePipelineCreateInfo>,
    ) -> Option<Handle> {
        self.issue("compute pipeline", hash)
    }

    fn enqueue_create_graphics_pipeline(
        &mut self,
        hash: Fingerprint,
        _info: Arc<GraphicsPipelineCreateInfo>,
    ) -> Option<Handle> {
        self.issue("graphics pipeline", hash)
    }
}
