//! chop - ClickHouseInstallation manifest compiler

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use kube::CustomResourceExt;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use chop::compiler::ChiCompiler;
use chop::crd::ClickHouseInstallation;
use chop::naming::{create_pod_fqdn, create_pod_hostname, create_stateful_set_name, DEFAULT_IMAGE};

/// chop - compiles ClickHouseInstallation resources into Kubernetes manifests
#[derive(Parser, Debug)]
#[command(name = "chop", version, about, long_about = None)]
struct Cli {
    /// Generate CRD manifests and exit
    #[arg(long)]
    crd: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compile an installation and print every object as multi-document YAML
    Compile(CompileArgs),

    /// Print the StatefulSet, hostname and FQDN of every deployment
    Hosts(CompileArgs),
}

/// Arguments shared by the compiling subcommands
#[derive(Parser, Debug)]
struct CompileArgs {
    /// Path to the ClickHouseInstallation YAML
    #[arg(short = 'f', long = "file")]
    file: PathBuf,

    /// Namespace to generate into (defaults to the resource's namespace)
    #[arg(long, env = "CHOP_NAMESPACE")]
    namespace: Option<String>,

    /// Image of the default container
    #[arg(long, env = "CHOP_DEFAULT_IMAGE", default_value = DEFAULT_IMAGE)]
    default_image: String,
}

impl CompileArgs {
    fn load(&self) -> anyhow::Result<ClickHouseInstallation> {
        read_installation(&self.file)
    }

    fn compiler<'a>(&self, chi: &'a ClickHouseInstallation) -> ChiCompiler<'a> {
        let compiler = ChiCompiler::new(chi).with_default_image(&self.default_image);
        match &self.namespace {
            Some(namespace) => compiler.with_namespace(namespace),
            None => compiler,
        }
    }
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries manifests only
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if cli.crd {
        let crd = serde_yaml::to_string(&ClickHouseInstallation::crd())
            .map_err(|e| anyhow::anyhow!("Failed to serialize CRD: {}", e))?;
        println!("{crd}");
        return Ok(());
    }

    match cli.command {
        Some(Commands::Compile(args)) => run_compile(&args),
        Some(Commands::Hosts(args)) => run_hosts(&args),
        None => anyhow::bail!("no command given, see --help"),
    }
}

fn read_installation(path: &Path) -> anyhow::Result<ClickHouseInstallation> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse ClickHouseInstallation from {}", path.display()))
}

/// Print all generated objects
fn run_compile(args: &CompileArgs) -> anyhow::Result<()> {
    let chi = args.load()?;
    let output = args.compiler(&chi).compile()?;
    print!("{}", output.to_yaml()?);
    Ok(())
}

/// Print one line per deployment: StatefulSet, pod hostname, pod FQDN
fn run_hosts(args: &CompileArgs) -> anyhow::Result<()> {
    let chi = args.load()?;
    let compiler = args.compiler(&chi);
    let namespace = compiler.namespace();
    let ctx = compiler.context()?;

    for id in &ctx.deployment_ids {
        println!(
            "{}\t{}\t{}",
            create_stateful_set_name(id.as_str()),
            create_pod_hostname(id.as_str()),
            create_pod_fqdn(&namespace, id.as_str())
        );
    }
    Ok(())
}
