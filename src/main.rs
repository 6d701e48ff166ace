use clap::Parser;
use kvsnap::artifact::manifest::PackerManifest;
use kvsnap::artifact::types::BuildArtifact;
use kvsnap::configuration::interpolate::InterpolationContext;
use kvsnap::configuration::{load_fragment, Config, RawConfig};
use kvsnap::controller::{Controller, RunReport};
use kvsnap::error_handling::{AppError, ConfigErrors};
use kvsnap::processor::PostProcessor;
use kvsnap::store::{KvStore, MemoryStore};
use kvsnap::ui::ConsoleUi;
use log::{error, info};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "kvsnap")]
#[command(version)]
#[command(about = "Record freshly built snapshot identifiers in Consul")]
struct Args {
    /// Configuration file (TOML, or JSON when the name ends in .json)
    #[arg(long, short = 'c', env = "KVSNAP_CONFIG")]
    config: Option<PathBuf>,

    /// Packer build manifest listing the artifacts to record
    #[arg(long, short = 'm', conflicts_with = "artifact_id")]
    manifest: Option<PathBuf>,

    /// Only record the builds of the manifest's last run
    #[arg(long, requires = "manifest")]
    last_run_only: bool,

    /// Identifier of a single artifact, e.g. nyc3:12345678
    #[arg(long)]
    artifact_id: Option<String>,

    /// Builder id of --artifact-id (defaults to the configured builder)
    #[arg(long, requires = "artifact_id")]
    artifact_builder: Option<String>,

    #[arg(long)]
    snapshot_name: Option<String>,

    #[arg(long)]
    snapshot_version: Option<String>,

    #[arg(long)]
    consul_address: Option<String>,

    #[arg(long)]
    consul_scheme: Option<String>,

    #[arg(long, env = "KVSNAP_CONSUL_TOKEN", hide_env_values = true)]
    consul_token: Option<String>,

    /// User variable for `{{user `KEY`}}` templates
    #[arg(long = "var", value_name = "KEY=VALUE", value_parser = parse_var)]
    vars: Vec<(String, String)>,

    /// Validate and print what would be written without contacting Consul
    #[arg(long)]
    dry_run: bool,

    #[arg(long, short = 'v')]
    verbose: bool,
}

fn parse_var(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got {:?}", raw)),
    }
}

impl Args {
    /// Command-line settings as the last, highest-priority fragment.
    fn overrides(&self) -> RawConfig {
        RawConfig {
            snapshot_name: self.snapshot_name.clone(),
            snapshot_version: self.snapshot_version.clone(),
            consul_address: self.consul_address.clone(),
            consul_scheme: self.consul_scheme.clone(),
            consul_token: self.consul_token.clone(),
            variables: self.vars.iter().cloned().collect(),
            ..Default::default()
        }
    }

    fn fragments(&self) -> Result<Vec<RawConfig>, ConfigErrors> {
        let mut fragments = Vec::new();
        if let Some(path) = &self.config {
            fragments.push(load_fragment(path)?);
        }
        fragments.push(self.overrides());
        Ok(fragments)
    }

    fn artifacts(&self, config: &Config) -> Result<Vec<BuildArtifact>, AppError> {
        if let Some(path) = &self.manifest {
            return Ok(PackerManifest::from_file(path)?.artifacts(self.last_run_only));
        }
        match &self.artifact_id {
            Some(id) => {
                let builder = self
                    .artifact_builder
                    .clone()
                    .unwrap_or_else(|| config.artifact_parser.builder_id().to_string());
                Ok(vec![BuildArtifact::new(builder, id.clone())])
            }
            None => Err(AppError::Arguments(
                "either --manifest or --artifact-id is required".to_string(),
            )),
        }
    }
}

async fn record<S: KvStore>(processor: PostProcessor<S>, artifacts: &[BuildArtifact]) -> RunReport {
    let controller = Controller::new(processor, Box::new(ConsoleUi::new("kvsnap")));
    controller.run(artifacts).await
}

async fn run(args: Args) -> Result<(), AppError> {
    info!("Importing configuration");
    let config = Config::from_raws(args.fragments()?, &InterpolationContext::new())?;
    info!("Configuration imported successfully");

    let artifacts = args.artifacts(&config)?;

    let report = if args.dry_run {
        info!("Dry run: nothing will be written to Consul");
        record(PostProcessor::new(config, MemoryStore::new()), &artifacts).await
    } else {
        record(PostProcessor::connect(config)?, &artifacts).await
    };

    let report = report.into_result()?;
    info!("{} snapshot(s) recorded", report.stored.len());
    Ok(())
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    env_logger::Builder::from_default_env()
        .filter_level(if args.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .format_target(false)
        .init();

    if let Err(e) = run(args).await {
        error!("{}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Result<Args, clap::Error> {
        let mut full = vec!["kvsnap"];
        full.extend_from_slice(argv);
        Args::try_parse_from(full)
    }

    #[test]
    fn overrides_carry_flags_and_vars() {
        let args = parse(&[
            "--artifact-id",
            "nyc3:1",
            "--snapshot-name",
            "web",
            "--var",
            "release=v2",
            "--var",
            "team=infra",
        ])
        .unwrap();

        let raw = args.overrides();
        assert_eq!(raw.snapshot_name.as_deref(), Some("web"));
        assert_eq!(raw.variables["release"], "v2");
        assert_eq!(raw.variables["team"], "infra");
    }

    #[test]
    fn manifest_and_artifact_id_conflict() {
        assert!(parse(&["--manifest", "m.json", "--artifact-id", "nyc3:1"]).is_err());
        assert!(parse(&["--last-run-only"]).is_err());
    }

    #[test]
    fn bad_var_is_rejected() {
        assert!(parse(&["--var", "novalue"]).is_err());
        assert_eq!(parse_var("a=b=c"), Ok(("a".into(), "b=c".into())));
    }

    #[test]
    fn single_artifact_defaults_to_configured_builder() {
        let args = parse(&["--artifact-id", "nyc3:9", "--snapshot-name", "web"]).unwrap();
        let config =
            Config::from_raws(args.fragments().unwrap(), &InterpolationContext::new()).unwrap();

        let artifacts = args.artifacts(&config).unwrap();
        assert_eq!(artifacts.len(), 1);
        assert_eq!(artifacts[0].builder_id, "pearkes.digitalocean");
    }

    #[test]
    fn artifacts_are_required() {
        let args = parse(&["--snapshot-name", "web"]).unwrap();
        let config =
            Config::from_raws(args.fragments().unwrap(), &InterpolationContext::new()).unwrap();
        assert!(matches!(args.artifacts(&config), Err(AppError::Arguments(_))));
    }
}
