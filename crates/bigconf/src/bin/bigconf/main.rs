mod cli;

use bigconf::dialect::Dialect;
use bigconf::document::ConfDocument;
use bigconf::sources::{ConfSources, RawSource};
use serde::Serialize;

fn main() {
    use clap::Parser;
    let cli = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_env("BIGCONF_LOG"))
        .with_writer(std::io::stderr)
        .init();

    for new_path in cli.directory.iter() {
        match new_path.canonicalize() {
            Err(e) => {
                eprintln!(
                    "Failed to resolve path for -C/--directory {}\n{}",
                    new_path.display(),
                    e
                );
                std::process::exit(1);
            }
            Ok(cwd) => {
                if let Err(err) = std::env::set_current_dir(&cwd) {
                    eprintln!("Failed to set work directory to {}\n{}", cwd.display(), err,);
                    std::process::exit(1);
                }

                tracing::info!(directory=%cwd.display(), "Changed working directory");
            }
        }
    }

    let command_result = match cli.command {
        cli::Command::Explode(explode_cli) => explode(explode_cli),
        cli::Command::App(app_cli) => app(app_cli),
        cli::Command::Tree(tree_cli) => tree(tree_cli),
    };

    if let Err(e) = command_result {
        for error in e.chain() {
            eprintln!("{error}")
        }
        std::process::exit(1);
    }
}

pub fn explode(cli: cli::ExplodeCommand) -> anyhow::Result<()> {
    let document = load(&cli.input)?;
    output(&cli.output, &document.explode())
}

pub fn app(cli: cli::AppCommand) -> anyhow::Result<()> {
    let document = load(&cli.input)?;
    let Some(bundle) = document.app(&cli.name) else {
        anyhow::bail!("No virtual server named {}", cli.name);
    };

    output(&cli.output, &bundle)
}

pub fn tree(cli: cli::TreeCommand) -> anyhow::Result<()> {
    let document = load(&cli.input)?;
    output(&cli.output, document.tree())
}

fn load(input: &cli::InputArgs) -> anyhow::Result<ConfDocument> {
    let dialect = match &input.dialect {
        Some(path) => Dialect::load(path)?,
        None => Dialect::default(),
    };

    let mut sources = ConfSources::default();

    if !input.workdir && input.files.is_empty() && input.directories.is_empty() {
        let stdin = std::io::read_to_string(std::io::stdin())?;
        sources.insert(RawSource::from_text("stdin", stdin));
    }

    if input.workdir {
        sources.load_directory(&std::env::current_dir()?)?;
    }

    for file_path in &input.files {
        sources.load_file(file_path)?;
    }

    for dir_path in &input.directories {
        sources.load_directory(dir_path)?;
    }

    anyhow::ensure!(!sources.is_empty(), "No files loaded");

    let mut document = ConfDocument::new(dialect);
    document.load(&sources);

    anyhow::ensure!(
        !document.sources().is_empty(),
        "None of the {} sources could be parsed",
        sources.len()
    );

    Ok(document)
}

fn output(output: &cli::OutputArgs, value: &impl Serialize) -> anyhow::Result<()> {
    match output.format {
        cli::OutputFormat::Yaml => serde_yaml::to_writer(std::io::stdout(), value)?,
        cli::OutputFormat::Json => serde_json::to_writer_pretty(std::io::stdout(), value)?,
    };

    Ok(())
}
