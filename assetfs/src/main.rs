use std::path::PathBuf;

use anyhow::{bail, Context};
use bytes::Bytes;
use tracing::info;
use tracing_subscriber::EnvFilter;

use assetfs_cloudinary::options::OVERRIDE_KEY;
use assetfs_cloudinary::{CloudinaryAdapter, DiskConfig};
use assetfs_common::{CallOptions, FilesystemAdapter};

const DEFAULT_CONFIG_PATH: &str = "assetfs.toml";

const USAGE: &str = "usage: assetfs [--config FILE] <command> [args]

commands:
  put LOCAL PATH      upload a local file
  cat PATH            print a file to stdout
  get PATH LOCAL      stream a file to a local path
  ls [DIR]            list files under a prefix (JSON)
  dirs [DIR]          list sub-directories derived from ids
  stat PATH           show normalized metadata (JSON)
  exists PATH         exit 0 if PATH exists, 1 otherwise
  mv FROM TO          rename
  cp FROM TO          copy
  rm PATH             delete
  rmdir DIR           delete everything under a prefix
  mkdir DIR           no-op; directories are implicit
  url PATH [--plain]  print the delivery URL";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let config_path = match args.iter().position(|a| a == "--config") {
        Some(i) if i + 1 < args.len() => {
            let path = args.remove(i + 1);
            args.remove(i);
            PathBuf::from(path)
        }
        Some(_) => bail!("--config needs a value\n\n{}", USAGE),
        None => PathBuf::from(
            std::env::var("ASSETFS_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string()),
        ),
    };

    let Some(command) = args.first().cloned() else {
        bail!("{}", USAGE);
    };

    let config = DiskConfig::load(&config_path)?;
    info!(cloud = %config.cloud_name, prefix = %config.path_prefix, "Configuration loaded");
    let fs = CloudinaryAdapter::from_config(config)?;

    let arg = |i: usize| -> anyhow::Result<&str> {
        args.get(i)
            .map(|s| s.as_str())
            .with_context(|| format!("missing argument for '{}'\n\n{}", command, USAGE))
    };
    let no_options = CallOptions::new();

    match command.as_str() {
        "put" => {
            let local = arg(1)?;
            let data = tokio::fs::read(local)
                .await
                .with_context(|| format!("Failed to read {}", local))?;
            let meta = fs.write(arg(2)?, Bytes::from(data), &no_options).await?;
            println!("{}", serde_json::to_string_pretty(&meta)?);
        }
        "cat" => {
            let read = fs.read(arg(1)?).await?;
            use std::io::Write;
            std::io::stdout().write_all(&read.contents)?;
        }
        "get" => {
            let mut opened = fs.read_stream(arg(1)?).await?;
            let mut out = tokio::fs::File::create(arg(2)?).await?;
            let copied = tokio::io::copy(&mut opened.stream, &mut out).await?;
            info!(path = %opened.path, bytes = copied, "Download complete");
        }
        "ls" => {
            let listed = fs.list_contents(args.get(1).map_or("", |s| s.as_str()), false).await?;
            println!("{}", serde_json::to_string_pretty(&listed)?);
        }
        "dirs" => {
            for dir in fs.directories(args.get(1).map_or("", |s| s.as_str())).await? {
                println!("{}", dir);
            }
        }
        "stat" => {
            let meta = fs.get_metadata(arg(1)?).await?;
            println!("{}", serde_json::to_string_pretty(&meta)?);
        }
        "exists" => {
            if !fs.has(arg(1)?).await? {
                std::process::exit(1);
            }
        }
        "mv" => fs.rename(arg(1)?, arg(2)?).await?,
        "cp" => fs.copy(arg(1)?, arg(2)?).await?,
        "rm" => fs.delete(arg(1)?).await?,
        "rmdir" => {
            let report = fs.delete_dir(arg(1)?).await?;
            for id in &report.deleted {
                println!("{}", id);
            }
            if report.partial {
                info!("Deletion was partial; run again to continue");
            }
        }
        "mkdir" => {
            let record = fs.create_dir(arg(1)?, &no_options).await?;
            println!("{}", record.path);
        }
        "url" => {
            let options = if args.iter().any(|a| a == "--plain") {
                CallOptions::new().with_remote(OVERRIDE_KEY, "secure", false)
            } else {
                CallOptions::new()
            };
            println!("{}", fs.get_url(arg(1)?, &options));
        }
        other => bail!("unknown command '{}'\n\n{}", other, USAGE),
    }

    Ok(())
}
