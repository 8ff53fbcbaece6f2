use std::io::Write;
use std::path::Path;

use anyhow::Context;
use bytes::Bytes;
use colored::Colorize;
use frag_model::{FragmentList, FragmentRecord, FragmentService, FragmentStores, StoreConfig};
use frag_server::{FragmentServer, ServerConfig};
use frag_types::{FragmentId, OwnerId};

use crate::cli::*;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let mut config = load_config(cli.config.as_deref())?;
    tracing::debug!(config = ?cli.config, store = ?config.store, "configuration loaded");

    if let Command::Serve(args) = &cli.command {
        if let Some(bind) = args.bind {
            config.bind_addr = bind;
        }
        let server = FragmentServer::new(config)?;
        server.serve().await?;
        return Ok(());
    }

    if config.store == StoreConfig::Memory {
        eprintln!(
            "{} no durable store configured; changes last only for this command",
            "note:".yellow()
        );
    }
    let service = FragmentService::new(FragmentStores::from_config(&config.store)?);
    let format = cli.format;

    match cli.command {
        Command::Serve(_) => Ok(()),
        Command::Put(args) => cmd_put(&service, args, &format).await,
        Command::Get(args) => cmd_get(&service, args).await,
        Command::List(args) => cmd_list(&service, args, &format).await,
        Command::Info(args) => cmd_info(&service, args, &format).await,
        Command::Rm(args) => cmd_rm(&service, args).await,
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<ServerConfig> {
    match path {
        Some(path) => ServerConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display())),
        None => Ok(ServerConfig::default()),
    }
}

fn owner_of(arg: &OwnerArg) -> OwnerId {
    OwnerId::from_principal(&arg.owner)
}

fn parse_id(raw: &str) -> anyhow::Result<FragmentId> {
    FragmentId::parse(raw).with_context(|| format!("invalid fragment id: {raw}"))
}

async fn cmd_put(service: &FragmentService, args: PutArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let record = put_file(service, &owner_of(&args.owner), &args.content_type, &args.file).await?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&record)?),
        OutputFormat::Text => {
            println!("{} Stored fragment {}", "✓".green().bold(), record.id.as_str().yellow());
            print_record(&record);
        }
    }
    Ok(())
}

async fn put_file(
    service: &FragmentService,
    owner: &OwnerId,
    content_type: &str,
    file: &Path,
) -> anyhow::Result<FragmentRecord> {
    if !FragmentRecord::is_supported_type(content_type) {
        anyhow::bail!("unsupported fragment type: {content_type}");
    }
    let data = tokio::fs::read(file)
        .await
        .with_context(|| format!("reading {}", file.display()))?;
    if data.is_empty() {
        anyhow::bail!("{} is empty", file.display());
    }
    let mut record = service.create(owner, content_type).await?;
    service.set_data(&mut record, Bytes::from(data)).await?;
    Ok(record)
}

async fn cmd_get(service: &FragmentService, args: GetArgs) -> anyhow::Result<()> {
    let (id, extension) = match args.id.split_once('.') {
        Some((id, ext)) => (id, Some(ext)),
        None => (args.id.as_str(), None),
    };
    let id = parse_id(id)?;
    let (_, converted) = service
        .get_converted(&owner_of(&args.owner), &id, extension)
        .await?;

    match &args.output {
        Some(path) => {
            tokio::fs::write(path, &converted.data)
                .await
                .with_context(|| format!("writing {}", path.display()))?;
            eprintln!(
                "{} Wrote {} bytes ({}) to {}",
                "✓".green(),
                converted.data.len(),
                converted.media_type.cyan(),
                path.display()
            );
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&converted.data)?;
            stdout.flush()?;
        }
    }
    Ok(())
}

async fn cmd_list(service: &FragmentService, args: ListArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let list = service
        .list_by_owner(&owner_of(&args.owner), args.expand)
        .await?;
    if let OutputFormat::Json = format {
        println!("{}", serde_json::to_string_pretty(&list)?);
        return Ok(());
    }

    if list.is_empty() {
        println!("No fragments.");
        return Ok(());
    }
    match list {
        FragmentList::Ids(ids) => {
            for id in ids {
                println!("{}", id.as_str().yellow());
            }
        }
        FragmentList::Records(records) => {
            for record in records {
                println!(
                    "{}  {:>8}  {}  {}",
                    record.id.as_str().yellow(),
                    record.size,
                    record.content_type.cyan(),
                    record.updated.to_rfc3339().dimmed()
                );
            }
        }
    }
    Ok(())
}

async fn cmd_info(service: &FragmentService, args: InfoArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let id = parse_id(&args.id)?;
    let record = service
        .get_by_id(&owner_of(&args.owner), &id)
        .await?
        .with_context(|| format!("fragment not found: {}", args.id))?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&record)?),
        OutputFormat::Text => print_record(&record),
    }
    Ok(())
}

async fn cmd_rm(service: &FragmentService, args: RmArgs) -> anyhow::Result<()> {
    let id = parse_id(&args.id)?;
    service.delete(&owner_of(&args.owner), &id).await?;
    println!("{} Deleted fragment {}", "✓".green().bold(), args.id.yellow());
    Ok(())
}

/// Each available format with the extension that requests it, e.g.
/// `text/html (.html)`.
fn format_summary(record: &FragmentRecord) -> String {
    record
        .formats()
        .iter()
        .map(|mime| match frag_convert::extension_for_mime(mime) {
            Some(ext) => format!("{mime} (.{ext})"),
            None => mime.to_string(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn print_record(record: &FragmentRecord) {
    println!("  Type: {}", record.content_type.cyan());
    println!("  Size: {} bytes", record.size);
    println!("  Formats: {}", format_summary(record));
    println!("  Created: {}", record.created.to_rfc3339());
    println!("  Updated: {}", record.updated.to_rfc3339());
}
