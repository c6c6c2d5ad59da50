//! CLI for modelshot - composite a model photo with a product photo.

use clap::{Args, Parser, Subcommand, ValueEnum};
use modelshot::gallery::{FileBackend, GalleryStore, Session};
use modelshot::{
    upload, GeminiModel, GeminiProvider, GeneratedVariant, ImageFormat, ImageProvider,
    ModelShotError, Studio,
};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "modelshot")]
#[command(about = "Put a product on a model photo via Gemini and keep a local gallery")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Directory holding the gallery
    #[arg(long, global = true, env = "MODELSHOT_STORE", default_value = ".modelshot")]
    store: PathBuf,

    /// Gemini model to use
    #[arg(long, global = true, value_enum, default_value = "flash")]
    model_variant: ModelArg,

    /// Give up on a generation after this many seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Composite a model image with a product image
    Compose(ComposeArgs),

    /// Generate another variant for a saved session
    Regenerate(RegenerateArgs),

    /// List saved sessions
    List,

    /// Show one saved session
    Show {
        /// Session id
        id: Uuid,
    },

    /// Delete a saved session
    Remove {
        /// Session id
        id: Uuid,
    },

    /// Write a session's images to a directory
    Export(ExportArgs),

    /// Check that the provider is reachable and the API key works
    Check,
}

#[derive(Args)]
struct ComposeArgs {
    /// Photo of the model
    #[arg(short, long)]
    model: PathBuf,

    /// Photo of the product
    #[arg(short, long)]
    product: PathBuf,

    /// MIME type of the model photo, if detection should be skipped
    #[arg(long)]
    model_mime: Option<String>,

    /// MIME type of the product photo, if detection should be skipped
    #[arg(long)]
    product_mime: Option<String>,

    /// Where to write the generated image
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Save the result to the gallery
    #[arg(long)]
    save: bool,
}

#[derive(Args)]
struct RegenerateArgs {
    /// Session id
    id: Uuid,

    /// Where to write the generated image
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct ExportArgs {
    /// Session id
    id: Uuid,

    /// Target directory
    #[arg(short, long)]
    dir: PathBuf,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModelArg {
    /// gemini-2.5-flash-image
    Flash,
    /// nano-banana-pro-preview
    Pro,
}

impl From<ModelArg> for GeminiModel {
    fn from(arg: ModelArg) -> Self {
        match arg {
            ModelArg::Flash => GeminiModel::NanoBanana,
            ModelArg::Pro => GeminiModel::NanoBananaPro,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "modelshot=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let store = GalleryStore::new(FileBackend::new(&cli.store));

    match cli.command {
        Commands::Compose(ref args) => compose(&cli, args, store).await?,
        Commands::Regenerate(ref args) => regenerate(&cli, args, store).await?,
        Commands::List => list_sessions(&Studio::open(store), cli.json)?,
        Commands::Show { id } => show_session(&Studio::open(store), id, cli.json)?,
        Commands::Remove { id } => remove_session(Studio::open(store), id, cli.json)?,
        Commands::Export(ref args) => export_session(&Studio::open(store), args, cli.json)?,
        Commands::Check => check(&cli).await?,
    }

    Ok(())
}

/// Turns a library failure into the single message shown to the user.
fn report(err: ModelShotError) -> anyhow::Error {
    tracing::debug!(kind = ?err.kind(), "action failed: {err}");
    anyhow::anyhow!(err.user_message())
}

fn build_provider(cli: &Cli) -> anyhow::Result<GeminiProvider> {
    GeminiProvider::builder()
        .model(cli.model_variant.into())
        .build()
        .map_err(|e| anyhow::anyhow!(e))
}

async fn generate_with_deadline(
    studio: &mut Studio,
    provider: &GeminiProvider,
    timeout: Option<u64>,
) -> modelshot::Result<GeneratedVariant> {
    let generation = studio.generate(provider);
    let variant = match timeout {
        Some(secs) => {
            let limit = Duration::from_secs(secs);
            tokio::time::timeout(limit, generation)
                .await
                .map_err(|_| ModelShotError::Timeout(limit))?
        }
        None => generation.await,
    }?;
    Ok(variant.clone())
}

async fn compose(cli: &Cli, args: &ComposeArgs, store: GalleryStore) -> anyhow::Result<()> {
    let provider = build_provider(cli)?;
    let mut studio = Studio::open(store);

    let model = upload::read_image_with_mime(&args.model, args.model_mime.as_deref())
        .await
        .map_err(report)?;
    let session_id = studio.upload_model(model);
    let product = upload::read_image_with_mime(&args.product, args.product_mime.as_deref())
        .await
        .map_err(report)?;
    studio.upload_product(product).map_err(report)?;

    let variant = generate_with_deadline(&mut studio, &provider, cli.timeout)
        .await
        .map_err(report)?;

    if let Some(ref output) = args.output {
        write_variant(&variant, output)?;
    }
    if args.save {
        studio.save().map_err(report)?;
    }

    print_generated(
        session_id,
        &variant,
        args.output.as_deref(),
        args.save,
        cli.json,
    )
}

async fn regenerate(cli: &Cli, args: &RegenerateArgs, store: GalleryStore) -> anyhow::Result<()> {
    let provider = build_provider(cli)?;
    let mut studio = Studio::open(store);
    studio.resume(args.id).map_err(report)?;

    let variant = generate_with_deadline(&mut studio, &provider, cli.timeout)
        .await
        .map_err(report)?;

    if let Some(ref output) = args.output {
        write_variant(&variant, output)?;
    }
    studio.save().map_err(report)?;

    print_generated(args.id, &variant, args.output.as_deref(), true, cli.json)
}

fn print_generated(
    session_id: Uuid,
    variant: &GeneratedVariant,
    output: Option<&Path>,
    saved: bool,
    json_output: bool,
) -> anyhow::Result<()> {
    let size = variant.decode().map(|d| d.len()).unwrap_or(0);

    if json_output {
        let result = serde_json::json!({
            "type": "composite",
            "success": true,
            "session_id": session_id.to_string(),
            "output": output.map(|p| p.display().to_string()),
            "size_bytes": size,
            "mime_type": variant.mime_type(),
            "saved": saved,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        match output {
            Some(path) => println!("Generated image: {} ({} bytes)", path.display(), size),
            None => println!("Generated image ({} bytes); pass --output to keep it", size),
        }
        if saved {
            println!("Saved to gallery session {}", session_id);
        }
    }

    Ok(())
}

fn write_variant(variant: &GeneratedVariant, path: &Path) -> anyhow::Result<()> {
    std::fs::write(path, variant.decode().map_err(report)?)?;
    Ok(())
}

fn variant_extension(variant: &GeneratedVariant) -> &'static str {
    variant
        .mime_type()
        .and_then(ImageFormat::from_mime_type)
        .unwrap_or_default()
        .extension()
}

fn session_summary(session: &Session) -> serde_json::Value {
    serde_json::json!({
        "id": session.id.to_string(),
        "created_at": session.created_at.to_rfc3339(),
        "model_image": session.model_image.name,
        "product_image": session.product_image.name,
        "variants": session.variants.len(),
    })
}

fn list_sessions(studio: &Studio, json_output: bool) -> anyhow::Result<()> {
    let sessions = studio.gallery();

    if json_output {
        let items: Vec<_> = sessions.iter().map(session_summary).collect();
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    if sessions.is_empty() {
        println!("Your gallery is empty. Save a composite with `compose --save`.");
        return Ok(());
    }

    for session in sessions {
        println!(
            "{}  {}  {} + {}  ({} variant{})",
            session.id,
            session.created_at.format("%Y-%m-%d"),
            session.model_image.name,
            session.product_image.name,
            session.variants.len(),
            if session.variants.len() == 1 { "" } else { "s" },
        );
    }

    Ok(())
}

fn find_or_bail(studio: &Studio, id: Uuid) -> anyhow::Result<&Session> {
    modelshot::gallery::find(studio.gallery(), id)
        .ok_or_else(|| anyhow::anyhow!("No saved session {}", id))
}

fn show_session(studio: &Studio, id: Uuid, json_output: bool) -> anyhow::Result<()> {
    let session = find_or_bail(studio, id)?;

    if json_output {
        let mut summary = session_summary(session);
        summary["variant_mime_types"] = serde_json::json!(session
            .variants
            .iter()
            .map(|v| v.mime_type())
            .collect::<Vec<_>>());
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("Session {}", session.id);
    println!("Created:  {}", session.created_at.to_rfc3339());
    println!(
        "Model:    {} ({})",
        session.model_image.name, session.model_image.mime_type
    );
    println!(
        "Product:  {} ({})",
        session.product_image.name, session.product_image.mime_type
    );
    println!("Generated results ({}):", session.variants.len());
    for (index, variant) in session.variants.iter().enumerate() {
        let size = variant.decode().map(|d| d.len()).unwrap_or(0);
        println!("  Variant {}: {} bytes", index + 1, size);
    }

    Ok(())
}

fn remove_session(mut studio: Studio, id: Uuid, json_output: bool) -> anyhow::Result<()> {
    let existed = modelshot::gallery::find(studio.gallery(), id).is_some();
    studio.remove(id);

    if json_output {
        let result = serde_json::json!({ "id": id.to_string(), "removed": existed });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else if existed {
        println!("Removed session {}", id);
    } else {
        println!("No saved session {}; nothing removed", id);
    }

    Ok(())
}

/// File name for an exported upload. Only the last path component of the
/// stored name is kept, so a hand-edited gallery cannot escape `--dir`.
fn export_file_name(prefix: &str, name: &str) -> String {
    let base = Path::new(name)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "image".to_string());
    format!("{}-{}", prefix, base)
}

fn export_session(studio: &Studio, args: &ExportArgs, json_output: bool) -> anyhow::Result<()> {
    let session = find_or_bail(studio, args.id)?;
    std::fs::create_dir_all(&args.dir)?;

    let mut written = Vec::new();
    for (prefix, image) in [
        ("model", &session.model_image),
        ("product", &session.product_image),
    ] {
        let path = args.dir.join(export_file_name(prefix, &image.name));
        std::fs::write(&path, image.decode().map_err(report)?)?;
        written.push(path);
    }
    for (index, variant) in session.variants.iter().enumerate() {
        let path = args
            .dir
            .join(format!("variant-{}.{}", index + 1, variant_extension(variant)));
        write_variant(variant, &path)?;
        written.push(path);
    }

    if json_output {
        let files: Vec<String> = written.iter().map(|p| p.display().to_string()).collect();
        let result = serde_json::json!({ "id": session.id.to_string(), "files": files });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        for path in &written {
            println!("Wrote {}", path.display());
        }
    }

    Ok(())
}

async fn check(cli: &Cli) -> anyhow::Result<()> {
    let provider = build_provider(cli)?;
    let outcome = provider.health_check().await;

    if cli.json {
        let result = serde_json::json!({
            "provider": provider.kind().to_string(),
            "model": provider.model().as_str(),
            "ok": outcome.is_ok(),
            "error": outcome.as_ref().err().map(|e| e.to_string()),
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        match &outcome {
            Ok(()) => println!("✓ {} ({})", provider.name(), provider.model().as_str()),
            Err(e) => println!("✗ {} ({}): {}", provider.name(), provider.model().as_str(), e),
        }
    }

    outcome.map_err(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_file_name_keeps_plain_names() {
        assert_eq!(export_file_name("model", "m.png"), "model-m.png");
    }

    #[test]
    fn test_export_file_name_strips_directories() {
        assert_eq!(
            export_file_name("model", "x/../../../tmp/pwn.png"),
            "model-pwn.png"
        );
        assert_eq!(export_file_name("product", "/etc/passwd"), "product-passwd");
        assert_eq!(export_file_name("product", ".."), "product-image");
        assert_eq!(export_file_name("model", ""), "model-image");

        let dir = Path::new("out");
        let joined = dir.join(export_file_name("model", "a/../../b.jpg"));
        assert_eq!(joined.parent(), Some(dir));
    }

    #[test]
    fn test_compose_accepts_declared_mime() {
        let cli = Cli::try_parse_from([
            "modelshot",
            "compose",
            "--model",
            "m.heic",
            "--product",
            "p.bin",
            "--product-mime",
            "image/avif",
        ])
        .unwrap();
        match cli.command {
            Commands::Compose(args) => {
                assert_eq!(args.model_mime, None);
                assert_eq!(args.product_mime.as_deref(), Some("image/avif"));
            }
            _ => panic!("expected compose"),
        }
    }
}
