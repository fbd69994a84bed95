//! The `montage merge` command for merging local files.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use montage_core::{Config, MergeOptions, MergeResponse, Montage, OutputFormat, SourceImage};

/// Arguments for the `merge` command.
#[derive(Args, Debug)]
pub struct MergeArgs {
    /// Image files, in merge order
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Write the merged image here instead of the configured store
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Merge options as a JSON object, same shape as the HTTP `options` field
    #[arg(long)]
    pub options: Option<String>,

    /// Output format (png, jpeg, webp, gif, bmp, tiff); defaults to the
    /// `--output` extension when it names a known format
    #[arg(short, long)]
    pub format: Option<String>,

    /// Clockwise rotation per input in degrees, comma separated
    #[arg(long, value_delimiter = ',', allow_negative_numbers = true)]
    pub rotations: Vec<i32>,
}

/// Execute the merge command.
pub async fn execute(args: MergeArgs, config: Config) -> anyhow::Result<()> {
    let response = run(args, config).await?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

async fn run(args: MergeArgs, config: Config) -> anyhow::Result<MergeResponse> {
    let mut options: MergeOptions = match &args.options {
        Some(json) => serde_json::from_str(json).context("Invalid --options JSON")?,
        None => MergeOptions::default(),
    };
    if let Some(format) = args
        .format
        .clone()
        .or_else(|| args.output.as_deref().and_then(format_from_extension))
    {
        options.output_format = format;
    }
    let settings = options.resolve()?;

    if args.rotations.len() > args.inputs.len() {
        anyhow::bail!(
            "Got {} rotations for {} inputs",
            args.rotations.len(),
            args.inputs.len()
        );
    }

    let mut sources = Vec::with_capacity(args.inputs.len());
    for (index, path) in args.inputs.iter().enumerate() {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        sources.push(SourceImage {
            index,
            bytes,
            rotation: args.rotations.get(index).copied().unwrap_or(0),
            border: None,
        });
    }
    tracing::debug!("Merging {} files", sources.len());

    let montage = Montage::from_config(config)?;
    let encoded = montage.render(sources, settings).await?;

    match &args.output {
        Some(path) => {
            tokio::fs::write(path, &encoded.bytes)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            let path = tokio::fs::canonicalize(path).await?;
            tracing::info!(
                "Wrote {}x{} {} to {}",
                encoded.width,
                encoded.height,
                encoded.format.extension(),
                path.display()
            );
            Ok(MergeResponse {
                url: format!("file://{}", path.display()),
            })
        }
        None => {
            let outcome = montage.store(encoded).await?;
            Ok(MergeResponse::from(&outcome))
        }
    }
}

/// The file extension of `path`, if it names a supported output format.
fn format_from_extension(path: &Path) -> Option<String> {
    let ext = path.extension()?.to_str()?;
    OutputFormat::parse(ext).map(|_| ext.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};

    fn write_png(dir: &Path, name: &str, w: u32, h: u32) -> PathBuf {
        let path = dir.join(name);
        RgbaImage::from_pixel(w, h, Rgba([40, 80, 120, 255]))
            .save_with_format(&path, ImageFormat::Png)
            .unwrap();
        path
    }

    fn args(inputs: Vec<PathBuf>, output: Option<PathBuf>) -> MergeArgs {
        MergeArgs {
            inputs,
            output,
            options: None,
            format: None,
            rotations: Vec::new(),
        }
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            format_from_extension(Path::new("out.JPG")),
            Some("JPG".to_string())
        );
        assert_eq!(format_from_extension(Path::new("out.txt")), None);
        assert_eq!(format_from_extension(Path::new("out")), None);
    }

    #[tokio::test]
    async fn test_merge_to_output_file() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_png(dir.path(), "a.png", 40, 20);
        let b = write_png(dir.path(), "b.png", 20, 20);
        let output = dir.path().join("merged.webp");

        let options = r#"{"direction": "horizontal", "targetHeight": 50, "spacing": 4}"#;
        let mut args = args(vec![a, b], Some(output.clone()));
        args.options = Some(options.to_string());
        let response = run(args, Config::default()).await.unwrap();

        assert!(response.url.starts_with("file://"));
        assert!(response.url.ends_with("merged.webp"));
        let merged = image::open(&output).unwrap();
        // 40x20 -> 100x50, 20x20 -> 50x50, plus one 4px gap.
        assert_eq!((merged.width(), merged.height()), (154, 50));
    }

    #[tokio::test]
    async fn test_merge_without_output_uses_store() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_png(dir.path(), "a.png", 10, 10);
        let mut config = Config::default();
        config.storage.root_dir = dir.path().join("store");

        let response = run(args(vec![a], None), config).await.unwrap();
        assert!(response.url.contains("montage-output/merged/"));
        assert!(response.url.ends_with(".png"));
    }

    #[tokio::test]
    async fn test_too_many_rotations() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_png(dir.path(), "a.png", 10, 10);
        let mut args = args(vec![a], None);
        args.rotations = vec![90, 180];
        assert!(run(args, Config::default()).await.is_err());
    }
}
