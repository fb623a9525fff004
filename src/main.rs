use anyhow::{Context, Result};
use clap::Parser;

use pdf_compress::cli::Args;
use pdf_compress::config::SearchSettings;
use pdf_compress::model::format_file_size;
use pdf_compress::{analyze_file, default_engine, recommend, SizeTargetSearch};

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    env_logger::Builder::new()
        .filter_level(match args.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .init();

    // Build settings from CLI args
    let settings = SearchSettings::from_args(&args).with_context(|| "Invalid arguments")?;

    let output_path = args.output_path();
    let engine = default_engine();

    if args.analyze {
        let analysis = analyze_file(&engine, &args.input)
            .with_context(|| format!("Failed to analyze {}", args.input.display()))?;
        println!("Pages: {}", analysis.page_count);
        println!("Images: {}", analysis.image_count);
        println!("Average image DPI: {:.0}", analysis.average_dpi);
        println!("Image heavy: {}", analysis.image_heavy);
        println!("Text heavy: {}", analysis.text_heavy);
        println!("Recommended strategy: {}", recommend(&analysis));
    }

    log::info!(
        "Compressing {} to {}",
        args.input.display(),
        format_file_size(settings.target_size_bytes)
    );

    let search = SizeTargetSearch::new(engine, settings);
    let report = search
        .compress(&args.input, Some(&output_path))
        .with_context(|| format!("Failed to compress {}", args.input.display()))?;

    println!("Original size: {}", format_file_size(report.original_size));
    println!("Final size: {}", format_file_size(report.final_size));
    println!("Reduction: {:.1}%", report.reduction_percent());
    if let Some(candidate) = report.selected {
        println!("Settings: {}", candidate);
    }
    println!("Successfully wrote PDF to {}", report.output.display());

    Ok(())
}
