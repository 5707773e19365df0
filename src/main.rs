//! hltex CLI - command-line tool for inspecting and converting DDS textures.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use memmap2::Mmap;
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use tracing_subscriber::EnvFilter;

use hltex::prelude::*;

/// hltex - DDS texture inspection tool
#[derive(Parser)]
#[command(name = "hltex")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the headers of a DDS file
    Info {
        /// Input DDS file
        input: PathBuf,

        /// Reject headers with non-standard declared sizes
        #[arg(long)]
        strict: bool,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Parse every DDS header under a directory
    Scan {
        /// Directory to walk
        dir: PathBuf,

        /// Filter pattern (glob-style, matched against the path)
        #[arg(short, long)]
        filter: Option<String>,
    },

    /// Decode a DDS file to PNG, or to a raw BGRA raster for any other extension
    Convert {
        /// Input DDS file
        input: PathBuf,

        /// Output file
        output: PathBuf,

        /// Reject headers with non-standard declared sizes
        #[arg(long)]
        strict: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Info { input, strict, json } => {
            cmd_info(&input, validation(strict), json)?;
        }
        Commands::Scan { dir, filter } => {
            cmd_scan(&dir, filter.as_deref())?;
        }
        Commands::Convert {
            input,
            output,
            strict,
        } => {
            cmd_convert(&input, &output, validation(strict))?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn validation(strict: bool) -> Validation {
    if strict {
        Validation::Strict
    } else {
        Validation::Tolerant
    }
}

fn cmd_info(input: &Path, validation: Validation, json: bool) -> Result<()> {
    let data = fs::read(input).context("Failed to read input file")?;
    let file = DdsFile::parse_with(&data, validation).context("Failed to parse DDS headers")?;
    let header = file.header();

    if json {
        let value = serde_json::json!({
            "header": header,
            "layout": header.layout(),
            "dx10": file.dx10(),
            "format": file.format(),
            "data_offset": file.data_offset(),
            "payload_len": file.payload().len(),
            "mip_sizes": file.mip_sizes(),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    let pf = header.pixel_format();
    println!("File:         {}", input.display());
    println!("Size:         {}", header.size());
    println!("Flags:        {:#010x}", header.flags());
    println!("Dimensions:   {}x{} (depth {})", header.width(), header.height(), header.depth());
    println!("Pitch/linear: {}", header.pitch_or_linear_size());
    println!("Mipmaps:      {}", header.mipmap_count());
    println!(
        "Caps:         {:#010x} {:#010x} {:#010x} {:#010x}",
        header.caps(),
        header.caps2(),
        header.caps3(),
        header.caps4()
    );
    println!("Pixel format: size {} flags {:#x} FourCC {:?}", pf.size(), pf.flags(), pf.four_cc().to_string());

    match header.layout() {
        PixelLayout::Uncompressed { rgb_bit_count, masks } => println!(
            "Layout:       uncompressed {}bpp R {:#010x} G {:#010x} B {:#010x} A {:#010x}",
            rgb_bit_count, masks.r, masks.g, masks.b, masks.a
        ),
        PixelLayout::LegacyCompressed { four_cc } => println!("Layout:       compressed ({four_cc})"),
        PixelLayout::Extended => println!("Layout:       DX10 extended"),
    }

    if let Some(dx10) = file.dx10() {
        println!(
            "DX10:         DXGI {} dimension {} array {} misc {:#x}/{:#x}",
            dx10.dxgi_format, dx10.resource_dimension, dx10.array_size, dx10.misc_flag, dx10.misc_flags2
        );
    }

    println!("Format:       {:?}", file.format());
    println!("Payload:      {} bytes at offset {}", file.payload().len(), file.data_offset());

    let mip_sizes = file.mip_sizes();
    if !mip_sizes.is_empty() {
        let expected: usize = mip_sizes.iter().sum();
        println!("Mip chain:    {} bytes in {} levels", expected, mip_sizes.len());
    }

    Ok(())
}

fn cmd_scan(dir: &Path, filter: Option<&str>) -> Result<()> {
    let pattern = filter
        .map(glob::Pattern::new)
        .transpose()
        .context("Invalid filter pattern")?;

    let (paths, walk_failures) = collect_dds_paths(dir, pattern.as_ref());
    println!("Scanning {} DDS files in {}...", paths.len(), dir.display());

    let pb = ProgressBar::new(paths.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("#>-"),
    );

    let start = Instant::now();
    let results: Vec<(PathBuf, Result<TextureFormat>)> = paths
        .into_par_iter()
        .map(|path| {
            let result = scan_file(&path);
            pb.inc(1);
            (path, result)
        })
        .collect();
    pb.finish_with_message("Done");

    let mut formats: FxHashMap<TextureFormat, usize> = FxHashMap::default();
    let mut failures = walk_failures;
    for (path, result) in results {
        match result {
            Ok(format) => *formats.entry(format).or_default() += 1,
            Err(e) => failures.push((path, e)),
        }
    }

    let mut formats: Vec<_> = formats.into_iter().collect();
    formats.sort_by(|a, b| b.1.cmp(&a.1));
    for (format, count) in &formats {
        println!("{:>8} {:?}", count, format);
    }

    for (path, e) in &failures {
        eprintln!("Error parsing {}: {:#}", path.display(), e);
    }

    println!(
        "Scanned in {:?} ({} errors)",
        start.elapsed(),
        failures.len()
    );

    Ok(())
}

/// Walk `dir` for `.dds` files matching `pattern`. Entries that could not be
/// read are returned alongside so they count as scan errors.
fn collect_dds_paths(
    dir: &Path,
    pattern: Option<&glob::Pattern>,
) -> (Vec<PathBuf>, Vec<(PathBuf, anyhow::Error)>) {
    let mut paths = Vec::new();
    let mut failures = Vec::new();

    for entry in walkdir::WalkDir::new(dir) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let path = e.path().map_or_else(|| dir.to_path_buf(), Path::to_path_buf);
                failures.push((path, anyhow::Error::from(e).context("Failed to walk directory")));
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.into_path();
        let is_dds = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("dds"));
        if is_dds && pattern.map_or(true, |pat| pat.matches_path(&path)) {
            paths.push(path);
        }
    }

    (paths, failures)
}

fn scan_file(path: &Path) -> Result<TextureFormat> {
    let file = File::open(path)?;
    if file.metadata()?.len() == 0 {
        // Zero-length files cannot be mapped.
        return Err(hltex::dds::Error::TruncatedInput {
            needed: hltex::dds::HEADER_LEN,
            available: 0,
        }
        .into());
    }

    let mmap = unsafe { Mmap::map(&file)? };
    let dds = DdsFile::parse(&mmap)?;
    Ok(dds.format())
}

fn cmd_convert(input: &Path, output: &Path, validation: Validation) -> Result<()> {
    println!("Converting: {} -> {}", input.display(), output.display());

    let data = fs::read(input).context("Failed to read input file")?;
    let decoder = BcnDecoder::new();

    let is_png = output
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("png"));

    if is_png {
        parse_header_with(&data, validation).context("Failed to parse DDS header")?;
        let image = decoder.decode(&data).context("Failed to decode DDS payload")?;
        image::save_buffer(
            output,
            &image.data,
            image.width,
            image.height,
            image::ColorType::Rgba8,
        )
        .context("Failed to write PNG")?;
        println!("Wrote {}x{} PNG", image.width, image.height);
    } else {
        let raster = decode_to_bgra_with(&data, &decoder, validation)
            .context("Failed to decode DDS file")?;
        fs::write(output, &raster.pixels).context("Failed to write output file")?;
        println!("Wrote {}x{} BGRA raster", raster.width, raster.height);
    }

    Ok(())
}
