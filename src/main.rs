use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use pd3::bitmap::{BitmapProbe, DibProbe};
use pd3::container::Container;
use pd3::extract::{extract, extract_to_dir, parse_bitmap_stem, Extraction};
use pd3::format::DEFAULT_DEVICE;
use pd3::manifest::Manifest;
use pd3::rebuild::{rebuild, OverflowPolicy, Rebuilt};
use pd3::verify::Verifier;

#[derive(Parser)]
#[command(name = "pd3", about = "PD3 color-table container toolkit")]
struct Cli {
    /// Container file, or the extracted folder for `combine`
    #[arg(short, long)]
    input: PathBuf,
    /// Device id the container must address (decimal)
    #[arg(short, long, default_value_t = DEFAULT_DEVICE)]
    device: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full validation pipeline
    Verify,
    /// List table entries with dimensions and content hashes
    List,
    /// Extract bitmaps and the header sidecar into a folder
    Extract {
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Swap one bitmap by table index and rewrite the container
    Replace {
        /// Replacement BMP file
        #[arg(short, long)]
        bitmap: PathBuf,
        /// Table index to replace
        #[arg(long)]
        idx: u32,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Rebuild a container from an extracted folder
    Combine {
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    match cli.command {

        // ── Verify ───────────────────────────────────────────────────────────
        Commands::Verify => {
            let data = fs::read(&cli.input)?;
            let mut verifier = Verifier::new(&data, cli.device);
            match verifier.run() {
                Ok(ok) => {
                    println!("OK: {}", cli.input.display());
                    println!("  version  {}", ok.header.version_name());
                    println!(
                        "  entries  {} ({} bitmaps)",
                        ok.table.entries.len(),
                        ok.table.addresses().len()
                    );
                    println!("  size     {} B", data.len());
                }
                Err(err) => {
                    eprintln!("FAILED after {:?}: {}", verifier.stage(), err);
                    std::process::exit(1);
                }
            }
        }

        // ── List ─────────────────────────────────────────────────────────────
        Commands::List => {
            let container = Container::from_file(&cli.input, cli.device)?;
            println!("Container: {}", cli.input.display());
            println!("{:<7} {:>9} {:>12}  Content hash", "Index", "Size", "Length");
            for &(index, addr) in container.entries() {
                let Some(addr) = addr else {
                    println!("#{index:04}  {:>9}", "empty");
                    continue;
                };
                let tail = container.tail_from(addr);
                let info = DibProbe.probe(tail)?;
                let blob = &tail[..(info.declared_len as usize).min(tail.len())];
                let hash: [u8; 32] = blake3::hash(blob).into();
                println!(
                    "#{index:04}  {:>9} {:>12}  {}",
                    format!("{}x{}", info.width, info.height),
                    format!("{:#x} B", info.declared_len),
                    hex::encode(&hash[..6])
                );
            }
        }

        // ── Extract ──────────────────────────────────────────────────────────
        Commands::Extract { output } => {
            let container = Container::from_file(&cli.input, cli.device)?;
            let extraction = extract_to_dir(&container, &DibProbe, &output)?;
            let written = extraction.bitmaps.iter().filter(|(_, b)| b.is_some()).count();
            println!(
                "Extracted {}/{} files to {}",
                written,
                extraction.bitmaps.len(),
                output.display()
            );
        }

        // ── Replace ──────────────────────────────────────────────────────────
        Commands::Replace { bitmap, idx, output } => {
            let container = Container::from_file(&cli.input, cli.device)?;
            let replacement = fs::read(&bitmap)?;
            // the new blob must at least look like a bitmap
            DibProbe.probe(&replacement)?;
            let Extraction { manifest, bitmaps } = extract(&container, &DibProbe)?;
            let mut blobs: BTreeMap<u32, Vec<u8>> = bitmaps
                .into_iter()
                .filter_map(|(index, blob)| blob.map(|b| (index, b)))
                .collect();
            blobs.insert(idx, replacement);
            let rebuilt = rebuild(&manifest, &blobs, OverflowPolicy::Report)?;
            report_overflow(&rebuilt);
            fs::write(&output, &rebuilt.bytes)?;
            println!("Replaced #{idx:04}, wrote {}", output.display());
        }

        // ── Combine ──────────────────────────────────────────────────────────
        Commands::Combine { output } => {
            let manifest = Manifest::load(&cli.input)?;
            let mut blobs: BTreeMap<u32, Vec<u8>> = BTreeMap::new();
            for entry in fs::read_dir(&cli.input)? {
                let path = entry?.path();
                if path.extension().map_or(true, |ext| ext != "bmp") {
                    continue;
                }
                let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                    continue;
                };
                let Some((index, width, height)) = parse_bitmap_stem(stem) else {
                    eprintln!("  skipped {} (want NNNN-WxH.bmp)", path.display());
                    continue;
                };
                match manifest.table.get(&index) {
                    None => {
                        eprintln!("  warning: #{index:04} is not in the sidecar, the table will grow")
                    }
                    Some(slot) => {
                        if let Some((sw, sh)) = slot.size {
                            if (sw, sh) != (width, height) {
                                eprintln!(
                                    "  warning: {} dimensions differ from the sidecar ({sw}x{sh} there)",
                                    path.display()
                                );
                            }
                        }
                    }
                }
                blobs.insert(index, fs::read(&path)?);
            }
            let rebuilt = rebuild(&manifest, &blobs, OverflowPolicy::Report)?;
            report_overflow(&rebuilt);
            fs::write(&output, &rebuilt.bytes)?;
            println!("Combined {} bitmaps into {}", blobs.len(), output.display());
        }
    }

    Ok(())
}

// ── helpers ──────────────────────────────────────────────────────────────────

fn report_overflow(rebuilt: &Rebuilt) {
    if let Some(overflow) = rebuilt.overflow {
        eprintln!(
            "  warning: max size exceeded by {} B (capacity {} B)",
            overflow.needed.saturating_sub(overflow.capacity),
            overflow.capacity
        );
    }
}
