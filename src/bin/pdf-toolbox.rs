//! PDF Toolbox CLI tool
//!
//! A command-line tool for merging, splitting, resizing and rotating PDFs.

use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use glob::glob;
use tracing::warn;

use pdf_toolbox::config::PipelineConfig;
use pdf_toolbox::pdf::{
    extract_metadata, merge_documents, split_document, MergeOptions, NormalizeMode, NormalizeSettings, Rotation,
    RotationMap, SplitGranularity,
};
use pdf_toolbox::source::file_sources;
use pdf_toolbox::{ByteSource, Error, FileSource, MergeRequest, PageOrderSpec, PaperSize, Session, SourceDocument};

/// PDF Toolbox - Merge, split, resize and rotate PDFs
#[derive(Parser)]
#[command(name = "pdf-toolbox")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    # Merge PDFs in argument order
    pdf-toolbox merge -o combined.pdf cover.pdf \"chapters/*.pdf\"

    # Merge onto A4 pages and turn the third page sideways
    pdf-toolbox merge -o handout.pdf --normalize --rotate 3=90 a.pdf b.pdf

    # Split into three-page parts
    pdf-toolbox split report.pdf --pages-per-part 3 --out-dir parts/

    # Crop every page of a scan to Letter
    pdf-toolbox normalize scan.pdf -o scan-letter.pdf --paper letter --mode crop")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge multiple PDF files into one
    Merge {
        /// Input PDF files (in order). Supports glob patterns like "*.pdf"
        #[arg(required = true)]
        inputs: Vec<String>,

        /// Output PDF file path (default: <first input>_merged.pdf)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Comma-separated file names giving the merge order; unlisted inputs are left out
        #[arg(long, value_delimiter = ',')]
        order: Option<Vec<String>>,

        /// Normalize every page to the target paper size first
        #[arg(long)]
        normalize: bool,

        /// Target paper size: a3, a4, a5, letter, legal or <w>x<h> in points
        #[arg(long, value_parser = parse_paper)]
        paper: Option<PaperSize>,

        /// Normalization mode: crop or fit-centered
        #[arg(long, value_parser = parse_mode)]
        mode: Option<NormalizeMode>,

        /// Rotate a page of the merged output, e.g. "3=90" (repeatable)
        #[arg(long, value_parser = parse_rotation)]
        rotate: Vec<(u32, i64)>,

        /// JSON configuration file; flags override its values
        #[arg(long)]
        config: Option<PathBuf>,

        /// Open the output file after creation
        #[arg(long)]
        open: bool,
    },

    /// Split a PDF into single pages or page groups
    Split {
        /// PDF file to split
        input: PathBuf,

        /// One output file per page (default)
        #[arg(long, conflicts_with = "pages_per_part")]
        each_page: bool,

        /// Number of pages per output file
        #[arg(long)]
        pages_per_part: Option<u32>,

        /// Directory for the output files
        #[arg(short = 'd', long, default_value = ".")]
        out_dir: PathBuf,

        /// JSON configuration file; flags override its values
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Bring every page of a PDF to one paper size
    Normalize {
        /// Input PDF file
        input: PathBuf,

        /// Output PDF file path
        #[arg(short, long)]
        output: PathBuf,

        /// Target paper size: a3, a4, a5, letter, legal or <w>x<h> in points
        #[arg(long, value_parser = parse_paper, default_value = "a4")]
        paper: PaperSize,

        /// Normalization mode: crop or fit-centered
        #[arg(long, value_parser = parse_mode, default_value = "fit-centered")]
        mode: NormalizeMode,
    },

    /// Rotate pages of a PDF
    Rotate {
        /// Input PDF file
        input: PathBuf,

        /// Output PDF file path
        #[arg(short, long)]
        output: PathBuf,

        /// Page rotation, e.g. "1=90" (repeatable)
        #[arg(long, required = true, value_parser = parse_rotation)]
        rotate: Vec<(u32, i64)>,
    },

    /// Show information about PDF files
    Info {
        /// PDF files to inspect. Supports glob patterns like "*.pdf"
        #[arg(required = true)]
        inputs: Vec<String>,
    },
}

fn main() {
    init_logging();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Merge {
            inputs,
            output,
            order,
            normalize,
            paper,
            mode,
            rotate,
            config,
            open,
        } => cmd_merge(inputs, output, order, normalize, paper, mode, rotate, config, open),
        Commands::Split {
            input,
            each_page,
            pages_per_part,
            out_dir,
            config,
        } => cmd_split(input, each_page, pages_per_part, out_dir, config),
        Commands::Normalize {
            input,
            output,
            paper,
            mode,
        } => cmd_normalize(input, output, paper, mode),
        Commands::Rotate { input, output, rotate } => cmd_rotate(input, output, rotate),
        Commands::Info { inputs } => cmd_info(inputs),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let format = fmt::format().with_target(false).compact();

    // Use RUST_LOG if set, otherwise default to info level for our crate
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pdf_toolbox=info"));

    tracing_subscriber::registry()
        .with(fmt::layer().event_format(format).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn parse_paper(s: &str) -> std::result::Result<PaperSize, String> {
    s.parse().map_err(|e: Error| e.to_string())
}

fn parse_mode(s: &str) -> std::result::Result<NormalizeMode, String> {
    s.parse().map_err(|e: Error| e.to_string())
}

/// Parse "<page>=<degrees>"
fn parse_rotation(s: &str) -> std::result::Result<(u32, i64), String> {
    let (page, degrees) = s
        .split_once('=')
        .ok_or_else(|| format!("expected <page>=<degrees>, got '{}'", s))?;
    let page: u32 = page
        .trim()
        .parse()
        .map_err(|_| format!("invalid page number '{}'", page.trim()))?;
    let degrees: i64 = degrees
        .trim()
        .parse()
        .map_err(|_| format!("invalid angle '{}'", degrees.trim()))?;
    Rotation::from_degrees(degrees).map_err(|e| e.to_string())?;
    Ok((page, degrees))
}

/// Expand glob patterns in input paths
///
/// Matches of one pattern are sorted; patterns keep their argument order.
fn expand_globs(patterns: Vec<String>) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();

    for pattern in patterns {
        // Check if pattern contains glob characters
        if pattern.contains('*') || pattern.contains('?') || pattern.contains('[') {
            let entries = glob(&pattern).map_err(|e| Error::InvalidGlob(format!("{}: {}", pattern, e)))?;
            let mut matched = Vec::new();
            for entry in entries {
                match entry {
                    Ok(path) => matched.push(path),
                    Err(e) => warn!(pattern = %pattern, error = %e, "glob error"),
                }
            }
            if matched.is_empty() {
                return Err(Error::NoFilesMatched(pattern).into());
            }
            matched.sort();
            paths.extend(matched);
        } else {
            // No glob characters, treat as literal path
            paths.push(PathBuf::from(pattern));
        }
    }

    Ok(paths)
}

/// Open a file with the system default application
fn open_file(path: &Path) -> Result<()> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg(path).spawn()?;
    }
    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open").arg(path).spawn()?;
    }
    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", "", &path.display().to_string()])
            .spawn()?;
    }
    Ok(())
}

/// Map `--order` entries onto upload names
///
/// An entry may be an upload name, an input path as given, or a bare file
/// name that only one input has. Anything else is passed through and
/// reported as unknown by the session.
fn order_spec(sources: &[FileSource], names: Vec<String>) -> PageOrderSpec {
    let resolved = names
        .into_iter()
        .map(|entry| {
            if sources.iter().any(|s| s.name() == entry) {
                return entry;
            }
            if let Some(given) = sources.iter().find(|s| s.path() == Path::new(&entry)) {
                return given.name().to_string();
            }
            let mut matches = sources.iter().filter(|s| s.file_name() == entry);
            match (matches.next(), matches.next()) {
                (Some(only), None) => only.name().to_string(),
                _ => entry,
            }
        })
        .collect();
    PageOrderSpec(resolved)
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    match path {
        Some(path) => PipelineConfig::load(path).with_context(|| format!("loading {}", path.display())),
        None => Ok(PipelineConfig::default()),
    }
}

fn load_source(path: &Path) -> Result<SourceDocument> {
    SourceDocument::load(&FileSource::new(path)).with_context(|| format!("reading {}", path.display()))
}

/// Merge multiple PDFs into one
#[allow(clippy::too_many_arguments)]
fn cmd_merge(
    inputs: Vec<String>,
    output: Option<PathBuf>,
    order: Option<Vec<String>>,
    normalize: bool,
    paper: Option<PaperSize>,
    mode: Option<NormalizeMode>,
    rotate: Vec<(u32, i64)>,
    config: Option<PathBuf>,
    open: bool,
) -> Result<()> {
    let mut config = load_config(config.as_deref())?;
    config.normalize |= normalize;
    if let Some(paper) = paper {
        config.target_paper_size = paper;
    }
    if let Some(mode) = mode {
        config.normalize_mode = mode;
    }
    config.rotations.extend(rotate);
    if let Some(output) = &output {
        config.output_file_name = output.file_name().map(|n| n.to_string_lossy().into_owned());
    }

    let inputs = expand_globs(inputs)?;

    let sources = file_sources(&inputs);
    let mut session = Session::new();
    for source in &sources {
        session
            .upload(source)
            .with_context(|| format!("reading {}", source.path().display()))?;
    }

    let order = order.map(|names| order_spec(&sources, names));
    let options = config.merge_options(&session.default_output_name(order.as_ref()))?;

    let preview = session.preview(order.as_ref(), None)?;
    eprintln!(
        "Merging {} PDF files ({} pages)...",
        preview.document_count, preview.total_pages
    );

    let merged = session.merge(&MergeRequest { order, options })?;

    let output_path = output.unwrap_or_else(|| PathBuf::from(merged.name()));
    merged.write_to(&output_path)?;

    eprintln!("Merged to: {}", output_path.display());

    if open {
        open_file(&output_path)?;
    }

    Ok(())
}

/// Split a PDF into parts
fn cmd_split(
    input: PathBuf,
    each_page: bool,
    pages_per_part: Option<u32>,
    out_dir: PathBuf,
    config: Option<PathBuf>,
) -> Result<()> {
    let config = load_config(config.as_deref())?;
    let granularity = match (each_page, pages_per_part) {
        (true, _) => SplitGranularity::EachPage,
        (false, Some(n)) => SplitGranularity::GroupOf(n),
        (false, None) => config.split_granularity,
    };

    let source = load_source(&input)?;
    eprintln!("Splitting {} ({} pages, {})...", source.name(), source.page_count(), granularity);

    let parts = split_document(&source, granularity)?;

    std::fs::create_dir_all(&out_dir).with_context(|| format!("creating {}", out_dir.display()))?;
    for part in &parts {
        let path = part.write_to_dir(&out_dir)?;
        eprintln!("  {} (pages {}-{})", path.display(), part.first_page(), part.last_page());
    }

    eprintln!("Wrote {} files to {}", parts.len(), out_dir.display());
    Ok(())
}

fn single_output_name(output: &Path) -> String {
    output
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output.pdf".to_string())
}

/// Normalize the page size of a PDF
fn cmd_normalize(input: PathBuf, output: PathBuf, paper: PaperSize, mode: NormalizeMode) -> Result<()> {
    let source = load_source(&input)?;
    let options =
        MergeOptions::new(single_output_name(&output)).with_normalize(NormalizeSettings { paper, mode });

    eprintln!("Normalizing {} pages to {} ({})...", source.page_count(), paper, mode);
    merge_documents(&[&source], &options)?.write_to(&output)?;

    eprintln!("Output: {}", output.display());
    Ok(())
}

/// Rotate pages of a PDF
fn cmd_rotate(input: PathBuf, output: PathBuf, rotate: Vec<(u32, i64)>) -> Result<()> {
    let source = load_source(&input)?;

    let mut rotations = RotationMap::new();
    for (page, degrees) in rotate {
        rotations.insert(page, degrees)?;
    }
    let options = MergeOptions::new(single_output_name(&output)).with_rotations(rotations);

    merge_documents(&[&source], &options)?.write_to(&output)?;

    eprintln!("Output: {}", output.display());
    Ok(())
}

/// Show information about PDFs
fn cmd_info(inputs: Vec<String>) -> Result<()> {
    let inputs = expand_globs(inputs)?;

    let mut total_pages = 0usize;
    for input in &inputs {
        let source = load_source(input)?;
        let metadata = extract_metadata(&source)?;
        let size = std::fs::metadata(input)?.len();

        println!("File: {}", input.display());
        println!("Size: {} bytes", size);
        println!("Pages: {}", metadata.page_count);

        if let Some(title) = &metadata.title {
            println!("Title: {}", title);
        }
        if let Some(author) = &metadata.author {
            println!("Author: {}", author);
        }
        for page in &metadata.pages {
            let rotation = match page.rotation.degrees() {
                0 => String::new(),
                degrees => format!(", rotated {}°", degrees),
            };
            println!("  Page {}: {:.1} x {:.1} pt{}", page.number, page.width, page.height, rotation);
        }
        println!();

        total_pages += metadata.page_count;
    }

    if inputs.len() > 1 {
        println!("Merging these {} files would produce {} pages", inputs.len(), total_pages);
    }

    Ok(())
}
