use clap::{ArgAction, Parser, ValueEnum};
use log::{debug, error, info};
use std::path::PathBuf;
use taxaheat::views::{output_path, prepare_output_dir, reduce_views, write_matrix_tsv};
use taxaheat::{
    render_heatmap, AbundanceTable, HeatmapError, InputFormat, Linkage, OutputFormat, Reduction,
    RenderOptions, Result, ViewSettings, STANDARD_VIEWS,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliLinkage {
    /// Size-weighted mean distance between clusters (UPGMA).
    Average,
    /// Nearest members.
    Single,
    /// Farthest members.
    Complete,
}

impl From<CliLinkage> for Linkage {
    fn from(linkage: CliLinkage) -> Self {
        match linkage {
            CliLinkage::Average => Linkage::Average,
            CliLinkage::Single => Linkage::Single,
            CliLinkage::Complete => Linkage::Complete,
        }
    }
}

/// Accepts yes/true/t/y/1 and no/false/f/n/0, case-insensitively.
fn parse_bool(value: &str) -> std::result::Result<bool, String> {
    match value.to_ascii_lowercase().as_str() {
        "yes" | "true" | "t" | "y" | "1" => Ok(true),
        "no" | "false" | "f" | "n" | "0" => Ok(false),
        _ => Err("Boolean value expected.".to_string()),
    }
}

#[derive(Parser)]
#[command(name = "taxaheat")]
#[command(about = "Draw abundance heatmaps from a virID or PathSeq hit table.", long_about = None)]
struct Args {
    // MANDATORY OPTIONS
    /// Input hit table (TSV).
    #[arg(short = 'i', long = "input-df", value_name = "FILE")]
    input_df: PathBuf,

    /// Layout of the input table: virID or pathseq.
    #[arg(short = 'f', long = "input-format", value_name = "FORMAT", value_parser = parse_input_format)]
    input_format: InputFormat,

    /// Prefix of the output heatmaps; its directory is created when missing.
    #[arg(short = 'o', long = "output-prefix", value_name = "PREFIX")]
    output_prefix: String,

    /// Keep the top N taxa by mean abundance.
    #[arg(short = 't', long = "top-number-of-rows", value_name = "N")]
    top_number_of_rows: usize,

    // Table Options
    /// Remove this suffix from the sample column names.
    #[arg(short = 'r', long = "remove-suffix", value_name = "STRING", default_value = "")]
    remove_suffix: String,

    // Heatmap Options
    /// Image format, chosen by extension (png, svg, jpg, ...).
    #[arg(short = 'F', long = "output-format", value_name = "EXT", default_value = "png")]
    output_format: String,

    /// Cluster the samples (columns).
    #[arg(short = 'c', long = "cluster-samples", value_name = "BOOL", default_value = "true",
          value_parser = parse_bool, action = ArgAction::Set)]
    cluster_samples: bool,

    /// Cluster the taxa (rows).
    #[arg(short = 'C', long = "cluster-taxa", value_name = "BOOL", default_value = "true",
          value_parser = parse_bool, action = ArgAction::Set)]
    cluster_taxa: bool,

    /// Linkage used for hierarchical clustering.
    #[arg(long = "linkage", value_enum, default_value_t = CliLinkage::Average)]
    linkage: CliLinkage,

    /// The size in pixels of one heatmap cell.
    #[arg(long = "cell-size", value_name = "N", default_value_t = 16)]
    cell_size: u32,

    /// Truncate taxon and sample labels to this many characters.
    #[arg(long = "max-label-chars", value_name = "N", default_value_t = 40)]
    max_label_chars: usize,

    /// Also write each heatmap matrix as <PREFIX>_<view>.tsv.
    #[arg(long = "write-matrices")]
    write_matrices: bool,

    // General Options
    /// Number of threads to use for parallel operations.
    #[arg(long = "threads", value_name = "N")]
    threads: Option<usize>,

    /// Verbosity level (0 = error, 1 = info, 2 = debug).
    #[arg(short = 'v', long = "verbose", value_name = "N", default_value_t = 1)]
    verbose: u8,
}

fn parse_input_format(value: &str) -> std::result::Result<InputFormat, String> {
    value.parse().map_err(|e: HeatmapError| e.to_string())
}

fn run(args: &Args) -> Result<()> {
    if args.cell_size == 0 {
        return Err(HeatmapError::InvalidArgument(
            "cell size must be at least 1".to_string(),
        ));
    }
    let format = OutputFormat::from_extension(&args.output_format)?;

    let table = AbundanceTable::from_tsv(&args.input_df, args.input_format, &args.remove_suffix)?;
    debug!("Output prefix {:?}, format {:?}", args.output_prefix, format);

    let settings = ViewSettings {
        top_n: args.top_number_of_rows,
        cluster_taxa: args.cluster_taxa,
        cluster_samples: args.cluster_samples,
    };
    let options = RenderOptions {
        cell_size: args.cell_size,
        linkage: args.linkage.into(),
        max_label_chars: args.max_label_chars,
        ..Default::default()
    };

    let results = reduce_views(&table, &STANDARD_VIEWS, &settings);

    info!("Writing heatmaps.");
    prepare_output_dir(&args.output_prefix)?;
    // File names keep the extension as given; detection is case-insensitive
    let extension = args.output_format.as_str();
    for (view, reduction) in &results {
        match reduction {
            Reduction::Matrix(matrix) => {
                let path = output_path(&args.output_prefix, view, extension);
                render_heatmap(matrix, &options, format, &path)?;
                if args.write_matrices {
                    write_matrix_tsv(matrix, &output_path(&args.output_prefix, view, "tsv"))?;
                }
            }
            Reduction::Empty { reason, .. } => {
                info!("Skipping {}: {:?}", view.name, reason);
            }
        }
    }
    Ok(())
}

fn main() {
    let args = Args::parse();

    // Initialize logger based on verbosity
    env_logger::Builder::new()
        .filter_level(match args.verbose {
            0 => log::LevelFilter::Error,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .init();

    if let Some(threads) = args.threads {
        if let Err(e) = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
        {
            eprintln!("Error configuring thread pool: {}", e);
            std::process::exit(1);
        }
    }

    info!("Starting...");

    if let Err(e) = run(&args) {
        error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    info!("Finished.");
}
