//! Map per-vertex surface data of a subject into its cortical ribbon volume.

use clap::Parser;
use log::debug;

use std::path::PathBuf;
use std::process::ExitCode;

use cortexmap::config::SubjectsConfig;
use cortexmap::error::Result;
use cortexmap::format::DataFormat;
use cortexmap::logging::init_logging;
use cortexmap::ribbon::{
    run_surface_to_ribbon, OutputDataType, RibbonArgs, RibbonJob, RibbonMethod, RibbonParams,
};
use cortexmap::subject::MeshKind;

static ARGS_IO: &str = "Input/output";
static ARGS_MAPPING: &str = "Mapping parameters";

static USAGE: &str = "surf2ribbon [OPTIONS] [SUBJECT] <SURFACE> <HEMI-OR-SURFACE2> <OUT>
       surf2ribbon [OPTIONS] --lh <FILE> --rh <FILE> [SUBJECT] <OUT>
       surf2ribbon [OPTIONS] --lh <FILE> [SUBJECT] [RH-FILE] <OUT>";

/// Project surface data (curv, mgh or mgz) into the ribbon of a FreeSurfer subject.
///
/// If the second to last argument is a hemisphere name (lh, rh), `<surface>` holds data of that
/// hemisphere only; otherwise it is the data file of the right hemisphere and `<surface>` that of
/// the left, swapped if only the reverse matches the vertex counts. Of four arguments, the subject
/// may be at any position. Files given with --lh and --rh are used as given. Without a subject,
/// $SUBJECT is used.
#[derive(Clone, Debug, Parser)]
#[command(name = "surf2ribbon", version, override_usage = USAGE)]
struct Args {
    /// Subject, data files and output, see the usage
    #[arg(help_heading = ARGS_IO, num_args = 1..=4, required = true, value_name = "ARG")]
    positional: Vec<String>,
    /// Data file of the left hemisphere
    #[arg(help_heading = ARGS_IO, short = 'l', long, value_name = "FILE")]
    lh: Option<PathBuf>,
    /// Data file of the right hemisphere
    #[arg(help_heading = ARGS_IO, short = 'r', long, value_name = "FILE")]
    rh: Option<PathBuf>,
    /// Format of the input data files (curv, mgh, mgz; default: from the file name)
    #[arg(help_heading = ARGS_IO, long)]
    in_format: Option<DataFormat>,
    /// Format of the output volume (mgh, mgz; default: from the file name)
    #[arg(help_heading = ARGS_IO, long)]
    out_format: Option<DataFormat>,
    /// Additional colon-separated subject directories, searched before $SUBJECTS_DIR
    #[arg(help_heading = ARGS_IO, long)]
    subjects_dir: Option<String>,

    /// Maximum number of vertices contributing to a voxel
    #[arg(help_heading = ARGS_MAPPING, short = 'k', long, default_value = "12")]
    k: usize,
    /// Maximum distance in mm of a contributing vertex
    #[arg(help_heading = ARGS_MAPPING, short = 'd', long = "distance", default_value = "4.0")]
    max_distance: f32,
    /// Standard deviation of the Gaussian weights in mm
    #[arg(help_heading = ARGS_MAPPING, short = 's', long, default_value = "0.3536")]
    sigma: f32,
    /// How neighbor values are combined (weighted, max)
    #[arg(help_heading = ARGS_MAPPING, short = 'm', long, default_value = "weighted")]
    method: RibbonMethod,
    /// Value of voxels outside the ribbon or without vertices in range
    #[arg(
        help_heading = ARGS_MAPPING,
        short = 'f',
        long,
        default_value = "0",
        allow_negative_numbers = true
    )]
    fill: f32,
    /// Data type of the output volume (float, int)
    #[arg(help_heading = ARGS_MAPPING, short = 't', long = "type", default_value = "float")]
    dtype: OutputDataType,
    /// Surface the data lives on (white, pial, midgray)
    #[arg(help_heading = ARGS_MAPPING, long, default_value = "midgray")]
    mesh: MeshKind,

    /// Report progress
    #[arg(short = 'v', long)]
    verbose: bool,
}


fn job_from_args(config: &SubjectsConfig, args: &Args) -> Result<RibbonJob> {
    let RibbonArgs { subject, inputs, output } =
        RibbonArgs::resolve(config, &args.positional, args.lh.clone(), args.rh.clone())?;

    Ok(RibbonJob {
        subject,
        inputs,
        output,
        in_format: args.in_format,
        out_format: args.out_format,
        mesh: args.mesh,
        params: RibbonParams {
            k: args.k,
            max_distance: args.max_distance,
            sigma: args.sigma,
            method: args.method,
            fill: args.fill,
            dtype: args.dtype,
        },
    })
}


fn run(args: &Args) -> Result<()> {
    let mut config = SubjectsConfig::from_env();
    if let Some(dirs) = &args.subjects_dir {
        config.add_dirs(dirs);
    }
    debug!("Subject directories: {:?}", config.subjects_dirs);

    let job = job_from_args(&config, args)?;
    run_surface_to_ribbon(&config, &job)?;
    Ok(())
}


fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("surf2ribbon: {}", err);
            ExitCode::FAILURE
        }
    }
}
