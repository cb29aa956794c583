//! Resample per-vertex data from one subject's surface to another's.

use clap::Parser;
use log::debug;

use std::path::PathBuf;
use std::process::ExitCode;

use cortexmap::config::SubjectsConfig;
use cortexmap::error::Result;
use cortexmap::format::DataFormat;
use cortexmap::interp::{InterpParams, InterpolationMode};
use cortexmap::logging::init_logging;
use cortexmap::resample::{run_surface_to_surface, HemiPair, ResampleJob};

/// Interpolate surface data (curv, mgh or mgz) from one FreeSurfer subject to another through their
/// spherical registrations.
///
/// `<hemi>` is lh, rh, or `<from>:<to>` like lh:rh to map between hemispheres via fsaverage_sym.
#[derive(Clone, Debug, Parser)]
#[command(name = "surf2surf", version)]
struct Args {
    /// Hemisphere, or source and target hemisphere separated by a colon
    hemi: HemiPair,
    /// Subject the data belongs to
    from_subject: String,
    /// Per-vertex data file of the source subject
    surf_file: PathBuf,
    /// Subject to interpolate onto
    to_subject: String,
    /// Output file (mgh, mgz)
    out_file: PathBuf,

    /// Use the value of the nearest vertex instead of barycentric interpolation
    #[arg(short = 'n', long)]
    nearest: bool,
    /// Value for target vertices whose source values are missing
    #[arg(short = 'f', long, default_value = "0", allow_negative_numbers = true)]
    fill: f32,
    /// Template subject to register through (default: fsaverage, or fsaverage_sym when needed)
    #[arg(long)]
    registration: Option<String>,
    /// Format of the input file (curv, mgh, mgz; default: from the file name)
    #[arg(long)]
    in_format: Option<DataFormat>,
    /// Format of the output file (mgh, mgz; default: from the file name)
    #[arg(long)]
    out_format: Option<DataFormat>,
    /// Additional colon-separated subject directories, searched before $SUBJECTS_DIR
    #[arg(long)]
    subjects_dir: Option<String>,

    /// Report progress
    #[arg(short = 'v', long)]
    verbose: bool,
}


fn run(args: Args) -> Result<()> {
    let mut config = SubjectsConfig::from_env();
    if let Some(dirs) = &args.subjects_dir {
        config.add_dirs(dirs);
    }
    debug!("Subject directories: {:?}", config.subjects_dirs);

    let mode = if args.nearest {
        InterpolationMode::Nearest
    } else {
        InterpolationMode::Barycentric
    };
    let job = ResampleJob {
        hemis: args.hemi,
        from_subject: args.from_subject,
        to_subject: args.to_subject,
        input: args.surf_file,
        output: args.out_file,
        in_format: args.in_format,
        out_format: args.out_format,
        registration: args.registration,
        params: InterpParams { mode, fill: args.fill, ..InterpParams::default() },
    };
    run_surface_to_surface(&config, &job)?;
    Ok(())
}


fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("surf2surf: {}", err);
            ExitCode::FAILURE
        }
    }
}
