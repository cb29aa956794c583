//! Resampling of per-vertex data from one subject's surface to another's through their
//! registration spheres.

use log::{debug, info};

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::config::SubjectsConfig;
use crate::error::{CortexmapError, Result};
use crate::format::{
    check_writable, read_surface_data, value_range, write_surface_data, DataFormat,
};
use crate::fs_surface::{read_surf, BrainMesh};
use crate::interp::{InterpParams, Interpolator};
use crate::registration;
use crate::subject::Hemi;


/// Source and target hemisphere, written as `lh`, `rh` or `<from>:<to>` like `lh:rh`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HemiPair {
    pub from: Hemi,
    pub to: Hemi,
}


impl HemiPair {
    pub fn is_cross_hemisphere(&self) -> bool {
        self.from != self.to
    }
}


impl fmt::Display for HemiPair {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_cross_hemisphere() {
            write!(f, "{}:{}", self.from, self.to)
        } else {
            write!(f, "{}", self.from)
        }
    }
}


impl FromStr for HemiPair {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<HemiPair, String> {
        match s.split_once(':') {
            Some((from, to)) => Ok(HemiPair { from: from.parse()?, to: to.parse()? }),
            None => {
                let hemi: Hemi = s.parse()?;
                Ok(HemiPair { from: hemi, to: hemi })
            }
        }
    }
}


/// Interpolate `data`, given on the vertices of `source_sphere`, at the vertices of
/// `target_sphere`. Both spheres must share a parameterization.
pub fn resample(
    source_sphere: &BrainMesh,
    data: &[f32],
    target_sphere: &BrainMesh,
    params: &InterpParams,
) -> Result<Vec<f32>> {
    let interpolator = Interpolator::new(source_sphere)?;
    interpolator.interpolate(data, &target_sphere.vertex_points(), params)
}


/// Everything one surface-to-surface run needs besides the subject database.
#[derive(Debug, Clone)]
pub struct ResampleJob {
    pub hemis: HemiPair,
    pub from_subject: String,
    pub to_subject: String,
    pub input: PathBuf,
    pub output: PathBuf,
    pub in_format: Option<DataFormat>,
    pub out_format: Option<DataFormat>,
    /// Template subject to register through instead of the default one.
    pub registration: Option<String>,
    pub params: InterpParams,
}


/// Resample the job's input file from the source to the target subject and write the result.
/// Returns the resampled values, one per target vertex.
pub fn run_surface_to_surface(config: &SubjectsConfig, job: &ResampleJob) -> Result<Vec<f32>> {
    if job.from_subject == job.to_subject {
        return Err(CortexmapError::IdenticalSubjects(job.from_subject.clone()));
    }
    let out_format = DataFormat::or_infer_output(job.out_format, &job.output)?;
    check_writable(out_format, "surf2surf")?;

    let from = config.find_subject(&job.from_subject)?;
    let to = config.find_subject(&job.to_subject)?;
    // One subject may be given by id and the other by path.
    if from.id == to.id || from.path == to.path {
        return Err(CortexmapError::IdenticalSubjects(from.id));
    }
    let corr = registration::resolve(
        &from,
        job.hemis.from,
        &to,
        job.hemis.to,
        job.registration.as_deref(),
    )?;

    let source_sphere = read_surf(&corr.source_sphere)?.mesh;
    let target_sphere = read_surf(&corr.target_sphere)?.mesh;

    let in_format = DataFormat::or_infer(job.in_format, &job.input);
    debug!("Reading {} data from {}", in_format, job.input.display());
    let data = read_surface_data(&job.input, in_format)?;
    if data.len() != source_sphere.num_vertices() {
        return Err(CortexmapError::DataLengthMismatch(
            format!("Input {}", job.input.display()),
            source_sphere.num_vertices(),
            data.len(),
        ));
    }

    info!(
        "Interpolating {} values from {}.{} to {} vertices of {}.{} ({:?})",
        data.len(),
        from.id,
        job.hemis.from,
        target_sphere.num_vertices(),
        to.id,
        job.hemis.to,
        job.params.mode
    );
    let result = resample(&source_sphere, &data, &target_sphere, &job.params)?;

    if let Some((min, max)) = value_range(&result) {
        info!("Output value range [{}, {}]", min, max);
    }
    write_surface_data(&job.output, out_format, &result, "surf2surf")?;
    info!("Wrote {}", job.output.display());
    Ok(result)
}
