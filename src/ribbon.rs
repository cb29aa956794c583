//! Projection of per-vertex surface data into the cortical ribbon volume.
//!
//! Every cortex voxel of a hemisphere receives a Gaussian-weighted combination of the values of the
//! nearest vertices of that hemisphere's mesh, measured in tkregister space.

use log::{debug, info, warn};
use ndarray::{Array4, ShapeBuilder};

use std::path::PathBuf;
use std::str::FromStr;

use crate::config::SubjectsConfig;
use crate::error::{CortexmapError, Result};
use crate::format::{check_writable, read_surface_data, value_range, write_volume, DataFormat};
use crate::fs_mgh::{apply_affine, FsMgh, MRI_FLOAT, MRI_INT};
use crate::fs_surface::BrainMesh;
use crate::spatial::{Neighbor, VertexIndex};
use crate::subject::{Hemi, MeshKind};


/// How the values of the neighbors of a voxel are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RibbonMethod {
    /// Gaussian-weighted mean.
    Weighted,
    /// Value of the neighbor with the largest weight, i.e. the nearest one.
    Max,
}


impl FromStr for RibbonMethod {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<RibbonMethod, String> {
        match s.to_lowercase().as_str() {
            "weighted" => Ok(RibbonMethod::Weighted),
            "max" => Ok(RibbonMethod::Max),
            other => Err(format!("unknown method '{}', expected weighted or max", other)),
        }
    }
}


/// Data type of the output volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputDataType {
    Float,
    /// Values are rounded to the nearest integer.
    Int,
}


impl OutputDataType {
    /// The MGH data type code.
    pub fn mgh_dtype(self) -> i32 {
        match self {
            OutputDataType::Float => MRI_FLOAT,
            OutputDataType::Int => MRI_INT,
        }
    }
}


impl FromStr for OutputDataType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<OutputDataType, String> {
        match s.to_lowercase().as_str() {
            "float" => Ok(OutputDataType::Float),
            "int" => Ok(OutputDataType::Int),
            other => Err(format!("unknown data type '{}', expected float or int", other)),
        }
    }
}


#[derive(Debug, Clone, PartialEq)]
pub struct RibbonParams {
    /// Maximum number of vertices contributing to a voxel.
    pub k: usize,
    /// Maximum vertex distance in mm.
    pub max_distance: f32,
    /// Standard deviation of the Gaussian weight in mm.
    pub sigma: f32,
    pub method: RibbonMethod,
    /// Value of voxels outside the ribbon or without any vertex in range.
    pub fill: f32,
    pub dtype: OutputDataType,
}


impl Default for RibbonParams {
    fn default() -> RibbonParams {
        RibbonParams {
            k: 12,
            max_distance: 4.0,
            sigma: 0.3536,
            method: RibbonMethod::Weighted,
            fill: 0.0,
            dtype: OutputDataType::Float,
        }
    }
}


impl RibbonParams {
    pub fn validate(&self) -> Result<()> {
        if self.k == 0 {
            return Err(CortexmapError::InvalidArgument(
                "The number of neighbors k must be at least 1".to_string(),
            ));
        }
        if !(self.max_distance > 0.0) {
            return Err(CortexmapError::InvalidArgument(format!(
                "The maximum distance must be positive, got {}",
                self.max_distance
            )));
        }
        if !(self.sigma > 0.0) || self.sigma.is_infinite() {
            return Err(CortexmapError::InvalidArgument(format!(
                "Sigma must be positive and finite, got {}",
                self.sigma
            )));
        }
        Ok(())
    }
}


/// The mesh and per-vertex data of one hemisphere.
#[derive(Debug, Clone, Copy)]
pub struct HemiProjection<'a> {
    pub hemi: Hemi,
    pub mesh: &'a BrainMesh,
    pub data: &'a [f32],
}


/// Map surface data into the ribbon. The result has the geometry of `ribbon` and a single frame.
///
/// Voxels labeled as cortex of a hemisphere in `inputs` get a value from that hemisphere's
/// vertices, all other voxels get `params.fill`. The ribbon labels are read from its first frame.
pub fn surface_to_ribbon(
    ribbon: &FsMgh,
    inputs: &[HemiProjection],
    params: &RibbonParams,
) -> Result<FsMgh> {
    params.validate()?;
    for input in inputs.iter() {
        if input.data.len() != input.mesh.num_vertices() {
            return Err(CortexmapError::DataLengthMismatch(
                format!("{} surface data", input.hemi),
                input.mesh.num_vertices(),
                input.data.len(),
            ));
        }
    }

    let labels = ribbon.data_f32()?;
    let (d1, d2, d3, _) = ribbon.header.dims();
    let tkr = ribbon.header.vox2ras_tkr();
    let mut out = Array4::<f32>::from_elem((d1, d2, d3, 1).f(), params.fill);

    for input in inputs.iter() {
        let label = input.hemi.cortex_label() as f32;
        let index = VertexIndex::new(&input.mesh.vertex_points());
        let mut num_voxels = 0usize;
        let mut num_filled = 0usize;

        for ((i, j, k, f), value) in labels.indexed_iter() {
            if f != 0 || value.round() != label {
                continue;
            }
            num_voxels += 1;
            let p = apply_affine(&tkr, [i as f32, j as f32, k as f32]);
            let neighbors = index.nearest(&p, params.k, params.max_distance);
            match combine(&neighbors, input.data, params) {
                Some(v) => out[[i, j, k, 0]] = v,
                None => num_filled += 1,
            }
        }

        if num_voxels == 0 {
            warn!(
                "The ribbon contains no voxels with label {} for hemisphere {}",
                label, input.hemi
            );
        }
        debug!(
            "Hemisphere {}: {} ribbon voxels, {} without usable vertices",
            input.hemi, num_voxels, num_filled
        );
    }

    FsMgh::from_f32_data(&ribbon.header, out, params.dtype.mgh_dtype())
}


/// Combine the values of the neighbors of one voxel. `None` if no neighbor has a usable value.
fn combine(neighbors: &[Neighbor], data: &[f32], params: &RibbonParams) -> Option<f32> {
    let usable: Vec<(f32, f32)> = neighbors
        .iter()
        .map(|n| (n.distance, data[n.index]))
        .filter(|(_, v)| !v.is_nan())
        .collect();
    // Neighbors are sorted by distance, so the first usable one is the nearest.
    let &(dmin, nearest_value) = usable.first()?;

    match params.method {
        RibbonMethod::Max => Some(nearest_value),
        RibbonMethod::Weighted => {
            let two_s2 = 2.0 * (params.sigma as f64) * (params.sigma as f64);
            let dmin2 = (dmin as f64) * (dmin as f64);
            let mut sum_w = 0f64;
            let mut sum_wv = 0f64;
            for &(d, v) in usable.iter() {
                let w = (-((d as f64) * (d as f64) - dmin2) / two_s2).exp();
                sum_w += w;
                sum_wv += w * v as f64;
            }
            Some((sum_wv / sum_w) as f32)
        }
    }
}


/// Decide whether two data files given as (first, second) have to be swapped to become (lh, rh).
///
/// The first file is taken as left hemisphere data unless the lengths match only the swapped
/// assignment.
pub fn assign_hemispheres(
    first_len: usize,
    second_len: usize,
    lh_vertices: usize,
    rh_vertices: usize,
) -> bool {
    let as_given = first_len == lh_vertices && second_len == rh_vertices;
    let swapped = first_len == rh_vertices && second_len == lh_vertices;
    swapped && !as_given
}


/// The surface data files to project.
#[derive(Debug, Clone, PartialEq)]
pub enum RibbonInputs {
    /// Data for one hemisphere.
    Single(Hemi, PathBuf),
    /// Data for both hemispheres, nominally left then right. Swapped if the lengths say so.
    Pair(PathBuf, PathBuf),
    /// Data for both hemispheres, named explicitly.
    Both { lh: PathBuf, rh: PathBuf },
}


impl RibbonInputs {
    /// Interpret the two positional arguments `<surface> <hemi-or-surface2>`.
    pub fn from_args(first: PathBuf, second: &str) -> RibbonInputs {
        match second.parse::<Hemi>() {
            Ok(hemi) => RibbonInputs::Single(hemi, first),
            Err(_) => RibbonInputs::Pair(first, PathBuf::from(second)),
        }
    }
}


/// The subject, data files and output named on the command line.
#[derive(Debug, Clone, PartialEq)]
pub struct RibbonArgs {
    /// `None` uses the default subject.
    pub subject: Option<String>,
    pub inputs: RibbonInputs,
    pub output: PathBuf,
}


impl RibbonArgs {
    /// Resolve the positional arguments together with the `--lh` and `--rh` files.
    ///
    /// Without those files the positionals are `[<subject>] <surface> <hemi-or-surface2> <out>`.
    /// Of four positionals, the first one that is a known subject is the subject, at any position.
    /// With `--lh` or `--rh` the positionals are `[<subject>] [<file>] <out>` in any order of
    /// subject and file, and the file belongs to the other hemisphere.
    pub fn resolve(
        config: &SubjectsConfig,
        positional: &[String],
        lh: Option<PathBuf>,
        rh: Option<PathBuf>,
    ) -> Result<RibbonArgs> {
        let (out, rest) = positional.split_last().ok_or_else(|| {
            CortexmapError::InvalidArgument("No output file given".to_string())
        })?;
        let output = PathBuf::from(out);

        if lh.is_none() && rh.is_none() {
            let (subject, inputs) = match rest {
                [first, second] => (None, RibbonInputs::from_args(PathBuf::from(first), second)),
                [_, _, _] => {
                    // An unknown subject in the first position is reported by the lookup.
                    let idx = rest.iter().position(|a| config.is_subject(a)).unwrap_or(0);
                    let mut files: Vec<&String> = rest.iter().collect();
                    let subject = files.remove(idx).clone();
                    let inputs = RibbonInputs::from_args(PathBuf::from(files[0]), files[1]);
                    (Some(subject), inputs)
                }
                _ => {
                    return Err(CortexmapError::InvalidArgument(
                        "No surface data given, expected <surface> <hemi-or-surface2> <out> \
                         or --lh/--rh"
                            .to_string(),
                    ))
                }
            };
            return Ok(RibbonArgs { subject, inputs, output });
        }

        let too_many = || {
            CortexmapError::InvalidArgument(format!(
                "Too many arguments for the given --lh/--rh files: {}",
                positional.join(" ")
            ))
        };
        let (subject, other) = match rest {
            [] => (None, None),
            [a] if config.is_subject(a) => (Some(a.clone()), None),
            [a] => (None, Some(PathBuf::from(a))),
            [a, b] if config.is_subject(a) => (Some(a.clone()), Some(PathBuf::from(b))),
            [a, b] if config.is_subject(b) => (Some(b.clone()), Some(PathBuf::from(a))),
            [a, b] => {
                return Err(CortexmapError::InvalidArgument(format!(
                    "Neither '{}' nor '{}' is a subject",
                    a, b
                )))
            }
            _ => return Err(too_many()),
        };
        let inputs = match (lh, rh, other) {
            (Some(lh), Some(rh), None) => RibbonInputs::Both { lh, rh },
            (Some(lh), None, None) => RibbonInputs::Single(Hemi::Lh, lh),
            (None, Some(rh), None) => RibbonInputs::Single(Hemi::Rh, rh),
            (Some(lh), None, Some(rh)) | (None, Some(rh), Some(lh)) => {
                RibbonInputs::Both { lh, rh }
            }
            _ => return Err(too_many()),
        };
        Ok(RibbonArgs { subject, inputs, output })
    }
}


/// Everything one surface-to-ribbon run needs besides the subject database.
#[derive(Debug, Clone)]
pub struct RibbonJob {
    /// Subject id or path. `None` uses the default subject of the configuration.
    pub subject: Option<String>,
    pub inputs: RibbonInputs,
    pub output: PathBuf,
    pub in_format: Option<DataFormat>,
    pub out_format: Option<DataFormat>,
    pub mesh: MeshKind,
    pub params: RibbonParams,
}


/// Load the subject's ribbon, meshes and the data files, map the data into the ribbon and write
/// the volume.
pub fn run_surface_to_ribbon(config: &SubjectsConfig, job: &RibbonJob) -> Result<FsMgh> {
    let out_format = DataFormat::or_infer_output(job.out_format, &job.output)?;
    check_writable(out_format, "surf2ribbon")?;
    job.params.validate()?;

    let subject = match &job.subject {
        Some(id) => config.find_subject(id)?,
        None => config.default_subject()?,
    };
    info!("Mapping surface data of subject '{}' into its ribbon", subject.id);
    let ribbon = subject.read_ribbon()?;

    let read = |path: &PathBuf| -> Result<Vec<f32>> {
        let format = DataFormat::or_infer(job.in_format, path);
        debug!("Reading {} data from {}", format, path.display());
        read_surface_data(path, format)
    };

    let mut hemis: Vec<(Hemi, BrainMesh, Vec<f32>)> = Vec::new();
    match &job.inputs {
        RibbonInputs::Single(hemi, path) => {
            let mesh = subject.read_mesh(*hemi, job.mesh)?;
            hemis.push((*hemi, mesh, read(path)?));
        }
        RibbonInputs::Pair(first, second) => {
            let lh = subject.read_mesh(Hemi::Lh, job.mesh)?;
            let rh = subject.read_mesh(Hemi::Rh, job.mesh)?;
            let mut lh_data = read(first)?;
            let mut rh_data = read(second)?;
            let (lh_len, rh_len) = (lh.num_vertices(), rh.num_vertices());
            if assign_hemispheres(lh_data.len(), rh_data.len(), lh_len, rh_len) {
                info!(
                    "Data lengths match the swapped hemispheres, using {} as rh and {} as lh",
                    first.display(),
                    second.display()
                );
                std::mem::swap(&mut lh_data, &mut rh_data);
            }
            hemis.push((Hemi::Lh, lh, lh_data));
            hemis.push((Hemi::Rh, rh, rh_data));
        }
        RibbonInputs::Both { lh: lh_path, rh: rh_path } => {
            let lh = subject.read_mesh(Hemi::Lh, job.mesh)?;
            let rh = subject.read_mesh(Hemi::Rh, job.mesh)?;
            hemis.push((Hemi::Lh, lh, read(lh_path)?));
            hemis.push((Hemi::Rh, rh, read(rh_path)?));
        }
    }

    let inputs: Vec<HemiProjection> = hemis
        .iter()
        .map(|(hemi, mesh, data)| HemiProjection { hemi: *hemi, mesh, data })
        .collect();
    let result = surface_to_ribbon(&ribbon, &inputs, &job.params)?;

    if let Some((min, max)) = value_range(&result.data_flat_f32()?) {
        info!("Output value range [{}, {}]", min, max);
    }
    write_volume(&job.output, out_format, &result, "surf2ribbon")?;
    info!("Wrote {}", job.output.display());
    Ok(result)
}
