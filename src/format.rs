//! Reading and writing per-vertex scalar data in the supported on-disk formats.
//!
//! The format is an explicit [`DataFormat`] value. It can be inferred from a file name, but curv
//! input is still verified by its magic number, so a misnamed file fails loudly instead of being
//! misread.

use flate2::bufread::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use ndarray::ArrayView1;
use ndarray_stats::QuantileExt;

use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use crate::error::{CortexmapError, Result};
use crate::fs_curv::read_curv;
use crate::fs_mgh::{FsMgh, MRI_FLOAT};


/// A file format for per-vertex scalar data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    /// FreeSurfer curv ("morph data") format, like `surf/lh.thickness`.
    Curv,
    /// Uncompressed MGH volume, data flattened to per-vertex order.
    Mgh,
    /// Gzip-compressed MGH volume.
    Mgz,
}


fn lowercase_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}


fn infer_volume(name: &str) -> Option<DataFormat> {
    if name.ends_with(".mgh") {
        Some(DataFormat::Mgh)
    } else if name.ends_with(".mgz") || name.ends_with(".mgh.gz") {
        Some(DataFormat::Mgz)
    } else {
        None
    }
}


impl DataFormat {

    /// Infer the format of an input file: ".mgh" is MGH, ".mgz" and ".mgh.gz" are MGZ, anything
    /// else is curv, like `lh.thickness`.
    pub fn infer<P: AsRef<Path>>(path: P) -> DataFormat {
        infer_volume(&lowercase_name(path.as_ref())).unwrap_or(DataFormat::Curv)
    }

    /// Resolve an optional explicit input format against a path.
    pub fn or_infer<P: AsRef<Path>>(explicit: Option<DataFormat>, path: P) -> DataFormat {
        explicit.unwrap_or_else(|| DataFormat::infer(path))
    }

    /// Resolve the format of an output file. Without an explicit format only ".mgh", ".mgz" and
    /// ".mgh.gz" names are accepted, anything else is [`CortexmapError::UnknownOutputFormat`].
    pub fn or_infer_output<P: AsRef<Path>>(
        explicit: Option<DataFormat>,
        path: P,
    ) -> Result<DataFormat> {
        match explicit {
            Some(format) => Ok(format),
            None => infer_volume(&lowercase_name(path.as_ref()))
                .ok_or_else(|| CortexmapError::UnknownOutputFormat(path.as_ref().to_path_buf())),
        }
    }

    /// Writing curv files is not supported.
    pub fn can_write(self) -> bool {
        !matches!(self, DataFormat::Curv)
    }
}


impl fmt::Display for DataFormat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            DataFormat::Curv => "curv",
            DataFormat::Mgh => "mgh",
            DataFormat::Mgz => "mgz",
        };
        write!(f, "{}", name)
    }
}


impl FromStr for DataFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<DataFormat, String> {
        match s.to_lowercase().as_str() {
            "curv" | "morph" => Ok(DataFormat::Curv),
            "mgh" => Ok(DataFormat::Mgh),
            "mgz" => Ok(DataFormat::Mgz),
            other => Err(format!(
                "unknown data format '{}', expected one of curv, mgh, mgz",
                other
            )),
        }
    }
}


/// Read per-vertex data in the given format. MGH/MGZ data of any shape is flattened in file order.
///
/// For MGH and MGZ the format alone decides about decompression, not the file name.
pub fn read_surface_data<P: AsRef<Path>>(path: P, format: DataFormat) -> Result<Vec<f32>> {
    match format {
        DataFormat::Curv => Ok(read_curv(path)?.data),
        DataFormat::Mgh => {
            FsMgh::from_reader(BufReader::new(File::open(path)?))?.data_flat_f32()
        }
        DataFormat::Mgz => {
            let file = BufReader::new(File::open(path)?);
            FsMgh::from_reader(GzDecoder::new(file))?.data_flat_f32()
        }
    }
}


/// Write per-vertex data in the given format. `operation` names the caller for the error message.
pub fn write_surface_data<P: AsRef<Path>>(
    path: P,
    format: DataFormat,
    data: &[f32],
    operation: &str,
) -> Result<()> {
    check_writable(format, operation)?;
    let mgh = FsMgh::from_vertex_data(data, MRI_FLOAT)?;
    write_volume(path, format, &mgh, operation)
}


/// Write a volume in the given format.
pub fn write_volume<P: AsRef<Path>>(
    path: P,
    format: DataFormat,
    mgh: &FsMgh,
    operation: &str,
) -> Result<()> {
    check_writable(format, operation)?;
    let file = BufWriter::new(File::create(path)?);
    if format == DataFormat::Mgz {
        let mut enc = GzEncoder::new(file, Compression::default());
        mgh.to_writer(&mut enc)?;
        enc.finish()?.flush()?;
    } else {
        let mut file = file;
        mgh.to_writer(&mut file)?;
        file.flush()?;
    }
    Ok(())
}


/// Fail with [`CortexmapError::UnsupportedOutputFormat`] if `format` cannot be written.
pub fn check_writable(format: DataFormat, operation: &str) -> Result<()> {
    if format.can_write() {
        Ok(())
    } else {
        Err(CortexmapError::UnsupportedOutputFormat(format.to_string(), operation.to_string()))
    }
}


/// The range of the non-NaN values, or `None` if there are none.
pub fn value_range(data: &[f32]) -> Option<(f32, f32)> {
    if data.is_empty() {
        return None;
    }
    let view = ArrayView1::from(data);
    let min = *view.min_skipnan();
    let max = *view.max_skipnan();
    if min.is_nan() || max.is_nan() {
        None
    } else {
        Some((min, max))
    }
}
