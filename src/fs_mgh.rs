//! Functions for managing FreeSurfer brain volumes in binary 'MGH' files.
//!
//! An MGZ file is a gzip-compressed MGH file. The data part is stored in column-major order:
//! the first dimension varies fastest, the frame (4th dimension) slowest.


use byteordered::ByteOrdered;
use flate2::bufread::GzDecoder;
use ndarray::{arr2, Array2, Array4, ShapeBuilder};

use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;

use crate::error::{CortexmapError, Result};
use crate::util::{is_gz_file, skip_bytes};

pub const MGH_VERSION: i32 = 1;

pub const MRI_UCHAR: i32 = 0;
pub const MRI_INT: i32 = 1;
pub const MRI_FLOAT: i32 = 3;
pub const MRI_SHORT: i32 = 4;

/// The index in bytes where the data part starts in an MGH file.
pub const MGH_DATA_START: usize = 284;

const MGH_HEADER_FIXED_BYTES: usize = 7 * 4 + 2;
const MGH_HEADER_RAS_BYTES: usize = 15 * 4;

/// Direction cosines FreeSurfer assumes when the RAS information of a volume is not valid (LIA
/// orientation).
const DEFAULT_MDC: [f32; 9] = [-1., 0., 0., 0., 0., -1., 0., 1., 0.];

/// Models the header of a FreeSurfer MGH file containing a brain volume.
#[derive(Debug, Clone, PartialEq)]
pub struct FsMghHeader {
    pub mgh_format_version: i32,
    pub dim1len: i32,
    pub dim2len: i32,
    pub dim3len: i32,
    pub dim4len: i32,  // aka "num_frames"
    pub dtype: i32,
    pub dof: i32,
    pub is_ras_good: i16,
    pub delta: [f32; 3],
    pub mdc_raw: [f32; 9],
    pub p_xyz_c: [f32; 3],
}


/// Models a FreeSurfer MGH file. Exactly one of the data fields is set, depending on
/// `header.dtype`.
#[derive(Debug, Clone, PartialEq)]
pub struct FsMgh {
    pub header: FsMghHeader,
    pub data_mri_uchar: Option<Array4<u8>>,
    pub data_mri_float: Option<Array4<f32>>,
    pub data_mri_int: Option<Array4<i32>>,
    pub data_mri_short: Option<Array4<i16>>,
}


impl Default for FsMghHeader {
    fn default() -> FsMghHeader {
        FsMghHeader {
            mgh_format_version: MGH_VERSION,
            dim1len: 0,
            dim2len: 0,
            dim3len: 0,
            dim4len: 0,
            dtype: MRI_FLOAT,
            dof: 0,
            is_ras_good: 0,
            delta: [1.; 3],
            mdc_raw: DEFAULT_MDC,
            p_xyz_c: [0.; 3],
        }
    }
}

/// The header of an MGH/MGZ file.
impl FsMghHeader {

    /// Read an MGH header from the given byte stream.
    /// It is assumed that the input is currently at the start of the
    /// header. After this function returns, the input is positioned at the
    /// start of the data part.
    pub fn from_reader<S>(input: &mut S) -> Result<FsMghHeader>
    where
        S: Read,
    {
        let mut hdr = FsMghHeader::default();

        let consumed = {
            let mut input = ByteOrdered::be(&mut *input);

            hdr.mgh_format_version = input.read_i32()?;

            if hdr.mgh_format_version != MGH_VERSION {
                return Err(CortexmapError::InvalidFsMghFormat);
            }

            hdr.dim1len = input.read_i32()?;
            hdr.dim2len = input.read_i32()?;
            hdr.dim3len = input.read_i32()?;
            hdr.dim4len = input.read_i32()?;

            if hdr.dim1len < 0 || hdr.dim2len < 0 || hdr.dim3len < 0 || hdr.dim4len < 0 {
                return Err(CortexmapError::InvalidFsMghFormat);
            }

            hdr.dtype = input.read_i32()?;
            hdr.dof = input.read_i32()?;

            hdr.is_ras_good = input.read_i16()?;

            if hdr.is_ras_good == 1 {
                for idx in 0..3 { hdr.delta[idx] = input.read_f32()?; }
                for idx in 0..9 { hdr.mdc_raw[idx] = input.read_f32()?; }
                for idx in 0..3 { hdr.p_xyz_c[idx] = input.read_f32()?; }
                MGH_HEADER_FIXED_BYTES + MGH_HEADER_RAS_BYTES
            } else {
                MGH_HEADER_FIXED_BYTES
            }
        };

        skip_bytes(input, MGH_DATA_START - consumed)?;
        Ok(hdr)
    }

    /// The dimensions as usize, in the order (dim1, dim2, dim3, frames).
    pub fn dims(&self) -> (usize, usize, usize, usize) {
        (self.dim1len as usize, self.dim2len as usize, self.dim3len as usize, self.dim4len as usize)
    }

    /// The number of voxels in one frame.
    pub fn num_voxels(&self) -> usize {
        let (d1, d2, d3, _) = self.dims();
        d1 * d2 * d3
    }

    /// Compute the vox2ras matrix of the volume, mapping voxel indices to scanner RAS coordinates.
    pub fn vox2ras(&self) -> Array2<f32> {
        let (d1, d2, d3, _) = self.dims();
        let half = [d1 as f32 / 2.0, d2 as f32 / 2.0, d3 as f32 / 2.0];

        // Column c of M is the direction cosine of axis c scaled by the voxel size along that axis.
        let mut m = [[0f32; 3]; 3];
        for col in 0..3 {
            for row in 0..3 {
                m[row][col] = self.mdc_raw[col * 3 + row] * self.delta[col];
            }
        }

        let mut p0 = [0f32; 3];
        for row in 0..3 {
            let rotated = m[row][0] * half[0] + m[row][1] * half[1] + m[row][2] * half[2];
            p0[row] = self.p_xyz_c[row] - rotated;
        }

        arr2(&[
            [m[0][0], m[0][1], m[0][2], p0[0]],
            [m[1][0], m[1][1], m[1][2], p0[1]],
            [m[2][0], m[2][1], m[2][2], p0[2]],
            [0., 0., 0., 1.],
        ])
    }

    /// Compute the tkregister vox2ras matrix, mapping voxel indices to the surface RAS space that
    /// FreeSurfer meshes live in. Only voxel sizes and dimensions enter, the orientation is always
    /// LIA.
    pub fn vox2ras_tkr(&self) -> Array2<f32> {
        let (d1, d2, d3, _) = self.dims();
        let [dx, dy, dz] = self.delta;
        arr2(&[
            [-dx, 0., 0., dx * d1 as f32 / 2.0],
            [0., 0., dz, -dz * d3 as f32 / 2.0],
            [0., -dy, 0., dy * d2 as f32 / 2.0],
            [0., 0., 0., 1.],
        ])
    }

    fn to_writer<W>(&self, output: &mut W) -> Result<()>
    where
        W: Write,
    {
        let mut output = ByteOrdered::be(output);
        output.write_i32(self.mgh_format_version)?;
        output.write_i32(self.dim1len)?;
        output.write_i32(self.dim2len)?;
        output.write_i32(self.dim3len)?;
        output.write_i32(self.dim4len)?;
        output.write_i32(self.dtype)?;
        output.write_i32(self.dof)?;
        output.write_i16(self.is_ras_good)?;
        for v in self.delta.iter().chain(self.mdc_raw.iter()).chain(self.p_xyz_c.iter()) {
            output.write_f32(*v)?;
        }
        for _ in (MGH_HEADER_FIXED_BYTES + MGH_HEADER_RAS_BYTES)..MGH_DATA_START {
            output.write_u8(0)?;
        }
        Ok(())
    }
}


/// Apply a 4x4 affine to a 3D point.
pub fn apply_affine(affine: &Array2<f32>, p: [f32; 3]) -> [f32; 3] {
    let mut res = [0f32; 3];
    for (row, r) in res.iter_mut().enumerate() {
        *r = affine[[row, 0]] * p[0]
            + affine[[row, 1]] * p[1]
            + affine[[row, 2]] * p[2]
            + affine[[row, 3]];
    }
    res
}


/// Arrange values read in file order into an array of the given shape.
fn to_array<T>(shape: (usize, usize, usize, usize), data: Vec<T>) -> Result<Array4<T>> {
    Array4::from_shape_vec(shape.f(), data).map_err(|_| CortexmapError::InvalidFsMghFormat)
}


impl FsMgh {

    /// Read an MGH or MGZ file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<FsMgh> {
        let gz = is_gz_file(&path);
        let file = BufReader::new(File::open(path)?);
        if gz {
            FsMgh::from_reader(GzDecoder::new(file))
        } else {
            FsMgh::from_reader(file)
        }
    }

    /// Read header and data from a byte stream positioned at the start of the file.
    pub fn from_reader<S>(mut input: S) -> Result<FsMgh>
    where
        S: Read,
    {
        let hdr = FsMghHeader::from_reader(&mut input)?;
        let (d1, d2, d3, d4) = hdr.dims();
        let shape = (d1, d2, d3, d4);
        let num_values = d1 * d2 * d3 * d4;

        let mut input = ByteOrdered::be(input);

        let mut mgh = FsMgh {
            header: hdr.clone(),
            data_mri_uchar: None,
            data_mri_float: None,
            data_mri_int: None,
            data_mri_short: None,
        };

        match hdr.dtype {
            MRI_UCHAR => {
                let mut data = Vec::with_capacity(num_values);
                for _ in 0..num_values { data.push(input.read_u8()?); }
                mgh.data_mri_uchar = Some(to_array(shape, data)?);
            }
            MRI_INT => {
                let mut data = Vec::with_capacity(num_values);
                for _ in 0..num_values { data.push(input.read_i32()?); }
                mgh.data_mri_int = Some(to_array(shape, data)?);
            }
            MRI_FLOAT => {
                let mut data = Vec::with_capacity(num_values);
                for _ in 0..num_values { data.push(input.read_f32()?); }
                mgh.data_mri_float = Some(to_array(shape, data)?);
            }
            MRI_SHORT => {
                let mut data = Vec::with_capacity(num_values);
                for _ in 0..num_values { data.push(input.read_i16()?); }
                mgh.data_mri_short = Some(to_array(shape, data)?);
            }
            other => return Err(CortexmapError::UnsupportedMriDataTypeInMgh(other)),
        }

        Ok(mgh)
    }

    /// Create a volume with the geometry of `template` holding the given float data, stored with
    /// data type `dtype` (either [`MRI_FLOAT`] or [`MRI_INT`], the latter rounds).
    pub fn from_f32_data(template: &FsMghHeader, data: Array4<f32>, dtype: i32) -> Result<FsMgh> {
        let (d1, d2, d3, d4) = data.dim();
        let header = FsMghHeader {
            dim1len: d1 as i32,
            dim2len: d2 as i32,
            dim3len: d3 as i32,
            dim4len: d4 as i32,
            dtype,
            is_ras_good: 1,
            ..template.clone()
        };
        let mut mgh = FsMgh {
            header,
            data_mri_uchar: None,
            data_mri_float: None,
            data_mri_int: None,
            data_mri_short: None,
        };
        match dtype {
            MRI_FLOAT => mgh.data_mri_float = Some(data),
            MRI_INT => mgh.data_mri_int = Some(data.mapv(|v| v.round() as i32)),
            other => return Err(CortexmapError::UnsupportedMriDataTypeInMgh(other)),
        }
        Ok(mgh)
    }

    /// Create a single-frame volume of shape (n, 1, 1, 1) from per-vertex values, the way
    /// FreeSurfer stores surface overlays in MGH files.
    pub fn from_vertex_data(data: &[f32], dtype: i32) -> Result<FsMgh> {
        let arr = Array4::from_shape_vec((data.len(), 1, 1, 1).f(), data.to_vec())
            .map_err(|_| CortexmapError::InvalidFsMghFormat)?;
        FsMgh::from_f32_data(&FsMghHeader::default(), arr, dtype)
    }

    /// The data converted to f32, whatever the stored data type.
    pub fn data_f32(&self) -> Result<Array4<f32>> {
        if let Some(d) = &self.data_mri_float {
            return Ok(d.clone());
        }
        if let Some(d) = &self.data_mri_int {
            return Ok(d.mapv(|v| v as f32));
        }
        if let Some(d) = &self.data_mri_short {
            return Ok(d.mapv(|v| v as f32));
        }
        if let Some(d) = &self.data_mri_uchar {
            return Ok(d.mapv(|v| v as f32));
        }
        Err(CortexmapError::InvalidFsMghFormat)
    }

    /// All values flattened in file order (column-major, frames last), as f32.
    pub fn data_flat_f32(&self) -> Result<Vec<f32>> {
        Ok(self.data_f32()?.t().iter().copied().collect())
    }

    pub fn to_writer<W>(&self, output: &mut W) -> Result<()>
    where
        W: Write,
    {
        self.header.to_writer(output)?;
        let mut output = ByteOrdered::be(output);
        // Transposing makes the row-major iteration of ndarray visit values in column-major file
        // order.
        match self.header.dtype {
            MRI_UCHAR => {
                let d = self.data_mri_uchar.as_ref().ok_or(CortexmapError::InvalidFsMghFormat)?;
                for v in d.t().iter() { output.write_u8(*v)?; }
            }
            MRI_INT => {
                let d = self.data_mri_int.as_ref().ok_or(CortexmapError::InvalidFsMghFormat)?;
                for v in d.t().iter() { output.write_i32(*v)?; }
            }
            MRI_FLOAT => {
                let d = self.data_mri_float.as_ref().ok_or(CortexmapError::InvalidFsMghFormat)?;
                for v in d.t().iter() { output.write_f32(*v)?; }
            }
            MRI_SHORT => {
                let d = self.data_mri_short.as_ref().ok_or(CortexmapError::InvalidFsMghFormat)?;
                for v in d.t().iter() { output.write_i16(*v)?; }
            }
            other => return Err(CortexmapError::UnsupportedMriDataTypeInMgh(other)),
        }
        Ok(())
    }
}


/// Read an MGH or MGZ file.
pub fn read_mgh<P: AsRef<Path>>(path: P) -> Result<FsMgh> {
    FsMgh::from_file(path)
}
