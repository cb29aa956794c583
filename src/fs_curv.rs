// Functions for managing FreeSurfer per-vertex data in binary 'curv' files.
// These files store 1 scalar value (typically a morphological descriptor, like cortical thickness
// at that point) for each vertex of the respective brain surface mesh.


use byteordered::ByteOrdered;
use flate2::bufread::GzDecoder;

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::error::{CortexmapError, Result};
use crate::util::is_gz_file;

pub const CURV_MAGIC: [u8; 3] = [255; 3];


#[derive(Debug, Clone, PartialEq)]
pub struct CurvHeader {
    pub curv_magic: [u8; 3],
    pub num_vertices: i32,
    pub num_faces: i32,
    pub num_values_per_vertex: i32,
}


impl Default for CurvHeader {
    fn default() -> CurvHeader {
        CurvHeader {
            curv_magic: CURV_MAGIC,
            num_vertices: 0,
            num_faces: 0,
            num_values_per_vertex: 1,
        }
    }
}

impl CurvHeader {

    /// Read a Curv header from the given byte stream.
    /// It is assumed that the input is currently at the start of the
    /// Curv header.
    pub fn from_reader<S>(input: &mut S) -> Result<CurvHeader>
    where
        S: Read,
    {
        let mut hdr = CurvHeader::default();

        let mut input = ByteOrdered::be(input);

        for v in &mut hdr.curv_magic {
            *v = input.read_u8()?;
        }

        if hdr.curv_magic != CURV_MAGIC {
            return Err(CortexmapError::InvalidCurvFormat);
        }

        hdr.num_vertices = input.read_i32()?;
        hdr.num_faces = input.read_i32()?;
        hdr.num_values_per_vertex = input.read_i32()?;

        if hdr.num_vertices < 0 || hdr.num_values_per_vertex != 1 {
            return Err(CortexmapError::InvalidCurvFormat);
        }

        Ok(hdr)
    }
}


/// Per-vertex data from a curv file.
#[derive(Debug, Clone, PartialEq)]
pub struct FsCurv {
    pub header: CurvHeader,
    pub data: Vec<f32>,
}


impl FsCurv {
    /// Read an FsCurv instance from a file. If the file's name ends with ".gz", the file is
    /// assumed to need GZip decoding. This is not typically the case for FreeSurfer curv files,
    /// but very handy for test data.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<FsCurv> {
        let gz = is_gz_file(&path);
        let file = BufReader::new(File::open(path)?);
        if gz {
            FsCurv::from_reader(GzDecoder::new(file))
        } else {
            FsCurv::from_reader(file)
        }
    }

    /// Read header and data from a byte stream positioned at the start of the file.
    pub fn from_reader<S>(mut input: S) -> Result<FsCurv>
    where
        S: Read,
    {
        let hdr = CurvHeader::from_reader(&mut input)?;

        let mut input = ByteOrdered::be(input);
        let mut data: Vec<f32> = Vec::with_capacity(hdr.num_vertices as usize);
        for _ in 0..hdr.num_vertices {
            data.push(input.read_f32()?);
        }

        Ok(FsCurv { header: hdr, data })
    }
}


/// Read per-vertex data from a FreeSurfer curv file, like `surf/lh.thickness`.
pub fn read_curv<P: AsRef<Path>>(path: P) -> Result<FsCurv> {
    FsCurv::from_file(path)
}
