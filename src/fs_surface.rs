// Functions for managing FreeSurfer brain surface meshes in binary 'surf' files.
// These files store a triangular mesh, where each vertex if defined by its x,y,z coord and
// each face is defined by 3 vertices, stored as 3 indices into the vertices.


use byteordered::ByteOrdered;
use flate2::bufread::GzDecoder;

use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;

use crate::error::{CortexmapError, Result};
use crate::util::{is_gz_file, read_fs_info_line};

pub const TRIS_MAGIC_FILE_TYPE_NUMBER: i32 = 16777214;

#[derive(Debug, Clone, PartialEq)]
pub struct FsSurfaceHeader {
    pub surf_magic: [u8; 3],
    pub info_line: String,
    pub num_vertices: i32,
    pub num_faces: i32,
}


impl Default for FsSurfaceHeader {
    fn default() -> FsSurfaceHeader {
        FsSurfaceHeader {
            surf_magic: [255, 255, 254],
            info_line: String::from("created by cortexmap"),
            num_vertices: 0,
            num_faces: 0
        }
    }
}

impl FsSurfaceHeader {

    /// Read an FsSurface header from the given byte stream.
    /// It is assumed that the input is currently at the start of the
    /// FsSurface header.
    pub fn from_reader<S>(input: &mut S) -> Result<FsSurfaceHeader>
    where
        S: Read,
    {
        let mut hdr = FsSurfaceHeader::default();

        input.read_exact(&mut hdr.surf_magic)?;

        let [m0, m1, m2] = hdr.surf_magic;
        let magic: i32 = interpret_fs_int24(m0, m1, m2);
        if magic != TRIS_MAGIC_FILE_TYPE_NUMBER {
            return Err(CortexmapError::InvalidFsSurfaceFormat);
        }

        hdr.info_line = read_fs_info_line(input)?;

        let mut input = ByteOrdered::be(input);
        hdr.num_vertices = input.read_i32()?;
        hdr.num_faces = input.read_i32()?;

        if hdr.num_vertices < 0 || hdr.num_faces < 0 {
            return Err(CortexmapError::InvalidFsSurfaceFormat);
        }
        Ok(hdr)
    }
}


/// Interpret three bytes as a single 24 bit integer, FreeSurfer style.
pub fn interpret_fs_int24(b1: u8, b2: u8, b3: u8) -> i32 {
    ((b1 as i32) << 16) + ((b2 as i32) << 8) + b3 as i32
}


#[derive(Debug, PartialEq, Clone)]
pub struct FsSurface {
    pub header: FsSurfaceHeader,
    pub mesh: BrainMesh,
}

/// A triangular brain mesh. Vertex coordinates and face vertex indices are stored flat, 3 per
/// vertex / face.
#[derive(Debug, PartialEq, Clone)]
pub struct BrainMesh {
    pub vertices: Vec<f32>,
    pub faces: Vec<i32>,
}


impl BrainMesh {

    /// Create a mesh from flat coordinate and face index vectors, checking that all face indices
    /// are valid.
    pub fn new(vertices: Vec<f32>, faces: Vec<i32>) -> Result<BrainMesh> {
        let mesh = BrainMesh { vertices, faces };
        mesh.validate()?;
        Ok(mesh)
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices.len() / 3
    }

    pub fn num_faces(&self) -> usize {
        self.faces.len() / 3
    }

    /// The coordinates of vertex `idx`.
    ///
    /// # Panics
    ///
    /// If `idx` is out of range.
    pub fn vertex(&self, idx: usize) -> [f32; 3] {
        [self.vertices[idx * 3], self.vertices[idx * 3 + 1], self.vertices[idx * 3 + 2]]
    }

    /// The three vertex indices of face `idx`. Only meaningful for a validated mesh.
    pub fn face(&self, idx: usize) -> [usize; 3] {
        let f = &self.faces[idx * 3..idx * 3 + 3];
        [f[0] as usize, f[1] as usize, f[2] as usize]
    }

    /// All vertex coordinates as points.
    pub fn vertex_points(&self) -> Vec<[f32; 3]> {
        self.vertices.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect()
    }

    /// Check the flat layout and that every face references an existing vertex.
    pub fn validate(&self) -> Result<()> {
        if self.vertices.len() % 3 != 0 || self.faces.len() % 3 != 0 {
            return Err(CortexmapError::InvalidMesh(String::from(
                "coordinate or face data is not a multiple of 3",
            )));
        }
        let nv = self.num_vertices() as i32;
        if let Some(bad) = self.faces.iter().find(|&&f| f < 0 || f >= nv) {
            return Err(CortexmapError::InvalidMesh(format!(
                "face references vertex {}, but mesh has {} vertices",
                bad, nv
            )));
        }
        Ok(())
    }

    /// Vertex-wise mean of this mesh and `other`, which must share the topology. Used to construct
    /// the mid-gray surface from the white and pial surfaces.
    pub fn midpoint(&self, other: &BrainMesh) -> Result<BrainMesh> {
        if self.vertices.len() != other.vertices.len() || self.faces != other.faces {
            return Err(CortexmapError::InvalidMesh(String::from(
                "meshes do not share the same topology",
            )));
        }
        let vertices = self
            .vertices
            .iter()
            .zip(other.vertices.iter())
            .map(|(a, b)| (a + b) / 2.0)
            .collect();
        Ok(BrainMesh { vertices, faces: self.faces.clone() })
    }
}


/// Read a brain mesh from a FreeSurfer surf file, like `surf/lh.white`.
pub fn read_surf<P: AsRef<Path>>(path: P) -> Result<FsSurface> {
    FsSurface::from_file(path)
}


impl FsSurface {
    /// Read an FsSurface instance from a file.
    /// If the file's name ends with ".gz", the file is assumed to need GZip decoding. This is not
    /// typically the case for FreeSurfer Surface files, but very handy (and it helps us to reduce
    /// the size of test data).
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<FsSurface> {
        let gz = is_gz_file(&path);
        let file = BufReader::new(File::open(path)?);
        if gz {
            FsSurface::from_reader(GzDecoder::new(file))
        } else {
            FsSurface::from_reader(file)
        }
    }

    pub fn from_reader<S>(mut input: S) -> Result<FsSurface>
    where
        S: Read,
    {
        let hdr = FsSurfaceHeader::from_reader(&mut input)?;
        let mesh = FsSurface::mesh_from_reader(input, &hdr)?;
        Ok(FsSurface { header: hdr, mesh })
    }

    /// Read the mesh part. The input must be positioned directly after the header.
    pub fn mesh_from_reader<S>(input: S, hdr: &FsSurfaceHeader) -> Result<BrainMesh>
    where
        S: Read,
    {
        let mut input = ByteOrdered::be(input);

        let mut vertex_data: Vec<f32> = Vec::with_capacity((hdr.num_vertices * 3) as usize);
        for _ in 0..hdr.num_vertices * 3 {
            vertex_data.push(input.read_f32()?);
        }

        let mut face_data: Vec<i32> = Vec::with_capacity((hdr.num_faces * 3) as usize);
        for _ in 0..hdr.num_faces * 3 {
            face_data.push(input.read_i32()?);
        }

        BrainMesh::new(vertex_data, face_data)
    }

    /// Wrap a mesh with a default header.
    pub fn from_mesh(mesh: BrainMesh) -> FsSurface {
        let header = FsSurfaceHeader {
            num_vertices: mesh.num_vertices() as i32,
            num_faces: mesh.num_faces() as i32,
            ..FsSurfaceHeader::default()
        };
        FsSurface { header, mesh }
    }

    /// Write this surface in FreeSurfer surf format.
    pub fn to_writer<W>(&self, output: &mut W) -> Result<()>
    where
        W: Write,
    {
        output.write_all(&self.header.surf_magic)?;
        output.write_all(self.header.info_line.as_bytes())?;
        output.write_all(b"\n\n")?;

        let mut output = ByteOrdered::be(output);
        output.write_i32(self.mesh.num_vertices() as i32)?;
        output.write_i32(self.mesh.num_faces() as i32)?;
        for v in self.mesh.vertices.iter() {
            output.write_f32(*v)?;
        }
        for f in self.mesh.faces.iter() {
            output.write_i32(*f)?;
        }
        Ok(())
    }
}
