// Fixtures shared by the integration tests: synthetic meshes and scratch FreeSurfer subject
// directories.

#![allow(dead_code)]

use byteordered::ByteOrdered;
use ndarray::{Array4, ShapeBuilder};

use std::f32::consts::PI;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use cortexmap::format::{write_volume, DataFormat};
use cortexmap::fs_mgh::{FsMgh, FsMghHeader, MRI_INT};
use cortexmap::{BrainMesh, FsSurface, Hemi, SubjectsConfig};

/// A latitude/longitude sphere around `center`. Rings and meridians are placed at exact fractions
/// of the circle, so a sphere with `n_lat` and `n_lon` divisible by those of another one contains
/// its vertices.
pub fn uv_sphere(n_lat: usize, n_lon: usize, radius: f32, center: [f32; 3]) -> BrainMesh {
    let mut vertices: Vec<f32> = Vec::new();
    let mut push = |x: f32, y: f32, z: f32| {
        vertices.extend_from_slice(&[
            center[0] + radius * x,
            center[1] + radius * y,
            center[2] + radius * z,
        ]);
    };
    push(0.0, 0.0, 1.0);
    for i in 1..n_lat {
        let theta = PI * (i as f32 / n_lat as f32);
        for j in 0..n_lon {
            let phi = 2.0 * PI * (j as f32 / n_lon as f32);
            push(theta.sin() * phi.cos(), theta.sin() * phi.sin(), theta.cos());
        }
    }
    push(0.0, 0.0, -1.0);

    let ring = |i: usize, j: usize| (1 + (i - 1) * n_lon + (j % n_lon)) as i32;
    let south = (1 + (n_lat - 1) * n_lon) as i32;
    let mut faces: Vec<i32> = Vec::new();
    for j in 0..n_lon {
        faces.extend_from_slice(&[0, ring(1, j), ring(1, j + 1)]);
    }
    for i in 1..(n_lat - 1) {
        for j in 0..n_lon {
            faces.extend_from_slice(&[ring(i, j), ring(i + 1, j), ring(i + 1, j + 1)]);
            faces.extend_from_slice(&[ring(i, j), ring(i + 1, j + 1), ring(i, j + 1)]);
        }
    }
    for j in 0..n_lon {
        faces.extend_from_slice(&[south, ring(n_lat - 1, j + 1), ring(n_lat - 1, j)]);
    }
    BrainMesh::new(vertices, faces).unwrap()
}

/// A smooth function of the position, used as per-vertex test data.
pub fn position_data(mesh: &BrainMesh) -> Vec<f32> {
    mesh.vertex_points().iter().map(|p| 1.0 + p[0] + 0.5 * p[1] - 0.25 * p[2]).collect()
}

/// Write `data` as a FreeSurfer curv file.
pub fn write_curv(path: &Path, data: &[f32]) {
    let mut file = BufWriter::new(File::create(path).unwrap());
    file.write_all(&[255, 255, 255]).unwrap();
    {
        let mut out = ByteOrdered::be(&mut file);
        out.write_i32(data.len() as i32).unwrap();
        out.write_i32(0).unwrap();
        out.write_i32(1).unwrap();
        for v in data.iter() {
            out.write_f32(*v).unwrap();
        }
    }
    file.flush().unwrap();
}

/// A ribbon volume of `dim`^3 voxels of 1 mm holding the given labels.
pub fn ribbon_volume(dim: usize, labels: &[((usize, usize, usize), i32)]) -> FsMgh {
    let mut data = Array4::<f32>::zeros((dim, dim, dim, 1).f());
    for &((i, j, k), label) in labels.iter() {
        data[[i, j, k, 0]] = label as f32;
    }
    FsMgh::from_f32_data(&FsMghHeader::default(), data, MRI_INT).unwrap()
}

/// The tkregister coordinates of voxel (i, j, k) of a volume built by [`ribbon_volume`].
pub fn voxel_center(dim: usize, i: usize, j: usize, k: usize) -> [f32; 3] {
    let half = dim as f32 / 2.0;
    [half - i as f32, k as f32 - half, half - j as f32]
}

/// A directory of scratch subjects.
pub struct SubjectsDir {
    pub root: PathBuf,
}

impl SubjectsDir {
    pub fn new(root: &Path) -> SubjectsDir {
        SubjectsDir { root: root.to_path_buf() }
    }

    pub fn config(&self) -> SubjectsConfig {
        SubjectsConfig::from_vars(self.root.to_str(), None)
    }

    /// Create the subject directory with empty `surf/` and `mri/`.
    pub fn subject(&self, id: &str) -> PathBuf {
        let dir = self.root.join(id);
        fs::create_dir_all(dir.join("surf")).unwrap();
        fs::create_dir_all(dir.join("mri")).unwrap();
        dir
    }

    /// Write a surface to a path relative to the subject directory, like `surf/lh.sphere.reg`.
    pub fn write_surface(&self, id: &str, rel: &str, mesh: &BrainMesh) {
        let path = self.subject(id).join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let mut file = BufWriter::new(File::create(path).unwrap());
        FsSurface::from_mesh(mesh.clone()).to_writer(&mut file).unwrap();
        file.flush().unwrap();
    }

    /// Write the white and pial surface of a hemisphere.
    pub fn write_hemisphere(&self, id: &str, hemi: Hemi, white: &BrainMesh, pial: &BrainMesh) {
        self.write_surface(id, &format!("surf/{}.white", hemi), white);
        self.write_surface(id, &format!("surf/{}.pial", hemi), pial);
    }

    pub fn write_ribbon(&self, id: &str, ribbon: &FsMgh) {
        let path = self.subject(id).join("mri/ribbon.mgz");
        write_volume(path, DataFormat::Mgz, ribbon, "test").unwrap();
    }
}
