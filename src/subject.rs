//! FreeSurfer subject directories: hemispheres, surfaces and volumes of one subject.

use log::debug;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{CortexmapError, Result};
use crate::fs_mgh::{read_mgh, FsMgh};
use crate::fs_surface::{read_surf, BrainMesh};


/// The ribbon label of left hemisphere cortex voxels in `mri/ribbon.mgz`.
pub const LH_CORTEX_LABEL: i32 = 3;
/// The ribbon label of right hemisphere cortex voxels in `mri/ribbon.mgz`.
pub const RH_CORTEX_LABEL: i32 = 42;


#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hemi {
    Lh,
    Rh,
}


impl Hemi {
    /// The file name prefix FreeSurfer uses, "lh" or "rh".
    pub fn name(self) -> &'static str {
        match self {
            Hemi::Lh => "lh",
            Hemi::Rh => "rh",
        }
    }

    pub fn cortex_label(self) -> i32 {
        match self {
            Hemi::Lh => LH_CORTEX_LABEL,
            Hemi::Rh => RH_CORTEX_LABEL,
        }
    }
}


impl fmt::Display for Hemi {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}


impl FromStr for Hemi {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Hemi, String> {
        match s.to_lowercase().as_str() {
            "lh" | "l" | "left" => Ok(Hemi::Lh),
            "rh" | "r" | "right" => Ok(Hemi::Rh),
            other => Err(format!("'{}' is not a hemisphere, expected lh or rh", other)),
        }
    }
}


/// Which cortical surface to project from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshKind {
    White,
    Pial,
    /// The vertex-wise mean of the white and pial surfaces.
    Midgray,
}


impl FromStr for MeshKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<MeshKind, String> {
        match s.to_lowercase().as_str() {
            "white" => Ok(MeshKind::White),
            "pial" => Ok(MeshKind::Pial),
            "midgray" | "mid" => Ok(MeshKind::Midgray),
            other => Err(format!("unknown mesh '{}', expected white, pial or midgray", other)),
        }
    }
}


/// A FreeSurfer subject: an id and the directory holding its `surf/` and `mri/` data.
#[derive(Debug, Clone, PartialEq)]
pub struct Subject {
    pub id: String,
    pub path: PathBuf,
}


impl Subject {

    pub fn new<P: AsRef<Path>>(id: &str, path: P) -> Subject {
        Subject { id: id.to_string(), path: path.as_ref().to_path_buf() }
    }

    /// Whether `path` looks like a subject directory.
    pub fn is_subject_dir<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().join("surf").is_dir()
    }

    /// The path of a hemisphere file in `surf/`, like `surf/lh.white` for `(Hemi::Lh, "white")`.
    pub fn surf_path(&self, hemi: Hemi, name: &str) -> PathBuf {
        self.path.join("surf").join(format!("{}.{}", hemi.name(), name))
    }

    /// The path of a file of the cross-hemisphere subject, in which the right hemisphere is
    /// mirrored onto the left, like `xhemi/surf/lh.fsaverage_sym.sphere.reg`.
    pub fn xhemi_surf_path(&self, name: &str) -> PathBuf {
        self.path.join("xhemi").join("surf").join(format!("lh.{}", name))
    }

    pub fn mri_path(&self, name: &str) -> PathBuf {
        self.path.join("mri").join(name)
    }

    pub fn read_surface(&self, hemi: Hemi, name: &str) -> Result<BrainMesh> {
        let path = self.surf_path(hemi, name);
        debug!("Reading surface {}", path.display());
        Ok(read_surf(path)?.mesh)
    }

    /// Read the mesh of the given kind for a hemisphere.
    pub fn read_mesh(&self, hemi: Hemi, kind: MeshKind) -> Result<BrainMesh> {
        match kind {
            MeshKind::White => self.read_surface(hemi, "white"),
            MeshKind::Pial => self.read_surface(hemi, "pial"),
            MeshKind::Midgray => {
                let white = self.read_surface(hemi, "white")?;
                let pial = self.read_surface(hemi, "pial")?;
                white.midpoint(&pial)
            }
        }
    }

    /// Read the cortical ribbon, `mri/ribbon.mgz`.
    pub fn read_ribbon(&self) -> Result<FsMgh> {
        let path = self.mri_path("ribbon.mgz");
        if !path.is_file() {
            return Err(CortexmapError::InvalidArgument(format!(
                "Subject '{}' has no ribbon volume at {}",
                self.id,
                path.display()
            )));
        }
        debug!("Reading ribbon {}", path.display());
        read_mgh(path)
    }
}


#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn hemispheres_parse_from_common_spellings() {
        assert_eq!(Ok(Hemi::Lh), "LH".parse::<Hemi>());
        assert_eq!(Ok(Hemi::Lh), "l".parse::<Hemi>());
        assert_eq!(Ok(Hemi::Rh), "right".parse::<Hemi>());
        assert!("lh.thickness".parse::<Hemi>().is_err());
        assert_eq!(42, Hemi::Rh.cortex_label());
    }

    #[test]
    fn subject_paths_follow_the_freesurfer_layout() {
        let subj = Subject::new("bert", "/data/subjects/bert");
        assert_eq!(
            PathBuf::from("/data/subjects/bert/surf/rh.sphere.reg"),
            subj.surf_path(Hemi::Rh, "sphere.reg")
        );
        assert_eq!(
            PathBuf::from("/data/subjects/bert/xhemi/surf/lh.fsaverage_sym.sphere.reg"),
            subj.xhemi_surf_path("fsaverage_sym.sphere.reg")
        );
        assert_eq!(
            PathBuf::from("/data/subjects/bert/mri/ribbon.mgz"),
            subj.mri_path("ribbon.mgz")
        );
    }

    #[test]
    fn mesh_kinds_parse() {
        assert_eq!(Ok(MeshKind::Midgray), "midgray".parse::<MeshKind>());
        assert_eq!(Ok(MeshKind::Pial), "Pial".parse::<MeshKind>());
        assert!("inflated".parse::<MeshKind>().is_err());
    }
}
