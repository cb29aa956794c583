//! Mapping of cortical surface data produced by FreeSurfer.
//!
//! Per-vertex data (curv, mgh or mgz files) can be projected into the cortical ribbon volume of a
//! subject with [`ribbon::surface_to_ribbon`], or resampled onto the surface of another subject
//! through spherical registrations with [`resample::run_surface_to_surface`]. The file formats
//! involved are read and written by the `fs_*` modules.

pub mod config;
pub mod error;
pub mod format;
pub mod fs_curv;
pub mod fs_mgh;
pub mod fs_surface;
pub mod interp;
pub mod logging;
pub mod registration;
pub mod resample;
pub mod ribbon;
pub mod spatial;
pub mod subject;
pub mod util;

pub use config::SubjectsConfig;
pub use error::{CortexmapError, Result};
pub use format::{read_surface_data, write_surface_data, DataFormat};
pub use fs_curv::{read_curv, CurvHeader, FsCurv};
pub use fs_mgh::{read_mgh, FsMgh, FsMghHeader};
pub use fs_surface::{read_surf, BrainMesh, FsSurface, FsSurfaceHeader};
pub use interp::{InterpParams, InterpolationMode, Interpolator};
pub use ribbon::{surface_to_ribbon, HemiProjection, RibbonMethod, RibbonParams};
pub use spatial::{Neighbor, VertexIndex};
pub use subject::{Hemi, MeshKind, Subject};
