//! Selection of the spherical registrations that put two subjects' surfaces into a shared
//! parameterization.
//!
//! Same-hemisphere mappings go through a template subject, `fsaverage` unless told otherwise.
//! Mappings between hemispheres go through the left-right symmetric template `fsaverage_sym`,
//! where right hemisphere data uses the subject's cross-hemisphere registration in `xhemi/`.

use log::{debug, info};

use std::path::PathBuf;

use crate::error::{CortexmapError, Result};
use crate::subject::{Hemi, Subject};


pub const FSAVERAGE: &str = "fsaverage";
pub const FSAVERAGE_SYM: &str = "fsaverage_sym";


/// The registration spheres of source and target, both registered to `template`.
#[derive(Debug, Clone, PartialEq)]
pub struct Correspondence {
    pub template: String,
    pub source_sphere: PathBuf,
    pub target_sphere: PathBuf,
}


/// Determine which registration spheres relate `from_hemi` of `from` to `to_hemi` of `to`.
///
/// `forced_template` overrides the template for same-hemisphere mappings. Cross-hemisphere
/// mappings always use `fsaverage_sym`. Fails with [`CortexmapError::MissingRegistration`] if a
/// sphere does not exist, naming the commands that would create it.
pub fn resolve(
    from: &Subject,
    from_hemi: Hemi,
    to: &Subject,
    to_hemi: Hemi,
    forced_template: Option<&str>,
) -> Result<Correspondence> {
    let template = select_template(from, from_hemi, to, to_hemi, forced_template)?;
    info!(
        "Using template subject '{}' for {}.{} -> {}.{}",
        template, from.id, from_hemi, to.id, to_hemi
    );

    let source_sphere = registration_sphere(from, from_hemi, &template)?;
    let target_sphere = registration_sphere(to, to_hemi, &template)?;
    debug!(
        "Source sphere {}, target sphere {}",
        source_sphere.display(),
        target_sphere.display()
    );

    Ok(Correspondence { template, source_sphere, target_sphere })
}


fn select_template(
    from: &Subject,
    from_hemi: Hemi,
    to: &Subject,
    to_hemi: Hemi,
    forced_template: Option<&str>,
) -> Result<String> {
    if from_hemi != to_hemi {
        return match forced_template {
            None | Some(FSAVERAGE_SYM) => Ok(FSAVERAGE_SYM.to_string()),
            Some(other) => Err(CortexmapError::InvalidArgument(format!(
                "Cross-hemisphere interpolation requires the {} template, not '{}'",
                FSAVERAGE_SYM, other
            ))),
        };
    }
    if let Some(template) = forced_template {
        return Ok(template.to_string());
    }
    if from.id == FSAVERAGE_SYM || to.id == FSAVERAGE_SYM {
        Ok(FSAVERAGE_SYM.to_string())
    } else {
        Ok(FSAVERAGE.to_string())
    }
}


/// The sphere of `subject` registered to `template` for data on `hemi`.
pub fn registration_sphere(subject: &Subject, hemi: Hemi, template: &str) -> Result<PathBuf> {
    let recon = format!("recon-all -s {} -surfreg", subject.id);
    let (path, hint) = if subject.id == FSAVERAGE_SYM && template == FSAVERAGE_SYM {
        // Both hemispheres of the symmetric template share the left parameterization.
        (subject.surf_path(Hemi::Lh, "sphere.reg"), recon)
    } else if subject.id == template {
        (subject.surf_path(hemi, "sphere.reg"), recon)
    } else if template == FSAVERAGE_SYM {
        symmetric_sphere(subject, hemi)
    } else if template == FSAVERAGE {
        (subject.surf_path(hemi, "sphere.reg"), recon)
    } else {
        let name = format!("{}.sphere.reg", template);
        let hint = format!("surfreg --s {} --t {} --{}", subject.id, template, hemi);
        (subject.surf_path(hemi, &name), hint)
    };

    if path.is_file() {
        Ok(path)
    } else {
        Err(CortexmapError::MissingRegistration(path, hint))
    }
}


fn symmetric_sphere(subject: &Subject, hemi: Hemi) -> (PathBuf, String) {
    let name = format!("{}.sphere.reg", FSAVERAGE_SYM);
    match hemi {
        Hemi::Lh => (
            subject.surf_path(Hemi::Lh, &name),
            format!("surfreg --s {} --t {} --lh", subject.id, FSAVERAGE_SYM),
        ),
        Hemi::Rh => (
            subject.xhemi_surf_path(&name),
            format!(
                "xhemireg --s {0}; surfreg --s {0} --t {1} --lh --xhemi",
                subject.id, FSAVERAGE_SYM
            ),
        ),
    }
}
