mod common;

use approx::assert_abs_diff_eq;
use tempfile::tempdir;

use std::path::{Path, PathBuf};

use cortexmap::interp::InterpolationMode::{self, Barycentric, Nearest};
use cortexmap::interp::InterpParams;
use cortexmap::resample::{run_surface_to_surface, HemiPair, ResampleJob};
use cortexmap::{read_surface_data, CortexmapError, DataFormat, Hemi, SubjectsConfig};

use common::{position_data, uv_sphere, write_curv, SubjectsDir};

fn job(
    hemis: &str,
    from: &str,
    to: &str,
    input: &Path,
    output: &Path,
    mode: InterpolationMode,
) -> ResampleJob {
    ResampleJob {
        hemis: hemis.parse::<HemiPair>().unwrap(),
        from_subject: from.to_string(),
        to_subject: to.to_string(),
        input: input.to_path_buf(),
        output: output.to_path_buf(),
        in_format: None,
        out_format: None,
        registration: None,
        params: InterpParams { mode, ..InterpParams::default() },
    }
}

#[test]
fn identical_subjects_fail_fast() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("out.mgh");
    let j = job("lh", "bert", "bert", &dir.path().join("lh.missing"), &output, Barycentric);

    let res = run_surface_to_surface(&SubjectsConfig::default(), &j);
    match res {
        Err(err @ CortexmapError::IdenticalSubjects(_)) => {
            assert!(err.to_string().contains("bert"))
        }
        other => panic!("expected IdenticalSubjects, got {:?}", other),
    }
    assert!(!output.exists());
}

#[test]
fn a_subject_given_by_id_and_by_path_is_identical() {
    let dir = tempdir().unwrap();
    let subjects = SubjectsDir::new(dir.path());
    let sphere = uv_sphere(4, 8, 100.0, [0.0; 3]);
    subjects.write_surface("bert", "surf/lh.sphere.reg", &sphere);
    let input = dir.path().join("lh.data");
    write_curv(&input, &position_data(&sphere));
    let output = dir.path().join("lh.out.mgh");

    let by_path = dir.path().join("bert");
    let by_path = by_path.to_str().unwrap();
    for (from, to) in [("bert", by_path), (by_path, "bert")].iter() {
        let j = job("lh", from, to, &input, &output, Nearest);
        match run_surface_to_surface(&subjects.config(), &j) {
            Err(CortexmapError::IdenticalSubjects(id)) => assert_eq!("bert", id),
            other => panic!("expected IdenticalSubjects, got {:?}", other),
        }
    }
    assert!(!output.exists());
}

#[test]
fn curv_output_is_rejected_before_any_work() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("lh.resampled");
    let mut j = job("lh", "bert", "ernie", &dir.path().join("lh.missing"), &output, Barycentric);
    j.out_format = Some(DataFormat::Curv);

    assert!(matches!(
        run_surface_to_surface(&SubjectsConfig::default(), &j),
        Err(CortexmapError::UnsupportedOutputFormat(_, _))
    ));
    assert!(!output.exists());
}

#[test]
fn an_unknown_output_extension_is_reported_as_such() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("lh.resampled.nii.gz");
    let j = job("lh", "bert", "ernie", &dir.path().join("lh.missing"), &output, Barycentric);

    match run_surface_to_surface(&SubjectsConfig::default(), &j) {
        Err(err @ CortexmapError::UnknownOutputFormat(_)) => {
            assert!(err.to_string().contains("lh.resampled.nii.gz"));
            assert!(err.to_string().contains("--out-format"));
        }
        other => panic!("expected UnknownOutputFormat, got {:?}", other),
    }
    assert!(!output.exists());
}

#[test]
fn a_missing_cross_hemisphere_registration_is_reported() {
    let dir = tempdir().unwrap();
    let subjects = SubjectsDir::new(dir.path());
    let sphere = uv_sphere(6, 12, 100.0, [0.0; 3]);
    subjects.write_surface("bert", "surf/lh.fsaverage_sym.sphere.reg", &sphere);
    subjects.subject("ernie");
    let input = dir.path().join("lh.data");
    write_curv(&input, &position_data(&sphere));

    let output = dir.path().join("rh.out.mgh");
    let j = job("lh:rh", "bert", "ernie", &input, &output, Barycentric);
    match run_surface_to_surface(&subjects.config(), &j) {
        Err(CortexmapError::MissingRegistration(path, hint)) => {
            let expected = dir.path().join("ernie/xhemi/surf/lh.fsaverage_sym.sphere.reg");
            assert_eq!(expected, path);
            assert!(hint.contains("xhemireg --s ernie"));
        }
        other => panic!("expected MissingRegistration, got {:?}", other),
    }
}

#[test]
fn unknown_subjects_are_reported() {
    let dir = tempdir().unwrap();
    let subjects = SubjectsDir::new(dir.path());
    subjects.subject("bert");
    let input = dir.path().join("rh.data");
    let j = job("rh", "bert", "nobody", &input, &dir.path().join("rh.out.mgz"), Nearest);
    assert!(matches!(
        run_surface_to_surface(&subjects.config(), &j),
        Err(CortexmapError::SubjectNotFound(_))
    ));
}

#[test]
fn interpolating_onto_the_same_sphere_reproduces_the_data() {
    let dir = tempdir().unwrap();
    let subjects = SubjectsDir::new(dir.path());
    let sphere = uv_sphere(8, 16, 100.0, [0.0; 3]);
    subjects.write_surface("bert", "surf/lh.sphere.reg", &sphere);
    subjects.write_surface("ernie", "surf/lh.sphere.reg", &sphere);
    let data = position_data(&sphere);
    let input = dir.path().join("lh.data");
    write_curv(&input, &data);
    let config = subjects.config();

    let output = dir.path().join("lh.nearest.mgh");
    let j = job("lh", "bert", "ernie", &input, &output, Nearest);
    let nearest = run_surface_to_surface(&config, &j).unwrap();
    assert_eq!(data, nearest);
    assert_eq!(data, read_surface_data(&output, DataFormat::Mgh).unwrap());

    let output = dir.path().join("lh.bary.mgz");
    let j = job("lh", "bert", "ernie", &input, &output, Barycentric);
    let bary = run_surface_to_surface(&config, &j).unwrap();
    assert_eq!(data.len(), bary.len());
    for (expected, found) in data.iter().zip(bary.iter()) {
        assert_abs_diff_eq!(*expected, *found, epsilon = 1e-3);
    }
}

#[test]
fn nearest_round_trips_are_idempotent() {
    let dir = tempdir().unwrap();
    let subjects = SubjectsDir::new(dir.path());
    let fine = uv_sphere(8, 16, 100.0, [0.0; 3]);
    let coarse = uv_sphere(4, 8, 100.0, [0.0; 3]);
    subjects.write_surface("bert", "surf/rh.sphere.reg", &fine);
    subjects.write_surface("ernie", "surf/rh.sphere.reg", &coarse);
    let config = subjects.config();

    let input = dir.path().join("rh.data");
    write_curv(&input, &position_data(&fine));

    let step = |from: &str, to: &str, input: &Path, name: &str| -> (PathBuf, Vec<f32>) {
        let output = dir.path().join(name);
        let res = run_surface_to_surface(&config, &job("rh", from, to, input, &output, Nearest));
        (output, res.unwrap())
    };
    let (to_coarse, first) = step("bert", "ernie", &input, "rh.1.mgh");
    let (to_fine, back) = step("ernie", "bert", &to_coarse, "rh.2.mgh");
    let (_, again) = step("bert", "ernie", &to_fine, "rh.3.mgh");

    assert_eq!(coarse.num_vertices(), first.len());
    assert_eq!(fine.num_vertices(), back.len());
    assert_eq!(first, again);
}

#[test]
fn cross_hemisphere_goes_through_the_symmetric_template() {
    let dir = tempdir().unwrap();
    let subjects = SubjectsDir::new(dir.path());
    let sphere = uv_sphere(6, 12, 100.0, [0.0; 3]);
    subjects.write_surface("bert", "surf/lh.fsaverage_sym.sphere.reg", &sphere);
    subjects.write_surface("bert", "xhemi/surf/lh.fsaverage_sym.sphere.reg", &sphere);
    subjects.write_surface("ernie", "xhemi/surf/lh.fsaverage_sym.sphere.reg", &sphere);

    let data = position_data(&sphere);
    let input = dir.path().join("lh.data");
    write_curv(&input, &data);

    let output = dir.path().join("rh.out.mgh");
    let mut j = job("lh:rh", "bert", "ernie", &input, &output, Nearest);
    assert_eq!(Hemi::Rh, j.hemis.to);
    assert_eq!(data, run_surface_to_surface(&subjects.config(), &j).unwrap());

    j.from_subject = "ernie".to_string();
    j.to_subject = "bert".to_string();
    j.hemis = "rh:lh".parse().unwrap();
    assert_eq!(data, run_surface_to_surface(&subjects.config(), &j).unwrap());
}

#[test]
fn the_data_length_must_match_the_source_sphere() {
    let dir = tempdir().unwrap();
    let subjects = SubjectsDir::new(dir.path());
    let sphere = uv_sphere(4, 8, 100.0, [0.0; 3]);
    subjects.write_surface("bert", "surf/lh.sphere.reg", &sphere);
    subjects.write_surface("ernie", "surf/lh.sphere.reg", &sphere);
    let input = dir.path().join("lh.data");
    write_curv(&input, &[1.0, 2.0]);

    let j = job("lh", "bert", "ernie", &input, &dir.path().join("lh.out.mgh"), Barycentric);
    match run_surface_to_surface(&subjects.config(), &j) {
        Err(CortexmapError::DataLengthMismatch(_, expected, found)) => {
            assert_eq!(sphere.num_vertices(), expected);
            assert_eq!(2, found);
        }
        other => panic!("expected DataLengthMismatch, got {:?}", other),
    }
}
