use quick_error::quick_error;
use std::io::Error as IOError;
use std::path::PathBuf;

quick_error! {
    /// Error type for all error variants originated by this crate.
    #[derive(Debug)]
    pub enum CortexmapError {
        /// Invalid curv file: wrong magic number.
        InvalidCurvFormat {
            display("Invalid Curv file")
        }

        InvalidFsSurfaceFormat {
            display("Invalid FreeSurfer surf file")
        }

        InvalidFsMghFormat {
            display("Invalid FreeSurfer MGH file")
        }

        UnsupportedMriDataTypeInMgh(dtype: i32) {
            display("Unsupported MRI data type {} in MGH file", dtype)
        }

        /// A mesh with face indices outside the vertex range, or without vertices.
        InvalidMesh(msg: String) {
            display("Invalid mesh: {}", msg)
        }

        /// Per-vertex data does not match the mesh it belongs to.
        DataLengthMismatch(what: String, expected: usize, found: usize) {
            display("{} has {} values, but the mesh has {} vertices", what, found, expected)
        }

        SubjectNotFound(id: String) {
            display("Subject '{}' not found in any subjects directory", id)
        }

        NoSubject {
            display("No subject given and $SUBJECT is not set")
        }

        IdenticalSubjects(id: String) {
            display(
                "Source and target subject are identical ('{}'), nothing to interpolate",
                id
            )
        }

        /// A precomputed spherical registration is missing. `hint` lists the commands that
        /// create it.
        MissingRegistration(path: PathBuf, hint: String) {
            display(
                "Required registration {} not found; create it first with: {}",
                path.display(),
                hint
            )
        }

        /// An output file name whose format cannot be told from its extension.
        UnknownOutputFormat(path: PathBuf) {
            display(
                "Cannot infer the output format of {}, \
                 use a .mgh or .mgz file name or --out-format",
                path.display()
            )
        }

        UnsupportedOutputFormat(format: String, operation: String) {
            display("Writing {} output is not supported by {}", format, operation)
        }

        InvalidArgument(msg: String) {
            display("{}", msg)
        }

        /// I/O Error
        Io(err: IOError) {
            from()
            source(err)
        }
    }
}

/// Alias type for results originated from this crate.
pub type Result<T> = ::std::result::Result<T, CortexmapError>;
