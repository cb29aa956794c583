//! Utility functions used in all other cortexmap modules.

use std::io::Read;
use std::path::Path;

use crate::error::Result;

use byteordered::byteorder::ReadBytesExt;

/// Check whether the file extension ends with ".gz" or ".mgz".
pub fn is_gz_file<P>(path: P) -> bool
where
    P: AsRef<Path>,
{
    path.as_ref()
        .file_name()
        .map(|a| {
            let name = a.to_string_lossy();
            name.ends_with(".gz") || name.ends_with(".mgz")
        })
        .unwrap_or(false)
}


/// Read the 'created by' line of a FreeSurfer surf file: all bytes up to and including the
/// terminating "\n\n". The returned String does not contain the two trailing newlines.
pub fn read_fs_info_line<S>(input: &mut S) -> Result<String>
where
    S: Read,
{
    let mut bytes: Vec<u8> = Vec::new();
    loop {
        let cur = input.read_u8()?;
        bytes.push(cur);
        if bytes.ends_with(b"\n\n") {
            break;
        }
    }
    bytes.truncate(bytes.len() - 2);
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}


/// Consume and discard `len` bytes. Used instead of seeking, because we cannot seek in a GZ stream.
pub fn skip_bytes<S>(input: &mut S, len: usize) -> Result<()>
where
    S: Read,
{
    let mut sink = vec![0u8; len];
    input.read_exact(&mut sink)?;
    Ok(())
}


/// Squared euclidean distance between two points.
pub fn dist2(a: &[f32; 3], b: &[f32; 3]) -> f32 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    let dz = a[2] - b[2];
    dx * dx + dy * dy + dz * dz
}
