//! Interpolation of per-vertex data from a source mesh onto arbitrary points, typically the
//! vertices of a registration sphere of another subject.

use approx::abs_diff_eq;
use log::debug;

use crate::error::{CortexmapError, Result};
use crate::fs_surface::BrainMesh;
use crate::spatial::VertexIndex;


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterpolationMode {
    /// Barycentric interpolation inside the source triangle closest to the target point.
    Barycentric,
    /// The value of the nearest source vertex.
    Nearest,
}


#[derive(Debug, Clone, PartialEq)]
pub struct InterpParams {
    pub mode: InterpolationMode,
    /// Result for targets whose contributing source values are missing (NaN).
    pub fill: f32,
    /// Number of nearest source vertices whose incident faces are searched for the closest
    /// triangle.
    pub candidates: usize,
}

impl Default for InterpParams {
    fn default() -> InterpParams {
        InterpParams {
            mode: InterpolationMode::Barycentric,
            fill: 0.0,
            candidates: 6,
        }
    }
}


/// Where a point lands on the source mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Location {
    Vertex(usize),
    Face { vertices: [usize; 3], weights: [f64; 3] },
}


/// Interpolates data defined on the vertices of `mesh`.
#[derive(Debug)]
pub struct Interpolator<'a> {
    mesh: &'a BrainMesh,
    index: VertexIndex,
    vertex_faces: Vec<Vec<usize>>,
}


impl<'a> Interpolator<'a> {

    pub fn new(mesh: &'a BrainMesh) -> Result<Interpolator<'a>> {
        mesh.validate()?;
        if mesh.num_vertices() == 0 {
            return Err(CortexmapError::InvalidMesh(String::from("source mesh has no vertices")));
        }
        let mut vertex_faces: Vec<Vec<usize>> = vec![Vec::new(); mesh.num_vertices()];
        for face in 0..mesh.num_faces() {
            for v in mesh.face(face).iter() {
                vertex_faces[*v].push(face);
            }
        }
        debug!(
            "Built interpolator for mesh with {} vertices and {} faces.",
            mesh.num_vertices(),
            mesh.num_faces()
        );
        Ok(Interpolator { mesh, index: VertexIndex::new(&mesh.vertex_points()), vertex_faces })
    }

    /// Interpolate `data`, one value per source vertex, at each of the `targets`.
    pub fn interpolate(
        &self,
        data: &[f32],
        targets: &[[f32; 3]],
        params: &InterpParams,
    ) -> Result<Vec<f32>> {
        if data.len() != self.mesh.num_vertices() {
            return Err(CortexmapError::DataLengthMismatch(
                String::from("Source data"),
                self.mesh.num_vertices(),
                data.len(),
            ));
        }
        Ok(targets.iter().map(|p| self.value_at(data, p, params)).collect())
    }

    /// Interpolated value at a single point. `data` must have one value per source vertex.
    pub fn value_at(&self, data: &[f32], p: &[f32; 3], params: &InterpParams) -> f32 {
        let value = match self.locate(p, params) {
            None => return params.fill,
            Some(Location::Vertex(v)) => data[v],
            Some(Location::Face { vertices, weights }) => {
                let mut acc = 0f64;
                for (v, w) in vertices.iter().zip(weights.iter()) {
                    if *w > 0.0 {
                        let d = data[*v];
                        if d.is_nan() {
                            return params.fill;
                        }
                        acc += w * d as f64;
                    }
                }
                acc as f32
            }
        };
        if value.is_nan() { params.fill } else { value }
    }

    /// Locate `p` on the mesh according to the interpolation mode. Only fails for points with NaN
    /// coordinates.
    pub fn locate(&self, p: &[f32; 3], params: &InterpParams) -> Option<Location> {
        let neighbors = self.index.nearest(p, params.candidates.max(1), f32::INFINITY);
        let nearest = neighbors.first()?.index;
        if params.mode == InterpolationMode::Nearest {
            return Some(Location::Vertex(nearest));
        }

        let mut faces: Vec<usize> = neighbors.iter()
            .flat_map(|n| self.vertex_faces[n.index].iter().copied())
            .collect();
        faces.sort_unstable();
        faces.dedup();

        let mut best: Option<(f64, [usize; 3], [f64; 3])> = None;
        for face in faces {
            let tri = self.mesh.face(face);
            let [a, b, c] = tri.map(|v| self.mesh.vertex(v));
            let weights = closest_point_barycentric(p, &a, &b, &c);
            let mut q = [0f64; 3];
            for (axis, qa) in q.iter_mut().enumerate() {
                *qa = weights[0] * a[axis] as f64
                    + weights[1] * b[axis] as f64
                    + weights[2] * c[axis] as f64;
            }
            let d2: f64 = (0..3).map(|axis| (p[axis] as f64 - q[axis]).powi(2)).sum();
            if best.map_or(true, |(bd, _, _)| d2 < bd) {
                best = Some((d2, tri, weights));
            }
        }

        match best {
            Some((_, vertices, weights)) => Some(Location::Face { vertices, weights }),
            None => Some(Location::Vertex(nearest)),
        }
    }
}


fn sub(a: &[f32; 3], b: &[f32; 3]) -> [f64; 3] {
    [a[0] as f64 - b[0] as f64, a[1] as f64 - b[1] as f64, a[2] as f64 - b[2] as f64]
}

fn dot(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn cross(a: &[f64; 3], b: &[f64; 3]) -> [f64; 3] {
    [a[1] * b[2] - a[2] * b[1], a[2] * b[0] - a[0] * b[2], a[0] * b[1] - a[1] * b[0]]
}


/// Barycentric coordinates (for a, b, c) of the point of triangle abc closest to p.
///
/// Follows the Voronoi region classification of Ericson, Real-Time Collision Detection, 5.1.5. A
/// degenerate triangle yields its corner closest to p.
pub fn closest_point_barycentric(
    p: &[f32; 3],
    a: &[f32; 3],
    b: &[f32; 3],
    c: &[f32; 3],
) -> [f64; 3] {
    let ab = sub(b, a);
    let ac = sub(c, a);
    let ap = sub(p, a);
    let bp = sub(p, b);
    let cp = sub(p, c);

    let n = cross(&ab, &ac);
    if abs_diff_eq!(dot(&n, &n), 0.0, epsilon = 1e-12 * dot(&ab, &ab) * dot(&ac, &ac)) {
        let da = dot(&ap, &ap);
        let db = dot(&bp, &bp);
        let dc = dot(&cp, &cp);
        return if da <= db && da <= dc {
            [1.0, 0.0, 0.0]
        } else if db <= dc {
            [0.0, 1.0, 0.0]
        } else {
            [0.0, 0.0, 1.0]
        };
    }

    let d1 = dot(&ab, &ap);
    let d2 = dot(&ac, &ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return [1.0, 0.0, 0.0];
    }

    let d3 = dot(&ab, &bp);
    let d4 = dot(&ac, &bp);
    if d3 >= 0.0 && d4 <= d3 {
        return [0.0, 1.0, 0.0];
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let v = d1 / (d1 - d3);
        return [1.0 - v, v, 0.0];
    }

    let d5 = dot(&ab, &cp);
    let d6 = dot(&ac, &cp);
    if d6 >= 0.0 && d5 <= d6 {
        return [0.0, 0.0, 1.0];
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let w = d2 / (d2 - d6);
        return [1.0 - w, 0.0, w];
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return [0.0, 1.0 - w, w];
    }

    let sum = va + vb + vc;
    let v = vb / sum;
    let w = vc / sum;
    [1.0 - v - w, v, w]
}


#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn triangle() -> BrainMesh {
        BrainMesh::new(vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0], vec![0, 1, 2]).unwrap()
    }

    fn nearest() -> InterpParams {
        InterpParams { mode: InterpolationMode::Nearest, ..InterpParams::default() }
    }

    #[test]
    fn a_point_inside_a_triangle_is_interpolated_barycentrically() {
        let mesh = triangle();
        let interp = Interpolator::new(&mesh).unwrap();
        let data = [1.0, 2.0, 3.0];
        let res = interp.interpolate(&data, &[[0.33, 0.33, 0.0]], &InterpParams::default());
        let res = res.unwrap();
        assert_abs_diff_eq!(1.99, res[0], epsilon = 1e-5);
    }

    #[test]
    fn nearest_mode_returns_a_source_value() {
        let mesh = triangle();
        let interp = Interpolator::new(&mesh).unwrap();
        let data = [1.0, 2.0, 3.0];
        let res = interp.interpolate(&data, &[[0.33, 0.33, 0.0]], &nearest()).unwrap();
        assert!(data.contains(&res[0]));
        assert_eq!(1.0, res[0]);
    }

    #[test]
    fn points_off_the_surface_are_projected() {
        let mesh = triangle();
        let interp = Interpolator::new(&mesh).unwrap();
        let data = [1.0, 2.0, 3.0];
        // Above the triangle plane: same as the projected point.
        let above = interp.value_at(&data, &[0.25, 0.25, 5.0], &InterpParams::default());
        assert_abs_diff_eq!(0.5 * 1.0 + 0.25 * 2.0 + 0.25 * 3.0, above, epsilon = 1e-5);
        // Beyond edge bc: clamped onto the edge.
        let outside = interp.value_at(&data, &[1.0, 1.0, 0.0], &InterpParams::default());
        assert_abs_diff_eq!(2.5, outside, epsilon = 1e-5);
    }

    #[test]
    fn missing_values_yield_the_fill_value() {
        let mesh = triangle();
        let interp = Interpolator::new(&mesh).unwrap();
        let data = [1.0, f32::NAN, 3.0];
        let params = InterpParams { fill: -1.0, ..InterpParams::default() };
        assert_eq!(-1.0, interp.value_at(&data, &[0.3, 0.3, 0.0], &params));
        // The missing vertex does not contribute on the opposite edge.
        assert_abs_diff_eq!(2.0, interp.value_at(&data, &[0.0, 0.5, 0.0], &params), epsilon = 1e-6);
    }

    #[test]
    fn wrong_data_length_is_rejected() {
        let mesh = triangle();
        let interp = Interpolator::new(&mesh).unwrap();
        let res = interp.interpolate(&[1.0, 2.0], &[[0.0, 0.0, 0.0]], &InterpParams::default());
        assert!(matches!(res, Err(CortexmapError::DataLengthMismatch(_, 3, 2))));
    }

    #[test]
    fn an_empty_mesh_is_rejected() {
        let mesh = BrainMesh::new(Vec::new(), Vec::new()).unwrap();
        assert!(Interpolator::new(&mesh).is_err());
    }

    #[test]
    fn closest_points_on_vertices_have_unit_weights() {
        let (a, b, c) = ([0.0, 0.0, 0.0], [2.0, 0.0, 0.0], [0.0, 2.0, 0.0]);
        assert_eq!([1.0, 0.0, 0.0], closest_point_barycentric(&a, &a, &b, &c));
        assert_eq!([0.0, 1.0, 0.0], closest_point_barycentric(&b, &a, &b, &c));
        assert_eq!([0.0, 0.0, 1.0], closest_point_barycentric(&c, &a, &b, &c));
        assert_eq!([1.0, 0.0, 0.0], closest_point_barycentric(&[-1.0, -1.0, 0.0], &a, &b, &c));
    }

    #[test]
    fn a_degenerate_triangle_gives_its_closest_corner() {
        let (a, b, c) = ([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0]);
        let w = closest_point_barycentric(&[1.1, 0.5, 0.0], &a, &b, &c);
        let sum: f64 = w.iter().sum();
        assert_abs_diff_eq!(1.0, sum, epsilon = 1e-12);
        assert!(w.iter().all(|x| *x >= 0.0));
    }
}
