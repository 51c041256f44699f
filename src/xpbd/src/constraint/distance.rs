use crate::constraint::Projection;
use crate::V3;

pub fn violation(pa: V3, pb: V3, rest_length: f32) -> f32 {
	(pb - pa).magnitude() - rest_length
}

/// One XPBD step of the distance constraint `|pb - pa| = rest_length`.
///
/// `alpha` is the time-scaled compliance; zero makes the constraint rigid.
/// Corrections are weighted by inverse mass, so a pinned end never moves.
pub fn project(
	pa: V3,
	pb: V3,
	imass: [f32; 2],
	rest_length: f32,
	lambda: f32,
	alpha: f32,
) -> Projection {
	let [imass_a, imass_b] = imass;
	let imass = imass_a + imass_b;
	if imass == 0.0 || !alpha.is_finite() {
		return Projection::Skip;
	}
	let dp = pb - pa;
	let l = dp.magnitude();
	if !l.is_normal() {
		return Projection::Degenerate;
	}
	let dl = l - rest_length;
	let dlambda = (-dl - alpha * lambda) / (imass + alpha);
	let n = dp / l;
	Projection::Correct {
		dlambda,
		da: -imass_a * dlambda * n,
		db: imass_b * dlambda * n,
	}
}

#[cfg(test)]
mod test {
	use super::*;

	fn apply(pa: &mut V3, pb: &mut V3, p: Projection) {
		if let Projection::Correct { da, db, .. } = p {
			*pa += da;
			*pb += db;
		}
	}

	#[test]
	fn test_rigid_pair_is_solved_in_one_step() {
		let mut pa = V3::new(0., 0., 0.);
		let mut pb = V3::new(3., 0., 0.);
		let p = project(pa, pb, [1., 1.], 1.0, 0., 0.);
		apply(&mut pa, &mut pb, p);
		assert!((pa - V3::new(1., 0., 0.)).magnitude() < 1e-6);
		assert!((pb - V3::new(2., 0., 0.)).magnitude() < 1e-6);
		assert!(violation(pa, pb, 1.0).abs() < 1e-6);
	}

	#[test]
	fn test_compressed_pair_pushes_apart() {
		let mut pa = V3::new(0., 0., 0.);
		let mut pb = V3::new(0., 1., 0.);
		let p = project(pa, pb, [1., 1.], 2.0, 0., 0.);
		apply(&mut pa, &mut pb, p);
		assert!(pa[1] < 0.);
		assert!(pb[1] > 1.);
	}

	#[test]
	fn test_pinned_end_does_not_move() {
		let mut pa = V3::new(0., 0., 0.);
		let mut pb = V3::new(0., -3., 0.);
		let p = project(pa, pb, [0., 1.], 1.0, 0., 0.);
		apply(&mut pa, &mut pb, p);
		assert_eq!(pa, V3::zeros());
		assert!((pb - V3::new(0., -1., 0.)).magnitude() < 1e-6);
	}

	#[test]
	fn test_compliant_pair_moves_partially() {
		let pa = V3::new(0., 0., 0.);
		let pb = V3::new(2., 0., 0.);
		match project(pa, pb, [1., 1.], 1.0, 0., 2.0) {
			Projection::Correct { dlambda, db, .. } => {
				assert!((dlambda + 0.25).abs() < 1e-6);
				assert!((db[0] + 0.25).abs() < 1e-6);
			}
			p => panic!("unexpected {:?}", p),
		}
	}

	#[test]
	fn test_degenerate_and_skip() {
		let p = V3::new(1., 1., 0.);
		assert_eq!(project(p, p, [1., 1.], 1.0, 0., 0.), Projection::Degenerate);
		let q = V3::new(2., 1., 0.);
		assert_eq!(project(p, q, [0., 0.], 1.0, 0., 0.), Projection::Skip);
		assert_eq!(
			project(p, q, [1., 1.], 1.0, 0., f32::INFINITY),
			Projection::Skip
		);
	}
}
