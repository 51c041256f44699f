use rand::Rng;

use crate::constraint::PhysicsConstraint;
use crate::object::PhysicsObject;
use crate::V3;

pub const GRAVITY: f32 = 9.8;

/// Objects and constraints with model-local indices, placed into a world
/// with `PWorld::add_model`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PhysicalModel {
	pub objects: Vec<PhysicsObject>,
	pub constraints: Vec<PhysicsConstraint>,
}

impl PhysicalModel {
	pub fn add_object(&mut self, object: PhysicsObject) -> usize {
		self.objects.push(object);
		self.objects.len() - 1
	}

	// rest length is the current separation
	pub fn link(&mut self, a: usize, b: usize, stiffness: f32) {
		let l0 = (self.objects[a].position - self.objects[b].position)
			.magnitude();
		self.constraints
			.push(PhysicsConstraint::distance(a, b, l0).with_stiffness(stiffness));
	}

	#[allow(clippy::needless_range_loop)]
	pub fn new_block(
		mass: f32,
		x: usize,
		y: usize,
		size: f32,
		stiffness: f32,
	) -> Self {
		let mut model = Self::default();
		let mut ps = vec![];
		for idx in 0..x {
			let mut pline = vec![];
			for idy in 0..y {
				let pos = V3::new(size * idx as f32, size * idy as f32, 0.);
				let object = PhysicsObject::new(pos, mass)
					.with_acceleration(V3::new(0., -GRAVITY, 0.))
					.with_radius(size / 4.);
				pline.push(model.add_object(object));
			}
			ps.push(pline);
		}
		for idx in 1..x {
			for idy in 0..y {
				model.link(ps[idx][idy], ps[idx - 1][idy], stiffness);
			}
		}
		for idx in 0..x {
			for idy in 1..y {
				model.link(ps[idx][idy], ps[idx][idy - 1], stiffness);
			}
		}
		for idx in 1..x {
			for idy in 1..y {
				model.link(ps[idx - 1][idy], ps[idx][idy - 1], stiffness);
				model.link(ps[idx - 1][idy - 1], ps[idx][idy], stiffness);
			}
		}
		model
	}

	/// A rope hanging along -y, optionally pinned at its top.
	pub fn new_chain(
		n: usize,
		spacing: f32,
		mass: f32,
		stiffness: f32,
		pin_first: bool,
	) -> Self {
		let mut model = Self::default();
		for i in 0..n {
			let pos = V3::new(0., -spacing * i as f32, 0.);
			let mass = if i == 0 && pin_first { f32::INFINITY } else { mass };
			model.add_object(
				PhysicsObject::new(pos, mass)
					.with_acceleration(V3::new(0., -GRAVITY, 0.))
					.with_radius(spacing / 4.),
			);
			if i > 0 {
				model.link(i - 1, i, stiffness);
			}
		}
		model
	}

	/// A hub with `spokes` rim objects, each tied to the hub and to its
	/// neighbour on the rim.
	pub fn new_hub(spokes: usize, radius: f32, mass: f32, stiffness: f32) -> Self {
		let mut model = Self::default();
		let hub = model.add_object(PhysicsObject::new(V3::zeros(), mass));
		for i in 0..spokes {
			let angle = i as f32 * std::f32::consts::TAU / spokes as f32;
			let pos = V3::new(angle.cos(), angle.sin(), 0.) * radius;
			let rim = model.add_object(PhysicsObject::new(pos, mass));
			model.link(hub, rim, stiffness);
			if i > 0 {
				model.link(rim - 1, rim, stiffness);
			}
		}
		if spokes > 2 {
			model.link(spokes, 1, stiffness);
		}
		model
	}

	/// Loose balls fanned out from `origin`, in screen coordinates with +y
	/// pointing down. `jitter` randomizes the initial velocities.
	pub fn spawn_balls<R: Rng>(
		rng: &mut R,
		n: usize,
		origin: V3,
		jitter: f32,
	) -> Self {
		let mut model = Self::default();
		let jitter = if jitter.is_finite() { jitter.abs() } else { 0.0 };
		for i in 0..n {
			let k = i as f32;
			let noise = V3::new(
				rng.gen_range(-jitter..=jitter),
				rng.gen_range(-jitter..=jitter),
				0.,
			);
			let ball = PhysicsObject::new(
				origin + V3::new(50. * k, 30. * k, 0.),
				1.0 + 0.5 * k,
			)
			.with_velocity(V3::new((k - 1.) * 100., (k - 1.) * 80., 0.) + noise)
			.with_acceleration(V3::new(0., 300., 0.))
			.with_radius(10.);
			model.add_object(ball);
		}
		model
	}
}
