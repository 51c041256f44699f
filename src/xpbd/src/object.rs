use crate::error::Error;
use crate::V3;
use protocol::pr_model::PrObject;

/// A simulated point mass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhysicsObject {
	pub position: V3,
	pub velocity: V3,
	/// Externally applied acceleration, constant unless changed by the caller.
	pub acceleration: V3,
	/// `f32::INFINITY` pins the object.
	pub mass: f32,
	/// Only used for drawing.
	pub radius: f32,
}

impl Default for PhysicsObject {
	fn default() -> Self {
		Self {
			position: V3::zeros(),
			velocity: V3::zeros(),
			acceleration: V3::zeros(),
			mass: 1.0,
			radius: 1.0,
		}
	}
}

impl PhysicsObject {
	pub fn new(position: V3, mass: f32) -> Self {
		Self {
			position,
			mass,
			..Default::default()
		}
	}

	pub fn pinned(position: V3) -> Self {
		Self::new(position, f32::INFINITY)
	}

	pub fn with_velocity(mut self, velocity: V3) -> Self {
		self.velocity = velocity;
		self
	}

	pub fn with_acceleration(mut self, acceleration: V3) -> Self {
		self.acceleration = acceleration;
		self
	}

	pub fn with_radius(mut self, radius: f32) -> Self {
		self.radius = radius;
		self
	}

	pub fn get_imass(&self) -> f32 {
		if self.mass.is_infinite() {
			0.0
		} else {
			self.mass.recip()
		}
	}

	pub fn is_pinned(&self) -> bool {
		self.get_imass() == 0.0
	}

	pub fn speed(&self) -> f32 {
		self.velocity.magnitude()
	}

	pub fn kinetic_energy(&self) -> f32 {
		if self.is_pinned() {
			return 0.0;
		}
		0.5 * self.mass * self.velocity.magnitude_squared()
	}

	pub(crate) fn validate(&self) -> Result<(), Error> {
		// NaN fails the comparison too
		if !(self.mass > 0.0) {
			return Err(Error::InvalidMass(self.mass));
		}
		for (field, v) in [
			("position", self.position),
			("velocity", self.velocity),
			("acceleration", self.acceleration),
		] {
			if !v.iter().all(|x| x.is_finite()) {
				return Err(Error::NonFinite { field });
			}
		}
		Ok(())
	}

	pub fn render(&self, id: usize) -> PrObject {
		PrObject {
			id,
			pos: self.position,
			vel: self.velocity,
			mass: self.mass,
			radius: self.radius,
			kinetic_energy: self.kinetic_energy(),
		}
	}
}
