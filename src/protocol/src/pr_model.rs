// pr_model: Physical model for rendering

use crate::V3;

#[derive(Clone, Debug, PartialEq)]
pub struct PrObject {
	pub id: usize,
	pub pos: V3,
	pub vel: V3,
	pub mass: f32,
	pub radius: f32,
	pub kinetic_energy: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PrConstraint {
	pub id: usize,
	pub objects: [usize; 2],
	pub rest_length: f32,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PrModel {
	pub objects: Vec<PrObject>,
	pub constraints: Vec<PrConstraint>,
}

impl PrModel {
	pub fn kinetic_energy(&self) -> f32 {
		self.objects.iter().map(|o| o.kinetic_energy).sum()
	}

	// endpoints of every constraint, for drawing lines
	pub fn segments(&self) -> Vec<[V3; 2]> {
		self.constraints
			.iter()
			.filter_map(|c| {
				let a = self.objects.get(c.objects[0])?;
				let b = self.objects.get(c.objects[1])?;
				Some([a.pos, b.pos])
			})
			.collect()
	}
}
