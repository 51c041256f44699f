use crate::pr_model::PrModel;

#[derive(Debug)]
pub enum UserEvent {
	Update(PrModel, UpdateInfo),
	// a command was refused, the world is unchanged
	Rejected(String),
	// the frame could not be computed, the simulation stops
	Failed(String),
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct UpdateInfo {
	pub frame: u64,
	pub dt: f32,
	pub load: f32,
	pub iterations: usize,
	pub object_len: usize,
	pub constraint_len: usize,
}
