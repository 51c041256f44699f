use crate::constraint::PhysicsConstraint;
use crate::object::PhysicsObject;
use crate::physical_model::PhysicalModel;
use crate::V3;

/// Commands for a world running on its own thread, applied between frames.
#[derive(Clone, Debug)]
pub enum ControllerMessage {
	TogglePause,
	FrameForward,
	SetIterations(usize),
	AddObject(PhysicsObject),
	AddConstraint(PhysicsConstraint),
	AddModel(PhysicalModel, V3),
	MoveObject(usize, V3),
	Clear,
}
