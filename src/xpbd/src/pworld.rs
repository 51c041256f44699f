use std::sync::mpsc::{Receiver, Sender, TryRecvError};
use std::time::{Duration, Instant};

use crate::config::{SimConfig, SolverKind};
use crate::constraint::PhysicsConstraint;
use crate::constraint_store::ConstraintStore;
use crate::controller_message::ControllerMessage;
use crate::dispatch::{self, Dispatcher, ParallelFor};
use crate::error::{DispatchError, Error};
use crate::integrator;
use crate::object::PhysicsObject;
use crate::object_store::ObjectStore;
use crate::physical_model::PhysicalModel;
use crate::reconcile;
use crate::relax::Relaxation;
use crate::time_manager::TimeManager;
use crate::V3;
use protocol::pr_model::PrModel;
use protocol::user_event::{UpdateInfo, UserEvent};

/// What happened during one `update`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameReport {
	pub dt: f32,
	/// Relaxation iterations actually run.
	pub iterations: usize,
	pub colors: usize,
	pub work_groups: usize,
	/// Projections skipped because two endpoints coincided.
	pub degenerate: usize,
	/// Largest `|C|` after relaxation.
	pub max_violation: f32,
}

/// The simulation: object and constraint stores plus the per-frame
/// predict, relax, reconcile sequence.
///
/// All frame work happens on scratch buffers. The stores only change once
/// a frame has been reconciled, so readers never see a partial frame and
/// an aborted frame leaves no trace.
pub struct PWorld<D: ParallelFor = Dispatcher> {
	config: SimConfig,
	iteration: usize,

	// -1: always play
	// 0: pause
	// n: play n frames
	forward_frames: i32,
	frame: u64,

	objects: ObjectStore,
	constraints: ConstraintStore,
	dispatcher: D,
}

impl Default for PWorld {
	fn default() -> Self {
		Self::new(SimConfig::default())
	}
}

impl PWorld {
	pub fn new(config: SimConfig) -> Self {
		let dispatcher = Dispatcher::new(config.dispatch, config.threads);
		Self::with_dispatcher(config, dispatcher)
	}
}

impl<D: ParallelFor> PWorld<D> {
	pub fn with_dispatcher(config: SimConfig, dispatcher: D) -> Self {
		Self {
			iteration: config.iterations,
			forward_frames: -1,
			frame: 0,
			objects: ObjectStore::new(config.max_objects),
			constraints: ConstraintStore::new(config.max_constraints),
			dispatcher,
			config,
		}
	}

	pub fn with_paused(mut self) -> Self {
		self.forward_frames = 0;
		self
	}

	pub fn config(&self) -> &SimConfig {
		&self.config
	}

	pub fn dispatcher(&self) -> &D {
		&self.dispatcher
	}

	/// Number of frames computed so far.
	pub fn frame(&self) -> u64 {
		self.frame
	}

	pub fn is_paused(&self) -> bool {
		self.forward_frames == 0
	}

	pub fn add_object(&mut self, object: PhysicsObject) -> Result<usize, Error> {
		self.objects.add_object(object)
	}

	pub fn add_constraint(
		&mut self,
		constraint: PhysicsConstraint,
	) -> Result<usize, Error> {
		self.constraints
			.add_constraint(constraint, self.objects.len())
	}

	pub fn object_count(&self) -> usize {
		self.objects.len()
	}

	pub fn constraint_count(&self) -> usize {
		self.constraints.len()
	}

	/// Takes effect with the next `update`.
	pub fn set_iterations(&mut self, iterations: usize) {
		if iterations != self.iteration {
			log::info!("iterations: {} -> {}", self.iteration, iterations);
		}
		self.iteration = iterations;
	}

	pub fn iterations(&self) -> usize {
		self.iteration
	}

	/// Value snapshot of every object, in insertion order.
	pub fn objects_data(&self) -> Vec<PhysicsObject> {
		self.objects.read_all()
	}

	pub fn constraints_data(&self) -> Vec<PhysicsConstraint> {
		self.constraints.read_all()
	}

	pub fn move_object(&mut self, index: usize, pos: V3) -> Result<(), Error> {
		self.objects.reset_pos(index, pos)
	}

	pub fn clear(&mut self) {
		log::info!(
			"clear: {} objects, {} constraints",
			self.objects.len(),
			self.constraints.len()
		);
		self.objects.clear();
		self.constraints.clear();
	}

	/// Adds a whole model, shifted by `offset`, and returns the index of
	/// its first object. Nothing is added if any part is rejected.
	pub fn add_model(
		&mut self,
		physical_model: PhysicalModel,
		offset: V3,
	) -> Result<usize, Error> {
		let PhysicalModel {
			objects,
			constraints,
		} = physical_model;
		if objects.len() > self.objects.remaining() {
			return Err(Error::CapacityExceeded {
				capacity: self.objects.capacity(),
			});
		}
		if constraints.len() > self.constraints.remaining() {
			return Err(Error::CapacityExceeded {
				capacity: self.constraints.capacity(),
			});
		}
		for object in objects.iter() {
			object.validate()?;
		}
		for constraint in constraints.iter() {
			constraint.validate(objects.len())?;
		}

		log::info!(
			"add model: {} objects, {} constraints",
			objects.len(),
			constraints.len()
		);
		let base = self.objects.len();
		for object in objects.into_iter() {
			self.objects.add_object(PhysicsObject {
				position: object.position + offset,
				..object
			})?;
		}
		for constraint in constraints.into_iter() {
			self.constraints.add_constraint(
				PhysicsConstraint {
					a: constraint.a + base,
					b: constraint.b + base,
					..constraint
				},
				self.objects.len(),
			)?;
		}
		Ok(base)
	}

	pub fn pr_model(&self) -> PrModel {
		PrModel {
			objects: self
				.objects
				.objects()
				.iter()
				.enumerate()
				.map(|(id, o)| o.render(id))
				.collect(),
			constraints: self
				.constraints
				.constraints()
				.iter()
				.enumerate()
				.map(|(id, c)| c.render(id))
				.collect(),
		}
	}

	/// Advances the simulation by `dt` seconds.
	///
	/// `dt` is used as given; clamping against hitches is up to the caller.
	pub fn update(&mut self, dt: f32) -> Result<FrameReport, Error> {
		if !(dt > 0.0 && dt.is_finite()) {
			return Err(Error::InvalidTimeStep(dt));
		}
		if self.objects.is_empty() {
			return Ok(FrameReport::default());
		}
		match self.update_frame(dt) {
			Ok(report) => Ok(report),
			Err(e) => {
				log::error!("frame {} aborted: {}", self.frame + 1, e);
				Err(e.into())
			}
		}
	}

	fn update_frame(&mut self, dt: f32) -> Result<FrameReport, DispatchError> {
		let n = self.objects.len();
		let imass: Vec<f32> =
			self.objects.objects().iter().map(|o| o.get_imass()).collect();

		// the previous frame's resolved positions are the starting guess
		let mut positions = integrator::predict(
			&self.dispatcher,
			self.objects.objects(),
			self.objects.previous(),
			dt,
		)?;

		let mut lambdas = vec![0.0; self.constraints.len()];
		let mut colors = 0;
		let stats = match self.config.solver {
			SolverKind::Colored => {
				let (constraints, coloring) = self.constraints.colored(n);
				colors = coloring.len();
				Relaxation {
					constraints,
					imass: &imass,
					dt,
					iterations: self.iteration,
					tolerance: self.config.tolerance,
				}
				.colored(&self.dispatcher, coloring, &mut positions, &mut lambdas)?
			}
			SolverKind::Sequential => Relaxation {
				constraints: self.constraints.constraints(),
				imass: &imass,
				dt,
				iterations: self.iteration,
				tolerance: self.config.tolerance,
			}
			.sequential(&mut positions, &mut lambdas),
		};

		let velocities = reconcile::derive_velocities(
			&self.dispatcher,
			&positions,
			self.objects.previous(),
			dt,
		)?;

		self.objects.commit(positions, velocities);
		self.constraints.commit_lambdas(&lambdas);
		self.frame += 1;

		if stats.degenerate > 0 {
			log::warn!(
				"frame {}: skipped {} degenerate projections",
				self.frame,
				stats.degenerate
			);
		}
		let report = FrameReport {
			dt,
			iterations: stats.iterations,
			colors,
			work_groups: dispatch::work_groups(n),
			degenerate: stats.degenerate,
			max_violation: stats.max_violation,
		};
		log::debug!("frame {}: {:?}", self.frame, report);
		Ok(report)
	}

	pub fn handle_message(&mut self, msg: ControllerMessage) -> Result<(), Error> {
		match msg {
			ControllerMessage::TogglePause => {
				if self.forward_frames == 0 {
					self.forward_frames = -1;
				} else {
					self.forward_frames = 0;
				}
			}
			ControllerMessage::FrameForward => {
				if self.forward_frames == 0 {
					self.forward_frames += 1;
				}
			}
			ControllerMessage::SetIterations(n) => self.set_iterations(n),
			ControllerMessage::AddObject(object) => {
				self.add_object(object)?;
			}
			ControllerMessage::AddConstraint(constraint) => {
				self.add_constraint(constraint)?;
			}
			ControllerMessage::AddModel(physical_model, offset) => {
				self.add_model(physical_model, offset)?;
			}
			ControllerMessage::MoveObject(index, pos) => {
				self.move_object(index, pos)?;
			}
			ControllerMessage::Clear => self.clear(),
		}
		Ok(())
	}

	fn update_info(&self, dt: f32, load: f32) -> UpdateInfo {
		UpdateInfo {
			frame: self.frame,
			dt,
			load,
			iterations: self.iteration,
			object_len: self.objects.len(),
			constraint_len: self.constraints.len(),
		}
	}

	/// Drives the world on the current thread.
	///
	/// Commands from `rx` are applied between frames. After every frame a
	/// snapshot is sent on `tx`. Returns once either channel is closed, or
	/// with the error of a frame that could not be computed.
	pub fn run_thread(
		&mut self,
		tx: Sender<UserEvent>,
		rx: Receiver<ControllerMessage>,
	) -> Result<(), Error> {
		let mut time_manager =
			TimeManager::new(self.config.time_model, self.config.max_dt);
		let first = UserEvent::Update(self.pr_model(), self.update_info(0.0, 0.0));
		if tx.send(first).is_err() {
			return Ok(());
		}
		loop {
			loop {
				match rx.try_recv() {
					Ok(msg) => {
						if let Err(e) = self.handle_message(msg) {
							log::warn!("rejected command: {}", e);
							if tx.send(UserEvent::Rejected(e.to_string())).is_err()
							{
								return Ok(());
							}
						}
					}
					Err(TryRecvError::Empty) => break,
					Err(TryRecvError::Disconnected) => return Ok(()),
				}
			}

			time_manager.set(!self.is_paused());
			if self.is_paused() {
				std::thread::sleep(Duration::from_millis(1));
				continue;
			}
			let dt = time_manager.take_time();
			let start = Instant::now();
			if let Err(e) = self.update(dt) {
				let _ = tx.send(UserEvent::Failed(e.to_string()));
				return Err(e);
			}
			if self.forward_frames > 0 {
				self.forward_frames -= 1;
			}
			let load = start.elapsed().as_secs_f32() / dt;
			let event =
				UserEvent::Update(self.pr_model(), self.update_info(dt, load));
			if tx.send(event).is_err() {
				return Ok(());
			}
		}
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::dispatch::Serial;

	struct FailOn(&'static str);

	impl ParallelFor for FailOn {
		fn for_each_mut<T, F>(
			&self,
			pass: &'static str,
			items: &mut [T],
			body: F,
		) -> Result<(), DispatchError>
		where
			T: Send,
			F: Fn(usize, &mut T) + Send + Sync,
		{
			if pass == self.0 {
				return Err(DispatchError::Panicked { pass });
			}
			Serial.for_each_mut(pass, items, body)
		}
	}

	fn pendulum<D: ParallelFor>(world: &mut PWorld<D>) {
		let anchor =
			world.add_object(PhysicsObject::pinned(V3::zeros())).unwrap();
		let bob = world
			.add_object(
				PhysicsObject::new(V3::new(1., 0., 0.), 1.0)
					.with_velocity(V3::new(1., 0., 0.))
					.with_acceleration(V3::new(0., -9.8, 0.)),
			)
			.unwrap();
		world
			.add_constraint(PhysicsConstraint::distance(anchor, bob, 1.0))
			.unwrap();
	}

	#[test]
	fn test_dispatch_failure_leaves_state() {
		let passes =
			["predict", "relax-constraints", "relax-objects", "reconcile"];
		for pass in passes {
			let config = SimConfig::default().with_iterations(4);
			let mut world = PWorld::with_dispatcher(config, FailOn(pass));
			pendulum(&mut world);
			let objects = world.objects_data();
			let constraints = world.constraints_data();
			let result = world.update(0.01);
			assert_eq!(
				result,
				Err(Error::Dispatch(DispatchError::Panicked { pass }))
			);
			assert_eq!(world.objects_data(), objects);
			assert_eq!(world.constraints_data(), constraints);
			assert_eq!(world.frame(), 0);
		}
	}

	#[test]
	fn test_invalid_time_step() {
		let mut world = PWorld::with_dispatcher(SimConfig::default(), Serial);
		pendulum(&mut world);
		for dt in [0.0, -0.01, f32::NAN, f32::INFINITY] {
			assert!(matches!(world.update(dt), Err(Error::InvalidTimeStep(_))));
		}
		assert_eq!(world.frame(), 0);
	}

	#[test]
	fn test_lambda_is_stored_per_frame() {
		let config = SimConfig::default().with_iterations(10);
		let mut world = PWorld::with_dispatcher(config, Serial);
		pendulum(&mut world);
		let report = world.update(0.01).unwrap();
		assert_eq!(report.colors, 1);
		assert_eq!(report.work_groups, 1);
		// the rope holds the bob back
		let lambda = world.constraints_data()[0].lambda;
		assert!(lambda < 0.0, "{}", lambda);
		assert!(report.max_violation < 1e-4);
	}

	#[test]
	fn test_add_model_is_all_or_nothing() {
		let config = SimConfig::default().with_capacity(10, 10);
		let mut world = PWorld::with_dispatcher(config, Serial);
		let chain = PhysicalModel::new_chain(4, 1.0, 1.0, 1.0, true);
		assert_eq!(world.add_model(chain.clone(), V3::new(5., 0., 0.)), Ok(0));
		assert_eq!(world.add_model(chain.clone(), V3::zeros()), Ok(4));
		assert_eq!(
			world.add_model(chain.clone(), V3::zeros()),
			Err(Error::CapacityExceeded { capacity: 10 })
		);
		assert_eq!(world.object_count(), 8);
		assert_eq!(world.constraint_count(), 6);
		let c = world.constraints_data()[4];
		assert_eq!((c.a, c.b), (5, 6));
		assert_eq!(world.objects_data()[0].position, V3::new(5., 0., 0.));

		let mut broken = PhysicalModel::new_chain(2, 1.0, 1.0, 1.0, false);
		broken.constraints.push(PhysicsConstraint::distance(0, 9, 1.0));
		assert!(matches!(
			world.add_model(broken, V3::zeros()),
			Err(Error::InvalidReference { index: 9, .. })
		));
		assert_eq!(world.object_count(), 8);
	}

	#[test]
	fn test_messages() {
		let mut world = PWorld::with_dispatcher(SimConfig::default(), Serial);
		assert!(!world.is_paused());
		world.handle_message(ControllerMessage::TogglePause).unwrap();
		assert!(world.is_paused());
		world.handle_message(ControllerMessage::FrameForward).unwrap();
		assert!(!world.is_paused());
		world
			.handle_message(ControllerMessage::SetIterations(7))
			.unwrap();
		assert_eq!(world.iterations(), 7);
		world
			.handle_message(ControllerMessage::AddObject(PhysicsObject::default()))
			.unwrap();
		let bad = PhysicsConstraint::distance(0, 1, 1.0);
		assert!(world
			.handle_message(ControllerMessage::AddConstraint(bad))
			.is_err());
		world
			.handle_message(ControllerMessage::MoveObject(0, V3::new(1., 1., 0.)))
			.unwrap();
		assert_eq!(world.objects_data()[0].position, V3::new(1., 1., 0.));
		world.handle_message(ControllerMessage::Clear).unwrap();
		assert_eq!(world.object_count(), 0);
	}

	#[test]
	fn test_pr_model() {
		let mut world = PWorld::with_dispatcher(SimConfig::default(), Serial);
		pendulum(&mut world);
		let model = world.pr_model();
		assert_eq!(model.objects.len(), 2);
		assert_eq!(model.constraints[0].objects, [0, 1]);
		assert_eq!(model.objects[1].pos, V3::new(1., 0., 0.));
	}
}
