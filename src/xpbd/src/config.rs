use crate::time_manager::TimeModel;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SolverKind {
	/// Graph-colored relaxation, parallel within a color.
	#[default]
	Colored,
	/// Single-threaded Gauss-Seidel in insertion order.
	Sequential,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DispatchKind {
	/// Serial in debug builds, rayon in release builds.
	#[default]
	Auto,
	Serial,
	Parallel,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SimConfig {
	pub max_objects: usize,
	pub max_constraints: usize,
	pub iterations: usize,
	/// Upper bound applied by the driver to every frame's dt.
	pub max_dt: f32,
	pub solver: SolverKind,
	pub dispatch: DispatchKind,
	/// Worker count for parallel dispatch, `None` for rayon's default.
	pub threads: Option<usize>,
	/// Stop relaxing once the largest violation drops below this.
	pub tolerance: Option<f32>,
	pub time_model: TimeModel,
}

impl Default for SimConfig {
	fn default() -> Self {
		Self {
			max_objects: 1000,
			max_constraints: 1000,
			iterations: 1,
			max_dt: 0.033,
			solver: SolverKind::default(),
			dispatch: DispatchKind::default(),
			threads: None,
			tolerance: None,
			time_model: TimeModel::RtFrameLock(1.0 / 60.0),
		}
	}
}

impl SimConfig {
	pub fn with_capacity(
		mut self,
		max_objects: usize,
		max_constraints: usize,
	) -> Self {
		self.max_objects = max_objects;
		self.max_constraints = max_constraints;
		self
	}

	pub fn with_iterations(mut self, iterations: usize) -> Self {
		self.iterations = iterations;
		self
	}

	pub fn with_max_dt(mut self, max_dt: f32) -> Self {
		self.max_dt = max_dt;
		self
	}

	pub fn with_solver(mut self, solver: SolverKind) -> Self {
		self.solver = solver;
		self
	}

	pub fn with_dispatch(mut self, dispatch: DispatchKind) -> Self {
		self.dispatch = dispatch;
		self
	}

	pub fn with_threads(mut self, threads: usize) -> Self {
		self.threads = Some(threads);
		self
	}

	pub fn with_tolerance(mut self, tolerance: f32) -> Self {
		self.tolerance = Some(tolerance);
		self
	}

	pub fn with_time_model(mut self, time_model: TimeModel) -> Self {
		self.time_model = time_model;
		self
	}
}
