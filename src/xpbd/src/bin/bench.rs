use std::time::Instant;

use xpbd::config::SimConfig;
use xpbd::physical_model::PhysicalModel;
use xpbd::pworld::PWorld;
use xpbd::V3;

fn main() {
	let config = SimConfig::default()
		.with_capacity(4000, 16000)
		.with_iterations(10);
	let mut pworld = PWorld::new(config);
	for m in 0..2 {
		for n in 0..3 {
			let offset = V3::new(2.0 * m as f32, -1.0 * n as f32, 0.);
			let stiffness = 1.0 - 0.1 * n as f32;
			let model = PhysicalModel::new_block(1.0, 25, 3, 0.05, stiffness);
			if let Err(e) = pworld.add_model(model, offset) {
				eprintln!("{}", e);
				return;
			}
		}
	}
	let dt = 1.0 / 60.0;
	let rframes = 100;
	let start = Instant::now();
	for _ in 0..rframes {
		if let Err(e) = pworld.update(dt) {
			eprintln!("{}", e);
			return;
		}
	}
	let time = rframes as f32 * dt;
	let duration = start.elapsed().as_secs_f32();
	eprintln!(
		"{} objects, {} constraints, parallel: {}",
		pworld.object_count(),
		pworld.constraint_count(),
		pworld.dispatcher().is_parallel()
	);
	eprintln!("{:.3}%", duration / time * 100.);
}
