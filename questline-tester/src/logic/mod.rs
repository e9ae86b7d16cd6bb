pub mod content;
pub mod policy;
pub mod reports;
pub mod seeds;
pub mod simulation;
pub mod tester;

pub use content::FileContent;
pub use policy::GameplayStrategy;
pub use seeds::{resolve_seed_inputs, split_csv};
pub use simulation::{GameTester, SimulationPlan};
pub use tester::*;
