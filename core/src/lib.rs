pub mod orchestrator;
pub mod prober;
pub mod racing;
pub mod ranker;
pub mod resolver;
