mod engine;

pub use engine::{Task, TaskAction, TaskEngine};
