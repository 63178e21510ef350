mod effect;
mod supervisor;

pub use effect::EffectType;
pub use supervisor::WatcherSupervisor;
