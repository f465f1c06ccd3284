pub mod random_walk;

pub use random_walk::{ConstantTick, RandomWalkFeed, RandomWalkTicks, TickModel};
