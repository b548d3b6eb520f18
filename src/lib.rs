pub mod join;
pub mod keys;
pub mod progress;
pub mod resolver;
pub mod results;
pub mod table;
pub mod worms;
