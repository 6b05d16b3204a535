pub mod table;

pub use table::{Band, DabChannels, NUMBER_OF_CHANNELS};
