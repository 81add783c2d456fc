pub mod phi0_clock;

pub use phi0_clock::Phi0Clock;
