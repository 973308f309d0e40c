pub mod resampler;

pub use resampler::Resampler;
