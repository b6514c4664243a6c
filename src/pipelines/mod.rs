pub use self::mpm_pipeline::MpmPipeline;

mod mpm_pipeline;
