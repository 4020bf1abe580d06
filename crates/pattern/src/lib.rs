//! CPU reference of the animated strands fragment shader.
//!
//! The GPU version lives in `gallery/shaders/strands.frag`; this crate mirrors
//! it step for step in `f32` so the pattern can be sampled and tested without
//! a graphics device:
//!
//! ```text
//!   uv, time_ms ──▶ StrandField::evaluate ──▶ 20 × Strand::sample ──▶ average ──▶ RGBA
//! ```
//!
//! Every strand derives its wave parameters from two hashed seeds, so the
//! image is a pure function of `(uv, time_ms)` and the constants in
//! [`StrandParameters::DEFAULT`].

mod math;
mod strands;

pub use math::{fract, hash, mix, mix3, smoothstep};
pub use strands::{
    evaluate, Range, Rgba, Strand, StrandField, StrandParameters, StrandSample, WaveTerm,
    FADE_EDGE, LINE_COUNT, SECONDARY_SEED_OFFSET, UNCOVERED_COLOR,
};
