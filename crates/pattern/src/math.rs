/// Multiplier applied to the seed before taking its sine.
const HASH_SCALE: f32 = 78.233;
/// Amplifies the sine so its fractional digits look uncorrelated.
const HASH_GAIN: f32 = 43758.5453123;

/// GLSL `fract`, except that float rounding can never produce exactly `1.0`.
pub fn fract(x: f32) -> f32 {
    let f = x - x.floor();
    if f >= 1.0 {
        0.0
    } else {
        f
    }
}

/// Deterministic one-argument hash into `[0, 1)`.
pub fn hash(seed: f32) -> f32 {
    fract((seed * HASH_SCALE).sin() * HASH_GAIN)
}

/// GLSL `mix`.
pub fn mix(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// GLSL `smoothstep`: cubic Hermite ramp from `edge0` to `edge1`.
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Piecewise-linear blend across three colors keyed by `a ∈ [0, 1]`.
///
/// Below `0.5` the result moves from `c0` to `c1`, above it from `c1` to `c2`.
pub fn mix3(c0: [f32; 3], c1: [f32; 3], c2: [f32; 3], a: f32) -> [f32; 3] {
    let (from, to, t) = if a < 0.5 {
        (c0, c1, a / 0.5)
    } else {
        (c1, c2, (a - 0.5) / 0.5)
    };
    std::array::from_fn(|channel| mix(from[channel], to[channel], t))
}
