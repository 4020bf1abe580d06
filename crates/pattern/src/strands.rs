use crate::math::{hash, mix, mix3, smoothstep};

/// Number of strands composited per pixel.
pub const LINE_COUNT: u32 = 20;

/// Offset applied to a strand index to derive its second, independent seed.
pub const SECONDARY_SEED_OFFSET: f32 = 1756.2345432;

/// Upper edge of the smoothstep that softens a strand towards its borders.
pub const FADE_EDGE: f32 = 0.8;

/// Color of a pixel that no strand covers.
pub const UNCOVERED_COLOR: [f32; 3] = [0.0, 0.0, 0.0];

/// Output color with straight alpha.
pub type Rgba = [f32; 4];

/// Closed interval sampled by linear interpolation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range {
    pub low: f32,
    pub high: f32,
}

impl Range {
    pub const fn new(low: f32, high: f32) -> Self {
        Self { low, high }
    }

    /// Interpolates between the bounds at `t`.
    pub fn at(self, t: f32) -> f32 {
        mix(self.low, self.high, t)
    }
}

/// Fixed wave tables shared by every strand.
///
/// The GLSL shader declares the same values as named constants; keep both in
/// sync when tuning the look.
#[derive(Debug, Clone, PartialEq)]
pub struct StrandParameters {
    pub line_count: u32,
    pub freq_0: Range,
    pub freq_1: Range,
    pub speed_0: Range,
    pub speed_1: Range,
    pub amplitude_0: Range,
    pub amplitude_1: Range,
    pub phase_shift_0: Range,
    pub phase_shift_1: Range,
    pub thickness: Range,
    pub colors: [[f32; 3]; 3],
}

impl StrandParameters {
    pub const DEFAULT: Self = Self {
        line_count: LINE_COUNT,
        freq_0: Range::new(2.0, 4.0),
        freq_1: Range::new(2.0, 4.0),
        speed_0: Range::new(1500.0, 2500.0),
        speed_1: Range::new(2000.0, 3000.0),
        amplitude_0: Range::new(0.5, 0.5),
        amplitude_1: Range::new(0.5, 0.5),
        phase_shift_0: Range::new(0.0, 6.28),
        phase_shift_1: Range::new(0.0, 6.28),
        thickness: Range::new(0.01, 0.03),
        colors: [[0.0, 1.0, 0.0], [0.0, 1.0, 1.0], [0.0, 0.0, 1.0]],
    };
}

impl Default for StrandParameters {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// One sine term of a wave: `sin(x * freq + time / speed + phase) * amplitude`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveTerm {
    pub freq: f32,
    pub speed: f32,
    pub amplitude: f32,
    pub phase: f32,
}

impl WaveTerm {
    fn value(self, x: f32, time_ms: f32) -> f32 {
        (x * self.freq + time_ms / self.speed + self.phase).sin() * self.amplitude
    }
}

/// Sum of two sine terms remapped from `[-1, 1]` to `[0, 1]`.
fn make_wave(x: f32, time_ms: f32, terms: [WaveTerm; 2]) -> f32 {
    let wave = terms[0].value(x, time_ms) + terms[1].value(x, time_ms);
    (wave + 1.0) / 2.0
}

/// What a single strand contributes to a covered pixel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrandSample {
    /// Height of the strand's centre line at this column.
    pub wave_0: f32,
    /// Secondary wave modulating brightness.
    pub wave_1: f32,
    /// Smoothstep falloff, `1.0` on the centre line.
    pub fade: f32,
    pub color: [f32; 3],
}

impl StrandSample {
    /// `color * wave_1 * fade`, the value added to the pixel accumulator.
    pub fn contribution(&self) -> [f32; 3] {
        self.color.map(|channel| channel * self.wave_1 * self.fade)
    }
}

/// A single animated strand with its per-index parameters resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct Strand {
    index: u32,
    seeds: (f32, f32),
    primary: [WaveTerm; 2],
    secondary: [WaveTerm; 2],
    thickness: f32,
    color: [f32; 3],
}

impl Strand {
    pub fn new(index: u32, params: &StrandParameters) -> Self {
        let seed = index as f32;
        let r = hash(seed);
        let r1 = hash(seed + SECONDARY_SEED_OFFSET);

        let f0 = params.freq_0.at(r);
        let f1 = params.freq_1.at(r1);
        let s0 = params.speed_0.at(r);
        let s1 = params.speed_1.at(r1);
        let a0 = params.amplitude_0.at(r);
        let a1 = params.amplitude_1.at(r1);
        // Interpolates the low bound with itself; the phase never leaves `low`.
        let p0 = mix(params.phase_shift_0.low, params.phase_shift_0.low, r);
        let p1 = mix(params.phase_shift_1.low, params.phase_shift_1.low, r1);

        let primary = [
            WaveTerm {
                freq: f0,
                speed: s0,
                amplitude: a0,
                phase: p0,
            },
            WaveTerm {
                freq: f1,
                speed: s1,
                amplitude: a1,
                phase: p1,
            },
        ];
        let secondary = [
            WaveTerm {
                freq: f1,
                speed: s0 * 0.5,
                amplitude: a0,
                phase: p1,
            },
            WaveTerm {
                freq: f0,
                speed: s1 * 0.5,
                amplitude: a1,
                phase: p0,
            },
        ];

        let [c0, c1, c2] = params.colors;
        Self {
            index,
            seeds: (r, r1),
            primary,
            secondary,
            thickness: params.thickness.at(r),
            color: mix3(c0, c1, c2, r),
        }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    /// The two hashed seeds `(r, r1)`.
    pub fn seeds(&self) -> (f32, f32) {
        self.seeds
    }

    /// Phase shifts of the two primary sine terms.
    pub fn phases(&self) -> (f32, f32) {
        (self.primary[0].phase, self.primary[1].phase)
    }

    /// Half-height of the band around the centre line.
    pub fn thickness(&self) -> f32 {
        self.thickness
    }

    pub fn color(&self) -> [f32; 3] {
        self.color
    }

    /// Height of the centre line (`wave_0`) at column `x`.
    pub fn center(&self, x: f32, time_ms: f32) -> f32 {
        make_wave(x, time_ms, self.primary)
    }

    /// Samples the strand at `uv`; `None` when the pixel lies outside its band.
    pub fn sample(&self, uv: [f32; 2], time_ms: f32) -> Option<StrandSample> {
        let [x, y] = uv;
        let wave_0 = self.center(x, time_ms);
        let lower = wave_0 - self.thickness;
        let upper = wave_0 + self.thickness;
        if !(lower < y && y < upper) {
            return None;
        }

        let wave_1 = make_wave(x, time_ms, self.secondary);
        let distance = ((lower + upper) / 2.0 - y).abs();
        let fade = smoothstep(0.0, FADE_EDGE, 1.0 - distance / (upper - lower));

        Some(StrandSample {
            wave_0,
            wave_1,
            fade,
            color: self.color,
        })
    }
}

/// All strands of one parameter set, ready to be evaluated per pixel.
#[derive(Debug, Clone)]
pub struct StrandField {
    strands: Vec<Strand>,
}

impl StrandField {
    pub fn new(params: &StrandParameters) -> Self {
        let strands = (0..params.line_count)
            .map(|index| Strand::new(index, params))
            .collect();
        Self { strands }
    }

    pub fn strands(&self) -> &[Strand] {
        &self.strands
    }

    /// Averages the contributions of every strand covering `uv`.
    ///
    /// Pixels covered by no strand resolve to [`UNCOVERED_COLOR`].
    pub fn evaluate(&self, uv: [f32; 2], time_ms: f32) -> Rgba {
        let mut accumulator = [0.0_f32; 3];
        let mut overlap = 0_u32;
        for sample in self
            .strands
            .iter()
            .filter_map(|strand| strand.sample(uv, time_ms))
        {
            let contribution = sample.contribution();
            for (acc, value) in accumulator.iter_mut().zip(contribution) {
                *acc += value;
            }
            overlap += 1;
        }
        resolve(accumulator, overlap)
    }

    /// Number of strands whose band contains `uv`.
    pub fn coverage(&self, uv: [f32; 2], time_ms: f32) -> u32 {
        self.strands
            .iter()
            .filter(|strand| strand.sample(uv, time_ms).is_some())
            .count() as u32
    }
}

impl Default for StrandField {
    fn default() -> Self {
        Self::new(&StrandParameters::DEFAULT)
    }
}

fn resolve(accumulator: [f32; 3], overlap: u32) -> Rgba {
    let [r, g, b] = if overlap == 0 {
        UNCOVERED_COLOR
    } else {
        accumulator.map(|channel| channel / overlap as f32)
    };
    [r, g, b, 1.0]
}

/// Evaluates the default strand pattern at `uv` and `time_ms`.
pub fn evaluate(uv: [f32; 2], time_ms: f32) -> Rgba {
    StrandField::default().evaluate(uv, time_ms)
}
