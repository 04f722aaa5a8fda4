//! Synthetic vital-sign generation.
//!
//! Each draw is normal with probability `1 - p` and anomalous with
//! probability `p`. Anomalous draws pick one of four profiles uniformly.
//! All values are uniform integer draws from inclusive ranges.

use std::{fmt, ops::RangeInclusive};

use rand::{rngs::StdRng, Rng, SeedableRng};

/// Default probability that a generated reading is anomalous.
pub const DEFAULT_ANOMALY_PROBABILITY: f64 = 0.15;

/// Inclusive value ranges for one generation profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VitalRanges {
    pub heart_rate: RangeInclusive<i32>,
    pub spo2: RangeInclusive<i32>,
    pub bp_sys: RangeInclusive<i32>,
    pub bp_dia: RangeInclusive<i32>,
}

impl VitalRanges {
    pub const NORMAL: Self = Self {
        heart_rate: 65..=95,
        spo2: 95..=99,
        bp_sys: 110..=130,
        bp_dia: 70..=85,
    };

    pub fn contains(&self, vitals: &GeneratedVitals) -> bool {
        self.heart_rate.contains(&vitals.heart_rate)
            && self.spo2.contains(&vitals.spo2)
            && self.bp_sys.contains(&vitals.bp_sys)
            && self.bp_dia.contains(&vitals.bp_dia)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnomalyKind {
    Tachycardia,
    Bradycardia,
    Hypoxia,
    Hypertension,
}

impl AnomalyKind {
    pub const ALL: [AnomalyKind; 4] = [
        AnomalyKind::Tachycardia,
        AnomalyKind::Bradycardia,
        AnomalyKind::Hypoxia,
        AnomalyKind::Hypertension,
    ];

    pub fn ranges(&self) -> VitalRanges {
        match self {
            Self::Tachycardia => VitalRanges {
                heart_rate: 130..=160,
                spo2: 90..=96,
                bp_sys: 130..=170,
                bp_dia: 80..=100,
            },
            Self::Bradycardia => VitalRanges {
                heart_rate: 35..=50,
                spo2: 92..=98,
                bp_sys: 100..=120,
                bp_dia: 60..=80,
            },
            Self::Hypoxia => VitalRanges {
                heart_rate: 90..=130,
                spo2: 80..=91,
                bp_sys: 110..=140,
                bp_dia: 70..=90,
            },
            Self::Hypertension => VitalRanges {
                heart_rate: 80..=110,
                spo2: 94..=99,
                bp_sys: 165..=190,
                bp_dia: 90..=110,
            },
        }
    }
}

impl fmt::Display for AnomalyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Tachycardia => "tachycardia",
            Self::Bradycardia => "bradycardia",
            Self::Hypoxia => "hypoxia",
            Self::Hypertension => "hypertension",
        };
        f.write_str(name)
    }
}

/// One generated reading, before it is stamped and sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratedVitals {
    /// `None` for a normal-profile draw.
    pub anomaly: Option<AnomalyKind>,
    pub heart_rate: i32,
    pub spo2: i32,
    pub bp_sys: i32,
    pub bp_dia: i32,
}

/// Random source for the producer: vitals, per-patient jitter, and cycle
/// pauses all draw from the same RNG so a seeded run is reproducible.
#[derive(Debug)]
pub struct VitalsGenerator {
    rng: StdRng,
    anomaly_probability: f64,
}

impl VitalsGenerator {
    /// Create a generator. `seed = None` seeds from OS entropy.
    ///
    /// `anomaly_probability` is clamped to `[0, 1]`; NaN or infinite values
    /// fall back to [`DEFAULT_ANOMALY_PROBABILITY`].
    pub fn new(anomaly_probability: f64, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        let anomaly_probability = if anomaly_probability.is_finite() {
            anomaly_probability.clamp(0.0, 1.0)
        } else {
            DEFAULT_ANOMALY_PROBABILITY
        };
        Self { rng, anomaly_probability }
    }

    pub fn anomaly_probability(&self) -> f64 {
        self.anomaly_probability
    }

    pub fn generate(&mut self) -> GeneratedVitals {
        if self.rng.gen_bool(self.anomaly_probability) {
            let kind = AnomalyKind::ALL[self.rng.gen_range(0..AnomalyKind::ALL.len())];
            self.draw(&kind.ranges(), Some(kind))
        } else {
            self.draw(&VitalRanges::NORMAL, None)
        }
    }

    /// Uniform integer draw from `min..=max`. Returns `min` if the range is empty.
    pub fn uniform_i64(&mut self, min: i64, max: i64) -> i64 {
        if min >= max {
            return min;
        }
        self.rng.gen_range(min..=max)
    }

    fn draw(&mut self, ranges: &VitalRanges, anomaly: Option<AnomalyKind>) -> GeneratedVitals {
        GeneratedVitals {
            anomaly,
            heart_rate: self.rng.gen_range(ranges.heart_rate.clone()),
            spo2: self.rng.gen_range(ranges.spo2.clone()),
            bp_sys: self.rng.gen_range(ranges.bp_sys.clone()),
            bp_dia: self.rng.gen_range(ranges.bp_dia.clone()),
        }
    }
}
