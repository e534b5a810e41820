// src/initializers.rs
// Weight initialization schemes. Each factory returns a sampling closure
// so parameter construction can stay generic over the element type.

use rand::rng;
use rand_distr::{Distribution, Normal, Uniform};

/// Xavier/Glorot uniform initialization.
/// Samples from U(-a, a) where a = gain * sqrt(6 / (fan_in + fan_out)).
pub fn xavier_uniform(fan_in: usize, fan_out: usize, gain: f64) -> impl FnMut() -> f64 {
    let a = gain * (6.0 / (fan_in + fan_out) as f64).sqrt();
    let uniform = Uniform::new(-a, a).unwrap();

    move || {
        let mut rng = rng();
        uniform.sample(&mut rng)
    }
}

/// Xavier/Glorot normal initialization.
/// Samples from N(0, std) where std = gain * sqrt(2 / (fan_in + fan_out)).
pub fn xavier_normal(fan_in: usize, fan_out: usize, gain: f64) -> impl FnMut() -> f64 {
    let std = gain * (2.0 / (fan_in + fan_out) as f64).sqrt();
    let normal = Normal::new(0.0, std).unwrap();

    move || {
        let mut rng = rng();
        normal.sample(&mut rng)
    }
}

/// Kaiming/He uniform initialization.
/// Samples from U(-bound, bound) where bound = sqrt(6 / fan_in).
/// For convolutions fan_in is in_channels * kernel_h * kernel_w.
pub fn kaiming_uniform(fan_in: usize) -> impl FnMut() -> f64 {
    let bound = (6.0 / fan_in as f64).sqrt();
    let uniform = Uniform::new(-bound, bound).unwrap();

    move || {
        let mut rng = rng();
        uniform.sample(&mut rng)
    }
}

/// Kaiming/He normal initialization.
/// Samples from N(0, std) where std = sqrt(2 / fan_in).
pub fn kaiming_normal(fan_in: usize) -> impl FnMut() -> f64 {
    let std = (2.0 / fan_in as f64).sqrt();
    let normal = Normal::new(0.0, std).unwrap();

    move || {
        let mut rng = rng();
        normal.sample(&mut rng)
    }
}
