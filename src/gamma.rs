//! Coverage transfer functions applied to anti-aliased cover values.

/// Maps a normalized coverage value through a transfer curve. The
/// rasterizer samples the function into a 256-entry table.
pub trait GammaFn {
    fn apply(&self, x: f64) -> f64;
}

/// Identity transfer.
#[derive(Debug, Clone, Copy, Default)]
pub struct GammaNone;

impl GammaFn for GammaNone {
    fn apply(&self, x: f64) -> f64 {
        x
    }
}

/// Power-curve transfer. The conventional display exponent is 2.2.
#[derive(Debug, Clone, Copy)]
pub struct GammaPower {
    gamma: f64,
}

impl GammaPower {
    pub fn new(gamma: f64) -> Self {
        Self {
            gamma: gamma.max(1e-6),
        }
    }
}

impl Default for GammaPower {
    fn default() -> Self {
        Self::new(2.2)
    }
}

impl GammaFn for GammaPower {
    fn apply(&self, x: f64) -> f64 {
        if self.gamma == 1.0 {
            x
        } else {
            x.powf(self.gamma)
        }
    }
}

/// Hard threshold: coverage snaps to 0 or 1. With the threshold at 0.5
/// this turns anti-aliasing off.
#[derive(Debug, Clone, Copy)]
pub struct GammaThreshold {
    threshold: f64,
}

impl GammaThreshold {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }
}

impl Default for GammaThreshold {
    fn default() -> Self {
        Self::new(0.5)
    }
}

impl GammaFn for GammaThreshold {
    fn apply(&self, x: f64) -> f64 {
        if x < self.threshold {
            0.0
        } else {
            1.0
        }
    }
}

/// Linear ramp between two coverage values.
#[derive(Debug, Clone, Copy)]
pub struct GammaLinear {
    start: f64,
    end: f64,
}

impl GammaLinear {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }
}

impl GammaFn for GammaLinear {
    fn apply(&self, x: f64) -> f64 {
        if x < self.start {
            0.0
        } else if x > self.end {
            1.0
        } else if self.end > self.start {
            (x - self.start) / (self.end - self.start)
        } else {
            0.0
        }
    }
}
