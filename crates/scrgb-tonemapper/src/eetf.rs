use crate::color::{pq_eotf, pq_inverse_eotf};

/// BT.2390 EETF, compresses luminance from a source peak into a lower target peak.
///
/// Operates in PQ space with a zero black level. Luminance below the knee is untouched and the
/// source peak lands exactly on the target peak.
///
/// The Hermite spline is only monotonic up to the BT.2390 knee. When paper white lies above
/// that knee, a rational shoulder starting at paper white with unit slope is used instead.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bt2390 {
    source_peak_pq: f32,
    target_peak: f32,
    knee: f32,
    compress: bool,
    shoulder: bool,
}

impl Bt2390 {
    pub fn new(source_peak_nits: f32, target_peak_nits: f32) -> Self {
        let source_peak_pq = pq_inverse_eotf(source_peak_nits);
        let target_peak = pq_inverse_eotf(target_peak_nits) / source_peak_pq;

        Self {
            source_peak_pq,
            target_peak,
            knee: (1.5 * target_peak - 0.5).max(0.0),
            compress: source_peak_nits > target_peak_nits,
            shoulder: false,
        }
    }

    /// Keep luminance up to `nits` untouched by starting the roll-off no lower than it.
    pub fn with_paper_white(mut self, nits: f32) -> Self {
        let white = (pq_inverse_eotf(nits) / self.source_peak_pq).min(1.0);

        if white > self.knee && white < self.target_peak {
            self.knee = white;
            self.shoulder = true;
        }

        self
    }

    /// Start of the roll-off in normalised PQ.
    pub fn knee(&self) -> f32 {
        self.knee
    }

    /// Maps luminance in nits.
    pub fn apply(&self, nits: f32) -> f32 {
        if !self.compress || nits <= 0.0 {
            return nits;
        }

        let e1 = (pq_inverse_eotf(nits) / self.source_peak_pq).min(1.0);
        if e1 <= self.knee {
            return nits;
        }

        let e2 = if self.shoulder {
            self.rational(e1)
        } else {
            self.hermite(e1)
        };
        pq_eotf(e2 * self.source_peak_pq)
    }

    /// `u·k / (1 + (k - 1)·u)` over the roll-off, slope 1 at the knee and `target_peak` at 1.
    fn rational(&self, e: f32) -> f32 {
        let span = 1.0 - self.knee;
        let range = self.target_peak - self.knee;
        let k = span / range;
        let u = (e - self.knee) / span;

        self.knee + range * (u * k / (1.0 + (k - 1.0) * u))
    }

    fn hermite(&self, e: f32) -> f32 {
        let span = 1.0 - self.knee;
        let t = (e - self.knee) / span;
        let t2 = t * t;
        let t3 = t2 * t;

        (2.0 * t3 - 3.0 * t2 + 1.0) * self.knee
            + (t3 - 2.0 * t2 + t) * span
            + (-2.0 * t3 + 3.0 * t2) * self.target_peak
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peak_maps_to_target() {
        let eetf = Bt2390::new(1000.0, 264.0);

        assert!((eetf.apply(1000.0) - 264.0).abs() < 0.5);
        assert!((eetf.apply(4000.0) - 264.0).abs() < 0.5);
    }

    #[test]
    fn shadows_are_untouched() {
        let eetf = Bt2390::new(1000.0, 264.0);

        assert_eq!(eetf.apply(5.0), 5.0);
        assert_eq!(eetf.apply(0.0), 0.0);
    }

    #[test]
    fn no_compression_below_target() {
        let eetf = Bt2390::new(200.0, 264.0);

        assert_eq!(eetf.apply(200.0), 200.0);
        assert_eq!(eetf.apply(500.0), 500.0);
    }

    #[test]
    fn paper_white_is_untouched() {
        let eetf = Bt2390::new(1000.0, 264.0).with_paper_white(240.0);

        assert!(eetf.knee() > Bt2390::new(1000.0, 264.0).knee());
        assert_eq!(eetf.apply(240.0), 240.0);
        assert!((eetf.apply(1000.0) - 264.0).abs() < 0.5);
    }

    #[test]
    fn low_paper_white_keeps_hermite_knee() {
        let eetf = Bt2390::new(1000.0, 264.0);

        assert_eq!(eetf.with_paper_white(20.0), eetf);
    }

    #[test]
    fn shoulder_is_monotonic() {
        let eetf = Bt2390::new(203.0, 88.0).with_paper_white(80.0);

        let mut previous = 0.0;
        for step in 0..=400 {
            let mapped = eetf.apply(step as f32);
            assert!(mapped >= previous - 1e-3, "{mapped} < {previous}");
            assert!(mapped <= 88.5, "{mapped}");
            previous = mapped;
        }
    }

    #[test]
    fn monotonic() {
        let eetf = Bt2390::new(1500.0, 220.0);

        let mut previous = 0.0;
        for step in 0..=300 {
            let mapped = eetf.apply(step as f32 * 5.0);
            assert!(mapped >= previous - 1e-3, "{mapped} < {previous}");
            previous = mapped;
        }
    }
}
