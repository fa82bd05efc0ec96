//! Natural cubic spline interpolation.
//!
//! Knots must have strictly increasing x. Second derivatives are zero at both
//! ends, and outside the knot range the curve continues as a straight line with
//! the end slope, which is the natural extension of such a spline.

/// A natural cubic spline through a set of knots.
#[derive(Debug, Clone, Default)]
pub struct NaturalSpline {
    xs: Vec<f64>,
    ys: Vec<f64>,
    /// Second derivative at each knot
    m: Vec<f64>,
}

impl NaturalSpline {
    /// Create an empty spline. Evaluates to 0 everywhere until knots are set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a spline from (x, y) knots.
    pub fn from_points(points: &[(f64, f64)]) -> Self {
        let mut spline = Self::new();
        spline.set_points(points);
        spline
    }

    /// Replace the knots and refit, keeping allocated buffers.
    pub fn set_points(&mut self, points: &[(f64, f64)]) {
        self.xs.clear();
        self.ys.clear();
        self.xs.extend(points.iter().map(|p| p.0));
        self.ys.extend(points.iter().map(|p| p.1));
        self.fit();
    }

    /// Solve the tridiagonal system for the second derivatives (Thomas algorithm).
    fn fit(&mut self) {
        let n = self.xs.len();
        self.m.clear();
        self.m.resize(n, 0.0);
        if n < 3 {
            return;
        }

        // Forward sweep over the interior knots 1..n-1
        let mut c_prime = vec![0.0; n];
        let mut d_prime = vec![0.0; n];
        for i in 1..n - 1 {
            let h0 = self.xs[i] - self.xs[i - 1];
            let h1 = self.xs[i + 1] - self.xs[i];
            let a = h0;
            let b = 2.0 * (h0 + h1);
            let c = h1;
            let d = 6.0
                * ((self.ys[i + 1] - self.ys[i]) / h1 - (self.ys[i] - self.ys[i - 1]) / h0);

            let denom = b - a * c_prime[i - 1];
            c_prime[i] = c / denom;
            d_prime[i] = (d - a * d_prime[i - 1]) / denom;
        }

        // Back substitution; m[0] and m[n-1] stay zero
        for i in (1..n - 1).rev() {
            self.m[i] = d_prime[i] - c_prime[i] * self.m[i + 1];
        }
    }

    /// Evaluate the spline at `x`.
    pub fn value(&self, x: f64) -> f64 {
        let n = self.xs.len();
        match n {
            0 => return 0.0,
            1 => return self.ys[0],
            _ => {}
        }

        if x <= self.xs[0] {
            return self.ys[0] + self.start_slope() * (x - self.xs[0]);
        }
        if x >= self.xs[n - 1] {
            return self.ys[n - 1] + self.end_slope() * (x - self.xs[n - 1]);
        }

        // First knot strictly greater than x, so segment is [seg, seg+1]
        let seg = self.xs.partition_point(|&k| k <= x) - 1;
        if self.xs[seg] == x {
            return self.ys[seg];
        }
        self.segment_value(seg, x)
    }

    /// Evaluate at every integer from 0 to `last` inclusive, appending to `out`.
    ///
    /// Walks the segments forward instead of searching for each point.
    pub fn sample_integers_into(&self, last: u32, out: &mut Vec<f64>) {
        out.reserve(last as usize + 1);
        let n = self.xs.len();
        if n < 2 {
            let v = self.ys.first().copied().unwrap_or(0.0);
            out.extend(std::iter::repeat(v).take(last as usize + 1));
            return;
        }

        let mut seg = 0;
        for t in 0..=last {
            let x = t as f64;
            if x <= self.xs[0] || x >= self.xs[n - 1] {
                out.push(self.value(x));
                continue;
            }
            while self.xs[seg + 1] <= x {
                seg += 1;
            }
            // Knots reproduce their input exactly
            if self.xs[seg] == x {
                out.push(self.ys[seg]);
            } else {
                out.push(self.segment_value(seg, x));
            }
        }
    }

    fn segment_value(&self, i: usize, x: f64) -> f64 {
        let h = self.xs[i + 1] - self.xs[i];
        let a = self.xs[i + 1] - x;
        let b = x - self.xs[i];
        self.m[i] * a * a * a / (6.0 * h)
            + self.m[i + 1] * b * b * b / (6.0 * h)
            + (self.ys[i] / h - self.m[i] * h / 6.0) * a
            + (self.ys[i + 1] / h - self.m[i + 1] * h / 6.0) * b
    }

    fn start_slope(&self) -> f64 {
        let h = self.xs[1] - self.xs[0];
        (self.ys[1] - self.ys[0]) / h - h * self.m[1] / 6.0
    }

    fn end_slope(&self) -> f64 {
        let n = self.xs.len();
        let h = self.xs[n - 1] - self.xs[n - 2];
        (self.ys[n - 1] - self.ys[n - 2]) / h + h * self.m[n - 2] / 6.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passes_through_knots() {
        let points = vec![(0.0, 100.0), (1.0, 250.0), (3.0, 180.0), (4.0, 0.0), (7.0, 320.0)];
        let spline = NaturalSpline::from_points(&points);
        for &(x, y) in &points {
            assert!((spline.value(x) - y).abs() < 1e-9, "x={} y={}", x, y);
        }
    }

    #[test]
    fn test_linear_data_stays_linear() {
        let points: Vec<(f64, f64)> = (0..6).map(|i| (i as f64 * 2.0, 10.0 + i as f64 * 6.0)).collect();
        let spline = NaturalSpline::from_points(&points);
        // y = 10 + 3x
        assert!((spline.value(3.0) - 19.0).abs() < 1e-9);
        assert!((spline.value(7.5) - 32.5).abs() < 1e-9);
    }

    #[test]
    fn test_two_points_is_a_line() {
        let spline = NaturalSpline::from_points(&[(0.0, 0.0), (10.0, 100.0)]);
        assert!((spline.value(5.0) - 50.0).abs() < 1e-9);
        assert!((spline.value(12.0) - 120.0).abs() < 1e-9);
    }

    #[test]
    fn test_single_point_and_empty() {
        assert_eq!(NaturalSpline::new().value(3.0), 0.0);
        let spline = NaturalSpline::from_points(&[(5.0, 42.0)]);
        assert_eq!(spline.value(0.0), 42.0);

        let mut out = Vec::new();
        spline.sample_integers_into(5, &mut out);
        assert_eq!(out, vec![42.0; 6]);
    }

    #[test]
    fn test_sampling_matches_value() {
        let points = vec![(0.0, 50.0), (2.0, 300.0), (5.0, 120.0), (9.0, 400.0)];
        let spline = NaturalSpline::from_points(&points);
        let mut out = Vec::new();
        spline.sample_integers_into(9, &mut out);
        assert_eq!(out.len(), 10);
        for (t, v) in out.iter().enumerate() {
            assert!((v - spline.value(t as f64)).abs() < 1e-9);
        }
    }
}
