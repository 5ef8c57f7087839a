//! Distribution helpers used by the encoders: Normal and Student's t
//! quantiles, interval construction, binning and kernel density.

use std::f64::consts::{PI, SQRT_2};

/// Normal density at `x`.
pub fn norm_pdf(x: f64, loc: f64, scale: f64) -> f64 {
    let z = (x - loc) / scale;
    (-0.5 * z * z).exp() / (scale * (2.0 * PI).sqrt())
}

/// Complementary error function (Chebyshev fit, relative error below 1.2e-7).
fn erfc(x: f64) -> f64 {
    let z = x.abs();
    let t = 1.0 / (1.0 + 0.5 * z);
    let ans = t
        * (-z * z - 1.265_512_23
            + t * (1.000_023_68
                + t * (0.374_091_96
                    + t * (0.096_784_18
                        + t * (-0.186_288_06
                            + t * (0.278_868_07
                                + t * (-1.135_203_98
                                    + t * (1.488_515_87
                                        + t * (-0.822_152_23 + t * 0.170_872_77)))))))))
            .exp();
    if x >= 0.0 { ans } else { 2.0 - ans }
}

/// Standard Normal cumulative distribution.
pub fn norm_cdf(x: f64) -> f64 {
    0.5 * erfc(-x / SQRT_2)
}

/// Standard Normal quantile (Acklam's rational approximation).
pub fn norm_ppf(p: f64) -> f64 {
    const A: [f64; 6] = [
        -3.969_683_028_665_376e1,
        2.209_460_984_245_205e2,
        -2.759_285_104_469_687e2,
        1.383_577_518_672_69e2,
        -3.066_479_806_614_716e1,
        2.506_628_277_459_239,
    ];
    const B: [f64; 5] = [
        -5.447_609_879_822_406e1,
        1.615_858_368_580_409e2,
        -1.556_989_798_598_866e2,
        6.680_131_188_771_972e1,
        -1.328_068_155_288_572e1,
    ];
    const C: [f64; 6] = [
        -7.784_894_002_430_293e-3,
        -3.223_964_580_411_365e-1,
        -2.400_758_277_161_838,
        -2.549_732_539_343_734,
        4.374_664_141_464_968,
        2.938_163_982_698_783,
    ];
    const D: [f64; 4] = [
        7.784_695_709_041_462e-3,
        3.224_671_290_700_398e-1,
        2.445_134_137_142_996,
        3.754_408_661_907_416,
    ];
    const P_LOW: f64 = 0.02425;

    if p <= 0.0 {
        return f64::NEG_INFINITY;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }
    let tail = |q: f64| {
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    };
    if p < P_LOW {
        tail((-2.0 * p.ln()).sqrt())
    } else if p <= 1.0 - P_LOW {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        -tail((-2.0 * (1.0 - p).ln()).sqrt())
    }
}

/// Central Normal interval holding `confidence` of the mass around `loc`.
pub fn normal_interval(confidence: f64, loc: f64, scale: f64) -> (f64, f64) {
    let z = norm_ppf(0.5 + confidence / 2.0);
    (loc - z * scale, loc + z * scale)
}

/// Two-tailed power (percent) to detect `effect` with standard error `se` at the 5% level.
pub fn two_tailed_power(effect: f64, se: f64) -> f64 {
    let z = norm_ppf(0.975);
    100.0 * (1.0 - norm_cdf(z - effect / se) + norm_cdf(-z - effect / se))
}

fn ln_gamma(x: f64) -> f64 {
    const G: [f64; 9] = [
        0.999_999_999_999_809_9,
        676.520_368_121_885_1,
        -1_259.139_216_722_402_8,
        771.323_428_777_653_1,
        -176.615_029_162_140_6,
        12.507_343_278_686_905,
        -0.138_571_095_265_720_12,
        9.984_369_578_019_572e-6,
        1.505_632_735_149_311_6e-7,
    ];
    if x < 0.5 {
        return (PI / (PI * x).sin()).ln() - ln_gamma(1.0 - x);
    }
    let x = x - 1.0;
    let mut a = G[0];
    for (i, g) in G.iter().enumerate().skip(1) {
        a += g / (x + i as f64);
    }
    let t = x + 7.5;
    0.5 * (2.0 * PI).ln() + (x + 0.5) * t.ln() - t + a.ln()
}

/// Continued fraction for the incomplete beta function (modified Lentz).
fn beta_cf(a: f64, b: f64, x: f64) -> f64 {
    const TINY: f64 = 1e-300;
    let (qab, qap, qam) = (a + b, a + 1.0, a - 1.0);
    let mut c = 1.0;
    let mut d = 1.0 - qab * x / qap;
    if d.abs() < TINY {
        d = TINY;
    }
    d = 1.0 / d;
    let mut h = d;
    for m in 1..300 {
        let m = m as f64;
        let m2 = 2.0 * m;
        let aa = m * (b - m) * x / ((qam + m2) * (a + m2));
        d = 1.0 + aa * d;
        if d.abs() < TINY {
            d = TINY;
        }
        c = 1.0 + aa / c;
        if c.abs() < TINY {
            c = TINY;
        }
        d = 1.0 / d;
        h *= d * c;
        let aa = -(a + m) * (qab + m) * x / ((a + m2) * (qap + m2));
        d = 1.0 + aa * d;
        if d.abs() < TINY {
            d = TINY;
        }
        c = 1.0 + aa / c;
        if c.abs() < TINY {
            c = TINY;
        }
        d = 1.0 / d;
        let del = d * c;
        h *= del;
        if (del - 1.0).abs() < 1e-14 {
            break;
        }
    }
    h
}

fn reg_inc_beta(a: f64, b: f64, x: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }
    let bt = (ln_gamma(a + b) - ln_gamma(a) - ln_gamma(b) + a * x.ln() + b * (1.0 - x).ln()).exp();
    if x < (a + 1.0) / (a + b + 2.0) {
        bt * beta_cf(a, b, x) / a
    } else {
        1.0 - bt * beta_cf(b, a, 1.0 - x) / b
    }
}

/// Student's t cumulative distribution with `df` degrees of freedom.
pub fn t_cdf(t: f64, df: f64) -> f64 {
    let x = df / (df + t * t);
    let tail = 0.5 * reg_inc_beta(df / 2.0, 0.5, x);
    if t > 0.0 { 1.0 - tail } else { tail }
}

/// Student's t quantile. Closed forms for one and two degrees of freedom,
/// bisection on [`t_cdf`] otherwise.
pub fn t_ppf(p: f64, df: f64) -> f64 {
    if p <= 0.0 {
        return f64::NEG_INFINITY;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }
    if df == 1.0 {
        return (PI * (p - 0.5)).tan();
    }
    if df == 2.0 {
        return (2.0 * p - 1.0) / (2.0 * p * (1.0 - p)).sqrt();
    }
    let (mut lo, mut hi) = (-1.0_f64, 1.0_f64);
    while t_cdf(lo, df) > p && lo > -1e12 {
        lo *= 2.0;
    }
    while t_cdf(hi, df) < p && hi < 1e12 {
        hi *= 2.0;
    }
    for _ in 0..200 {
        let mid = 0.5 * (lo + hi);
        if t_cdf(mid, df) < p {
            lo = mid;
        } else {
            hi = mid;
        }
        if hi - lo < 1e-12 {
            break;
        }
    }
    0.5 * (lo + hi)
}

/// `n` evenly spaced values from `start` to `end` inclusive.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { end } else { start + step * i as f64 })
                .collect()
        }
    }
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Variance with `n - 1` in the denominator.
pub fn sample_variance(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    Some(values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / (values.len() - 1) as f64)
}

/// Equal-width histogram over the data range. Returns `(counts, edges)`;
/// the last bin is closed on the right. A zero-width range is widened by 0.5
/// on each side.
pub fn histogram(values: &[f64], weights: Option<&[f64]>, bins: usize) -> (Vec<f64>, Vec<f64>) {
    let bins = bins.max(1);
    let mut lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let mut hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !lo.is_finite() || !hi.is_finite() {
        lo = 0.0;
        hi = 1.0;
    }
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }
    let edges = linspace(lo, hi, bins + 1);
    let mut counts = vec![0.0; bins];
    let width = hi - lo;
    for (i, v) in values.iter().enumerate() {
        let idx = if *v >= hi {
            bins - 1
        } else {
            (((v - lo) / width * bins as f64).floor() as usize).min(bins - 1)
        };
        counts[idx] += weights.and_then(|w| w.get(i)).copied().unwrap_or(1.0);
    }
    (counts, edges)
}

/// Gaussian kernel density with Scott's bandwidth rule.
#[derive(Clone, Debug)]
pub struct GaussianKde {
    samples: Vec<f64>,
    bandwidth: f64,
}

impl GaussianKde {
    /// `None` for fewer than two samples or zero spread.
    pub fn new(samples: &[f64]) -> Option<Self> {
        let sd = sample_variance(samples)?.sqrt();
        if !(sd > 0.0) {
            return None;
        }
        let factor = (samples.len() as f64).powf(-0.2);
        Some(Self {
            samples: samples.to_vec(),
            bandwidth: sd * factor,
        })
    }

    pub fn bandwidth(&self) -> f64 {
        self.bandwidth
    }

    pub fn density(&self, x: f64) -> f64 {
        let n = self.samples.len() as f64;
        self.samples
            .iter()
            .map(|s| norm_pdf(x, *s, self.bandwidth))
            .sum::<f64>()
            / n
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() < tol
    }

    #[test]
    fn normal_quantiles_match_tables() {
        assert!(close(norm_ppf(0.975), 1.959_964, 1e-5));
        assert!(close(norm_ppf(0.995), 2.575_829, 1e-5));
        assert!(close(norm_ppf(0.5), 0.0, 1e-12));
        assert!(close(norm_ppf(0.01), -2.326_348, 1e-5));
    }

    #[test]
    fn normal_cdf_inverts_quantile() {
        for p in [0.01, 0.2, 0.5, 0.8, 0.99] {
            assert!(close(norm_cdf(norm_ppf(p)), p, 1e-6));
        }
    }

    #[test]
    fn t_quantiles_match_tables() {
        assert!(close(t_ppf(0.975, 1.0), 12.706_205, 1e-4));
        assert!(close(t_ppf(0.975, 2.0), 4.302_653, 1e-5));
        assert!(close(t_ppf(0.975, 10.0), 2.228_139, 1e-4));
        assert!(close(t_ppf(0.025, 5.0), -2.570_582, 1e-4));
    }

    #[test]
    fn interval_widths_nest() {
        let (a, b) = normal_interval(0.99, 0.0, 1.0);
        let (c, d) = normal_interval(0.95, 0.0, 1.0);
        assert!(a < c && d < b);
        assert!(close(b + a, 0.0, 1e-12));
    }

    #[test]
    fn power_is_a_percentage() {
        let p0 = two_tailed_power(0.0, 1.0);
        assert!(close(p0, 5.0, 1e-3));
        let p = two_tailed_power(1.0, 0.1);
        assert!(p > 99.0 && p <= 100.0);
    }

    #[test]
    fn histogram_closes_last_bin() {
        let (counts, edges) = histogram(&[0.0, 0.5, 1.0, 1.0], None, 2);
        assert_eq!(edges, vec![0.0, 0.5, 1.0]);
        assert_eq!(counts, vec![1.0, 3.0]);
        let (counts, edges) = histogram(&[2.0, 2.0], Some(&[1.5, 2.5]), 1);
        assert_eq!(edges, vec![1.5, 2.5]);
        assert_eq!(counts, vec![4.0]);
    }

    #[test]
    fn kde_integrates_to_about_one() {
        let kde = GaussianKde::new(&[0.0, 1.0, 2.0, 3.0, 4.0]).unwrap();
        let xs = linspace(-10.0, 14.0, 2001);
        let dx = xs[1] - xs[0];
        let area: f64 = xs.iter().map(|x| kde.density(*x) * dx).sum();
        assert!(close(area, 1.0, 1e-3));
        assert!(GaussianKde::new(&[1.0, 1.0]).is_none());
    }
}
