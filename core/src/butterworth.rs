//! Digital Butterworth low-pass filter design.
//!
//! Ported from the analog-prototype → frequency-scale → bilinear-transform
//! pipeline used by the reference breathing-rate monitor. Only low-pass
//! design is needed here; the band-pass effect used elsewhere in this crate
//! comes from taking the difference of two low-pass filters at different
//! cutoffs, not from a single band-pass design.

use crate::error::MagnifierError;
use num_traits::Zero;
use std::ops::{Add, Mul, Sub};

/// A complex number with `f64` components, used only inside filter design.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Complex {
    re: f64,
    im: f64,
}

impl Complex {
    const fn new(re: f64, im: f64) -> Self {
        Complex { re, im }
    }

}

impl Add for Complex {
    type Output = Complex;
    fn add(self, rhs: Complex) -> Complex {
        Complex::new(self.re + rhs.re, self.im + rhs.im)
    }
}

impl Sub for Complex {
    type Output = Complex;
    fn sub(self, rhs: Complex) -> Complex {
        Complex::new(self.re - rhs.re, self.im - rhs.im)
    }
}

impl Mul for Complex {
    type Output = Complex;
    fn mul(self, rhs: Complex) -> Complex {
        Complex::new(
            self.re * rhs.re - self.im * rhs.im,
            self.re * rhs.im + self.im * rhs.re,
        )
    }
}

impl Zero for Complex {
    fn zero() -> Self {
        Complex::new(0.0, 0.0)
    }
    fn is_zero(&self) -> bool {
        self.re == 0.0 && self.im == 0.0
    }
}

/// Design a digital Butterworth low-pass of order `order` with normalized
/// cutoff `wn` (cutoff frequency / Nyquist frequency, in `(0, 1)`).
///
/// Returns `(a, b)` such that `H(z) = (b[0] + b[1] z^-1 + ...) / (a[0] + a[1]
/// z^-1 + ...)`, with `a[0] == 1`.
pub fn butterworth(order: usize, wn: f64) -> Result<(Vec<f64>, Vec<f64>), MagnifierError> {
    if order < 1 || !(0.0..1.0).contains(&wn) || wn <= 0.0 {
        return Err(MagnifierError::InvalidFilter {
            order,
            cutoff: wn,
        });
    }

    let fs = 2.0;
    let w0 = 2.0 * fs * (std::f64::consts::PI * wn / fs).tan();

    let (zeros, poles, gain) = prototype_analog_butterworth(order);
    let (b, a) = zeros_poles_to_transfer_coefficients(&zeros, &poles, gain);
    let (b, a) = to_lowpass(&b, &a, w0);
    let (b, a) = bilinear_transform(&b, &a, fs);
    let (b, a) = normalize(&b, &a);

    Ok((a, b))
}

/// Analog-prototype Butterworth poles (unit cutoff), no zeros, unit gain.
fn prototype_analog_butterworth(order: usize) -> (Vec<Complex>, Vec<Complex>, f64) {
    let n = order as f64;
    let j = Complex::new(0.0, 1.0);
    let mut poles = Vec::with_capacity(order);
    for k in 1..=order {
        let theta = (2 * k - 1) as f64 / (2.0 * n) * std::f64::consts::PI;
        let pole = Complex::new(theta.cos(), theta.sin()) * j;
        poles.push(pole);
    }
    (Vec::new(), poles, 1.0)
}

/// Expand zero/pole form into real polynomial coefficients `(b, a)`,
/// collapsing conjugate pairs to keep the result real.
fn zeros_poles_to_transfer_coefficients(
    zeros: &[Complex],
    poles: &[Complex],
    gain: f64,
) -> (Vec<f64>, Vec<f64>) {
    let b = polynomial_coefficients(zeros);
    let a = polynomial_coefficients(poles);
    let b: Vec<f64> = b.iter().map(|c| c.re * gain).collect();
    let a: Vec<f64> = a.iter().map(|c| c.re).collect();
    (b, a)
}

/// Coefficients of `prod(x - r)` for `r` in `roots`, highest degree first,
/// sorted so conjugate pairs sit adjacent (keeps accumulation error small
/// and mirrors the reference implementation's ordering).
fn polynomial_coefficients(roots: &[Complex]) -> Vec<Complex> {
    let mut sorted = roots.to_vec();
    sort_complex(&mut sorted);

    let mut coeffs = vec![Complex::new(1.0, 0.0)];
    for &r in &sorted {
        let mut next = vec![Complex::new(0.0, 0.0); coeffs.len() + 1];
        for (i, &c) in coeffs.iter().enumerate() {
            next[i] = next[i] + c;
            next[i + 1] = next[i + 1] - c * r;
        }
        coeffs = next;
    }
    coeffs
}

fn sort_complex(roots: &mut [Complex]) {
    roots.sort_by(|a, b| {
        a.re.partial_cmp(&b.re)
            .unwrap()
            .then(a.im.partial_cmp(&b.im).unwrap())
    });
}

/// Scale an analog low-pass prototype (unit cutoff) to cutoff `w0` by
/// substituting `s -> s/w0`. Coefficients are stored highest-power-first, so
/// the term at index `i` carries power `degree - i` and scales by
/// `w0^-(degree - i)`.
fn to_lowpass(b: &[f64], a: &[f64], w0: f64) -> (Vec<f64>, Vec<f64>) {
    let scale = |coeffs: &[f64]| -> Vec<f64> {
        let degree = coeffs.len() - 1;
        coeffs
            .iter()
            .enumerate()
            .map(|(i, &c)| c / w0.powi((degree - i) as i32))
            .collect()
    };
    (scale(b), scale(a))
}

/// Binomial coefficient `n choose k`.
fn choose(n: usize, k: usize) -> f64 {
    if k > n {
        return 0.0;
    }
    let k = k.min(n - k);
    let mut result = 1.0f64;
    for i in 0..k {
        result = result * (n - i) as f64 / (i + 1) as f64;
    }
    result
}

/// Closed-form bilinear transform `s = 2*fs * (z-1)/(z+1)` applied to a
/// rational polynomial given in ascending powers of `s`.
fn bilinear_transform(b: &[f64], a: &[f64], fs: f64) -> (Vec<f64>, Vec<f64>) {
    let two_fs = 2.0 * fs;
    let degree = a.len().max(b.len()) - 1;
    let expand = |coeffs: &[f64]| -> Vec<f64> {
        let mut out = vec![0f64; degree + 1];
        let n = coeffs.len() - 1;
        for (idx, &c) in coeffs.iter().enumerate() {
            // coeffs are ascending-degree-from-the-end (coeffs[0] is the
            // highest power term when read as produced by to_lowpass, which
            // itself returns highest power first) -- convert to the power
            // this term actually represents.
            let power = n - idx;
            // (2*fs*(z-1))^power * (z+1)^(degree-power), both expanded via
            // binomial theorem, combined and accumulated into `out`
            // indexed by resulting power of z (descending).
            for p in 0..=power {
                let term_a = choose(power, p) * two_fs.powi(power as i32) * (-1.0f64).powi((power - p) as i32);
                for q in 0..=(degree - power) {
                    let term_b = choose(degree - power, q);
                    let z_power = p + q;
                    out[degree - z_power] += c * term_a * term_b;
                }
            }
        }
        out
    };
    (expand(b), expand(a))
}

/// Strip a leading-zero coefficient from `a` (can arise from the bilinear
/// expansion when the numerator/denominator degrees differ) and scale both
/// polynomials so `a[0] == 1`.
fn normalize(b: &[f64], a: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let mut a = a.to_vec();
    let mut b = b.to_vec();
    while a.len() > 1 && a[0].abs() < 1e-12 {
        a.remove(0);
    }
    let lead = a[0];
    for c in a.iter_mut() {
        *c /= lead;
    }
    for c in b.iter_mut() {
        *c /= lead;
    }
    (b, a)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_one_quarter_cutoff_matches_closed_form() {
        // For N=1 the whole pipeline collapses to a textbook result:
        // H(s) = w0/(s+w0), bilinear-transformed with fs=2 gives
        // a1 = (w0-2*fs)/(w0+2*fs), b0 = b1 = w0/(w0+2*fs).
        let wn = 0.25;
        let fs = 2.0;
        let w0 = 2.0 * fs * (std::f64::consts::PI * wn / fs).tan();
        let expected_a1 = (w0 - 2.0 * fs) / (w0 + 2.0 * fs);
        let expected_b0 = w0 / (w0 + 2.0 * fs);

        let (a, b) = butterworth(1, wn).unwrap();
        assert_eq!(a.len(), 2);
        assert_eq!(b.len(), 2);
        assert!((a[0] - 1.0).abs() < 1e-9);
        assert!((a[1] - expected_a1).abs() < 1e-9);
        assert!((b[0] - expected_b0).abs() < 1e-9);
        assert!((b[1] - expected_b0).abs() < 1e-9);
    }

    #[test]
    fn leading_a_coefficient_is_normalized() {
        let (a, _) = butterworth(1, 0.1).unwrap();
        assert!((a[0] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn rejects_out_of_domain_cutoff() {
        assert!(butterworth(1, 0.0).is_err());
        assert!(butterworth(1, 1.0).is_err());
        assert!(butterworth(1, -0.1).is_err());
        assert!(butterworth(0, 0.25).is_err());
    }
}
