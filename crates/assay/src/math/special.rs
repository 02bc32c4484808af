//! Special functions behind every p-value in the crate.
//!
//! All functions are total: outside their mathematical domain they return
//! `NaN` (or `0.0` for the incomplete beta, matching its continued-fraction
//! contract) instead of panicking, so downstream results stay displayable.

/// Maximum continued-fraction / series iterations.
const MAX_ITERATIONS: usize = 100;

/// Convergence tolerance for continued fractions and series.
const EPSILON: f64 = 3e-7;

/// Floor that keeps Lentz's method away from division by zero.
const FP_MIN: f64 = 1e-30;

/// Lanczos coefficients (g = 5, n = 6).
const LANCZOS: [f64; 6] = [
    76.18009172947146,
    -86.50532032941677,
    24.01409824083091,
    -1.231739572450155,
    0.1208650973866179e-2,
    -0.5395239384953e-5,
];

/// Natural log of the gamma function for `z > 0` (Lanczos approximation).
pub fn log_gamma(z: f64) -> f64 {
    if !(z > 0.0) || !z.is_finite() {
        return f64::NAN;
    }

    let mut y = z;
    let tmp = z + 5.5;
    let tmp = tmp - (z + 0.5) * tmp.ln();

    let mut ser = 1.000000000190015;
    for coeff in LANCZOS {
        y += 1.0;
        ser += coeff / y;
    }

    -tmp + (2.5066282746310005 * ser / z).ln()
}

/// Continued fraction for the incomplete beta function (modified Lentz).
fn betacf(a: f64, b: f64, x: f64) -> f64 {
    let qab = a + b;
    let qap = a + 1.0;
    let qam = a - 1.0;

    let mut c = 1.0;
    let mut d = 1.0 - qab * x / qap;
    if d.abs() < FP_MIN {
        d = FP_MIN;
    }
    d = 1.0 / d;
    let mut h = d;

    for m in 1..=MAX_ITERATIONS {
        let m = m as f64;
        let m2 = 2.0 * m;

        // Even step
        let aa = m * (b - m) * x / ((qam + m2) * (a + m2));
        d = 1.0 + aa * d;
        if d.abs() < FP_MIN {
            d = FP_MIN;
        }
        c = 1.0 + aa / c;
        if c.abs() < FP_MIN {
            c = FP_MIN;
        }
        d = 1.0 / d;
        h *= d * c;

        // Odd step
        let aa = -(a + m) * (qab + m) * x / ((a + m2) * (qap + m2));
        d = 1.0 + aa * d;
        if d.abs() < FP_MIN {
            d = FP_MIN;
        }
        c = 1.0 + aa / c;
        if c.abs() < FP_MIN {
            c = FP_MIN;
        }
        d = 1.0 / d;
        let del = d * c;
        h *= del;

        if (del - 1.0).abs() < EPSILON {
            break;
        }
    }

    h
}

/// Regularized incomplete beta function `I_x(a, b)`.
///
/// Returns `0.0` for `x` outside `[0, 1]` and `x` itself at the endpoints.
pub fn incomplete_beta(a: f64, b: f64, x: f64) -> f64 {
    if !(0.0..=1.0).contains(&x) {
        return 0.0;
    }
    if x == 0.0 || x == 1.0 {
        return x;
    }

    let bt = (log_gamma(a + b) - log_gamma(a) - log_gamma(b) + a * x.ln() + b * (1.0 - x).ln())
        .exp();

    // Keep the continued fraction in its well-conditioned region.
    if x < (a + 1.0) / (a + b + 2.0) {
        bt * betacf(a, b, x) / a
    } else {
        1.0 - bt * betacf(b, a, 1.0 - x) / b
    }
}

/// Student-t cumulative distribution function.
pub fn student_t_cdf(t: f64, df: f64) -> f64 {
    if !(df > 0.0) || t.is_nan() {
        return f64::NAN;
    }

    let x = df / (df + t * t);
    let ib = incomplete_beta(df / 2.0, 0.5, x);
    if t >= 0.0 { 1.0 - 0.5 * ib } else { 0.5 * ib }
}

/// Student-t quantile by bisection over `[-10, 10]`.
pub fn student_t_inv(p: f64, df: f64) -> f64 {
    if !(p > 0.0 && p < 1.0) || !(df > 0.0) {
        return f64::NAN;
    }

    let mut low = -10.0;
    let mut high = 10.0;
    for _ in 0..60 {
        let mid = (low + high) / 2.0;
        if student_t_cdf(mid, df) < p {
            low = mid;
        } else {
            high = mid;
        }
    }
    (low + high) / 2.0
}

/// Two-sided p-value for a t statistic.
pub fn student_t_two_sided(t: f64, df: f64) -> f64 {
    2.0 * (1.0 - student_t_cdf(t.abs(), df))
}

/// Regularized lower incomplete gamma `P(a, x)`.
pub fn incomplete_gamma(a: f64, x: f64) -> f64 {
    if !(a > 0.0) || x.is_nan() {
        return f64::NAN;
    }
    if x <= 0.0 {
        return 0.0;
    }
    if x.is_infinite() {
        return 1.0;
    }

    if x < a + 1.0 {
        gamma_series(a, x)
    } else {
        1.0 - gamma_continued_fraction(a, x)
    }
}

/// Series representation of `P(a, x)`, valid for `x < a + 1`.
fn gamma_series(a: f64, x: f64) -> f64 {
    let mut ap = a;
    let mut del = 1.0 / a;
    let mut sum = del;

    for _ in 0..MAX_ITERATIONS {
        ap += 1.0;
        del *= x / ap;
        sum += del;
        if del.abs() < sum.abs() * EPSILON {
            break;
        }
    }

    sum * (-x + a * x.ln() - log_gamma(a)).exp()
}

/// Continued fraction for `Q(a, x)`, valid for `x >= a + 1`.
fn gamma_continued_fraction(a: f64, x: f64) -> f64 {
    let mut b = x + 1.0 - a;
    let mut c = 1.0 / FP_MIN;
    let mut d = 1.0 / b;
    let mut h = d;

    for i in 1..=MAX_ITERATIONS {
        let i = i as f64;
        let an = -i * (i - a);
        b += 2.0;
        d = an * d + b;
        if d.abs() < FP_MIN {
            d = FP_MIN;
        }
        c = b + an / c;
        if c.abs() < FP_MIN {
            c = FP_MIN;
        }
        d = 1.0 / d;
        let del = d * c;
        h *= del;
        if (del - 1.0).abs() < EPSILON {
            break;
        }
    }

    (-x + a * x.ln() - log_gamma(a)).exp() * h
}

/// Upper-tail probability of the chi-square distribution.
pub fn chi_square_p_value(chi2: f64, df: f64) -> f64 {
    if !(df > 0.0) || chi2.is_nan() {
        return f64::NAN;
    }
    if chi2 <= 0.0 {
        return 1.0;
    }
    (1.0 - incomplete_gamma(df / 2.0, chi2 / 2.0)).clamp(0.0, 1.0)
}

/// Upper-tail probability of the F distribution.
pub fn f_dist_p_value(f: f64, df1: f64, df2: f64) -> f64 {
    if f.is_nan() || !(df2 > 0.0) || df1 < 0.0 {
        return f64::NAN;
    }
    if f.is_infinite() {
        return 0.0;
    }
    let x = (df1 * f) / (df1 * f + df2);
    1.0 - incomplete_beta(df1 / 2.0, df2 / 2.0, x)
}

/// Inverse standard normal CDF (Acklam's rational approximation).
pub fn normal_inv(p: f64) -> f64 {
    const A: [f64; 6] = [
        -39.6968302866538,
        220.946098424521,
        -275.928510446969,
        138.357751867269,
        -30.6647980661472,
        2.50662827745924,
    ];
    const B: [f64; 5] = [
        -54.4760987982241,
        161.585836858041,
        -155.698979859887,
        66.8013118877197,
        -13.2806815528857,
    ];
    const C: [f64; 6] = [
        -0.00778489400243029,
        -0.322396458041136,
        -2.40075827716184,
        -2.54973253934373,
        4.37466414146497,
        2.93816398269878,
    ];
    const D: [f64; 4] = [
        0.00778469570904146,
        0.32246712907004,
        2.445134137143,
        3.75440866190742,
    ];
    const P_LOW: f64 = 0.02425;
    const P_HIGH: f64 = 1.0 - P_LOW;

    if !(p > 0.0 && p < 1.0) {
        return f64::NAN;
    }

    let tail = |q: f64| {
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    };

    if p < P_LOW {
        let q = (-2.0 * p.ln()).sqrt();
        return tail(q);
    }
    if p > P_HIGH {
        let q = (-2.0 * (1.0 - p).ln()).sqrt();
        return -tail(q);
    }

    let q = p - 0.5;
    let r = q * q;
    (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
        / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
}
