//! Closed-form European option pricing.
//!
//! Prices calls and puts under the Black-Scholes model and returns the
//! delta alongside the value, since delta falls out of the same d₁ term.
//! At expiry the value collapses to intrinsic and delta becomes a step
//! function instead of evaluating the formula with a zero denominator.
//!
//! Everything here is a pure function of its inputs: identical arguments
//! always produce identical results, and nothing is cached between calls.

use thiserror::Error;

/// Call or put.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionRight {
    Call,
    Put,
}

/// Theoretical value and first-order price sensitivity of one option.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Theoretical {
    /// Fair value in currency units.
    pub value: f64,
    /// ∂value/∂underlying. Call delta ∈ [0, 1], put delta ∈ [-1, 0].
    pub delta: f64,
}

/// Input validation failures. The caller skips the instrument for the
/// tick; pricing never aborts the evaluation pass.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum PriceError {
    #[error("underlying price must be positive, got {0}")]
    NonPositiveUnderlying(f64),
    #[error("strike must be positive, got {0}")]
    NonPositiveStrike(f64),
    #[error("volatility must be positive, got {0}")]
    NonPositiveVolatility(f64),
    #[error("time to expiry must be non-negative, got {0}")]
    NegativeExpiry(f64),
}

/// Prices a European option and its delta.
///
/// * `underlying` - spot price S, must be positive
/// * `strike` - strike price K, must be positive
/// * `time_to_expiry_years` - T ≥ 0; at exactly 0 the result is intrinsic
///   value with a step delta
/// * `volatility` - annualized σ, must be positive when T > 0
/// * `rate` - continuously compounded risk-free rate (zero on this venue,
///   but the formula keeps the general term)
///
/// # Errors
///
/// Returns [`PriceError`] for non-positive spot/strike/volatility or
/// negative time to expiry.
pub fn price(
    underlying: f64,
    strike: f64,
    time_to_expiry_years: f64,
    volatility: f64,
    rate: f64,
    right: OptionRight,
) -> Result<Theoretical, PriceError> {
    if underlying <= 0.0 || underlying.is_nan() {
        return Err(PriceError::NonPositiveUnderlying(underlying));
    }
    if strike <= 0.0 || strike.is_nan() {
        return Err(PriceError::NonPositiveStrike(strike));
    }
    if time_to_expiry_years < 0.0 || time_to_expiry_years.is_nan() {
        return Err(PriceError::NegativeExpiry(time_to_expiry_years));
    }
    if time_to_expiry_years == 0.0 {
        return Ok(at_expiry(underlying, strike, right));
    }
    if volatility <= 0.0 || volatility.is_nan() {
        return Err(PriceError::NonPositiveVolatility(volatility));
    }

    let (d1, d2) = d1_d2(underlying, strike, time_to_expiry_years, rate, volatility);
    let discount = (-rate * time_to_expiry_years).exp();

    let theo = match right {
        OptionRight::Call => Theoretical {
            value: underlying * norm_cdf(d1) - strike * discount * norm_cdf(d2),
            delta: norm_cdf(d1),
        },
        OptionRight::Put => Theoretical {
            value: strike * discount * norm_cdf(-d2) - underlying * norm_cdf(-d1),
            delta: norm_cdf(d1) - 1.0,
        },
    };
    Ok(theo)
}

/// Intrinsic value and step delta at expiry.
fn at_expiry(underlying: f64, strike: f64, right: OptionRight) -> Theoretical {
    match right {
        OptionRight::Call => Theoretical {
            value: (underlying - strike).max(0.0),
            delta: if underlying > strike { 1.0 } else { 0.0 },
        },
        OptionRight::Put => Theoretical {
            value: (strike - underlying).max(0.0),
            delta: if underlying < strike { -1.0 } else { 0.0 },
        },
    }
}

/// d₁ = [ln(S/K) + (r + σ²/2)T] / (σ√T), d₂ = d₁ - σ√T.
fn d1_d2(spot: f64, strike: f64, time: f64, rate: f64, volatility: f64) -> (f64, f64) {
    let sigma_sqrt_t = volatility * time.sqrt();
    let d1 = ((spot / strike).ln() + (rate + volatility * volatility / 2.0) * time) / sigma_sqrt_t;
    (d1, d1 - sigma_sqrt_t)
}

/// Standard normal CDF via the error function.
fn norm_cdf(x: f64) -> f64 {
    0.5 * (1.0 + erf(x / std::f64::consts::SQRT_2))
}

/// Abramowitz & Stegun 7.1.26 rational approximation, |error| < 1.5e-7.
fn erf(x: f64) -> f64 {
    const A1: f64 = 0.254_829_592;
    const A2: f64 = -0.284_496_736;
    const A3: f64 = 1.421_413_741;
    const A4: f64 = -1.453_152_027;
    const A5: f64 = 1.061_405_429;
    const P: f64 = 0.327_591_1;

    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();

    let t = 1.0 / (1.0 + P * x);
    let y = 1.0 - (((((A5 * t + A4) * t) + A3) * t + A2) * t + A1) * t * (-x * x).exp();

    sign * y
}
