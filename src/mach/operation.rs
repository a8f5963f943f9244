use super::number::{
    add_magnitude, cmp_magnitude, divmod_magnitude, mul_magnitude, sub_magnitude, Number,
};
use crate::error;
use crate::lang::Error;
use std::cmp::Ordering;

type Result<T> = std::result::Result<T, Error>;

/// ## Number engine arithmetic
///
/// Every operation takes immutable numbers and builds a new one.

pub struct Operation;

impl Operation {
    pub fn negate(value: &Number) -> Number {
        value.negate()
    }

    pub fn add(lhs: &Number, rhs: &Number) -> Number {
        let scale = lhs.scale().max(rhs.scale());
        let l = lhs.magnitude(scale);
        let r = rhs.magnitude(scale);
        if lhs.is_negative() == rhs.is_negative() {
            return Number::from_magnitude(lhs.is_negative(), &add_magnitude(&l, &r), scale);
        }
        match cmp_magnitude(&l, &r) {
            Ordering::Less => Number::from_magnitude(rhs.is_negative(), &sub_magnitude(&r, &l), scale),
            _ => Number::from_magnitude(lhs.is_negative(), &sub_magnitude(&l, &r), scale),
        }
    }

    pub fn subtract(lhs: &Number, rhs: &Number) -> Number {
        Operation::add(lhs, &rhs.negate())
    }

    /// Exact product cut or padded to `scale` fraction digits.
    pub fn multiply(lhs: &Number, rhs: &Number, scale: usize) -> Number {
        let full = lhs.scale() + rhs.scale();
        let product = mul_magnitude(&lhs.magnitude(lhs.scale()), &rhs.magnitude(rhs.scale()));
        let negative = lhs.is_negative() != rhs.is_negative();
        Number::from_magnitude(negative, &product, full).with_scale(scale)
    }

    pub fn divide(lhs: &Number, rhs: &Number, scale: usize) -> Result<Number> {
        if rhs.is_zero() {
            return Err(error!(DivisionByZero));
        }
        // lhs * 10^(rhs.scale + scale) / (rhs * 10^lhs.scale) gives the
        // quotient multiplied by 10^scale.
        let mut numerator = vec![0u8; rhs.scale() + scale];
        numerator.extend(lhs.magnitude(lhs.scale()));
        let mut denominator = vec![0u8; lhs.scale()];
        denominator.extend(rhs.magnitude(rhs.scale()));
        let (quotient, _) = divmod_magnitude(&strip(numerator), &strip(denominator));
        let negative = lhs.is_negative() != rhs.is_negative();
        Ok(Number::from_magnitude(negative, &quotient, scale))
    }

    pub fn modulo(lhs: &Number, rhs: &Number, scale: usize) -> Result<Number> {
        if rhs.is_zero() {
            return Err(error!(ModuloByZero));
        }
        let rscale = lhs.scale().max(rhs.scale() + scale);
        let quotient = Operation::divide(lhs, rhs, scale)?;
        let product = Operation::multiply(&quotient, rhs, rscale);
        Ok(Operation::subtract(lhs, &product).with_scale(rscale))
    }

    pub fn raise(base: &Number, exponent: &Number, scale: usize) -> Result<Number> {
        if exponent.scale() != 0 {
            return Err(error!(NonIntegerExponent));
        }
        let power = match exponent.to_i64() {
            Some(power) => power,
            None => return Err(error!(ExponentTooLarge)),
        };
        if power == 0 {
            return Ok(Number::one());
        }
        let magnitude = power.unsigned_abs();
        let rscale = if power < 0 {
            scale
        } else {
            let exact = base.scale().saturating_mul(magnitude as usize);
            exact.min(scale.max(base.scale()))
        };
        let work = working_scale(base, power, rscale);
        let mut result = Number::one();
        let mut square = base.clone();
        let mut bits = magnitude;
        loop {
            if bits & 1 == 1 {
                let s = (result.scale() + square.scale()).min(work);
                result = Operation::multiply(&result, &square, s);
            }
            bits >>= 1;
            if bits == 0 {
                break;
            }
            let s = (square.scale() * 2).min(work);
            square = Operation::multiply(&square, &square, s);
        }
        if power < 0 {
            return Operation::divide(&Number::one(), &result, rscale);
        }
        Ok(result.with_scale(rscale))
    }

    pub fn sqrt(value: &Number, scale: usize) -> Result<Number> {
        if value.is_negative() {
            return Err(error!(NegativeOperand));
        }
        let rscale = scale.max(value.scale());
        if value.is_zero() {
            return Ok(Number::zero().with_scale(rscale));
        }
        let target = value.magnitude(rscale * 2);
        let root = isqrt(&target);
        Ok(Number::from_magnitude(false, &root, rscale))
    }

    pub fn compare(lhs: &Number, rhs: &Number) -> Ordering {
        lhs.cmp(rhs)
    }
}

/// Fraction digits kept on intermediate powers: the result scale plus
/// guard digits for the size of the result and the count of products,
/// never more than the exact scale.
fn working_scale(base: &Number, power: i64, rscale: usize) -> usize {
    let magnitude = power.unsigned_abs();
    let exact = base.scale().saturating_mul(magnitude as usize);
    if base.is_zero() {
        return exact;
    }
    let guard = magnitude.to_string().len() + 3;
    let log = log10_abs(base) * magnitude as f64;
    let spread = if power < 0 {
        2.0 * (-log).max(0.0)
    } else {
        log.max(0.0)
    };
    let spread = if spread.is_finite() {
        spread.ceil() as usize
    } else {
        exact
    };
    rscale.saturating_add(spread).saturating_add(guard).min(exact)
}

/// Approximate `log10(|n|)` from the leading digits.
fn log10_abs(n: &Number) -> f64 {
    let mag = n.magnitude(n.scale());
    let lead = mag
        .iter()
        .rev()
        .take(15)
        .fold(0.0, |acc, d| acc * 10.0 + f64::from(*d));
    let shift = mag.len().saturating_sub(15) as f64;
    lead.log10() + shift - n.scale() as f64
}

fn strip(mut v: Vec<u8>) -> Vec<u8> {
    super::number::trim(&mut v);
    v
}

/// Largest `x` with `x * x <= n`, by Newton iteration from above.
fn isqrt(n: &[u8]) -> Vec<u8> {
    let mut x = vec![0u8; (n.len() + 1) / 2];
    x.push(1);
    let two = [2u8];
    loop {
        let (q, _) = divmod_magnitude(n, &x);
        let (next, _) = divmod_magnitude(&add_magnitude(&x, &q), &two);
        if cmp_magnitude(&next, &x) != Ordering::Less {
            return x;
        }
        x = next;
    }
}
