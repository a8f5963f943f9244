use crate::error;
use crate::lang::Error;
use std::cmp::Ordering;
use std::rc::Rc;

type Result<T> = std::result::Result<T, Error>;

/// ## Arbitrary precision decimal
///
/// Digits are kept most significant first: `int_len` integer digits
/// followed by exactly `scale` fraction digits. The buffer is shared
/// between clones and never written after construction.

#[derive(Clone)]
pub struct Number {
    negative: bool,
    int_len: usize,
    scale: usize,
    zero: bool,
    digits: Rc<[u8]>,
}

impl Default for Number {
    fn default() -> Self {
        Number::zero()
    }
}

impl Number {
    pub fn zero() -> Number {
        Number {
            negative: false,
            int_len: 1,
            scale: 0,
            zero: true,
            digits: Rc::from(vec![0u8]),
        }
    }

    pub fn one() -> Number {
        Number {
            negative: false,
            int_len: 1,
            scale: 0,
            zero: false,
            digits: Rc::from(vec![1u8]),
        }
    }

    /// Builds a number from little endian magnitude digits that hold the
    /// value multiplied by `10^scale`.
    pub(crate) fn from_magnitude(negative: bool, magnitude: &[u8], scale: usize) -> Number {
        let total = magnitude.len().max(scale + 1);
        let mut digits: Vec<u8> = (0..total)
            .rev()
            .map(|i| magnitude.get(i).copied().unwrap_or(0))
            .collect();
        let mut int_len = total - scale;
        let lead = digits[..int_len - 1].iter().take_while(|d| **d == 0).count();
        if lead > 0 {
            digits.drain(..lead);
            int_len -= lead;
        }
        let zero = digits.iter().all(|d| *d == 0);
        Number {
            negative: negative && !zero,
            int_len,
            scale,
            zero,
            digits: Rc::from(digits),
        }
    }

    /// Little endian digits of `|self| * 10^scale`, truncated when `scale`
    /// is smaller than the number's own. High zeros are trimmed.
    pub(crate) fn magnitude(&self, scale: usize) -> Vec<u8> {
        let keep = self.int_len + scale.min(self.scale);
        let mut mag: Vec<u8> = vec![0; scale.saturating_sub(self.scale)];
        mag.extend(self.digits[..keep].iter().rev());
        trim(&mut mag);
        mag
    }

    pub fn parse(text: &str, scale: usize) -> Result<Number> {
        let (negative, body) = match text.as_bytes().first() {
            Some(b'-') => (true, &text[1..]),
            Some(b'+') => (false, &text[1..]),
            _ => (false, text),
        };
        let (int_part, frac_part) = match body.find('.') {
            Some(pos) => (&body[..pos], &body[pos + 1..]),
            None => (body, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(error!(InvalidNumber; format!("invalid number - {}", text)));
        }
        if !int_part.bytes().chain(frac_part.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(error!(InvalidNumber; format!("invalid number - {}", text)));
        }
        let mut mag: Vec<u8> = (0..scale)
            .rev()
            .map(|i| frac_part.as_bytes().get(i).map_or(0, |b| b - b'0'))
            .collect();
        mag.extend(int_part.bytes().rev().map(|b| b - b'0'));
        Ok(Number::from_magnitude(negative, &mag, scale))
    }

    /// Converts a literal written in `base`. Digits may exceed the base the
    /// way bc allows; a single digit literal always keeps its face value.
    pub fn parse_radix(text: &str, base: u32) -> Result<Number> {
        let (int_part, frac_part) = match text.find('.') {
            Some(pos) => (&text[..pos], &text[pos + 1..]),
            None => (text, ""),
        };
        let digit = |c: char| {
            c.to_digit(16)
                .filter(|_| !c.is_ascii_lowercase())
                .ok_or_else(|| error!(InvalidNumber; format!("invalid number - {}", text)))
        };
        if text.len() == 1 {
            return Ok(Number::from(i64::from(digit(text.chars().next().unwrap_or('0'))?)));
        }
        if base == 10 && text.bytes().all(|b| b.is_ascii_digit() || b == b'.') {
            return Number::parse(text, frac_part.len());
        }
        let radix = small_magnitude(u64::from(base));
        let mut int_mag: Vec<u8> = vec![];
        for c in int_part.chars() {
            let d = small_magnitude(u64::from(digit(c)?));
            int_mag = add_magnitude(&mul_magnitude(&int_mag, &radix), &d);
        }
        let int_value = Number::from_magnitude(false, &int_mag, 0);
        if frac_part.is_empty() {
            return Ok(int_value);
        }
        let mut frac_mag: Vec<u8> = vec![];
        let mut denominator = vec![1u8];
        for c in frac_part.chars() {
            let d = small_magnitude(u64::from(digit(c)?));
            frac_mag = add_magnitude(&mul_magnitude(&frac_mag, &radix), &d);
            denominator = mul_magnitude(&denominator, &radix);
        }
        let scale = frac_part.len();
        let mut numerator = vec![0u8; scale];
        numerator.extend(frac_mag);
        trim(&mut numerator);
        let (quotient, _) = divmod_magnitude(&numerator, &denominator);
        let total = add_magnitude(&int_value.magnitude(scale), &quotient);
        Ok(Number::from_magnitude(false, &total, scale))
    }

    pub fn is_zero(&self) -> bool {
        self.zero
    }

    pub fn is_negative(&self) -> bool {
        self.negative
    }

    pub fn scale(&self) -> usize {
        self.scale
    }

    /// Count of significant digits. A number below one counts only its
    /// fraction digits.
    pub fn length(&self) -> usize {
        if self.int_len == 1 && self.digits[0] == 0 && self.scale > 0 {
            self.scale
        } else {
            self.int_len + self.scale
        }
    }

    pub fn with_scale(&self, scale: usize) -> Number {
        if scale == self.scale {
            return self.clone();
        }
        Number::from_magnitude(self.negative, &self.magnitude(scale), scale)
    }

    pub fn negate(&self) -> Number {
        let mut n = self.clone();
        n.negative = !self.negative && !self.is_zero();
        n
    }

    pub fn abs(&self) -> Number {
        let mut n = self.clone();
        n.negative = false;
        n
    }

    /// Integer part, truncated toward zero. `None` when it does not fit.
    pub fn to_i64(&self) -> Option<i64> {
        let mut value: i64 = 0;
        for d in &self.digits[..self.int_len] {
            value = value.checked_mul(10)?.checked_sub(i64::from(*d))?;
        }
        if self.negative {
            Some(value)
        } else {
            value.checked_neg()
        }
    }

    /// Scale of a product under bc rules.
    pub fn product_scale(a: &Number, b: &Number, scale: usize) -> usize {
        (a.scale + b.scale).min(scale.max(a.scale).max(b.scale))
    }

    /// Renders in any base of two or more, one character at a time.
    pub fn format(&self, base: u64, sink: &mut dyn FnMut(char)) {
        if self.is_zero() {
            sink('0');
            return;
        }
        if self.negative {
            sink('-');
        }
        if base == 10 {
            let int_zero = self.int_len == 1 && self.digits[0] == 0;
            for (i, d) in self.digits.iter().enumerate() {
                if i == self.int_len {
                    sink('.');
                }
                if i == 0 && int_zero {
                    continue;
                }
                sink(char::from(b'0' + d));
            }
            return;
        }
        let width = (base - 1).to_string().len();
        let radix = small_magnitude(base);
        let mut int_mag = self.magnitude(0);
        let mut int_digits = vec![];
        while !int_mag.is_empty() {
            let (quotient, remainder) = divmod_magnitude(&int_mag, &radix);
            int_digits.push(magnitude_to_u64(&remainder));
            int_mag = quotient;
        }
        for d in int_digits.iter().rev() {
            emit_digit(*d, base, width, true, sink);
        }
        if self.scale == 0 {
            return;
        }
        sink('.');
        let full = self.magnitude(self.scale);
        let mut fraction: Vec<u8> = full.iter().take(self.scale).copied().collect();
        trim(&mut fraction);
        let mut place = vec![1u8];
        let mut spaced = false;
        while place.len() <= self.scale {
            let product = mul_magnitude(&fraction, &radix);
            let digit = magnitude_to_u64(product.get(self.scale..).unwrap_or(&[]));
            fraction = product.iter().take(self.scale).copied().collect();
            trim(&mut fraction);
            emit_digit(digit, base, width, spaced, sink);
            spaced = true;
            place = mul_magnitude(&place, &radix);
        }
    }

    pub fn to_string_radix(&self, base: u64) -> String {
        let mut s = String::new();
        self.format(base, &mut |c| s.push(c));
        s
    }
}

fn emit_digit(digit: u64, base: u64, width: usize, space: bool, sink: &mut dyn FnMut(char)) {
    if base <= 16 {
        let c = std::char::from_digit(digit as u32, 16).unwrap_or('?');
        sink(c.to_ascii_uppercase());
    } else {
        if space {
            sink(' ');
        }
        for c in format!("{:0width$}", digit, width = width).chars() {
            sink(c);
        }
    }
}

impl From<i64> for Number {
    fn from(n: i64) -> Self {
        Number::from_magnitude(n < 0, &small_magnitude(n.unsigned_abs()), 0)
    }
}

impl From<usize> for Number {
    fn from(n: usize) -> Self {
        Number::from_magnitude(false, &small_magnitude(n as u64), 0)
    }
}

impl std::fmt::Display for Number {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_string_radix(10))
    }
}

impl std::fmt::Debug for Number {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Number({})", self)
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Number {}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Number {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.negative, other.negative) {
            (false, true) => Ordering::Greater,
            (true, false) => Ordering::Less,
            (negative, _) => {
                let scale = self.scale.max(other.scale);
                let ord = cmp_magnitude(&self.magnitude(scale), &other.magnitude(scale));
                if negative {
                    ord.reverse()
                } else {
                    ord
                }
            }
        }
    }
}

// Little endian digit vectors. Helpers keep them free of high zeros.

pub(crate) fn trim(v: &mut Vec<u8>) {
    while v.last() == Some(&0) {
        v.pop();
    }
}

pub(crate) fn small_magnitude(mut n: u64) -> Vec<u8> {
    let mut v = vec![];
    while n > 0 {
        v.push((n % 10) as u8);
        n /= 10;
    }
    v
}

fn magnitude_to_u64(v: &[u8]) -> u64 {
    v.iter().rev().fold(0u64, |acc, d| acc.saturating_mul(10).saturating_add(u64::from(*d)))
}

pub(crate) fn cmp_magnitude(a: &[u8], b: &[u8]) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.iter().rev().cmp(b.iter().rev()))
}

pub(crate) fn add_magnitude(a: &[u8], b: &[u8]) -> Vec<u8> {
    let mut sum = Vec::with_capacity(a.len().max(b.len()) + 1);
    let mut carry = 0u8;
    for i in 0..a.len().max(b.len()) {
        let d = a.get(i).unwrap_or(&0) + b.get(i).unwrap_or(&0) + carry;
        sum.push(d % 10);
        carry = d / 10;
    }
    if carry > 0 {
        sum.push(carry);
    }
    sum
}

/// Requires `a >= b`.
pub(crate) fn sub_magnitude(a: &[u8], b: &[u8]) -> Vec<u8> {
    let mut diff = Vec::with_capacity(a.len());
    let mut borrow = 0i8;
    for (i, da) in a.iter().enumerate() {
        let mut d = *da as i8 - *b.get(i).unwrap_or(&0) as i8 - borrow;
        borrow = 0;
        if d < 0 {
            d += 10;
            borrow = 1;
        }
        diff.push(d as u8);
    }
    trim(&mut diff);
    diff
}

pub(crate) fn mul_magnitude(a: &[u8], b: &[u8]) -> Vec<u8> {
    if a.is_empty() || b.is_empty() {
        return vec![];
    }
    let mut acc = vec![0u32; a.len() + b.len()];
    for (i, da) in a.iter().enumerate() {
        if *da == 0 {
            continue;
        }
        for (j, db) in b.iter().enumerate() {
            acc[i + j] += u32::from(*da) * u32::from(*db);
        }
        if i % 64 == 63 {
            carry_through(&mut acc);
        }
    }
    carry_through(&mut acc);
    let mut product: Vec<u8> = acc.into_iter().map(|d| d as u8).collect();
    trim(&mut product);
    product
}

fn carry_through(acc: &mut [u32]) {
    let mut carry = 0u32;
    for d in acc.iter_mut() {
        let v = *d + carry;
        *d = v % 10;
        carry = v / 10;
    }
}

/// Long division; `d` must be non-zero.
pub(crate) fn divmod_magnitude(n: &[u8], d: &[u8]) -> (Vec<u8>, Vec<u8>) {
    let mut quotient = vec![0u8; n.len()];
    let mut remainder: Vec<u8> = vec![];
    for i in (0..n.len()).rev() {
        remainder.insert(0, n[i]);
        trim(&mut remainder);
        let mut q = 0u8;
        while cmp_magnitude(&remainder, d) != Ordering::Less {
            remainder = sub_magnitude(&remainder, d);
            q += 1;
        }
        quotient[i] = q;
    }
    trim(&mut quotient);
    (quotient, remainder)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(s: &str) -> Number {
        let scale = s.find('.').map_or(0, |p| s.len() - p - 1);
        Number::parse(s, scale).unwrap()
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!(n("123").to_string(), "123");
        assert_eq!(n("-0012.50").to_string(), "-12.50");
        assert_eq!(n(".5").to_string(), ".5");
        assert_eq!(n("-0.25").to_string(), "-.25");
        assert_eq!(n("0.000").to_string(), "0");
        assert_eq!(Number::parse("1.23456", 2).unwrap().to_string(), "1.23");
        assert_eq!(Number::parse("7", 3).unwrap().to_string(), "7.000");
        assert!(Number::parse("", 0).is_err());
        assert!(Number::parse("1x", 0).is_err());
        assert!(Number::parse(".", 0).is_err());
    }

    #[test]
    fn test_zero_is_canonical() {
        let z = n("-0.00");
        assert!(z.is_zero());
        assert!(!z.is_negative());
        assert_eq!(z.scale(), 2);
        assert_eq!(z, Number::zero());
    }

    #[test]
    fn test_compare_ignores_padding() {
        assert_eq!(n("1.0"), n("1.00"));
        assert!(n("-2") < n("-1.5"));
        assert!(n("0.001") > n("0"));
        assert!(n("10") > n("9.999"));
    }

    #[test]
    fn test_length_and_scale() {
        assert_eq!(n("123.45").length(), 5);
        assert_eq!(n(".05").length(), 2);
        assert_eq!(n("0").length(), 1);
        assert_eq!(n("-1000").length(), 4);
        assert_eq!(n("3.140").scale(), 3);
    }

    #[test]
    fn test_to_i64() {
        assert_eq!(n("42.9").to_i64(), Some(42));
        assert_eq!(n("-42.9").to_i64(), Some(-42));
        assert_eq!(n("9223372036854775807").to_i64(), Some(i64::MAX));
        assert_eq!(n("-9223372036854775808").to_i64(), Some(i64::MIN));
        assert_eq!(n("9223372036854775808").to_i64(), None);
    }

    #[test]
    fn test_parse_radix() {
        assert_eq!(Number::parse_radix("FF", 16).unwrap().to_string(), "255");
        assert_eq!(Number::parse_radix("101", 2).unwrap().to_string(), "5");
        assert_eq!(Number::parse_radix("A", 2).unwrap().to_string(), "10");
        assert_eq!(Number::parse_radix("0.1", 2).unwrap().to_string(), ".5");
        assert_eq!(Number::parse_radix("1.8", 16).unwrap().to_string(), "1.5");
        assert_eq!(Number::parse_radix("12.5", 10).unwrap().to_string(), "12.5");
        assert_eq!(Number::parse_radix("A", 10).unwrap().to_string(), "10");
        assert_eq!(Number::parse_radix("F", 10).unwrap().to_string(), "15");
        assert_eq!(Number::parse_radix("1F", 10).unwrap().to_string(), "25");
        assert_eq!(Number::parse_radix("A.5", 10).unwrap().to_string(), "10.5");
    }

    #[test]
    fn test_is_zero_after_arithmetic() {
        assert!(n("0.000").is_zero());
        assert!(n("-0.00").is_zero());
        assert!(!n("0.001").is_zero());
        assert!(!n("-1.5").with_scale(0).is_zero());
        assert!(n(".05").with_scale(1).is_zero());
        assert!(!n(".05").with_scale(1).is_negative());
        assert!(n("-.05").with_scale(1).is_zero());
    }

    #[test]
    fn test_format_bases() {
        assert_eq!(n("255").to_string_radix(16), "FF");
        assert_eq!(n("-10").to_string_radix(2), "-1010");
        assert_eq!(n(".5").to_string_radix(2), ".1000");
        assert_eq!(n("0").to_string_radix(16), "0");
        assert_eq!(n("3600").to_string_radix(60), " 01 00 00");
        assert_eq!(n("10.5").to_string_radix(100), " 10.50");
        assert_eq!(n("1.50").to_string_radix(16), "1.80");
    }

    #[test]
    fn test_clone_shares_digits() {
        let a = n("12345678901234567890");
        let b = a.clone();
        assert!(Rc::ptr_eq(&a.digits, &b.digits));
        let c = b.negate();
        assert_eq!(a.to_string(), "12345678901234567890");
        assert_eq!(c.to_string(), "-12345678901234567890");
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn parse_to_string_round_trip(int in "-?[0-9]{1,30}", frac in "[0-9]{0,20}") {
                let text = if frac.is_empty() { int.clone() } else { format!("{}.{}", int, frac) };
                let x = Number::parse(&text, frac.len()).unwrap();
                let back = Number::parse(&x.to_string(), x.scale()).unwrap();
                prop_assert_eq!(&back, &x);
                prop_assert_eq!(back.scale(), x.scale());
            }

            #[test]
            fn i64_round_trip(v in any::<i64>()) {
                prop_assert_eq!(Number::from(v).to_i64(), Some(v));
                prop_assert_eq!(Number::from(v).to_string(), v.to_string());
            }
        }
    }
}
