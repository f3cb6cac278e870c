use alloc::string::String;
use core::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};

use num::{One, Zero};

use super::{Inverse, MODULUS};

// MONTGOMERY ARITHMETIC
// ================================================================================================
//
// Falcon operates over Z/qZ with q = 12289. Elements are stored in the internal representation
// [1, q] (zero is represented as q), which avoids a conditional branch in Montgomery reduction.
// The public API speaks the external representation [0, q-1]; signature and key material use the
// balanced representation [-(q-1)/2, (q-1)/2] so that "small" values stay small.
//
// The Montgomery routines below are adapted from rust-fn-dsa:
// https://github.com/pornin/rust-fn-dsa/blob/main/fn-dsa-comm/src/mq.rs

const Q: u32 = MODULUS as u32;

// -1/q mod 2^32
const Q1I: u32 = 4143984639;

// 2^64 mod q (R^2 mod q, where R = 2^32)
const R2: u32 = 5664;

/// Addition modulo q (internal representation [1,q]).
#[inline(always)]
fn mq_add(x: u32, y: u32) -> u32 {
    let a = Q.wrapping_sub(x + y);
    let b = a.wrapping_add(Q & (a >> 16));
    Q - b
}

/// Subtraction modulo q (internal representation [1,q]).
#[inline(always)]
fn mq_sub(x: u32, y: u32) -> u32 {
    let a = y.wrapping_sub(x);
    let b = a.wrapping_add(Q & (a >> 16));
    Q - b
}

/// Montgomery reduction: x/2^32 mod q.
/// Input must satisfy 1 <= x <= 3489673216.
#[inline(always)]
fn mq_mred(x: u32) -> u32 {
    let b = x.wrapping_mul(Q1I);
    let c = (b >> 16) * Q;
    (c >> 16) + 1
}

/// Montgomery multiplication modulo q (internal representation [1,q]).
#[inline(always)]
fn mq_mmul(x: u32, y: u32) -> u32 {
    mq_mred(x * y)
}

/// Division modulo q (internal representation [1,q]).
/// Returns 0 if divisor is 0.
fn mq_div(x: u32, y: u32) -> u32 {
    // Convert y to Montgomery representation
    let y = mq_mmul(y, R2);

    // Compute 1/y = y^(q-2) using an addition chain
    let y2 = mq_mmul(y, y);
    let y3 = mq_mmul(y2, y);
    let y5 = mq_mmul(y3, y2);
    let y10 = mq_mmul(y5, y5);
    let y20 = mq_mmul(y10, y10);
    let y40 = mq_mmul(y20, y20);
    let y80 = mq_mmul(y40, y40);
    let y160 = mq_mmul(y80, y80);
    let y163 = mq_mmul(y160, y3);
    let y323 = mq_mmul(y163, y160);
    let y646 = mq_mmul(y323, y323);
    let y1292 = mq_mmul(y646, y646);
    let y1455 = mq_mmul(y1292, y163);
    let y2910 = mq_mmul(y1455, y1455);
    let y5820 = mq_mmul(y2910, y2910);
    let y6143 = mq_mmul(y5820, y323);
    let y12286 = mq_mmul(y6143, y6143);
    let iy = mq_mmul(y12286, y);

    // Multiply by x to get x/y
    mq_mmul(x, iy)
}

/// Converts a signed integer to the external representation [0, q-1] without branching.
#[inline(always)]
fn signed_to_external(value: i32) -> u16 {
    let x = value as u32;
    (x.wrapping_add((x >> 16) & Q)) as u16
}

// FALCON FIELD ELEMENT
// ================================================================================================

/// An element of Z/qZ with q = 12289, stored in internal representation [1, q].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FalconFelt(u16);

impl FalconFelt {
    /// Creates a field element from a u16 in external representation [0, q-1].
    pub const fn new(value: u16) -> Self {
        // Branchless external [0, q-1] -> internal [1, q]: 0 maps to q.
        let x = value as u32;
        let internal = (x + (Q & (x.wrapping_sub(1) >> 16))) as u16;
        FalconFelt(internal)
    }

    /// Returns the value in external representation [0, q-1].
    pub const fn value(&self) -> u16 {
        let x = (self.0 as u32).wrapping_sub(Q);
        (x.wrapping_add(Q & (x >> 16))) as u16
    }

    /// Returns the value in balanced representation [-(q-1)/2, (q-1)/2].
    ///
    /// Signature coefficients and key material are "small"; the balanced representation keeps
    /// -1 at -1 rather than 12288.
    pub fn balanced_value(&self) -> i16 {
        let v = self.value() as i16;
        let g = (v > (MODULUS / 2)) as i16;
        v - MODULUS * g
    }

    /// Raises the element to the given power by square-and-multiply.
    pub fn pow(self, mut exponent: u32) -> Self {
        let mut base = self;
        let mut acc = FalconFelt::one();
        while exponent > 0 {
            if exponent & 1 == 1 {
                acc *= base;
            }
            base *= base;
            exponent >>= 1;
        }
        acc
    }
}

impl Add for FalconFelt {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        FalconFelt(mq_add(self.0 as u32, rhs.0 as u32) as u16)
    }
}

impl AddAssign for FalconFelt {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for FalconFelt {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        FalconFelt(mq_sub(self.0 as u32, rhs.0 as u32) as u16)
    }
}

impl SubAssign for FalconFelt {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl Neg for FalconFelt {
    type Output = FalconFelt;

    fn neg(self) -> Self::Output {
        // In internal representation negation is q - x, except that zero (stored as q) stays q.
        let x = self.0 as u32;
        FalconFelt((Q - x + Q * ((x == Q) as u32)) as u16)
    }
}

impl Mul for FalconFelt {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        // The extra factor R2 cancels the 1/R introduced by Montgomery reduction.
        FalconFelt(mq_mmul(mq_mmul(self.0 as u32, rhs.0 as u32), R2) as u16)
    }
}

impl MulAssign for FalconFelt {
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

impl Div for FalconFelt {
    type Output = FalconFelt;

    #[allow(clippy::suspicious_arithmetic_impl)]
    fn div(self, rhs: Self) -> Self::Output {
        self * rhs.inverse_or_zero()
    }
}

impl DivAssign for FalconFelt {
    fn div_assign(&mut self, rhs: Self) {
        *self = *self / rhs
    }
}

impl Zero for FalconFelt {
    fn zero() -> Self {
        FalconFelt::new(0)
    }

    fn is_zero(&self) -> bool {
        self.0 == Q as u16
    }
}

impl One for FalconFelt {
    fn one() -> Self {
        FalconFelt::new(1)
    }
}

impl Inverse for FalconFelt {
    fn inverse_or_zero(self) -> Self {
        FalconFelt(mq_div(1, self.0 as u32) as u16)
    }
}

impl From<i16> for FalconFelt {
    fn from(value: i16) -> Self {
        FalconFelt::new(signed_to_external(value as i32))
    }
}

impl TryFrom<u32> for FalconFelt {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        if value >= MODULUS as u32 {
            Err(format!("value {value} is greater than or equal to the field modulus {MODULUS}"))
        } else {
            Ok(FalconFelt::new(value as u16))
        }
    }
}

// TESTS
// ================================================================================================
