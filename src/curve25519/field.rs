// Copyright 2019 Stichting Organism
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Arithmetic in GF(2^255 - 19).
//!
//! Elements are five unsigned 51 bit limbs, `x = sum(l[i] * 2^(51 i))`.
//! Every operation leaves each limb below 2^52 ("loosely reduced"); only
//! `to_bytes` produces the unique representative in `[0, p)`.
//!
//! Products are accumulated in `u128`. With loosely reduced inputs the
//! largest column sum stays below 2^111, so nothing here can overflow.

use core::ops::{Add, Mul, Neg, Sub};

use subtle::{Choice, ConditionallySelectable, ConstantTimeEq};
use zeroize::Zeroize;

const LOW_51_BIT_MASK: u64 = (1u64 << 51) - 1;

/// 16p, limb by limb. Added before subtracting so limbs never underflow.
const SIXTEEN_P: [u64; 5] = [
    36028797018963664,
    36028797018963952,
    36028797018963952,
    36028797018963952,
    36028797018963952,
];

/// An element of the field of the curve.
#[derive(Copy, Clone, Debug, Default)]
pub struct FieldElement(pub(crate) [u64; 5]);

/// Edwards `d = -121665/121666`.
pub(crate) const EDWARDS_D: FieldElement = FieldElement([
    929955233495203,
    466365720129213,
    1662059464998953,
    2033849074728123,
    1442794654840575,
]);

/// `2d`, used by the extended addition law.
pub(crate) const EDWARDS_D2: FieldElement = FieldElement([
    1859910466990425,
    932731440258426,
    1072319116312658,
    1815898335770999,
    633789495995903,
]);

/// A square root of -1.
pub(crate) const SQRT_M1: FieldElement = FieldElement([
    1718705420411056,
    234908883556509,
    2233514472574048,
    2117202627021982,
    765476049583133,
]);

#[inline(always)]
fn load8(input: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&input[..8]);
    u64::from_le_bytes(buf)
}

#[inline(always)]
fn m(x: u64, y: u64) -> u128 {
    (x as u128) * (y as u128)
}

impl FieldElement {
    /// Zero.
    pub const ZERO: FieldElement = FieldElement([0, 0, 0, 0, 0]);

    /// One.
    pub const ONE: FieldElement = FieldElement([1, 0, 0, 0, 0]);

    /// Carry every limb into the next, folding the top carry back with 19.
    #[inline(always)]
    fn weak_reduce(mut limbs: [u64; 5]) -> FieldElement {
        let c0 = limbs[0] >> 51;
        let c1 = limbs[1] >> 51;
        let c2 = limbs[2] >> 51;
        let c3 = limbs[3] >> 51;
        let c4 = limbs[4] >> 51;

        limbs[0] &= LOW_51_BIT_MASK;
        limbs[1] &= LOW_51_BIT_MASK;
        limbs[2] &= LOW_51_BIT_MASK;
        limbs[3] &= LOW_51_BIT_MASK;
        limbs[4] &= LOW_51_BIT_MASK;

        limbs[0] += c4 * 19;
        limbs[1] += c0;
        limbs[2] += c1;
        limbs[3] += c2;
        limbs[4] += c3;

        FieldElement(limbs)
    }

    /// Decode 32 little-endian bytes. The top bit is ignored, and values in
    /// `[p, 2^255)` are accepted as their residue; callers that need a
    /// canonical encoding compare against `to_bytes`.
    pub fn from_bytes(bytes: &[u8; 32]) -> FieldElement {
        FieldElement([
            load8(&bytes[0..]) & LOW_51_BIT_MASK,
            (load8(&bytes[6..]) >> 3) & LOW_51_BIT_MASK,
            (load8(&bytes[12..]) >> 6) & LOW_51_BIT_MASK,
            (load8(&bytes[19..]) >> 1) & LOW_51_BIT_MASK,
            (load8(&bytes[24..]) >> 12) & LOW_51_BIT_MASK,
        ])
    }

    /// Canonical little-endian encoding, the value fully reduced below p.
    pub fn to_bytes(&self) -> [u8; 32] {
        let mut limbs = FieldElement::weak_reduce(self.0).0;

        // q is 1 exactly when the value is at least p.
        let mut q = (limbs[0] + 19) >> 51;
        q = (limbs[1] + q) >> 51;
        q = (limbs[2] + q) >> 51;
        q = (limbs[3] + q) >> 51;
        q = (limbs[4] + q) >> 51;

        limbs[0] += 19 * q;

        limbs[1] += limbs[0] >> 51;
        limbs[0] &= LOW_51_BIT_MASK;
        limbs[2] += limbs[1] >> 51;
        limbs[1] &= LOW_51_BIT_MASK;
        limbs[3] += limbs[2] >> 51;
        limbs[2] &= LOW_51_BIT_MASK;
        limbs[4] += limbs[3] >> 51;
        limbs[3] &= LOW_51_BIT_MASK;
        // The carry out of the top limb is 2^255, which is the q*p we added 19 for.
        limbs[4] &= LOW_51_BIT_MASK;

        let mut out = [0u8; 32];
        let mut acc: u64 = 0;
        let mut bits: u32 = 0;
        let mut i = 0;
        for limb in limbs.iter() {
            acc |= *limb << bits;
            bits += 51;
            while bits >= 8 {
                out[i] = acc as u8;
                acc >>= 8;
                bits -= 8;
                i += 1;
            }
        }
        out[31] = acc as u8;
        out
    }

    /// `self * self`.
    #[inline]
    pub fn square(&self) -> FieldElement {
        self * self
    }

    /// `self^(2^k)`, k > 0.
    pub fn pow2k(&self, k: u32) -> FieldElement {
        debug_assert!(k > 0);
        let mut z = self.square();
        for _ in 1..k {
            z = z.square();
        }
        z
    }

    /// Returns `(self^(2^250 - 1), self^11)`, the shared prefix of the
    /// inversion and square root chains.
    fn pow22501(&self) -> (FieldElement, FieldElement) {
        let t0 = self.square(); // 2
        let t1 = t0.square().square(); // 8
        let t2 = self * &t1; // 9
        let t3 = &t0 * &t2; // 11
        let t4 = t3.square(); // 22
        let t5 = &t2 * &t4; // 2^5 - 1
        let t6 = t5.pow2k(5);
        let t7 = &t6 * &t5; // 2^10 - 1
        let t8 = t7.pow2k(10);
        let t9 = &t8 * &t7; // 2^20 - 1
        let t10 = t9.pow2k(20);
        let t11 = &t10 * &t9; // 2^40 - 1
        let t12 = t11.pow2k(10);
        let t13 = &t12 * &t7; // 2^50 - 1
        let t14 = t13.pow2k(50);
        let t15 = &t14 * &t13; // 2^100 - 1
        let t16 = t15.pow2k(100);
        let t17 = &t16 * &t15; // 2^200 - 1
        let t18 = t17.pow2k(50);
        let t19 = &t18 * &t13; // 2^250 - 1

        (t19, t3)
    }

    /// `self^(p - 2)`, the inverse for nonzero input. Zero maps to zero.
    pub fn invert(&self) -> FieldElement {
        let (t19, t3) = self.pow22501();
        let t20 = t19.pow2k(5); // 2^255 - 2^5
        &t20 * &t3 // 2^255 - 21
    }

    /// `self^((p - 5) / 8)`.
    pub fn pow_p58(&self) -> FieldElement {
        let (t19, _) = self.pow22501();
        let t20 = t19.pow2k(2); // 2^252 - 4
        self * &t20 // 2^252 - 3
    }

    /// The low bit of the canonical encoding.
    pub fn is_negative(&self) -> Choice {
        Choice::from(self.to_bytes()[0] & 1)
    }

    /// Whether this is zero in the field.
    pub fn is_zero(&self) -> Choice {
        self.to_bytes().ct_eq(&[0u8; 32])
    }

    /// Negate when `choice` is set, in constant time.
    pub fn conditional_negate(&mut self, choice: Choice) {
        let negated = -&*self;
        self.conditional_assign(&negated, choice);
    }
}

impl ConstantTimeEq for FieldElement {
    fn ct_eq(&self, other: &FieldElement) -> Choice {
        self.to_bytes().ct_eq(&other.to_bytes())
    }
}

impl PartialEq for FieldElement {
    fn eq(&self, other: &FieldElement) -> bool {
        self.ct_eq(other).into()
    }
}

impl Eq for FieldElement {}

impl ConditionallySelectable for FieldElement {
    fn conditional_select(a: &FieldElement, b: &FieldElement, choice: Choice) -> FieldElement {
        FieldElement([
            u64::conditional_select(&a.0[0], &b.0[0], choice),
            u64::conditional_select(&a.0[1], &b.0[1], choice),
            u64::conditional_select(&a.0[2], &b.0[2], choice),
            u64::conditional_select(&a.0[3], &b.0[3], choice),
            u64::conditional_select(&a.0[4], &b.0[4], choice),
        ])
    }
}

impl Zeroize for FieldElement {
    fn zeroize(&mut self) {
        self.0.zeroize();
    }
}

impl<'a, 'b> Add<&'b FieldElement> for &'a FieldElement {
    type Output = FieldElement;

    fn add(self, rhs: &'b FieldElement) -> FieldElement {
        let a = &self.0;
        let b = &rhs.0;
        FieldElement::weak_reduce([a[0] + b[0], a[1] + b[1], a[2] + b[2], a[3] + b[3], a[4] + b[4]])
    }
}

impl<'a, 'b> Sub<&'b FieldElement> for &'a FieldElement {
    type Output = FieldElement;

    fn sub(self, rhs: &'b FieldElement) -> FieldElement {
        let a = &self.0;
        let b = &rhs.0;
        FieldElement::weak_reduce([
            (a[0] + SIXTEEN_P[0]) - b[0],
            (a[1] + SIXTEEN_P[1]) - b[1],
            (a[2] + SIXTEEN_P[2]) - b[2],
            (a[3] + SIXTEEN_P[3]) - b[3],
            (a[4] + SIXTEEN_P[4]) - b[4],
        ])
    }
}

impl<'a, 'b> Mul<&'b FieldElement> for &'a FieldElement {
    type Output = FieldElement;

    fn mul(self, rhs: &'b FieldElement) -> FieldElement {
        let a = &self.0;
        let b = &rhs.0;

        // 2^255 = 19 (mod p), so limbs that wrap past the top pick up a 19.
        let b1_19 = b[1] * 19;
        let b2_19 = b[2] * 19;
        let b3_19 = b[3] * 19;
        let b4_19 = b[4] * 19;

        let c0 = m(a[0], b[0]) + m(a[4], b1_19) + m(a[3], b2_19) + m(a[2], b3_19) + m(a[1], b4_19);
        let mut c1 = m(a[1], b[0]) + m(a[0], b[1]) + m(a[4], b2_19) + m(a[3], b3_19) + m(a[2], b4_19);
        let mut c2 = m(a[2], b[0]) + m(a[1], b[1]) + m(a[0], b[2]) + m(a[4], b3_19) + m(a[3], b4_19);
        let mut c3 = m(a[3], b[0]) + m(a[2], b[1]) + m(a[1], b[2]) + m(a[0], b[3]) + m(a[4], b4_19);
        let mut c4 = m(a[4], b[0]) + m(a[3], b[1]) + m(a[2], b[2]) + m(a[1], b[3]) + m(a[0], b[4]);

        let mut out = [0u64; 5];

        c1 += c0 >> 51;
        out[0] = (c0 as u64) & LOW_51_BIT_MASK;
        c2 += c1 >> 51;
        out[1] = (c1 as u64) & LOW_51_BIT_MASK;
        c3 += c2 >> 51;
        out[2] = (c2 as u64) & LOW_51_BIT_MASK;
        c4 += c3 >> 51;
        out[3] = (c3 as u64) & LOW_51_BIT_MASK;

        let carry = (c4 >> 51) as u64;
        out[4] = (c4 as u64) & LOW_51_BIT_MASK;

        out[0] += carry * 19;
        out[1] += out[0] >> 51;
        out[0] &= LOW_51_BIT_MASK;

        FieldElement(out)
    }
}

impl<'a> Neg for &'a FieldElement {
    type Output = FieldElement;

    fn neg(self) -> FieldElement {
        &FieldElement::ZERO - self
    }
}

macro_rules! by_value_ops {
    ($($tr:ident, $f:ident);*) => {$(
        impl $tr<FieldElement> for FieldElement {
            type Output = FieldElement;

            #[inline]
            fn $f(self, rhs: FieldElement) -> FieldElement {
                (&self).$f(&rhs)
            }
        }
    )*};
}

by_value_ops!(Add, add; Sub, sub; Mul, mul);

impl Neg for FieldElement {
    type Output = FieldElement;

    fn neg(self) -> FieldElement {
        -&self
    }
}
