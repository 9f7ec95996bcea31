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

//! Integers modulo the group order
//! `L = 2^252 + 27742317777372353535851937790883648493`.
//!
//! A `Scalar` is five 56 bit limbs (seven bytes each). Values built by
//! arithmetic are always fully reduced. `Scalar::from_bits` is the one
//! exception: it keeps a raw 256 bit value, which is what Ed25519 needs
//! for the clamped secret.
//!
//! Reduction is Barrett's algorithm (HAC 14.42) with base 2^56 and k = 5,
//! finishing with two constant time conditional subtractions of L.

use core::fmt::Debug;
use core::ops::{Add, Mul};

use rand::{CryptoRng, RngCore};
use subtle::{Choice, ConstantTimeEq};
use zeroize::Zeroize;

const MASK_56: u64 = (1u64 << 56) - 1;

/// The group order in 56 bit limbs.
const L: [u64; 5] = [0x12631a5cf5d3ed, 0xf9dea2f79cd658, 0x14de, 0x0, 0x10000000];

/// `floor(2^560 / L)`.
const MU: [u64; 6] = [
    0x1b399411b7c309,
    0xed9ce5a30a2c13,
    0x6215d086329a7,
    0xffffffffffeb21,
    0xffffffffffffff,
    0xfffffff,
];

#[inline(always)]
fn load7(input: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf[..7].copy_from_slice(&input[..7]);
    u64::from_le_bytes(buf)
}

/// Schoolbook product, truncated to `out.len()` limbs. Inputs must be
/// 56 bit normalized; the output is.
fn mul_limbs(a: &[u64], b: &[u64], out: &mut [u64]) {
    let mut carry: u128 = 0;
    for k in 0..out.len() {
        let mut acc = carry;
        for (i, ai) in a.iter().enumerate() {
            if k >= i && k - i < b.len() {
                acc += (*ai as u128) * (b[k - i] as u128);
            }
        }
        out[k] = (acc as u64) & MASK_56;
        carry = acc >> 56;
    }
}

/// `a - b` over six limbs, returning the borrow out of the top.
fn sub_limbs(a: &[u64; 6], b: &[u64; 6]) -> ([u64; 6], u64) {
    let mut out = [0u64; 6];
    let mut borrow = 0u64;
    for i in 0..6 {
        let t = a[i].wrapping_sub(b[i]).wrapping_sub(borrow);
        borrow = t >> 63;
        out[i] = t & MASK_56;
    }
    (out, borrow)
}

/// Subtract L unless that would go negative.
fn conditional_sub_l(r: &[u64; 6]) -> [u64; 6] {
    let l = [L[0], L[1], L[2], L[3], L[4], 0];
    let (t, borrow) = sub_limbs(r, &l);
    // all ones when the subtraction did not borrow
    let mask = borrow.wrapping_sub(1);
    let mut out = [0u64; 6];
    for i in 0..6 {
        out[i] = (t[i] & mask) | (r[i] & !mask);
    }
    out
}

/// Reduce a 560 bit value held in ten normalized limbs.
fn reduce_wide(x: &[u64; 10]) -> Scalar {
    let mut q2 = [0u64; 12];
    mul_limbs(&x[4..10], &MU, &mut q2);

    let mut r2 = [0u64; 6];
    mul_limbs(&q2[6..12], &L, &mut r2);

    let mut r1 = [0u64; 6];
    r1.copy_from_slice(&x[0..6]);

    // The true remainder is below 3L, so the wrap of r1 - r2 mod 2^336 is harmless.
    let (r, _) = sub_limbs(&r1, &r2);
    let r = conditional_sub_l(&r);
    let r = conditional_sub_l(&r);

    Scalar([r[0], r[1], r[2], r[3], r[4]])
}

/// An element of the scalar field of the Ed25519 group.
#[derive(Copy, Clone, Default)]
pub struct Scalar(pub(crate) [u64; 5]);

impl Debug for Scalar {
    fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
        write!(f, "Scalar{{ bytes: {:?} }}", &self.to_bytes())
    }
}

impl Scalar {
    /// Zero.
    pub const ZERO: Scalar = Scalar([0, 0, 0, 0, 0]);

    /// One.
    pub const ONE: Scalar = Scalar([1, 0, 0, 0, 0]);

    /// Take 32 bytes as an integer below 2^256, without reducing.
    pub fn from_bits(bytes: &[u8; 32]) -> Scalar {
        let mut top = [0u8; 4];
        top.copy_from_slice(&bytes[28..32]);
        Scalar([
            load7(&bytes[0..]),
            load7(&bytes[7..]),
            load7(&bytes[14..]),
            load7(&bytes[21..]),
            u32::from_le_bytes(top) as u64,
        ])
    }

    /// Reduce up to 64 little-endian bytes modulo L. Longer input is
    /// truncated to its first 64 bytes.
    pub fn from_bytes_mod_order_wide(input: &[u8]) -> Scalar {
        let mut wide = [0u8; 70];
        let n = input.len().min(64);
        wide[..n].copy_from_slice(&input[..n]);

        let mut limbs = [0u64; 10];
        for (i, limb) in limbs.iter_mut().enumerate() {
            *limb = load7(&wide[7 * i..]);
        }
        wide.zeroize();

        let s = reduce_wide(&limbs);
        limbs.zeroize();
        s
    }

    /// Reduce 32 little-endian bytes modulo L.
    pub fn from_bytes_mod_order(bytes: [u8; 32]) -> Scalar {
        Scalar::from_bytes_mod_order_wide(&bytes)
    }

    /// Accept 32 bytes only if they encode an integer below L.
    pub fn from_canonical_bytes(bytes: [u8; 32]) -> Option<Scalar> {
        let s = Scalar::from_bytes_mod_order(bytes);
        if bool::from(s.to_bytes().ct_eq(&bytes)) {
            Some(s)
        } else {
            None
        }
    }

    /// Whether `bytes` is the canonical encoding of a scalar.
    pub fn is_canonical(bytes: &[u8; 32]) -> bool {
        Scalar::from_canonical_bytes(*bytes).is_some()
    }

    /// A uniformly distributed scalar from 64 random bytes.
    pub fn random<R>(csprng: &mut R) -> Scalar
    where
        R: RngCore + CryptoRng,
    {
        let mut wide = [0u8; 64];
        csprng.fill_bytes(&mut wide);
        let s = Scalar::from_bytes_mod_order_wide(&wide);
        wide.zeroize();
        s
    }

    /// Little-endian encoding.
    pub fn to_bytes(&self) -> [u8; 32] {
        let mut buf = [0u8; 35];
        for (i, limb) in self.0.iter().enumerate() {
            buf[7 * i..7 * i + 7].copy_from_slice(&(limb & MASK_56).to_le_bytes()[..7]);
        }
        let mut out = [0u8; 32];
        out.copy_from_slice(&buf[..32]);
        buf.zeroize();
        out
    }

    /// `a * b + c mod L`.
    pub fn mul_add(a: &Scalar, b: &Scalar, c: &Scalar) -> Scalar {
        let mut wide = [0u64; 10];
        mul_limbs(&a.0, &b.0, &mut wide);

        let mut carry = 0u64;
        for (i, w) in wide.iter_mut().enumerate() {
            let addend = if i < 5 { c.0[i] } else { 0 };
            let t = *w + addend + carry;
            *w = t & MASK_56;
            carry = t >> 56;
        }

        let s = reduce_wide(&wide);
        wide.zeroize();
        s
    }
}

impl<'a, 'b> Mul<&'b Scalar> for &'a Scalar {
    type Output = Scalar;

    fn mul(self, rhs: &'b Scalar) -> Scalar {
        let mut wide = [0u64; 10];
        mul_limbs(&self.0, &rhs.0, &mut wide);
        let s = reduce_wide(&wide);
        wide.zeroize();
        s
    }
}

impl<'a, 'b> Add<&'b Scalar> for &'a Scalar {
    type Output = Scalar;

    fn add(self, rhs: &'b Scalar) -> Scalar {
        let mut wide = [0u64; 10];
        let mut carry = 0u64;
        for i in 0..5 {
            let t = self.0[i] + rhs.0[i] + carry;
            wide[i] = t & MASK_56;
            carry = t >> 56;
        }
        wide[5] = carry;
        reduce_wide(&wide)
    }
}

impl ConstantTimeEq for Scalar {
    fn ct_eq(&self, other: &Scalar) -> Choice {
        self.to_bytes().ct_eq(&other.to_bytes())
    }
}

impl PartialEq for Scalar {
    fn eq(&self, other: &Scalar) -> bool {
        self.ct_eq(other).into()
    }
}

impl Eq for Scalar {}

impl Zeroize for Scalar {
    fn zeroize(&mut self) {
        self.0.zeroize();
    }
}
