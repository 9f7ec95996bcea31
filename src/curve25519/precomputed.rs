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

//! Base point tables and the two scalar multiplications signing needs.
//!
//! `mul_base` is constant time: a signed radix 16 recoding of the scalar
//! picks one of eight multiples of `16^(2i) B` per digit with a masked scan
//! of the whole row. `vartime_double_scalar_mul_basepoint` is for
//! verification only, where every input is public.
//!
//! Both tables are built on first use.

use once_cell::sync::Lazy;
use subtle::{Choice, ConditionallySelectable, ConstantTimeEq};

use super::point::{EdwardsPoint, NielsPoint, ED25519_BASEPOINT};
use super::scalar::Scalar;

/// `BASE_TABLE[i][j] = (j + 1) * 16^(2i) * B`.
static BASE_TABLE: Lazy<Vec<[NielsPoint; 8]>> = Lazy::new(|| {
    let mut table = Vec::with_capacity(32);
    let mut row_base = ED25519_BASEPOINT;
    for _ in 0..32 {
        let mut row = [NielsPoint::identity(); 8];
        let mut multiple = row_base;
        for entry in row.iter_mut() {
            *entry = multiple.to_niels();
            multiple = &multiple + &row_base;
        }
        table.push(row);
        row_base = row_base.mul_by_pow_2(8);
    }
    tracing::debug!("built fixed base table");
    table
});

/// The odd multiples `B, 3B, 5B, .., 63B`.
static BASE_ODD_MULTIPLES: Lazy<Vec<NielsPoint>> = Lazy::new(|| {
    let b2 = ED25519_BASEPOINT.double();
    let mut p = ED25519_BASEPOINT;
    let mut out = Vec::with_capacity(32);
    for _ in 0..32 {
        out.push(p.to_niels());
        p = &p + &b2;
    }
    out
});

/// Digits `e[i]` in `[-8, 8]` with `sum(e[i] 16^i)` equal to the input.
/// The top byte of the input must be at most 127.
fn to_radix_16(bytes: &[u8; 32]) -> [i8; 64] {
    let mut e = [0i8; 64];
    for i in 0..32 {
        e[2 * i] = (bytes[i] & 15) as i8;
        e[2 * i + 1] = ((bytes[i] >> 4) & 15) as i8;
    }

    let mut carry = 0i8;
    for digit in e.iter_mut().take(63) {
        *digit += carry;
        carry = (*digit + 8) >> 4;
        *digit -= carry << 4;
    }
    e[63] += carry;
    e
}

/// `|b| * 16^(2 pos) B`, negated when `b < 0`, without branching on `b`.
fn select(pos: usize, b: i8) -> NielsPoint {
    let negative = (b as u8) >> 7;
    let mask = b >> 7;
    let abs = ((b + mask) ^ mask) as u8;

    let mut t = NielsPoint::identity();
    for (j, entry) in BASE_TABLE[pos].iter().enumerate() {
        t.conditional_assign(entry, abs.ct_eq(&(j as u8 + 1)));
    }
    t.conditional_negate(Choice::from(negative));
    t
}

/// `s * B` in constant time.
pub fn mul_base(s: &Scalar) -> EdwardsPoint {
    let mut bytes = s.to_bytes();
    if bytes[31] > 127 {
        // only unreduced scalars get here
        bytes = Scalar::from_bytes_mod_order(bytes).to_bytes();
    }
    let e = to_radix_16(&bytes);

    let mut h = EdwardsPoint::identity();
    for i in (1..64).step_by(2) {
        h = h.add_niels(&select(i / 2, e[i]));
    }
    h = h.mul_by_pow_2(4);
    for i in (0..64).step_by(2) {
        h = h.add_niels(&select(i / 2, e[i]));
    }
    h
}

/// Sliding window recoding: nonzero digits are odd with absolute value at
/// most `2^(w-1) - 1`, and any two of them are at least `w` positions apart.
fn slide(s: &[u8; 32], w: u32) -> [i8; 256] {
    let mut r = [0i16; 256];
    for (i, digit) in r.iter_mut().enumerate() {
        *digit = ((s[i >> 3] >> (i & 7)) & 1) as i16;
    }

    let m: i16 = (1 << (w - 1)) - 1;
    for i in 0..256 {
        if r[i] == 0 {
            continue;
        }
        let mut b = 1;
        while b <= 6 && i + b < 256 {
            if r[i + b] != 0 {
                let shifted = r[i + b] << b;
                if r[i] + shifted <= m {
                    r[i] += shifted;
                    r[i + b] = 0;
                } else if r[i] - shifted >= -m {
                    r[i] -= shifted;
                    for k in i + b..256 {
                        if r[k] == 0 {
                            r[k] = 1;
                            break;
                        }
                        r[k] = 0;
                    }
                } else {
                    break;
                }
            }
            b += 1;
        }
    }

    let mut out = [0i8; 256];
    for (o, digit) in out.iter_mut().zip(r.iter()) {
        *o = *digit as i8;
    }
    out
}

/// `a * A + b * B` in variable time.
#[allow(non_snake_case)]
pub fn vartime_double_scalar_mul_basepoint(a: &Scalar, A: &EdwardsPoint, b: &Scalar) -> EdwardsPoint {
    let a_naf = slide(&a.to_bytes(), 5);
    let b_naf = slide(&b.to_bytes(), 7);

    // A, 3A, 5A, .., 15A
    let A2 = A.double();
    let mut odd_A = Vec::with_capacity(8);
    let mut p = *A;
    odd_A.push(p.to_cached());
    for _ in 0..7 {
        p = &p + &A2;
        odd_A.push(p.to_cached());
    }

    let table_B = &*BASE_ODD_MULTIPLES;

    let mut i: usize = 255;
    while i > 0 && a_naf[i] == 0 && b_naf[i] == 0 {
        i -= 1;
    }

    let mut r = EdwardsPoint::identity();
    loop {
        r = r.double();

        match a_naf[i] {
            d if d > 0 => r = r.add_cached(&odd_A[(d / 2) as usize]),
            d if d < 0 => r = r.sub_cached(&odd_A[(-d / 2) as usize]),
            _ => {}
        }

        match b_naf[i] {
            d if d > 0 => r = r.add_niels(&table_B[(d / 2) as usize]),
            d if d < 0 => r = r.sub_niels(&table_B[(-d / 2) as usize]),
            _ => {}
        }

        if i == 0 {
            break;
        }
        i -= 1;
    }

    r
}
