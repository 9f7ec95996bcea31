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

//! Points on the twisted Edwards curve `-x^2 + y^2 = 1 + d x^2 y^2`.
//!
//! `EdwardsPoint` holds extended coordinates `(X : Y : Z : T)` with
//! `x = X/Z`, `y = Y/Z` and `T = XY/Z`. Additions go through one of two
//! precomputed forms of the right hand operand:
//!
//! * `CachedPoint` is `(Y+X, Y-X, Z, 2dT)`, for points that change per call;
//! * `NielsPoint` is the affine `(y+x, y-x, 2dxy)`, for fixed tables.
//!
//! Encoding is the usual 32 bytes: `y` little-endian with the sign of `x`
//! in the top bit. Decoding is strict and refuses non-canonical `y`.

use core::ops::{Add, Neg, Sub};

use subtle::{Choice, ConditionallySelectable, ConstantTimeEq};
use zeroize::Zeroize;

use super::field::{FieldElement, EDWARDS_D, EDWARDS_D2, SQRT_M1};

/// A point in extended twisted Edwards coordinates.
#[derive(Copy, Clone, Debug)]
#[allow(non_snake_case)]
pub struct EdwardsPoint {
    pub(crate) X: FieldElement,
    pub(crate) Y: FieldElement,
    pub(crate) Z: FieldElement,
    pub(crate) T: FieldElement,
}

/// `(Y+X, Y-X, Z, 2dT)` of an extended point.
#[derive(Copy, Clone, Debug)]
pub(crate) struct CachedPoint {
    y_plus_x: FieldElement,
    y_minus_x: FieldElement,
    z: FieldElement,
    t2d: FieldElement,
}

/// `(y+x, y-x, 2dxy)` of an affine point.
#[derive(Copy, Clone, Debug)]
pub(crate) struct NielsPoint {
    y_plus_x: FieldElement,
    y_minus_x: FieldElement,
    xy2d: FieldElement,
}

/// The Ed25519 base point, `y = 4/5` with positive `x`.
pub const ED25519_BASEPOINT: EdwardsPoint = EdwardsPoint {
    X: FieldElement([
        1738742601995546,
        1146398526822698,
        2070867633025821,
        562264141797630,
        587772402128613,
    ]),
    Y: FieldElement([
        1801439850948184,
        1351079888211148,
        450359962737049,
        900719925474099,
        1801439850948198,
    ]),
    Z: FieldElement::ONE,
    T: FieldElement([
        1841354044333475,
        16398895984059,
        755974180946558,
        900171276175154,
        1821297809914039,
    ]),
};

impl EdwardsPoint {
    /// The neutral element.
    pub fn identity() -> EdwardsPoint {
        EdwardsPoint {
            X: FieldElement::ZERO,
            Y: FieldElement::ONE,
            Z: FieldElement::ONE,
            T: FieldElement::ZERO,
        }
    }

    /// Encode as 32 bytes.
    pub fn compress(&self) -> [u8; 32] {
        let recip = self.Z.invert();
        let x = &self.X * &recip;
        let y = &self.Y * &recip;
        let mut s = y.to_bytes();
        s[31] ^= x.is_negative().unwrap_u8() << 7;
        s
    }

    /// Decode 32 bytes, or `None` if they are not the canonical encoding
    /// of a curve point.
    pub fn decompress(bytes: &[u8; 32]) -> Option<EdwardsPoint> {
        let y = FieldElement::from_bytes(bytes);

        let mut canonical = y.to_bytes();
        canonical[31] |= bytes[31] & 0x80;
        if !bool::from(canonical.ct_eq(bytes)) {
            return None;
        }
        let sign = Choice::from(bytes[31] >> 7);

        // x^2 = (y^2 - 1) / (d y^2 + 1) = u / v
        let yy = y.square();
        let u = &yy - &FieldElement::ONE;
        let v = &(&yy * &EDWARDS_D) + &FieldElement::ONE;

        let v3 = &v.square() * &v;
        let v7 = &v3.square() * &v;
        let mut x = &(&u * &v3) * &(&u * &v7).pow_p58();

        let vxx = &v * &x.square();
        let correct_root = vxx.ct_eq(&u);
        let flipped_root = vxx.ct_eq(&-&u);
        if !bool::from(correct_root | flipped_root) {
            return None;
        }
        let rotated = &x * &SQRT_M1;
        x.conditional_assign(&rotated, flipped_root & !correct_root);

        // x = 0 has one encoding only
        if bool::from(x.is_zero() & sign) {
            return None;
        }

        let flip = x.is_negative() ^ sign;
        x.conditional_negate(flip);

        Some(EdwardsPoint {
            X: x,
            Y: y,
            Z: FieldElement::ONE,
            T: &x * &y,
        })
    }

    /// `2 * self`.
    pub fn double(&self) -> EdwardsPoint {
        let a = self.X.square();
        let b = self.Y.square();
        let c = self.Z.square();
        let c = &c + &c;
        let h = &a + &b;
        let e = &h - &(&self.X + &self.Y).square();
        let g = &a - &b;
        let f = &c + &g;

        EdwardsPoint::from_efgh(&e, &f, &g, &h)
    }

    /// `2^k * self`.
    pub(crate) fn mul_by_pow_2(&self, k: u32) -> EdwardsPoint {
        let mut p = *self;
        for _ in 0..k {
            p = p.double();
        }
        p
    }

    /// Whether this is the neutral element.
    pub fn is_identity(&self) -> bool {
        self.ct_eq(&EdwardsPoint::identity()).into()
    }

    #[inline(always)]
    fn from_efgh(e: &FieldElement, f: &FieldElement, g: &FieldElement, h: &FieldElement) -> EdwardsPoint {
        EdwardsPoint {
            X: e * f,
            Y: g * h,
            Z: f * g,
            T: e * h,
        }
    }

    pub(crate) fn to_cached(&self) -> CachedPoint {
        CachedPoint {
            y_plus_x: &self.Y + &self.X,
            y_minus_x: &self.Y - &self.X,
            z: self.Z,
            t2d: &self.T * &EDWARDS_D2,
        }
    }

    pub(crate) fn to_niels(&self) -> NielsPoint {
        let recip = self.Z.invert();
        let x = &self.X * &recip;
        let y = &self.Y * &recip;
        NielsPoint {
            y_plus_x: &y + &x,
            y_minus_x: &y - &x,
            xy2d: &(&x * &y) * &EDWARDS_D2,
        }
    }

    pub(crate) fn add_cached(&self, other: &CachedPoint) -> EdwardsPoint {
        let a = &(&self.Y - &self.X) * &other.y_minus_x;
        let b = &(&self.Y + &self.X) * &other.y_plus_x;
        let c = &self.T * &other.t2d;
        let d = &(&self.Z + &self.Z) * &other.z;

        EdwardsPoint::from_efgh(&(&b - &a), &(&d - &c), &(&d + &c), &(&b + &a))
    }

    pub(crate) fn sub_cached(&self, other: &CachedPoint) -> EdwardsPoint {
        self.add_cached(&-other)
    }

    pub(crate) fn add_niels(&self, other: &NielsPoint) -> EdwardsPoint {
        let a = &(&self.Y - &self.X) * &other.y_minus_x;
        let b = &(&self.Y + &self.X) * &other.y_plus_x;
        let c = &self.T * &other.xy2d;
        let d = &self.Z + &self.Z;

        EdwardsPoint::from_efgh(&(&b - &a), &(&d - &c), &(&d + &c), &(&b + &a))
    }

    pub(crate) fn sub_niels(&self, other: &NielsPoint) -> EdwardsPoint {
        self.add_niels(&-other)
    }
}

impl NielsPoint {
    pub(crate) fn identity() -> NielsPoint {
        NielsPoint {
            y_plus_x: FieldElement::ONE,
            y_minus_x: FieldElement::ONE,
            xy2d: FieldElement::ZERO,
        }
    }

    /// Negate when `choice` is set, in constant time.
    pub(crate) fn conditional_negate(&mut self, choice: Choice) {
        FieldElement::conditional_swap(&mut self.y_plus_x, &mut self.y_minus_x, choice);
        self.xy2d.conditional_negate(choice);
    }
}

impl ConditionallySelectable for NielsPoint {
    fn conditional_select(a: &NielsPoint, b: &NielsPoint, choice: Choice) -> NielsPoint {
        NielsPoint {
            y_plus_x: FieldElement::conditional_select(&a.y_plus_x, &b.y_plus_x, choice),
            y_minus_x: FieldElement::conditional_select(&a.y_minus_x, &b.y_minus_x, choice),
            xy2d: FieldElement::conditional_select(&a.xy2d, &b.xy2d, choice),
        }
    }
}

impl<'a> Neg for &'a CachedPoint {
    type Output = CachedPoint;

    fn neg(self) -> CachedPoint {
        CachedPoint {
            y_plus_x: self.y_minus_x,
            y_minus_x: self.y_plus_x,
            z: self.z,
            t2d: -&self.t2d,
        }
    }
}

impl<'a> Neg for &'a NielsPoint {
    type Output = NielsPoint;

    fn neg(self) -> NielsPoint {
        NielsPoint {
            y_plus_x: self.y_minus_x,
            y_minus_x: self.y_plus_x,
            xy2d: -&self.xy2d,
        }
    }
}

impl<'a> Neg for &'a EdwardsPoint {
    type Output = EdwardsPoint;

    fn neg(self) -> EdwardsPoint {
        EdwardsPoint {
            X: -&self.X,
            Y: self.Y,
            Z: self.Z,
            T: -&self.T,
        }
    }
}

impl Neg for EdwardsPoint {
    type Output = EdwardsPoint;

    fn neg(self) -> EdwardsPoint {
        -&self
    }
}

impl<'a, 'b> Add<&'b EdwardsPoint> for &'a EdwardsPoint {
    type Output = EdwardsPoint;

    fn add(self, other: &'b EdwardsPoint) -> EdwardsPoint {
        self.add_cached(&other.to_cached())
    }
}

impl<'a, 'b> Sub<&'b EdwardsPoint> for &'a EdwardsPoint {
    type Output = EdwardsPoint;

    fn sub(self, other: &'b EdwardsPoint) -> EdwardsPoint {
        self.sub_cached(&other.to_cached())
    }
}

impl ConstantTimeEq for EdwardsPoint {
    fn ct_eq(&self, other: &EdwardsPoint) -> Choice {
        // x1/z1 == x2/z2 and y1/z1 == y2/z2, cleared of denominators
        let x1z2 = &self.X * &other.Z;
        let x2z1 = &other.X * &self.Z;
        let y1z2 = &self.Y * &other.Z;
        let y2z1 = &other.Y * &self.Z;

        x1z2.ct_eq(&x2z1) & y1z2.ct_eq(&y2z1)
    }
}

impl PartialEq for EdwardsPoint {
    fn eq(&self, other: &EdwardsPoint) -> bool {
        self.ct_eq(other).into()
    }
}

impl Eq for EdwardsPoint {}

impl Zeroize for EdwardsPoint {
    fn zeroize(&mut self) {
        self.X.zeroize();
        self.Y = FieldElement::ONE;
        self.Z = FieldElement::ONE;
        self.T.zeroize();
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn point(s: &str) -> EdwardsPoint {
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&hex::decode(s).unwrap());
        EdwardsPoint::decompress(&bytes).unwrap()
    }

    static ADD_INPUTS: [&str; 10] = [
        "6a62a6205507fcafe9ee43d6f8332a37144085f9ae454611263232ec771107c6",
        "f1bed61e1ecbce3f5c4f562a66d6d679749d3e1cd4ef9e36a909ff8e8b39858e",
        "01633d1be2a99e5a04b1e47c44f90336e15cb5dac62ced2f68f52b1e0911f454",
        "c9f7ec3ef931bd89f78e63b734e9d0bf3468a58e6fda16ca991645337d569e57",
        "f36b246bb8b88c397775ac1ad34606295cae333150ce2fc568e99a620f9d2b73",
        "d28d272dbfb761925541c14117cc3454b5f610df732518a1cab644c9277fe538",
        "6d0f36e2e942450340bbfcb96849fbe0fa97ad8e0b99bbee19e1a4caa6906e50",
        "4991cdf5856f465ca76735a2c341274bdb4b0a2b867dc25ed02f5c699cbcf872",
        "ad743c5f9f9d9e12bf31f3120580cc45cbec5edf5aba6457ed9433af279baccf",
        "c38f873d8b07fc976dd7d6611397d635b5879c90b271e649f14d2328435bc51e",
    ];

    static ADD_SUMS: [&str; 5] = [
        "36a1e8bcaba7d31818d953e5e3e4ac67e46537d7fafbb7a48205dac9e6a85933",
        "5c7b9402d615532cf60cb6aa2c2f1914b18aab56d739fa52d7df10a068cf6f77",
        "0af69aedf904813ad481e8770fb3d75c31814c3dec254b8d7d019656aad09979",
        "ba3a429d16a75037e59c0af7f7d456f12dd7782331783ebe44505ecbedfd208c",
        "4cfff383bf92fe6dcb070753b9a242eb36f9344b6e4abd3bd6e0539efd6fbe3d",
    ];

    #[test]
    fn basepoint_encoding() {
        let mut expected = [0x66u8; 32];
        expected[0] = 0x58;
        assert_eq!(ED25519_BASEPOINT.compress(), expected);
        assert_eq!(EdwardsPoint::decompress(&expected).unwrap(), ED25519_BASEPOINT);
    }

    #[test]
    fn identity_encoding() {
        let mut one = [0u8; 32];
        one[0] = 1;
        assert_eq!(EdwardsPoint::identity().compress(), one);
        assert!(EdwardsPoint::decompress(&one).unwrap().is_identity());

        // x = 0 with the sign bit set is a second encoding of the identity
        one[31] = 0x80;
        assert!(EdwardsPoint::decompress(&one).is_none());
    }

    #[test]
    fn addition_known_answers() {
        for (i, sum) in ADD_SUMS.iter().enumerate() {
            let a = point(ADD_INPUTS[2 * i]);
            let b = point(ADD_INPUTS[2 * i + 1]);
            assert_eq!(hex::encode((&a + &b).compress()), *sum);
            assert_eq!(hex::encode((-&(&-&a + &-&b)).compress()), *sum);
        }
    }

    #[test]
    fn encodings_round_trip() {
        for s in ADD_INPUTS.iter().chain(ADD_SUMS.iter()) {
            assert_eq!(hex::encode(point(s).compress()), *s);
        }
    }

    #[test]
    fn non_canonical_y_is_rejected() {
        // y = p + 1, which reduces to the identity's y
        let mut bytes = [0xffu8; 32];
        bytes[0] = 0xee;
        bytes[31] = 0x7f;
        assert!(EdwardsPoint::decompress(&bytes).is_none());
    }

    #[test]
    fn off_curve_is_rejected() {
        // y = 2 gives u/v = 3/(4d + 1), which is not a square
        let mut bytes = [0u8; 32];
        bytes[0] = 2;
        assert!(EdwardsPoint::decompress(&bytes).is_none());
    }

    #[test]
    fn double_is_add() {
        let b = ED25519_BASEPOINT;
        assert_eq!(b.double(), &b + &b);
        assert_eq!(b.mul_by_pow_2(3), &(&b.double() + &b.double()) + &b.double().double());
        assert!((&b - &b).is_identity());
    }

    #[test]
    fn mixed_addition_matches_extended() {
        let b = ED25519_BASEPOINT;
        let p = point(ADD_INPUTS[0]);
        assert_eq!(p.add_niels(&b.to_niels()), &p + &b);
        assert_eq!(p.sub_niels(&b.to_niels()), &p - &b);

        let mut n = b.to_niels();
        n.conditional_negate(Choice::from(1));
        assert_eq!(p.add_niels(&n), &p - &b);
    }
}
