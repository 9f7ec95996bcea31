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

//! Edwards25519 group arithmetic used by Ed25519 and collective signing.

pub mod field;
pub mod point;
pub mod precomputed;
pub mod scalar;

pub use self::point::{EdwardsPoint, ED25519_BASEPOINT};
pub use self::precomputed::{mul_base, vartime_double_scalar_mul_basepoint};
pub use self::scalar::Scalar;
