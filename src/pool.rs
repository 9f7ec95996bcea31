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

//! Scratch memory for key material.
//!
//! A `ScratchPool` hands out 32 byte buffers and big integers and takes them
//! back when the guard drops. Everything returned to the pool is wiped first,
//! so whatever secret a buffer held never reaches its next user.

use std::ops::{Deref, DerefMut};
use std::sync::Mutex;

use num_bigint::BigUint;
use zeroize::Zeroize;

/// Buffers kept per free list; extra returns are dropped after wiping.
const MAX_IDLE: usize = 64;

/// Thread safe free lists of scratch values.
#[derive(Debug, Default)]
pub struct ScratchPool {
    bytes: Mutex<Vec<Box<[u8; 32]>>>,
    bigs: Mutex<Vec<BigUint>>,
}

impl ScratchPool {
    /// An empty pool.
    pub fn new() -> ScratchPool {
        ScratchPool::default()
    }

    /// Take a zeroed 32 byte buffer.
    pub fn bytes32(&self) -> PooledBytes<'_> {
        let buf = match self.bytes.lock() {
            Ok(mut free) => free.pop(),
            Err(_) => None,
        };
        PooledBytes {
            pool: self,
            buf: Some(buf.unwrap_or_else(|| Box::new([0u8; 32]))),
        }
    }

    /// Take a big integer holding zero.
    pub fn big(&self) -> PooledBig<'_> {
        let big = match self.bigs.lock() {
            Ok(mut free) => free.pop(),
            Err(_) => None,
        };
        PooledBig {
            pool: self,
            big: Some(big.unwrap_or_default()),
        }
    }

    /// Number of idle buffers and big integers.
    pub fn idle(&self) -> (usize, usize) {
        let bytes = self.bytes.lock().map(|free| free.len()).unwrap_or(0);
        let bigs = self.bigs.lock().map(|free| free.len()).unwrap_or(0);
        (bytes, bigs)
    }

    fn put_bytes(&self, mut buf: Box<[u8; 32]>) {
        buf.zeroize();
        if let Ok(mut free) = self.bytes.lock() {
            if free.len() < MAX_IDLE {
                free.push(buf);
            }
        }
        tracing::trace!("returned 32 byte scratch buffer");
    }

    fn put_big(&self, mut big: BigUint) {
        wipe_big(&mut big);
        if let Ok(mut free) = self.bigs.lock() {
            if free.len() < MAX_IDLE {
                free.push(big);
            }
        }
        tracing::trace!("returned big integer scratch");
    }
}

/// Overwrite the digits of `big` in place, then leave it at zero.
///
/// `assign_from_slice` rewrites the existing digit storage before normalizing,
/// so the old limbs are replaced by zeros rather than merely truncated.
fn wipe_big(big: &mut BigUint) {
    let words = ((big.bits() + 31) / 32) as usize;
    if words > 0 {
        big.assign_from_slice(&vec![0u32; words]);
    }
}

/// A pooled 32 byte buffer, wiped and returned on drop.
pub struct PooledBytes<'a> {
    pool: &'a ScratchPool,
    buf: Option<Box<[u8; 32]>>,
}

impl<'a> Deref for PooledBytes<'a> {
    type Target = [u8; 32];

    fn deref(&self) -> &[u8; 32] {
        match self.buf {
            Some(ref buf) => buf,
            None => unreachable!("buffer is only taken on drop"),
        }
    }
}

impl<'a> DerefMut for PooledBytes<'a> {
    fn deref_mut(&mut self) -> &mut [u8; 32] {
        match self.buf {
            Some(ref mut buf) => buf,
            None => unreachable!("buffer is only taken on drop"),
        }
    }
}

impl<'a> Drop for PooledBytes<'a> {
    fn drop(&mut self) {
        if let Some(buf) = self.buf.take() {
            self.pool.put_bytes(buf);
        }
    }
}

/// A pooled big integer, wiped and returned on drop.
pub struct PooledBig<'a> {
    pool: &'a ScratchPool,
    big: Option<BigUint>,
}

impl<'a> Deref for PooledBig<'a> {
    type Target = BigUint;

    fn deref(&self) -> &BigUint {
        match self.big {
            Some(ref big) => big,
            None => unreachable!("integer is only taken on drop"),
        }
    }
}

impl<'a> DerefMut for PooledBig<'a> {
    fn deref_mut(&mut self) -> &mut BigUint {
        match self.big {
            Some(ref mut big) => big,
            None => unreachable!("integer is only taken on drop"),
        }
    }
}

impl<'a> Drop for PooledBig<'a> {
    fn drop(&mut self) {
        if let Some(big) = self.big.take() {
            self.pool.put_big(big);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn buffers_come_back_zeroed() {
        let pool = ScratchPool::new();
        {
            let mut buf = pool.bytes32();
            buf.copy_from_slice(&[0xa5u8; 32]);
        }
        assert_eq!(pool.idle(), (1, 0));
        let buf = pool.bytes32();
        assert_eq!(*buf, [0u8; 32]);
        assert_eq!(pool.idle(), (0, 0));
    }

    #[test]
    fn big_integers_come_back_zeroed() {
        let pool = ScratchPool::new();
        {
            let mut big = pool.big();
            *big = BigUint::from_bytes_be(&[0xffu8; 66]);
        }
        let big = pool.big();
        assert_eq!(*big, BigUint::default());
    }

    #[test]
    fn wipe_big_clears_value() {
        let mut big = BigUint::from_bytes_be(&[0x11u8; 40]);
        wipe_big(&mut big);
        assert_eq!(big.bits(), 0);
    }

    #[test]
    fn pool_is_shared_between_threads() {
        let pool = std::sync::Arc::new(ScratchPool::new());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let pool = pool.clone();
                std::thread::spawn(move || {
                    let mut buf = pool.bytes32();
                    buf[0] = i as u8 + 1;
                    assert_eq!(buf[1..], [0u8; 31]);
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        let (bytes, _) = pool.idle();
        assert!(bytes >= 1 && bytes <= 4);
    }
}
