// Copyright 2025 the Soma authors
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

//! Implements a small bitset over numeric component tags.

/// A simple bitset wrapped around a `Vec<u64>`.
///
/// Entity records keep one of these over their numeric tags, and queries
/// whose referenced tags are all numeric compile their predicate into
/// bitmask tests against it. String tags never contribute bits; predicates
/// touching them take the set-lookup path instead.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TagBitset {
    bits: Vec<u64>,
}

impl TagBitset {
    /// Creates a new, empty bitset.
    pub fn new() -> Self {
        Self { bits: Vec::new() }
    }

    /// Sets the bit at the specified index to 1.
    pub fn set(&mut self, index: u32) {
        let word_idx = (index / 64) as usize;
        let bit_idx = index % 64;

        // Ensure the vector is large enough to hold the bit.
        if word_idx >= self.bits.len() {
            self.bits.resize(word_idx + 1, 0);
        }

        self.bits[word_idx] |= 1 << bit_idx;
    }

    /// Clears the bit at the specified index to 0.
    pub fn clear(&mut self, index: u32) {
        let word_idx = (index / 64) as usize;
        let bit_idx = index % 64;

        if word_idx < self.bits.len() {
            self.bits[word_idx] &= !(1 << bit_idx);
        }
    }

    /// Returns true if the bit at the specified index is set.
    pub fn is_set(&self, index: u32) -> bool {
        let word_idx = (index / 64) as usize;
        let bit_idx = index % 64;

        if let Some(word) = self.bits.get(word_idx) {
            (word & (1 << bit_idx)) != 0
        } else {
            false
        }
    }

    /// Returns true if every bit set in `other` is also set in `self`.
    ///
    /// This is the AND half of a compiled predicate: `other` is the mask of
    /// required tags.
    pub fn contains_all(&self, other: &TagBitset) -> bool {
        for (word_idx, word) in other.bits.iter().enumerate() {
            let own = self.bits.get(word_idx).copied().unwrap_or(0);
            if own & word != *word {
                return false;
            }
        }
        true
    }

    /// Returns true if at least one bit is set in both `self` and `other`.
    ///
    /// This is the OR half of a compiled predicate: `other` is the mask of
    /// alternatives, of which one must be present.
    pub fn intersects(&self, other: &TagBitset) -> bool {
        let len = self.bits.len().min(other.bits.len());
        for word_idx in 0..len {
            if self.bits[word_idx] & other.bits[word_idx] != 0 {
                return true;
            }
        }
        false
    }
}
