use num_traits::PrimInt;
use smallvec::SmallVec;

/// A growable set of bond or atom indices, stored inline for up to `N` words
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BitSet<T, const N: usize>(SmallVec<T, N>);
impl<T: PrimInt, const N: usize> BitSet<T, N> {
    /// Bits per word
    #[inline]
    fn width() -> usize {
        T::zero().count_zeros() as usize
    }

    /// An empty set with room for indices below `cap`
    pub fn with_capacity(cap: usize) -> Self {
        let len = cap.div_ceil(Self::width());
        Self(SmallVec::from_elem(T::zero(), len))
    }
    /// Number of words currently allocated
    pub fn words(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, idx: usize) -> bool {
        let w = Self::width();
        self.0
            .get(idx / w)
            .is_some_and(|&word| word & (T::one() << (idx % w)) != T::zero())
    }
    /// Clearing an index past the end is a no-op, setting one grows the set
    pub fn set(&mut self, idx: usize, bit: bool) {
        let w = Self::width();
        let (word, offset) = (idx / w, idx % w);
        if word >= self.0.len() {
            if !bit {
                return;
            }
            self.0.resize(word + 1, T::zero());
        }
        let mask = T::one() << offset;
        let current = self.0[word];
        self.0[word] = if bit { current | mask } else { current & !mask };
    }
}
