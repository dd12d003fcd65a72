use crate::utils::bitset::BitSet;
use rand::prelude::*;

type Set = BitSet<u64, 2>;

#[test]
fn matches_a_sorted_list() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for _ in 0..100 {
        let mut indices: Vec<usize> = (0..rng.gen_range(1..200)).map(|_| rng.gen_range(0..1000)).collect();
        indices.sort_unstable();
        indices.dedup();

        let mut set = Set::with_capacity(64);
        for &i in &indices {
            set.set(i, true);
        }
        for i in 0..1024 {
            assert_eq!(set.get(i), indices.binary_search(&i).is_ok(), "{i}");
        }

        for &i in indices.iter().step_by(2) {
            set.set(i, false);
        }
        for (n, &i) in indices.iter().enumerate() {
            assert_eq!(set.get(i), n % 2 == 1);
        }
    }
}

#[test]
fn clearing_never_grows() {
    let mut set = Set::with_capacity(10);
    assert_eq!(set.words(), 1);
    set.set(500, false);
    assert_eq!(set.words(), 1);
    assert!(!set.get(500));
    set.set(130, true);
    assert_eq!(set.words(), 3);
    assert!(set.get(130));
    assert!(!set.get(129) && !set.get(131));
}

#[test]
fn word_boundaries() {
    let mut set = Set::with_capacity(128);
    for i in [0, 63, 64, 127] {
        set.set(i, true);
    }
    assert!(set.get(63) && set.get(64));
    assert!(!set.get(62) && !set.get(65));
    set.set(64, false);
    assert!(set.get(63) && !set.get(64) && set.get(127));
    assert_eq!(set.clone(), set);
}
