//! Set algebra over address sets
//!
//! Every operation sweeps the ascending ranges of its operands in lock-step and returns a fresh
//! set, operands are never modified.
//!
//! Pieces cut out of maximal ranges stay apart from each other, so intersections, differences
//! and trims store them without merging. Only [`AddressSet::union`] and [`AddressSet::xor`]
//! merge, and fail with [`Error::Overflow`] when the merged range can't be counted.

use std::cmp::{max, Ordering};
use std::ops::{BitAnd, BitOr, BitXor, Sub};
use crate::{Address, AddressRange, AddressSet, Error, Ranges, Result};

impl<A: Address> AddressSet<A> {
    /// Get the intersection of the 2 sets, or in other words, the places where the sets overlap
    ///
    /// # Example
    ///
    /// ```rust
    /// use eater_addrset::address_set;
    ///
    /// let left = address_set![10u32 ..= 20, 30 ..= 40]?;
    /// let right = address_set![15 ..= 35]?;
    ///
    /// assert_eq!(address_set![15 ..= 20, 30 ..= 35]?, left.intersect(&right));
    /// # Ok::<(), eater_addrset::Error>(())
    /// ```
    pub fn intersect(&self, other: &AddressSet<A>) -> AddressSet<A> {
        let mut left_iter = self.address_ranges(true);
        let mut right_iter = other.address_ranges(true);

        let mut left = left_iter.next();
        let mut right = right_iter.next();

        let mut result = AddressSet::new();

        while let (Some(l), Some(r)) = (left, right) {
            if let Some(shared) = l.intersection(&r) {
                result.insert_disjoint(shared);
            }

            match l.end().cmp(&r.end()) {
                Ordering::Less => left = left_iter.next(),
                Ordering::Greater => right = right_iter.next(),
                Ordering::Equal => {
                    left = left_iter.next();
                    right = right_iter.next();
                }
            }
        }

        result
    }

    /// The addresses of this set that fall within `[start, end]`
    ///
    /// Inverted bounds aren't a valid query.
    pub fn intersect_range(&self, start: A, end: A) -> Result<AddressSet<A>> {
        if end < start {
            return Err(Error::UnsupportedQuery("intersection bounds are inverted"));
        }

        let query = AddressRange::between(start, end);
        let floor = self.tree.find_floor(&start);
        let cursor = if floor.is_nil() { self.tree.first() } else { floor };

        let mut result = AddressSet::new();
        for range in Ranges::starting_at(&self.tree, cursor, true) {
            if range.start() > end {
                break;
            }

            if let Some(shared) = range.intersection(&query) {
                result.insert_disjoint(shared);
            }
        }

        Ok(result)
    }

    /// Create an union of this set and given set
    ///
    /// Fails with [`Error::Overflow`] when the union would be a single range too long to count.
    ///
    /// # Example
    ///
    /// ```rust
    /// use eater_addrset::address_set;
    ///
    /// let left = address_set![1u32 ..= 3, 7 ..= 9]?;
    /// let right = address_set![4 ..= 6]?;
    ///
    /// assert_eq!(address_set![1 ..= 9]?, left.union(&right)?);
    /// # Ok::<(), eater_addrset::Error>(())
    /// ```
    pub fn union(&self, other: &AddressSet<A>) -> Result<AddressSet<A>> {
        if other.num_address_ranges() > self.num_address_ranges() {
            return other.union(self);
        }

        let mut result = self.clone();
        result.add_set(other)?;
        Ok(result)
    }

    /// Get the difference of this set with given set, alike `lhs - rhs`
    ///
    /// # Example
    ///
    /// ```rust
    /// use eater_addrset::address_set;
    ///
    /// let left = address_set![0u64 ..= 100]?;
    /// let right = address_set![40 ..= 60]?;
    ///
    /// assert_eq!(address_set![0 ..= 39, 61 ..= 100]?, left.subtract(&right));
    /// // This method is asymmetric
    /// assert!(right.subtract(&left).is_empty());
    /// # Ok::<(), eater_addrset::Error>(())
    /// ```
    pub fn subtract(&self, other: &AddressSet<A>) -> AddressSet<A> {
        let mut right_iter = other.address_ranges(true).peekable();
        let mut result = AddressSet::new();

        for range in self.address_ranges(true) {
            while right_iter.next_if(|r| r.end() < range.start()).is_some() {}

            // start of the part of `range` not yet cut away, `None` once nothing survives
            let mut cursor = Some(range.start());
            while let (Some(start), Some(r)) = (cursor, right_iter.peek().copied()) {
                if r.start() > range.end() {
                    break;
                }

                if r.start() > start {
                    if let Ok(before) = r.start().previous() {
                        result.insert_disjoint(AddressRange::between(start, before));
                    }
                }

                if r.end() >= range.end() {
                    // `r` may still cut into the next range, keep it
                    cursor = None;
                } else {
                    cursor = r.end().next().ok();
                    right_iter.next();
                }
            }

            if let Some(start) = cursor {
                result.insert_disjoint(AddressRange::between(start, range.end()));
            }
        }

        result
    }

    /// Addresses that are in exactly one of the 2 sets
    ///
    /// Fails like [`union`](AddressSet::union) does.
    ///
    /// # Example
    ///
    /// ```rust
    /// use eater_addrset::address_set;
    ///
    /// let left = address_set![0u8 ..= 10]?;
    /// let right = address_set![5 ..= 15]?;
    ///
    /// assert_eq!(address_set![0 ..= 4, 11 ..= 15]?, left.xor(&right)?);
    /// # Ok::<(), eater_addrset::Error>(())
    /// ```
    pub fn xor(&self, other: &AddressSet<A>) -> Result<AddressSet<A>> {
        self.subtract(other).union(&other.subtract(self))
    }

    /// Returns `true` if both sets hold exactly the same addresses
    pub fn has_same_addresses(&self, other: &AddressSet<A>) -> bool {
        self.num_addresses() == other.num_addresses()
            && self.num_address_ranges() == other.num_address_ranges()
            && self.address_ranges(true).eq(other.address_ranges(true))
    }

    /// The lowest address held by both sets
    pub fn find_first_address_in_common(&self, other: &AddressSet<A>) -> Option<A> {
        let mut left_iter = self.address_ranges(true);
        let mut right_iter = other.address_ranges(true);

        let mut left = left_iter.next();
        let mut right = right_iter.next();

        while let (Some(l), Some(r)) = (left, right) {
            if l.end() < r.start() {
                left = left_iter.next();
            } else if r.end() < l.start() {
                right = right_iter.next();
            } else {
                return Some(max(l.start(), r.start()));
            }
        }

        None
    }

    /// Returns `true` if this set shares any address with given set
    pub fn intersects(&self, other: &AddressSet<A>) -> bool {
        self.find_first_address_in_common(other).is_some()
    }

    /// Returns `true` if this set holds any address in `[start, end]`
    ///
    /// Inverted bounds aren't a valid query.
    pub fn intersects_range(&self, start: A, end: A) -> Result<bool> {
        if end < start {
            return Err(Error::UnsupportedQuery("intersection bounds are inverted"));
        }

        // the last range starting at or before `end` is the only one that can reach back to `start`
        let floor = self.tree.find_floor(&end);
        Ok(!floor.is_nil() && self.tree.range(floor).end() >= start)
    }

    /// Number of addresses in this set that lie strictly before `address`
    ///
    /// # Example
    ///
    /// ```rust
    /// use eater_addrset::address_set;
    ///
    /// let set = address_set![10u32 ..= 19, 30 ..= 39]?;
    /// assert_eq!(0, set.address_count_before(10));
    /// assert_eq!(10, set.address_count_before(25));
    /// assert_eq!(15, set.address_count_before(35));
    /// # Ok::<(), eater_addrset::Error>(())
    /// ```
    pub fn address_count_before(&self, address: A) -> u128 {
        let mut count = 0;
        for range in self.address_ranges(true) {
            if range.start() > address {
                break;
            }

            if range.contains(&address) {
                return count + address.offset_from(&range.start());
            }

            count += range.len();
        }

        count
    }

    /// The addresses of `set` strictly after `address`
    ///
    /// # Example
    ///
    /// ```rust
    /// use eater_addrset::{address_set, AddressSet};
    ///
    /// let set = address_set![0u32 ..= 100]?;
    /// assert_eq!(address_set![51 ..= 100]?, AddressSet::trim_start(&set, 50));
    /// # Ok::<(), eater_addrset::Error>(())
    /// ```
    pub fn trim_start(set: &AddressSet<A>, address: A) -> AddressSet<A> {
        let mut result = AddressSet::new();

        for range in set.address_ranges(true) {
            if range.start() > address {
                result.insert_disjoint(range);
            } else if range.end() > address {
                if let Ok(next) = address.next() {
                    result.insert_disjoint(AddressRange::between(next, range.end()));
                }
            }
        }

        result
    }

    /// The addresses of `set` strictly before `address`
    ///
    /// # Example
    ///
    /// ```rust
    /// use eater_addrset::{address_set, AddressSet};
    ///
    /// let set = address_set![0u32 ..= 100]?;
    /// assert_eq!(address_set![0 ..= 49]?, AddressSet::trim_end(&set, 50));
    /// # Ok::<(), eater_addrset::Error>(())
    /// ```
    pub fn trim_end(set: &AddressSet<A>, address: A) -> AddressSet<A> {
        let mut result = AddressSet::new();

        for range in set.address_ranges(true) {
            if range.end() < address {
                result.insert_disjoint(range);
            } else if range.start() < address {
                if let Ok(previous) = address.previous() {
                    result.insert_disjoint(AddressRange::between(range.start(), previous));
                }
            } else {
                break;
            }
        }

        result
    }
}

impl<A: Address> PartialEq for AddressSet<A> {
    fn eq(&self, other: &Self) -> bool {
        self.has_same_addresses(other)
    }
}

impl<A: Address> Eq for AddressSet<A> {}

impl<A: Address> BitOr for &AddressSet<A> {
    type Output = Result<AddressSet<A>>;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

impl<A: Address> BitAnd for &AddressSet<A> {
    type Output = AddressSet<A>;

    fn bitand(self, rhs: Self) -> Self::Output {
        self.intersect(rhs)
    }
}

impl<A: Address> Sub for &AddressSet<A> {
    type Output = AddressSet<A>;

    fn sub(self, rhs: Self) -> Self::Output {
        self.subtract(rhs)
    }
}

impl<A: Address> BitXor for &AddressSet<A> {
    type Output = Result<AddressSet<A>>;

    fn bitxor(self, rhs: Self) -> Self::Output {
        self.xor(rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::tests::Wide;
    use crate::address_set;
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    #[test]
    fn intersect() -> Result<()> {
        let left = address_set![10u32 ..= 20, 30 ..= 40]?;
        let right = address_set![15 ..= 35]?;
        assert_eq!(address_set![15 ..= 20, 30 ..= 35]?, left.intersect(&right));
        assert_eq!(address_set![15 ..= 20, 30 ..= 35]?, right.intersect(&left));

        let right = address_set![0 ..= 9, 21 ..= 29, 41 ..= 100]?;
        assert!(left.intersect(&right).is_empty());
        assert!(!left.intersects(&right));

        let right = address_set![12 ..= 12, 14 ..= 16, 20 ..= 30, 40 ..= 40]?;
        let expected = address_set![12 ..= 12, 14 ..= 16, 20 ..= 20, 30 ..= 30, 40 ..= 40]?;
        assert_eq!(expected, left.intersect(&right));

        assert!(left.intersect(&AddressSet::new()).is_empty());
        Ok(())
    }

    #[test]
    fn intersect_range() -> Result<()> {
        let set = address_set![10u32 ..= 20, 30 ..= 40]?;
        assert_eq!(address_set![18 ..= 20, 30 ..= 31]?, set.intersect_range(18, 31)?);
        assert!(set.intersect_range(21, 29)?.is_empty());
        assert_eq!(address_set![10 ..= 20, 30 ..= 40]?, set.intersect_range(0, u32::MAX)?);
        assert_eq!(address_set![20 ..= 20]?, set.intersect_range(20, 20)?);
        assert_eq!(
            Err(Error::UnsupportedQuery("intersection bounds are inverted")),
            set.intersect_range(31, 18).map(|found| found.num_addresses())
        );
        Ok(())
    }

    #[test]
    fn union() -> Result<()> {
        let left = address_set![1u64 ..= 3, 10 ..= 12]?;
        let right = address_set![4 ..= 5, 8 ..= 9, 20 ..= 20]?;

        let expected = address_set![1 ..= 5, 8 ..= 12, 20 ..= 20]?;
        assert_eq!(expected, left.union(&right)?);
        assert_eq!(expected, right.union(&left)?);
        assert_eq!(expected, (&left | &right)?);
        assert_eq!(left, left.union(&AddressSet::new())?);
        Ok(())
    }

    #[test]
    fn union_of_the_whole_domain_overflows() -> Result<()> {
        let half = u128::MAX / 2;
        let low = AddressSet::try_from_ranges([(Wide::MIN, Wide(half))])?;
        let high = AddressSet::try_from_ranges([(Wide(half + 1), Wide::MAX)])?;

        assert_eq!(Err(Error::Overflow), low.union(&high).map(|set| set.num_addresses()));
        assert_eq!(Err(Error::Overflow), (&high | &low).map(|set| set.num_addresses()));
        assert_eq!(Err(Error::Overflow), low.xor(&high).map(|set| set.num_addresses()));

        // operands survive and non-merging operations still work
        assert_eq!(1u128 << 127, low.num_addresses());
        assert!(low.intersect(&high).is_empty());
        assert_eq!(low, low.subtract(&high));
        assert_eq!(Ok(false), low.intersects_range(Wide(half + 1), Wide::MAX));
        assert_eq!(low, low.intersect_range(Wide::MIN, Wide::MAX)?);
        Ok(())
    }

    #[test]
    fn subtract() -> Result<()> {
        let left = address_set![0u32 ..= 100]?;
        assert_eq!(address_set![0 ..= 39, 61 ..= 100]?, left.subtract(&address_set![40 ..= 60]?));
        assert!(left.subtract(&left).is_empty());

        // one right range spanning several left ranges
        let left = address_set![0u32 ..= 10, 20 ..= 30, 40 ..= 50]?;
        let right = address_set![5 ..= 45]?;
        assert_eq!(address_set![0 ..= 4, 46 ..= 50]?, &left - &right);

        // several right ranges within one left range
        let right = address_set![0 ..= 1, 3 ..= 3, 9 ..= 22, 50 ..= 60]?;
        assert_eq!(address_set![2 ..= 2, 4 ..= 8, 23 ..= 30, 40 ..= 49]?, left.subtract(&right));

        assert_eq!(left, left.subtract(&AddressSet::new()));
        Ok(())
    }

    #[test]
    fn subtract_at_domain_ends() -> Result<()> {
        let left = address_set![(u8::MIN) ..= u8::MAX]?;
        let right = address_set![0 ..= 0, 100 ..= 199, 255 ..= 255]?;
        assert_eq!(address_set![1 ..= 99, 200 ..= 254]?, left.subtract(&right));
        Ok(())
    }

    #[test]
    fn xor() -> Result<()> {
        let left = address_set![0i32 ..= 10, 20 ..= 30]?;
        let right = address_set![5 ..= 25]?;

        let expected = address_set![0 ..= 4, 11 ..= 19, 26 ..= 30]?;
        assert_eq!(expected, left.xor(&right)?);
        assert_eq!(expected, (&right ^ &left)?);
        assert!(left.xor(&left)?.is_empty());
        Ok(())
    }

    #[test]
    fn first_address_in_common() -> Result<()> {
        let left = address_set![10u32 ..= 20, 30 ..= 40]?;
        assert_eq!(Some(15), left.find_first_address_in_common(&address_set![15 ..= 35]?));
        assert_eq!(Some(30), left.find_first_address_in_common(&address_set![21 ..= 29, 30 ..= 30]?));
        assert_eq!(Some(10), left.find_first_address_in_common(&address_set![0 ..= 10]?));
        assert_eq!(None, left.find_first_address_in_common(&address_set![21 ..= 29, 41 ..= 41]?));
        assert_eq!(None, left.find_first_address_in_common(&AddressSet::new()));
        Ok(())
    }

    #[test]
    fn intersects_range() -> Result<()> {
        let set = address_set![10u32 ..= 20, 30 ..= 40]?;
        assert_eq!(Ok(true), set.intersects_range(0, 10));
        assert_eq!(Ok(true), set.intersects_range(25, 30));
        assert_eq!(Ok(true), set.intersects_range(15, 16));
        assert_eq!(Ok(false), set.intersects_range(21, 29));
        assert_eq!(Ok(false), set.intersects_range(41, 100));
        assert_eq!(Ok(false), set.intersects_range(0, 9));
        assert_eq!(Ok(true), set.intersects_range(u32::MIN, u32::MAX));
        assert_eq!(
            Err(Error::UnsupportedQuery("intersection bounds are inverted")),
            set.intersects_range(9, 0)
        );
        Ok(())
    }

    #[test]
    fn count_before() -> Result<()> {
        let set = address_set![10u32 ..= 19, 30 ..= 39]?;
        assert_eq!(0, set.address_count_before(0));
        assert_eq!(0, set.address_count_before(10));
        assert_eq!(9, set.address_count_before(19));
        assert_eq!(10, set.address_count_before(20));
        assert_eq!(10, set.address_count_before(30));
        assert_eq!(19, set.address_count_before(39));
        assert_eq!(20, set.address_count_before(1000));
        Ok(())
    }

    #[test]
    fn trim() -> Result<()> {
        let set = address_set![0u32 ..= 100]?;
        assert_eq!(address_set![51 ..= 100]?, AddressSet::trim_start(&set, 50));
        assert_eq!(address_set![0 ..= 49]?, AddressSet::trim_end(&set, 50));

        let set = address_set![10u32 ..= 20, 30 ..= 40]?;
        assert_eq!(address_set![30 ..= 40]?, AddressSet::trim_start(&set, 20));
        assert_eq!(address_set![31 ..= 40]?, AddressSet::trim_start(&set, 30));
        assert_eq!(set, AddressSet::trim_start(&set, 9));
        assert!(AddressSet::trim_start(&set, 40).is_empty());

        assert_eq!(address_set![10 ..= 20]?, AddressSet::trim_end(&set, 30));
        assert_eq!(address_set![10 ..= 20, 30 ..= 30]?, AddressSet::trim_end(&set, 31));
        assert_eq!(set, AddressSet::trim_end(&set, 41));
        assert!(AddressSet::trim_end(&set, 10).is_empty());
        Ok(())
    }

    #[test]
    fn trim_at_domain_ends() -> Result<()> {
        let set = address_set![(u8::MIN) ..= u8::MAX]?;
        assert!(AddressSet::trim_start(&set, u8::MAX).is_empty());
        assert!(AddressSet::trim_end(&set, u8::MIN).is_empty());
        assert_eq!(address_set![1 ..= 255]?, AddressSet::trim_start(&set, 0));
        assert_eq!(address_set![0 ..= 254]?, AddressSet::trim_end(&set, 255));
        Ok(())
    }

    fn arb_set() -> impl Strategy<Value=AddressSet<u16>> {
        prop::collection::vec((0u16..400, 0u16..24), 0..24).prop_map(|pairs| {
            let mut set = AddressSet::new();
            for (start, len) in pairs {
                set.add(AddressRange::new(start, start + len).unwrap()).unwrap();
            }
            set
        })
    }

    fn model(set: &AddressSet<u16>) -> BTreeSet<u16> {
        set.addresses(None, true).collect()
    }

    proptest! {
        #[test]
        fn algebra_matches_model(a in arb_set(), b in arb_set()) {
            a.check_invariants();
            b.check_invariants();

            let (ma, mb) = (model(&a), model(&b));
            prop_assert_eq!(a.num_addresses(), ma.len() as u128);

            let union: BTreeSet<_> = ma.union(&mb).copied().collect();
            let inter: BTreeSet<_> = ma.intersection(&mb).copied().collect();
            let diff: BTreeSet<_> = ma.difference(&mb).copied().collect();
            let sym: BTreeSet<_> = ma.symmetric_difference(&mb).copied().collect();

            for (result, expected) in [
                (a.union(&b).unwrap(), union),
                (a.intersect(&b), inter.clone()),
                (a.subtract(&b), diff),
                (a.xor(&b).unwrap(), sym),
            ] {
                result.check_invariants();
                prop_assert_eq!(model(&result), expected);
            }

            prop_assert_eq!(a.find_first_address_in_common(&b), inter.first().copied());
            prop_assert_eq!(a.intersects(&b), !inter.is_empty());
            prop_assert_eq!(a.contains_set(&b), mb.is_subset(&ma));
        }

        #[test]
        fn algebra_laws(a in arb_set(), b in arb_set(), c in arb_set()) {
            let ab = a.union(&b).unwrap();
            prop_assert!(ab.has_same_addresses(&b.union(&a).unwrap()));
            prop_assert_eq!(ab.union(&c).unwrap(), a.union(&b.union(&c).unwrap()).unwrap());
            prop_assert_eq!(a.intersect(&b), b.intersect(&a));
            prop_assert!(a.subtract(&a).is_empty());
            prop_assert_eq!(a.xor(&b).unwrap(), a.subtract(&b).union(&b.subtract(&a)).unwrap());
            prop_assert_eq!(a.intersect(&b).is_empty(), a.find_first_address_in_common(&b).is_none());
        }

        #[test]
        fn mutation_matches_model(ops in prop::collection::vec((any::<bool>(), 0u16..300, 0u16..30), 0..60)) {
            let mut set = AddressSet::new();
            let mut expected = BTreeSet::new();

            for (add, start, len) in ops {
                let range = AddressRange::new(start, start + len).unwrap();
                if add {
                    set.add(range).unwrap();
                    expected.extend(start..=start + len);
                } else {
                    set.remove(range);
                    for address in start..=start + len {
                        expected.remove(&address);
                    }
                }

                set.check_invariants();
            }

            prop_assert_eq!(model(&set), expected);
        }

        #[test]
        fn queries_match_model(a in arb_set(), address in 0u16..430) {
            let ma = model(&a);

            prop_assert_eq!(a.contains(&address), ma.contains(&address));
            prop_assert_eq!(a.address_count_before(address), ma.range(..address).count() as u128);

            let after: BTreeSet<_> = ma.range(address..).skip_while(|x| **x == address).copied().collect();
            prop_assert_eq!(model(&AddressSet::trim_start(&a, address)), after);

            let before: BTreeSet<_> = ma.range(..address).copied().collect();
            prop_assert_eq!(model(&AddressSet::trim_end(&a, address)), before);

            let from: Vec<_> = ma.range(address..).copied().collect();
            prop_assert_eq!(a.addresses(Some(address), true).collect::<Vec<_>>(), from);

            let down: Vec<_> = ma.range(..=address).rev().copied().collect();
            prop_assert_eq!(a.addresses(Some(address), false).collect::<Vec<_>>(), down);
        }
    }
}
