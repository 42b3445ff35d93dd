//! Compact sets of addresses, stored as disjoint ranges
//!
//! An [`AddressSet`] keeps its addresses as maximal closed ranges in a red-black tree keyed on
//! the range start. Every mutation merges or splits ranges so that no two stored ranges overlap
//! or sit next to each other, which keeps the representation canonical: two sets hold the same
//! addresses exactly when they hold the same ranges.
//!
//! Lookups ([`AddressSet::contains`], [`AddressSet::range_containing`]) walk the tree in
//! logarithmic time, set algebra ([`AddressSet::union`], [`AddressSet::intersect`],
//! [`AddressSet::subtract`], [`AddressSet::xor`]) sweeps the ascending ranges of both operands.
//! No operation ever visits individual addresses, except [`AddressSet::addresses`] which is
//! explicitly asked to.
//!
//! Sets are single-threaded values. Iterators borrow the set, so it can't be mutated while one
//! is alive.

use std::fmt::{self, Debug, Display};

mod address;
mod algebra;
mod conversions;
mod error;
mod internal;
mod iter;
mod macros;
mod range;
mod tree;

pub use crate::address::Address;
pub use crate::error::{Error, Result};
pub use crate::iter::{Addresses, Ranges};
pub use crate::range::AddressRange;

use crate::tree::{NodeId, RangeTree};

/// The list type used for scratch lists of ranges
///
/// Disable the `smallvec` feature to use the std [Vec](Vec)
#[cfg(feature = "smallvec")]
pub type RangeVec<T> = smallvec::SmallVec<[T; 5]>;

/// The list type used for scratch lists of ranges
///
/// Enable the `smallvec` feature to use the smallvec's [`SmallVec`](smallvec::SmallVec)
#[cfg(not(feature = "smallvec"))]
pub type RangeVec<T> = Vec<T>;

/// A set of addresses stored as maximal, disjoint ranges
///
/// # Example
///
/// ```rust
/// use eater_addrset::{range, AddressSet};
///
/// let mut set = AddressSet::from_range(range!(10u64 ..= 20)?);
/// set.add(range!(21 ..= 25)?)?;
///
/// assert_eq!(1, set.num_address_ranges());
/// assert_eq!(16, set.num_addresses());
/// assert!(set.contains(&25));
/// # Ok::<(), eater_addrset::Error>(())
/// ```
#[derive(Clone)]
pub struct AddressSet<A: Address> {
    tree: RangeTree<A>,
    address_count: u128,
}

impl<A: Address> Default for AddressSet<A> {
    fn default() -> Self {
        AddressSet {
            tree: RangeTree::default(),
            address_count: 0,
        }
    }
}

impl<A: Address> AddressSet<A> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a set holding the addresses of a single range
    pub fn from_range(range: AddressRange<A>) -> Self {
        let mut set = Self::new();
        set.insert_disjoint(range);
        set
    }

    /// Create a set from `(start, end)` pairs in any order, overlapping pairs are merged
    ///
    /// Fails on the first pair with `end < start`, or with [`Error::Overflow`] when the merged
    /// ranges can't be counted.
    pub fn try_from_ranges<I: IntoIterator<Item=(A, A)>>(ranges: I) -> Result<Self> {
        let ranges = ranges
            .into_iter()
            .map(|(start, end)| AddressRange::new(start, end))
            .collect::<Result<RangeVec<_>>>()?;

        conversions::coalesce(ranges)
    }

    /// If this is an empty set
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tree.len() == 0
    }

    /// Total number of addresses in this set
    #[inline]
    pub fn num_addresses(&self) -> u128 {
        self.address_count
    }

    /// Number of maximal ranges this set is made of
    #[inline]
    pub fn num_address_ranges(&self) -> usize {
        self.tree.len()
    }

    /// Lowest address in this set
    pub fn min_address(&self) -> Option<A> {
        self.first_range().map(|range| range.start())
    }

    /// Highest address in this set
    pub fn max_address(&self) -> Option<A> {
        self.last_range().map(|range| range.end())
    }

    pub fn first_range(&self) -> Option<AddressRange<A>> {
        self.range_at(self.tree.first())
    }

    pub fn last_range(&self) -> Option<AddressRange<A>> {
        self.range_at(self.tree.last())
    }

    /// The stored range holding `address`
    pub fn range_containing(&self, address: &A) -> Option<AddressRange<A>> {
        self.range_at(self.tree.find_containing(address))
    }

    #[inline]
    fn range_at(&self, id: NodeId) -> Option<AddressRange<A>> {
        if id.is_nil() {
            None
        } else {
            Some(self.tree.range(id))
        }
    }

    /// Check if `address` falls within the ranges of this set
    pub fn contains(&self, address: &A) -> bool {
        !self.tree.find_containing(address).is_nil()
    }

    /// Check if every address in `[start, end]` belongs to this set
    ///
    /// As stored ranges are maximal, a single stored range has to cover the whole span.
    /// Inverted bounds aren't a valid query.
    ///
    /// # Example
    ///
    /// ```rust
    /// use eater_addrset::{address_set, Error};
    ///
    /// let set = address_set![10u8 ..= 20, 30 ..= 40]?;
    /// assert_eq!(Ok(true), set.contains_range(12, 20));
    /// assert_eq!(Ok(false), set.contains_range(12, 30));
    /// assert!(matches!(set.contains_range(20, 12), Err(Error::UnsupportedQuery(_))));
    /// # Ok::<(), eater_addrset::Error>(())
    /// ```
    pub fn contains_range(&self, start: A, end: A) -> Result<bool> {
        if end < start {
            return Err(Error::UnsupportedQuery("containment bounds are inverted"));
        }

        Ok(self.covers(&AddressRange::between(start, end)))
    }

    /// Check if every address of `other` belongs to this set
    pub fn contains_set(&self, other: &AddressSet<A>) -> bool {
        if other.num_addresses() > self.num_addresses() {
            return false;
        }

        other.address_ranges(true).all(|range| self.covers(&range))
    }

    fn covers(&self, range: &AddressRange<A>) -> bool {
        self.range_containing(&range.start())
            .map_or(false, |stored| stored.end() >= range.end())
    }

    /// Returns an iterator over all ranges of this set, ascending when `forward` is set and
    /// descending otherwise
    #[inline]
    pub fn address_ranges(&self, forward: bool) -> Ranges<'_, A> {
        Ranges::new(&self.tree, forward)
    }

    /// Returns an iterator over the individual addresses of this set
    ///
    /// Iteration begins at `start` when the set holds it, otherwise at the nearest stored address
    /// in the iteration direction. Without `start` it covers the whole set. The iterator is
    /// bounded by the contents of the set.
    ///
    /// # Example
    ///
    /// ```rust
    /// use eater_addrset::address_set;
    ///
    /// let set = address_set![1u16 ..= 3, 7 ..= 8]?;
    /// assert_eq!(vec![2, 3, 7, 8], set.addresses(Some(2), true).collect::<Vec<_>>());
    /// assert_eq!(vec![3, 2, 1], set.addresses(Some(5), false).collect::<Vec<_>>());
    /// # Ok::<(), eater_addrset::Error>(())
    /// ```
    #[inline]
    pub fn addresses(&self, start: Option<A>, forward: bool) -> Addresses<'_, A> {
        Addresses::new(&self.tree, start, forward)
    }

    /// Add a range to this set, merging it with every stored range it overlaps or touches
    ///
    /// Fails with [`Error::Overflow`] when the merged range would be too long to count, the set
    /// is left untouched then. Only address types whose whole domain holds more than
    /// `u128::MAX` addresses can hit this.
    ///
    /// # Example
    ///
    /// ```rust
    /// use eater_addrset::{address_set, range};
    ///
    /// let mut set = address_set![0u32 ..= 4, 10 ..= 14, 20 ..= 24]?;
    /// set.add(range!(5 ..= 19)?)?;
    ///
    /// assert_eq!(address_set![0 ..= 24]?, set);
    /// # Ok::<(), eater_addrset::Error>(())
    /// ```
    pub fn add(&mut self, range: AddressRange<A>) -> Result<()> {
        let mut touched: RangeVec<AddressRange<A>> = RangeVec::new();

        // Only the last range starting at or before `range` can reach it from the left
        let floor = self.tree.find_floor(&range.start());
        let mut cursor = if floor.is_nil() {
            self.tree.first()
        } else if self.tree.range(floor).touches(&range) {
            floor
        } else {
            self.tree.successor(floor)
        };

        while !cursor.is_nil() {
            let stored = self.tree.range(cursor);
            if !stored.touches(&range) {
                break;
            }

            touched.push(stored);
            cursor = self.tree.successor(cursor);
        }

        if let [stored] = touched.as_slice() {
            if stored.contains_range(&range) {
                return Ok(());
            }
        }

        let merged = touched.iter().try_fold(range, |merged, stored| merged.span(stored))?;
        for stored in &touched {
            self.tree.delete(&stored.start());
            self.address_count -= stored.len();
        }

        tracing::trace!("Merged {:?} with {} stored ranges into {:?}", range, touched.len(), merged);
        self.insert_disjoint(merged);
        Ok(())
    }

    /// Add the addresses `[start, end]`
    pub fn add_bounds(&mut self, start: A, end: A) -> Result<()> {
        self.add(AddressRange::new(start, end)?)
    }

    /// Add every address of `other`
    ///
    /// Stops at the first range whose merge fails, ranges added before it stay.
    pub fn add_set(&mut self, other: &AddressSet<A>) -> Result<()> {
        for range in other.address_ranges(true) {
            self.add(range)?;
        }

        Ok(())
    }

    /// Remove a range from this set, splitting every stored range it cuts through
    ///
    /// # Example
    ///
    /// ```rust
    /// use eater_addrset::{address_set, range};
    ///
    /// let mut set = address_set![0u32 ..= 100]?;
    /// set.remove(range!(40 ..= 60)?);
    ///
    /// assert_eq!(address_set![0 ..= 39, 61 ..= 100]?, set);
    /// assert_eq!(80, set.num_addresses());
    /// # Ok::<(), eater_addrset::Error>(())
    /// ```
    pub fn remove(&mut self, range: AddressRange<A>) {
        let mut overlapped: RangeVec<AddressRange<A>> = RangeVec::new();

        let floor = self.tree.find_floor(&range.start());
        let mut cursor = if floor.is_nil() {
            self.tree.first()
        } else if self.tree.range(floor).end() >= range.start() {
            floor
        } else {
            self.tree.successor(floor)
        };

        while !cursor.is_nil() {
            let stored = self.tree.range(cursor);
            if stored.start() > range.end() {
                break;
            }

            overlapped.push(stored);
            cursor = self.tree.successor(cursor);
        }

        for stored in &overlapped {
            self.tree.delete(&stored.start());
            self.address_count -= stored.len();

            // both neighbours exist whenever the stored range sticks out on that side
            if stored.start() < range.start() {
                if let Ok(before) = range.start().previous() {
                    self.insert_disjoint(AddressRange::between(stored.start(), before));
                }
            }

            if stored.end() > range.end() {
                if let Ok(after) = range.end().next() {
                    self.insert_disjoint(AddressRange::between(after, stored.end()));
                }
            }
        }

        if !overlapped.is_empty() {
            tracing::trace!("Cut {:?} out of {} stored ranges", range, overlapped.len());
        }
    }

    /// Remove the addresses `[start, end]`
    pub fn remove_bounds(&mut self, start: A, end: A) -> Result<()> {
        self.remove(AddressRange::new(start, end)?);
        Ok(())
    }

    /// Remove every address of `other`
    pub fn remove_set(&mut self, other: &AddressSet<A>) {
        for range in other.address_ranges(true) {
            self.remove(range);
        }
    }

    /// Remove all addresses
    pub fn clear(&mut self) {
        self.tree.clear();
        self.address_count = 0;
    }

    /// Store a range the caller knows to be apart from every stored range
    pub(crate) fn insert_disjoint(&mut self, range: AddressRange<A>) {
        self.tree.insert(range.start(), range.end());
        self.address_count += range.len();
    }

    /// Check the tree, maximality and the address count
    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        self.tree.check_invariants();

        let ranges: Vec<_> = self.address_ranges(true).collect();
        for pair in ranges.windows(2) {
            assert!(!pair[0].touches(&pair[1]), "{:?} and {:?} should have been merged", pair[0], pair[1]);
            assert!(pair[0].end() < pair[1].start());
        }

        let total: u128 = ranges.iter().map(AddressRange::len).sum();
        assert_eq!(total, self.address_count, "address count drifted");
    }
}

impl<'a, A: Address> IntoIterator for &'a AddressSet<A> {
    type Item = AddressRange<A>;
    type IntoIter = Ranges<'a, A>;

    fn into_iter(self) -> Self::IntoIter {
        self.address_ranges(true)
    }
}

impl<A: Address> Debug for AddressSet<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set()
            .entries(self.address_ranges(true).map(AddressRange::into_inner))
            .finish()
    }
}

impl<A: Address + Display> Display for AddressSet<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, range) in self.address_ranges(true).enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}", range)?;
        }

        Ok(())
    }
}
