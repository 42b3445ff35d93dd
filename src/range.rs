use std::cmp::{max, min};
use std::fmt::{self, Display};
use crate::{Address, Error, Result};

/// A closed interval `[start, end]` of addresses, `start <= end` always holds
///
/// # Example
///
/// ```rust
/// use eater_addrset::AddressRange;
///
/// let range = AddressRange::new(10u32, 20)?;
/// assert_eq!(11, range.len());
/// assert!(range.contains(&20));
/// assert!(AddressRange::new(20u32, 10).is_err());
/// # Ok::<(), eater_addrset::Error>(())
/// ```
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct AddressRange<A> {
    start: A,
    end: A,
}

impl<A: Address> AddressRange<A> {
    /// Create a new range, rejecting `end < start` and lengths that don't fit a `u128`
    pub fn new(start: A, end: A) -> Result<Self> {
        if end < start {
            return Err(Error::invalid_range(&start, &end));
        }

        end.offset_from(&start).checked_add(1).ok_or(Error::Overflow)?;
        Ok(AddressRange { start, end })
    }

    /// Create a range covering a single address
    #[inline]
    pub fn single(address: A) -> Self {
        AddressRange { start: address, end: address }
    }

    /// Build a range from bounds already known to be ordered
    ///
    /// Only ranges lying within an already validated range may be measured with [`len`](Self::len).
    #[inline]
    pub(crate) fn between(start: A, end: A) -> Self {
        debug_assert!(start <= end, "range bounds out of order: {:?} > {:?}", start, end);
        AddressRange { start, end }
    }

    #[inline]
    pub fn start(&self) -> A {
        self.start
    }

    #[inline]
    pub fn end(&self) -> A {
        self.end
    }

    /// Lowest address in the range, same as [`start`](AddressRange::start)
    #[inline]
    pub fn min_address(&self) -> A {
        self.start
    }

    /// Highest address in the range, same as [`end`](AddressRange::end)
    #[inline]
    pub fn max_address(&self) -> A {
        self.end
    }

    /// Number of addresses in the range
    #[inline]
    pub fn len(&self) -> u128 {
        self.end.offset_from(&self.start) + 1
    }

    /// A range always holds at least one address
    #[inline]
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Returns `true` if given address falls within this range
    #[inline]
    pub fn contains(&self, address: &A) -> bool {
        self.start <= *address && *address <= self.end
    }

    /// Returns `true` if every address of `other` falls within this range
    #[inline]
    pub fn contains_range(&self, other: &Self) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Returns `true` if both ranges share at least one address
    #[inline]
    pub fn intersects(&self, other: &Self) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// Returns `true` if both ranges overlap or sit directly next to each other, so their union
    /// is a single range
    ///
    /// A bound without a successor reaches everything after it, so the check can't overflow at
    /// the top of the domain.
    pub fn touches(&self, other: &Self) -> bool {
        let reaches = |end: A, start: A| end.next().map_or(true, |next| next >= start);
        reaches(self.end, other.start) && reaches(other.end, self.start)
    }

    /// The addresses shared by both ranges, if any
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        if self.intersects(other) {
            Some(Self::between(max(self.start, other.start), min(self.end, other.end)))
        } else {
            None
        }
    }

    /// The smallest range covering both ranges
    ///
    /// Fails with [`Error::Overflow`] when the covering range is too long to count.
    pub fn span(&self, other: &Self) -> Result<Self> {
        Self::new(min(self.start, other.start), max(self.end, other.end))
    }

    /// Returns the internal `start` and `end` addresses
    #[inline]
    pub fn into_inner(self) -> (A, A) {
        (self.start, self.end)
    }
}

impl<A: Address + Display> Display for AddressRange<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}
