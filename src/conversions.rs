use std::ops::RangeInclusive;
use crate::internal::LinearRangeAdder;
use crate::{Address, AddressRange, AddressSet, Error, Result};

/// Sort `ranges` and merge them into a set, failing when a merge can't be counted
pub(crate) fn coalesce<A: Address>(mut ranges: impl AsMut<[AddressRange<A>]> + IntoIterator<Item=AddressRange<A>>) -> Result<AddressSet<A>> {
    ranges.as_mut().sort_unstable_by_key(AddressRange::start);
    let mut adder = LinearRangeAdder::new();
    for range in ranges {
        adder.add(range)?;
    }

    Ok(adder.finalize())
}

#[cfg(feature = "smallvec")]
impl<A: Address, const N: usize> TryFrom<smallvec::SmallVec<[AddressRange<A>; N]>> for AddressSet<A> {
    type Error = Error;

    fn try_from(value: smallvec::SmallVec<[AddressRange<A>; N]>) -> Result<Self> {
        coalesce(value)
    }
}

impl<A: Address> TryFrom<Vec<AddressRange<A>>> for AddressSet<A> {
    type Error = Error;

    fn try_from(value: Vec<AddressRange<A>>) -> Result<Self> {
        coalesce(value)
    }
}

impl<A: Address, const N: usize> TryFrom<[AddressRange<A>; N]> for AddressSet<A> {
    type Error = Error;

    fn try_from(value: [AddressRange<A>; N]) -> Result<Self> {
        coalesce(value)
    }
}

impl<A: Address> From<AddressRange<A>> for AddressSet<A> {
    fn from(value: AddressRange<A>) -> Self {
        AddressSet::from_range(value)
    }
}

impl<A: Address> TryFrom<RangeInclusive<A>> for AddressRange<A> {
    type Error = Error;

    fn try_from(value: RangeInclusive<A>) -> Result<Self> {
        let (start, end) = value.into_inner();
        AddressRange::new(start, end)
    }
}

impl<A: Address> From<AddressRange<A>> for RangeInclusive<A> {
    fn from(value: AddressRange<A>) -> Self {
        let (start, end) = value.into_inner();
        start..=end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::tests::Wide;

    #[test]
    fn from_unsorted_overlapping() {
        let ranges = vec![
            AddressRange::new(30u32, 40).unwrap(),
            AddressRange::new(0, 5).unwrap(),
            AddressRange::new(35, 50).unwrap(),
            AddressRange::new(6, 6).unwrap(),
        ];

        let set = AddressSet::try_from(ranges).unwrap();
        let found: Vec<_> = set.address_ranges(true).map(AddressRange::into_inner).collect();
        assert_eq!(vec![(0, 6), (30, 50)], found);
        assert_eq!(7 + 21, set.num_addresses());
        set.check_invariants();
    }

    #[test]
    fn from_arrays_and_single_ranges() {
        let set = AddressSet::try_from([
            AddressRange::new(8u16, 9).unwrap(),
            AddressRange::new(1, 2).unwrap(),
            AddressRange::new(3, 7).unwrap(),
        ]).unwrap();
        assert_eq!(1, set.num_address_ranges());
        assert_eq!(9, set.num_addresses());

        let set = AddressSet::from(AddressRange::single(4u16));
        assert_eq!(Some(AddressRange::single(4)), set.first_range());
    }

    #[test]
    fn merging_into_the_whole_domain_overflows() {
        let half = u128::MAX / 2;
        let ranges = vec![
            AddressRange::new(Wide(half + 1), Wide::MAX).unwrap(),
            AddressRange::new(Wide::MIN, Wide(half)).unwrap(),
        ];
        assert_eq!(Err(Error::Overflow), AddressSet::try_from(ranges).map(|set| set.num_addresses()));

        let pairs = [(Wide(half + 2), Wide::MAX), (Wide::MIN, Wide(half))];
        let set = AddressSet::try_from_ranges(pairs).unwrap();
        assert_eq!(u128::MAX, set.num_addresses());
        set.check_invariants();
    }

    #[test]
    fn std_ranges() {
        assert_eq!(Ok(AddressRange::new(1u8, 4).unwrap()), AddressRange::try_from(1u8..=4));
        assert!(AddressRange::try_from(4u8..=1).is_err());
        assert_eq!(2..=9, RangeInclusive::from(AddressRange::new(2u64, 9).unwrap()));
    }

    #[test]
    fn try_from_ranges_reports_first_invalid_pair() {
        let err = AddressSet::try_from_ranges([(1u32, 2), (9, 3), (8, 1)]).unwrap_err();
        assert_eq!(Error::InvalidRange { start: "9".into(), end: "3".into() }, err);
    }
}
