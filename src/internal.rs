use crate::{Address, AddressRange, AddressSet, RangeVec, Result};

/// Collects ranges arriving in ascending start order, coalescing every range that touches the
/// previous one, then materializes them into an [`AddressSet`]
#[derive(Debug)]
pub struct LinearRangeAdder<A: Address> {
    items: RangeVec<AddressRange<A>>,
    last: Option<AddressRange<A>>,
}

impl<A: Address> Default for LinearRangeAdder<A> {
    #[inline]
    fn default() -> Self {
        Self::with_capacity(4)
    }
}

impl<A: Address> LinearRangeAdder<A> {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(cap: usize) -> Self {
        LinearRangeAdder {
            items: RangeVec::with_capacity(cap),
            last: None,
        }
    }

    /// Fails with [`Error::Overflow`](crate::Error::Overflow) when coalescing builds a range
    /// too long to count, the adder is left as it was
    pub fn add(&mut self, range: AddressRange<A>) -> Result<()> {
        match self.last {
            None => self.last = Some(range),
            Some(v) => {
                debug_assert!(v.start() <= range.start(), "range added to adder is lower than previous range");
                if v.touches(&range) {
                    self.last = Some(v.span(&range)?);
                } else {
                    self.items.push(v);
                    self.last = Some(range);
                }
            }
        }

        Ok(())
    }

    pub fn finalize(mut self) -> AddressSet<A> {
        if let Some(v) = self.last {
            self.items.push(v);
        }

        tracing::trace!("Materializing {} coalesced ranges", self.items.len());

        let mut set = AddressSet::new();
        for range in self.items {
            set.insert_disjoint(range);
        }
        set
    }
}
