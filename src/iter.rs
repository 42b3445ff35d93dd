use std::iter::FusedIterator;
use crate::tree::{NodeId, RangeTree};
use crate::{Address, AddressRange};

/// Iterator over the ranges of an [`AddressSet`](crate::AddressSet), in either direction
///
/// Cloning the iterator restarts iteration from the clone's position.
#[derive(Debug, Clone)]
pub struct Ranges<'a, A: Address> {
    tree: &'a RangeTree<A>,
    cursor: NodeId,
    forward: bool,
    // exact number of ranges left, known when iteration starts at either end
    remaining: Option<usize>,
}

impl<'a, A: Address> Ranges<'a, A> {
    pub(crate) fn new(tree: &'a RangeTree<A>, forward: bool) -> Self {
        let cursor = if forward { tree.first() } else { tree.last() };
        Ranges { tree, cursor, forward, remaining: Some(tree.len()) }
    }

    pub(crate) fn starting_at(tree: &'a RangeTree<A>, cursor: NodeId, forward: bool) -> Self {
        Ranges { tree, cursor, forward, remaining: None }
    }
}

impl<A: Address> Iterator for Ranges<'_, A> {
    type Item = AddressRange<A>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor.is_nil() {
            return None;
        }

        let range = self.tree.range(self.cursor);
        self.cursor = if self.forward {
            self.tree.successor(self.cursor)
        } else {
            self.tree.predecessor(self.cursor)
        };

        if let Some(remaining) = self.remaining.as_mut() {
            *remaining = remaining.saturating_sub(1);
        }

        Some(range)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.cursor.is_nil() {
            return (0, Some(0));
        }

        match self.remaining {
            Some(remaining) => (remaining, Some(remaining)),
            None => (1, Some(self.tree.len())),
        }
    }
}

impl<A: Address> FusedIterator for Ranges<'_, A> {}

/// Iterator over the individual addresses of an [`AddressSet`](crate::AddressSet)
///
/// Yields exactly the addresses stored in the set, one at a time.
#[derive(Debug, Clone)]
pub struct Addresses<'a, A: Address> {
    ranges: Ranges<'a, A>,
    // next address to yield and the last one of the current range
    current: Option<(A, A)>,
}

impl<'a, A: Address> Addresses<'a, A> {
    pub(crate) fn new(tree: &'a RangeTree<A>, start: Option<A>, forward: bool) -> Self {
        let Some(start) = start else {
            return Addresses {
                ranges: Ranges::new(tree, forward),
                current: None,
            };
        };

        let containing = tree.find_containing(&start);
        if !containing.is_nil() {
            let range = tree.range(containing);
            let (current, cursor) = if forward {
                ((start, range.end()), tree.successor(containing))
            } else {
                ((start, range.start()), tree.predecessor(containing))
            };

            return Addresses {
                ranges: Ranges::starting_at(tree, cursor, forward),
                current: Some(current),
            };
        }

        let cursor = if forward {
            tree.find_ceiling(&start)
        } else {
            tree.find_floor(&start)
        };

        Addresses {
            ranges: Ranges::starting_at(tree, cursor, forward),
            current: None,
        }
    }
}

impl<A: Address> Iterator for Addresses<'_, A> {
    type Item = A;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current.is_none() {
            let range = self.ranges.next()?;
            self.current = Some(if self.ranges.forward {
                (range.start(), range.end())
            } else {
                (range.end(), range.start())
            });
        }

        let (address, last) = self.current.take()?;
        if address != last {
            let step = if self.ranges.forward {
                address.next()
            } else {
                address.previous()
            };
            self.current = step.ok().map(|next| (next, last));
        }

        Some(address)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        // every range left holds at least one address
        let (ranges_left, no_more_ranges) = match self.ranges.size_hint() {
            (lower, Some(0)) => (lower, true),
            (lower, _) => (lower, false),
        };

        let in_current = match self.current {
            None => Some(0),
            Some((address, last)) => {
                let offset = if self.ranges.forward {
                    last.offset_from(&address)
                } else {
                    address.offset_from(&last)
                };
                offset.checked_add(1).and_then(|count| usize::try_from(count).ok())
            }
        };

        let lower = in_current.unwrap_or(usize::MAX).saturating_add(ranges_left);
        (lower, in_current.filter(|_| no_more_ranges))
    }
}

impl<A: Address> FusedIterator for Addresses<'_, A> {}
