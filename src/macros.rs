/// Create a new address set based on given inclusive ranges, in any order
///
/// Evaluates to a `Result`, failing when any range ends before it starts. Overlapping and
/// adjacent ranges are merged.
///
/// **Note:** a start that isn't a single literal or identifier must be wrapped in parenthesis
///
/// Examples:
///
/// ```rust
/// use eater_addrset::address_set;
///
/// let set = address_set![10u32 ..= 20, 21 ..= 25]?;
/// assert_eq!(1, set.num_address_ranges());
///
/// let set = address_set![(u8::MIN) ..= 4, (-1i8 as u8) ..= u8::MAX]?;
/// assert_eq!(2, set.num_address_ranges());
///
/// let empty = address_set![u16:]?;
/// assert!(empty.is_empty());
/// # Ok::<(), eater_addrset::Error>(())
/// ```
#[macro_export]
macro_rules! address_set {
    [$($start:tt ..= $end:expr),* $(,)?] => {
        $crate::AddressSet::try_from_ranges([$(($start, $end)),*])
    };

    [$ty:ty:] => {
        $crate::AddressSet::<$ty>::try_from_ranges([])
    };

    [$ty:ty: $($start:tt ..= $end:expr),+ $(,)?] => {
        $crate::AddressSet::<$ty>::try_from_ranges([$(($start, $end)),+])
    };
}

/// Create a new inclusive address range alike the `..=` operator
///
/// Evaluates to a `Result`, failing when the range ends before it starts.
///
/// **Note:** a start that isn't a single literal or identifier must be wrapped in parenthesis
///
/// # Examples
///
/// ```rust
/// use eater_addrset::range;
///
/// let a = range!(4u64 ..= 8)?;
/// assert_eq!(5, a.len());
///
/// // Expression start
/// let a = range!((5 + 5) ..= 12)?;
/// assert!(a.contains(&10));
///
/// assert!(range!(9u8 ..= 3).is_err());
/// # Ok::<(), eater_addrset::Error>(())
/// ```
#[macro_export]
macro_rules! range {
    ($start:tt ..= $end:expr) => {
        $crate::AddressRange::new($start, $end)
    };
}
