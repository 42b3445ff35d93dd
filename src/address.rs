use std::fmt::Debug;
use crate::{Error, Result};

/// A single position in a totally ordered, discrete address domain
///
/// Stepping off either end of the domain is an error rather than a wrap, so merge and split
/// logic can never silently produce a range that crosses the boundary.
///
/// Implemented for every primitive integer up to 64 bits wide, where every distance fits `i128`
/// and every range length fits `u128`.
///
/// # Example
///
/// ```rust
/// use eater_addrset::{Address, Error};
///
/// assert_eq!(Ok(11), 10u8.next());
/// assert_eq!(Err(Error::Overflow), u8::MAX.next());
/// assert_eq!(Err(Error::Underflow), 0u8.previous());
/// assert_eq!(Ok(-5), 5i16.subtract(&10));
/// ```
pub trait Address: Copy + Ord + Debug {
    /// The lowest address of the domain
    const MIN: Self;

    /// The highest address of the domain
    const MAX: Self;

    /// The address directly after this one
    fn next(&self) -> Result<Self>;

    /// The address directly before this one
    fn previous(&self) -> Result<Self>;

    /// Unsigned distance from `origin` up to `self`
    ///
    /// Callers guarantee `origin <= self`.
    fn offset_from(&self, origin: &Self) -> u128;

    /// Signed distance `self - other`
    fn subtract(&self, other: &Self) -> Result<i128> {
        if self >= other {
            i128::try_from(self.offset_from(other)).map_err(|_| Error::Overflow)
        } else {
            i128::try_from(other.offset_from(self))
                .map(|distance| -distance)
                .map_err(|_| Error::Underflow)
        }
    }
}

macro_rules! primitive_address {
    ($($ty:ty),*) => {
        $(
            impl Address for $ty {
                const MIN: Self = <$ty>::MIN;
                const MAX: Self = <$ty>::MAX;

                #[inline]
                fn next(&self) -> Result<Self> {
                    self.checked_add(1).ok_or(Error::Overflow)
                }

                #[inline]
                fn previous(&self) -> Result<Self> {
                    self.checked_sub(1).ok_or(Error::Underflow)
                }

                #[inline]
                fn offset_from(&self, origin: &Self) -> u128 {
                    debug_assert!(origin <= self);
                    (*self as i128 - *origin as i128) as u128
                }

                #[inline]
                fn subtract(&self, other: &Self) -> Result<i128> {
                    Ok(*self as i128 - *other as i128)
                }
            }
        )*
    };
}

primitive_address!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize);
