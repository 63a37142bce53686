//! The key capability required by [`PersistentCritBitMap`](super::PersistentCritBitMap).

/// The code [`ByteKey::byte_code`] returns for positions past the end of a key.
///
/// It compares below every code of a real byte, so a key sorts before all of
/// its extensions.
pub const END_OF_KEY: u16 = 0;

/// Offset added to a real byte so that it never collides with [`END_OF_KEY`].
const BYTE_BASE: u16 = 256;

/// Projects a byte slice onto the 9-bit code space.
///
/// Returns [`END_OF_KEY`] when `position` is at or past the end of `bytes`,
/// otherwise `256 + bytes[position]`.
///
/// # Examples
///
/// ```rust
/// use critmap::persistent::{END_OF_KEY, byte_code_at};
///
/// assert_eq!(byte_code_at(b"ab", 0), 256 + u16::from(b'a'));
/// assert_eq!(byte_code_at(b"ab", 2), END_OF_KEY);
/// ```
#[inline]
#[must_use]
pub fn byte_code_at(bytes: &[u8], position: usize) -> u16 {
    bytes
        .get(position)
        .map_or(END_OF_KEY, |&byte| BYTE_BASE | u16::from(byte))
}

/// A key that can be read as an ordered sequence of bytes.
///
/// # Contract
///
/// - `byte_code(position)` is [`END_OF_KEY`] for every position at or past the
///   logical length of the key, and `256 + byte` otherwise.
/// - The `Ord` implementation agrees with lexicographic comparison of those
///   byte sequences.
///
/// Breaking either rule does not cause undefined behaviour, but lookups and
/// ordered iteration will return unspecified results.
///
/// # Examples
///
/// ```rust
/// use critmap::persistent::{ByteKey, byte_code_at};
///
/// #[derive(PartialEq, Eq, PartialOrd, Ord)]
/// struct Path(Vec<u8>);
///
/// impl ByteKey for Path {
///     fn byte_code(&self, position: usize) -> u16 {
///         byte_code_at(&self.0, position)
///     }
/// }
///
/// assert_eq!(Path(b"/".to_vec()).byte_code(0), 256 + u16::from(b'/'));
/// ```
pub trait ByteKey: Ord {
    /// Returns the code of the byte at `position`, or [`END_OF_KEY`].
    fn byte_code(&self, position: usize) -> u16;
}

impl ByteKey for [u8] {
    #[inline]
    fn byte_code(&self, position: usize) -> u16 {
        byte_code_at(self, position)
    }
}

impl ByteKey for Vec<u8> {
    #[inline]
    fn byte_code(&self, position: usize) -> u16 {
        byte_code_at(self, position)
    }
}

impl ByteKey for Box<[u8]> {
    #[inline]
    fn byte_code(&self, position: usize) -> u16 {
        byte_code_at(self, position)
    }
}

impl ByteKey for str {
    #[inline]
    fn byte_code(&self, position: usize) -> u16 {
        byte_code_at(self.as_bytes(), position)
    }
}

impl ByteKey for String {
    #[inline]
    fn byte_code(&self, position: usize) -> u16 {
        byte_code_at(self.as_bytes(), position)
    }
}

impl ByteKey for Box<str> {
    #[inline]
    fn byte_code(&self, position: usize) -> u16 {
        byte_code_at(self.as_bytes(), position)
    }
}

impl<T: ByteKey + ?Sized> ByteKey for &T {
    #[inline]
    fn byte_code(&self, position: usize) -> u16 {
        (**self).byte_code(position)
    }
}
