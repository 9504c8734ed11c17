//! `NodeCount` newtype for the storage node group

use crate::error::{Result, VaultError};

use super::NodeIndex;

/// Number of storage nodes (2..=254)
///
/// Every password is split into exactly this many shares and all of them are
/// required for reconstruction, so the node count doubles as the threshold.
/// The maximum is 254 due to GF256 limitations in the blahaj crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct NodeCount(u8);

impl NodeCount {
    /// Minimum valid node count
    pub const MIN: u8 = 2;

    /// Maximum valid node count (254)
    pub const MAX: u8 = 254;

    /// Creates a new node count
    ///
    /// # Errors
    /// Returns a configuration error if count is below 2 or above 254
    ///
    /// # Examples
    ///
    /// ```rust
    /// use sharevault::domain::NodeCount;
    ///
    /// let count = NodeCount::new(3).unwrap();
    /// assert_eq!(*count, 3);
    ///
    /// // A single node would hold the whole secret
    /// assert!(NodeCount::new(1).is_err());
    /// assert!(NodeCount::new(255).is_err());
    /// ```
    pub fn new(value: u8) -> Result<Self> {
        if value < Self::MIN {
            return Err(VaultError::Configuration(format!(
                "Node count must be at least {} (got {value})",
                Self::MIN
            )));
        }
        if value > Self::MAX {
            return Err(VaultError::Configuration(
                "Node count maximum is 254 due to GF256 limitations".to_string(),
            ));
        }
        Ok(Self(value))
    }

    /// Creates a node count from a collection length
    ///
    /// # Errors
    /// Returns a configuration error if `len` is outside 2..=254
    pub fn from_len(len: usize) -> Result<Self> {
        let value = u8::try_from(len).map_err(|_| {
            VaultError::Configuration(format!("Too many storage nodes configured: {len}"))
        })?;
        Self::new(value)
    }

    /// Iterates over every node index of the group in order
    pub fn indices(self) -> impl Iterator<Item = NodeIndex> {
        (0..self.0).map(|i| {
            NodeIndex::new(i).unwrap_or_else(|_| unreachable!("i < NodeCount::MAX is a valid index"))
        })
    }

    /// Node count as a `usize` for length comparisons
    #[must_use]
    pub fn get(self) -> usize {
        usize::from(self.0)
    }
}

impl std::ops::Deref for NodeCount {
    type Target = u8;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::fmt::Display for NodeCount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_len_bounds() {
        assert!(NodeCount::from_len(0).is_err());
        assert!(NodeCount::from_len(1).is_err());
        assert_eq!(*NodeCount::from_len(3).unwrap(), 3);
        assert!(NodeCount::from_len(300).is_err());
    }

    #[test]
    fn test_indices_cover_group() {
        let count = NodeCount::new(4).unwrap();
        let indices: Vec<u8> = count.indices().map(|i| *i).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
    }
}
