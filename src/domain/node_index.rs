//! `NodeIndex` newtype for positions in the node group

use crate::error::{Result, VaultError};

/// Position of a storage node in the group (0..=253)
///
/// A share produced for node `i` is only valid when stored on, and read back
/// from, node `i`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeIndex(u8);

impl NodeIndex {
    /// Maximum valid node index (253)
    pub const MAX: u8 = 253;

    /// Creates a new node index
    ///
    /// # Errors
    /// Returns a configuration error if index is above 253
    ///
    /// # Examples
    ///
    /// ```rust
    /// use sharevault::domain::NodeIndex;
    ///
    /// let index = NodeIndex::new(0).unwrap();
    /// assert_eq!(*index, 0);
    ///
    /// assert!(NodeIndex::new(NodeIndex::MAX).is_ok());
    /// assert!(NodeIndex::new(254).is_err());
    /// ```
    pub fn new(value: u8) -> Result<Self> {
        if value > Self::MAX {
            return Err(VaultError::Configuration(format!(
                "Node index {value} out of range (max {})",
                Self::MAX
            )));
        }
        Ok(Self(value))
    }

    /// Index as a `usize` for slice access
    #[must_use]
    pub fn get(self) -> usize {
        usize::from(self.0)
    }
}

impl std::ops::Deref for NodeIndex {
    type Target = u8;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::fmt::Display for NodeIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
