//! Composed effect bound for the custody coordinator.
//!
//! The coordinator needs exactly these four capabilities. Bounding on the
//! composition keeps fakes minimal: any type implementing the four traits
//! qualifies through the blanket impl.

use super::{SecondaryChannelEffects, ShareIdEffects, ShareStoreEffects, TokenStoreEffects};

/// Effects required by [`CustodyCoordinator`](crate::CustodyCoordinator).
pub trait CustodyEffects:
    ShareStoreEffects + TokenStoreEffects + SecondaryChannelEffects + ShareIdEffects + Send + Sync
{
}

impl<T> CustodyEffects for T where
    T: ShareStoreEffects
        + TokenStoreEffects
        + SecondaryChannelEffects
        + ShareIdEffects
        + Send
        + Sync
{
}
