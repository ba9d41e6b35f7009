//! Typed arena indices.

macro_rules! arena_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u32);

        impl $name {
            /// Slot index in the owning arena.
            #[inline]
            pub fn index(self) -> usize {
                self.0 as usize
            }

            #[inline]
            pub(crate) fn from_index(index: usize) -> Self {
                Self(index as u32)
            }
        }
    };
}

arena_id!(
    /// Node slot.
    NodeId
);
arena_id!(
    /// Edge-use slot. Element `e` owns a fixed block of edge uses.
    EdgeUseId
);
arena_id!(
    /// Tetrahedron face slot. Element `e` owns faces `4e..4e+4`.
    FaceId
);
arena_id!(
    /// Element slot.
    ElementId
);
