//! Export flag bitsets. Modeled as plain `u32` newtypes with associated bit-mask constants,
//! combinable with `|`, rather than pulling in a dedicated bitflags dependency.

use std::ops::BitOr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

macro_rules! flag_set {
    ($name:ident { $($bit:ident = $value:expr),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
        #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
        pub struct $name(u32);

        impl $name {
            pub const NONE: Self = Self(0);
            $(pub const $bit: Self = Self($value);)+

            pub fn contains(&self, other: Self) -> bool {
                self.0 & other.0 == other.0
            }
        }

        impl BitOr for $name {
            type Output = Self;
            fn bitor(self, rhs: Self) -> Self {
                Self(self.0 | rhs.0)
            }
        }
    };
}

flag_set!(MeshExportFlags {
    TRANSFORM_REVERSE_X = 0x1,
    TRANSFORM_REVERSE_Y = 0x2,
    TRANSFORM_REVERSE_Z = 0x4,
    TRANSFORM_SWAP_XY = 0x8,
    TRANSFORM_SWAP_XZ = 0x10,
    TRANSFORM_SWAP_YZ = 0x20,
    EXPORT_UV = 0x40,
    EXPORT_NORMALS = 0x80,
    EXPORT_TRIANGULATED = 0x100,
});

flag_set!(MaterialExportFlags {
    TEXTURE_NONE = 0x1,
    TEXTURE_ORIGIN = 0x2,
    TEXTURE_COPY_TO_LOCAL = 0x4,
});

/// Which header OBJ emits before a group's faces, and whether to prefer PBR material keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ObjectPolicy {
    Default,
    Groups,
    Objects,
}

impl Default for ObjectPolicy {
    fn default() -> Self {
        ObjectPolicy::Groups
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ObjExportFlags {
    pub object_policy: ObjectPolicyFlag,
    pub materials_pbr: bool,
}

/// Newtype so [`ObjExportFlags`] can derive `Default` while still defaulting to
/// [`ObjectPolicy::Groups`], matching the library's historical default output shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ObjectPolicyFlag(pub ObjectPolicy);

impl Default for ObjectPolicyFlag {
    fn default() -> Self {
        ObjectPolicyFlag(ObjectPolicy::Groups)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mesh_export_flags_combine_and_test() {
        let flags = MeshExportFlags::EXPORT_UV | MeshExportFlags::EXPORT_NORMALS;
        assert!(flags.contains(MeshExportFlags::EXPORT_UV));
        assert!(flags.contains(MeshExportFlags::EXPORT_NORMALS));
        assert!(!flags.contains(MeshExportFlags::EXPORT_TRIANGULATED));
    }
}
