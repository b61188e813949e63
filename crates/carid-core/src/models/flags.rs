//! Named capability bitmasks
//!
//! Each mask is a transparent newtype with named bits. Only union,
//! intersection and containment are offered; callers never do arithmetic
//! on the raw integer.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};

macro_rules! bitmask {
    (
        $(#[$meta:meta])*
        $name:ident: $repr:ty {
            $( $(#[$flag_meta:meta])* $flag:ident = $value:expr; )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name($repr);

        impl $name {
            $( $(#[$flag_meta])* pub const $flag: Self = Self($value); )*

            /// Every named bit with its name, in declaration order
            pub const NAMED: &'static [(&'static str, Self)] = &[$((stringify!($flag), Self::$flag)),*];

            pub const fn empty() -> Self {
                Self(0)
            }

            pub const fn bits(self) -> $repr {
                self.0
            }

            pub const fn is_empty(self) -> bool {
                self.0 == 0
            }

            pub const fn contains(self, other: Self) -> bool {
                self.0 & other.0 == other.0
            }

            pub const fn union(self, other: Self) -> Self {
                Self(self.0 | other.0)
            }

            pub const fn intersection(self, other: Self) -> Self {
                Self(self.0 & other.0)
            }

            pub fn insert(&mut self, other: Self) {
                self.0 |= other.0;
            }

            /// Names of the set bits
            pub fn names(self) -> Vec<&'static str> {
                Self::NAMED
                    .iter()
                    .filter(|(_, flag)| self.contains(*flag))
                    .map(|(name, _)| *name)
                    .collect()
            }
        }

        impl BitOr for $name {
            type Output = Self;

            fn bitor(self, rhs: Self) -> Self {
                self.union(rhs)
            }
        }

        impl BitOrAssign for $name {
            fn bitor_assign(&mut self, rhs: Self) {
                self.insert(rhs);
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if self.is_empty() {
                    return f.write_str("none");
                }
                f.write_str(&self.names().join(" | "))
            }
        }
    };
}

bitmask! {
    /// Platform feature flags handed to the control layer
    CarFlags: u32 {
        /// Longitudinal control is performed by us rather than stock ACC
        LONG_CONTROL = 1;
        /// Vehicle lacks the SDM1 message (0x201)
        NO_SDM1 = 2;
    }
}

bitmask! {
    /// Parameter bits passed to the safety model
    SafetyParam: u16 {
        LONG_CONTROL = 1;
        EXTERNAL_PANDA = 2;
        HW1 = 4;
        HW2 = 8;
        HW3 = 16;
        PREAP = 32;
    }
}
