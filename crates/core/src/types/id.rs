//! Server row IDs.
//!
//! Every entity the backend returns is keyed by an integer primary key. Each
//! one gets its own newtype so a task ID cannot be passed to an endpoint
//! that expects a user ID.

/// Define an integer ID newtype.
///
/// The generated type serializes as the bare integer, displays as it, and
/// parses from a command-line argument with surrounding whitespace ignored.
///
/// ```rust
/// # use visit_panel_core::define_id;
/// define_id!(WidgetId);
///
/// let id: WidgetId = " 12 ".parse().unwrap();
/// assert_eq!(id.as_i64(), 12);
/// assert_eq!(id.to_string(), "12");
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[derive(::serde::Serialize, ::serde::Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            #[must_use]
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            #[must_use]
            pub const fn as_i64(self) -> i64 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = ::core::num::ParseIntError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                s.trim().parse().map(Self)
            }
        }
    };
}

define_id!(UserId);
define_id!(TaskId);
define_id!(RedeemId);
define_id!(AuditId);
