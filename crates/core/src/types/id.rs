//! Newtype IDs for type-safe entity references.
//!
//! Identity comes from the page markup: product cards carry string
//! `data-product-id` attributes, so IDs here wrap `String` rather than a
//! database integer. Use the `define_str_id!` macro to create type-safe
//! wrappers that prevent accidentally mixing IDs from different entity types.

use uuid::Uuid;

/// Macro to define a type-safe string ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Conversion methods: `new()`, `as_str()`, `into_inner()`
/// - `From<String>` and `From<&str>` implementations
///
/// # Example
///
/// ```rust
/// # use mercadito_core::define_str_id;
/// define_str_id!(ProductId);
/// define_str_id!(PageId);
///
/// let product_id = ProductId::new("camiseta-azul");
/// let page_id = PageId::new("camiseta-azul");
///
/// // These are different types, so this won't compile:
/// // let _: ProductId = page_id;
/// ```
#[macro_export]
macro_rules! define_str_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from any string-like value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the underlying string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the ID, returning the underlying `String`.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }

            /// Whether the ID is empty or whitespace-only.
            #[must_use]
            pub fn is_blank(&self) -> bool {
                self.0.trim().is_empty()
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

// Define standard entity IDs
define_str_id!(ProductId);
define_str_id!(SessionId);

impl SessionId {
    /// Generate a random session ID.
    ///
    /// Used to namespace the session-scoped storage tier so that concurrent
    /// sessions on the same machine do not share state.
    #[must_use]
    pub fn random() -> Self {
        Self::new(Uuid::new_v4().to_string())
    }
}
