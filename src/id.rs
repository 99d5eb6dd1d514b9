//! Code for handling IDs

/// Define a cheaply clonable, string-backed ID type.
///
/// The underlying storage is an `Rc<str>`, so copies of an ID share one allocation.
macro_rules! define_id_type {
    ($name:ident) => {
        /// A unique identifier
        #[derive(
            Clone,
            Debug,
            Eq,
            Hash,
            Ord,
            PartialEq,
            PartialOrd,
            derive_more::Display,
            serde::Serialize,
            serde::Deserialize,
        )]
        pub struct $name(std::rc::Rc<str>);

        impl $name {
            /// The ID as a string slice
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.into())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id.into())
            }
        }

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}
pub(crate) use define_id_type;
