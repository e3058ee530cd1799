//! Dynamic loading and symbol binding
//!
//! - `loader`: finds and opens shared libraries
//! - `slot`: init-once storage shared by every caller in the process
//! - `libc`: the C runtime allocator and string primitives
//! - `crypt`: libcryptsetup entry points
//!
//! # Safety
//!
//! Resolved symbols are cast to the signatures declared in the symbol tables.
//! Nothing can verify those signatures at runtime; they must match the C
//! headers for the ABI model selected in [`crate::abi`].

/// Declare a table of function pointers and the code that resolves it.
///
/// Every field is looked up by its own name. `required` tables fail on the
/// first missing symbol; `optional` tables store `None` instead.
macro_rules! symbol_table {
    (
        $(#[$meta:meta])*
        pub struct $table:ident : required {
            $( $name:ident : $ty:ty, )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy)]
        pub struct $table {
            $( pub $name: $ty, )*
        }

        impl $table {
            /// Resolve every entry point, or fail naming the first missing one.
            ///
            /// # Safety
            ///
            /// `library` must export these symbols with the declared signatures
            /// and must stay loaded for as long as the table is used.
            pub unsafe fn resolve(
                library: &libloading::Library,
                library_name: &str,
            ) -> $crate::error::CryptResult<Self> {
                Ok(Self {
                    $(
                        $name: *library
                            .get::<$ty>(concat!(stringify!($name), "\0").as_bytes())
                            .map_err(|_| $crate::error::CryptError::Bind {
                                library: library_name.to_string(),
                                symbol: stringify!($name).to_string(),
                            })?,
                    )*
                })
            }

            /// Names of every entry point in this table
            pub const SYMBOLS: &'static [&'static str] = &[$( stringify!($name), )*];
        }
    };
    (
        $(#[$meta:meta])*
        pub struct $table:ident : optional {
            $( $name:ident : $ty:ty, )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Default)]
        pub struct $table {
            $( pub $name: Option<$ty>, )*
        }

        impl $table {
            /// Resolve whichever entry points the library exports.
            ///
            /// # Safety
            ///
            /// Same contract as a required table.
            pub unsafe fn resolve(library: &libloading::Library) -> Self {
                Self {
                    $(
                        $name: library
                            .get::<$ty>(concat!(stringify!($name), "\0").as_bytes())
                            .ok()
                            .map(|symbol| *symbol),
                    )*
                }
            }

            /// Names of the entry points this table found
            pub fn available(&self) -> Vec<&'static str> {
                let mut names = Vec::new();
                $(
                    if self.$name.is_some() {
                        names.push(stringify!($name));
                    }
                )*
                names
            }
        }
    };
}

pub(crate) use symbol_table;

pub mod crypt;
pub mod libc;
pub mod loader;
pub mod slot;
