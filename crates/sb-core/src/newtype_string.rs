//! Non-blank string newtypes for identifiers (table names, seed names).

/// Define an identifier newtype over a non-blank `String`.
///
/// Surrounding whitespace is trimmed on construction. The type serializes as
/// a plain string, refuses blank input on deserialization, and derefs to
/// `str` so it can be passed wherever a name is read.
macro_rules! define_newtype_string {
    (
        $(#[$meta:meta])*
        $vis:vis struct $Name:ident;
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
        #[serde(transparent)]
        $vis struct $Name(String);

        impl $Name {
            /// Build from a known-good identifier.
            ///
            /// # Panics
            /// If `name` is blank. Use [`try_new`](Self::try_new) for input
            /// read from files.
            pub fn new(name: impl Into<String>) -> Self {
                match Self::try_new(name) {
                    Some(name) => name,
                    None => panic!(concat!(stringify!($Name), " must not be blank")),
                }
            }

            /// Build from untrusted input; `None` when blank.
            pub fn try_new(name: impl Into<String>) -> Option<Self> {
                let name = name.into();
                let trimmed = name.trim();
                if trimmed.is_empty() {
                    None
                } else if trimmed.len() == name.len() {
                    Some(Self(name))
                } else {
                    Some(Self(trimmed.to_string()))
                }
            }

            /// The identifier text.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl<'de> serde::Deserialize<'de> for $Name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                Self::try_new(raw).ok_or_else(|| {
                    serde::de::Error::custom(concat!(stringify!($Name), " must not be blank"))
                })
            }
        }

        impl std::str::FromStr for $Name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::try_new(s).ok_or_else(|| format!("{} must not be blank", stringify!($Name)))
            }
        }

        impl std::fmt::Display for $Name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl std::ops::Deref for $Name {
            type Target = str;

            fn deref(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $Name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl std::borrow::Borrow<str> for $Name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq<str> for $Name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl<'a> PartialEq<&'a str> for $Name {
            fn eq(&self, other: &&'a str) -> bool {
                self.0 == *other
            }
        }
    };
}

pub(crate) use define_newtype_string;
