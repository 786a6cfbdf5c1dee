//! NDR pointer types
//!
//! NDR supports three pointer semantics:
//!
//! - Reference (`[ref]`): non-null; at top level the pointee is encoded in place
//! - Unique (`[unique]`): nullable, 4-byte referent ID, body deferred
//! - Full (`[ptr]`): nullable, 4-byte referent ID, body deferred
//!
//! A nullable pointer writes only its referent ID inline. Its body joins the
//! cursor's deferred queue and is written or read when the enclosing
//! top-level parameter flushes.

use std::ops::{Deref, DerefMut};

use crate::{DeferredDecode, DeferredEncode, NdrDecode, NdrEncode, NdrReader, NdrWriter, Result};

/// Trait for NDR pointer types
pub trait NdrPtr {
    type Target;

    /// Check if the pointer is null
    fn is_null(&self) -> bool;

    /// Get the inner value, if any
    fn get(&self) -> Option<&Self::Target>;

    /// Get a mutable reference to the inner value, if any
    fn get_mut(&mut self) -> Option<&mut Self::Target>;
}

/// Reference pointer - non-null, pointee encoded in place
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RefPtr<T>(pub T);

impl<T> RefPtr<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for RefPtr<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> DerefMut for RefPtr<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.0
    }
}

impl<T> NdrPtr for RefPtr<T> {
    type Target = T;

    fn is_null(&self) -> bool {
        false
    }

    fn get(&self) -> Option<&T> {
        Some(&self.0)
    }

    fn get_mut(&mut self) -> Option<&mut T> {
        Some(&mut self.0)
    }
}

impl<T: NdrEncode> NdrEncode for RefPtr<T> {
    fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()> {
        self.0.ndr_encode(w)
    }

    fn ndr_align() -> usize {
        T::ndr_align()
    }
}

impl<T: NdrDecode> NdrDecode for RefPtr<T> {
    fn ndr_decode<'a>(&'a mut self, r: &mut NdrReader<'a>) -> Result<()> {
        self.0.ndr_decode(r)
    }

    fn ndr_align() -> usize {
        T::ndr_align()
    }

    fn ndr_min_size() -> usize {
        T::ndr_min_size()
    }
}

macro_rules! nullable_pointer {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct $name<T>(pub Option<Box<T>>);

        impl<T> $name<T> {
            pub fn new(value: T) -> Self {
                Self(Some(Box::new(value)))
            }

            pub fn null() -> Self {
                Self(None)
            }

            pub fn into_option(self) -> Option<T> {
                self.0.map(|b| *b)
            }

            pub fn as_ref(&self) -> Option<&T> {
                self.0.as_deref()
            }

            pub fn as_mut(&mut self) -> Option<&mut T> {
                self.0.as_deref_mut()
            }
        }

        impl<T> Default for $name<T> {
            fn default() -> Self {
                Self(None)
            }
        }

        impl<T> From<Option<T>> for $name<T> {
            fn from(opt: Option<T>) -> Self {
                Self(opt.map(Box::new))
            }
        }

        impl<T> NdrPtr for $name<T> {
            type Target = T;

            fn is_null(&self) -> bool {
                self.0.is_none()
            }

            fn get(&self) -> Option<&T> {
                self.0.as_deref()
            }

            fn get_mut(&mut self) -> Option<&mut T> {
                self.0.as_deref_mut()
            }
        }

        impl<T: NdrEncode> NdrEncode for $name<T> {
            fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()> {
                let body: Option<&'a (dyn DeferredEncode + 'a)> = match self.0 {
                    Some(_) => Some(self),
                    None => None,
                };
                w.write_pointer(body);
                Ok(())
            }

            fn ndr_align() -> usize {
                4
            }
        }

        impl<T: NdrEncode> DeferredEncode for $name<T> {
            fn encode_deferred<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()> {
                match &self.0 {
                    Some(value) => w.write_aligned(&**value),
                    None => Ok(()),
                }
            }
        }

        impl<T: NdrDecode> NdrDecode for $name<T> {
            fn ndr_decode<'a>(&'a mut self, r: &mut NdrReader<'a>) -> Result<()> {
                self.0 = None;
                if r.read_referent()? != 0 {
                    r.defer(self);
                }
                Ok(())
            }

            fn ndr_align() -> usize {
                4
            }

            fn ndr_min_size() -> usize {
                4
            }
        }

        impl<T: NdrDecode> DeferredDecode for $name<T> {
            fn decode_deferred<'a>(&'a mut self, r: &mut NdrReader<'a>) -> Result<()> {
                let slot: &'a mut T = self.0.insert(Box::new(T::default()));
                r.read_aligned(slot)
            }
        }
    };
}

nullable_pointer! {
    /// Unique pointer - nullable, no aliasing
    ///
    /// The `[unique]` attribute in MIDL. Encoded as a 4-byte referent ID
    /// (0 = null) followed, in the deferred section, by the pointee.
    UniquePtr
}

nullable_pointer! {
    /// Full pointer - nullable
    ///
    /// The `[ptr]` attribute in MIDL. Same wire form as `UniquePtr`; each
    /// non-null pointer gets its own referent ID, so aliased pointees are
    /// transmitted once per pointer.
    FullPtr
}
