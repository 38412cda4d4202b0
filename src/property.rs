/*!

Property identity and registration.

Every framework-defined property is named by a [`PropertyId`]: a small
non-negative integer assigned once, process-wide, when the property type
registers itself, and never reused for another property. Value stores key on
this id, so assignment must be stable for the life of the process.

Registration uses the registry pattern: each concrete property type defined
with [`define_property!`](crate::define_property) owns a static `AtomicU32`
holding its id, initialized from a global counter inside a `ctor` that runs at
program start-up. Claiming an id therefore never races with its use, and
`registered_property_count()` is final before any store exists.

*/

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use log::trace;

/// Sentinel stored in a property type's `static AtomicU32` until its id has
/// been assigned.
const UNASSIGNED: u32 = u32::MAX;

/// Global id counter; holds the id that will be assigned to the next property
/// that registers. Equivalently, a count of the properties registered so far.
static NEXT_PROPERTY_ID: Mutex<u32> = Mutex::new(0);

/// Names of registered properties, indexed by id. Kept for diagnostics only.
static PROPERTY_NAMES: Mutex<Vec<&'static str>> = Mutex::new(Vec::new());

/// The process-wide, stable identifier of a framework-defined property.
///
/// Ids are dense: they range over `0..registered_property_count()`. `u32::MAX`
/// is reserved as the unassigned sentinel and is never a valid id.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct PropertyId(u32);

impl PropertyId {
    /// Wraps a raw id. Real ids come from registration; this constructor
    /// exists so tests and benchmarks can fabricate ids directly.
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        PropertyId(raw)
    }

    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

/// A convenience getter for `NEXT_PROPERTY_ID`.
#[must_use]
pub fn registered_property_count() -> u32 {
    *NEXT_PROPERTY_ID.lock().unwrap()
}

/// Returns the name of a registered property, or `None` for an id that was
/// never assigned.
#[must_use]
pub fn property_name(id: PropertyId) -> Option<&'static str> {
    PROPERTY_NAMES.lock().unwrap().get(id.0 as usize).copied()
}

/// Encapsulates the synchronization logic for claiming a property's id.
///
/// Acquires a global lock on the next available id, but only increments it if
/// we successfully initialize the provided static. An id is assigned at
/// runtime but only once per type; a type could attempt to initialize its id
/// from multiple threads, which is why the compare-exchange is needed. The
/// overhead is negligible, as this runs once per property type at start-up.
pub fn initialize_property_id(id: &AtomicU32, name: &'static str) -> PropertyId {
    let mut guard = NEXT_PROPERTY_ID.lock().unwrap();
    let candidate = *guard;
    assert!(
        candidate < UNASSIGNED,
        "property id space exhausted registering {name}"
    );

    // Guard against another thread having initialized the static between our
    // fast-path load and acquiring the lock. If it has, we must not bump the
    // counter; we just return the id it claimed.
    match id.compare_exchange(UNASSIGNED, candidate, Ordering::AcqRel, Ordering::Acquire) {
        Ok(_) => {
            *guard += 1;
            let mut names = PROPERTY_NAMES.lock().unwrap();
            debug_assert_eq!(names.len(), candidate as usize);
            names.push(name);
            trace!("registered property {name} with id {candidate}");
            PropertyId(candidate)
        }
        Err(existing) => PropertyId(existing),
    }
}

/// Implemented for marker types created by
/// [`define_property!`](crate::define_property).
pub trait RegisteredProperty {
    /// The property's process-wide id. The first call claims the id; every
    /// later call is a relaxed atomic load.
    fn property_id() -> PropertyId;

    fn name() -> &'static str;
}

/// Defines a marker type for a framework property and registers it, assigning
/// its [`PropertyId`] in a `ctor` at program start-up.
///
/// ```rust
/// use propstore::{define_property, RegisteredProperty};
///
/// define_property!(Opacity);
/// define_property!(
///     /// Whether the object participates in hit testing.
///     pub IsHitTestVisible
/// );
///
/// assert_ne!(Opacity::property_id(), IsHitTestVisible::property_id());
/// assert_eq!(Opacity::name(), "Opacity");
/// ```
#[macro_export]
macro_rules! define_property {
    ($(#[$meta:meta])* $vis:vis $property:ident) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Debug)]
        $vis struct $property;

        impl $crate::property::RegisteredProperty for $property {
            fn property_id() -> $crate::property::PropertyId {
                // Must be initialized with a compile-time constant, so
                // `u32::MAX` stands in for "unassigned". This static is
                // shared among all uses of this concrete property type.
                static ID: std::sync::atomic::AtomicU32 =
                    std::sync::atomic::AtomicU32::new(u32::MAX);

                // Fast path: already assigned.
                let id = ID.load(std::sync::atomic::Ordering::Relaxed);
                if id != u32::MAX {
                    return $crate::property::PropertyId::new(id);
                }

                // Slow path: claim the next id.
                $crate::property::initialize_property_id(&ID, stringify!($property))
            }

            fn name() -> &'static str {
                stringify!($property)
            }
        }

        // Registering in a `ctor` means every property has its id before any
        // value store is created or enumerated, so id assignment can never
        // interleave with store operations.
        $crate::paste::paste! {
            $crate::ctor::declarative::ctor! {
                #[ctor]
                fn [<_register_property_ $property:snake>]() {
                    let _ =
                        <$property as $crate::property::RegisteredProperty>::property_id();
                }
            }
        }
    };
}
pub use define_property;

#[cfg(test)]
mod tests {
    use super::*;

    define_property!(TestOpacity);
    define_property!(TestBackground);
    define_property!(
        /// Has a doc comment and restricted visibility.
        pub(crate) TestCornerRadius
    );

    #[test]
    fn ids_are_distinct_and_stable() {
        let first = TestOpacity::property_id();
        let second = TestBackground::property_id();
        let third = TestCornerRadius::property_id();

        assert_ne!(first, second);
        assert_ne!(first, third);
        assert_ne!(second, third);

        // Repeated calls take the fast path and return the same id.
        assert_eq!(TestOpacity::property_id(), first);
        assert_eq!(TestBackground::property_id(), second);
    }

    #[test]
    fn ids_are_dense() {
        let count = registered_property_count();
        assert!(count >= 3);
        assert!(TestOpacity::property_id().as_u32() < count);
        assert!(TestBackground::property_id().as_u32() < count);
        assert!(TestCornerRadius::property_id().as_u32() < count);
    }

    #[test]
    fn names_are_recorded() {
        assert_eq!(TestOpacity::name(), "TestOpacity");
        assert_eq!(
            property_name(TestOpacity::property_id()),
            Some("TestOpacity")
        );
        assert_eq!(property_name(PropertyId::new(u32::MAX - 1)), None);
    }

    #[test]
    fn ids_order_consistently() {
        let id = TestOpacity::property_id();
        assert_eq!(id, PropertyId::new(id.as_u32()));
        assert!(PropertyId::new(1) < PropertyId::new(2));
    }
}
